//! Validation for geographic coordinates and query shapes.

use crate::error::{GeoError, Result};
use crate::types::{GeoPoint, QueryShape};

fn check_point(point: &GeoPoint) -> std::result::Result<(), String> {
    let GeoPoint {
        latitude,
        longitude,
    } = *point;

    if !latitude.is_finite() {
        return Err(format!("Latitude must be finite, got: {}", latitude));
    }

    if !longitude.is_finite() {
        return Err(format!("Longitude must be finite, got: {}", longitude));
    }

    if !(-90.0..=90.0).contains(&latitude) {
        return Err(format!("Latitude out of range [-90.0, 90.0]: {}", latitude));
    }

    if !(-180.0..=180.0).contains(&longitude) {
        return Err(format!(
            "Longitude out of range [-180.0, 180.0]: {}",
            longitude
        ));
    }

    Ok(())
}

/// Validates a point has valid latitude and longitude.
///
/// Latitude: [-90.0, 90.0], Longitude: [-180.0, 180.0]
///
/// # Examples
///
/// ```
/// use geodex::GeoPoint;
/// use geodex::compute::validation::validate_geographic_point;
///
/// assert!(validate_geographic_point(&GeoPoint::new(40.7128, -74.0060)).is_ok());
/// assert!(validate_geographic_point(&GeoPoint::new(95.0, -74.0)).is_err());
/// assert!(validate_geographic_point(&GeoPoint::new(40.0, 200.0)).is_err());
/// ```
pub fn validate_geographic_point(point: &GeoPoint) -> Result<()> {
    check_point(point).map_err(GeoError::InvalidInput)
}

/// Validates a query shape before any I/O is issued.
///
/// Rectangles need valid corners with `min.latitude <= max.latitude`; the
/// longitudes may be in either order (a reversed pair spans the ±180°
/// meridian). Radius queries need a valid center and a finite, positive radius.
pub fn validate_shape(shape: &QueryShape) -> Result<()> {
    match shape {
        QueryShape::Rectangle { min, max } => {
            check_point(min).map_err(|e| GeoError::InvalidShape(format!("min corner: {}", e)))?;
            check_point(max).map_err(|e| GeoError::InvalidShape(format!("max corner: {}", e)))?;

            if min.latitude > max.latitude {
                return Err(GeoError::InvalidShape(format!(
                    "min latitude ({}) must be <= max latitude ({})",
                    min.latitude, max.latitude
                )));
            }
        }
        QueryShape::Radius {
            center,
            radius_meters,
        } => {
            check_point(center).map_err(|e| GeoError::InvalidShape(format!("center: {}", e)))?;

            if !radius_meters.is_finite() || *radius_meters <= 0.0 {
                return Err(GeoError::InvalidShape(format!(
                    "radius must be a positive finite number of meters, got: {}",
                    radius_meters
                )));
            }
        }
    }

    Ok(())
}
