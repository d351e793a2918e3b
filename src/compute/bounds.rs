//! Bounding rectangles for query shapes.
//!
//! Radius queries are approximated with a latitude/longitude box derived from
//! local linear scale factors. The box over-approximates the circle, more so
//! near the poles and for very large radii; the exact filter removes the
//! extra candidates.

use crate::compute::validation::validate_shape;
use crate::error::Result;
use crate::types::{GeoPoint, LatLngRect, QueryShape};
use geo::{Distance, HaversineMeasure};

/// Effective Earth radius used for every distance computation, in meters.
pub const EARTH_RADIUS_METERS: f64 = 6_367_000.0;

/// Great-circle distance in meters between two points, haversine on a
/// sphere of [`EARTH_RADIUS_METERS`].
///
/// ```rust
/// use geodex::GeoPoint;
/// use geodex::compute::bounds::earth_distance;
///
/// let a = GeoPoint::new(0.0, 0.0);
/// let b = GeoPoint::new(0.0, 1.0);
/// let one_degree = earth_distance(&a, &b);
/// assert!((one_degree - 111_125.0).abs() < 10.0);
/// ```
pub fn earth_distance(a: &GeoPoint, b: &GeoPoint) -> f64 {
    HaversineMeasure::new(EARTH_RADIUS_METERS)
        .distance(geo::Point::from(*a), geo::Point::from(*b))
}

/// Bounding rectangle of a query shape.
///
/// Rectangles are returned unchanged. Radius shapes get a box whose
/// half-extent per axis is `radius / distance(center, reference)`, where the
/// reference point lies one degree from the center toward the equator
/// (latitude) or toward the 0° meridian (longitude).
///
/// Boxes that reach a pole are widened to all longitudes. Boxes that cross
/// the ±180° meridian come back as wrapping rectangles.
pub fn bounding_rect(shape: &QueryShape) -> Result<LatLngRect> {
    validate_shape(shape)?;

    match *shape {
        QueryShape::Rectangle { min, max } => Ok(LatLngRect::new(min, max)),
        QueryShape::Radius {
            center,
            radius_meters,
        } => Ok(radius_bounds(&center, radius_meters)),
    }
}

fn radius_bounds(center: &GeoPoint, radius_meters: f64) -> LatLngRect {
    let lat_unit = if center.latitude > 0.0 { -1.0 } else { 1.0 };
    let lat_reference = GeoPoint::new(center.latitude + lat_unit, center.longitude);

    let lng_unit = if center.longitude > 0.0 { -1.0 } else { 1.0 };
    let lng_reference = GeoPoint::new(center.latitude, center.longitude + lng_unit);

    let lat_extent = radius_meters / earth_distance(center, &lat_reference);
    let lng_extent = radius_meters / earth_distance(center, &lng_reference);

    let min_lat = (center.latitude - lat_extent).max(-90.0);
    let max_lat = (center.latitude + lat_extent).min(90.0);

    let reaches_pole = min_lat <= -90.0 || max_lat >= 90.0;
    if reaches_pole || !lng_extent.is_finite() || lng_extent >= 180.0 {
        return LatLngRect::new(GeoPoint::new(min_lat, -180.0), GeoPoint::new(max_lat, 180.0));
    }

    let mut min_lng = center.longitude - lng_extent;
    let mut max_lng = center.longitude + lng_extent;
    if min_lng < -180.0 {
        min_lng += 360.0;
    }
    if max_lng > 180.0 {
        max_lng -= 360.0;
    }

    LatLngRect::new(GeoPoint::new(min_lat, min_lng), GeoPoint::new(max_lat, max_lng))
}
