//! Exact filtering of scan candidates.
//!
//! Cell coverings over-approximate the query region, so every candidate is
//! re-checked against the original shape before it reaches the caller.

use crate::codec::PointCodec;
use crate::compute::bounds::earth_distance;
use crate::error::Result;
use crate::types::{GeoPoint, Item, LatLngRect, QueryShape};

/// Whether `point` satisfies `shape`. Rectangle edges and the radius itself
/// are inclusive.
pub fn matches(shape: &QueryShape, point: &GeoPoint) -> bool {
    match shape {
        QueryShape::Rectangle { min, max } => LatLngRect::new(*min, *max).contains(point),
        QueryShape::Radius {
            center,
            radius_meters,
        } => earth_distance(center, point) <= *radius_meters,
    }
}

/// Keep the candidates whose decoded point satisfies `shape`.
///
/// Relative order of the kept items is preserved. A candidate without a
/// decodable point fails the whole call.
pub fn filter(items: Vec<Item>, shape: &QueryShape, codec: &PointCodec) -> Result<Vec<Item>> {
    let mut kept = Vec::with_capacity(items.len());

    for item in items {
        let point = codec.decode_item(&item)?;
        if matches(shape, &point) {
            kept.push(item);
        }
    }

    Ok(kept)
}
