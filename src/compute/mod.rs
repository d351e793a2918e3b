//! Compute layer for query planning and filtering.
//!
//! Everything here is pure and independent of the store: shape validation,
//! bounding rectangles, range merging and splitting, and the exact filter
//! applied to scan candidates.

pub mod bounds;
pub mod filter;
pub mod ranges;
pub mod validation;

pub use bounds::{EARTH_RADIUS_METERS, bounding_rect, earth_distance};
pub use ranges::{PartitionScheme, merge, merge_sorted, merge_until_stable};
