//! S2-backed index values and cell coverings.
//!
//! The index value of a point is the id of the S2 leaf cell containing it.
//! Because S2 cell ids follow a Hilbert curve, a cell at any level owns one
//! contiguous interval of leaf ids, so a covering of a region translates
//! directly into a set of [`IndexRange`]s.

use crate::config::CoveringConfig;
use crate::types::{GeoPoint, IndexRange, LatLngRect};
use s2::cellid::CellID;
use s2::latlng::LatLng;
use s2::rect::Rect;
use s2::region::RegionCoverer;
use s2::{r1, s1};

/// Index value (S2 leaf cell id) of a point.
///
/// ```rust
/// use geodex::GeoPoint;
/// use geodex::index::index_value;
///
/// let a = index_value(&GeoPoint::new(47.5, -122.3));
/// let b = index_value(&GeoPoint::new(47.5, -122.3));
/// assert_eq!(a, b);
/// assert_eq!(a & 1, 1); // leaf cells carry the trailing marker bit
/// ```
pub fn index_value(point: &GeoPoint) -> u64 {
    let latlng = LatLng::from_degrees(point.latitude, point.longitude);
    CellID::from(&latlng).0
}

/// Produces the index ranges covering a bounding rectangle.
///
/// Ranges may over-include; callers filter candidates afterwards.
pub trait CellCoverer: Send + Sync {
    fn cover(&self, rect: &LatLngRect) -> Vec<IndexRange>;
}

/// [`CellCoverer`] backed by the S2 region coverer.
#[derive(Debug, Clone, Copy, Default)]
pub struct S2CellCoverer {
    config: CoveringConfig,
}

impl S2CellCoverer {
    pub fn new(config: CoveringConfig) -> Self {
        Self { config }
    }

    fn region_coverer(&self) -> RegionCoverer {
        RegionCoverer {
            min_level: self.config.min_level,
            max_level: self.config.max_level,
            level_mod: self.config.level_mod,
            max_cells: self.config.max_cells,
        }
    }
}

/// Convert a degree rectangle into an S2 rectangle. A reversed longitude
/// pair becomes an inverted interval, which S2 treats as wrapping.
pub fn to_s2_rect(rect: &LatLngRect) -> Rect {
    let lat = r1::interval::Interval::new(
        rect.min.latitude.to_radians(),
        rect.max.latitude.to_radians(),
    );
    let lng = s1::interval::Interval::new(
        rect.min.longitude.to_radians(),
        rect.max.longitude.to_radians(),
    );
    Rect { lat, lng }
}

impl CellCoverer for S2CellCoverer {
    fn cover(&self, rect: &LatLngRect) -> Vec<IndexRange> {
        let region = to_s2_rect(rect);
        let covering = self.region_coverer().covering(&region);

        covering
            .0
            .iter()
            .map(|cell| IndexRange::new(cell.range_min().0, cell.range_max().0))
            .collect()
    }
}
