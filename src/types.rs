//! Value types shared by the planner, the dispatcher and the store layer.
//!
//! Points are plain latitude/longitude pairs in degrees. Conversions to and
//! from `geo` types follow the `geo` convention of `x = longitude`,
//! `y = latitude`.
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A store record: attribute name to JSON value.
pub type Item = serde_json::Map<String, serde_json::Value>;

/// A geographic point in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

impl fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.latitude, self.longitude)
    }
}

impl From<GeoPoint> for geo::Point {
    fn from(point: GeoPoint) -> Self {
        geo::Point::new(point.longitude, point.latitude)
    }
}

impl From<geo::Point> for GeoPoint {
    fn from(point: geo::Point) -> Self {
        GeoPoint::new(point.y(), point.x())
    }
}

/// Spatial predicate of a query.
///
/// A `Rectangle` whose `min.longitude` is greater than its `max.longitude`
/// spans the ±180° meridian.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum QueryShape {
    Rectangle { min: GeoPoint, max: GeoPoint },
    Radius { center: GeoPoint, radius_meters: f64 },
}

impl QueryShape {
    pub const fn rectangle(min: GeoPoint, max: GeoPoint) -> Self {
        QueryShape::Rectangle { min, max }
    }

    pub const fn radius(center: GeoPoint, radius_meters: f64) -> Self {
        QueryShape::Radius {
            center,
            radius_meters,
        }
    }
}

impl From<geo::Rect> for QueryShape {
    fn from(rect: geo::Rect) -> Self {
        QueryShape::Rectangle {
            min: GeoPoint::new(rect.min().y, rect.min().x),
            max: GeoPoint::new(rect.max().y, rect.max().x),
        }
    }
}

/// Axis-aligned latitude/longitude box.
///
/// Latitude bounds are always ordered. When `min.longitude > max.longitude`
/// the box wraps across the ±180° meridian.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLngRect {
    pub min: GeoPoint,
    pub max: GeoPoint,
}

impl LatLngRect {
    pub const fn new(min: GeoPoint, max: GeoPoint) -> Self {
        Self { min, max }
    }

    pub fn spans_antimeridian(&self) -> bool {
        self.min.longitude > self.max.longitude
    }

    pub fn covers_all_longitudes(&self) -> bool {
        self.min.longitude <= -180.0 && self.max.longitude >= 180.0
    }

    /// Inclusive containment test. Edges and corners are inside.
    ///
    /// Longitudes -180 and 180 name the same meridian, so a point on it
    /// matches any box with an edge there.
    pub fn contains(&self, point: &GeoPoint) -> bool {
        if point.latitude < self.min.latitude || point.latitude > self.max.latitude {
            return false;
        }
        if self.covers_all_longitudes() {
            return true;
        }

        let (lo, hi) = self.normalized_longitudes();
        let lng = unify_antimeridian(point.longitude);
        if lo > hi {
            lng >= lo || lng <= hi
        } else {
            lng >= lo && lng <= hi
        }
    }

    // A -180 bound becomes 180 unless the other bound is 180, which would
    // collapse [-180, 180] or [180, -180] into a single meridian.
    fn normalized_longitudes(&self) -> (f64, f64) {
        let (lo, hi) = (self.min.longitude, self.max.longitude);
        let lo_norm = if hi == 180.0 { lo } else { unify_antimeridian(lo) };
        let hi_norm = if lo == 180.0 { hi } else { unify_antimeridian(hi) };
        (lo_norm, hi_norm)
    }
}

fn unify_antimeridian(lng: f64) -> f64 {
    if lng == -180.0 { 180.0 } else { lng }
}

/// Closed interval `[min, max]` on the 64-bit index space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct IndexRange {
    pub min: u64,
    pub max: u64,
}

impl IndexRange {
    /// Build a range from two endpoints given in either order.
    pub const fn new(a: u64, b: u64) -> Self {
        if a <= b {
            Self { min: a, max: b }
        } else {
            Self { min: b, max: a }
        }
    }

    pub const fn single(value: u64) -> Self {
        Self {
            min: value,
            max: value,
        }
    }

    pub const fn contains(&self, value: u64) -> bool {
        self.min <= value && value <= self.max
    }

    /// Number of index values in the range. `u128` so the full space fits.
    pub const fn width(&self) -> u128 {
        (self.max - self.min) as u128 + 1
    }
}

impl fmt::Display for IndexRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.min, self.max)
    }
}

/// One partition-scoped range scan. Owned by the dispatcher for its lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchTask {
    pub range: IndexRange,
    pub partition_key: u64,
}

/// Put a point with caller-defined attributes.
///
/// Key, index and point attributes configured on the index overwrite any
/// attribute of the same name in `attributes`.
#[derive(Debug, Clone, PartialEq)]
pub struct PutPointRequest {
    pub point: GeoPoint,
    pub range_key: String,
    pub attributes: Item,
}

impl PutPointRequest {
    pub fn new(point: GeoPoint, range_key: impl Into<String>) -> Self {
        Self {
            point,
            range_key: range_key.into(),
            attributes: Item::new(),
        }
    }

    pub fn with_attribute(
        mut self,
        name: impl Into<String>,
        value: impl Into<serde_json::Value>,
    ) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }
}

/// Addresses one stored point.
#[derive(Debug, Clone, PartialEq)]
pub struct PointKey {
    pub point: GeoPoint,
    pub range_key: String,
}

impl PointKey {
    pub fn new(point: GeoPoint, range_key: impl Into<String>) -> Self {
        Self {
            point,
            range_key: range_key.into(),
        }
    }
}

/// Change applied to a single attribute by an update.
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeUpdate {
    Put(serde_json::Value),
    Delete,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UpdatePointRequest {
    pub key: PointKey,
    pub updates: BTreeMap<String, AttributeUpdate>,
}

impl UpdatePointRequest {
    pub fn new(point: GeoPoint, range_key: impl Into<String>) -> Self {
        Self {
            key: PointKey::new(point, range_key),
            updates: BTreeMap::new(),
        }
    }

    pub fn put(mut self, name: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.updates
            .insert(name.into(), AttributeUpdate::Put(value.into()));
        self
    }

    pub fn delete(mut self, name: impl Into<String>) -> Self {
        self.updates.insert(name.into(), AttributeUpdate::Delete);
        self
    }
}

/// Counters collected while planning and executing one query.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct QueryStats {
    /// Ranges produced by the cell covering.
    pub covering_ranges: usize,
    /// Ranges left after merging.
    pub merged_ranges: usize,
    /// Partition-scoped scans dispatched.
    pub dispatched_tasks: usize,
    pub pages_scanned: usize,
    pub candidates: usize,
    pub matched: usize,
}

/// Result of a rectangle or radius query.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryOutcome {
    pub items: Vec<Item>,
    pub stats: QueryStats,
}

/// Items the store did not write during a batch. Batches are not atomic.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchWriteOutcome {
    pub unprocessed: Vec<Item>,
}

impl BatchWriteOutcome {
    pub fn is_complete(&self) -> bool {
        self.unprocessed.is_empty()
    }
}
