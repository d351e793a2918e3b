//! Geospatial secondary index over hash-partitioned, range-sorted key-value stores.
//!
//! Points are indexed by their S2 leaf cell id. A rectangle or radius query is
//! planned as a set of partition-scoped range scans, executed in parallel on a
//! bounded worker pool, and filtered exactly against the query shape.
//!
//! ```rust
//! use geodex::{GeoConfig, GeoIndex, GeoPoint, MemoryStore, PutPointRequest};
//! use std::sync::Arc;
//!
//! let index = GeoIndex::builder(Arc::new(MemoryStore::new()))
//!     .config(GeoConfig::new("places"))
//!     .build()?;
//!
//! let center = GeoPoint::new(47.5, -122.3);
//! index.put_point(PutPointRequest::new(center, "center"))?;
//! index.put_point(PutPointRequest::new(GeoPoint::new(47.59, -122.3), "ten-km-north"))?;
//!
//! let outcome = index.query_radius(center, 100.0)?;
//! assert_eq!(outcome.items.len(), 1);
//! assert_eq!(outcome.items[0]["rangeKey"], "center");
//! # Ok::<(), geodex::GeoError>(())
//! ```

pub mod builder;
pub mod codec;
pub mod compute;
pub mod config;
pub mod db;
pub mod dispatch;
pub mod error;
pub mod index;
pub mod storage;
pub mod types;

pub use builder::GeoIndexBuilder;
pub use db::{GeoIndex, QueryPlan};
pub use error::{GeoError, Result, StoreError};

pub use config::{CoveringConfig, GeoConfig};

pub use codec::PointCodec;

pub use compute::{EARTH_RADIUS_METERS, PartitionScheme, bounding_rect, earth_distance};

pub use index::{CellCoverer, S2CellCoverer, index_value};

pub use dispatch::{CandidateSink, QueryDispatcher};

pub use storage::{
    ContinuationToken, GeoStore, ItemKey, KeySchema, MemoryStore, ScanPage, ScanRequest,
    StoreResult, StoreStats, WriteOp,
};

pub use types::{
    AttributeUpdate, BatchWriteOutcome, DispatchTask, GeoPoint, IndexRange, Item, LatLngRect,
    PointKey, PutPointRequest, QueryOutcome, QueryShape, QueryStats, UpdatePointRequest,
};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Common imports
pub mod prelude {

    pub use crate::{GeoError, GeoIndex, GeoIndexBuilder, Result};

    pub use crate::{GeoConfig, GeoPoint, QueryOutcome, QueryShape};

    pub use crate::{PointKey, PutPointRequest, UpdatePointRequest};

    pub use crate::{GeoStore, MemoryStore};

    pub use std::sync::Arc;
}
