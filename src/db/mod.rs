//! The `GeoIndex` handle.
//!
//! `GeoIndex` composes the planning pipeline (bounding rectangle, cell
//! covering, range merging and partition splitting), the parallel dispatcher
//! and the exact filter into rectangle and radius queries. It also exposes
//! point-level CRUD that writes items in the layout the queries expect.

use crate::codec::PointCodec;
use crate::compute::PartitionScheme;
use crate::config::GeoConfig;
use crate::dispatch::QueryDispatcher;
use crate::index::CellCoverer;
use crate::storage::{GeoStore, KeySchema};
use std::fmt;
use std::sync::Arc;

mod points;
mod query;

pub use query::QueryPlan;

/// Geospatial secondary index over a hash-partitioned, range-sorted store.
///
/// A `GeoIndex` is immutable after construction and safe to share between
/// threads; every query owns its own task set and result sink. Build one with
/// [`GeoIndexBuilder`](crate::GeoIndexBuilder).
///
/// # Examples
///
/// ```rust
/// use geodex::{GeoConfig, GeoIndex, GeoPoint, MemoryStore, PutPointRequest};
/// use std::sync::Arc;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let index = GeoIndex::builder(Arc::new(MemoryStore::new()))
///     .config(GeoConfig::new("cafes").with_worker_threads(2))
///     .build()?;
///
/// let pike_place = GeoPoint::new(47.6097, -122.3422);
/// index.put_point(PutPointRequest::new(pike_place, "pike-place").with_attribute("name", "Market"))?;
///
/// let nearby = index.query_radius(GeoPoint::new(47.6095, -122.3420), 500.0)?;
/// assert_eq!(nearby.items.len(), 1);
/// assert_eq!(nearby.items[0]["name"], "Market");
/// # Ok(())
/// # }
/// ```
pub struct GeoIndex {
    store: Arc<dyn GeoStore>,
    config: GeoConfig,
    schema: KeySchema,
    scheme: PartitionScheme,
    codec: PointCodec,
    coverer: Arc<dyn CellCoverer>,
    dispatcher: QueryDispatcher,
}

impl GeoIndex {
    pub(crate) fn from_parts(
        store: Arc<dyn GeoStore>,
        config: GeoConfig,
        scheme: PartitionScheme,
        coverer: Arc<dyn CellCoverer>,
        dispatcher: QueryDispatcher,
    ) -> Self {
        Self {
            schema: KeySchema::from_config(&config),
            codec: PointCodec::new(config.point_attribute.clone()),
            store,
            config,
            scheme,
            coverer,
            dispatcher,
        }
    }

    /// Start building an index over `store`.
    pub fn builder(store: Arc<dyn GeoStore>) -> crate::GeoIndexBuilder {
        crate::GeoIndexBuilder::new(store)
    }

    pub fn config(&self) -> &GeoConfig {
        &self.config
    }

    pub fn schema(&self) -> &KeySchema {
        &self.schema
    }

    pub fn partition_scheme(&self) -> PartitionScheme {
        self.scheme
    }

    pub fn codec(&self) -> &PointCodec {
        &self.codec
    }

    pub fn store(&self) -> &Arc<dyn GeoStore> {
        &self.store
    }

    /// Number of workers available to range scans.
    pub fn worker_threads(&self) -> usize {
        self.dispatcher.threads()
    }
}

impl fmt::Debug for GeoIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeoIndex")
            .field("table", &self.config.table_name)
            .field("partition_span", &self.scheme.span())
            .field("workers", &self.dispatcher.threads())
            .finish_non_exhaustive()
    }
}
