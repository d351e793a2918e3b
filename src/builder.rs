//! Index builder for flexible configuration
//!
//! This module provides a builder pattern for creating a [`GeoIndex`] over a
//! store, with optional overrides for the cell coverer, the partition scheme
//! and the worker pool.

use crate::compute::PartitionScheme;
use crate::config::GeoConfig;
use crate::db::GeoIndex;
use crate::dispatch::QueryDispatcher;
use crate::error::Result;
use crate::index::{CellCoverer, S2CellCoverer};
use crate::storage::GeoStore;
use rayon::ThreadPool;
use std::sync::Arc;

/// Builder for a [`GeoIndex`].
pub struct GeoIndexBuilder {
    store: Arc<dyn GeoStore>,
    config: GeoConfig,
    coverer: Option<Arc<dyn CellCoverer>>,
    scheme: Option<PartitionScheme>,
    pool: Option<Arc<ThreadPool>>,
}

impl GeoIndexBuilder {
    /// Create a builder with the default configuration.
    pub fn new(store: Arc<dyn GeoStore>) -> Self {
        Self {
            store,
            config: GeoConfig::default(),
            coverer: None,
            scheme: None,
            pool: None,
        }
    }

    /// Set the index configuration (table, attribute names, key length, workers).
    pub fn config(mut self, config: GeoConfig) -> Self {
        self.config = config;
        self
    }

    /// Replace the S2 coverer built from `config.covering`.
    pub fn coverer(mut self, coverer: Arc<dyn CellCoverer>) -> Self {
        self.coverer = Some(coverer);
        self
    }

    /// Override the partition scheme derived from `config.partition_key_length`.
    ///
    /// Items written through one scheme can only be queried through the same one.
    pub fn partition_scheme(mut self, scheme: PartitionScheme) -> Self {
        self.scheme = Some(scheme);
        self
    }

    /// Share an existing rayon pool instead of building one from
    /// `config.worker_threads`.
    pub fn thread_pool(mut self, pool: Arc<ThreadPool>) -> Self {
        self.pool = Some(pool);
        self
    }

    /// Validate the configuration and assemble the index.
    pub fn build(self) -> Result<GeoIndex> {
        self.config.validate()?;

        let scheme = match self.scheme {
            Some(scheme) => scheme,
            None => PartitionScheme::from_key_length(self.config.partition_key_length)?,
        };
        let coverer: Arc<dyn CellCoverer> = match self.coverer {
            Some(coverer) => coverer,
            None => Arc::new(S2CellCoverer::new(self.config.covering)),
        };
        let dispatcher = match self.pool {
            Some(pool) => QueryDispatcher::new(pool),
            None => QueryDispatcher::with_threads(self.config.worker_threads())?,
        };

        log::debug!(
            "Built geo index on '{}' (partition span {}, {} workers)",
            self.config.table_name,
            scheme.span(),
            dispatcher.threads()
        );

        Ok(GeoIndex::from_parts(
            self.store,
            self.config,
            scheme,
            coverer,
            dispatcher,
        ))
    }
}
