//! Error types for geodex.
//!
//! Store collaborators report failures through [`StoreError`]; everything the
//! query engine surfaces to callers is a [`GeoError`].

use thiserror::Error;

/// Failure reported by a [`GeoStore`](crate::storage::GeoStore) implementation.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("request throttled: {0}")]
    Throttled(String),

    #[error("condition check failed: {0}")]
    ConditionFailed(String),

    #[error("invalid store request: {0}")]
    InvalidRequest(String),

    #[error("store backend error: {0}")]
    Backend(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl StoreError {
    /// Wrap any backend error.
    pub fn backend<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Backend(Box::new(err))
    }
}

/// Errors surfaced by the query engine and the point passthrough operations.
#[derive(Error, Debug)]
pub enum GeoError {
    /// Malformed query shape, rejected before any I/O.
    #[error("invalid query shape: {0}")]
    InvalidShape(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A candidate item carried no decodable point.
    #[error("cannot decode point: {0}")]
    PointDecode(String),

    /// Single-item store failure, surfaced without wrapping.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// A range scan failed; remaining scans were cancelled and partial results discarded.
    #[error("geo query failed after dispatching {tasks} range scans")]
    QueryFailed {
        tasks: usize,
        #[source]
        cause: StoreError,
    },

    #[error("worker pool error: {0}")]
    WorkerPool(String),
}

pub type Result<T> = std::result::Result<T, GeoError>;
