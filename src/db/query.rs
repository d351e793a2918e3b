use super::GeoIndex;
use crate::compute::{bounding_rect, filter, merge_sorted};
use crate::error::Result;
use crate::types::{DispatchTask, GeoPoint, LatLngRect, QueryOutcome, QueryShape, QueryStats};

/// Scans a query would issue, before any I/O.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryPlan {
    pub bounds: LatLngRect,
    /// Ranges returned by the coverer, before merging.
    pub covering_ranges: usize,
    pub merged_ranges: usize,
    pub tasks: Vec<DispatchTask>,
}

impl GeoIndex {
    /// Points inside the rectangle spanned by `min` and `max`, edges included.
    ///
    /// A `min.longitude` greater than `max.longitude` selects the box that
    /// wraps across the ±180° meridian.
    pub fn query_rectangle(&self, min: GeoPoint, max: GeoPoint) -> Result<QueryOutcome> {
        self.query(&QueryShape::rectangle(min, max))
    }

    /// Points within `radius_meters` of `center` by great-circle distance.
    pub fn query_radius(&self, center: GeoPoint, radius_meters: f64) -> Result<QueryOutcome> {
        self.query(&QueryShape::radius(center, radius_meters))
    }

    pub fn query(&self, shape: &QueryShape) -> Result<QueryOutcome> {
        let plan = self.plan(shape)?;
        let mut stats = QueryStats {
            covering_ranges: plan.covering_ranges,
            merged_ranges: plan.merged_ranges,
            dispatched_tasks: plan.tasks.len(),
            ..QueryStats::default()
        };

        let dispatched = self
            .dispatcher
            .dispatch(self.store.as_ref(), &self.schema, plan.tasks)?;
        stats.pages_scanned = dispatched.pages;
        stats.candidates = dispatched.items.len();

        let items = filter::filter(dispatched.items, shape, &self.codec)?;
        stats.matched = items.len();

        log::debug!(
            "Query on '{}' matched {} of {} candidates from {} scans",
            self.config.table_name,
            stats.matched,
            stats.candidates,
            stats.dispatched_tasks
        );

        Ok(QueryOutcome { items, stats })
    }

    /// Plan the partition-scoped scans for `shape` without touching the store.
    pub fn plan(&self, shape: &QueryShape) -> Result<QueryPlan> {
        let bounds = bounding_rect(shape)?;
        let covering = self.coverer.cover(&bounds);
        let covering_ranges = covering.len();

        let merged = merge_sorted(covering);
        let tasks = self.scheme.plan_tasks(&merged);

        log::debug!(
            "Planned {} scans from {} covering ranges ({} after merge)",
            tasks.len(),
            covering_ranges,
            merged.len()
        );

        Ok(QueryPlan {
            bounds,
            covering_ranges,
            merged_ranges: merged.len(),
            tasks,
        })
    }
}
