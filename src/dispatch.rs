//! Parallel execution of partition-scoped range scans.
//!
//! Every [`DispatchTask`] becomes one paginated scan run on a bounded rayon
//! pool. Results from all tasks land in a shared [`CandidateSink`]. The first
//! failing scan raises a cancellation flag: tasks that have not started yet
//! never issue a request, and running tasks drop the page in flight and stop.

use crate::error::{GeoError, Result, StoreError};
use crate::storage::{GeoStore, KeySchema, ScanRequest};
use crate::types::{DispatchTask, Item};
use parking_lot::Mutex;
use rayon::ThreadPool;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// Append-only collection of scan results shared by all workers of one query.
#[derive(Debug, Default)]
pub struct CandidateSink {
    items: Mutex<Vec<Item>>,
    pages: AtomicUsize,
}

impl CandidateSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn extend(&self, items: Vec<Item>) {
        self.pages.fetch_add(1, Ordering::Relaxed);
        if !items.is_empty() {
            self.items.lock().extend(items);
        }
    }

    pub fn pages(&self) -> usize {
        self.pages.load(Ordering::Relaxed)
    }

    pub fn into_items(self) -> Vec<Item> {
        self.items.into_inner()
    }
}

/// Query-wide failure state. The first recorded error wins.
#[derive(Debug, Default)]
pub struct CancellationFlag {
    cancelled: AtomicBool,
    first_error: Mutex<Option<(usize, StoreError)>>,
}

impl CancellationFlag {
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    fn fail(&self, task: usize, err: StoreError) {
        let mut slot = self.first_error.lock();
        if slot.is_none() {
            *slot = Some((task, err));
        }
        self.cancelled.store(true, Ordering::Release);
    }

    fn into_error(self) -> Option<(usize, StoreError)> {
        self.first_error.into_inner()
    }
}

/// Candidates gathered by a successful dispatch.
#[derive(Debug, Default)]
pub struct Dispatched {
    pub items: Vec<Item>,
    pub pages: usize,
}

/// Runs range scans on a bounded worker pool.
#[derive(Clone)]
pub struct QueryDispatcher {
    pool: Arc<ThreadPool>,
}

impl QueryDispatcher {
    pub fn new(pool: Arc<ThreadPool>) -> Self {
        Self { pool }
    }

    /// Build a dedicated pool with `threads` workers.
    pub fn with_threads(threads: usize) -> Result<Self> {
        if threads == 0 {
            return Err(GeoError::InvalidConfig(
                "worker pool needs at least one thread".into(),
            ));
        }
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("geodex-scan-{i}"))
            .build()
            .map_err(|e| GeoError::WorkerPool(e.to_string()))?;
        Ok(Self::new(Arc::new(pool)))
    }

    pub fn threads(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Scan every task and collect all returned items.
    ///
    /// Blocks until every started scan has finished. On failure the partial
    /// results are discarded and [`GeoError::QueryFailed`] carries the first
    /// store error observed.
    pub fn dispatch(
        &self,
        store: &dyn GeoStore,
        schema: &KeySchema,
        tasks: Vec<DispatchTask>,
    ) -> Result<Dispatched> {
        let task_count = tasks.len();
        if task_count == 0 {
            return Ok(Dispatched::default());
        }

        log::debug!(
            "Dispatching {} range scans on {} workers",
            task_count,
            self.threads()
        );

        let sink = CandidateSink::new();
        let cancel = CancellationFlag::default();

        self.pool.scope_fifo(|scope| {
            for (n, task) in tasks.into_iter().enumerate() {
                let sink = &sink;
                let cancel = &cancel;
                scope.spawn_fifo(move |_| {
                    if cancel.is_cancelled() {
                        log::trace!("Skipping range scan {} after cancellation", n);
                        return;
                    }
                    if let Err(err) = scan_task(store, schema, &task, sink, cancel) {
                        log::warn!(
                            "Range scan {} on partition {} failed: {}",
                            n,
                            task.partition_key,
                            err
                        );
                        cancel.fail(n, err);
                    }
                });
            }
        });

        if let Some((n, cause)) = cancel.into_error() {
            log::debug!(
                "Query cancelled after scan {} failed, discarding {} partial pages",
                n,
                sink.pages()
            );
            return Err(GeoError::QueryFailed {
                tasks: task_count,
                cause,
            });
        }

        let pages = sink.pages();
        Ok(Dispatched {
            items: sink.into_items(),
            pages,
        })
    }
}

/// Follow continuation tokens until the range is exhausted or the query is cancelled.
fn scan_task(
    store: &dyn GeoStore,
    schema: &KeySchema,
    task: &DispatchTask,
    sink: &CandidateSink,
    cancel: &CancellationFlag,
) -> std::result::Result<(), StoreError> {
    let mut continuation = None;

    loop {
        let request = ScanRequest {
            schema,
            partition_key: task.partition_key,
            range: task.range,
            continuation: continuation.take(),
            consistent_read: false,
        };
        let page = store.scan(&request)?;
        if cancel.is_cancelled() {
            return Ok(());
        }
        sink.extend(page.items);

        match page.continuation {
            Some(token) if !cancel.is_cancelled() => continuation = Some(token),
            _ => return Ok(()),
        }
    }
}
