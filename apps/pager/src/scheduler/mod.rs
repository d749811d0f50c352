//! Scheduling Adapter — re-paginates the live preview when its content or capacity changes.
//!
//! # Deferral
//! A request waits for the next display-frame boundary, then a short settle delay, so the
//! off-screen measurement pass can finish before the tree is read.
//!
//! # Cancel-and-replace
//! A new request aborts whatever is still waiting and schedules a fresh frame + delay pair.
//! The latest request always wins; intermediate states are never paginated.
//!
//! # Passes
//! Pagination is CPU-bound, so it runs under `spawn_blocking` with the scheduler's
//! [`BoxMetricsProvider`] (embedded metrics unless one is supplied). A pass lock is moved
//! into the blocking closure: aborting the waiting task cannot release it early, so two
//! passes never overlap. Results are published atomically through a `watch` channel; a pass older than
//! the latest published revision is discarded.

pub mod handlers;
pub mod source;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{sleep, sleep_until, Instant};
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::pagination::{
    paginate_with, BoxMetricsProvider, EmbeddedMetrics, PageCapacity, PaginationResult,
};

pub use source::{MeasurementSource, PreviewDocument};

// ────────────────────────────────────────────────────────────────────────────
// Types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerTiming {
    /// Display-frame period; the first wait ends on the next boundary.
    pub frame_interval: Duration,
    /// Fixed delay after the frame boundary.
    pub settle_delay: Duration,
}

impl Default for SchedulerTiming {
    fn default() -> Self {
        Self {
            frame_interval: Duration::from_millis(16),
            settle_delay: Duration::from_millis(50),
        }
    }
}

/// Result of one completed repagination pass.
#[derive(Debug, Clone, Serialize)]
pub struct PreviewSnapshot {
    pub run_id: Uuid,
    /// Request counter value that produced this pass.
    pub revision: u64,
    pub completed_at: DateTime<Utc>,
    pub result: PaginationResult,
}

type Published = Option<Arc<PreviewSnapshot>>;

// ────────────────────────────────────────────────────────────────────────────
// Scheduler
// ────────────────────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct RepaginationScheduler {
    shared: Arc<Shared>,
    pending: Arc<Mutex<Option<JoinHandle<()>>>>,
}

struct Shared {
    source: Arc<dyn MeasurementSource>,
    provider: Arc<dyn BoxMetricsProvider + Send + Sync>,
    capacity: watch::Sender<PageCapacity>,
    timing: SchedulerTiming,
    /// Frame boundaries are aligned to this instant.
    epoch: Instant,
    revision: AtomicU64,
    pass_lock: Arc<tokio::sync::Mutex<()>>,
    published: watch::Sender<Published>,
}

impl RepaginationScheduler {
    pub fn new(
        source: Arc<dyn MeasurementSource>,
        capacity: PageCapacity,
        timing: SchedulerTiming,
    ) -> Self {
        Self::with_provider(source, Arc::new(EmbeddedMetrics), capacity, timing)
    }

    /// Like [`RepaginationScheduler::new`], but every pass asks `provider` for geometry
    /// instead of reading the metrics stored on the tree.
    pub fn with_provider(
        source: Arc<dyn MeasurementSource>,
        provider: Arc<dyn BoxMetricsProvider + Send + Sync>,
        capacity: PageCapacity,
        timing: SchedulerTiming,
    ) -> Self {
        let (capacity, _) = watch::channel(capacity);
        let (published, _) = watch::channel(None);
        Self {
            shared: Arc::new(Shared {
                source,
                provider,
                capacity,
                timing,
                epoch: Instant::now(),
                revision: AtomicU64::new(0),
                pass_lock: Arc::new(tokio::sync::Mutex::new(())),
                published,
            }),
            pending: Arc::new(Mutex::new(None)),
        }
    }

    pub fn capacity(&self) -> PageCapacity {
        *self.shared.capacity.borrow()
    }

    /// Stores a new capacity and schedules a pass that uses it. Returns the request revision.
    pub fn set_capacity(&self, capacity: PageCapacity) -> u64 {
        self.shared.capacity.send_replace(capacity);
        info!(capacity = capacity.get(), "page capacity changed");
        self.request_repagination()
    }

    /// Schedules a pass, superseding any request still waiting. Returns the request revision.
    ///
    /// Must be called from within a tokio runtime.
    pub fn request_repagination(&self) -> u64 {
        let revision = self.shared.revision.fetch_add(1, Ordering::SeqCst) + 1;

        let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(previous) = pending.take() {
            if !previous.is_finished() {
                debug!(revision, "superseding pending repagination");
            }
            previous.abort();
        }
        *pending = Some(tokio::spawn(Arc::clone(&self.shared).run(revision)));

        revision
    }

    pub fn subscribe(&self) -> watch::Receiver<Published> {
        self.shared.published.subscribe()
    }

    pub fn latest(&self) -> Published {
        self.shared.published.borrow().clone()
    }
}

impl Shared {
    async fn run(self: Arc<Self>, revision: u64) {
        sleep_until(self.next_frame()).await;
        sleep(self.timing.settle_delay).await;

        let Some(tree) = self.source.measured_tree().await else {
            debug!(revision, "nothing measured yet; skipping repagination");
            return;
        };
        let capacity = *self.capacity.borrow();

        let provider = Arc::clone(&self.provider);
        let guard = Arc::clone(&self.pass_lock).lock_owned().await;
        let outcome = tokio::task::spawn_blocking(move || {
            let _guard = guard;
            paginate_with(&tree, capacity, provider.as_ref())
        })
        .await;

        match outcome {
            Ok(result) => self.publish(revision, result),
            Err(e) => error!(revision, "repagination pass failed: {e}"),
        }
    }

    fn next_frame(&self) -> Instant {
        let now = Instant::now();
        let frame = self.timing.frame_interval.as_nanos();
        if frame == 0 {
            return now;
        }
        let into_frame = now.duration_since(self.epoch).as_nanos() % frame;
        now + Duration::from_nanos((frame - into_frame) as u64)
    }

    fn publish(&self, revision: u64, result: PaginationResult) {
        let pages = result.page_count();
        let snapshot = Arc::new(PreviewSnapshot {
            run_id: Uuid::new_v4(),
            revision,
            completed_at: Utc::now(),
            result,
        });

        let accepted = self.published.send_if_modified(|current| {
            if current.as_ref().is_some_and(|s| s.revision > revision) {
                return false;
            }
            *current = Some(snapshot);
            true
        });

        if accepted {
            info!(revision, pages, "preview repaginated");
        } else {
            debug!(revision, "discarding stale repagination result");
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
