// Content pagination: partitions a measured block tree into pages of bounded height.
// The engine is a pure, synchronous pass; callers on the async side run it inside
// tokio::task::spawn_blocking.

pub mod block;
pub mod capacity;
pub mod engine;
pub mod fragment;
pub mod handlers;
pub mod metrics;

// Re-export the public API consumed by the scheduler and route handlers.
pub use block::{BoxMetrics, ContentBlock};
pub use capacity::{CapacityError, PageCapacity, PageGeometry};
pub use engine::{paginate, paginate_with};
pub use fragment::{Fragment, FragmentKind, Page, PaginationResult};
pub use metrics::{BoxMetricsProvider, EmbeddedMetrics};
