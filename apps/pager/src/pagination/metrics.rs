//! The seam between the engine and whatever measured the content tree.

use crate::pagination::block::{BoxMetrics, ContentBlock};

/// Supplies rendered geometry for a block.
///
/// Implementations must reflect a completed layout of the whole tree; the engine takes
/// whatever is reported at face value.
pub trait BoxMetricsProvider {
    fn box_metrics(&self, block: &ContentBlock) -> BoxMetrics;
}

/// Reads the metrics the layout pass stored on each block.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmbeddedMetrics;

impl BoxMetricsProvider for EmbeddedMetrics {
    fn box_metrics(&self, block: &ContentBlock) -> BoxMetrics {
        block.metrics
    }
}

impl<F> BoxMetricsProvider for F
where
    F: Fn(&ContentBlock) -> BoxMetrics,
{
    fn box_metrics(&self, block: &ContentBlock) -> BoxMetrics {
        self(block)
    }
}
