use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::pagination::ContentBlock;

/// Supplies the most recently measured content tree.
///
/// Asked only after the scheduler's deferral has elapsed, so implementations can assume
/// the off-screen measurement pass has had time to finish.
#[async_trait]
pub trait MeasurementSource: Send + Sync {
    /// `None` when nothing has been measured yet.
    async fn measured_tree(&self) -> Option<ContentBlock>;
}

/// In-memory document fed by the preview API.
#[derive(Debug, Default)]
pub struct PreviewDocument {
    root: RwLock<Option<ContentBlock>>,
}

impl PreviewDocument {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn replace(&self, root: ContentBlock) {
        *self.root.write().await = Some(root);
    }
}

#[async_trait]
impl MeasurementSource for PreviewDocument {
    async fn measured_tree(&self) -> Option<ContentBlock> {
        self.root.read().await.clone()
    }
}
