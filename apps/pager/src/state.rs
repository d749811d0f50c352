use std::sync::Arc;

use crate::config::Config;
use crate::scheduler::{PreviewDocument, RepaginationScheduler};

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    /// Latest measured tree submitted for the live preview.
    pub preview: Arc<PreviewDocument>,
    /// Re-paginates `preview` whenever its content or capacity changes.
    pub scheduler: RepaginationScheduler,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let preview = Arc::new(PreviewDocument::new());
        let scheduler =
            RepaginationScheduler::new(preview.clone(), config.page_capacity, config.timing);
        Self {
            config,
            preview,
            scheduler,
        }
    }
}
