use std::sync::Arc;

use crate::config::Config;
use crate::llm_client::ChatBackend;
use crate::retention::cache::BundleCache;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Model backend. Production: `LlmClient`.
    pub llm: Arc<dyn ChatBackend>,
    /// Pluggable bundle cache. Default: MokaBundleCache. Disabled via CACHE_MAX_CAPACITY=0.
    pub cache: Arc<dyn BundleCache>,
    pub config: Config,
}
