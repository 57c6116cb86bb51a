use std::sync::Arc;

use crate::auth::AuthGate;
use crate::render::PreviewRenderer;
use crate::review::analyzer::ResumeAnalyzer;
use crate::store::{BlobStore, RecordStore};

/// Shared application state injected into all route handlers via Axum
/// extractors. The external capabilities sit behind trait objects so the
/// pipelines can be exercised against in-memory implementations.
#[derive(Clone)]
pub struct AppState {
    pub records: Arc<dyn RecordStore>,
    pub blobs: Arc<dyn BlobStore>,
    pub renderer: Arc<dyn PreviewRenderer>,
    pub analyzer: Arc<dyn ResumeAnalyzer>,
    pub auth: Arc<dyn AuthGate>,
}
