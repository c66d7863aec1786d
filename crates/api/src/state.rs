use std::sync::Arc;

use logbook_core::store::{EntryStore, TemplateStore};
use logbook_core::upload::UploadService;

use crate::auth::jwt::TokenVerifier;
use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    pub templates: Arc<dyn TemplateStore>,
    pub entries: Arc<dyn EntryStore>,
    /// Storage for files attached to `file` fields.
    pub uploads: Arc<dyn UploadService>,
    /// Access-token verifier, keyed from `config.jwt`.
    pub tokens: Arc<TokenVerifier>,
    /// Database connection pool; `None` when running on in-memory stores.
    pub pool: Option<logbook_db::DbPool>,
    /// Server configuration (accessed by middleware and handlers).
    pub config: Arc<ServerConfig>,
}
