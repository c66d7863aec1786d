use axum::routing::{get, patch, post};
use axum::Router;

use crate::handlers::entries;
use crate::state::AppState;

/// Entry routes mounted at `/entries`.
///
/// ```text
/// GET   /              -> list_entries
/// POST  /              -> create_entry
/// GET   /{id}          -> get_entry
/// PUT   /{id}          -> update_draft
/// GET   /{id}/display  -> display_entry
/// POST  /{id}/submit   -> submit_entry
/// POST  /{id}/review   -> review_entry
/// PATCH /{id}/status   -> update_status
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(entries::list_entries).post(entries::create_entry))
        .route(
            "/{id}",
            get(entries::get_entry).put(entries::update_draft),
        )
        .route("/{id}/display", get(entries::display_entry))
        .route("/{id}/submit", post(entries::submit_entry))
        .route("/{id}/review", post(entries::review_entry))
        .route("/{id}/status", patch(entries::update_status))
}
