use axum::routing::{get, post};
use axum::Router;

use crate::handlers::templates;
use crate::state::AppState;

/// Template routes mounted at `/templates`.
///
/// ```text
/// GET    /               -> list_templates
/// POST   /               -> create_template
/// POST   /preview        -> preview_schema
/// GET    /{id}           -> get_template
/// PUT    /{id}           -> update_template
/// DELETE /{id}           -> deactivate_template
/// GET    /{id}/fields    -> list_fields
/// POST   /{id}/validate  -> validate_values
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(templates::list_templates).post(templates::create_template),
        )
        .route("/preview", post(templates::preview_schema))
        .route(
            "/{id}",
            get(templates::get_template)
                .put(templates::update_template)
                .delete(templates::deactivate_template),
        )
        .route("/{id}/fields", get(templates::list_fields))
        .route("/{id}/validate", post(templates::validate_values))
}
