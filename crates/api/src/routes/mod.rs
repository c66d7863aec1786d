pub mod entries;
pub mod health;
pub mod templates;
pub mod uploads;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /templates                                       list, create (create: admin)
/// /templates/preview                               finalize a draft (admin, POST)
/// /templates/{id}                                  get, update, deactivate (update/delete: admin)
/// /templates/{id}/fields                           flattened render list (GET)
/// /templates/{id}/validate                         dry-run validation (POST)
///
/// /entries                                         list, create (create: student)
/// /entries/{id}                                    get, replace draft values (PUT: student)
/// /entries/{id}/display                            sorted display groups (GET)
/// /entries/{id}/submit                             DRAFT -> SUBMITTED (student, POST)
/// /entries/{id}/review                             SUBMITTED -> REVIEWED (teacher, POST)
/// /entries/{id}/status                             generic status change (PATCH)
///
/// /uploads                                         multipart file upload (POST)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/templates", templates::router())
        .nest("/entries", entries::router())
        .nest("/uploads", uploads::router())
}
