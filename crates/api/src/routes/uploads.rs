use axum::routing::post;
use axum::Router;

use crate::handlers::uploads;
use crate::state::AppState;

/// Routes mounted at `/uploads`.
pub fn router() -> Router<AppState> {
    Router::new().route("/", post(uploads::upload_file))
}
