//! Handler for file uploads attached to `file` fields.
//!
//! The client uploads each file first, then references the returned URL in
//! the entry it submits.

use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// POST /api/v1/uploads
///
/// Accepts a multipart form with a required `file` field. Returns
/// `{ url, name }` for the stored file, or 502 if storage fails.
pub async fn upload_file(
    user: AuthUser,
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> AppResult<impl IntoResponse> {
    let mut file_data: Option<(String, Vec<u8>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let filename = field.file_name().unwrap_or("upload").to_string();
        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(e.to_string()))?;
        file_data = Some((filename, data.to_vec()));
    }

    let (filename, data) =
        file_data.ok_or_else(|| AppError::BadRequest("Missing required 'file' field".into()))?;

    let uploaded = state
        .uploads
        .upload(&filename, &data)
        .await
        .inspect_err(|err| {
            tracing::warn!(user_id = user.user_id, file = %filename, error = %err, "Upload failed");
        })?;

    tracing::info!(
        user_id = user.user_id,
        url = %uploaded.url,
        bytes = data.len(),
        "File uploaded",
    );

    Ok((StatusCode::CREATED, Json(DataResponse { data: uploaded })))
}
