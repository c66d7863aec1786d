//! Handlers for logbook entries.
//!
//! Students create and submit entries against a template; teachers review
//! them. Students only ever see their own entries.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use logbook_core::entry::{
    check_submittable, prepare_entry, prepare_values, validate_remarks, Entry, EntryFilter,
    EntryStatus, EntrySubmission,
};
use logbook_core::error::CoreError;
use logbook_core::form::{FileUploads, RawValues};
use logbook_core::store::entry_locked;
use logbook_core::types::DbId;
use serde::Deserialize;

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::{RequireStudent, RequireTeacher};
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

/// Body of `PUT /entries/{id}`: a full replacement of a draft's values.
#[derive(Debug, Deserialize)]
pub struct UpdateDraftRequest {
    #[serde(default)]
    pub values: RawValues,
    #[serde(default)]
    pub uploads: FileUploads,
    pub student_remarks: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ReviewRequest {
    pub teacher_remarks: Option<String>,
}

/// Body of `PATCH /entries/{id}/status`.
#[derive(Debug, Deserialize)]
pub struct StatusUpdateRequest {
    pub status: EntryStatus,
    pub teacher_remarks: Option<String>,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Load an entry the caller is allowed to see. Students only see their own.
async fn load_visible_entry(state: &AppState, user: &AuthUser, id: DbId) -> AppResult<Entry> {
    let entry = state.entries.get(id).await?;
    if user.is_student() && entry.student_id != user.user_id {
        return Err(CoreError::Forbidden(format!("Entry {id} belongs to another student")).into());
    }
    Ok(entry)
}

// ---------------------------------------------------------------------------
// Student endpoints
// ---------------------------------------------------------------------------

/// POST /api/v1/entries
///
/// Create an entry as `DRAFT` or `SUBMITTED` (the default). Submitted
/// entries must pass validation; failures return 422 with the missing and
/// invalid field names.
pub async fn create_entry(
    RequireStudent(student): RequireStudent,
    State(state): State<AppState>,
    Json(submission): Json<EntrySubmission>,
) -> AppResult<impl IntoResponse> {
    let template = state.templates.get(submission.template_id).await?;
    let upload_count = submission.uploads.len();

    let created = match prepare_entry(&template, submission, student.user_id) {
        Ok(new_entry) => state.entries.create(new_entry).await,
        Err(err) => Err(err),
    };
    let entry = created.inspect_err(|err| {
        if upload_count > 0 {
            tracing::warn!(
                template_id = template.id,
                student_id = student.user_id,
                upload_count,
                error = %err,
                "Entry rejected; its uploaded files are now orphaned",
            );
        }
    })?;

    tracing::info!(
        entry_id = entry.id,
        template_id = entry.template_id,
        student_id = entry.student_id,
        status = %entry.status,
        "Entry created",
    );

    Ok((StatusCode::CREATED, Json(DataResponse { data: entry })))
}

/// PUT /api/v1/entries/{id}
///
/// Replace the values of one of the caller's drafts. Values are stored
/// unvalidated; validation happens on submit.
pub async fn update_draft(
    RequireStudent(student): RequireStudent,
    State(state): State<AppState>,
    Path(entry_id): Path<DbId>,
    Json(input): Json<UpdateDraftRequest>,
) -> AppResult<impl IntoResponse> {
    let entry = load_visible_entry(&state, &student, entry_id).await?;
    if entry.status != EntryStatus::Draft {
        return Err(entry_locked(entry_id, entry.status).into());
    }
    validate_remarks(input.student_remarks.as_deref())?;

    let template = state.templates.get(entry.template_id).await?;
    let dynamic_fields =
        prepare_values(&template, EntryStatus::Draft, &input.values, &input.uploads)?;

    let entry = state
        .entries
        .update_values(entry_id, dynamic_fields, input.student_remarks)
        .await?;

    tracing::info!(entry_id, student_id = student.user_id, "Draft entry updated");

    Ok(Json(DataResponse { data: entry }))
}

/// POST /api/v1/entries/{id}/submit
///
/// Move one of the caller's drafts to `SUBMITTED` after re-validating its
/// stored values against the template.
pub async fn submit_entry(
    RequireStudent(student): RequireStudent,
    State(state): State<AppState>,
    Path(entry_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let entry = load_visible_entry(&state, &student, entry_id).await?;
    let template = state.templates.get(entry.template_id).await?;
    check_submittable(&template, &entry)?;

    let entry = state
        .entries
        .update_status(entry_id, EntryStatus::Draft, EntryStatus::Submitted, None)
        .await?;

    tracing::info!(entry_id, student_id = student.user_id, "Entry submitted");

    Ok(Json(DataResponse { data: entry }))
}

// ---------------------------------------------------------------------------
// Teacher endpoints
// ---------------------------------------------------------------------------

/// POST /api/v1/entries/{id}/review
pub async fn review_entry(
    RequireTeacher(teacher): RequireTeacher,
    State(state): State<AppState>,
    Path(entry_id): Path<DbId>,
    Json(input): Json<ReviewRequest>,
) -> AppResult<impl IntoResponse> {
    validate_remarks(input.teacher_remarks.as_deref())?;

    let entry = state.entries.get(entry_id).await?;
    entry.status.transition(EntryStatus::Reviewed)?;

    let entry = state
        .entries
        .update_status(
            entry_id,
            EntryStatus::Submitted,
            EntryStatus::Reviewed,
            input.teacher_remarks,
        )
        .await?;

    tracing::info!(entry_id, teacher_id = teacher.user_id, "Entry reviewed");

    Ok(Json(DataResponse { data: entry }))
}

// ---------------------------------------------------------------------------
// Shared endpoints
// ---------------------------------------------------------------------------

/// GET /api/v1/entries
///
/// Students are always scoped to their own entries, whatever `student_id`
/// they pass.
pub async fn list_entries(
    user: AuthUser,
    State(state): State<AppState>,
    Query(mut filter): Query<EntryFilter>,
) -> AppResult<impl IntoResponse> {
    if user.is_student() {
        filter.student_id = Some(user.user_id);
    }
    let entries = state.entries.list(&filter).await?;
    Ok(Json(DataResponse { data: entries }))
}

/// GET /api/v1/entries/{id}
pub async fn get_entry(
    user: AuthUser,
    State(state): State<AppState>,
    Path(entry_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let entry = load_visible_entry(&state, &user, entry_id).await?;
    Ok(Json(DataResponse { data: entry }))
}

/// GET /api/v1/entries/{id}/display
///
/// Stored groups sorted by their sequence, without the personal-info group.
pub async fn display_entry(
    user: AuthUser,
    State(state): State<AppState>,
    Path(entry_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let entry = load_visible_entry(&state, &user, entry_id).await?;
    Ok(Json(DataResponse {
        data: entry.dynamic_fields.display_groups(),
    }))
}

/// PATCH /api/v1/entries/{id}/status
///
/// Generic status change. The move itself is checked first, so an illegal
/// transition is a 409 regardless of role. `SUBMITTED` is reserved to the
/// owning student (with re-validation), `REVIEWED` to teachers.
pub async fn update_status(
    user: AuthUser,
    State(state): State<AppState>,
    Path(entry_id): Path<DbId>,
    Json(input): Json<StatusUpdateRequest>,
) -> AppResult<impl IntoResponse> {
    let entry = load_visible_entry(&state, &user, entry_id).await?;
    let from = entry.status;
    let to = from.transition(input.status)?;

    let teacher_remarks = match to {
        EntryStatus::Submitted => {
            if !user.is_student() {
                return Err(CoreError::Forbidden(
                    "Only the owning student can submit an entry".into(),
                )
                .into());
            }
            let template = state.templates.get(entry.template_id).await?;
            check_submittable(&template, &entry)?;
            None
        }
        EntryStatus::Reviewed => {
            if !user.is_teacher() {
                return Err(
                    CoreError::Forbidden("Only teachers can review entries".into()).into(),
                );
            }
            validate_remarks(input.teacher_remarks.as_deref())?;
            input.teacher_remarks
        }
        EntryStatus::Draft => {
            return Err(CoreError::InvalidTransition {
                from,
                to: EntryStatus::Draft,
            }
            .into())
        }
    };

    let entry = state
        .entries
        .update_status(entry_id, from, to, teacher_remarks)
        .await?;

    tracing::info!(
        entry_id,
        user_id = user.user_id,
        from = %from,
        to = %to,
        "Entry status changed",
    );

    Ok(Json(DataResponse { data: entry }))
}
