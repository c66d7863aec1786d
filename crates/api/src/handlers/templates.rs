//! Handlers for logbook templates.
//!
//! Admins build templates from a draft schema; every authenticated role can
//! read them, list their fields, and dry-run validation against them.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use logbook_core::form::{render_fields, validate, DraftSchema, RawValues, TemplateBuilder};
use logbook_core::template::{NewTemplate, TemplateFilter, TemplateScope, TemplateType, TemplateUpdate};
use logbook_core::types::DbId;
use serde::Deserialize;

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::RequireTemplateAdmin;
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

/// Body of `POST /templates`. The schema arrives as a builder draft and is
/// finalized server-side.
#[derive(Debug, Deserialize)]
pub struct CreateTemplateRequest {
    pub name: String,
    pub description: Option<String>,
    #[serde(default)]
    pub template_type: TemplateType,
    #[serde(flatten)]
    pub scope: TemplateScope,
    pub dynamic_schema: DraftSchema,
}

/// Body of `PUT /templates/{id}`.
#[derive(Debug, Deserialize)]
pub struct UpdateTemplateRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub dynamic_schema: Option<DraftSchema>,
    /// Revision the editor loaded; stale revisions are rejected with 409.
    pub revision: i32,
}

#[derive(Debug, Deserialize)]
pub struct ValidateRequest {
    #[serde(default)]
    pub values: RawValues,
}

// ---------------------------------------------------------------------------
// Builder endpoints
// ---------------------------------------------------------------------------

/// POST /api/v1/templates/preview
///
/// Finalize a draft without saving it. Returns the cleaned schema, or 422
/// with every schema problem found.
pub async fn preview_schema(
    RequireTemplateAdmin(_admin): RequireTemplateAdmin,
    Json(draft): Json<DraftSchema>,
) -> AppResult<impl IntoResponse> {
    let schema = TemplateBuilder::from_draft(draft).finalize()?;
    Ok(Json(DataResponse { data: schema }))
}

/// POST /api/v1/templates
pub async fn create_template(
    RequireTemplateAdmin(admin): RequireTemplateAdmin,
    State(state): State<AppState>,
    Json(input): Json<CreateTemplateRequest>,
) -> AppResult<impl IntoResponse> {
    let dynamic_schema = TemplateBuilder::from_draft(input.dynamic_schema).finalize()?;

    let new_template = NewTemplate {
        name: input.name.trim().to_string(),
        description: input.description,
        template_type: input.template_type,
        scope: input.scope,
        dynamic_schema,
        created_by: Some(admin.user_id),
    };
    new_template.validate()?;

    let template = state.templates.create(new_template).await?;

    tracing::info!(
        template_id = template.id,
        name = %template.name,
        template_type = %template.template_type,
        fields = template.dynamic_schema.field_count(),
        user_id = admin.user_id,
        "Template created",
    );

    Ok((StatusCode::CREATED, Json(DataResponse { data: template })))
}

// ---------------------------------------------------------------------------
// Read endpoints
// ---------------------------------------------------------------------------

/// GET /api/v1/templates
///
/// Only template admins can see deactivated templates; `include_inactive` is
/// ignored for everyone else.
pub async fn list_templates(
    user: AuthUser,
    State(state): State<AppState>,
    Query(mut filter): Query<TemplateFilter>,
) -> AppResult<impl IntoResponse> {
    if !user.role.can_manage_templates() {
        filter.include_inactive = false;
    }
    let templates = state.templates.list(&filter).await?;
    Ok(Json(DataResponse { data: templates }))
}

/// GET /api/v1/templates/{id}
pub async fn get_template(
    _user: AuthUser,
    State(state): State<AppState>,
    Path(template_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let template = state.templates.get(template_id).await?;
    Ok(Json(DataResponse { data: template }))
}

/// GET /api/v1/templates/{id}/fields
///
/// Every field in display order, each tagged with its group name.
pub async fn list_fields(
    _user: AuthUser,
    State(state): State<AppState>,
    Path(template_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let template = state.templates.get(template_id).await?;
    Ok(Json(DataResponse {
        data: render_fields(&template.dynamic_schema),
    }))
}

/// POST /api/v1/templates/{id}/validate
///
/// Dry run: always 200, with `ok`, `missing_fields`, `invalid_fields`, and `warnings`.
pub async fn validate_values(
    _user: AuthUser,
    State(state): State<AppState>,
    Path(template_id): Path<DbId>,
    Json(input): Json<ValidateRequest>,
) -> AppResult<impl IntoResponse> {
    let template = state.templates.get(template_id).await?;
    let result = validate(&template.dynamic_schema, &input.values);
    Ok(Json(DataResponse { data: result }))
}

// ---------------------------------------------------------------------------
// Admin mutations
// ---------------------------------------------------------------------------

/// PUT /api/v1/templates/{id}
///
/// Name and description can always change. The store refuses a schema change
/// once any entry references the template, since stored values are keyed by it.
pub async fn update_template(
    RequireTemplateAdmin(admin): RequireTemplateAdmin,
    State(state): State<AppState>,
    Path(template_id): Path<DbId>,
    Json(input): Json<UpdateTemplateRequest>,
) -> AppResult<impl IntoResponse> {
    let dynamic_schema = input
        .dynamic_schema
        .map(|draft| TemplateBuilder::from_draft(draft).finalize())
        .transpose()?;

    let update = TemplateUpdate {
        name: input.name.map(|n| n.trim().to_string()),
        description: input.description,
        dynamic_schema,
        expected_revision: input.revision,
    };
    update.validate()?;

    let template = state.templates.update(template_id, update).await?;

    tracing::info!(
        template_id,
        revision = template.revision,
        user_id = admin.user_id,
        "Template updated",
    );

    Ok(Json(DataResponse { data: template }))
}

/// DELETE /api/v1/templates/{id}
///
/// Soft delete: the template stops accepting entries and drops out of the
/// default listing. Existing entries keep rendering against it.
pub async fn deactivate_template(
    RequireTemplateAdmin(admin): RequireTemplateAdmin,
    State(state): State<AppState>,
    Path(template_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    state.templates.set_active(template_id, false).await?;

    tracing::info!(template_id, user_id = admin.user_id, "Template deactivated");

    Ok(StatusCode::NO_CONTENT)
}
