//! HTTP-level integration tests for the `/templates` API endpoints.
//!
//! Uses Axum's tower::ServiceExt to send requests directly to the router
//! over in-memory stores.

mod common;

use axum::http::StatusCode;
use common::{
    body_json, build_test_app, clinical_draft, create_clinical_template, delete, get, post_json,
    put_json,
};
use serde_json::json;

// ---------------------------------------------------------------------------
// Test: creating a template finalizes the draft
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_create_template_finalizes_draft() {
    let app = build_test_app();
    let template = create_clinical_template(&app).await;

    assert_eq!(template["name"], "Clinical case log");
    assert_eq!(template["revision"], 1);
    assert_eq!(template["is_active"], true);
    assert_eq!(template["created_by"], common::ADMIN_ID);

    let groups = template["dynamic_schema"]["groups"].as_array().unwrap();
    assert_eq!(groups.len(), 2);
    assert_eq!(groups[0]["display_order"], 1);
    assert_eq!(groups[1]["display_order"], 2);
    assert_eq!(groups[0]["fields"][0]["field_name"], "patient_name");
    assert_eq!(groups[1]["fields"][1]["field_type"], "select");
}

// ---------------------------------------------------------------------------
// Test: only template admins can create templates
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_create_template_requires_admin() {
    let app = build_test_app();
    let body = json!({ "name": "Nope", "dynamic_schema": clinical_draft() });

    for token in [app.student(), app.teacher()] {
        let response = post_json(app.router(), "/api/v1/templates", &token, body.clone()).await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }
}

// ---------------------------------------------------------------------------
// Test: schema problems are reported together as 422
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_preview_reports_every_schema_problem() {
    let app = build_test_app();
    let draft = json!({
        "groups": [
            {
                "group_name": "Vitals",
                "fields": [
                    { "field_label": "Pulse", "field_type": "number" },
                    { "field_label": "Grade", "field_type": "select", "options": ["  "] }
                ]
            },
            {
                "group_name": "Vitals",
                "fields": [{ "field_label": "Pulse", "field_type": "text" }]
            }
        ]
    });

    let response = post_json(app.router(), "/api/v1/templates/preview", &app.admin(), draft).await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let json = body_json(response).await;
    assert_eq!(json["code"], "INVALID_SCHEMA");
    let kinds: Vec<&str> = json["details"]["problems"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["kind"].as_str().unwrap())
        .collect();
    assert!(kinds.contains(&"duplicate_group_name"));
    assert!(kinds.contains(&"duplicate_field_name"));
    assert!(kinds.contains(&"select_without_options"));
}

#[tokio::test]
async fn test_preview_drops_unlabeled_fields() {
    let app = build_test_app();
    let draft = json!({
        "groups": [
            { "group_name": "Empty", "fields": [{ "field_label": "   " }] },
            {
                "group_name": "Notes",
                "fields": [
                    { "field_label": "Summary", "field_type": "textarea" },
                    { "field_label": "" }
                ]
            }
        ]
    });

    let response = post_json(app.router(), "/api/v1/templates/preview", &app.admin(), draft).await;
    assert_eq!(response.status(), StatusCode::OK);

    let groups = body_json(response).await["data"]["groups"].clone();
    assert_eq!(groups.as_array().unwrap().len(), 1);
    assert_eq!(groups[0]["group_name"], "Notes");
    assert_eq!(groups[0]["display_order"], 1);
    assert_eq!(groups[0]["fields"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_empty_draft_is_rejected() {
    let app = build_test_app();
    let response = post_json(
        app.router(),
        "/api/v1/templates",
        &app.admin(),
        json!({ "name": "Blank", "dynamic_schema": { "groups": [] } }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let json = body_json(response).await;
    assert_eq!(json["details"]["problems"][0]["kind"], "empty_schema");
}

// ---------------------------------------------------------------------------
// Test: subject templates need their full academic scope
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_subject_template_requires_scope() {
    let app = build_test_app();
    let response = post_json(
        app.router(),
        "/api/v1/templates",
        &app.admin(),
        json!({
            "name": "Anatomy practicals",
            "template_type": "subject",
            "academic_year_id": 2026,
            "dynamic_schema": clinical_draft(),
        }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "VALIDATION_ERROR");

    let response = post_json(
        app.router(),
        "/api/v1/templates",
        &app.admin(),
        json!({
            "name": "Anatomy practicals",
            "template_type": "subject",
            "academic_year_id": 2026,
            "batch_id": 3,
            "subject_id": 12,
            "module_id": 4,
            "dynamic_schema": clinical_draft(),
        }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let template = body_json(response).await["data"].clone();
    assert_eq!(template["subject_id"], 12);

    // Filtering by scope finds it.
    let response = get(
        app.router(),
        "/api/v1/templates?subject_id=12&template_type=subject",
        &app.student(),
    )
    .await;
    let listed = body_json(response).await["data"].clone();
    assert_eq!(listed.as_array().unwrap().len(), 1);

    let response = get(app.router(), "/api/v1/templates?subject_id=99", &app.student()).await;
    assert!(body_json(response).await["data"].as_array().unwrap().is_empty());
}

// ---------------------------------------------------------------------------
// Test: render list and validation dry run
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_fields_are_listed_in_display_order() {
    let app = build_test_app();
    let template = create_clinical_template(&app).await;
    let uri = format!("/api/v1/templates/{}/fields", template["id"]);

    let response = get(app.router(), &uri, &app.student()).await;
    assert_eq!(response.status(), StatusCode::OK);

    let fields = body_json(response).await["data"].clone();
    let names: Vec<&str> = fields
        .as_array()
        .unwrap()
        .iter()
        .map(|f| f["field_name"].as_str().unwrap())
        .collect();
    assert_eq!(names, ["patient_name", "temperature", "severity", "scan"]);
    assert_eq!(fields[0]["group_name"], "Case Details");
    assert_eq!(fields[2]["options"], json!(["Mild", "Moderate", "Severe"]));
}

#[tokio::test]
async fn test_validate_dry_run_reports_missing_and_warnings() {
    let app = build_test_app();
    let template = create_clinical_template(&app).await;
    let uri = format!("/api/v1/templates/{}/validate", template["id"]);

    let response = post_json(
        app.router(),
        &uri,
        &app.student(),
        json!({ "values": { "patient_name": "  ", "severity": "Critical" } }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let result = body_json(response).await["data"].clone();
    assert_eq!(result["ok"], false);
    assert_eq!(result["missing_fields"], json!(["patient_name", "temperature"]));
    assert_eq!(result["invalid_fields"], json!([]));
    assert_eq!(result["warnings"][0]["field_name"], "severity");

    let response = post_json(
        app.router(),
        &uri,
        &app.student(),
        json!({ "values": { "patient_name": "R. Iyer", "temperature": 38.2 } }),
    )
    .await;
    assert_eq!(body_json(response).await["data"]["ok"], true);
}

// ---------------------------------------------------------------------------
// Test: updates are revision-checked
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_update_with_stale_revision_conflicts() {
    let app = build_test_app();
    let template = create_clinical_template(&app).await;
    let uri = format!("/api/v1/templates/{}", template["id"]);

    let response = put_json(
        app.router(),
        &uri,
        &app.admin(),
        json!({ "name": "Clinical case log (2026)", "revision": 1 }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let updated = body_json(response).await["data"].clone();
    assert_eq!(updated["revision"], 2);
    assert_eq!(updated["name"], "Clinical case log (2026)");

    let response = put_json(
        app.router(),
        &uri,
        &app.admin(),
        json!({ "name": "Lost update", "revision": 1 }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_schema_is_frozen_once_entries_exist() {
    let app = build_test_app();
    let template = create_clinical_template(&app).await;
    let uri = format!("/api/v1/templates/{}", template["id"]);

    let response = post_json(
        app.router(),
        "/api/v1/entries",
        &app.student(),
        json!({ "template_id": template["id"], "status": "DRAFT" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = put_json(
        app.router(),
        &uri,
        &app.admin(),
        json!({
            "dynamic_schema": { "groups": [{ "group_name": "Other", "fields": [{ "field_label": "X" }] }] },
            "revision": 1,
        }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    // Renaming is still allowed.
    let response = put_json(
        app.router(),
        &uri,
        &app.admin(),
        json!({ "name": "Renamed", "revision": 1 }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
}

// ---------------------------------------------------------------------------
// Test: deactivation hides a template and blocks new entries
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_deactivated_template_is_hidden_and_closed() {
    let app = build_test_app();
    let template = create_clinical_template(&app).await;
    let id = template["id"].as_i64().unwrap();

    let response = delete(app.router(), &format!("/api/v1/templates/{id}"), &app.admin()).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = get(app.router(), "/api/v1/templates", &app.student()).await;
    assert!(body_json(response).await["data"].as_array().unwrap().is_empty());

    // Students cannot opt into inactive templates; admins can.
    let uri = "/api/v1/templates?include_inactive=true";
    let response = get(app.router(), uri, &app.student()).await;
    assert!(body_json(response).await["data"].as_array().unwrap().is_empty());
    let response = get(app.router(), uri, &app.admin()).await;
    assert_eq!(body_json(response).await["data"][0]["is_active"], false);

    let response = post_json(
        app.router(),
        "/api/v1/entries",
        &app.student(),
        json!({ "template_id": id, "status": "DRAFT" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_get_missing_template_returns_404() {
    let app = build_test_app();
    let response = get(app.router(), "/api/v1/templates/999", &app.teacher()).await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["code"], "NOT_FOUND");
}
