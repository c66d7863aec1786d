#![allow(dead_code)]

use std::path::Path;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request};
use axum::response::Response;
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

use jsonwebtoken::{encode, EncodingKey, Header};
use logbook_api::auth::jwt::{Claims, JwtConfig, TokenVerifier};
use logbook_api::config::{ServerConfig, StoreBackend, UploadConfig};
use logbook_api::router::build_app_router;
use logbook_api::state::AppState;
use logbook_core::roles::Role;
use logbook_core::store::{EntryStore, InMemoryEntryStore, InMemoryTemplateStore, TemplateStore};
use logbook_core::upload::LocalUploadService;

pub const ADMIN_ID: i64 = 1;
pub const TEACHER_ID: i64 = 10;
pub const STUDENT_ID: i64 = 100;
pub const OTHER_STUDENT_ID: i64 = 101;

/// Build a test `ServerConfig` with safe defaults, uploading into `upload_dir`.
///
/// Uses `http://localhost:5173` as CORS origin (matching the dev default)
/// and a 30-second request timeout.
pub fn test_config(upload_dir: &Path) -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        shutdown_timeout_secs: 30,
        store_backend: StoreBackend::Memory,
        database_url: None,
        upload: UploadConfig {
            dir: upload_dir.to_path_buf(),
            public_base: "/files".to_string(),
            max_bytes: 1024,
        },
        jwt: JwtConfig {
            secret: "test-secret-that-is-long-enough-for-hmac".to_string(),
            leeway_secs: 0,
        },
    }
}

/// A router over fresh in-memory stores. Keeps the upload directory alive
/// for as long as the app is in scope.
pub struct TestApp {
    router: Router,
    pub config: ServerConfig,
    pub upload_dir: TempDir,
}

impl TestApp {
    /// A handle to the shared router; every clone sees the same stores.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Sign a token the way the identity service would, valid for 15 minutes.
    pub fn token(&self, user_id: i64, role: Role) -> String {
        let now = chrono::Utc::now().timestamp();
        let claims = Claims {
            sub: user_id,
            role,
            exp: now + 15 * 60,
            iat: now,
        };
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.config.jwt.secret.as_bytes()),
        )
        .expect("token signing")
    }

    pub fn admin(&self) -> String {
        self.token(ADMIN_ID, Role::CollegeAdmin)
    }

    pub fn teacher(&self) -> String {
        self.token(TEACHER_ID, Role::Teacher)
    }

    pub fn student(&self) -> String {
        self.token(STUDENT_ID, Role::Student)
    }

    pub fn other_student(&self) -> String {
        self.token(OTHER_STUDENT_ID, Role::Student)
    }
}

/// Build the full application router with all middleware layers over
/// in-memory stores.
///
/// Uses the same [`build_app_router`] as `main.rs` so integration tests
/// exercise the production middleware stack.
pub fn build_test_app() -> TestApp {
    let upload_dir = tempfile::tempdir().expect("create upload dir");
    let config = test_config(upload_dir.path());

    let template_store = InMemoryTemplateStore::new();
    let entries: Arc<dyn EntryStore> = Arc::new(InMemoryEntryStore::new(&template_store));
    let templates: Arc<dyn TemplateStore> = Arc::new(template_store);
    let uploads = Arc::new(LocalUploadService::new(
        upload_dir.path(),
        &config.upload.public_base,
        config.upload.max_bytes,
    ));

    let state = AppState {
        templates,
        entries,
        uploads,
        tokens: Arc::new(TokenVerifier::new(&config.jwt)),
        pool: None,
        config: Arc::new(config.clone()),
    };

    TestApp {
        router: build_app_router(state, &config),
        config,
        upload_dir,
    }
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

fn authed(method: Method, uri: &str, token: &str) -> axum::http::request::Builder {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("Authorization", format!("Bearer {token}"))
}

pub async fn send(app: Router, request: Request<Body>) -> Response {
    app.oneshot(request).await.unwrap()
}

pub async fn get(app: Router, uri: &str, token: &str) -> Response {
    let request = authed(Method::GET, uri, token).body(Body::empty()).unwrap();
    send(app, request).await
}

pub async fn delete(app: Router, uri: &str, token: &str) -> Response {
    let request = authed(Method::DELETE, uri, token)
        .body(Body::empty())
        .unwrap();
    send(app, request).await
}

async fn send_json(app: Router, method: Method, uri: &str, token: &str, body: Value) -> Response {
    let request = authed(method, uri, token)
        .header("Content-Type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, request).await
}

pub async fn post_json(app: Router, uri: &str, token: &str, body: Value) -> Response {
    send_json(app, Method::POST, uri, token, body).await
}

pub async fn put_json(app: Router, uri: &str, token: &str, body: Value) -> Response {
    send_json(app, Method::PUT, uri, token, body).await
}

pub async fn patch_json(app: Router, uri: &str, token: &str, body: Value) -> Response {
    send_json(app, Method::PATCH, uri, token, body).await
}

/// Collect a response body and parse it as JSON.
pub async fn body_json(response: Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

/// A builder draft with a case-details group and a vitals group.
///
/// Field names are left blank so the server derives them from labels.
pub fn clinical_draft() -> Value {
    json!({
        "groups": [
            {
                "group_name": "Case Details",
                "fields": [
                    { "field_label": "Patient Name", "field_type": "text", "is_required": true }
                ]
            },
            {
                "group_name": "Vitals",
                "fields": [
                    { "field_label": "Temperature", "field_type": "number", "is_required": true },
                    {
                        "field_label": "Severity",
                        "field_type": "select",
                        "options": ["Mild", "Moderate", "Severe"]
                    },
                    { "field_label": "Scan", "field_type": "file" }
                ]
            }
        ]
    })
}

/// Create a general template from [`clinical_draft`] and return its JSON.
pub async fn create_clinical_template(app: &TestApp) -> Value {
    let response = post_json(
        app.router(),
        "/api/v1/templates",
        &app.admin(),
        json!({
            "name": "Clinical case log",
            "description": "Daily ward cases",
            "template_type": "general",
            "dynamic_schema": clinical_draft(),
        }),
    )
    .await;
    assert_eq!(response.status(), axum::http::StatusCode::CREATED);
    body_json(response).await["data"].clone()
}
