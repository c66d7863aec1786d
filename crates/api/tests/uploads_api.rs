//! HTTP-level integration tests for `POST /api/v1/uploads` and serving the
//! stored files back.

mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use common::{body_json, build_test_app, get, send};
use http_body_util::BodyExt;

const BOUNDARY: &str = "logbook-test-boundary";

fn multipart_request(token: &str, field: &str, file_name: &str, data: &[u8]) -> Request<Body> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"{field}\"; filename=\"{file_name}\"\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

    Request::builder()
        .method("POST")
        .uri("/api/v1/uploads")
        .header("Authorization", format!("Bearer {token}"))
        .header(
            "Content-Type",
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

// ---------------------------------------------------------------------------
// Test: an upload is stored and served under the public base
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_upload_returns_url_and_serves_file() {
    let app = build_test_app();
    let token = app.student();

    let request = multipart_request(&token, "file", "ecg.PNG", b"fake image bytes");
    let response = send(app.router(), request).await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let uploaded = body_json(response).await["data"].clone();
    assert_eq!(uploaded["name"], "ecg.PNG");
    let url = uploaded["url"].as_str().unwrap().to_string();
    assert!(url.starts_with("/files/"), "unexpected url {url}");
    assert!(url.ends_with(".png"), "extension should be kept: {url}");

    let response = get(app.router(), &url, &token).await;
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&bytes[..], b"fake image bytes");
}

// ---------------------------------------------------------------------------
// Test: failure modes
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_upload_without_file_field_is_bad_request() {
    let app = build_test_app();
    let request = multipart_request(&app.student(), "attachment", "a.txt", b"hello");

    let response = send(app.router(), request).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn test_oversized_upload_fails() {
    let app = build_test_app();
    // The test config caps uploads at 1 KiB.
    let data = vec![b'x'; 4096];
    let request = multipart_request(&app.student(), "file", "big.bin", &data);

    let response = send(app.router(), request).await;
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    assert_eq!(body_json(response).await["code"], "UPLOAD_FAILED");
}

#[tokio::test]
async fn test_upload_requires_authentication() {
    let app = build_test_app();
    let mut request = multipart_request("", "file", "a.txt", b"hello");
    request.headers_mut().remove("authorization");

    let response = send(app.router(), request).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
