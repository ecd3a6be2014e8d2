//! HTTP tests against the synthetic engine

mod common;

use std::fs::File;
use std::time::{Duration, SystemTime};

use axum::body::{Body, Bytes};
use axum::http::{Request, StatusCode};
use axum_test::TestServer;
use common::{dir_entries, synthetic_pdf, test_state};
use figura_server::app;
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

const BOUNDARY: &str = "figura-test-boundary";

/// One multipart part: field name, optional file content type, body
struct Part<'a> {
    name: &'a str,
    content_type: Option<&'a str>,
    body: Vec<u8>,
}

fn file_part(content_type: &str, body: Vec<u8>) -> Part<'_> {
    Part {
        name: "file",
        content_type: Some(content_type),
        body,
    }
}

fn text_part<'a>(name: &'a str, body: &str) -> Part<'a> {
    Part {
        name,
        content_type: None,
        body: body.as_bytes().to_vec(),
    }
}

fn multipart_body(parts: &[Part<'_>]) -> Bytes {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        match part.content_type {
            Some(content_type) => body.extend_from_slice(
                format!(
                    "Content-Disposition: form-data; name=\"{}\"; filename=\"upload.pdf\"\r\n\
                     Content-Type: {content_type}\r\n\r\n",
                    part.name
                )
                .as_bytes(),
            ),
            None => body.extend_from_slice(
                format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", part.name)
                    .as_bytes(),
            ),
        }
        body.extend_from_slice(&part.body);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    Bytes::from(body)
}

fn multipart_type() -> String {
    format!("multipart/form-data; boundary={BOUNDARY}")
}

async fn server(root: &std::path::Path) -> TestServer {
    TestServer::new(app(test_state(root).await)).unwrap()
}

#[tokio::test]
async fn test_heartbeat() {
    let temp_dir = TempDir::new().unwrap();
    let server = server(temp_dir.path()).await;

    let response = server.get("/heartbeat").await;

    response.assert_status_ok();
    assert_eq!(response.json::<Value>(), json!({ "status": "ok" }));
}

#[tokio::test]
async fn test_images_endpoint_returns_artifacts() {
    let temp_dir = TempDir::new().unwrap();
    let server = server(temp_dir.path()).await;

    let response = server
        .post("/pdf/images")
        .content_type(&multipart_type())
        .bytes(multipart_body(&[file_part(
            "application/pdf",
            synthetic_pdf(2, 40, 30),
        )]))
        .await;

    response.assert_status_ok();
    let artifacts = response.json::<Vec<Value>>();
    assert_eq!(artifacts.len(), 2);
    for (page, artifact) in artifacts.iter().enumerate() {
        let name = artifact["name"].as_str().unwrap();
        assert!(name.ends_with(&format!("-page{page}.png")));
        assert_eq!(artifact["url"], format!("/static/{name}"));
        assert!(artifact["createdAt"].is_string());
        assert!(artifact.get("path").is_none());
    }
}

#[tokio::test]
async fn test_images_are_served_from_url_prefix() {
    let temp_dir = TempDir::new().unwrap();
    let router = app(test_state(temp_dir.path()).await);

    let response = router
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/pdf/images?dpi=144")
                .header("content-type", multipart_type())
                .body(Body::from(multipart_body(&[file_part(
                    "application/pdf",
                    synthetic_pdf(1, 40, 30),
                )])))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let artifacts: Vec<Value> = serde_json::from_slice(&body).unwrap();
    let url = artifacts[0]["url"].as_str().unwrap().to_string();

    let response = router
        .oneshot(Request::builder().uri(&url).body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let png = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let image = image::load_from_memory(&png).unwrap();
    assert_eq!((image.width(), image.height()), (80, 60));
}

#[tokio::test]
async fn test_wrong_content_type_is_rejected() {
    let temp_dir = TempDir::new().unwrap();
    let server = server(temp_dir.path()).await;

    let response = server
        .post("/pdf/images")
        .content_type(&multipart_type())
        .bytes(multipart_body(&[file_part("image/png", synthetic_pdf(1, 10, 10))]))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(
        response.json::<Value>()["message"],
        "Invalid file type. Only PDF file allowed."
    );
    assert!(dir_entries(temp_dir.path()).is_empty());
}

#[tokio::test]
async fn test_missing_file_field() {
    let temp_dir = TempDir::new().unwrap();
    let server = server(temp_dir.path()).await;

    let response = server
        .post("/pdf/images")
        .content_type(&multipart_type())
        .bytes(multipart_body(&[text_part("other", "value")]))
        .await;

    response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_undecodable_upload() {
    let temp_dir = TempDir::new().unwrap();
    let server = server(temp_dir.path()).await;

    let response = server
        .post("/pdf/images")
        .content_type(&multipart_type())
        .bytes(multipart_body(&[file_part("application/pdf", b"garbage".to_vec())]))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(response.json::<Value>()["error"], "decode_error");
}

#[tokio::test]
async fn test_figures_endpoint() {
    let temp_dir = TempDir::new().unwrap();
    let server = server(temp_dir.path()).await;

    let figures = r#"[
        {"page": 1, "bbox": [10, 10, 50, 40], "caption": [10, 42, 50, 48]},
        {"page": 0, "bbox": [0, 0, 20, 20]}
    ]"#;
    let redactions = r#"[{"page": 2, "bbox": [0, 0, 60, 10]}]"#;

    let response = server
        .post("/pdf/figures")
        .content_type(&multipart_type())
        .bytes(multipart_body(&[
            file_part("application/pdf", synthetic_pdf(3, 60, 50)),
            text_part("figures", figures),
            text_part("redactions", redactions),
            text_part("coordinateSpace", r#""points""#),
        ]))
        .await;

    response.assert_status_ok();
    let body = response.json::<Value>();

    let figures = body["figures"].as_array().unwrap();
    assert_eq!(figures.len(), 2);
    assert_eq!(figures[0]["index"], 0);
    assert_eq!(figures[0]["page"], 1);
    assert!(figures[0]["caption"]["name"]
        .as_str()
        .unwrap()
        .ends_with("-page1-caption0.png"));
    assert_eq!(figures[1]["page"], 0);
    assert!(figures[1]["caption"].is_null());

    let pages: Vec<u64> = body["redactedPages"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["page"].as_u64().unwrap())
        .collect();
    assert_eq!(pages, vec![0, 1, 2]);
}

#[tokio::test]
async fn test_figures_invalid_region_reports_box() {
    let temp_dir = TempDir::new().unwrap();
    let server = server(temp_dir.path()).await;

    let figures = r#"[
        {"page": 0, "bbox": [0, 0, 20, 20]},
        {"page": 0, "bbox": [30, 30, 10, 10]}
    ]"#;

    let response = server
        .post("/pdf/figures")
        .content_type(&multipart_type())
        .bytes(multipart_body(&[
            file_part("application/pdf", synthetic_pdf(1, 60, 50)),
            text_part("figures", figures),
            text_part("coordinateSpace", r#""points""#),
        ]))
        .await;

    response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    let body = response.json::<Value>();
    assert_eq!(body["error"], "invalid_region");
    assert_eq!(
        body["details"],
        json!({ "page": 0, "index": 1, "kind": "figure" })
    );
    assert!(dir_entries(temp_dir.path()).is_empty());
}

#[tokio::test]
async fn test_figures_page_not_found() {
    let temp_dir = TempDir::new().unwrap();
    let server = server(temp_dir.path()).await;

    let response = server
        .post("/pdf/figures")
        .content_type(&multipart_type())
        .bytes(multipart_body(&[
            file_part("application/pdf", synthetic_pdf(1, 60, 50)),
            text_part("figures", r#"[{"page": 3, "bbox": [0, 0, 20, 20]}]"#),
        ]))
        .await;

    response.assert_status(StatusCode::NOT_FOUND);
    assert_eq!(
        response.json::<Value>()["details"],
        json!({ "page": 3, "pageCount": 1 })
    );
}

#[tokio::test]
async fn test_figures_requires_figures_field() {
    let temp_dir = TempDir::new().unwrap();
    let server = server(temp_dir.path()).await;

    let response = server
        .post("/pdf/figures")
        .content_type(&multipart_type())
        .bytes(multipart_body(&[file_part(
            "application/pdf",
            synthetic_pdf(1, 60, 50),
        )]))
        .await;
    response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);

    let response = server
        .post("/pdf/figures")
        .content_type(&multipart_type())
        .bytes(multipart_body(&[
            file_part("application/pdf", synthetic_pdf(1, 60, 50)),
            text_part("figures", "not json"),
        ]))
        .await;
    response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_tempfiles_list_and_delete() {
    let temp_dir = TempDir::new().unwrap();
    let server = server(temp_dir.path()).await;

    let old = File::create(temp_dir.path().join("old.png")).unwrap();
    old.set_modified(SystemTime::now() - Duration::from_secs(7200))
        .unwrap();
    File::create(temp_dir.path().join("new.png")).unwrap();
    File::create(temp_dir.path().join(".new.png.partial")).unwrap();

    let response = server.get("/pdf/tempfiles").await;
    response.assert_status_ok();
    let listed = response.json::<Vec<Value>>();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0]["name"], "old.png");
    assert_eq!(listed[0]["url"], "/static/old.png");
    assert!(listed[0]["ageSeconds"].as_u64().unwrap() >= 7200);

    let response = server
        .get("/pdf/tempfiles")
        .add_query_param("thresholdSecs", 86_400)
        .await;
    assert!(response.json::<Vec<Value>>().is_empty());

    let response = server.delete("/pdf/tempfiles").await;
    response.assert_status_ok();
    assert_eq!(response.json::<Value>(), json!({ "deletedCount": 1 }));
    assert!(!temp_dir.path().join("old.png").exists());
    assert!(temp_dir.path().join("new.png").exists());

    let response = server.delete("/pdf/tempfiles").await;
    assert_eq!(response.json::<Value>(), json!({ "deletedCount": 0 }));
}
