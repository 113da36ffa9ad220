use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use bucket_drive::config::AppConfig;
use bucket_drive::infrastructure::database;
use bucket_drive::services::drive_service::DriveService;
use bucket_drive::services::memory_storage::MemoryObjectStore;
use bucket_drive::services::profile_service::DbProfileStore;
use bucket_drive::{AppState, create_app};
use http_body_util::BodyExt;
use sea_orm::Database;
use serde_json::{Value, json};
use std::sync::Arc;
use tower::ServiceExt;

const BOUNDARY: &str = "drive-test-boundary";

async fn setup_app() -> (Router, Arc<MemoryObjectStore>) {
    let config = AppConfig::development();

    let db = Database::connect("sqlite::memory:").await.unwrap();
    database::run_migrations(&db).await.unwrap();

    let store = Arc::new(MemoryObjectStore::new(config.bucket.clone()));
    let state = AppState {
        drive: Arc::new(DriveService::new(store.clone(), config.operation_timeout)),
        profiles: Arc::new(DbProfileStore::new(db, config.operation_timeout)),
        config,
    };

    (create_app(state), store)
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn multipart_upload(path: Option<&str>, file: Option<(&str, &str, &[u8])>) -> Request<Body> {
    let mut body = Vec::new();
    if let Some(path) = path {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"path\"\r\n\r\n{path}\r\n"
            )
            .as_bytes(),
        );
    }
    if let Some((file_name, content_type, data)) = file {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{file_name}\"\r\nContent-Type: {content_type}\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

    Request::builder()
        .method("POST")
        .uri("/api/file/upload")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

#[tokio::test]
async fn test_hello_route() {
    let (app, _) = setup_app().await;

    let response = app.oneshot(get("/api")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&bytes[..], b"Hello world");
}

#[tokio::test]
async fn test_list_direct_children_folders_first() {
    let (app, store) = setup_app().await;
    store.insert("a/", None, Vec::new());
    store.insert("a/x.txt", Some("text/plain"), b"hello".to_vec());
    store.insert("a/sub/", None, Vec::new());
    store.insert("a/sub/y.txt", Some("text/plain"), b"deep".to_vec());
    store.insert("b.txt", Some("text/plain"), Vec::new());

    let response = app.oneshot(get("/api/file?prefix=a")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    let entries = body.as_array().unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0]["name"], "sub/");
    assert_eq!(entries[0]["type"], "folder");
    assert_eq!(entries[1]["name"], "x.txt");
    assert_eq!(entries[1]["type"], "file");
    assert_eq!(entries[1]["size"], 5);
    assert_eq!(entries[1]["originalKey"], "a/x.txt");
}

#[tokio::test]
async fn test_list_root_and_limit() {
    let (app, store) = setup_app().await;
    store.insert("docs/", None, Vec::new());
    store.insert("one.png", Some("image/png"), Vec::new());
    store.insert("two.png", Some("image/png"), Vec::new());

    let response = app
        .clone()
        .oneshot(get("/api/file"))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body.as_array().unwrap().len(), 3);
    assert_eq!(body[0]["name"], "docs/");

    let response = app.oneshot(get("/api/file?limit=1")).await.unwrap();
    let body = body_json(response).await;
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(body[0]["type"], "folder");
}

#[tokio::test]
async fn test_create_folder_then_conflict() {
    let (app, store) = setup_app().await;

    let response = app
        .clone()
        .oneshot(post_json("/api/file/folder", json!({ "name": "photos" })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(store.contains("photos/"));

    let response = app
        .oneshot(post_json("/api/file/folder", json!({ "name": "photos" })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(store.len(), 1);
}

#[tokio::test]
async fn test_create_folder_rejects_empty_name() {
    let (app, store) = setup_app().await;

    let response = app
        .oneshot(post_json("/api/file/folder", json!({ "name": "" })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(store.is_empty());
}

#[tokio::test]
async fn test_upload_image_is_listed() {
    let (app, store) = setup_app().await;

    let response = app
        .clone()
        .oneshot(multipart_upload(
            Some("photos"),
            Some(("cat.png", "image/png", b"\x89PNG fake")),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(store.contains("photos/cat.png"));

    let response = app.oneshot(get("/api/file?prefix=photos")).await.unwrap();
    let body = body_json(response).await;
    assert_eq!(body[0]["name"], "cat.png");
    assert_eq!(body[0]["contentType"], "image/png");
}

#[tokio::test]
async fn test_upload_path_after_file_is_ignored() {
    let (app, store) = setup_app().await;

    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"cat.png\"\r\nContent-Type: image/png\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(b"\x89PNG fake\r\n");
    body.extend_from_slice(
        format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"path\"\r\n\r\nphotos\r\n--{BOUNDARY}--\r\n"
        )
        .as_bytes(),
    );
    let request = Request::builder()
        .method("POST")
        .uri("/api/file/upload")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(store.contains("cat.png"));
    assert!(!store.contains("photos/cat.png"));
}

#[tokio::test]
async fn test_upload_rejects_disallowed_type() {
    let (app, store) = setup_app().await;

    let response = app
        .oneshot(multipart_upload(
            None,
            Some(("notes.txt", "text/plain", b"plain text")),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);

    let body = body_json(response).await;
    assert_eq!(body["message"], "invalid file type");
    assert!(store.is_empty());
}

#[tokio::test]
async fn test_upload_without_file_part() {
    let (app, _) = setup_app().await;

    let response = app
        .oneshot(multipart_upload(Some("photos"), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_upload_never_overwrites() {
    let (app, store) = setup_app().await;
    store.insert("logo.png", Some("image/png"), b"original".to_vec());

    let response = app
        .clone()
        .oneshot(multipart_upload(
            None,
            Some(("logo.png", "image/png", b"replacement")),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let response = app.oneshot(get("/api/file/content?key=logo.png")).await.unwrap();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&bytes[..], b"original");
}

#[tokio::test]
async fn test_search_matches_substring() {
    let (app, store) = setup_app().await;
    store.insert("img/", None, Vec::new());
    store.insert("img/logo.png", Some("image/png"), Vec::new());
    store.insert("img/banner.png", Some("image/png"), Vec::new());
    store.insert("docs/logo-guide.pdf", Some("application/pdf"), Vec::new());

    let response = app
        .clone()
        .oneshot(get("/api/file/search?inFolder=img&keyword=LOGO"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    let entries = body.as_array().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["originalKey"], "img/logo.png");

    let response = app
        .oneshot(get("/api/file/search?keyword=logo"))
        .await
        .unwrap();
    let body = body_json(response).await;
    let entries = body.as_array().unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0]["originalKey"], "docs/logo-guide.pdf");
    assert_eq!(entries[0]["name"], "logo-guide.pdf");
    assert_eq!(entries[0]["type"], "file");
    assert_eq!(entries[0]["prefix"], "docs/");
    assert_eq!(entries[1]["originalKey"], "img/logo.png");
    assert_eq!(entries[1]["name"], "logo.png");
    assert_eq!(entries[1]["type"], "file");
    assert_eq!(entries[1]["prefix"], "img/");
}

#[tokio::test]
async fn test_read_file_content() {
    let (app, store) = setup_app().await;
    store.insert("docs/a.pdf", Some("application/pdf"), b"%PDF-1.4".to_vec());

    let response = app
        .clone()
        .oneshot(get("/api/file/content?key=docs/a.pdf"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::CONTENT_TYPE).unwrap(),
        "application/pdf"
    );
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&bytes[..], b"%PDF-1.4");

    let response = app
        .oneshot(get("/api/file/content?key=docs/missing.pdf"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_profile_create_and_find() {
    let (app, _) = setup_app().await;

    let response = app
        .clone()
        .oneshot(post_json(
            "/api/users",
            json!({ "id": "123456789", "username": "alice", "avatar": "abc" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let created = body_json(response).await;
    let ref_id = created["refId"].as_str().unwrap().to_string();
    assert!(!ref_id.is_empty());

    let response = app.oneshot(get("/api/users/123456789")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let profile = body_json(response).await;
    assert_eq!(profile["refId"], ref_id.as_str());
    assert_eq!(profile["username"], "alice");
    assert_eq!(profile["exp"], 0);
    assert_eq!(profile["coins"], 0);
    assert_eq!(profile["verified"], false);
}

#[tokio::test]
async fn test_profile_not_found() {
    let (app, _) = setup_app().await;

    let response = app.oneshot(get("/api/users/nobody")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let body = body_json(response).await;
    assert!(body["message"].as_str().unwrap().contains("nobody"));
}

#[tokio::test]
async fn test_health_reports_backends() {
    let (app, _) = setup_app().await;

    let response = app.oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["database"], "connected");
    assert_eq!(body["storage"], "connected");
}

#[tokio::test]
async fn test_request_id_is_echoed() {
    let (app, _) = setup_app().await;

    let request = Request::builder()
        .uri("/api")
        .header("x-request-id", "req-42")
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.headers().get("x-request-id").unwrap(), "req-42");

    let response = app.oneshot(get("/api")).await.unwrap();
    assert!(response.headers().contains_key("x-request-id"));
}
