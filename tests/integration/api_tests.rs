//! End-to-end API tests.
//!
//! Tests verify:
//! - Thumbnails from stored originals and from remote URLs
//! - Response headers derived from the payload
//! - Each failure stage reports its own status code
//! - Behaviour with caching disabled

use axum::http::StatusCode;

use thumb_streamer::TransformOptions;

use super::test_utils::{
    body_bytes, body_json, create_test_jpeg, create_test_png, header, image_dimensions,
    is_valid_jpeg, MemoryStore, MockOrigin, TestAppBuilder,
};

const REMOTE_URL: &str = "http://origin.test/photos/cat.jpg";
const REMOTE_PATH: &str = "/thumb/http%3A%2F%2Forigin.test%2Fphotos%2Fcat.jpg";

// =============================================================================
// Successful Requests
// =============================================================================

#[tokio::test]
async fn test_stored_original_thumbnail() {
    let store = MemoryStore::new().with_object("a/b.jpg", create_test_jpeg(400, 200), "image/jpeg");
    let app = TestAppBuilder::new().with_store(store).build();

    let response = app.get("/thumb/a/b.jpg", None).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(header(&response, "content-type"), "image/jpeg");
    assert_eq!(header(&response, "cache-control"), "max-age=3600,public");
    assert_eq!(header(&response, "x-thumbnail-cache-hit"), "false");

    let etag = header(&response, "etag").to_string();
    assert!(etag.starts_with('"') && etag.ends_with('"'));
    assert_eq!(etag.len(), 66);

    let content_length: usize = header(&response, "content-length").parse().unwrap();
    let body = body_bytes(response).await;
    assert_eq!(body.len(), content_length);
    assert!(is_valid_jpeg(&body));

    // Fit inside 150x150 keeping 2:1
    assert_eq!(image_dimensions(&body), (150, 75));
    assert_eq!(app.origin.fetch_count(), 0);
}

#[tokio::test]
async fn test_remote_original_thumbnail() {
    let origin = MockOrigin::new().with_image(REMOTE_URL, create_test_jpeg(300, 300));
    let app = TestAppBuilder::new()
        .with_store(MemoryStore::new())
        .with_origin(origin)
        .build();

    let response = app.get(REMOTE_PATH, None).await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_bytes(response).await;
    assert_eq!(image_dimensions(&body), (150, 150));
    assert_eq!(app.origin.fetch_count(), 1);
}

#[tokio::test]
async fn test_crop_fills_exact_size() {
    let store = MemoryStore::new().with_object("a/b.jpg", create_test_jpeg(400, 300), "image/jpeg");
    let app = TestAppBuilder::new()
        .with_store(store)
        .with_options(TransformOptions {
            crop: true,
            quality: 70,
        })
        .build();

    let response = app.get("/wide/a/b.jpg", None).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_bytes(response).await;
    assert_eq!(image_dimensions(&body), (200, 100));
}

#[tokio::test]
async fn test_png_original_stays_png() {
    let store = MemoryStore::new().with_object("icons/logo.png", create_test_png(64, 64), "image/png");
    let app = TestAppBuilder::new()
        .with_store(store)
        .with_size("small", "32x32")
        .build();

    let response = app.get("/small/icons/logo.png", None).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(header(&response, "content-type"), "image/png");
    let body = body_bytes(response).await;
    assert_eq!(image_dimensions(&body), (32, 32));
}

#[tokio::test]
async fn test_health_endpoint() {
    let app = TestAppBuilder::new().with_store(MemoryStore::new()).build();

    let response = app.get("/health", None).await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["status"], "healthy");
    assert_eq!(json["caching"], true);
}

// =============================================================================
// Failure Stages
// =============================================================================

#[tokio::test]
async fn test_unknown_size_token() {
    let store = MemoryStore::new().with_object("a/b.jpg", create_test_jpeg(64, 64), "image/jpeg");
    let app = TestAppBuilder::new().with_store(store).build();

    let response = app.get("/giant/a/b.jpg", None).await;

    assert_eq!(response.status().as_u16(), 601);
    let json = body_json(response).await;
    assert_eq!(json["error"], "size_resolution");
    assert_eq!(json["status"], 601);

    // Nothing past size resolution ran
    assert_eq!(app.store().get_count(), 0);
    assert_eq!(app.transformer.calls(), 0);
}

#[tokio::test]
async fn test_malformed_size_value() {
    let store = MemoryStore::new().with_object("a/b.jpg", create_test_jpeg(64, 64), "image/jpeg");
    let app = TestAppBuilder::new()
        .with_store(store)
        .with_size("broken", "150x")
        .build();

    let response = app.get("/broken/a/b.jpg", None).await;
    assert_eq!(response.status().as_u16(), 601);
}

#[tokio::test]
async fn test_unsupported_scheme() {
    let app = TestAppBuilder::new().with_store(MemoryStore::new()).build();

    let response = app
        .get("/thumb/ftp%3A%2F%2Forigin.test%2Fcat.jpg", None)
        .await;

    assert_eq!(response.status().as_u16(), 603);
    assert_eq!(body_json(response).await["error"], "reference_parse");
    assert_eq!(app.origin.fetch_count(), 0);
}

#[tokio::test]
async fn test_origin_error_status() {
    let origin = MockOrigin::new().with_status(REMOTE_URL, 500);
    let app = TestAppBuilder::new()
        .with_store(MemoryStore::new())
        .with_origin(origin)
        .build();

    let response = app.get(REMOTE_PATH, None).await;

    assert_eq!(response.status().as_u16(), 604);
    let json = body_json(response).await;
    assert_eq!(json["error"], "origin_fetch");
    assert!(json["message"].as_str().unwrap().contains("500"));
    assert_eq!(app.transformer.calls(), 0);
}

// A host-less reference is classified once, from the raw reference as
// requested. There is no second pass: a missing stored original is a storage
// read failure (607) and the remote origin is never tried.
#[tokio::test]
async fn test_missing_stored_original_never_calls_origin() {
    let app = TestAppBuilder::new().with_store(MemoryStore::new()).build();

    let response = app.get("/thumb/a/missing.jpg", None).await;

    assert_eq!(response.status().as_u16(), 607);
    assert_eq!(body_json(response).await["error"], "storage_read");
    assert_eq!(app.origin.fetch_count(), 0);
    assert_eq!(app.transformer.calls(), 0);
}

#[tokio::test]
async fn test_undecodable_original() {
    let origin = MockOrigin::new().with_image(REMOTE_URL, b"<html>not an image</html>".to_vec());
    let app = TestAppBuilder::new()
        .with_store(MemoryStore::new())
        .with_origin(origin)
        .build();

    let response = app.get(REMOTE_PATH, None).await;

    assert_eq!(response.status().as_u16(), 605);
    assert_eq!(body_json(response).await["error"], "transform");

    // Nothing is written back on failure
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    assert_eq!(app.store().put_count(), 0);
}

// =============================================================================
// Caching Disabled
// =============================================================================

#[tokio::test]
async fn test_caching_disabled_remote_source() {
    let origin = MockOrigin::new().with_image(REMOTE_URL, create_test_jpeg(200, 200));
    let app = TestAppBuilder::new().with_origin(origin).build();

    let first = app.get(REMOTE_PATH, None).await;
    assert_eq!(first.status(), StatusCode::OK);
    assert_eq!(header(&first, "x-thumbnail-cache-hit"), "false");

    // Every request goes back to the origin
    let second = app.get(REMOTE_PATH, None).await;
    assert_eq!(second.status(), StatusCode::OK);
    assert_eq!(header(&second, "x-thumbnail-cache-hit"), "false");
    assert_eq!(app.origin.fetch_count(), 2);
    assert_eq!(app.transformer.calls(), 2);

    let health = body_json(app.get("/health", None).await).await;
    assert_eq!(health["caching"], false);
}

#[tokio::test]
async fn test_caching_disabled_stored_source() {
    let app = TestAppBuilder::new().build();

    let response = app.get("/thumb/a/b.jpg", None).await;

    assert_eq!(response.status().as_u16(), 604);
    assert_eq!(app.origin.fetch_count(), 0);
}
