//! Cache behaviour integration tests.
//!
//! Tests verify:
//! - Fresh thumbnails are written back under the derived key
//! - Later requests are served from the store without transforming again
//! - Hits and misses return identical bytes and entity tags
//! - Store failures never fail a request that can still be served

use axum::http::StatusCode;

use thumb_streamer::ThumbnailRequest;

use super::test_utils::{
    body_bytes, create_test_jpeg, header, wait_for_object, MemoryStore, MockOrigin,
    TestAppBuilder,
};

// =============================================================================
// Write-back
// =============================================================================

#[tokio::test]
async fn test_thumbnail_written_back_under_cache_key() {
    let store = MemoryStore::new().with_object("a/b.jpg", create_test_jpeg(300, 300), "image/jpeg");
    let app = TestAppBuilder::new().with_store(store).build();

    let response = app.get("/thumb/a/b.jpg", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_bytes(response).await;

    let (stored, content_type) = wait_for_object(app.store(), "cache/a/thumb/b.jpg")
        .await
        .expect("thumbnail was not persisted");
    assert_eq!(stored, body);
    assert_eq!(content_type, "image/jpeg");
}

#[tokio::test]
async fn test_signed_request_end_to_end() {
    let store = MemoryStore::new().with_object("a/b.jpg", create_test_jpeg(300, 200), "image/jpeg");
    let app = TestAppBuilder::new()
        .with_store(store)
        .with_size("thumb", "100x100")
        .with_auth()
        .build();

    let response = app.get_signed("/thumb/a/b.jpg").await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(header(&response, "content-type"), "image/jpeg");
    assert!(!header(&response, "etag").is_empty());
    let first_etag = header(&response, "etag").to_string();
    let body = body_bytes(response).await;

    let (stored, _) = wait_for_object(app.store(), "cache/a/thumb/b.jpg")
        .await
        .expect("thumbnail was not persisted");
    assert_eq!(stored, body);

    // Same request again is served from the store, byte for byte
    let again = app.get_signed("/thumb/a/b.jpg").await;
    assert_eq!(header(&again, "x-thumbnail-cache-hit"), "true");
    assert_eq!(header(&again, "etag"), first_etag);
    assert_eq!(body_bytes(again).await, body);
    assert_eq!(app.transformer.calls(), 1);
}

#[tokio::test]
async fn test_remote_thumbnail_key_drops_host() {
    let origin = MockOrigin::new().with_image(
        "http://origin.test/photos/2024/cat.jpg",
        create_test_jpeg(200, 200),
    );
    let app = TestAppBuilder::new()
        .with_store(MemoryStore::new())
        .with_origin(origin)
        .build();

    let response = app
        .get("/thumb/http%3A%2F%2Forigin.test%2Fphotos%2F2024%2Fcat.jpg", None)
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    assert!(wait_for_object(app.store(), "cache/photos/2024/thumb/cat.jpg")
        .await
        .is_some());
}

#[tokio::test]
async fn test_write_back_waits_for_response() {
    let store = MemoryStore::new().with_object("a/b.jpg", create_test_jpeg(200, 200), "image/jpeg");
    let app = TestAppBuilder::new().with_store(store).build();

    // Resolving alone never stores anything
    let thumbnail = app
        .service
        .get_thumbnail(&ThumbnailRequest::new("thumb", "a/b.jpg"))
        .await
        .unwrap();
    assert!(!thumbnail.cache_hit);

    // Going through the handler does
    let response = app.get("/thumb/a/b.jpg", None).await;
    assert_eq!(response.status(), StatusCode::OK);

    app.service.shutdown().await;
    assert_eq!(app.store().put_count(), 1);
    assert!(app.store().object("cache/a/thumb/b.jpg").await.is_some());
}

#[tokio::test]
async fn test_shutdown_drains_pending_writes() {
    let store = MemoryStore::new().with_object("a/b.jpg", create_test_jpeg(200, 200), "image/jpeg");
    let app = TestAppBuilder::new().with_store(store).build();

    let response = app.get("/thumb/a/b.jpg", None).await;
    assert_eq!(response.status(), StatusCode::OK);

    app.service.shutdown().await;
    assert!(app.store().object("cache/a/thumb/b.jpg").await.is_some());
}

// =============================================================================
// Hits
// =============================================================================

#[tokio::test]
async fn test_second_request_is_a_hit() {
    let store = MemoryStore::new().with_object("a/b.jpg", create_test_jpeg(300, 300), "image/jpeg");
    let app = TestAppBuilder::new().with_store(store).build();

    let first = app.get("/thumb/a/b.jpg", None).await;
    assert_eq!(header(&first, "x-thumbnail-cache-hit"), "false");
    let first_etag = header(&first, "etag").to_string();
    let first_body = body_bytes(first).await;

    wait_for_object(app.store(), "cache/a/thumb/b.jpg").await;

    let second = app.get("/thumb/a/b.jpg", None).await;
    assert_eq!(second.status(), StatusCode::OK);
    assert_eq!(header(&second, "x-thumbnail-cache-hit"), "true");
    assert_eq!(header(&second, "content-type"), "image/jpeg");
    assert_eq!(header(&second, "etag"), first_etag);
    assert_eq!(body_bytes(second).await, first_body);

    // Transformed once, written once
    assert_eq!(app.transformer.calls(), 1);
    assert_eq!(app.store().put_count(), 1);
}

#[tokio::test]
async fn test_precached_thumbnail_skips_original() {
    let cached = create_test_jpeg(150, 150);
    let store = MemoryStore::new().with_object("cache/a/thumb/b.jpg", cached.clone(), "image/jpeg");
    let app = TestAppBuilder::new().with_store(store).build();

    // The original does not even exist
    let response = app.get("/thumb/a/b.jpg", None).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(header(&response, "x-thumbnail-cache-hit"), "true");
    assert_eq!(body_bytes(response).await.as_ref(), cached.as_slice());
    assert_eq!(app.store().get_count(), 1);
    assert_eq!(app.transformer.calls(), 0);
}

#[tokio::test]
async fn test_remote_and_stored_sources_share_a_key() {
    let cached = create_test_jpeg(150, 150);
    let store = MemoryStore::new().with_object("cache/a/thumb/b.jpg", cached.clone(), "image/jpeg");
    let app = TestAppBuilder::new().with_store(store).build();

    let response = app
        .get("/thumb/http%3A%2F%2Forigin.test%2Fa%2Fb.jpg", None)
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(header(&response, "x-thumbnail-cache-hit"), "true");
    assert_eq!(app.origin.fetch_count(), 0);
}

#[tokio::test]
async fn test_cached_thumbnail_served_for_unsupported_scheme() {
    let cached = create_test_jpeg(150, 150);
    let store = MemoryStore::new().with_object("cache/a/thumb/b.jpg", cached.clone(), "image/jpeg");
    let app = TestAppBuilder::new().with_store(store).build();

    // Scheme and host never reach the key, so the probe finds the entry
    // before the reference is classified
    let response = app
        .get("/thumb/ftp%3A%2F%2Forigin.test%2Fa%2Fb.jpg", None)
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(header(&response, "x-thumbnail-cache-hit"), "true");
    assert_eq!(body_bytes(response).await.as_ref(), cached.as_slice());
    assert_eq!(app.store().get_count(), 1);
    assert_eq!(app.origin.fetch_count(), 0);
}

#[tokio::test]
async fn test_unsupported_scheme_miss_is_rejected_after_probe() {
    let app = TestAppBuilder::new().with_store(MemoryStore::new()).build();

    let response = app
        .get("/thumb/ftp%3A%2F%2Forigin.test%2Fa%2Fb.jpg", None)
        .await;

    assert_eq!(response.status().as_u16(), 603);
    assert_eq!(app.store().get_count(), 1);
    assert_eq!(app.origin.fetch_count(), 0);
}

#[tokio::test]
async fn test_sizes_are_cached_independently() {
    let store = MemoryStore::new().with_object("a/b.jpg", create_test_jpeg(400, 400), "image/jpeg");
    let app = TestAppBuilder::new().with_store(store).build();

    assert_eq!(app.get("/thumb/a/b.jpg", None).await.status(), StatusCode::OK);
    assert_eq!(app.get("/wide/a/b.jpg", None).await.status(), StatusCode::OK);

    assert!(wait_for_object(app.store(), "cache/a/thumb/b.jpg").await.is_some());
    assert!(wait_for_object(app.store(), "cache/a/wide/b.jpg").await.is_some());
    assert_eq!(app.transformer.calls(), 2);
}

// =============================================================================
// Store Failures
// =============================================================================

#[tokio::test]
async fn test_failed_cache_probe_falls_through() {
    let store = MemoryStore::new()
        .with_object("a/b.jpg", create_test_jpeg(200, 200), "image/jpeg")
        .with_failing_cache_reads();
    let app = TestAppBuilder::new().with_store(store).build();

    let response = app.get("/thumb/a/b.jpg", None).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(header(&response, "x-thumbnail-cache-hit"), "false");
    assert_eq!(app.transformer.calls(), 1);
}

#[tokio::test]
async fn test_failed_write_back_still_serves() {
    let store = MemoryStore::new()
        .with_object("a/b.jpg", create_test_jpeg(200, 200), "image/jpeg")
        .with_failing_writes();
    let app = TestAppBuilder::new().with_store(store).build();

    let response = app.get("/thumb/a/b.jpg", None).await;
    assert_eq!(response.status(), StatusCode::OK);

    app.service.shutdown().await;
    assert_eq!(app.store().put_count(), 1);
    assert!(app.store().object("cache/a/thumb/b.jpg").await.is_none());

    // Still a miss next time
    let response = app.get("/thumb/a/b.jpg", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(header(&response, "x-thumbnail-cache-hit"), "false");
}

#[tokio::test]
async fn test_unrecognized_cached_object_is_regenerated() {
    let store = MemoryStore::new()
        .with_object("a/b.jpg", create_test_jpeg(200, 200), "image/jpeg")
        .with_object("cache/a/thumb/b.jpg", b"corrupt".to_vec(), "image/jpeg");
    let app = TestAppBuilder::new().with_store(store).build();

    let response = app.get("/thumb/a/b.jpg", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(header(&response, "x-thumbnail-cache-hit"), "false");
    let body = body_bytes(response).await;

    app.service.shutdown().await;
    let (stored, _) = app.store().object("cache/a/thumb/b.jpg").await.unwrap();
    assert_eq!(stored, body);
}
