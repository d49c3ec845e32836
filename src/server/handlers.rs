//! HTTP request handlers for the thumbnail API.
//!
//! # Endpoints
//!
//! - `GET /{size_token}/{source_reference}` - Serve a thumbnail
//! - `GET /health` - Health check endpoint

use std::sync::Arc;

use axum::{
    body::Body,
    extract::{OriginalUri, Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::{error, warn};

use crate::auth::SIGNATURE_HEADER;
use crate::error::ThumbError;
use crate::thumbnail::{ThumbnailRequest, ThumbnailResponse, ThumbnailService};

/// Response header reporting whether the thumbnail came from the store.
pub const CACHE_HIT_HEADER: &str = "X-Thumbnail-Cache-Hit";

// =============================================================================
// Application State
// =============================================================================

/// Shared application state passed to handlers via Axum's State extractor.
pub struct AppState {
    pub service: Arc<ThumbnailService>,

    /// Cache-Control max-age in seconds
    pub cache_max_age: u32,
}

impl AppState {
    pub fn new(service: Arc<ThumbnailService>, cache_max_age: u32) -> Self {
        Self {
            service,
            cache_max_age,
        }
    }
}

impl Clone for AppState {
    fn clone(&self) -> Self {
        Self {
            service: Arc::clone(&self.service),
            cache_max_age: self.cache_max_age,
        }
    }
}

// =============================================================================
// Response Types
// =============================================================================

/// JSON error response returned for all error conditions.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Failure stage identifier (e.g., "signature", "origin_fetch")
    pub error: String,

    /// Human-readable error message
    pub message: String,

    /// Status code (included for convenience)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
            status: None,
        }
    }

    pub fn with_status(
        error: impl Into<String>,
        message: impl Into<String>,
        status: StatusCode,
    ) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
            status: Some(status.as_u16()),
        }
    }
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,

    /// Whether thumbnails are read from and written to a store
    pub caching: bool,
}

// =============================================================================
// Error Mapping
// =============================================================================

/// Convert ThumbError to HTTP response.
///
/// Every failure stage has its own status code. Request-attributable
/// failures are logged at WARN, service and backend failures at ERROR.
impl IntoResponse for ThumbError {
    fn into_response(self) -> Response {
        let kind = self.kind();
        let status = kind.status();
        let message = self.to_string();

        if kind.is_client_error() {
            warn!(
                error_type = kind.as_str(),
                status = status.as_u16(),
                "Client error: {}",
                message
            );
        } else {
            error!(
                error_type = kind.as_str(),
                status = status.as_u16(),
                "Server error: {}",
                message
            );
        }

        let error_response = ErrorResponse::with_status(kind.as_str(), message, status);

        (status, Json(error_response)).into_response()
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// Handle thumbnail requests.
///
/// # Endpoint
///
/// `GET /{size_token}/{source_reference}`
///
/// `source_reference` is either a storage key (`photos/cat.jpg`) or a
/// percent-escaped absolute URL (`http%3A%2F%2Fexample.com%2Fcat.jpg`).
///
/// # Request Headers
///
/// - `Signature`: base64 HMAC of the escaped request path (when auth is on)
///
/// # Response
///
/// - `200 OK`: thumbnail bytes
/// - `601`..`609`: failure stage, with a JSON [`ErrorResponse`] body
///
/// # Headers
///
/// - `Content-Type`: sniffed from the thumbnail bytes
/// - `Content-Length`
/// - `ETag`: quoted SHA-256 of the thumbnail bytes
/// - `Cache-Control: max-age={cache_max_age},public`
/// - `X-Thumbnail-Cache-Hit: true|false`
pub async fn thumbnail_handler(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    Path((size_token, source)): Path<(String, String)>,
    headers: HeaderMap,
) -> Result<Response, ThumbError> {
    let source = source.strip_prefix('/').unwrap_or(&source);

    let mut request =
        ThumbnailRequest::new(size_token, source).with_signed_path(uri.path().to_string());
    if let Some(signature) = headers
        .get(SIGNATURE_HEADER)
        .and_then(|value| value.to_str().ok())
    {
        request = request.with_signature(signature);
    }

    let thumbnail = state.service.get_thumbnail(&request).await?;
    let response = build_response(&thumbnail, state.cache_max_age)?;

    // Only a response that could be assembled is worth storing
    state.service.write_back(&thumbnail);

    Ok(response)
}

fn build_response(response: &ThumbnailResponse, cache_max_age: u32) -> Result<Response, ThumbError> {
    let mut builder = Response::builder().status(StatusCode::OK);
    for (name, value) in response.envelope.response_headers(cache_max_age) {
        builder = builder.header(name, value);
    }

    builder
        .header(CACHE_HIT_HEADER, response.cache_hit.to_string())
        .body(Body::from(response.envelope.payload.clone()))
        .map_err(|e| ThumbError::Response(e.to_string()))
}

/// Handle health check requests.
///
/// # Endpoint
///
/// `GET /health`
///
/// # Response
///
/// `200 OK` with JSON body:
/// ```json
/// {
///   "status": "healthy",
///   "version": "0.1.0",
///   "caching": true
/// }
/// ```
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        caching: state.service.caching_enabled(),
    })
}

// =============================================================================
// Tests
// =============================================================================
