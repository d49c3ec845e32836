//! Router configuration for the thumbnail server.
//!
//! # Route Structure
//!
//! ```text
//! /health                          - Health check (public)
//! /{size_token}/{*source}          - Thumbnail endpoint (signed when auth is on)
//! ```
//!
//! Signature checks live in the [`ThumbnailService`], not in a middleware,
//! so they apply to every caller of the service and are attributed their own
//! failure status.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use thumb_streamer::server::{create_router, RouterConfig};
//!
//! let service = Arc::new(service);
//! let router = create_router(service.clone(), RouterConfig::new().with_cache_max_age(86400));
//!
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:8080").await?;
//! axum::serve(listener, router).await?;
//! service.shutdown().await;
//! ```

use std::sync::Arc;

use axum::{routing::get, Router};
use tower_http::trace::TraceLayer;

use super::handlers::{health_handler, thumbnail_handler, AppState};
use crate::thumbnail::ThumbnailService;

/// Default Cache-Control max-age in seconds.
pub const DEFAULT_CACHE_MAX_AGE: u32 = 3600;

// =============================================================================
// Router Configuration
// =============================================================================

/// Configuration for the HTTP router.
#[derive(Debug, Clone)]
pub struct RouterConfig {
    /// Cache-Control max-age in seconds
    pub cache_max_age: u32,

    /// Whether to enable request tracing
    pub enable_tracing: bool,
}

impl RouterConfig {
    /// By default the max-age is 1 hour and tracing is enabled.
    pub fn new() -> Self {
        Self {
            cache_max_age: DEFAULT_CACHE_MAX_AGE,
            enable_tracing: true,
        }
    }

    pub fn with_cache_max_age(mut self, seconds: u32) -> Self {
        self.cache_max_age = seconds;
        self
    }

    pub fn with_tracing(mut self, enabled: bool) -> Self {
        self.enable_tracing = enabled;
        self
    }
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Router Builder
// =============================================================================

/// Create the main application router.
///
/// The service is shared so the caller can keep a handle and drain its
/// write-back queue after the server stops.
pub fn create_router(service: Arc<ThumbnailService>, config: RouterConfig) -> Router {
    let app_state = AppState::new(service, config.cache_max_age);

    let router = Router::new()
        .route("/health", get(health_handler))
        .route("/{size_token}/{*source}", get(thumbnail_handler))
        .with_state(app_state);

    if config.enable_tracing {
        router.layer(TraceLayer::new_for_http())
    } else {
        router
    }
}
