//! HTTP server layer.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                         HTTP Layer                              │
//! │              GET /{size_token}/{source_reference}               │
//! │                                                                 │
//! │  ┌──────────────────────────┐  ┌────────────────────────────┐   │
//! │  │        handlers          │  │          routes            │   │
//! │  │ (extract, map errors,    │  │ (router config, tracing)   │   │
//! │  │  project headers)        │  │                            │   │
//! │  └──────────────────────────┘  └────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

pub mod handlers;
pub mod routes;

pub use handlers::{
    health_handler, thumbnail_handler, AppState, ErrorResponse, HealthResponse, CACHE_HIT_HEADER,
};
pub use routes::{create_router, RouterConfig, DEFAULT_CACHE_MAX_AGE};
