//! # Thumb Streamer
//!
//! An on-demand image thumbnail server with a shared S3 cache.
//!
//! A request names a size token and a source image. The server checks the
//! request signature, resolves the size, and looks for an already rendered
//! thumbnail in the bucket. On a miss it fetches the original (from a remote
//! URL or from the bucket itself), resizes it, answers the client, and writes
//! the thumbnail back in the background so the next request is a hit.
//!
//! ## Features
//!
//! - **Signed requests**: HMAC-SHA256 over the escaped request path
//! - **Shared cache**: deterministic storage keys, so any number of instances
//!   can share one bucket
//! - **Two kinds of sources**: remote `http(s)` URLs and keys in the bucket
//! - **Non-blocking write-back**: responses never wait for the cache write
//! - **Stage-specific errors**: every failure stage reports its own status
//!
//! ## Architecture
//!
//! - [`auth`] - request signing and verification
//! - [`resolve`] - size tokens, cache keys, source classification
//! - [`storage`] - object store trait and S3 implementation
//! - [`origin`] - remote origin trait and HTTP implementation
//! - [`transform`] - resizing and content type detection
//! - [`thumbnail`] - the orchestrating service, result envelope, write-back queue
//! - [`server`] - Axum-based HTTP server and routes
//! - [`config`] - CLI and configuration types
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use thumb_streamer::{
//!     create_router, HttpOrigin, ImageTransformer, RouterConfig, SizeTable, ThumbnailService,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let sizes = SizeTable::new().with_entry("thumb", "150x150");
//!     let service = Arc::new(ThumbnailService::new(
//!         sizes,
//!         Arc::new(HttpOrigin::new(None)?),
//!         Arc::new(ImageTransformer::new()),
//!     ));
//!
//!     let router = create_router(service, RouterConfig::new());
//!     let listener = tokio::net::TcpListener::bind("0.0.0.0:8080").await?;
//!     axum::serve(listener, router).await?;
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod config;
pub mod error;
pub mod origin;
pub mod resolve;
pub mod server;
pub mod storage;
pub mod thumbnail;
pub mod transform;

// Re-export commonly used types
pub use auth::{AuthError, RequestSigner, SIGNATURE_HEADER};
pub use config::{Cli, Command, ServeConfig, SignConfig, SignOutputFormat};
pub use error::{
    ErrorKind, FetchError, ParseError, SizeError, StorageError, ThumbError, TransformError,
};
pub use origin::{HttpOrigin, Origin};
pub use resolve::{CacheKey, SizeSpec, SizeTable, SourceRef, CACHE_PREFIX};
pub use server::{create_router, AppState, ErrorResponse, HealthResponse, RouterConfig};
pub use storage::{create_s3_client, ObjectStore, S3ObjectStore, S3Settings, StoredObject};
pub use thumbnail::{
    PersistQueue, ResultEnvelope, ThumbnailRequest, ThumbnailResponse, ThumbnailService,
};
pub use transform::{detect_content_type, ImageTransformer, TransformOptions, Transformer};
