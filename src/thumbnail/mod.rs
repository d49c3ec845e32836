//! Thumbnail orchestration.
//!
//! - [`ThumbnailService`]: drives one request through verification, size and
//!   source resolution, the cache probe, the fetch, and the transform
//! - [`ResultEnvelope`]: the uniform result handed to the HTTP layer
//! - [`PersistQueue`]: background write-back of fresh thumbnails

mod envelope;
mod persist;
mod service;

pub use envelope::{cache_control, content_hash, ResultEnvelope};
pub use persist::{PersistQueue, DEFAULT_PERSIST_QUEUE};
pub use service::{ThumbnailRequest, ThumbnailResponse, ThumbnailService};
