//! Remote origins.
//!
//! Remote source references are fetched with a single GET. There is no retry
//! and no redirect handling beyond what the HTTP client does natively: a
//! non-success status is reported straight back to the caller.

mod remote;

use async_trait::async_trait;
use bytes::Bytes;
use url::Url;

use crate::error::FetchError;

pub use remote::HttpOrigin;

/// Reads original image bytes from a remote URL.
#[async_trait]
pub trait Origin: Send + Sync {
    /// Fetch the full body at `url`.
    async fn fetch(&self, url: &Url) -> Result<Bytes, FetchError>;
}
