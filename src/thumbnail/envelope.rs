use bytes::Bytes;
use http::header::{CACHE_CONTROL, CONTENT_LENGTH, CONTENT_TYPE, ETAG};
use http::HeaderName;
use sha2::{Digest, Sha256};

use crate::error::TransformError;
use crate::resolve::CacheKey;
use crate::transform::detect_content_type;

/// Uniform description of a resolved thumbnail, whether it came out of the
/// cache or was just produced.
///
/// Every field is derived from the payload bytes, so a hit and a fresh
/// transform of the same thumbnail yield identical envelopes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultEnvelope {
    /// MIME type sniffed from the payload's leading bytes
    pub content_type: &'static str,

    /// Payload length in bytes
    pub content_length: u64,

    /// Hex SHA-256 of the payload, used as the entity tag
    pub content_hash: String,

    /// Where the thumbnail lives (or will live) in the store
    pub storage_path: CacheKey,

    /// Encoded thumbnail bytes
    pub payload: Bytes,
}

impl ResultEnvelope {
    /// Build an envelope around encoded thumbnail bytes.
    ///
    /// Fails with [`TransformError::UnknownFormat`] if the payload does not
    /// start with a recognized image signature.
    pub fn from_payload(storage_path: CacheKey, payload: Bytes) -> Result<Self, TransformError> {
        let content_type = detect_content_type(&payload)?;

        Ok(Self {
            content_type,
            content_length: payload.len() as u64,
            content_hash: content_hash(&payload),
            storage_path,
            payload,
        })
    }

    /// Quoted entity tag derived from the content hash.
    pub fn etag(&self) -> String {
        format!("\"{}\"", self.content_hash)
    }

    /// Project the envelope onto the response headers the client receives.
    ///
    /// Pure: the same envelope and max-age always give the same headers.
    pub fn response_headers(&self, cache_max_age: u32) -> [(HeaderName, String); 4] {
        [
            (CONTENT_TYPE, self.content_type.to_string()),
            (CONTENT_LENGTH, self.content_length.to_string()),
            (ETAG, self.etag()),
            (CACHE_CONTROL, cache_control(cache_max_age)),
        ]
    }
}

/// Hex SHA-256 digest of `data`.
pub fn content_hash(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

/// `Cache-Control` value advertising a public, shared-cacheable response.
pub fn cache_control(max_age: u32) -> String {
    format!("max-age={},public", max_age)
}
