//! Thumbnail Service for orchestrating a single request.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                        ThumbnailService                          │
//! │                                                                  │
//! │  1. Verify signature      4. Probe cache ──── hit ──► envelope   │
//! │  2. Resolve size token          │ miss                           │
//! │  3. Derive cache key            ▼                                │
//! │                           5. Classify source                     │
//! │                           6. Fetch original (origin or store)    │
//! │                           7. Transform (blocking pool)           │
//! │                           8. Envelope                            │
//! │                                                                  │
//! │   ┌──────────┐   ┌─────────────┐   ┌────────┐   ┌─────────────┐  │
//! │   │ Signer   │   │ ObjectStore │   │ Origin │   │ Transformer │  │
//! │   └──────────┘   └─────────────┘   └────────┘   └─────────────┘  │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The first failing step ends the request; nothing after it runs. The
//! write-back of a fresh thumbnail is queued separately through
//! [`ThumbnailService::write_back`] once the caller has built its response.

use std::sync::Arc;

use bytes::Bytes;
use tracing::{debug, info, warn};

use super::envelope::ResultEnvelope;
use super::persist::PersistQueue;
use crate::auth::{AuthError, RequestSigner};
use crate::error::{FetchError, StorageError, ThumbError, TransformError};
use crate::origin::Origin;
use crate::resolve::{CacheKey, SizeSpec, SizeTable, SourceRef};
use crate::storage::ObjectStore;
use crate::transform::{TransformOptions, Transformer};

// =============================================================================
// Thumbnail Request
// =============================================================================

/// One incoming thumbnail request, as taken off the wire.
#[derive(Debug, Clone)]
pub struct ThumbnailRequest {
    /// Size token from the first path segment
    pub size_token: String,

    /// Raw source reference from the rest of the path
    pub source: String,

    /// Escaped request path the signature covers
    pub signed_path: String,

    /// Value of the `Signature` header, if present
    pub signature: Option<String>,
}

impl ThumbnailRequest {
    pub fn new(size_token: impl Into<String>, source: impl Into<String>) -> Self {
        let size_token = size_token.into();
        let source = source.into();
        let signed_path = format!("/{}/{}", size_token, source);

        Self {
            size_token,
            source,
            signed_path,
            signature: None,
        }
    }

    /// Override the path covered by the signature.
    pub fn with_signed_path(mut self, path: impl Into<String>) -> Self {
        self.signed_path = path.into();
        self
    }

    pub fn with_signature(mut self, signature: impl Into<String>) -> Self {
        self.signature = Some(signature.into());
        self
    }
}

// =============================================================================
// Thumbnail Response
// =============================================================================

/// Result of a successful request.
#[derive(Debug, Clone)]
pub struct ThumbnailResponse {
    pub envelope: ResultEnvelope,

    /// Whether the thumbnail was served from the store
    pub cache_hit: bool,
}

// =============================================================================
// Thumbnail Service
// =============================================================================

/// Resolves thumbnail requests against the cache, the origins, and the
/// transformer.
///
/// Holds no per-request state; one instance serves every request
/// concurrently.
///
/// # Example
///
/// ```ignore
/// use std::sync::Arc;
/// use thumb_streamer::{HttpOrigin, ImageTransformer, SizeTable, ThumbnailRequest, ThumbnailService};
///
/// let sizes = SizeTable::new().with_entry("thumb", "150x150");
/// let service = ThumbnailService::new(
///     sizes,
///     Arc::new(HttpOrigin::new(None)?),
///     Arc::new(ImageTransformer::new()),
/// )
/// .with_store(store, 256);
///
/// let request = ThumbnailRequest::new("thumb", "photos/cat.jpg");
/// let response = service.get_thumbnail(&request).await?;
/// ```
pub struct ThumbnailService {
    sizes: SizeTable,
    options: TransformOptions,
    signer: Option<RequestSigner>,
    store: Option<Arc<dyn ObjectStore>>,
    origin: Arc<dyn Origin>,
    transformer: Arc<dyn Transformer>,
    persist: Option<PersistQueue>,
}

impl ThumbnailService {
    /// Create a service with no store (caching disabled) and no signature
    /// checks.
    pub fn new(
        sizes: SizeTable,
        origin: Arc<dyn Origin>,
        transformer: Arc<dyn Transformer>,
    ) -> Self {
        Self {
            sizes,
            options: TransformOptions::default(),
            signer: None,
            store: None,
            origin,
            transformer,
            persist: None,
        }
    }

    /// Require every request to carry a valid signature.
    pub fn with_signer(mut self, signer: RequestSigner) -> Self {
        self.signer = Some(signer);
        self
    }

    pub fn with_options(mut self, options: TransformOptions) -> Self {
        self.options = options;
        self
    }

    /// Enable caching against `store`.
    ///
    /// Spawns the write-back worker, so this must be called inside a Tokio
    /// runtime.
    pub fn with_store(mut self, store: Arc<dyn ObjectStore>, persist_capacity: usize) -> Self {
        self.persist = Some(PersistQueue::new(store.clone(), persist_capacity));
        self.store = Some(store);
        self
    }

    /// Whether results are cached.
    pub fn caching_enabled(&self) -> bool {
        self.store.is_some()
    }

    pub fn auth_enabled(&self) -> bool {
        self.signer.is_some()
    }

    /// Resolve one request into a thumbnail.
    ///
    /// # Errors
    ///
    /// Returns the error of the first step that fails:
    /// - signature missing or wrong
    /// - size token unknown or malformed
    /// - source reference unparseable (only checked on a cache miss)
    /// - original missing or unreachable
    /// - original undecodable or output unrecognized
    pub async fn get_thumbnail(
        &self,
        request: &ThumbnailRequest,
    ) -> Result<ThumbnailResponse, ThumbError> {
        self.authenticate(request)?;

        let size = self.sizes.resolve(&request.size_token)?;
        let cache_key = CacheKey::derive(&request.source, &request.size_token);

        if let Some(envelope) = self.probe_cache(&cache_key).await? {
            info!(key = %cache_key, "Cache hit");
            return Ok(ThumbnailResponse {
                envelope,
                cache_hit: true,
            });
        }

        let source = SourceRef::classify(&request.source)?;
        let original = self.fetch_original(&source).await?;
        debug!(source = %source, bytes = original.len(), "Fetched original");

        let thumbnail = self.transform(original, size).await?;
        let envelope = ResultEnvelope::from_payload(cache_key, thumbnail)?;

        info!(
            key = %envelope.storage_path,
            size = %size,
            bytes = envelope.content_length,
            "Thumbnail generated"
        );

        Ok(ThumbnailResponse {
            envelope,
            cache_hit: false,
        })
    }

    /// Queue a freshly generated thumbnail for storage.
    ///
    /// Returns whether it was queued. Hits, a disabled cache and a full
    /// queue all return `false`; none of them affects the response.
    pub fn write_back(&self, response: &ThumbnailResponse) -> bool {
        if response.cache_hit {
            return false;
        }

        match &self.persist {
            Some(queue) => queue.enqueue(response.envelope.clone()),
            None => false,
        }
    }

    /// Wait for queued write-backs to finish.
    pub async fn shutdown(&self) {
        if let Some(queue) = &self.persist {
            queue.shutdown().await;
        }
    }

    fn authenticate(&self, request: &ThumbnailRequest) -> Result<(), AuthError> {
        let Some(signer) = &self.signer else {
            return Ok(());
        };

        let signature = request
            .signature
            .as_deref()
            .ok_or(AuthError::MissingSignature)?;
        signer.verify(signature, &request.signed_path)
    }

    /// Look the key up in the store.
    ///
    /// Anything other than a readable, recognizable object is a miss, except
    /// a body that breaks off mid-transfer.
    async fn probe_cache(&self, key: &CacheKey) -> Result<Option<ResultEnvelope>, ThumbError> {
        let Some(store) = &self.store else {
            return Ok(None);
        };

        let object = match store.get(key.as_str()).await {
            Ok(object) => object,
            Err(StorageError::NotFound(_)) => {
                debug!(key = %key, "Cache miss");
                return Ok(None);
            }
            Err(e @ StorageError::Body(_)) => return Err(e.into()),
            Err(e) => {
                warn!(key = %key, error = %e, "Cache probe failed, regenerating");
                return Ok(None);
            }
        };

        match ResultEnvelope::from_payload(key.clone(), object.body) {
            Ok(envelope) => {
                if let Some(stored) = object.content_type.as_deref() {
                    if stored != envelope.content_type {
                        debug!(
                            key = %key,
                            stored,
                            sniffed = envelope.content_type,
                            "Stored content type differs from payload"
                        );
                    }
                }
                Ok(Some(envelope))
            }
            Err(e) => {
                warn!(key = %key, error = %e, "Cached object unrecognized, regenerating");
                Ok(None)
            }
        }
    }

    async fn fetch_original(&self, source: &SourceRef) -> Result<Bytes, FetchError> {
        match source {
            SourceRef::Remote(url) => self.origin.fetch(url).await,
            SourceRef::Store { key } => {
                let store = self
                    .store
                    .as_ref()
                    .ok_or_else(|| FetchError::NoStore(key.clone()))?;

                match store.get(key).await {
                    Ok(object) => Ok(object.body),
                    Err(StorageError::NotFound(_)) => Err(FetchError::NotFound(key.clone())),
                    Err(e) => Err(FetchError::Storage(e)),
                }
            }
        }
    }

    async fn transform(&self, original: Bytes, size: SizeSpec) -> Result<Bytes, TransformError> {
        let transformer = self.transformer.clone();
        let options = self.options;

        tokio::task::spawn_blocking(move || transformer.transform(&original, size, options))
            .await
            .map_err(|e| TransformError::Task(e.to_string()))?
    }
}
