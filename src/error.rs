use http::StatusCode;
use thiserror::Error;

use crate::auth::AuthError;

/// Errors resolving a size token against the configured size table
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SizeError {
    /// Token has no entry in the size table
    #[error("Unknown size token: {0}")]
    UnknownToken(String),

    /// Table entry is not of the form "<width>x<height>" with positive integers
    #[error("Malformed size spec for token {token}: {spec:?}")]
    MalformedSpec { token: String, spec: String },
}

/// Errors classifying a source reference
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// Reference could not be parsed as a URL or storage key
    #[error("Malformed source reference {reference:?}: {reason}")]
    Malformed { reference: String, reason: String },

    /// Reference names a host but uses a scheme we cannot fetch
    #[error("Unsupported source scheme: {0}")]
    UnsupportedScheme(String),
}

/// Errors fetching the original image bytes
#[derive(Debug, Clone, Error)]
pub enum FetchError {
    /// Remote origin answered with a non-success status
    #[error("Unexpected status code from source: {0}")]
    UpstreamStatus(u16),

    /// Stored original does not exist
    #[error("Source object not found: {0}")]
    NotFound(String),

    /// Network or connection error talking to the origin
    #[error("Transport error: {0}")]
    Transport(String),

    /// Reference names a stored object but caching/storage is disabled
    #[error("No object store configured to read {0}")]
    NoStore(String),

    /// Storage backend failed while reading a stored original
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

/// Errors from the transform collaborator
#[derive(Debug, Clone, Error)]
pub enum TransformError {
    /// Source bytes could not be decoded as an image
    #[error("Failed to decode image: {message}")]
    Decode { message: String },

    /// Resized image could not be encoded
    #[error("Failed to encode image: {message}")]
    Encode { message: String },

    /// Output leading bytes do not match a recognized image signature
    #[error("Unknown image format")]
    UnknownFormat,

    /// Transform task panicked or was cancelled
    #[error("Transform task failed: {0}")]
    Task(String),
}

/// Errors from the object storage backend
#[derive(Debug, Clone, Error)]
pub enum StorageError {
    /// Object does not exist
    #[error("Object not found: {0}")]
    NotFound(String),

    /// Request could not be built, dispatched, or timed out
    #[error("Storage session error: {0}")]
    Session(String),

    /// Backend rejected the read
    #[error("Storage read error: {0}")]
    Read(String),

    /// Object body failed mid-transfer
    #[error("Storage body error: {0}")]
    Body(String),

    /// Backend rejected the write
    #[error("Storage write error: {0}")]
    Write(String),
}

/// Any failure that aborts a thumbnail request
#[derive(Debug, Error)]
pub enum ThumbError {
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Size(#[from] SizeError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Transform(#[from] TransformError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    /// Response could not be assembled from the result envelope
    #[error("Failed to build response: {0}")]
    Response(String),
}

impl ThumbError {
    /// The pipeline stage this error is attributed to.
    pub fn kind(&self) -> ErrorKind {
        match self {
            ThumbError::Auth(_) => ErrorKind::Signature,
            ThumbError::Size(_) => ErrorKind::SizeResolution,
            ThumbError::Parse(_) => ErrorKind::ReferenceParse,
            ThumbError::Fetch(FetchError::Storage(e)) => storage_kind(e),
            ThumbError::Fetch(FetchError::NotFound(_)) => ErrorKind::StorageRead,
            ThumbError::Fetch(_) => ErrorKind::OriginFetch,
            ThumbError::Transform(_) => ErrorKind::Transform,
            ThumbError::Storage(e) => storage_kind(e),
            ThumbError::Response(_) => ErrorKind::ResponseCopy,
        }
    }
}

fn storage_kind(err: &StorageError) -> ErrorKind {
    match err {
        StorageError::Session(_) => ErrorKind::StorageSession,
        StorageError::NotFound(_) | StorageError::Read(_) => ErrorKind::StorageRead,
        StorageError::Body(_) => ErrorKind::ResponseCopy,
        StorageError::Write(_) => ErrorKind::StorageWrite,
    }
}

// =============================================================================
// Error Kinds
// =============================================================================

/// Failure stage of a request, each reported with its own status code so
/// operators can tell which step of the chain broke.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    SizeResolution,
    Signature,
    ReferenceParse,
    OriginFetch,
    Transform,
    StorageSession,
    StorageRead,
    StorageWrite,
    ResponseCopy,
}

impl ErrorKind {
    pub const ALL: [ErrorKind; 9] = [
        ErrorKind::SizeResolution,
        ErrorKind::Signature,
        ErrorKind::ReferenceParse,
        ErrorKind::OriginFetch,
        ErrorKind::Transform,
        ErrorKind::StorageSession,
        ErrorKind::StorageRead,
        ErrorKind::StorageWrite,
        ErrorKind::ResponseCopy,
    ];

    /// Private-range status code reported to the client.
    pub fn status_code(self) -> u16 {
        match self {
            ErrorKind::SizeResolution => 601,
            ErrorKind::Signature => 602,
            ErrorKind::ReferenceParse => 603,
            ErrorKind::OriginFetch => 604,
            ErrorKind::Transform => 605,
            ErrorKind::StorageSession => 606,
            ErrorKind::StorageRead => 607,
            ErrorKind::StorageWrite => 608,
            ErrorKind::ResponseCopy => 609,
        }
    }

    /// The status code as an HTTP status.
    pub fn status(self) -> StatusCode {
        // 6xx is inside the 100..=999 range http accepts
        StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    /// Short identifier used in JSON error bodies and log fields.
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::SizeResolution => "size_resolution",
            ErrorKind::Signature => "signature",
            ErrorKind::ReferenceParse => "reference_parse",
            ErrorKind::OriginFetch => "origin_fetch",
            ErrorKind::Transform => "transform",
            ErrorKind::StorageSession => "storage_session",
            ErrorKind::StorageRead => "storage_read",
            ErrorKind::StorageWrite => "storage_write",
            ErrorKind::ResponseCopy => "response_copy",
        }
    }

    /// Whether the failure is attributable to the request rather than to the
    /// service or its backends.
    pub fn is_client_error(self) -> bool {
        matches!(
            self,
            ErrorKind::SizeResolution
                | ErrorKind::Signature
                | ErrorKind::ReferenceParse
                | ErrorKind::OriginFetch
        )
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
