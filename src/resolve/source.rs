//! Source reference classification.
//!
//! A source reference is either a full URL (fetched over HTTP) or a key of
//! an original already sitting in the object store. The split is purely
//! structural: anything with a host component is remote, everything else
//! is a storage key used verbatim.

use url::Url;

use crate::error::ParseError;

/// Where the original bytes of an image live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceRef {
    /// Fetched from an HTTP(S) origin
    Remote(Url),

    /// Read from the object store under this key
    Store { key: String },
}

impl SourceRef {
    /// Classify a raw (already percent-decoded) reference.
    ///
    /// References that do not parse as absolute URLs are storage keys. A
    /// reference that looks like a URL but is broken (empty host, bad port)
    /// is rejected rather than silently treated as a key.
    pub fn classify(raw: &str) -> Result<Self, ParseError> {
        match Url::parse(raw) {
            Ok(url) if url.host().is_some() => match url.scheme() {
                "http" | "https" => Ok(SourceRef::Remote(url)),
                other => Err(ParseError::UnsupportedScheme(other.to_string())),
            },
            Ok(_) | Err(url::ParseError::RelativeUrlWithoutBase) => Ok(SourceRef::Store {
                key: raw.to_string(),
            }),
            Err(e) => Err(ParseError::Malformed {
                reference: raw.to_string(),
                reason: e.to_string(),
            }),
        }
    }

    pub fn is_remote(&self) -> bool {
        matches!(self, SourceRef::Remote(_))
    }
}

impl std::fmt::Display for SourceRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceRef::Remote(url) => write!(f, "{}", url),
            SourceRef::Store { key } => write!(f, "store:{}", key),
        }
    }
}
