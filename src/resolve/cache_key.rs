//! Storage keys for derived thumbnails.
//!
//! A key is a structural rewrite of the source path, not a hash:
//!
//! ```text
//! source  http://example.com/photos/2024/cat.jpg   token  thumb
//! path                      photos/2024/cat.jpg
//! key     cache/photos/2024/thumb/cat.jpg
//! ```
//!
//! Scheme and host are dropped, so the same path on two origins shares a
//! key. Sibling sizes of one original land next to each other in the bucket.

use url::Url;

/// Prefix under which every derived object is stored.
pub const CACHE_PREFIX: &str = "cache/";

/// Storage key of a derived thumbnail.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey(String);

impl CacheKey {
    /// Derive the key for `(source, size_token)`.
    ///
    /// Total and deterministic: the same inputs give the same key in every
    /// process, which is what lets separate instances share a bucket.
    pub fn derive(source: &str, size_token: &str) -> Self {
        let path = strip_origin(source);
        let (dir, file) = split_path(&path);
        Self(format!("{}{}{}/{}", CACHE_PREFIX, dir, size_token, file))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for CacheKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Path (and query) of a reference with any scheme and host removed,
/// without a leading slash.
fn strip_origin(source: &str) -> String {
    let path = match Url::parse(source) {
        Ok(url) if url.host().is_some() => match url.query() {
            Some(query) => format!("{}?{}", url.path(), query),
            None => url.path().to_string(),
        },
        _ => source.to_string(),
    };
    path.trim_start_matches('/').to_string()
}

/// Split after the final `/` into `(directory, filename)`.
///
/// The directory keeps its trailing slash; a path without a slash has an
/// empty directory.
pub fn split_path(path: &str) -> (&str, &str) {
    match path.rfind('/') {
        Some(idx) => path.split_at(idx + 1),
        None => ("", path),
    }
}
