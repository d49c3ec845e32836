//! Size token lookup.
//!
//! Size tokens are opaque labels ("thumb", "small") that clients put in the
//! first path segment. The operator maps each one to a `<width>x<height>`
//! string. Entries are kept as raw strings and parsed on lookup, so a broken
//! entry only fails requests that actually use it.

use std::collections::HashMap;

use crate::error::SizeError;

/// Concrete target dimensions in pixels. Both are always positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SizeSpec {
    pub width: u32,
    pub height: u32,
}

impl SizeSpec {
    /// Parse a `"<width>x<height>"` value.
    ///
    /// Returns `None` unless the value splits on `x` into exactly two
    /// positive integers.
    pub fn parse(value: &str) -> Option<Self> {
        let mut parts = value.split('x');
        let width = parse_dimension(parts.next()?)?;
        let height = parse_dimension(parts.next()?)?;
        if parts.next().is_some() {
            return None;
        }
        Some(Self { width, height })
    }
}

fn parse_dimension(part: &str) -> Option<u32> {
    match part.parse::<u32>() {
        Ok(0) | Err(_) => None,
        Ok(n) => Some(n),
    }
}

impl std::fmt::Display for SizeSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Operator-configured mapping from size token to `"WxH"` value.
///
/// Built once at startup and read-only afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SizeTable {
    entries: HashMap<String, String>,
}

impl SizeTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace an entry.
    pub fn with_entry(mut self, token: impl Into<String>, spec: impl Into<String>) -> Self {
        self.entries.insert(token.into(), spec.into());
        self
    }

    /// Resolve a token to dimensions.
    ///
    /// An absent token or a value that is not two positive integers is an
    /// error; there is no default size and no clamping.
    pub fn resolve(&self, token: &str) -> Result<SizeSpec, SizeError> {
        let spec = self
            .entries
            .get(token)
            .ok_or_else(|| SizeError::UnknownToken(token.to_string()))?;

        SizeSpec::parse(spec).ok_or_else(|| SizeError::MalformedSpec {
            token: token.to_string(),
            spec: spec.clone(),
        })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate entries sorted by token, for stable startup logging.
    pub fn sorted_entries(&self) -> Vec<(&str, &str)> {
        let mut entries: Vec<_> = self
            .entries
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();
        entries.sort();
        entries
    }
}

impl<K, V> FromIterator<(K, V)> for SizeTable
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}
