//! Request resolution: turning the raw path segments of a thumbnail request
//! into concrete dimensions, a storage key, and a source to read from.
//!
//! # Pipeline
//!
//! ```text
//!   GET /{size_token}/{source_reference}
//!          │                │
//!          ▼                ├──────────────────────┐
//!   ┌─────────────┐         ▼                      ▼
//!   │  SizeTable  │   ┌───────────┐        ┌──────────────┐
//!   │  "thumb" →  │   │ CacheKey  │        │  SourceRef   │
//!   │   150x150   │   │ cache/a/  │        │ Remote(url)  │
//!   └─────────────┘   │ thumb/b.jpg│       │ Store(key)   │
//!                     └───────────┘        └──────────────┘
//! ```
//!
//! All three are pure functions of their inputs. The cache key doubles as the
//! durable storage layout, so its derivation must never change between
//! releases without a migration.

mod cache_key;
mod size;
mod source;

pub use cache_key::{split_path, CacheKey, CACHE_PREFIX};
pub use size::{SizeSpec, SizeTable};
pub use source::SourceRef;
