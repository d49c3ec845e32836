//! Image transformation.
//!
//! The service treats the resizer as an opaque collaborator behind the
//! [`Transformer`] trait: bytes in, bytes out. [`ImageTransformer`] is the
//! in-process implementation built on the `image` crate.
//!
//! Output content types are never taken on trust from a backend or origin;
//! they are sniffed from the leading bytes with [`detect_content_type`].

mod encoder;

use bytes::Bytes;

use crate::error::TransformError;
use crate::resolve::SizeSpec;

pub use encoder::ImageTransformer;

/// Default encoder quality (1-100).
pub const DEFAULT_QUALITY: u8 = 80;

/// Minimum allowed encoder quality.
pub const MIN_QUALITY: u8 = 1;

/// Maximum allowed encoder quality.
pub const MAX_QUALITY: u8 = 100;

/// JPEG start-of-image marker.
const JPEG_SIGNATURE: &[u8] = &[0xFF, 0xD8];

/// PNG file signature.
const PNG_SIGNATURE: &[u8] = &[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];

/// Operator-wide transform settings, applied identically to every request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransformOptions {
    /// Fill the target box and crop the overflow (centre gravity) instead of
    /// fitting inside it
    pub crop: bool,

    /// Lossy encoder quality (1-100)
    pub quality: u8,
}

impl Default for TransformOptions {
    fn default() -> Self {
        Self {
            crop: false,
            quality: DEFAULT_QUALITY,
        }
    }
}

/// Resizes an encoded image to the requested dimensions.
///
/// Implementations are CPU-bound and are called from a blocking thread.
pub trait Transformer: Send + Sync {
    fn transform(
        &self,
        source: &[u8],
        size: SizeSpec,
        options: TransformOptions,
    ) -> Result<Bytes, TransformError>;
}

/// Determine the content type of an encoded image from its leading bytes.
///
/// Only the formats the service emits are recognized; anything else is an
/// error rather than a guessed default.
pub fn detect_content_type(data: &[u8]) -> Result<&'static str, TransformError> {
    if data.starts_with(JPEG_SIGNATURE) {
        Ok("image/jpeg")
    } else if data.starts_with(PNG_SIGNATURE) {
        Ok("image/png")
    } else {
        Err(TransformError::UnknownFormat)
    }
}

/// Validate encoder quality parameter.
///
/// Returns `true` if quality is in the valid range (1-100).
#[inline]
pub fn is_valid_quality(quality: u8) -> bool {
    (MIN_QUALITY..=MAX_QUALITY).contains(&quality)
}
