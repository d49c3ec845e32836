//! `image`-crate resizer.
//!
//! # Behaviour
//!
//! - **Crop off**: the image is scaled to fit inside the target box, keeping
//!   its aspect ratio. One side may come out shorter than requested.
//! - **Crop on**: the image is scaled to cover the box and the overflow is
//!   cropped around the centre, so the output is exactly the requested size.
//! - **Output format**: PNG input stays PNG (lossless, keeps alpha). Every
//!   other decodable input (JPEG, GIF, WebP) is re-encoded as JPEG at the
//!   configured quality. Only the first frame of an animation is kept.

use std::io::Cursor;

use bytes::Bytes;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat, ImageReader};

use super::{TransformOptions, Transformer, MAX_QUALITY, MIN_QUALITY};
use crate::error::TransformError;
use crate::resolve::SizeSpec;

/// Bicubic resampling, matching what most thumbnailers default to.
const FILTER: FilterType = FilterType::CatmullRom;

/// In-process [`Transformer`] using the `image` crate.
#[derive(Debug, Clone, Default)]
pub struct ImageTransformer {}

impl ImageTransformer {
    pub fn new() -> Self {
        Self {}
    }

    fn decode(&self, source: &[u8]) -> Result<(DynamicImage, ImageFormat), TransformError> {
        let reader = ImageReader::new(Cursor::new(source))
            .with_guessed_format()
            .map_err(|e| TransformError::Decode {
                message: e.to_string(),
            })?;

        let format = reader.format().ok_or_else(|| TransformError::Decode {
            message: "unrecognized image format".to_string(),
        })?;

        let img = reader.decode().map_err(|e| TransformError::Decode {
            message: e.to_string(),
        })?;

        Ok((img, format))
    }
}

impl Transformer for ImageTransformer {
    fn transform(
        &self,
        source: &[u8],
        size: SizeSpec,
        options: TransformOptions,
    ) -> Result<Bytes, TransformError> {
        let (img, format) = self.decode(source)?;

        let resized = if options.crop {
            img.resize_to_fill(size.width, size.height, FILTER)
        } else {
            img.resize(size.width, size.height, FILTER)
        };

        let mut output = Vec::new();
        let encoded = match format {
            ImageFormat::Png => resized.write_with_encoder(PngEncoder::new(&mut output)),
            _ => {
                let quality = options.quality.clamp(MIN_QUALITY, MAX_QUALITY);
                // JPEG has no alpha channel
                let rgb = resized.to_rgb8();
                JpegEncoder::new_with_quality(&mut output, quality).encode_image(&rgb)
            }
        };

        encoded.map_err(|e| TransformError::Encode {
            message: e.to_string(),
        })?;

        Ok(Bytes::from(output))
    }
}
