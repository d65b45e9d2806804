//! Input normalization for the extraction stage.
//!
//! The extraction capability consumes PNG or JPEG images. Uploads declared
//! as other raster types (phone screenshots in WebP, scanner BMP/TIFF) are
//! decoded and re-encoded to PNG here; non-raster containers cannot be
//! normalized and fail the task with an [`ExtractionError`].
//!
//! Page-rendered formats such as PDF are the embedding service's concern: it
//! renders pages to images before submission, so the pipeline only ever sees
//! rasters.

use std::io::Cursor;

use image::ImageFormat;

use super::error::ExtractionError;

/// Media types forwarded to the extractor unchanged.
const PASSTHROUGH: &[&str] = &["image/png", "image/jpeg", "image/jpg"];

/// Bytes and media type actually handed to the extraction capability.
#[derive(Debug, Clone)]
pub struct NormalizedInput {
    pub bytes: Vec<u8>,
    pub media_type: String,
}

/// Normalize an uploaded document into extractor-consumable form.
///
/// PNG/JPEG pass through untouched. Other `image/*` types are transcoded to
/// PNG. Anything else is an unsupported container.
pub fn normalize_for_extraction(
    bytes: Vec<u8>,
    media_type: &str,
) -> Result<NormalizedInput, ExtractionError> {
    let declared = media_type.trim().to_ascii_lowercase();

    if PASSTHROUGH.contains(&declared.as_str()) {
        return Ok(NormalizedInput {
            bytes,
            media_type: declared,
        });
    }

    if declared.starts_with("image/") {
        let decoded = image::load_from_memory(&bytes).map_err(|e| {
            ExtractionError::Normalization(format!("cannot decode {declared}: {e}"))
        })?;
        let mut png = Cursor::new(Vec::new());
        decoded
            .write_to(&mut png, ImageFormat::Png)
            .map_err(|e| ExtractionError::Normalization(format!("PNG re-encode failed: {e}")))?;
        return Ok(NormalizedInput {
            bytes: png.into_inner(),
            media_type: "image/png".to_string(),
        });
    }

    Err(ExtractionError::UnsupportedContainer(declared))
}
