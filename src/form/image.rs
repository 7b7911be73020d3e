use anyhow::{Context, Result};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use image::imageops::FilterType;
use tracing::debug;

/// Longest edge a submitted image may keep.
const MAX_EDGE: u32 = 2048;
/// JPEG quality used for the re-encode.
const JPEG_QUALITY: u8 = 80;

/// Re-encode a user-selected image for submission: downscale so the
/// longer side is at most 2048 px, compress as JPEG, and embed as a
/// base64 data URI.
pub fn encode_image_data_uri(bytes: &[u8]) -> Result<String> {
    let img = image::load_from_memory(bytes).context("unreadable image data")?;
    let (w, h) = (img.width(), img.height());
    let img = if w.max(h) > MAX_EDGE {
        debug!(width = w, height = h, "downscaling submission image");
        img.resize(MAX_EDGE, MAX_EDGE, FilterType::Triangle)
    } else {
        img
    };

    let rgb = img.to_rgb8();
    let mut jpeg = Vec::new();
    let encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut jpeg, JPEG_QUALITY);
    rgb.write_with_encoder(encoder)
        .context("jpeg encoding failed")?;

    Ok(format!("data:image/jpeg;base64,{}", STANDARD.encode(&jpeg)))
}
