//! Decoding of base64 image payloads into overlay pixels

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use image::RgbaImage;

use crate::error::OverlayError;

/// Decode a base64 compressed-image payload (PNG, JPEG, ...) into RGBA pixels
///
/// Accepts MIME-style line breaks and an optional `data:<mime>;base64,` prefix.
pub fn decode_image_payload(payload: &str) -> Result<RgbaImage, OverlayError> {
    let body = strip_data_url(payload.trim());
    let compact: String = body.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    if compact.is_empty() {
        return Err(OverlayError::InputDecode("empty payload".to_string()));
    }

    let bytes = STANDARD
        .decode(compact.as_bytes())
        .map_err(|e| OverlayError::InputDecode(format!("base64: {e}")))?;
    let decoded = image::load_from_memory(&bytes)
        .map_err(|e| OverlayError::InputDecode(format!("image: {e}")))?;
    let rgba = decoded.to_rgba8();

    if rgba.width() == 0 || rgba.height() == 0 {
        return Err(OverlayError::EmptyContent);
    }
    log::debug!(
        "Decoded overlay image: {}x{} pixels from {} bytes",
        rgba.width(),
        rgba.height(),
        bytes.len()
    );
    Ok(rgba)
}

fn strip_data_url(payload: &str) -> &str {
    if payload.starts_with("data:")
        && let Some((_, body)) = payload.split_once(";base64,")
    {
        return body;
    }
    payload
}

/// Encode RGBA pixels as a base64 PNG payload
pub fn encode_image_payload(image: &RgbaImage) -> Result<String, OverlayError> {
    let mut bytes = Vec::new();
    image
        .write_to(&mut std::io::Cursor::new(&mut bytes), image::ImageFormat::Png)
        .map_err(|e| OverlayError::InputDecode(format!("png: {e}")))?;
    Ok(STANDARD.encode(bytes))
}
