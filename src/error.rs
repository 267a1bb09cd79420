//! Error taxonomy for overlay operations
//!
//! None of these abort the host. The command handler absorbs them and
//! reduces them to no-ops or to an uncommitted overlay.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum OverlayError {
    /// Image payload could not be base64-decoded or image-decoded
    #[error("could not decode overlay payload: {0}")]
    InputDecode(String),
    /// Manipulation, commit or cancel issued with nothing floating
    #[error("no active overlay")]
    NoActiveOverlay,
    /// Raster layer (or the overlay's on-screen geometry) could not be queried or written
    #[error("raster layer unavailable: {0}")]
    LayerUnavailable(String),
    /// Text overlay requested but no glyph rasterizer is configured
    #[error("no font available for text overlays")]
    TextUnavailable,
    /// Overlay would have zero width or height
    #[error("overlay content is empty")]
    EmptyContent,
}

impl OverlayError {
    /// Errors that leave an overlay in place for the caller to retry or cancel
    pub fn is_retryable(&self) -> bool {
        matches!(self, OverlayError::LayerUnavailable(_))
    }
}
