//! Overlay rendering module
//!
//! This module contains:
//! - Payload decoding (base64 image bytes to RGBA)
//! - Glyph rasterization for text overlays (ab_glyph)
//! - Bake matrix construction shared by every overlay kind
//! - The compositor that draws into the raster layer with tiny-skia

pub mod compositor;
pub mod decode;
pub mod matrix;
pub mod text;
