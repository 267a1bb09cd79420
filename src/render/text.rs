//! Glyph rasterization for text overlays
//!
//! Text is turned into a transparent pixmap of its measured box, so the
//! compositor can push it through the same matrix as an image.

use std::path::Path;

use ab_glyph::{Font, FontArc, GlyphId, PxScale, ScaleFont, point};
use anyhow::Context;
use tiny_skia::{Pixmap, PremultipliedColorU8};

use crate::config::InkColor;
use crate::domain::Size;

/// Source of measured and rasterized text
pub trait GlyphRasterizer {
    /// Box occupied by `text` at a font size of `px` physical pixels
    fn measure(&self, text: &str, px: f32) -> Size;

    /// Draw `text` into a transparent pixmap of the measured size
    fn rasterize(&self, text: &str, px: f32, color: InkColor) -> Option<Pixmap>;
}

/// [`GlyphRasterizer`] backed by an outline font
#[derive(Clone)]
pub struct AbGlyphRasterizer {
    font: FontArc,
}

impl std::fmt::Debug for AbGlyphRasterizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AbGlyphRasterizer").finish_non_exhaustive()
    }
}

struct PlacedGlyph {
    id: GlyphId,
    x: f32,
    baseline: f32,
}

struct TextLayout {
    glyphs: Vec<PlacedGlyph>,
    size: Size,
}

impl AbGlyphRasterizer {
    pub fn from_bytes(bytes: Vec<u8>) -> Option<Self> {
        FontArc::try_from_vec(bytes).ok().map(|font| Self { font })
    }

    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let bytes = std::fs::read(path)
            .with_context(|| format!("Failed to read font file: {}", path.display()))?;
        Self::from_bytes(bytes)
            .with_context(|| format!("Not a usable font file: {}", path.display()))
    }

    /// Lay out each '\n'-separated line left-aligned, one line height apart
    fn layout(&self, text: &str, px: f32) -> TextLayout {
        let scale = PxScale::from(px);
        let scaled = self.font.as_scaled(scale);
        let ascent = scaled.ascent();
        let line_height = scaled.height() + scaled.line_gap();

        let mut glyphs = Vec::new();
        let mut width = 0.0f32;
        let mut lines = 0usize;

        for (line_idx, line) in text.split('\n').enumerate() {
            let baseline = ascent + line_idx as f32 * line_height;
            let mut cursor_x = 0.0f32;
            let mut last: Option<GlyphId> = None;
            for ch in line.chars() {
                let id = self.font.glyph_id(ch);
                if let Some(prev) = last {
                    cursor_x += scaled.kern(prev, id);
                }
                glyphs.push(PlacedGlyph {
                    id,
                    x: cursor_x,
                    baseline,
                });
                cursor_x += scaled.h_advance(id);
                last = Some(id);
            }
            width = width.max(cursor_x);
            lines += 1;
        }

        let height = scaled.height() + (lines.saturating_sub(1)) as f32 * line_height;
        TextLayout {
            glyphs,
            size: Size::new(width.ceil(), height.ceil()),
        }
    }
}

impl GlyphRasterizer for AbGlyphRasterizer {
    fn measure(&self, text: &str, px: f32) -> Size {
        self.layout(text, px).size
    }

    fn rasterize(&self, text: &str, px: f32, color: InkColor) -> Option<Pixmap> {
        let layout = self.layout(text, px);
        let mut pixmap = Pixmap::new(layout.size.width as u32, layout.size.height as u32)?;
        let (w, h) = (pixmap.width() as i32, pixmap.height() as i32);
        let [r, g, b, _] = color.to_rgba_u8();
        let pixels = pixmap.pixels_mut();

        for placed in &layout.glyphs {
            let glyph = placed
                .id
                .with_scale_and_position(px, point(placed.x, placed.baseline));
            let Some(outlined) = self.font.outline_glyph(glyph) else {
                continue;
            };
            let bounds = outlined.px_bounds();
            outlined.draw(|gx, gy, coverage| {
                let x = bounds.min.x as i32 + gx as i32;
                let y = bounds.min.y as i32 + gy as i32;
                if x < 0 || y < 0 || x >= w || y >= h {
                    return;
                }
                let idx = (y * w + x) as usize;
                let alpha = (coverage.clamp(0.0, 1.0) * 255.0).round() as u8;
                if alpha <= pixels[idx].alpha() {
                    return;
                }
                if let Some(c) = premultiply(r, g, b, alpha) {
                    pixels[idx] = c;
                }
            });
        }

        Some(pixmap)
    }
}

fn premultiply(r: u8, g: u8, b: u8, a: u8) -> Option<PremultipliedColorU8> {
    let mul = |c: u8| ((c as u16 * a as u16 + 127) / 255) as u8;
    PremultipliedColorU8::from_rgba(mul(r), mul(g), mul(b), a)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Common system font locations; tests that need a real font skip without one
    const FONT_CANDIDATES: &[&str] = &[
        "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
        "/usr/share/fonts/dejavu/DejaVuSans.ttf",
        "/usr/share/fonts/TTF/DejaVuSans.ttf",
        "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
        "/System/Library/Fonts/Supplemental/Arial.ttf",
        "C:\\Windows\\Fonts\\arial.ttf",
    ];

    fn system_font() -> Option<AbGlyphRasterizer> {
        FONT_CANDIDATES
            .iter()
            .map(Path::new)
            .find(|p| p.exists())
            .and_then(|p| AbGlyphRasterizer::from_file(p).ok())
    }

    #[test]
    fn test_garbage_bytes_are_not_a_font() {
        assert!(AbGlyphRasterizer::from_bytes(vec![0, 1, 2, 3]).is_none());
    }

    #[test]
    fn test_missing_font_file_errors() {
        assert!(AbGlyphRasterizer::from_file(Path::new("/nonexistent/font.ttf")).is_err());
    }

    #[test]
    fn test_premultiply() {
        let c = premultiply(255, 0, 128, 128).unwrap();
        assert_eq!((c.red(), c.green(), c.blue(), c.alpha()), (128, 0, 64, 128));
    }

    #[test]
    fn test_measure_grows_with_font_size() {
        // This test is skipped on systems without any of the candidate fonts
        let Some(font) = system_font() else {
            return;
        };
        let small = font.measure("Hello", 20.0);
        let large = font.measure("Hello", 40.0);
        assert!(small.width > 0.0 && small.height > 0.0);
        assert!(large.width > small.width);
        assert!(large.height > small.height);

        let two_lines = font.measure("Hello\nHello", 20.0);
        assert!(two_lines.height > small.height);
    }

    #[test]
    fn test_rasterize_inks_some_pixels() {
        let Some(font) = system_font() else {
            return;
        };
        let pixmap = font.rasterize("Ag", 32.0, InkColor::BLACK).unwrap();
        let size = font.measure("Ag", 32.0);
        assert_eq!(pixmap.width(), size.width as u32);
        assert!(pixmap.pixels().iter().any(|p| p.alpha() > 200));
    }
}
