//! Bake a floating overlay into the raster layer
//!
//! The overlay's source pixels (decoded image or rasterized text) are drawn
//! through the bake matrix with tiny-skia. Only the bounding box of the
//! transformed overlay is written back, in a single `write_region` call.

use image::{Rgba, RgbaImage};
use tiny_skia::{ColorU8, FilterQuality, IntSize, Pixmap, PixmapPaint, PremultipliedColorU8};

use super::matrix::BakeGeometry;
use super::text::GlyphRasterizer;
use crate::domain::{OverlayElement, Rect, TransformState};
use crate::error::OverlayError;
use crate::surface::{AbsolutePosition, RasterLayer, SurfaceHandle};

/// What a successful bake did
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BakeReport {
    pub geometry: BakeGeometry,
    /// Layer region rewritten, `None` if the overlay lay entirely off the layer
    pub region: Option<Rect>,
}

pub struct Compositor<'a> {
    pub quality: FilterQuality,
    /// Physical pixels per density-independent unit, for text sizes
    pub device_density: f32,
    pub glyphs: Option<&'a dyn GlyphRasterizer>,
}

impl<'a> Compositor<'a> {
    pub fn new(quality: FilterQuality, device_density: f32) -> Self {
        Self {
            quality,
            device_density,
            glyphs: None,
        }
    }

    pub fn with_glyphs(mut self, glyphs: &'a dyn GlyphRasterizer) -> Self {
        self.glyphs = Some(glyphs);
        self
    }

    /// Bake `element` under `transform` into `layer`
    ///
    /// Positions are queried live; on any error the layer is left untouched.
    pub fn bake(
        &self,
        element: &OverlayElement,
        transform: &TransformState,
        positions: &dyn AbsolutePosition,
        layer: &mut dyn RasterLayer,
    ) -> Result<BakeReport, OverlayError> {
        let overlay_abs = positions
            .absolute_position(SurfaceHandle::Overlay)
            .ok_or_else(|| OverlayError::LayerUnavailable("overlay is not laid out".into()))?;
        let layer_abs = positions
            .absolute_position(SurfaceHandle::Layer)
            .ok_or_else(|| OverlayError::LayerUnavailable("layer position unknown".into()))?;
        let (layer_w, layer_h) = layer.dimensions()?;

        let source = self.source_pixmap(element)?;
        let geometry = BakeGeometry::new(
            overlay_abs,
            layer_abs,
            element.size(),
            transform.scale,
            transform.rotation_degrees,
        );
        log::debug!(
            "Baking {:?}: origin ({:.1}, {:.1}) center ({:.1}, {:.1}) scale {:.2} rot {:.1}",
            element.kind(),
            geometry.origin.x,
            geometry.origin.y,
            geometry.center.x,
            geometry.center.y,
            geometry.scale,
            geometry.rotation_degrees
        );

        if !geometry.is_finite() {
            return Err(OverlayError::LayerUnavailable(format!(
                "overlay geometry is not finite: {geometry:?}"
            )));
        }

        let layer_bounds = Rect::new(0, 0, layer_w as i32, layer_h as i32);
        let Some(region) = Rect::covering(&geometry.corners())
            .map(|r| r.inflate(1))
            .and_then(|r| r.intersect(layer_bounds))
        else {
            log::info!("Overlay lies outside the layer, nothing to bake");
            return Ok(BakeReport {
                geometry,
                region: None,
            });
        };

        let before = layer.read()?;
        let mut canvas = to_pixmap(&before).ok_or_else(|| {
            OverlayError::LayerUnavailable(format!("layer {layer_w}x{layer_h} has no pixels"))
        })?;
        let untouched = canvas.clone();

        canvas.draw_pixmap(
            0,
            0,
            source.as_ref(),
            &PixmapPaint {
                quality: self.quality,
                ..Default::default()
            },
            geometry.matrix(),
            None,
        );

        let patch = extract_region(&before, &untouched, &canvas, region);
        layer.write_region(region.left as u32, region.top as u32, &patch)?;

        Ok(BakeReport {
            geometry,
            region: Some(region),
        })
    }

    /// Unscaled source pixels for an overlay
    pub fn source_pixmap(&self, element: &OverlayElement) -> Result<Pixmap, OverlayError> {
        match element {
            OverlayElement::Image(img) => to_pixmap(&img.pixels).ok_or(OverlayError::EmptyContent),
            OverlayElement::Text(text) => {
                let glyphs = self.glyphs.ok_or(OverlayError::TextUnavailable)?;
                glyphs
                    .rasterize(
                        &text.content,
                        text.font_size * self.device_density,
                        text.color,
                    )
                    .ok_or(OverlayError::EmptyContent)
            }
        }
    }
}

/// Straight-alpha RGBA to a premultiplied pixmap
pub fn to_pixmap(img: &RgbaImage) -> Option<Pixmap> {
    let size = IntSize::from_wh(img.width(), img.height())?;
    let data: Vec<u8> = img
        .pixels()
        .flat_map(|p| {
            let c = ColorU8::from_rgba(p[0], p[1], p[2], p[3]).premultiply();
            [c.red(), c.green(), c.blue(), c.alpha()]
        })
        .collect();
    Pixmap::from_vec(data, size)
}

fn demultiply(c: PremultipliedColorU8) -> Rgba<u8> {
    let c = c.demultiply();
    Rgba([c.red(), c.green(), c.blue(), c.alpha()])
}

/// Cut `region` out of the drawn canvas as straight RGBA
///
/// Pixels the draw did not change keep their original straight values, so
/// the premultiply round trip never alters them.
fn extract_region(
    before: &RgbaImage,
    untouched: &Pixmap,
    drawn: &Pixmap,
    region: Rect,
) -> RgbaImage {
    let width = drawn.width() as usize;
    let old = untouched.pixels();
    let new = drawn.pixels();
    RgbaImage::from_fn(region.width() as u32, region.height() as u32, |x, y| {
        let lx = region.left as u32 + x;
        let ly = region.top as u32 + y;
        let idx = ly as usize * width + lx as usize;
        if new[idx] == old[idx] {
            *before.get_pixel(lx, ly)
        } else {
            demultiply(new[idx])
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::InkColor;
    use crate::domain::{ImageOverlay, Point, Size, TextOverlay};
    use crate::surface::{FixedPositions, MemoryLayer};
    use tiny_skia::Transform;

    /// Draws a solid block the size of `chars * px/2` by `px`
    struct BlockGlyphs;

    impl GlyphRasterizer for BlockGlyphs {
        fn measure(&self, text: &str, px: f32) -> Size {
            Size::new(text.chars().count() as f32 * px * 0.5, px)
        }

        fn rasterize(&self, text: &str, px: f32, color: InkColor) -> Option<Pixmap> {
            let size = self.measure(text, px);
            let mut pixmap = Pixmap::new(size.width as u32, size.height as u32)?;
            let [r, g, b, a] = color.to_rgba_u8();
            pixmap.fill(tiny_skia::Color::from_rgba8(r, g, b, a));
            Some(pixmap)
        }
    }

    fn red_block(w: u32, h: u32) -> OverlayElement {
        OverlayElement::Image(ImageOverlay {
            pixels: RgbaImage::from_pixel(w, h, Rgba([255, 0, 0, 255])),
        })
    }

    fn nearest() -> Compositor<'static> {
        Compositor::new(FilterQuality::Nearest, 1.0)
    }

    #[test]
    fn test_unrotated_bake_lands_at_layer_local_origin() {
        let mut layer = MemoryLayer::blank(100, 100);
        let positions = FixedPositions::new(Point::new(40.0, 60.0), Point::new(10.0, 20.0));
        let report = nearest()
            .bake(&red_block(10, 5), &TransformState::default(), &positions, &mut layer)
            .unwrap();

        assert_eq!(report.geometry.origin, Point::new(30.0, 40.0));
        assert_eq!(layer.version(), 1);
        let img = layer.image();
        assert_eq!(*img.get_pixel(30, 40), Rgba([255, 0, 0, 255]));
        assert_eq!(*img.get_pixel(39, 44), Rgba([255, 0, 0, 255]));
        assert_eq!(*img.get_pixel(40, 44), Rgba([0, 0, 0, 0]));
        assert_eq!(*img.get_pixel(29, 40), Rgba([0, 0, 0, 0]));
        assert_eq!(*img.get_pixel(30, 45), Rgba([0, 0, 0, 0]));
    }

    #[test]
    fn test_rotated_scaled_bake_matches_independent_composition() {
        let source = {
            let mut img = RgbaImage::from_pixel(40, 20, Rgba([0, 0, 255, 255]));
            for x in 0..40 {
                img.put_pixel(x, 0, Rgba([0, 200, 0, 255]));
            }
            img
        };
        let element = OverlayElement::Image(ImageOverlay {
            pixels: source.clone(),
        });
        let transform = TransformState {
            translation: Point::ZERO,
            scale: 2.0,
            rotation_degrees: 15.0,
        };
        let mut layer = MemoryLayer::blank(300, 300);
        let positions = FixedPositions::new(Point::new(130.0, 175.0), Point::new(100.0, 100.0));
        let report = nearest()
            .bake(&element, &transform, &positions, &mut layer)
            .unwrap();

        // origin (30, 75), center = origin + (20, 10) * 2
        let (cx, cy) = (70.0, 95.0);
        assert_eq!(report.geometry.center, Point::new(cx, cy));
        let reference = Transform::from_translate(30.0, 75.0)
            .post_concat(Transform::from_rotate_at(15.0, cx, cy))
            .post_concat(
                Transform::from_translate(cx, cy)
                    .pre_scale(2.0, 2.0)
                    .pre_translate(-cx, -cy),
            );
        let mut expected = Pixmap::new(300, 300).unwrap();
        expected.draw_pixmap(
            0,
            0,
            to_pixmap(&source).unwrap().as_ref(),
            &PixmapPaint {
                quality: FilterQuality::Nearest,
                ..Default::default()
            },
            reference,
            None,
        );

        let mut drawn = 0;
        for (x, y, pixel) in layer.image().enumerate_pixels() {
            let want = demultiply(expected.pixel(x, y).unwrap());
            assert_eq!(*pixel, want, "pixel ({x}, {y})");
            if pixel[3] > 0 {
                drawn += 1;
            }
        }
        assert!(drawn > 1000);
    }

    #[test]
    fn test_pixels_outside_region_untouched() {
        let background = RgbaImage::from_fn(50, 50, |x, y| Rgba([x as u8, y as u8, 7, 90]));
        let mut layer = MemoryLayer::from_image(background.clone());
        let positions = FixedPositions::new(Point::new(10.0, 10.0), Point::ZERO);
        let report = nearest()
            .bake(&red_block(4, 4), &TransformState::default(), &positions, &mut layer)
            .unwrap();
        let region = report.region.unwrap();
        for (x, y, pixel) in layer.image().enumerate_pixels() {
            let inside_overlay = (10..14).contains(&x) && (10..14).contains(&y);
            if !inside_overlay {
                assert_eq!(*pixel, *background.get_pixel(x, y), "pixel ({x}, {y})");
            }
            let (x_i, y_i) = (x as i32, y as i32);
            let in_region = (region.left..region.right).contains(&x_i)
                && (region.top..region.bottom).contains(&y_i);
            if !in_region {
                assert_eq!(*pixel, *background.get_pixel(x, y));
            }
        }
    }

    #[test]
    fn test_missing_layer_position_aborts_without_writing() {
        let mut layer = MemoryLayer::blank(20, 20);
        let positions = FixedPositions {
            overlay: Some(Point::ZERO),
            layer: None,
        };
        let err = nearest()
            .bake(&red_block(4, 4), &TransformState::default(), &positions, &mut layer)
            .unwrap_err();
        assert!(err.is_retryable());
        assert_eq!(layer.version(), 0);
    }

    #[test]
    fn test_unavailable_layer_aborts() {
        let mut layer = MemoryLayer::blank(20, 20);
        layer.set_available(false);
        let positions = FixedPositions::new(Point::ZERO, Point::ZERO);
        let err = nearest()
            .bake(&red_block(4, 4), &TransformState::default(), &positions, &mut layer)
            .unwrap_err();
        assert!(matches!(err, OverlayError::LayerUnavailable(_)));
    }

    #[test]
    fn test_overlay_off_layer_writes_nothing() {
        let mut layer = MemoryLayer::blank(20, 20);
        let positions = FixedPositions::new(Point::new(500.0, 500.0), Point::ZERO);
        let report = nearest()
            .bake(&red_block(4, 4), &TransformState::default(), &positions, &mut layer)
            .unwrap();
        assert_eq!(report.region, None);
        assert_eq!(layer.version(), 0);
    }

    #[test]
    fn test_non_finite_geometry_is_rejected() {
        let mut layer = MemoryLayer::blank(20, 20);
        let positions = FixedPositions::new(Point::new(f32::NAN, 2.0), Point::ZERO);
        let err = nearest()
            .bake(&red_block(4, 4), &TransformState::default(), &positions, &mut layer)
            .unwrap_err();
        assert!(err.is_retryable());
        assert_eq!(layer.version(), 0);

        let positions = FixedPositions::new(Point::new(2.0, 2.0), Point::ZERO);
        let transform = TransformState {
            scale: f32::INFINITY,
            ..TransformState::default()
        };
        let err = nearest()
            .bake(&red_block(4, 4), &transform, &positions, &mut layer)
            .unwrap_err();
        assert!(matches!(err, OverlayError::LayerUnavailable(_)));
        assert_eq!(layer.version(), 0);
    }

    #[test]
    fn test_text_bake_uses_density_scaled_font() {
        let glyphs = BlockGlyphs;
        let compositor = Compositor::new(FilterQuality::Nearest, 2.0).with_glyphs(&glyphs);
        let element = OverlayElement::Text(TextOverlay {
            content: "ab".to_string(),
            font_size: 5.0,
            color: InkColor::BLACK,
            measured: glyphs.measure("ab", 10.0),
        });
        let mut layer = MemoryLayer::blank(40, 40);
        let positions = FixedPositions::new(Point::new(3.0, 4.0), Point::ZERO);
        compositor
            .bake(&element, &TransformState::default(), &positions, &mut layer)
            .unwrap();
        let img = layer.image();
        assert_eq!(*img.get_pixel(3, 4), Rgba([0, 0, 0, 255]));
        assert_eq!(*img.get_pixel(12, 13), Rgba([0, 0, 0, 255]));
        assert_eq!(*img.get_pixel(13, 13), Rgba([0, 0, 0, 0]));
    }

    #[test]
    fn test_text_without_glyphs_is_unavailable() {
        let element = OverlayElement::Text(TextOverlay {
            content: "x".to_string(),
            font_size: 20.0,
            color: InkColor::BLACK,
            measured: Size::new(10.0, 20.0),
        });
        assert_eq!(
            nearest().source_pixmap(&element).unwrap_err(),
            OverlayError::TextUnavailable
        );
    }

    #[test]
    fn test_to_pixmap_premultiplies() {
        let img = RgbaImage::from_pixel(1, 1, Rgba([255, 255, 255, 128]));
        let pixmap = to_pixmap(&img).unwrap();
        let p = pixmap.pixel(0, 0).unwrap();
        assert_eq!(p.alpha(), 128);
        assert_eq!(p.red(), 128);
    }
}
