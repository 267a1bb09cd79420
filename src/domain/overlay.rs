//! The floating overlay element and its initial placement

use image::RgbaImage;

use super::geometry::{Point, Size};
use crate::config::InkColor;

/// Explicit placement in caller density units
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Anchor {
    pub top: f32,
    pub left: f32,
}

impl Anchor {
    pub fn new(top: f32, left: f32) -> Self {
        Self { top, left }
    }
}

/// Where a new overlay appears, fixed for its lifetime
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub enum Placement {
    #[default]
    Centered,
    Anchored { anchor: Anchor, caller_density: f32 },
}

impl Placement {
    /// Anchored only when both an anchor and a usable caller density are supplied
    pub fn from_request(anchor: Option<Anchor>, caller_density: Option<f32>) -> Self {
        match (anchor, caller_density) {
            (Some(anchor), Some(caller_density)) if caller_density > 0.0 => Placement::Anchored {
                anchor,
                caller_density,
            },
            _ => Placement::Centered,
        }
    }

    /// Resolve to the overlay's top-left in container coordinates
    pub fn resolve(&self, container: Size, overlay: Size, device_density: f32) -> Point {
        match *self {
            Placement::Centered => Point::new(
                (container.width - overlay.width) * 0.5,
                (container.height - overlay.height) * 0.5,
            ),
            Placement::Anchored {
                anchor,
                caller_density,
            } => {
                let ratio = device_density / caller_density;
                Point::new(anchor.left * ratio, anchor.top * ratio)
            }
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OverlayKind {
    Image,
    Text,
}

/// Decoded image shown at its natural pixel size
#[derive(Clone, Debug, PartialEq)]
pub struct ImageOverlay {
    pub pixels: RgbaImage,
}

/// Text string rendered from a mutable font size
#[derive(Clone, Debug, PartialEq)]
pub struct TextOverlay {
    pub content: String,
    /// Font size in density-independent units
    pub font_size: f32,
    pub color: InkColor,
    /// Box measured at the current font size, in physical pixels
    pub measured: Size,
}

#[derive(Clone, Debug, PartialEq)]
pub enum OverlayElement {
    Image(ImageOverlay),
    Text(TextOverlay),
}

impl OverlayElement {
    pub fn kind(&self) -> OverlayKind {
        match self {
            OverlayElement::Image(_) => OverlayKind::Image,
            OverlayElement::Text(_) => OverlayKind::Text,
        }
    }

    /// Unscaled on-screen size in physical pixels
    pub fn size(&self) -> Size {
        match self {
            OverlayElement::Image(img) => {
                Size::new(img.pixels.width() as f32, img.pixels.height() as f32)
            }
            OverlayElement::Text(text) => text.measured,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_anchor_is_density_normalized() {
        let placement = Placement::from_request(Some(Anchor::new(50.0, 20.0)), Some(2.0));
        let origin = placement.resolve(Size::new(1200.0, 1600.0), Size::new(10.0, 10.0), 3.0);
        assert_eq!(origin, Point::new(30.0, 75.0));
    }

    #[test]
    fn test_missing_density_falls_back_to_center() {
        assert_eq!(
            Placement::from_request(Some(Anchor::new(1.0, 1.0)), None),
            Placement::Centered
        );
        assert_eq!(
            Placement::from_request(Some(Anchor::new(1.0, 1.0)), Some(0.0)),
            Placement::Centered
        );
    }

    #[test]
    fn test_centered_placement() {
        let origin =
            Placement::Centered.resolve(Size::new(100.0, 200.0), Size::new(20.0, 40.0), 2.0);
        assert_eq!(origin, Point::new(40.0, 80.0));
    }

    #[test]
    fn test_element_size_and_kind() {
        let image = OverlayElement::Image(ImageOverlay {
            pixels: RgbaImage::new(7, 3),
        });
        assert_eq!(image.kind(), OverlayKind::Image);
        assert_eq!(image.size(), Size::new(7.0, 3.0));

        let text = OverlayElement::Text(TextOverlay {
            content: "hi".to_string(),
            font_size: 20.0,
            color: InkColor::BLACK,
            measured: Size::new(24.0, 12.0),
        });
        assert_eq!(text.kind(), OverlayKind::Text);
        assert_eq!(text.size(), Size::new(24.0, 12.0));
    }
}
