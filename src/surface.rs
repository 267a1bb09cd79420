//! Capabilities the overlay core needs from its host
//!
//! The raster layer and the on-screen geometry are owned elsewhere (the
//! handwriting surface and the view tree). The core only queries positions
//! and writes pixels through these traits.

use std::io;

use image::RgbaImage;

use crate::domain::{Point, Rect};
use crate::error::OverlayError;

/// Things whose absolute screen position the compositor asks for
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SurfaceHandle {
    Overlay,
    Layer,
}

/// Live on-screen geometry, queried at commit time
pub trait AbsolutePosition {
    /// Top-left of `handle` in absolute screen coordinates, if it is laid out
    fn absolute_position(&self, handle: SurfaceHandle) -> Option<Point>;
}

/// Persistent pixel surface that receives baked overlays
///
/// Each successful bake performs exactly one `write_region` call, so a host
/// that snapshots the layer for undo sees a single mutation.
pub trait RasterLayer {
    fn dimensions(&self) -> Result<(u32, u32), OverlayError>;

    fn read(&self) -> Result<RgbaImage, OverlayError>;

    /// Overwrite the pixels at (`left`, `top`) with `region`
    fn write_region(&mut self, left: u32, top: u32, region: &RgbaImage)
    -> Result<(), OverlayError>;
}

/// Fixed positions, for hosts that already know their geometry and for tests
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FixedPositions {
    pub overlay: Option<Point>,
    pub layer: Option<Point>,
}

impl FixedPositions {
    pub fn new(overlay: Point, layer: Point) -> Self {
        Self {
            overlay: Some(overlay),
            layer: Some(layer),
        }
    }
}

impl AbsolutePosition for FixedPositions {
    fn absolute_position(&self, handle: SurfaceHandle) -> Option<Point> {
        match handle {
            SurfaceHandle::Overlay => self.overlay,
            SurfaceHandle::Layer => self.layer,
        }
    }
}

/// Screen placement of the overlay container and the raster layer
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ContainerGeometry {
    pub container_origin: Point,
    pub layer_origin: Point,
}

impl ContainerGeometry {
    /// Positions for an overlay whose top-left sits at `translation` inside the container
    pub fn positions(&self, translation: Point) -> FixedPositions {
        FixedPositions::new(self.container_origin + translation, self.layer_origin)
    }
}

/// In-memory raster layer with a write counter
#[derive(Clone, Debug)]
pub struct MemoryLayer {
    image: RgbaImage,
    version: u64,
    available: bool,
}

impl MemoryLayer {
    /// Fully transparent layer
    pub fn blank(width: u32, height: u32) -> Self {
        Self::from_image(RgbaImage::new(width, height))
    }

    pub fn from_image(image: RgbaImage) -> Self {
        Self {
            image,
            version: 0,
            available: true,
        }
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    /// Number of writes applied so far
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Simulate the host tearing the layer down or not having created it yet
    pub fn set_available(&mut self, available: bool) {
        self.available = available;
    }

    pub fn encode_png(&self) -> anyhow::Result<Vec<u8>> {
        let mut buffer = Vec::new();
        write_png(&mut buffer, &self.image)?;
        Ok(buffer)
    }

    fn ensure_available(&self) -> Result<(), OverlayError> {
        if self.available {
            Ok(())
        } else {
            Err(OverlayError::LayerUnavailable(
                "layer is not attached".to_string(),
            ))
        }
    }
}

impl RasterLayer for MemoryLayer {
    fn dimensions(&self) -> Result<(u32, u32), OverlayError> {
        self.ensure_available()?;
        Ok(self.image.dimensions())
    }

    fn read(&self) -> Result<RgbaImage, OverlayError> {
        self.ensure_available()?;
        Ok(self.image.clone())
    }

    fn write_region(
        &mut self,
        left: u32,
        top: u32,
        region: &RgbaImage,
    ) -> Result<(), OverlayError> {
        self.ensure_available()?;
        let bounds = Rect::new(0, 0, self.image.width() as i32, self.image.height() as i32);
        let target = Rect::new(
            left as i32,
            top as i32,
            (left + region.width()) as i32,
            (top + region.height()) as i32,
        );
        if bounds.intersect(target) != Some(target) {
            return Err(OverlayError::LayerUnavailable(format!(
                "region {:?} outside layer {}x{}",
                target,
                self.image.width(),
                self.image.height()
            )));
        }
        image::imageops::replace(&mut self.image, region, left as i64, top as i64);
        self.version += 1;
        Ok(())
    }
}

fn write_png<W: io::Write>(w: W, image: &RgbaImage) -> Result<(), png::EncodingError> {
    let mut encoder = png::Encoder::new(w, image.width(), image.height());
    encoder.set_color(png::ColorType::Rgba);
    encoder.set_depth(png::BitDepth::Eight);
    let mut writer = encoder.write_header()?;
    writer.write_image_data(image.as_raw())
}
