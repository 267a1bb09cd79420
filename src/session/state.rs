//! Overlay session state
//!
//! Holds at most one floating overlay from creation until it is committed
//! into the raster layer or cancelled, together with the gesture tracker
//! driving it.

use crate::config::{InkColor, OverlayConfig};
use crate::domain::{
    Anchor, ImageOverlay, OverlayElement, OverlayKind, Placement, Point, Size, TextOverlay,
    TransformLimits, TransformState,
};
use crate::error::OverlayError;
use crate::gesture::{GestureTracker, GestureUpdate, PointerEvent};
use crate::render::compositor::{BakeReport, Compositor};
use crate::render::decode::decode_image_payload;
use crate::render::text::GlyphRasterizer;
use crate::surface::{AbsolutePosition, RasterLayer};

/// Smallest font size a text overlay can shrink to, in density-independent units
pub const MIN_FONT_SIZE: f32 = 1.0;

/// Font size change per size command on a text overlay
pub const FONT_SIZE_STEP: f32 = 1.0;

/// The single floating overlay and its transform
#[derive(Clone, Debug, PartialEq)]
pub struct ActiveOverlay {
    pub element: OverlayElement,
    pub placement: Placement,
    pub transform: TransformState,
}

/// Owns at most one overlay from `add` until `commit` or `cancel`
pub struct OverlaySession {
    config: OverlayConfig,
    limits: TransformLimits,
    container: Size,
    active: Option<ActiveOverlay>,
    gestures: GestureTracker,
    glyphs: Option<Box<dyn GlyphRasterizer>>,
}

impl std::fmt::Debug for OverlaySession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OverlaySession")
            .field("container", &self.container)
            .field("active", &self.active)
            .field("gestures", &self.gestures)
            .field("has_glyphs", &self.glyphs.is_some())
            .finish()
    }
}

impl OverlaySession {
    /// `container` is the size of the overlay's parent, used for centering
    pub fn new(config: OverlayConfig, container: Size) -> Self {
        Self {
            limits: TransformLimits::from(&config),
            gestures: GestureTracker::new(config.pinch_rotation),
            config,
            container,
            active: None,
            glyphs: None,
        }
    }

    pub fn with_glyphs(mut self, glyphs: Box<dyn GlyphRasterizer>) -> Self {
        self.glyphs = Some(glyphs);
        self
    }

    pub fn config(&self) -> &OverlayConfig {
        &self.config
    }

    pub fn set_container_size(&mut self, container: Size) {
        self.container = container;
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    pub fn active(&self) -> Option<&ActiveOverlay> {
        self.active.as_ref()
    }

    pub fn active_kind(&self) -> Option<OverlayKind> {
        self.active.as_ref().map(|a| a.element.kind())
    }

    pub fn transform(&self) -> Option<&TransformState> {
        self.active.as_ref().map(|a| &a.transform)
    }

    /// Overlay top-left in container coordinates
    pub fn position(&self) -> Option<Point> {
        self.transform().map(|t| t.translation)
    }

    pub fn overlay_size(&self) -> Option<Size> {
        self.active.as_ref().map(|a| a.element.size())
    }

    pub fn gestures(&self) -> &GestureTracker {
        &self.gestures
    }

    // ========================================================================
    // Creation
    // ========================================================================

    /// Decode and float an image; on failure any current overlay is kept
    pub fn add_image(
        &mut self,
        payload: &str,
        anchor: Option<Anchor>,
        density: Option<f32>,
    ) -> Result<(), OverlayError> {
        let pixels = decode_image_payload(payload)?;
        self.install(
            OverlayElement::Image(ImageOverlay { pixels }),
            Placement::from_request(anchor, density),
        );
        Ok(())
    }

    pub fn add_text(
        &mut self,
        content: &str,
        color: Option<InkColor>,
        anchor: Option<Anchor>,
        density: Option<f32>,
    ) -> Result<(), OverlayError> {
        let font_size = self.config.text_font_size.max(MIN_FONT_SIZE);
        let measured = self.measure_text(content, font_size)?;
        self.install(
            OverlayElement::Text(TextOverlay {
                content: content.to_string(),
                font_size,
                color: color.unwrap_or(self.config.text_color),
                measured,
            }),
            Placement::from_request(anchor, density),
        );
        Ok(())
    }

    fn measure_text(&self, content: &str, font_size: f32) -> Result<Size, OverlayError> {
        let glyphs = self.glyphs.as_deref().ok_or(OverlayError::TextUnavailable)?;
        let measured = glyphs.measure(content, font_size * self.config.effective_density());
        if measured.is_empty() {
            return Err(OverlayError::EmptyContent);
        }
        Ok(measured)
    }

    fn install(&mut self, element: OverlayElement, placement: Placement) {
        if let Some(previous) = self.active.take() {
            log::info!(
                "Replacing active {:?} overlay with a new one, previous overlay discarded",
                previous.element.kind()
            );
        }
        let origin = placement.resolve(
            self.container,
            element.size(),
            self.config.effective_density(),
        );
        log::debug!(
            "Overlay {:?} {}x{} placed at ({:.1}, {:.1})",
            element.kind(),
            element.size().width,
            element.size().height,
            origin.x,
            origin.y
        );
        self.gestures.reset();
        self.active = Some(ActiveOverlay {
            element,
            placement,
            transform: TransformState::at(origin),
        });
    }

    // ========================================================================
    // Manipulation
    // ========================================================================

    fn active_mut(&mut self) -> Result<&mut ActiveOverlay, OverlayError> {
        self.active.as_mut().ok_or(OverlayError::NoActiveOverlay)
    }

    pub fn move_by(&mut self, dx: f32, dy: f32) -> Result<(), OverlayError> {
        self.active_mut()?.transform.move_by(dx, dy);
        Ok(())
    }

    /// Images grow by one scale step; text grows by one font unit and is re-measured
    pub fn increase_size(&mut self) -> Result<(), OverlayError> {
        if let Some(font_size) = self.text_font_size()? {
            self.set_font_size(font_size + FONT_SIZE_STEP)?;
            return Ok(());
        }
        let limits = self.limits;
        self.active_mut()?.transform.increase_size(&limits);
        Ok(())
    }

    pub fn decrease_size(&mut self) -> Result<(), OverlayError> {
        if let Some(font_size) = self.text_font_size()? {
            self.set_font_size(font_size - FONT_SIZE_STEP)?;
            return Ok(());
        }
        let limits = self.limits;
        self.active_mut()?.transform.decrease_size(&limits);
        Ok(())
    }

    /// Font size of the active overlay, `None` for images
    fn text_font_size(&self) -> Result<Option<f32>, OverlayError> {
        match &self.active {
            None => Err(OverlayError::NoActiveOverlay),
            Some(ActiveOverlay {
                element: OverlayElement::Text(text),
                ..
            }) => Ok(Some(text.font_size)),
            Some(_) => Ok(None),
        }
    }

    pub fn rotate_right(&mut self) -> Result<(), OverlayError> {
        let limits = self.limits;
        self.active_mut()?.transform.rotate_right(&limits);
        Ok(())
    }

    pub fn rotate_left(&mut self) -> Result<(), OverlayError> {
        let limits = self.limits;
        self.active_mut()?.transform.rotate_left(&limits);
        Ok(())
    }

    /// Change a text overlay's font size and re-measure it
    ///
    /// Returns `Ok(false)` when the active overlay is not text.
    pub fn set_font_size(&mut self, units: f32) -> Result<bool, OverlayError> {
        let font_size = units.max(MIN_FONT_SIZE);
        let content = match &self.active {
            None => return Err(OverlayError::NoActiveOverlay),
            Some(ActiveOverlay {
                element: OverlayElement::Text(text),
                ..
            }) => text.content.clone(),
            Some(_) => return Ok(false),
        };
        let measured = self.measure_text(&content, font_size)?;
        if let Some(ActiveOverlay {
            element: OverlayElement::Text(text),
            ..
        }) = &mut self.active
        {
            text.font_size = font_size;
            text.measured = measured;
        }
        Ok(true)
    }

    /// Returns `Ok(false)` when the active overlay is not text
    pub fn set_text_color(&mut self, color: InkColor) -> Result<bool, OverlayError> {
        match &mut self.active_mut()?.element {
            OverlayElement::Text(text) => {
                text.color = color;
                Ok(true)
            }
            OverlayElement::Image(_) => Ok(false),
        }
    }

    /// Feed raw pointer input to the gesture tracker
    pub fn pointer(&mut self, event: PointerEvent) -> Result<GestureUpdate, OverlayError> {
        let limits = self.limits;
        let active = self.active.as_mut().ok_or(OverlayError::NoActiveOverlay)?;
        Ok(self.gestures.handle(event, &mut active.transform, &limits))
    }

    // ========================================================================
    // Commit / cancel
    // ========================================================================

    /// Bake the overlay into `layer` and destroy it
    ///
    /// On failure the overlay stays active and uncommitted so the caller can
    /// retry or cancel.
    pub fn commit(
        &mut self,
        positions: &dyn AbsolutePosition,
        layer: &mut dyn RasterLayer,
    ) -> Result<BakeReport, OverlayError> {
        let active = self.active.as_ref().ok_or(OverlayError::NoActiveOverlay)?;
        let mut compositor = Compositor::new(
            self.config.sample_quality.into(),
            self.config.effective_density(),
        );
        if let Some(glyphs) = self.glyphs.as_deref() {
            compositor = compositor.with_glyphs(glyphs);
        }
        let report = compositor.bake(&active.element, &active.transform, positions, layer)?;

        self.active = None;
        self.gestures.reset();
        Ok(report)
    }

    /// Destroy the overlay; the raster layer is never touched
    pub fn cancel(&mut self) -> Result<(), OverlayError> {
        self.active.take().ok_or(OverlayError::NoActiveOverlay)?;
        self.gestures.reset();
        Ok(())
    }
}
