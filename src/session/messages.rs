//! Message types for an overlay session
//!
//! These mirror the host's named commands (`addOverlay`, `moveOverlay`, ...)
//! plus raw pointer input routed to the active overlay.

use crate::config::InkColor;
use crate::domain::Anchor;
use crate::error::OverlayError;
use crate::gesture::PointerEvent;
use crate::render::compositor::BakeReport;

/// Payload for a new overlay
#[derive(Debug, Clone, PartialEq)]
pub enum OverlayContent {
    /// Base64-encoded compressed image
    Image { base64: String },
    /// Text string, with an optional color (defaults to the configured ink)
    Text {
        content: String,
        color: Option<InkColor>,
    },
}

/// All overlay commands
#[derive(Debug, Clone, PartialEq)]
pub enum OverlayMsg {
    /// Create the floating overlay, replacing any active one
    Add {
        content: OverlayContent,
        anchor: Option<Anchor>,
        /// Caller's density; the anchor is only honored when this is set
        density: Option<f32>,
    },
    /// Additive translation in screen units
    Move { dx: f32, dy: f32 },
    IncreaseSize,
    DecreaseSize,
    RotateRight,
    RotateLeft,
    /// Text font size in density-independent units
    SetFontSize(f32),
    SetTextColor(InkColor),
    /// Raw pointer input on the overlay
    Pointer(PointerEvent),
    /// Bake into the raster layer and destroy the overlay
    Commit,
    /// Destroy the overlay without touching the raster layer
    Cancel,
}

/// Result of handling one [`OverlayMsg`], after errors have been absorbed
#[derive(Debug, Clone, PartialEq)]
pub enum CommandOutcome {
    /// State changed
    Applied,
    /// Nothing to act on (no overlay, untracked pointer, wrong overlay kind)
    Ignored,
    /// Overlay baked and destroyed
    Committed(BakeReport),
    /// Command failed; any active overlay is still in place
    Failed(OverlayError),
}

impl CommandOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, CommandOutcome::Failed(_))
    }
}
