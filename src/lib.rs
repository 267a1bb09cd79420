//! Floating image and text overlays for a handwriting surface
//!
//! An overlay is created from a base64 image or a text string, manipulated
//! with discrete commands or touch gestures, and finally baked into a
//! raster layer or discarded.

pub mod config;
pub mod domain;
pub mod error;
pub mod gesture;
pub mod render;
pub mod session;
pub mod surface;

pub use config::OverlayConfig;
pub use error::OverlayError;
pub use session::{CommandOutcome, OverlayMsg, OverlaySession, handle_overlay_msg};
pub use surface::{AbsolutePosition, ContainerGeometry, MemoryLayer, RasterLayer};
