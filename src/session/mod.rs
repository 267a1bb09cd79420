//! Overlay session management module
//!
//! This module contains:
//! - Session state (the single active overlay and its gesture tracker)
//! - Message types for overlay commands
//! - Message handlers

pub mod handlers;
pub mod messages;
pub mod state;

pub use handlers::handle_overlay_msg;
pub use messages::{CommandOutcome, OverlayContent, OverlayMsg};
pub use state::{ActiveOverlay, OverlaySession};
