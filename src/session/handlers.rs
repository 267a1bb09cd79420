//! Overlay command dispatch
//!
//! Routes an [`OverlayMsg`] to the session and absorbs errors into a
//! [`CommandOutcome`]. Nothing here propagates an error to the host.

use super::messages::{CommandOutcome, OverlayContent, OverlayMsg};
use super::state::OverlaySession;
use crate::error::OverlayError;
use crate::gesture::GestureUpdate;
use crate::surface::{AbsolutePosition, RasterLayer};

/// Handle one overlay command
///
/// `positions` and `layer` are only consulted by `Commit`.
pub fn handle_overlay_msg(
    session: &mut OverlaySession,
    msg: OverlayMsg,
    positions: &dyn AbsolutePosition,
    layer: &mut dyn RasterLayer,
) -> CommandOutcome {
    let label = msg_label(&msg);
    let result = match msg {
        OverlayMsg::Add {
            content,
            anchor,
            density,
        } => match content {
            OverlayContent::Image { base64 } => session.add_image(&base64, anchor, density),
            OverlayContent::Text { content, color } => {
                session.add_text(&content, color, anchor, density)
            }
        }
        .map(|_| CommandOutcome::Applied),
        OverlayMsg::Move { dx, dy } => session.move_by(dx, dy).map(|_| CommandOutcome::Applied),
        OverlayMsg::IncreaseSize => session.increase_size().map(|_| CommandOutcome::Applied),
        OverlayMsg::DecreaseSize => session.decrease_size().map(|_| CommandOutcome::Applied),
        OverlayMsg::RotateRight => session.rotate_right().map(|_| CommandOutcome::Applied),
        OverlayMsg::RotateLeft => session.rotate_left().map(|_| CommandOutcome::Applied),
        OverlayMsg::SetFontSize(units) => session.set_font_size(units).map(applied_if),
        OverlayMsg::SetTextColor(color) => session.set_text_color(color).map(applied_if),
        OverlayMsg::Pointer(event) => session.pointer(event).map(|update| match update {
            GestureUpdate::Ignored => CommandOutcome::Ignored,
            _ => CommandOutcome::Applied,
        }),
        OverlayMsg::Commit => session
            .commit(positions, layer)
            .map(CommandOutcome::Committed),
        OverlayMsg::Cancel => session.cancel().map(|_| CommandOutcome::Applied),
    };

    match result {
        Ok(outcome) => outcome,
        Err(OverlayError::NoActiveOverlay) => {
            log::debug!("{label}: no active overlay, ignored");
            CommandOutcome::Ignored
        }
        Err(err) => {
            if err.is_retryable() {
                log::warn!("{label} failed, overlay kept: {err}");
            } else {
                log::error!("{label} failed: {err}");
            }
            CommandOutcome::Failed(err)
        }
    }
}

fn applied_if(changed: bool) -> CommandOutcome {
    if changed {
        CommandOutcome::Applied
    } else {
        CommandOutcome::Ignored
    }
}

fn msg_label(msg: &OverlayMsg) -> &'static str {
    match msg {
        OverlayMsg::Add { .. } => "addOverlay",
        OverlayMsg::Move { .. } => "moveOverlay",
        OverlayMsg::IncreaseSize => "increaseOverlaySize",
        OverlayMsg::DecreaseSize => "decreaseOverlaySize",
        OverlayMsg::RotateRight => "rotateOverlayRight",
        OverlayMsg::RotateLeft => "rotateOverlayLeft",
        OverlayMsg::SetFontSize(_) => "setOverlayFontSize",
        OverlayMsg::SetTextColor(_) => "setOverlayTextColor",
        OverlayMsg::Pointer(_) => "pointer",
        OverlayMsg::Commit => "commitOverlay",
        OverlayMsg::Cancel => "cancelOverlay",
    }
}
