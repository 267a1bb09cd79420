//! Accumulated affine state of the floating overlay
//!
//! Translation is the overlay's top-left in container coordinates. Scale and
//! rotation pivot about the overlay's own center.

use super::geometry::Point;
use crate::config::OverlayConfig;

/// Step sizes and bounds applied to a [`TransformState`]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TransformLimits {
    pub size_step: f32,
    pub rotation_step: f32,
    pub min_scale: f32,
    pub max_gesture_scale: f32,
}

impl Default for TransformLimits {
    fn default() -> Self {
        Self {
            size_step: 0.1,
            rotation_step: 15.0,
            min_scale: 0.1,
            max_gesture_scale: 5.0,
        }
    }
}

impl From<&OverlayConfig> for TransformLimits {
    fn from(config: &OverlayConfig) -> Self {
        Self {
            size_step: config.size_step,
            rotation_step: config.rotation_step,
            min_scale: config.min_scale,
            max_gesture_scale: config.max_gesture_scale,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TransformState {
    pub translation: Point,
    pub scale: f32,
    pub rotation_degrees: f32,
}

impl Default for TransformState {
    fn default() -> Self {
        Self {
            translation: Point::ZERO,
            scale: 1.0,
            rotation_degrees: 0.0,
        }
    }
}

impl TransformState {
    pub fn at(translation: Point) -> Self {
        Self {
            translation,
            ..Default::default()
        }
    }

    /// Additive translation, no clamp
    pub fn move_by(&mut self, dx: f32, dy: f32) {
        self.translation.x += dx;
        self.translation.y += dy;
    }

    pub fn set_position(&mut self, position: Point) {
        self.translation = position;
    }

    // NOTE: the discrete path has no upper bound, only the pinch path clamps to max_gesture_scale.
    pub fn increase_size(&mut self, limits: &TransformLimits) {
        self.scale += limits.size_step;
    }

    pub fn decrease_size(&mut self, limits: &TransformLimits) {
        self.scale = (self.scale - limits.size_step).max(limits.min_scale);
    }

    /// Scale set by a pinch gesture, clamped on both ends
    pub fn set_gesture_scale(&mut self, scale: f32, limits: &TransformLimits) {
        self.scale = scale.clamp(limits.min_scale, limits.max_gesture_scale);
    }

    pub fn rotate_right(&mut self, limits: &TransformLimits) {
        self.rotation_degrees += limits.rotation_step;
    }

    pub fn rotate_left(&mut self, limits: &TransformLimits) {
        self.rotation_degrees -= limits.rotation_step;
    }

    pub fn set_rotation(&mut self, degrees: f32) {
        self.rotation_degrees = degrees;
    }

    /// Rotation folded into [0, 360)
    pub fn normalized_rotation(&self) -> f32 {
        self.rotation_degrees.rem_euclid(360.0)
    }
}
