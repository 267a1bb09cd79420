//! Multi-pointer gesture state machine
//!
//! idle -> dragging (one pointer) -> pinching (two pointers) -> idle.
//! All deltas are taken against anchors captured when the session started,
//! so rounding never accumulates across frames.

use crate::domain::{Point, TransformLimits, TransformState};

pub type PointerId = u32;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PointerPhase {
    Down,
    Move,
    Up,
    /// Platform aborted the whole gesture
    Cancel,
}

/// Raw pointer input in absolute screen coordinates
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PointerEvent {
    pub id: PointerId,
    pub phase: PointerPhase,
    pub position: Point,
}

impl PointerEvent {
    pub fn down(id: PointerId, x: f32, y: f32) -> Self {
        Self {
            id,
            phase: PointerPhase::Down,
            position: Point::new(x, y),
        }
    }

    pub fn moved(id: PointerId, x: f32, y: f32) -> Self {
        Self {
            id,
            phase: PointerPhase::Move,
            position: Point::new(x, y),
        }
    }

    pub fn up(id: PointerId, x: f32, y: f32) -> Self {
        Self {
            id,
            phase: PointerPhase::Up,
            position: Point::new(x, y),
        }
    }
}

/// Two-pointer session state captured at pinch start
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PinchSession {
    pub first: (PointerId, Point),
    pub second: (PointerId, Point),
    pub start_distance: f32,
    pub start_angle: f32,
    pub start_scale: f32,
    pub start_rotation: f32,
}

impl PinchSession {
    fn tracks(&self, id: PointerId) -> bool {
        self.first.0 == id || self.second.0 == id
    }

    fn distance(&self) -> f32 {
        self.first.1.distance(self.second.1)
    }

    fn angle(&self) -> f32 {
        self.first.1.angle_to(self.second.1)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub enum GestureSession {
    #[default]
    Idle,
    Dragging {
        pointer: PointerId,
        /// Raw position of the pointer at touch-down
        anchor_raw: Point,
        /// Overlay position at touch-down
        anchor_position: Point,
        /// Latest raw position, kept so a second pointer can start a pinch
        current: Point,
    },
    Pinching(PinchSession),
}

/// What a single pointer event did to the transform
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GestureUpdate {
    Ignored,
    Started,
    Translated,
    Transformed,
    Ended,
}

#[derive(Clone, Debug, Default)]
pub struct GestureTracker {
    session: GestureSession,
    track_rotation: bool,
}

/// Pinch distances below this are treated as coincident pointers
const MIN_PINCH_DISTANCE: f32 = 1e-3;

impl GestureTracker {
    pub fn new(track_rotation: bool) -> Self {
        Self {
            session: GestureSession::Idle,
            track_rotation,
        }
    }

    pub fn session(&self) -> &GestureSession {
        &self.session
    }

    pub fn is_pinching(&self) -> bool {
        matches!(self.session, GestureSession::Pinching(_))
    }

    /// Drop any in-progress session without touching the transform
    pub fn reset(&mut self) {
        self.session = GestureSession::Idle;
    }

    pub fn handle(
        &mut self,
        event: PointerEvent,
        transform: &mut TransformState,
        limits: &TransformLimits,
    ) -> GestureUpdate {
        match event.phase {
            PointerPhase::Down => self.pointer_down(event, transform),
            PointerPhase::Move => self.pointer_move(event, transform, limits),
            PointerPhase::Up => self.pointer_up(event.id),
            PointerPhase::Cancel => {
                if self.session == GestureSession::Idle {
                    GestureUpdate::Ignored
                } else {
                    self.session = GestureSession::Idle;
                    GestureUpdate::Ended
                }
            }
        }
    }

    fn pointer_down(&mut self, event: PointerEvent, transform: &TransformState) -> GestureUpdate {
        match self.session {
            GestureSession::Dragging {
                pointer, current, ..
            } if pointer != event.id => {
                let mut pinch = PinchSession {
                    first: (pointer, current),
                    second: (event.id, event.position),
                    start_distance: 0.0,
                    start_angle: 0.0,
                    start_scale: transform.scale,
                    start_rotation: transform.rotation_degrees,
                };
                pinch.start_distance = pinch.distance();
                pinch.start_angle = pinch.angle();
                log::debug!(
                    "Pinch started between pointers {} and {} (d0 = {:.1})",
                    pointer,
                    event.id,
                    pinch.start_distance
                );
                self.session = GestureSession::Pinching(pinch);
                GestureUpdate::Started
            }
            // A third pointer does not join an active pinch
            GestureSession::Pinching(_) => GestureUpdate::Ignored,
            _ => {
                self.session = GestureSession::Dragging {
                    pointer: event.id,
                    anchor_raw: event.position,
                    anchor_position: transform.translation,
                    current: event.position,
                };
                GestureUpdate::Started
            }
        }
    }

    fn pointer_move(
        &mut self,
        event: PointerEvent,
        transform: &mut TransformState,
        limits: &TransformLimits,
    ) -> GestureUpdate {
        match &mut self.session {
            GestureSession::Idle => GestureUpdate::Ignored,
            GestureSession::Dragging {
                pointer,
                anchor_raw,
                anchor_position,
                current,
            } => {
                if *pointer != event.id {
                    return GestureUpdate::Ignored;
                }
                *current = event.position;
                transform.set_position(event.position - *anchor_raw + *anchor_position);
                GestureUpdate::Translated
            }
            GestureSession::Pinching(pinch) => {
                if !pinch.tracks(event.id) {
                    return GestureUpdate::Ignored;
                }
                if pinch.first.0 == event.id {
                    pinch.first.1 = event.position;
                } else {
                    pinch.second.1 = event.position;
                }

                if pinch.start_distance > MIN_PINCH_DISTANCE {
                    let ratio = pinch.distance() / pinch.start_distance;
                    transform.set_gesture_scale(pinch.start_scale * ratio, limits);
                }
                if self.track_rotation {
                    let delta = wrap_degrees(pinch.angle() - pinch.start_angle);
                    transform.set_rotation(pinch.start_rotation + delta);
                }
                GestureUpdate::Transformed
            }
        }
    }

    fn pointer_up(&mut self, id: PointerId) -> GestureUpdate {
        let tracked = match &self.session {
            GestureSession::Idle => false,
            GestureSession::Dragging { pointer, .. } => *pointer == id,
            GestureSession::Pinching(pinch) => pinch.tracks(id),
        };
        if tracked {
            self.session = GestureSession::Idle;
            GestureUpdate::Ended
        } else {
            GestureUpdate::Ignored
        }
    }
}

/// Fold an angle difference into (-180, 180]
fn wrap_degrees(delta: f32) -> f32 {
    let wrapped = (delta + 180.0).rem_euclid(360.0) - 180.0;
    if wrapped == -180.0 { 180.0 } else { wrapped }
}
