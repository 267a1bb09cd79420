//! Pointer gesture interpretation
//!
//! Turns raw multi-pointer input into translation, scale and rotation of
//! the active overlay's [`TransformState`](crate::domain::TransformState).

pub mod tracker;

pub use tracker::*;
