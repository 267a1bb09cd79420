//! Pure domain types with minimal dependencies
//!
//! Geometry, the overlay element and its transform state. Nothing here
//! touches a raster surface or input device.

pub mod geometry;
pub mod overlay;
pub mod transform;

pub use geometry::*;
pub use overlay::*;
pub use transform::*;
