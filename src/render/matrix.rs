//! Bake matrix construction
//!
//! The composition order is fixed: translate the source into layer space,
//! rotate about the overlay center, then scale about the same center. Live
//! manipulation pivots about the center, so baking has to as well.

use tiny_skia::Transform;

use crate::domain::{Point, Size};

/// Everything the compositor derived from live geometry for one bake
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BakeGeometry {
    /// Overlay top-left relative to the raster layer
    pub origin: Point,
    /// Pivot for rotation and scale, in layer space
    pub center: Point,
    pub scale: f32,
    pub rotation_degrees: f32,
    /// Unscaled source size
    pub size: Size,
}

impl BakeGeometry {
    pub fn new(
        overlay_absolute: Point,
        layer_absolute: Point,
        size: Size,
        scale: f32,
        rotation_degrees: f32,
    ) -> Self {
        let origin = overlay_absolute - layer_absolute;
        Self {
            origin,
            center: overlay_center(origin, size, scale),
            scale,
            rotation_degrees,
            size,
        }
    }

    /// Whether every parameter is a usable number
    pub fn is_finite(&self) -> bool {
        self.origin.is_finite()
            && self.center.is_finite()
            && self.scale.is_finite()
            && self.rotation_degrees.is_finite()
    }

    pub fn matrix(&self) -> Transform {
        bake_matrix(self.origin, self.center, self.rotation_degrees, self.scale)
    }

    /// Source corners mapped into layer space
    pub fn corners(&self) -> [Point; 4] {
        let m = self.matrix();
        let (w, h) = (self.size.width, self.size.height);
        [
            map_point(&m, Point::new(0.0, 0.0)),
            map_point(&m, Point::new(w, 0.0)),
            map_point(&m, Point::new(w, h)),
            map_point(&m, Point::new(0.0, h)),
        ]
    }
}

/// Post-scale center: `origin + (width/2, height/2) * scale`
pub fn overlay_center(origin: Point, size: Size, scale: f32) -> Point {
    origin + size.half() * scale
}

pub fn bake_matrix(origin: Point, center: Point, rotation_degrees: f32, scale: f32) -> Transform {
    Transform::from_translate(origin.x, origin.y)
        .post_concat(Transform::from_rotate_at(
            rotation_degrees,
            center.x,
            center.y,
        ))
        .post_concat(scale_about(scale, center))
}

/// Uniform scale with `center` as the fixed point
pub fn scale_about(scale: f32, center: Point) -> Transform {
    Transform::from_row(
        scale,
        0.0,
        0.0,
        scale,
        center.x - scale * center.x,
        center.y - scale * center.y,
    )
}

pub fn map_point(transform: &Transform, p: Point) -> Point {
    let mut pts = [tiny_skia::Point::from_xy(p.x, p.y)];
    transform.map_points(&mut pts);
    Point::new(pts[0].x, pts[0].y)
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-3;

    fn close(a: Point, b: Point) -> bool {
        (a.x - b.x).abs() < EPS && (a.y - b.y).abs() < EPS
    }

    /// Reference: translate, rotate about c, scale about c, step by step
    fn reference(p: Point, origin: Point, center: Point, degrees: f32, scale: f32) -> Point {
        let q = p + origin;
        let (sin, cos) = degrees.to_radians().sin_cos();
        let d = q - center;
        let rotated = Point::new(d.x * cos - d.y * sin, d.x * sin + d.y * cos) + center;
        (rotated - center) * scale + center
    }

    #[test]
    fn test_origin_from_absolute_positions() {
        let geometry = BakeGeometry::new(
            Point::new(130.0, 210.0),
            Point::new(100.0, 135.0),
            Size::new(40.0, 20.0),
            2.0,
            0.0,
        );
        assert_eq!(geometry.origin, Point::new(30.0, 75.0));
        assert_eq!(geometry.center, Point::new(70.0, 95.0));
    }

    #[test]
    fn test_matrix_matches_stepwise_composition() {
        let origin = Point::new(30.0, 75.0);
        let size = Size::new(40.0, 20.0);
        let center = overlay_center(origin, size, 2.0);
        let m = bake_matrix(origin, center, 15.0, 2.0);
        for p in [
            Point::new(0.0, 0.0),
            Point::new(40.0, 0.0),
            Point::new(40.0, 20.0),
            Point::new(13.0, 7.5),
        ] {
            let expected = reference(p, origin, center, 15.0, 2.0);
            assert!(close(map_point(&m, p), expected), "{p:?}");
        }
    }

    #[test]
    fn test_identity_parameters_only_translate() {
        let origin = Point::new(12.0, -4.0);
        let m = bake_matrix(origin, Point::new(50.0, 50.0), 0.0, 1.0);
        assert!(close(map_point(&m, Point::new(3.0, 3.0)), Point::new(15.0, -1.0)));
    }

    #[test]
    fn test_center_is_fixed_point_of_rotation_and_scale() {
        let center = Point::new(10.0, 10.0);
        let m = Transform::from_rotate_at(73.0, center.x, center.y)
            .post_concat(scale_about(3.0, center));
        assert!(close(map_point(&m, center), center));
    }

    #[test]
    fn test_full_turn_matches_no_rotation() {
        let origin = Point::new(5.0, 5.0);
        let center = Point::new(25.0, 15.0);
        let a = bake_matrix(origin, center, 360.0, 1.5);
        let b = bake_matrix(origin, center, 0.0, 1.5);
        let p = Point::new(7.0, 3.0);
        assert!(close(map_point(&a, p), map_point(&b, p)));
    }

    #[test]
    fn test_corners_cover_scaled_box() {
        let geometry = BakeGeometry::new(
            Point::new(0.0, 0.0),
            Point::new(0.0, 0.0),
            Size::new(10.0, 10.0),
            1.0,
            90.0,
        );
        let corners = geometry.corners();
        // Rotating a square about its own center maps it onto itself
        for c in corners {
            assert!(c.x > -EPS && c.x < 10.0 + EPS);
            assert!(c.y > -EPS && c.y < 10.0 + EPS);
        }
    }
}
