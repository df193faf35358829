//! Rectangle rotated about its own center.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::rect::bounding_box;
use super::{rotate_point, Rect};

/// A rectangle defined by its center, size and rotation angle (degrees).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RotatedRect {
    pub center: Vec2,
    pub width: f32,
    pub height: f32,
    pub angle: f32,
}

impl RotatedRect {
    pub const fn new(center: Vec2, width: f32, height: f32, angle: f32) -> Self {
        Self {
            center,
            width,
            height,
            angle,
        }
    }

    #[inline]
    pub fn size(&self) -> Vec2 {
        Vec2::new(self.width, self.height)
    }

    /// Unit vector along the rotated width axis.
    #[inline]
    pub fn width_axis(&self) -> Vec2 {
        let (sin, cos) = self.angle.to_radians().sin_cos();
        Vec2::new(cos, sin)
    }

    /// Unit vector along the rotated height axis.
    #[inline]
    pub fn height_axis(&self) -> Vec2 {
        let (sin, cos) = self.angle.to_radians().sin_cos();
        Vec2::new(-sin, cos)
    }

    /// Position of `point` in the rectangle's unrotated frame, relative to the center.
    #[inline]
    pub fn to_local(&self, point: Vec2) -> Vec2 {
        rotate_point(point, -self.angle, self.center) - self.center
    }

    /// Inverse of [`RotatedRect::to_local`].
    #[inline]
    pub fn to_world(&self, local: Vec2) -> Vec2 {
        rotate_point(self.center + local, self.angle, self.center)
    }

    /// Rotated corners: top-left, top-right, bottom-right, bottom-left.
    pub fn corners(&self) -> [Vec2; 4] {
        let hw = self.width / 2.0;
        let hh = self.height / 2.0;
        [
            Vec2::new(-hw, -hh),
            Vec2::new(hw, -hh),
            Vec2::new(hw, hh),
            Vec2::new(-hw, hh),
        ]
        .map(|c| self.to_world(c))
    }

    /// The rotated bottom-left corner, where a text baseline starts.
    pub fn left_bottom(&self) -> Vec2 {
        rotate_point(
            Vec2::new(
                self.center.x - self.width / 2.0,
                self.center.y + self.height / 2.0,
            ),
            self.angle,
            self.center,
        )
    }

    /// Axis-aligned bounding box of the rotated corners.
    pub fn bounding_box(&self) -> Rect {
        bounding_box(self.corners())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::assert_vec_near;

    #[test]
    fn test_local_world_round_trip() {
        let r = RotatedRect::new(Vec2::new(40.0, 30.0), 20.0, 10.0, 33.0);
        let p = Vec2::new(47.0, 21.0);
        assert_vec_near(r.to_world(r.to_local(p)), p, 1e-4);
    }

    #[test]
    fn test_corners_unrotated() {
        let r = RotatedRect::new(Vec2::new(10.0, 10.0), 20.0, 10.0, 0.0);
        let c = r.corners();
        assert_vec_near(c[0], Vec2::new(0.0, 5.0), 1e-5);
        assert_vec_near(c[2], Vec2::new(20.0, 15.0), 1e-5);
    }

    #[test]
    fn test_left_bottom_quarter_turn() {
        // A quarter turn moves the bottom-left corner to the top-left
        let r = RotatedRect::new(Vec2::ZERO, 20.0, 10.0, 90.0);
        assert_vec_near(r.left_bottom(), Vec2::new(-5.0, -10.0), 1e-4);
    }

    #[test]
    fn test_axes_are_orthonormal() {
        let r = RotatedRect::new(Vec2::ZERO, 1.0, 1.0, 71.0);
        assert!((r.width_axis().length() - 1.0).abs() < 1e-6);
        assert!(r.width_axis().dot(r.height_axis()).abs() < 1e-6);
    }

    #[test]
    fn test_bounding_box_of_diamond() {
        let r = RotatedRect::new(Vec2::ZERO, 10.0, 10.0, 45.0);
        let b = r.bounding_box();
        let half_diag = 50.0f32.sqrt();
        assert!((b.right - half_diag).abs() < 1e-4);
        assert!((b.top + half_diag).abs() < 1e-4);
    }
}
