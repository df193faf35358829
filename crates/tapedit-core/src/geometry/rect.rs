//! Axis-aligned rectangle in edge form.

use glam::{Affine2, Vec2};
use serde::{Deserialize, Serialize};

use super::GeometryError;

/// Axis-aligned rectangle stored as its four edges.
///
/// Used for the crop box, its bound and the on-screen image box.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
}

impl Rect {
    #[inline]
    pub const fn new(left: f32, top: f32, right: f32, bottom: f32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    /// Rectangle of the given size anchored at the origin.
    #[inline]
    pub const fn from_size(width: f32, height: f32) -> Self {
        Self::new(0.0, 0.0, width, height)
    }

    /// Rectangle of the given size centered on `center`.
    pub fn from_center_size(center: Vec2, width: f32, height: f32) -> Self {
        Self::new(
            center.x - width / 2.0,
            center.y - height / 2.0,
            center.x + width / 2.0,
            center.y + height / 2.0,
        )
    }

    #[inline]
    pub fn width(&self) -> f32 {
        self.right - self.left
    }

    #[inline]
    pub fn height(&self) -> f32 {
        self.bottom - self.top
    }

    #[inline]
    pub fn size(&self) -> Vec2 {
        Vec2::new(self.width(), self.height())
    }

    #[inline]
    pub fn center(&self) -> Vec2 {
        Vec2::new(
            (self.left + self.right) / 2.0,
            (self.top + self.bottom) / 2.0,
        )
    }

    #[inline]
    pub fn top_left(&self) -> Vec2 {
        Vec2::new(self.left, self.top)
    }

    /// Width over height.
    #[inline]
    pub fn aspect_ratio(&self) -> f32 {
        self.width() / self.height()
    }

    /// Reject rectangles whose edges are crossed.
    pub fn validate(self) -> Result<Self, GeometryError> {
        if self.width() >= 0.0 && self.height() >= 0.0 {
            Ok(self)
        } else {
            Err(GeometryError::NegativeSize {
                width: self.width(),
                height: self.height(),
            })
        }
    }

    /// Move all four edges by `delta`.
    #[inline]
    pub fn translate(&mut self, delta: Vec2) {
        self.left += delta.x;
        self.right += delta.x;
        self.top += delta.y;
        self.bottom += delta.y;
    }

    #[inline]
    pub fn translated(mut self, delta: Vec2) -> Self {
        self.translate(delta);
        self
    }

    /// Inclusive point containment.
    #[inline]
    pub fn contains(&self, point: Vec2) -> bool {
        point.x >= self.left && point.x <= self.right && point.y >= self.top && point.y <= self.bottom
    }

    /// Whether `other` lies inside `self`, allowing `tolerance` of slack per edge.
    pub fn contains_rect(&self, other: &Rect, tolerance: f32) -> bool {
        other.left >= self.left - tolerance
            && other.top >= self.top - tolerance
            && other.right <= self.right + tolerance
            && other.bottom <= self.bottom + tolerance
    }

    /// The four corners: top-left, top-right, bottom-right, bottom-left.
    pub fn corners(&self) -> [Vec2; 4] {
        [
            Vec2::new(self.left, self.top),
            Vec2::new(self.right, self.top),
            Vec2::new(self.right, self.bottom),
            Vec2::new(self.left, self.bottom),
        ]
    }

    /// Bounding box of the corners after mapping through `transform`.
    pub fn transformed(&self, transform: &Affine2) -> Rect {
        bounding_box(self.corners().map(|c| transform.transform_point2(c)))
    }

    /// Edge-wise comparison within `tolerance`.
    pub fn approx_eq(&self, other: &Rect, tolerance: f32) -> bool {
        (self.left - other.left).abs() <= tolerance
            && (self.top - other.top).abs() <= tolerance
            && (self.right - other.right).abs() <= tolerance
            && (self.bottom - other.bottom).abs() <= tolerance
    }
}

/// Smallest axis-aligned rectangle containing every point.
pub(crate) fn bounding_box<const N: usize>(points: [Vec2; N]) -> Rect {
    let mut min = Vec2::splat(f32::INFINITY);
    let mut max = Vec2::splat(f32::NEG_INFINITY);
    for p in points {
        min = min.min(p);
        max = max.max(p);
    }
    Rect::new(min.x, min.y, max.x, max.y)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dimensions() {
        let r = Rect::new(10.0, 20.0, 110.0, 70.0);
        assert_eq!(r.width(), 100.0);
        assert_eq!(r.height(), 50.0);
        assert_eq!(r.center(), Vec2::new(60.0, 45.0));
        assert_eq!(r.aspect_ratio(), 2.0);
    }

    #[test]
    fn test_validate_rejects_crossed_edges() {
        assert!(Rect::new(0.0, 0.0, 0.0, 0.0).validate().is_ok());
        let err = Rect::new(10.0, 0.0, 5.0, 10.0).validate().unwrap_err();
        assert_eq!(
            err,
            GeometryError::NegativeSize {
                width: -5.0,
                height: 10.0
            }
        );
    }

    #[test]
    fn test_translate() {
        let r = Rect::from_size(10.0, 10.0).translated(Vec2::new(5.0, -5.0));
        assert_eq!(r, Rect::new(5.0, -5.0, 15.0, 5.0));
    }

    #[test]
    fn test_from_center_size() {
        let r = Rect::from_center_size(Vec2::new(50.0, 50.0), 20.0, 10.0);
        assert_eq!(r, Rect::new(40.0, 45.0, 60.0, 55.0));
    }

    #[test]
    fn test_transformed_by_quarter_turn() {
        let r = Rect::from_size(100.0, 50.0);
        let t = Affine2::from_angle(std::f32::consts::FRAC_PI_2);
        let mapped = r.transformed(&t);
        assert!(mapped.approx_eq(&Rect::new(-50.0, 0.0, 0.0, 100.0), 1e-3));
    }

    #[test]
    fn test_contains_rect_with_tolerance() {
        let outer = Rect::from_size(100.0, 100.0);
        assert!(outer.contains_rect(&Rect::new(0.0, 0.0, 100.0, 100.0), 0.0));
        assert!(outer.contains_rect(&Rect::new(-0.001, 0.0, 100.0, 100.0), 0.01));
        assert!(!outer.contains_rect(&Rect::new(-1.0, 0.0, 100.0, 100.0), 0.01));
    }
}
