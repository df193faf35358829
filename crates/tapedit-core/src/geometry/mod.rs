//! Geometry primitives shared by the drag controllers, the view model and the
//! edit engine.
//!
//! # Coordinate System
//!
//! - Screen and image spaces are y-down, origin at the top-left corner
//! - Angles are in degrees; positive angles rotate clockwise on screen
//! - Vectors and affine maps are `glam` types (`Vec2`, `Affine2`)

mod aspect;
mod rect;
mod rotated;

pub use aspect::AspectRatio;
pub use glam::{Affine2, Vec2};
pub use rect::Rect;
pub use rotated::RotatedRect;

use thiserror::Error;

/// Contract violations raised by geometric setters.
///
/// These are rejected synchronously and leave the receiver untouched.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum GeometryError {
    /// A rectangle with `right < left` or `bottom < top`.
    #[error("rectangle has negative size: {width} x {height}")]
    NegativeSize { width: f32, height: f32 },

    /// An aspect ratio with a zero, negative or non-finite component.
    #[error("aspect ratio components must be positive, got {width}:{height}")]
    InvalidAspectRatio { width: f32, height: f32 },
}

/// Rotate `point` by `angle_degrees` around `pivot`.
///
/// ```text
/// x' = px + dx * cos(a) - dy * sin(a)
/// y' = py + dx * sin(a) + dy * cos(a)
/// ```
#[inline]
pub fn rotate_point(point: Vec2, angle_degrees: f32, pivot: Vec2) -> Vec2 {
    let (sin, cos) = angle_degrees.to_radians().sin_cos();
    let d = point - pivot;
    Vec2::new(pivot.x + d.x * cos - d.y * sin, pivot.y + d.x * sin + d.y * cos)
}

/// Signed angle in degrees that turns `from` onto `to`.
///
/// Returns 0.0 when either vector has zero length.
#[inline]
pub fn signed_angle_degrees(from: Vec2, to: Vec2) -> f32 {
    if from.length_squared() == 0.0 || to.length_squared() == 0.0 {
        return 0.0;
    }
    from.perp_dot(to).atan2(from.dot(to)).to_degrees()
}

/// Affine map scaling around `pivot`.
#[inline]
pub fn scale_about(factor: f32, pivot: Vec2) -> Affine2 {
    Affine2::from_translation(pivot)
        * Affine2::from_scale(Vec2::splat(factor))
        * Affine2::from_translation(-pivot)
}

/// Affine map rotating by `angle_degrees` around `pivot`.
#[inline]
pub fn rotate_about(angle_degrees: f32, pivot: Vec2) -> Affine2 {
    Affine2::from_translation(pivot)
        * Affine2::from_angle(angle_degrees.to_radians())
        * Affine2::from_translation(-pivot)
}

#[cfg(test)]
pub(crate) fn assert_vec_near(actual: Vec2, expected: Vec2, tolerance: f32) {
    assert!(
        (actual - expected).abs().max_element() <= tolerance,
        "expected {expected:?}, got {actual:?}"
    );
}
