//! Aspect-ratio locking mode shared by both box controllers.

use serde::{Deserialize, Serialize};

use super::GeometryError;

/// Free or fixed width/height ratio.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum AspectRatio {
    #[default]
    Free,
    /// Locked to `width / height`, always positive and finite.
    Fixed(f32),
}

impl AspectRatio {
    /// Fixed ratio from a `width:height` preset such as `16:9`.
    ///
    /// # Errors
    /// [`GeometryError::InvalidAspectRatio`] when either component is not a
    /// positive finite number.
    pub fn fixed(width: f32, height: f32) -> Result<Self, GeometryError> {
        let valid = |v: f32| v.is_finite() && v > 0.0;
        if valid(width) && valid(height) {
            Ok(Self::Fixed(width / height))
        } else {
            Err(GeometryError::InvalidAspectRatio { width, height })
        }
    }

    /// Fixed ratio from a single `width / height` value.
    pub fn from_ratio(ratio: f32) -> Result<Self, GeometryError> {
        Self::fixed(ratio, 1.0)
    }

    /// The locked ratio, or `None` when free.
    #[inline]
    pub fn ratio(&self) -> Option<f32> {
        match *self {
            Self::Free => None,
            Self::Fixed(r) => Some(r),
        }
    }

    #[inline]
    pub fn is_fixed(&self) -> bool {
        matches!(self, Self::Fixed(_))
    }

    /// Shrink whichever dimension is too long for the ratio.
    ///
    /// Free mode returns the input unchanged.
    pub fn fit(&self, width: f32, height: f32) -> (f32, f32) {
        match *self {
            Self::Free => (width, height),
            Self::Fixed(r) => {
                if width / height > r {
                    (height * r, height)
                } else {
                    (width, width / r)
                }
            }
        }
    }
}
