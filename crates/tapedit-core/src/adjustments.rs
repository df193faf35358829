//! Brightness, contrast and saturation.
//!
//! ## Adjustment Order
//! 1. Brightness
//! 2. Contrast
//! 3. Saturation
//!
//! Values range from -100 to +100 and act on RGBA pixel data; alpha is left
//! untouched.

use serde::{Deserialize, Serialize};

/// Pending color adjustments.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Adjustments {
    /// Brightness (-100 to 100)
    pub brightness: f32,
    /// Contrast (-100 to 100)
    pub contrast: f32,
    /// Saturation (-100 to 100)
    pub saturation: f32,
}

impl Adjustments {
    pub fn new(brightness: f32, contrast: f32, saturation: f32) -> Self {
        Self {
            brightness,
            contrast,
            saturation,
        }
    }

    /// Check if all values are at their defaults
    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }

    /// Copy with every value limited to [-100, 100]. NaN becomes 0.
    pub fn clamped(&self) -> Self {
        let limit = |v: f32| if v.is_nan() { 0.0 } else { v.clamp(-100.0, 100.0) };
        Self {
            brightness: limit(self.brightness),
            contrast: limit(self.contrast),
            saturation: limit(self.saturation),
        }
    }
}

/// Apply adjustments to RGBA pixel data in place.
///
/// # Arguments
/// * `pixels` - RGBA pixel data (4 bytes per pixel, row-major order); an
///   `RgbaImage` derefs to this
/// * `adjustments` - The adjustment values to apply
pub fn apply_adjustments(pixels: &mut [u8], adjustments: &Adjustments) {
    if adjustments.is_default() {
        return;
    }

    for chunk in pixels.chunks_exact_mut(4) {
        let mut r = chunk[0] as f32 / 255.0;
        let mut g = chunk[1] as f32 / 255.0;
        let mut b = chunk[2] as f32 / 255.0;

        (r, g, b) = apply_brightness(r, g, b, adjustments.brightness);
        (r, g, b) = apply_contrast(r, g, b, adjustments.contrast);
        (r, g, b) = apply_saturation(r, g, b, adjustments.saturation);

        chunk[0] = to_byte(r);
        chunk[1] = to_byte(g);
        chunk[2] = to_byte(b);
    }
}

#[inline]
fn to_byte(v: f32) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0).round() as u8
}

/// Shift every channel by up to half the range.
///
/// Formula: `output = input + brightness/100 * 0.5`
#[inline]
fn apply_brightness(r: f32, g: f32, b: f32, brightness: f32) -> (f32, f32, f32) {
    if brightness == 0.0 {
        return (r, g, b);
    }
    let offset = brightness / 100.0 * 0.5;
    (r + offset, g + offset, b + offset)
}

/// Formula: `output = (input - 0.5) * (1 + contrast/100) + 0.5`
#[inline]
fn apply_contrast(r: f32, g: f32, b: f32, contrast: f32) -> (f32, f32, f32) {
    if contrast == 0.0 {
        return (r, g, b);
    }
    let factor = 1.0 + (contrast / 100.0);
    let midpoint = 0.5;
    (
        (r - midpoint) * factor + midpoint,
        (g - midpoint) * factor + midpoint,
        (b - midpoint) * factor + midpoint,
    )
}

/// Scale each channel's distance from the BT.709 luminance.
///
/// -100 yields grayscale, +100 doubles the chroma.
#[inline]
fn apply_saturation(r: f32, g: f32, b: f32, saturation: f32) -> (f32, f32, f32) {
    if saturation == 0.0 {
        return (r, g, b);
    }
    let gray = 0.2126 * r + 0.7152 * g + 0.0722 * b;
    let factor = 1.0 + (saturation / 100.0);
    (
        gray + (r - gray) * factor,
        gray + (g - gray) * factor,
        gray + (b - gray) * factor,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn apply(pixels: &[u8], adj: &Adjustments) -> Vec<u8> {
        let mut result = pixels.to_vec();
        apply_adjustments(&mut result, adj);
        result
    }

    #[test]
    fn test_identity_no_adjustments() {
        let pixels = vec![128, 64, 192, 255];
        assert_eq!(apply(&pixels, &Adjustments::default()), pixels);
    }

    #[test]
    fn test_brightness_shifts_channels() {
        let up = apply(&[100, 100, 100, 255], &Adjustments::new(40.0, 0.0, 0.0));
        assert_eq!(&up[..3], &[151, 151, 151]);

        let down = apply(&[100, 100, 100, 255], &Adjustments::new(-100.0, 0.0, 0.0));
        assert_eq!(&down[..3], &[0, 0, 0]);
    }

    #[test]
    fn test_contrast_positive_spreads_from_midpoint() {
        let result = apply(&[64, 128, 192, 255], &Adjustments::new(0.0, 50.0, 0.0));
        assert!(result[0] < 64, "dark channel should get darker");
        assert!(result[2] > 192, "bright channel should get brighter");
    }

    #[test]
    fn test_contrast_negative_flattens() {
        let result = apply(&[0, 255, 0, 255], &Adjustments::new(0.0, -100.0, 0.0));
        assert_eq!(result[0], result[1]);
        assert_eq!(result[1], result[2]);
    }

    #[test]
    fn test_saturation_desaturate_to_gray() {
        let result = apply(&[200, 50, 50, 255], &Adjustments::new(0.0, 0.0, -100.0));
        assert_eq!(result[0], result[1]);
        assert_eq!(result[1], result[2]);
    }

    #[test]
    fn test_saturation_increase() {
        let result = apply(&[150, 100, 100, 255], &Adjustments::new(0.0, 0.0, 50.0));
        assert!(result[0] > 150);
        assert!(result[1] < 100);
    }

    #[test]
    fn test_gray_is_unaffected_by_saturation() {
        let result = apply(&[90, 90, 90, 255], &Adjustments::new(0.0, 0.0, 100.0));
        assert_eq!(&result[..3], &[90, 90, 90]);
    }

    #[test]
    fn test_alpha_preserved() {
        let result = apply(&[10, 20, 30, 77], &Adjustments::new(50.0, 50.0, 50.0));
        assert_eq!(result[3], 77);
    }

    #[test]
    fn test_incomplete_pixel_ignored() {
        let result = apply(&[10, 20, 30, 40, 50, 60], &Adjustments::new(100.0, 0.0, 0.0));
        assert_eq!(&result[4..], &[50, 60]);
    }

    #[test]
    fn test_clamped() {
        let adj = Adjustments::new(250.0, -300.0, f32::NAN).clamped();
        assert_eq!(adj, Adjustments::new(100.0, -100.0, 0.0));
    }

    #[test]
    fn test_applies_to_rgba_image() {
        let mut img = image::RgbaImage::from_pixel(2, 2, image::Rgba([100, 100, 100, 255]));
        apply_adjustments(&mut img, &Adjustments::new(40.0, 0.0, 0.0));
        assert_eq!(img.get_pixel(1, 1).0, [151, 151, 151, 255]);
    }
}
