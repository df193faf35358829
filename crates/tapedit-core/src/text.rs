//! Text measurement, rasterization and rotated drawing.
//!
//! Text is laid out on a single line with `ab_glyph`: advances plus kerning,
//! baseline at the font ascent. Drawing rasterizes the line at the target
//! height and maps it onto a [`RotatedRect`] whose bottom-left corner is the
//! start of the line.

use std::fmt;

use ab_glyph::{point, Font, FontArc, GlyphId, PxScale, ScaleFont};
use glam::{Affine2, Vec2};
use image::{GrayImage, Luma, Rgba, RgbaImage};

use crate::geometry::RotatedRect;
use crate::render::composite;

/// Font and fill color for drawn text.
#[derive(Clone)]
pub struct TextStyle {
    pub font: FontArc,
    pub color: Rgba<u8>,
}

impl TextStyle {
    pub fn new(font: FontArc, color: Rgba<u8>) -> Self {
        Self { font, color }
    }
}

impl fmt::Debug for TextStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TextStyle")
            .field("color", &self.color)
            .finish_non_exhaustive()
    }
}

/// Width and height of `content` rendered `height` pixels tall.
pub fn measure_text(font: &FontArc, content: &str, height: f32) -> Vec2 {
    let scaled = font.as_scaled(PxScale::from(height));
    let mut width = 0.0f32;
    let mut prev: Option<GlyphId> = None;
    for ch in content.chars() {
        let id = font.glyph_id(ch);
        if let Some(prev_id) = prev {
            width += scaled.kern(prev_id, id);
        }
        width += scaled.h_advance(id);
        prev = Some(id);
    }
    Vec2::new(width.max(0.0), scaled.height())
}

/// Rasterize `content` into a coverage mask `height` pixels tall.
///
/// Returns `None` for empty or invisible text.
pub fn rasterize_text(font: &FontArc, content: &str, height: f32) -> Option<GrayImage> {
    if height.is_nan() || height <= 0.0 {
        return None;
    }
    let size = measure_text(font, content, height);
    let width = size.x.ceil() as u32;
    let rows = size.y.round() as u32;
    if width == 0 || rows == 0 {
        return None;
    }

    let scale = PxScale::from(height);
    let scaled = font.as_scaled(scale);
    let baseline = scaled.ascent();
    let mut mask = GrayImage::new(width, rows);

    let mut x = 0.0f32;
    let mut prev: Option<GlyphId> = None;
    for ch in content.chars() {
        let id = font.glyph_id(ch);
        if let Some(prev_id) = prev {
            x += scaled.kern(prev_id, id);
        }
        let glyph = id.with_scale_and_position(scale, point(x, baseline));
        if let Some(outlined) = font.outline_glyph(glyph) {
            let bounds = outlined.px_bounds();
            outlined.draw(|gx, gy, coverage| {
                let px = bounds.min.x as i32 + gx as i32;
                let py = bounds.min.y as i32 + gy as i32;
                if px < 0 || py < 0 || px >= width as i32 || py >= rows as i32 {
                    return;
                }
                let value = (coverage.clamp(0.0, 1.0) * 255.0).round() as u8;
                let pixel = mask.get_pixel_mut(px as u32, py as u32);
                // Overlapping glyphs keep the stronger coverage
                pixel.0[0] = pixel.0[0].max(value);
            });
        }
        x += scaled.h_advance(id);
        prev = Some(id);
    }

    Some(mask)
}

/// Colorize a coverage mask: every pixel gets `color` with alpha scaled by coverage.
pub fn tint_mask(mask: &GrayImage, color: Rgba<u8>) -> RgbaImage {
    let [r, g, b, a] = color.0;
    RgbaImage::from_fn(mask.width(), mask.height(), |x, y| {
        let Luma([coverage]) = *mask.get_pixel(x, y);
        let alpha = (coverage as u16 * a as u16 + 127) / 255;
        Rgba([r, g, b, alpha as u8])
    })
}

/// Draw `content` onto `target` so the line fills `rect` (target pixel space).
///
/// The line is rasterized at the rectangle's height, then stretched to its
/// width and rotated about the rectangle's bottom-left corner.
pub fn draw_text(target: &mut RgbaImage, content: &str, style: &TextStyle, rect: &RotatedRect) {
    if rect.width <= 0.0 || rect.height <= 0.0 {
        return;
    }
    let Some(mask) = rasterize_text(&style.font, content, rect.height) else {
        return;
    };

    let stretch = Vec2::new(
        rect.width / mask.width() as f32,
        rect.height / mask.height() as f32,
    );
    let transform = Affine2::from_translation(rect.left_bottom())
        * Affine2::from_angle(rect.angle.to_radians())
        * Affine2::from_translation(Vec2::new(0.0, -rect.height))
        * Affine2::from_scale(stretch);

    tracing::debug!(chars = content.chars().count(), ?rect, "drawing text");
    composite(target, &tint_mask(&mask, style.color), transform);
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    const TEST_FONT: &[u8] = include_bytes!("../tests/fixtures/DejaVuSansMono.ttf");

    /// Font bundled with the test fixtures.
    pub(crate) fn test_font() -> FontArc {
        FontArc::try_from_slice(TEST_FONT).unwrap()
    }

    #[test]
    fn test_tint_mask_scales_alpha() {
        let mut mask = GrayImage::new(2, 1);
        mask.put_pixel(0, 0, Luma([255]));
        mask.put_pixel(1, 0, Luma([0]));
        let tinted = tint_mask(&mask, Rgba([10, 20, 30, 200]));
        assert_eq!(tinted.get_pixel(0, 0).0, [10, 20, 30, 200]);
        assert_eq!(tinted.get_pixel(1, 0).0[3], 0);
    }

    #[test]
    fn test_measure_text_grows_with_content() {
        let font = test_font();
        let short = measure_text(&font, "Hi", 32.0);
        let long = measure_text(&font, "Hi there", 32.0);
        assert!(long.x > short.x);
        assert!((short.y - 32.0).abs() < 0.5, "height {}", short.y);
        assert_eq!(measure_text(&font, "", 32.0).x, 0.0);
    }

    #[test]
    fn test_rasterize_text_has_ink() {
        let font = test_font();
        let mask = rasterize_text(&font, "Hello", 24.0).unwrap();
        assert_eq!(mask.height(), 24);
        assert!(mask.pixels().any(|p| p.0[0] > 128));
        assert!(rasterize_text(&font, "", 24.0).is_none());
        assert!(rasterize_text(&font, "x", 0.0).is_none());
    }

    #[test]
    fn test_draw_text_stays_inside_rect() {
        let font = test_font();
        let white = Rgba([255, 255, 255, 255]);
        let mut target = RgbaImage::from_pixel(200, 100, white);
        let style = TextStyle::new(font, Rgba([0, 0, 0, 255]));
        let rect = RotatedRect::new(Vec2::new(100.0, 50.0), 120.0, 30.0, 0.0);
        draw_text(&mut target, "Text", &style, &rect);

        let mut inked = 0;
        for (x, y, p) in target.enumerate_pixels() {
            if *p != white {
                inked += 1;
                assert!((39..=161).contains(&x) && (34..=66).contains(&y), "ink at {x},{y}");
            }
        }
        assert!(inked > 0);
    }

    #[test]
    fn test_draw_text_rotated_quarter_turn() {
        let font = test_font();
        let white = Rgba([255, 255, 255, 255]);
        let mut target = RgbaImage::from_pixel(100, 200, white);
        let style = TextStyle::new(font, Rgba([0, 0, 0, 255]));
        // A wide box turned upright occupies a tall region
        let rect = RotatedRect::new(Vec2::new(50.0, 100.0), 120.0, 30.0, 90.0);
        draw_text(&mut target, "Text", &style, &rect);

        for (x, y, p) in target.enumerate_pixels() {
            if *p != white {
                assert!((34..=66).contains(&x) && (39..=161).contains(&y), "ink at {x},{y}");
            }
        }
    }
}
