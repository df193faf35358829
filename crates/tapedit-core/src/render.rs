//! Drawing bitmaps through affine transforms.
//!
//! Every destination pixel center is mapped back into the source image with
//! the inverse transform and sampled bilinearly, then blended source-over.
//! Blending works on premultiplied values so transparent edges do not bleed
//! dark fringes into the result.

use glam::{Affine2, Vec2};
use image::{Rgba, RgbaImage};

/// Anything the editor can paint its current state onto.
pub trait RenderSurface {
    /// Surface size in pixels.
    fn size(&self) -> Vec2;

    /// Fill the whole surface with `color`.
    fn clear(&mut self, color: Rgba<u8>);

    /// Draw `image` with `transform` mapping image pixels to surface pixels.
    fn draw_image(&mut self, image: &RgbaImage, transform: Affine2);
}

/// A [`RenderSurface`] backed by an in-memory RGBA buffer.
#[derive(Debug, Clone)]
pub struct PixelSurface {
    target: RgbaImage,
}

impl PixelSurface {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            target: RgbaImage::new(width, height),
        }
    }

    pub fn from_image(target: RgbaImage) -> Self {
        Self { target }
    }

    pub fn image(&self) -> &RgbaImage {
        &self.target
    }

    pub fn into_image(self) -> RgbaImage {
        self.target
    }
}

impl RenderSurface for PixelSurface {
    fn size(&self) -> Vec2 {
        Vec2::new(self.target.width() as f32, self.target.height() as f32)
    }

    fn clear(&mut self, color: Rgba<u8>) {
        for pixel in self.target.pixels_mut() {
            *pixel = color;
        }
    }

    fn draw_image(&mut self, image: &RgbaImage, transform: Affine2) {
        composite(&mut self.target, image, transform);
    }
}

/// Blend `source` onto `target` through `transform` (source pixels to target pixels).
///
/// Singular transforms and empty images draw nothing.
pub fn composite(target: &mut RgbaImage, source: &RgbaImage, transform: Affine2) {
    let (sw, sh) = source.dimensions();
    let (tw, th) = target.dimensions();
    if sw == 0 || sh == 0 || tw == 0 || th == 0 {
        return;
    }

    let det = transform.matrix2.determinant();
    if det == 0.0 || !det.is_finite() {
        return;
    }
    let inverse = transform.inverse();

    // Destination pixels whose centers can land inside the source
    let footprint = crate::geometry::Rect::from_size(sw as f32, sh as f32).transformed(&transform);
    let x0 = footprint.left.floor().max(0.0) as u32;
    let y0 = footprint.top.floor().max(0.0) as u32;
    let x1 = (footprint.right.ceil().min(tw as f32)).max(0.0) as u32;
    let y1 = (footprint.bottom.ceil().min(th as f32)).max(0.0) as u32;

    let size = Vec2::new(sw as f32, sh as f32);
    for y in y0..y1 {
        for x in x0..x1 {
            let center = Vec2::new(x as f32 + 0.5, y as f32 + 0.5);
            let src = inverse.transform_point2(center);
            if src.x < 0.0 || src.y < 0.0 || src.x >= size.x || src.y >= size.y {
                continue;
            }
            let sample = sample_bilinear(source, src - 0.5);
            let pixel = target.get_pixel_mut(x, y);
            *pixel = blend_over(sample, *pixel);
        }
    }
}

// Premultiplied RGBA in [0, 1]
type Premul = [f32; 4];

fn premultiply(pixel: Rgba<u8>) -> Premul {
    let a = pixel.0[3] as f32 / 255.0;
    [
        pixel.0[0] as f32 / 255.0 * a,
        pixel.0[1] as f32 / 255.0 * a,
        pixel.0[2] as f32 / 255.0 * a,
        a,
    ]
}

/// Bilinear sample at continuous pixel coordinates, edges clamped.
fn sample_bilinear(image: &RgbaImage, at: Vec2) -> Premul {
    let max_x = image.width() - 1;
    let max_y = image.height() - 1;
    let x = at.x.max(0.0);
    let y = at.y.max(0.0);
    let x0 = (x.floor() as u32).min(max_x);
    let y0 = (y.floor() as u32).min(max_y);
    let x1 = (x0 + 1).min(max_x);
    let y1 = (y0 + 1).min(max_y);
    let fx = (x - x0 as f32).clamp(0.0, 1.0);
    let fy = (y - y0 as f32).clamp(0.0, 1.0);

    let p00 = premultiply(*image.get_pixel(x0, y0));
    let p10 = premultiply(*image.get_pixel(x1, y0));
    let p01 = premultiply(*image.get_pixel(x0, y1));
    let p11 = premultiply(*image.get_pixel(x1, y1));

    let mut out = [0.0; 4];
    for c in 0..4 {
        let top = p00[c] + (p10[c] - p00[c]) * fx;
        let bottom = p01[c] + (p11[c] - p01[c]) * fx;
        out[c] = top + (bottom - top) * fy;
    }
    out
}

fn blend_over(src: Premul, dst: Rgba<u8>) -> Rgba<u8> {
    let dst = premultiply(dst);
    let inv = 1.0 - src[3];
    let a = src[3] + dst[3] * inv;
    if a <= 0.0 {
        return Rgba([0, 0, 0, 0]);
    }
    let channel = |c: usize| {
        let premul = src[c] + dst[c] * inv;
        ((premul / a).clamp(0.0, 1.0) * 255.0).round() as u8
    };
    Rgba([
        channel(0),
        channel(1),
        channel(2),
        (a.clamp(0.0, 1.0) * 255.0).round() as u8,
    ])
}
