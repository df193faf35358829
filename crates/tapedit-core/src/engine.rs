//! Image edit engine.
//!
//! Owns the working bitmap plus the edits that have not been baked into it
//! yet: a pending orientation (quarter turns and flips) and pending color
//! adjustments. Pending edits are only previewed by [`EditEngine::render`];
//! [`EditEngine::commit`] bakes them into a new bitmap.
//!
//! # Coordinate Spaces
//!
//! - Image space: pixels of the working bitmap
//! - Content space: image space after the pending orientation
//! - Screen space: viewport pixels, via the [`ViewTransform`]

use glam::{Affine2, Vec2};
use image::imageops;
use image::RgbaImage;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::adjustments::{apply_adjustments, Adjustments};
use crate::config::ViewConfig;
use crate::encode::{encode_png, EncodeError};
use crate::geometry::{Rect, RotatedRect};
use crate::gesture::GestureEvent;
use crate::render::RenderSurface;
use crate::text::{draw_text, TextStyle};
use crate::view::ViewTransform;

/// Errors from editing operations.
#[derive(Debug, Error)]
pub enum EditError {
    /// Rotations must be whole quarter turns.
    #[error("rotation must be a multiple of 90 degrees, got {0}")]
    InvalidRotation(i32),

    /// The operation needs an open image.
    #[error("no image is open")]
    NoImage,

    #[error(transparent)]
    Encode(#[from] EncodeError),
}

/// Quarter-turn rotation and flips waiting to be baked.
///
/// Flips are expressed in pre-rotation pixel space: the bitmap is flipped
/// first, then rotated clockwise by `rotation` degrees.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PendingOrientation {
    /// Clockwise rotation: 0, 90, 180 or 270.
    pub rotation: u16,
    pub flip_horizontal: bool,
    pub flip_vertical: bool,
}

impl PendingOrientation {
    pub fn is_identity(&self) -> bool {
        *self == Self::default()
    }

    /// Whether the displayed image has width and height exchanged.
    pub fn swaps_axes(&self) -> bool {
        self.rotation % 180 == 90
    }

    /// Size of a `width` x `height` bitmap once oriented.
    pub fn oriented_size(&self, width: u32, height: u32) -> (u32, u32) {
        if self.swaps_axes() {
            (height, width)
        } else {
            (width, height)
        }
    }

    /// Map from bitmap pixels to oriented content pixels.
    pub fn matrix(&self, width: f32, height: f32) -> Affine2 {
        let flip = Affine2::from_translation(Vec2::new(
            if self.flip_horizontal { width } else { 0.0 },
            if self.flip_vertical { height } else { 0.0 },
        )) * Affine2::from_scale(Vec2::new(
            if self.flip_horizontal { -1.0 } else { 1.0 },
            if self.flip_vertical { -1.0 } else { 1.0 },
        ));
        let oriented = Affine2::from_angle(f32::from(self.rotation).to_radians()) * flip;
        let bounds = Rect::from_size(width, height).transformed(&oriented);
        // Snap away float noise from the rotation so quarter turns stay pixel exact
        let offset = (-bounds.top_left()).round();
        Affine2::from_translation(offset) * oriented
    }

    /// Bake the orientation into a new bitmap.
    pub fn apply(&self, image: &RgbaImage) -> RgbaImage {
        let mut out = image.clone();
        if self.flip_horizontal {
            imageops::flip_horizontal_in_place(&mut out);
        }
        if self.flip_vertical {
            imageops::flip_vertical_in_place(&mut out);
        }
        match self.rotation {
            90 => imageops::rotate90(&out),
            180 => imageops::rotate180(&out),
            270 => imageops::rotate270(&out),
            _ => out,
        }
    }
}

/// The working image, its pending edits and the view onto it.
#[derive(Debug, Clone)]
pub struct EditEngine {
    image: RgbaImage,
    pending: PendingOrientation,
    adjustments: Adjustments,
    view: ViewTransform,
    // Adjusted copy of `image` shown while adjustments are pending
    preview: Option<RgbaImage>,
}

impl EditEngine {
    pub fn new(config: ViewConfig) -> Self {
        Self {
            image: RgbaImage::new(0, 0),
            pending: PendingOrientation::default(),
            adjustments: Adjustments::default(),
            view: ViewTransform::new(config),
            preview: None,
        }
    }

    /// Replace the working image and drop every pending edit.
    pub fn open(&mut self, image: RgbaImage) {
        tracing::info!(width = image.width(), height = image.height(), "image opened");
        self.replace_image(image);
    }

    pub fn has_image(&self) -> bool {
        self.image.width() > 0 && self.image.height() > 0
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    pub fn view(&self) -> &ViewTransform {
        &self.view
    }

    /// Screen rectangle the displayed image occupies.
    pub fn image_box(&self) -> Rect {
        self.view.image_box()
    }

    pub fn zoom(&self) -> f32 {
        self.view.zoom()
    }

    pub fn pending_orientation(&self) -> PendingOrientation {
        self.pending
    }

    pub fn adjustments(&self) -> Adjustments {
        self.adjustments
    }

    pub fn set_viewport(&mut self, width: f32, height: f32) {
        self.view.set_viewport(width, height);
    }

    /// Pan or zoom the view.
    pub fn apply_gesture(&mut self, event: &GestureEvent) {
        self.view.apply_gesture(event);
    }

    /// Queue a clockwise rotation of `angle` degrees.
    ///
    /// # Errors
    ///
    /// Returns `EditError::InvalidRotation` unless `angle` is a multiple of 90.
    pub fn rotate(&mut self, angle: i32) -> Result<(), EditError> {
        if angle % 90 != 0 {
            return Err(EditError::InvalidRotation(angle));
        }
        let quarter = angle.rem_euclid(360);
        if quarter == 0 {
            return Ok(());
        }
        // `quarter` is 90, 180 or 270 here
        self.pending.rotation = (self.pending.rotation + quarter as u16) % 360;
        if quarter % 180 == 90 {
            self.view.swap_content_axes();
        }
        Ok(())
    }

    /// Mirror the displayed image left to right.
    pub fn flip_horizontal(&mut self) {
        if self.pending.swaps_axes() {
            self.pending.flip_vertical = !self.pending.flip_vertical;
        } else {
            self.pending.flip_horizontal = !self.pending.flip_horizontal;
        }
    }

    /// Mirror the displayed image top to bottom.
    pub fn flip_vertical(&mut self) {
        if self.pending.swaps_axes() {
            self.pending.flip_horizontal = !self.pending.flip_horizontal;
        } else {
            self.pending.flip_vertical = !self.pending.flip_vertical;
        }
    }

    /// Replace the pending color adjustments (limited to [-100, 100]).
    pub fn set_adjustments(&mut self, adjustments: Adjustments) {
        let adjustments = adjustments.clamped();
        if adjustments != self.adjustments {
            self.adjustments = adjustments;
            self.preview = None;
        }
    }

    /// Bake pending orientation and adjustments into the working image.
    pub fn commit(&mut self) {
        if self.pending.is_identity() && self.adjustments.is_default() {
            return;
        }
        tracing::debug!(pending = ?self.pending, adjustments = ?self.adjustments, "committing edits");
        let baked = self.baked_image();
        self.replace_image(baked);
    }

    /// Drop pending edits without touching pixels.
    pub fn discard(&mut self) {
        self.pending = PendingOrientation::default();
        self.adjustments = Adjustments::default();
        self.preview = None;
        self.view
            .set_content(self.image.width() as f32, self.image.height() as f32);
    }

    /// The working image with every pending edit applied.
    pub fn baked_image(&self) -> RgbaImage {
        let mut image = if self.pending.is_identity() {
            self.image.clone()
        } else {
            self.pending.apply(&self.image)
        };
        apply_adjustments(&mut image, &self.adjustments);
        image
    }

    /// Cut the image down to the screen rectangle `screen_rect`.
    ///
    /// The rectangle is read against the view as displayed, then pending
    /// edits are committed. The region is rounded to whole pixels and
    /// clamped to the image, keeping at least one pixel.
    pub fn crop(&mut self, screen_rect: Rect) -> Result<(), EditError> {
        if !self.has_image() {
            return Err(EditError::NoImage);
        }
        // Displayed content pixels are the committed bitmap's pixels
        let region = self.screen_to_image(screen_rect);
        self.commit();

        let (width, height) = self.image.dimensions();
        let left = (region.left.round().max(0.0) as u32).min(width - 1);
        let top = (region.top.round().max(0.0) as u32).min(height - 1);
        let right = (region.right.round().max(0.0) as u32).clamp(left + 1, width);
        let bottom = (region.bottom.round().max(0.0) as u32).clamp(top + 1, height);

        tracing::debug!(left, top, right, bottom, "cropping");
        let cropped = imageops::crop_imm(&self.image, left, top, right - left, bottom - top).to_image();
        self.replace_image(cropped);
        Ok(())
    }

    /// Draw `content` into the image inside a rotated screen rectangle.
    ///
    /// Pending edits are committed first so the text lands on what the user sees.
    pub fn draw_text(
        &mut self,
        content: &str,
        style: &TextStyle,
        screen_rect: &RotatedRect,
    ) -> Result<(), EditError> {
        if !self.has_image() {
            return Err(EditError::NoImage);
        }
        let rect = self.screen_to_image_rotated(screen_rect);
        self.commit();
        draw_text(&mut self.image, content, style, &rect);
        self.preview = None;
        Ok(())
    }

    /// Screen rectangle to content pixels.
    pub fn screen_to_image(&self, rect: Rect) -> Rect {
        let (origin, scale) = self.screen_mapping();
        Rect::new(
            (rect.left - origin.x) / scale.x,
            (rect.top - origin.y) / scale.y,
            (rect.right - origin.x) / scale.x,
            (rect.bottom - origin.y) / scale.y,
        )
    }

    /// Content pixels to a screen rectangle.
    pub fn image_to_screen(&self, rect: Rect) -> Rect {
        let (origin, scale) = self.screen_mapping();
        Rect::new(
            rect.left * scale.x + origin.x,
            rect.top * scale.y + origin.y,
            rect.right * scale.x + origin.x,
            rect.bottom * scale.y + origin.y,
        )
    }

    /// Rotated screen rectangle to content pixels; the angle is unchanged.
    pub fn screen_to_image_rotated(&self, rect: &RotatedRect) -> RotatedRect {
        let (origin, scale) = self.screen_mapping();
        RotatedRect::new(
            (rect.center - origin) / scale,
            rect.width / scale.x,
            rect.height / scale.y,
            rect.angle,
        )
    }

    // Top-left of the image box and screen pixels per content pixel
    fn screen_mapping(&self) -> (Vec2, Vec2) {
        let image_box = self.view.image_box();
        let content = self.view.content_size();
        let scale = if content.min_element() > 0.0 && image_box.size().min_element() > 0.0 {
            image_box.size() / content
        } else {
            Vec2::ONE
        };
        (image_box.top_left(), scale)
    }

    /// Paint the image with pending edits previewed.
    pub fn render<S: RenderSurface + ?Sized>(&mut self, surface: &mut S) {
        if !self.has_image() {
            return;
        }
        let orientation = self
            .pending
            .matrix(self.image.width() as f32, self.image.height() as f32);
        let transform = self.view.transform() * orientation;

        if self.adjustments.is_default() {
            surface.draw_image(&self.image, transform);
            return;
        }
        let image = &self.image;
        let adjustments = self.adjustments;
        let preview = self.preview.get_or_insert_with(|| {
            let mut copy = image.clone();
            apply_adjustments(&mut copy, &adjustments);
            copy
        });
        surface.draw_image(preview, transform);
    }

    /// Encode the image, pending edits included, as PNG.
    pub fn export_png(&self) -> Result<Vec<u8>, EditError> {
        if !self.has_image() {
            return Err(EditError::NoImage);
        }
        Ok(encode_png(&self.baked_image())?)
    }

    fn replace_image(&mut self, image: RgbaImage) {
        self.view
            .set_content(image.width() as f32, image.height() as f32);
        self.image = image;
        self.pending = PendingOrientation::default();
        self.adjustments = Adjustments::default();
        self.preview = None;
    }
}


// =============================================================================
// Property-Based Tests
// =============================================================================
