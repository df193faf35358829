//! Image-to-screen view transform.
//!
//! # Coordinate System
//!
//! - Content space: pixels of the image as displayed, i.e. after any pending
//!   quarter-turn rotation, origin at the top-left corner
//! - Screen space: viewport pixels, origin at the top-left corner
//!
//! The transform only ever scales uniformly and translates. `zoom` is the
//! extra scale on top of the fitted ("centerized") scale and stays within
//! `[min_zoom, max_zoom]`.

use glam::{Affine2, Vec2};

use crate::config::ViewConfig;
use crate::geometry::{scale_about, Rect};
use crate::gesture::{pinch, GestureEvent};

#[derive(Debug, Clone)]
pub struct ViewTransform {
    config: ViewConfig,
    content: Vec2,
    viewport: Vec2,
    transform: Affine2,
    zoom: f32,
    zoomed_in: bool,
}

impl ViewTransform {
    pub fn new(config: ViewConfig) -> Self {
        Self {
            config,
            content: Vec2::ZERO,
            viewport: Vec2::ZERO,
            transform: Affine2::IDENTITY,
            zoom: 1.0,
            zoomed_in: false,
        }
    }

    pub fn config(&self) -> &ViewConfig {
        &self.config
    }

    /// Resize the viewport and refit the content.
    pub fn set_viewport(&mut self, width: f32, height: f32) {
        self.viewport = Vec2::new(width, height);
        self.centerize();
    }

    /// Replace the content size and refit it.
    pub fn set_content(&mut self, width: f32, height: f32) {
        self.content = Vec2::new(width, height);
        self.centerize();
    }

    pub fn viewport_size(&self) -> Vec2 {
        self.viewport
    }

    pub fn content_size(&self) -> Vec2 {
        self.content
    }

    /// Content-to-screen map.
    pub fn transform(&self) -> Affine2 {
        self.transform
    }

    pub fn zoom(&self) -> f32 {
        self.zoom
    }

    pub fn is_zoomed_in(&self) -> bool {
        self.zoomed_in
    }

    /// Screen rectangle covered by the content.
    pub fn image_box(&self) -> Rect {
        Rect::from_size(self.content.x, self.content.y).transformed(&self.transform)
    }

    /// Fit the content inside the viewport, centered, at zoom 1.0.
    ///
    /// Degenerate content or viewport sizes yield the identity transform.
    pub fn centerize(&mut self) {
        self.zoom = 1.0;
        self.zoomed_in = false;

        let degenerate = self.content.min_element() <= 0.0 || self.viewport.min_element() <= 0.0;
        if degenerate {
            self.transform = Affine2::IDENTITY;
            return;
        }

        let fit = (self.viewport / self.content).min_element();
        self.transform = Affine2::from_translation(self.viewport / 2.0)
            * Affine2::from_scale(Vec2::splat(fit))
            * Affine2::from_translation(-self.content / 2.0);
        tracing::debug!(fit, content = ?self.content, viewport = ?self.viewport, "view centerized");
    }

    /// Zoom by `factor` about the screen point `pivot`, within the zoom limits.
    pub fn scale(&mut self, factor: f32, pivot: Vec2) {
        let target = (self.zoom * factor).clamp(self.config.min_zoom, self.config.max_zoom);
        let applied = target / self.zoom;
        self.transform = scale_about(applied, pivot) * self.transform;
        self.zoom = target;
        self.constrain();
    }

    /// Pan by `delta` screen pixels.
    pub fn translate(&mut self, delta: Vec2) {
        self.transform = Affine2::from_translation(delta) * self.transform;
        self.constrain();
    }

    /// Switch between the fitted view and `zoom_on_factor`, keeping `pivot` fixed
    /// when zooming in.
    pub fn toggle_zoom(&mut self, pivot: Vec2) {
        if self.zoomed_in {
            self.centerize();
        } else {
            self.scale(self.config.zoom_on_factor / self.zoom, pivot);
            self.zoomed_in = true;
        }
    }

    /// Apply a recognized gesture. Taps are ignored.
    pub fn apply_gesture(&mut self, event: &GestureEvent) {
        match event {
            GestureEvent::Tap(_) => {}
            GestureEvent::DoubleTap(position) => self.toggle_zoom(*position),
            GestureEvent::Drag(info) => self.translate(info.current - info.previous),
            GestureEvent::DoubleDrag(a, b) => {
                let p = pinch(a, b);
                self.transform = Affine2::from_translation(p.pan) * self.transform;
                self.scale(p.scale, p.pivot);
            }
        }
    }

    /// Exchange content width and height around the current box center,
    /// keeping the scale. Used for pending quarter turns.
    pub fn swap_content_axes(&mut self) {
        let center = self.image_box().center();
        let scale = self.transform.matrix2.x_axis.x;
        self.content = Vec2::new(self.content.y, self.content.x);
        self.transform = Affine2::from_translation(center)
            * Affine2::from_scale(Vec2::splat(scale))
            * Affine2::from_translation(-self.content / 2.0);
    }

    pub fn content_to_screen(&self, point: Vec2) -> Vec2 {
        self.transform.transform_point2(point)
    }

    pub fn screen_to_content(&self, point: Vec2) -> Vec2 {
        self.transform.inverse().transform_point2(point)
    }

    // Slide the content back so each edge stays within the margin lines.
    fn constrain(&mut self) {
        let margin = self.config.margin_ratio * self.viewport.min_element();
        let near = Vec2::splat(margin);
        let far = self.viewport - margin;
        let image = self.image_box();

        let mut shift = Vec2::ZERO;
        if image.left > far.x {
            shift.x = far.x - image.left;
        } else if image.right < near.x {
            shift.x = near.x - image.right;
        }
        if image.top > far.y {
            shift.y = far.y - image.top;
        } else if image.bottom < near.y {
            shift.y = near.y - image.bottom;
        }

        if shift != Vec2::ZERO {
            self.transform = Affine2::from_translation(shift) * self.transform;
        }
    }
}


// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn size_strategy() -> impl Strategy<Value = (f32, f32)> {
        (1.0f32..4000.0, 1.0f32..4000.0)
    }

    proptest! {
        /// Property: centerize fits the content inside the viewport, touching two sides.
        #[test]
        fn prop_centerize_fits_viewport(
            content in size_strategy(),
            viewport in size_strategy(),
        ) {
            let mut v = ViewTransform::new(ViewConfig::default());
            v.set_viewport(viewport.0, viewport.1);
            v.set_content(content.0, content.1);
            let b = v.image_box();
            let tol = 1e-3 * viewport.0.max(viewport.1);

            prop_assert!(Rect::from_size(viewport.0, viewport.1).contains_rect(&b, tol), "box {:?} outside viewport", b);
            let touches = (b.width() - viewport.0).abs() <= tol || (b.height() - viewport.1).abs() <= tol;
            prop_assert!(touches, "box {:?} does not fill either axis", b);
            prop_assert!(
                (b.aspect_ratio() - content.0 / content.1).abs() <= 1e-3 * (content.0 / content.1),
                "aspect ratio changed"
            );
        }

        /// Property: zoom stays within limits under any sequence of scales.
        #[test]
        fn prop_zoom_stays_in_range(factors in prop::collection::vec(0.1f32..10.0, 1..20)) {
            let mut v = ViewTransform::new(ViewConfig::default());
            v.set_viewport(300.0, 300.0);
            v.set_content(600.0, 400.0);
            for f in factors {
                v.scale(f, Vec2::new(150.0, 150.0));
                prop_assert!(v.zoom() >= 0.5 - 1e-6 && v.zoom() <= 2.0 + 1e-6, "zoom {}", v.zoom());
            }
        }
    }
}
