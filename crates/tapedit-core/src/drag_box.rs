//! Axis-aligned drag box used by the crop tool.
//!
//! The box has nine anchors: four corners, four edges and the interior.
//! A drag moves the edges owned by the grabbed anchor, then the box is
//! re-adjusted against its bound, the minimum size and the aspect lock.
//!
//! # Adjustment
//!
//! 1. Clamp every edge to the bound
//! 2. Size = `max(current, min_box_size)` per axis, then shrink the
//!    dimension that is too long for a fixed ratio
//! 3. Programmatic sets and pure moves rebuild the box from its clamped
//!    top-left corner and slide it back inside the bound
//! 4. Resizes hold the edge opposite the anchor; edge anchors keep the other
//!    axis centered

use glam::Vec2;

use crate::config::DragBoxConfig;
use crate::geometry::{AspectRatio, GeometryError, Rect};
use crate::touch::{PointerId, TouchAction, TouchEvent};

/// Part of the box under a pointer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BoxAnchor {
    None,
    Left,
    Top,
    Right,
    Bottom,
    LeftTop,
    RightTop,
    LeftBottom,
    RightBottom,
    Center,
}

impl BoxAnchor {
    fn owns_left(self) -> bool {
        matches!(self, Self::Left | Self::LeftTop | Self::LeftBottom)
    }

    fn owns_right(self) -> bool {
        matches!(self, Self::Right | Self::RightTop | Self::RightBottom)
    }

    fn owns_top(self) -> bool {
        matches!(self, Self::Top | Self::LeftTop | Self::RightTop)
    }

    fn owns_bottom(self) -> bool {
        matches!(self, Self::Bottom | Self::LeftBottom | Self::RightBottom)
    }
}

#[derive(Debug, Clone, Copy)]
struct Tracking {
    pointer: PointerId,
    anchor: BoxAnchor,
    origin: Vec2,
    start: Rect,
}

/// Crop box controller.
#[derive(Debug, Clone)]
pub struct DragBox {
    config: DragBoxConfig,
    bound: Rect,
    rect: Rect,
    aspect: AspectRatio,
    tracking: Option<Tracking>,
}

impl DragBox {
    /// New controller with an unbounded clamp region and an empty box.
    pub fn new(config: DragBoxConfig) -> Self {
        Self {
            config,
            bound: Rect::new(
                f32::NEG_INFINITY,
                f32::NEG_INFINITY,
                f32::INFINITY,
                f32::INFINITY,
            ),
            rect: Rect::default(),
            aspect: AspectRatio::Free,
            tracking: None,
        }
    }

    pub fn config(&self) -> &DragBoxConfig {
        &self.config
    }

    pub fn bound(&self) -> Rect {
        self.bound
    }

    /// Set the clamp region and re-fit the box inside it.
    pub fn set_bound(&mut self, bound: Rect) -> Result<(), GeometryError> {
        self.bound = bound.validate()?;
        self.adjust(BoxAnchor::None);
        Ok(())
    }

    /// Replace the box; it is re-fitted to the bound, size floor and ratio.
    pub fn set_box(&mut self, rect: Rect) -> Result<(), GeometryError> {
        self.rect = rect.validate()?;
        self.adjust(BoxAnchor::None);
        Ok(())
    }

    /// The current box.
    pub fn current(&self) -> Rect {
        self.rect
    }

    pub fn aspect_ratio(&self) -> AspectRatio {
        self.aspect
    }

    /// Lock the box to `width:height`.
    pub fn set_fixed_aspect_ratio(&mut self, width: f32, height: f32) -> Result<(), GeometryError> {
        self.aspect = AspectRatio::fixed(width, height)?;
        self.adjust(BoxAnchor::None);
        Ok(())
    }

    pub fn set_free_aspect_ratio(&mut self) {
        self.aspect = AspectRatio::Free;
    }

    /// Whether a drag is in progress.
    pub fn is_tracking(&self) -> bool {
        self.tracking.is_some()
    }

    /// Anchor under `point`. Corners win over edges, edges over the interior.
    pub fn anchor_at(&self, point: Vec2) -> BoxAnchor {
        let anchor = self.config.anchor_size;
        let x = point.x - self.rect.left;
        let y = point.y - self.rect.top;
        let w = self.rect.width();
        let h = self.rect.height();

        if x < -anchor || x > w + anchor || y < -anchor || y > h + anchor {
            return BoxAnchor::None;
        }

        let near_left = x <= anchor && x <= w / 2.0;
        let near_right = x >= w - anchor && x >= w / 2.0;
        let near_top = y <= anchor && y <= h / 2.0;
        let near_bottom = y >= h - anchor && y >= h / 2.0;

        match (near_left, near_right, near_top, near_bottom) {
            (true, _, true, _) => BoxAnchor::LeftTop,
            (true, _, _, true) => BoxAnchor::LeftBottom,
            (true, _, _, _) => BoxAnchor::Left,
            (_, true, true, _) => BoxAnchor::RightTop,
            (_, true, _, true) => BoxAnchor::RightBottom,
            (_, true, _, _) => BoxAnchor::Right,
            (_, _, true, _) => BoxAnchor::Top,
            (_, _, _, true) => BoxAnchor::Bottom,
            _ => BoxAnchor::Center,
        }
    }

    /// Feed one touch frame.
    ///
    /// Returns `true` when the frame was consumed by a drag on the box.
    pub fn handle_touch(&mut self, event: &TouchEvent) -> bool {
        match event.action {
            TouchAction::Down(id) if event.is_first_down() => {
                let Some(position) = event.position_of(id) else {
                    return false;
                };
                let anchor = self.anchor_at(position);
                if anchor == BoxAnchor::None {
                    return false;
                }
                tracing::debug!(?anchor, "crop box drag started");
                self.tracking = Some(Tracking {
                    pointer: id,
                    anchor,
                    origin: position,
                    start: self.rect,
                });
                true
            }
            TouchAction::Down(_) => {
                // Multi-touch is not supported on the crop box
                self.tracking = None;
                false
            }
            TouchAction::Move => {
                let Some(tracking) = self.tracking else {
                    return false;
                };
                match event.position_of(tracking.pointer) {
                    Some(position) => {
                        self.drag(tracking, position - tracking.origin);
                        true
                    }
                    None => {
                        self.tracking = None;
                        false
                    }
                }
            }
            TouchAction::Up(_) => self.tracking.take().is_some(),
            TouchAction::Cancel => {
                self.tracking = None;
                false
            }
        }
    }

    fn drag(&mut self, tracking: Tracking, delta: Vec2) {
        let start = tracking.start;
        let anchor = tracking.anchor;

        if anchor == BoxAnchor::Center {
            self.rect = start.translated(delta);
        } else {
            if anchor.owns_left() {
                self.rect.left = (start.left + delta.x).min(start.right);
            }
            if anchor.owns_right() {
                self.rect.right = (start.right + delta.x).max(start.left);
            }
            if anchor.owns_top() {
                self.rect.top = (start.top + delta.y).min(start.bottom);
            }
            if anchor.owns_bottom() {
                self.rect.bottom = (start.bottom + delta.y).max(start.top);
            }
        }
        self.adjust(anchor);
    }

    fn adjust(&mut self, anchor: BoxAnchor) {
        let bound = self.bound;
        let r = &mut self.rect;
        // A move never changes the size, so it is measured before clamping
        let unclamped = *r;

        r.left = r.left.max(bound.left);
        r.top = r.top.max(bound.top);
        r.right = r.right.min(bound.right);
        r.bottom = r.bottom.min(bound.bottom);

        let min = self.config.min_box_size;
        let measured = if anchor == BoxAnchor::Center { &unclamped } else { &*r };
        let (width, height) = self
            .aspect
            .fit(measured.width().max(min), measured.height().max(min));

        match anchor {
            BoxAnchor::None | BoxAnchor::Center => {
                r.right = r.left + width;
                r.bottom = r.top + height;
                if r.left < bound.left {
                    r.left = bound.left;
                    r.right = bound.left + width;
                }
                if r.top < bound.top {
                    r.top = bound.top;
                    r.bottom = bound.top + height;
                }
                if r.right > bound.right {
                    r.right = bound.right;
                    r.left = bound.right - width;
                }
                if r.bottom > bound.bottom {
                    r.bottom = bound.bottom;
                    r.top = bound.bottom - height;
                }
            }
            _ => {
                if anchor.owns_top() {
                    r.top = r.bottom - height;
                } else if anchor.owns_bottom() {
                    r.bottom = r.top + height;
                } else {
                    let cy = (r.top + r.bottom) / 2.0;
                    r.top = cy - height / 2.0;
                    r.bottom = cy + height / 2.0;
                }

                if anchor.owns_left() {
                    r.left = r.right - width;
                } else if anchor.owns_right() {
                    r.right = r.left + width;
                } else {
                    let cx = (r.left + r.right) / 2.0;
                    r.left = cx - width / 2.0;
                    r.right = cx + width / 2.0;
                }
            }
        }
    }
}


// ============================================================================
// Property-Based Tests
// ============================================================================
