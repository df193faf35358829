//! Rotatable, resizable box used to place text.
//!
//! # Anchors
//!
//! Hit testing happens in the box's local frame (the touch point rotated by
//! `-angle` about the center). Each axis is split into start, middle and end
//! bands at `±(half extent - anchor_size)`, giving nine zones; the middle
//! zone translates the box. A square handle of half-size `anchor_size`,
//! `rotation_distance` below the bottom edge, rotates it.
//!
//! # Resizing
//!
//! The drag delta is projected into the local frame. A start anchor grows
//! its axis when dragged toward the start side, an end anchor when dragged
//! toward the end side, and a middle anchor ignores that component. The center then shifts by half the
//! size change along the rotated axes so the opposite edges stay put.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::config::RotatableBoxConfig;
use crate::geometry::{rotate_point, signed_angle_degrees, AspectRatio, GeometryError, RotatedRect};
use crate::touch::{PointerId, TouchAction, TouchEvent};

/// Band along one local axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AxisAnchor {
    Start,
    Middle,
    End,
}

impl AxisAnchor {
    fn classify(offset: f32, half_extent: f32, anchor_size: f32) -> Self {
        let inner = half_extent - anchor_size;
        if offset <= -inner {
            Self::Start
        } else if offset >= inner {
            Self::End
        } else {
            Self::Middle
        }
    }

    /// Sign applied to the size change of this axis when correcting the center.
    fn sign(self) -> f32 {
        match self {
            Self::Start => -1.0,
            Self::Middle => 0.0,
            Self::End => 1.0,
        }
    }
}

/// Part of the rotatable box under a pointer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RotatableAnchor {
    None,
    Rotation,
    Zone {
        horizontal: AxisAnchor,
        vertical: AxisAnchor,
    },
}

impl RotatableAnchor {
    pub const TRANSLATE: Self = Self::Zone {
        horizontal: AxisAnchor::Middle,
        vertical: AxisAnchor::Middle,
    };
}

/// Notifications queued for the owner.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum BoxEvent {
    /// The box moved, resized or rotated.
    Updated(RotatedRect),
    /// Two hitting contacts arrived within the double-tap interval.
    DoubleTap(Vec2),
}

#[derive(Debug, Clone, Copy)]
struct Tracking {
    pointer: PointerId,
    anchor: RotatableAnchor,
    origin: Vec2,
    start: RotatedRect,
}

/// Text box controller.
#[derive(Debug, Clone)]
pub struct RotatableBox {
    config: RotatableBoxConfig,
    rect: RotatedRect,
    aspect: AspectRatio,
    tracking: Option<Tracking>,
    /// Time of the last contact that hit the box, for double-tap detection.
    last_hit_ms: Option<u64>,
    claimed: bool,
    events: Vec<BoxEvent>,
}

impl RotatableBox {
    pub fn new(config: RotatableBoxConfig) -> Self {
        let size = config.min_rect_size;
        Self {
            config,
            rect: RotatedRect::new(Vec2::ZERO, size, size, 0.0),
            aspect: AspectRatio::Free,
            tracking: None,
            last_hit_ms: None,
            claimed: false,
            events: Vec::new(),
        }
    }

    pub fn config(&self) -> &RotatableBoxConfig {
        &self.config
    }

    pub fn rect(&self) -> RotatedRect {
        self.rect
    }

    pub fn aspect_ratio(&self) -> AspectRatio {
        self.aspect
    }

    pub fn set_rect(&mut self, rect: RotatedRect) {
        self.rect = rect;
        self.normalize();
    }

    pub fn set_angle(&mut self, angle: f32) {
        self.rect.angle = angle;
        self.normalize();
    }

    pub fn set_size(&mut self, width: f32, height: f32) {
        self.rect.width = width;
        self.rect.height = height;
        self.normalize();
    }

    pub fn set_center(&mut self, center: Vec2) {
        self.rect.center = center;
        self.normalize();
    }

    /// Lock to a single `width / height` value.
    pub fn set_fixed_ratio(&mut self, ratio: f32) -> Result<(), GeometryError> {
        self.aspect = AspectRatio::from_ratio(ratio)?;
        self.normalize();
        Ok(())
    }

    pub fn set_fixed_aspect_ratio(&mut self, width: f32, height: f32) -> Result<(), GeometryError> {
        self.aspect = AspectRatio::fixed(width, height)?;
        self.normalize();
        Ok(())
    }

    pub fn set_free_aspect_ratio(&mut self) {
        self.aspect = AspectRatio::Free;
        self.normalize();
    }

    /// Drain queued notifications.
    pub fn take_events(&mut self) -> Vec<BoxEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn is_tracking(&self) -> bool {
        self.tracking.is_some()
    }

    /// Center of the rotation handle in screen space.
    pub fn rotation_handle(&self) -> Vec2 {
        self.rect.to_world(Vec2::new(
            0.0,
            self.rect.height / 2.0 + self.config.rotation_distance,
        ))
    }

    /// Anchor under `point`.
    pub fn anchor_at(&self, point: Vec2) -> RotatableAnchor {
        let anchor = self.config.anchor_size;
        let local = self.rect.to_local(point);
        let half_w = self.rect.width / 2.0;
        let half_h = self.rect.height / 2.0;

        let handle = Vec2::new(0.0, half_h + self.config.rotation_distance);
        if (local - handle).abs().max_element() <= anchor {
            return RotatableAnchor::Rotation;
        }

        if local.x.abs() > half_w + anchor || local.y.abs() > half_h + anchor {
            return RotatableAnchor::None;
        }

        RotatableAnchor::Zone {
            horizontal: AxisAnchor::classify(local.x, half_w, anchor),
            vertical: AxisAnchor::classify(local.y, half_h, anchor),
        }
    }

    /// Feed one touch frame.
    ///
    /// Returns `true` while the current touch sequence belongs to the box.
    pub fn handle_touch(&mut self, event: &TouchEvent) -> bool {
        match event.action {
            TouchAction::Down(id) if event.is_first_down() => {
                self.tracking = None;
                let Some(position) = event.position_of(id) else {
                    self.claimed = false;
                    return false;
                };
                let anchor = self.anchor_at(position);
                if anchor == RotatableAnchor::None {
                    self.claimed = false;
                    return false;
                }
                self.claimed = true;

                let interval = self.config.double_tap_interval_ms;
                let double_tap = self
                    .last_hit_ms
                    .is_some_and(|last| event.time_ms.saturating_sub(last) <= interval);
                if double_tap {
                    self.last_hit_ms = None;
                    self.events.push(BoxEvent::DoubleTap(position));
                } else {
                    self.last_hit_ms = Some(event.time_ms);
                    self.tracking = Some(Tracking {
                        pointer: id,
                        anchor,
                        origin: position,
                        start: self.rect,
                    });
                }
                true
            }
            TouchAction::Down(_) => {
                // A second pointer aborts the gesture
                self.tracking = None;
                false
            }
            TouchAction::Move => {
                let Some(tracking) = self.tracking else {
                    return false;
                };
                let Some(position) = event.position_of(tracking.pointer) else {
                    self.tracking = None;
                    return false;
                };
                if tracking.anchor == RotatableAnchor::Rotation {
                    self.rotate(&tracking, position);
                } else {
                    self.drag(&tracking, position - tracking.origin);
                }
                self.events.push(BoxEvent::Updated(self.rect));
                true
            }
            TouchAction::Up(_) | TouchAction::Cancel => {
                self.tracking = None;
                std::mem::take(&mut self.claimed)
            }
        }
    }

    fn rotate(&mut self, tracking: &Tracking, point: Vec2) {
        let center = tracking.start.center;
        let turned = signed_angle_degrees(tracking.origin - center, point - center);
        self.rect.angle = tracking.start.angle + turned;
    }

    fn drag(&mut self, tracking: &Tracking, delta: Vec2) {
        let start = tracking.start;
        let RotatableAnchor::Zone {
            horizontal,
            vertical,
        } = tracking.anchor
        else {
            return;
        };

        if tracking.anchor == RotatableAnchor::TRANSLATE {
            self.rect.center = start.center + delta;
            return;
        }

        let mut local = rotate_point(delta, -start.angle, Vec2::ZERO);
        if horizontal == AxisAnchor::Middle {
            local.x = 0.0;
        }
        if vertical == AxisAnchor::Middle {
            local.y = 0.0;
        }

        let mut width = start.width + horizontal.sign() * local.x;
        let mut height = start.height + vertical.sign() * local.y;

        let min = self.config.min_rect_size;
        match self.aspect.ratio() {
            Some(ratio) => {
                if local.x.abs() >= local.y.abs() {
                    width = width.max(min).max(min * ratio);
                    height = width / ratio;
                } else {
                    height = height.max(min).max(min / ratio);
                    width = height * ratio;
                }
            }
            None => {
                width = width.max(min);
                height = height.max(min);
            }
        }

        let shift = start.width_axis() * (horizontal.sign() * (width - start.width) / 2.0)
            + start.height_axis() * (vertical.sign() * (height - start.height) / 2.0);

        self.rect = RotatedRect::new(start.center + shift, width, height, start.angle);
    }

    fn normalize(&mut self) {
        let min = self.config.min_rect_size;
        let (width, height) = self
            .aspect
            .fit(self.rect.width.max(min), self.rect.height.max(min));
        // Fitting may shrink one side under the floor; grow both back uniformly
        let grow = (min / width.min(height)).max(1.0);
        self.rect.width = width * grow;
        self.rect.height = height * grow;
        self.events.push(BoxEvent::Updated(self.rect));
    }
}


// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn rect_strategy() -> impl Strategy<Value = RotatedRect> {
        (
            -500.0f32..500.0,
            -500.0f32..500.0,
            100.0f32..400.0,
            100.0f32..400.0,
            -360.0f32..360.0,
        )
            .prop_map(|(x, y, w, h, a)| RotatedRect::new(Vec2::new(x, y), w, h, a))
    }

    /// Local-frame corner selectors: (sign x, sign y).
    fn corner_strategy() -> impl Strategy<Value = (f32, f32)> {
        prop_oneof![
            Just((-1.0, -1.0)),
            Just((1.0, -1.0)),
            Just((1.0, 1.0)),
            Just((-1.0, 1.0)),
        ]
    }

    fn delta_strategy() -> impl Strategy<Value = Vec2> {
        (-300.0f32..300.0, -300.0f32..300.0).prop_map(|(x, y)| Vec2::new(x, y))
    }

    fn drag_corner(c: &mut RotatableBox, sx: f32, sy: f32, delta: Vec2) -> Option<Vec2> {
        let r = c.rect();
        let grab = r.to_world(Vec2::new(sx * r.width / 2.0, sy * r.height / 2.0));
        let expected = RotatableAnchor::Zone {
            horizontal: if sx < 0.0 { AxisAnchor::Start } else { AxisAnchor::End },
            vertical: if sy < 0.0 { AxisAnchor::Start } else { AxisAnchor::End },
        };
        if c.anchor_at(grab) != expected {
            return None;
        }
        c.handle_touch(&TouchEvent::single(TouchAction::Down(0), 0, grab, 0));
        c.handle_touch(&TouchEvent::single(TouchAction::Move, 0, grab + delta, 16));
        // Opposite corner in world space
        Some(r.to_world(Vec2::new(-sx * r.width / 2.0, -sy * r.height / 2.0)))
    }

    proptest! {
        /// Property: resizing from a corner leaves the opposite corner in place.
        #[test]
        fn prop_corner_resize_pins_opposite_corner(
            rect in rect_strategy(),
            (sx, sy) in corner_strategy(),
            delta in delta_strategy(),
            locked in any::<bool>(),
        ) {
            let mut c = RotatableBox::new(RotatableBoxConfig::default());
            c.set_rect(rect);
            if locked {
                c.set_fixed_ratio(rect.width / rect.height).unwrap();
            }
            let Some(pinned) = drag_corner(&mut c, sx, sy, delta) else {
                return Ok(());
            };
            let r = c.rect();
            let now = r.to_world(Vec2::new(-sx * r.width / 2.0, -sy * r.height / 2.0));
            prop_assert!(
                (now - pinned).length() < 1e-2,
                "opposite corner moved from {:?} to {:?}", pinned, now
            );
        }

        /// Property: drags never shrink below the floor and keep a locked ratio.
        #[test]
        fn prop_resize_respects_floor_and_ratio(
            rect in rect_strategy(),
            (sx, sy) in corner_strategy(),
            delta in delta_strategy(),
            ratio in 0.25f32..4.0,
        ) {
            let mut c = RotatableBox::new(RotatableBoxConfig::default());
            c.set_rect(rect);
            c.set_fixed_ratio(ratio).unwrap();
            drag_corner(&mut c, sx, sy, delta);
            let r = c.rect();
            let min = c.config().min_rect_size;
            prop_assert!(r.width >= min - 1e-3, "width {} below floor", r.width);
            prop_assert!(r.height >= min - 1e-3, "height {} below floor", r.height);
            prop_assert!(
                (r.width / r.height - ratio).abs() <= ratio * 1e-3,
                "ratio {} != {}", r.width / r.height, ratio
            );
        }
    }
}
