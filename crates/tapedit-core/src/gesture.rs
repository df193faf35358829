//! Tap, double-tap, drag and two-finger drag recognition.
//!
//! # States
//!
//! ```text
//! None --first down--> SingleDown --second down--> DoubleDown
//!                          ^                           |
//!                          |                     one pointer up
//!                          |                           v
//!                          +------(moves drag)------ DoubleUp
//! ```
//!
//! Lifting the last pointer, cancelling, or losing a tracked pointer from a
//! frame returns to `None`. Once two pointers have been latched, a third is
//! ignored, and after one of them lifts no new pointer re-enters two-finger
//! mode until the sequence ends.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::config::GestureConfig;
use crate::touch::{PointerId, TouchAction, TouchEvent};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum GestureState {
    #[default]
    None,
    SingleDown,
    DoubleDown,
    DoubleUp,
}

/// Positions of one tracked pointer during a drag.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointerDragInfo {
    pub current: Vec2,
    /// Position reported by the previous drag event.
    pub previous: Vec2,
    /// Position when the pointer went down.
    pub origin: Vec2,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum GestureEvent {
    Tap(Vec2),
    DoubleTap(Vec2),
    Drag(PointerDragInfo),
    DoubleDrag(PointerDragInfo, PointerDragInfo),
}

/// Incremental pan and zoom derived from a two-finger drag.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pinch {
    /// Movement of the midpoint between the two pointers.
    pub pan: Vec2,
    /// Ratio of the current to the previous pointer distance.
    pub scale: f32,
    /// Current midpoint, the fixed point of the zoom.
    pub pivot: Vec2,
}

/// Pan and zoom between the previous and current positions of two pointers.
///
/// The scale is 1.0 when the previous distance is zero.
pub fn pinch(a: &PointerDragInfo, b: &PointerDragInfo) -> Pinch {
    let mid_previous = (a.previous + b.previous) / 2.0;
    let mid_current = (a.current + b.current) / 2.0;
    let distance_previous = a.previous.distance(b.previous);
    let distance_current = a.current.distance(b.current);

    let scale = if distance_previous > 0.0 {
        distance_current / distance_previous
    } else {
        1.0
    };

    Pinch {
        pan: mid_current - mid_previous,
        scale,
        pivot: mid_current,
    }
}

#[derive(Debug, Clone, Copy)]
struct Tracked {
    id: PointerId,
    position: Vec2,
    origin: Vec2,
}

impl Tracked {
    fn new(id: PointerId, position: Vec2) -> Self {
        Self {
            id,
            position,
            origin: position,
        }
    }

    fn advance(&mut self, current: Vec2) -> PointerDragInfo {
        let info = PointerDragInfo {
            current,
            previous: self.position,
            origin: self.origin,
        };
        self.position = current;
        info
    }
}

/// Gesture state machine fed with raw touch frames.
#[derive(Debug, Clone)]
pub struct GestureRecognizer {
    config: GestureConfig,
    state: GestureState,
    primary: Option<Tracked>,
    secondary: Option<Tracked>,
    /// Time of a first contact that may still become a double-tap.
    tap_latch_ms: Option<u64>,
}

impl GestureRecognizer {
    pub fn new(config: GestureConfig) -> Self {
        Self {
            config,
            state: GestureState::None,
            primary: None,
            secondary: None,
            tap_latch_ms: None,
        }
    }

    pub fn state(&self) -> GestureState {
        self.state
    }

    /// Drop any in-progress gesture.
    pub fn reset(&mut self) {
        self.state = GestureState::None;
        self.primary = None;
        self.secondary = None;
    }

    /// Feed one frame, returning the recognized gesture if any.
    pub fn handle(&mut self, event: &TouchEvent) -> Option<GestureEvent> {
        match event.action {
            TouchAction::Down(id) if event.is_first_down() => {
                let position = event.position_of(id)?;
                self.state = GestureState::SingleDown;
                self.primary = Some(Tracked::new(id, position));
                self.secondary = None;

                let interval = self.config.double_tap_interval_ms;
                let is_double = self
                    .tap_latch_ms
                    .is_some_and(|t| event.time_ms.saturating_sub(t) <= interval);
                if is_double {
                    self.tap_latch_ms = None;
                    Some(GestureEvent::DoubleTap(position))
                } else {
                    self.tap_latch_ms = Some(event.time_ms);
                    Some(GestureEvent::Tap(position))
                }
            }
            TouchAction::Down(id) => {
                if self.state == GestureState::SingleDown {
                    if let Some(position) = event.position_of(id) {
                        self.secondary = Some(Tracked::new(id, position));
                        self.state = GestureState::DoubleDown;
                    }
                }
                None
            }
            TouchAction::Move => self.handle_move(event),
            TouchAction::Up(id) => {
                if event.ends_sequence() {
                    self.reset();
                    return None;
                }
                match self.state {
                    GestureState::DoubleDown => {
                        let primary_up = self.primary.is_some_and(|p| p.id == id);
                        let secondary_up = self.secondary.is_some_and(|p| p.id == id);
                        if primary_up {
                            self.primary = self.secondary.take();
                            self.state = GestureState::DoubleUp;
                        } else if secondary_up {
                            self.secondary = None;
                            self.state = GestureState::DoubleUp;
                        }
                    }
                    GestureState::SingleDown | GestureState::DoubleUp => {
                        if self.primary.is_some_and(|p| p.id == id) {
                            self.reset();
                        }
                    }
                    GestureState::None => {}
                }
                None
            }
            TouchAction::Cancel => {
                self.reset();
                None
            }
        }
    }

    fn handle_move(&mut self, event: &TouchEvent) -> Option<GestureEvent> {
        match self.state {
            GestureState::SingleDown | GestureState::DoubleUp => {
                let id = self.primary?.id;
                let Some(current) = event.position_of(id) else {
                    tracing::debug!("tracked pointer vanished; ending gesture");
                    self.reset();
                    return None;
                };
                let primary = self.primary.as_mut()?;
                Some(GestureEvent::Drag(primary.advance(current)))
            }
            GestureState::DoubleDown => {
                let (Some(first), Some(second)) = (self.primary, self.secondary) else {
                    self.reset();
                    return None;
                };
                let (Some(a), Some(b)) = (event.position_of(first.id), event.position_of(second.id))
                else {
                    tracing::debug!("tracked pointer vanished; ending two-finger gesture");
                    self.reset();
                    return None;
                };
                let info_a = self.primary.as_mut()?.advance(a);
                let info_b = self.secondary.as_mut()?.advance(b);
                Some(GestureEvent::DoubleDrag(info_a, info_b))
            }
            GestureState::None => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::touch::TouchStream;

    fn recognizer() -> GestureRecognizer {
        GestureRecognizer::new(GestureConfig::default())
    }

    fn v(x: f32, y: f32) -> Vec2 {
        Vec2::new(x, y)
    }

    #[test]
    fn test_tap_then_double_tap() {
        let mut g = recognizer();
        let mut s = TouchStream::new();

        assert_eq!(g.handle(&s.down(0, v(5.0, 5.0), 0)), Some(GestureEvent::Tap(v(5.0, 5.0))));
        assert_eq!(g.state(), GestureState::SingleDown);
        g.handle(&s.up(0, v(5.0, 5.0), 50).unwrap());
        assert_eq!(g.state(), GestureState::None);

        assert_eq!(
            g.handle(&s.down(0, v(6.0, 6.0), 200)),
            Some(GestureEvent::DoubleTap(v(6.0, 6.0)))
        );
        g.handle(&s.up(0, v(6.0, 6.0), 250).unwrap());

        // The latch was consumed, so a third quick tap is a plain tap
        assert_eq!(g.handle(&s.down(0, v(6.0, 6.0), 300)), Some(GestureEvent::Tap(v(6.0, 6.0))));
    }

    #[test]
    fn test_slow_second_tap_is_tap() {
        let mut g = recognizer();
        let mut s = TouchStream::new();
        g.handle(&s.down(0, v(0.0, 0.0), 0));
        g.handle(&s.up(0, v(0.0, 0.0), 10).unwrap());
        assert!(matches!(g.handle(&s.down(0, v(0.0, 0.0), 301)), Some(GestureEvent::Tap(_))));
    }

    #[test]
    fn test_single_drag_reports_previous_and_origin() {
        let mut g = recognizer();
        let mut s = TouchStream::new();
        g.handle(&s.down(0, v(0.0, 0.0), 0));
        g.handle(&s.move_to(0, v(10.0, 0.0), 10).unwrap());
        let event = g.handle(&s.move_to(0, v(25.0, 5.0), 20).unwrap());
        assert_eq!(
            event,
            Some(GestureEvent::Drag(PointerDragInfo {
                current: v(25.0, 5.0),
                previous: v(10.0, 0.0),
                origin: v(0.0, 0.0),
            }))
        );
    }

    #[test]
    fn test_two_pointer_drag_and_pinch() {
        let mut g = recognizer();
        let mut s = TouchStream::new();
        g.handle(&s.down(0, v(0.0, 0.0), 0));
        g.handle(&s.down(1, v(100.0, 0.0), 5));
        assert_eq!(g.state(), GestureState::DoubleDown);

        s.move_to(0, v(10.0, 10.0), 10);
        let event = g.handle(&s.move_to(1, v(90.0, 10.0), 10).unwrap());
        let Some(GestureEvent::DoubleDrag(a, b)) = event else {
            panic!("expected a two-finger drag, got {event:?}");
        };
        let p = pinch(&a, &b);
        assert_eq!(p.pan, v(0.0, 10.0));
        assert!((p.scale - 0.8).abs() < 1e-6);
        assert_eq!(p.pivot, v(50.0, 10.0));
    }

    #[test]
    fn test_pinch_with_coincident_pointers_keeps_scale() {
        let a = PointerDragInfo {
            current: v(1.0, 0.0),
            previous: v(0.0, 0.0),
            origin: v(0.0, 0.0),
        };
        let b = PointerDragInfo {
            current: v(3.0, 0.0),
            previous: v(0.0, 0.0),
            origin: v(0.0, 0.0),
        };
        assert_eq!(pinch(&a, &b).scale, 1.0);
    }

    #[test]
    fn test_third_pointer_is_ignored() {
        let mut g = recognizer();
        let mut s = TouchStream::new();
        g.handle(&s.down(0, v(0.0, 0.0), 0));
        g.handle(&s.down(1, v(100.0, 0.0), 0));
        g.handle(&s.down(2, v(50.0, 50.0), 0));
        assert_eq!(g.state(), GestureState::DoubleDown);
        let event = g.handle(&s.move_to(2, v(60.0, 60.0), 10).unwrap());
        let Some(GestureEvent::DoubleDrag(a, b)) = event else {
            panic!("expected a two-finger drag");
        };
        assert_eq!(a.current, v(0.0, 0.0));
        assert_eq!(b.current, v(100.0, 0.0));
    }

    #[test]
    fn test_survivor_continues_without_jump() {
        let mut g = recognizer();
        let mut s = TouchStream::new();
        g.handle(&s.down(0, v(0.0, 0.0), 0));
        g.handle(&s.down(1, v(100.0, 0.0), 0));
        g.handle(&s.move_to(1, v(120.0, 0.0), 10).unwrap());

        // The first pointer lifts; the second keeps driving a single drag
        g.handle(&s.up(0, v(0.0, 0.0), 20).unwrap());
        assert_eq!(g.state(), GestureState::DoubleUp);

        let event = g.handle(&s.move_to(1, v(130.0, 0.0), 30).unwrap());
        let Some(GestureEvent::Drag(info)) = event else {
            panic!("expected a drag");
        };
        assert_eq!(info.previous, v(120.0, 0.0));
        assert_eq!(info.current, v(130.0, 0.0));
        assert_eq!(info.origin, v(100.0, 0.0));

        // No return to two-finger mode in the same sequence
        g.handle(&s.down(3, v(10.0, 10.0), 40));
        assert_eq!(g.state(), GestureState::DoubleUp);

        g.handle(&s.up(1, v(130.0, 0.0), 50).unwrap());
        g.handle(&s.up(3, v(10.0, 10.0), 60).unwrap());
        assert_eq!(g.state(), GestureState::None);
    }

    #[test]
    fn test_missing_pointer_ends_gesture() {
        let mut g = recognizer();
        g.handle(&TouchEvent::single(TouchAction::Down(4), 4, v(0.0, 0.0), 0));
        let stray = TouchEvent::single(TouchAction::Move, 9, v(5.0, 5.0), 10);
        assert_eq!(g.handle(&stray), None);
        assert_eq!(g.state(), GestureState::None);
    }

    #[test]
    fn test_cancel_resets() {
        let mut g = recognizer();
        let mut s = TouchStream::new();
        g.handle(&s.down(0, v(0.0, 0.0), 0));
        g.handle(&s.down(1, v(1.0, 1.0), 0));
        g.handle(&s.cancel(5));
        assert_eq!(g.state(), GestureState::None);
        assert_eq!(g.handle(&TouchEvent::single(TouchAction::Move, 0, v(2.0, 2.0), 6)), None);
    }
}
