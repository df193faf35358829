//! Raw multi-pointer touch frames.
//!
//! A [`TouchEvent`] is one frame of pointer state: the action that produced
//! it plus the position of every pointer currently in contact. On `Up` the
//! lifting pointer is still listed; it is gone from the following frame.
//!
//! Browsers report pointers one at a time, so [`TouchStream`] keeps the set
//! of active pointers and assembles full frames from those reports.

use glam::Vec2;
use serde::{Deserialize, Serialize};

pub type PointerId = u32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TouchAction {
    /// A pointer made contact.
    Down(PointerId),
    /// One or more pointers moved.
    Move,
    /// A pointer lifted.
    Up(PointerId),
    /// The host aborted the whole touch sequence.
    Cancel,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TouchPoint {
    pub id: PointerId,
    pub position: Vec2,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TouchEvent {
    pub action: TouchAction,
    pub pointers: Vec<TouchPoint>,
    /// Monotonic timestamp in milliseconds.
    pub time_ms: u64,
}

impl TouchEvent {
    pub fn new(action: TouchAction, pointers: Vec<TouchPoint>, time_ms: u64) -> Self {
        Self {
            action,
            pointers,
            time_ms,
        }
    }

    /// Single-pointer frame, handy for hosts without multi-touch.
    pub fn single(action: TouchAction, id: PointerId, position: Vec2, time_ms: u64) -> Self {
        Self::new(action, vec![TouchPoint { id, position }], time_ms)
    }

    /// Position of pointer `id` in this frame.
    pub fn position_of(&self, id: PointerId) -> Option<Vec2> {
        self.pointers
            .iter()
            .find(|p| p.id == id)
            .map(|p| p.position)
    }

    pub fn pointer_count(&self) -> usize {
        self.pointers.len()
    }

    /// The first pointer of a new touch sequence went down.
    pub fn is_first_down(&self) -> bool {
        matches!(self.action, TouchAction::Down(_)) && self.pointers.len() <= 1
    }

    /// An additional pointer joined an ongoing sequence.
    pub fn is_extra_down(&self) -> bool {
        matches!(self.action, TouchAction::Down(_)) && self.pointers.len() > 1
    }

    /// The last pointer lifted, or the sequence was cancelled.
    pub fn ends_sequence(&self) -> bool {
        match self.action {
            TouchAction::Up(_) => self.pointers.len() <= 1,
            TouchAction::Cancel => true,
            _ => false,
        }
    }
}

/// Assembles frames from per-pointer reports.
#[derive(Debug, Default)]
pub struct TouchStream {
    active: Vec<TouchPoint>,
}

impl TouchStream {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active(&self) -> &[TouchPoint] {
        &self.active
    }

    /// Pointer `id` made contact at `position`.
    pub fn down(&mut self, id: PointerId, position: Vec2, time_ms: u64) -> TouchEvent {
        // A repeated down for a known id means we missed its up.
        self.active.retain(|p| p.id != id);
        self.active.push(TouchPoint { id, position });
        TouchEvent::new(TouchAction::Down(id), self.active.clone(), time_ms)
    }

    /// Pointer `id` moved. Unknown pointers (hover, missed down) yield `None`.
    pub fn move_to(&mut self, id: PointerId, position: Vec2, time_ms: u64) -> Option<TouchEvent> {
        let point = self.active.iter_mut().find(|p| p.id == id)?;
        point.position = position;
        Some(TouchEvent::new(
            TouchAction::Move,
            self.active.clone(),
            time_ms,
        ))
    }

    /// Pointer `id` lifted at `position`.
    pub fn up(&mut self, id: PointerId, position: Vec2, time_ms: u64) -> Option<TouchEvent> {
        let point = self.active.iter_mut().find(|p| p.id == id)?;
        point.position = position;
        let event = TouchEvent::new(TouchAction::Up(id), self.active.clone(), time_ms);
        self.active.retain(|p| p.id != id);
        Some(event)
    }

    /// Abort the sequence and forget every pointer.
    pub fn cancel(&mut self, time_ms: u64) -> TouchEvent {
        let pointers = std::mem::take(&mut self.active);
        TouchEvent::new(TouchAction::Cancel, pointers, time_ms)
    }
}
