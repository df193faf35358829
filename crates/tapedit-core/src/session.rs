//! Edit session: the root object a host talks to.
//!
//! The session owns the engine, the gesture recognizer and both box
//! controllers, and routes each touch sequence to exactly one of them. When
//! a sequence starts, the active tool's overlay (crop box or text box) gets
//! the first chance to claim it; an unclaimed sequence pans and zooms the
//! view instead.

use glam::Vec2;
use image::RgbaImage;
use serde::{Deserialize, Serialize};

use crate::adjustments::Adjustments;
use crate::config::EditorConfig;
use crate::drag_box::DragBox;
use crate::engine::{EditEngine, EditError};
use crate::geometry::{AspectRatio, GeometryError, Rect, RotatedRect};
use crate::gesture::{GestureEvent, GestureRecognizer};
use crate::io::IoOutcome;
use crate::render::RenderSurface;
use crate::rotatable_box::{BoxEvent, RotatableBox};
use crate::text::{measure_text, TextStyle};
use crate::touch::TouchEvent;

/// Editing tool currently in front.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Tool {
    #[default]
    Preview,
    Crop,
    Orientation,
    Adjust,
    Text,
}

/// Notifications for the host, drained with [`EditSession::drain_events`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SessionEvent {
    /// The displayed image or view changed; redraw.
    ImageUpdated,
    /// A save finished, successfully or not.
    SaveFinished(bool),
    /// Loading failed; the previous image is kept.
    LoadFailed(String),
    /// The user asked to enter or edit text at this screen point.
    TextEditRequested(Vec2),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum Route {
    #[default]
    View,
    Overlay,
}

#[derive(Debug)]
pub struct EditSession {
    config: EditorConfig,
    engine: EditEngine,
    recognizer: GestureRecognizer,
    crop_box: DragBox,
    text_box: RotatableBox,
    tool: Tool,
    text: String,
    text_style: Option<TextStyle>,
    route: Route,
    events: Vec<SessionEvent>,
}

impl EditSession {
    pub fn new(config: EditorConfig) -> Self {
        Self {
            config,
            engine: EditEngine::new(config.view),
            recognizer: GestureRecognizer::new(config.gesture),
            crop_box: DragBox::new(config.crop_box),
            text_box: RotatableBox::new(config.text_box),
            tool: Tool::Preview,
            text: String::new(),
            text_style: None,
            route: Route::View,
            events: Vec::new(),
        }
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn engine(&self) -> &EditEngine {
        &self.engine
    }

    pub fn tool(&self) -> Tool {
        self.tool
    }

    pub fn crop_box(&self) -> Rect {
        self.crop_box.current()
    }

    pub fn text_box(&self) -> RotatedRect {
        self.text_box.rect()
    }

    pub fn text_aspect_ratio(&self) -> AspectRatio {
        self.text_box.aspect_ratio()
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn set_viewport(&mut self, width: f32, height: f32) {
        self.engine.set_viewport(width, height);
        self.sync_crop_bound();
        self.notify();
    }

    /// Show a new image, dropping pending edits of the current tool.
    pub fn open_image(&mut self, image: RgbaImage) {
        self.engine.open(image);
        self.text.clear();
        self.enter_tool();
        self.notify();
    }

    /// Apply a finished background load or save.
    pub fn apply_io_outcome(&mut self, outcome: IoOutcome) {
        match outcome {
            IoOutcome::Loaded(Ok(image)) => self.open_image(image),
            IoOutcome::Loaded(Err(err)) => {
                tracing::warn!(%err, "keeping previous image after failed load");
                self.events.push(SessionEvent::LoadFailed(err.to_string()));
            }
            IoOutcome::Saved(result) => {
                self.events.push(SessionEvent::SaveFinished(result.is_ok()));
            }
        }
    }

    /// The image as it should be saved, pending edits included.
    pub fn snapshot(&self) -> RgbaImage {
        self.engine.baked_image()
    }

    /// Switch tools, discarding what the previous tool left uncommitted.
    pub fn select_tool(&mut self, tool: Tool) {
        if tool == self.tool {
            return;
        }
        tracing::debug!(from = ?self.tool, to = ?tool, "switching tool");
        self.leave_tool();
        self.tool = tool;
        self.enter_tool();
        self.notify();
    }

    /// Apply the active tool's work and return to preview.
    ///
    /// Crop and text read their box against the view as displayed, so any
    /// orientation or adjustment still pending from preview is baked in
    /// along with them.
    pub fn confirm(&mut self) -> Result<(), EditError> {
        match self.tool {
            Tool::Preview => {}
            Tool::Crop => self.engine.crop(self.crop_box.current())?,
            Tool::Orientation | Tool::Adjust => self.engine.commit(),
            Tool::Text => {
                if let Some(style) = &self.text_style {
                    if !self.text.is_empty() {
                        self.engine
                            .draw_text(&self.text, style, &self.text_box.rect())?;
                    }
                }
            }
        }
        self.text.clear();
        self.tool = Tool::Preview;
        self.route = Route::View;
        self.notify();
        Ok(())
    }

    /// Drop the active tool's work and return to preview.
    pub fn cancel(&mut self) {
        self.leave_tool();
        self.tool = Tool::Preview;
        self.notify();
    }

    /// Queue a clockwise quarter-turn rotation.
    pub fn rotate(&mut self, angle: i32) -> Result<(), EditError> {
        self.engine.rotate(angle)?;
        self.notify();
        Ok(())
    }

    pub fn flip_horizontal(&mut self) {
        self.engine.flip_horizontal();
        self.notify();
    }

    pub fn flip_vertical(&mut self) {
        self.engine.flip_vertical();
        self.notify();
    }

    pub fn set_adjustments(&mut self, adjustments: Adjustments) {
        self.engine.set_adjustments(adjustments);
        self.notify();
    }

    pub fn set_crop_aspect_ratio(&mut self, aspect: AspectRatio) -> Result<(), GeometryError> {
        match aspect.ratio() {
            Some(ratio) => self.crop_box.set_fixed_aspect_ratio(ratio, 1.0),
            None => {
                self.crop_box.set_free_aspect_ratio();
                Ok(())
            }
        }
    }

    /// Set the text to place, sized for `font_size` pixels and locked to
    /// its natural aspect ratio. Empty text clears it.
    pub fn set_text(
        &mut self,
        content: &str,
        style: TextStyle,
        font_size: f32,
    ) -> Result<(), GeometryError> {
        let size = measure_text(&style.font, content, font_size);
        self.text = content.to_string();
        self.text_style = Some(style);
        if content.is_empty() || size.min_element() <= 0.0 {
            self.text.clear();
            return Ok(());
        }
        self.text_box.set_fixed_ratio(size.x / size.y)?;
        self.text_box.set_size(size.x, size.y);
        self.text_box.take_events();
        Ok(())
    }

    pub fn set_text_angle(&mut self, angle: f32) {
        self.text_box.set_angle(angle);
        self.text_box.take_events();
    }

    /// Route one touch frame. Returns `true` when something reacted to it.
    pub fn handle_touch(&mut self, event: &TouchEvent) -> bool {
        let first = event.is_first_down();
        let claimed = first && self.overlay_claims(event);
        if first {
            self.route = if claimed { Route::Overlay } else { Route::View };
        }

        let consumed = match self.route {
            Route::Overlay => {
                if !claimed {
                    self.forward_to_overlay(event);
                }
                true
            }
            Route::View => self.forward_to_view(event),
        };

        if event.ends_sequence() {
            self.route = Route::View;
        }
        self.collect_box_events();
        consumed
    }

    /// Paint the image with pending edits previewed.
    pub fn render<S: RenderSurface + ?Sized>(&mut self, surface: &mut S) {
        self.engine.render(surface);
    }

    pub fn drain_events(&mut self) -> Vec<SessionEvent> {
        std::mem::take(&mut self.events)
    }

    // First contact of a sequence: let the active overlay take it.
    fn overlay_claims(&mut self, event: &TouchEvent) -> bool {
        match self.tool {
            Tool::Crop => self.crop_box.handle_touch(event),
            Tool::Text if self.text.is_empty() => {
                let Some(position) = event.pointers.first().map(|p| p.position) else {
                    return false;
                };
                self.text_box.set_center(position);
                self.text_box.take_events();
                self.events.push(SessionEvent::TextEditRequested(position));
                true
            }
            Tool::Text => self.text_box.handle_touch(event),
            Tool::Preview | Tool::Orientation | Tool::Adjust => false,
        }
    }

    fn forward_to_overlay(&mut self, event: &TouchEvent) {
        match self.tool {
            Tool::Crop => {
                self.crop_box.handle_touch(event);
            }
            Tool::Text if !self.text.is_empty() => {
                self.text_box.handle_touch(event);
            }
            _ => {}
        }
    }

    fn forward_to_view(&mut self, event: &TouchEvent) -> bool {
        let Some(gesture) = self.recognizer.handle(event) else {
            return false;
        };
        if matches!(gesture, GestureEvent::Tap(_)) {
            return false;
        }
        self.engine.apply_gesture(&gesture);
        self.sync_crop_bound();
        self.notify();
        true
    }

    fn collect_box_events(&mut self) {
        for event in self.text_box.take_events() {
            if let BoxEvent::DoubleTap(position) = event {
                self.events.push(SessionEvent::TextEditRequested(position));
            }
        }
    }

    fn leave_tool(&mut self) {
        match self.tool {
            Tool::Orientation | Tool::Adjust => self.engine.discard(),
            Tool::Text => self.text.clear(),
            Tool::Preview | Tool::Crop => {}
        }
        self.route = Route::View;
        self.recognizer.reset();
    }

    fn enter_tool(&mut self) {
        let image_box = self.engine.image_box();
        match self.tool {
            Tool::Crop => {
                self.sync_crop_bound();
                if let Err(err) = self.crop_box.set_box(image_box) {
                    tracing::warn!(%err, "image box rejected as crop box");
                }
            }
            Tool::Text => {
                self.text_box.set_center(image_box.center());
                self.text_box.take_events();
            }
            Tool::Preview | Tool::Orientation | Tool::Adjust => {}
        }
    }

    // Keep the crop box inside the image after the view moved.
    fn sync_crop_bound(&mut self) {
        if self.tool != Tool::Crop {
            return;
        }
        if let Err(err) = self.crop_box.set_bound(self.engine.image_box()) {
            tracing::warn!(%err, "image box rejected as crop bound");
        }
    }

    fn notify(&mut self) {
        if self.events.last() != Some(&SessionEvent::ImageUpdated) {
            self.events.push(SessionEvent::ImageUpdated);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DragBoxConfig;
    use crate::io::IoError;
    use crate::touch::{TouchAction, TouchPoint};
    use image::{imageops, Rgba};

    fn config() -> EditorConfig {
        let mut config = EditorConfig::default();
        config.crop_box = DragBoxConfig {
            anchor_size: 20.0,
            min_box_size: 40.0,
        };
        config
    }

    /// 200x100 image shown in a 400x400 viewport: image box (0, 100, 400, 300).
    fn session() -> EditSession {
        let mut session = EditSession::new(config());
        session.set_viewport(400.0, 400.0);
        session.open_image(RgbaImage::from_fn(200, 100, |x, y| {
            Rgba([x as u8, y as u8, 0, 255])
        }));
        session.drain_events();
        session
    }

    fn touch(action: TouchAction, x: f32, y: f32, t: u64) -> TouchEvent {
        TouchEvent::single(action, 0, Vec2::new(x, y), t)
    }

    fn drag(session: &mut EditSession, from: Vec2, to: Vec2, t: u64) {
        session.handle_touch(&touch(TouchAction::Down(0), from.x, from.y, t));
        session.handle_touch(&touch(TouchAction::Move, to.x, to.y, t + 16));
        session.handle_touch(&touch(TouchAction::Up(0), to.x, to.y, t + 32));
    }

    #[test]
    fn test_preview_drag_pans_view() {
        let mut session = session();
        drag(&mut session, Vec2::new(200.0, 200.0), Vec2::new(210.0, 200.0), 0);
        assert!(session
            .engine()
            .image_box()
            .approx_eq(&Rect::new(10.0, 100.0, 410.0, 300.0), 1e-3));
        assert_eq!(session.drain_events(), vec![SessionEvent::ImageUpdated]);
    }

    #[test]
    fn test_crop_tool_starts_with_image_box() {
        let mut session = session();
        session.select_tool(Tool::Crop);
        assert!(session
            .crop_box()
            .approx_eq(&Rect::new(0.0, 100.0, 400.0, 300.0), 1e-3));
    }

    #[test]
    fn test_crop_drag_and_confirm() {
        let mut session = session();
        session.select_tool(Tool::Crop);
        drag(&mut session, Vec2::new(0.0, 100.0), Vec2::new(100.0, 150.0), 0);

        // The corner drag went to the crop box, not the view
        assert!(session
            .crop_box()
            .approx_eq(&Rect::new(100.0, 150.0, 400.0, 300.0), 1e-3));
        assert!(session
            .engine()
            .image_box()
            .approx_eq(&Rect::new(0.0, 100.0, 400.0, 300.0), 1e-3));

        session.confirm().unwrap();
        assert_eq!(session.tool(), Tool::Preview);
        let image = session.engine().image();
        assert_eq!(image.dimensions(), (150, 75));
        assert_eq!(image.get_pixel(0, 0).0, [50, 25, 0, 255]);
    }

    #[test]
    fn test_crop_after_rotate_and_zoom_matches_display() {
        let mut session = session();
        session.rotate(90).unwrap();
        // Rotated content 100x200 at (100, 0, 300, 400); double tap zooms about (100, 100)
        for t in [0, 100] {
            session.handle_touch(&touch(TouchAction::Down(0), 100.0, 100.0, t));
            session.handle_touch(&touch(TouchAction::Up(0), 100.0, 100.0, t + 20));
        }
        assert!(session
            .engine()
            .image_box()
            .approx_eq(&Rect::new(100.0, -100.0, 500.0, 700.0), 1e-3));
        let expected = imageops::crop_imm(
            &imageops::rotate90(session.engine().image()),
            25,
            50,
            75,
            150,
        )
        .to_image();

        // Leaving preview keeps the pending rotation
        session.select_tool(Tool::Crop);
        drag(&mut session, Vec2::new(100.0, -100.0), Vec2::new(200.0, 100.0), 1000);
        assert!(session
            .crop_box()
            .approx_eq(&Rect::new(200.0, 100.0, 500.0, 700.0), 1e-3));

        session.confirm().unwrap();
        assert_eq!(session.engine().image(), &expected);
        assert!(session.engine().pending_orientation().is_identity());
    }

    #[test]
    fn test_crop_bound_follows_view() {
        let mut session = session();
        session.select_tool(Tool::Crop);
        // Below the crop box and outside its anchors: pans the view
        drag(&mut session, Vec2::new(200.0, 350.0), Vec2::new(200.0, 340.0), 0);

        let image_box = session.engine().image_box();
        assert!(image_box.approx_eq(&Rect::new(0.0, 90.0, 400.0, 290.0), 1e-3));
        assert!(image_box.contains_rect(&session.crop_box(), 1e-3));
    }

    #[test]
    fn test_crop_aspect_ratio_preset() {
        let mut session = session();
        session.select_tool(Tool::Crop);
        session
            .set_crop_aspect_ratio(AspectRatio::fixed(1.0, 1.0).unwrap())
            .unwrap();
        let crop = session.crop_box();
        assert!((crop.width() - crop.height()).abs() < 1e-3);
        assert!(session.engine().image_box().contains_rect(&crop, 1e-3));
    }

    #[test]
    fn test_switching_tool_discards_orientation() {
        let mut session = session();
        session.select_tool(Tool::Orientation);
        session.rotate(90).unwrap();
        session.flip_horizontal();
        session.select_tool(Tool::Adjust);
        assert!(session.engine().pending_orientation().is_identity());
        assert_eq!(session.engine().image().dimensions(), (200, 100));
    }

    #[test]
    fn test_confirm_orientation_commits() {
        let mut session = session();
        session.select_tool(Tool::Orientation);
        session.rotate(90).unwrap();
        session.confirm().unwrap();
        assert_eq!(session.engine().image().dimensions(), (100, 200));
        assert_eq!(session.tool(), Tool::Preview);
    }

    #[test]
    fn test_cancel_discards_adjustments() {
        let mut session = session();
        session.select_tool(Tool::Adjust);
        session.set_adjustments(Adjustments::new(50.0, 0.0, 0.0));
        session.cancel();
        assert!(session.engine().adjustments().is_default());
        assert_eq!(session.tool(), Tool::Preview);
    }

    #[test]
    fn test_text_tool_tap_requests_text() {
        let mut session = session();
        session.select_tool(Tool::Text);
        session.drain_events();

        let consumed = session.handle_touch(&touch(TouchAction::Down(0), 120.0, 180.0, 0));
        assert!(consumed);
        session.handle_touch(&touch(TouchAction::Up(0), 120.0, 180.0, 10));
        assert_eq!(
            session.drain_events(),
            vec![SessionEvent::TextEditRequested(Vec2::new(120.0, 180.0))]
        );
        assert_eq!(session.text_box().center, Vec2::new(120.0, 180.0));
        // The view did not move
        assert!(session
            .engine()
            .image_box()
            .approx_eq(&Rect::new(0.0, 100.0, 400.0, 300.0), 1e-3));
    }

    #[test]
    fn test_text_placement_and_double_tap() {
        let font = crate::text::tests::test_font();
        let mut session = session();
        session.select_tool(Tool::Text);
        session
            .set_text("Hi", TextStyle::new(font, Rgba([255, 255, 255, 255])), 48.0)
            .unwrap();
        let rect = session.text_box();
        assert!(rect.width >= 40.0 && rect.height >= 40.0);
        assert!(session.text_aspect_ratio().is_fixed());

        // Double tap on the box asks for re-editing
        let center = rect.center;
        session.drain_events();
        for t in [0, 100] {
            session.handle_touch(&touch(TouchAction::Down(0), center.x, center.y, t));
            session.handle_touch(&touch(TouchAction::Up(0), center.x, center.y, t + 20));
        }
        assert!(session
            .drain_events()
            .contains(&SessionEvent::TextEditRequested(center)));

        session.confirm().unwrap();
        assert_eq!(session.tool(), Tool::Preview);
        assert!(session.text().is_empty());
    }

    #[test]
    fn test_double_tap_zoom_in_preview() {
        let mut session = session();
        for t in [0, 100] {
            session.handle_touch(&touch(TouchAction::Down(0), 200.0, 200.0, t));
            session.handle_touch(&touch(TouchAction::Up(0), 200.0, 200.0, t + 20));
        }
        assert_eq!(session.engine().zoom(), 2.0);
    }

    #[test]
    fn test_pinch_zooms_view() {
        let mut session = session();
        let a = |x: f32, y: f32| TouchPoint {
            id: 0,
            position: Vec2::new(x, y),
        };
        let b = |x: f32, y: f32| TouchPoint {
            id: 1,
            position: Vec2::new(x, y),
        };
        session.handle_touch(&TouchEvent::new(TouchAction::Down(0), vec![a(150.0, 200.0)], 0));
        session.handle_touch(&TouchEvent::new(
            TouchAction::Down(1),
            vec![a(150.0, 200.0), b(250.0, 200.0)],
            10,
        ));
        session.handle_touch(&TouchEvent::new(
            TouchAction::Move,
            vec![a(100.0, 200.0), b(300.0, 200.0)],
            20,
        ));
        assert!((session.engine().zoom() - 2.0).abs() < 1e-4);
    }

    #[test]
    fn test_io_outcomes_become_events() {
        let mut session = session();
        let before = session.engine().image().clone();

        session.apply_io_outcome(IoOutcome::Loaded(Err(IoError::WorkerGone)));
        session.apply_io_outcome(IoOutcome::Saved(Ok(())));
        assert_eq!(
            session.drain_events(),
            vec![
                SessionEvent::LoadFailed("I/O worker has stopped".to_string()),
                SessionEvent::SaveFinished(true),
            ]
        );
        assert_eq!(session.engine().image(), &before);

        session.apply_io_outcome(IoOutcome::Loaded(Ok(RgbaImage::new(10, 20))));
        assert_eq!(session.engine().image().dimensions(), (10, 20));
        assert_eq!(session.drain_events(), vec![SessionEvent::ImageUpdated]);
    }

    #[test]
    fn test_snapshot_includes_pending_edits() {
        let mut session = session();
        session.rotate(270).unwrap();
        assert_eq!(session.snapshot().dimensions(), (100, 200));
        assert_eq!(session.engine().image().dimensions(), (200, 100));
    }
}
