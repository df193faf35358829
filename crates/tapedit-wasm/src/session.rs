//! Edit session WASM bindings.
//!
//! Wraps the core `EditSession` for a browser host. Pointer events arrive
//! one pointer at a time (as `PointerEvent`s do) and are assembled into
//! frames by a `TouchStream`. Decoding and encoding run synchronously here:
//! there are no threads to hand them to in the browser.
//!
//! # Example
//!
//! ```typescript
//! import init, { JsEditSession } from '@tapedit/wasm';
//!
//! await init();
//! const session = new JsEditSession(undefined);
//! session.set_viewport(canvas.width, canvas.height);
//! session.open(new Uint8Array(await file.arrayBuffer()));
//!
//! canvas.onpointerdown = (e) => session.pointer_down(e.pointerId, e.offsetX, e.offsetY, e.timeStamp);
//! const rgba = session.render(0xFF000000);
//! ctx.putImageData(new ImageData(new Uint8ClampedArray(rgba), canvas.width, canvas.height), 0, 0);
//! ```

use ab_glyph::FontArc;
use tapedit_core::{
    decode_image, encode_png, Adjustments, AspectRatio, EditSession, EditorConfig, IoError,
    IoOutcome, PixelSurface, RenderSurface, TextStyle, TouchEvent, TouchStream, Vec2,
};
use wasm_bindgen::prelude::*;

use crate::types::{color_from_argb, time_from_js, tool_from_u8, tool_to_u8};

fn js_error(message: impl ToString) -> JsValue {
    JsValue::from_str(&message.to_string())
}

/// Edit session wrapper for JavaScript.
#[wasm_bindgen]
pub struct JsEditSession {
    inner: EditSession,
    touches: TouchStream,
    font: Option<FontArc>,
}

impl JsEditSession {
    pub(crate) fn with_config(config: EditorConfig) -> Self {
        Self {
            inner: EditSession::new(config),
            touches: TouchStream::new(),
            font: None,
        }
    }

    fn dispatch(&mut self, event: Option<TouchEvent>) -> bool {
        event.is_some_and(|event| self.inner.handle_touch(&event))
    }
}

#[wasm_bindgen]
impl JsEditSession {
    /// Create a session.
    ///
    /// # Arguments
    /// * `config` - Optional editor config object; missing fields keep their
    ///   defaults. Pass `undefined` for all defaults.
    ///
    /// # Errors
    /// Returns error if the config cannot be deserialized or is out of range
    #[wasm_bindgen(constructor)]
    pub fn new(config: JsValue) -> Result<JsEditSession, JsValue> {
        let config = if config.is_undefined() || config.is_null() {
            EditorConfig::default()
        } else {
            let config: EditorConfig = serde_wasm_bindgen::from_value(config)
                .map_err(|e| js_error(format!("Invalid editor config: {}", e)))?;
            config.validate().map_err(js_error)?;
            config
        };
        Ok(Self::with_config(config))
    }

    pub fn set_viewport(&mut self, width: f32, height: f32) {
        self.inner.set_viewport(width, height);
    }

    /// Decode JPEG or PNG bytes and show them.
    ///
    /// On failure the previous image stays and a `LoadFailed` event is queued.
    pub fn open(&mut self, bytes: &[u8]) -> Result<(), JsValue> {
        let result = decode_image(bytes).map_err(IoError::from);
        let failure = result.as_ref().err().map(|e| e.to_string());
        self.inner.apply_io_outcome(IoOutcome::Loaded(result));
        match failure {
            Some(message) => {
                web_sys::console::warn_1(&js_error(&message));
                Err(js_error(message))
            }
            None => Ok(()),
        }
    }

    /// Encode the image, pending edits included, as PNG bytes.
    ///
    /// Queues a `SaveFinished` event either way.
    pub fn export_png(&mut self) -> Result<Vec<u8>, JsValue> {
        match encode_png(&self.inner.snapshot()) {
            Ok(bytes) => {
                self.inner.apply_io_outcome(IoOutcome::Saved(Ok(())));
                Ok(bytes)
            }
            Err(err) => {
                let message = err.to_string();
                self.inner
                    .apply_io_outcome(IoOutcome::Saved(Err(IoError::from(err))));
                Err(js_error(message))
            }
        }
    }

    /// Returns `true` when the session reacted to the pointer.
    pub fn pointer_down(&mut self, id: u32, x: f32, y: f32, time_ms: f64) -> bool {
        let event = self
            .touches
            .down(id, Vec2::new(x, y), time_from_js(time_ms));
        self.inner.handle_touch(&event)
    }

    pub fn pointer_move(&mut self, id: u32, x: f32, y: f32, time_ms: f64) -> bool {
        let event = self
            .touches
            .move_to(id, Vec2::new(x, y), time_from_js(time_ms));
        self.dispatch(event)
    }

    pub fn pointer_up(&mut self, id: u32, x: f32, y: f32, time_ms: f64) -> bool {
        let event = self.touches.up(id, Vec2::new(x, y), time_from_js(time_ms));
        self.dispatch(event)
    }

    pub fn pointer_cancel(&mut self, time_ms: f64) -> bool {
        let event = self.touches.cancel(time_from_js(time_ms));
        self.inner.handle_touch(&event)
    }

    /// Switch tool (0 = Preview, 1 = Crop, 2 = Orientation, 3 = Adjust, 4 = Text).
    pub fn select_tool(&mut self, tool: u8) {
        self.inner.select_tool(tool_from_u8(tool));
    }

    #[wasm_bindgen(getter)]
    pub fn tool(&self) -> u8 {
        tool_to_u8(self.inner.tool())
    }

    pub fn confirm(&mut self) -> Result<(), JsValue> {
        self.inner.confirm().map_err(js_error)
    }

    pub fn cancel(&mut self) {
        self.inner.cancel();
    }

    /// Queue a clockwise rotation; must be a multiple of 90 degrees.
    pub fn rotate(&mut self, angle: i32) -> Result<(), JsValue> {
        self.inner.rotate(angle).map_err(js_error)
    }

    pub fn flip_horizontal(&mut self) {
        self.inner.flip_horizontal();
    }

    pub fn flip_vertical(&mut self) {
        self.inner.flip_vertical();
    }

    /// Preview brightness, contrast and saturation (each -100 to 100).
    pub fn set_adjustments(&mut self, brightness: f32, contrast: f32, saturation: f32) {
        self.inner
            .set_adjustments(Adjustments::new(brightness, contrast, saturation));
    }

    /// Lock the crop box to `width:height`.
    pub fn set_crop_aspect_ratio(&mut self, width: f32, height: f32) -> Result<(), JsValue> {
        let aspect = AspectRatio::fixed(width, height).map_err(js_error)?;
        self.inner.set_crop_aspect_ratio(aspect).map_err(js_error)
    }

    pub fn set_free_crop_aspect_ratio(&mut self) -> Result<(), JsValue> {
        self.inner
            .set_crop_aspect_ratio(AspectRatio::Free)
            .map_err(js_error)
    }

    /// Load a TrueType/OpenType font for the text tool.
    pub fn load_font(&mut self, bytes: Vec<u8>) -> Result<(), JsValue> {
        let font =
            FontArc::try_from_vec(bytes).map_err(|e| js_error(format!("Invalid font: {}", e)))?;
        self.font = Some(font);
        Ok(())
    }

    /// Set the text to place.
    ///
    /// # Arguments
    /// * `content` - The text; empty clears it
    /// * `argb` - Fill color as `0xAARRGGBB`
    /// * `font_size` - Initial text height in screen pixels
    pub fn set_text(&mut self, content: &str, argb: u32, font_size: f32) -> Result<(), JsValue> {
        let font = self
            .font
            .clone()
            .ok_or_else(|| js_error("No font loaded; call load_font first"))?;
        let style = TextStyle::new(font, color_from_argb(argb));
        self.inner
            .set_text(content, style, font_size)
            .map_err(js_error)
    }

    pub fn set_text_angle(&mut self, angle: f32) {
        self.inner.set_text_angle(angle);
    }

    /// Crop box as `{left, top, right, bottom}` in screen pixels.
    pub fn crop_box(&self) -> Result<JsValue, JsValue> {
        serde_wasm_bindgen::to_value(&self.inner.crop_box()).map_err(js_error)
    }

    /// Text box as `{center, width, height, angle}` in screen pixels.
    pub fn text_box(&self) -> Result<JsValue, JsValue> {
        serde_wasm_bindgen::to_value(&self.inner.text_box()).map_err(js_error)
    }

    /// Screen rectangle covered by the image.
    pub fn image_box(&self) -> Result<JsValue, JsValue> {
        serde_wasm_bindgen::to_value(&self.inner.engine().image_box()).map_err(js_error)
    }

    #[wasm_bindgen(getter)]
    pub fn zoom(&self) -> f32 {
        self.inner.engine().zoom()
    }

    /// Render the viewport as RGBA bytes over a `0xAARRGGBB` background.
    pub fn render(&mut self, background: u32) -> Vec<u8> {
        let size = self.inner.engine().view().viewport_size();
        let mut surface = PixelSurface::new(size.x.max(0.0) as u32, size.y.max(0.0) as u32);
        surface.clear(color_from_argb(background));
        self.inner.render(&mut surface);
        surface.into_image().into_raw()
    }

    /// Pending notifications as an array of serialized `SessionEvent`s.
    pub fn drain_events(&mut self) -> Result<JsValue, JsValue> {
        serde_wasm_bindgen::to_value(&self.inner.drain_events()).map_err(js_error)
    }
}
