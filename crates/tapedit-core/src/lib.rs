//! Tapedit Core - touch-driven photo editing
//!
//! This crate holds everything the editor does apart from drawing widgets:
//! gesture geometry for the crop and text boxes, the image-to-screen view
//! transform, pending orientation and color edits, text drawing, and
//! image decode/encode with background I/O.
//!
//! Hosts create an [`EditSession`], feed it [`TouchEvent`] frames and
//! render it onto a [`RenderSurface`].

pub mod adjustments;
pub mod config;
pub mod decode;
pub mod drag_box;
pub mod encode;
pub mod engine;
pub mod geometry;
pub mod gesture;
pub mod io;
pub mod render;
pub mod rotatable_box;
pub mod session;
pub mod text;
pub mod touch;
pub mod view;

pub use adjustments::{apply_adjustments, Adjustments};
pub use config::{
    ConfigError, DragBoxConfig, EditorConfig, GestureConfig, RotatableBoxConfig, ViewConfig,
};
pub use decode::{decode_image, DecodeError, Orientation};
pub use drag_box::{BoxAnchor, DragBox};
pub use encode::{encode_png, EncodeError};
pub use engine::{EditEngine, EditError, PendingOrientation};
pub use geometry::{AspectRatio, GeometryError, Rect, RotatedRect};
pub use gesture::{GestureEvent, GestureRecognizer, GestureState, PointerDragInfo};
pub use io::{
    FileSink, FileSource, ImageSink, ImageSource, IoError, IoOutcome, IoWorker, MemorySource,
    SharedBufferSink,
};
pub use render::{PixelSurface, RenderSurface};
pub use rotatable_box::{AxisAnchor, BoxEvent, RotatableAnchor, RotatableBox};
pub use session::{EditSession, SessionEvent, Tool};
pub use text::{measure_text, TextStyle};
pub use touch::{PointerId, TouchAction, TouchEvent, TouchPoint, TouchStream};
pub use view::ViewTransform;

// Re-exported so hosts do not need their own dependency to build inputs
pub use ab_glyph::FontArc;
pub use glam::{Affine2, Vec2};
pub use image::{Rgba, RgbaImage};
