//! Tapedit WASM - WebAssembly bindings for the tapedit photo editor
//!
//! This crate exposes the tapedit-core edit session to JavaScript/TypeScript
//! hosts. The host owns the canvas and the pointer listeners; the session
//! owns everything else.
//!
//! # Module Structure
//!
//! - `session` - `JsEditSession`, the edit session wrapper
//! - `types` - Conversions between JavaScript scalars and core types
//!
//! # Usage
//!
//! ```typescript
//! import init, { JsEditSession } from '@tapedit/wasm';
//!
//! // Initialize WASM module (must call first)
//! await init();
//!
//! const session = new JsEditSession(undefined);
//! session.set_viewport(canvas.width, canvas.height);
//! session.open(new Uint8Array(await file.arrayBuffer()));
//! ```

use wasm_bindgen::prelude::*;

mod session;
mod types;

pub use session::JsEditSession;

/// Initialize the WASM module (called automatically on load)
#[wasm_bindgen(start)]
pub fn init() {}

/// Get the version of the WASM module
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}
