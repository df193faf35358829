//! Image decoding.
//!
//! Opens any format the `image` crate was built with (JPEG and PNG here) into
//! an RGBA bitmap, applying the EXIF orientation tag so camera photos come
//! out upright.
//!
//! # Examples
//!
//! ```ignore
//! use tapedit_core::decode::decode_image;
//!
//! let bytes = std::fs::read("photo.jpg").unwrap();
//! let image = decode_image(&bytes).unwrap();
//! println!("Decoded {}x{} image", image.width(), image.height());
//! ```

mod orientation;

use std::io::Cursor;

use image::{ImageReader, RgbaImage};
use thiserror::Error;

pub use orientation::{apply_orientation, read_orientation, Orientation};

/// Error types for image decoding operations.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The bytes do not start with a recognized image signature.
    #[error("Invalid or unsupported image format")]
    InvalidFormat,

    /// The image file is corrupted or incomplete.
    #[error("Corrupted or incomplete image file: {0}")]
    CorruptedFile(String),
}

/// Decode image bytes into an upright RGBA bitmap.
///
/// # Errors
///
/// Returns `DecodeError::InvalidFormat` if the format cannot be recognized.
/// Returns `DecodeError::CorruptedFile` if decoding fails.
pub fn decode_image(bytes: &[u8]) -> Result<RgbaImage, DecodeError> {
    let orientation = read_orientation(bytes);
    let image = decode_image_no_orientation(bytes)?;
    Ok(apply_orientation(image, orientation))
}

/// Decode image bytes without looking at EXIF orientation.
pub fn decode_image_no_orientation(bytes: &[u8]) -> Result<RgbaImage, DecodeError> {
    let reader = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| DecodeError::CorruptedFile(e.to_string()))?;

    if reader.format().is_none() {
        return Err(DecodeError::InvalidFormat);
    }

    let image = reader
        .decode()
        .map_err(|e| DecodeError::CorruptedFile(e.to_string()))?;

    Ok(image.into_rgba8())
}
