//! Conversions between JavaScript-friendly scalars and core types.
//!
//! JavaScript hands over tools as small integers and colors as packed
//! `0xAARRGGBB` numbers (the layout canvas color pickers usually produce).

use tapedit_core::{Rgba, Tool};

/// Convert a u8 tool value to the core Tool enum.
///
/// Values:
/// - 0 = Preview
/// - 1 = Crop
/// - 2 = Orientation
/// - 3 = Adjust
/// - 4 = Text
///
/// Any other value defaults to Preview.
pub(crate) fn tool_from_u8(value: u8) -> Tool {
    match value {
        1 => Tool::Crop,
        2 => Tool::Orientation,
        3 => Tool::Adjust,
        4 => Tool::Text,
        _ => Tool::Preview,
    }
}

/// Inverse of [`tool_from_u8`].
pub(crate) fn tool_to_u8(tool: Tool) -> u8 {
    match tool {
        Tool::Preview => 0,
        Tool::Crop => 1,
        Tool::Orientation => 2,
        Tool::Adjust => 3,
        Tool::Text => 4,
    }
}

/// Unpack `0xAARRGGBB`.
pub(crate) fn color_from_argb(argb: u32) -> Rgba<u8> {
    let [a, r, g, b] = argb.to_be_bytes();
    Rgba([r, g, b, a])
}

/// Milliseconds from `performance.now()` or `event.timeStamp` as an integer clock.
pub(crate) fn time_from_js(time_ms: f64) -> u64 {
    if time_ms.is_finite() && time_ms > 0.0 {
        time_ms as u64
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_from_u8() {
        assert_eq!(tool_from_u8(0), Tool::Preview);
        assert_eq!(tool_from_u8(1), Tool::Crop);
        assert_eq!(tool_from_u8(2), Tool::Orientation);
        assert_eq!(tool_from_u8(3), Tool::Adjust);
        assert_eq!(tool_from_u8(4), Tool::Text);
        assert_eq!(tool_from_u8(99), Tool::Preview);
    }

    #[test]
    fn test_tool_round_trip() {
        for value in 0..=4 {
            assert_eq!(tool_to_u8(tool_from_u8(value)), value);
        }
    }

    #[test]
    fn test_color_from_argb() {
        assert_eq!(color_from_argb(0xFF112233), Rgba([0x11, 0x22, 0x33, 0xFF]));
        assert_eq!(color_from_argb(0x80FFFFFF), Rgba([255, 255, 255, 0x80]));
        assert_eq!(color_from_argb(0x04010203), Rgba([1, 2, 3, 4]));
    }

    #[test]
    fn test_time_from_js() {
        assert_eq!(time_from_js(1234.9), 1234);
        assert_eq!(time_from_js(-5.0), 0);
        assert_eq!(time_from_js(f64::NAN), 0);
    }
}
