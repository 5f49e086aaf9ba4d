//! # Probe Frame Decoder
//!
//! Decodes the bridge's ASCII response into two probe temperatures.

use std::ops::Range;

use super::protocol::*;

/// Decode a raw response frame into `(probe1, probe2)` in degrees
///
/// The frame is dropped (returns `None`) when:
/// - It is not valid UTF-8 or shorter than [`MIN_FRAME_LEN`]
/// - It equals the [`ERROR_SENTINEL`]
/// - Either hex field is missing or not four hexadecimal digits
/// - Either value falls outside `(0, 600)`
///
/// Pure function; a dropped frame is simply superseded by the next poll.
///
/// # Examples
///
/// ```
/// use roast_logger::frame::decoder::decode;
///
/// assert_eq!(decode(b"#05DC  06A4\r\n"), Some((150.0, 170.0)));
/// assert_eq!(decode(b"Err\r\n"), None);
/// ```
pub fn decode(frame: &[u8]) -> Option<(f64, f64)> {
    let text = std::str::from_utf8(frame).ok()?;

    if text.len() < MIN_FRAME_LEN || text == ERROR_SENTINEL {
        return None;
    }

    let probe1 = decode_field(text, PROBE1_FIELD)?;
    let probe2 = decode_field(text, PROBE2_FIELD)?;

    if is_valid_temperature(probe1) && is_valid_temperature(probe2) {
        Some((probe1, probe2))
    } else {
        None
    }
}

/// Parse one fixed-offset hex field and scale it to degrees
fn decode_field(text: &str, range: Range<usize>) -> Option<f64> {
    let field = text.get(range)?;

    // from_str_radix tolerates a leading '+', the wire format does not
    if !field.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }

    let raw = u16::from_str_radix(field, 16).ok()?;
    Some(f64::from(raw) / FIXED_POINT_SCALE)
}
