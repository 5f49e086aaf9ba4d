//! # Probe Protocol Constants
//!
//! Core definitions for the thermometer bridge's ASCII protocol.
//!
//! A response frame looks like `#0A28?0B6C...\r\n`: two 4-digit hexadecimal
//! fields at fixed offsets, each a fixed-point value in tenths of a degree.
//!
//! ```text
//! index:  0 1 2 3 4 5 6 7 8 9 10
//!         # 0 A 2 8 ? ? 0 B 6 C
//!           └probe1┘    └probe2┘
//! ```

use std::ops::Range;

/// Command that asks the bridge for one reading
pub const POLL_COMMAND: &str = "#001Nrn";

/// Literal response sent by the bridge when it cannot read the probes
pub const ERROR_SENTINEL: &str = "Err\r\n";

/// Minimum length of a response frame
pub const MIN_FRAME_LEN: usize = 10;

/// Byte range of the probe 1 hex field
pub const PROBE1_FIELD: Range<usize> = 1..5;

/// Byte range of the probe 2 hex field
pub const PROBE2_FIELD: Range<usize> = 7..11;

/// Divisor turning the raw integer into degrees (one decimal place)
pub const FIXED_POINT_SCALE: f64 = 10.0;

/// Readings must be strictly above this bound
pub const MIN_VALID_TEMP: f64 = 0.0;

/// Readings must be strictly below this bound
pub const MAX_VALID_TEMP: f64 = 600.0;

/// Whether a decoded reading lies in the device's sane range `(0, 600)`
pub fn is_valid_temperature(value: f64) -> bool {
    value > MIN_VALID_TEMP && value < MAX_VALID_TEMP
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_layout() {
        assert_eq!(PROBE1_FIELD.len(), 4);
        assert_eq!(PROBE2_FIELD.len(), 4);
        assert!(PROBE1_FIELD.end <= PROBE2_FIELD.start);
    }

    #[test]
    fn test_valid_temperature_bounds_are_open() {
        assert!(!is_valid_temperature(0.0));
        assert!(!is_valid_temperature(600.0));
        assert!(is_valid_temperature(0.1));
        assert!(is_valid_temperature(599.9));
        assert!(!is_valid_temperature(-5.0));
    }

    #[test]
    fn test_command_constants() {
        assert_eq!(POLL_COMMAND, "#001Nrn");
        assert_eq!(ERROR_SENTINEL, "Err\r\n");
        assert_eq!(MIN_FRAME_LEN, 10);
    }
}
