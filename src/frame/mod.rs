//! # Probe Frame Module
//!
//! Wire format of the two-probe thermometer bridge.
//!
//! This module handles:
//! - The poll command written to the bridge every polling interval
//! - Decoding the fixed ASCII response into two calibrated temperatures
//! - Rejecting the error sentinel and out-of-range readings

pub mod protocol;
pub mod decoder;
