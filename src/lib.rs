//! # Roast Logger Library
//!
//! Log coffee roasts from a two-probe thermometer bridge.
//!
//! This library provides the telemetry pipeline behind the `roast-logger`
//! binary: frame decoding, the roast session lifecycle, rate-of-rise
//! derivation, reference-roast overlays and session persistence.

pub mod alarm;
pub mod app;
pub mod chart;
pub mod config;
pub mod error;
pub mod frame;
pub mod reference;
pub mod serial;
pub mod session;
pub mod signal;
pub mod store;
