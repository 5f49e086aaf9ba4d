//! # Signal Module
//!
//! Derived series computed from the telemetry log.
//!
//! This module handles:
//! - The offset/value point shared by raw and derived series
//! - Rate of rise: differentiate, resample, reject outliers, smooth

use serde::Serialize;

pub mod rate_of_rise;

/// One point of a chart series
///
/// `offset_millis` is relative to the series anchor (charge time or the
/// earliest logged frame).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DerivedPoint {
    /// Milliseconds since the anchor
    pub offset_millis: i64,
    /// Degrees, or degrees per minute for rate series
    pub value: f64,
}

impl DerivedPoint {
    /// Create a new point
    #[must_use]
    pub fn new(offset_millis: i64, value: f64) -> Self {
        Self { offset_millis, value }
    }
}

/// A pair of series, one per probe
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProbeSeries {
    pub probe1: Vec<DerivedPoint>,
    pub probe2: Vec<DerivedPoint>,
}

impl ProbeSeries {
    /// Latest point of each series, without removing it
    #[must_use]
    pub fn latest(&self) -> (Option<DerivedPoint>, Option<DerivedPoint>) {
        (self.probe1.last().copied(), self.probe2.last().copied())
    }
}
