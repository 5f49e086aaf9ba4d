//! # Chart Projection Module
//!
//! Turns the live session (plus an optional reference overlay) into the
//! series handed to the chart renderer.
//!
//! All offsets are relative to the session anchor: charge time once the
//! roast is charged, otherwise the earliest logged frame. Frames before the
//! anchor are not projected.
//!
//! The numeric readout ([`ChartProjection::readout`]) only reads the last
//! point of each series; the projected series are never shortened by it.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::reference::OverlaySeries;
use crate::session::{Probe, RoastSession};
use crate::signal::rate_of_rise::{RateOfRiseCache, RateOfRiseProcessor};
use crate::signal::ProbeSeries;

/// Most recent values for the numeric display
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Readout {
    pub probe1: Option<f64>,
    pub probe2: Option<f64>,
    /// Degrees per minute
    pub rate_of_rise1: Option<f64>,
    /// Degrees per minute
    pub rate_of_rise2: Option<f64>,
}

/// Everything the renderer draws for one update
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChartProjection {
    /// Time mapped to offset zero, `None` when nothing is logged
    pub anchor: Option<DateTime<Utc>>,
    pub primary: ProbeSeries,
    pub rate_of_rise: ProbeSeries,
    pub overlay: Option<OverlaySeries>,
}

impl ChartProjection {
    /// Whether a reference overlay is drawn
    #[must_use]
    pub fn has_overlay(&self) -> bool {
        self.overlay.is_some()
    }

    /// Latest value of each series
    #[must_use]
    pub fn readout(&self) -> Readout {
        let (probe1, probe2) = self.primary.latest();
        let (rate_of_rise1, rate_of_rise2) = self.rate_of_rise.latest();
        Readout {
            probe1: probe1.map(|p| p.value),
            probe2: probe2.map(|p| p.value),
            rate_of_rise1: rate_of_rise1.map(|p| p.value),
            rate_of_rise2: rate_of_rise2.map(|p| p.value),
        }
    }
}

/// Builds projections, memoising the rate-of-rise series between updates
#[derive(Debug, Clone)]
pub struct ChartProjector {
    probe1_rate: RateOfRiseCache,
    probe2_rate: RateOfRiseCache,
}

impl Default for ChartProjector {
    fn default() -> Self {
        Self::new(RateOfRiseProcessor::default())
    }
}

impl ChartProjector {
    /// Create a projector using `processor` for both probes
    #[must_use]
    pub fn new(processor: RateOfRiseProcessor) -> Self {
        Self {
            probe1_rate: RateOfRiseCache::new(processor),
            probe2_rate: RateOfRiseCache::new(processor),
        }
    }

    /// Project the session and optional overlay
    pub fn project(&mut self, session: &RoastSession, overlay: Option<&OverlaySeries>) -> ChartProjection {
        let overlay = overlay.cloned();
        let Some(anchor) = session.anchor_time() else {
            return ChartProjection { overlay, ..ChartProjection::default() };
        };

        let primary = ProbeSeries {
            probe1: session.log().probe_series(anchor, Probe::One),
            probe2: session.log().probe_series(anchor, Probe::Two),
        };
        let rate_of_rise = ProbeSeries {
            probe1: self.probe1_rate.compute(&primary.probe1).to_vec(),
            probe2: self.probe2_rate.compute(&primary.probe2).to_vec(),
        };

        ChartProjection {
            anchor: Some(anchor),
            primary,
            rate_of_rise,
            overlay,
        }
    }
}
