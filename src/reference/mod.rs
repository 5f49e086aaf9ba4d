//! # Reference Roast Module
//!
//! Aligns a previously completed roast against the live one so both can be
//! drawn on the same time axis.
//!
//! ## Alignment
//!
//! Only reference frames from `start - lookback` onward are considered.
//! Before the live roast is charged the overlay is anchored at the earliest
//! of those frames, so the pre-roast curves line up from the left edge.
//! Once charged, the overlay is anchored at the reference's own charge time
//! and offset zero marks charge on both curves.
//!
//! ## Caching
//!
//! The window and its rate-of-rise series are kept per reference roast
//! (batch number plus charge time, since legacy records share batch 0) and
//! rebuilt only when the anchor moves or a different roast is pinned.
//! Unpinning hides the overlay but keeps the cache, so re-pinning the same
//! roast is free.

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info};

use crate::error::{Result, RoastLoggerError};
use crate::session::log::offset_series;
use crate::session::{Probe, RoastSession, TelemetryFrame};
use crate::signal::rate_of_rise::RateOfRiseProcessor;
use crate::signal::ProbeSeries;

/// Default pre-charge lookback window
pub const DEFAULT_LOOKBACK_MINUTES: i64 = 15;

/// A completed roast used as a comparison overlay
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceRoast {
    session: RoastSession,
    start_time: DateTime<Utc>,
}

impl ReferenceRoast {
    /// Wrap a completed session
    ///
    /// # Errors
    ///
    /// Returns `ReferenceIncomplete` unless both start and end time are set.
    pub fn new(session: RoastSession) -> Result<Self> {
        match (session.start_time(), session.end_time()) {
            (Some(start_time), Some(_)) => Ok(Self { session, start_time }),
            _ => Err(RoastLoggerError::ReferenceIncomplete(session.batch_number)),
        }
    }

    /// The underlying session
    #[must_use]
    pub fn session(&self) -> &RoastSession {
        &self.session
    }

    /// Batch number identifying this reference
    #[must_use]
    pub fn batch_number(&self) -> u32 {
        self.session.batch_number
    }

    /// Charge time of the reference roast
    #[must_use]
    pub fn start_time(&self) -> DateTime<Utc> {
        self.start_time
    }
}

/// Reference curves expressed relative to their alignment anchor
#[derive(Debug, Clone, PartialEq)]
pub struct OverlaySeries {
    /// Reference time mapped to offset zero
    pub anchor: DateTime<Utc>,
    pub primary: ProbeSeries,
    pub rate_of_rise: ProbeSeries,
}

#[derive(Debug, Clone)]
struct AlignmentCache {
    batch_number: u32,
    start_time: DateTime<Utc>,
    earliest_time: Option<DateTime<Utc>>,
    anchor: Option<DateTime<Utc>>,
    overlay: Option<OverlaySeries>,
}

impl AlignmentCache {
    fn new(reference: &ReferenceRoast) -> Self {
        Self {
            batch_number: reference.batch_number(),
            start_time: reference.start_time(),
            earliest_time: None,
            anchor: None,
            overlay: None,
        }
    }
}

/// Holds at most one pinned reference and its cached alignment
#[derive(Debug, Clone)]
pub struct ReferenceAligner {
    reference: Option<ReferenceRoast>,
    cache: Option<AlignmentCache>,
    lookback: Duration,
    processor: RateOfRiseProcessor,
    recomputations: u64,
}

impl Default for ReferenceAligner {
    fn default() -> Self {
        Self::new(Duration::minutes(DEFAULT_LOOKBACK_MINUTES), RateOfRiseProcessor::default())
    }
}

impl ReferenceAligner {
    /// Create an aligner with no reference pinned
    #[must_use]
    pub fn new(lookback: Duration, processor: RateOfRiseProcessor) -> Self {
        Self {
            reference: None,
            cache: None,
            lookback,
            processor,
            recomputations: 0,
        }
    }

    /// Pin a completed session as the reference
    ///
    /// # Errors
    ///
    /// Returns `ReferenceIncomplete` if the session lacks a start or end time.
    pub fn pin(&mut self, session: RoastSession) -> Result<()> {
        let reference = ReferenceRoast::new(session)?;
        info!("Pinned reference batch #{}", reference.batch_number());
        self.reference = Some(reference);
        Ok(())
    }

    /// Remove the reference; the overlay disappears
    pub fn unpin(&mut self) {
        if let Some(reference) = self.reference.take() {
            info!("Unpinned reference batch #{}", reference.batch_number());
        }
    }

    /// Whether a reference is pinned
    #[must_use]
    pub fn is_pinned(&self) -> bool {
        self.reference.is_some()
    }

    /// The pinned reference
    #[must_use]
    pub fn reference(&self) -> Option<&ReferenceRoast> {
        self.reference.as_ref()
    }

    /// How many times the window and rate series were rebuilt
    #[must_use]
    pub fn recomputations(&self) -> u64 {
        self.recomputations
    }

    /// Overlay for the live session, or `None` when nothing is pinned
    ///
    /// `live_charged` selects the anchor: the reference's charge time once
    /// the live roast is charged, else its earliest frame inside the lookback.
    pub fn overlay(&mut self, live_charged: bool) -> Option<&OverlaySeries> {
        let reference = self.reference.as_ref()?;
        let batch_number = reference.batch_number();

        let cached = self
            .cache
            .as_ref()
            .is_some_and(|c| c.batch_number == batch_number && c.start_time == reference.start_time());
        if !cached {
            self.cache = Some(AlignmentCache::new(reference));
        }
        let cache = self.cache.get_or_insert_with(|| AlignmentCache::new(reference));

        let cutoff = reference
            .start_time()
            .checked_sub_signed(self.lookback)
            .unwrap_or(DateTime::<Utc>::MIN_UTC);
        let loaded = reference.session().log().since(cutoff);

        let anchor = if live_charged {
            reference.start_time()
        } else {
            *cache.earliest_time.get_or_insert_with(|| {
                loaded
                    .first()
                    .map(TelemetryFrame::timestamp)
                    .unwrap_or_else(|| reference.start_time())
            })
        };

        if cache.anchor != Some(anchor) || cache.overlay.is_none() {
            debug!("Aligning reference batch #{} at {}", batch_number, anchor);
            let window = &loaded[loaded.partition_point(|f| f.timestamp() < anchor)..];
            let primary = ProbeSeries {
                probe1: offset_series(window, anchor, Probe::One),
                probe2: offset_series(window, anchor, Probe::Two),
            };
            let rate_of_rise = ProbeSeries {
                probe1: self.processor.compute(&primary.probe1),
                probe2: self.processor.compute(&primary.probe2),
            };
            cache.overlay = Some(OverlaySeries { anchor, primary, rate_of_rise });
            cache.anchor = Some(anchor);
            self.recomputations += 1;
        }

        cache.overlay.as_ref()
    }
}
