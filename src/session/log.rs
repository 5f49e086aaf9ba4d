//! # Telemetry Log
//!
//! Append-only, strictly time-ordered store of one session's frames.

use chrono::{DateTime, Utc};
use tracing::debug;

use super::{Probe, TelemetryFrame};
use crate::error::{Result, RoastLoggerError};
use crate::signal::DerivedPoint;

/// Ordered frames of a single session
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TelemetryLog {
    frames: Vec<TelemetryFrame>,
}

impl TelemetryLog {
    /// Create an empty log
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a log from stored frames
    ///
    /// # Errors
    ///
    /// Returns `OutOfOrderFrame` at the first frame that does not advance time.
    pub fn from_frames(frames: Vec<TelemetryFrame>) -> Result<Self> {
        if let Some(pair) = frames
            .windows(2)
            .find(|pair| pair[1].timestamp() <= pair[0].timestamp())
        {
            return Err(RoastLoggerError::OutOfOrderFrame(pair[1].timestamp()));
        }
        Ok(Self { frames })
    }

    /// Append a frame newer than every logged frame
    ///
    /// # Errors
    ///
    /// Returns `OutOfOrderFrame` if `frame` is not strictly after the latest frame.
    pub fn append(&mut self, frame: TelemetryFrame) -> Result<()> {
        if let Some(latest) = self.latest() {
            if frame.timestamp() <= latest.timestamp() {
                return Err(RoastLoggerError::OutOfOrderFrame(frame.timestamp()));
            }
        }
        debug!(
            "Logged frame #{}: {:.1} / {:.1}",
            self.frames.len() + 1,
            frame.probe1(),
            frame.probe2()
        );
        self.frames.push(frame);
        Ok(())
    }

    /// All frames, oldest first
    #[must_use]
    pub fn frames(&self) -> &[TelemetryFrame] {
        &self.frames
    }

    /// Number of frames
    #[must_use]
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// Whether no frame has been logged
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Oldest frame
    #[must_use]
    pub fn earliest(&self) -> Option<&TelemetryFrame> {
        self.frames.first()
    }

    /// Newest frame
    #[must_use]
    pub fn latest(&self) -> Option<&TelemetryFrame> {
        self.frames.last()
    }

    /// Frames at or after `from`
    #[must_use]
    pub fn since(&self, from: DateTime<Utc>) -> &[TelemetryFrame] {
        let start = self.frames.partition_point(|f| f.timestamp() < from);
        &self.frames[start..]
    }

    /// One probe's readings at or after `anchor`, as offsets from `anchor`
    #[must_use]
    pub fn probe_series(&self, anchor: DateTime<Utc>, probe: Probe) -> Vec<DerivedPoint> {
        offset_series(self.since(anchor), anchor, probe)
    }
}

/// Express frames as `(ms since anchor, probe value)` points
#[must_use]
pub fn offset_series(
    frames: &[TelemetryFrame],
    anchor: DateTime<Utc>,
    probe: Probe,
) -> Vec<DerivedPoint> {
    frames
        .iter()
        .map(|f| DerivedPoint::new((f.timestamp() - anchor).num_milliseconds(), probe.value(f)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap()
    }

    fn frame(secs: i64, probe1: f64) -> TelemetryFrame {
        TelemetryFrame::new(t0() + Duration::seconds(secs), probe1, 200.0).unwrap()
    }

    #[test]
    fn test_append_in_order() {
        let mut log = TelemetryLog::new();
        assert!(log.is_empty());

        log.append(frame(0, 150.0)).unwrap();
        log.append(frame(2, 151.0)).unwrap();

        assert_eq!(log.len(), 2);
        assert_eq!(log.earliest().unwrap().probe1(), 150.0);
        assert_eq!(log.latest().unwrap().probe1(), 151.0);
    }

    #[test]
    fn test_append_rejects_same_or_older_timestamp() {
        let mut log = TelemetryLog::new();
        log.append(frame(10, 150.0)).unwrap();

        assert!(log.append(frame(10, 151.0)).is_err());
        assert!(log.append(frame(5, 151.0)).is_err());
        assert_eq!(log.len(), 1);
    }

    #[test]
    fn test_from_frames_validates_order() {
        assert!(TelemetryLog::from_frames(vec![frame(0, 150.0), frame(1, 151.0)]).is_ok());
        assert!(TelemetryLog::from_frames(vec![frame(1, 150.0), frame(1, 151.0)]).is_err());
        assert!(TelemetryLog::from_frames(Vec::new()).unwrap().is_empty());
    }

    #[test]
    fn test_since_is_inclusive() {
        let log = TelemetryLog::from_frames(vec![frame(0, 150.0), frame(30, 160.0), frame(60, 170.0)]).unwrap();

        assert_eq!(log.since(t0() + Duration::seconds(30)).len(), 2);
        assert_eq!(log.since(t0() + Duration::seconds(31)).len(), 1);
        assert_eq!(log.since(t0() - Duration::seconds(1)).len(), 3);
        assert!(log.since(t0() + Duration::seconds(61)).is_empty());
    }

    #[test]
    fn test_probe_series_offsets_from_anchor() {
        let log = TelemetryLog::from_frames(vec![frame(0, 150.0), frame(30, 160.0), frame(60, 170.0)]).unwrap();
        let series = log.probe_series(t0() + Duration::seconds(30), Probe::One);

        assert_eq!(
            series,
            vec![DerivedPoint::new(0, 160.0), DerivedPoint::new(30_000, 170.0)]
        );
    }
}
