//! # Roast Session Module
//!
//! Telemetry frames, the per-session log, and the roast session lifecycle.
//!
//! This module handles:
//! - Validated two-probe telemetry frames
//! - The append-only, strictly time-ordered telemetry log
//! - Roast session metadata and its charge/drop anchors
//! - The session state machine (connect/start/charge/drop/stop)

use chrono::{DateTime, Duration, Utc};

use crate::error::{Result, RoastLoggerError};
use crate::frame::decoder::decode;
use crate::frame::protocol::is_valid_temperature;

pub mod log;
pub mod state;

pub use log::TelemetryLog;

/// Default green coffee mass in grams for a new session
pub const DEFAULT_INPUT_MASS: f64 = 150.0;

/// Which of the two probes a series is drawn from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Probe {
    /// Bean temperature
    One,
    /// Environment / exhaust temperature
    Two,
}

impl Probe {
    /// Read this probe's value from a frame
    #[must_use]
    pub fn value(self, frame: &TelemetryFrame) -> f64 {
        match self {
            Probe::One => frame.probe1,
            Probe::Two => frame.probe2,
        }
    }
}

/// One timestamped reading of both probes
///
/// Only constructible with both values inside `(0, 600)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TelemetryFrame {
    timestamp: DateTime<Utc>,
    probe1: f64,
    probe2: f64,
}

impl TelemetryFrame {
    /// Create a frame, rejecting out-of-range readings
    ///
    /// # Examples
    ///
    /// ```
    /// use chrono::Utc;
    /// use roast_logger::session::TelemetryFrame;
    ///
    /// assert!(TelemetryFrame::new(Utc::now(), 150.0, 170.0).is_some());
    /// assert!(TelemetryFrame::new(Utc::now(), 0.0, 170.0).is_none());
    /// ```
    #[must_use]
    pub fn new(timestamp: DateTime<Utc>, probe1: f64, probe2: f64) -> Option<Self> {
        if is_valid_temperature(probe1) && is_valid_temperature(probe2) {
            Some(Self { timestamp, probe1, probe2 })
        } else {
            None
        }
    }

    /// Decode a wire frame received at `timestamp`
    #[must_use]
    pub fn from_wire(bytes: &[u8], timestamp: DateTime<Utc>) -> Option<Self> {
        let (probe1, probe2) = decode(bytes)?;
        Self::new(timestamp, probe1, probe2)
    }

    /// When the reading was taken
    #[must_use]
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Probe 1 reading in degrees
    #[must_use]
    pub fn probe1(&self) -> f64 {
        self.probe1
    }

    /// Probe 2 reading in degrees
    #[must_use]
    pub fn probe2(&self) -> f64 {
        self.probe2
    }
}

/// One roast: metadata plus its telemetry log
///
/// `start_time` and `end_time` are only set through the state machine;
/// once `end_time` is set the log is frozen.
#[derive(Debug, Clone, PartialEq)]
pub struct RoastSession {
    pub coffee_name: String,
    pub batch_number: u32,
    /// Green coffee mass in grams
    pub input_mass: f64,
    /// Roasted coffee mass in grams
    pub output_mass: Option<f64>,
    start_time: Option<DateTime<Utc>>,
    end_time: Option<DateTime<Utc>>,
    log: TelemetryLog,
}

impl Default for RoastSession {
    fn default() -> Self {
        Self::new(0)
    }
}

impl RoastSession {
    /// Create an empty, unstarted session
    #[must_use]
    pub fn new(batch_number: u32) -> Self {
        Self {
            coffee_name: String::new(),
            batch_number,
            input_mass: DEFAULT_INPUT_MASS,
            output_mass: None,
            start_time: None,
            end_time: None,
            log: TelemetryLog::new(),
        }
    }

    /// Rebuild a session from stored parts
    ///
    /// # Errors
    ///
    /// Returns `OutOfOrderFrame` if the frames are not strictly ascending.
    pub fn from_parts(
        coffee_name: String,
        batch_number: u32,
        input_mass: f64,
        output_mass: Option<f64>,
        start_time: Option<DateTime<Utc>>,
        end_time: Option<DateTime<Utc>>,
        frames: Vec<TelemetryFrame>,
    ) -> Result<Self> {
        Ok(Self {
            coffee_name,
            batch_number,
            input_mass,
            output_mass,
            start_time,
            end_time,
            log: TelemetryLog::from_frames(frames)?,
        })
    }

    /// Charge time, if the roast has started
    #[must_use]
    pub fn start_time(&self) -> Option<DateTime<Utc>> {
        self.start_time
    }

    /// Drop time, if the roast has ended
    #[must_use]
    pub fn end_time(&self) -> Option<DateTime<Utc>> {
        self.end_time
    }

    /// The telemetry log
    #[must_use]
    pub fn log(&self) -> &TelemetryLog {
        &self.log
    }

    /// All frames in time order
    #[must_use]
    pub fn frames(&self) -> &[TelemetryFrame] {
        self.log.frames()
    }

    /// Whether the roast has been charged
    #[must_use]
    pub fn is_started(&self) -> bool {
        self.start_time.is_some()
    }

    /// Whether the roast has been dropped
    #[must_use]
    pub fn is_ended(&self) -> bool {
        self.end_time.is_some()
    }

    /// An active session has no end time
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.end_time.is_none()
    }

    /// Both charge and drop recorded
    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.start_time.is_some() && self.end_time.is_some()
    }

    /// Reference point for relative offsets: charge time, else the earliest frame
    #[must_use]
    pub fn anchor_time(&self) -> Option<DateTime<Utc>> {
        self.start_time
            .or_else(|| self.log.earliest().map(|f| f.timestamp()))
    }

    /// Append a frame to the log
    ///
    /// # Errors
    ///
    /// - `SessionFrozen` once the session has an end time
    /// - `OutOfOrderFrame` if the frame does not advance the log
    pub fn append(&mut self, frame: TelemetryFrame) -> Result<()> {
        if self.is_ended() {
            return Err(RoastLoggerError::SessionFrozen);
        }
        self.log.append(frame)
    }

    /// Roast duration: `end - start` once dropped, `now - start` while roasting
    #[must_use]
    pub fn roast_duration(&self, now: DateTime<Utc>) -> Option<Duration> {
        let start = self.start_time?;
        Some(self.end_time.unwrap_or(now) - start)
    }

    pub(crate) fn mark_started(&mut self, at: DateTime<Utc>) {
        self.start_time = Some(at);
    }

    pub(crate) fn mark_ended(&mut self, at: DateTime<Utc>) {
        self.end_time = Some(at);
    }
}

/// Format a duration as `m:ss`; negative durations read as `0:00`
///
/// # Examples
///
/// ```
/// use chrono::Duration;
/// use roast_logger::session::format_duration;
///
/// assert_eq!(format_duration(Duration::seconds(605)), "10:05");
/// ```
#[must_use]
pub fn format_duration(duration: Duration) -> String {
    let total = duration.num_seconds().max(0);
    format!("{}:{:02}", total / 60, total % 60)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap()
    }

    fn frame(secs: i64, probe1: f64) -> TelemetryFrame {
        TelemetryFrame::new(t0() + Duration::seconds(secs), probe1, probe1 + 20.0).unwrap()
    }

    #[test]
    fn test_frame_rejects_out_of_range() {
        assert!(TelemetryFrame::new(t0(), 600.0, 100.0).is_none());
        assert!(TelemetryFrame::new(t0(), 100.0, -1.0).is_none());
        assert!(TelemetryFrame::new(t0(), 100.0, 599.9).is_some());
    }

    #[test]
    fn test_frame_from_wire() {
        let frame = TelemetryFrame::from_wire(b"#05DC  06A4\r\n", t0()).unwrap();
        assert_eq!(frame.timestamp(), t0());
        assert_eq!(frame.probe1(), 150.0);
        assert_eq!(frame.probe2(), 170.0);
        assert!(TelemetryFrame::from_wire(b"Err\r\n", t0()).is_none());
    }

    #[test]
    fn test_probe_value() {
        let frame = frame(0, 150.0);
        assert_eq!(Probe::One.value(&frame), 150.0);
        assert_eq!(Probe::Two.value(&frame), 170.0);
    }

    #[test]
    fn test_new_session_defaults() {
        let session = RoastSession::new(7);
        assert_eq!(session.batch_number, 7);
        assert_eq!(session.input_mass, DEFAULT_INPUT_MASS);
        assert!(session.is_active());
        assert!(!session.is_started());
        assert!(session.anchor_time().is_none());
    }

    #[test]
    fn test_anchor_prefers_start_time() {
        let mut session = RoastSession::new(1);
        session.append(frame(0, 150.0)).unwrap();
        session.append(frame(30, 160.0)).unwrap();
        assert_eq!(session.anchor_time(), Some(t0()));

        session.mark_started(t0() + Duration::seconds(30));
        assert_eq!(session.anchor_time(), Some(t0() + Duration::seconds(30)));
    }

    #[test]
    fn test_ended_session_is_frozen() {
        let mut session = RoastSession::new(1);
        session.append(frame(0, 150.0)).unwrap();
        session.mark_started(t0());
        session.mark_ended(t0() + Duration::seconds(600));

        let result = session.append(frame(700, 200.0));
        assert!(matches!(result, Err(RoastLoggerError::SessionFrozen)));
        assert_eq!(session.frames().len(), 1);
        assert!(session.is_completed());
    }

    #[test]
    fn test_roast_duration() {
        let mut session = RoastSession::new(1);
        assert!(session.roast_duration(t0()).is_none());

        session.mark_started(t0());
        let now = t0() + Duration::seconds(90);
        assert_eq!(session.roast_duration(now), Some(Duration::seconds(90)));

        session.mark_ended(t0() + Duration::seconds(720));
        assert_eq!(session.roast_duration(now), Some(Duration::seconds(720)));
    }

    #[test]
    fn test_from_parts_rejects_unordered_frames() {
        let result = RoastSession::from_parts(
            "Kenya".to_string(),
            3,
            150.0,
            None,
            None,
            None,
            vec![frame(10, 150.0), frame(5, 151.0)],
        );
        assert!(matches!(result, Err(RoastLoggerError::OutOfOrderFrame(_))));
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::zero()), "0:00");
        assert_eq!(format_duration(Duration::milliseconds(59_999)), "0:59");
        assert_eq!(format_duration(Duration::seconds(60)), "1:00");
        assert_eq!(format_duration(Duration::seconds(725)), "12:05");
        assert_eq!(format_duration(Duration::seconds(-5)), "0:00");
    }
}
