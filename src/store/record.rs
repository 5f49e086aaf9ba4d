//! # Session Record
//!
//! The persisted form of a [`RoastSession`].
//!
//! Field names are camelCase on disk. Log entries accept the legacy `BT` /
//! `MET` probe names when reading.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::Result;
use crate::session::{RoastSession, TelemetryFrame, DEFAULT_INPUT_MASS};

/// Key of the in-progress session record
pub const ACTIVE_KEY: &str = "active";

/// Prefix of finalized session keys
pub const FINALIZED_PREFIX: &str = "roast_";

/// One persisted telemetry frame
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    pub log_time: DateTime<Utc>,
    #[serde(alias = "BT")]
    pub probe1: f64,
    #[serde(alias = "MET")]
    pub probe2: f64,
}

/// A stored roast session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
    #[serde(default)]
    pub roast_start_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub roast_end_time: Option<DateTime<Utc>>,
    pub coffee_batch_num: u32,
    #[serde(default)]
    pub coffee_name: String,
    #[serde(default = "default_coffee_amount")]
    pub coffee_amount: f64,
    #[serde(default)]
    pub coffee_post_amount: Option<f64>,
    #[serde(default)]
    pub log_data: Vec<LogEntry>,
}

fn default_coffee_amount() -> f64 {
    DEFAULT_INPUT_MASS
}

impl SessionRecord {
    /// Snapshot a session for storage
    #[must_use]
    pub fn from_session(session: &RoastSession) -> Self {
        Self {
            roast_start_time: session.start_time(),
            roast_end_time: session.end_time(),
            coffee_batch_num: session.batch_number,
            coffee_name: session.coffee_name.clone(),
            coffee_amount: session.input_mass,
            coffee_post_amount: session.output_mass,
            log_data: session
                .frames()
                .iter()
                .map(|f| LogEntry {
                    log_time: f.timestamp(),
                    probe1: f.probe1(),
                    probe2: f.probe2(),
                })
                .collect(),
        }
    }

    /// Rebuild the session
    ///
    /// Entries with a reading outside `(0, 600)` are skipped.
    ///
    /// # Errors
    ///
    /// Returns `OutOfOrderFrame` if the entries are not strictly time-ordered.
    pub fn into_session(self) -> Result<RoastSession> {
        let total = self.log_data.len();
        let frames: Vec<TelemetryFrame> = self
            .log_data
            .iter()
            .filter_map(|e| TelemetryFrame::new(e.log_time, e.probe1, e.probe2))
            .collect();

        if frames.len() < total {
            warn!(
                "Skipped {} out-of-range entries in batch #{}",
                total - frames.len(),
                self.coffee_batch_num
            );
        }

        RoastSession::from_parts(
            self.coffee_name,
            self.coffee_batch_num,
            self.coffee_amount,
            self.coffee_post_amount,
            self.roast_start_time,
            self.roast_end_time,
            frames,
        )
    }

    /// Whether the roast was dropped
    #[must_use]
    pub fn is_finalized(&self) -> bool {
        self.roast_start_time.is_some() && self.roast_end_time.is_some()
    }

    /// Storage key: [`ACTIVE_KEY`] until finalized, then derived from the start time
    ///
    /// # Examples
    ///
    /// ```
    /// use chrono::{TimeZone, Utc};
    /// use roast_logger::store::record::SessionRecord;
    ///
    /// let start = Utc.with_ymd_and_hms(2024, 3, 1, 9, 5, 30).unwrap();
    /// let record = SessionRecord {
    ///     roast_start_time: Some(start),
    ///     roast_end_time: Some(start + chrono::Duration::minutes(11)),
    ///     coffee_batch_num: 12,
    ///     coffee_name: "Kenya AA".to_string(),
    ///     coffee_amount: 150.0,
    ///     coffee_post_amount: None,
    ///     log_data: Vec::new(),
    /// };
    /// assert_eq!(record.key(), "roast_20240301T090530000Z");
    /// ```
    #[must_use]
    pub fn key(&self) -> String {
        match (self.roast_start_time, self.is_finalized()) {
            (Some(start), true) => finalized_key(start),
            _ => ACTIVE_KEY.to_string(),
        }
    }
}

/// Key for a roast charged at `start`
#[must_use]
pub fn finalized_key(start: DateTime<Utc>) -> String {
    let stamp: String = start
        .to_rfc3339_opts(SecondsFormat::Millis, true)
        .chars()
        .filter(|c| !matches!(c, ':' | '.' | '-'))
        .collect();
    format!("{}{}", FINALIZED_PREFIX, stamp)
}
