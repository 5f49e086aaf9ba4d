//! # Temperature Alarm
//!
//! Evaluates the latest readout against the configured limits and returns
//! the announcement to play. Playback itself happens elsewhere.

use crate::chart::Readout;

/// Default probe-1 limit in degrees
pub const DEFAULT_MAX_TEMP: f64 = 220.0;

/// Probe-1 temperature and rate-of-rise limits
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TemperatureAlarm {
    pub enabled: bool,
    pub max_temp: f64,
    /// Degrees per minute; `None` disables the rate check
    pub max_rate_of_rise: Option<f64>,
}

impl Default for TemperatureAlarm {
    fn default() -> Self {
        Self {
            enabled: false,
            max_temp: DEFAULT_MAX_TEMP,
            max_rate_of_rise: None,
        }
    }
}

impl TemperatureAlarm {
    /// Announcement for `readout`, if any limit is exceeded
    ///
    /// Temperature takes precedence over rate of rise.
    ///
    /// # Examples
    ///
    /// ```
    /// use roast_logger::alarm::TemperatureAlarm;
    /// use roast_logger::chart::Readout;
    ///
    /// let alarm = TemperatureAlarm { enabled: true, max_temp: 200.0, max_rate_of_rise: None };
    /// let readout = Readout { probe1: Some(205.5), ..Readout::default() };
    /// assert_eq!(alarm.evaluate(&readout).as_deref(), Some("Temp is 205.5"));
    /// ```
    #[must_use]
    pub fn evaluate(&self, readout: &Readout) -> Option<String> {
        if !self.enabled {
            return None;
        }

        if let Some(temp) = readout.probe1.filter(|&t| t > self.max_temp) {
            return Some(format!("Temp is {}", temp));
        }

        let limit = self.max_rate_of_rise?;
        readout
            .rate_of_rise1
            .filter(|&rate| rate > limit)
            .map(|rate| format!("Rate of rise is {:.1}", rate))
    }
}
