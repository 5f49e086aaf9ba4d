//! # Configuration Module
//!
//! Handles loading and validating configuration from TOML files.
//!
//! Every section and key is optional; omitted values take the defaults
//! below.

use serde::de::Error;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::alarm::TemperatureAlarm;
use crate::error::{Result, RoastLoggerError};
use crate::frame::protocol::is_valid_temperature;
use crate::serial::ReconnectPolicy;
use crate::signal::rate_of_rise::RateOfRiseProcessor;

/// Main configuration structure
#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub serial: SerialConfig,
    #[serde(default)]
    pub polling: PollingConfig,
    #[serde(default)]
    pub reconnect: ReconnectConfig,
    #[serde(default)]
    pub rate_of_rise: RateOfRiseConfig,
    #[serde(default)]
    pub reference: ReferenceConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub alarm: AlarmConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Serial port configuration
#[derive(Debug, Deserialize, Clone)]
pub struct SerialConfig {
    #[serde(default = "default_serial_port")]
    pub port: String,

    #[serde(default = "default_baud_rate")]
    pub baud_rate: u32,

    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

/// Poll timer configuration
#[derive(Debug, Deserialize, Clone)]
pub struct PollingConfig {
    #[serde(default = "default_poll_interval_ms")]
    pub interval_ms: u64,

    #[serde(default = "default_poll_command")]
    pub command: String,
}

/// Reconnect backoff configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ReconnectConfig {
    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,

    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,

    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
}

/// Rate-of-rise pipeline configuration
#[derive(Debug, Deserialize, Clone)]
pub struct RateOfRiseConfig {
    #[serde(default = "default_resample_step_ms")]
    pub resample_step_ms: i64,

    #[serde(default = "default_smoothing_window")]
    pub smoothing_window: usize,
}

/// Reference overlay configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ReferenceConfig {
    #[serde(default = "default_lookback_minutes")]
    pub lookback_minutes: i64,
}

/// Session store configuration
#[derive(Debug, Deserialize, Clone)]
pub struct StoreConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: String,

    #[serde(default = "default_collection")]
    pub collection: String,

    #[serde(default = "default_list_limit")]
    pub list_limit: usize,
}

/// Alarm configuration
#[derive(Debug, Deserialize, Clone)]
pub struct AlarmConfig {
    #[serde(default)]
    pub enabled: bool,

    #[serde(default = "default_max_temp")]
    pub max_temp: f64,

    #[serde(default)]
    pub max_rate_of_rise: Option<f64>,
}

/// Log output configuration
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_log_dir")]
    pub log_dir: String,

    #[serde(default)]
    pub file_logging: bool,
}

// Default value functions
/// Longest accepted rate-of-rise resample step (10 min)
pub const MAX_RESAMPLE_STEP_MS: i64 = 600_000;

/// Longest accepted reference lookback (24 h)
pub const MAX_LOOKBACK_MINUTES: i64 = 24 * 60;

fn default_serial_port() -> String { "/dev/rfcomm0".to_string() }
fn default_baud_rate() -> u32 { crate::serial::DEFAULT_BAUD_RATE }
fn default_timeout_ms() -> u64 { 500 }

fn default_poll_interval_ms() -> u64 { 1000 }
fn default_poll_command() -> String { crate::frame::protocol::POLL_COMMAND.to_string() }

fn default_initial_delay_ms() -> u64 { crate::serial::reconnect::DEFAULT_INITIAL_DELAY_MS }
fn default_max_delay_ms() -> u64 { crate::serial::reconnect::DEFAULT_MAX_DELAY_MS }
fn default_max_attempts() -> u32 { crate::serial::reconnect::DEFAULT_MAX_ATTEMPTS }

fn default_resample_step_ms() -> i64 { crate::signal::rate_of_rise::DEFAULT_RESAMPLE_STEP_MS }
fn default_smoothing_window() -> usize { crate::signal::rate_of_rise::DEFAULT_SMOOTHING_WINDOW }

fn default_lookback_minutes() -> i64 { crate::reference::DEFAULT_LOOKBACK_MINUTES }

fn default_data_dir() -> String { "./roasts".to_string() }
fn default_collection() -> String { "roast_logs".to_string() }
fn default_list_limit() -> usize { 20 }

fn default_max_temp() -> f64 { crate::alarm::DEFAULT_MAX_TEMP }

fn default_log_dir() -> String { "./logs".to_string() }

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            port: default_serial_port(),
            baud_rate: default_baud_rate(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_poll_interval_ms(),
            command: default_poll_command(),
        }
    }
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            initial_delay_ms: default_initial_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            max_attempts: default_max_attempts(),
        }
    }
}

impl Default for RateOfRiseConfig {
    fn default() -> Self {
        Self {
            resample_step_ms: default_resample_step_ms(),
            smoothing_window: default_smoothing_window(),
        }
    }
}

impl Default for ReferenceConfig {
    fn default() -> Self {
        Self {
            lookback_minutes: default_lookback_minutes(),
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            collection: default_collection(),
            list_limit: default_list_limit(),
        }
    }
}

impl Default for AlarmConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            max_temp: default_max_temp(),
            max_rate_of_rise: None,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_dir: default_log_dir(),
            file_logging: false,
        }
    }
}

fn invalid(message: impl std::fmt::Display) -> RoastLoggerError {
    RoastLoggerError::Config(toml::de::Error::custom(message))
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the configuration file
    ///
    /// # Returns
    ///
    /// * `Result<Config>` - Loaded and validated configuration
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - File cannot be read
    /// - TOML parsing fails
    /// - Validation fails
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use roast_logger::config::Config;
    ///
    /// let config = Config::load("config/default.toml")?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    ///
    /// # Errors
    ///
    /// Returns `Config` naming the first value out of its valid range.
    pub fn validate(&self) -> Result<()> {
        // Serial (an empty port means auto-detect)
        if ![9600, 19200, 38400, 57600, 115200].contains(&self.serial.baud_rate) {
            return Err(invalid("baud_rate must be one of: 9600, 19200, 38400, 57600, 115200"));
        }

        if self.serial.timeout_ms == 0 || self.serial.timeout_ms > 10000 {
            return Err(invalid("timeout_ms must be between 1 and 10000"));
        }

        // Polling
        if !(100..=60000).contains(&self.polling.interval_ms) {
            return Err(invalid("polling interval_ms must be between 100 and 60000"));
        }

        if self.polling.command.is_empty() {
            return Err(invalid("polling command cannot be empty"));
        }

        // Reconnect
        if self.reconnect.initial_delay_ms == 0 {
            return Err(invalid("initial_delay_ms must be greater than 0"));
        }

        if self.reconnect.initial_delay_ms > self.reconnect.max_delay_ms {
            return Err(invalid("initial_delay_ms must not exceed max_delay_ms"));
        }

        if self.reconnect.max_attempts == 0 {
            return Err(invalid("max_attempts must be greater than 0"));
        }

        // Rate of rise
        if !(1..=MAX_RESAMPLE_STEP_MS).contains(&self.rate_of_rise.resample_step_ms) {
            return Err(invalid("resample_step_ms must be between 1 and 600000"));
        }

        if !(1..=60).contains(&self.rate_of_rise.smoothing_window) {
            return Err(invalid("smoothing_window must be between 1 and 60"));
        }

        // Reference
        if !(1..=MAX_LOOKBACK_MINUTES).contains(&self.reference.lookback_minutes) {
            return Err(invalid("lookback_minutes must be between 1 and 1440"));
        }

        // Store
        if self.store.data_dir.is_empty() {
            return Err(invalid("store data_dir cannot be empty"));
        }

        if self.store.collection.is_empty()
            || !self
                .store
                .collection
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            return Err(invalid("store collection must be a non-empty name of letters, digits, '_' or '-'"));
        }

        if self.store.list_limit == 0 {
            return Err(invalid("list_limit must be greater than 0"));
        }

        // Alarm
        if !is_valid_temperature(self.alarm.max_temp) {
            return Err(invalid("alarm max_temp must be between 0 and 600 (exclusive)"));
        }

        if let Some(rate) = self.alarm.max_rate_of_rise {
            if !(rate > 0.0 && rate.is_finite()) {
                return Err(invalid("alarm max_rate_of_rise must be a positive number"));
            }
        }

        // Logging
        if self.logging.file_logging && self.logging.log_dir.is_empty() {
            return Err(invalid("log_dir cannot be empty when file_logging is enabled"));
        }

        Ok(())
    }

    /// Time between polls
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.polling.interval_ms)
    }

    /// Serial read/write timeout
    pub fn serial_timeout(&self) -> Duration {
        Duration::from_millis(self.serial.timeout_ms)
    }

    /// Backoff policy for transport reconnects
    pub fn reconnect_policy(&self) -> ReconnectPolicy {
        ReconnectPolicy::new(
            Duration::from_millis(self.reconnect.initial_delay_ms),
            Duration::from_millis(self.reconnect.max_delay_ms),
            self.reconnect.max_attempts,
        )
    }

    /// Rate-of-rise pipeline parameters
    pub fn rate_of_rise_processor(&self) -> RateOfRiseProcessor {
        RateOfRiseProcessor::new(self.rate_of_rise.resample_step_ms, self.rate_of_rise.smoothing_window)
    }

    /// Pre-charge window of the reference overlay
    pub fn reference_lookback(&self) -> chrono::Duration {
        chrono::Duration::minutes(self.reference.lookback_minutes)
    }

    /// Alarm limits
    pub fn alarm(&self) -> TemperatureAlarm {
        TemperatureAlarm {
            enabled: self.alarm.enabled,
            max_temp: self.alarm.max_temp,
            max_rate_of_rise: self.alarm.max_rate_of_rise,
        }
    }
}
