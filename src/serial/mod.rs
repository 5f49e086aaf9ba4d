//! # Serial Communication Module
//!
//! Handles the serial link to the thermometer bridge.
//!
//! This module handles:
//! - Opening the bridge's serial port (8N1, configurable baud)
//! - Splitting the byte stream into response frames
//! - Writing the poll command
//! - Backoff between reconnect attempts

use std::time::Duration;

use tokio::io::{ReadHalf, WriteHalf};
use tokio_serial::{SerialPortBuilderExt, SerialStream};
use tracing::{debug, info, warn};

use crate::error::{Result, RoastLoggerError};

pub mod framing;
pub mod reconnect;

pub use framing::{CommandWriter, FrameReader};
pub use reconnect::ReconnectPolicy;

/// Default bridge baud rate
pub const DEFAULT_BAUD_RATE: u32 = 9600;

/// Default serial read/write timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(500);

/// Bridge device paths to try when none is configured (in order of preference)
pub const DEFAULT_DEVICE_PATHS: &[&str] = &[
    "/dev/rfcomm0", // Bluetooth SPP bridge
    "/dev/ttyUSB0", // USB-to-serial adapter
];

/// Thermometer bridge serial port
pub struct ProbeSerial {
    port: SerialStream,
    device_path: String,
}

impl std::fmt::Debug for ProbeSerial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProbeSerial")
            .field("device_path", &self.device_path)
            .finish_non_exhaustive()
    }
}

impl ProbeSerial {
    /// Open the first bridge found on the default device paths
    ///
    /// # Errors
    ///
    /// Returns `SerialPortNotFound` if none of the paths can be opened.
    pub fn open(baud_rate: u32, timeout: Duration) -> Result<Self> {
        Self::open_with_paths(DEFAULT_DEVICE_PATHS, baud_rate, timeout)
    }

    /// Open the first of `paths` that succeeds
    ///
    /// # Arguments
    ///
    /// * `paths` - Device paths to try (e.g., &["/dev/rfcomm0"])
    /// * `baud_rate` - Line speed
    /// * `timeout` - Read/write timeout
    ///
    /// # Errors
    ///
    /// Returns `SerialPortNotFound` listing every path tried.
    pub fn open_with_paths(paths: &[&str], baud_rate: u32, timeout: Duration) -> Result<Self> {
        for path in paths {
            debug!("Trying to open serial port: {}", path);

            match Self::open_port(path, baud_rate, timeout) {
                Ok(port) => {
                    info!("Opened thermometer bridge at {} ({} baud)", path, baud_rate);
                    return Ok(Self {
                        port,
                        device_path: path.to_string(),
                    });
                }
                Err(e) => warn!("Failed to open {}: {}", path, e),
            }
        }

        Err(RoastLoggerError::SerialPortNotFound(paths.join(", ")))
    }

    fn open_port(path: &str, baud_rate: u32, timeout: Duration) -> Result<SerialStream> {
        tokio_serial::new(path, baud_rate)
            .data_bits(tokio_serial::DataBits::Eight)
            .parity(tokio_serial::Parity::None)
            .stop_bits(tokio_serial::StopBits::One)
            .flow_control(tokio_serial::FlowControl::None)
            .timeout(timeout)
            .open_native_async()
            .map_err(|e| RoastLoggerError::Serial(format!("Failed to open {}: {}", path, e)))
    }

    /// Path of the opened device
    pub fn device_path(&self) -> &str {
        &self.device_path
    }

    /// Split into an independent frame reader and poll writer
    pub fn into_split(
        self,
        poll_command: &str,
    ) -> (FrameReader<ReadHalf<SerialStream>>, CommandWriter<WriteHalf<SerialStream>>) {
        let (reader, writer) = tokio::io::split(self.port);
        (FrameReader::new(reader), CommandWriter::new(writer, poll_command))
    }
}
