//! # Line Framing
//!
//! The bridge answers each poll with one line ending in `\n`. Frames are
//! yielded with their terminator so the decoder sees the exact response.

use bytes::{Bytes, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, warn};

use crate::error::{Result, RoastLoggerError};

/// Longest line kept while waiting for a terminator
pub const MAX_LINE_LEN: usize = 256;

/// Reads newline-terminated frames from the bridge
#[derive(Debug)]
pub struct FrameReader<R> {
    inner: R,
    buf: BytesMut,
}

impl<R: AsyncRead + Unpin> FrameReader<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(MAX_LINE_LEN),
        }
    }

    /// Next complete frame, or `None` once the stream closes
    ///
    /// A partial line left at close is discarded.
    ///
    /// # Errors
    ///
    /// Returns `Serial` if the read fails.
    pub async fn next_frame(&mut self) -> Result<Option<Bytes>> {
        loop {
            if let Some(pos) = self.buf.iter().position(|&b| b == b'\n') {
                return Ok(Some(self.buf.split_to(pos + 1).freeze()));
            }

            if self.buf.len() > MAX_LINE_LEN {
                warn!("Discarding {} bytes without a line terminator", self.buf.len());
                self.buf.clear();
            }

            let read = self
                .inner
                .read_buf(&mut self.buf)
                .await
                .map_err(|e| RoastLoggerError::Serial(format!("Failed to read frame: {}", e)))?;

            if read == 0 {
                if !self.buf.is_empty() {
                    debug!("Stream closed with {} unterminated bytes", self.buf.len());
                }
                return Ok(None);
            }
        }
    }
}

/// Writes the poll command to the bridge
#[derive(Debug)]
pub struct CommandWriter<W> {
    inner: W,
    command: Bytes,
}

impl<W: AsyncWrite + Unpin> CommandWriter<W> {
    pub fn new(inner: W, command: &str) -> Self {
        Self {
            inner,
            command: Bytes::copy_from_slice(command.as_bytes()),
        }
    }

    /// Send one poll
    ///
    /// # Errors
    ///
    /// Returns `Serial` if the write or flush fails.
    pub async fn send_poll(&mut self) -> Result<()> {
        self.inner
            .write_all(&self.command)
            .await
            .map_err(|e| RoastLoggerError::Serial(format!("Failed to write poll: {}", e)))?;

        self.inner
            .flush()
            .await
            .map_err(|e| RoastLoggerError::Serial(format!("Failed to flush serial port: {}", e)))?;

        debug!("Sent poll ({} bytes)", self.command.len());
        Ok(())
    }
}
