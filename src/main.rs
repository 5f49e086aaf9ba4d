//! # Roast Logger
//!
//! Log coffee roasts from a two-probe thermometer bridge.
//!
//! Polls the bridge over its serial link, logs both probe temperatures,
//! and takes operator commands (`start`, `charge`, `drop`, ...) on stdin.
//!
//! # Control Flow
//!
//! 1. **Initialization**
//!    - Load configuration (first argument, else `config/default.toml`)
//!    - Set up logging with tracing subscriber
//!    - Open the session store and restore an unfinished roast
//!    - Connect to the bridge
//!
//! 2. **Main Loop**
//!    - Send the poll command every interval while logging
//!    - Log frames as they arrive
//!    - Print the roast duration every second
//!    - Run operator commands
//!    - Reconnect with backoff when the link drops
//!
//! 3. **Graceful Shutdown** on `quit` or Ctrl+C

use std::path::Path;

use anyhow::{Context, Result};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use tokio::io::{AsyncBufReadExt, BufReader, WriteHalf};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval, sleep_until, Duration, Instant, MissedTickBehavior};
use tokio_serial::SerialStream;
use tracing::{debug, error, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

use roast_logger::app::{Command, RoastLogger};
use roast_logger::config::{Config, LoggingConfig};
use roast_logger::error::RoastLoggerError;
use roast_logger::serial::{CommandWriter, FrameReader, ProbeSerial, ReconnectPolicy};
use roast_logger::session::state::Effect;
use roast_logger::store::JsonFileStore;

/// Configuration file used when no path is given
const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// Duration readout period
const DURATION_TICK: Duration = Duration::from_secs(1);

/// Log file name prefix (rotated daily)
const LOG_FILE_PREFIX: &str = "roast-logger.log";

/// Event from the serial reader task, tagged with its link generation
#[derive(Debug)]
enum LinkEvent {
    Frame(u64, Bytes, DateTime<Utc>),
    Closed(u64),
}

/// Timers and transport owned by the main loop
struct Driver {
    config: Config,
    events: mpsc::Sender<LinkEvent>,
    writer: Option<CommandWriter<WriteHalf<SerialStream>>>,
    reader_task: Option<JoinHandle<()>>,
    link_generation: u64,
    reconnect: ReconnectPolicy,
    reconnect_at: Option<Instant>,
    polling: bool,
    duration_timer: bool,
}

impl Driver {
    fn new(config: Config, events: mpsc::Sender<LinkEvent>) -> Self {
        let reconnect = config.reconnect_policy();
        Self {
            config,
            events,
            writer: None,
            reader_task: None,
            link_generation: 0,
            reconnect,
            reconnect_at: None,
            polling: false,
            duration_timer: false,
        }
    }

    /// Open the configured port and start its reader task
    fn connect(&mut self) -> roast_logger::error::Result<()> {
        let baud_rate = self.config.serial.baud_rate;
        let timeout = self.config.serial_timeout();
        let serial = if self.config.serial.port.is_empty() {
            ProbeSerial::open(baud_rate, timeout)?
        } else {
            ProbeSerial::open_with_paths(&[self.config.serial.port.as_str()], baud_rate, timeout)?
        };
        info!("Bridge connected at: {}", serial.device_path());

        let (reader, writer) = serial.into_split(&self.config.polling.command);
        self.link_generation += 1;
        self.writer = Some(writer);
        self.reader_task = Some(tokio::spawn(read_frames(
            reader,
            self.link_generation,
            self.events.clone(),
        )));
        self.reconnect.reset();
        self.reconnect_at = None;
        Ok(())
    }

    /// Drop the current link
    fn close_link(&mut self) {
        self.writer = None;
        if let Some(task) = self.reader_task.take() {
            task.abort();
        }
    }

    fn apply(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            debug!("Effect: {:?}", effect);
            match effect {
                Effect::StartPolling => self.polling = true,
                Effect::StopPolling => self.polling = false,
                Effect::StartDurationTimer => self.duration_timer = true,
                Effect::StopDurationTimer => self.duration_timer = false,
                Effect::ScheduleReconnect => self.schedule_reconnect(),
                // Carried out by the application before effects reach here
                Effect::Persist => {}
            }
        }
    }

    fn schedule_reconnect(&mut self) {
        match self.reconnect.next_delay() {
            Ok(delay) => self.reconnect_at = Some(Instant::now() + delay),
            Err(e) => {
                error!("{}; restart to try again", e);
                self.reconnect_at = None;
            }
        }
    }
}

/// Forward frames from the bridge until the link closes
async fn read_frames(
    mut reader: FrameReader<tokio::io::ReadHalf<SerialStream>>,
    generation: u64,
    events: mpsc::Sender<LinkEvent>,
) {
    loop {
        match reader.next_frame().await {
            Ok(Some(frame)) => {
                if events.send(LinkEvent::Frame(generation, frame, Utc::now())).await.is_err() {
                    return;
                }
            }
            Ok(None) => {
                warn!("Bridge closed the link");
                break;
            }
            Err(e) => {
                warn!("{}", e);
                break;
            }
        }
    }
    let _ = events.send(LinkEvent::Closed(generation)).await;
}

/// Load the configuration from `path`, else the default file, else built-in defaults
fn load_config(path: Option<String>) -> Result<Config> {
    match path {
        Some(path) => Config::load(&path).with_context(|| format!("Failed to load config from {}", path)),
        None if Path::new(DEFAULT_CONFIG_PATH).exists() => Config::load(DEFAULT_CONFIG_PATH)
            .with_context(|| format!("Failed to load config from {}", DEFAULT_CONFIG_PATH)),
        None => Ok(Config::default()),
    }
}

/// Console logging, plus a daily rolling file when enabled
///
/// The returned guard must be held until exit to flush the file writer.
fn init_logging(config: &LoggingConfig) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter).with(fmt::layer());

    if config.file_logging {
        let appender = tracing_appender::rolling::daily(&config.log_dir, LOG_FILE_PREFIX);
        let (writer, guard) = tracing_appender::non_blocking(appender);
        registry
            .with(fmt::layer().with_writer(writer).with_ansi(false))
            .init();
        Some(guard)
    } else {
        registry.init();
        None
    }
}

/// Main entry point for Roast Logger
///
/// # Errors
///
/// Returns error if the configuration is invalid or the session store
/// cannot be opened. A missing bridge or an unreadable active record is not
/// fatal; reconnects are retried with backoff.
#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let config = load_config(std::env::args().nth(1))?;
    let _log_guard = init_logging(&config.logging);

    info!("Roast Logger v{} starting...", env!("CARGO_PKG_VERSION"));

    let store = JsonFileStore::open(&config.store.data_dir, &config.store.collection)
        .context("Failed to open session store")?;
    let mut app = RoastLogger::new(&config, store);
    if let Err(e) = app.restore() {
        error!("Failed to restore the active roast: {}", e);
        println!("Could not restore the unfinished roast ({}); starting empty", e);
    }

    let (events_tx, mut events) = mpsc::channel(64);
    let mut poll = interval(config.poll_interval());
    poll.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut duration_tick = interval(DURATION_TICK);
    let mut driver = Driver::new(config, events_tx);

    match driver.connect() {
        Ok(()) => {
            let effects = app.on_connected();
            driver.apply(effects);
        }
        Err(e) => {
            warn!("{}", e);
            driver.apply(vec![Effect::ScheduleReconnect]);
        }
    }

    let mut stdin = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;
    info!("Type 'help' for commands. Press Ctrl+C to exit");

    loop {
        tokio::select! {
            _ = poll.tick(), if driver.polling && driver.writer.is_some() => {
                if let Some(writer) = driver.writer.as_mut() {
                    // Retried on the next tick; a dead link is reported by the reader
                    if let Err(e) = writer.send_poll().await {
                        warn!("{}", e);
                    }
                }
            }

            Some(event) = events.recv() => match event {
                LinkEvent::Frame(generation, frame, received_at) if generation == driver.link_generation => {
                    match app.on_frame(&frame, received_at) {
                        Ok(Some(readout)) => debug!("Readout: {:?}", readout),
                        Ok(None) => {}
                        Err(e) => warn!("Frame not logged: {}", e),
                    }
                }
                LinkEvent::Closed(generation) if generation == driver.link_generation => {
                    driver.close_link();
                    let effects = app.on_disconnected();
                    driver.apply(effects);
                }
                stale => debug!("Ignoring event from a previous link: {:?}", stale),
            },

            _ = duration_tick.tick(), if driver.duration_timer => {
                if let Some(elapsed) = app.duration_readout(Utc::now()) {
                    info!("Duration {}", elapsed);
                }
            }

            _ = sleep_until(driver.reconnect_at.unwrap_or_else(Instant::now)), if driver.reconnect_at.is_some() => {
                driver.reconnect_at = None;
                match driver.connect() {
                    Ok(()) => {
                        let effects = app.on_connected();
                        driver.apply(effects);
                    }
                    Err(e) => {
                        warn!("{}", e);
                        driver.apply(vec![Effect::ScheduleReconnect]);
                    }
                }
            }

            line = stdin.next_line(), if stdin_open => match line {
                Ok(Some(line)) if line.trim().is_empty() => {}
                Ok(Some(line)) => match line.parse::<Command>() {
                    Ok(Command::Quit) => break,
                    Ok(command) => match app.execute(command, Utc::now()) {
                        Ok(response) => {
                            if let Some(message) = response.message {
                                println!("{}", message);
                            }
                            driver.apply(response.effects);
                        }
                        Err(e) => println!("{}", e),
                    },
                    Err(e @ RoastLoggerError::InvalidCommand(_)) => println!("{} (type 'help')", e),
                    Err(e) => println!("{}", e),
                },
                Ok(None) => {
                    debug!("Stdin closed; commands disabled");
                    stdin_open = false;
                }
                Err(e) => {
                    warn!("Failed to read command: {}", e);
                    stdin_open = false;
                }
            },

            _ = tokio::signal::ctrl_c() => {
                info!("Received Ctrl+C, shutting down...");
                break;
            }
        }
    }

    driver.close_link();
    info!("Logged {} frames in batch #{}", app.session().frames().len(), app.session().batch_number);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use roast_logger::serial::DEFAULT_DEVICE_PATHS;

    #[test]
    fn test_constants() {
        assert_eq!(DEFAULT_CONFIG_PATH, "config/default.toml");
        assert_eq!(DURATION_TICK, Duration::from_secs(1));
    }

    #[test]
    fn test_load_config_explicit_path() {
        use std::io::Write;
        use tempfile::NamedTempFile;

        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"[serial]\nport = \"/dev/ttyUSB1\"\n").unwrap();
        file.flush().unwrap();

        let config = load_config(Some(file.path().display().to_string())).unwrap();
        assert_eq!(config.serial.port, "/dev/ttyUSB1");
    }

    #[test]
    fn test_load_config_missing_explicit_path() {
        assert!(load_config(Some("/nonexistent/roast.toml".to_string())).is_err());
    }

    #[tokio::test]
    async fn test_driver_applies_timer_effects() {
        let (tx, _rx) = mpsc::channel(1);
        let mut driver = Driver::new(Config::default(), tx);

        driver.apply(vec![Effect::StartPolling, Effect::StartDurationTimer, Effect::Persist]);
        assert!(driver.polling);
        assert!(driver.duration_timer);

        driver.apply(vec![Effect::StopPolling, Effect::StopDurationTimer]);
        assert!(!driver.polling);
        assert!(!driver.duration_timer);
    }

    #[tokio::test]
    async fn test_driver_schedules_reconnect_until_exhausted() {
        let mut config = Config::default();
        config.reconnect.max_attempts = 1;
        let (tx, _rx) = mpsc::channel(1);
        let mut driver = Driver::new(config, tx);

        driver.apply(vec![Effect::ScheduleReconnect]);
        assert!(driver.reconnect_at.is_some());

        driver.apply(vec![Effect::ScheduleReconnect]);
        assert!(driver.reconnect_at.is_none());
    }

    #[tokio::test]
    async fn test_driver_connect_to_missing_port_fails() {
        let mut config = Config::default();
        config.serial.port = "/dev/nonexistent_bridge_12345".to_string();
        let (tx, _rx) = mpsc::channel(1);
        let mut driver = Driver::new(config, tx);

        assert!(driver.connect().is_err());
        assert!(driver.writer.is_none());
    }

    #[tokio::test]
    async fn test_driver_empty_port_tries_default_paths() {
        let mut config = Config::default();
        config.serial.port = String::new();
        let (tx, _rx) = mpsc::channel(1);
        let mut driver = Driver::new(config, tx);

        match driver.connect() {
            Err(RoastLoggerError::SerialPortNotFound(tried)) => {
                for path in DEFAULT_DEVICE_PATHS {
                    assert!(tried.contains(path), "{} not tried", path);
                }
            }
            Ok(()) => assert!(driver.writer.is_some()),
            Err(e) => panic!("Expected SerialPortNotFound, got: {}", e),
        }
    }
}
