//! # Roast Logger Application
//!
//! Ties the session state machine, the rate-of-rise chart projection, the
//! reference overlay, the alarm and the session store together.
//!
//! This module handles:
//! - Decoding and logging incoming frames
//! - Running operator commands against the state machine
//! - Persisting the session whenever a transition asks for it
//! - Tracking the roast that `pin` will use as reference
//!
//! Timers and the transport live with the caller. Every method hands back
//! the [`Effect`]s the caller still has to carry out.

use chrono::{DateTime, Utc};
use tracing::{debug, error, info, warn};

use crate::alarm::TemperatureAlarm;
use crate::chart::{ChartProjection, ChartProjector, Readout};
use crate::config::Config;
use crate::error::Result;
use crate::reference::ReferenceAligner;
use crate::session::state::{Effect, RoastStateMachine, SessionState, StartMode};
use crate::session::{format_duration, RoastSession, TelemetryFrame};
use crate::store::{self, SessionRecord, SessionStore};

pub mod command;

pub use command::Command;

/// Outcome of an operator command
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Response {
    /// Effects left for the caller
    pub effects: Vec<Effect>,
    /// Text for the operator
    pub message: Option<String>,
}

impl Response {
    fn effects(effects: Vec<Effect>) -> Self {
        Self { effects, message: None }
    }

    fn message(message: impl Into<String>) -> Self {
        Self {
            effects: Vec::new(),
            message: Some(message.into()),
        }
    }
}

/// The roast logger core
#[derive(Debug)]
pub struct RoastLogger<S> {
    machine: RoastStateMachine,
    aligner: ReferenceAligner,
    projector: ChartProjector,
    alarm: TemperatureAlarm,
    store: S,
    list_limit: usize,
    /// Completed roast `pin` will use
    pin_candidate: Option<RoastSession>,
}

impl<S: SessionStore> RoastLogger<S> {
    pub fn new(config: &Config, store: S) -> Self {
        let processor = config.rate_of_rise_processor();
        Self {
            machine: RoastStateMachine::new(),
            aligner: ReferenceAligner::new(config.reference_lookback(), processor),
            projector: ChartProjector::new(processor),
            alarm: config.alarm(),
            store,
            list_limit: config.store.list_limit,
            pin_candidate: None,
        }
    }

    /// Current lifecycle state
    pub fn state(&self) -> SessionState {
        self.machine.state()
    }

    /// The live session
    pub fn session(&self) -> &RoastSession {
        self.machine.session()
    }

    /// The session store
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Reload the unfinished session of a previous run
    ///
    /// # Errors
    ///
    /// Propagates store and record decoding failures.
    pub fn restore(&mut self) -> Result<()> {
        if let Some(session) = store::restore_active(&self.store)? {
            self.machine.load(session)?;
        }
        Ok(())
    }

    /// Transport came up
    pub fn on_connected(&mut self) -> Vec<Effect> {
        self.machine.connect()
    }

    /// Transport went down
    pub fn on_disconnected(&mut self) -> Vec<Effect> {
        self.machine.disconnect()
    }

    /// Handle one raw frame received at `now`
    ///
    /// Undecodable frames and frames arriving while not polling are dropped.
    /// Returns the latest readout after a frame is logged.
    ///
    /// # Errors
    ///
    /// Returns the state machine's error if the frame cannot be appended.
    pub fn on_frame(&mut self, bytes: &[u8], now: DateTime<Utc>) -> Result<Option<Readout>> {
        if !self.machine.state().is_polling() {
            debug!("Ignoring frame while {}", self.machine.state().name());
            return Ok(None);
        }

        let Some(frame) = TelemetryFrame::from_wire(bytes, now) else {
            debug!("Dropped frame {:?}", String::from_utf8_lossy(bytes));
            return Ok(None);
        };
        self.machine.record_frame(frame)?;

        let readout = self.projection().readout();
        if let Some(announcement) = self.alarm.evaluate(&readout) {
            warn!("{}", announcement);
        }
        Ok(Some(readout))
    }

    /// Chart series for the live session and any pinned reference
    pub fn projection(&mut self) -> ChartProjection {
        let live_charged = self.machine.session().is_started();
        let overlay = self.aligner.overlay(live_charged);
        self.projector.project(self.machine.session(), overlay)
    }

    /// Duration readout, `m:ss`
    pub fn duration_readout(&self, now: DateTime<Utc>) -> Option<String> {
        self.machine.elapsed(now).map(format_duration)
    }

    /// Run an operator command
    ///
    /// `Persist` effects are carried out here; the rest are returned. A failed
    /// save does not fail the command: the transition already happened, so its
    /// effects are still returned and the failure is reported in the message.
    ///
    /// # Errors
    ///
    /// Returns the guard, store or validation error that refused the command.
    /// The state is unchanged when a transition is refused.
    pub fn execute(&mut self, command: Command, now: DateTime<Utc>) -> Result<Response> {
        let effects = match command {
            Command::Start { confirm } => {
                let batch_number = store::next_batch_number(&self.store)?;
                let mode = StartMode::Fresh {
                    batch_number,
                    discard_confirmed: confirm,
                };
                self.machine.start_logging(mode, now)?
            }
            Command::Resume => self.machine.start_logging(StartMode::Resume, now)?,
            Command::Stop => self.machine.stop_logging()?,
            Command::Charge => self.machine.charge()?,
            Command::Drop => {
                let effects = self.machine.drop_roast(now)?;
                self.pin_candidate = Some(self.machine.session().clone());
                effects
            }
            Command::Save => self.machine.save()?,
            Command::Load(key) => return self.load(&key),
            Command::List => return self.list(),
            Command::Pin => return self.pin(),
            Command::Unpin => {
                self.aligner.unpin();
                Vec::new()
            }
            Command::Name(name) => {
                self.machine.set_coffee_name(name)?;
                Vec::new()
            }
            Command::InputMass(grams) => {
                self.machine.set_input_mass(grams)?;
                Vec::new()
            }
            Command::OutputMass(grams) => {
                self.machine.set_output_mass(grams)?;
                Vec::new()
            }
            Command::Status => return Ok(Response::message(self.status(now))),
            Command::Help => return Ok(Response::message(command::HELP)),
            Command::Quit => Vec::new(),
        };

        Ok(self.persist_requested(effects))
    }

    fn persist_requested(&mut self, effects: Vec<Effect>) -> Response {
        let (persist, rest): (Vec<Effect>, Vec<Effect>) =
            effects.into_iter().partition(|e| *e == Effect::Persist);
        let mut response = Response::effects(rest);

        if !persist.is_empty() {
            if let Err(e) = store::persist_session(&mut self.store, self.machine.session()) {
                error!("Failed to save batch #{}: {}", self.machine.session().batch_number, e);
                response.message = Some(format!("Save failed: {}", e));
            }
        }
        response
    }

    fn load(&mut self, key: &str) -> Result<Response> {
        let session = store::load_session(&self.store, key)?;
        self.machine.load(session.clone())?;

        let message = format!(
            "Loaded batch #{} {} ({} frames)",
            session.batch_number,
            session.coffee_name,
            session.frames().len()
        );
        if session.is_completed() {
            self.pin_candidate = Some(session);
        }
        Ok(Response::message(message))
    }

    fn list(&self) -> Result<Response> {
        let records = self.store.list_finalized(self.list_limit)?;
        if records.is_empty() {
            return Ok(Response::message("No roasts stored"));
        }

        let lines: Vec<String> = records.iter().map(summary_line).collect();
        Ok(Response::message(lines.join("\n")))
    }

    fn pin(&mut self) -> Result<Response> {
        let candidate = self
            .pin_candidate
            .clone()
            .unwrap_or_else(|| self.machine.session().clone());
        self.aligner.pin(candidate)?;

        let batch = self.aligner.reference().map_or(0, |r| r.batch_number());
        info!("Reference overlay: batch #{}", batch);
        Ok(Response::message(format!("Pinned batch #{} as reference", batch)))
    }

    fn status(&mut self, now: DateTime<Utc>) -> String {
        let elapsed = self.duration_readout(now).unwrap_or_else(|| "-".to_string());
        let readout = self.projection().readout();
        let session = self.machine.session();

        let mut status = format!(
            "{} | batch #{} {} | {} g | {} frames | {}",
            self.machine.state().name(),
            session.batch_number,
            if session.coffee_name.is_empty() { "(unnamed)" } else { session.coffee_name.as_str() },
            session.input_mass,
            session.frames().len(),
            elapsed,
        );
        if let (Some(probe1), Some(probe2)) = (readout.probe1, readout.probe2) {
            status.push_str(&format!(" | {:.1} / {:.1}", probe1, probe2));
        }
        if let Some(rate) = readout.rate_of_rise1 {
            status.push_str(&format!(" | RoR {:.1}", rate));
        }
        if let Some(reference) = self.aligner.reference() {
            status.push_str(&format!(" | ref #{}", reference.batch_number()));
        }
        status
    }
}

fn summary_line(record: &SessionRecord) -> String {
    let duration = match (record.roast_start_time, record.roast_end_time) {
        (Some(start), Some(end)) => format_duration(end - start),
        _ => "-".to_string(),
    };
    let started = record
        .roast_start_time
        .map_or_else(|| "-".to_string(), |t| t.format("%Y-%m-%d %H:%M").to_string());
    format!(
        "{}  #{}  {}  {}  {}",
        record.key(),
        record.coffee_batch_num,
        started,
        duration,
        record.coffee_name
    )
}
