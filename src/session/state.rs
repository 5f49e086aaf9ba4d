//! # Roast Session State Machine
//!
//! Owns the active [`RoastSession`] and decides which lifecycle actions are
//! legal. Every action is guarded by an explicit predicate; an action taken
//! off-guard returns `InvalidTransition` and leaves the machine untouched.
//!
//! ```text
//!  Disconnected ──connect──▶ Connected ──start──▶ Logging ──charge──▶ Roasting
//!       ▲                     ▲  │  ▲               │                    │
//!       │                     │  │  └─────stop──────┘                   drop
//!   disconnect                │  └─────────start──────────┐             │
//!  (any other state)          └──────(reconnect)────── Ended ◀──────────┘
//! ```
//!
//! The machine performs no I/O. Actions return the [`Effect`]s the caller
//! must carry out (timers, persistence, reconnect scheduling).

use chrono::{DateTime, Duration, Utc};
use tracing::{info, warn};

use super::{RoastSession, TelemetryFrame};
use crate::error::{Result, RoastLoggerError};

/// Lifecycle state of the logger
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No transport connection
    Disconnected,
    /// Connected, not polling
    Connected,
    /// Polling, roast not yet charged
    Logging,
    /// Polling, roast charged
    Roasting,
    /// Roast dropped; connection still up
    Ended,
}

impl SessionState {
    /// Human-readable state name
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            SessionState::Disconnected => "disconnected",
            SessionState::Connected => "connected",
            SessionState::Logging => "logging",
            SessionState::Roasting => "roasting",
            SessionState::Ended => "ended",
        }
    }

    /// Whether the transport is up
    #[must_use]
    pub fn is_connected(self) -> bool {
        self != SessionState::Disconnected
    }

    /// Whether the poll timer should be running
    #[must_use]
    pub fn is_polling(self) -> bool {
        matches!(self, SessionState::Logging | SessionState::Roasting)
    }
}

/// How logging is started
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartMode {
    /// Clear the log and begin a new batch
    Fresh {
        batch_number: u32,
        /// User accepted discarding an unfinished roast
        discard_confirmed: bool,
    },
    /// Continue a reloaded roast that was charged but never dropped
    Resume,
}

/// Side effect requested by a transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    /// Begin sending the poll command every interval
    StartPolling,
    /// Cancel the poll timer
    StopPolling,
    /// Begin the once-per-second duration readout
    StartDurationTimer,
    /// Cancel the duration readout
    StopDurationTimer,
    /// Save the session to the store
    Persist,
    /// Try to reconnect the transport after the policy's delay
    ScheduleReconnect,
}

/// Session lifecycle owner
#[derive(Debug, Clone)]
pub struct RoastStateMachine {
    state: SessionState,
    session: RoastSession,
    logging_started_at: Option<DateTime<Utc>>,
    /// Polling state interrupted by a disconnect
    interrupted: Option<SessionState>,
}

impl Default for RoastStateMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl RoastStateMachine {
    /// Create a disconnected machine holding an empty session
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: SessionState::Disconnected,
            session: RoastSession::default(),
            logging_started_at: None,
            interrupted: None,
        }
    }

    /// Current state
    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// The owned session
    #[must_use]
    pub fn session(&self) -> &RoastSession {
        &self.session
    }

    // ==================== Guards ====================

    /// A fresh session may begin
    #[must_use]
    pub fn can_start_logging(&self) -> bool {
        matches!(self.state, SessionState::Connected | SessionState::Ended)
    }

    /// A charged, undropped session can be continued
    #[must_use]
    pub fn can_resume(&self) -> bool {
        matches!(self.state, SessionState::Connected | SessionState::Ended)
            && self.session.is_started()
            && !self.session.is_ended()
    }

    /// Logging can be halted (not mid-roast)
    #[must_use]
    pub fn can_stop_logging(&self) -> bool {
        self.state == SessionState::Logging
    }

    /// The roast can be charged
    #[must_use]
    pub fn can_charge(&self) -> bool {
        self.state == SessionState::Logging
            && !self.session.is_started()
            && !self.session.coffee_name.trim().is_empty()
            && !self.session.log().is_empty()
    }

    /// The roast can be dropped
    #[must_use]
    pub fn can_drop(&self) -> bool {
        self.state == SessionState::Roasting && !self.session.is_ended()
    }

    /// A manual or archival save is allowed
    #[must_use]
    pub fn can_save(&self) -> bool {
        self.state == SessionState::Roasting
            || (self.state == SessionState::Ended && self.session.is_completed())
    }

    /// A stored session can replace the current one
    #[must_use]
    pub fn can_load(&self) -> bool {
        !self.state.is_polling()
    }

    /// Coffee name and input mass can be edited
    #[must_use]
    pub fn can_edit_metadata(&self) -> bool {
        self.state != SessionState::Roasting && !self.session.is_ended()
    }

    /// Output mass can be edited (also after drop)
    #[must_use]
    pub fn can_edit_output_mass(&self) -> bool {
        self.state != SessionState::Roasting
    }

    // ==================== Connection ====================

    /// Transport connected
    ///
    /// Resumes polling interrupted by a disconnect, or auto-resumes a
    /// reloaded roast that was charged but never dropped.
    pub fn connect(&mut self) -> Vec<Effect> {
        if self.state.is_connected() {
            return Vec::new();
        }

        let resume_into = match self.interrupted.take() {
            Some(state) if state.is_polling() => Some(state),
            _ if self.session.is_started() && !self.session.is_ended() => {
                Some(SessionState::Roasting)
            }
            _ => None,
        };

        match resume_into {
            Some(state) => {
                info!("Connected; resuming {} batch #{}", state.name(), self.session.batch_number);
                self.state = state;
                vec![Effect::StartPolling, Effect::StartDurationTimer]
            }
            None => {
                info!("Connected");
                self.state = SessionState::Connected;
                Vec::new()
            }
        }
    }

    /// Transport lost
    ///
    /// Polling stops; the session and its log are kept for the reconnect.
    pub fn disconnect(&mut self) -> Vec<Effect> {
        if !self.state.is_connected() {
            return Vec::new();
        }

        warn!("Disconnected while {}", self.state.name());
        let was_polling = self.state.is_polling();
        self.interrupted = Some(self.state);
        self.state = SessionState::Disconnected;

        if was_polling {
            vec![Effect::StopPolling, Effect::ScheduleReconnect]
        } else {
            vec![Effect::ScheduleReconnect]
        }
    }

    // ==================== Lifecycle ====================

    /// Begin polling, either for a fresh batch or to resume a charged roast
    ///
    /// # Errors
    ///
    /// - `InvalidTransition` when the guard for `mode` is not met
    /// - `UnconfirmedDiscard` when a fresh start would discard an undropped roast
    pub fn start_logging(&mut self, mode: StartMode, now: DateTime<Utc>) -> Result<Vec<Effect>> {
        match mode {
            StartMode::Fresh { batch_number, discard_confirmed } => {
                self.guard(self.can_start_logging(), "start logging")?;

                if self.session.is_started() && !self.session.is_ended() && !discard_confirmed {
                    return Err(RoastLoggerError::UnconfirmedDiscard);
                }

                let mut fresh = RoastSession::new(batch_number);
                fresh.coffee_name = std::mem::take(&mut self.session.coffee_name);
                fresh.input_mass = self.session.input_mass;
                self.session = fresh;

                info!("Logging batch #{}", batch_number);
                self.state = SessionState::Logging;
            }
            StartMode::Resume => {
                self.guard(self.can_resume(), "resume logging")?;
                info!("Resuming roast of batch #{}", self.session.batch_number);
                self.state = SessionState::Roasting;
            }
        }

        self.logging_started_at = Some(now);
        Ok(vec![Effect::StartPolling, Effect::StartDurationTimer])
    }

    /// Halt polling before the roast is charged
    ///
    /// # Errors
    ///
    /// Returns `InvalidTransition` unless logging and not yet roasting.
    pub fn stop_logging(&mut self) -> Result<Vec<Effect>> {
        self.guard(self.can_stop_logging(), "stop logging")?;
        info!("Logging stopped");
        self.state = SessionState::Connected;
        Ok(vec![Effect::StopPolling, Effect::StopDurationTimer])
    }

    /// Mark the start of the roast at the latest frame's timestamp
    ///
    /// # Errors
    ///
    /// - `MissingCoffeeName` / `NoTelemetry` when logging but not chargeable
    /// - `InvalidTransition` when not logging or already charged
    pub fn charge(&mut self) -> Result<Vec<Effect>> {
        if self.state == SessionState::Logging && !self.session.is_started() {
            if self.session.coffee_name.trim().is_empty() {
                return Err(RoastLoggerError::MissingCoffeeName);
            }
            if self.session.log().is_empty() {
                return Err(RoastLoggerError::NoTelemetry);
            }
        }
        self.guard(self.can_charge(), "charge")?;

        let latest = self
            .session
            .log()
            .latest()
            .map(TelemetryFrame::timestamp)
            .ok_or(RoastLoggerError::NoTelemetry)?;
        self.session.mark_started(latest);

        info!("Charged {} (batch #{}) at {}", self.session.coffee_name, self.session.batch_number, latest);
        self.state = SessionState::Roasting;
        Ok(vec![Effect::StartDurationTimer, Effect::Persist])
    }

    /// Drop the roast: mark its end; the session is frozen afterwards
    ///
    /// # Errors
    ///
    /// Returns `InvalidTransition` unless roasting.
    pub fn drop_roast(&mut self, now: DateTime<Utc>) -> Result<Vec<Effect>> {
        self.guard(self.can_drop(), "drop")?;
        self.session.mark_ended(now);

        if let Some(duration) = self.session.roast_duration(now) {
            info!("Dropped batch #{} after {}", self.session.batch_number, super::format_duration(duration));
        }
        self.state = SessionState::Ended;
        Ok(vec![Effect::StopPolling, Effect::StopDurationTimer, Effect::Persist])
    }

    /// Request a save of the current session
    ///
    /// # Errors
    ///
    /// Returns `InvalidTransition` unless roasting or holding a completed roast.
    pub fn save(&self) -> Result<Vec<Effect>> {
        self.guard(self.can_save(), "save")?;
        Ok(vec![Effect::Persist])
    }

    /// Replace the session with one loaded from the store
    ///
    /// # Errors
    ///
    /// Returns `InvalidTransition` while polling.
    pub fn load(&mut self, session: RoastSession) -> Result<()> {
        self.guard(self.can_load(), "load a roast")?;
        info!(
            "Loaded batch #{} ({} frames)",
            session.batch_number,
            session.frames().len()
        );
        self.session = session;
        self.logging_started_at = None;
        self.interrupted = None;
        if self.state == SessionState::Ended {
            self.state = SessionState::Connected;
        }
        Ok(())
    }

    /// Append a decoded frame while polling
    ///
    /// # Errors
    ///
    /// - `InvalidTransition` when not polling
    /// - `OutOfOrderFrame` / `SessionFrozen` from the session
    pub fn record_frame(&mut self, frame: TelemetryFrame) -> Result<()> {
        self.guard(self.state.is_polling(), "record telemetry")?;
        self.session.append(frame)
    }

    // ==================== Metadata ====================

    /// Set the coffee name
    ///
    /// # Errors
    ///
    /// Returns `InvalidTransition` while roasting or after drop.
    pub fn set_coffee_name(&mut self, name: impl Into<String>) -> Result<()> {
        self.guard(self.can_edit_metadata(), "rename the coffee")?;
        self.session.coffee_name = name.into();
        Ok(())
    }

    /// Set the green coffee mass in grams
    ///
    /// # Errors
    ///
    /// Returns `InvalidTransition` while roasting or after drop.
    pub fn set_input_mass(&mut self, grams: f64) -> Result<()> {
        self.guard(self.can_edit_metadata(), "change the input mass")?;
        self.session.input_mass = grams;
        Ok(())
    }

    /// Set the roasted coffee mass in grams
    ///
    /// # Errors
    ///
    /// Returns `InvalidTransition` while roasting.
    pub fn set_output_mass(&mut self, grams: f64) -> Result<()> {
        self.guard(self.can_edit_output_mass(), "change the output mass")?;
        self.session.output_mass = Some(grams);
        Ok(())
    }

    // ==================== Readouts ====================

    /// Elapsed time for the duration readout
    ///
    /// Time since charge once roasting (fixed after drop), otherwise time
    /// since logging began.
    #[must_use]
    pub fn elapsed(&self, now: DateTime<Utc>) -> Option<Duration> {
        self.session
            .roast_duration(now)
            .or_else(|| self.logging_started_at.map(|started| now - started))
    }

    fn guard(&self, allowed: bool, action: &'static str) -> Result<()> {
        if allowed {
            Ok(())
        } else {
            Err(RoastLoggerError::InvalidTransition {
                action,
                state: self.state.name(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap()
    }

    fn at(secs: i64) -> DateTime<Utc> {
        t0() + Duration::seconds(secs)
    }

    fn frame(secs: i64, probe1: f64, probe2: f64) -> TelemetryFrame {
        TelemetryFrame::new(at(secs), probe1, probe2).unwrap()
    }

    fn fresh(batch_number: u32) -> StartMode {
        StartMode::Fresh { batch_number, discard_confirmed: false }
    }

    fn logging_machine() -> RoastStateMachine {
        let mut machine = RoastStateMachine::new();
        machine.connect();
        machine.start_logging(fresh(1), t0()).unwrap();
        machine
    }

    fn roasting_machine() -> RoastStateMachine {
        let mut machine = logging_machine();
        machine.set_coffee_name("Ethiopia Guji").unwrap();
        machine.record_frame(frame(0, 150.0, 150.0)).unwrap();
        machine.charge().unwrap();
        machine
    }

    // ==================== Connection ====================

    #[test]
    fn test_connect_from_disconnected() {
        let mut machine = RoastStateMachine::new();
        assert_eq!(machine.state(), SessionState::Disconnected);
        assert!(machine.connect().is_empty());
        assert_eq!(machine.state(), SessionState::Connected);
    }

    #[test]
    fn test_connect_when_connected_is_noop() {
        let mut machine = logging_machine();
        assert!(machine.connect().is_empty());
        assert_eq!(machine.state(), SessionState::Logging);
    }

    #[test]
    fn test_connect_auto_resumes_reloaded_roast() {
        let mut active = RoastSession::new(4);
        active.append(frame(0, 150.0, 150.0)).unwrap();
        active.mark_started(at(0));

        let mut machine = RoastStateMachine::new();
        machine.load(active).unwrap();
        let effects = machine.connect();

        assert_eq!(machine.state(), SessionState::Roasting);
        assert_eq!(effects, vec![Effect::StartPolling, Effect::StartDurationTimer]);
        assert_eq!(machine.session().frames().len(), 1);
    }

    #[test]
    fn test_connect_does_not_resume_completed_roast() {
        let mut done = RoastSession::new(4);
        done.mark_started(at(0));
        done.mark_ended(at(600));

        let mut machine = RoastStateMachine::new();
        machine.load(done).unwrap();
        machine.connect();
        assert_eq!(machine.state(), SessionState::Connected);
    }

    #[test]
    fn test_disconnect_and_reconnect_resumes_logging() {
        let mut machine = logging_machine();
        machine.record_frame(frame(0, 150.0, 150.0)).unwrap();

        let effects = machine.disconnect();
        assert_eq!(effects, vec![Effect::StopPolling, Effect::ScheduleReconnect]);
        assert_eq!(machine.state(), SessionState::Disconnected);

        machine.connect();
        assert_eq!(machine.state(), SessionState::Logging);
        assert_eq!(machine.session().frames().len(), 1);
    }

    #[test]
    fn test_disconnect_while_roasting_resumes_roasting() {
        let mut machine = roasting_machine();
        machine.disconnect();
        machine.connect();
        assert_eq!(machine.state(), SessionState::Roasting);
    }

    #[test]
    fn test_reconnect_after_drop_returns_to_connected() {
        let mut machine = roasting_machine();
        machine.drop_roast(at(600)).unwrap();

        assert_eq!(machine.disconnect(), vec![Effect::ScheduleReconnect]);
        machine.connect();
        assert_eq!(machine.state(), SessionState::Connected);
    }

    #[test]
    fn test_disconnect_when_disconnected_is_noop() {
        let mut machine = RoastStateMachine::new();
        assert!(machine.disconnect().is_empty());
    }

    // ==================== Start / stop ====================

    #[test]
    fn test_start_logging_requires_connection() {
        let mut machine = RoastStateMachine::new();
        let result = machine.start_logging(fresh(1), t0());
        assert!(matches!(result, Err(RoastLoggerError::InvalidTransition { .. })));
        assert_eq!(machine.state(), SessionState::Disconnected);
    }

    #[test]
    fn test_fresh_start_clears_log_and_keeps_coffee() {
        let mut machine = logging_machine();
        machine.set_coffee_name("Kenya AA").unwrap();
        machine.set_input_mass(200.0).unwrap();
        machine.record_frame(frame(0, 150.0, 150.0)).unwrap();
        machine.stop_logging().unwrap();

        let effects = machine.start_logging(fresh(2), at(100)).unwrap();
        assert_eq!(effects, vec![Effect::StartPolling, Effect::StartDurationTimer]);
        assert_eq!(machine.state(), SessionState::Logging);
        assert!(machine.session().frames().is_empty());
        assert_eq!(machine.session().batch_number, 2);
        assert_eq!(machine.session().coffee_name, "Kenya AA");
        assert_eq!(machine.session().input_mass, 200.0);
    }

    #[test]
    fn test_fresh_start_over_unfinished_roast_needs_confirmation() {
        let mut machine = RoastStateMachine::new();
        machine.connect();
        let mut unfinished = RoastSession::new(4);
        unfinished.append(frame(0, 150.0, 150.0)).unwrap();
        unfinished.mark_started(at(0));
        machine.load(unfinished).unwrap();

        let result = machine.start_logging(fresh(5), at(60));
        assert!(matches!(result, Err(RoastLoggerError::UnconfirmedDiscard)));
        assert_eq!(machine.session().batch_number, 4);

        let confirmed = StartMode::Fresh { batch_number: 5, discard_confirmed: true };
        machine.start_logging(confirmed, at(60)).unwrap();
        assert_eq!(machine.session().batch_number, 5);
        assert!(machine.session().frames().is_empty());
    }

    #[test]
    fn test_resume_enters_roasting_without_clearing() {
        let mut machine = RoastStateMachine::new();
        machine.connect();
        let mut unfinished = RoastSession::new(4);
        unfinished.append(frame(0, 150.0, 150.0)).unwrap();
        unfinished.mark_started(at(0));
        machine.load(unfinished).unwrap();

        machine.start_logging(StartMode::Resume, at(30)).unwrap();
        assert_eq!(machine.state(), SessionState::Roasting);
        assert_eq!(machine.session().frames().len(), 1);
    }

    #[test]
    fn test_resume_requires_charged_session() {
        let mut machine = RoastStateMachine::new();
        machine.connect();
        assert!(machine.start_logging(StartMode::Resume, t0()).is_err());
        assert_eq!(machine.state(), SessionState::Connected);
    }

    #[test]
    fn test_stop_logging() {
        let mut machine = logging_machine();
        let effects = machine.stop_logging().unwrap();
        assert_eq!(effects, vec![Effect::StopPolling, Effect::StopDurationTimer]);
        assert_eq!(machine.state(), SessionState::Connected);
    }

    #[test]
    fn test_stop_logging_disallowed_mid_roast() {
        let mut machine = roasting_machine();
        assert!(machine.stop_logging().is_err());
        assert_eq!(machine.state(), SessionState::Roasting);
    }

    // ==================== Charge / drop ====================

    #[test]
    fn test_charge_uses_latest_frame_time() {
        let mut machine = logging_machine();
        machine.set_coffee_name("Colombia").unwrap();
        machine.record_frame(frame(0, 150.0, 150.0)).unwrap();
        machine.record_frame(frame(30, 160.0, 155.0)).unwrap();
        machine.record_frame(frame(60, 170.0, 158.0)).unwrap();

        let effects = machine.charge().unwrap();
        assert_eq!(effects, vec![Effect::StartDurationTimer, Effect::Persist]);
        assert_eq!(machine.state(), SessionState::Roasting);
        assert_eq!(machine.session().start_time(), Some(at(60)));
    }

    #[test]
    fn test_charge_requires_coffee_name() {
        let mut machine = logging_machine();
        machine.record_frame(frame(0, 150.0, 150.0)).unwrap();

        assert!(!machine.can_charge());
        assert!(matches!(machine.charge(), Err(RoastLoggerError::MissingCoffeeName)));
        assert_eq!(machine.state(), SessionState::Logging);
        assert!(machine.session().start_time().is_none());
    }

    #[test]
    fn test_charge_requires_telemetry() {
        let mut machine = logging_machine();
        machine.set_coffee_name("Brazil").unwrap();
        assert!(matches!(machine.charge(), Err(RoastLoggerError::NoTelemetry)));
        assert_eq!(machine.state(), SessionState::Logging);
    }

    #[test]
    fn test_charge_off_guard_leaves_state() {
        let mut machine = RoastStateMachine::new();
        machine.connect();
        assert!(matches!(machine.charge(), Err(RoastLoggerError::InvalidTransition { .. })));
        assert_eq!(machine.state(), SessionState::Connected);

        let mut machine = roasting_machine();
        let start = machine.session().start_time();
        assert!(machine.charge().is_err());
        assert_eq!(machine.session().start_time(), start);
    }

    #[test]
    fn test_drop_ends_session() {
        let mut machine = roasting_machine();
        let effects = machine.drop_roast(at(720)).unwrap();

        assert_eq!(
            effects,
            vec![Effect::StopPolling, Effect::StopDurationTimer, Effect::Persist]
        );
        assert_eq!(machine.state(), SessionState::Ended);
        assert_eq!(machine.session().end_time(), Some(at(720)));
        assert!(machine.record_frame(frame(800, 200.0, 210.0)).is_err());
    }

    #[test]
    fn test_drop_off_guard_leaves_state() {
        let mut machine = logging_machine();
        assert!(machine.drop_roast(at(10)).is_err());
        assert_eq!(machine.state(), SessionState::Logging);
        assert!(machine.session().end_time().is_none());

        let mut machine = roasting_machine();
        machine.drop_roast(at(600)).unwrap();
        assert!(machine.drop_roast(at(700)).is_err());
        assert_eq!(machine.session().end_time(), Some(at(600)));
    }

    #[test]
    fn test_ended_session_can_start_fresh_without_confirmation() {
        let mut machine = roasting_machine();
        machine.drop_roast(at(600)).unwrap();
        machine.start_logging(fresh(2), at(700)).unwrap();
        assert_eq!(machine.state(), SessionState::Logging);
        assert!(machine.session().start_time().is_none());
    }

    // ==================== Save / load / metadata ====================

    #[test]
    fn test_save_guard() {
        assert!(logging_machine().save().is_err());
        assert_eq!(roasting_machine().save().unwrap(), vec![Effect::Persist]);

        let mut machine = roasting_machine();
        machine.drop_roast(at(600)).unwrap();
        assert!(machine.can_save());
    }

    #[test]
    fn test_load_disallowed_while_polling() {
        let mut machine = logging_machine();
        assert!(machine.load(RoastSession::new(9)).is_err());
        assert_eq!(machine.session().batch_number, 1);
    }

    #[test]
    fn test_metadata_locked_while_roasting() {
        let mut machine = roasting_machine();
        assert!(machine.set_coffee_name("Other").is_err());
        assert!(machine.set_input_mass(100.0).is_err());
        assert!(machine.set_output_mass(100.0).is_err());

        machine.drop_roast(at(600)).unwrap();
        assert!(machine.set_coffee_name("Other").is_err());
        machine.set_output_mass(128.5).unwrap();
        assert_eq!(machine.session().output_mass, Some(128.5));
    }

    #[test]
    fn test_record_frame_requires_polling() {
        let mut machine = RoastStateMachine::new();
        machine.connect();
        assert!(machine.record_frame(frame(0, 150.0, 150.0)).is_err());
        assert!(machine.session().frames().is_empty());
    }

    #[test]
    fn test_elapsed_readout() {
        let mut machine = logging_machine();
        assert_eq!(machine.elapsed(at(45)), Some(Duration::seconds(45)));

        machine.set_coffee_name("Guatemala").unwrap();
        machine.record_frame(frame(60, 150.0, 150.0)).unwrap();
        machine.charge().unwrap();
        assert_eq!(machine.elapsed(at(90)), Some(Duration::seconds(30)));

        machine.drop_roast(at(660)).unwrap();
        assert_eq!(machine.elapsed(at(9_999)), Some(Duration::seconds(600)));
    }
}
