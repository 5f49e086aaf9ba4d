//! # Session Store Module
//!
//! Persistence of roast sessions.
//!
//! This module handles:
//! - The [`SessionStore`] port (save / load / delete / list)
//! - Persisting the live session under `active` and finalizing it under
//!   a start-time key once dropped
//! - Restoring the `active` record at startup
//! - Batch numbering from the most recent finalized roast

use tracing::{debug, info};

use crate::error::{Result, RoastLoggerError};
use crate::session::RoastSession;

pub mod json_file;
pub mod record;

pub use json_file::JsonFileStore;
pub use record::{SessionRecord, ACTIVE_KEY, FINALIZED_PREFIX};

/// Keyed storage of session records
#[cfg_attr(test, mockall::automock)]
pub trait SessionStore {
    /// Insert or replace the record under `key`
    fn save(&mut self, key: &str, record: &SessionRecord) -> Result<()>;

    /// Fetch the record under `key`, `None` if absent
    fn load(&self, key: &str) -> Result<Option<SessionRecord>>;

    /// Remove the record under `key`; absent keys are not an error
    fn delete(&mut self, key: &str) -> Result<()>;

    /// Finalized records, newest start time first, at most `limit`
    fn list_finalized(&self, limit: usize) -> Result<Vec<SessionRecord>>;
}

/// Save `session` under its key, returning the key used
///
/// Once the session is finalized the `active` record is removed.
///
/// # Errors
///
/// Propagates store failures.
pub fn persist_session<S: SessionStore + ?Sized>(store: &mut S, session: &RoastSession) -> Result<String> {
    let record = SessionRecord::from_session(session);
    let key = record.key();

    store.save(&key, &record)?;
    debug!("Saved batch #{} as {}", record.coffee_batch_num, key);

    if key != ACTIVE_KEY {
        store.delete(ACTIVE_KEY)?;
        info!("Finalized batch #{} as {}", record.coffee_batch_num, key);
    }
    Ok(key)
}

/// Load and rebuild the session stored under `key`
///
/// # Errors
///
/// - `Store` if no record exists under `key`
/// - Record decoding errors from [`SessionRecord::into_session`]
pub fn load_session<S: SessionStore + ?Sized>(store: &S, key: &str) -> Result<RoastSession> {
    store
        .load(key)?
        .ok_or_else(|| RoastLoggerError::Store(format!("No roast stored under '{}'", key)))?
        .into_session()
}

/// The unfinished session left by a previous run, if any
///
/// # Errors
///
/// Propagates store and record decoding failures.
pub fn restore_active<S: SessionStore + ?Sized>(store: &S) -> Result<Option<RoastSession>> {
    match store.load(ACTIVE_KEY)? {
        Some(record) => {
            let session = record.into_session()?;
            info!(
                "Restored active batch #{} ({} frames)",
                session.batch_number,
                session.frames().len()
            );
            Ok(Some(session))
        }
        None => Ok(None),
    }
}

/// Batch number for the next fresh session: latest finalized + 1, else 1
///
/// # Errors
///
/// Propagates store failures.
pub fn next_batch_number<S: SessionStore + ?Sized>(store: &S) -> Result<u32> {
    let latest = store.list_finalized(1)?;
    Ok(latest
        .first()
        .map_or(1, |record| record.coffee_batch_num.saturating_add(1)))
}
