//! Periodic tick driver
//!
//! Each pass loads every live tournament whose owner is observing, advances
//! each by one tick in parallel, then saves and notifies. Tournaments never
//! share state, so the parallel step needs no locking.

use rayon::prelude::*;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use tracing::{debug, warn};

use crate::engine::TournamentEngine;
use crate::models::{TournamentKind, TournamentState, TournamentStatus};
use crate::save::{SaveError, TournamentStore};

/// Receives the owner's state after each externally visible transition.
pub trait NotificationSink: Send + Sync {
    fn notify(&self, owner_id: &str, state: &TournamentState);
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub owner_id: String,
    pub tournament_id: String,
    pub status: TournamentStatus,
    pub tick: u32,
}

/// Keeps every notification in memory
#[derive(Debug, Default)]
pub struct RecordingSink {
    received: Mutex<Vec<Notification>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn drain(&self) -> Vec<Notification> {
        match self.received.lock() {
            Ok(mut received) => std::mem::take(&mut *received),
            Err(_) => Vec::new(),
        }
    }
}

impl NotificationSink for RecordingSink {
    fn notify(&self, owner_id: &str, state: &TournamentState) {
        if let Ok(mut received) = self.received.lock() {
            received.push(Notification {
                owner_id: owner_id.to_string(),
                tournament_id: state.id.clone(),
                status: state.status,
                tick: state.current_tick,
            });
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PassReport {
    /// Another pass was still running; nothing was done
    pub skipped: bool,
    pub advanced: usize,
    /// Tournaments that left `round_in_progress` during this pass
    pub finished: usize,
    pub errors: usize,
}

#[derive(Debug, Default)]
pub struct TickDriver {
    running: AtomicBool,
}

struct PassGuard<'a>(&'a AtomicBool);

impl Drop for PassGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl TickDriver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    fn try_enter(&self) -> Option<PassGuard<'_>> {
        self.running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| PassGuard(&self.running))
    }

    pub fn run_pass(
        &self,
        engine: &TournamentEngine,
        store: &dyn TournamentStore,
        sink: &dyn NotificationSink,
        is_observing: impl Fn(&str) -> bool,
    ) -> PassReport {
        let Some(_guard) = self.try_enter() else {
            debug!("Tick pass skipped: previous pass still running");
            return PassReport { skipped: true, ..PassReport::default() };
        };

        let mut live = match store.in_progress() {
            Ok(live) => live,
            Err(e) => {
                warn!("Tick pass could not list live tournaments: {}", e);
                return PassReport { errors: 1, ..PassReport::default() };
            }
        };
        live.retain(|s| is_observing(&s.owner_id));

        let moved: Vec<bool> = live
            .par_iter_mut()
            .map(|state| {
                let owner = state.owner_id.clone();
                engine.advance_simulation(state, &owner)
            })
            .collect();

        let mut report = PassReport::default();
        for (state, moved) in live.iter().zip(moved) {
            if !moved {
                continue;
            }
            report.advanced += 1;
            if state.status != TournamentStatus::RoundInProgress {
                report.finished += 1;
            }
            if let Err(e) = store.save(state) {
                warn!("Failed to save tournament {}: {}", state.id, e);
                report.errors += 1;
                continue;
            }
            sink.notify(&state.owner_id, state);
        }
        debug!("Tick pass: {:?}", report);
        report
    }

    /// Caller-initiated single tick. Refused (`Ok(false)`) while a pass runs.
    pub fn advance_one(
        &self,
        engine: &TournamentEngine,
        store: &dyn TournamentStore,
        sink: &dyn NotificationSink,
        owner_id: &str,
        kind: TournamentKind,
    ) -> Result<bool, SaveError> {
        let Some(_guard) = self.try_enter() else {
            return Ok(false);
        };
        let Some(mut state) = store.load(owner_id, kind)? else {
            return Ok(false);
        };
        if !engine.advance_simulation(&mut state, owner_id) {
            return Ok(false);
        }
        store.save(&state)?;
        sink.notify(owner_id, &state);
        Ok(true)
    }
}
