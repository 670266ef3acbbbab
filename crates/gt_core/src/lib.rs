//! # gt_core - Deterministic Go Tournament Engine
//!
//! Builds tournament brackets for a tracked competitor, simulates matches
//! from stat blocks (bulk or one tick at a time with commentary), verifies
//! client-reported results and drives the round-by-round state machine.
//!
//! ## Features
//! - Same seed, same inputs, same result
//! - Single elimination (8강/16강) and six-player round-robin league
//! - Server-side re-verification of client results
//! - JSON API and compressed per-owner save slots

#![allow(clippy::doc_lazy_continuation)]
#![allow(clippy::too_many_arguments)]

pub mod api;
pub mod bracket;
pub mod driver;
pub mod engine;
pub mod error;
pub mod models;
pub mod progression;
pub mod ranking;
pub mod save;
pub mod sim;
pub mod verification;

pub use api::{
    advance_simulation_json, calculate_ranks_json, create_tournament_json, forfeit_current_match_json,
    forfeit_tournament_json, skip_to_results_json, start_next_round_json, submit_match_result_json,
    submit_stored_match_result_json, verify_match_json, ApiError, ApiResponse, API_VERSION,
};
pub use driver::{NotificationSink, PassReport, RecordingSink, TickDriver};
pub use engine::TournamentEngine;
pub use error::{Result, TournamentError};
pub use models::{
    CompetitorSnapshot, PlayerForTournament, StatBlock, TournamentKind, TournamentState, TournamentStatus,
};
pub use ranking::{calculate_ranks, RankEntry};
pub use save::{FileStore, MemoryStore, SaveError, TournamentStore};
pub use sim::SimConfig;
pub use verification::{ClientResult, SubmitOutcome, VerifiedResult};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
pub(crate) mod test_support {
    use crate::bracket::assemble;
    use crate::models::{
        CompetitorSnapshot, PlayerForTournament, StatBlock, TournamentFormat, TournamentKind, TournamentState,
    };

    pub fn snapshot(id: &str, value: i32) -> CompetitorSnapshot {
        CompetitorSnapshot {
            id: id.to_string(),
            name: format!("기사 {}", id),
            avatar_id: None,
            frame_id: None,
            stats: StatBlock::uniform(value),
        }
    }

    /// "me" first at `owner_strength`, then `opp1..` around 50
    pub fn field(n: usize, owner_strength: i32) -> Vec<CompetitorSnapshot> {
        let mut all = vec![snapshot("me", owner_strength)];
        all.extend((1..n).map(|i| snapshot(&format!("opp{}", i), 45 + (i % 10) as i32)));
        all
    }

    pub fn players(n: usize) -> Vec<PlayerForTournament> {
        (0..n)
            .map(|i| PlayerForTournament::new(format!("p{}", i), format!("기사{}", i), StatBlock::uniform(50 + i as i32)))
            .collect()
    }

    /// No rounds; owned by the first player
    pub fn bare_state(players: Vec<PlayerForTournament>) -> TournamentState {
        let owner = players.first().map(|p| p.id.clone()).unwrap_or_default();
        let mut state = assemble(TournamentKind::Daily, TournamentFormat::SingleElimination, &owner, players);
        state.rounds.clear();
        state
    }
}
