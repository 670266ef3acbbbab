//! TournamentEngine: the operations collaborators call
//!
//! ```rust
//! use gt_core::engine::TournamentEngine;
//! use gt_core::models::{CompetitorSnapshot, StatBlock, TournamentKind, TournamentStatus};
//! use rand::SeedableRng;
//! use rand_chacha::ChaCha8Rng;
//!
//! let engine = TournamentEngine::default();
//! let mut rng = ChaCha8Rng::seed_from_u64(7);
//! let field: Vec<CompetitorSnapshot> = (0..8)
//!     .map(|i| CompetitorSnapshot {
//!         id: format!("u{i}"),
//!         name: format!("기사{i}"),
//!         avatar_id: None,
//!         frame_id: None,
//!         stats: StatBlock::uniform(50 + i),
//!     })
//!     .collect();
//!
//! let mut state = engine.create_tournament(TournamentKind::Daily, "u0", field, &mut rng).unwrap();
//! engine.start_next_round(&mut state, "u0", &mut rng).unwrap();
//! while engine.advance_simulation(&mut state, "u0") {}
//! assert_ne!(state.status, TournamentStatus::RoundInProgress);
//! ```

use rand::Rng;
use tracing::warn;

use crate::bracket::{build_tournament, seed_competitors};
use crate::error::Result;
use crate::models::{CompetitorSnapshot, PlayerForTournament, TournamentKind, TournamentState};
use crate::progression;
use crate::ranking::{calculate_ranks, RankEntry};
use crate::sim::{advance_tick, SimConfig};
use crate::verification::{self, ClientResult, SubmitOutcome, VerifiedResult};

#[derive(Debug, Clone, Default)]
pub struct TournamentEngine {
    pub config: SimConfig,
}

impl TournamentEngine {
    pub fn new(config: SimConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Engine over the process-wide config (`GT_SIM_CONFIG_PATH`)
    pub fn from_global() -> Self {
        Self { config: SimConfig::global().clone() }
    }

    /// Shuffle opponents, place the owner at a random slot and build the bracket.
    pub fn create_tournament(
        &self,
        kind: TournamentKind,
        owner_id: &str,
        competitors: Vec<CompetitorSnapshot>,
        rng: &mut impl Rng,
    ) -> Result<TournamentState> {
        let slot = rng.gen_range(0..competitors.len().max(1));
        let seeded = seed_competitors(competitors, owner_id, slot, rng)?;
        build_tournament(kind, owner_id, seeded)
    }

    pub fn start_next_round(&self, state: &mut TournamentState, owner_id: &str, rng: &mut impl Rng) -> Result<()> {
        progression::start_next_round(state, owner_id, &self.config, rng)
    }

    /// One tick. `false` means nothing happened.
    pub fn advance_simulation(&self, state: &mut TournamentState, owner_id: &str) -> bool {
        if state.owner_id != owner_id {
            warn!("Tournament {}: tick requested by {}", state.id, owner_id);
            return false;
        }
        advance_tick(state, &self.config)
    }

    pub fn submit_match_result(
        &self,
        state: &mut TournamentState,
        owner_id: &str,
        result: &ClientResult,
        rng: &mut impl Rng,
    ) -> Result<SubmitOutcome> {
        verification::submit_match_result(state, owner_id, result, &self.config, rng)
    }

    pub fn forfeit_tournament(&self, state: &mut TournamentState, owner_id: &str) -> Result<()> {
        progression::forfeit_tournament(state, owner_id)
    }

    pub fn forfeit_current_match(&self, state: &mut TournamentState, owner_id: &str, rng: &mut impl Rng) -> Result<()> {
        progression::forfeit_current_match(state, owner_id, &self.config, rng)
    }

    pub fn skip_to_results(&self, state: &mut TournamentState, owner_id: &str, rng: &mut impl Rng) -> Result<()> {
        progression::skip_to_results(state, owner_id, &self.config, rng)
    }

    pub fn calculate_ranks(&self, state: &TournamentState) -> Vec<RankEntry> {
        calculate_ranks(state)
    }

    pub fn verify_match(
        &self,
        seed: u64,
        p1: &PlayerForTournament,
        p2: &PlayerForTournament,
        round_name: &str,
    ) -> VerifiedResult {
        verification::verify_match(seed, p1, p2, round_name, &self.config)
    }
}
