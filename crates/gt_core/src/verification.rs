//! 결과 검증
//!
//! The client plays the live match on its side and reports the result. The
//! server re-runs the bulk simulation from the live match seed and either
//! accepts the report or replaces it with its own result.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{Result, TournamentError};
use crate::models::{CommentaryLine, MatchPointer, PlayerForTournament, TournamentState, TournamentStatus};
use crate::progression::{check_owner, handle_match_complete};
use crate::sim::commentary::{closing_lines, opening_line};
use crate::sim::outcome::{percent_split, rounded_lead};
use crate::sim::simulator::{finish_match, simulate_pair};
use crate::sim::SimConfig;

/// Server-side recomputation of a match
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifiedResult {
    pub winner_slot: usize,
    pub winner_id: String,
    pub final_score: [f64; 2],
    pub margin: f64,
    pub commentary: Vec<CommentaryLine>,
}

/// Result reported by the client for the live match
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientResult {
    pub round: usize,
    pub index: usize,
    pub winner_id: String,
    /// Percentage split
    pub final_score: [f64; 2],
    #[serde(default)]
    pub commentary: Vec<CommentaryLine>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmitOutcome {
    /// Client result within tolerance, recorded as sent
    Accepted,
    /// Client result discarded, server result recorded
    Corrected,
    /// No seed on record; client result recorded without a check
    Trusted,
    /// Match already finished; nothing changed
    AlreadyRecorded,
}

/// Re-run a match from `seed` and the competitors' frozen baselines.
/// Same inputs, same result, bit for bit.
pub fn verify_match(
    seed: u64,
    p1: &PlayerForTournament,
    p2: &PlayerForTournament,
    round_name: &str,
    config: &SimConfig,
) -> VerifiedResult {
    let mut a = p1.clone();
    let mut b = p2.clone();
    a.reset_to_idle();
    b.reset_to_idle();
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let (verdict, _) = simulate_pair(&mut a, &mut b, config, &mut rng);

    let names = [a.name.as_str(), b.name.as_str()];
    let mut commentary = vec![opening_line(round_name, names)];
    commentary.extend(closing_lines(config.total_ticks(), names, &verdict));
    let winner_id = if verdict.winner_slot == 0 { a.id.clone() } else { b.id.clone() };
    VerifiedResult {
        winner_slot: verdict.winner_slot,
        winner_id,
        final_score: verdict.percent,
        margin: verdict.margin,
        commentary,
    }
}

/// `|client_diff - server_diff| / max(server_diff, 1)` on the percentage splits
pub fn relative_divergence(client: [f64; 2], server: [f64; 2]) -> f64 {
    let client_diff = (client[0] - client[1]).abs();
    let server_diff = (server[0] - server[1]).abs();
    (client_diff - server_diff).abs() / server_diff.max(1.0)
}

/// Record a client-reported result for the live match.
pub fn submit_match_result(
    state: &mut TournamentState,
    owner_id: &str,
    result: &ClientResult,
    config: &SimConfig,
    rng: &mut impl Rng,
) -> Result<SubmitOutcome> {
    check_owner(state, owner_id)?;
    let pointer = MatchPointer { round: result.round, index: result.index };
    let m = state
        .match_at(pointer)
        .ok_or(TournamentError::InvalidPointer { round: result.round, index: result.index })?;
    if m.is_finished {
        return Ok(SubmitOutcome::AlreadyRecorded);
    }
    if state.status != TournamentStatus::RoundInProgress {
        return Err(TournamentError::InvalidStatus { status: state.status });
    }
    if state.current_match != Some(pointer) {
        warn!("Tournament {}: result for {:?} but live match is {:?}", state.id, pointer, state.current_match);
        return Err(TournamentError::MatchMismatch { round: result.round, index: result.index });
    }
    let client_slot = m
        .slot_of(&result.winner_id)
        .ok_or_else(|| TournamentError::UnknownCompetitor(result.winner_id.clone()))?;
    let (Some(a), Some(b)) = (m.players[0].clone(), m.players[1].clone()) else {
        return Err(TournamentError::InvalidPointer { round: result.round, index: result.index });
    };
    let round_name = state.rounds[pointer.round].name.clone();
    let client_percent = percent_split(result.final_score[0], result.final_score[1]);
    let client_margin = rounded_lead(result.final_score[0], result.final_score[1]) + 0.5;

    let outcome = match state.match_seed {
        None => {
            finish_match(state, pointer, Some(client_slot), client_percent, client_margin, result.commentary.clone());
            SubmitOutcome::Trusted
        }
        Some(seed) => {
            let (Some(p1), Some(p2)) = (state.player(&a), state.player(&b)) else {
                return Err(TournamentError::UnknownCompetitor(format!("{} / {}", a, b)));
            };
            let server = verify_match(seed, p1, p2, &round_name, config);
            let divergence = relative_divergence(client_percent, server.final_score);
            if divergence <= config.verify_tolerance && server.winner_slot == client_slot {
                finish_match(state, pointer, Some(client_slot), client_percent, client_margin, result.commentary.clone());
                SubmitOutcome::Accepted
            } else {
                warn!(
                    "Tournament {}: client result rejected (divergence {:.3}, client winner {}, server winner {})",
                    state.id, divergence, result.winner_id, server.winner_id
                );
                finish_match(state, pointer, Some(server.winner_slot), server.final_score, server.margin, server.commentary);
                SubmitOutcome::Corrected
            }
        }
    };
    info!("Tournament {}: result for {:?} {:?}", state.id, pointer, outcome);
    handle_match_complete(state, config, rng);
    Ok(outcome)
}
