//! 진행 상태 머신
//!
//! ```text
//! bracket_ready → round_in_progress → round_complete → round_in_progress …
//!                                   ↘ complete | eliminated
//! ```
//!
//! Every entry point checks ownership and status before touching the state;
//! an `Err` always means nothing changed.

use rand::Rng;
use tracing::{debug, info, warn};

use crate::bracket::synthesize_next_round;
use crate::error::{Result, TournamentError};
use crate::models::{CommentaryLine, Match, MatchPointer, TournamentFormat, TournamentState, TournamentStatus};
use crate::sim::commentary::forfeit_line;
use crate::sim::simulator::{finish_match, simulate_match};
use crate::sim::SimConfig;

pub(crate) fn check_owner(state: &TournamentState, owner_id: &str) -> Result<()> {
    if state.owner_id != owner_id {
        warn!("Tournament {} owned by {}, request from {}", state.id, state.owner_id, owner_id);
        return Err(TournamentError::OwnerMismatch {
            expected: state.owner_id.clone(),
            found: owner_id.to_string(),
        });
    }
    Ok(())
}

fn set_status(state: &mut TournamentState, status: TournamentStatus) {
    if state.status != status {
        info!("Tournament {}: {:?} -> {:?}", state.id, state.status, status);
    }
    state.status = status;
}

/// Bulk-simulate every unfinished match selected by `filter`, then put all
/// competitors back to idle. Returns how many matches were resolved.
fn resolve_where(
    state: &mut TournamentState,
    config: &SimConfig,
    rng: &mut impl Rng,
    filter: impl Fn(MatchPointer, &Match) -> bool,
) -> usize {
    let pending: Vec<MatchPointer> = state
        .rounds
        .iter()
        .enumerate()
        .flat_map(|(round, r)| {
            r.matches.iter().enumerate().map(move |(index, m)| (MatchPointer { round, index }, m))
        })
        .filter(|(p, m)| !m.is_finished && filter(*p, *m))
        .map(|(p, _)| p)
        .collect();

    let resolved = pending.iter().filter(|p| simulate_match(state, **p, config, rng)).count();
    state.reset_all_players();
    if resolved > 0 {
        debug!("Tournament {}: auto-resolved {} matches", state.id, resolved);
    }
    resolved
}

/// First unfinished match of the tracked competitor matching `filter`
fn find_tracked(state: &TournamentState, filter: impl Fn(&Match) -> bool) -> Option<MatchPointer> {
    state.rounds.iter().enumerate().find_map(|(round, r)| {
        r.matches
            .iter()
            .position(|m| !m.is_finished && m.involves(&state.owner_id) && filter(m))
            .map(|index| MatchPointer { round, index })
    })
}

fn cycle_finished(state: &TournamentState, cycle: u8) -> bool {
    state.all_matches().filter(|m| m.cycle == Some(cycle)).all(|m| m.is_finished)
}

fn begin_live(state: &mut TournamentState, pointer: MatchPointer, rng: &mut impl Rng) {
    state.clear_live();
    state.current_match = Some(pointer);
    state.match_seed = Some(rng.gen());
    let round = state.rounds.get(pointer.round).map(|r| r.name.clone()).unwrap_or_default();
    info!("Tournament {}: {} match {} is live", state.id, round, pointer.index);
    set_status(state, TournamentStatus::RoundInProgress);
}

/// Synthesize the next elimination round if one is due, then settle the status.
fn settle_bracket(state: &mut TournamentState) {
    synthesize_next_round(state);
    if state.all_finished() {
        set_status(state, TournamentStatus::Complete);
    } else {
        set_status(state, TournamentStatus::RoundComplete);
    }
}

/// Make the tracked competitor's next match live, or, when they have none in
/// the active round/cycle, resolve it and move on.
pub fn start_next_round(
    state: &mut TournamentState,
    owner_id: &str,
    config: &SimConfig,
    rng: &mut impl Rng,
) -> Result<()> {
    check_owner(state, owner_id)?;
    if !matches!(state.status, TournamentStatus::BracketReady | TournamentStatus::RoundComplete) {
        warn!("Tournament {}: start_next_round while {:?}", state.id, state.status);
        return Err(TournamentError::InvalidStatus { status: state.status });
    }
    state.reset_all_players();

    match state.format {
        TournamentFormat::RoundRobin => {
            let current = state.current_round_robin_round;
            if current < state.total_round_robin_rounds && cycle_finished(state, current) {
                state.current_round_robin_round += 1;
            }
            let cycle = Some(state.current_round_robin_round);
            if let Some(pointer) = find_tracked(state, |m| m.cycle == cycle) {
                begin_live(state, pointer, rng);
                return Ok(());
            }
            // 휴식 회차
            resolve_where(state, config, rng, |_, m| m.cycle == cycle);
            if state.current_round_robin_round >= state.total_round_robin_rounds {
                set_status(state, TournamentStatus::Complete);
            } else {
                set_status(state, TournamentStatus::RoundComplete);
            }
        }
        TournamentFormat::SingleElimination => {
            if let Some(pointer) = find_tracked(state, |_| true) {
                // Leftovers in earlier rounds (3,4위전) go first
                resolve_where(state, config, rng, |p, m| p.round < pointer.round && !m.involves_tracked);
                begin_live(state, pointer, rng);
                return Ok(());
            }
            // 부전승: nothing to play this round
            resolve_where(state, config, rng, |_, _| true);
            settle_bracket(state);
        }
    }
    Ok(())
}

/// Called once the live match has its result frozen.
pub(crate) fn handle_match_complete(state: &mut TournamentState, config: &SimConfig, rng: &mut impl Rng) {
    let pointer = match state.validated_pointer() {
        Ok(p) => p,
        Err(e) => {
            warn!("Tournament {}: completion without a live match ({})", state.id, e);
            return;
        }
    };
    let Some(m) = state.match_at(pointer) else {
        return;
    };
    let participants: Vec<String> = m.player_ids().map(str::to_string).collect();
    let tracked_lost = m.involves(&state.owner_id) && m.winner.as_deref() != Some(state.owner_id.as_str());
    for id in &participants {
        if let Some(p) = state.player_mut(id) {
            p.reset_to_idle();
        }
    }
    state.current_match = None;
    state.match_seed = None;

    match state.format {
        TournamentFormat::RoundRobin => {
            let cycle = Some(state.current_round_robin_round);
            resolve_where(state, config, rng, |_, m| m.cycle == cycle && !m.involves_tracked);
            if state.current_round_robin_round >= state.total_round_robin_rounds && state.all_finished() {
                set_status(state, TournamentStatus::Complete);
            } else {
                set_status(state, TournamentStatus::RoundComplete);
            }
        }
        TournamentFormat::SingleElimination => {
            if tracked_lost {
                set_status(state, TournamentStatus::Eliminated);
                return;
            }
            resolve_where(state, config, rng, |p, m| p.round <= pointer.round && !m.involves_tracked);
            settle_bracket(state);
        }
    }
}

/// Forfeiter gets 0%, the opponent (if any) takes the match.
fn forfeit_in(
    state: &mut TournamentState,
    pointer: MatchPointer,
    forfeiter: &str,
    mut commentary: Vec<CommentaryLine>,
) -> bool {
    let Some(m) = state.match_at(pointer) else {
        return false;
    };
    let Some(slot) = m.slot_of(forfeiter) else {
        return false;
    };
    let opponent_slot = 1 - slot;
    let opponent = m.players[opponent_slot].clone();
    let mut percent = [0.0, 0.0];
    percent[opponent_slot] = 100.0;

    let forfeiter_name =
        state.player(forfeiter).map(|p| p.name.clone()).unwrap_or_else(|| forfeiter.to_string());
    let opponent_name = opponent.as_deref().and_then(|id| state.player(id)).map(|p| p.name.clone());
    commentary.push(forfeit_line(state.current_tick, &forfeiter_name, opponent_name.as_deref()));

    let winner_slot = opponent.as_ref().map(|_| opponent_slot);
    finish_match(state, pointer, winner_slot, percent, 0.5, commentary)
}

/// 대회 기권: every unfinished match of the owner goes to the opponent.
/// Matches without the owner are left exactly as they are.
pub fn forfeit_tournament(state: &mut TournamentState, owner_id: &str) -> Result<()> {
    check_owner(state, owner_id)?;
    if state.status.is_terminal() {
        return Err(TournamentError::InvalidStatus { status: state.status });
    }
    let pending: Vec<MatchPointer> = state
        .rounds
        .iter()
        .enumerate()
        .flat_map(|(round, r)| {
            r.matches
                .iter()
                .enumerate()
                .filter(|(_, m)| !m.is_finished && m.involves(owner_id))
                .map(move |(index, _)| MatchPointer { round, index })
        })
        .collect();

    for pointer in &pending {
        let commentary = if state.current_match == Some(*pointer) {
            std::mem::take(&mut state.live_commentary)
        } else {
            Vec::new()
        };
        forfeit_in(state, *pointer, owner_id, commentary);
    }
    state.reset_all_players();
    state.current_match = None;
    state.match_seed = None;
    info!("Tournament {}: {} forfeited {} matches", state.id, owner_id, pending.len());
    set_status(state, TournamentStatus::Eliminated);
    Ok(())
}

/// 현재 대국 기권, then the normal completion path.
pub fn forfeit_current_match(
    state: &mut TournamentState,
    owner_id: &str,
    config: &SimConfig,
    rng: &mut impl Rng,
) -> Result<()> {
    check_owner(state, owner_id)?;
    if state.status != TournamentStatus::RoundInProgress {
        return Err(TournamentError::InvalidStatus { status: state.status });
    }
    let pointer = state.validated_pointer()?;
    let commentary = state.live_commentary.clone();
    if !forfeit_in(state, pointer, owner_id, commentary) {
        warn!("Tournament {}: live match {:?} could not be forfeited", state.id, pointer);
    }
    handle_match_complete(state, config, rng);
    Ok(())
}

/// Fast-forward: resolve everything and finish the tournament. Always ends
/// in `complete`, even when the iteration cap is hit.
pub fn skip_to_results(
    state: &mut TournamentState,
    owner_id: &str,
    config: &SimConfig,
    rng: &mut impl Rng,
) -> Result<()> {
    check_owner(state, owner_id)?;
    let mut iterations = 0;
    while state.status != TournamentStatus::Complete && iterations < config.max_skip_iterations {
        iterations += 1;
        resolve_where(state, config, rng, |_, _| true);
        match state.format {
            TournamentFormat::SingleElimination => {
                if !synthesize_next_round(state) && state.all_finished() {
                    set_status(state, TournamentStatus::Complete);
                }
            }
            TournamentFormat::RoundRobin => {
                state.current_round_robin_round = state.total_round_robin_rounds;
                if state.all_finished() {
                    set_status(state, TournamentStatus::Complete);
                }
            }
        }
    }
    if state.status != TournamentStatus::Complete {
        warn!("Tournament {}: skip hit the {} iteration cap", state.id, config.max_skip_iterations);
        set_status(state, TournamentStatus::Complete);
    }

    state.clear_live();
    state.current_tick = config.total_ticks();
    state.reset_all_players();
    debug!("Tournament {}: skipped to results in {} passes", state.id, iterations);
    Ok(())
}
