//! Bulk match simulator
//!
//! Runs a whole match in one call with no commentary, no events and no stat
//! drift: byes, forfeits, skip to results and server-side re-verification all
//! go through here. The competitors are left in their post-match state
//! (condition still set); resetting them is the progression controller's job.

use rand::Rng;
use tracing::debug;

use super::config::SimConfig;
use super::outcome::{decide, Verdict};
use super::power::player_power;
use crate::models::{CommentaryLine, MatchPointer, PlayerForTournament, StatKind, TournamentState};

/// Fresh match condition in the configured range
pub fn roll_condition(config: &SimConfig, rng: &mut impl Rng) -> u16 {
    rng.gen_range(config.condition_min..=config.condition_max)
}

/// 스탯 변동: one random dimension moves by ±1..=max_step.
///
/// The upward chance is `(condition - drift_offset) / 100`, so good form
/// makes stats climb during the match and poor form makes them sag.
pub fn drift(player: &mut PlayerForTournament, config: &SimConfig, rng: &mut impl Rng) -> (StatKind, i32) {
    let kind = StatKind::ALL[rng.gen_range(0..StatKind::ALL.len())];
    let up_chance = ((f64::from(player.condition) - config.drift_offset) / 100.0).clamp(0.0, 1.0);
    let step = rng.gen_range(1..=config.drift_max_step);
    let delta = if rng.gen_bool(up_chance) { step } else { -step };
    player.stats.add(kind, delta);
    (kind, delta)
}

/// Simulate two competitors head to head. Returns the verdict and the raw
/// cumulative scores.
pub fn simulate_pair(
    p1: &mut PlayerForTournament,
    p2: &mut PlayerForTournament,
    config: &SimConfig,
    rng: &mut impl Rng,
) -> (Verdict, [f64; 2]) {
    let c1 = roll_condition(config, rng);
    let c2 = roll_condition(config, rng);
    p1.begin_match(c1);
    p2.begin_match(c2);

    let mut scores = [0.0_f64; 2];
    for tick in 1..=config.total_ticks() {
        scores[0] += player_power(p1, tick, config);
        scores[1] += player_power(p2, tick, config);
    }

    let verdict = decide(scores[0], scores[1], rng);
    (verdict, scores)
}

/// Record a finished match: freeze the result on the match and bump the
/// competitors' win/loss counters. Returns false (and changes nothing) when
/// the match was already finished or the pointer is stale.
pub(crate) fn finish_match(
    state: &mut TournamentState,
    pointer: MatchPointer,
    winner_slot: Option<usize>,
    percent: [f64; 2],
    margin: f64,
    commentary: Vec<CommentaryLine>,
) -> bool {
    let Some(m) = state.match_at_mut(pointer) else {
        return false;
    };
    let winner = winner_slot.and_then(|slot| m.players.get(slot).cloned().flatten());
    if !m.finish(winner.clone(), percent, margin) {
        return false;
    }
    m.commentary = commentary;
    let loser = m.loser().map(str::to_string);

    if let Some(w) = winner.as_deref().and_then(|id| state.player_mut(id)) {
        w.wins += 1;
    }
    if let Some(l) = loser.as_deref().and_then(|id| state.player_mut(id)) {
        l.losses += 1;
    }
    true
}

/// Resolve one unfinished match in a single shot.
pub fn simulate_match(
    state: &mut TournamentState,
    pointer: MatchPointer,
    config: &SimConfig,
    rng: &mut impl Rng,
) -> bool {
    let Some(m) = state.match_at(pointer) else {
        return false;
    };
    if m.is_finished {
        return false;
    }
    let (Some(a), Some(b)) = (m.players[0].clone(), m.players[1].clone()) else {
        // Bye built by hand without going through Match::new
        let slot = m.players.iter().position(Option::is_some);
        let percent = if slot == Some(1) { [0.0, 100.0] } else { [100.0, 0.0] };
        return finish_match(state, pointer, slot, percent, 0.5, Vec::new());
    };

    let Some((p1, p2)) = state.pair_mut(&a, &b) else {
        tracing::warn!("Match {:?} references unknown competitors ({}, {})", pointer, a, b);
        return false;
    };
    let (verdict, scores) = simulate_pair(p1, p2, config, rng);
    debug!(
        "Simulated {} vs {}: {:.1} / {:.1} -> slot {} by {}",
        a, b, scores[0], scores[1], verdict.winner_slot, verdict.margin
    );
    finish_match(state, pointer, Some(verdict.winner_slot), verdict.percent, verdict.margin, Vec::new())
}
