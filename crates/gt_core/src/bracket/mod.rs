//! 대진표 생성
//!
//! Builds the initial rounds of a tournament and synthesizes the follow-up
//! elimination rounds as earlier ones finish.

pub mod schedule;

use chrono::Utc;
use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::HashSet;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{Result, TournamentError};
use crate::models::{
    CompetitorSnapshot, Match, PlayerForTournament, RecentLines, Round, RoundKind, TournamentFormat,
    TournamentKind, TournamentState, TournamentStatus,
};
pub use schedule::{cycle_count, round_robin_schedule, LEAGUE_SIZE};

/// Shuffle the opponents and put the tracked competitor at `slot`
/// (clamped to the end of the list).
pub fn seed_competitors(
    mut competitors: Vec<CompetitorSnapshot>,
    tracked_id: &str,
    slot: usize,
    rng: &mut impl Rng,
) -> Result<Vec<CompetitorSnapshot>> {
    let pos = competitors
        .iter()
        .position(|c| c.id == tracked_id)
        .ok_or_else(|| TournamentError::UnknownCompetitor(tracked_id.to_string()))?;
    let tracked = competitors.remove(pos);
    competitors.shuffle(rng);
    let slot = slot.min(competitors.len());
    competitors.insert(slot, tracked);
    Ok(competitors)
}

/// Pair consecutive ids; an odd one out gets a bye.
pub fn pair_round(kind: RoundKind, ids: &[String], tracked_id: &str) -> Round {
    let matches = ids
        .chunks(2)
        .enumerate()
        .map(|(i, pair)| {
            Match::new(Some(pair[0].clone()), pair.get(1).cloned(), tracked_id, i as u8)
        })
        .collect();
    Round::new(kind, matches)
}

/// All cycles generated up front into one "풀리그" round.
pub fn league_round(ids: &[String], tracked_id: &str) -> Round {
    let mut matches = Vec::new();
    for (cycle, pairs) in round_robin_schedule(ids.len()).iter().enumerate() {
        for (slot, &(a, b)) in pairs.iter().enumerate() {
            let mut m = Match::new(Some(ids[a].clone()), Some(ids[b].clone()), tracked_id, slot as u8);
            m.cycle = Some(cycle as u8 + 1);
            matches.push(m);
        }
    }
    Round::new(RoundKind::League, matches)
}

fn validate_field(kind: TournamentKind, owner_id: &str, players: &[PlayerForTournament]) -> Result<()> {
    let definition = kind.definition();
    if players.len() != definition.player_count {
        return Err(TournamentError::InvalidCompetitorCount {
            format: definition.display_name.to_string(),
            expected: definition.player_count,
            found: players.len(),
        });
    }
    let mut seen = HashSet::new();
    for p in players {
        if !seen.insert(p.id.as_str()) {
            return Err(TournamentError::DuplicateCompetitor(p.id.clone()));
        }
    }
    if !seen.contains(owner_id) {
        return Err(TournamentError::UnknownCompetitor(owner_id.to_string()));
    }
    Ok(())
}

/// Build a fresh tournament for `kind`. The competitor order is used as-is;
/// call [`seed_competitors`] first to control the tracked competitor's slot.
pub fn build_tournament(
    kind: TournamentKind,
    owner_id: &str,
    competitors: Vec<CompetitorSnapshot>,
) -> Result<TournamentState> {
    let players: Vec<PlayerForTournament> = competitors.into_iter().map(PlayerForTournament::from).collect();
    validate_field(kind, owner_id, &players)?;
    let state = assemble(kind, kind.definition().format, owner_id, players);
    info!(
        "Built {} for {} ({} competitors, {} matches)",
        kind.definition().display_name,
        owner_id,
        state.players.len(),
        state.all_matches().count()
    );
    Ok(state)
}

/// Lay out the first round(s) for any field size. No count validation.
pub fn assemble(
    kind: TournamentKind,
    format: TournamentFormat,
    owner_id: &str,
    mut players: Vec<PlayerForTournament>,
) -> TournamentState {
    for p in &mut players {
        p.reset_to_idle();
    }
    let ids: Vec<String> = players.iter().map(|p| p.id.clone()).collect();
    let (rounds, cycles) = match format {
        TournamentFormat::SingleElimination => {
            (vec![pair_round(RoundKind::Bracket { size: ids.len() }, &ids, owner_id)], 0)
        }
        TournamentFormat::RoundRobin => (vec![league_round(&ids, owner_id)], cycle_count(ids.len()) as u8),
    };

    TournamentState {
        id: Uuid::new_v4().to_string(),
        kind,
        format,
        owner_id: owner_id.to_string(),
        status: TournamentStatus::BracketReady,
        players,
        rounds,
        current_match: None,
        current_round_robin_round: u8::from(cycles > 0),
        total_round_robin_rounds: cycles,
        current_tick: 0,
        live_scores: [0.0, 0.0],
        live_commentary: Vec::new(),
        recent_lines: RecentLines::default(),
        match_seed: None,
        created_at: Utc::now(),
    }
}

/// Append the next elimination round(s) once the last one is finished.
/// After a 4강 with two losers, "3,4위전" goes in before "결승".
/// Returns false when nothing was added.
pub(crate) fn synthesize_next_round(state: &mut TournamentState) -> bool {
    if state.format != TournamentFormat::SingleElimination {
        return false;
    }
    let Some(last) = state.rounds.last() else {
        return false;
    };
    if !last.is_finished() || last.kind.is_final() || last.kind == RoundKind::ThirdPlace {
        return false;
    }
    let winners = last.winners();
    if winners.len() < 2 {
        return false;
    }
    let losers = last.losers();
    let semifinal = last.kind == (RoundKind::Bracket { size: 4 });
    let tracked = state.owner_id.clone();

    if semifinal && losers.len() == 2 {
        state.rounds.push(pair_round(RoundKind::ThirdPlace, &losers, &tracked));
    }
    let next = pair_round(RoundKind::Bracket { size: winners.len() }, &winners, &tracked);
    debug!("Tournament {}: synthesized {}", state.id, next.name);
    state.rounds.push(next);
    true
}
