//! 최종 순위 계산

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::models::{RoundKind, TournamentFormat, TournamentState};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankEntry {
    pub id: String,
    pub name: String,
    pub rank: usize,
    pub wins: u32,
    pub losses: u32,
}

/// Standings sorted by rank (ties keep competitor order).
pub fn calculate_ranks(state: &TournamentState) -> Vec<RankEntry> {
    let ranks = match state.format {
        TournamentFormat::SingleElimination => elimination_ranks(state),
        TournamentFormat::RoundRobin => league_ranks(state),
    };
    let mut entries: Vec<RankEntry> = state
        .players
        .iter()
        .map(|p| RankEntry {
            id: p.id.clone(),
            name: p.name.clone(),
            rank: ranks.get(p.id.as_str()).copied().unwrap_or(state.players.len()),
            wins: p.wins,
            losses: p.losses,
        })
        .collect();
    entries.sort_by_key(|e| e.rank);
    entries
}

/// Last round first; the first placement a competitor receives sticks.
fn elimination_ranks(state: &TournamentState) -> HashMap<&str, usize> {
    let mut ranks: HashMap<&str, usize> = HashMap::new();
    for round in state.rounds.iter().rev() {
        let Some(loser_rank) = round.kind.loser_rank() else {
            continue;
        };
        for m in &round.matches {
            if !m.is_finished {
                for id in m.player_ids() {
                    ranks.entry(id).or_insert(loser_rank);
                }
                continue;
            }
            if let Some(winner) = m.winner.as_deref() {
                // Winners of a non-placement round are at least in the next round
                let rank = round.kind.winner_rank().unwrap_or_else(|| advancing_rank(round.kind));
                ranks.entry(winner).or_insert(rank);
            }
            if let Some(loser) = m.loser() {
                ranks.entry(loser).or_insert(loser_rank);
            }
        }
    }
    ranks
}

fn advancing_rank(kind: RoundKind) -> usize {
    match kind {
        RoundKind::Bracket { size } => (size + 1) / 2,
        _ => 1,
    }
}

/// Standard competition ranking by wins (1, 1, 3, …)
fn league_ranks(state: &TournamentState) -> HashMap<&str, usize> {
    state
        .players
        .iter()
        .map(|p| {
            let ahead = state.players.iter().filter(|o| o.wins > p.wins).count();
            (p.id.as_str(), ahead + 1)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bracket::build_tournament;
    use crate::models::{Match, Round, TournamentKind};
    use crate::test_support::field;

    fn finish_first(round: &mut Round) {
        for m in &mut round.matches {
            let w = m.players[0].clone();
            m.finish(w, [55.0, 45.0], 5.5);
        }
    }

    #[test]
    fn test_full_bracket_placements() {
        let mut state = build_tournament(TournamentKind::Daily, "me", field(8, 60)).unwrap();
        finish_first(&mut state.rounds[0]);
        crate::bracket::synthesize_next_round(&mut state);
        finish_first(&mut state.rounds[1]);
        crate::bracket::synthesize_next_round(&mut state);
        finish_first(&mut state.rounds[2]);
        finish_first(&mut state.rounds[3]);

        let ranks = calculate_ranks(&state);
        let rank_of = |id: &str| ranks.iter().find(|r| r.id == id).unwrap().rank;
        let ids: Vec<String> = state.players.iter().map(|p| p.id.clone()).collect();
        // 8강: 0-1 2-3 4-5 6-7 / 4강: 0-2 4-6 / 3,4위전: 2-6 / 결승: 0-4
        assert_eq!(rank_of(&ids[0]), 1);
        assert_eq!(rank_of(&ids[4]), 2);
        assert_eq!(rank_of(&ids[2]), 3);
        assert_eq!(rank_of(&ids[6]), 4);
        for loser in [1, 3, 5, 7] {
            assert_eq!(rank_of(&ids[loser]), 8);
        }
        assert_eq!(ranks[0].rank, 1);
        assert!(ranks.windows(2).all(|w| w[0].rank <= w[1].rank));
    }

    #[test]
    fn test_unfinished_match_gives_round_size() {
        let mut state = build_tournament(TournamentKind::Daily, "me", field(8, 60)).unwrap();
        state.rounds[0].matches[0].finish(Some("me".into()), [60.0, 40.0], 10.5);
        let ranks = calculate_ranks(&state);
        // Winner of a 8강 with no later round recorded is at least 4
        assert_eq!(ranks.iter().find(|r| r.id == "me").unwrap().rank, 4);
        assert_eq!(ranks.iter().filter(|r| r.rank == 8).count(), 7);
    }

    #[test]
    fn test_league_competition_ranking() {
        let mut state = build_tournament(TournamentKind::League, "me", field(6, 60)).unwrap();
        let wins = [4, 4, 3, 2, 1, 1];
        for (p, w) in state.players.iter_mut().zip(wins) {
            p.wins = w;
        }
        let ranks: Vec<usize> = calculate_ranks(&state).iter().map(|r| r.rank).collect();
        assert_eq!(ranks, [1, 1, 3, 4, 5, 5]);
    }

    #[test]
    fn test_bye_winner_not_ranked_by_bye() {
        let mut state = crate::test_support::bare_state(crate::test_support::players(3));
        state.rounds.push(Round::new(
            RoundKind::Bracket { size: 3 },
            vec![
                Match::new(Some("p0".into()), Some("p1".into()), "p0", 0),
                Match::new(Some("p2".into()), None, "p0", 1),
            ],
        ));
        finish_first(&mut state.rounds[0]);
        crate::bracket::synthesize_next_round(&mut state);
        finish_first(&mut state.rounds[1]);
        let ranks = calculate_ranks(&state);
        let rank_of = |id: &str| ranks.iter().find(|r| r.id == id).unwrap().rank;
        assert_eq!(rank_of("p0"), 1);
        assert_eq!(rank_of("p2"), 2);
        assert_eq!(rank_of("p1"), 3);
    }
}
