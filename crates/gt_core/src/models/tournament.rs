//! Tournament state
//!
//! One `TournamentState` per (owner, kind) slot. It is created once by the
//! bracket builder and then mutated by the tick advancer, the bulk simulator
//! and the progression controller.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::commentary::{CommentaryLine, RecentLines};
use super::match_record::Match;
use super::player::PlayerForTournament;
use super::round::{cycle_label, Round};
use crate::error::{Result, TournamentError};
use crate::sim::{percent_split, Phase, SimConfig};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TournamentFormat {
    SingleElimination,
    RoundRobin,
}

/// 토너먼트 종류. Each kind owns a dedicated slot on the owner record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TournamentKind {
    Daily,
    Weekly,
    League,
}

/// Player count, format and display name for a tournament kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FormatDefinition {
    pub player_count: usize,
    pub format: TournamentFormat,
    pub display_name: &'static str,
}

impl TournamentKind {
    pub const ALL: [TournamentKind; 3] =
        [TournamentKind::Daily, TournamentKind::Weekly, TournamentKind::League];

    pub fn definition(&self) -> FormatDefinition {
        match self {
            TournamentKind::Daily => FormatDefinition {
                player_count: 8,
                format: TournamentFormat::SingleElimination,
                display_name: "일일 토너먼트",
            },
            TournamentKind::Weekly => FormatDefinition {
                player_count: 16,
                format: TournamentFormat::SingleElimination,
                display_name: "주간 토너먼트",
            },
            TournamentKind::League => FormatDefinition {
                player_count: 6,
                format: TournamentFormat::RoundRobin,
                display_name: "리그전",
            },
        }
    }

    /// Stable slot key used by stores (file names, map keys)
    pub fn slot_key(&self) -> &'static str {
        match self {
            TournamentKind::Daily => "daily_tournament",
            TournamentKind::Weekly => "weekly_tournament",
            TournamentKind::League => "league_tournament",
        }
    }

    pub fn parse(tag: &str) -> Option<Self> {
        match tag.trim().to_ascii_lowercase().as_str() {
            "daily" => Some(TournamentKind::Daily),
            "weekly" => Some(TournamentKind::Weekly),
            "league" => Some(TournamentKind::League),
            _ => None,
        }
    }
}

/// bracket_ready → round_in_progress → round_complete → … → complete | eliminated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TournamentStatus {
    BracketReady,
    RoundInProgress,
    RoundComplete,
    Complete,
    Eliminated,
}

impl TournamentStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, TournamentStatus::Complete | TournamentStatus::Eliminated)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchPointer {
    pub round: usize,
    pub index: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TournamentState {
    pub id: String,
    pub kind: TournamentKind,
    pub format: TournamentFormat,
    pub owner_id: String,
    pub status: TournamentStatus,
    pub players: Vec<PlayerForTournament>,
    pub rounds: Vec<Round>,
    pub current_match: Option<MatchPointer>,
    /// Active round-robin cycle (1-based); 0 for elimination
    #[serde(default)]
    pub current_round_robin_round: u8,
    /// Number of round-robin cycles; 0 for elimination
    #[serde(default)]
    pub total_round_robin_rounds: u8,
    pub current_tick: u32,
    pub live_scores: [f64; 2],
    #[serde(default)]
    pub live_commentary: Vec<CommentaryLine>,
    #[serde(default)]
    pub recent_lines: RecentLines,
    /// Present only while a match is live
    #[serde(default)]
    pub match_seed: Option<u64>,
    pub created_at: DateTime<Utc>,
}

/// Live match summary for observers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveView {
    pub pointer: MatchPointer,
    pub round_name: String,
    pub players: [Option<String>; 2],
    pub elapsed_ticks: u32,
    pub total_ticks: u32,
    pub phase: Phase,
    /// 포석 / 중반 / 끝내기
    pub phase_label: String,
    /// "N회차" for league matches
    #[serde(default)]
    pub cycle_label: Option<String>,
    pub live_percent: [f64; 2],
}

impl TournamentState {
    pub fn player(&self, id: &str) -> Option<&PlayerForTournament> {
        self.players.iter().find(|p| p.id == id)
    }

    pub fn player_mut(&mut self, id: &str) -> Option<&mut PlayerForTournament> {
        self.players.iter_mut().find(|p| p.id == id)
    }

    /// Both participants of a match, mutably. `None` when either id is unknown
    /// or both ids are the same.
    pub fn pair_mut(
        &mut self,
        a: &str,
        b: &str,
    ) -> Option<(&mut PlayerForTournament, &mut PlayerForTournament)> {
        pair_in(&mut self.players, a, b)
    }

    pub fn match_at(&self, pointer: MatchPointer) -> Option<&Match> {
        self.rounds.get(pointer.round)?.matches.get(pointer.index)
    }

    pub fn match_at_mut(&mut self, pointer: MatchPointer) -> Option<&mut Match> {
        self.rounds.get_mut(pointer.round)?.matches.get_mut(pointer.index)
    }

    /// The live match pointer, checked against the current round layout.
    pub fn validated_pointer(&self) -> Result<MatchPointer> {
        let pointer = self
            .current_match
            .ok_or(TournamentError::InvalidPointer { round: usize::MAX, index: usize::MAX })?;
        if self.match_at(pointer).is_none() {
            return Err(TournamentError::InvalidPointer {
                round: pointer.round,
                index: pointer.index,
            });
        }
        Ok(pointer)
    }

    pub fn all_matches(&self) -> impl Iterator<Item = &Match> {
        self.rounds.iter().flat_map(|r| r.matches.iter())
    }

    pub fn all_finished(&self) -> bool {
        self.all_matches().all(|m| m.is_finished)
    }

    /// Drop everything tied to the live match.
    pub fn clear_live(&mut self) {
        self.current_match = None;
        self.current_tick = 0;
        self.live_scores = [0.0, 0.0];
        self.match_seed = None;
        self.live_commentary.clear();
        self.recent_lines.clear();
    }

    /// Restore every competitor to the idle baseline (round transition).
    pub fn reset_all_players(&mut self) {
        for player in &mut self.players {
            player.reset_to_idle();
        }
    }

    pub fn live_view(&self, config: &SimConfig) -> Option<LiveView> {
        let pointer = self.current_match?;
        let round = self.rounds.get(pointer.round)?;
        let m = round.matches.get(pointer.index)?;
        let phase = config.phase_for_tick(self.current_tick.max(1));
        Some(LiveView {
            pointer,
            round_name: round.name.clone(),
            players: m.players.clone(),
            elapsed_ticks: self.current_tick,
            total_ticks: config.total_ticks(),
            phase,
            phase_label: phase.label().to_string(),
            cycle_label: m.cycle.map(cycle_label),
            live_percent: percent_split(self.live_scores[0], self.live_scores[1]),
        })
    }
}

/// Two distinct competitors borrowed mutably at once
pub fn pair_in<'a>(
    players: &'a mut [PlayerForTournament],
    a: &str,
    b: &str,
) -> Option<(&'a mut PlayerForTournament, &'a mut PlayerForTournament)> {
    let i = players.iter().position(|p| p.id == a)?;
    let j = players.iter().position(|p| p.id == b)?;
    if i < j {
        let (left, right) = players.split_at_mut(j);
        Some((&mut left[i], &mut right[0]))
    } else if i > j {
        let (left, right) = players.split_at_mut(i);
        Some((&mut right[0], &mut left[j]))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_definitions() {
        let daily = TournamentKind::Daily.definition();
        assert_eq!(daily.player_count, 8);
        assert_eq!(daily.format, TournamentFormat::SingleElimination);

        let league = TournamentKind::League.definition();
        assert_eq!(league.player_count, 6);
        assert_eq!(league.format, TournamentFormat::RoundRobin);
    }

    #[test]
    fn test_kind_parse_and_slot_keys_unique() {
        assert_eq!(TournamentKind::parse(" Weekly "), Some(TournamentKind::Weekly));
        assert_eq!(TournamentKind::parse("monthly"), None);

        let keys: std::collections::HashSet<_> =
            TournamentKind::ALL.iter().map(|k| k.slot_key()).collect();
        assert_eq!(keys.len(), TournamentKind::ALL.len());
    }

    #[test]
    fn test_status_serializes_snake_case() {
        let json = serde_json::to_string(&TournamentStatus::RoundInProgress).unwrap();
        assert_eq!(json, "\"round_in_progress\"");
        assert!(TournamentStatus::Eliminated.is_terminal());
        assert!(!TournamentStatus::RoundComplete.is_terminal());
    }

    fn with_live_match(cycle: Option<u8>) -> TournamentState {
        use crate::models::RoundKind;

        let mut state = crate::test_support::bare_state(crate::test_support::players(2));
        let mut m = Match::new(Some("p0".into()), Some("p1".into()), "p0", 0);
        m.cycle = cycle;
        let kind = if cycle.is_some() { RoundKind::League } else { RoundKind::Bracket { size: 2 } };
        state.rounds.push(Round::new(kind, vec![m]));
        state.status = TournamentStatus::RoundInProgress;
        state.current_match = Some(MatchPointer { round: 0, index: 0 });
        state
    }

    #[test]
    fn test_live_view_league_cycle() {
        let config = SimConfig::default();
        let mut state = with_live_match(Some(2));
        state.current_tick = 20;
        state.live_scores = [300.0, 100.0];

        let live = state.live_view(&config).unwrap();
        assert_eq!(live.round_name, "풀리그");
        assert_eq!(live.cycle_label.as_deref(), Some("2회차"));
        assert_eq!(live.phase, Phase::Mid);
        assert_eq!(live.phase_label, "중반");
        assert_eq!(live.live_percent, [75.0, 25.0]);
        assert_eq!(live.total_ticks, 50);
    }

    #[test]
    fn test_live_view_elimination() {
        let config = SimConfig::default();
        let mut state = with_live_match(None);
        // Before the first tick
        let live = state.live_view(&config).unwrap();
        assert_eq!(live.round_name, "결승");
        assert_eq!(live.cycle_label, None);
        assert_eq!(live.phase_label, "포석");
        assert_eq!(live.live_percent, [50.0, 50.0]);

        state.current_tick = 45;
        assert_eq!(state.live_view(&config).unwrap().phase_label, "끝내기");

        state.current_match = None;
        assert!(state.live_view(&config).is_none());
    }
}
