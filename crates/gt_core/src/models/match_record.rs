//! 대국 (Match)
//!
//! Slots hold competitor ids; the competitor records themselves live in
//! `TournamentState::players`. An empty slot is a bye.

use serde::{Deserialize, Serialize};

use super::commentary::CommentaryLine;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Match {
    pub players: [Option<String>; 2],
    pub winner: Option<String>,
    pub is_finished: bool,
    /// Percentage split (sums to 100), set once at finish
    pub final_score: Option<[f64; 2]>,
    /// Reported margin in 집 (always x.5)
    #[serde(default)]
    pub margin: Option<f64>,
    #[serde(default)]
    pub commentary: Vec<CommentaryLine>,
    pub involves_tracked: bool,
    /// Decorative only (board skin index)
    pub display_index: u8,
    /// Round-robin cycle (1-based); `None` for elimination matches
    #[serde(default)]
    pub cycle: Option<u8>,
}

impl Match {
    pub fn new(
        p1: Option<String>,
        p2: Option<String>,
        tracked_id: &str,
        display_index: u8,
    ) -> Self {
        let involves_tracked =
            p1.as_deref() == Some(tracked_id) || p2.as_deref() == Some(tracked_id);
        let mut m = Self {
            players: [p1, p2],
            winner: None,
            is_finished: false,
            final_score: None,
            margin: None,
            commentary: Vec::new(),
            involves_tracked,
            display_index,
            cycle: None,
        };
        m.resolve_if_bye();
        m
    }

    /// 부전승 처리: exactly one present slot wins immediately.
    fn resolve_if_bye(&mut self) {
        match (&self.players[0], &self.players[1]) {
            (Some(p), None) | (None, Some(p)) => {
                self.winner = Some(p.clone());
                self.is_finished = true;
            }
            (None, None) => {
                self.is_finished = true;
            }
            _ => {}
        }
    }

    pub fn is_bye(&self) -> bool {
        self.players.iter().filter(|p| p.is_some()).count() < 2
    }

    pub fn involves(&self, id: &str) -> bool {
        self.players.iter().any(|p| p.as_deref() == Some(id))
    }

    /// Slot index (0 or 1) of a competitor
    pub fn slot_of(&self, id: &str) -> Option<usize> {
        self.players.iter().position(|p| p.as_deref() == Some(id))
    }

    pub fn opponent_of(&self, id: &str) -> Option<&str> {
        match self.slot_of(id)? {
            0 => self.players[1].as_deref(),
            _ => self.players[0].as_deref(),
        }
    }

    /// Loser of a finished, non-bye match
    pub fn loser(&self) -> Option<&str> {
        if !self.is_finished || self.is_bye() {
            return None;
        }
        let winner = self.winner.as_deref()?;
        self.opponent_of(winner)
    }

    pub fn player_ids(&self) -> impl Iterator<Item = &str> {
        self.players.iter().filter_map(|p| p.as_deref())
    }

    /// Freeze the result. The first call wins; later calls are ignored.
    pub fn finish(&mut self, winner: Option<String>, final_score: [f64; 2], margin: f64) -> bool {
        if self.is_finished {
            return false;
        }
        self.winner = winner;
        self.final_score = Some(final_score);
        self.margin = Some(margin);
        self.is_finished = true;
        true
    }
}
