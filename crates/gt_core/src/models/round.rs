// 라운드 (강/결승/3,4위전/풀리그)
use serde::{Deserialize, Serialize};

use super::match_record::Match;

/// Round tag. Names and placements derive from this, never from the name string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RoundKind {
    /// Elimination round with `size` competitors ("N강", or "결승" for 2)
    Bracket { size: usize },
    /// 3,4위전
    ThirdPlace,
    /// 풀리그 (all round-robin matches)
    League,
}

impl RoundKind {
    pub fn display_name(&self) -> String {
        match self {
            RoundKind::Bracket { size: 2 } => "결승".to_string(),
            RoundKind::Bracket { size } => format!("{}강", size),
            RoundKind::ThirdPlace => "3,4위전".to_string(),
            RoundKind::League => "풀리그".to_string(),
        }
    }

    /// Placement of a match loser in this round
    pub fn loser_rank(&self) -> Option<usize> {
        match self {
            RoundKind::Bracket { size } => Some(*size),
            RoundKind::ThirdPlace => Some(4),
            RoundKind::League => None,
        }
    }

    /// Placement of a match winner, only defined for placement matches
    pub fn winner_rank(&self) -> Option<usize> {
        match self {
            RoundKind::Bracket { size: 2 } => Some(1),
            RoundKind::ThirdPlace => Some(3),
            _ => None,
        }
    }

    pub fn is_final(&self) -> bool {
        matches!(self, RoundKind::Bracket { size: 2 })
    }
}

/// "N회차" label for a round-robin cycle
pub fn cycle_label(cycle: u8) -> String {
    format!("{}회차", cycle)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Round {
    pub name: String,
    pub kind: RoundKind,
    pub matches: Vec<Match>,
}

impl Round {
    pub fn new(kind: RoundKind, matches: Vec<Match>) -> Self {
        Self { name: kind.display_name(), kind, matches }
    }

    pub fn is_finished(&self) -> bool {
        self.matches.iter().all(|m| m.is_finished)
    }

    /// Winners in match order (byes included)
    pub fn winners(&self) -> Vec<String> {
        self.matches.iter().filter_map(|m| m.winner.clone()).collect()
    }

    /// Losers in match order (byes have none)
    pub fn losers(&self) -> Vec<String> {
        self.matches.iter().filter_map(|m| m.loser().map(str::to_string)).collect()
    }
}
