//! 토너먼트 참가자
//!
//! `stats` is the working copy mutated during a live match; `original_stats`
//! is the frozen baseline. The working copy is restored from the baseline at
//! exactly three points: match start (`begin_match`), match end and round
//! transition (`reset_to_idle`).

use serde::{Deserialize, Serialize};

use super::stats::StatBlock;

/// Condition sentinel: not currently in a live match.
pub const CONDITION_IDLE: u16 = 1000;

/// Snapshot handed in by the caller when a tournament is created
/// (a real user's totals or a generated bot).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompetitorSnapshot {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub avatar_id: Option<String>,
    #[serde(default)]
    pub frame_id: Option<String>,
    pub stats: StatBlock,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerForTournament {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub avatar_id: Option<String>,
    #[serde(default)]
    pub frame_id: Option<String>,
    pub stats: StatBlock,
    pub original_stats: StatBlock,
    /// 40..=100 while simulating, `CONDITION_IDLE` otherwise
    pub condition: u16,
    #[serde(default)]
    pub wins: u32,
    #[serde(default)]
    pub losses: u32,
}

impl From<CompetitorSnapshot> for PlayerForTournament {
    fn from(snapshot: CompetitorSnapshot) -> Self {
        Self {
            id: snapshot.id,
            name: snapshot.name,
            avatar_id: snapshot.avatar_id,
            frame_id: snapshot.frame_id,
            stats: snapshot.stats,
            original_stats: snapshot.stats,
            condition: CONDITION_IDLE,
            wins: 0,
            losses: 0,
        }
    }
}

impl PlayerForTournament {
    pub fn new(id: impl Into<String>, name: impl Into<String>, stats: StatBlock) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            avatar_id: None,
            frame_id: None,
            stats,
            original_stats: stats,
            condition: CONDITION_IDLE,
            wins: 0,
            losses: 0,
        }
    }

    /// 대국 시작: 스탯 복원 + 컨디션 부여
    pub fn begin_match(&mut self, condition: u16) {
        self.stats = self.original_stats;
        self.condition = condition;
    }

    /// 대국 종료 / 라운드 전환: 스탯 복원 + 대기 상태
    pub fn reset_to_idle(&mut self) {
        self.stats = self.original_stats;
        self.condition = CONDITION_IDLE;
    }

    pub fn is_in_match(&self) -> bool {
        self.condition != CONDITION_IDLE
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::stats::StatKind;

    #[test]
    fn test_reset_contract() {
        let mut player = PlayerForTournament::new("p1", "이세돌", StatBlock::uniform(70));
        assert!(!player.is_in_match());

        player.begin_match(85);
        assert!(player.is_in_match());
        player.stats.add(StatKind::Calculation, 3);
        player.stats.add(StatKind::Intuition, -2);
        assert_ne!(player.stats, player.original_stats);

        player.reset_to_idle();
        assert_eq!(player.stats, player.original_stats);
        assert_eq!(player.condition, CONDITION_IDLE);
    }

    #[test]
    fn test_begin_match_restores_drifted_stats() {
        let mut player = PlayerForTournament::new("p1", "조훈현", StatBlock::uniform(50));
        player.stats.add(StatKind::Stability, 9);
        player.begin_match(40);
        assert_eq!(player.stats, player.original_stats);
        assert_eq!(player.condition, 40);
    }
}
