//! 6대 기력 스탯
//!
//! Six core stat dimensions every competitor carries into a tournament.

use serde::{Deserialize, Serialize};

/// Stat dimension
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatKind {
    /// 집중력
    Concentration,
    /// 사고속도
    ThinkingSpeed,
    /// 공격성
    Aggression,
    /// 안정감
    Stability,
    /// 계산력
    Calculation,
    /// 직관
    Intuition,
}

impl StatKind {
    pub const ALL: [StatKind; 6] = [
        StatKind::Concentration,
        StatKind::ThinkingSpeed,
        StatKind::Aggression,
        StatKind::Stability,
        StatKind::Calculation,
        StatKind::Intuition,
    ];
}

/// Six stat values. Values never drop below zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatBlock {
    pub concentration: i32,
    pub thinking_speed: i32,
    pub aggression: i32,
    pub stability: i32,
    pub calculation: i32,
    pub intuition: i32,
}

impl StatBlock {
    /// Same value on every dimension (handy for tests and bots)
    pub fn uniform(value: i32) -> Self {
        Self {
            concentration: value,
            thinking_speed: value,
            aggression: value,
            stability: value,
            calculation: value,
            intuition: value,
        }
    }

    pub fn get(&self, kind: StatKind) -> i32 {
        match kind {
            StatKind::Concentration => self.concentration,
            StatKind::ThinkingSpeed => self.thinking_speed,
            StatKind::Aggression => self.aggression,
            StatKind::Stability => self.stability,
            StatKind::Calculation => self.calculation,
            StatKind::Intuition => self.intuition,
        }
    }

    fn get_mut(&mut self, kind: StatKind) -> &mut i32 {
        match kind {
            StatKind::Concentration => &mut self.concentration,
            StatKind::ThinkingSpeed => &mut self.thinking_speed,
            StatKind::Aggression => &mut self.aggression,
            StatKind::Stability => &mut self.stability,
            StatKind::Calculation => &mut self.calculation,
            StatKind::Intuition => &mut self.intuition,
        }
    }

    /// Apply a signed drift, saturating at zero.
    pub fn add(&mut self, kind: StatKind, delta: i32) {
        let value = self.get_mut(kind);
        *value = (*value + delta).max(0);
    }

    pub fn total(&self) -> i32 {
        StatKind::ALL.iter().map(|k| self.get(*k)).sum()
    }

    pub fn as_array(&self) -> [i32; 6] {
        [
            self.concentration,
            self.thinking_speed,
            self.aggression,
            self.stability,
            self.calculation,
            self.intuition,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_saturates_at_zero() {
        let mut stats = StatBlock::uniform(2);
        stats.add(StatKind::Aggression, -3);
        assert_eq!(stats.aggression, 0);
        stats.add(StatKind::Aggression, 3);
        assert_eq!(stats.aggression, 3);
    }

    #[test]
    fn test_total_and_array_order() {
        let stats = StatBlock {
            concentration: 10,
            thinking_speed: 20,
            aggression: 30,
            stability: 40,
            calculation: 50,
            intuition: 60,
        };
        assert_eq!(stats.total(), 210);
        assert_eq!(stats.as_array(), [10, 20, 30, 40, 50, 60]);
        for (i, kind) in StatKind::ALL.iter().enumerate() {
            assert_eq!(stats.get(*kind), stats.as_array()[i]);
        }
    }
}
