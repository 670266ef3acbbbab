// 해설 로그 타입
use serde::{Deserialize, Serialize};

use super::stats::StatKind;

/// Scripted in-match events (돌발 이벤트)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RandomEventKind {
    /// 집중력 저하 - negative, the lower-concentration side is favoured to suffer it
    ConcentrationLapse,
    /// 묘수 - positive, thinking speed
    FastThinking,
    /// 강공 - positive, aggression
    AggressivePush,
    /// 침착한 수비 - positive, stability
    StabilityHold,
}

impl RandomEventKind {
    pub const ALL: [RandomEventKind; 4] = [
        RandomEventKind::ConcentrationLapse,
        RandomEventKind::FastThinking,
        RandomEventKind::AggressivePush,
        RandomEventKind::StabilityHold,
    ];

    pub fn stat(&self) -> StatKind {
        match self {
            RandomEventKind::ConcentrationLapse => StatKind::Concentration,
            RandomEventKind::FastThinking => StatKind::ThinkingSpeed,
            RandomEventKind::AggressivePush => StatKind::Aggression,
            RandomEventKind::StabilityHold => StatKind::Stability,
        }
    }

    pub fn is_positive(&self) -> bool {
        !matches!(self, RandomEventKind::ConcentrationLapse)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommentaryKind {
    Opening,
    Lead,
    Event,
    Flavor,
    FinalScore,
    Victory,
    Forfeit,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentaryLine {
    pub tick: u32,
    pub kind: CommentaryKind,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event: Option<RandomEventKind>,
}

impl CommentaryLine {
    pub fn new(tick: u32, kind: CommentaryKind, text: impl Into<String>) -> Self {
        Self { tick, kind, text: text.into(), event: None }
    }

    pub fn event(tick: u32, event: RandomEventKind, text: impl Into<String>) -> Self {
        Self { tick, kind: CommentaryKind::Event, text: text.into(), event: Some(event) }
    }
}

/// Number of recent flavor lines the picker avoids repeating.
pub const RECENT_LINE_WINDOW: usize = 3;

/// Fixed-size ring of recently used flavor line ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RecentLines {
    slots: [Option<u16>; RECENT_LINE_WINDOW],
    cursor: usize,
}

impl RecentLines {
    pub fn push(&mut self, line_id: u16) {
        self.slots[self.cursor] = Some(line_id);
        self.cursor = (self.cursor + 1) % RECENT_LINE_WINDOW;
    }

    pub fn contains(&self, line_id: u16) -> bool {
        self.slots.contains(&Some(line_id))
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recent_lines_ring_evicts_oldest() {
        let mut recent = RecentLines::default();
        recent.push(1);
        recent.push(2);
        recent.push(3);
        assert!(recent.contains(1) && recent.contains(2) && recent.contains(3));

        recent.push(4);
        assert!(!recent.contains(1));
        assert!(recent.contains(4));

        recent.clear();
        assert!(!recent.contains(4));
    }

    #[test]
    fn test_event_stat_mapping() {
        assert_eq!(RandomEventKind::ConcentrationLapse.stat(), StatKind::Concentration);
        assert!(!RandomEventKind::ConcentrationLapse.is_positive());
        assert!(RandomEventKind::StabilityHold.is_positive());
    }
}
