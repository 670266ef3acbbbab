//! 돌발 이벤트 (집중력 저하 / 빠른 수읽기 / 강공 / 안정적 버티기)
//!
//! One gated roll per eligible tick: the gate decides whether an event is
//! considered at all, a weighted draw over the four candidate probabilities
//! picks the single eligible event, and that event is rolled against its own
//! probability.

use rand::Rng;

use super::config::SimConfig;
use crate::models::{RandomEventKind, StatBlock};

/// Chance and favoured side of one event type for the current pair
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EventCandidate {
    pub kind: RandomEventKind,
    pub probability: f64,
    /// Slot the event happens to
    pub slot: usize,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FiredEvent {
    pub kind: RandomEventKind,
    pub slot: usize,
    /// Absolute score swing applied to `slot`
    pub swing: f64,
    /// Swing as a percentage of the total accumulated score
    pub swing_percent: f64,
}

/// `clamp(base + |a - b| / (a + b), min, max)`
pub fn event_probability(a: i32, b: i32, config: &SimConfig) -> f64 {
    let total = f64::from(a) + f64::from(b);
    let lopsided = if total > 0.0 { f64::from((a - b).abs()) / total } else { 0.0 };
    (config.event_base_rate + lopsided).clamp(config.event_min_probability, config.event_max_probability)
}

/// Positive events favour the higher stat, negative ones land on the lower
/// stat. A tie is a coin flip.
pub fn candidate(
    kind: RandomEventKind,
    stats: [&StatBlock; 2],
    config: &SimConfig,
    rng: &mut impl Rng,
) -> EventCandidate {
    let a = stats[0].get(kind.stat());
    let b = stats[1].get(kind.stat());
    let slot = match a.cmp(&b) {
        std::cmp::Ordering::Equal => rng.gen_range(0..2),
        std::cmp::Ordering::Greater => usize::from(!kind.is_positive()),
        std::cmp::Ordering::Less => usize::from(kind.is_positive()),
    };
    EventCandidate { kind, probability: event_probability(a, b, config), slot }
}

/// Weighted pick over the candidates' probabilities
fn pick<'a>(candidates: &'a [EventCandidate], rng: &mut impl Rng) -> Option<&'a EventCandidate> {
    let total: f64 = candidates.iter().map(|c| c.probability).sum();
    if total <= 0.0 {
        return None;
    }
    let mut roll = rng.gen_range(0.0..total);
    for c in candidates {
        if roll < c.probability {
            return Some(c);
        }
        roll -= c.probability;
    }
    candidates.last()
}

/// Roll for an event and apply its swing to `scores`. `None` means the tick
/// stays quiet (gate missed or the picked event did not fire).
pub fn roll_event(
    stats: [&StatBlock; 2],
    scores: &mut [f64; 2],
    config: &SimConfig,
    rng: &mut impl Rng,
) -> Option<FiredEvent> {
    if !rng.gen_bool(config.event_gate_chance) {
        return None;
    }
    let candidates: Vec<EventCandidate> =
        RandomEventKind::ALL.iter().map(|k| candidate(*k, stats, config, rng)).collect();
    let chosen = *pick(&candidates, rng)?;
    if !rng.gen_bool(chosen.probability) {
        return None;
    }

    let total = scores[0] + scores[1];
    let ratio = rng.gen_range(config.swing_min..=config.swing_max);
    let swing = total * ratio;
    if chosen.kind.is_positive() {
        scores[chosen.slot] += swing;
    } else {
        scores[chosen.slot] = (scores[chosen.slot] - swing).max(0.0);
    }
    Some(FiredEvent { kind: chosen.kind, slot: chosen.slot, swing, swing_percent: ratio * 100.0 })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::StatKind;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_probability_clamped() {
        let cfg = SimConfig::default();
        assert!((event_probability(50, 50, &cfg) - 0.2).abs() < 1e-9);
        // 0.2 + 80/120
        assert!((event_probability(100, 20, &cfg) - (0.2 + 80.0 / 120.0)).abs() < 1e-9);
        assert!((event_probability(100, 0, &cfg) - 0.95).abs() < 1e-9);
        assert!((event_probability(0, 0, &cfg) - 0.2).abs() < 1e-9);

        let low = SimConfig { event_base_rate: 0.0, ..SimConfig::default() };
        assert!((event_probability(40, 40, &low) - 0.05).abs() < 1e-9);
    }

    #[test]
    fn test_favoured_side() {
        let cfg = SimConfig::default();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let mut strong = StatBlock::uniform(50);
        strong.add(StatKind::Concentration, 30);
        strong.add(StatKind::ThinkingSpeed, 30);
        let weak = StatBlock::uniform(50);

        // Positive event goes to the higher stat
        let c = candidate(RandomEventKind::FastThinking, [&weak, &strong], &cfg, &mut rng);
        assert_eq!(c.slot, 1);
        // Lapse lands on the lower stat
        let c = candidate(RandomEventKind::ConcentrationLapse, [&weak, &strong], &cfg, &mut rng);
        assert_eq!(c.slot, 0);
    }

    #[test]
    fn test_tie_is_coin_flip() {
        let cfg = SimConfig::default();
        let mut rng = ChaCha8Rng::seed_from_u64(10);
        let s = StatBlock::uniform(60);
        let first = (0..1000)
            .filter(|_| candidate(RandomEventKind::AggressivePush, [&s, &s], &cfg, &mut rng).slot == 0)
            .count();
        assert!((400..=600).contains(&first), "slot 0 picked {} of 1000", first);
    }

    #[test]
    fn test_swing_within_range() {
        let cfg = SimConfig { event_gate_chance: 1.0, ..SimConfig::default() };
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let a = StatBlock::uniform(90);
        let b = StatBlock::uniform(30);
        let mut fired = 0;
        for _ in 0..500 {
            let before = [600.0, 400.0];
            let mut scores = before;
            if let Some(ev) = roll_event([&a, &b], &mut scores, &cfg, &mut rng) {
                fired += 1;
                assert!((2.0..=10.0).contains(&ev.swing_percent));
                assert!((ev.swing - ev.swing_percent / 100.0 * 1000.0).abs() < 1e-6);
                let moved = (scores[ev.slot] - before[ev.slot]).abs();
                assert!((moved - ev.swing).abs() < 1e-6);
                // Only the affected side moves
                assert_eq!(scores[1 - ev.slot], before[1 - ev.slot]);
            }
        }
        assert!(fired > 0);
    }

    #[test]
    fn test_gate_closed_never_fires() {
        let cfg = SimConfig { event_gate_chance: 0.0, ..SimConfig::default() };
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let s = StatBlock::uniform(70);
        let mut scores = [100.0, 100.0];
        for _ in 0..200 {
            assert!(roll_event([&s, &s], &mut scores, &cfg, &mut rng).is_none());
        }
        assert_eq!(scores, [100.0, 100.0]);
    }
}
