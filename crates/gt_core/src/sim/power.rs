//! Stat power model
//!
//! Pure functions: stats + phase + condition in, power score out.

use super::config::{Phase, SimConfig};
use crate::models::{PlayerForTournament, StatBlock};

/// `(Σ weight[d] * stat[d]) * (condition / 100)`
#[inline]
pub fn power(stats: &StatBlock, phase: Phase, condition: u16, config: &SimConfig) -> f64 {
    let weighted: f64 = config
        .phase(phase)
        .weights
        .iter()
        .map(|w| w.weight * f64::from(stats.get(w.stat)))
        .sum();
    weighted * (f64::from(condition) / 100.0)
}

/// Power of a competitor at a given 1-based tick
#[inline]
pub fn player_power(player: &PlayerForTournament, tick: u32, config: &SimConfig) -> f64 {
    power(&player.stats, config.phase_for_tick(tick), player.condition, config)
}
