//! 승패 판정
//!
//! Turns two cumulative scores into a winner slot, a percentage split and a
//! reported margin in 집. The margin is always `n + 0.5`; a rounded lead of
//! zero is settled by an unweighted coin flip.

use rand::Rng;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Verdict {
    /// 0 or 1
    pub winner_slot: usize,
    /// Percentage split, sums to 100
    pub percent: [f64; 2],
    /// Reported margin (x.5집)
    pub margin: f64,
    /// True when the lead rounded to zero and a coin flip decided
    pub coin_flip: bool,
}

/// Slot 0's share of the total, 50 when both are zero.
pub fn percent_split(p1: f64, p2: f64) -> [f64; 2] {
    let total = p1 + p2;
    let first = if total > 0.0 { p1 / total * 100.0 } else { 50.0 };
    [first, 100.0 - first]
}

/// Rounded lead without the trailing half point. Used for mid-match commentary.
pub fn rounded_lead(p1: f64, p2: f64) -> f64 {
    let [first, _] = percent_split(p1, p2);
    let diff_percent = (first - 50.0).abs() * 2.0;
    (diff_percent / 2.0).round()
}

pub fn decide<R: Rng + ?Sized>(p1: f64, p2: f64, rng: &mut R) -> Verdict {
    let percent = percent_split(p1, p2);
    let rounded = rounded_lead(p1, p2);
    if rounded < 0.5 {
        let winner_slot = if rng.gen_bool(0.5) { 0 } else { 1 };
        return Verdict { winner_slot, percent, margin: 0.5, coin_flip: true };
    }
    let winner_slot = if percent[0] > 50.0 { 0 } else { 1 };
    Verdict { winner_slot, percent, margin: rounded + 0.5, coin_flip: false }
}

/// Margin display: "3.5집"
pub fn format_margin(margin: f64) -> String {
    format!("{:.1}집", margin)
}
