//! 대국 시뮬레이션
//!
//! - `power`: stat power model
//! - `outcome`: winner decision rule
//! - `simulator`: bulk single-shot match
//! - `ticker`: interactive one-tick-per-call path with commentary and events

pub mod commentary;
pub mod config;
pub mod events;
pub mod outcome;
pub mod power;
pub mod simulator;
pub mod ticker;

pub use config::{Phase, PhaseConfig, SimConfig, StatWeight, GLOBAL_CONFIG, SIM_CONFIG_PATH_ENV};
pub use events::{roll_event, EventCandidate, FiredEvent};
pub use outcome::{decide, format_margin, percent_split, rounded_lead, Verdict};
pub use power::{player_power, power};
pub use simulator::{roll_condition, simulate_match, simulate_pair};
pub use ticker::{advance_tick, tick_rng};
