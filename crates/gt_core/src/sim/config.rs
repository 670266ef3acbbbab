//! # Simulation Configuration
//!
//! 대국 시뮬레이션 튜닝 상수를 한 곳에서 관리한다.
//!
//! ## 사용법
//! ```rust
//! use gt_core::sim::SimConfig;
//!
//! let config = SimConfig::default();
//! assert_eq!(config.total_ticks(), 50);
//! let quiet = SimConfig::calm();
//! assert!(!quiet.events_enabled);
//! ```

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::{env, fs};

use crate::error::{Result, TournamentError};
use crate::models::StatKind;

pub const SIM_CONFIG_PATH_ENV: &str = "GT_SIM_CONFIG_PATH";

/// Process-wide config: `GT_SIM_CONFIG_PATH` if set and valid, defaults otherwise.
pub static GLOBAL_CONFIG: Lazy<SimConfig> = Lazy::new(|| match SimConfig::from_env() {
    Ok(config) => config,
    Err(e) => {
        tracing::warn!("Falling back to default sim config: {}", e);
        SimConfig::default()
    }
});

/// 대국 단계 (포석 / 중반 / 끝내기)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Early,
    Mid,
    End,
}

impl Phase {
    pub fn label(&self) -> &'static str {
        match self {
            Phase::Early => "포석",
            Phase::Mid => "중반",
            Phase::End => "끝내기",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StatWeight {
    pub stat: StatKind,
    pub weight: f64,
}

/// One phase: its tick count and stat weighting (weights sum to 1.0).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseConfig {
    pub ticks: u32,
    pub weights: Vec<StatWeight>,
}

impl PhaseConfig {
    fn new(ticks: u32, weights: &[(StatKind, f64)]) -> Self {
        Self {
            ticks,
            weights: weights.iter().map(|(stat, weight)| StatWeight { stat: *stat, weight: *weight }).collect(),
        }
    }

    pub fn weight_sum(&self) -> f64 {
        self.weights.iter().map(|w| w.weight).sum()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub early: PhaseConfig,
    pub mid: PhaseConfig,
    pub end: PhaseConfig,

    // === Condition ===
    /// 대국 중 컨디션 하한 (기본: 40)
    pub condition_min: u16,
    /// 대국 중 컨디션 상한 (기본: 100)
    pub condition_max: u16,

    // === Stat drift ===
    /// 상승 확률 = (condition - drift_offset) / 100 (기본: 30)
    pub drift_offset: f64,
    /// 1회 변동 최대치 (기본: 3)
    pub drift_max_step: i32,

    // === Commentary / events ===
    /// 중간 형세 해설 주기 (기본: 10틱)
    pub lead_interval: u32,
    pub events_enabled: bool,
    /// 틱당 이벤트 판정 확률 (기본: 0.2)
    pub event_gate_chance: f64,
    /// 이벤트 기본 발생률 (기본: 0.2)
    pub event_base_rate: f64,
    pub event_min_probability: f64,
    pub event_max_probability: f64,
    /// 이벤트 형세 변동폭 (누적 점수 대비, 기본: 2%~10%)
    pub swing_min: f64,
    pub swing_max: f64,

    // === Progression / verification ===
    /// 클라이언트 결과 허용 오차 (기본: 0.2)
    pub verify_tolerance: f64,
    /// 결과 건너뛰기 반복 상한 (기본: 64)
    pub max_skip_iterations: u32,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            early: PhaseConfig::new(
                15,
                &[(StatKind::Intuition, 0.4), (StatKind::ThinkingSpeed, 0.3), (StatKind::Stability, 0.3)],
            ),
            mid: PhaseConfig::new(
                20,
                &[
                    (StatKind::Aggression, 0.35),
                    (StatKind::Calculation, 0.35),
                    (StatKind::Concentration, 0.3),
                ],
            ),
            end: PhaseConfig::new(
                15,
                &[
                    (StatKind::Calculation, 0.4),
                    (StatKind::Concentration, 0.35),
                    (StatKind::Stability, 0.25),
                ],
            ),

            condition_min: 40,
            condition_max: 100,

            drift_offset: 30.0,
            drift_max_step: 3,

            lead_interval: 10,
            events_enabled: true,
            event_gate_chance: 0.2,
            event_base_rate: 0.2,
            event_min_probability: 0.05,
            event_max_probability: 0.95,
            swing_min: 0.02,
            swing_max: 0.10,

            verify_tolerance: 0.2,
            max_skip_iterations: 64,
        }
    }
}

impl SimConfig {
    /// 돌발 이벤트 없는 관전용 설정
    pub fn calm() -> Self {
        Self { events_enabled: false, ..Self::default() }
    }

    pub fn total_ticks(&self) -> u32 {
        self.early.ticks + self.mid.ticks + self.end.ticks
    }

    /// Phase of a 1-based tick; ticks past the end stay in `End`.
    pub fn phase_for_tick(&self, tick: u32) -> Phase {
        if tick <= self.early.ticks {
            Phase::Early
        } else if tick <= self.early.ticks + self.mid.ticks {
            Phase::Mid
        } else {
            Phase::End
        }
    }

    pub fn phase(&self, phase: Phase) -> &PhaseConfig {
        match phase {
            Phase::Early => &self.early,
            Phase::Mid => &self.mid,
            Phase::End => &self.end,
        }
    }

    pub fn validate(&self) -> Result<()> {
        for (phase, cfg) in [(Phase::Early, &self.early), (Phase::Mid, &self.mid), (Phase::End, &self.end)] {
            if cfg.ticks == 0 {
                return Err(TournamentError::InvalidConfig(format!("{:?} phase has no ticks", phase)));
            }
            if (cfg.weight_sum() - 1.0).abs() > 1e-6 {
                return Err(TournamentError::InvalidConfig(format!(
                    "{:?} weights sum to {:.3}, expected 1.0",
                    phase,
                    cfg.weight_sum()
                )));
            }
        }
        if self.condition_min == 0 || self.condition_min > self.condition_max || self.condition_max > 999 {
            return Err(TournamentError::InvalidConfig(format!(
                "condition range {}..={} is invalid",
                self.condition_min, self.condition_max
            )));
        }
        if self.drift_max_step < 1 {
            return Err(TournamentError::InvalidConfig("drift_max_step must be >= 1".into()));
        }
        if self.lead_interval == 0 {
            return Err(TournamentError::InvalidConfig("lead_interval must be >= 1".into()));
        }
        let probabilities = [
            ("event_gate_chance", self.event_gate_chance),
            ("event_base_rate", self.event_base_rate),
            ("event_min_probability", self.event_min_probability),
            ("event_max_probability", self.event_max_probability),
            ("swing_min", self.swing_min),
            ("swing_max", self.swing_max),
        ];
        for (name, value) in probabilities {
            if !(0.0..=1.0).contains(&value) {
                return Err(TournamentError::InvalidConfig(format!("{} = {} is outside 0..=1", name, value)));
            }
        }
        if self.event_min_probability > self.event_max_probability || self.swing_min > self.swing_max {
            return Err(TournamentError::InvalidConfig("inverted probability range".into()));
        }
        if self.verify_tolerance < 0.0 {
            return Err(TournamentError::InvalidConfig("verify_tolerance must be >= 0".into()));
        }
        if self.max_skip_iterations == 0 {
            return Err(TournamentError::InvalidConfig("max_skip_iterations must be >= 1".into()));
        }
        Ok(())
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let config: SimConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: SimConfig = serde_yaml::from_str(yaml)
            .map_err(|e| TournamentError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `GT_SIM_CONFIG_PATH` (.yaml/.yml or JSON). Unset → defaults.
    pub fn from_env() -> Result<Self> {
        let Ok(path) = env::var(SIM_CONFIG_PATH_ENV) else {
            return Ok(Self::default());
        };
        let path = path.trim();
        if path.is_empty() {
            return Ok(Self::default());
        }
        Self::from_path(path)
    }

    pub fn from_path(path: &str) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            TournamentError::InvalidConfig(format!("Failed to read sim config '{path}': {e}"))
        })?;
        if path.ends_with(".yaml") || path.ends_with(".yml") {
            Self::from_yaml(&content)
        } else {
            Self::from_json(&content)
        }
    }

    pub fn global() -> &'static SimConfig {
        &GLOBAL_CONFIG
    }
}
