//! gt CLI helpers
//!
//! 상태 파일 입출력과 출력 포맷

use anyhow::{bail, Context, Result};
use gt_core::models::{CommentaryLine, PlayerForTournament, TournamentState, TournamentStatus};
use gt_core::{RankEntry, TournamentEngine};
use rand::Rng;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Input for `gt verify`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyPair {
    pub p1: PlayerForTournament,
    pub p2: PlayerForTournament,
    #[serde(default)]
    pub round_name: Option<String>,
}

pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let text = fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("Failed to parse {}", path.display()))
}

pub fn load_state(path: &Path) -> Result<TournamentState> {
    read_json(path)
}

/// Pretty JSON, written to a temp file and renamed over the target
pub fn save_state(path: &Path, state: &TournamentState) -> Result<()> {
    let json = serde_json::to_string_pretty(state)?;
    let temp_path = path.with_extension("tmp");
    fs::write(&temp_path, json).with_context(|| format!("Failed to write {}", temp_path.display()))?;
    fs::rename(&temp_path, path).with_context(|| format!("Failed to replace {}", path.display()))?;
    Ok(())
}

pub fn format_line(line: &CommentaryLine) -> String {
    format!("[{:>2}] {}", line.tick, line.text)
}

pub fn format_ranks(ranks: &[RankEntry]) -> String {
    let mut out = String::from(" 순위  이름                 승  패\n");
    for r in ranks {
        out.push_str(&format!("{:>4}  {:<20} {:>3} {:>3}\n", r.rank, r.name, r.wins, r.losses));
    }
    out
}

/// What `play_tournament` reports back as it goes
#[derive(Debug, Clone, Copy)]
pub enum PlayEvent<'a> {
    /// A live match begins (or resumes) in this round
    MatchStarted { round_name: &'a str },
    /// Bye or rest cycle, nothing to watch
    NoMatch { status: TournamentStatus },
    Line(&'a CommentaryLine),
    /// Match or round settled; a good moment to save
    Checkpoint(&'a TournamentState),
}

/// Play the tracked competitor's matches until the tournament ends. A state
/// that is already `round_in_progress` resumes its live match instead of
/// starting a new round.
pub fn play_tournament<R: Rng>(
    engine: &TournamentEngine,
    state: &mut TournamentState,
    rng: &mut R,
    mut on_event: impl FnMut(PlayEvent<'_>) -> Result<()>,
) -> Result<()> {
    let owner = state.owner_id.clone();

    while !state.status.is_terminal() {
        if matches!(state.status, TournamentStatus::BracketReady | TournamentStatus::RoundComplete) {
            engine.start_next_round(state, &owner, rng)?;
        }
        let Some(pointer) = state.current_match else {
            if state.status == TournamentStatus::RoundInProgress {
                bail!("Tournament {} is in progress without a live match", state.id);
            }
            on_event(PlayEvent::NoMatch { status: state.status })?;
            on_event(PlayEvent::Checkpoint(state))?;
            continue;
        };
        if let Some(round) = state.rounds.get(pointer.round) {
            on_event(PlayEvent::MatchStarted { round_name: &round.name })?;
        }

        let resumed_at = state.current_tick;
        let mut printed = state.live_commentary.len();
        while engine.advance_simulation(state, &owner) {
            let lines = match state.current_match {
                Some(_) => &state.live_commentary,
                None => match state.match_at(pointer) {
                    Some(m) => &m.commentary,
                    None => &state.live_commentary,
                },
            };
            for line in lines.iter().skip(printed) {
                on_event(PlayEvent::Line(line))?;
            }
            printed = lines.len();
        }
        if state.current_match == Some(pointer) && state.current_tick == resumed_at {
            bail!("Tournament {} is stuck at {:?} (tick {})", state.id, pointer, resumed_at);
        }
        on_event(PlayEvent::Checkpoint(state))?;
    }
    Ok(())
}
