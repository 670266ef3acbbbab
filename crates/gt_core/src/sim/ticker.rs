//! Interactive tick advancer
//!
//! One call = one tick of the live match. Randomness for a tick comes from
//! the live match seed with the ChaCha stream set to the tick number, so a
//! tick replays identically after the state has been persisted and reloaded.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, warn};

use super::commentary::{closing_lines, event_line, flavor_line, lead_line, opening_line, pick_flavor};
use super::config::SimConfig;
use super::events::roll_event;
use super::outcome::{decide, rounded_lead};
use super::power::player_power;
use super::simulator::{drift, finish_match, roll_condition};
use crate::models::tournament::pair_in;
use crate::models::{CommentaryLine, TournamentStatus, TournamentState};
use crate::progression;

/// Per-tick RNG derived from the live match seed
pub fn tick_rng(seed: u64, tick: u32) -> ChaCha8Rng {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    rng.set_stream(u64::from(tick));
    rng
}

/// Advance the live match by exactly one tick. Returns false (and changes
/// nothing) unless the tournament is `round_in_progress` with a valid,
/// unfinished, seeded live match.
pub fn advance_tick(state: &mut TournamentState, config: &SimConfig) -> bool {
    if state.status != TournamentStatus::RoundInProgress {
        return false;
    }
    let pointer = match state.validated_pointer() {
        Ok(p) => p,
        Err(e) => {
            warn!("Tournament {} cannot tick: {}", state.id, e);
            return false;
        }
    };
    let Some(seed) = state.match_seed else {
        warn!("Tournament {} has a live match without a seed", state.id);
        return false;
    };
    let Some(m) = state.match_at(pointer) else {
        return false;
    };
    if m.is_finished {
        return false;
    }
    let (Some(a), Some(b)) = (m.players[0].clone(), m.players[1].clone()) else {
        warn!("Tournament {} live match {:?} is a bye", state.id, pointer);
        return false;
    };
    let round_name = state.rounds[pointer.round].name.clone();

    let total = config.total_ticks();
    let tick = state.current_tick + 1;
    let mut rng = tick_rng(seed, tick);
    let mut lines: Vec<CommentaryLine> = Vec::new();

    let TournamentState { players, live_scores, recent_lines, .. } = &mut *state;
    let Some((p1, p2)) = pair_in(players, &a, &b) else {
        warn!("Live match {:?} references unknown competitors ({}, {})", pointer, a, b);
        return false;
    };

    if tick == 1 {
        p1.begin_match(roll_condition(config, &mut rng));
        p2.begin_match(roll_condition(config, &mut rng));
        *live_scores = [0.0, 0.0];
        lines.push(opening_line(&round_name, [&p1.name, &p2.name]));
    }

    drift(p1, config, &mut rng);
    drift(p2, config, &mut rng);
    live_scores[0] += player_power(p1, tick, config);
    live_scores[1] += player_power(p2, tick, config);

    let names = [p1.name.clone(), p2.name.clone()];
    let names_ref = [names[0].as_str(), names[1].as_str()];

    if tick >= total {
        let verdict = decide(live_scores[0], live_scores[1], &mut rng);
        lines.extend(closing_lines(tick, names_ref, &verdict));
        state.current_tick = total;
        state.live_commentary.extend(lines);
        let commentary = state.live_commentary.clone();
        debug!(
            "Live match {:?} finished: {} wins by {}",
            pointer, names[verdict.winner_slot], verdict.margin
        );
        finish_match(state, pointer, Some(verdict.winner_slot), verdict.percent, verdict.margin, commentary);
        progression::handle_match_complete(state, config, &mut rng);
        return true;
    }

    if tick > 1 {
        let lead = rounded_lead(live_scores[0], live_scores[1]);
        if tick % config.lead_interval == 0 && lead > 0.0 {
            let leader = if live_scores[0] >= live_scores[1] { names_ref[0] } else { names_ref[1] };
            lines.push(lead_line(tick, leader, lead));
        } else {
            let event = if config.events_enabled && tick % config.lead_interval != 0 {
                roll_event([&p1.stats, &p2.stats], live_scores, config, &mut rng)
            } else {
                None
            };
            match event {
                Some(ev) => lines.push(event_line(tick, ev.kind, names_ref[ev.slot], ev.swing_percent)),
                None => {
                    let phase = config.phase_for_tick(tick);
                    let text = pick_flavor(phase, names_ref, recent_lines, &mut rng);
                    lines.push(flavor_line(tick, text));
                }
            }
        }
    }

    state.current_tick = tick;
    state.live_commentary.extend(lines);
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CommentaryKind, Match, MatchPointer, PlayerForTournament, Round, RoundKind, StatBlock};
    use crate::sim::power::player_power;

    fn live_state(seed: u64) -> TournamentState {
        let a = PlayerForTournament::new("a", "흑돌", StatBlock::uniform(70));
        let b = PlayerForTournament::new("b", "백돌", StatBlock::uniform(65));
        let mut state = crate::test_support::bare_state(vec![a, b]);
        state.rounds.push(Round::new(
            RoundKind::Bracket { size: 2 },
            vec![Match::new(Some("a".into()), Some("b".into()), "a", 0)],
        ));
        state.status = TournamentStatus::RoundInProgress;
        state.current_match = Some(MatchPointer { round: 0, index: 0 });
        state.match_seed = Some(seed);
        state
    }

    #[test]
    fn test_noop_when_not_in_progress() {
        let cfg = SimConfig::default();
        let mut state = live_state(1);
        state.status = TournamentStatus::RoundComplete;
        let before = state.clone();
        assert!(!advance_tick(&mut state, &cfg));
        assert_eq!(state, before);
    }

    #[test]
    fn test_noop_on_stale_pointer() {
        let cfg = SimConfig::default();
        let mut state = live_state(1);
        state.current_match = Some(MatchPointer { round: 4, index: 0 });
        let before = state.clone();
        assert!(!advance_tick(&mut state, &cfg));
        assert_eq!(state, before);
    }

    #[test]
    fn test_first_tick_opens_match() {
        let cfg = SimConfig::default();
        let mut state = live_state(9);
        assert!(advance_tick(&mut state, &cfg));
        assert_eq!(state.current_tick, 1);
        assert_eq!(state.live_commentary.len(), 1);
        assert_eq!(state.live_commentary[0].kind, CommentaryKind::Opening);
        for p in &state.players {
            assert!((40..=100).contains(&p.condition));
        }
        assert!(state.live_scores[0] > 0.0 && state.live_scores[1] > 0.0);
    }

    #[test]
    fn test_full_match_finishes_and_completes_tournament() {
        let cfg = SimConfig::default();
        let mut state = live_state(2024);
        let mut calls = 0;
        while advance_tick(&mut state, &cfg) {
            calls += 1;
            assert!(calls <= 50);
        }
        assert_eq!(calls, 50);

        let m = state.match_at(MatchPointer { round: 0, index: 0 }).unwrap();
        assert!(m.is_finished);
        assert!(m.winner.is_some());
        let kinds: Vec<_> = m.commentary.iter().map(|l| l.kind).collect();
        assert_eq!(kinds.first(), Some(&CommentaryKind::Opening));
        assert_eq!(&kinds[kinds.len() - 2..], &[CommentaryKind::FinalScore, CommentaryKind::Victory]);
        // One line per tick, plus the extra victory line
        assert_eq!(m.commentary.len(), 51);

        // Final of a two-player bracket ends the tournament either way
        let expected = if m.winner.as_deref() == Some("a") {
            TournamentStatus::Complete
        } else {
            TournamentStatus::Eliminated
        };
        assert_eq!(state.status, expected);
        for p in &state.players {
            assert!(!p.is_in_match());
            assert_eq!(p.stats, p.original_stats);
        }
        // Further calls are no-ops
        assert!(!advance_tick(&mut state, &cfg));
    }

    #[test]
    fn test_same_seed_same_match() {
        let cfg = SimConfig::default();
        let run = || {
            let mut state = live_state(77);
            while advance_tick(&mut state, &cfg) {}
            state.rounds[0].matches[0].clone()
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn test_tick_is_reproducible_after_reload() {
        let cfg = SimConfig::default();
        let mut live = live_state(5);
        for _ in 0..20 {
            advance_tick(&mut live, &cfg);
        }
        let json = serde_json::to_string(&live).unwrap();
        let mut reloaded: TournamentState = serde_json::from_str(&json).unwrap();
        advance_tick(&mut live, &cfg);
        advance_tick(&mut reloaded, &cfg);
        assert_eq!(live.live_scores, reloaded.live_scores);
        assert_eq!(live.live_commentary, reloaded.live_commentary);
    }

    #[test]
    fn test_lead_lines_only_on_interval() {
        let cfg = SimConfig::calm();
        let mut state = live_state(31);
        while advance_tick(&mut state, &cfg) {}
        let m = &state.rounds[0].matches[0];
        for line in &m.commentary {
            if line.kind == CommentaryKind::Lead {
                assert_eq!(line.tick % 10, 0);
                assert!(line.tick < 50);
            }
            assert_ne!(line.kind, CommentaryKind::Event);
        }
    }

    /// "... (형세 +3.4%)" -> 3.4
    fn reported_swing(text: &str) -> f64 {
        let tail = text.rsplit("형세 ").next().unwrap();
        tail.trim_end_matches("%)").parse::<f64>().unwrap().abs()
    }

    #[test]
    fn test_events_fire_on_quiet_ticks() {
        let cfg = SimConfig { event_gate_chance: 1.0, ..SimConfig::default() };
        let names = ["흑돌", "백돌"];
        let mut events = 0;

        for seed in 0..10 {
            let mut state = live_state(seed);
            loop {
                let before = state.live_scores;
                let seen = state.live_commentary.len();
                if !advance_tick(&mut state, &cfg) {
                    break;
                }
                if state.current_match.is_none() {
                    break;
                }
                let tick = state.current_tick;
                if tick == 1 {
                    continue;
                }

                // One line per mid-match tick: lead, event or flavor, never two
                let added = &state.live_commentary[seen..];
                assert_eq!(added.len(), 1, "tick {}", tick);
                let line = &added[0];
                assert_eq!(line.tick, tick);

                let base = [
                    before[0] + player_power(&state.players[0], tick, &cfg),
                    before[1] + player_power(&state.players[1], tick, &cfg),
                ];
                if line.kind != CommentaryKind::Event {
                    assert!((state.live_scores[0] - base[0]).abs() < 1e-9);
                    assert!((state.live_scores[1] - base[1]).abs() < 1e-9);
                    continue;
                }

                events += 1;
                assert_ne!(tick % cfg.lead_interval, 0);
                let slot = if line.text.starts_with(names[0]) { 0 } else { 1 };
                assert!(line.text.starts_with(names[slot]));
                assert!((state.live_scores[1 - slot] - base[1 - slot]).abs() < 1e-9);

                let moved = state.live_scores[slot] - base[slot];
                assert_eq!(moved > 0.0, line.event.unwrap().is_positive());
                let percent = moved.abs() / (base[0] + base[1]) * 100.0;
                assert!((percent - reported_swing(&line.text)).abs() <= 0.05 + 1e-6);
                assert!(percent > 2.0 - 1e-6 && percent < 10.0 + 1e-6);
            }
        }
        assert!(events > 0);
    }

    #[test]
    fn test_level_game_on_interval_tick_gets_flavor() {
        let cfg = SimConfig { event_gate_chance: 1.0, ..SimConfig::default() };
        let mut state = live_state(8);
        for p in &mut state.players {
            p.begin_match(80);
        }
        state.current_tick = 9;
        state.live_scores = [1.0e9, 1.0e9];

        assert!(advance_tick(&mut state, &cfg));
        assert_eq!(state.current_tick, 10);
        assert_eq!(state.live_commentary.len(), 1);
        assert_eq!(state.live_commentary[0].kind, CommentaryKind::Flavor);
    }
}
