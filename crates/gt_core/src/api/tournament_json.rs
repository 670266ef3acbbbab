//! Tournament operations over JSON
//!
//! The state-carrying calls leave persistence to the caller: each request
//! carries the whole tournament state and each successful response hands
//! back the updated one. They are server-internal. A state taken from a
//! client can drop `matchSeed` and turn any result into `trusted`, so
//! client-facing result submission goes through
//! `submit_stored_match_result_json`, which loads the state from a
//! `TournamentStore` by owner and kind.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};
use validator::{Validate, ValidationError};

use super::{ApiError, ApiResponse, API_VERSION};
use crate::engine::TournamentEngine;
use crate::models::{CompetitorSnapshot, LiveView, PlayerForTournament, TournamentKind, TournamentState};
use crate::ranking::RankEntry;
use crate::save::TournamentStore;
use crate::verification::{ClientResult, SubmitOutcome, VerifiedResult};

/// Tournament creation request
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateTournamentRequest {
    pub schema_version: Option<String>,
    pub kind: TournamentKind,
    #[validate(length(min = 1, max = 64))]
    pub owner_id: String,
    #[validate(length(min = 2, max = 64))]
    pub competitors: Vec<CompetitorSnapshot>,
    pub seed: Option<u64>,
}

/// Any owner-scoped operation on an existing tournament
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct TournamentRequest {
    pub schema_version: Option<String>,
    #[validate(length(min = 1, max = 64))]
    pub owner_id: String,
    pub state: TournamentState,
    pub seed: Option<u64>,
}

/// Client-side match result
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SubmitResultRequest {
    pub schema_version: Option<String>,
    #[validate(length(min = 1, max = 64))]
    pub owner_id: String,
    pub state: TournamentState,
    pub round: usize,
    pub index: usize,
    #[validate(length(min = 1))]
    pub winner_id: String,
    #[validate(custom = "validate_score_split")]
    pub final_score: [f64; 2],
    #[serde(default)]
    pub commentary: Vec<crate::models::CommentaryLine>,
    pub seed: Option<u64>,
}

/// Client-side match result against the stored tournament of `kind`
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct StoredSubmitRequest {
    pub schema_version: Option<String>,
    #[validate(length(min = 1, max = 64))]
    pub owner_id: String,
    pub kind: TournamentKind,
    pub round: usize,
    pub index: usize,
    #[validate(length(min = 1))]
    pub winner_id: String,
    #[validate(custom = "validate_score_split")]
    pub final_score: [f64; 2],
    #[serde(default)]
    pub commentary: Vec<crate::models::CommentaryLine>,
    pub seed: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RanksRequest {
    pub schema_version: Option<String>,
    pub state: TournamentState,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct VerifyRequest {
    pub schema_version: Option<String>,
    pub seed: u64,
    pub p1: PlayerForTournament,
    pub p2: PlayerForTournament,
    #[serde(default = "default_round_name")]
    #[validate(length(min = 1, max = 32))]
    pub round_name: String,
}

fn default_round_name() -> String {
    "대국".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TournamentResponse {
    pub state: TournamentState,
    pub live: Option<LiveView>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdvanceResponse {
    /// `false` when the tick was a no-op
    pub advanced: bool,
    pub state: TournamentState,
    pub live: Option<LiveView>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitResponse {
    pub outcome: SubmitOutcome,
    pub state: TournamentState,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RanksResponse {
    pub ranks: Vec<RankEntry>,
}

fn validate_score_split(score: &[f64; 2]) -> Result<(), ValidationError> {
    let sum = score[0] + score[1];
    if score.iter().any(|s| !s.is_finite() || *s < 0.0) || (sum - 100.0).abs() > 0.01 {
        return Err(ValidationError::new("score_split"));
    }
    Ok(())
}

fn check_schema(version: Option<&str>) -> Result<(), ApiError> {
    match version {
        Some(v) if v != API_VERSION => Err(ApiError::new(
            "UNSUPPORTED_SCHEMA_VERSION",
            &format!("Expected schema {}, got {}", API_VERSION, v),
        )),
        _ => Ok(()),
    }
}

fn parse_request<R>(request_json: &str, label: &str) -> Result<R, ApiError>
where
    R: DeserializeOwned + Validate,
{
    let request: R = serde_json::from_str(request_json).map_err(|e| {
        error!("Failed to parse {}: {}", label, e);
        ApiError::new("INVALID_JSON", &format!("Invalid JSON format: {}", e))
    })?;
    if let Err(errors) = request.validate() {
        warn!("{} validation failed: {:?}", label, errors);
        return Err(errors.into());
    }
    Ok(request)
}

fn respond<T: Serialize>(result: Result<T, ApiError>) -> String {
    let response = match result {
        Ok(data) => ApiResponse::success(data),
        Err(error) => ApiResponse::error(error),
    };
    serde_json::to_string(&response).unwrap_or_else(|_| "{}".to_string())
}

fn request_rng(seed: Option<u64>) -> ChaCha8Rng {
    ChaCha8Rng::seed_from_u64(seed.unwrap_or_else(rand::random))
}

fn with_live(engine: &TournamentEngine, state: TournamentState) -> TournamentResponse {
    let live = state.live_view(&engine.config);
    TournamentResponse { state, live }
}

/// Create a tournament from `CreateTournamentRequest`.
/// Returns `ApiResponse<TournamentResponse>`.
pub fn create_tournament_json(request_json: &str, engine: &TournamentEngine) -> String {
    info!("Processing tournament creation request");
    respond((|| -> Result<_, ApiError> {
        let request: CreateTournamentRequest = parse_request(request_json, "CreateTournamentRequest")?;
        check_schema(request.schema_version.as_deref())?;
        let mut rng = request_rng(request.seed);
        let state =
            engine.create_tournament(request.kind, &request.owner_id, request.competitors, &mut rng)?;
        info!("Created {:?} tournament {} for {}", state.kind, state.id, state.owner_id);
        Ok(with_live(engine, state))
    })())
}

/// Start the next round (or next league cycle).
pub fn start_next_round_json(request_json: &str, engine: &TournamentEngine) -> String {
    respond((|| -> Result<_, ApiError> {
        let request: TournamentRequest = parse_request(request_json, "TournamentRequest")?;
        check_schema(request.schema_version.as_deref())?;
        let mut state = request.state;
        let mut rng = request_rng(request.seed);
        engine.start_next_round(&mut state, &request.owner_id, &mut rng)?;
        Ok(with_live(engine, state))
    })())
}

/// One tick of the live match. A no-op tick is still a successful response
/// with `advanced: false`.
pub fn advance_simulation_json(request_json: &str, engine: &TournamentEngine) -> String {
    respond((|| -> Result<_, ApiError> {
        let request: TournamentRequest = parse_request(request_json, "TournamentRequest")?;
        check_schema(request.schema_version.as_deref())?;
        let mut state = request.state;
        let advanced = engine.advance_simulation(&mut state, &request.owner_id);
        debug!("Tournament {}: tick {} (advanced: {})", state.id, state.current_tick, advanced);
        let live = state.live_view(&engine.config);
        Ok(AdvanceResponse { advanced, state, live })
    })())
}

pub fn submit_match_result_json(request_json: &str, engine: &TournamentEngine) -> String {
    respond((|| -> Result<_, ApiError> {
        let request: SubmitResultRequest = parse_request(request_json, "SubmitResultRequest")?;
        check_schema(request.schema_version.as_deref())?;
        let result = ClientResult {
            round: request.round,
            index: request.index,
            winner_id: request.winner_id,
            final_score: request.final_score,
            commentary: request.commentary,
        };
        let mut state = request.state;
        let mut rng = request_rng(request.seed);
        let outcome = engine.submit_match_result(&mut state, &request.owner_id, &result, &mut rng)?;
        Ok(SubmitResponse { outcome, state })
    })())
}

/// Same as `submit_match_result_json`, but the state (and its match seed)
/// comes from `store`, never from the request. The updated state is saved
/// back before responding.
pub fn submit_stored_match_result_json(
    request_json: &str,
    engine: &TournamentEngine,
    store: &dyn TournamentStore,
) -> String {
    respond((|| -> Result<_, ApiError> {
        let request: StoredSubmitRequest = parse_request(request_json, "StoredSubmitRequest")?;
        check_schema(request.schema_version.as_deref())?;
        let Some(mut state) = store.load(&request.owner_id, request.kind)? else {
            return Err(ApiError::new(
                "TOURNAMENT_NOT_FOUND",
                &format!("No {:?} tournament for {}", request.kind, request.owner_id),
            ));
        };
        let result = ClientResult {
            round: request.round,
            index: request.index,
            winner_id: request.winner_id,
            final_score: request.final_score,
            commentary: request.commentary,
        };
        let mut rng = request_rng(request.seed);
        let outcome = engine.submit_match_result(&mut state, &request.owner_id, &result, &mut rng)?;
        store.save(&state)?;
        Ok(SubmitResponse { outcome, state })
    })())
}

pub fn forfeit_tournament_json(request_json: &str, engine: &TournamentEngine) -> String {
    respond((|| -> Result<_, ApiError> {
        let request: TournamentRequest = parse_request(request_json, "TournamentRequest")?;
        check_schema(request.schema_version.as_deref())?;
        let mut state = request.state;
        engine.forfeit_tournament(&mut state, &request.owner_id)?;
        Ok(with_live(engine, state))
    })())
}

pub fn forfeit_current_match_json(request_json: &str, engine: &TournamentEngine) -> String {
    respond((|| -> Result<_, ApiError> {
        let request: TournamentRequest = parse_request(request_json, "TournamentRequest")?;
        check_schema(request.schema_version.as_deref())?;
        let mut state = request.state;
        let mut rng = request_rng(request.seed);
        engine.forfeit_current_match(&mut state, &request.owner_id, &mut rng)?;
        Ok(with_live(engine, state))
    })())
}

pub fn skip_to_results_json(request_json: &str, engine: &TournamentEngine) -> String {
    respond((|| -> Result<_, ApiError> {
        let request: TournamentRequest = parse_request(request_json, "TournamentRequest")?;
        check_schema(request.schema_version.as_deref())?;
        let mut state = request.state;
        let mut rng = request_rng(request.seed);
        engine.skip_to_results(&mut state, &request.owner_id, &mut rng)?;
        Ok(with_live(engine, state))
    })())
}

pub fn calculate_ranks_json(request_json: &str, engine: &TournamentEngine) -> String {
    respond((|| -> Result<_, ApiError> {
        let request: RanksRequest = parse_request(request_json, "RanksRequest")?;
        check_schema(request.schema_version.as_deref())?;
        Ok(RanksResponse { ranks: engine.calculate_ranks(&request.state) })
    })())
}

/// Returns `ApiResponse<VerifiedResult>`
pub fn verify_match_json(request_json: &str, engine: &TournamentEngine) -> String {
    respond((|| -> Result<VerifiedResult, ApiError> {
        let request: VerifyRequest = parse_request(request_json, "VerifyRequest")?;
        check_schema(request.schema_version.as_deref())?;
        if request.p1.id == request.p2.id {
            return Err(ApiError::new("DUPLICATE_COMPETITOR", "A match needs two distinct competitors"));
        }
        Ok(engine.verify_match(request.seed, &request.p1, &request.p2, &request.round_name))
    })())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TournamentStatus;
    use crate::test_support::field;
    use serde_json::json;

    fn created(engine: &TournamentEngine, kind: TournamentKind, count: usize) -> TournamentState {
        let request = json!({
            "schema_version": "v1",
            "kind": kind,
            "owner_id": "me",
            "competitors": field(count, 60),
            "seed": 42
        })
        .to_string();
        let response: ApiResponse<TournamentResponse> =
            serde_json::from_str(&create_tournament_json(&request, engine)).unwrap();
        assert!(response.success, "{:?}", response.error);
        response.data.unwrap().state
    }

    fn owner_request(state: &TournamentState, seed: u64) -> String {
        json!({ "owner_id": "me", "state": state, "seed": seed }).to_string()
    }

    #[test]
    fn test_create_tournament_json_workflow() {
        let engine = TournamentEngine::default();
        let state = created(&engine, TournamentKind::Daily, 8);
        assert_eq!(state.status, TournamentStatus::BracketReady);
        assert_eq!(state.rounds[0].name, "8강");
        assert!(state.player("me").is_some());
    }

    #[test]
    fn test_invalid_json_and_validation() {
        let engine = TournamentEngine::default();
        let bad: ApiResponse<TournamentResponse> =
            serde_json::from_str(&create_tournament_json("{not json", &engine)).unwrap();
        assert!(!bad.success);
        assert_eq!(bad.error.unwrap().code, "INVALID_JSON");

        let empty_owner = json!({ "kind": "daily", "owner_id": "", "competitors": field(8, 60) }).to_string();
        let invalid: ApiResponse<TournamentResponse> =
            serde_json::from_str(&create_tournament_json(&empty_owner, &engine)).unwrap();
        let err = invalid.error.unwrap();
        assert_eq!(err.code, "VALIDATION_FAILED");
        assert!(err.details.unwrap().contains_key("owner_id"));
    }

    #[test]
    fn test_schema_version_checked() {
        let engine = TournamentEngine::default();
        let request = json!({
            "schema_version": "v9",
            "kind": "daily",
            "owner_id": "me",
            "competitors": field(8, 60)
        })
        .to_string();
        let response: ApiResponse<TournamentResponse> =
            serde_json::from_str(&create_tournament_json(&request, &engine)).unwrap();
        assert_eq!(response.error.unwrap().code, "UNSUPPORTED_SCHEMA_VERSION");
    }

    #[test]
    fn test_engine_errors_carry_codes() {
        let engine = TournamentEngine::default();
        let state = created(&engine, TournamentKind::Daily, 8);
        let request = json!({ "owner_id": "intruder", "state": state }).to_string();
        let response: ApiResponse<TournamentResponse> =
            serde_json::from_str(&skip_to_results_json(&request, &engine)).unwrap();
        assert_eq!(response.error.unwrap().code, "OWNER_MISMATCH");
    }

    #[test]
    fn test_play_round_over_json() {
        let engine = TournamentEngine::default();
        let state = created(&engine, TournamentKind::Daily, 8);

        let started: ApiResponse<TournamentResponse> =
            serde_json::from_str(&start_next_round_json(&owner_request(&state, 1), &engine)).unwrap();
        let started = started.data.unwrap();
        assert_eq!(started.state.status, TournamentStatus::RoundInProgress);
        let live = started.live.unwrap();
        assert_eq!(live.total_ticks, engine.config.total_ticks());
        assert_eq!(live.phase, crate::sim::Phase::Early);
        assert_eq!(live.live_percent, [50.0, 50.0]);
        assert_eq!(live.phase_label, "포석");

        let mut state = started.state;
        for _ in 0..engine.config.total_ticks() {
            let response: ApiResponse<AdvanceResponse> =
                serde_json::from_str(&advance_simulation_json(&owner_request(&state, 0), &engine)).unwrap();
            let data = response.data.unwrap();
            assert!(data.advanced);
            state = data.state;
        }
        assert_ne!(state.status, TournamentStatus::RoundInProgress);

        let idle: ApiResponse<AdvanceResponse> =
            serde_json::from_str(&advance_simulation_json(&owner_request(&state, 0), &engine)).unwrap();
        assert!(idle.success);
        assert!(!idle.data.unwrap().advanced);
    }

    #[test]
    fn test_skip_then_ranks_json() {
        let engine = TournamentEngine::default();
        let state = created(&engine, TournamentKind::League, 6);
        let skipped: ApiResponse<TournamentResponse> =
            serde_json::from_str(&skip_to_results_json(&owner_request(&state, 9), &engine)).unwrap();
        let state = skipped.data.unwrap().state;
        assert_eq!(state.status, TournamentStatus::Complete);

        let request = json!({ "state": state }).to_string();
        let ranks: ApiResponse<RanksResponse> =
            serde_json::from_str(&calculate_ranks_json(&request, &engine)).unwrap();
        let ranks = ranks.data.unwrap().ranks;
        assert_eq!(ranks.len(), 6);
        assert_eq!(ranks[0].rank, 1);
    }

    #[test]
    fn test_submit_rejects_bad_split() {
        let engine = TournamentEngine::default();
        let state = created(&engine, TournamentKind::Daily, 8);
        let request = json!({
            "owner_id": "me",
            "state": state,
            "round": 0,
            "index": 0,
            "winner_id": "me",
            "final_score": [80.0, 40.0]
        })
        .to_string();
        let response: ApiResponse<SubmitResponse> =
            serde_json::from_str(&submit_match_result_json(&request, &engine)).unwrap();
        let err = response.error.unwrap();
        assert_eq!(err.code, "VALIDATION_FAILED");
        assert!(err.details.unwrap().contains_key("final_score"));
    }

    #[test]
    fn test_stored_submit_ignores_client_state() {
        use crate::save::MemoryStore;

        let engine = TournamentEngine::default();
        let store = MemoryStore::new();
        let mut state = created(&engine, TournamentKind::Daily, 8);
        engine.start_next_round(&mut state, "me", &mut ChaCha8Rng::seed_from_u64(3)).unwrap();
        let pointer = state.current_match.unwrap();
        store.save(&state).unwrap();

        let my_slot = state.match_at(pointer).unwrap().slot_of("me").unwrap();
        let mut lopsided = [1.0, 1.0];
        lopsided[my_slot] = 99.0;
        // A seedless copy in the body must not make the result trusted
        let mut forged = state.clone();
        forged.match_seed = None;
        let request = json!({
            "owner_id": "me",
            "kind": "daily",
            "state": forged,
            "round": pointer.round,
            "index": pointer.index,
            "winner_id": "me",
            "final_score": lopsided,
            "seed": 5
        })
        .to_string();
        let response: ApiResponse<SubmitResponse> =
            serde_json::from_str(&submit_stored_match_result_json(&request, &engine, &store)).unwrap();
        let data = response.data.unwrap();
        assert_eq!(data.outcome, SubmitOutcome::Corrected);

        let saved = store.load("me", TournamentKind::Daily).unwrap().unwrap();
        assert_eq!(saved, data.state);
        let m = saved.match_at(pointer).unwrap();
        assert!(m.is_finished);
        assert_ne!(m.final_score, Some(lopsided));
    }

    #[test]
    fn test_stored_submit_without_tournament() {
        let engine = TournamentEngine::default();
        let store = crate::save::MemoryStore::new();
        let request = json!({
            "owner_id": "me",
            "kind": "weekly",
            "round": 0,
            "index": 0,
            "winner_id": "me",
            "final_score": [60.0, 40.0]
        })
        .to_string();
        let response: ApiResponse<SubmitResponse> =
            serde_json::from_str(&submit_stored_match_result_json(&request, &engine, &store)).unwrap();
        assert_eq!(response.error.unwrap().code, "TOURNAMENT_NOT_FOUND");
    }

    #[test]
    fn test_forfeit_tournament_json() {
        let engine = TournamentEngine::default();
        let state = created(&engine, TournamentKind::Daily, 8);
        let response: ApiResponse<TournamentResponse> =
            serde_json::from_str(&forfeit_tournament_json(&owner_request(&state, 0), &engine)).unwrap();
        assert_eq!(response.data.unwrap().state.status, TournamentStatus::Eliminated);
    }

    #[test]
    fn test_verify_match_json_is_deterministic() {
        let engine = TournamentEngine::default();
        let state = created(&engine, TournamentKind::Daily, 8);
        let request = json!({
            "seed": 77,
            "p1": state.players[0],
            "p2": state.players[1]
        })
        .to_string();
        let first = verify_match_json(&request, &engine);
        let a: ApiResponse<VerifiedResult> = serde_json::from_str(&first).unwrap();
        let b: ApiResponse<VerifiedResult> = serde_json::from_str(&verify_match_json(&request, &engine)).unwrap();
        assert_eq!(a.data.unwrap(), b.data.unwrap());

        let same = json!({ "seed": 1, "p1": state.players[0], "p2": state.players[0] }).to_string();
        let rejected: ApiResponse<VerifiedResult> = serde_json::from_str(&verify_match_json(&same, &engine)).unwrap();
        assert_eq!(rejected.error.unwrap().code, "DUPLICATE_COMPETITOR");
    }
}
