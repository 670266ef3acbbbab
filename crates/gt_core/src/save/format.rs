use super::error::SaveError;
use super::SAVE_VERSION;
use crate::bracket::cycle_count;
use crate::models::{TournamentFormat, TournamentKind, TournamentState};
use serde::{Deserialize, Serialize};

use lz4_flex::{compress_prepend_size, decompress_size_prepended};
use rmp_serde::{from_slice, to_vec_named};
use sha2::{Digest, Sha256};
use time::OffsetDateTime;

/// One persisted tournament slot
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct TournamentSave {
    /// Save format version for migration
    pub version: u32,

    /// Save timestamp (unix milliseconds)
    pub timestamp: u64,

    pub owner_id: String,

    pub kind: TournamentKind,

    pub state: TournamentState,
}

impl TournamentSave {
    pub fn new(state: TournamentState) -> Self {
        Self {
            version: SAVE_VERSION,
            timestamp: current_timestamp(),
            owner_id: state.owner_id.clone(),
            kind: state.kind,
            state,
        }
    }

    pub fn update_timestamp(&mut self) {
        self.timestamp = current_timestamp();
    }

    pub fn validate(&self) -> Result<(), SaveError> {
        if self.owner_id != self.state.owner_id {
            return Err(SaveError::SlotMismatch { owner: self.owner_id.clone(), kind: self.kind });
        }
        if self.kind != self.state.kind {
            return Err(SaveError::SlotMismatch { owner: self.owner_id.clone(), kind: self.kind });
        }

        let mut ids = std::collections::HashSet::new();
        for player in &self.state.players {
            if !ids.insert(&player.id) {
                return Err(SaveError::Corrupted);
            }
        }
        Ok(())
    }
}

/// Serialize and compress a tournament save
pub fn encode(save: &TournamentSave) -> Result<Vec<u8>, SaveError> {
    save.validate()?;

    // 1. MessagePack with field names
    let msgpack = to_vec_named(save).map_err(SaveError::Serialization)?;

    // 2. LZ4 (size prepended)
    let compressed = compress_prepend_size(&msgpack);

    // 3. SHA256 trailer
    let mut hasher = Sha256::new();
    hasher.update(&compressed);
    let checksum = hasher.finalize();

    let mut result = compressed;
    result.extend_from_slice(&checksum);
    Ok(result)
}

/// Verify, decompress and deserialize a tournament save
pub fn decode(bytes: &[u8]) -> Result<TournamentSave, SaveError> {
    // header + checksum
    if bytes.len() < 4 + 32 {
        return Err(SaveError::Corrupted);
    }

    let (payload, checksum_bytes) = bytes.split_at(bytes.len() - 32);

    let mut hasher = Sha256::new();
    hasher.update(payload);
    let calculated = hasher.finalize();
    if &calculated[..] != checksum_bytes {
        return Err(SaveError::ChecksumMismatch);
    }

    let msgpack = decompress_size_prepended(payload).map_err(|_| SaveError::Decompression)?;
    let save: TournamentSave = from_slice(&msgpack).map_err(SaveError::Deserialization)?;

    if save.version > SAVE_VERSION {
        return Err(SaveError::VersionMismatch { found: save.version, expected: SAVE_VERSION });
    }
    save.validate()?;
    Ok(save)
}

/// Bring an older save up to `SAVE_VERSION`
pub fn migrate_save(mut save: TournamentSave) -> Result<TournamentSave, SaveError> {
    let original_version = save.version;

    save = match save.version {
        0 => migrate_v0_to_v1(save),
        1 => save,
        v => {
            return Err(SaveError::VersionMismatch { found: v, expected: SAVE_VERSION });
        }
    };

    save.version = SAVE_VERSION;
    if original_version != SAVE_VERSION {
        save.update_timestamp();
        log::info!("Migrated tournament save from version {} to {}", original_version, SAVE_VERSION);
    }
    Ok(save)
}

/// v0 league saves did not record the cycle counters.
fn migrate_v0_to_v1(mut save: TournamentSave) -> TournamentSave {
    let state = &mut save.state;
    if state.format == TournamentFormat::RoundRobin && state.total_round_robin_rounds == 0 {
        state.total_round_robin_rounds = cycle_count(state.players.len()) as u8;
        let highest_played =
            state.all_matches().filter(|m| m.is_finished).filter_map(|m| m.cycle).max().unwrap_or(1);
        state.current_round_robin_round = highest_played.clamp(1, state.total_round_robin_rounds.max(1));
        log::warn!(
            "Tournament {}: rebuilt league cycle counter ({}/{})",
            state.id,
            state.current_round_robin_round,
            state.total_round_robin_rounds
        );
    }
    save
}

pub fn current_timestamp() -> u64 {
    (OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000) as u64
}
