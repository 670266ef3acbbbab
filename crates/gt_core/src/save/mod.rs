// Tournament persistence
// MessagePack + LZ4 compression with versioning and integrity checks

pub mod error;
pub mod format;
pub mod store;

pub use error::SaveError;
pub use format::{decode, encode, migrate_save, TournamentSave};
pub use store::{FileStore, MemoryStore, OwnerRecord, TournamentStore};

pub const SAVE_VERSION: u32 = 1;
