pub mod commentary;
pub mod match_record;
pub mod player;
pub mod round;
pub mod stats;
pub mod tournament;

pub use commentary::{CommentaryKind, CommentaryLine, RandomEventKind, RecentLines};
pub use match_record::Match;
pub use player::{CompetitorSnapshot, PlayerForTournament, CONDITION_IDLE};
pub use round::{cycle_label, Round, RoundKind};
pub use stats::{StatBlock, StatKind};
pub use tournament::{
    FormatDefinition, LiveView, MatchPointer, TournamentFormat, TournamentKind, TournamentState,
    TournamentStatus,
};
