use thiserror::Error;

use crate::team::Team;

/// Errors surfaced by the streak core.
///
/// Configuration and bounds errors are fatal; degenerate streaks and
/// exhausted permutors never reach this type.
#[derive(Error, Debug)]
pub enum StreakError {
    #[error("unknown team: {0}")]
    UnknownTeam(String),

    #[error("missing rating for team {0}")]
    MissingRating(Team),

    #[error("invalid outcome model: {0}")]
    InvalidModel(String),

    #[error("pick slots {slots:?} cover {picks} picks but {teams} teams remain")]
    SlotMismatch {
        slots: Vec<usize>,
        picks: usize,
        teams: usize,
    },

    #[error("team {0} appears more than once")]
    DuplicateTeam(Team),

    #[error("reserved team {0} cannot be picked")]
    ReservedTeam(Team),

    #[error("no pickers given (use --all to select every picker)")]
    NoPickers,

    #[error("unknown picker: {0}")]
    UnknownPicker(String),

    #[error("team index {0} out of range")]
    TeamIndexOutOfRange(usize),

    #[error("team index {0} repeated in a team order")]
    RepeatedTeamIndex(usize),

    #[error("week {week} out of range (schedule has {weeks} weeks)")]
    WeekOutOfRange { week: usize, weeks: usize },

    #[error("operation cancelled")]
    Cancelled,

    #[error("parse error: {0}")]
    Parse(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl StreakError {
    /// Whether the error stems from user configuration rather than I/O.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            StreakError::UnknownTeam(_)
                | StreakError::MissingRating(_)
                | StreakError::InvalidModel(_)
                | StreakError::SlotMismatch { .. }
                | StreakError::DuplicateTeam(_)
                | StreakError::ReservedTeam(_)
                | StreakError::NoPickers
                | StreakError::UnknownPicker(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, StreakError>;
