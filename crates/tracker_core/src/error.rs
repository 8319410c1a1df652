use chrono::NaiveDate;
use thiserror::Error;
use uuid::Uuid;

/// Recoverable failures reported by the engine. Persistence failures wrap the
/// implementation-side error; everything else is a domain rule violation.
#[derive(Debug, Error)]
pub enum TrackerError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("category `{0}` already exists")]
    DuplicateName(String),

    #[error("category `{0}` not found")]
    CategoryNotFound(String),

    #[error("category `{0}` still has trackers assigned to it")]
    CategoryInUse(String),

    #[error("tracker {0} not found")]
    TrackerNotFound(Uuid),

    #[error("cannot record completion for {date}: later than today ({today})")]
    FutureDate { date: NaiveDate, today: NaiveDate },

    #[error("persistence failure: {0}")]
    Persistence(#[from] anyhow::Error),
}

pub type Result<T, E = TrackerError> = std::result::Result<T, E>;
