//! Meet scheduling error types.

use thiserror::Error;

/// Errors that abort a grouping, model-building, or optimization run.
///
/// Validation problems are not errors: the validator reports them as
/// [`Diagnostic`](crate::validation::Diagnostic) values.
#[derive(Debug, Error)]
pub enum MeetError {
    #[error("malformed entry #{record}: {reason}")]
    MalformedInput { record: usize, reason: String },

    #[error("no valid entry records remain")]
    NoValidRecords,

    #[error(
        "category '{category}' has {participants} participants in {event_type}, \
         more than the field group maximum of {max}"
    )]
    CategoryTooLarge {
        category: String,
        event_type: String,
        participants: usize,
        max: usize,
    },

    #[error("no feasible schedule within {bound_slots} slots (cap {cap_slots})")]
    Infeasible { bound_slots: u32, cap_slots: u32 },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("event overview error: {0}")]
    Overview(String),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("config parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

pub type MeetResult<T> = Result<T, MeetError>;
