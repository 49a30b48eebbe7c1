use chrono::NaiveDate;
use thiserror::Error;

use shared_backend::BackendError;
use shared_models::AppError;

use crate::models::Conflict;

#[derive(Error, Debug)]
pub enum AvailabilityError {
    #[error("Date {date} is outside the permitted period ({start} to {end})")]
    OutOfRange {
        date: NaiveDate,
        start: NaiveDate,
        end: NaiveDate,
    },

    #[error("The block starting {start} would end on {last_day}, past {end}; choose an earlier start")]
    BlockOverrun {
        start: NaiveDate,
        last_day: NaiveDate,
        end: NaiveDate,
    },

    #[error("This period is locked for editing")]
    EditLocked,

    #[error("Unit {0} is not part of this period")]
    UnknownUnit(i64),

    #[error("Unit requires a day count of at least 1, got {0}")]
    InvalidDayCount(u32),

    #[error("No block is being configured")]
    NoPendingBlock,

    #[error("Date {0} is not part of the block being configured")]
    DateNotInBlock(NaiveDate),

    #[error("All days are marked as full day; disable that option to edit individual days")]
    AllFullDayLocked,

    #[error("Invalid custom time range on {date}: {reason}")]
    InvalidCustomRange { date: NaiveDate, reason: String },

    #[error("Resolve {} conflict(s) before confirming the block: {}", .0.len(), join_conflicts(.0))]
    PendingConflicts(Vec<Conflict>),

    #[error("Resolve {} conflict(s) before confirming: {}", .0.len(), join_conflicts(.0))]
    Conflicts(Vec<Conflict>),

    #[error("Add at least one selection before saving")]
    EmptySelection,

    #[error("{unit_name} requires {required} days, but {actual} were selected")]
    IncompleteUnit {
        unit_name: String,
        required: u32,
        actual: usize,
    },

    #[error("Block {0} not found")]
    BlockNotFound(String),

    #[error("No selection matches the day being edited")]
    SelectionNotFound,

    #[error("{}", .0.user_message())]
    Backend(#[from] BackendError),
}

fn join_conflicts(conflicts: &[Conflict]) -> String {
    conflicts
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl AvailabilityError {
    pub fn conflicts(&self) -> &[Conflict] {
        match self {
            AvailabilityError::PendingConflicts(c) | AvailabilityError::Conflicts(c) => c,
            _ => &[],
        }
    }

    /// The backend no longer knows the link: invalid, expired or revoked.
    pub fn is_not_found(&self) -> bool {
        matches!(self, AvailabilityError::Backend(backend) if backend.is_not_found())
    }
}

impl From<AvailabilityError> for AppError {
    fn from(error: AvailabilityError) -> Self {
        let message = error.to_string();
        match error {
            AvailabilityError::EditLocked => AppError::Forbidden(message),
            AvailabilityError::PendingConflicts(_) | AvailabilityError::Conflicts(_) => AppError::Conflict(message),
            AvailabilityError::UnknownUnit(_)
            | AvailabilityError::BlockNotFound(_)
            | AvailabilityError::SelectionNotFound => AppError::NotFound(message),
            AvailabilityError::Backend(ref backend) if backend.is_not_found() => AppError::NotFound(message),
            AvailabilityError::Backend(_) => AppError::ExternalService(message),
            AvailabilityError::OutOfRange { .. }
            | AvailabilityError::BlockOverrun { .. }
            | AvailabilityError::InvalidDayCount(_)
            | AvailabilityError::InvalidCustomRange { .. }
            | AvailabilityError::IncompleteUnit { .. } => AppError::ValidationError(message),
            AvailabilityError::NoPendingBlock
            | AvailabilityError::DateNotInBlock(_)
            | AvailabilityError::AllFullDayLocked
            | AvailabilityError::EmptySelection => AppError::BadRequest(message),
        }
    }
}
