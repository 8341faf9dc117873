use crate::model::day::CalendarDay;
use crate::model::item::EntityKind;
use crate::model::validation::ValidationError;
use crate::repo::RepoError;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Error returned by every use-case service.
#[derive(Debug)]
pub enum ServiceError {
    NotFound { kind: EntityKind, id: Uuid },
    AlreadyCompleted { kind: EntityKind, id: Uuid },
    NotScheduledToday { id: Uuid, day: CalendarDay },
    /// Habit was soft-deleted.
    Inactive(Uuid),
    Expired { id: Uuid, expires_on: CalendarDay },
    /// Direct XP grant outside `1..=u32::MAX`.
    InvalidAmount(i64),
    /// Item belongs to a different user than the one named by the caller.
    OwnershipMismatch { kind: EntityKind, id: Uuid },
    Validation(ValidationError),
    Repo(RepoError),
    /// Internal consistency mismatch between write and read-back.
    InconsistentState(&'static str),
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound { kind, id } => write!(f, "{kind} not found: {id}"),
            Self::AlreadyCompleted { kind, id } => write!(f, "{kind} already completed: {id}"),
            Self::NotScheduledToday { id, day } => {
                write!(f, "habit {id} is not scheduled on {day}")
            }
            Self::Inactive(id) => write!(f, "habit is inactive: {id}"),
            Self::Expired { id, expires_on } => {
                write!(f, "challenge {id} expired on {expires_on}")
            }
            Self::InvalidAmount(amount) => {
                write!(f, "xp amount must be a positive integer, got {amount}")
            }
            Self::OwnershipMismatch { kind, id } => {
                write!(f, "{kind} {id} belongs to another user")
            }
            Self::Validation(err) => write!(f, "{err}"),
            Self::Repo(err) => write!(f, "{err}"),
            Self::InconsistentState(details) => write!(f, "inconsistent state: {details}"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for ServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound { kind, id } => Self::NotFound { kind, id },
            RepoError::Validation(err) => Self::Validation(err),
            other => Self::Repo(other),
        }
    }
}

impl From<ValidationError> for ServiceError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<rusqlite::Error> for ServiceError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Repo(RepoError::from(value))
    }
}

/// Turns an absent lookup into `NotFound`.
pub(crate) fn require_found<T>(value: Option<T>, kind: EntityKind, id: Uuid) -> ServiceResult<T> {
    value.ok_or(ServiceError::NotFound { kind, id })
}
