//! Service-level error type shared by every task service.

use crate::task::{
    domain::{
        AssignmentViolation, MissingEntity, PermissionDenied, TaskDomainError, ValidationFailure,
    },
    ports::{AuditLogError, DirectoryError, TaskRepositoryError},
};
use thiserror::Error;

/// Errors returned by task services.
#[derive(Debug, Error)]
pub enum TaskServiceError {
    /// A domain rule rejected the operation.
    #[error(transparent)]
    Domain(#[from] TaskDomainError),
    /// Task persistence failed.
    #[error(transparent)]
    Repository(#[from] TaskRepositoryError),
    /// A directory lookup failed.
    #[error(transparent)]
    Directory(#[from] DirectoryError),
    /// The audit sink rejected a record that the operation depends on.
    #[error(transparent)]
    Audit(#[from] AuditLogError),
}

/// Result type for task service operations.
pub type TaskServiceResult<T> = Result<T, TaskServiceError>;

/// Coarse classification of [`TaskServiceError`] for transport mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// A referenced entity does not exist.
    NotFound,
    /// The assignment shape is invalid.
    InvalidAssignment,
    /// The actor lacks permission.
    Forbidden,
    /// The task's lifecycle state does not allow the operation.
    InvalidState,
    /// The requested status is unknown.
    InvalidStatus,
    /// Input failed validation.
    Validation,
    /// The write collided with existing data.
    Conflict,
    /// A collaborator failed; the request may succeed later.
    Unavailable,
}

impl TaskServiceError {
    /// Classifies the error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Domain(domain) => match domain {
                TaskDomainError::NotFound(_) => ErrorKind::NotFound,
                TaskDomainError::InvalidAssignment(_) => ErrorKind::InvalidAssignment,
                TaskDomainError::Forbidden(_) => ErrorKind::Forbidden,
                TaskDomainError::InvalidState { .. } => ErrorKind::InvalidState,
                TaskDomainError::InvalidStatus(_) => ErrorKind::InvalidStatus,
                TaskDomainError::Validation(_) => ErrorKind::Validation,
            },
            Self::Repository(TaskRepositoryError::NotFound(_)) => ErrorKind::NotFound,
            Self::Repository(TaskRepositoryError::DuplicateTask(_)) => ErrorKind::Conflict,
            Self::Repository(TaskRepositoryError::Persistence(_))
            | Self::Directory(_)
            | Self::Audit(_) => ErrorKind::Unavailable,
        }
    }

}

impl From<MissingEntity> for TaskServiceError {
    fn from(missing: MissingEntity) -> Self {
        Self::Domain(missing.into())
    }
}

impl From<PermissionDenied> for TaskServiceError {
    fn from(denied: PermissionDenied) -> Self {
        Self::Domain(denied.into())
    }
}

impl From<ValidationFailure> for TaskServiceError {
    fn from(failure: ValidationFailure) -> Self {
        Self::Domain(failure.into())
    }
}

impl From<AssignmentViolation> for TaskServiceError {
    fn from(violation: AssignmentViolation) -> Self {
        Self::Domain(violation.into())
    }
}
