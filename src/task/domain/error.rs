//! Error types for task domain validation, authorisation, and parsing.

use super::{DepartmentId, ProvinceId, TaskAction, TaskId, TaskKind, TaskStatus, UserId};
use std::fmt;
use thiserror::Error;

/// Errors raised by task domain rules.
///
/// Every variant is a caller or input error; none of them is worth retrying.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TaskDomainError {
    /// A referenced task, user, department, or province does not exist.
    #[error(transparent)]
    NotFound(#[from] MissingEntity),

    /// The requested assignment shape breaks an assignment rule.
    #[error("invalid assignment: {0}")]
    InvalidAssignment(AssignmentViolation),

    /// The acting user lacks permission for the action.
    #[error(transparent)]
    Forbidden(#[from] PermissionDenied),

    /// The operation is not valid for the task's current lifecycle state.
    #[error("task {task}: {conflict}")]
    InvalidState {
        /// Task the operation targeted.
        task: TaskId,
        /// The lifecycle conflict.
        conflict: StateConflict,
    },

    /// The requested status value is not recognised.
    #[error(transparent)]
    InvalidStatus(#[from] ParseTaskStatusError),

    /// Free-text or query input failed validation.
    #[error(transparent)]
    Validation(#[from] ValidationFailure),
}

impl From<AssignmentViolation> for TaskDomainError {
    fn from(violation: AssignmentViolation) -> Self {
        Self::InvalidAssignment(violation)
    }
}

/// A referenced entity that could not be resolved.
///
/// Multi-id variants always list every missing identifier.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum MissingEntity {
    /// The task does not exist.
    #[error("task not found: {0}")]
    Task(TaskId),
    /// One or more users do not exist.
    #[error("users not found: {}", join_ids(.0))]
    Users(Vec<UserId>),
    /// One or more departments do not exist.
    #[error("departments not found: {}", join_ids(.0))]
    Departments(Vec<DepartmentId>),
    /// The province does not exist.
    #[error("province not found: {0}")]
    Province(ProvinceId),
}

/// Assignment rule violations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AssignmentViolation {
    /// Users and departments were both requested.
    #[error("cannot assign to both users and departments")]
    UsersAndDepartments,
    /// Users and a province were both requested.
    #[error("cannot assign to both users and a province")]
    UsersAndProvince,
    /// A province was requested without departments.
    #[error("province requires departments")]
    ProvinceWithoutDepartments,
    /// Some departments are not part of the requested province.
    #[error("departments {} do not belong to province {province}", join_ids(.departments))]
    DepartmentsOutsideProvince {
        /// The requested province.
        province: ProvinceId,
        /// Departments linked to another province or to none.
        departments: Vec<DepartmentId>,
    },
    /// The same assignee was listed more than once.
    #[error("duplicate assignees: {}", join_ids(.0))]
    DuplicateAssignees(Vec<UserId>),
    /// No assignee was supplied where at least one is required.
    #[error("at least one assignee is required")]
    NoAssignees,
    /// Stored assignment data does not match the stored task kind.
    #[error("stored assignment does not match task kind {0}")]
    InconsistentShape(TaskKind),
}

/// Lifecycle conflicts reported as [`TaskDomainError::InvalidState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateConflict {
    /// Restore was requested for a task outside the recycle bin.
    NotInRecycleBin,
    /// A mutation was requested for a task in the recycle bin.
    InRecycleBin,
    /// The task has already been delegated.
    AlreadyDelegated,
    /// A completed task cannot be cancelled.
    CompletedCannotBeCancelled,
    /// Delegation is not possible from this status.
    NotDelegatable(TaskStatus),
    /// Only the system may move a task into or out of this status.
    SystemManagedStatus {
        /// Current status.
        from: TaskStatus,
        /// Requested status.
        to: TaskStatus,
    },
}

impl fmt::Display for StateConflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotInRecycleBin => f.write_str("task is not in the recycle bin"),
            Self::InRecycleBin => f.write_str("task is in the recycle bin"),
            Self::AlreadyDelegated => f.write_str("task has already been delegated"),
            Self::CompletedCannotBeCancelled => {
                f.write_str("cannot cancel a task that is already completed")
            }
            Self::NotDelegatable(status) => {
                write!(f, "cannot delegate a task that is {status}")
            }
            Self::SystemManagedStatus { from, to } => {
                write!(f, "status change from {from} to {to} is reserved for the system")
            }
        }
    }
}

/// Rejection of an action for lack of permission.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub struct PermissionDenied {
    /// Action attempted.
    pub action: TaskAction,
    /// Acting user.
    pub actor: UserId,
    /// Target task, when the action is task-specific.
    pub task: Option<TaskId>,
}

impl fmt::Display for PermissionDenied {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "user {} is not permitted to {}", self.actor, self.action)?;
        if let Some(task) = self.task {
            write!(f, " task {task}")?;
        }
        Ok(())
    }
}

/// Input validation failures.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationFailure {
    /// A reason was shorter than the configured minimum.
    #[error("a detailed {field} (at least {min} characters) is required, got {actual}")]
    ReasonTooShort {
        /// Name of the reason field.
        field: &'static str,
        /// Minimum character count.
        min: usize,
        /// Supplied character count.
        actual: usize,
    },
    /// The title is empty after trimming.
    #[error("task title must not be empty")]
    EmptyTitle,
    /// The title exceeds the storage limit.
    #[error("task title exceeds {max} characters")]
    TitleTooLong {
        /// Maximum character count.
        max: usize,
    },
    /// The sort field is not on the allow-list.
    #[error("unsupported sort field: {0}")]
    UnknownSortField(String),
    /// The date range is inverted.
    #[error("date range start is after its end")]
    InvertedDateRange,
}

/// Error returned while parsing task statuses.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown task status: {0}")]
pub struct ParseTaskStatusError(pub String);

/// Error returned while parsing task priorities.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown task priority: {0}")]
pub struct ParseTaskPriorityError(pub String);

/// Error returned while parsing task kinds.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown task kind: {0}")]
pub struct ParseTaskKindError(pub String);

/// Error returned while parsing user roles.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown role: {0}")]
pub struct ParseRoleError(pub String);

fn join_ids<T: fmt::Display>(ids: &[T]) -> String {
    ids.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}
