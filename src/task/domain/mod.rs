//! Domain model for departmental task tracking.
//!
//! The domain owns the task aggregate, its assignment shapes, the permission
//! rules, and the status state machine. Directory records (users,
//! departments, provinces) are read-only inputs owned by other systems.

mod assignment;
mod directory;
mod error;
mod ids;
mod permission;
mod reason;
mod status;
mod task;
mod transition;

pub use assignment::{Assignment, TaskKind};
pub use directory::{Department, DepartmentMembership, Province, Role, User};
pub use error::{
    AssignmentViolation, MissingEntity, ParseRoleError, ParseTaskKindError,
    ParseTaskPriorityError, ParseTaskStatusError, PermissionDenied, StateConflict,
    TaskDomainError, ValidationFailure,
};
pub use ids::{DepartmentId, ProvinceId, TaskId, UserId};
pub use permission::{Actor, ActorStanding, PermissionEvaluator, TaskAction};
pub use reason::Reason;
pub use status::{TaskPriority, TaskStatus};
pub use task::{
    Cancellation, MAX_TITLE_CHARS, PersistedTaskData, Task, TaskDetailsUpdate, TaskDraft,
    validate_title,
};
pub use transition::{
    CANCELLATION_REASON_FIELD, StatusTransitionEngine, Transition, TransitionRequest,
};
