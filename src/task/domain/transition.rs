//! Status state machine.
//!
//! `Pending`, `InProgress`, and `Completed` move freely between each other.
//! Any of them may be cancelled by a privileged actor with a reason. Only
//! privileged actors may revive a cancelled task. `Delegated` and `Deleted`
//! are entered and left by delegation and the recycle bin, never by a manual
//! status change.

use super::{
    ActorStanding, PermissionDenied, Reason, StateConflict, TaskAction, TaskDomainError, TaskId,
    TaskStatus, UserId,
};

/// Field name reported when a cancellation reason is rejected.
pub const CANCELLATION_REASON_FIELD: &str = "cancellation reason";

/// Input to [`StatusTransitionEngine::evaluate`].
#[derive(Debug, Clone, Copy)]
pub struct TransitionRequest<'a> {
    /// Acting user.
    pub actor: UserId,
    /// How the actor qualifies for the change.
    pub standing: ActorStanding,
    /// Requested status.
    pub target: TaskStatus,
    /// Cancellation reason, required when `target` is `Cancelled`.
    pub reason: Option<&'a str>,
    /// Minimum cancellation reason length in characters.
    pub min_reason_chars: usize,
}

/// Outcome of a permitted status change request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    /// The task already has the requested status.
    Unchanged,
    /// The task moves to a new status.
    Move {
        /// Status before the change.
        from: TaskStatus,
        /// Status after the change.
        to: TaskStatus,
        /// Accepted cancellation reason when `to` is `Cancelled`.
        cancellation_reason: Option<Reason>,
    },
}

impl Transition {
    /// Returns `true` when the transition changes the task.
    #[must_use]
    pub const fn is_change(&self) -> bool {
        matches!(self, Self::Move { .. })
    }
}

/// Stateless transition table.
#[derive(Debug, Clone, Copy, Default)]
pub struct StatusTransitionEngine;

impl StatusTransitionEngine {
    /// Decides whether `current` may move to the requested status.
    ///
    /// # Errors
    ///
    /// - [`TaskDomainError::InvalidState`] for transitions into or out of a
    ///   system-managed status, and for cancelling a completed task.
    /// - [`TaskDomainError::Forbidden`] when an assignee tries to cancel or to
    ///   revive a cancelled task.
    /// - [`TaskDomainError::Validation`] when the cancellation reason is too
    ///   short.
    pub fn evaluate(
        task: TaskId,
        current: TaskStatus,
        request: TransitionRequest<'_>,
    ) -> Result<Transition, TaskDomainError> {
        let target = request.target;
        if current.is_system_managed() || target.is_system_managed() {
            return Err(TaskDomainError::InvalidState {
                task,
                conflict: StateConflict::SystemManagedStatus {
                    from: current,
                    to: target,
                },
            });
        }
        if current == target {
            return Ok(Transition::Unchanged);
        }

        let privileged = matches!(request.standing, ActorStanding::Privileged);
        let needs_privilege = current == TaskStatus::Cancelled || target == TaskStatus::Cancelled;
        if needs_privilege && !privileged {
            return Err(PermissionDenied {
                action: TaskAction::ChangeStatus,
                actor: request.actor,
                task: Some(task),
            }
            .into());
        }

        let cancellation_reason = if target == TaskStatus::Cancelled {
            let reason = Reason::parse(
                request.reason.unwrap_or_default(),
                CANCELLATION_REASON_FIELD,
                request.min_reason_chars,
            )?;
            if current == TaskStatus::Completed {
                return Err(TaskDomainError::InvalidState {
                    task,
                    conflict: StateConflict::CompletedCannotBeCancelled,
                });
            }
            Some(reason)
        } else {
            None
        };

        Ok(Transition::Move {
            from: current,
            to: target,
            cancellation_reason,
        })
    }
}
