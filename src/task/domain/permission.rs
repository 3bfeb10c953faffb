//! Authorisation rules for task actions.

use super::{Assignment, PermissionDenied, Role, Task, User, UserId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity of the caller, validated upstream by the authentication layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Actor {
    /// Acting user.
    pub user_id: UserId,
    /// Role carried by the bearer identity.
    pub role: Role,
}

impl Actor {
    /// Creates an actor identity.
    #[must_use]
    pub const fn new(user_id: UserId, role: Role) -> Self {
        Self { user_id, role }
    }

    /// Returns `true` for `ADMIN` actors.
    #[must_use]
    pub const fn is_admin(&self) -> bool {
        matches!(self.role, Role::Admin)
    }
}

/// Actions gated by the permission evaluator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskAction {
    /// Edit title, description, or due date.
    UpdateDetails,
    /// Change the priority.
    ChangePriority,
    /// Change the status.
    ChangeStatus,
    /// Replace the assignment.
    Reassign,
    /// Fork the task to new assignees.
    Delegate,
    /// Move the task to the recycle bin.
    SoftDelete,
    /// Bring the task back from the recycle bin.
    Restore,
    /// Remove the task permanently.
    HardDelete,
    /// Browse the recycle bin.
    ViewRecycleBin,
}

impl TaskAction {
    /// Returns the machine-readable action name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::UpdateDetails => "update_details",
            Self::ChangePriority => "change_priority",
            Self::ChangeStatus => "change_status",
            Self::Reassign => "reassign",
            Self::Delegate => "delegate",
            Self::SoftDelete => "soft_delete",
            Self::Restore => "restore",
            Self::HardDelete => "hard_delete",
            Self::ViewRecycleBin => "view_recycle_bin",
        }
    }
}

impl fmt::Display for TaskAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How an actor qualifies for a status change.
///
/// Privileged actors (creator, `ADMIN`, `LEADERSHIP`) may cancel and revive
/// cancelled tasks; plain assignees may only move between workflow statuses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActorStanding {
    /// Creator, `ADMIN`, or `LEADERSHIP`.
    Privileged,
    /// Assignee with no other standing.
    Assignee,
}

/// Stateless permission rules.
#[derive(Debug, Clone, Copy, Default)]
pub struct PermissionEvaluator;

impl PermissionEvaluator {
    /// Returns `true` when the user performs the task directly or through a
    /// department membership.
    ///
    /// For province-scoped tasks a membership only counts when the
    /// department is assigned and the membership's province matches the
    /// task's province.
    #[must_use]
    pub fn is_assignee(task: &Task, user: &User) -> bool {
        let assignment = task.assignment();
        if assignment.has_user(user.id) {
            return true;
        }
        match assignment {
            Assignment::Departments { departments } => user
                .department_ids()
                .any(|department_id| departments.contains(&department_id)),
            Assignment::ProvinceDepartments {
                province,
                departments,
            } => user.departments.iter().any(|membership| {
                membership.province_id == Some(*province)
                    && departments.contains(&membership.department_id)
            }),
            Assignment::Personal { .. } | Assignment::Users { .. } => false,
        }
    }

    /// Returns `true` when the actor may perform the action on the task.
    ///
    /// `profile` is the actor's directory record and is only consulted for
    /// actions assignees may perform; pass `None` when it was not loaded.
    #[must_use]
    pub fn can_mutate(
        task: &Task,
        actor: &Actor,
        profile: Option<&User>,
        action: TaskAction,
    ) -> bool {
        let is_creator = task.created_by() == actor.user_id;
        let is_privileged = actor.role.is_privileged();
        match action {
            TaskAction::UpdateDetails
            | TaskAction::ChangePriority
            | TaskAction::Reassign
            | TaskAction::SoftDelete => is_creator || is_privileged,
            TaskAction::ChangeStatus | TaskAction::Delegate => {
                is_creator
                    || is_privileged
                    || profile.is_some_and(|user| {
                        user.id == actor.user_id && Self::is_assignee(task, user)
                    })
            }
            TaskAction::Restore | TaskAction::ViewRecycleBin => is_privileged,
            TaskAction::HardDelete => actor.is_admin(),
        }
    }

    /// Fails unless the actor may perform the action on the task.
    ///
    /// # Errors
    ///
    /// Returns [`PermissionDenied`] naming the action when the check fails.
    pub fn authorize(
        task: &Task,
        actor: &Actor,
        profile: Option<&User>,
        action: TaskAction,
    ) -> Result<(), PermissionDenied> {
        if Self::can_mutate(task, actor, profile, action) {
            return Ok(());
        }
        Err(PermissionDenied {
            action,
            actor: actor.user_id,
            task: Some(task.id()),
        })
    }

    /// Fails unless the actor's role allows browsing the recycle bin.
    ///
    /// # Errors
    ///
    /// Returns [`PermissionDenied`] for actors without `ADMIN` or
    /// `LEADERSHIP`.
    pub fn authorize_recycle_bin(actor: &Actor) -> Result<(), PermissionDenied> {
        if actor.role.is_privileged() {
            return Ok(());
        }
        Err(PermissionDenied {
            action: TaskAction::ViewRecycleBin,
            actor: actor.user_id,
            task: None,
        })
    }

    /// Classifies the actor for a status change.
    ///
    /// # Errors
    ///
    /// Returns [`PermissionDenied`] when the actor is neither privileged nor
    /// an assignee.
    pub fn status_standing(
        task: &Task,
        actor: &Actor,
        profile: Option<&User>,
    ) -> Result<ActorStanding, PermissionDenied> {
        Self::authorize(task, actor, profile, TaskAction::ChangeStatus)?;
        if task.created_by() == actor.user_id || actor.role.is_privileged() {
            Ok(ActorStanding::Privileged)
        } else {
            Ok(ActorStanding::Assignee)
        }
    }
}
