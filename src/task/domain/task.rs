//! Task aggregate root and its lifecycle operations.

use super::{
    Assignment, Reason, StateConflict, StatusTransitionEngine, TaskDomainError, TaskId, TaskKind,
    TaskPriority, TaskStatus, Transition, TransitionRequest, UserId, ValidationFailure,
};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};

/// Maximum title length in characters.
pub const MAX_TITLE_CHARS: usize = 255;

/// Cancellation record kept on a task after it was cancelled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cancellation {
    /// When the task was cancelled.
    pub at: DateTime<Utc>,
    /// Who cancelled the task.
    pub by: UserId,
    /// Why the task was cancelled.
    pub reason: Reason,
}

/// Descriptive fields for a new task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskDraft {
    /// Task title.
    pub title: String,
    /// Optional long description.
    pub description: Option<String>,
    /// Task priority.
    pub priority: TaskPriority,
    /// Optional due date.
    pub due_date: Option<DateTime<Utc>>,
}

impl TaskDraft {
    /// Creates a draft with the given title and default priority.
    #[must_use]
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: None,
            priority: TaskPriority::default(),
            due_date: None,
        }
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets the priority.
    #[must_use]
    pub const fn with_priority(mut self, priority: TaskPriority) -> Self {
        self.priority = priority;
        self
    }

    /// Sets the due date.
    #[must_use]
    pub const fn with_due_date(mut self, due_date: DateTime<Utc>) -> Self {
        self.due_date = Some(due_date);
        self
    }
}

/// Partial update of the descriptive fields.
///
/// `None` leaves a field untouched; `Some(None)` clears a nullable field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskDetailsUpdate {
    /// Replacement title.
    pub title: Option<String>,
    /// Replacement description.
    pub description: Option<Option<String>>,
    /// Replacement due date.
    pub due_date: Option<Option<DateTime<Utc>>>,
}

impl TaskDetailsUpdate {
    /// Creates an empty update.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the title.
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Replaces the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(Some(description.into()));
        self
    }

    /// Clears the description.
    #[must_use]
    pub fn clear_description(mut self) -> Self {
        self.description = Some(None);
        self
    }

    /// Replaces the due date.
    #[must_use]
    pub const fn with_due_date(mut self, due_date: DateTime<Utc>) -> Self {
        self.due_date = Some(Some(due_date));
        self
    }

    /// Clears the due date.
    #[must_use]
    pub const fn clear_due_date(mut self) -> Self {
        self.due_date = Some(None);
        self
    }
}

/// Task aggregate root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    id: TaskId,
    title: String,
    description: Option<String>,
    due_date: Option<DateTime<Utc>>,
    status: TaskStatus,
    priority: TaskPriority,
    assignment: Assignment,
    created_by: UserId,
    is_delegated: bool,
    delegated_by: Option<UserId>,
    delegated_from: Option<TaskId>,
    delegation_reason: Option<String>,
    completed_at: Option<DateTime<Utc>>,
    cancellation: Option<Cancellation>,
    deleted_at: Option<DateTime<Utc>>,
    deleted_by: Option<UserId>,
    deletion_reason: Option<Reason>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Parameter object for reconstructing a persisted task aggregate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedTaskData {
    /// Persisted task identifier.
    pub id: TaskId,
    /// Persisted title.
    pub title: String,
    /// Persisted description.
    pub description: Option<String>,
    /// Persisted due date.
    pub due_date: Option<DateTime<Utc>>,
    /// Persisted workflow status, excluding the recycle-bin marker.
    pub status: TaskStatus,
    /// Persisted priority.
    pub priority: TaskPriority,
    /// Persisted assignment.
    pub assignment: Assignment,
    /// Persisted creator.
    pub created_by: UserId,
    /// Persisted delegation flag.
    pub is_delegated: bool,
    /// Persisted delegating user.
    pub delegated_by: Option<UserId>,
    /// Persisted delegation parent.
    pub delegated_from: Option<TaskId>,
    /// Persisted delegation note.
    pub delegation_reason: Option<String>,
    /// Persisted completion timestamp.
    pub completed_at: Option<DateTime<Utc>>,
    /// Persisted cancellation record.
    pub cancellation: Option<Cancellation>,
    /// Persisted deletion timestamp.
    pub deleted_at: Option<DateTime<Utc>>,
    /// Persisted deleting user.
    pub deleted_by: Option<UserId>,
    /// Persisted deletion reason.
    pub deletion_reason: Option<Reason>,
    /// Persisted creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Persisted latest modification timestamp.
    pub updated_at: DateTime<Utc>,
}

impl Task {
    /// Creates a pending task.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::Validation`] when the title is blank or too
    /// long.
    pub fn new(
        draft: TaskDraft,
        created_by: UserId,
        assignment: Assignment,
        clock: &impl Clock,
    ) -> Result<Self, TaskDomainError> {
        let title = validate_title(&draft.title)?;
        let timestamp = clock.utc();
        Ok(Self {
            id: TaskId::new(),
            title,
            description: draft.description,
            due_date: draft.due_date,
            status: TaskStatus::Pending,
            priority: draft.priority,
            assignment,
            created_by,
            is_delegated: false,
            delegated_by: None,
            delegated_from: None,
            delegation_reason: None,
            completed_at: None,
            cancellation: None,
            deleted_at: None,
            deleted_by: None,
            deletion_reason: None,
            created_at: timestamp,
            updated_at: timestamp,
        })
    }

    /// Reconstructs a task from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedTaskData) -> Self {
        Self {
            id: data.id,
            title: data.title,
            description: data.description,
            due_date: data.due_date,
            status: data.status,
            priority: data.priority,
            assignment: data.assignment,
            created_by: data.created_by,
            is_delegated: data.is_delegated,
            delegated_by: data.delegated_by,
            delegated_from: data.delegated_from,
            delegation_reason: data.delegation_reason,
            completed_at: data.completed_at,
            cancellation: data.cancellation,
            deleted_at: data.deleted_at,
            deleted_by: data.deleted_by,
            deletion_reason: data.deletion_reason,
            created_at: data.created_at,
            updated_at: data.updated_at,
        }
    }

    /// Returns the task identifier.
    #[must_use]
    pub const fn id(&self) -> TaskId {
        self.id
    }

    /// Returns the title.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Returns the description, if any.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Returns the due date, if any.
    #[must_use]
    pub const fn due_date(&self) -> Option<DateTime<Utc>> {
        self.due_date
    }

    /// Returns the visible status.
    ///
    /// Tasks in the recycle bin report [`TaskStatus::Deleted`] regardless of
    /// their workflow status.
    #[must_use]
    pub const fn status(&self) -> TaskStatus {
        if self.deleted_at.is_some() {
            TaskStatus::Deleted
        } else {
            self.status
        }
    }

    /// Returns the workflow status, ignoring the recycle bin.
    #[must_use]
    pub const fn workflow_status(&self) -> TaskStatus {
        self.status
    }

    /// Returns the priority.
    #[must_use]
    pub const fn priority(&self) -> TaskPriority {
        self.priority
    }

    /// Returns the assignment.
    #[must_use]
    pub const fn assignment(&self) -> &Assignment {
        &self.assignment
    }

    /// Returns the task kind derived from the assignment.
    #[must_use]
    pub const fn kind(&self) -> TaskKind {
        self.assignment.kind()
    }

    /// Returns the creator.
    #[must_use]
    pub const fn created_by(&self) -> UserId {
        self.created_by
    }

    /// Returns `true` for delegated originals and delegated children.
    #[must_use]
    pub const fn is_delegated(&self) -> bool {
        self.is_delegated
    }

    /// Returns the user who delegated this task to its assignee.
    #[must_use]
    pub const fn delegated_by(&self) -> Option<UserId> {
        self.delegated_by
    }

    /// Returns the task this task was delegated from.
    #[must_use]
    pub const fn delegated_from(&self) -> Option<TaskId> {
        self.delegated_from
    }

    /// Returns the note recorded with the delegation.
    #[must_use]
    pub fn delegation_reason(&self) -> Option<&str> {
        self.delegation_reason.as_deref()
    }

    /// Returns the completion timestamp while the task is completed.
    #[must_use]
    pub const fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    /// Returns the latest cancellation record.
    #[must_use]
    pub const fn cancellation(&self) -> Option<&Cancellation> {
        self.cancellation.as_ref()
    }

    /// Returns `true` while the task is in the recycle bin.
    #[must_use]
    pub const fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    /// Returns when the task entered the recycle bin.
    #[must_use]
    pub const fn deleted_at(&self) -> Option<DateTime<Utc>> {
        self.deleted_at
    }

    /// Returns who last moved the task to the recycle bin.
    #[must_use]
    pub const fn deleted_by(&self) -> Option<UserId> {
        self.deleted_by
    }

    /// Returns the latest deletion reason.
    #[must_use]
    pub const fn deletion_reason(&self) -> Option<&Reason> {
        self.deletion_reason.as_ref()
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the latest modification timestamp.
    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Fails when the task is in the recycle bin.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::InvalidState`] for deleted tasks.
    pub const fn ensure_active(&self) -> Result<(), TaskDomainError> {
        if self.is_deleted() {
            return Err(self.conflict(StateConflict::InRecycleBin));
        }
        Ok(())
    }

    /// Applies a partial update of title, description, and due date.
    ///
    /// Returns the names of the fields that changed; an empty list means the
    /// task was left untouched.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::InvalidState`] for deleted tasks and
    /// [`TaskDomainError::Validation`] for an invalid title.
    pub fn update_details(
        &mut self,
        update: TaskDetailsUpdate,
        clock: &impl Clock,
    ) -> Result<Vec<&'static str>, TaskDomainError> {
        self.ensure_active()?;
        let title = update.title.as_deref().map(validate_title).transpose()?;

        let mut changed = Vec::new();
        if let Some(new_title) = title.filter(|value| *value != self.title) {
            self.title = new_title;
            changed.push("title");
        }
        if let Some(description) = update.description.filter(|value| *value != self.description) {
            self.description = description;
            changed.push("description");
        }
        if let Some(due_date) = update.due_date.filter(|value| *value != self.due_date) {
            self.due_date = due_date;
            changed.push("due_date");
        }
        if !changed.is_empty() {
            self.touch(clock);
        }
        Ok(changed)
    }

    /// Changes the priority. Returns `false` when the priority is unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::InvalidState`] for deleted tasks.
    pub fn change_priority(
        &mut self,
        priority: TaskPriority,
        clock: &impl Clock,
    ) -> Result<bool, TaskDomainError> {
        self.ensure_active()?;
        if self.priority == priority {
            return Ok(false);
        }
        self.priority = priority;
        self.touch(clock);
        Ok(true)
    }

    /// Runs a status change through the transition table and applies it.
    ///
    /// Entering `Completed` stamps `completed_at` and leaving it clears the
    /// stamp. Entering `Cancelled` records the cancellation.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::InvalidState`] for deleted tasks, and any
    /// error raised by [`StatusTransitionEngine::evaluate`].
    pub fn change_status(
        &mut self,
        request: TransitionRequest<'_>,
        clock: &impl Clock,
    ) -> Result<Transition, TaskDomainError> {
        self.ensure_active()?;
        let transition = StatusTransitionEngine::evaluate(self.id, self.status, request)?;
        if let Transition::Move {
            from,
            to,
            cancellation_reason,
        } = &transition
        {
            let now = clock.utc();
            if *from == TaskStatus::Completed {
                self.completed_at = None;
            }
            match to {
                TaskStatus::Completed => self.completed_at = Some(now),
                TaskStatus::Cancelled => {
                    if let Some(reason) = cancellation_reason {
                        self.cancellation = Some(Cancellation {
                            at: now,
                            by: request.actor,
                            reason: reason.clone(),
                        });
                    }
                }
                _ => {}
            }
            self.status = *to;
            self.updated_at = now;
        }
        Ok(transition)
    }

    /// Replaces the assignment. The task kind follows the new assignment.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::InvalidState`] for deleted or delegated
    /// tasks.
    pub fn reassign(
        &mut self,
        assignment: Assignment,
        clock: &impl Clock,
    ) -> Result<(), TaskDomainError> {
        self.ensure_active()?;
        if self.status == TaskStatus::Delegated {
            return Err(self.conflict(StateConflict::AlreadyDelegated));
        }
        self.assignment = assignment;
        self.touch(clock);
        Ok(())
    }

    /// Fails unless the task may be delegated.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::InvalidState`] for deleted, completed, or
    /// cancelled tasks and for any task carrying the delegation flag,
    /// delegated children included.
    pub fn ensure_delegatable(&self) -> Result<(), TaskDomainError> {
        self.ensure_active()?;
        if self.is_delegated || self.status == TaskStatus::Delegated {
            return Err(self.conflict(StateConflict::AlreadyDelegated));
        }
        match self.status {
            TaskStatus::Completed | TaskStatus::Cancelled => {
                Err(self.conflict(StateConflict::NotDelegatable(self.status)))
            }
            _ => Ok(()),
        }
    }

    /// Creates the child task handed to one delegated assignee.
    #[must_use]
    pub fn delegated_child(
        &self,
        assignee: UserId,
        delegator: UserId,
        reason: Option<&str>,
        clock: &impl Clock,
    ) -> Self {
        let timestamp = clock.utc();
        Self {
            id: TaskId::new(),
            title: self.title.clone(),
            description: self.description.clone(),
            due_date: self.due_date,
            status: TaskStatus::Pending,
            priority: self.priority,
            assignment: Assignment::single_user(assignee),
            created_by: delegator,
            is_delegated: true,
            delegated_by: Some(delegator),
            delegated_from: Some(self.id),
            delegation_reason: reason.map(ToOwned::to_owned),
            completed_at: None,
            cancellation: None,
            deleted_at: None,
            deleted_by: None,
            deletion_reason: None,
            created_at: timestamp,
            updated_at: timestamp,
        }
    }

    /// Drops the link to a parent task that has been permanently removed.
    ///
    /// The delegating user and reason stay, so the task remains a delegated
    /// child.
    pub const fn detach_from_parent(&mut self) {
        self.delegated_from = None;
    }

    /// Marks the task as superseded by its delegated children.
    ///
    /// # Errors
    ///
    /// Returns the same errors as [`Task::ensure_delegatable`].
    pub fn mark_delegated(&mut self, clock: &impl Clock) -> Result<(), TaskDomainError> {
        self.ensure_delegatable()?;
        self.status = TaskStatus::Delegated;
        self.is_delegated = true;
        self.touch(clock);
        Ok(())
    }

    /// Moves the task to the recycle bin.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::InvalidState`] when the task is already in
    /// the recycle bin.
    pub fn soft_delete(
        &mut self,
        actor: UserId,
        reason: Reason,
        clock: &impl Clock,
    ) -> Result<(), TaskDomainError> {
        self.ensure_active()?;
        let now = clock.utc();
        self.deleted_at = Some(now);
        self.deleted_by = Some(actor);
        self.deletion_reason = Some(reason);
        self.updated_at = now;
        Ok(())
    }

    /// Brings the task back from the recycle bin as `Pending`.
    ///
    /// The deleting user and reason are kept as history.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::InvalidState`] when the task is not in the
    /// recycle bin.
    pub fn restore(&mut self, clock: &impl Clock) -> Result<(), TaskDomainError> {
        if !self.is_deleted() {
            return Err(self.conflict(StateConflict::NotInRecycleBin));
        }
        self.deleted_at = None;
        self.status = TaskStatus::Pending;
        self.completed_at = None;
        self.touch(clock);
        Ok(())
    }

    const fn conflict(&self, conflict: StateConflict) -> TaskDomainError {
        TaskDomainError::InvalidState {
            task: self.id,
            conflict,
        }
    }

    /// Updates the `updated_at` timestamp to the current clock time.
    fn touch(&mut self, clock: &impl Clock) {
        self.updated_at = clock.utc();
    }
}

/// Trims and validates a task title.
///
/// # Errors
///
/// Returns [`ValidationFailure::EmptyTitle`] or
/// [`ValidationFailure::TitleTooLong`].
pub fn validate_title(title: &str) -> Result<String, ValidationFailure> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err(ValidationFailure::EmptyTitle);
    }
    if trimmed.chars().count() > MAX_TITLE_CHARS {
        return Err(ValidationFailure::TitleTooLong {
            max: MAX_TITLE_CHARS,
        });
    }
    Ok(trimmed.to_owned())
}
