//! Service layer for task creation, editing, status changes, and
//! reassignment.

use super::{
    assignment::{AssignmentRequest, AssignmentResolver},
    error::TaskServiceResult,
    policy::TaskPolicy,
    support::{assignee_profile, load_task, record_best_effort},
};
use crate::task::{
    domain::{
        Actor, MissingEntity, PermissionEvaluator, Task, TaskAction, TaskDetailsUpdate,
        TaskDomainError, TaskDraft, TaskId, TaskPriority, TaskStatus, Transition,
        TransitionRequest,
    },
    ports::{
        AuditAction, AuditLog, AuditRecord, DepartmentDirectory, ProvinceDirectory,
        TaskRepository, UserDirectory,
    },
};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, info};

/// Request payload for creating a task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateTaskRequest {
    draft: TaskDraft,
    assignment: AssignmentRequest,
}

impl CreateTaskRequest {
    /// Creates a request for a personal task with the given title.
    #[must_use]
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            draft: TaskDraft::new(title),
            assignment: AssignmentRequest::new(),
        }
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.draft = self.draft.with_description(description);
        self
    }

    /// Sets the priority.
    #[must_use]
    pub fn with_priority(mut self, priority: TaskPriority) -> Self {
        self.draft = self.draft.with_priority(priority);
        self
    }

    /// Sets the due date.
    #[must_use]
    pub fn with_due_date(mut self, due_date: DateTime<Utc>) -> Self {
        self.draft = self.draft.with_due_date(due_date);
        self
    }

    /// Sets the assignment targets.
    #[must_use]
    pub fn with_assignment(mut self, assignment: AssignmentRequest) -> Self {
        self.assignment = assignment;
        self
    }
}

/// Request payload for a status change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusChangeRequest {
    status: String,
    reason: Option<String>,
}

impl StatusChangeRequest {
    /// Creates a request for the given status name.
    #[must_use]
    pub fn new(status: impl Into<String>) -> Self {
        Self {
            status: status.into(),
            reason: None,
        }
    }

    /// Creates a request for a typed status.
    #[must_use]
    pub fn for_status(status: TaskStatus) -> Self {
        Self::new(status.as_str())
    }

    /// Sets the cancellation reason.
    #[must_use]
    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }
}

/// Task lifecycle orchestration service.
#[derive(Clone)]
pub struct TaskLifecycleService<R, D, A, C>
where
    R: TaskRepository,
    D: UserDirectory + DepartmentDirectory + ProvinceDirectory,
    A: AuditLog,
    C: Clock + Send + Sync,
{
    repository: Arc<R>,
    directory: Arc<D>,
    resolver: AssignmentResolver<D>,
    audit: Arc<A>,
    clock: Arc<C>,
    policy: TaskPolicy,
}

impl<R, D, A, C> TaskLifecycleService<R, D, A, C>
where
    R: TaskRepository,
    D: UserDirectory + DepartmentDirectory + ProvinceDirectory,
    A: AuditLog,
    C: Clock + Send + Sync,
{
    /// Creates a new task lifecycle service with the default policy.
    #[must_use]
    pub fn new(repository: Arc<R>, directory: Arc<D>, audit: Arc<A>, clock: Arc<C>) -> Self {
        Self {
            repository,
            resolver: AssignmentResolver::new(Arc::clone(&directory)),
            directory,
            audit,
            clock,
            policy: TaskPolicy::default(),
        }
    }

    /// Replaces the policy.
    #[must_use]
    pub const fn with_policy(mut self, policy: TaskPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Creates a pending task owned by the actor.
    ///
    /// # Errors
    ///
    /// Returns an error when the assignment is invalid, a title rule fails,
    /// or the repository rejects persistence.
    pub async fn create(
        &self,
        actor: &Actor,
        request: CreateTaskRequest,
    ) -> TaskServiceResult<Task> {
        let assignment = self
            .resolver
            .resolve(&request.assignment, actor.user_id)
            .await?;
        let task = Task::new(request.draft, actor.user_id, assignment, &*self.clock)?;
        self.repository.store(&task).await?;
        info!(task_id = %task.id(), actor = %actor.user_id, kind = %task.kind(), "task created");

        let record = AuditRecord::task(
            actor.user_id,
            AuditAction::TaskCreated,
            task.id(),
            format!("Created {} task \"{}\"", task.kind(), task.title()),
        )
        .with_metadata(json!({
            "kind": task.kind().as_str(),
            "priority": task.priority().as_str(),
        }));
        record_best_effort(&*self.audit, record).await;
        Ok(task)
    }

    /// Retrieves a task outside the recycle bin.
    ///
    /// # Errors
    ///
    /// Returns a not-found error when the task does not exist or is in the
    /// recycle bin.
    pub async fn find_task(&self, task_id: TaskId) -> TaskServiceResult<Task> {
        let task = load_task(&*self.repository, task_id).await?;
        if task.is_deleted() {
            return Err(MissingEntity::Task(task_id).into());
        }
        Ok(task)
    }

    /// Edits title, description, and due date.
    ///
    /// Returns the task untouched, without an audit record, when nothing
    /// changes.
    ///
    /// # Errors
    ///
    /// Returns an error when the task is missing, the actor is not the
    /// creator or privileged, the task is in the recycle bin, or the title is
    /// invalid.
    pub async fn update_details(
        &self,
        actor: &Actor,
        task_id: TaskId,
        update: TaskDetailsUpdate,
    ) -> TaskServiceResult<Task> {
        let mut task = load_task(&*self.repository, task_id).await?;
        PermissionEvaluator::authorize(&task, actor, None, TaskAction::UpdateDetails)?;
        let changed = task.update_details(update, &*self.clock)?;
        if changed.is_empty() {
            debug!(%task_id, "update left task unchanged");
            return Ok(task);
        }
        self.repository.update(&task).await?;
        info!(%task_id, actor = %actor.user_id, fields = ?changed, "task details updated");

        let record = AuditRecord::task(
            actor.user_id,
            AuditAction::TaskUpdated,
            task_id,
            format!("Updated {}", changed.join(", ")),
        )
        .with_metadata(json!({ "changes": changed }));
        record_best_effort(&*self.audit, record).await;
        Ok(task)
    }

    /// Changes the priority. Assignees may not change priority.
    ///
    /// # Errors
    ///
    /// Returns an error when the task is missing, the actor is not the
    /// creator or privileged, or the task is in the recycle bin.
    pub async fn change_priority(
        &self,
        actor: &Actor,
        task_id: TaskId,
        priority: TaskPriority,
    ) -> TaskServiceResult<Task> {
        let mut task = load_task(&*self.repository, task_id).await?;
        PermissionEvaluator::authorize(&task, actor, None, TaskAction::ChangePriority)?;
        let previous = task.priority();
        if !task.change_priority(priority, &*self.clock)? {
            return Ok(task);
        }
        self.repository.update(&task).await?;
        info!(%task_id, actor = %actor.user_id, from = %previous, to = %priority, "task priority changed");

        let record = AuditRecord::task(
            actor.user_id,
            AuditAction::TaskPriorityChanged,
            task_id,
            format!("Priority changed from {previous} to {priority}"),
        )
        .with_metadata(json!({ "from": previous.as_str(), "to": priority.as_str() }));
        record_best_effort(&*self.audit, record).await;
        Ok(task)
    }

    /// Moves the task to another status.
    ///
    /// Requesting the current status returns the task unchanged without an
    /// audit record, once the actor has passed the permission check.
    ///
    /// # Errors
    ///
    /// Returns an error when the task is missing, the status name is unknown,
    /// the actor may not make the change, the transition is not allowed, or
    /// the cancellation reason is too short.
    pub async fn change_status(
        &self,
        actor: &Actor,
        task_id: TaskId,
        request: StatusChangeRequest,
    ) -> TaskServiceResult<Task> {
        let mut task = load_task(&*self.repository, task_id).await?;
        let target =
            TaskStatus::try_from(request.status.as_str()).map_err(TaskDomainError::from)?;
        let profile = assignee_profile(&*self.directory, &task, actor).await?;
        let standing = PermissionEvaluator::status_standing(&task, actor, profile.as_ref())?;

        let transition = task.change_status(
            TransitionRequest {
                actor: actor.user_id,
                standing,
                target,
                reason: request.reason.as_deref(),
                min_reason_chars: self.policy.min_reason_chars,
            },
            &*self.clock,
        )?;
        let Transition::Move {
            from,
            to,
            cancellation_reason,
        } = transition
        else {
            debug!(%task_id, status = %target, "status already set");
            return Ok(task);
        };

        self.repository.update(&task).await?;
        info!(%task_id, actor = %actor.user_id, %from, %to, "task status changed");

        let details = match &cancellation_reason {
            Some(reason) => format!("Status changed from {from} to {to}: {reason}"),
            None => format!("Status changed from {from} to {to}"),
        };
        let record = AuditRecord::task(actor.user_id, AuditAction::TaskStatusChanged, task_id, details)
            .with_metadata(json!({
                "from": from.as_str(),
                "to": to.as_str(),
                "reason": cancellation_reason.as_ref().map(|reason| reason.as_str()),
            }));
        record_best_effort(&*self.audit, record).await;
        Ok(task)
    }

    /// Replaces the assignment, re-running assignment resolution.
    ///
    /// The task kind follows the new assignment.
    ///
    /// # Errors
    ///
    /// Returns an error when the task is missing, the actor is not the
    /// creator or privileged, the task is deleted or delegated, or the new
    /// assignment is invalid.
    pub async fn reassign(
        &self,
        actor: &Actor,
        task_id: TaskId,
        request: AssignmentRequest,
    ) -> TaskServiceResult<Task> {
        let mut task = load_task(&*self.repository, task_id).await?;
        PermissionEvaluator::authorize(&task, actor, None, TaskAction::Reassign)?;
        task.ensure_active()?;
        let previous_kind = task.kind();
        let assignment = self.resolver.resolve(&request, task.created_by()).await?;
        task.reassign(assignment, &*self.clock)?;
        self.repository.update(&task).await?;
        info!(%task_id, actor = %actor.user_id, from = %previous_kind, to = %task.kind(), "task reassigned");

        let record = AuditRecord::task(
            actor.user_id,
            AuditAction::TaskReassigned,
            task_id,
            format!("Reassigned as {} task", task.kind()),
        )
        .with_metadata(json!({
            "from_kind": previous_kind.as_str(),
            "to_kind": task.kind().as_str(),
            "users": task.assignment().user_ids(),
            "departments": task.assignment().department_ids().collect::<Vec<_>>(),
            "province": task.assignment().province_id(),
        }));
        record_best_effort(&*self.audit, record).await;
        Ok(task)
    }
}
