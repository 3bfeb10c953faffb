//! Delegation: forking a task into one child task per new assignee.

use super::{
    assignment::missing_ids,
    error::TaskServiceResult,
    support::{assignee_profile, load_task, record_best_effort},
};
use crate::task::{
    domain::{
        Actor, AssignmentViolation, MissingEntity, PermissionEvaluator, Task, TaskAction, TaskId,
        UserId,
    },
    ports::{
        AuditAction, AuditLog, AuditRecord, SortDirection, SortField, TaskFilter, TaskQuery,
        TaskRepository, TaskSort, UserDirectory,
    },
};
use mockable::Clock;
use serde_json::json;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::info;

/// Request payload for delegating a task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DelegateTaskRequest {
    task_id: TaskId,
    assignee_ids: Vec<UserId>,
    reason: Option<String>,
}

impl DelegateTaskRequest {
    /// Creates a request delegating the task to the given users.
    #[must_use]
    pub fn new(task_id: TaskId, assignee_ids: impl IntoIterator<Item = UserId>) -> Self {
        Self {
            task_id,
            assignee_ids: assignee_ids.into_iter().collect(),
            reason: None,
        }
    }

    /// Sets the note stored on every child.
    #[must_use]
    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }
}

/// Result of a delegation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DelegationOutcome {
    /// The original task as stored after the delegation.
    pub original: Task,
    /// One child per assignee, in request order.
    pub children: Vec<Task>,
}

/// Delegation orchestration service.
#[derive(Clone)]
pub struct TaskDelegationService<R, D, A, C>
where
    R: TaskRepository,
    D: UserDirectory,
    A: AuditLog,
    C: Clock + Send + Sync,
{
    repository: Arc<R>,
    directory: Arc<D>,
    audit: Arc<A>,
    clock: Arc<C>,
}

impl<R, D, A, C> TaskDelegationService<R, D, A, C>
where
    R: TaskRepository,
    D: UserDirectory,
    A: AuditLog,
    C: Clock + Send + Sync,
{
    /// Creates a new delegation service.
    #[must_use]
    pub const fn new(repository: Arc<R>, directory: Arc<D>, audit: Arc<A>, clock: Arc<C>) -> Self {
        Self {
            repository,
            directory,
            audit,
            clock,
        }
    }

    /// Delegates a task to new assignees.
    ///
    /// Every check runs before anything is written. The original and all
    /// children are then committed together.
    ///
    /// # Errors
    ///
    /// Returns an error when the task is missing, the actor may not delegate
    /// it, it is deleted, already delegated, completed, or cancelled, the
    /// assignee list is empty or repeats a user, or any assignee does not
    /// exist.
    pub async fn delegate(
        &self,
        actor: &Actor,
        request: DelegateTaskRequest,
    ) -> TaskServiceResult<DelegationOutcome> {
        let mut original = load_task(&*self.repository, request.task_id).await?;
        let profile = assignee_profile(&*self.directory, &original, actor).await?;
        PermissionEvaluator::authorize(&original, actor, profile.as_ref(), TaskAction::Delegate)?;
        original.ensure_delegatable()?;
        let assignees = self.validate_assignees(&request.assignee_ids).await?;

        let reason = request
            .reason
            .as_deref()
            .map(str::trim)
            .filter(|text| !text.is_empty());
        let children: Vec<Task> = assignees
            .iter()
            .map(|assignee| original.delegated_child(*assignee, actor.user_id, reason, &*self.clock))
            .collect();
        original.mark_delegated(&*self.clock)?;
        self.repository
            .store_delegation(&original, &children)
            .await?;
        info!(
            task_id = %original.id(),
            actor = %actor.user_id,
            children = children.len(),
            "task delegated"
        );

        let child_ids: Vec<TaskId> = children.iter().map(Task::id).collect();
        let record = AuditRecord::task(
            actor.user_id,
            AuditAction::TaskDelegated,
            original.id(),
            format!("Delegated to {} assignee(s)", children.len()),
        )
        .with_metadata(json!({
            "assignees": assignees,
            "children": child_ids,
            "reason": reason,
        }));
        record_best_effort(&*self.audit, record).await;

        let stored = load_task(&*self.repository, original.id()).await?;
        Ok(DelegationOutcome {
            original: stored,
            children,
        })
    }

    /// Lists the delegated children of a task, oldest first.
    ///
    /// # Errors
    ///
    /// Returns a not-found error when the task does not exist.
    pub async fn children_of(&self, task_id: TaskId) -> TaskServiceResult<Vec<Task>> {
        load_task(&*self.repository, task_id).await?;
        let filter = TaskFilter {
            delegated_from: Some(task_id),
            ..TaskFilter::active()
        };
        let query = TaskQuery::new(filter)
            .with_sort(TaskSort::new(SortField::CreatedAt, SortDirection::Asc));
        Ok(self.repository.list(&query).await?.items)
    }

    /// Rejects empty and repeated assignee lists, then confirms every user
    /// exists, reporting all missing ids together.
    async fn validate_assignees(&self, requested: &[UserId]) -> TaskServiceResult<Vec<UserId>> {
        if requested.is_empty() {
            return Err(AssignmentViolation::NoAssignees.into());
        }
        let mut seen = BTreeSet::new();
        let duplicates: BTreeSet<UserId> = requested
            .iter()
            .filter(|id| !seen.insert(**id))
            .copied()
            .collect();
        if !duplicates.is_empty() {
            return Err(
                AssignmentViolation::DuplicateAssignees(duplicates.into_iter().collect()).into(),
            );
        }

        let found = self.directory.find_users(requested).await?;
        let missing = missing_ids(&seen, found.iter().map(|user| user.id));
        if !missing.is_empty() {
            return Err(MissingEntity::Users(missing).into());
        }
        Ok(requested.to_vec())
    }
}
