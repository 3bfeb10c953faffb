//! Lookups and audit emission shared by the task services.

use super::error::TaskServiceResult;
use crate::task::{
    domain::{Actor, MissingEntity, Task, TaskId, User},
    ports::{AuditLog, AuditRecord, TaskRepository, UserDirectory},
};
use tracing::warn;

/// Loads a task, including tasks in the recycle bin.
pub(super) async fn load_task<R: TaskRepository>(
    repository: &R,
    id: TaskId,
) -> TaskServiceResult<Task> {
    repository
        .find_by_id(id)
        .await?
        .ok_or_else(|| MissingEntity::Task(id).into())
}

/// Loads the actor's directory profile when an assignee check may be needed.
///
/// Creators and privileged actors never need one, so the lookup is skipped.
pub(super) async fn assignee_profile<D: UserDirectory>(
    directory: &D,
    task: &Task,
    actor: &Actor,
) -> TaskServiceResult<Option<User>> {
    if task.created_by() == actor.user_id || actor.role.is_privileged() {
        return Ok(None);
    }
    Ok(directory.find_user(actor.user_id).await?)
}

/// Loads the actor's directory profile, failing when the user is unknown.
pub(super) async fn require_profile<D: UserDirectory>(
    directory: &D,
    actor: &Actor,
) -> TaskServiceResult<User> {
    directory
        .find_user(actor.user_id)
        .await?
        .ok_or_else(|| MissingEntity::Users(vec![actor.user_id]).into())
}

/// Emits an audit record without letting a sink failure affect the caller.
pub(super) async fn record_best_effort<A: AuditLog>(audit: &A, record: AuditRecord) {
    let action = record.action;
    let task_id = record.target_id;
    if let Err(error) = audit.record(record).await {
        warn!(%task_id, %action, %error, "audit record dropped");
    }
}
