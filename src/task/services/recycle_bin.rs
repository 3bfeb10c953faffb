//! Recycle bin: soft delete, restore, permanent removal, and browsing.

use super::{
    error::{TaskServiceError, TaskServiceResult},
    policy::TaskPolicy,
    support::{load_task, record_best_effort},
};
use crate::task::{
    domain::{
        Actor, DepartmentId, MissingEntity, PermissionEvaluator, ProvinceId, Reason, Task,
        TaskAction, TaskId, UserId,
    },
    ports::{
        AuditAction, AuditLog, AuditRecord, AuditStatus, DateRange, DepartmentDirectory,
        ProvinceScope, SortDirection, SortField, TaskFilter, TaskPage, TaskQuery,
        TaskRepository, TaskRepositoryError, TaskSort,
    },
};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde_json::json;
use std::sync::Arc;
use tracing::{info, warn};

/// Field name reported when a deletion reason is rejected.
pub const DELETION_REASON_FIELD: &str = "deletion reason";

/// Filters for browsing the recycle bin.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecycleBinQuery {
    /// Text matched against title, description, and deletion reason.
    pub search: Option<String>,
    /// Creator.
    pub created_by: Option<UserId>,
    /// Assigned department.
    pub department_id: Option<DepartmentId>,
    /// Province, matched directly or through an assigned department.
    pub province_id: Option<ProvinceId>,
    /// Deleting user.
    pub deleted_by: Option<UserId>,
    /// Earliest deletion time.
    pub deleted_from: Option<DateTime<Utc>>,
    /// Latest deletion time.
    pub deleted_to: Option<DateTime<Utc>>,
    /// Sort column name; defaults to the deletion time.
    pub sort_by: Option<String>,
    /// Sort direction.
    pub direction: SortDirection,
    /// One-based page number.
    pub page: Option<u32>,
    /// Page size.
    pub per_page: Option<u32>,
}

impl RecycleBinQuery {
    /// Creates an unfiltered query, newest deletions first.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the search text.
    #[must_use]
    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = Some(search.into());
        self
    }

    /// Restricts to tasks created by a user.
    #[must_use]
    pub const fn with_creator(mut self, user_id: UserId) -> Self {
        self.created_by = Some(user_id);
        self
    }

    /// Restricts to tasks assigned to a department.
    #[must_use]
    pub const fn with_department(mut self, department_id: DepartmentId) -> Self {
        self.department_id = Some(department_id);
        self
    }

    /// Restricts to tasks belonging to a province.
    #[must_use]
    pub const fn with_province(mut self, province_id: ProvinceId) -> Self {
        self.province_id = Some(province_id);
        self
    }

    /// Restricts to tasks deleted by a user.
    #[must_use]
    pub const fn with_deleted_by(mut self, user_id: UserId) -> Self {
        self.deleted_by = Some(user_id);
        self
    }

    /// Restricts the deletion time range.
    #[must_use]
    pub const fn with_deleted_between(
        mut self,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> Self {
        self.deleted_from = from;
        self.deleted_to = to;
        self
    }

    /// Sets the ordering.
    #[must_use]
    pub fn with_sort(mut self, sort_by: impl Into<String>, direction: SortDirection) -> Self {
        self.sort_by = Some(sort_by.into());
        self.direction = direction;
        self
    }

    /// Sets the page.
    #[must_use]
    pub const fn with_page(mut self, page: u32, per_page: u32) -> Self {
        self.page = Some(page);
        self.per_page = Some(per_page);
        self
    }
}

/// Recycle bin orchestration service.
#[derive(Clone)]
pub struct RecycleBinService<R, D, A, C>
where
    R: TaskRepository,
    D: DepartmentDirectory,
    A: AuditLog,
    C: Clock + Send + Sync,
{
    repository: Arc<R>,
    directory: Arc<D>,
    audit: Arc<A>,
    clock: Arc<C>,
    policy: TaskPolicy,
}

impl<R, D, A, C> RecycleBinService<R, D, A, C>
where
    R: TaskRepository,
    D: DepartmentDirectory,
    A: AuditLog,
    C: Clock + Send + Sync,
{
    /// Creates a new recycle bin service with the default policy.
    #[must_use]
    pub fn new(repository: Arc<R>, directory: Arc<D>, audit: Arc<A>, clock: Arc<C>) -> Self {
        Self {
            repository,
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

    /// Moves a task to the recycle bin.
    ///
    /// The warning-level audit record is emitted before the change is
    /// persisted, so the intent is on record even if the write fails. A sink
    /// failure is logged and does not block the deletion.
    ///
    /// # Errors
    ///
    /// Returns an error when the task is missing, the actor is not the
    /// creator or privileged, the reason is too short, the task is already in
    /// the recycle bin, or persistence fails.
    pub async fn soft_delete(
        &self,
        actor: &Actor,
        task_id: TaskId,
        reason: &str,
    ) -> TaskServiceResult<Task> {
        let mut task = load_task(&*self.repository, task_id).await?;
        PermissionEvaluator::authorize(&task, actor, None, TaskAction::SoftDelete)?;
        let accepted = Reason::parse(reason, DELETION_REASON_FIELD, self.policy.min_reason_chars)?;
        task.ensure_active()?;

        let record = AuditRecord::task(
            actor.user_id,
            AuditAction::TaskSoftDeleted,
            task_id,
            format!("Moved \"{}\" to the recycle bin: {accepted}", task.title()),
        )
        .with_status(AuditStatus::Warning)
        .with_metadata(json!({
            "reason": accepted.as_str(),
            "status": task.workflow_status().as_str(),
        }));
        record_best_effort(&*self.audit, record).await;

        task.soft_delete(actor.user_id, accepted, &*self.clock)?;
        self.repository.update(&task).await?;
        info!(%task_id, actor = %actor.user_id, "task moved to recycle bin");
        Ok(task)
    }

    /// Restores a task from the recycle bin as `Pending`.
    ///
    /// # Errors
    ///
    /// Returns an error when the task is missing, the actor is neither
    /// `ADMIN` nor `LEADERSHIP`, or the task is not in the recycle bin.
    pub async fn restore(&self, actor: &Actor, task_id: TaskId) -> TaskServiceResult<Task> {
        let mut task = load_task(&*self.repository, task_id).await?;
        PermissionEvaluator::authorize(&task, actor, None, TaskAction::Restore)?;
        task.restore(&*self.clock)?;
        self.repository.update(&task).await?;
        info!(%task_id, actor = %actor.user_id, "task restored");

        let record = AuditRecord::task(
            actor.user_id,
            AuditAction::TaskRestored,
            task_id,
            format!("Restored \"{}\" from the recycle bin", task.title()),
        )
        .with_metadata(json!({
            "deleted_by": task.deleted_by(),
            "deletion_reason": task.deletion_reason().map(Reason::as_str),
        }));
        record_best_effort(&*self.audit, record).await;
        Ok(task)
    }

    /// Permanently removes a task. `ADMIN` only.
    ///
    /// The audit record must be accepted before the row is removed; a sink
    /// failure aborts the removal.
    ///
    /// # Errors
    ///
    /// Returns an error when the task is missing or was removed concurrently,
    /// the actor is not `ADMIN`, or the audit sink rejects the record.
    pub async fn hard_delete(&self, actor: &Actor, task_id: TaskId) -> TaskServiceResult<()> {
        let task = load_task(&*self.repository, task_id).await?;
        PermissionEvaluator::authorize(&task, actor, None, TaskAction::HardDelete)?;

        let record = AuditRecord::task(
            actor.user_id,
            AuditAction::TaskHardDeleted,
            task_id,
            format!("Permanently deleted \"{}\"", task.title()),
        )
        .with_status(AuditStatus::Warning)
        .with_metadata(json!({
            "title": task.title(),
            "kind": task.kind().as_str(),
            "created_by": task.created_by(),
        }));
        if let Err(error) = self.audit.record(record).await {
            warn!(%task_id, %error, "permanent deletion aborted: audit record rejected");
            return Err(error.into());
        }

        match self.repository.delete(task_id).await {
            Ok(()) => {
                info!(%task_id, actor = %actor.user_id, "task permanently deleted");
                Ok(())
            }
            Err(TaskRepositoryError::NotFound(id)) => Err(MissingEntity::Task(id).into()),
            Err(error) => Err(TaskServiceError::from(error)),
        }
    }

    /// Lists tasks in the recycle bin. `ADMIN` and `LEADERSHIP` only.
    ///
    /// # Errors
    ///
    /// Returns an error when the actor lacks the role, the sort column is not
    /// on the allow-list, the date range is inverted, or a lookup fails.
    pub async fn list_deleted(
        &self,
        actor: &Actor,
        query: RecycleBinQuery,
    ) -> TaskServiceResult<TaskPage> {
        PermissionEvaluator::authorize_recycle_bin(actor)?;
        let field = query
            .sort_by
            .as_deref()
            .map(SortField::try_from)
            .transpose()?
            .unwrap_or(SortField::DeletedAt);
        let deleted = DateRange::new(query.deleted_from, query.deleted_to)?;

        let province = self.province_scope(query.province_id).await?;

        let filter = TaskFilter {
            search: query.search,
            created_by: query.created_by,
            assigned_departments: query.department_id.into_iter().collect(),
            province,
            deleted_by: query.deleted_by,
            deleted,
            ..TaskFilter::recycle_bin()
        };
        let task_query = TaskQuery::new(filter)
            .with_sort(TaskSort::new(field, query.direction))
            .with_page(self.policy.page(query.page, query.per_page));
        Ok(self.repository.list(&task_query).await?)
    }

    async fn province_scope(
        &self,
        province_id: Option<ProvinceId>,
    ) -> TaskServiceResult<Option<ProvinceScope>> {
        let Some(province) = province_id else {
            return Ok(None);
        };
        let departments = self
            .directory
            .find_departments_by_province(province)
            .await?
            .into_iter()
            .map(|department| department.id)
            .collect();
        Ok(Some(ProvinceScope {
            province,
            departments,
        }))
    }
}
