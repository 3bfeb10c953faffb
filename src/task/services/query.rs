//! Read-only task views: dashboard buckets, visible listings, scoped
//! listings, status counts, and assignee resolution.

use super::{
    error::TaskServiceResult,
    policy::TaskPolicy,
    support::{load_task, require_profile},
};
use crate::task::{
    domain::{
        Actor, DepartmentId, PermissionEvaluator, ProvinceId, Task, TaskId, TaskKind,
        TaskPriority, TaskStatus, User, UserId,
    },
    ports::{
        DateRange, DepartmentDirectory, ProvinceScope, SortDirection, SortField, TaskFilter,
        TaskPage, TaskQuery, TaskRepository, TaskSort, UserDirectory, VisibilityScope,
    },
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

const NON_PERSONAL_KINDS: [TaskKind; 3] = [
    TaskKind::User,
    TaskKind::Department,
    TaskKind::ProvinceDepartment,
];
const DEPARTMENTAL_KINDS: [TaskKind; 2] = [TaskKind::Department, TaskKind::ProvinceDepartment];

/// A user's tasks partitioned by relationship.
///
/// Tasks in the recycle bin never appear. Delegated originals and children
/// only appear in the two delegation buckets.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Dashboard {
    /// Personal tasks the user created.
    pub personal: Vec<Task>,
    /// Non-personal tasks the user created.
    pub created_for_others: Vec<Task>,
    /// Tasks naming the user as a direct assignee.
    pub assigned_to_me: Vec<Task>,
    /// Tasks reaching the user only through department membership.
    pub assigned_to_my_departments: Vec<Task>,
    /// Children the user created by delegating.
    pub delegated_by_me: Vec<Task>,
    /// Children delegated to the user.
    pub delegated_to_me: Vec<Task>,
}

/// Task counts per status. Statuses without tasks count zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatusCounts {
    /// `Pending` tasks.
    pub pending: u64,
    /// `InProgress` tasks.
    pub in_progress: u64,
    /// `Completed` tasks.
    pub completed: u64,
    /// `Cancelled` tasks.
    pub cancelled: u64,
    /// `Delegated` tasks.
    pub delegated: u64,
}

impl StatusCounts {
    /// Counts tasks by workflow status.
    #[must_use]
    pub fn tally<'a>(tasks: impl IntoIterator<Item = &'a Task>) -> Self {
        tasks.into_iter().fold(Self::default(), |mut counts, task| {
            match task.workflow_status() {
                TaskStatus::Pending => counts.pending += 1,
                TaskStatus::InProgress => counts.in_progress += 1,
                TaskStatus::Completed => counts.completed += 1,
                TaskStatus::Cancelled => counts.cancelled += 1,
                TaskStatus::Delegated => counts.delegated += 1,
                TaskStatus::Deleted => {}
            }
            counts
        })
    }

    /// Returns the count for a status; `Deleted` always counts zero.
    #[must_use]
    pub const fn get(&self, status: TaskStatus) -> u64 {
        match status {
            TaskStatus::Pending => self.pending,
            TaskStatus::InProgress => self.in_progress,
            TaskStatus::Completed => self.completed,
            TaskStatus::Cancelled => self.cancelled,
            TaskStatus::Delegated => self.delegated,
            TaskStatus::Deleted => 0,
        }
    }
}

/// Filters for the visible task listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskListRequest {
    /// Text matched against title and description.
    pub search: Option<String>,
    /// Workflow status.
    pub status: Option<TaskStatus>,
    /// Priority.
    pub priority: Option<TaskPriority>,
    /// Task kind.
    pub kind: Option<TaskKind>,
    /// Creator.
    pub created_by: Option<UserId>,
    /// Directly assigned user.
    pub assigned_user: Option<UserId>,
    /// Assigned department.
    pub department_id: Option<DepartmentId>,
    /// Earliest due date.
    pub due_from: Option<DateTime<Utc>>,
    /// Latest due date.
    pub due_to: Option<DateTime<Utc>>,
    /// Sort column name; defaults to the creation time.
    pub sort_by: Option<String>,
    /// Sort direction.
    pub direction: SortDirection,
    /// One-based page number.
    pub page: Option<u32>,
    /// Page size.
    pub per_page: Option<u32>,
}

impl TaskListRequest {
    /// Creates an unfiltered request, newest first.
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

    /// Restricts to a workflow status.
    #[must_use]
    pub const fn with_status(mut self, status: TaskStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Restricts to a priority.
    #[must_use]
    pub const fn with_priority(mut self, priority: TaskPriority) -> Self {
        self.priority = Some(priority);
        self
    }

    /// Restricts to a task kind.
    #[must_use]
    pub const fn with_kind(mut self, kind: TaskKind) -> Self {
        self.kind = Some(kind);
        self
    }

    /// Restricts to tasks created by a user.
    #[must_use]
    pub const fn with_creator(mut self, user_id: UserId) -> Self {
        self.created_by = Some(user_id);
        self
    }

    /// Restricts to tasks assigned directly to a user.
    #[must_use]
    pub const fn with_assigned_user(mut self, user_id: UserId) -> Self {
        self.assigned_user = Some(user_id);
        self
    }

    /// Restricts to tasks assigned to a department.
    #[must_use]
    pub const fn with_department(mut self, department_id: DepartmentId) -> Self {
        self.department_id = Some(department_id);
        self
    }

    /// Restricts the due-date range.
    #[must_use]
    pub const fn with_due_between(
        mut self,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> Self {
        self.due_from = from;
        self.due_to = to;
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

/// Read-only task query service.
///
/// `ADMIN` actors see every task; the widening is decided by role alone and
/// applies equally to the dashboard and the listing.
#[derive(Clone)]
pub struct TaskQueryService<R, D>
where
    R: TaskRepository,
    D: UserDirectory + DepartmentDirectory,
{
    repository: Arc<R>,
    directory: Arc<D>,
    policy: TaskPolicy,
}

impl<R, D> TaskQueryService<R, D>
where
    R: TaskRepository,
    D: UserDirectory + DepartmentDirectory,
{
    /// Creates a new query service with the default policy.
    #[must_use]
    pub fn new(repository: Arc<R>, directory: Arc<D>) -> Self {
        Self {
            repository,
            directory,
            policy: TaskPolicy::default(),
        }
    }

    /// Replaces the policy.
    #[must_use]
    pub const fn with_policy(mut self, policy: TaskPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Builds the actor's dashboard.
    ///
    /// # Errors
    ///
    /// Returns a not-found error when a non-admin actor is unknown to the
    /// user directory, or any lookup error.
    pub async fn dashboard(&self, actor: &Actor) -> TaskServiceResult<Dashboard> {
        let widened = actor.is_admin();
        let profile = if widened {
            None
        } else {
            Some(require_profile(&*self.directory, actor).await?)
        };
        let me = profile.as_ref().map(|user| user.id);

        let personal = self
            .all(TaskFilter {
                created_by: me,
                kinds: vec![TaskKind::Personal],
                is_delegated: Some(false),
                ..TaskFilter::active()
            })
            .await?;
        let created_for_others = self
            .all(TaskFilter {
                created_by: me,
                kinds: NON_PERSONAL_KINDS.to_vec(),
                is_delegated: Some(false),
                ..TaskFilter::active()
            })
            .await?;
        let assigned_to_me = self
            .all(TaskFilter {
                assigned_user: me,
                kinds: vec![TaskKind::User],
                is_delegated: Some(false),
                ..TaskFilter::active()
            })
            .await?;
        let assigned_to_my_departments = self.department_bucket(profile.as_ref()).await?;
        let delegated_by_me = self
            .all(TaskFilter {
                delegated_by: me,
                delegated_child: Some(true),
                ..TaskFilter::active()
            })
            .await?;
        let delegated_to_me = self
            .all(TaskFilter {
                assigned_user: me,
                delegated_child: Some(true),
                ..TaskFilter::active()
            })
            .await?;

        debug!(actor = %actor.user_id, widened, "dashboard built");
        Ok(Dashboard {
            personal,
            created_for_others,
            assigned_to_me,
            assigned_to_my_departments,
            delegated_by_me,
            delegated_to_me,
        })
    }

    /// Lists the tasks visible to the actor.
    ///
    /// Non-admin actors see tasks they created, tasks assigned to them, and
    /// tasks assigned to one of their departments.
    ///
    /// # Errors
    ///
    /// Returns an error when the sort column is not on the allow-list, the
    /// due-date range is inverted, or a lookup fails.
    pub async fn list_tasks(
        &self,
        actor: &Actor,
        request: TaskListRequest,
    ) -> TaskServiceResult<TaskPage> {
        let field = request
            .sort_by
            .as_deref()
            .map(SortField::try_from)
            .transpose()?
            .unwrap_or_default();
        let due = DateRange::new(request.due_from, request.due_to)?;
        let visible_to = if actor.is_admin() {
            None
        } else {
            let user = require_profile(&*self.directory, actor).await?;
            Some(VisibilityScope {
                user: user.id,
                departments: user.department_ids().collect(),
            })
        };

        let filter = TaskFilter {
            visible_to,
            search: request.search,
            statuses: request.status.into_iter().collect(),
            priority: request.priority,
            kinds: request.kind.into_iter().collect(),
            created_by: request.created_by,
            assigned_user: request.assigned_user,
            assigned_departments: request.department_id.into_iter().collect(),
            due,
            ..TaskFilter::active()
        };
        let query = TaskQuery::new(filter)
            .with_sort(TaskSort::new(field, request.direction))
            .with_page(self.policy.page(request.page, request.per_page));
        Ok(self.repository.list(&query).await?)
    }

    /// Counts the tasks assigned to a department by status.
    ///
    /// # Errors
    ///
    /// Returns any repository error.
    pub async fn status_counts_for_department(
        &self,
        department_id: DepartmentId,
    ) -> TaskServiceResult<StatusCounts> {
        let tasks = self.tasks_for_department(department_id).await?;
        Ok(StatusCounts::tally(&tasks))
    }

    /// Counts the tasks assigned directly to a user by status.
    ///
    /// # Errors
    ///
    /// Returns any repository error.
    pub async fn status_counts_for_user(&self, user_id: UserId) -> TaskServiceResult<StatusCounts> {
        let tasks = self.tasks_for_user(user_id).await?;
        Ok(StatusCounts::tally(&tasks))
    }

    /// Lists the tasks assigned to a department.
    ///
    /// # Errors
    ///
    /// Returns any repository error.
    pub async fn tasks_for_department(
        &self,
        department_id: DepartmentId,
    ) -> TaskServiceResult<Vec<Task>> {
        self.all(TaskFilter {
            assigned_departments: vec![department_id],
            ..TaskFilter::active()
        })
        .await
    }

    /// Lists the tasks assigned to a province directly or through one of its
    /// departments.
    ///
    /// # Errors
    ///
    /// Returns any directory or repository error.
    pub async fn tasks_for_province(&self, province_id: ProvinceId) -> TaskServiceResult<Vec<Task>> {
        let departments = self
            .directory
            .find_departments_by_province(province_id)
            .await?
            .into_iter()
            .map(|department| department.id)
            .collect();
        self.all(TaskFilter {
            province: Some(ProvinceScope {
                province: province_id,
                departments,
            }),
            ..TaskFilter::active()
        })
        .await
    }

    /// Lists the tasks assigned directly to a user.
    ///
    /// # Errors
    ///
    /// Returns any repository error.
    pub async fn tasks_for_user(&self, user_id: UserId) -> TaskServiceResult<Vec<Task>> {
        self.all(TaskFilter {
            assigned_user: Some(user_id),
            ..TaskFilter::active()
        })
        .await
    }

    /// Returns every assignee of a task, each once, ordered by id.
    ///
    /// Department members count only when they would pass the assignee check,
    /// so province-scoped tasks skip members of a department from another
    /// province.
    ///
    /// # Errors
    ///
    /// Returns a not-found error when the task does not exist, or any lookup
    /// error.
    pub async fn resolve_assignees(&self, task_id: TaskId) -> TaskServiceResult<Vec<User>> {
        let task = load_task(&*self.repository, task_id).await?;
        let assignment = task.assignment();
        let mut candidates: BTreeMap<UserId, User> = BTreeMap::new();

        let direct = assignment.user_ids();
        if !direct.is_empty() {
            for user in self.directory.find_users(&direct).await? {
                candidates.insert(user.id, user);
            }
        }
        for department_id in assignment.department_ids() {
            for user in self.directory.find_users_by_department(department_id).await? {
                candidates.entry(user.id).or_insert(user);
            }
        }

        Ok(candidates
            .into_values()
            .filter(|user| PermissionEvaluator::is_assignee(&task, user))
            .collect())
    }

    async fn department_bucket(&self, profile: Option<&User>) -> TaskServiceResult<Vec<Task>> {
        let Some(user) = profile else {
            return self
                .all(TaskFilter {
                    kinds: DEPARTMENTAL_KINDS.to_vec(),
                    is_delegated: Some(false),
                    ..TaskFilter::active()
                })
                .await;
        };
        let departments: Vec<DepartmentId> = user.department_ids().collect();
        if departments.is_empty() {
            return Ok(Vec::new());
        }
        let mut tasks = self
            .all(TaskFilter {
                kinds: DEPARTMENTAL_KINDS.to_vec(),
                assigned_departments: departments,
                is_delegated: Some(false),
                ..TaskFilter::active()
            })
            .await?;
        tasks.retain(|task| PermissionEvaluator::is_assignee(task, user));
        Ok(tasks)
    }

    /// Returns every match, newest first.
    async fn all(&self, filter: TaskFilter) -> TaskServiceResult<Vec<Task>> {
        let query = TaskQuery::new(filter)
            .with_sort(TaskSort::new(SortField::CreatedAt, SortDirection::Desc));
        Ok(self.repository.list(&query).await?.items)
    }
}
