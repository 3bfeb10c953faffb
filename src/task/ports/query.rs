//! Storage-agnostic task query model.
//!
//! Adapters translate [`TaskQuery`] into their native query language. The
//! in-memory adapter evaluates [`TaskFilter::matches`] directly, so the
//! predicate here is the reference semantics for every adapter.

use crate::task::domain::{
    DepartmentId, ProvinceId, Task, TaskId, TaskKind, TaskPriority, TaskStatus, UserId,
    ValidationFailure,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Which side of the recycle bin a query reads.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DeletionScope {
    /// Tasks outside the recycle bin.
    #[default]
    Active,
    /// Tasks in the recycle bin.
    RecycleBin,
}

/// Restricts results to tasks a user can see without elevated rights.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VisibilityScope {
    /// The viewing user. Tasks they created or are directly assigned match.
    pub user: UserId,
    /// The viewer's departments. Tasks assigned to any of them match.
    pub departments: Vec<DepartmentId>,
}

/// Restricts results to tasks belonging to a province.
///
/// A task belongs to a province when it is assigned to the province directly
/// or to one of the province's departments.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProvinceScope {
    /// The province.
    pub province: ProvinceId,
    /// Departments linked to the province.
    pub departments: Vec<DepartmentId>,
}

/// Inclusive timestamp range with open ends.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateRange {
    /// Lower bound.
    pub from: Option<DateTime<Utc>>,
    /// Upper bound.
    pub to: Option<DateTime<Utc>>,
}

impl DateRange {
    /// Creates a range from optional bounds.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationFailure::InvertedDateRange`] when `from` is after
    /// `to`.
    pub fn new(
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> Result<Self, ValidationFailure> {
        if let (Some(start), Some(end)) = (from, to)
            && start > end
        {
            return Err(ValidationFailure::InvertedDateRange);
        }
        Ok(Self { from, to })
    }

    /// Returns `true` when neither bound is set.
    #[must_use]
    pub const fn is_unbounded(&self) -> bool {
        self.from.is_none() && self.to.is_none()
    }

    /// Tests an optional timestamp. A missing timestamp only matches an
    /// unbounded range.
    #[must_use]
    pub fn contains(&self, value: Option<DateTime<Utc>>) -> bool {
        if self.is_unbounded() {
            return true;
        }
        value.is_some_and(|timestamp| {
            self.from.is_none_or(|start| timestamp >= start)
                && self.to.is_none_or(|end| timestamp <= end)
        })
    }
}

/// Conjunctive task filter. Unset fields do not constrain the result.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskFilter {
    /// Recycle-bin side.
    pub deletion: DeletionScope,
    /// Visibility restriction for non-admin viewers.
    pub visible_to: Option<VisibilityScope>,
    /// Creator.
    pub created_by: Option<UserId>,
    /// Allowed task kinds. Empty allows every kind.
    pub kinds: Vec<TaskKind>,
    /// Directly assigned user.
    pub assigned_user: Option<UserId>,
    /// Assigned to any of these departments. Empty does not constrain.
    pub assigned_departments: Vec<DepartmentId>,
    /// Province membership.
    pub province: Option<ProvinceScope>,
    /// Delegating user.
    pub delegated_by: Option<UserId>,
    /// Delegation flag.
    pub is_delegated: Option<bool>,
    /// Delegation parent.
    pub delegated_from: Option<TaskId>,
    /// `true` keeps only delegated children, `false` drops them. Children
    /// are recognised by their delegating user, which outlives the parent.
    pub delegated_child: Option<bool>,
    /// Allowed workflow statuses. Empty allows every status.
    pub statuses: Vec<TaskStatus>,
    /// Priority.
    pub priority: Option<TaskPriority>,
    /// Case-insensitive text matched against title and description, and
    /// against the deletion reason inside the recycle bin.
    pub search: Option<String>,
    /// Due-date range.
    pub due: DateRange,
    /// Deleting user.
    pub deleted_by: Option<UserId>,
    /// Deletion-date range.
    pub deleted: DateRange,
}

impl TaskFilter {
    /// Creates a filter over tasks outside the recycle bin.
    #[must_use]
    pub fn active() -> Self {
        Self::default()
    }

    /// Creates a filter over tasks in the recycle bin.
    #[must_use]
    pub fn recycle_bin() -> Self {
        Self {
            deletion: DeletionScope::RecycleBin,
            ..Self::default()
        }
    }

    /// Returns `true` when the task satisfies every constraint.
    #[must_use]
    pub fn matches(&self, task: &Task) -> bool {
        self.matches_lifecycle(task)
            && self.matches_ownership(task)
            && self.matches_delegation(task)
            && self.matches_text(task)
    }

    fn matches_lifecycle(&self, task: &Task) -> bool {
        let in_bin = task.is_deleted();
        let scope_ok = match self.deletion {
            DeletionScope::Active => !in_bin,
            DeletionScope::RecycleBin => in_bin,
        };
        scope_ok
            && (self.statuses.is_empty() || self.statuses.contains(&task.workflow_status()))
            && self.priority.is_none_or(|priority| task.priority() == priority)
            && self.due.contains(task.due_date())
            && self.deleted.contains(task.deleted_at())
            && self
                .deleted_by
                .is_none_or(|user| task.deleted_by() == Some(user))
    }

    fn matches_ownership(&self, task: &Task) -> bool {
        let assignment = task.assignment();
        self.created_by.is_none_or(|user| task.created_by() == user)
            && (self.kinds.is_empty() || self.kinds.contains(&task.kind()))
            && self
                .assigned_user
                .is_none_or(|user| assignment.has_user(user))
            && (self.assigned_departments.is_empty()
                || self
                    .assigned_departments
                    .iter()
                    .any(|department| assignment.has_department(*department)))
            && self.province.as_ref().is_none_or(|scope| {
                assignment.province_id() == Some(scope.province)
                    || scope
                        .departments
                        .iter()
                        .any(|department| assignment.has_department(*department))
            })
            && self.visible_to.as_ref().is_none_or(|scope| {
                task.created_by() == scope.user
                    || assignment.has_user(scope.user)
                    || scope
                        .departments
                        .iter()
                        .any(|department| assignment.has_department(*department))
            })
    }

    fn matches_delegation(&self, task: &Task) -> bool {
        self.delegated_by
            .is_none_or(|user| task.delegated_by() == Some(user))
            && self
                .is_delegated
                .is_none_or(|flag| task.is_delegated() == flag)
            && self
                .delegated_from
                .is_none_or(|parent| task.delegated_from() == Some(parent))
            && self
                .delegated_child
                .is_none_or(|flag| task.delegated_by().is_some() == flag)
    }

    fn matches_text(&self, task: &Task) -> bool {
        let Some(text) = self
            .search
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
        else {
            return true;
        };
        let needle = text.to_lowercase();
        let contains = |haystack: &str| haystack.to_lowercase().contains(&needle);
        contains(task.title())
            || task.description().is_some_and(contains)
            || (self.deletion == DeletionScope::RecycleBin
                && task
                    .deletion_reason()
                    .is_some_and(|reason| contains(reason.as_str())))
    }
}

/// Sortable columns. Sorting is limited to this allow-list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortField {
    /// Creation timestamp.
    #[default]
    CreatedAt,
    /// Latest modification timestamp.
    UpdatedAt,
    /// Due date.
    DueDate,
    /// Title.
    Title,
    /// Priority.
    Priority,
    /// Workflow status.
    Status,
    /// Deletion timestamp.
    DeletedAt,
}

impl SortField {
    /// Returns the canonical column name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::CreatedAt => "created_at",
            Self::UpdatedAt => "updated_at",
            Self::DueDate => "due_date",
            Self::Title => "title",
            Self::Priority => "priority",
            Self::Status => "status",
            Self::DeletedAt => "deleted_at",
        }
    }

    /// Compares two tasks by this field in ascending order.
    #[must_use]
    pub fn compare(self, left: &Task, right: &Task) -> Ordering {
        match self {
            Self::CreatedAt => left.created_at().cmp(&right.created_at()),
            Self::UpdatedAt => left.updated_at().cmp(&right.updated_at()),
            Self::DueDate => left.due_date().cmp(&right.due_date()),
            Self::Title => left.title().cmp(right.title()),
            Self::Priority => left.priority().rank().cmp(&right.priority().rank()),
            Self::Status => left
                .workflow_status()
                .as_str()
                .cmp(right.workflow_status().as_str()),
            Self::DeletedAt => left.deleted_at().cmp(&right.deleted_at()),
        }
    }
}

impl fmt::Display for SortField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for SortField {
    type Error = ValidationFailure;

    /// Accepts snake case and camel case column names.
    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim() {
            "created_at" | "createdAt" => Ok(Self::CreatedAt),
            "updated_at" | "updatedAt" => Ok(Self::UpdatedAt),
            "due_date" | "dueDate" => Ok(Self::DueDate),
            "title" => Ok(Self::Title),
            "priority" => Ok(Self::Priority),
            "status" => Ok(Self::Status),
            "deleted_at" | "deletedAt" => Ok(Self::DeletedAt),
            _ => Err(ValidationFailure::UnknownSortField(value.to_owned())),
        }
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    /// Smallest first.
    Asc,
    /// Largest first.
    #[default]
    Desc,
}

/// Result ordering.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TaskSort {
    /// Column.
    pub field: SortField,
    /// Direction.
    pub direction: SortDirection,
}

impl TaskSort {
    /// Creates a sort order.
    #[must_use]
    pub const fn new(field: SortField, direction: SortDirection) -> Self {
        Self { field, direction }
    }

    /// Compares two tasks, breaking ties by task id for a stable order.
    #[must_use]
    pub fn compare(&self, left: &Task, right: &Task) -> Ordering {
        let ordering = self
            .field
            .compare(left, right)
            .then_with(|| left.id().cmp(&right.id()));
        match self.direction {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    }
}

/// One-based page request. Already clamped by the service layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    /// One-based page number.
    pub page: u32,
    /// Page size.
    pub per_page: u32,
}

impl PageRequest {
    /// Creates a page request.
    #[must_use]
    pub const fn new(page: u32, per_page: u32) -> Self {
        Self { page, per_page }
    }

    /// Returns the number of rows skipped before this page.
    #[must_use]
    pub fn offset(&self) -> u64 {
        u64::from(self.page.saturating_sub(1)) * u64::from(self.per_page)
    }
}

/// A filtered, sorted, optionally paginated task query.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskQuery {
    /// Filter.
    pub filter: TaskFilter,
    /// Ordering.
    pub sort: TaskSort,
    /// Page; `None` returns every match.
    pub page: Option<PageRequest>,
}

impl TaskQuery {
    /// Creates an unpaginated query with the default ordering.
    #[must_use]
    pub fn new(filter: TaskFilter) -> Self {
        Self {
            filter,
            sort: TaskSort::default(),
            page: None,
        }
    }

    /// Sets the ordering.
    #[must_use]
    pub const fn with_sort(mut self, sort: TaskSort) -> Self {
        self.sort = sort;
        self
    }

    /// Sets the page.
    #[must_use]
    pub const fn with_page(mut self, page: PageRequest) -> Self {
        self.page = Some(page);
        self
    }
}

/// One page of query results.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskPage {
    /// Tasks on this page.
    pub items: Vec<Task>,
    /// Number of matches across all pages.
    pub total: u64,
    /// One-based page number.
    pub page: u32,
    /// Page size; equals `total` for unpaginated queries.
    pub per_page: u32,
}

impl TaskPage {
    /// Returns the number of pages.
    #[must_use]
    pub fn total_pages(&self) -> u64 {
        if self.per_page == 0 {
            return 0;
        }
        self.total.div_ceil(u64::from(self.per_page))
    }
}
