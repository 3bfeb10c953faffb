//! Diesel row models for task persistence.

use super::schema::{task_department_assignees, task_user_assignees, tasks};
use chrono::{DateTime, Utc};
use diesel::prelude::*;

/// Query result row for task records.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = tasks)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct TaskRow {
    /// Internal task identifier.
    pub id: uuid::Uuid,
    /// Task title.
    pub title: String,
    /// Optional long description.
    pub description: Option<String>,
    /// Optional due date.
    pub due_date: Option<DateTime<Utc>>,
    /// Workflow status.
    pub status: String,
    /// Priority.
    pub priority: String,
    /// Assignment shape.
    pub kind: String,
    /// Province scope.
    pub province_id: Option<uuid::Uuid>,
    /// Creating user.
    pub created_by: uuid::Uuid,
    /// Delegation flag.
    pub is_delegated: bool,
    /// Delegating user.
    pub delegated_by: Option<uuid::Uuid>,
    /// Delegation parent.
    pub delegated_from: Option<uuid::Uuid>,
    /// Delegation note.
    pub delegation_reason: Option<String>,
    /// Completion timestamp.
    pub completed_at: Option<DateTime<Utc>>,
    /// Cancellation timestamp.
    pub cancelled_at: Option<DateTime<Utc>>,
    /// Cancelling user.
    pub cancelled_by: Option<uuid::Uuid>,
    /// Cancellation reason.
    pub cancellation_reason: Option<String>,
    /// Recycle-bin entry timestamp.
    pub deleted_at: Option<DateTime<Utc>>,
    /// Deleting user.
    pub deleted_by: Option<uuid::Uuid>,
    /// Deletion reason.
    pub deletion_reason: Option<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Insert and update model for task records.
///
/// `None` fields are written as `NULL` on update so cleared values persist.
#[derive(Debug, Clone, Insertable, AsChangeset)]
#[diesel(table_name = tasks)]
#[diesel(treat_none_as_null = true)]
pub struct NewTaskRow {
    /// Internal task identifier.
    pub id: uuid::Uuid,
    /// Task title.
    pub title: String,
    /// Optional long description.
    pub description: Option<String>,
    /// Optional due date.
    pub due_date: Option<DateTime<Utc>>,
    /// Workflow status.
    pub status: String,
    /// Priority.
    pub priority: String,
    /// Assignment shape.
    pub kind: String,
    /// Province scope.
    pub province_id: Option<uuid::Uuid>,
    /// Creating user.
    pub created_by: uuid::Uuid,
    /// Delegation flag.
    pub is_delegated: bool,
    /// Delegating user.
    pub delegated_by: Option<uuid::Uuid>,
    /// Delegation parent.
    pub delegated_from: Option<uuid::Uuid>,
    /// Delegation note.
    pub delegation_reason: Option<String>,
    /// Completion timestamp.
    pub completed_at: Option<DateTime<Utc>>,
    /// Cancellation timestamp.
    pub cancelled_at: Option<DateTime<Utc>>,
    /// Cancelling user.
    pub cancelled_by: Option<uuid::Uuid>,
    /// Cancellation reason.
    pub cancellation_reason: Option<String>,
    /// Recycle-bin entry timestamp.
    pub deleted_at: Option<DateTime<Utc>>,
    /// Deleting user.
    pub deleted_by: Option<uuid::Uuid>,
    /// Deletion reason.
    pub deletion_reason: Option<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// One direct user assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Queryable, Selectable, Insertable)]
#[diesel(table_name = task_user_assignees)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct UserAssigneeRow {
    /// Assigned task.
    pub task_id: uuid::Uuid,
    /// Assigned user.
    pub user_id: uuid::Uuid,
}

/// One department assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Queryable, Selectable, Insertable)]
#[diesel(table_name = task_department_assignees)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct DepartmentAssigneeRow {
    /// Assigned task.
    pub task_id: uuid::Uuid,
    /// Assigned department.
    pub department_id: uuid::Uuid,
}
