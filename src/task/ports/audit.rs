//! Audit log port.
//!
//! Records are handed over in the order operations happen; sinks must keep
//! that order per task so the history reads coherently.

use crate::task::domain::{TaskId, UserId};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Target type written on every task audit record.
pub const TASK_TARGET: &str = "Task";

/// Audited task operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    /// A task was created.
    TaskCreated,
    /// Title, description, or due date changed.
    TaskUpdated,
    /// Priority changed.
    TaskPriorityChanged,
    /// Status changed.
    TaskStatusChanged,
    /// Assignment replaced.
    TaskReassigned,
    /// Task delegated to new assignees.
    TaskDelegated,
    /// Task moved to the recycle bin.
    TaskSoftDeleted,
    /// Task restored from the recycle bin.
    TaskRestored,
    /// Task permanently removed.
    TaskHardDeleted,
}

impl AuditAction {
    /// Returns the canonical action name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::TaskCreated => "task_created",
            Self::TaskUpdated => "task_updated",
            Self::TaskPriorityChanged => "task_priority_changed",
            Self::TaskStatusChanged => "task_status_changed",
            Self::TaskReassigned => "task_reassigned",
            Self::TaskDelegated => "task_delegated",
            Self::TaskSoftDeleted => "task_soft_deleted",
            Self::TaskRestored => "task_restored",
            Self::TaskHardDeleted => "task_hard_deleted",
        }
    }
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Severity attached to an audit record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditStatus {
    /// Routine change.
    #[default]
    Success,
    /// Change operators should notice, such as a deletion.
    Warning,
    /// Failed operation.
    Failure,
}

/// One audit entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditRecord {
    /// Acting user.
    pub actor_id: UserId,
    /// Audited operation.
    pub action: AuditAction,
    /// Target type, always [`TASK_TARGET`].
    pub target: String,
    /// Target task.
    pub target_id: TaskId,
    /// Human-readable summary.
    pub details: String,
    /// Severity.
    pub status: AuditStatus,
    /// Structured context such as old and new values.
    pub metadata: serde_json::Value,
}

impl AuditRecord {
    /// Creates a successful task audit record with empty metadata.
    #[must_use]
    pub fn task(
        actor_id: UserId,
        action: AuditAction,
        target_id: TaskId,
        details: impl Into<String>,
    ) -> Self {
        Self {
            actor_id,
            action,
            target: TASK_TARGET.to_owned(),
            target_id,
            details: details.into(),
            status: AuditStatus::Success,
            metadata: serde_json::Value::Null,
        }
    }

    /// Sets the severity.
    #[must_use]
    pub const fn with_status(mut self, status: AuditStatus) -> Self {
        self.status = status;
        self
    }

    /// Sets the structured context.
    #[must_use]
    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = metadata;
        self
    }
}

/// Audit sink contract.
#[async_trait]
pub trait AuditLog: Send + Sync {
    /// Records one entry.
    ///
    /// # Errors
    ///
    /// Returns [`AuditLogError::Unavailable`] when the sink rejects the entry.
    async fn record(&self, record: AuditRecord) -> Result<(), AuditLogError>;
}

/// Errors returned by audit sinks.
#[derive(Debug, Clone, Error)]
pub enum AuditLogError {
    /// The sink could not accept the record.
    #[error("audit log unavailable: {0}")]
    Unavailable(Arc<dyn std::error::Error + Send + Sync>),
}

impl AuditLogError {
    /// Wraps a sink error.
    pub fn unavailable(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Unavailable(Arc::new(err))
    }
}
