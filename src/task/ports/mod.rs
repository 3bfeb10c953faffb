//! Port contracts for task management.
//!
//! Ports define infrastructure-agnostic interfaces used by task services.

pub mod audit;
pub mod directory;
pub mod query;
pub mod repository;

pub use audit::{AuditAction, AuditLog, AuditLogError, AuditRecord, AuditStatus, TASK_TARGET};
pub use directory::{
    DepartmentDirectory, DirectoryError, DirectoryResult, ProvinceDirectory, UserDirectory,
};
pub use query::{
    DateRange, DeletionScope, PageRequest, ProvinceScope, SortDirection, SortField, TaskFilter,
    TaskPage, TaskQuery, TaskSort, VisibilityScope,
};
pub use repository::{TaskRepository, TaskRepositoryError, TaskRepositoryResult};
