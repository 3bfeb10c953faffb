//! Read-only directory ports for users, departments, and provinces.
//!
//! The records are owned by account provisioning and organisation management;
//! task services only read them.

use crate::task::domain::{Department, DepartmentId, Province, ProvinceId, User, UserId};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for directory lookups.
pub type DirectoryResult<T> = Result<T, DirectoryError>;

/// User directory contract.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Finds a user with their department memberships.
    async fn find_user(&self, id: UserId) -> DirectoryResult<Option<User>>;

    /// Finds the users that exist among `ids`. Missing ids are skipped.
    async fn find_users(&self, ids: &[UserId]) -> DirectoryResult<Vec<User>>;

    /// Returns the members of a department.
    async fn find_users_by_department(
        &self,
        department_id: DepartmentId,
    ) -> DirectoryResult<Vec<User>>;
}

/// Department directory contract.
#[async_trait]
pub trait DepartmentDirectory: Send + Sync {
    /// Finds a department.
    async fn find_department(&self, id: DepartmentId) -> DirectoryResult<Option<Department>>;

    /// Finds the departments that exist among `ids`. Missing ids are skipped.
    async fn find_departments(&self, ids: &[DepartmentId]) -> DirectoryResult<Vec<Department>>;

    /// Returns the departments linked to a province.
    async fn find_departments_by_province(
        &self,
        province_id: ProvinceId,
    ) -> DirectoryResult<Vec<Department>>;
}

/// Province directory contract.
#[async_trait]
pub trait ProvinceDirectory: Send + Sync {
    /// Finds a province.
    async fn find_province(&self, id: ProvinceId) -> DirectoryResult<Option<Province>>;
}

/// Errors returned by directory implementations.
#[derive(Debug, Clone, Error)]
pub enum DirectoryError {
    /// The directory could not be reached or answered with a failure.
    #[error("directory unavailable: {0}")]
    Unavailable(Arc<dyn std::error::Error + Send + Sync>),
}

impl DirectoryError {
    /// Wraps a backend error.
    pub fn unavailable(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Unavailable(Arc::new(err))
    }
}
