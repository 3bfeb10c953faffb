//! In-memory organisation directory.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard};

use crate::task::{
    domain::{Department, DepartmentId, Province, ProvinceId, User, UserId},
    ports::{
        DepartmentDirectory, DirectoryError, DirectoryResult, ProvinceDirectory, UserDirectory,
    },
};

/// Thread-safe directory of users, departments, and provinces.
///
/// Implements all three directory ports so services can share one instance.
#[derive(Debug, Clone, Default)]
pub struct InMemoryDirectory {
    state: Arc<RwLock<DirectoryState>>,
}

#[derive(Debug, Default)]
struct DirectoryState {
    users: HashMap<UserId, User>,
    departments: HashMap<DepartmentId, Department>,
    provinces: HashMap<ProvinceId, Province>,
}

impl InMemoryDirectory {
    /// Creates an empty directory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a user.
    ///
    /// # Errors
    ///
    /// Returns [`DirectoryError::Unavailable`] when the lock is poisoned.
    pub fn insert_user(&self, user: User) -> DirectoryResult<()> {
        self.write(|state| {
            state.users.insert(user.id, user);
        })
    }

    /// Adds or replaces a department.
    ///
    /// # Errors
    ///
    /// Returns [`DirectoryError::Unavailable`] when the lock is poisoned.
    pub fn insert_department(&self, department: Department) -> DirectoryResult<()> {
        self.write(|state| {
            state.departments.insert(department.id, department);
        })
    }

    /// Adds or replaces a province.
    ///
    /// # Errors
    ///
    /// Returns [`DirectoryError::Unavailable`] when the lock is poisoned.
    pub fn insert_province(&self, province: Province) -> DirectoryResult<()> {
        self.write(|state| {
            state.provinces.insert(province.id, province);
        })
    }

    fn read(&self) -> DirectoryResult<RwLockReadGuard<'_, DirectoryState>> {
        self.state
            .read()
            .map_err(|err| DirectoryError::unavailable(std::io::Error::other(err.to_string())))
    }

    fn write(&self, apply: impl FnOnce(&mut DirectoryState)) -> DirectoryResult<()> {
        let mut state = self
            .state
            .write()
            .map_err(|err| DirectoryError::unavailable(std::io::Error::other(err.to_string())))?;
        apply(&mut state);
        Ok(())
    }
}

#[async_trait]
impl UserDirectory for InMemoryDirectory {
    async fn find_user(&self, id: UserId) -> DirectoryResult<Option<User>> {
        Ok(self.read()?.users.get(&id).cloned())
    }

    async fn find_users(&self, ids: &[UserId]) -> DirectoryResult<Vec<User>> {
        let state = self.read()?;
        Ok(ids
            .iter()
            .filter_map(|id| state.users.get(id).cloned())
            .collect())
    }

    async fn find_users_by_department(
        &self,
        department_id: DepartmentId,
    ) -> DirectoryResult<Vec<User>> {
        let state = self.read()?;
        let mut members: Vec<User> = state
            .users
            .values()
            .filter(|user| user.is_member_of(department_id))
            .cloned()
            .collect();
        members.sort_by_key(|user| user.id);
        Ok(members)
    }
}

#[async_trait]
impl DepartmentDirectory for InMemoryDirectory {
    async fn find_department(&self, id: DepartmentId) -> DirectoryResult<Option<Department>> {
        Ok(self.read()?.departments.get(&id).cloned())
    }

    async fn find_departments(&self, ids: &[DepartmentId]) -> DirectoryResult<Vec<Department>> {
        let state = self.read()?;
        Ok(ids
            .iter()
            .filter_map(|id| state.departments.get(id).cloned())
            .collect())
    }

    async fn find_departments_by_province(
        &self,
        province_id: ProvinceId,
    ) -> DirectoryResult<Vec<Department>> {
        let state = self.read()?;
        let mut departments: Vec<Department> = state
            .departments
            .values()
            .filter(|department| department.province_id == Some(province_id))
            .cloned()
            .collect();
        departments.sort_by_key(|department| department.id);
        Ok(departments)
    }
}

#[async_trait]
impl ProvinceDirectory for InMemoryDirectory {
    async fn find_province(&self, id: ProvinceId) -> DirectoryResult<Option<Province>> {
        Ok(self.read()?.provinces.get(&id).cloned())
    }
}
