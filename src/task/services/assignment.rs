//! Assignment resolution against the organisation directories.

use super::error::TaskServiceResult;
use crate::task::{
    domain::{
        Assignment, AssignmentViolation, DepartmentId, MissingEntity, ProvinceId, UserId,
    },
    ports::{DepartmentDirectory, ProvinceDirectory, UserDirectory},
};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::debug;

/// Requested assignment targets, as supplied by the caller.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssignmentRequest {
    /// Users to assign directly.
    pub user_ids: Vec<UserId>,
    /// Departments to assign.
    pub department_ids: Vec<DepartmentId>,
    /// Province scoping the departments.
    pub province_id: Option<ProvinceId>,
}

impl AssignmentRequest {
    /// Creates an empty request, which resolves to a personal task.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the users to assign.
    #[must_use]
    pub fn with_users(mut self, user_ids: impl IntoIterator<Item = UserId>) -> Self {
        self.user_ids = user_ids.into_iter().collect();
        self
    }

    /// Sets the departments to assign.
    #[must_use]
    pub fn with_departments(mut self, department_ids: impl IntoIterator<Item = DepartmentId>) -> Self {
        self.department_ids = department_ids.into_iter().collect();
        self
    }

    /// Scopes the departments to a province.
    #[must_use]
    pub const fn with_province(mut self, province_id: ProvinceId) -> Self {
        self.province_id = Some(province_id);
        self
    }
}

/// Classifies an assignment request and validates every target.
///
/// Shape rules are checked before any lookup. Lookups report every missing
/// identifier at once so nothing is half-assigned.
#[derive(Clone)]
pub struct AssignmentResolver<D>
where
    D: UserDirectory + DepartmentDirectory + ProvinceDirectory,
{
    directory: Arc<D>,
}

impl<D> AssignmentResolver<D>
where
    D: UserDirectory + DepartmentDirectory + ProvinceDirectory,
{
    /// Creates a resolver reading the given directory.
    #[must_use]
    pub const fn new(directory: Arc<D>) -> Self {
        Self { directory }
    }

    /// Resolves the request into a validated assignment.
    ///
    /// An empty request makes `creator` the sole assignee.
    ///
    /// # Errors
    ///
    /// Returns an invalid-assignment error for a forbidden combination of
    /// targets or departments outside the province, and a not-found error
    /// listing every user, department, or province that does not exist.
    pub async fn resolve(
        &self,
        request: &AssignmentRequest,
        creator: UserId,
    ) -> TaskServiceResult<Assignment> {
        let users: BTreeSet<UserId> = request.user_ids.iter().copied().collect();
        let departments: BTreeSet<DepartmentId> =
            request.department_ids.iter().copied().collect();

        if !users.is_empty() && !departments.is_empty() {
            return Err(AssignmentViolation::UsersAndDepartments.into());
        }
        if !users.is_empty() && request.province_id.is_some() {
            return Err(AssignmentViolation::UsersAndProvince.into());
        }
        if request.province_id.is_some() && departments.is_empty() {
            return Err(AssignmentViolation::ProvinceWithoutDepartments.into());
        }

        let assignment = if !users.is_empty() {
            self.require_users(&users).await?;
            Assignment::Users { users }
        } else if let Some(province) = request.province_id {
            self.resolve_province_departments(province, departments)
                .await?
        } else if !departments.is_empty() {
            self.require_departments(&departments).await?;
            Assignment::Departments { departments }
        } else {
            self.require_users(&BTreeSet::from([creator])).await?;
            Assignment::Personal { owner: creator }
        };

        debug!(kind = %assignment.kind(), creator = %creator, "assignment resolved");
        Ok(assignment)
    }

    async fn resolve_province_departments(
        &self,
        province: ProvinceId,
        departments: BTreeSet<DepartmentId>,
    ) -> TaskServiceResult<Assignment> {
        if self.directory.find_province(province).await?.is_none() {
            return Err(MissingEntity::Province(province).into());
        }
        let found = self.require_departments(&departments).await?;
        let outside: Vec<DepartmentId> = found
            .iter()
            .filter(|(_, linked)| *linked != Some(province))
            .map(|(id, _)| *id)
            .collect();
        if !outside.is_empty() {
            return Err(AssignmentViolation::DepartmentsOutsideProvince {
                province,
                departments: outside,
            }
            .into());
        }
        Ok(Assignment::ProvinceDepartments {
            province,
            departments,
        })
    }

    async fn require_users(&self, ids: &BTreeSet<UserId>) -> TaskServiceResult<()> {
        let requested: Vec<UserId> = ids.iter().copied().collect();
        let found = self.directory.find_users(&requested).await?;
        let missing = missing_ids(ids, found.iter().map(|user| user.id));
        if missing.is_empty() {
            Ok(())
        } else {
            Err(MissingEntity::Users(missing).into())
        }
    }

    /// Returns each found department with its province link, sorted by id.
    async fn require_departments(
        &self,
        ids: &BTreeSet<DepartmentId>,
    ) -> TaskServiceResult<Vec<(DepartmentId, Option<ProvinceId>)>> {
        let requested: Vec<DepartmentId> = ids.iter().copied().collect();
        let found = self.directory.find_departments(&requested).await?;
        let missing = missing_ids(ids, found.iter().map(|department| department.id));
        if !missing.is_empty() {
            return Err(MissingEntity::Departments(missing).into());
        }
        let mut linked: Vec<(DepartmentId, Option<ProvinceId>)> = found
            .iter()
            .map(|department| (department.id, department.province_id))
            .collect();
        linked.sort_unstable_by_key(|(id, _)| *id);
        linked.dedup_by_key(|(id, _)| *id);
        Ok(linked)
    }
}

/// Returns the requested ids absent from `found`, in ascending order.
pub(super) fn missing_ids<T: Ord + Copy>(
    requested: &BTreeSet<T>,
    found_ids: impl IntoIterator<Item = T>,
) -> Vec<T> {
    let found: BTreeSet<T> = found_ids.into_iter().collect();
    requested.difference(&found).copied().collect()
}
