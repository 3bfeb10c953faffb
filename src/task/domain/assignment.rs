//! Assignment shapes.
//!
//! A task is assigned to exactly one of: its creator alone, a set of users, a
//! set of departments, or a set of departments scoped to a province. The
//! [`Assignment`] enum makes the other shapes unrepresentable for a given
//! task, and [`TaskKind`] is always derived from it.

use super::{
    AssignmentViolation, DepartmentId, ParseTaskKindError, ProvinceId, TaskDomainError, UserId,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Classification of a task's assignment shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    /// Assigned to the creator only.
    Personal,
    /// Assigned to an explicit set of users.
    User,
    /// Assigned to one or more departments.
    Department,
    /// Assigned to departments within one province.
    ProvinceDepartment,
}

impl TaskKind {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Personal => "personal",
            Self::User => "user",
            Self::Department => "department",
            Self::ProvinceDepartment => "province_department",
        }
    }

    /// Returns `true` for kinds whose performers are department members.
    #[must_use]
    pub const fn is_departmental(self) -> bool {
        matches!(self, Self::Department | Self::ProvinceDepartment)
    }
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for TaskKind {
    type Error = ParseTaskKindError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "personal" => Ok(Self::Personal),
            "user" => Ok(Self::User),
            "department" => Ok(Self::Department),
            "province_department" => Ok(Self::ProvinceDepartment),
            _ => Err(ParseTaskKindError(value.to_owned())),
        }
    }
}

/// Validated assignment of a task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Assignment {
    /// The creator is the sole assignee.
    Personal {
        /// The creator.
        owner: UserId,
    },
    /// Explicit user assignees.
    Users {
        /// Non-empty assignee set.
        users: BTreeSet<UserId>,
    },
    /// Department assignees.
    Departments {
        /// Non-empty department set.
        departments: BTreeSet<DepartmentId>,
    },
    /// Department assignees scoped to a province.
    ProvinceDepartments {
        /// Province every department belongs to.
        province: ProvinceId,
        /// Non-empty department set.
        departments: BTreeSet<DepartmentId>,
    },
}

impl Assignment {
    /// Reconstructs an assignment from its stored parts, rejecting shapes that
    /// do not match the stored kind.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::InvalidAssignment`] when the parts do not
    /// form a valid assignment for `kind`.
    pub fn from_parts(
        kind: TaskKind,
        users: BTreeSet<UserId>,
        departments: BTreeSet<DepartmentId>,
        province: Option<ProvinceId>,
    ) -> Result<Self, TaskDomainError> {
        let inconsistent = || {
            TaskDomainError::InvalidAssignment(AssignmentViolation::InconsistentShape(kind))
        };
        match kind {
            TaskKind::Personal => {
                let mut owners = users.into_iter();
                let owner = owners.next().ok_or_else(inconsistent)?;
                if owners.next().is_some() || !departments.is_empty() || province.is_some() {
                    return Err(inconsistent());
                }
                Ok(Self::Personal { owner })
            }
            TaskKind::User => {
                if users.is_empty() || !departments.is_empty() || province.is_some() {
                    return Err(inconsistent());
                }
                Ok(Self::Users { users })
            }
            TaskKind::Department => {
                if departments.is_empty() || !users.is_empty() || province.is_some() {
                    return Err(inconsistent());
                }
                Ok(Self::Departments { departments })
            }
            TaskKind::ProvinceDepartment => {
                let province_id = province.ok_or_else(inconsistent)?;
                if departments.is_empty() || !users.is_empty() {
                    return Err(inconsistent());
                }
                Ok(Self::ProvinceDepartments {
                    province: province_id,
                    departments,
                })
            }
        }
    }

    /// Creates an assignment of a single user. Used for delegated children.
    #[must_use]
    pub fn single_user(user: UserId) -> Self {
        Self::Users {
            users: BTreeSet::from([user]),
        }
    }

    /// Returns the task kind this assignment implies.
    #[must_use]
    pub const fn kind(&self) -> TaskKind {
        match self {
            Self::Personal { .. } => TaskKind::Personal,
            Self::Users { .. } => TaskKind::User,
            Self::Departments { .. } => TaskKind::Department,
            Self::ProvinceDepartments { .. } => TaskKind::ProvinceDepartment,
        }
    }

    /// Returns the directly assigned users.
    #[must_use]
    pub fn user_ids(&self) -> Vec<UserId> {
        match self {
            Self::Personal { owner } => vec![*owner],
            Self::Users { users } => users.iter().copied().collect(),
            Self::Departments { .. } | Self::ProvinceDepartments { .. } => Vec::new(),
        }
    }

    /// Returns `true` when the user is directly assigned.
    #[must_use]
    pub fn has_user(&self, user_id: UserId) -> bool {
        match self {
            Self::Personal { owner } => *owner == user_id,
            Self::Users { users } => users.contains(&user_id),
            Self::Departments { .. } | Self::ProvinceDepartments { .. } => false,
        }
    }

    /// Returns the assigned departments.
    pub fn department_ids(&self) -> impl Iterator<Item = DepartmentId> + '_ {
        let departments = match self {
            Self::Departments { departments } | Self::ProvinceDepartments { departments, .. } => {
                Some(departments)
            }
            Self::Personal { .. } | Self::Users { .. } => None,
        };
        departments.into_iter().flatten().copied()
    }

    /// Returns `true` when the department is assigned.
    #[must_use]
    pub fn has_department(&self, department_id: DepartmentId) -> bool {
        self.department_ids().any(|id| id == department_id)
    }

    /// Returns the province scope, if any.
    #[must_use]
    pub const fn province_id(&self) -> Option<ProvinceId> {
        match self {
            Self::ProvinceDepartments { province, .. } => Some(*province),
            Self::Personal { .. } | Self::Users { .. } | Self::Departments { .. } => None,
        }
    }
}
