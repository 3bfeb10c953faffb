//! Read models for the users, departments, and provinces the task engine
//! references but never owns.

use super::{DepartmentId, ParseRoleError, ProvinceId, UserId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Account role granted by the identity provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    /// Regular departmental staff.
    User,
    /// System administrator.
    Admin,
    /// Organisational leadership with broad oversight rights.
    Leadership,
}

impl Role {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::User => "USER",
            Self::Admin => "ADMIN",
            Self::Leadership => "LEADERSHIP",
        }
    }

    /// Returns `true` for roles that may act on any task regardless of
    /// creatorship or assignment.
    #[must_use]
    pub const fn is_privileged(self) -> bool {
        matches!(self, Self::Admin | Self::Leadership)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for Role {
    type Error = ParseRoleError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_uppercase();
        match normalized.as_str() {
            "USER" => Ok(Self::User),
            "ADMIN" => Ok(Self::Admin),
            "LEADERSHIP" => Ok(Self::Leadership),
            _ => Err(ParseRoleError(value.to_owned())),
        }
    }
}

/// A user's membership of one department, joined with the department's
/// province so assignee checks never need a second lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DepartmentMembership {
    /// Department the user belongs to.
    pub department_id: DepartmentId,
    /// Province the department is linked to, if any.
    pub province_id: Option<ProvinceId>,
}

impl DepartmentMembership {
    /// Creates a membership record.
    #[must_use]
    pub const fn new(department_id: DepartmentId, province_id: Option<ProvinceId>) -> Self {
        Self {
            department_id,
            province_id,
        }
    }
}

/// User account as exposed by the user directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// User identifier.
    pub id: UserId,
    /// Login name.
    pub username: String,
    /// Contact address.
    pub email: String,
    /// Granted role.
    pub role: Role,
    /// Department memberships with province linkage.
    pub departments: Vec<DepartmentMembership>,
}

impl User {
    /// Creates a user without department memberships.
    #[must_use]
    pub fn new(
        id: UserId,
        username: impl Into<String>,
        email: impl Into<String>,
        role: Role,
    ) -> Self {
        Self {
            id,
            username: username.into(),
            email: email.into(),
            role,
            departments: Vec::new(),
        }
    }

    /// Sets department memberships.
    #[must_use]
    pub fn with_departments(
        mut self,
        memberships: impl IntoIterator<Item = DepartmentMembership>,
    ) -> Self {
        self.departments = memberships.into_iter().collect();
        self
    }

    /// Returns the identifiers of every department the user belongs to.
    pub fn department_ids(&self) -> impl Iterator<Item = DepartmentId> + '_ {
        self.departments.iter().map(|membership| membership.department_id)
    }

    /// Returns `true` when the user belongs to the department.
    #[must_use]
    pub fn is_member_of(&self, department_id: DepartmentId) -> bool {
        self.department_ids().any(|id| id == department_id)
    }
}

/// Department as exposed by the department directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Department {
    /// Department identifier.
    pub id: DepartmentId,
    /// Display name.
    pub name: String,
    /// Optional department head.
    pub head_id: Option<UserId>,
    /// Province the department belongs to.
    pub province_id: Option<ProvinceId>,
}

impl Department {
    /// Creates a department without a head or province.
    #[must_use]
    pub fn new(id: DepartmentId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            head_id: None,
            province_id: None,
        }
    }

    /// Links the department to a province.
    #[must_use]
    pub const fn in_province(mut self, province_id: ProvinceId) -> Self {
        self.province_id = Some(province_id);
        self
    }

    /// Sets the department head.
    #[must_use]
    pub const fn with_head(mut self, head_id: UserId) -> Self {
        self.head_id = Some(head_id);
        self
    }

    /// Returns the membership record a member of this department carries.
    #[must_use]
    pub const fn membership(&self) -> DepartmentMembership {
        DepartmentMembership::new(self.id, self.province_id)
    }
}

/// Province as exposed by the province directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Province {
    /// Province identifier.
    pub id: ProvinceId,
    /// Display name.
    pub name: String,
}

impl Province {
    /// Creates a province record.
    #[must_use]
    pub fn new(id: ProvinceId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}
