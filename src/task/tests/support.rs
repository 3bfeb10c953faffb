//! Shared fixtures: a small organisation and services wired to in-memory
//! adapters.

use std::sync::Arc;

use crate::task::{
    adapters::memory::{InMemoryAuditLog, InMemoryDirectory, InMemoryTaskRepository},
    domain::{
        Actor, Assignment, Department, DepartmentId, DepartmentMembership, Province, ProvinceId,
        Role, Task, TaskDraft, User, UserId,
    },
    ports::TaskRepository,
    services::{
        ErrorKind, RecycleBinService, TaskDelegationService, TaskLifecycleService,
        TaskQueryService, TaskServiceResult,
    },
};
use mockable::DefaultClock;
use rstest::fixture;

/// A deletion or cancellation reason long enough for the default policy.
pub(super) const REASON: &str = "Task no longer needed, duplicate entry";

pub(super) type Lifecycle =
    TaskLifecycleService<InMemoryTaskRepository, InMemoryDirectory, InMemoryAuditLog, DefaultClock>;
pub(super) type Delegation =
    TaskDelegationService<InMemoryTaskRepository, InMemoryDirectory, InMemoryAuditLog, DefaultClock>;
pub(super) type RecycleBin =
    RecycleBinService<InMemoryTaskRepository, InMemoryDirectory, InMemoryAuditLog, DefaultClock>;
pub(super) type Queries = TaskQueryService<InMemoryTaskRepository, InMemoryDirectory>;

/// Two provinces, three departments, and users in every role.
///
/// `north` and `south` belong to provinces `p1` and `p2`; `floating` has no
/// province.
pub(super) struct Org {
    pub directory: Arc<InMemoryDirectory>,
    pub p1: ProvinceId,
    pub p2: ProvinceId,
    pub north: DepartmentId,
    pub south: DepartmentId,
    pub floating: DepartmentId,
    pub creator: User,
    pub admin: User,
    pub leader: User,
    pub north_member: User,
    pub south_member: User,
    pub outsider: User,
}

impl Org {
    pub(super) fn new() -> Self {
        let directory = Arc::new(InMemoryDirectory::new());
        let p1 = ProvinceId::new();
        let p2 = ProvinceId::new();
        for (id, name) in [(p1, "Northern Province"), (p2, "Southern Province")] {
            directory
                .insert_province(Province::new(id, name))
                .expect("province insert");
        }

        let north = Department::new(DepartmentId::new(), "North Works").in_province(p1);
        let south = Department::new(DepartmentId::new(), "South Works").in_province(p2);
        let floating = Department::new(DepartmentId::new(), "Head Office");

        let creator = User::new(UserId::new(), "creator", "creator@example.org", Role::User);
        let admin = User::new(UserId::new(), "admin", "admin@example.org", Role::Admin);
        let leader = User::new(UserId::new(), "leader", "leader@example.org", Role::Leadership);
        let north_member = User::new(UserId::new(), "nora", "nora@example.org", Role::User)
            .with_departments([north.membership()]);
        let south_member = User::new(UserId::new(), "sam", "sam@example.org", Role::User)
            .with_departments([south.membership()]);
        let outsider = User::new(UserId::new(), "olly", "olly@example.org", Role::User);

        let org = Self {
            directory: Arc::clone(&directory),
            p1,
            p2,
            north: north.id,
            south: south.id,
            floating: floating.id,
            creator,
            admin,
            leader,
            north_member,
            south_member,
            outsider,
        };
        for department in [north, south, floating] {
            directory
                .insert_department(department)
                .expect("department insert");
        }
        for user in [
            &org.creator,
            &org.admin,
            &org.leader,
            &org.north_member,
            &org.south_member,
            &org.outsider,
        ] {
            directory.insert_user(user.clone()).expect("user insert");
        }
        org
    }

    /// Registers an extra user.
    pub(super) fn add_user(&self, username: &str, memberships: &[DepartmentMembership]) -> User {
        let user = User::new(
            UserId::new(),
            username,
            format!("{username}@example.org"),
            Role::User,
        )
        .with_departments(memberships.iter().copied());
        self.directory
            .insert_user(user.clone())
            .expect("user insert");
        user
    }
}

/// Builds the actor identity for a directory user.
pub(super) const fn actor(user: &User) -> Actor {
    Actor::new(user.id, user.role)
}

/// Builds an unsaved task with the given assignment.
pub(super) fn task_with(created_by: UserId, assignment: Assignment) -> Task {
    Task::new(
        TaskDraft::new("Inspect the water main"),
        created_by,
        assignment,
        &DefaultClock,
    )
    .expect("valid task")
}

/// Unwraps the failure of a service call and classifies it.
pub(super) fn error_kind<T: std::fmt::Debug>(result: TaskServiceResult<T>) -> ErrorKind {
    result.expect_err("operation should fail").kind()
}

/// Every service wired to the same in-memory adapters.
pub(super) struct Harness {
    pub org: Org,
    pub repository: Arc<InMemoryTaskRepository>,
    pub audit: Arc<InMemoryAuditLog>,
    pub lifecycle: Lifecycle,
    pub delegation: Delegation,
    pub recycle_bin: RecycleBin,
    pub queries: Queries,
}

impl Harness {
    /// Stores a task directly, bypassing assignment resolution.
    pub(super) async fn seed(&self, task: &Task) {
        self.repository.store(task).await.expect("seed task");
    }
}

#[fixture]
pub(super) fn harness() -> Harness {
    wired()
}

/// Wires a fresh organisation and empty adapters into every service.
pub(super) fn wired() -> Harness {
    let org = Org::new();
    let repository = Arc::new(InMemoryTaskRepository::new());
    let audit = Arc::new(InMemoryAuditLog::new());
    let clock = Arc::new(DefaultClock);
    Harness {
        lifecycle: TaskLifecycleService::new(
            Arc::clone(&repository),
            Arc::clone(&org.directory),
            Arc::clone(&audit),
            Arc::clone(&clock),
        ),
        delegation: TaskDelegationService::new(
            Arc::clone(&repository),
            Arc::clone(&org.directory),
            Arc::clone(&audit),
            Arc::clone(&clock),
        ),
        recycle_bin: RecycleBinService::new(
            Arc::clone(&repository),
            Arc::clone(&org.directory),
            Arc::clone(&audit),
            clock,
        ),
        queries: TaskQueryService::new(Arc::clone(&repository), Arc::clone(&org.directory)),
        org,
        repository,
        audit,
    }
}
