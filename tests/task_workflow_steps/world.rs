//! Shared world state for task workflow BDD scenarios.

use std::collections::HashMap;
use std::sync::Arc;

use mockable::DefaultClock;
use rstest::fixture;
use taskdesk::task::{
    adapters::memory::{InMemoryAuditLog, InMemoryDirectory, InMemoryTaskRepository},
    domain::{Actor, Department, ProvinceId, Task, User, UserId},
    ports::TaskRepository,
    services::{
        RecycleBinService, TaskDelegationService, TaskLifecycleService, TaskServiceError,
        TaskServiceResult,
    },
};

/// Lifecycle service used by the BDD world.
pub type TestLifecycle =
    TaskLifecycleService<InMemoryTaskRepository, InMemoryDirectory, InMemoryAuditLog, DefaultClock>;
/// Delegation service used by the BDD world.
pub type TestDelegation =
    TaskDelegationService<InMemoryTaskRepository, InMemoryDirectory, InMemoryAuditLog, DefaultClock>;
/// Recycle bin service used by the BDD world.
pub type TestRecycleBin =
    RecycleBinService<InMemoryTaskRepository, InMemoryDirectory, InMemoryAuditLog, DefaultClock>;

/// Scenario world: an organisation built up by name, the services under
/// test, and the outcome of the last action.
pub struct WorkflowWorld {
    pub directory: Arc<InMemoryDirectory>,
    pub repository: Arc<InMemoryTaskRepository>,
    pub lifecycle: TestLifecycle,
    pub delegation: TestDelegation,
    pub recycle_bin: TestRecycleBin,
    pub provinces: HashMap<String, ProvinceId>,
    pub departments: HashMap<String, Department>,
    pub users: HashMap<String, User>,
    pub task: Option<Task>,
    pub unknown_user: Option<UserId>,
    pub last_result: Option<Result<(), TaskServiceError>>,
}

impl WorkflowWorld {
    /// Creates a world with an empty directory and task store.
    #[must_use]
    pub fn new() -> Self {
        let directory = Arc::new(InMemoryDirectory::new());
        let repository = Arc::new(InMemoryTaskRepository::new());
        let audit = Arc::new(InMemoryAuditLog::new());
        let clock = Arc::new(DefaultClock);

        Self {
            lifecycle: TaskLifecycleService::new(
                Arc::clone(&repository),
                Arc::clone(&directory),
                Arc::clone(&audit),
                Arc::clone(&clock),
            ),
            delegation: TaskDelegationService::new(
                Arc::clone(&repository),
                Arc::clone(&directory),
                Arc::clone(&audit),
                Arc::clone(&clock),
            ),
            recycle_bin: RecycleBinService::new(
                Arc::clone(&repository),
                Arc::clone(&directory),
                audit,
                clock,
            ),
            directory,
            repository,
            provinces: HashMap::new(),
            departments: HashMap::new(),
            users: HashMap::new(),
            task: None,
            unknown_user: None,
            last_result: None,
        }
    }

    /// Looks up a named user.
    pub fn user(&self, name: &str) -> Result<&User, eyre::Report> {
        self.users
            .get(name)
            .ok_or_else(|| eyre::eyre!("unknown user {name} in scenario world"))
    }

    /// Builds the acting identity for a named user.
    pub fn actor(&self, name: &str) -> Result<Actor, eyre::Report> {
        let user = self.user(name)?;
        Ok(Actor::new(user.id, user.role))
    }

    /// Looks up a named department.
    pub fn department(&self, name: &str) -> Result<&Department, eyre::Report> {
        self.departments
            .get(name)
            .ok_or_else(|| eyre::eyre!("unknown department {name} in scenario world"))
    }

    /// Looks up a named province.
    pub fn province(&self, name: &str) -> Result<ProvinceId, eyre::Report> {
        self.provinces
            .get(name)
            .copied()
            .ok_or_else(|| eyre::eyre!("unknown province {name} in scenario world"))
    }

    /// The task the scenario is working on.
    pub fn task(&self) -> Result<&Task, eyre::Report> {
        self.task
            .as_ref()
            .ok_or_else(|| eyre::eyre!("missing task in scenario world"))
    }

    /// Reads the current task back from the store.
    pub fn stored_task(&self) -> Result<Option<Task>, eyre::Report> {
        let task_id = self.task()?.id();
        run_async(self.repository.find_by_id(task_id))
            .map_err(|err| eyre::eyre!("task lookup failed: {err}"))
    }

    /// Remembers the outcome of an action, keeping the returned task.
    pub fn record(&mut self, result: TaskServiceResult<Task>) {
        self.last_result = Some(result.map(|task| {
            self.task = Some(task);
        }));
    }
}

impl Default for WorkflowWorld {
    fn default() -> Self {
        Self::new()
    }
}

/// Fixture that creates a new scenario world.
#[fixture]
pub fn world() -> WorkflowWorld {
    WorkflowWorld::default()
}

/// Runs an async operation within sync step definitions.
pub fn run_async<T>(future: impl std::future::Future<Output = T>) -> T {
    tokio::task::block_in_place(|| tokio::runtime::Handle::current().block_on(future))
}
