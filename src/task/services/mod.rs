//! Application services for task orchestration.

mod assignment;
mod delegation;
mod error;
mod lifecycle;
mod policy;
mod query;
mod recycle_bin;
mod support;

pub use assignment::{AssignmentRequest, AssignmentResolver};
pub use delegation::{DelegateTaskRequest, DelegationOutcome, TaskDelegationService};
pub use error::{ErrorKind, TaskServiceError, TaskServiceResult};
pub use lifecycle::{CreateTaskRequest, StatusChangeRequest, TaskLifecycleService};
pub use policy::TaskPolicy;
pub use query::{Dashboard, StatusCounts, TaskListRequest, TaskQueryService};
pub use recycle_bin::{DELETION_REASON_FIELD, RecycleBinQuery, RecycleBinService};
