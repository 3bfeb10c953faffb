//! In-memory adapter implementations.
//!
//! These adapters provide simple, thread-safe implementations suitable for
//! tests without database dependencies.

mod audit;
mod directory;
mod task;

pub use audit::InMemoryAuditLog;
pub use directory::InMemoryDirectory;
pub use task::InMemoryTaskRepository;
