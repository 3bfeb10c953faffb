//! Taskdesk: task assignment and tracking for departmental organisations.
//!
//! This crate provides the task engine behind an organisation's work queue:
//! resolving who a task is for, deciding who may change it, enforcing the
//! status workflow, delegating work to individual users, keeping deleted
//! tasks in a recycle bin, and building per-user dashboards.
//!
//! # Architecture
//!
//! Taskdesk follows hexagonal architecture principles:
//!
//! - **Domain**: Pure business logic with no infrastructure dependencies
//! - **Ports**: Abstract trait interfaces for storage, directories, and audit
//! - **Adapters**: Concrete implementations of ports (in-memory, `PostgreSQL`)
//!
//! # Modules
//!
//! - [`task`]: Task lifecycle, permissions, delegation, recycle bin, and
//!   dashboards

pub mod task;
