//! Task management for departmental organisations.
//!
//! Tasks are created by users and assigned to the creator alone, to explicit
//! users, to departments, or to departments scoped to a province. Assignees
//! move tasks through a small status workflow, privileged users may cancel
//! or revive them, and an assignee can split a task into per-user delegated
//! copies. Deleted tasks rest in a recycle bin until restored or purged, and
//! every mutation leaves an audit record. The module follows hexagonal
//! architecture:
//!
//! - Domain types, permission rules, and the status machine in [`domain`]
//! - Port contracts for storage, directories, and auditing in [`ports`]
//! - Adapter implementations in [`adapters`]
//! - Orchestration services in [`services`]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;
