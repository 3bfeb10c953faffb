//! Adapter implementations for task management ports.
//!
//! - [`memory`]: thread-safe in-memory task store, directory, and audit log
//!   for tests and embedding
//! - [`postgres`]: `PostgreSQL` task store using Diesel ORM

pub mod memory;
pub mod postgres;
