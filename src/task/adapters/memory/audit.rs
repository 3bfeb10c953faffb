//! In-memory audit log.

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use crate::task::{
    domain::TaskId,
    ports::{AuditLog, AuditLogError, AuditRecord},
};

/// Ordered in-memory audit sink.
///
/// The sink can be switched into a rejecting mode to exercise failure
/// handling.
#[derive(Debug, Clone, Default)]
pub struct InMemoryAuditLog {
    records: Arc<Mutex<Vec<AuditRecord>>>,
    rejecting: Arc<AtomicBool>,
}

impl InMemoryAuditLog {
    /// Creates an empty, accepting audit log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every later `record` call fail (`true`) or succeed (`false`).
    pub fn set_rejecting(&self, rejecting: bool) {
        self.rejecting.store(rejecting, Ordering::SeqCst);
    }

    /// Returns every accepted record in arrival order.
    ///
    /// # Errors
    ///
    /// Returns [`AuditLogError::Unavailable`] when the lock is poisoned.
    pub fn records(&self) -> Result<Vec<AuditRecord>, AuditLogError> {
        let records = self
            .records
            .lock()
            .map_err(|err| AuditLogError::unavailable(std::io::Error::other(err.to_string())))?;
        Ok(records.clone())
    }

    /// Returns the accepted records for one task in arrival order.
    ///
    /// # Errors
    ///
    /// Returns [`AuditLogError::Unavailable`] when the lock is poisoned.
    pub fn records_for(&self, task_id: TaskId) -> Result<Vec<AuditRecord>, AuditLogError> {
        Ok(self
            .records()?
            .into_iter()
            .filter(|record| record.target_id == task_id)
            .collect())
    }
}

#[async_trait]
impl AuditLog for InMemoryAuditLog {
    async fn record(&self, record: AuditRecord) -> Result<(), AuditLogError> {
        if self.rejecting.load(Ordering::SeqCst) {
            return Err(AuditLogError::unavailable(std::io::Error::other(
                "audit sink is rejecting records",
            )));
        }
        self.records
            .lock()
            .map_err(|err| AuditLogError::unavailable(std::io::Error::other(err.to_string())))?
            .push(record);
        Ok(())
    }
}
