//! # Per-Contract Locks
//!
//! In-process serialization of invoicing runs. Two runs for the same
//! contract queue behind one another; runs for different contracts proceed
//! in parallel.
//!
//! ```text
//! create_invoices(C1) ──► lock(C1) ──► unit of work ──► commit ──► unlock
//! reconcile(C1)       ──► lock(C1) ···· waits ·························► runs
//! reconcile(C2)       ──► lock(C2) ──► runs immediately
//! ```
//!
//! This only covers one process. Across processes the unit of work's first
//! statement (bumping `contracts.invoice_revision`) takes SQLite's write lock.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// Table of async mutexes keyed by contract id.
#[derive(Debug, Clone, Default)]
pub struct ContractLocks {
    locks: Arc<Mutex<HashMap<String, Arc<AsyncMutex<()>>>>>,
}

impl ContractLocks {
    pub fn new() -> Self {
        ContractLocks::default()
    }

    /// Waits until no other holder has `contract_id`, then holds it until
    /// the returned guard is dropped.
    pub async fn lock(&self, contract_id: &str) -> OwnedMutexGuard<()> {
        let mutex = {
            let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
            // Entries nobody holds or waits on
            locks.retain(|_, mutex| Arc::strong_count(mutex) > 1);
            locks.entry(contract_id.to_string()).or_default().clone()
        };
        mutex.lock_owned().await
    }

    #[cfg(test)]
    fn tracked(&self) -> usize {
        self.locks.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}
