use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::StoreError;
use crate::ledger::Ledger;
use crate::LedgerStore;

/// In-process store for tests and dry runs. Clones share the same state, so
/// a test can keep a handle and inspect what was saved.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    saved: Arc<Mutex<Option<Ledger>>>,
    saves: Arc<AtomicUsize>,
    fail_saves: Arc<AtomicBool>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ledger(ledger: Ledger) -> Self {
        let store = Self::default();
        *store.saved.lock() = Some(ledger);
        store
    }

    /// Last saved (or seeded) ledger.
    pub fn snapshot(&self) -> Option<Ledger> {
        self.saved.lock().clone()
    }

    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::Relaxed)
    }

    /// Make subsequent saves fail with an IO error.
    pub fn set_failing(&self, failing: bool) {
        self.fail_saves.store(failing, Ordering::Relaxed);
    }
}

impl LedgerStore for MemoryStore {
    fn load(&self) -> Result<Ledger, StoreError> {
        Ok(self.saved.lock().clone().unwrap_or_default())
    }

    fn save(&self, ledger: &Ledger) -> Result<(), StoreError> {
        if self.fail_saves.load(Ordering::Relaxed) {
            return Err(StoreError::Io("simulated write failure".into()));
        }
        *self.saved.lock() = Some(ledger.clone());
        self.saves.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}
