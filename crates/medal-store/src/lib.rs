pub mod book;
pub mod error;
pub mod file;
pub mod ledger;
pub mod memory;

pub use book::PersistentLedger;
pub use error::StoreError;
pub use file::JsonFileStore;
pub use ledger::Ledger;
pub use memory::MemoryStore;

/// Whole-ledger persistence. Every save replaces the previous state.
pub trait LedgerStore: Send + Sync {
    fn load(&self) -> Result<Ledger, StoreError>;
    fn save(&self, ledger: &Ledger) -> Result<(), StoreError>;
}
