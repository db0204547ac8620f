use tracing::error;

use medal_core::ids::MemberId;
use medal_core::stats::MemberStats;

use crate::error::StoreError;
use crate::ledger::Ledger;
use crate::LedgerStore;

/// The in-memory ledger plus its store. Every mutation goes through
/// [`PersistentLedger::update`], which rewrites the whole file afterwards.
///
/// If a save fails the in-memory change is kept; the next successful save
/// writes it out.
pub struct PersistentLedger {
    ledger: Ledger,
    store: Box<dyn LedgerStore>,
}

impl PersistentLedger {
    /// Load the ledger from `store`. A failure here is a startup error.
    pub fn open(store: impl LedgerStore + 'static) -> Result<Self, StoreError> {
        let ledger = store.load()?;
        Ok(Self {
            ledger,
            store: Box::new(store),
        })
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn stats(&self, member: MemberId) -> Option<&MemberStats> {
        self.ledger.get(member)
    }

    /// Apply `f`, then save synchronously.
    pub fn update<T>(&mut self, f: impl FnOnce(&mut Ledger) -> T) -> Result<T, StoreError> {
        let value = f(&mut self.ledger);
        self.persist()?;
        Ok(value)
    }

    /// Replace the ledger with an empty one and save.
    pub fn reset(&mut self) -> Result<(), StoreError> {
        self.update(Ledger::clear)
    }

    fn persist(&self) -> Result<(), StoreError> {
        self.store.save(&self.ledger).inspect_err(|e| {
            error!(error = %e, members = self.ledger.len(), "failed to save ledger");
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::file::JsonFileStore;
    use crate::memory::MemoryStore;

    #[test]
    fn update_saves_every_time() {
        let store = MemoryStore::new();
        let mut book = PersistentLedger::open(store.clone()).unwrap();
        book.update(|l| l.get_or_create(MemberId::new(1)).record_pvp()).unwrap();
        book.update(|l| l.get_or_create(MemberId::new(2)).record_no_rank()).unwrap();
        assert_eq!(store.save_count(), 2);
        assert_eq!(store.snapshot().unwrap(), *book.ledger());
    }

    #[test]
    fn update_returns_closure_value() {
        let mut book = PersistentLedger::open(MemoryStore::new()).unwrap();
        let change = book
            .update(|l| l.get_or_create(MemberId::new(1)).add_manual(10))
            .unwrap();
        assert_eq!(change.after, 10);
    }

    #[test]
    fn failed_save_keeps_memory_state() {
        let store = MemoryStore::new();
        let mut book = PersistentLedger::open(store.clone()).unwrap();
        store.set_failing(true);
        let result = book.update(|l| l.get_or_create(MemberId::new(1)).add_manual(5));
        assert!(matches!(result, Err(StoreError::Io(_))));
        assert_eq!(book.stats(MemberId::new(1)).unwrap().manual_medals, 5);

        store.set_failing(false);
        book.update(|_| ()).unwrap();
        let saved = store.snapshot().unwrap();
        assert_eq!(saved.get(MemberId::new(1)).unwrap().manual_medals, 5);
    }

    #[test]
    fn reset_empties_and_persists() {
        let mut seeded = Ledger::new();
        seeded.get_or_create(MemberId::new(9)).record_placement(8);
        let store = MemoryStore::with_ledger(seeded);
        let mut book = PersistentLedger::open(store.clone()).unwrap();
        assert_eq!(book.ledger().len(), 1);

        book.reset().unwrap();
        assert!(book.ledger().is_empty());
        assert!(store.snapshot().unwrap().is_empty());
    }

    #[test]
    fn reopen_from_file_sees_previous_writes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("elite_data.json");
        {
            let mut book = PersistentLedger::open(JsonFileStore::new(&path)).unwrap();
            book.update(|l| l.get_or_create(MemberId::new(4)).record_placement(6)).unwrap();
        }
        let book = PersistentLedger::open(JsonFileStore::new(&path)).unwrap();
        assert_eq!(book.stats(MemberId::new(4)).unwrap().auto_medals, 6);
    }

    #[test]
    fn open_fails_on_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("elite_data.json");
        std::fs::write(&path, "garbage").unwrap();
        assert!(PersistentLedger::open(JsonFileStore::new(&path)).is_err());
    }
}
