use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::StoreError;
use crate::ledger::Ledger;
use crate::LedgerStore;

/// Ledger persisted as one pretty-printed UTF-8 JSON document.
///
/// Saves go to a sibling temp file that is then renamed over the target, so
/// a crash mid-write leaves the previous ledger intact.
#[derive(Clone, Debug)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "ledger".to_string());
        self.path.with_file_name(format!(".{name}.tmp"))
    }
}

impl LedgerStore for JsonFileStore {
    /// A missing file is an empty ledger; an unreadable or malformed file is
    /// an error.
    fn load(&self) -> Result<Ledger, StoreError> {
        if !self.path.exists() {
            info!(path = %self.path.display(), "ledger file not found, starting empty");
            return Ok(Ledger::new());
        }

        let content = fs::read_to_string(&self.path)
            .map_err(|e| StoreError::Io(format!("read {}: {e}", self.path.display())))?;
        let ledger: Ledger = serde_json::from_str(&content)?;

        info!(path = %self.path.display(), members = ledger.len(), "ledger loaded");
        Ok(ledger)
    }

    fn save(&self, ledger: &Ledger) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .map_err(|e| StoreError::Io(format!("create dir: {e}")))?;
        }

        let json = serde_json::to_string_pretty(ledger)?;
        let tmp = self.temp_path();
        {
            let mut file = fs::File::create(&tmp)
                .map_err(|e| StoreError::Io(format!("create {}: {e}", tmp.display())))?;
            file.write_all(json.as_bytes())
                .and_then(|()| file.sync_all())
                .map_err(|e| StoreError::Io(format!("write {}: {e}", tmp.display())))?;
        }
        fs::rename(&tmp, &self.path)
            .map_err(|e| StoreError::Io(format!("rename to {}: {e}", self.path.display())))?;

        debug!(path = %self.path.display(), members = ledger.len(), "ledger saved");
        Ok(())
    }
}
