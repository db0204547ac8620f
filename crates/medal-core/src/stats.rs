use serde::{Deserialize, Serialize};

/// Per-member tally. Every counter is unsigned, so the medal totals can never
/// go negative.
///
/// Field names match the persisted file: `medals` holds the rank-derived
/// medals; `manual_medals` may be missing in older files and reads as 0.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberStats {
    #[serde(rename = "medals", default)]
    pub auto_medals: u64,
    #[serde(default)]
    pub pvm_runs: u64,
    #[serde(default)]
    pub pvp_runs: u64,
    #[serde(default)]
    pub manual_medals: u64,
}

/// Manual medal value before and after an adjustment.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ManualChange {
    pub before: u64,
    pub after: u64,
}

impl MemberStats {
    pub fn total_medals(&self) -> u64 {
        self.auto_medals.saturating_add(self.manual_medals)
    }

    pub fn record_placement(&mut self, medals: u64) {
        self.pvm_runs = self.pvm_runs.saturating_add(1);
        self.auto_medals = self.auto_medals.saturating_add(medals);
    }

    pub fn record_pvp(&mut self) {
        self.pvp_runs = self.pvp_runs.saturating_add(1);
    }

    pub fn record_no_rank(&mut self) {
        self.pvm_runs = self.pvm_runs.saturating_add(1);
    }

    pub fn add_manual(&mut self, amount: u64) -> ManualChange {
        let before = self.manual_medals;
        self.manual_medals = before.saturating_add(amount);
        ManualChange { before, after: self.manual_medals }
    }

    /// Clamps at zero.
    pub fn remove_manual(&mut self, amount: u64) -> ManualChange {
        let before = self.manual_medals;
        self.manual_medals = before.saturating_sub(amount);
        ManualChange { before, after: self.manual_medals }
    }

    pub fn set_manual(&mut self, amount: u64) -> ManualChange {
        let before = self.manual_medals;
        self.manual_medals = amount;
        ManualChange { before, after: amount }
    }
}
