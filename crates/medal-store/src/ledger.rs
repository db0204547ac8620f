use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use medal_core::ids::MemberId;
use medal_core::stats::MemberStats;

/// Member id → stats. Serializes as `{"players": {"<id>": {...}}}`.
///
/// Records are created lazily and only disappear through [`Ledger::clear`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ledger {
    #[serde(default)]
    players: BTreeMap<MemberId, MemberStats>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, member: MemberId) -> Option<&MemberStats> {
        self.players.get(&member)
    }

    /// Existing record, or a zeroed one inserted on the spot.
    pub fn get_or_create(&mut self, member: MemberId) -> &mut MemberStats {
        self.players.entry(member).or_default()
    }

    /// Ascending member id order.
    pub fn iter(&self) -> impl Iterator<Item = (MemberId, &MemberStats)> {
        self.players.iter().map(|(id, stats)| (*id, stats))
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    pub fn clear(&mut self) {
        self.players.clear();
    }
}

impl FromIterator<(MemberId, MemberStats)> for Ledger {
    fn from_iter<I: IntoIterator<Item = (MemberId, MemberStats)>>(iter: I) -> Self {
        Self {
            players: iter.into_iter().collect(),
        }
    }
}
