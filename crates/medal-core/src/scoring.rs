//! Placement ranks, their medal values, and the outcomes a member can report.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::RangeInclusive;

/// Rank → medals. Ranks not listed here are worth nothing.
pub const MEDALS_PER_PLACE: [(u8, u64); 8] = [
    (1, 8),
    (2, 6),
    (3, 5),
    (4, 4),
    (5, 3),
    (6, 2),
    (7, 1),
    (8, 0),
];

/// Ranks offered on the selection panel. Rank 8 exists in the table but is
/// never offered.
pub const PANEL_RANKS: RangeInclusive<u8> = 1..=7;

pub fn points_for_rank(rank: u8) -> u64 {
    MEDALS_PER_PLACE
        .iter()
        .find(|(r, _)| *r == rank)
        .map_or(0, |(_, points)| *points)
}

#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Rank(u8);

impl Rank {
    /// Any rank present in the medal table.
    pub fn new(rank: u8) -> Option<Self> {
        MEDALS_PER_PLACE
            .iter()
            .any(|(r, _)| *r == rank)
            .then_some(Self(rank))
    }

    pub fn get(self) -> u8 {
        self.0
    }

    pub fn points(self) -> u64 {
        points_for_rank(self.0)
    }

    pub fn panel_ranks() -> impl Iterator<Item = Rank> {
        PANEL_RANKS.map(Rank)
    }
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What a member reports for one event.
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq)]
pub enum Outcome {
    Placement(Rank),
    Pvp,
    NoRank,
}

impl Outcome {
    /// Short token used inside button ids (`p3`, `pvp`, `norank`).
    pub fn token(&self) -> String {
        match self {
            Self::Placement(rank) => format!("p{rank}"),
            Self::Pvp => "pvp".to_string(),
            Self::NoRank => "norank".to_string(),
        }
    }

    /// Inverse of [`Outcome::token`]. Only panel ranks are accepted.
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "pvp" => Some(Self::Pvp),
            "norank" => Some(Self::NoRank),
            other => {
                let n: u8 = other.strip_prefix('p')?.parse().ok()?;
                PANEL_RANKS.contains(&n).then_some(Self::Placement(Rank(n)))
            }
        }
    }

    /// Only placements are exclusive within a session.
    pub fn is_scarce(&self) -> bool {
        matches!(self, Self::Placement(_))
    }

    pub fn medals(&self) -> u64 {
        match self {
            Self::Placement(rank) => rank.points(),
            Self::Pvp | Self::NoRank => 0,
        }
    }
}
