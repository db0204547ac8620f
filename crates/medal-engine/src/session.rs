//! Selection sessions: one per event, each member reports exactly one
//! outcome, and each placement rank goes to at most one member.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use medal_core::chat::{Button, ButtonStyle};
use medal_core::errors::CommandError;
use medal_core::ids::{MemberId, SessionId};
use medal_core::scoring::{Outcome, Rank};
use medal_core::stats::MemberStats;
use medal_store::PersistentLedger;

const PANEL_PREFIX: &str = "elite";

/// Button custom id: `elite:<session-id>:<outcome-token>`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PanelToken {
    pub session: SessionId,
    pub outcome: Outcome,
}

impl PanelToken {
    pub fn new(session: SessionId, outcome: Outcome) -> Self {
        Self { session, outcome }
    }

    pub fn encode(&self) -> String {
        format!("{PANEL_PREFIX}:{}:{}", self.session, self.outcome.token())
    }

    pub fn decode(custom_id: &str) -> Option<Self> {
        let mut parts = custom_id.splitn(3, ':');
        if parts.next()? != PANEL_PREFIX {
            return None;
        }
        let session = parts.next().filter(|s| !s.is_empty())?;
        let outcome = Outcome::from_token(parts.next()?)?;
        Some(Self::new(SessionId::from_raw(session), outcome))
    }
}

/// The nine panel buttons for a session.
pub fn panel_buttons(session: &SessionId) -> Vec<Button> {
    let mut buttons: Vec<Button> = Rank::panel_ranks()
        .map(|rank| Button {
            custom_id: PanelToken::new(session.clone(), Outcome::Placement(rank)).encode(),
            label: format!("Place {rank} ({})", rank.points()),
            style: match rank.get() {
                1..=3 => ButtonStyle::Success,
                4..=5 => ButtonStyle::Primary,
                _ => ButtonStyle::Secondary,
            },
        })
        .collect();
    buttons.push(Button {
        custom_id: PanelToken::new(session.clone(), Outcome::Pvp).encode(),
        label: "PvP".to_string(),
        style: ButtonStyle::Danger,
    });
    buttons.push(Button {
        custom_id: PanelToken::new(session.clone(), Outcome::NoRank).encode(),
        label: "PvM (no rank)".to_string(),
        style: ButtonStyle::Secondary,
    });
    buttons
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionState {
    Open,
    Expired,
}

/// Result of an accepted selection.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SelectionReceipt {
    pub outcome: Outcome,
    pub medals: u64,
    pub stats: MemberStats,
}

impl SelectionReceipt {
    pub fn confirmation(&self) -> String {
        match self.outcome {
            Outcome::Placement(rank) => {
                format!("Thanks for taking **Place {rank}**! (+{} medals)", self.medals)
            }
            Outcome::Pvp => "Thanks for joining as **PvP**! (0 medals)".to_string(),
            Outcome::NoRank => "Thanks for joining as **PvM (no rank)**! (0 medals)".to_string(),
        }
    }
}

#[derive(Debug)]
pub struct SelectionSession {
    id: SessionId,
    opened_at: DateTime<Utc>,
    ttl: Duration,
    claimed: BTreeSet<Rank>,
    responded: HashSet<MemberId>,
    superseded: bool,
}

impl SelectionSession {
    pub fn new(opened_at: DateTime<Utc>, ttl: Duration) -> Self {
        Self {
            id: SessionId::new(),
            opened_at,
            ttl,
            claimed: BTreeSet::new(),
            responded: HashSet::new(),
            superseded: false,
        }
    }

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    pub fn opened_at(&self) -> DateTime<Utc> {
        self.opened_at
    }

    pub fn state(&self, now: DateTime<Utc>) -> SessionState {
        // A clock that went backwards counts as no time elapsed.
        let elapsed = (now - self.opened_at).to_std().unwrap_or_default();
        if self.superseded || elapsed >= self.ttl {
            SessionState::Expired
        } else {
            SessionState::Open
        }
    }

    pub fn supersede(&mut self) {
        self.superseded = true;
    }

    pub fn has_responded(&self, member: MemberId) -> bool {
        self.responded.contains(&member)
    }

    pub fn claimed_ranks(&self) -> impl Iterator<Item = Rank> + '_ {
        self.claimed.iter().copied()
    }

    pub fn response_count(&self) -> usize {
        self.responded.len()
    }

    /// Record `member`'s outcome and write it through to the ledger.
    ///
    /// Rejections leave both the session and the ledger untouched. If the
    /// ledger change is applied but cannot be saved, the session still counts
    /// the member as responded so a retry cannot double-count.
    pub fn select(
        &mut self,
        member: MemberId,
        outcome: Outcome,
        now: DateTime<Utc>,
        book: &mut PersistentLedger,
    ) -> Result<SelectionReceipt, CommandError> {
        if self.state(now) == SessionState::Expired {
            return Err(CommandError::SessionExpired);
        }
        if self.responded.contains(&member) {
            return Err(CommandError::DuplicateSelection(member));
        }
        if let Outcome::Placement(rank) = outcome {
            if self.claimed.contains(&rank) {
                return Err(CommandError::OutcomeTaken(rank));
            }
        }

        let medals = outcome.medals();
        let saved = book.update(|ledger| {
            let stats = ledger.get_or_create(member);
            match outcome {
                Outcome::Placement(_) => stats.record_placement(medals),
                Outcome::Pvp => stats.record_pvp(),
                Outcome::NoRank => stats.record_no_rank(),
            }
            *stats
        });

        if let Outcome::Placement(rank) = outcome {
            self.claimed.insert(rank);
        }
        self.responded.insert(member);

        let stats = saved?;
        info!(
            session_id = %self.id,
            member_id = %member,
            outcome = %outcome.token(),
            medals,
            "selection recorded"
        );
        Ok(SelectionReceipt {
            outcome,
            medals,
            stats,
        })
    }
}

/// Where a session came from. Only a scheduled session replaces the
/// previous scheduled one; test runs live alongside it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionKind {
    Scheduled,
    TestRun,
}

/// All sessions that may still accept presses, keyed by id. Buttons whose
/// session is gone, superseded or past its TTL get an expiry notice.
#[derive(Debug, Default)]
pub struct SessionBoard {
    sessions: HashMap<SessionId, SelectionSession>,
    scheduled: Option<SessionId>,
    latest: Option<SessionId>,
}

impl SessionBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open(&mut self, kind: SessionKind, now: DateTime<Utc>, ttl: Duration) -> &SelectionSession {
        if kind == SessionKind::Scheduled {
            let previous = self.scheduled.take();
            if let Some(previous) = previous.and_then(|id| self.sessions.get_mut(&id)) {
                if previous.state(now) == SessionState::Open {
                    debug!(session_id = %previous.id(), "superseding open session");
                }
                previous.supersede();
            }
        }
        self.prune(now);

        let session = SelectionSession::new(now, ttl);
        let id = session.id().clone();
        info!(session_id = %id, kind = ?kind, "selection session opened");
        if kind == SessionKind::Scheduled {
            self.scheduled = Some(id.clone());
        }
        self.latest = Some(id.clone());
        self.sessions.entry(id).or_insert(session)
    }

    /// Most recently opened session of either kind.
    pub fn current(&self) -> Option<&SelectionSession> {
        self.latest.as_ref().and_then(|id| self.sessions.get(id))
    }

    pub fn scheduled(&self) -> Option<&SelectionSession> {
        self.scheduled.as_ref().and_then(|id| self.sessions.get(id))
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Route a button press to the session it belongs to.
    pub fn select(
        &mut self,
        token: &PanelToken,
        member: MemberId,
        now: DateTime<Utc>,
        book: &mut PersistentLedger,
    ) -> Result<SelectionReceipt, CommandError> {
        match self.sessions.get_mut(&token.session) {
            Some(session) => session.select(member, token.outcome, now, book),
            None => Err(CommandError::SessionExpired),
        }
    }

    fn prune(&mut self, now: DateTime<Utc>) {
        let before = self.sessions.len();
        self.sessions
            .retain(|_, session| session.state(now) == SessionState::Open);
        let dropped = before - self.sessions.len();
        if dropped > 0 {
            debug!(dropped, "pruned closed sessions");
        }
    }
}
