//! Hour-of-day trigger policy.
//!
//! The policy is plain data: which hours carry an event, which of those are
//! quiet (announced without the role mention), and at which minutes the
//! announcement and the selection panel go out. Time-zone conversion happens
//! in the caller; [`Schedule::action_at`] only sees local wall-clock values.

use std::collections::BTreeSet;

/// What the scheduler should do on a tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TickAction {
    Idle,
    Announce { mention_role: bool },
    OpenSession,
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ScheduleError {
    #[error("hour out of range (0-23): {0}")]
    HourOutOfRange(u8),
    #[error("quiet hour {0} is not an event hour")]
    QuietHourNotEvent(u8),
    #[error("minute out of range (0-59): {0}")]
    MinuteOutOfRange(u8),
    #[error("announcement and session share minute {0}")]
    MinutesCollide(u8),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Schedule {
    event_hours: BTreeSet<u8>,
    quiet_hours: BTreeSet<u8>,
    announce_minute: u8,
    session_minute: u8,
}

pub const DEFAULT_EVENT_HOURS: [u8; 10] = [0, 6, 8, 10, 12, 14, 16, 18, 20, 22];
pub const DEFAULT_QUIET_HOURS: [u8; 4] = [0, 6, 8, 22];
pub const DEFAULT_ANNOUNCE_MINUTE: u8 = 0;
pub const DEFAULT_SESSION_MINUTE: u8 = 8;

impl Schedule {
    /// Quiet hours must be a subset of event hours.
    pub fn new(
        event_hours: impl IntoIterator<Item = u8>,
        quiet_hours: impl IntoIterator<Item = u8>,
        announce_minute: u8,
        session_minute: u8,
    ) -> Result<Self, ScheduleError> {
        let event_hours: BTreeSet<u8> = event_hours.into_iter().collect();
        let quiet_hours: BTreeSet<u8> = quiet_hours.into_iter().collect();

        if let Some(&h) = event_hours.iter().find(|h| **h > 23) {
            return Err(ScheduleError::HourOutOfRange(h));
        }
        if let Some(&h) = quiet_hours.iter().find(|h| **h > 23) {
            return Err(ScheduleError::HourOutOfRange(h));
        }
        if let Some(&h) = quiet_hours.difference(&event_hours).next() {
            return Err(ScheduleError::QuietHourNotEvent(h));
        }
        for minute in [announce_minute, session_minute] {
            if minute > 59 {
                return Err(ScheduleError::MinuteOutOfRange(minute));
            }
        }
        if announce_minute == session_minute {
            return Err(ScheduleError::MinutesCollide(announce_minute));
        }

        Ok(Self {
            event_hours,
            quiet_hours,
            announce_minute,
            session_minute,
        })
    }

    pub fn action_at(&self, hour: u32, minute: u32) -> TickAction {
        let Ok(hour) = u8::try_from(hour) else {
            return TickAction::Idle;
        };
        if !self.event_hours.contains(&hour) {
            return TickAction::Idle;
        }
        if minute == u32::from(self.announce_minute) {
            TickAction::Announce {
                mention_role: !self.quiet_hours.contains(&hour),
            }
        } else if minute == u32::from(self.session_minute) {
            TickAction::OpenSession
        } else {
            TickAction::Idle
        }
    }

    pub fn is_event_hour(&self, hour: u8) -> bool {
        self.event_hours.contains(&hour)
    }

    pub fn is_quiet_hour(&self, hour: u8) -> bool {
        self.quiet_hours.contains(&hour)
    }

    pub fn event_hours(&self) -> impl Iterator<Item = u8> + '_ {
        self.event_hours.iter().copied()
    }
}

impl Default for Schedule {
    fn default() -> Self {
        Self {
            event_hours: DEFAULT_EVENT_HOURS.into_iter().collect(),
            quiet_hours: DEFAULT_QUIET_HOURS.into_iter().collect(),
            announce_minute: DEFAULT_ANNOUNCE_MINUTE,
            session_minute: DEFAULT_SESSION_MINUTE,
        }
    }
}
