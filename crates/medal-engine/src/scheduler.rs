use chrono::{DateTime, NaiveDate, Timelike, Utc};
use chrono_tz::Tz;
use tracing::debug;

use medal_core::schedule::{Schedule, TickAction};

/// Applies the hour-of-day policy in a fixed time zone and fires each slot
/// at most once, however many ticks land inside the same minute.
#[derive(Debug)]
pub struct Scheduler {
    schedule: Schedule,
    tz: Tz,
    last_fired: Option<(NaiveDate, u32, u32)>,
}

impl Scheduler {
    pub fn new(schedule: Schedule, tz: Tz) -> Self {
        Self {
            schedule,
            tz,
            last_fired: None,
        }
    }

    pub fn time_zone(&self) -> Tz {
        self.tz
    }

    pub fn poll(&mut self, now: DateTime<Utc>) -> TickAction {
        let local = now.with_timezone(&self.tz);
        let action = self.schedule.action_at(local.hour(), local.minute());
        if action == TickAction::Idle {
            return action;
        }

        let slot = (local.date_naive(), local.hour(), local.minute());
        if self.last_fired == Some(slot) {
            debug!(local = %local, "slot already fired");
            return TickAction::Idle;
        }
        self.last_fired = Some(slot);
        action
    }
}
