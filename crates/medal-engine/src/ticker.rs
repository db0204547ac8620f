use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Timelike, Utc};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use medal_core::clock::Clock;
use medal_core::events::BotEvent;

const TICK_PERIOD: Duration = Duration::from_secs(60);

/// Lands ticks slightly after the boundary so `now` reads the new minute.
const BOUNDARY_SLACK: Duration = Duration::from_millis(250);

/// Time until just after the next wall-clock minute boundary.
pub fn delay_to_next_minute(now: DateTime<Utc>) -> Duration {
    let into_minute = Duration::from_secs(u64::from(now.second()))
        + Duration::from_nanos(u64::from(now.nanosecond().min(999_999_999)));
    TICK_PERIOD.saturating_sub(into_minute) + BOUNDARY_SLACK
}

/// Send a [`BotEvent::Tick`] once per minute until cancelled or the receiver
/// is gone. Late ticks are skipped, never replayed.
pub fn spawn_ticker(
    tx: mpsc::Sender<BotEvent>,
    clock: Arc<dyn Clock>,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let start = Instant::now() + delay_to_next_minute(clock.now());
        let mut interval = interval_at(start, TICK_PERIOD);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        info!("ticker started");

        loop {
            tokio::select! {
                () = cancel.cancelled() => break,
                _ = interval.tick() => {
                    let now = clock.now();
                    debug!(%now, "tick");
                    if tx.send(BotEvent::Tick { now }).await.is_err() {
                        break;
                    }
                }
            }
        }
        info!("ticker stopped");
    })
}
