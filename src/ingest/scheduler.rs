// src/ingest/scheduler.rs
//! Periodic trigger wiring: one tokio task ticks the poll orchestrator. The
//! disclosure upstream gets its own cadence gate — its listing barely moves
//! outside market hours, and the daily request quota is easy to burn by
//! polling it every minute around the clock.

use std::sync::Arc;

use chrono::{DateTime, Datelike, Local, NaiveTime, Timelike, Weekday};
use metrics::counter;
use tokio::task::JoinHandle;

use crate::ingest::types::FetchCriteria;
use crate::ingest::PollOrchestrator;
use crate::store::SourceType;

#[derive(Clone, Copy, Debug)]
pub struct PollSchedulerCfg {
    pub interval_secs: u64,
}

impl Default for PollSchedulerCfg {
    fn default() -> Self {
        Self { interval_secs: 60 }
    }
}

/// Disclosure polling cadence, in minutes, by time of day.
const PEAK_INTERVAL: u32 = 1; // trading hours
const EVENING_INTERVAL: u32 = 10;
const NIGHT_INTERVAL: u32 = 30;
const WEEKEND_INTERVAL: u32 = 60;

/// Whether the disclosure adapter should run on a tick landing at `now`.
/// Weekends: hourly. Weekday nights (before 07:30): every 30 minutes.
/// Evenings (after 18:00): every 10 minutes. Trading hours: every minute.
pub fn disclosure_due(now: DateTime<Local>) -> bool {
    let minute = now.minute();
    if matches!(now.weekday(), Weekday::Sat | Weekday::Sun) {
        return minute % WEEKEND_INTERVAL == 0;
    }
    let cutoff_morning = NaiveTime::from_hms_opt(7, 30, 0).expect("valid time");
    let cutoff_evening = NaiveTime::from_hms_opt(18, 0, 0).expect("valid time");
    if now.time() < cutoff_morning {
        minute % NIGHT_INTERVAL == 0
    } else if now.time() > cutoff_evening {
        minute % EVENING_INTERVAL == 0
    } else {
        minute % PEAK_INTERVAL == 0
    }
}

/// Spawn the poll loop: every tick runs the search/feed/broker adapters, and
/// the disclosure adapter when its cadence says so.
pub fn spawn_poll_scheduler(
    orchestrator: Arc<PollOrchestrator>,
    cfg: PollSchedulerCfg,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker =
            tokio::time::interval(std::time::Duration::from_secs(cfg.interval_secs.max(1)));
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            let run_disclosure = disclosure_due(Local::now());
            let summary = orchestrator
                .run_cycle_where(&FetchCriteria::default(), |source| {
                    source != SourceType::Disclosure || run_disclosure
                })
                .await;
            counter!("ingest_runs_total").increment(1);
            tracing::info!(
                target: "ingest",
                saved = summary.saved,
                duplicates = summary.duplicates,
                disclosure = run_disclosure,
                "scheduled poll tick"
            );
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(weekday_date: (i32, u32, u32), h: u32, m: u32) -> DateTime<Local> {
        let (y, mo, d) = weekday_date;
        Local.with_ymd_and_hms(y, mo, d, h, m, 0).unwrap()
    }

    #[test]
    fn cadence_by_time_of_day() {
        // 2026-08-28 is a Friday.
        assert!(disclosure_due(at((2026, 8, 28), 10, 17))); // peak: any minute
        assert!(disclosure_due(at((2026, 8, 28), 3, 30))); // night: on the half hour
        assert!(!disclosure_due(at((2026, 8, 28), 3, 31)));
        assert!(disclosure_due(at((2026, 8, 28), 19, 50))); // evening: tens
        assert!(!disclosure_due(at((2026, 8, 28), 19, 55)));
        // 2026-08-29 is a Saturday.
        assert!(disclosure_due(at((2026, 8, 29), 13, 0)));
        assert!(!disclosure_due(at((2026, 8, 29), 13, 30)));
    }
}
