//! Wall-clock refresh triggers: fire a pluggable async callback once a day
//! at a configured time, or every N minutes. Grounded in
//! `original_source`'s query server, which drives its Redis refresh and
//! error-retry passes off `schedule.every().day.at(...)` and
//! `schedule.every(N).minutes` — this is the trigger mechanism only, ported
//! to tokio timers; the feed fetch a trigger invokes is the caller's job.

use log::{debug, error};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use tokio::task::JoinHandle;

pub type RefreshTask = Arc<dyn Fn() -> Pin<Box<dyn Future<Output = ()> + Send>> + Send + Sync>;

/// Parses `"HH:MM"` into seconds since midnight.
fn parse_time_of_day(spec: &str) -> Option<u32> {
    let mut parts = spec.splitn(2, ':');
    let hours: u32 = parts.next()?.parse().ok()?;
    let minutes: u32 = parts.next()?.parse().ok()?;
    if hours > 23 || minutes > 59 {
        return None;
    }
    Some(hours * 3600 + minutes * 60)
}

fn seconds_until_next(target_seconds_of_day: u32) -> Duration {
    use std::time::{SystemTime, UNIX_EPOCH};
    let now = SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_secs();
    let seconds_today = now % 86_400;
    let delay = if seconds_today <= target_seconds_of_day as u64 {
        target_seconds_of_day as u64 - seconds_today
    } else {
        86_400 - seconds_today + target_seconds_of_day as u64
    };
    Duration::from_secs(delay.max(1))
}

/// Owns a set of background trigger tasks; dropping it leaks the tasks, so
/// callers should `shutdown().await` before exiting.
pub struct Scheduler {
    handles: Vec<JoinHandle<()>>,
    stop: Arc<Notify>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self { handles: Vec::new(), stop: Arc::new(Notify::new()) }
    }

    /// Fires `task` once per day at `time_of_day` (`"HH:MM"`, process-local
    /// wall clock). Invalid specs are logged and simply not registered.
    pub fn schedule_daily(&mut self, time_of_day: &str, task: RefreshTask) {
        let target = match parse_time_of_day(time_of_day) {
            Some(t) => t,
            None => {
                error!("invalid daily schedule time {time_of_day:?}, not registering trigger");
                return;
            }
        };
        let stop = self.stop.clone();
        let handle = tokio::spawn(async move {
            loop {
                let delay = seconds_until_next(target);
                tokio::select! {
                    _ = tokio::time::sleep(delay) => {
                        debug!("daily refresh trigger firing");
                        task().await;
                    }
                    _ = stop.notified() => break,
                }
            }
        });
        self.handles.push(handle);
    }

    /// Fires `task` every `interval`, skipping the immediate first tick
    /// `tokio::time::interval` would otherwise deliver on registration.
    pub fn schedule_every(&mut self, interval: Duration, task: RefreshTask) {
        let stop = self.stop.clone();
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.tick().await;
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        debug!("interval refresh trigger firing");
                        task().await;
                    }
                    _ = stop.notified() => break,
                }
            }
        });
        self.handles.push(handle);
    }

    /// Signals every scheduled task to stop and waits for them to finish.
    pub async fn shutdown(self) {
        self.stop.notify_waiters();
        for handle in self.handles {
            let _ = handle.await;
        }
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn parses_valid_time_of_day() {
        assert_eq!(parse_time_of_day("03:00"), Some(3 * 3600));
        assert_eq!(parse_time_of_day("23:59"), Some(23 * 3600 + 59 * 60));
    }

    #[test]
    fn rejects_out_of_range_time_of_day() {
        assert_eq!(parse_time_of_day("24:00"), None);
        assert_eq!(parse_time_of_day("12:60"), None);
        assert_eq!(parse_time_of_day("garbage"), None);
    }

    #[tokio::test(start_paused = true)]
    async fn every_trigger_fires_repeatedly_without_an_immediate_tick() {
        let count = Arc::new(AtomicUsize::new(0));
        let mut scheduler = Scheduler::new();
        let counter = count.clone();
        scheduler.schedule_every(
            Duration::from_secs(10),
            Arc::new(move || {
                let counter = counter.clone();
                Box::pin(async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                })
            }),
        );

        tokio::time::advance(Duration::from_millis(1)).await;
        assert_eq!(count.load(Ordering::SeqCst), 0);

        tokio::time::advance(Duration::from_secs(10)).await;
        tokio::task::yield_now().await;
        assert_eq!(count.load(Ordering::SeqCst), 1);

        scheduler.shutdown().await;
    }
}
