use std::time::Duration;
use tokio::time::{interval, Interval, MissedTickBehavior};

/// Session-refresh timer (spec.md §9 Open Question 3): fires at
/// `timeout/2` so a server enforcing the advertised session timeout
/// doesn't drop the session mid-stream. A session with no advertised
/// timeout never fires (`tick` is then pending forever, so it drops out
/// of a `select!` harmlessly).
pub struct KeepAlive {
    interval: Option<Interval>,
}

impl KeepAlive {
    /// `tokio::time::interval` fires its first tick immediately; consume
    /// that one here so the first `tick()` a caller awaits lands at the
    /// intended `timeout/2`, not at construction time.
    pub async fn new(session_timeout_secs: Option<u64>) -> Self {
        let mut interval = session_timeout_secs.filter(|&s| s > 0).map(|secs| {
            let period = Duration::from_secs((secs / 2).max(1));
            let mut iv = interval(period);
            iv.set_missed_tick_behavior(MissedTickBehavior::Delay);
            iv
        });
        if let Some(iv) = &mut interval {
            iv.tick().await;
        }
        KeepAlive { interval }
    }

    pub async fn tick(&mut self) {
        match &mut self.interval {
            Some(iv) => {
                iv.tick().await;
            }
            None => std::future::pending::<()>().await,
        }
    }
}
