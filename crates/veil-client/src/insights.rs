//! Periodic `GET /insights` polling.

use std::time::Duration;

use tokio::{sync::watch, task::JoinHandle};
use tracing::{debug, warn};

use veil_contracts::account::SystemInsights;

use crate::http::ApiClient;

/// Handle to a running poller. Dropping it stops the poll loop.
pub struct InsightsPoller {
    handle: JoinHandle<()>,
    latest: watch::Receiver<Option<SystemInsights>>,
}

impl InsightsPoller {
    /// Latest insights seen, if any poll has succeeded.
    pub fn latest(&self) -> Option<SystemInsights> {
        self.latest.borrow().clone()
    }

    /// A receiver notified on every successful poll.
    pub fn subscribe(&self) -> watch::Receiver<Option<SystemInsights>> {
        self.latest.clone()
    }

    pub fn stop(&self) {
        self.handle.abort();
    }
}

impl Drop for InsightsPoller {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Shortest accepted poll period.
pub const MIN_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Poll insights every `interval`, starting immediately. Failures are logged
/// and the previous value is kept; there is no retry or backoff.
///
/// Intervals shorter than `MIN_POLL_INTERVAL` are raised to it.
pub fn spawn_insights_poller(client: ApiClient, interval: Duration) -> InsightsPoller {
    let interval = if interval < MIN_POLL_INTERVAL {
        warn!(requested_ms = interval.as_millis() as u64, "insights interval too short; clamping");
        MIN_POLL_INTERVAL
    } else {
        interval
    };
    let (tx, rx) = watch::channel(None);
    let handle = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        loop {
            ticker.tick().await;
            match client.insights().await {
                Ok(insights) => {
                    debug!(alerts = insights.critical_alerts.len(), "insights refreshed");
                    if tx.send(Some(insights)).is_err() {
                        break;
                    }
                }
                Err(e) => warn!(error = %e, "insights poll failed"),
            }
        }
    });
    InsightsPoller { handle, latest: rx }
}
