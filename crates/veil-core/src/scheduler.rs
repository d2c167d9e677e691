//! `Scheduler` implementations.

use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

use async_trait::async_trait;

use crate::traits::Scheduler;

/// Wall-clock scheduler backed by `tokio::time::sleep`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioScheduler;

#[async_trait]
impl Scheduler for TokioScheduler {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// A scheduler that never waits. It advances a virtual clock and records
/// every requested delay, so timed sequences can be asserted instantly.
#[derive(Debug, Clone, Default)]
pub struct VirtualScheduler {
    sleeps: Arc<Mutex<Vec<Duration>>>,
}

impl VirtualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total virtual time elapsed so far.
    pub fn elapsed(&self) -> Duration {
        self.sleeps().iter().sum()
    }

    /// Every delay requested, in order.
    pub fn sleeps(&self) -> Vec<Duration> {
        match self.sleeps.lock() {
            Ok(sleeps) => sleeps.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

#[async_trait]
impl Scheduler for VirtualScheduler {
    async fn sleep(&self, duration: Duration) {
        match self.sleeps.lock() {
            Ok(mut sleeps) => sleeps.push(duration),
            Err(poisoned) => poisoned.into_inner().push(duration),
        }
        tokio::task::yield_now().await;
    }
}
