use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio::time::{Instant, Interval, MissedTickBehavior, interval_at};

/// Source of periodic refresh signals.
#[async_trait]
pub trait Ticker: Send {
    /// Resolves at the next refresh.
    async fn tick(&mut self);

    /// Restarts the period, called after the selection changes.
    fn reset(&mut self) {}
}

/// Wall-clock ticker. The first tick fires one full period after creation.
pub struct IntervalTicker {
    interval: Interval,
}

impl IntervalTicker {
    pub fn new(period: Duration) -> Self {
        let mut interval = interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        Self { interval }
    }
}

#[async_trait]
impl Ticker for IntervalTicker {
    async fn tick(&mut self) {
        self.interval.tick().await;
    }

    fn reset(&mut self) {
        self.interval.reset();
    }
}

/// Ticks whenever the paired sender is signalled. Once every sender is gone
/// it never ticks again.
pub struct ChannelTicker {
    rx: mpsc::UnboundedReceiver<()>,
}

impl ChannelTicker {
    pub fn new() -> (mpsc::UnboundedSender<()>, Self) {
        let (tx, rx) = mpsc::unbounded_channel();
        (tx, Self { rx })
    }
}

#[async_trait]
impl Ticker for ChannelTicker {
    async fn tick(&mut self) {
        if self.rx.recv().await.is_none() {
            std::future::pending::<()>().await;
        }
    }
}
