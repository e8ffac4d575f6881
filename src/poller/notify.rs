use std::sync::Arc;

use tracing::warn;

/// Receives user-facing failure notices from the poller.
pub trait Notifier: Send + Sync {
    fn poll_failed(&self, route_id: &str, message: &str);
}

/// Reports failures through the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn poll_failed(&self, route_id: &str, message: &str) {
        warn!(route_id, error = message, "Failed to fetch route status");
    }
}

impl<N: Notifier + ?Sized> Notifier for Arc<N> {
    fn poll_failed(&self, route_id: &str, message: &str) {
        (**self).poll_failed(route_id, message);
    }
}
