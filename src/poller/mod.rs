//! Periodic realtime status polling for the selected route.
//!
//! [`RouteStatusPoller`] holds the state; [`run`] drives it from a selection
//! channel, a [`Ticker`] and a [`StatusSource`], publishing a
//! [`PollSnapshot`] after every transition. At most one fetch is in flight;
//! changing the selection drops it.

mod notify;
mod state;
mod ticker;

pub use notify::{LogNotifier, Notifier};
pub use state::{PollRequest, PollSnapshot, PollState, Resolution, RouteStatusPoller};
pub use ticker::{ChannelTicker, IntervalTicker, Ticker};

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error};

use crate::error::FeedError;
use crate::realtime::StatusSource;
use crate::status::RouteStatus;

type Outcome = (PollRequest, Result<RouteStatus, FeedError>);
type InFlight = Pin<Box<dyn Future<Output = Outcome> + Send>>;

/// Runs the poll loop until the selection sender is dropped.
pub async fn run<S, T, N>(
    source: Arc<S>,
    mut ticker: T,
    notifier: N,
    mut selection: watch::Receiver<Option<String>>,
    snapshots: watch::Sender<PollSnapshot>,
) where
    S: StatusSource + ?Sized + 'static,
    T: Ticker,
    N: Notifier,
{
    let mut poller = RouteStatusPoller::new();

    let initial = selection.borrow_and_update().clone();
    let mut in_flight = poller.select(initial).map(|request| start_fetch(&source, request));
    publish(&snapshots, &poller);

    loop {
        tokio::select! {
            changed = selection.changed() => {
                if changed.is_err() {
                    debug!("Selection channel closed, stopping poller");
                    break;
                }
                let route_id = selection.borrow_and_update().clone();
                debug!(route_id = ?route_id, "Route selection changed");
                in_flight = poller.select(route_id).map(|request| start_fetch(&source, request));
                ticker.reset();
            }
            _ = ticker.tick() => {
                if let Some(request) = poller.tick() {
                    debug!(route_id = %request.route_id, "Refreshing route status");
                    in_flight = Some(start_fetch(&source, request));
                }
            }
            (request, outcome) = next_outcome(&mut in_flight) => {
                in_flight = None;
                match poller.resolve(&request, outcome) {
                    Resolution::Ready => {}
                    Resolution::Failed(err) => {
                        error!(route_id = %request.route_id, error = %err, kind = ?err.kind(), "Route status poll failed");
                        notifier.poll_failed(&request.route_id, &err.to_string());
                    }
                    Resolution::Mismatched { returned } => {
                        error!(route_id = %request.route_id, returned = %returned, "Feed answered for a different route");
                        notifier.poll_failed(&request.route_id, "received status for a different route");
                    }
                    Resolution::Stale => {
                        debug!(route_id = %request.route_id, "Discarding stale poll result");
                    }
                }
            }
        }
        publish(&snapshots, &poller);
    }
}

fn start_fetch<S>(source: &Arc<S>, request: PollRequest) -> InFlight
where
    S: StatusSource + ?Sized + 'static,
{
    let source = Arc::clone(source);
    Box::pin(async move {
        let outcome = source.fetch_route_status(&request.route_id).await;
        (request, outcome)
    })
}

async fn next_outcome(in_flight: &mut Option<InFlight>) -> Outcome {
    match in_flight.as_mut() {
        Some(fetch) => fetch.await,
        None => std::future::pending().await,
    }
}

fn publish(snapshots: &watch::Sender<PollSnapshot>, poller: &RouteStatusPoller) {
    let next = poller.snapshot();
    snapshots.send_if_modified(|current| {
        if *current == next {
            false
        } else {
            *current = next;
            true
        }
    });
}

/// A poll loop running on its own task.
pub struct PollerHandle {
    selection: watch::Sender<Option<String>>,
    snapshots: watch::Receiver<PollSnapshot>,
    task: JoinHandle<()>,
}

impl PollerHandle {
    pub fn spawn<S, T, N>(source: Arc<S>, ticker: T, notifier: N) -> Self
    where
        S: StatusSource + ?Sized + 'static,
        T: Ticker + 'static,
        N: Notifier + 'static,
    {
        let (selection, selection_rx) = watch::channel(None);
        let (snapshots_tx, snapshots) = watch::channel(PollSnapshot::default());
        let task = tokio::spawn(run(source, ticker, notifier, selection_rx, snapshots_tx));
        Self {
            selection,
            snapshots,
            task,
        }
    }

    /// Selects a route, or clears the selection with `None`.
    pub fn select(&self, route_id: Option<String>) {
        self.selection.send_replace(route_id);
    }

    pub fn snapshot(&self) -> PollSnapshot {
        self.snapshots.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<PollSnapshot> {
        self.snapshots.clone()
    }

    /// Stops the loop, discarding any fetch still in flight.
    pub async fn shutdown(self) {
        drop(self.selection);
        if let Err(err) = self.task.await {
            error!(error = %err, "Poller task ended abnormally");
        }
    }
}
