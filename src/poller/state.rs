//! The poller's state machine, free of any I/O.
//!
//! ```text
//!   Idle --select(Some)--> Loading --ok--> Ready
//!                            |  ^            |
//!                          err  +---tick-----+
//!                            v  |
//!                          Failed --tick--> Loading
//!   any --select(None)--> Idle
//! ```

use std::collections::HashMap;

use crate::error::FeedError;
use crate::status::RouteStatus;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PollState {
    #[default]
    Idle,
    Loading,
    Ready,
    Failed,
}

/// A fetch the driver should perform, tagged with the selection it was
/// issued for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollRequest {
    pub route_id: String,
    generation: u64,
}

/// What happened when a fetch outcome was handed back to the poller.
#[derive(Debug)]
pub enum Resolution {
    Ready,
    Failed(FeedError),
    /// The source answered with a status for a different route.
    Mismatched { returned: String },
    /// The selection changed while the fetch was in flight; nothing was
    /// written.
    Stale,
}

/// What consumers read.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PollSnapshot {
    pub route_id: Option<String>,
    pub state: PollState,
    pub status: Option<RouteStatus>,
    pub is_loading: bool,
    pub error: Option<String>,
}

/// Tracks the selected route, the state of its latest poll and one cached
/// status slot per route.
#[derive(Debug, Default)]
pub struct RouteStatusPoller {
    selected: Option<String>,
    generation: u64,
    state: PollState,
    error: Option<String>,
    cache: HashMap<String, RouteStatus>,
}

impl RouteStatusPoller {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> PollState {
        self.state
    }

    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    /// Changes the selected route. Any fetch issued before this call becomes
    /// stale.
    pub fn select(&mut self, route_id: Option<String>) -> Option<PollRequest> {
        self.generation += 1;
        self.error = None;
        self.selected = route_id;

        match self.selected {
            Some(_) => {
                self.state = PollState::Loading;
                self.request()
            }
            None => {
                self.state = PollState::Idle;
                None
            }
        }
    }

    /// Periodic refresh. Nothing is issued while idle or while a fetch is
    /// already in flight.
    pub fn tick(&mut self) -> Option<PollRequest> {
        match self.state {
            PollState::Ready | PollState::Failed => {
                self.state = PollState::Loading;
                self.request()
            }
            PollState::Idle | PollState::Loading => None,
        }
    }

    pub fn is_current(&self, request: &PollRequest) -> bool {
        request.generation == self.generation
            && self.selected.as_deref() == Some(request.route_id.as_str())
    }

    /// Applies the outcome of `request`.
    ///
    /// Failures drop the route's cached status; a stale position without a
    /// freshness indicator is worse than none.
    pub fn resolve(
        &mut self,
        request: &PollRequest,
        outcome: Result<RouteStatus, FeedError>,
    ) -> Resolution {
        if !self.is_current(request) {
            return Resolution::Stale;
        }

        match outcome {
            Ok(status) if status.route_id != request.route_id => {
                self.cache.remove(&request.route_id);
                self.state = PollState::Failed;
                self.error = Some(format!(
                    "feed returned status for route {} while {} was requested",
                    status.route_id, request.route_id
                ));
                Resolution::Mismatched {
                    returned: status.route_id,
                }
            }
            Ok(status) => {
                self.cache.insert(request.route_id.clone(), status);
                self.state = PollState::Ready;
                self.error = None;
                Resolution::Ready
            }
            Err(error) => {
                self.cache.remove(&request.route_id);
                self.state = PollState::Failed;
                self.error = Some(error.to_string());
                Resolution::Failed(error)
            }
        }
    }

    /// Cached status of the selected route, if any.
    pub fn status(&self) -> Option<&RouteStatus> {
        let route_id = self.selected.as_deref()?;
        self.cache
            .get(route_id)
            .filter(|status| status.route_id == route_id)
    }

    pub fn snapshot(&self) -> PollSnapshot {
        PollSnapshot {
            route_id: self.selected.clone(),
            state: self.state,
            status: self.status().cloned(),
            is_loading: self.state == PollState::Loading,
            error: self.error.clone(),
        }
    }

    fn request(&self) -> Option<PollRequest> {
        self.selected.as_ref().map(|route_id| PollRequest {
            route_id: route_id.clone(),
            generation: self.generation,
        })
    }
}
