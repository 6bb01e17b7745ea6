//! Request state machines for the calculator session.
//!
//! `RequestTracker` drives the prediction request lifecycle
//! (Idle → InFlight → Success | Failed, re-enterable forever) and
//! `ResolutionTracker` serializes location resolutions. Both issue
//! monotonically increasing tokens so that a late completion belonging to a
//! superseded request is recognised and discarded.

use crate::error::Failure;

/// Identifies one started request. Tokens only ever increase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestToken(u64);

impl RequestToken {
    pub fn value(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for RequestToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Outcome of delivering a completion to a tracker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// The completion belonged to the current request and was recorded.
    Applied,
    /// The completion belonged to a superseded request and was dropped.
    Stale,
}

impl Completion {
    pub fn is_applied(self) -> bool {
        matches!(self, Completion::Applied)
    }
}

/// Lifecycle of the prediction request.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum RequestState<T> {
    #[default]
    Idle,
    InFlight(RequestToken),
    Success(T),
    Failed(Failure),
}

impl<T> RequestState<T> {
    pub fn is_in_flight(&self) -> bool {
        matches!(self, RequestState::InFlight(_))
    }

    pub fn success(&self) -> Option<&T> {
        match self {
            RequestState::Success(value) => Some(value),
            _ => None,
        }
    }

    pub fn failure(&self) -> Option<&Failure> {
        match self {
            RequestState::Failed(failure) => Some(failure),
            _ => None,
        }
    }
}

/// Token-guarded wrapper around [`RequestState`].
///
/// A new `begin` always supersedes whatever state came before, including an
/// in-flight request; only the most recently issued token may complete.
#[derive(Debug, Clone)]
pub struct RequestTracker<T> {
    state: RequestState<T>,
    issued: u64,
}

impl<T> Default for RequestTracker<T> {
    fn default() -> Self {
        Self {
            state: RequestState::Idle,
            issued: 0,
        }
    }
}

impl<T> RequestTracker<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &RequestState<T> {
        &self.state
    }

    pub fn is_in_flight(&self) -> bool {
        self.state.is_in_flight()
    }

    /// Start a new request, superseding the current state.
    pub fn begin(&mut self) -> RequestToken {
        self.issued += 1;
        let token = RequestToken(self.issued);
        if let RequestState::InFlight(previous) = self.state {
            tracing::debug!("Request {} superseded by {}", previous, token);
        }
        self.state = RequestState::InFlight(token);
        token
    }

    /// True if `token` is the request the tracker is currently waiting for.
    pub fn is_current(&self, token: RequestToken) -> bool {
        matches!(self.state, RequestState::InFlight(current) if current == token)
    }

    /// Record the outcome of the request identified by `token`.
    pub fn complete(&mut self, token: RequestToken, outcome: Result<T, Failure>) -> Completion {
        if !self.is_current(token) {
            tracing::debug!("Discarding stale completion for request {}", token);
            return Completion::Stale;
        }

        self.state = match outcome {
            Ok(value) => RequestState::Success(value),
            Err(failure) => RequestState::Failed(failure),
        };
        Completion::Applied
    }

    /// Drop the request identified by `token` without an outcome, returning to
    /// `Idle` if it is still the one in flight.
    pub fn cancel(&mut self, token: RequestToken) -> Completion {
        if !self.is_current(token) {
            return Completion::Stale;
        }
        tracing::debug!("Request {} cancelled", token);
        self.state = RequestState::Idle;
        Completion::Applied
    }
}

/// Which strategy a running resolution uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionKind {
    Device,
    Place,
}

/// Location resolution state. Only one resolution may run at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResolutionState {
    #[default]
    Idle,
    Resolving {
        token: RequestToken,
        kind: ResolutionKind,
    },
}

/// Serializes location resolutions.
#[derive(Debug, Clone, Default)]
pub struct ResolutionTracker {
    state: ResolutionState,
    issued: u64,
}

impl ResolutionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> ResolutionState {
        self.state
    }

    /// True if a new resolution can be started.
    pub fn can_start(&self) -> bool {
        matches!(self.state, ResolutionState::Idle)
    }

    /// Kind of the running resolution, if any.
    pub fn running(&self) -> Option<ResolutionKind> {
        match self.state {
            ResolutionState::Resolving { kind, .. } => Some(kind),
            ResolutionState::Idle => None,
        }
    }

    /// Start a resolution; `None` while another one is running.
    pub fn try_begin(&mut self, kind: ResolutionKind) -> Option<RequestToken> {
        if !self.can_start() {
            return None;
        }
        self.issued += 1;
        let token = RequestToken(self.issued);
        self.state = ResolutionState::Resolving { token, kind };
        Some(token)
    }

    /// State after the resolution identified by `token` finished.
    pub fn finish(&mut self, token: RequestToken) -> Completion {
        match self.state {
            ResolutionState::Resolving { token: current, .. } if current == token => {
                self.state = ResolutionState::Idle;
                Completion::Applied
            }
            _ => {
                tracing::debug!("Discarding stale resolution {}", token);
                Completion::Stale
            }
        }
    }

    /// Forget the running resolution so its late result is discarded.
    pub fn invalidate(&mut self) {
        if let ResolutionState::Resolving { token, .. } = self.state {
            tracing::debug!("Resolution {} invalidated", token);
        }
        self.state = ResolutionState::Idle;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn failure() -> Failure {
        Failure::new(ErrorKind::Backend, "boom")
    }

    #[test]
    fn tracker_starts_idle() {
        let tracker: RequestTracker<u32> = RequestTracker::new();
        assert_eq!(tracker.state(), &RequestState::Idle);
        assert!(!tracker.is_in_flight());
    }

    #[test]
    fn begin_transitions_to_in_flight() {
        let mut tracker: RequestTracker<u32> = RequestTracker::new();
        let token = tracker.begin();
        assert_eq!(tracker.state(), &RequestState::InFlight(token));
        assert!(tracker.is_current(token));
    }

    #[test]
    fn success_and_failure_are_recorded() {
        let mut tracker = RequestTracker::new();
        let token = tracker.begin();
        assert_eq!(tracker.complete(token, Ok(7)), Completion::Applied);
        assert_eq!(tracker.state().success(), Some(&7));

        let token = tracker.begin();
        assert_eq!(tracker.complete(token, Err(failure())), Completion::Applied);
        assert_eq!(tracker.state().failure(), Some(&failure()));
        assert!(tracker.state().success().is_none());
    }

    #[test]
    fn tokens_increase_monotonically() {
        let mut tracker: RequestTracker<u32> = RequestTracker::new();
        let first = tracker.begin();
        let second = tracker.begin();
        assert!(second > first);
        assert_eq!(second.value(), first.value() + 1);
    }

    #[test]
    fn superseded_completion_is_stale() {
        let mut tracker = RequestTracker::new();
        let first = tracker.begin();
        let second = tracker.begin();

        assert_eq!(tracker.complete(second, Ok(2)), Completion::Applied);
        assert_eq!(tracker.complete(first, Ok(1)), Completion::Stale);
        assert_eq!(tracker.state().success(), Some(&2));
    }

    #[test]
    fn duplicate_completion_is_stale() {
        let mut tracker = RequestTracker::new();
        let token = tracker.begin();
        assert!(tracker.complete(token, Ok(1)).is_applied());
        assert_eq!(tracker.complete(token, Err(failure())), Completion::Stale);
        assert_eq!(tracker.state().success(), Some(&1));
    }

    #[test]
    fn cancel_returns_to_idle_only_for_current_request() {
        let mut tracker: RequestTracker<u32> = RequestTracker::new();
        let first = tracker.begin();
        let second = tracker.begin();

        assert_eq!(tracker.cancel(first), Completion::Stale);
        assert!(tracker.is_in_flight());

        assert_eq!(tracker.cancel(second), Completion::Applied);
        assert_eq!(tracker.state(), &RequestState::Idle);
        assert_eq!(tracker.complete(second, Ok(1)), Completion::Stale);
    }

    #[test]
    fn idle_resolution_allows_start() {
        let mut tracker = ResolutionTracker::new();
        assert!(tracker.can_start());
        let token = tracker.try_begin(ResolutionKind::Place);
        assert!(token.is_some());
        assert_eq!(tracker.running(), Some(ResolutionKind::Place));
    }

    #[test]
    fn running_resolution_blocks_start() {
        let mut tracker = ResolutionTracker::new();
        tracker.try_begin(ResolutionKind::Device);
        assert!(!tracker.can_start());
        assert!(tracker.try_begin(ResolutionKind::Place).is_none());
    }

    #[test]
    fn finish_transitions_to_idle() {
        let mut tracker = ResolutionTracker::new();
        let token = tracker.try_begin(ResolutionKind::Device).unwrap();
        assert_eq!(tracker.finish(token), Completion::Applied);
        assert_eq!(tracker.state(), ResolutionState::Idle);
    }

    #[test]
    fn invalidated_resolution_finishes_stale() {
        let mut tracker = ResolutionTracker::new();
        let token = tracker.try_begin(ResolutionKind::Place).unwrap();
        tracker.invalidate();
        assert_eq!(tracker.finish(token), Completion::Stale);

        let next = tracker.try_begin(ResolutionKind::Device).unwrap();
        assert!(next > token);
        assert_eq!(tracker.finish(token), Completion::Stale);
        assert_eq!(tracker.running(), Some(ResolutionKind::Device));
    }
}
