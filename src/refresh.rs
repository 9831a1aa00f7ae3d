//! Refresh-episode coordination: one refresh call per episode, deferred replays for every
//! other request caught in it.
//!
//! [`RefreshCoordinator`] is an explicit two-state machine. While `Idle`, the first caller
//! to observe a `401` receives a [`RefreshLease`] and becomes responsible for the single
//! refresh call. While `Refreshing`, every other caller receives a [`PendingReplay`], a
//! future that resolves once the lease settles. Settling drains the queue in one pass, in
//! registration order: on success every waiter gets the new access token, on failure every
//! waiter gets the same [`RefreshFailure`]. A lease dropped before it settles (for example
//! because the caller's future was cancelled) rejects the queue as abandoned, so no waiter
//! can hang on an episode nobody is driving.
//!
//! A `401` can also arrive after the episode it belongs to has already settled. Callers
//! capture an [`Epoch`] before sending, and [`RefreshCoordinator::begin`] compares it with
//! the settled episodes in the same critical section that elects the leader, so a late
//! `401` replays with the settled token instead of starting a second refresh.
//!
//! The state lives behind a short, non-async lock that is never held across an `.await`;
//! the check-and-set that elects the leader is therefore atomic with respect to every other
//! task, whether the executor is single- or multi-threaded.

mod metrics;

pub use metrics::RefreshMetrics;

// std
use std::task::{Context, Poll};
// crates.io
use futures::channel::oneshot;
// self
use crate::{_prelude::*, auth::TokenSecret, error::RefreshFailure, obs};

/// Result delivered to every caller waiting on a refresh episode.
pub type ReplayOutcome = Result<TokenSecret, RefreshFailure>;

/// Coordinator position captured before a request is sent.
///
/// Handing it back to [`RefreshCoordinator::begin`] tells the coordinator whether an
/// episode settled while the request was in flight.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Epoch(u64);

#[derive(Default)]
enum RefreshState {
	#[default]
	Idle,
	Refreshing { waiters: Vec<oneshot::Sender<ReplayOutcome>> },
}

#[derive(Default)]
struct Episodes {
	state: RefreshState,
	settled: u64,
	last: Option<ReplayOutcome>,
}

/// Owned `Idle`/`Refreshing` state machine plus the queue of deferred replays.
#[derive(Default)]
pub struct RefreshCoordinator {
	episodes: Mutex<Episodes>,
	metrics: RefreshMetrics,
}
impl RefreshCoordinator {
	/// Captures the coordinator position; take it before reading the token a request is
	/// sent with.
	pub fn epoch(&self) -> Epoch {
		Epoch(self.episodes.lock().settled)
	}

	/// Decides what a caller whose request (sent at `sent`, with `sent_with`) was answered
	/// `401` must do.
	///
	/// The decision is made under one lock acquisition:
	/// - an outstanding episode queues the caller;
	/// - an episode settled since `sent` whose token differs from `sent_with` is handed back
	///   as-is, so the caller replays with it (or gives up if it failed);
	/// - otherwise the caller starts a new episode.
	pub fn begin(self: &Arc<Self>, sent: Epoch, sent_with: Option<&TokenSecret>) -> RefreshTicket {
		let mut episodes = self.episodes.lock();

		if let RefreshState::Refreshing { waiters } = &mut episodes.state {
			let (tx, rx) = oneshot::channel();

			waiters.push(tx);

			drop(episodes);
			self.metrics.record_queued();

			return RefreshTicket::Follower(PendingReplay(rx));
		}
		if episodes.settled != sent.0
			&& let Some(last) = &episodes.last
		{
			let superseded = match last {
				Ok(token) => sent_with != Some(token),
				Err(_) => true,
			};

			if superseded {
				return RefreshTicket::Settled(last.clone());
			}
		}

		episodes.state = RefreshState::Refreshing { waiters: Vec::new() };

		drop(episodes);
		self.metrics.record_attempt();
		obs::refresh_event("begin", 0);

		RefreshTicket::Leader(RefreshLease { coordinator: self.clone(), settled: false })
	}

	/// Returns `true` while a refresh call is outstanding.
	pub fn is_refreshing(&self) -> bool {
		matches!(self.episodes.lock().state, RefreshState::Refreshing { .. })
	}

	/// Number of callers currently queued behind the outstanding refresh.
	pub fn pending(&self) -> usize {
		match &self.episodes.lock().state {
			RefreshState::Idle => 0,
			RefreshState::Refreshing { waiters } => waiters.len(),
		}
	}

	/// Refresh counters.
	pub fn metrics(&self) -> &RefreshMetrics {
		&self.metrics
	}

	/// Returns to `Idle` and fans `outcome` out. Only a `conclusive` outcome advances the
	/// epoch; an abandoned episode leaves the session as it found it.
	fn finish(&self, outcome: &ReplayOutcome, conclusive: bool) -> usize {
		let waiters = {
			let mut episodes = self.episodes.lock();

			if conclusive {
				episodes.settled += 1;
				episodes.last = Some(outcome.clone());
			}

			match std::mem::take(&mut episodes.state) {
				RefreshState::Idle => Vec::new(),
				RefreshState::Refreshing { waiters } => waiters,
			}
		};
		let count = waiters.len();

		match outcome {
			Ok(_) => self.metrics.record_success(),
			Err(_) => self.metrics.record_failure(),
		}

		obs::refresh_event(if outcome.is_ok() { "settled" } else { "failed" }, count);

		for waiter in waiters {
			// A waiter whose caller went away has nothing left to replay.
			let _ = waiter.send(outcome.clone());
		}

		count
	}
}
impl Debug for RefreshCoordinator {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("RefreshCoordinator")
			.field("epoch", &self.epoch())
			.field("refreshing", &self.is_refreshing())
			.field("pending", &self.pending())
			.finish()
	}
}

/// Role handed to a caller that observed a `401`.
#[derive(Debug)]
pub enum RefreshTicket {
	/// The caller must perform the refresh call and settle the lease.
	Leader(RefreshLease),
	/// The caller must wait for the outstanding refresh to settle.
	Follower(PendingReplay),
	/// An episode settled after the caller's request went out; this is its outcome.
	Settled(ReplayOutcome),
}

/// Obligation to settle the current refresh episode.
pub struct RefreshLease {
	coordinator: Arc<RefreshCoordinator>,
	settled: bool,
}
impl RefreshLease {
	/// Ends the episode, returning the coordinator to `Idle` and delivering `outcome` to
	/// every queued caller. Returns the number of callers notified.
	pub fn settle(mut self, outcome: ReplayOutcome) -> usize {
		self.settled = true;

		self.coordinator.finish(&outcome, true)
	}
}
impl Drop for RefreshLease {
	fn drop(&mut self) {
		if !self.settled {
			self.coordinator.finish(&Err(RefreshFailure::abandoned()), false);
		}
	}
}
impl Debug for RefreshLease {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("RefreshLease").field("settled", &self.settled).finish()
	}
}

/// Deferred result of a request queued behind an outstanding refresh.
#[derive(Debug)]
pub struct PendingReplay(oneshot::Receiver<ReplayOutcome>);
impl Future for PendingReplay {
	type Output = ReplayOutcome;

	fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
		Pin::new(&mut self.0)
			.poll(cx)
			.map(|received| received.unwrap_or_else(|_| Err(RefreshFailure::abandoned())))
	}
}
