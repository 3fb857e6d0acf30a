//! Single-flight token refresh coordination
//!
//! Many requests can observe an expired access token at the same time.
//! The coordinator guarantees that only one refresh call reaches the
//! network per episode: the first caller to find the machine `Idle`
//! becomes the leader and starts the refresh, every concurrent caller
//! parks as a waiter, and all of them receive the leader's outcome when
//! the call settles.
//!
//! A failed refresh is definitionally a logout condition: the credential
//! store is cleared and a single [`LogoutEvent`] is broadcast, no matter
//! how many requests were parked on the episode.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use campfire_domain::ApiError;
use tokio::sync::{broadcast, oneshot, Mutex};
use tracing::{debug, info, warn};

use super::store::TokenStore;
use super::types::TokenPair;

/// Default upper bound on one refresh episode
///
/// Bounds how long waiters can be parked on a transport that hangs.
const DEFAULT_REFRESH_TIMEOUT: Duration = Duration::from_secs(30);

/// Capacity of the logout broadcast channel
const LOGOUT_CHANNEL_CAPACITY: usize = 16;

/// Outcome of a refresh episode, delivered to the leader and every waiter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// A new token pair is in the store; retry the original request once
    Retry,
    /// Refresh failed terminally; the session is over, do not retry
    Abandon,
}

/// Broadcast payload emitted once per failed refresh episode
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogoutEvent {
    /// Why the session ended
    pub reason: String,
}

/// Transport responsible for the refresh endpoint call
///
/// The implementation must surface a 401 from the refresh endpoint as an
/// ordinary error: the coordinator treats every refresh failure as
/// terminal and never refreshes a refresh.
#[async_trait]
pub trait RefreshTransport: Send + Sync {
    /// Exchange a refresh token for a new token pair
    async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, ApiError>;
}

/// The two states of the refresh machine
///
/// Waiters exist only while an episode is running; draining them and
/// returning to `Idle` happens in one critical section so no waiter can
/// be left behind or resolved twice.
enum RefreshState {
    Idle,
    Refreshing { waiters: Vec<oneshot::Sender<RefreshOutcome>> },
}

/// Coordinates token refresh across concurrent requests
///
/// Cheap to clone; clones share the same episode state, store, and
/// logout channel.
#[derive(Clone)]
pub struct RefreshCoordinator {
    store: Arc<dyn TokenStore>,
    transport: Arc<dyn RefreshTransport>,
    state: Arc<Mutex<RefreshState>>,
    logout_tx: broadcast::Sender<LogoutEvent>,
    refresh_timeout: Duration,
}

impl RefreshCoordinator {
    /// Create a coordinator with the default refresh timeout
    #[must_use]
    pub fn new(store: Arc<dyn TokenStore>, transport: Arc<dyn RefreshTransport>) -> Self {
        Self::with_timeout(store, transport, DEFAULT_REFRESH_TIMEOUT)
    }

    /// Create a coordinator with an explicit refresh timeout
    ///
    /// A transport call that outlives the timeout is treated as a failed
    /// episode so parked waiters cannot block indefinitely.
    #[must_use]
    pub fn with_timeout(
        store: Arc<dyn TokenStore>,
        transport: Arc<dyn RefreshTransport>,
        refresh_timeout: Duration,
    ) -> Self {
        let (logout_tx, _) = broadcast::channel(LOGOUT_CHANNEL_CAPACITY);

        Self {
            store,
            transport,
            state: Arc::new(Mutex::new(RefreshState::Idle)),
            logout_tx,
            refresh_timeout,
        }
    }

    /// Subscribe to the logout broadcast
    ///
    /// At most one event is sent per failed refresh episode. Subscribers
    /// that join after an event was sent do not see it.
    #[must_use]
    pub fn subscribe_logout(&self) -> broadcast::Receiver<LogoutEvent> {
        self.logout_tx.subscribe()
    }

    /// Join the current refresh episode, starting one if none is running
    ///
    /// Called by a request that observed 401 on a non-refresh endpoint.
    /// Returns once the episode settles. Waiters are resumed in no
    /// particular order.
    ///
    /// The episode itself runs on a detached task, so a caller that is
    /// cancelled while parked neither wedges the episode nor affects the
    /// outcome delivered to the others.
    pub async fn acquire(&self) -> RefreshOutcome {
        let (tx, rx) = oneshot::channel();

        let lead = {
            let mut state = self.state.lock().await;
            match &mut *state {
                RefreshState::Idle => {
                    *state = RefreshState::Refreshing { waiters: vec![tx] };
                    true
                }
                RefreshState::Refreshing { waiters } => {
                    waiters.push(tx);
                    false
                }
            }
        };

        if lead {
            debug!("starting token refresh episode");
            let coordinator = self.clone();
            tokio::spawn(async move { coordinator.drive_episode().await });
        }

        // The episode task always settles and drains the queue; a closed
        // channel can only mean it was torn down mid-flight.
        rx.await.unwrap_or(RefreshOutcome::Abandon)
    }

    /// Run one refresh episode to completion and resolve every waiter
    async fn drive_episode(&self) {
        let outcome = match self.run_refresh().await {
            Ok(tokens) => {
                // The new pair must be visible before any waiter retries.
                self.store.set(tokens).await;
                info!("token refresh succeeded");
                RefreshOutcome::Retry
            }
            Err(reason) => {
                warn!(%reason, "token refresh failed, ending session");
                self.store.clear().await;
                // Nobody listening is fine; the event is best-effort fan-out.
                let _ = self.logout_tx.send(LogoutEvent { reason });
                RefreshOutcome::Abandon
            }
        };

        let waiters = {
            let mut state = self.state.lock().await;
            match std::mem::replace(&mut *state, RefreshState::Idle) {
                RefreshState::Refreshing { waiters } => waiters,
                RefreshState::Idle => Vec::new(),
            }
        };

        debug!(waiters = waiters.len(), ?outcome, "refresh episode settled");
        for waiter in waiters {
            // A dropped receiver means that caller went away; ignore it.
            let _ = waiter.send(outcome);
        }
    }

    async fn run_refresh(&self) -> Result<TokenPair, String> {
        let refresh_token = match self.store.get().await {
            Some(pair) => pair.refresh,
            None => return Err("no refresh token available".to_string()),
        };

        match tokio::time::timeout(self.refresh_timeout, self.transport.refresh(&refresh_token))
            .await
        {
            Ok(Ok(tokens)) => Ok(tokens),
            Ok(Err(err)) => Err(err.to_string()),
            Err(_) => Err(format!("refresh call timed out after {:?}", self.refresh_timeout)),
        }
    }
}

impl std::fmt::Debug for RefreshCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RefreshCoordinator")
            .field("refresh_timeout", &self.refresh_timeout)
            .finish_non_exhaustive()
    }
}
