//! Passive network reachability gate
//!
//! The executor never blocks on reachability: it reads the latest
//! published state with a single synchronous borrow and fails fast with
//! `Disconnected` when offline. Whoever observes the platform network
//! state (or the built-in probe loop) publishes transitions through the
//! monitor.

use std::time::Duration;

use reqwest::Method;
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::http::HttpClient;

/// Publisher side of the reachability signal
pub struct ConnectivityMonitor {
    tx: watch::Sender<bool>,
}

impl ConnectivityMonitor {
    /// Create a monitor with an initial reachability assumption
    #[must_use]
    pub fn new(initially_online: bool) -> Self {
        let (tx, _) = watch::channel(initially_online);
        Self { tx }
    }

    /// Handle for request-side reads
    #[must_use]
    pub fn gate(&self) -> ConnectivityGate {
        ConnectivityGate { rx: self.tx.subscribe() }
    }

    /// Publish a reachability transition
    pub fn set_online(&self, online: bool) {
        let previous = self.tx.send_replace(online);
        if previous != online {
            debug!(online, "connectivity changed");
        }
    }

    /// Probe `url` on a fixed interval and publish the result until the
    /// task is dropped
    ///
    /// Reachability is inferred from whether the request completes at all;
    /// the response status is irrelevant. Intended to be spawned:
    ///
    /// ```no_run
    /// # use std::time::Duration;
    /// # use campfire_infra::api::ConnectivityMonitor;
    /// # use campfire_infra::http::HttpClient;
    /// # fn example(monitor: ConnectivityMonitor, http: HttpClient) {
    /// tokio::spawn(async move {
    ///     monitor.run_probe(http, "https://api.campfire.app/v1/health".into(), Duration::from_secs(30)).await;
    /// });
    /// # }
    /// ```
    pub async fn run_probe(&self, http: HttpClient, url: String, interval: Duration) {
        loop {
            let online = http.send(http.request(Method::HEAD, &url)).await.is_ok();
            if !online {
                warn!(%url, "connectivity probe failed");
            }
            self.set_online(online);
            tokio::time::sleep(interval).await;
        }
    }
}

/// Read side of the reachability signal
#[derive(Debug, Clone)]
pub struct ConnectivityGate {
    rx: watch::Receiver<bool>,
}

impl ConnectivityGate {
    /// Gate that always reports online, for callers without a monitor
    #[must_use]
    pub fn assume_online() -> Self {
        let (_tx, rx) = watch::channel(true);
        Self { rx }
    }

    /// Latest published reachability state
    #[must_use]
    pub fn is_online(&self) -> bool {
        *self.rx.borrow()
    }
}
