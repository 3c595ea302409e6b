use std::sync::Arc;
use std::time::{Duration, Instant};

use bridge_protocol::ServerRecord;
use tokio::sync::{broadcast, Mutex};
use tracing::debug;

use crate::client::CoordinatorClient;
use crate::error::ListError;

#[derive(Clone)]
struct CacheEntry {
    servers: Arc<[ServerRecord]>,
    fetched_at: Instant,
}

/// What a refresh produced, shared with every waiter subscribed to it.
#[derive(Clone)]
enum RefreshOutcome {
    Fetched(Arc<[ServerRecord]>),
    /// The coordinator could not be reached; carries the prior cached value,
    /// if any, so waiters without a fresher alternative can still get data.
    Failed(Option<Arc<[ServerRecord]>>),
}

enum RefreshState {
    Idle,
    /// A refresh is in flight; latecomers subscribe to this channel instead
    /// of starting a second coordinator session.
    InFlight(broadcast::Sender<RefreshOutcome>),
}

struct Inner {
    entry: Option<CacheEntry>,
    state: RefreshState,
}

/// Memoizes the last successful server listing for a fixed TTL, coalescing
/// concurrent refreshes into a single coordinator session.
pub struct ServerListCache {
    client: CoordinatorClient,
    ttl: Duration,
    inner: Mutex<Inner>,
}

impl ServerListCache {
    pub fn new(client: CoordinatorClient, ttl: Duration) -> Self {
        Self {
            client,
            ttl,
            inner: Mutex::new(Inner {
                entry: None,
                state: RefreshState::Idle,
            }),
        }
    }

    /// Returns the cached listing if fresh, otherwise triggers (or joins) a
    /// refresh.
    ///
    /// On a failed refresh (coordinator unreachable), the prior cached
    /// value is returned if one exists; with no prior cache, the failure is
    /// surfaced to the caller so it can respond with an error rather than a
    /// silently empty list. A refresh that succeeds with zero servers is a
    /// legitimate result and is cached like any other.
    pub async fn get(&self) -> Result<Arc<[ServerRecord]>, ListError> {
        let mut guard = self.inner.lock().await;

        if let Some(entry) = &guard.entry {
            if entry.fetched_at.elapsed() < self.ttl {
                return Ok(entry.servers.clone());
            }
        }

        match &guard.state {
            RefreshState::InFlight(tx) => {
                let mut rx = tx.subscribe();
                drop(guard);
                match rx.recv().await {
                    Ok(RefreshOutcome::Fetched(servers)) => Ok(servers),
                    Ok(RefreshOutcome::Failed(Some(stale))) => Ok(stale),
                    Ok(RefreshOutcome::Failed(None)) => Err(ListError::Transport),
                    Err(_) => Err(ListError::Transport),
                }
            }
            RefreshState::Idle => {
                let (tx, _rx) = broadcast::channel(1);
                guard.state = RefreshState::InFlight(tx.clone());
                let stale = guard.entry.as_ref().map(|e| e.servers.clone());
                drop(guard);

                let result = self.client.list_servers().await;

                let mut guard = self.inner.lock().await;
                guard.state = RefreshState::Idle;

                match result {
                    Ok(servers) => {
                        let fetched: Arc<[ServerRecord]> = Arc::from(servers);
                        guard.entry = Some(CacheEntry {
                            servers: fetched.clone(),
                            fetched_at: Instant::now(),
                        });
                        let _ = tx.send(RefreshOutcome::Fetched(fetched.clone()));
                        Ok(fetched)
                    }
                    Err(e) => {
                        debug!(target: "server", error = %e, "refresh failed, keeping prior cache");
                        let _ = tx.send(RefreshOutcome::Failed(stale.clone()));
                        stale.ok_or(e)
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{IpAddr, Ipv4Addr, SocketAddr};

    fn unused_addr() -> SocketAddr {
        // No listener bound here; connect attempts fail fast, which is all
        // this test needs to exercise the no-stale-entry failure path.
        SocketAddr::new(IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1)), 1)
    }

    #[tokio::test]
    async fn failed_refresh_with_no_prior_cache_surfaces_the_error() {
        let cache = ServerListCache::new(
            CoordinatorClient::new(unused_addr()),
            Duration::from_secs(60),
        );
        assert!(cache.get().await.is_err());
    }
}
