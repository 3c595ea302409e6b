use std::sync::Arc;

use bridge_coordinator::{CoordinatorClient, ServerListCache};

use crate::config::Policy;

/// Shared state handed to every axum handler.
#[derive(Clone)]
pub struct AppState {
    pub policy: Arc<Policy>,
    pub coordinator: CoordinatorClient,
    pub cache: Arc<ServerListCache>,
}

impl AppState {
    pub fn new(policy: Arc<Policy>) -> Self {
        let coordinator = CoordinatorClient::new(policy.coordinator_addr);
        let cache = Arc::new(ServerListCache::new(coordinator, policy.cache_ttl));
        Self {
            policy,
            coordinator,
            cache,
        }
    }
}
