use std::collections::HashSet;
use std::net::SocketAddr;
use std::time::Duration;

use clap::Parser;

/// Coordinator directory service this process talks to for listings and
/// invite resolution.
const DEFAULT_COORDINATOR_ADDR: &str = "coordinator.example.net:3976";

/// Default destination ports the relay is willing to dial: coordinator,
/// content distribution, STUN, and the common game-port range.
fn default_allowed_ports() -> HashSet<u16> {
    [3976, 3977, 3978, 3979, 3980].into_iter().collect()
}

/// Command-line configuration.
#[derive(Debug, Parser)]
#[command(name = "relay-bridge", version, about)]
pub struct Config {
    /// Port to listen on for HTTP and WebSocket traffic.
    #[arg(default_value_t = 8080)]
    pub port: u16,

    /// Log verbosity: error, info, or debug.
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,
}

/// Immutable policy derived from [`Config`] plus the compiled-in defaults.
/// Built once in `main` before any listener is bound.
#[derive(Debug, Clone)]
pub struct Policy {
    pub listen_port: u16,
    pub coordinator_addr: SocketAddr,
    pub allowed_ports: HashSet<u16>,
    /// Empty means accept any host.
    pub allowed_hosts: HashSet<String>,
    pub cache_ttl: Duration,
    pub connect_timeout: Duration,
    pub max_ws_buffered_bytes: u32,
}

impl Policy {
    pub fn from_config(config: &Config, coordinator_addr: SocketAddr) -> Self {
        Self {
            listen_port: config.port,
            coordinator_addr,
            allowed_ports: default_allowed_ports(),
            allowed_hosts: HashSet::new(),
            cache_ttl: Duration::from_secs(60),
            connect_timeout: Duration::from_secs(10),
            max_ws_buffered_bytes: 64 * 1024,
        }
    }

    pub fn port_allowed(&self, port: u16) -> bool {
        self.allowed_ports.contains(&port)
    }

    pub fn host_allowed(&self, host: &str) -> bool {
        self.allowed_hosts.is_empty() || self.allowed_hosts.contains(host)
    }
}

/// Resolves the compiled-in coordinator hostname to a [`SocketAddr`].
///
/// This is a DNS lookup, so it happens once at start-up rather than per
/// request; the coordinator client only ever dials the resolved address.
pub async fn resolve_coordinator_addr() -> anyhow::Result<SocketAddr> {
    use tokio::net::lookup_host;

    lookup_host(DEFAULT_COORDINATOR_ADDR)
        .await?
        .next()
        .ok_or_else(|| anyhow::anyhow!("no addresses for {DEFAULT_COORDINATOR_ADDR}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy(allowed_ports: HashSet<u16>, allowed_hosts: HashSet<String>) -> Policy {
        Policy {
            listen_port: 8080,
            coordinator_addr: "127.0.0.1:1".parse().unwrap(),
            allowed_ports,
            allowed_hosts,
            cache_ttl: Duration::from_secs(60),
            connect_timeout: Duration::from_secs(10),
            max_ws_buffered_bytes: 65536,
        }
    }

    #[test]
    fn empty_host_allow_list_accepts_any_host() {
        let p = policy([3979].into_iter().collect(), HashSet::new());
        assert!(p.host_allowed("anything.example"));
    }

    #[test]
    fn nonempty_host_allow_list_rejects_unknown_host() {
        let p = policy(
            [3979].into_iter().collect(),
            ["ok.example".to_owned()].into_iter().collect(),
        );
        assert!(p.host_allowed("ok.example"));
        assert!(!p.host_allowed("bad.example"));
    }

    #[test]
    fn port_allow_list_is_exact() {
        let p = policy([3979].into_iter().collect(), HashSet::new());
        assert!(p.port_allowed(3979));
        assert!(!p.port_allowed(22));
    }
}
