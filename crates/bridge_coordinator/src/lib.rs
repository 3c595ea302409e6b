//! Client for the coordinator's directory protocol, plus a TTL cache over
//! the server-listing flow.
//!
//! [`CoordinatorClient`] owns a single short-lived TCP session per call and
//! speaks the wire protocol defined in `bridge_protocol`. [`ServerListCache`]
//! sits in front of [`CoordinatorClient::list_servers`] so that many
//! concurrent HTTP requests collapse into one coordinator round trip.

mod cache;
mod client;
mod error;
mod io;

pub use cache::ServerListCache;
pub use client::CoordinatorClient;
pub use error::{ListError, ResolveError};
