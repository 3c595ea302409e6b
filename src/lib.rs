//! Library surface for `relay-bridge`'s binary: the config/policy types,
//! the HTTP/WebSocket gateway, the relay session, and process-wide shared
//! state. Split out of `main.rs` so integration tests can drive the router
//! directly over loopback TCP instead of shelling out to the binary.

pub mod config;
pub mod gateway;
pub mod observability;
pub mod relay;
pub mod state;
