use thiserror::Error;

/// Failure modes of the list-servers flow.
///
/// Only raised when the coordinator could not be reached or dropped the
/// connection before any response arrived — once a session is established,
/// the flow degrades to best-effort and returns whatever was accumulated
/// before a later fault (decode error, mid-stream disconnect), including a
/// legitimately empty listing.
#[derive(Debug, Error)]
pub enum ListError {
    #[error("failed to connect to the coordinator")]
    ConnectFailed(#[source] std::io::Error),

    #[error("lost contact with the coordinator before any listing data arrived")]
    Transport,

    #[error("timed out waiting for the coordinator")]
    Timeout,
}

/// Failure modes of the resolve-invite flow.
///
/// The listing flow has its own [`ListError`] and degrades to best-effort
/// past the initial connection. Resolve is strict — any of these is
/// surfaced to the HTTP caller as a `500`.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("coordinator rejected the request: {detail} (code {code})")]
    Coordinator { code: u8, detail: String },

    #[error("coordinator reported the connection attempt failed")]
    ConnectionFailed,

    #[error("timed out waiting for the coordinator")]
    Timeout,

    #[error("malformed response from coordinator")]
    Decode(#[from] bridge_protocol::DecodeError),

    #[error("transport error talking to the coordinator")]
    Transport(#[from] std::io::Error),
}
