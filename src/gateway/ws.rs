use std::net::SocketAddr;

use axum::extract::ws::{CloseFrame, Message, WebSocketUpgrade};
use axum::extract::{ConnectInfo, Path, State};
use axum::response::Response;
use tracing::{info, warn};

use crate::relay;
use crate::state::AppState;

/// Close code for requests rejected by policy before any backend socket is
/// opened.
const CLOSE_POLICY_VIOLATION: u16 = 1008;

/// `GET /connect/:host/:port`.
///
/// Port/host admission happens here, synchronously, before the WebSocket
/// upgrade completes — a rejected request never dials a backend socket.
pub(crate) async fn upgrade(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    Path((host, port_str)): Path<(String, String)>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
) -> Response {
    let Ok(port) = port_str.parse::<u16>() else {
        return reject(ws, "Malformed port");
    };

    if host.is_empty() {
        return reject(ws, "Missing host");
    }

    if !state.policy.port_allowed(port) {
        warn!(target: "ws", %peer, %host, port, "rejected: port not allowed");
        return reject(ws, "Port not allowed");
    }

    if !state.policy.host_allowed(&host) {
        warn!(target: "ws", %peer, %host, port, "rejected: host not allowed");
        return reject(ws, "Host not allowed");
    }

    let target = match tokio::net::lookup_host((host.as_str(), port))
        .await
        .ok()
        .and_then(|mut addrs| addrs.next())
    {
        Some(addr) => addr,
        None => return reject(ws, "Host not allowed"),
    };

    info!(target: "ws", %peer, %host, port, "connect admitted");

    ws.on_upgrade(move |socket| async move {
        relay::run(socket, target, &state.policy, peer.to_string()).await;
    })
}

fn reject(ws: WebSocketUpgrade, reason: &'static str) -> Response {
    ws.on_upgrade(move |mut socket| async move {
        let _ = socket
            .send(Message::Close(Some(CloseFrame {
                code: CLOSE_POLICY_VIOLATION,
                reason: reason.into(),
            })))
            .await;
    })
}
