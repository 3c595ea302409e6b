use std::net::SocketAddr;
use std::time::Duration;

use axum::extract::ws::{CloseFrame, Message, WebSocket};
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::time;
use tracing::{debug, info, warn};

use crate::config::Policy;

const READ_CHUNK_SIZE: usize = 16 * 1024;

/// Close code conveying a clean, expected end of session.
const CLOSE_NORMAL: u16 = 1000;
/// Close code conveying a transport-level failure on either side.
const CLOSE_TRANSPORT_ERROR: u16 = 1011;

/// Why one direction's forwarding loop ended.
#[derive(Clone, Copy)]
enum EndReason {
    Normal,
    TransportError,
}

impl EndReason {
    fn close_frame(self, reason: &'static str) -> Message {
        let code = match self {
            EndReason::Normal => CLOSE_NORMAL,
            EndReason::TransportError => CLOSE_TRANSPORT_ERROR,
        };
        Message::Close(Some(CloseFrame {
            code,
            reason: reason.into(),
        }))
    }
}

/// Runs one relay session end to end: dial the backend, flush whatever the
/// client sent while we were dialing, then forward bytes in both directions
/// until either side closes.
///
/// Policy admission (port/host allow-list) has already happened by the time
/// this is called — this function only ever dials sockets it's been told
/// are permitted.
pub async fn run(socket: WebSocket, target: SocketAddr, policy: &Policy, peer: String) {
    let (mut ws_tx, mut ws_rx) = socket.split();

    let tcp_stream = match connect_with_preconnect_buffer(&mut ws_tx, &mut ws_rx, target, policy)
        .await
    {
        Some(stream) => stream,
        None => return,
    };

    info!(target: "proxy", %peer, %target, "relay session open");

    if let Err(e) = tcp_stream.set_nodelay(true) {
        debug!(target: "proxy", error = %e, "failed to set TCP_NODELAY");
    }

    let (tcp_rx, tcp_tx) = tcp_stream.into_split();

    // Outbound WebSocket messages flow through this channel so that the
    // close frame picked by whichever direction ends first is the one that
    // actually reaches the client, instead of each direction fighting over
    // `ws_tx` directly. Capacity 1 preserves the one-chunk-in-flight
    // backpressure the two reader loops already give each other.
    let (out_tx, out_rx) = mpsc::channel::<Message>(1);

    let writer = tokio::spawn(writer_task(ws_tx, out_rx));
    let mut ws_to_tcp = tokio::spawn(ws_to_tcp_task(ws_rx, tcp_tx, out_tx.clone()));
    let mut tcp_to_ws = tokio::spawn(tcp_to_ws_task(tcp_rx, out_tx));

    // Whichever direction ends first decides the session's fate; the other
    // is aborted rather than left to run on detached, still holding its
    // half of the TCP socket (and the WebSocket send half) open.
    tokio::select! {
        _ = &mut ws_to_tcp => {
            tcp_to_ws.abort();
            let _ = tcp_to_ws.await;
        }
        _ = &mut tcp_to_ws => {
            ws_to_tcp.abort();
            let _ = ws_to_tcp.await;
        }
    }

    // Both reader tasks are now done, so every clone of `out_tx` has been
    // dropped; the writer drains whatever close frame was queued and exits
    // on its own once the channel closes.
    let _ = writer.await;

    info!(target: "proxy", %peer, %target, "relay session closed");
}

async fn writer_task(mut ws_tx: SplitSink<WebSocket, Message>, mut out_rx: mpsc::Receiver<Message>) {
    while let Some(msg) = out_rx.recv().await {
        if ws_tx.send(msg).await.is_err() {
            break;
        }
    }
}

/// Forwards client → backend bytes. Ends the backend's write half and
/// queues a close frame carrying the cause: `1000` if the client closed or
/// hung up cleanly, `1011` if either side errored.
async fn ws_to_tcp_task(
    mut ws_rx: SplitStream<WebSocket>,
    mut tcp_tx: OwnedWriteHalf,
    out_tx: mpsc::Sender<Message>,
) {
    let reason = loop {
        match ws_rx.next().await {
            Some(Ok(Message::Binary(bytes))) => {
                if tcp_tx.write_all(&bytes).await.is_err() {
                    break EndReason::TransportError;
                }
            }
            Some(Ok(Message::Close(_))) | None => break EndReason::Normal,
            Some(Ok(_)) => {}
            Some(Err(_)) => break EndReason::TransportError,
        }
    };

    let _ = tcp_tx.shutdown().await;
    let _ = out_tx.send(reason.close_frame("client closed")).await;
}

/// Forwards backend → client bytes. Queues a close frame carrying the
/// cause: `1000` on a clean backend EOF, `1011` on a read error.
async fn tcp_to_ws_task(mut tcp_rx: OwnedReadHalf, out_tx: mpsc::Sender<Message>) {
    let mut buf = vec![0u8; READ_CHUNK_SIZE];

    let reason = loop {
        match tcp_rx.read(&mut buf).await {
            Ok(0) => break EndReason::Normal,
            Ok(n) => {
                if out_tx.send(Message::Binary(buf[..n].to_vec())).await.is_err() {
                    return;
                }
            }
            Err(_) => break EndReason::TransportError,
        }
    };

    let _ = out_tx.send(reason.close_frame("backend closed")).await;
}

/// Dials `target` while buffering any WebSocket messages the client sends
/// before the TCP connection is up. The buffer is bounded by
/// `max_ws_buffered_bytes`; exceeding it or a connect failure ends the
/// session with a `1011` close.
async fn connect_with_preconnect_buffer(
    ws_tx: &mut (impl futures_util::Sink<Message, Error = axum::Error> + Unpin),
    ws_rx: &mut (impl futures_util::Stream<Item = Result<Message, axum::Error>> + Unpin),
    target: SocketAddr,
    policy: &Policy,
) -> Option<TcpStream> {
    let connect_fut = time::timeout(policy.connect_timeout, TcpStream::connect(target));
    tokio::pin!(connect_fut);

    let mut pending: Vec<Vec<u8>> = Vec::new();
    let mut pending_bytes: usize = 0;

    let mut stream = loop {
        tokio::select! {
            res = &mut connect_fut => {
                match res {
                    Ok(Ok(stream)) => break stream,
                    Ok(Err(e)) => {
                        warn!(target: "proxy", %target, error = %e, "failed to connect to backend");
                        close(ws_tx, CLOSE_TRANSPORT_ERROR, "backend unreachable").await;
                        return None;
                    }
                    Err(_) => {
                        warn!(target: "proxy", %target, "timed out connecting to backend");
                        close(ws_tx, CLOSE_TRANSPORT_ERROR, "backend connect timeout").await;
                        return None;
                    }
                }
            }
            msg = ws_rx.next() => {
                match msg {
                    Some(Ok(Message::Binary(bytes))) => {
                        pending_bytes += bytes.len();
                        if pending_bytes > policy.max_ws_buffered_bytes as usize {
                            warn!(target: "proxy", %target, "pre-connect buffer exceeded");
                            close(ws_tx, CLOSE_TRANSPORT_ERROR, "pre-connect buffer exceeded").await;
                            return None;
                        }
                        pending.push(bytes);
                    }
                    Some(Ok(Message::Close(_))) | None => return None,
                    Some(Ok(_)) => {}
                    Some(Err(_)) => return None,
                }
            }
        }
    };

    for chunk in pending {
        if stream.write_all(&chunk).await.is_err() {
            return None;
        }
    }

    Some(stream)
}

async fn close(
    ws_tx: &mut (impl futures_util::Sink<Message, Error = axum::Error> + Unpin),
    code: u16,
    reason: &'static str,
) {
    let _ = time::timeout(
        Duration::from_millis(500),
        ws_tx.send(Message::Close(Some(CloseFrame {
            code,
            reason: reason.into(),
        }))),
    )
    .await;
}
