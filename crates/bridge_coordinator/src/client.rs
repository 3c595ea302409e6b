use std::net::SocketAddr;
use std::time::Duration;

use bridge_protocol::{
    decode_listing, packet_id, InviteResolution, NewGrfLookup, NewGrfRecord, ServerRecord,
};
use tokio::net::TcpStream;
use tokio::time;
use tracing::{debug, warn};

use crate::error::{ListError, ResolveError};
use crate::io::CoordinatorIo;

const LIST_OVERALL_TIMEOUT: Duration = Duration::from_secs(10);
const RESOLVE_OVERALL_TIMEOUT: Duration = Duration::from_secs(15);
const RESOLVE_WATCHDOG_TIMEOUT: Duration = Duration::from_secs(10);

/// A recent stable revision tag advertised in `CLIENT_LISTING`.
const CLIENT_REVISION: &str = "1.0.0";

/// Speaks the coordinator's directory protocol over a short-lived TCP
/// session to a fixed `host:port`.
#[derive(Clone, Copy, Debug)]
pub struct CoordinatorClient {
    addr: SocketAddr,
}

impl CoordinatorClient {
    pub fn new(addr: SocketAddr) -> Self {
        Self { addr }
    }

    /// Runs the list-servers flow.
    ///
    /// Fails only when the coordinator could not be reached at all. Once a
    /// session is established, the flow degrades gracefully: a decode error
    /// or mid-stream disconnect returns whatever was accumulated so far, and
    /// a genuinely empty listing is a successful empty `Vec`, not an error.
    pub async fn list_servers(&self) -> Result<Vec<ServerRecord>, ListError> {
        match time::timeout(LIST_OVERALL_TIMEOUT, self.list_servers_inner()).await {
            Ok(result) => result,
            Err(_) => {
                debug!(target: "server", "list-servers flow hit the overall timeout");
                Err(ListError::Timeout)
            }
        }
    }

    async fn list_servers_inner(&self) -> Result<Vec<ServerRecord>, ListError> {
        let stream = TcpStream::connect(self.addr).await.map_err(|e| {
            warn!(target: "server", error = %e, "failed to connect to coordinator");
            ListError::ConnectFailed(e)
        })?;

        let mut io = CoordinatorIo::new(stream);
        let mut lookup = NewGrfLookup::new();
        let mut servers = Vec::new();

        let mut payload = Vec::new();
        payload.push(packet_id::COORD_VERSION);
        payload.push(packet_id::GAME_INFO_VERSION);
        push_zstring(&mut payload, CLIENT_REVISION);
        payload.extend_from_slice(&0u32.to_le_bytes()); // cursor = 0 (initial request)

        if io
            .send_frame(packet_id::CLIENT_LISTING, &payload)
            .await
            .is_err()
        {
            warn!(target: "server", "lost the coordinator connection before sending the listing request");
            return Err(ListError::Transport);
        }

        loop {
            let frame = match io.recv_frame().await {
                Ok(Some(frame)) => frame,
                Ok(None) => break,
                Err(e) => {
                    debug!(target: "server", error = %e, "decode error in listing session");
                    break;
                }
            };

            match frame.ty {
                packet_id::GC_NEWGRF_LOOKUP => {
                    decode_newgrf_lookup(&frame.body, &mut lookup);
                }
                packet_id::GC_LISTING => {
                    let batch = decode_listing(&frame.body, &mut lookup);
                    if batch.is_empty() {
                        // Empty listing signals end-of-stream.
                        break;
                    }
                    servers.extend(batch);
                }
                other => {
                    debug!(target: "server", packet_type = other, "ignoring unknown packet type");
                }
            }
        }

        Ok(servers)
    }

    /// Runs the resolve-invite flow. Strict: any outcome short of a
    /// `Direct`/`Relay` resolution is a failure.
    pub async fn resolve_invite(&self, code: &str) -> Result<InviteResolution, ResolveError> {
        let normalized = normalize_invite_code(code);

        match time::timeout(
            RESOLVE_OVERALL_TIMEOUT,
            self.resolve_invite_inner(&normalized),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(ResolveError::Timeout),
        }
    }

    async fn resolve_invite_inner(&self, code: &str) -> Result<InviteResolution, ResolveError> {
        let stream = TcpStream::connect(self.addr).await?;
        let mut io = CoordinatorIo::new(stream);

        let mut payload = Vec::new();
        payload.push(packet_id::COORD_VERSION);
        push_zstring(&mut payload, code);
        io.send_frame(packet_id::CLIENT_CONNECT, &payload).await?;

        loop {
            let frame = match time::timeout(RESOLVE_WATCHDOG_TIMEOUT, io.recv_frame()).await {
                Ok(Ok(Some(frame))) => frame,
                Ok(Ok(None)) => return Err(ResolveError::ConnectionFailed),
                Ok(Err(e)) => return Err(e.into()),
                Err(_) => return Err(ResolveError::Timeout),
            };

            match frame.ty {
                packet_id::GC_ERROR => {
                    let mut cursor = bridge_protocol::Cursor::new(&frame.body);
                    let code = cursor.read_u8()?;
                    let detail = cursor.read_zstring()?;
                    return Err(ResolveError::Coordinator { code, detail });
                }
                packet_id::GC_CONNECTING => {
                    debug!(target: "server", "coordinator acknowledged connect attempt");
                }
                packet_id::GC_STUN_REQUEST => {
                    debug!(target: "server", "coordinator requested STUN, awaiting relay decision");
                }
                packet_id::GC_DIRECT_CONNECT => {
                    let mut cursor = bridge_protocol::Cursor::new(&frame.body);
                    let _token = cursor.read_zstring()?;
                    let _tracking_number = cursor.read_u8()?;
                    let host = cursor.read_zstring()?;
                    let port = cursor.read_u16_le()?;
                    return Ok(InviteResolution::Direct { host, port });
                }
                packet_id::GC_TURN_CONNECT => {
                    let mut cursor = bridge_protocol::Cursor::new(&frame.body);
                    let _token = cursor.read_zstring()?;
                    let _tracking_number = cursor.read_u8()?;
                    let ticket = cursor.read_zstring()?;
                    let connection_string = cursor.read_zstring()?;
                    let (host, port) = split_host_port(&connection_string)?;
                    return Ok(InviteResolution::Relay { host, port, ticket });
                }
                packet_id::GC_CONNECT_FAILED => return Err(ResolveError::ConnectionFailed),
                other => {
                    debug!(target: "server", packet_type = other, "ignoring unknown packet type");
                }
            }
        }
    }
}

fn decode_newgrf_lookup(payload: &[u8], lookup: &mut NewGrfLookup) {
    let mut cursor = bridge_protocol::Cursor::new(payload);
    let Ok(_cookie) = cursor.read_bytes(4) else {
        return;
    };
    let Ok(count) = cursor.read_u16_le() else {
        return;
    };

    for _ in 0..count {
        let Ok(index) = cursor.read_u32_le() else {
            return;
        };
        let Ok(grf_id) = cursor.read_u32_le() else {
            return;
        };
        let Ok(md5) = cursor.read_md5() else {
            return;
        };
        let Ok(name) = cursor.read_zstring() else {
            return;
        };
        lookup.insert(index, NewGrfRecord { grf_id, md5, name });
    }
}

fn push_zstring(buf: &mut Vec<u8>, s: &str) {
    buf.extend_from_slice(s.as_bytes());
    buf.push(0);
}

/// Ensures the invite code carries its leading `+` sigil.
fn normalize_invite_code(code: &str) -> String {
    if code.starts_with('+') {
        code.to_owned()
    } else {
        format!("+{code}")
    }
}

fn split_host_port(connection_string: &str) -> Result<(String, u16), ResolveError> {
    let (host, port) = connection_string
        .rsplit_once(':')
        .ok_or(ResolveError::ConnectionFailed)?;
    let port: u16 = port.parse().map_err(|_| ResolveError::ConnectionFailed)?;
    Ok((host.to_owned(), port))
}
