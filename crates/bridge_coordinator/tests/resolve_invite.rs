//! Drives `CoordinatorClient::resolve_invite` against an in-process TCP
//! stub that plays back fixed coordinator responses (scenarios S4/S5).

use bridge_coordinator::CoordinatorClient;
use bridge_protocol::{encode_frame, packet_id, InviteResolution};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

async fn spawn_stub(responses: Vec<(u8, Vec<u8>)>) -> std::net::SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();

        // Drain the client's request frame before replying.
        let mut size_buf = [0u8; 2];
        stream.read_exact(&mut size_buf).await.unwrap();
        let size = u16::from_le_bytes(size_buf) as usize;
        let mut rest = vec![0u8; size - 2];
        stream.read_exact(&mut rest).await.unwrap();

        for (ty, payload) in responses {
            let frame = encode_frame(ty, &payload).unwrap();
            stream.write_all(&frame).await.unwrap();
        }
    });

    addr
}

fn zstring(s: &str) -> Vec<u8> {
    let mut v = s.as_bytes().to_vec();
    v.push(0);
    v
}

#[tokio::test]
async fn resolves_direct_connect() {
    let mut direct_payload = Vec::new();
    direct_payload.extend_from_slice(&zstring("tok")); // token
    direct_payload.push(0x01); // tracking number
    direct_payload.extend_from_slice(&zstring("1.2.3.4")); // host
    direct_payload.extend_from_slice(&3975u16.to_le_bytes()); // port

    let addr = spawn_stub(vec![
        (packet_id::GC_CONNECTING, Vec::new()),
        (packet_id::GC_DIRECT_CONNECT, direct_payload),
    ])
    .await;

    let client = CoordinatorClient::new(addr);
    let resolution = client.resolve_invite("ABCD").await.unwrap();

    assert_eq!(
        resolution,
        InviteResolution::Direct {
            host: "1.2.3.4".to_owned(),
            port: 3975,
        }
    );
}

#[tokio::test]
async fn resolves_turn_connect_as_relay() {
    let mut turn_payload = Vec::new();
    turn_payload.extend_from_slice(&zstring("tok"));
    turn_payload.push(0x01);
    turn_payload.extend_from_slice(&zstring("TKT")); // ticket
    turn_payload.extend_from_slice(&zstring("relay.example:3974")); // connection string

    let addr = spawn_stub(vec![
        (packet_id::GC_STUN_REQUEST, Vec::new()),
        (packet_id::GC_TURN_CONNECT, turn_payload),
    ])
    .await;

    let client = CoordinatorClient::new(addr);
    let resolution = client.resolve_invite("ABCD").await.unwrap();

    assert_eq!(
        resolution,
        InviteResolution::Relay {
            host: "relay.example".to_owned(),
            port: 3974,
            ticket: "TKT".to_owned(),
        }
    );
}

#[tokio::test]
async fn coordinator_error_is_surfaced() {
    let mut error_payload = Vec::new();
    error_payload.push(7); // errorType
    error_payload.extend_from_slice(&zstring("invite not found"));

    let addr = spawn_stub(vec![(packet_id::GC_ERROR, error_payload)]).await;

    let client = CoordinatorClient::new(addr);
    let err = client.resolve_invite("ABCD").await.unwrap_err();

    assert!(err.to_string().contains("invite not found"));
}
