//! WebSocket integration tests.
//!
//! These spin up the real router and drive the room flow over live socket
//! connections: connect, create, join, and the opening actions of a round.

use deepstake_server::game::target::TargetHandPolicy;
use deepstake_server::ws::events::{ClientCommand, ServerEvent};
use deepstake_server::{create_app, ws::RoomStore};
use futures::{SinkExt, StreamExt};
use std::{net::SocketAddr, sync::Arc, time::Duration};
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};

type WsClient = WebSocketStream<MaybeTlsStream<TcpStream>>;

async fn spawn_server() -> SocketAddr {
    let store = Arc::new(RoomStore::new(TargetHandPolicy::PerRound));
    let app = create_app(store);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

async fn connect(addr: SocketAddr) -> WsClient {
    let (ws, _) = connect_async(format!("ws://{}/ws", addr)).await.unwrap();
    ws
}

async fn send(ws: &mut WsClient, command: &ClientCommand) {
    let text = serde_json::to_string(command).unwrap();
    ws.send(Message::Text(text)).await.unwrap();
}

/// Receive events until one satisfies the predicate. The room timer emits
/// TimeSync/OxygenSync traffic continuously, so tests always skim.
async fn recv_until<F>(ws: &mut WsClient, mut pred: F) -> ServerEvent
where
    F: FnMut(&ServerEvent) -> bool,
{
    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            let msg = ws.next().await.expect("socket closed").unwrap();
            if let Message::Text(text) = msg {
                let event: ServerEvent = serde_json::from_str(&text).unwrap();
                if pred(&event) {
                    return event;
                }
            }
        }
    })
    .await
    .expect("timed out waiting for event")
}

async fn setup_match(addr: SocketAddr) -> (WsClient, WsClient, String) {
    let mut host = connect(addr).await;
    recv_until(&mut host, |e| matches!(e, ServerEvent::Connected { .. })).await;
    send(&mut host, &ClientCommand::CreateRoom).await;
    let ServerEvent::RoomCreated { room_id } =
        recv_until(&mut host, |e| matches!(e, ServerEvent::RoomCreated { .. })).await
    else {
        unreachable!()
    };

    let mut guest = connect(addr).await;
    recv_until(&mut guest, |e| matches!(e, ServerEvent::Connected { .. })).await;
    send(
        &mut guest,
        &ClientCommand::JoinRoom {
            room_id: room_id.clone(),
        },
    )
    .await;

    (host, guest, room_id)
}

#[tokio::test]
async fn test_connect_assigns_player_id() {
    let addr = spawn_server().await;
    let mut ws = connect(addr).await;
    let event = recv_until(&mut ws, |e| matches!(e, ServerEvent::Connected { .. })).await;
    let ServerEvent::Connected { player_id } = event else {
        unreachable!()
    };
    assert!(!player_id.is_empty());
}

#[tokio::test]
async fn test_join_starts_round_for_both_players() {
    let addr = spawn_server().await;
    let (mut host, mut guest, _room_id) = setup_match(addr).await;

    for ws in [&mut host, &mut guest] {
        let event = recv_until(ws, |e| matches!(e, ServerEvent::RoundStarted { .. })).await;
        let ServerEvent::RoundStarted {
            round,
            deck,
            target_hand,
            bios,
            opponent_bios,
            pot,
            time_remaining,
        } = event
        else {
            unreachable!()
        };
        assert_eq!(round, 1);
        assert_eq!(deck.len(), 52);
        assert_eq!(target_hand.len(), 5);
        assert_eq!(bios, 24);
        assert_eq!(opponent_bios, 24);
        assert_eq!(pot, 2);
        assert_eq!(time_remaining, 60);
    }
}

#[tokio::test]
async fn test_join_unknown_room_errors() {
    let addr = spawn_server().await;
    let mut ws = connect(addr).await;
    recv_until(&mut ws, |e| matches!(e, ServerEvent::Connected { .. })).await;
    send(
        &mut ws,
        &ClientCommand::JoinRoom {
            room_id: "NOPE".to_string(),
        },
    )
    .await;
    let event = recv_until(&mut ws, |e| matches!(e, ServerEvent::Error { .. })).await;
    let ServerEvent::Error { message } = event else {
        unreachable!()
    };
    assert!(message.contains("not found"), "got: {message}");
}

#[tokio::test]
async fn test_lock_and_wager_flow() {
    let addr = spawn_server().await;
    let (mut host, mut guest, _room_id) = setup_match(addr).await;

    let event = recv_until(&mut host, |e| matches!(e, ServerEvent::RoundStarted { .. })).await;
    let ServerEvent::RoundStarted { target_hand, .. } = event else {
        unreachable!()
    };
    recv_until(&mut guest, |e| matches!(e, ServerEvent::RoundStarted { .. })).await;

    send(
        &mut host,
        &ClientCommand::LockTarget {
            target_id: target_hand[0].id.clone(),
        },
    )
    .await;
    recv_until(&mut guest, |e| {
        matches!(e, ServerEvent::OpponentStatus { .. })
    })
    .await;

    send(&mut host, &ClientCommand::PlaceWager { amount: 2 }).await;
    let event = recv_until(&mut guest, |e| {
        matches!(e, ServerEvent::EconomyUpdate { .. })
    })
    .await;
    let ServerEvent::EconomyUpdate { pot, bios } = event else {
        unreachable!()
    };
    assert_eq!(pot, 4);
    assert!(bios.values().any(|&b| b == 22));
    assert!(bios.values().any(|&b| b == 24));
}

#[tokio::test]
async fn test_departure_notifies_survivor() {
    let addr = spawn_server().await;
    let (mut host, guest, _room_id) = setup_match(addr).await;
    recv_until(&mut host, |e| matches!(e, ServerEvent::RoundStarted { .. })).await;

    drop(guest);
    recv_until(&mut host, |e| matches!(e, ServerEvent::OpponentLeft)).await;
}

#[tokio::test]
async fn test_next_round_spam_does_not_stall_timer() {
    let store = Arc::new(RoomStore::new(TargetHandPolicy::PerRound));
    let room_id = store.create_room("p1").await.unwrap();
    let mut rx = store.join_room("p2", &room_id).await.unwrap();

    // Mid-round next-round requests are rejected and must leave the running
    // 1 Hz timer alone; re-arming on every request would push its first
    // tick out forever.
    let spammer = {
        let store = Arc::clone(&store);
        tokio::spawn(async move {
            loop {
                store.request_next_round("p1").await;
                tokio::time::sleep(Duration::from_millis(250)).await;
            }
        })
    };

    let mut ticks = 0;
    let deadline = tokio::time::Instant::now() + Duration::from_millis(2600);
    loop {
        match tokio::time::timeout_at(deadline, rx.recv()).await {
            Ok(Ok(envelope)) => {
                if matches!(envelope.event, ServerEvent::OxygenSync { .. }) {
                    ticks += 1;
                }
            }
            _ => break,
        }
    }
    spammer.abort();
    assert!(ticks >= 2, "round timer stalled: {ticks} ticks observed");
}

#[tokio::test]
async fn test_malformed_command_reports_error() {
    let addr = spawn_server().await;
    let mut ws = connect(addr).await;
    recv_until(&mut ws, |e| matches!(e, ServerEvent::Connected { .. })).await;

    ws.send(Message::Text("not json".to_string())).await.unwrap();
    recv_until(&mut ws, |e| matches!(e, ServerEvent::Error { .. })).await;

    // The connection survives a bad command.
    send(&mut ws, &ClientCommand::Ping).await;
    recv_until(&mut ws, |e| matches!(e, ServerEvent::Pong)).await;
}
