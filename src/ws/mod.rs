pub mod events;
pub mod store;

pub use store::RoomStore;

use crate::ws::events::{ClientCommand, Envelope, ServerEvent};
use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::Response,
};
use futures::{SinkExt, StreamExt};
use std::sync::Arc;
use tokio::sync::broadcast;
use uuid::Uuid;

pub async fn ws_handler(ws: WebSocketUpgrade, State(store): State<Arc<RoomStore>>) -> Response {
    // Connections are anonymous; identity is the connection itself.
    let player_id = Uuid::new_v4().to_string();
    ws.on_upgrade(move |socket| handle_socket(socket, player_id, store))
}

async fn handle_socket(socket: WebSocket, player_id: String, store: Arc<RoomStore>) {
    let (mut sender, mut receiver) = socket.split();

    let connected = ServerEvent::Connected {
        player_id: player_id.clone(),
    };
    if let Ok(text) = serde_json::to_string(&connected) {
        let _ = sender.send(Message::Text(text)).await;
    }

    let mut broadcast_rx: Option<broadcast::Receiver<Envelope>> = None;

    loop {
        tokio::select! {
            // Commands from the client
            msg = receiver.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        let response = match serde_json::from_str::<ClientCommand>(&text) {
                            Ok(command) => {
                                handle_command(
                                    command,
                                    &player_id,
                                    &store,
                                    &mut broadcast_rx,
                                ).await
                            }
                            Err(err) => {
                                tracing::warn!("Player {}: unreadable command: {}", player_id, err);
                                Some(ServerEvent::Error {
                                    message: "Malformed command".to_string(),
                                })
                            }
                        };
                        if let Some(event) = response {
                            if let Ok(text) = serde_json::to_string(&event) {
                                let _ = sender.send(Message::Text(text)).await;
                            }
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => {
                        store.remove_player(&player_id).await;
                        break;
                    }
                    Some(Err(err)) => {
                        tracing::warn!("Player {}: socket error: {}", player_id, err);
                        store.remove_player(&player_id).await;
                        break;
                    }
                    _ => {}
                }
            }

            // Room events fanned out by the store
            envelope = async {
                match &mut broadcast_rx {
                    Some(rx) => rx.recv().await,
                    None => std::future::pending().await,
                }
            } => {
                match envelope {
                    Ok(envelope) => {
                        let mine = envelope
                            .to
                            .as_deref()
                            .map_or(true, |to| to == player_id);
                        if mine {
                            if let Ok(text) = serde_json::to_string(&envelope.event) {
                                let _ = sender.send(Message::Text(text)).await;
                            }
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!(
                            "Player {}: dropped {} room events (slow consumer)",
                            player_id,
                            skipped
                        );
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        // Room destroyed; the client learns via OpponentLeft
                        // or its own departure, so just stop listening.
                        broadcast_rx = None;
                    }
                }
            }
        }
    }

    tracing::debug!("Player {} connection closed", player_id);
}

/// Route one client command. Returns an event to send directly on this
/// connection; room-wide effects travel through the broadcast channel.
async fn handle_command(
    command: ClientCommand,
    player_id: &str,
    store: &Arc<RoomStore>,
    broadcast_rx: &mut Option<broadcast::Receiver<Envelope>>,
) -> Option<ServerEvent> {
    match command {
        ClientCommand::CreateRoom => match store.create_room(player_id).await {
            Ok(room_id) => {
                *broadcast_rx = Some(store.subscribe(&room_id).await);
                Some(ServerEvent::RoomCreated { room_id })
            }
            Err(err) => Some(ServerEvent::Error {
                message: err.to_string(),
            }),
        },
        ClientCommand::JoinRoom { room_id } => {
            match store.join_room(player_id, &room_id).await {
                Ok(rx) => {
                    *broadcast_rx = Some(rx);
                    None
                }
                Err(err) => Some(ServerEvent::Error {
                    message: err.to_string(),
                }),
            }
        }
        ClientCommand::LockTarget { target_id } => {
            store.lock_target(player_id, &target_id).await;
            None
        }
        ClientCommand::PlaceWager { amount } => {
            store.place_wager(player_id, amount).await;
            None
        }
        ClientCommand::SubmitHand { card_ids } => {
            store.submit_hand(player_id, card_ids).await;
            None
        }
        ClientCommand::RequestNextRound => {
            store.request_next_round(player_id).await;
            None
        }
        ClientCommand::Ping => Some(ServerEvent::Pong),
    }
}
