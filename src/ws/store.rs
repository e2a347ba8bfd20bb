//! Room registry and per-room timers.
//!
//! Owns every [`Room`] plus the player-to-room index and the per-room
//! broadcast channel. All round mutations run under the room map's write
//! lock, which is what makes "resolution exactly once" hold: the 1 Hz
//! timer task and the player-action paths both re-check the phase after
//! acquiring it.

use crate::game::constants::{BROADCAST_CHANNEL_CAPACITY, ROOM_CODE_LEN};
use crate::game::error::{GameError, GameResult};
use crate::game::room::{GamePhase, Room};
use crate::game::target::TargetHandPolicy;
use crate::ws::events::{Envelope, ServerEvent};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use std::{collections::HashMap, sync::Arc, time::Duration};
use tokio::sync::{broadcast, RwLock};

const ROOM_CODE_CHARS: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

pub struct RoomStore {
    target_policy: TargetHandPolicy,
    rooms: RwLock<HashMap<String, Room>>,
    player_rooms: RwLock<HashMap<String, String>>,
    broadcasts: RwLock<HashMap<String, broadcast::Sender<Envelope>>>,
}

impl RoomStore {
    pub fn new(target_policy: TargetHandPolicy) -> Self {
        Self {
            target_policy,
            rooms: RwLock::new(HashMap::new()),
            player_rooms: RwLock::new(HashMap::new()),
            broadcasts: RwLock::new(HashMap::new()),
        }
    }

    pub async fn subscribe(&self, room_id: &str) -> broadcast::Receiver<Envelope> {
        self.sender(room_id).await.subscribe()
    }

    async fn sender(&self, room_id: &str) -> broadcast::Sender<Envelope> {
        let mut broadcasts = self.broadcasts.write().await;
        broadcasts
            .entry(room_id.to_string())
            .or_insert_with(|| broadcast::channel(BROADCAST_CHANNEL_CAPACITY).0)
            .clone()
    }

    /// Create a room with the requester in the first seat.
    pub async fn create_room(&self, player_id: &str) -> GameResult<String> {
        {
            let player_rooms = self.player_rooms.read().await;
            if player_rooms.contains_key(player_id) {
                return Err(GameError::AlreadyInRoom);
            }
        }

        let mut rooms = self.rooms.write().await;
        let room_id = Self::generate_room_code(&rooms);
        rooms.insert(
            room_id.clone(),
            Room::new(room_id.clone(), player_id.to_string(), self.target_policy),
        );
        drop(rooms);

        self.player_rooms
            .write()
            .await
            .insert(player_id.to_string(), room_id.clone());
        tracing::info!("Player {} created room {}", player_id, room_id);
        Ok(room_id)
    }

    /// Take the second seat. A full room auto-starts the match. Returns the
    /// joiner's event subscription, taken out before the first round's
    /// events are dispatched so none can slip past.
    pub async fn join_room(
        self: &Arc<Self>,
        player_id: &str,
        room_id: &str,
    ) -> GameResult<broadcast::Receiver<Envelope>> {
        {
            let player_rooms = self.player_rooms.read().await;
            if player_rooms.contains_key(player_id) {
                return Err(GameError::AlreadyInRoom);
            }
        }

        let mut rooms = self.rooms.write().await;
        let room = rooms.get_mut(room_id).ok_or(GameError::RoomNotFound)?;
        room.add_player(player_id.to_string())?;
        tracing::info!("Player {} joined room {}", player_id, room_id);

        let tx = self.sender(room_id).await;
        let rx = tx.subscribe();
        let events = if room.is_full() {
            let events = room.start_round();
            self.arm_timer(room, tx.clone());
            events
        } else {
            Vec::new()
        };
        drop(rooms);

        self.player_rooms
            .write()
            .await
            .insert(player_id.to_string(), room_id.to_string());
        for event in events {
            let _ = tx.send(event);
        }
        Ok(rx)
    }

    pub async fn lock_target(&self, player_id: &str, target_id: &str) {
        self.with_room(player_id, |room| room.lock_target(player_id, target_id))
            .await;
    }

    pub async fn place_wager(&self, player_id: &str, amount: i64) {
        self.with_room(player_id, |room| room.place_wager(player_id, amount))
            .await;
    }

    pub async fn submit_hand(&self, player_id: &str, card_ids: Vec<String>) {
        self.with_room(player_id, |room| room.submit_hand(player_id, card_ids))
            .await;
    }

    pub async fn request_next_round(self: &Arc<Self>, player_id: &str) {
        let Some(room_id) = self.room_of(player_id).await else {
            tracing::warn!("Player {} requested next round with no room", player_id);
            return;
        };
        let tx = self.sender(&room_id).await;
        let events = {
            let mut rooms = self.rooms.write().await;
            let Some(room) = rooms.get_mut(&room_id) else {
                return;
            };
            let events = room.request_next_round();
            self.arm_timer(room, tx.clone());
            events
        };
        for event in events {
            let _ = tx.send(event);
        }
    }

    /// Handle departure (disconnect). The survivor is notified and the room
    /// is dropped once both seats are empty.
    pub async fn remove_player(&self, player_id: &str) {
        let Some(room_id) = self.player_rooms.write().await.remove(player_id) else {
            return;
        };

        let now_empty = {
            let mut rooms = self.rooms.write().await;
            let Some(room) = rooms.get_mut(&room_id) else {
                return;
            };
            room.remove_player(player_id);
            tracing::info!("Player {} left room {}", player_id, room_id);
            if room.players.is_empty() {
                rooms.remove(&room_id);
                true
            } else {
                false
            }
        };

        let mut broadcasts = self.broadcasts.write().await;
        if now_empty {
            broadcasts.remove(&room_id);
            tracing::info!("Room {} destroyed", room_id);
        } else if let Some(tx) = broadcasts.get(&room_id) {
            let _ = tx.send(Envelope::to_room(ServerEvent::OpponentLeft));
        }
    }

    pub async fn room_of(&self, player_id: &str) -> Option<String> {
        self.player_rooms.read().await.get(player_id).cloned()
    }

    async fn with_room<F>(&self, player_id: &str, op: F)
    where
        F: FnOnce(&mut Room) -> Vec<Envelope>,
    {
        let Some(room_id) = self.room_of(player_id).await else {
            tracing::warn!("Action from player {} with no room", player_id);
            return;
        };
        let tx = self.sender(&room_id).await;
        let events = {
            let mut rooms = self.rooms.write().await;
            let Some(room) = rooms.get_mut(&room_id) else {
                return;
            };
            op(room)
        };
        for event in events {
            let _ = tx.send(event);
        }
    }

    /// Spawn the 1 Hz round timer for a room that just entered the game
    /// loop. A successful `start_round` always aborts and clears the old
    /// handle first, so a room that still holds one is mid-round with a
    /// live timer (the round start was rejected) and must keep it.
    ///
    /// The task sends events synchronously through a pre-cloned sender, so
    /// a tick that resolves the round (and thereby aborts this very task)
    /// still delivers its round result before the abort can land.
    fn arm_timer(self: &Arc<Self>, room: &mut Room, tx: broadcast::Sender<Envelope>) {
        if room.phase != GamePhase::GameLoop || room.timer.is_some() {
            return;
        }

        let store = Arc::clone(self);
        let room_id = room.room_id.clone();
        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(1));
            interval.tick().await; // first tick completes immediately
            loop {
                interval.tick().await;
                let (events, still_running) = {
                    let mut rooms = store.rooms.write().await;
                    let Some(room) = rooms.get_mut(&room_id) else {
                        break;
                    };
                    if room.phase != GamePhase::GameLoop {
                        break;
                    }
                    let events = room.tick();
                    (events, room.phase == GamePhase::GameLoop)
                };
                for event in events {
                    let _ = tx.send(event);
                }
                if !still_running {
                    break;
                }
            }
        });
        room.timer = Some(handle);
    }

    fn generate_room_code(rooms: &HashMap<String, Room>) -> String {
        let mut rng = ChaCha20Rng::from_entropy();
        loop {
            let code: String = (0..ROOM_CODE_LEN)
                .map(|_| ROOM_CODE_CHARS[rng.gen_range(0..ROOM_CODE_CHARS.len())] as char)
                .collect();
            if !rooms.contains_key(&code) {
                return code;
            }
        }
    }
}
