//! Wire-level message types.
//!
//! Every outbound event carries only its own named fields; clients never
//! have to probe loose payloads for optional keys.

use crate::game::deck::Card;
use crate::game::room::{EndReason, GameOver, PlayerStatus};
use crate::game::rules::{ResolvedHand, RoundOutcome};
use crate::game::target::TargetCard;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum ClientCommand {
    CreateRoom,
    JoinRoom { room_id: String },
    LockTarget { target_id: String },
    PlaceWager { amount: i64 },
    SubmitHand { card_ids: Vec<String> },
    RequestNextRound,
    Ping,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
#[allow(clippy::large_enum_variant)] // RoundStarted/RoundResult dominate traffic; boxing buys nothing
pub enum ServerEvent {
    Connected {
        player_id: String,
    },
    RoomCreated {
        room_id: String,
    },
    /// Per-player snapshot at the top of each round. The target hand is the
    /// recipient's own; the opponent's stays secret until the reveal.
    RoundStarted {
        round: u32,
        deck: Vec<Card>,
        target_hand: Vec<TargetCard>,
        bios: i64,
        opponent_bios: i64,
        pot: i64,
        time_remaining: u32,
    },
    TimeSync {
        seconds_remaining: u32,
    },
    OxygenSync {
        tick: u32,
    },
    EconomyUpdate {
        pot: i64,
        bios: HashMap<String, i64>,
    },
    DecayNotification,
    OpponentStatus {
        player_id: String,
        status: PlayerStatus,
    },
    RoundResult {
        /// Relative to the room's first seat; `winner` is authoritative.
        outcome: RoundOutcome,
        winner: Option<String>,
        hands: HashMap<String, ResolvedHand>,
        updated_deck: Vec<Card>,
        updated_bios: HashMap<String, i64>,
        updated_wins: HashMap<String, u32>,
        /// Both players' locked target values, revealed after resolution.
        revealed_targets: HashMap<String, Option<u8>>,
        reason: EndReason,
        game_over: Option<GameOver>,
    },
    /// Terminal state reached outside a round resolution (round-limit
    /// backstop on a next-round request).
    MatchEnded {
        game_over: GameOver,
    },
    OpponentLeft,
    Error {
        message: String,
    },
    Pong,
}

/// Routing wrapper: `to: None` fans out to the whole room, `Some(id)`
/// reaches a single player's connection.
#[derive(Debug, Clone)]
pub struct Envelope {
    pub to: Option<String>,
    pub event: ServerEvent,
}

impl Envelope {
    pub fn to_player(player_id: impl Into<String>, event: ServerEvent) -> Self {
        Self {
            to: Some(player_id.into()),
            event,
        }
    }

    pub fn to_room(event: ServerEvent) -> Self {
        Self { to: None, event }
    }
}
