//! Player action handlers for the game loop.
//!
//! Each handler is guard-first: wrong phase, unknown player or an already
//! set flag rejects the action with a warn log and mutates nothing. The
//! absence of an action is valid game information, so rejections stay
//! silent at the protocol level.

use super::*;
use crate::ws::events::{Envelope, ServerEvent};

impl Room {
    /// Lock the secret target for this round. The identifier must name an
    /// unexhausted card in the acting player's own target hand.
    pub fn lock_target(&mut self, player_id: &str, target_id: &str) -> Vec<Envelope> {
        if self.phase != GamePhase::GameLoop {
            tracing::warn!(
                "Room {}: lock_target ignored (phase={:?})",
                self.room_id,
                self.phase
            );
            return Vec::new();
        }
        let Some(state) = self.player_states.get_mut(player_id) else {
            tracing::warn!("Room {}: lock_target from unknown player", self.room_id);
            return Vec::new();
        };
        if state.target_locked {
            tracing::warn!(
                "Room {}: duplicate target lock from {} ignored",
                self.room_id,
                player_id
            );
            return Vec::new();
        }
        if !state
            .target_hand
            .iter()
            .any(|t| t.id == target_id && !t.used)
        {
            tracing::warn!(
                "Room {}: {} locked unknown target {}",
                self.room_id,
                player_id,
                target_id
            );
            return Vec::new();
        }

        state.target_locked = true;
        self.turn_data.entry(player_id.to_string()).or_default().target_id =
            Some(target_id.to_string());
        tracing::info!("Room {}: {} locked a target", self.room_id, player_id);

        vec![Envelope::to_room(ServerEvent::OpponentStatus {
            player_id: player_id.to_string(),
            status: PlayerStatus::TargetLocked,
        })]
    }

    /// Move bios into the pot. Requires a locked target and a wager the
    /// player can actually cover.
    pub fn place_wager(&mut self, player_id: &str, amount: i64) -> Vec<Envelope> {
        if self.phase != GamePhase::GameLoop {
            tracing::warn!(
                "Room {}: place_wager ignored (phase={:?})",
                self.room_id,
                self.phase
            );
            return Vec::new();
        }
        let Some(state) = self.player_states.get_mut(player_id) else {
            tracing::warn!("Room {}: place_wager from unknown player", self.room_id);
            return Vec::new();
        };
        if !state.target_locked {
            tracing::warn!(
                "Room {}: wager before target lock from {} ignored",
                self.room_id,
                player_id
            );
            return Vec::new();
        }
        if state.submitted {
            tracing::warn!(
                "Room {}: wager after submission from {} ignored",
                self.room_id,
                player_id
            );
            return Vec::new();
        }
        if amount <= 0 || amount > state.bios {
            tracing::warn!(
                "Room {}: invalid wager {} from {} (bios={})",
                self.room_id,
                amount,
                player_id,
                state.bios
            );
            return Vec::new();
        }

        state.bios -= amount;
        self.pot += amount;
        self.turn_data.entry(player_id.to_string()).or_default().wager += amount;
        tracing::info!(
            "Room {}: {} wagered {} bios (pot={})",
            self.room_id,
            player_id,
            amount,
            self.pot
        );

        vec![Envelope::to_room(ServerEvent::EconomyUpdate {
            pot: self.pot,
            bios: self.bios_snapshot(),
        })]
    }

    /// Record the five chosen card identifiers. When this completes the
    /// pair of submissions the round resolves immediately; the caller holds
    /// the room write lock, so the timer path cannot race this transition.
    pub fn submit_hand(&mut self, player_id: &str, card_ids: Vec<String>) -> Vec<Envelope> {
        if self.phase != GamePhase::GameLoop {
            tracing::warn!(
                "Room {}: submit_hand ignored (phase={:?})",
                self.room_id,
                self.phase
            );
            return Vec::new();
        }
        let Some(state) = self.player_states.get_mut(player_id) else {
            tracing::warn!("Room {}: submit_hand from unknown player", self.room_id);
            return Vec::new();
        };
        if !state.target_locked {
            tracing::warn!(
                "Room {}: submission before target lock from {} ignored",
                self.room_id,
                player_id
            );
            return Vec::new();
        }
        if state.submitted {
            tracing::warn!(
                "Room {}: duplicate submission from {} ignored",
                self.room_id,
                player_id
            );
            return Vec::new();
        }

        // Recorded as-is; validity (count, resolvability, sum) is judged by
        // the resolution engine, where failure means forfeiting the round.
        state.submitted = true;
        self.turn_data.entry(player_id.to_string()).or_default().card_ids = Some(card_ids);
        tracing::info!("Room {}: {} submitted a hand", self.room_id, player_id);

        let mut events = vec![Envelope::to_room(ServerEvent::OpponentStatus {
            player_id: player_id.to_string(),
            status: PlayerStatus::HandSubmitted,
        })];

        let all_submitted = self
            .players
            .iter()
            .all(|pid| self.player_states.get(pid).is_some_and(|s| s.submitted));
        if self.is_full() && all_submitted {
            tracing::info!("Room {}: both hands in, resolving", self.room_id);
            events.extend(self.end_round(EndReason::Normal));
        }

        events
    }
}
