mod actions;
mod lifecycle;
mod state;

pub use state::{EndReason, GameOver, GameOverReason, PlayerStatus};

use super::constants::{ROOM_CAPACITY, STARTING_BIOS};
use super::deck::Deck;
use super::error::{GameError, GameResult};
use super::rules::PlayerSubmission;
use super::target::{TargetCard, TargetHandPolicy};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tokio::task::JoinHandle;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GamePhase {
    Lobby,      // Waiting for a second player
    GameLoop,   // Targets, wagers and hands come in under the timer
    Resolution, // Round resolved, waiting for next-round request
    GameOver,   // Match ended; room stays addressable for final queries
}

impl GamePhase {
    /// Returns the set of phases this phase can transition to.
    /// The Lobby escapes from GameLoop/Resolution cover player departure.
    pub fn valid_transitions(&self) -> &[GamePhase] {
        match self {
            GamePhase::Lobby => &[GamePhase::GameLoop],
            GamePhase::GameLoop => &[GamePhase::Resolution, GamePhase::Lobby],
            GamePhase::Resolution => {
                &[GamePhase::GameLoop, GamePhase::GameOver, GamePhase::Lobby]
            }
            GamePhase::GameOver => &[],
        }
    }

    /// Attempt to transition to a target phase.
    pub fn transition_to(&self, target: GamePhase) -> GameResult<GamePhase> {
        if self.valid_transitions().contains(&target) {
            Ok(target)
        } else {
            tracing::error!(
                "Invalid phase transition: {:?} -> {:?} (valid: {:?})",
                self,
                target,
                self.valid_transitions()
            );
            Err(GameError::InvalidPhase {
                expected: format!("{:?}", self.valid_transitions()),
                actual: format!("{:?}", target),
            })
        }
    }
}

/// Per-player survival and score state. Lives for the room's lifetime.
#[derive(Debug, Clone)]
pub struct PlayerState {
    pub bios: i64,
    pub wins: u32,
    pub target_locked: bool,
    pub submitted: bool,
    pub target_hand: Vec<TargetCard>,
}

impl PlayerState {
    fn new() -> Self {
        Self {
            bios: STARTING_BIOS,
            wins: 0,
            target_locked: false,
            submitted: false,
            target_hand: Vec::new(),
        }
    }
}

/// Transient per-round record of what a player has handed in.
#[derive(Debug, Clone, Default)]
pub struct TurnData {
    pub target_id: Option<String>,
    pub wager: i64,
    pub card_ids: Option<Vec<String>>,
}

impl From<&TurnData> for PlayerSubmission {
    fn from(turn: &TurnData) -> Self {
        PlayerSubmission {
            target_id: turn.target_id.clone(),
            card_ids: turn.card_ids.clone(),
        }
    }
}

/// One game session: two player slots, the shared deck, pot, phase, per-round
/// turn data and the handle of the active per-second timer.
#[derive(Debug)]
pub struct Room {
    pub room_id: String,
    /// Seat order; resolution outcomes are relative to the first seat.
    pub players: Vec<String>,
    pub phase: GamePhase,
    pub deck: Deck,
    pub pot: i64,
    pub round: u32,
    pub oxygen_tick: u32,
    pub time_remaining: u32,
    pub target_policy: TargetHandPolicy,
    pub player_states: HashMap<String, PlayerState>,
    pub turn_data: HashMap<String, TurnData>,
    pub game_over: Option<GameOver>,
    /// At most one per room; starting a new one aborts the predecessor.
    pub timer: Option<JoinHandle<()>>,
}

impl Room {
    pub fn new(room_id: String, creator_id: String, target_policy: TargetHandPolicy) -> Self {
        let mut player_states = HashMap::new();
        player_states.insert(creator_id.clone(), PlayerState::new());
        Self {
            room_id,
            players: vec![creator_id],
            phase: GamePhase::Lobby,
            deck: Deck::default(),
            pot: 0,
            round: 0,
            oxygen_tick: 0,
            time_remaining: 0,
            target_policy,
            player_states,
            turn_data: HashMap::new(),
            game_over: None,
            timer: None,
        }
    }

    pub fn add_player(&mut self, player_id: String) -> GameResult<()> {
        if self.players.len() >= ROOM_CAPACITY {
            return Err(GameError::RoomFull);
        }
        if self.players.contains(&player_id) {
            return Err(GameError::AlreadyInRoom);
        }
        self.player_states.insert(player_id.clone(), PlayerState::new());
        self.players.push(player_id);
        Ok(())
    }

    /// Remove a departing player. Cancels the timer and, unless the match
    /// already ended, forces the room back to the Lobby so no half-resolved
    /// round can linger.
    pub fn remove_player(&mut self, player_id: &str) {
        self.players.retain(|p| p != player_id);
        self.player_states.remove(player_id);
        self.turn_data.remove(player_id);
        self.cancel_timer();
        if self.phase != GamePhase::GameOver {
            self.force_lobby();
        }
    }

    pub fn opponent_of(&self, player_id: &str) -> Option<&str> {
        self.players
            .iter()
            .find(|p| p.as_str() != player_id)
            .map(String::as_str)
    }

    pub fn is_full(&self) -> bool {
        self.players.len() >= ROOM_CAPACITY
    }

    /// Attempt a phase transition. Silently ignores invalid transitions.
    pub(crate) fn try_transition(&mut self, target: GamePhase) {
        if let Ok(next) = self.phase.transition_to(target) {
            self.phase = next;
        }
    }

    pub(crate) fn cancel_timer(&mut self) {
        if let Some(handle) = self.timer.take() {
            handle.abort();
        }
    }

    pub(crate) fn force_lobby(&mut self) {
        if self.phase != GamePhase::Lobby {
            self.try_transition(GamePhase::Lobby);
        }
    }

    pub(crate) fn bios_snapshot(&self) -> HashMap<String, i64> {
        self.player_states
            .iter()
            .map(|(pid, s)| (pid.clone(), s.bios))
            .collect()
    }
}

impl Drop for Room {
    fn drop(&mut self) {
        // An uncancelled timer would keep ticking against a dead room.
        self.cancel_timer();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_transition_table() {
        assert!(GamePhase::Lobby.transition_to(GamePhase::GameLoop).is_ok());
        assert!(GamePhase::GameLoop
            .transition_to(GamePhase::Resolution)
            .is_ok());
        assert!(GamePhase::Resolution
            .transition_to(GamePhase::GameOver)
            .is_ok());
        assert!(GamePhase::Lobby.transition_to(GamePhase::GameOver).is_err());
        assert!(GamePhase::GameOver.transition_to(GamePhase::Lobby).is_err());
    }

    #[test]
    fn test_room_capacity() {
        let mut room = Room::new(
            "TEST".to_string(),
            "p1".to_string(),
            TargetHandPolicy::PerRound,
        );
        assert!(room.add_player("p2".to_string()).is_ok());
        assert_eq!(
            room.add_player("p3".to_string()),
            Err(crate::game::error::GameError::RoomFull)
        );
        assert_eq!(
            room.add_player("p2".to_string()),
            Err(crate::game::error::GameError::RoomFull)
        );
    }

    #[test]
    fn test_departure_forces_lobby() {
        let mut room = Room::new(
            "TEST".to_string(),
            "p1".to_string(),
            TargetHandPolicy::PerRound,
        );
        room.add_player("p2".to_string()).unwrap();
        room.phase = GamePhase::GameLoop;
        room.remove_player("p2");
        assert_eq!(room.phase, GamePhase::Lobby);
        assert_eq!(room.players, vec!["p1".to_string()]);
        assert!(room.player_states.get("p2").is_none());
    }
}
