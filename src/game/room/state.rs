//! Outbound payload types for round and match termination.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Why a round was resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EndReason {
    /// Both players submitted before the timer ran out.
    Normal,
    /// The round timer expired first.
    Timeout,
    /// A balance hit zero mid-round (ante or oxygen decay).
    Bankruptcy,
}

/// Why the match ended. Checked in this order at every resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GameOverReason {
    Bankruptcy,
    Dominance,
    RoundLimit,
}

/// Terminal match state attached to the final round result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameOver {
    /// None on a drawn match (round limit with equal balances, or
    /// simultaneous bankruptcy).
    pub winner: Option<String>,
    pub reason: GameOverReason,
    pub final_bios: HashMap<String, i64>,
}

/// Opponent progress notifications during the game loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PlayerStatus {
    TargetLocked,
    HandSubmitted,
}
