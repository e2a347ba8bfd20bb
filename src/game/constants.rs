//! Game-wide constants and default configuration values
//!
//! Centralizing these makes it easy to adjust the survival economy and
//! round pacing without hunting through the lifecycle code.

/// Starting bios (survival currency) for every player.
pub const STARTING_BIOS: i64 = 25;

/// Mandatory per-round contribution from each player into the pot.
pub const ROUND_ANTE: i64 = 1;

/// Seconds each round lasts before the timer forces resolution.
pub const ROUND_TIME_SECS: u32 = 60;

/// Rounds played before the match ends on a balance comparison.
pub const ROUND_LIMIT: u32 = 5;

/// Round wins required to end the match by dominance.
pub const WINS_FOR_DOMINANCE: u32 = 3;

/// Timer ticks between oxygen decay deductions (1 bios each).
pub const DECAY_INTERVAL_TICKS: u32 = 60;

/// Coarse time-sync cadence while plenty of time remains.
pub const TIME_SYNC_INTERVAL_SECS: u32 = 10;

/// Below this many seconds remaining, time-sync fires every tick.
pub const FINAL_COUNTDOWN_SECS: u32 = 5;

/// Cards in a submitted hand and target cards dealt per player.
pub const HAND_SIZE: usize = 5;
pub const TARGET_HAND_SIZE: usize = 5;

/// Inclusive range of target-card values.
pub const TARGET_VALUE_MIN: u8 = 15;
pub const TARGET_VALUE_MAX: u8 = 55;

/// Exactly two players per room.
pub const ROOM_CAPACITY: usize = 2;

/// Length of the generated join code for a room.
pub const ROOM_CODE_LEN: usize = 4;

/// Broadcast channel capacity for per-room event fan-out.
pub const BROADCAST_CHANNEL_CAPACITY: usize = 100;
