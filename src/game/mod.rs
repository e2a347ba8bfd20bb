pub mod constants;
pub mod deck;
pub mod error;
pub mod hand;
pub mod room;
pub mod rules;
pub mod target;

// Re-export commonly used items
pub use deck::{BurnReason, Card, Deck, Suit};
pub use error::{GameError, GameResult};
pub use room::{EndReason, GameOver, GameOverReason, GamePhase, PlayerStatus, Room};
pub use rules::{resolve_round, ResolvedHand, RoundOutcome, RoundResolution};
pub use target::{TargetCard, TargetHandPolicy};
