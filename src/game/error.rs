//! Game-related error types
//!
//! Typed errors instead of String keep the API contracts clear and make
//! guard-clause rejections cheap to match on at the transport boundary.

use std::fmt;

/// Errors that can occur during room and round operations
#[derive(Debug, Clone, PartialEq)]
pub enum GameError {
    RoomNotFound,
    RoomFull,
    AlreadyInRoom,
    InvalidPhase { expected: String, actual: String },
}

impl fmt::Display for GameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GameError::RoomNotFound => write!(f, "Room not found"),
            GameError::RoomFull => write!(f, "Room is full"),
            GameError::AlreadyInRoom => write!(f, "You are already in a room"),
            GameError::InvalidPhase { expected, actual } => {
                write!(f, "Invalid phase. Expected: {}, Actual: {}", expected, actual)
            }
        }
    }
}

impl std::error::Error for GameError {}

/// Result type for game operations
pub type GameResult<T> = Result<T, GameError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(GameError::RoomNotFound.to_string(), "Room not found");
        let err = GameError::InvalidPhase {
            expected: "[GameLoop]".to_string(),
            actual: "GameOver".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Invalid phase. Expected: [GameLoop], Actual: GameOver"
        );
    }

    #[test]
    fn test_error_equality() {
        assert_eq!(GameError::RoomFull, GameError::RoomFull);
        assert_ne!(GameError::RoomFull, GameError::RoomNotFound);
    }
}
