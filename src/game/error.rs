use thiserror::Error;
use uuid::Uuid;

use crate::domain::Card;

/// Everything that can go wrong with a submitted action.
///
/// Recoverable variants reject the action and leave the session untouched;
/// fatal variants (`is_fatal`) end the match and tear the session down.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GameError {
    #[error("game is not in progress")]
    NotInProgress,

    #[error("session already has two players")]
    TableFull,

    #[error("player {0} is not seated at this table")]
    UnknownPlayer(Uuid),

    #[error("card index {index} is out of range for a hand of {hand_len}")]
    IndexOutOfRange { index: usize, hand_len: usize },

    #[error("there is no center pile {0}")]
    UnknownPile(usize),

    #[error("{card} cannot be played on {top}")]
    IllegalMove { card: Card, top: Card },

    #[error("a legal play is available, redeal request dropped")]
    StaleRedealRequest,

    #[error("neither player can move and a draw pile is empty")]
    Deadlock,

    #[error("opponent disconnected")]
    OpponentDisconnected,
}

impl GameError {
    /// Stable wire identifier for the error class.
    pub fn code(&self) -> &'static str {
        match self {
            GameError::NotInProgress | GameError::TableFull | GameError::UnknownPlayer(_) => {
                "ProtocolStateError"
            }
            GameError::IndexOutOfRange { .. }
            | GameError::UnknownPile(_)
            | GameError::IllegalMove { .. } => "ValidationError",
            GameError::StaleRedealRequest => "StaleRedealRequestError",
            GameError::Deadlock => "DeadlockError",
            GameError::OpponentDisconnected => "DisconnectedError",
        }
    }

    pub fn is_fatal(&self) -> bool {
        matches!(self, GameError::Deadlock | GameError::OpponentDisconnected)
    }
}
