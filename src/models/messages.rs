use serde::{Deserialize, Serialize};

use crate::game::GameError;
use crate::models::PlayerView;

/// Client-to-server actions, externally tagged:
/// `{"PlayCard":{"card_index":2,"target_pile":0}}` or
/// `"RequestNewCenterCards"`.
///
/// `target_pile` is required; the engine never picks a pile on the
/// player's behalf.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlayerAction {
    PlayCard { card_index: usize, target_pile: usize },
    RequestNewCenterCards,
}

/// Rejection detail sent back to a client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorMessage {
    pub error: String,
    pub message: String,
}

impl From<&GameError> for ErrorMessage {
    fn from(err: &GameError) -> Self {
        ErrorMessage { error: err.code().to_string(), message: err.to_string() }
    }
}

/// Payload pushed from a session actor to one connection task.
#[derive(Debug, Clone)]
pub enum Outbound {
    State(PlayerView),
    Error(ErrorMessage),
}
