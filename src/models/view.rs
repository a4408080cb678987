use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::Card;

/// One player's view of the table, pushed after every accepted mutation.
///
/// The projection is asymmetric on purpose: the recipient sees their own
/// cards, but only counts for the opponent. Each center pile is reduced to
/// its top card, the only one that matters for play.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerView {
    pub player_id: Uuid,
    pub hand: Vec<Card>,
    pub draw_pile_count: usize,
    pub opponent_hand_count: usize,
    pub opponent_draw_pile_count: usize,
    pub center_piles: Vec<Vec<Card>>,
    pub game_started: bool,
    pub winner: Option<Uuid>,
}
