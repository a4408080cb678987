pub const SERVER_ADDRESS: &str = "127.0.0.1";
pub const SERVER_PORT: u16 = 8080;

// Fixed Speed table layout: 5 cards in hand and 15 in the draw pile per
// player, one card flipped to each of the two center piles. The ten cards
// left over stay in the session reservoir.
pub const HAND_SIZE: usize = 5;
pub const DRAW_PILE_SIZE: usize = 15;
pub const CENTER_PILE_COUNT: usize = 2;
