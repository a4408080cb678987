pub mod cards;
pub mod deck;
pub mod rules;

pub use cards::{Card, Rank, Suit};
pub use deck::DeckError;
pub use rules::Rules;
