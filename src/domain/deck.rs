use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use thiserror::Error;

use crate::domain::{Card, Rank, Suit};

pub const DECK_SIZE: usize = 52;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DeckError {
    #[error("needed {needed} cards but only {left} remain")]
    InsufficientCards { needed: usize, left: usize },
}

/// The 52 unique cards in a fixed order; shuffle before dealing.
pub fn fresh_deck() -> Vec<Card> {
    let mut deck = Vec::with_capacity(DECK_SIZE);
    for suit in Suit::ALL {
        for rank in Rank::ALL {
            deck.push(Card { suit, rank });
        }
    }
    deck
}

pub fn shuffle(deck: &mut [Card], rng: &mut StdRng) {
    deck.shuffle(rng);
}

/// Deals `n` cards off the back of the deck.
///
/// Running out is an invariant violation given the fixed 52-card layout,
/// not a condition callers are expected to recover from.
pub fn deal(deck: &mut Vec<Card>, n: usize) -> Result<Vec<Card>, DeckError> {
    if deck.len() < n {
        return Err(DeckError::InsufficientCards { needed: n, left: deck.len() });
    }
    Ok(deck.split_off(deck.len() - n))
}
