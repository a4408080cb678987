use crate::domain::Card;

/// Table rules for what counts as a legal play.
///
/// Speed variants disagree on whether Ace and King are adjacent; the wrap is
/// on by default and can be disabled with `SPEED_KING_ACE_WRAP=0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rules {
    pub king_ace_wrap: bool,
}

impl Default for Rules {
    fn default() -> Self {
        Rules { king_ace_wrap: true }
    }
}

impl Rules {
    pub fn from_env() -> Self {
        let mut rules = Rules::default();
        if let Ok(value) = std::env::var("SPEED_KING_ACE_WRAP") {
            rules.king_ace_wrap = !matches!(value.as_str(), "0" | "false" | "off");
        }
        rules
    }

    /// A card may land on a pile top exactly one rank away, suits ignored.
    /// Only the {Ace, King} pair is 12 apart, so the wrap check is a plain
    /// distance test.
    pub fn is_legal_play(&self, card: &Card, top: &Card) -> bool {
        let distance = (i16::from(card.rank.value()) - i16::from(top.rank.value())).abs();
        distance == 1 || (self.king_ace_wrap && distance == 12)
    }
}
