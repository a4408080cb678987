use std::collections::VecDeque;

use rand::rngs::StdRng;
use uuid::Uuid;

use crate::domain::{deck, Card, Rules};
use crate::game::GameError;
use crate::models::PlayerView;
use crate::shared::{CENTER_PILE_COUNT, DRAW_PILE_SIZE, HAND_SIZE};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    WaitingForOpponent,
    InProgress,
    Finished(Uuid),
    /// Terminal stall: neither player can move and a draw pile ran dry.
    /// Distinct from `Finished`, nobody won.
    Stalled,
}

#[derive(Debug)]
struct PlayerSlot {
    id: Uuid,
    hand: Vec<Card>,
    draw_pile: VecDeque<Card>,
    redeal_requested: bool,
}

impl PlayerSlot {
    fn new(id: Uuid) -> Self {
        PlayerSlot { id, hand: Vec::new(), draw_pile: VecDeque::new(), redeal_requested: false }
    }
}

/// What an accepted `play_card` did, so the caller knows what to announce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayOutcome {
    Played,
    Won,
}

/// What an accepted redeal request did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedealOutcome {
    /// Flag recorded; the piles wait for the opponent's confirmation.
    Pending,
    /// Both players confirmed, each center pile drew a fresh card.
    Redealt,
}

/// One match's full state: two seats, two shared center piles, the leftover
/// reservoir, and the status machine. All mutation goes through the methods
/// here; the actor layer serializes callers so these never interleave.
pub struct GameSession {
    players: Vec<PlayerSlot>,
    center_piles: [Vec<Card>; CENTER_PILE_COUNT],
    reservoir: Vec<Card>,
    status: SessionStatus,
    rules: Rules,
    rng: StdRng,
}

impl GameSession {
    /// Opens a session with one seat taken. No cards move until `join`.
    pub fn new(first_player: Uuid, rules: Rules, rng: StdRng) -> Self {
        GameSession {
            players: vec![PlayerSlot::new(first_player)],
            center_piles: [Vec::new(), Vec::new()],
            reservoir: Vec::new(),
            status: SessionStatus::WaitingForOpponent,
            rules,
            rng,
        }
    }

    /// Seats the second player and performs the initial deal: 5 to each
    /// hand, 15 to each draw pile, one flipped to each center pile, the
    /// rest held back as the reservoir.
    pub fn join(&mut self, second_player: Uuid) -> Result<(), GameError> {
        if self.status != SessionStatus::WaitingForOpponent || self.players.len() != 1 {
            return Err(GameError::TableFull);
        }
        self.players.push(PlayerSlot::new(second_player));

        let mut deck = deck::fresh_deck();
        deck::shuffle(&mut deck, &mut self.rng);

        for player in &mut self.players {
            player.hand =
                deck::deal(&mut deck, HAND_SIZE).expect("52 cards cover the initial deal");
            player.draw_pile =
                deck::deal(&mut deck, DRAW_PILE_SIZE).expect("52 cards cover the initial deal").into();
        }
        for pile in &mut self.center_piles {
            pile.extend(deck::deal(&mut deck, 1).expect("52 cards cover the initial deal"));
        }
        self.reservoir = deck;
        self.status = SessionStatus::InProgress;

        debug_assert_eq!(self.total_cards(), deck::DECK_SIZE);
        Ok(())
    }

    /// Plays the card at `card_index` onto the named center pile.
    ///
    /// Validation happens against the pile the player asked for; a card
    /// that would fit the other pile is still an illegal move here.
    pub fn play_card(
        &mut self,
        player_id: Uuid,
        card_index: usize,
        target_pile: usize,
    ) -> Result<PlayOutcome, GameError> {
        if self.status != SessionStatus::InProgress {
            return Err(GameError::NotInProgress);
        }
        let seat = self.seat_of(player_id)?;
        if target_pile >= self.center_piles.len() {
            return Err(GameError::UnknownPile(target_pile));
        }
        let hand_len = self.players[seat].hand.len();
        if card_index >= hand_len {
            return Err(GameError::IndexOutOfRange { index: card_index, hand_len });
        }

        let card = self.players[seat].hand[card_index];
        if let Some(top) = self.center_piles[target_pile].last() {
            if !self.rules.is_legal_play(&card, top) {
                return Err(GameError::IllegalMove { card, top: *top });
            }
        }

        // Past this point the play is committed; no more rejections.
        self.players[seat].hand.remove(card_index);
        self.center_piles[target_pile].push(card);

        let player = &mut self.players[seat];
        if let Some(drawn) = player.draw_pile.pop_front() {
            player.hand.push(drawn);
        }
        let emptied = player.hand.is_empty() && player.draw_pile.is_empty();

        debug_assert_eq!(self.total_cards(), deck::DECK_SIZE);

        if emptied {
            self.status = SessionStatus::Finished(player_id);
            return Ok(PlayOutcome::Won);
        }
        Ok(PlayOutcome::Played)
    }

    /// Mutual-redeal protocol: a single request only records the player's
    /// claim of being stuck. Once both players have claimed, the server
    /// rechecks both hands against both pile tops; a surviving legal play
    /// voids both claims. A qualifying redeal pulls one card from each
    /// player's own draw pile onto their same-numbered center pile.
    pub fn request_new_center_cards(&mut self, player_id: Uuid) -> Result<RedealOutcome, GameError> {
        if self.status != SessionStatus::InProgress {
            return Err(GameError::NotInProgress);
        }
        let seat = self.seat_of(player_id)?;
        self.players[seat].redeal_requested = true;

        if !self.players.iter().all(|p| p.redeal_requested) {
            return Ok(RedealOutcome::Pending);
        }

        // Both players claim to be stuck; the server has the last word.
        if self.players.iter().any(|p| self.hand_has_legal_play(&p.hand)) {
            for player in &mut self.players {
                player.redeal_requested = false;
            }
            return Err(GameError::StaleRedealRequest);
        }

        if self.players.iter().any(|p| p.draw_pile.is_empty()) {
            self.status = SessionStatus::Stalled;
            return Err(GameError::Deadlock);
        }

        for seat in 0..CENTER_PILE_COUNT {
            if let Some(card) = self.players[seat].draw_pile.pop_front() {
                self.center_piles[seat].push(card);
            }
            self.players[seat].redeal_requested = false;
        }

        debug_assert_eq!(self.total_cards(), deck::DECK_SIZE);
        Ok(RedealOutcome::Redealt)
    }

    pub fn has_legal_move(&self, player_id: Uuid) -> Result<bool, GameError> {
        let seat = self.seat_of(player_id)?;
        Ok(self.hand_has_legal_play(&self.players[seat].hand))
    }

    /// The asymmetric projection for one recipient: own cards in full, the
    /// opponent reduced to counts, center piles reduced to their tops.
    /// Built fresh on every call, never cached.
    pub fn view_for(&self, player_id: Uuid) -> Result<PlayerView, GameError> {
        let seat = self.seat_of(player_id)?;
        let player = &self.players[seat];
        let (opponent_hand_count, opponent_draw_pile_count) = match self.players.get(1 - seat) {
            Some(opponent) => (opponent.hand.len(), opponent.draw_pile.len()),
            None => (0, 0),
        };

        Ok(PlayerView {
            player_id,
            hand: player.hand.clone(),
            draw_pile_count: player.draw_pile.len(),
            opponent_hand_count,
            opponent_draw_pile_count,
            center_piles: self
                .center_piles
                .iter()
                .map(|pile| pile.last().copied().into_iter().collect())
                .collect(),
            game_started: self.status != SessionStatus::WaitingForOpponent,
            winner: match self.status {
                SessionStatus::Finished(winner) => Some(winner),
                _ => None,
            },
        })
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    /// Cards across every zone; always 52 once the deal has happened.
    pub fn total_cards(&self) -> usize {
        self.players.iter().map(|p| p.hand.len() + p.draw_pile.len()).sum::<usize>()
            + self.center_piles.iter().map(Vec::len).sum::<usize>()
            + self.reservoir.len()
    }

    fn seat_of(&self, player_id: Uuid) -> Result<usize, GameError> {
        self.players
            .iter()
            .position(|p| p.id == player_id)
            .ok_or(GameError::UnknownPlayer(player_id))
    }

    fn hand_has_legal_play(&self, hand: &[Card]) -> bool {
        hand.iter().any(|card| {
            self.center_piles
                .iter()
                .any(|pile| pile.last().map_or(true, |top| self.rules.is_legal_play(card, top)))
        })
    }
}

// Test-only fixture hooks. Each swaps cards in place so the 52-card
// accounting stays intact.
#[cfg(test)]
impl GameSession {
    pub fn set_center_top(&mut self, pile: usize, card: Card) {
        let pile = &mut self.center_piles[pile];
        pile.pop();
        pile.push(card);
    }

    pub fn set_hand_card(&mut self, player_id: Uuid, index: usize, card: Card) {
        let seat = self.seat_of(player_id).unwrap();
        self.players[seat].hand[index] = card;
    }

    pub fn hand_of(&self, player_id: Uuid) -> Vec<Card> {
        let seat = self.seat_of(player_id).unwrap();
        self.players[seat].hand.clone()
    }

    pub fn drain_draw_pile(&mut self, player_id: Uuid) {
        let seat = self.seat_of(player_id).unwrap();
        let drained: Vec<Card> = self.players[seat].draw_pile.drain(..).collect();
        self.reservoir.extend(drained);
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use rand::SeedableRng;

    use super::*;
    use crate::domain::{Rank, Suit};

    fn card(suit: Suit, rank: Rank) -> Card {
        Card { suit, rank }
    }

    fn started(seed: u64) -> (GameSession, Uuid, Uuid) {
        let p0 = Uuid::new_v4();
        let p1 = Uuid::new_v4();
        let mut session = GameSession::new(p0, Rules::default(), StdRng::seed_from_u64(seed));
        session.join(p1).unwrap();
        (session, p0, p1)
    }

    /// Swaps every hand card and both pile tops so neither player has a
    /// legal play: hands of Threes against pile tops of Sevens.
    fn make_both_stuck(session: &mut GameSession) {
        for pile in 0..CENTER_PILE_COUNT {
            session.center_piles[pile].pop();
            session.center_piles[pile].push(card(Suit::Hearts, Rank::Seven));
        }
        for player in &mut session.players {
            for held in &mut player.hand {
                *held = card(Suit::Clubs, Rank::Three);
            }
        }
    }

    #[test]
    fn join_deals_the_fixed_layout() {
        let (session, p0, p1) = started(1);
        assert_eq!(session.status(), SessionStatus::InProgress);
        assert_eq!(session.total_cards(), deck::DECK_SIZE);
        for id in [p0, p1] {
            let view = session.view_for(id).unwrap();
            assert_eq!(view.hand.len(), HAND_SIZE);
            assert_eq!(view.draw_pile_count, DRAW_PILE_SIZE);
            assert_eq!(view.opponent_hand_count, HAND_SIZE);
            assert_eq!(view.opponent_draw_pile_count, DRAW_PILE_SIZE);
            assert_eq!(view.center_piles.len(), CENTER_PILE_COUNT);
            assert_eq!(view.center_piles[0].len(), 1);
            assert!(view.game_started);
            assert_eq!(view.winner, None);
        }
        assert_eq!(session.reservoir.len(), 10);
    }

    #[test]
    fn view_before_pairing_shows_an_unstarted_table() {
        let p0 = Uuid::new_v4();
        let session = GameSession::new(p0, Rules::default(), StdRng::seed_from_u64(1));
        let view = session.view_for(p0).unwrap();
        assert!(!view.game_started);
        assert_eq!(view.opponent_hand_count, 0);
        assert_eq!(view.opponent_draw_pile_count, 0);
    }

    #[test]
    fn a_third_player_cannot_join() {
        let (mut session, _, _) = started(2);
        assert_eq!(session.join(Uuid::new_v4()), Err(GameError::TableFull));
    }

    #[test]
    fn actions_are_rejected_before_the_game_starts() {
        let p0 = Uuid::new_v4();
        let mut session = GameSession::new(p0, Rules::default(), StdRng::seed_from_u64(3));
        assert_eq!(session.play_card(p0, 0, 0), Err(GameError::NotInProgress));
        assert_eq!(session.request_new_center_cards(p0), Err(GameError::NotInProgress));
    }

    #[test]
    fn adjacent_card_lands_and_the_hand_replenishes() {
        let (mut session, p0, _) = started(4);
        session.set_center_top(0, card(Suit::Hearts, Rank::Five));
        session.set_hand_card(p0, 2, card(Suit::Hearts, Rank::Six));

        assert_eq!(session.play_card(p0, 2, 0), Ok(PlayOutcome::Played));

        assert_eq!(
            session.center_piles[0].last(),
            Some(&card(Suit::Hearts, Rank::Six))
        );
        let view = session.view_for(p0).unwrap();
        assert_eq!(view.hand.len(), HAND_SIZE); // removed one, drew one
        assert_eq!(view.draw_pile_count, DRAW_PILE_SIZE - 1);
        assert_eq!(session.total_cards(), deck::DECK_SIZE);
    }

    #[test]
    fn target_pile_is_honored_not_guessed() {
        let (mut session, p0, _) = started(5);
        // Legal on pile 0, illegal on pile 1.
        session.set_center_top(0, card(Suit::Hearts, Rank::Five));
        session.set_center_top(1, card(Suit::Spades, Rank::Ten));
        session.set_hand_card(p0, 0, card(Suit::Clubs, Rank::Six));

        let err = session.play_card(p0, 0, 1).unwrap_err();
        assert!(matches!(err, GameError::IllegalMove { .. }));
        // Rejection left everything in place.
        assert_eq!(session.hand_of(p0)[0], card(Suit::Clubs, Rank::Six));
        assert_eq!(session.center_piles[1].last(), Some(&card(Suit::Spades, Rank::Ten)));

        assert_eq!(session.play_card(p0, 0, 0), Ok(PlayOutcome::Played));
    }

    #[test]
    fn king_on_ace_depends_on_the_wrap_rule() {
        for (wrap, expect_legal) in [(true, true), (false, false)] {
            let p0 = Uuid::new_v4();
            let p1 = Uuid::new_v4();
            let mut session = GameSession::new(
                p0,
                Rules { king_ace_wrap: wrap },
                StdRng::seed_from_u64(6),
            );
            session.join(p1).unwrap();
            session.set_center_top(0, card(Suit::Hearts, Rank::Ace));
            session.set_hand_card(p0, 0, card(Suit::Spades, Rank::King));

            let result = session.play_card(p0, 0, 0);
            assert_eq!(result.is_ok(), expect_legal, "wrap = {wrap}");
        }
    }

    #[test]
    fn out_of_range_index_is_rejected() {
        let (mut session, p0, _) = started(7);
        assert_eq!(
            session.play_card(p0, HAND_SIZE, 0),
            Err(GameError::IndexOutOfRange { index: HAND_SIZE, hand_len: HAND_SIZE })
        );
    }

    #[test]
    fn unknown_pile_and_unknown_player_are_rejected() {
        let (mut session, p0, _) = started(8);
        assert_eq!(session.play_card(p0, 0, 2), Err(GameError::UnknownPile(2)));
        let stranger = Uuid::new_v4();
        assert_eq!(
            session.play_card(stranger, 0, 0),
            Err(GameError::UnknownPlayer(stranger))
        );
    }

    #[test]
    fn emptying_hand_and_draw_pile_wins() {
        let (mut session, p0, p1) = started(9);
        session.set_center_top(0, card(Suit::Hearts, Rank::Five));

        // Strip player 0 down to a single playable card; everything moved
        // out parks in the reservoir so the 52-card count holds.
        let drained: Vec<Card> = session.players[0].draw_pile.drain(..).collect();
        session.reservoir.extend(drained);
        let removed = session.players[0].hand.split_off(1);
        session.reservoir.extend(removed);
        session.players[0].hand[0] = card(Suit::Hearts, Rank::Six);

        assert_eq!(session.play_card(p0, 0, 0), Ok(PlayOutcome::Won));
        assert_eq!(session.status(), SessionStatus::Finished(p0));
        assert_eq!(session.view_for(p1).unwrap().winner, Some(p0));

        // A finished session accepts no further mutation.
        assert_eq!(session.play_card(p1, 0, 0), Err(GameError::NotInProgress));
        assert_eq!(session.request_new_center_cards(p1), Err(GameError::NotInProgress));
    }

    #[test]
    fn redeal_request_is_idempotent_until_the_opponent_confirms() {
        let (mut session, p0, _) = started(10);
        make_both_stuck(&mut session);

        let before: Vec<usize> = session.players.iter().map(|p| p.draw_pile.len()).collect();
        assert_eq!(session.request_new_center_cards(p0), Ok(RedealOutcome::Pending));
        assert_eq!(session.request_new_center_cards(p0), Ok(RedealOutcome::Pending));

        let after: Vec<usize> = session.players.iter().map(|p| p.draw_pile.len()).collect();
        assert_eq!(before, after);
        assert!(session.players[0].redeal_requested);
        assert!(!session.players[1].redeal_requested);
    }

    #[test]
    fn mutual_redeal_draws_from_each_players_own_pile() {
        let (mut session, p0, p1) = started(11);
        make_both_stuck(&mut session);

        let expected: Vec<Card> = session
            .players
            .iter()
            .map(|p| *p.draw_pile.front().unwrap())
            .collect();

        assert_eq!(session.request_new_center_cards(p0), Ok(RedealOutcome::Pending));
        assert_eq!(session.request_new_center_cards(p1), Ok(RedealOutcome::Redealt));

        for seat in 0..CENTER_PILE_COUNT {
            assert_eq!(session.center_piles[seat].last(), Some(&expected[seat]));
            assert_eq!(session.players[seat].draw_pile.len(), DRAW_PILE_SIZE - 1);
            assert!(!session.players[seat].redeal_requested);
        }
        assert_eq!(session.total_cards(), deck::DECK_SIZE);
        assert_eq!(session.status(), SessionStatus::InProgress);
    }

    #[test]
    fn stale_redeal_is_rejected_and_clears_both_flags() {
        let (mut session, p0, p1) = started(12);
        make_both_stuck(&mut session);
        // Player 1 actually holds a playable card.
        session.set_hand_card(p1, 3, card(Suit::Diamonds, Rank::Eight));

        let tops: Vec<Option<Card>> =
            session.center_piles.iter().map(|p| p.last().copied()).collect();

        assert_eq!(session.request_new_center_cards(p0), Ok(RedealOutcome::Pending));
        assert_eq!(
            session.request_new_center_cards(p1),
            Err(GameError::StaleRedealRequest)
        );

        for (seat, top) in tops.iter().enumerate() {
            assert_eq!(session.center_piles[seat].last(), top.as_ref());
        }
        assert!(session.players.iter().all(|p| !p.redeal_requested));
        assert_eq!(session.status(), SessionStatus::InProgress);
    }

    #[test]
    fn redeal_with_an_empty_draw_pile_stalls_the_session() {
        let (mut session, p0, p1) = started(13);
        make_both_stuck(&mut session);
        let drained: Vec<Card> = session.players[0].draw_pile.drain(..).collect();
        session.reservoir.extend(drained);

        assert_eq!(session.request_new_center_cards(p0), Ok(RedealOutcome::Pending));
        assert_eq!(session.request_new_center_cards(p1), Err(GameError::Deadlock));
        assert_eq!(session.status(), SessionStatus::Stalled);
        assert_eq!(session.total_cards(), deck::DECK_SIZE);

        // Terminal: nothing moves any more.
        assert_eq!(session.play_card(p1, 0, 0), Err(GameError::NotInProgress));
    }

    #[test]
    fn has_legal_move_tracks_the_pile_tops() {
        let (mut session, p0, _) = started(14);
        make_both_stuck(&mut session);
        assert!(!session.has_legal_move(p0).unwrap());
        session.set_hand_card(p0, 0, card(Suit::Hearts, Rank::Six));
        assert!(session.has_legal_move(p0).unwrap());
    }

    #[test]
    fn views_never_carry_opponent_cards() {
        let (session, p0, p1) = started(15);
        let view = session.view_for(p0).unwrap();
        assert_eq!(view.hand, session.hand_of(p0));

        // The opponent shows up only as counts; the serialized form has no
        // field that could hold their cards.
        let json = serde_json::to_value(&view).unwrap();
        let fields: Vec<&str> = json.as_object().unwrap().keys().map(String::as_str).collect();
        assert!(fields.contains(&"opponent_hand_count"));
        assert!(fields.contains(&"opponent_draw_pile_count"));
        assert!(!fields.contains(&"opponent_hand"));
        assert_eq!(json["opponent_hand_count"], serde_json::json!(session.hand_of(p1).len()));
    }

    proptest! {
        /// Any mix of accepted and rejected actions conserves all 52 cards.
        #[test]
        fn card_conservation_under_arbitrary_actions(
            seed in any::<u64>(),
            actions in proptest::collection::vec(
                (any::<bool>(), 0usize..8, 0usize..2, any::<bool>()),
                0..60,
            ),
        ) {
            let (mut session, p0, p1) = started(seed);
            for (is_redeal, index, pile, second_player) in actions {
                let player = if second_player { p1 } else { p0 };
                if is_redeal {
                    let _ = session.request_new_center_cards(player);
                } else {
                    let _ = session.play_card(player, index, pile);
                }
                prop_assert_eq!(session.total_cards(), deck::DECK_SIZE);
            }
        }
    }
}
