use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use std::collections::HashSet;

use crate::cards::{full_deck, Card, DECK_SIZE};
use crate::errors::GameError;

/// Draw and discard piles of one table's deck.
///
/// Hands and melds live on the seats; the session checks that all regions
/// together always hold the 40 cards exactly once.
///
/// Both piles keep their top card at the end of the vector. The random source
/// is owned by the deck so that every table shuffles independently and a seed
/// replays the same round.
#[derive(Debug, Clone)]
pub struct Deck {
    pub(crate) draw_pile: Vec<Card>,
    pub(crate) discard_pile: Vec<Card>,
    rng: ChaCha20Rng,
    seed: Option<u64>,
}

impl Deck {
    /// Builds the 40-card set and shuffles it with a ChaCha20 stream keyed by `seed`.
    pub fn new_shuffled(seed: u64) -> Self {
        let mut rng = ChaCha20Rng::seed_from_u64(seed);
        let mut cards = full_deck();
        cards.shuffle(&mut rng);
        Self {
            draw_pile: cards,
            discard_pile: Vec::new(),
            rng,
            seed: Some(seed),
        }
    }

    /// Builds a deck whose draw order is exactly `order` (first element is dealt first).
    /// `reshuffle_seed` keys the random source used if the discard pile is ever reshuffled.
    pub fn stacked(order: Vec<Card>, reshuffle_seed: u64) -> Result<Self, GameError> {
        if order.len() != DECK_SIZE {
            return Err(GameError::ConsistencyViolation(format!(
                "stacked deck has {} cards, expected {DECK_SIZE}",
                order.len()
            )));
        }
        let mut seen = HashSet::with_capacity(DECK_SIZE);
        if let Some(dup) = order.iter().find(|c| !seen.insert(**c)) {
            return Err(GameError::ConsistencyViolation(format!(
                "stacked deck contains {dup} twice"
            )));
        }
        let mut draw_pile = order;
        draw_pile.reverse();
        Ok(Self {
            draw_pile,
            discard_pile: Vec::new(),
            rng: ChaCha20Rng::seed_from_u64(reshuffle_seed),
            seed: None,
        })
    }

    /// Seed the deck was shuffled with, `None` for stacked decks.
    pub fn seed(&self) -> Option<u64> {
        self.seed
    }

    /// Deals `hand_size` passes of one card per seat, starting from seat 0.
    pub fn deal(&mut self, seat_count: usize, hand_size: usize) -> Result<Vec<Vec<Card>>, GameError> {
        let needed = seat_count * hand_size;
        if needed > self.draw_pile.len() {
            return Err(GameError::InsufficientCards {
                needed,
                available: self.draw_pile.len(),
            });
        }
        let mut hands = vec![Vec::with_capacity(hand_size); seat_count];
        for _ in 0..hand_size {
            for hand in hands.iter_mut() {
                if let Some(c) = self.draw_pile.pop() {
                    hand.push(c);
                }
            }
        }
        Ok(hands)
    }

    /// Moves the top of the draw pile onto the discard pile.
    pub fn flip_to_discard(&mut self) -> Result<Card, GameError> {
        let c = self.draw_pile.pop().ok_or(GameError::InsufficientCards {
            needed: 1,
            available: 0,
        })?;
        self.discard_pile.push(c);
        Ok(c)
    }

    /// Removes the top of the draw pile. An empty draw pile is rebuilt once from
    /// the discard pile without its top card; if that yields nothing the round is
    /// in stalemate.
    pub fn draw_from_deck(&mut self) -> Result<Card, GameError> {
        if self.draw_pile.is_empty() {
            self.reshuffle_discards();
        }
        self.draw_pile.pop().ok_or(GameError::Stalemate)
    }

    pub fn draw_from_discard(&mut self) -> Result<Card, GameError> {
        self.discard_pile.pop().ok_or(GameError::EmptyDiscard)
    }

    pub fn discard(&mut self, card: Card) {
        self.discard_pile.push(card);
    }

    pub fn discard_top(&self) -> Option<Card> {
        self.discard_pile.last().copied()
    }

    pub fn draw_count(&self) -> usize {
        self.draw_pile.len()
    }

    pub fn discard_count(&self) -> usize {
        self.discard_pile.len()
    }

    /// Cards in both piles, draw pile first.
    pub fn cards(&self) -> impl Iterator<Item = &Card> {
        self.draw_pile.iter().chain(self.discard_pile.iter())
    }

    fn reshuffle_discards(&mut self) {
        let Some(top) = self.discard_pile.pop() else {
            return;
        };
        let mut rest = std::mem::take(&mut self.discard_pile);
        rest.shuffle(&mut self.rng);
        self.draw_pile = rest;
        self.discard_pile.push(top);
    }
}
