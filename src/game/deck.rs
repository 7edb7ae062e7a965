//! Policy Deck
//!
//! Draw pile, discard pile and enacted counters. Tiles are conserved:
//! draw + discard + enacted + tiles in hand always equals [`DECK_SIZE`].

use serde::{Serialize, Deserialize};

use crate::core::hash::StateHasher;
use crate::core::rng::RandomSource;
use crate::game::error::GameError;
use crate::game::state::Policy;
use crate::{DECK_SIZE, FASCIST_TILES, LIBERAL_TILES};

/// Result of a draw, noting whether the discard pile was recycled.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Draw {
    /// Tiles removed from the top of the draw pile
    pub tiles: Vec<Policy>,
    /// The discard pile was shuffled back in first
    pub reshuffled: bool,
}

/// The 17-tile policy deck.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyDeck {
    /// Top of the pile is index 0
    draw_pile: Vec<Policy>,
    discard_pile: Vec<Policy>,
    enacted_liberal: u8,
    enacted_fascist: u8,
}

impl PolicyDeck {
    /// A deck with no tiles (lobby placeholder).
    pub fn empty() -> Self {
        Self {
            draw_pile: Vec::new(),
            discard_pile: Vec::new(),
            enacted_liberal: 0,
            enacted_fascist: 0,
        }
    }

    /// Full deck of 6 liberal and 11 fascist tiles, shuffled.
    pub fn shuffled<R: RandomSource>(rng: &mut R) -> Self {
        let mut draw_pile = Vec::with_capacity(DECK_SIZE);
        draw_pile.extend(std::iter::repeat(Policy::Liberal).take(LIBERAL_TILES));
        draw_pile.extend(std::iter::repeat(Policy::Fascist).take(FASCIST_TILES));
        rng.shuffle(&mut draw_pile);

        Self {
            draw_pile,
            discard_pile: Vec::new(),
            enacted_liberal: 0,
            enacted_fascist: 0,
        }
    }

    /// Build a deck from explicit piles. Used to stage scenarios.
    pub fn from_piles(draw_pile: Vec<Policy>, discard_pile: Vec<Policy>) -> Self {
        Self {
            draw_pile,
            discard_pile,
            enacted_liberal: 0,
            enacted_fascist: 0,
        }
    }

    /// Remove and return the top `k` tiles.
    ///
    /// If fewer than `k` remain, the discard pile is shuffled and appended
    /// below the remaining draw tiles before drawing.
    pub fn draw<R: RandomSource>(&mut self, k: usize, rng: &mut R) -> Result<Draw, GameError> {
        let reshuffled = self.ensure_available(k, rng)?;
        let tiles = self.draw_pile.drain(..k).collect();
        Ok(Draw { tiles, reshuffled })
    }

    /// Look at the top `k` tiles without removing them.
    ///
    /// Applies the same reshuffle rule as [`PolicyDeck::draw`].
    pub fn peek<R: RandomSource>(&mut self, k: usize, rng: &mut R) -> Result<Draw, GameError> {
        let reshuffled = self.ensure_available(k, rng)?;
        let tiles = self.draw_pile[..k].to_vec();
        Ok(Draw { tiles, reshuffled })
    }

    fn ensure_available<R: RandomSource>(&mut self, k: usize, rng: &mut R) -> Result<bool, GameError> {
        if k > self.draw_pile.len() + self.discard_pile.len() {
            return Err(GameError::DeckExhausted);
        }
        if self.draw_pile.len() >= k {
            return Ok(false);
        }
        let mut recycled = std::mem::take(&mut self.discard_pile);
        rng.shuffle(&mut recycled);
        self.draw_pile.extend(recycled);
        Ok(true)
    }

    /// Put a tile on the discard pile.
    pub fn discard(&mut self, policy: Policy) {
        self.discard_pile.push(policy);
    }

    /// Enact a tile. It leaves circulation permanently.
    pub fn enact(&mut self, policy: Policy) {
        match policy {
            Policy::Liberal => self.enacted_liberal += 1,
            Policy::Fascist => self.enacted_fascist += 1,
        }
    }

    /// Enacted liberal policies.
    pub fn enacted_liberal(&self) -> u8 {
        self.enacted_liberal
    }

    /// Enacted fascist policies.
    pub fn enacted_fascist(&self) -> u8 {
        self.enacted_fascist
    }

    /// Tiles left in the draw pile.
    pub fn draw_pile_len(&self) -> usize {
        self.draw_pile.len()
    }

    /// Tiles in the discard pile.
    pub fn discard_pile_len(&self) -> usize {
        self.discard_pile.len()
    }

    /// Draw + discard + enacted. Equals [`DECK_SIZE`] minus tiles in hand.
    pub fn accounted(&self) -> usize {
        self.draw_pile.len()
            + self.discard_pile.len()
            + self.enacted_liberal as usize
            + self.enacted_fascist as usize
    }

    /// Hash deck contents in pile order.
    pub fn hash_into(&self, hasher: &mut StateHasher) {
        hasher.update_u32(self.draw_pile.len() as u32);
        for tile in &self.draw_pile {
            hasher.update_u8(*tile as u8);
        }
        hasher.update_u32(self.discard_pile.len() as u32);
        for tile in &self.discard_pile {
            hasher.update_u8(*tile as u8);
        }
        hasher.update_u8(self.enacted_liberal);
        hasher.update_u8(self.enacted_fascist);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::rng::DeterministicRng;
    use proptest::prelude::*;

    #[test]
    fn test_full_deck_composition() {
        let mut rng = DeterministicRng::new(7);
        let deck = PolicyDeck::shuffled(&mut rng);

        assert_eq!(deck.draw_pile_len(), DECK_SIZE);
        let liberals = deck.draw_pile.iter().filter(|p| **p == Policy::Liberal).count();
        assert_eq!(liberals, LIBERAL_TILES);
        assert_eq!(deck.accounted(), DECK_SIZE);
    }

    #[test]
    fn test_shuffle_is_seeded() {
        let a = PolicyDeck::shuffled(&mut DeterministicRng::new(99));
        let b = PolicyDeck::shuffled(&mut DeterministicRng::new(99));
        assert_eq!(a, b);
    }

    #[test]
    fn test_draw_without_reshuffle() {
        let mut rng = DeterministicRng::new(1);
        let mut deck = PolicyDeck::from_piles(
            vec![Policy::Liberal, Policy::Fascist, Policy::Fascist, Policy::Liberal],
            vec![Policy::Fascist],
        );

        let draw = deck.draw(3, &mut rng).unwrap();
        assert_eq!(draw.tiles, vec![Policy::Liberal, Policy::Fascist, Policy::Fascist]);
        assert!(!draw.reshuffled);
        assert_eq!(deck.draw_pile_len(), 1);
        assert_eq!(deck.discard_pile_len(), 1);
    }

    #[test]
    fn test_reshuffle_keeps_remaining_tiles_on_top() {
        let mut rng = DeterministicRng::new(1);
        let mut deck = PolicyDeck::from_piles(
            vec![Policy::Liberal],
            vec![Policy::Fascist, Policy::Fascist, Policy::Fascist],
        );

        let draw = deck.draw(3, &mut rng).unwrap();
        assert!(draw.reshuffled);
        assert_eq!(draw.tiles[0], Policy::Liberal);
        assert_eq!(deck.discard_pile_len(), 0);
        assert_eq!(deck.draw_pile_len(), 1);
    }

    #[test]
    fn test_reshuffle_excludes_enacted() {
        let mut rng = DeterministicRng::new(3);
        let mut deck = PolicyDeck::from_piles(vec![Policy::Liberal], vec![Policy::Fascist]);
        deck.enact(Policy::Liberal);

        assert!(matches!(deck.draw(3, &mut rng), Err(GameError::DeckExhausted)));
        let draw = deck.draw(2, &mut rng).unwrap();
        assert_eq!(draw.tiles.len(), 2);
        assert_eq!(deck.enacted_liberal(), 1);
    }

    #[test]
    fn test_peek_does_not_remove() {
        let mut rng = DeterministicRng::new(4);
        let mut deck = PolicyDeck::shuffled(&mut rng);
        let peeked = deck.peek(3, &mut rng).unwrap();
        let drawn = deck.draw(3, &mut rng).unwrap();
        assert_eq!(peeked.tiles, drawn.tiles);
    }

    proptest! {
        #[test]
        fn prop_conservation(seed in any::<u64>(), choices in proptest::collection::vec(0u8..3, 1..40)) {
            let mut rng = DeterministicRng::new(seed);
            let mut deck = PolicyDeck::shuffled(&mut rng);

            for choice in choices {
                let Ok(draw) = deck.draw(3, &mut rng) else { break };
                let held = draw.tiles.len();
                prop_assert_eq!(deck.accounted() + held, DECK_SIZE);

                // Discard one, enact or discard the rest
                let mut hand = draw.tiles;
                deck.discard(hand.remove(choice as usize % 3));
                let enacted = hand.remove(0);
                if choice == 0 {
                    deck.discard(enacted);
                } else {
                    deck.enact(enacted);
                }
                deck.discard(hand.remove(0));
                prop_assert_eq!(deck.accounted(), DECK_SIZE);
            }
        }
    }
}
