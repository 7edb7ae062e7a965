//! Legislative Session
//!
//! President draws three tiles and discards one, the chancellor enacts one
//! of the remaining two. Once veto is unlocked the chancellor may propose
//! discarding both; the president agrees or refuses.

use serde::{Serialize, Deserialize};
use tracing::{debug, info};

use crate::core::hash::StateHasher;
use crate::core::rng::RandomSource;
use crate::game::election;
use crate::game::error::GameError;
use crate::game::events::GameEventData;
use crate::game::executive;
use crate::game::state::{GameState, Phase, PlayerId, Policy};
use crate::game::win;
use crate::{PRESIDENT_HAND_SIZE, VETO_UNLOCK_FASCIST_POLICIES};

/// Sub-step of the legislative phase, with the tiles currently in hand.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum LegislativeStep {
    /// President holds three tiles
    PresidentDiscard {
        /// Three tiles
        hand: Vec<Policy>,
    },
    /// Chancellor holds two tiles
    ChancellorEnact {
        /// Two tiles
        hand: Vec<Policy>,
        /// President already refused a veto this session
        veto_rejected: bool,
    },
    /// Chancellor asked to veto; waiting on the president
    VetoProposed {
        /// Two tiles awaiting the president's answer
        hand: Vec<Policy>,
    },
}

impl LegislativeStep {
    /// Tiles currently held.
    pub fn hand(&self) -> &[Policy] {
        match self {
            LegislativeStep::PresidentDiscard { hand }
            | LegislativeStep::ChancellorEnact { hand, .. }
            | LegislativeStep::VetoProposed { hand } => hand,
        }
    }

    /// Add to a state hash.
    pub fn hash_into(&self, hasher: &mut StateHasher) {
        let (tag, flag) = match self {
            LegislativeStep::PresidentDiscard { .. } => (1, false),
            LegislativeStep::ChancellorEnact { veto_rejected, .. } => (2, *veto_rejected),
            LegislativeStep::VetoProposed { .. } => (3, false),
        };
        hasher.update_u8(tag);
        hasher.update_bool(flag);
        hasher.update_u32(self.hand().len() as u32);
        for tile in self.hand() {
            hasher.update_u8(*tile as u8);
        }
    }
}

// =============================================================================
// DRAWING
// =============================================================================

/// Draw `k` tiles, announcing a reshuffle if the discard pile was recycled.
pub(crate) fn draw_tiles<R: RandomSource + Clone>(
    state: &mut GameState<R>,
    k: usize,
) -> Result<Vec<Policy>, GameError> {
    let draw = state.deck.draw(k, &mut state.rng)?;
    if draw.reshuffled {
        let draw_pile = (state.deck.draw_pile_len() + k) as u8;
        debug!(draw_pile, "Discard pile reshuffled into draw pile");
        state.announce(GameEventData::DeckReshuffled { draw_pile });
    }
    Ok(draw.tiles)
}

/// Start a session for the freshly elected government.
pub(crate) fn begin<R: RandomSource + Clone>(state: &mut GameState<R>) -> Result<(), GameError> {
    let president = state.president_id.ok_or(GameError::WrongPhase)?;
    let chancellor = state.chancellor_id.ok_or(GameError::WrongPhase)?;

    let hand = draw_tiles(state, PRESIDENT_HAND_SIZE)?;

    state.phase = Phase::Legislative;
    state.legislative = Some(LegislativeStep::PresidentDiscard { hand: hand.clone() });

    state.announce(GameEventData::LegislativeStarted {
        president_id: president,
        chancellor_id: chancellor,
    });
    state.tell(president, GameEventData::PolicyHandDealt {
        target_id: president,
        policies: hand,
    });
    Ok(())
}

// =============================================================================
// PRESIDENT
// =============================================================================

/// President discards the tile at `index` and passes the rest on.
pub fn discard_policy<R: RandomSource + Clone>(
    state: &mut GameState<R>,
    actor: PlayerId,
    index: usize,
) -> Result<(), GameError> {
    let Some(LegislativeStep::PresidentDiscard { hand }) = &state.legislative else {
        return Err(GameError::WrongPhase);
    };
    if state.president_id != Some(actor) || index >= hand.len() {
        return Err(GameError::IllegalDiscard);
    }
    let chancellor = state.chancellor_id.ok_or(GameError::WrongPhase)?;

    let mut hand = hand.clone();
    let discarded = hand.remove(index);
    state.deck.discard(discarded);
    state.legislative = Some(LegislativeStep::ChancellorEnact {
        hand: hand.clone(),
        veto_rejected: false,
    });

    state.announce(GameEventData::PresidentDiscarded);
    state.tell(chancellor, GameEventData::PolicyHandDealt {
        target_id: chancellor,
        policies: hand,
    });
    Ok(())
}

// =============================================================================
// CHANCELLOR
// =============================================================================

/// Chancellor enacts the tile at `index`; the other is discarded.
pub fn enact_policy<R: RandomSource + Clone>(
    state: &mut GameState<R>,
    actor: PlayerId,
    index: usize,
) -> Result<(), GameError> {
    let Some(LegislativeStep::ChancellorEnact { hand, .. }) = &state.legislative else {
        return Err(GameError::WrongPhase);
    };
    if state.chancellor_id != Some(actor) || index >= hand.len() {
        return Err(GameError::IllegalDiscard);
    }

    let mut hand = hand.clone();
    let policy = hand.remove(index);
    for tile in hand {
        state.deck.discard(tile);
    }
    state.legislative = None;

    enact_tile(state, policy);
    if state.is_over() {
        return Ok(());
    }

    let power = match policy {
        Policy::Fascist => executive::power_for(state.player_count(), state.deck.enacted_fascist()),
        Policy::Liberal => None,
    };
    match power {
        Some(power) => executive::grant(state, power),
        None => election::start_next_round(state),
    }
    Ok(())
}

/// Put a tile on the board, unlock veto at five fascist policies and check
/// for a winner.
pub(crate) fn enact_tile<R: RandomSource + Clone>(state: &mut GameState<R>, policy: Policy) {
    state.deck.enact(policy);
    info!(
        policy = ?policy,
        liberal = state.deck.enacted_liberal(),
        fascist = state.deck.enacted_fascist(),
        "Policy enacted"
    );
    state.announce(GameEventData::PolicyEnacted {
        policy,
        enacted_liberal: state.deck.enacted_liberal(),
        enacted_fascist: state.deck.enacted_fascist(),
    });

    if !state.veto_unlocked && state.deck.enacted_fascist() >= VETO_UNLOCK_FASCIST_POLICIES {
        state.veto_unlocked = true;
        state.announce(GameEventData::VetoUnlocked);
    }

    win::check_and_finish(state);
}

// =============================================================================
// VETO
// =============================================================================

/// Veto handshake.
///
/// The chancellor proposes with `agree = true` while holding two tiles. The
/// president then answers: agreeing discards both tiles and counts as a
/// failed government, refusing hands the tiles back and rules out another
/// proposal this session.
pub fn resolve_veto<R: RandomSource + Clone>(
    state: &mut GameState<R>,
    actor: PlayerId,
    agree: bool,
) -> Result<(), GameError> {
    if state.phase != Phase::Legislative {
        return Err(GameError::WrongPhase);
    }
    match state.legislative.clone() {
        Some(LegislativeStep::ChancellorEnact { hand, veto_rejected }) => {
            let chancellor = state.chancellor_id.ok_or(GameError::WrongPhase)?;
            if actor != chancellor || !agree || !state.veto_unlocked || veto_rejected {
                return Err(GameError::IllegalVeto);
            }
            state.legislative = Some(LegislativeStep::VetoProposed { hand });
            debug!(chancellor = %chancellor, "Veto proposed");
            state.announce(GameEventData::VetoProposed { chancellor_id: chancellor });
            Ok(())
        }
        Some(LegislativeStep::VetoProposed { hand }) => {
            if state.president_id != Some(actor) {
                return Err(GameError::IllegalVeto);
            }
            state.announce(GameEventData::VetoResolved { agreed: agree });

            if agree {
                for tile in hand {
                    state.deck.discard(tile);
                }
                state.legislative = None;
                state.chancellor_id = None;
                info!("Veto agreed, both policies discarded");
                election::government_failed(state)
            } else {
                state.legislative = Some(LegislativeStep::ChancellorEnact {
                    hand,
                    veto_rejected: true,
                });
                Ok(())
            }
        }
        _ => Err(GameError::IllegalVeto),
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::deck::PolicyDeck;
    use crate::game::state::{PlayerState, Role};
    use crate::DECK_SIZE;

    use Policy::{Fascist as F, Liberal as L};

    /// Five liberals with an elected government p1/p2 and a staged deck.
    fn elected(draw: Vec<Policy>) -> (GameState, Vec<PlayerId>) {
        let mut state = GameState::new(11);
        let ids: Vec<PlayerId> = (1..=5).map(|i| PlayerId::new([i; 16])).collect();
        for id in &ids {
            let mut p = PlayerState::new(*id, format!("p{}", id.0[0]));
            p.role = Role::Liberal;
            state.players.insert(*id, p);
            state.roster.push(*id);
        }
        state.deck = PolicyDeck::from_piles(draw, Vec::new());
        state.president_id = Some(ids[0]);
        state.chancellor_id = Some(ids[1]);
        state.presidential_terms = 1;
        begin(&mut state).unwrap();
        (state, ids)
    }

    #[test]
    fn test_hand_flow() {
        let (mut state, ids) = elected(vec![F, L, F, L]);
        assert_eq!(state.phase, Phase::Legislative);

        discard_policy(&mut state, ids[0], 0).unwrap();
        assert_eq!(state.legislative.as_ref().unwrap().hand(), &[L, F]);

        enact_policy(&mut state, ids[1], 0).unwrap();
        assert_eq!(state.deck.enacted_liberal(), 1);
        assert_eq!(state.deck.discard_pile_len(), 2);
        assert_eq!(state.phase, Phase::Nomination);
        assert_eq!(state.president_id, Some(ids[1]));
    }

    #[test]
    fn test_wrong_actor_and_index() {
        let (mut state, ids) = elected(vec![F, L, F]);
        assert_eq!(discard_policy(&mut state, ids[1], 0), Err(GameError::IllegalDiscard));
        assert_eq!(discard_policy(&mut state, ids[0], 3), Err(GameError::IllegalDiscard));
        assert_eq!(enact_policy(&mut state, ids[1], 0), Err(GameError::WrongPhase));

        discard_policy(&mut state, ids[0], 2).unwrap();
        assert_eq!(enact_policy(&mut state, ids[0], 0), Err(GameError::IllegalDiscard));
        assert_eq!(enact_policy(&mut state, ids[1], 2), Err(GameError::IllegalDiscard));
    }

    #[test]
    fn test_private_hands() {
        let (mut state, ids) = elected(vec![F, L, F]);
        let events = state.take_events();
        let dealt = events
            .iter()
            .find(|e| matches!(e.data, GameEventData::PolicyHandDealt { .. }))
            .unwrap();
        assert!(dealt.visible_to(&ids[0]));
        assert!(!dealt.visible_to(&ids[1]));
    }

    #[test]
    fn test_veto_locked() {
        let (mut state, ids) = elected(vec![F, L, F]);
        discard_policy(&mut state, ids[0], 0).unwrap();
        assert_eq!(resolve_veto(&mut state, ids[1], true), Err(GameError::IllegalVeto));
    }

    #[test]
    fn test_veto_agreed_discards_both() {
        let (mut state, ids) = elected(vec![F, L, F]);
        state.veto_unlocked = true;
        discard_policy(&mut state, ids[0], 0).unwrap();

        resolve_veto(&mut state, ids[1], true).unwrap();
        // Only the president answers
        assert_eq!(resolve_veto(&mut state, ids[1], true), Err(GameError::IllegalVeto));
        resolve_veto(&mut state, ids[0], true).unwrap();

        assert_eq!(state.deck.discard_pile_len(), 3);
        assert_eq!(state.election_tracker, 1);
        assert_eq!(state.phase, Phase::Nomination);
    }

    #[test]
    fn test_veto_refused_once() {
        let (mut state, ids) = elected(vec![F, L, F]);
        state.veto_unlocked = true;
        discard_policy(&mut state, ids[0], 0).unwrap();

        resolve_veto(&mut state, ids[1], true).unwrap();
        resolve_veto(&mut state, ids[0], false).unwrap();
        assert!(matches!(
            state.legislative,
            Some(LegislativeStep::ChancellorEnact { veto_rejected: true, .. })
        ));
        assert_eq!(resolve_veto(&mut state, ids[1], true), Err(GameError::IllegalVeto));
        enact_policy(&mut state, ids[1], 1).unwrap();
        assert_eq!(state.deck.enacted_fascist(), 1);
    }

    #[test]
    fn test_reshuffle_announced() {
        let mut state = GameState::new(2);
        state.deck = PolicyDeck::from_piles(vec![L, F], vec![F, F, L]);
        let tiles = draw_tiles(&mut state, 3).unwrap();
        assert_eq!(tiles.len(), 3);
        assert!(state
            .take_events()
            .iter()
            .any(|e| e.data == GameEventData::DeckReshuffled { draw_pile: 5 }));
        assert_eq!(state.deck.accounted() + tiles.len(), 5);
        assert!(state.deck.accounted() < DECK_SIZE);
    }
}
