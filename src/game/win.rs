//! Win Conditions
//!
//! Checked after every enactment, election and execution.

use tracing::info;

use crate::core::rng::RandomSource;
use crate::game::events::GameEventData;
use crate::game::state::{GameState, Party, Phase};
use crate::{FASCIST_POLICIES_TO_WIN, LIBERAL_POLICIES_TO_WIN};

/// Which party has won, if any. Pure query.
///
/// Liberals win on five liberal policies or a dead Hitler. Fascists win on
/// six fascist policies or Hitler elected chancellor in the hitler zone.
pub fn evaluate<R: RandomSource + Clone>(state: &GameState<R>) -> Option<Party> {
    let hitler_dead = state.hitler_id().is_some_and(|id| !state.is_alive(&id));

    if state.deck.enacted_liberal() >= LIBERAL_POLICIES_TO_WIN || hitler_dead {
        return Some(Party::Liberal);
    }
    if state.deck.enacted_fascist() >= FASCIST_POLICIES_TO_WIN || state.hitler_elected_chancellor {
        return Some(Party::Fascist);
    }
    None
}

/// End the game if a win condition holds. Returns true once the game is over.
///
/// The winner is written exactly once; later calls are no-ops.
pub(crate) fn check_and_finish<R: RandomSource + Clone>(state: &mut GameState<R>) -> bool {
    if state.is_over() {
        return true;
    }
    let Some(winner) = evaluate(state) else {
        return false;
    };

    state.winner = Some(winner);
    state.phase = Phase::GameOver;
    state.legislative = None;
    state.pending_executive_action = None;

    let roles = state
        .roster
        .iter()
        .filter_map(|id| state.players.get(id))
        .map(|p| (p.id, p.role))
        .collect();

    info!(
        winner = ?winner,
        liberal = state.deck.enacted_liberal(),
        fascist = state.deck.enacted_fascist(),
        "Game over"
    );
    state.announce(GameEventData::GameEnded { winner, roles });
    true
}
