//! Executive Actions
//!
//! Presidential powers unlocked by fascist policies. The table depends on
//! the starting player count; at most one power is pending at a time.

use serde::{Serialize, Deserialize};
use tracing::info;

use crate::core::rng::RandomSource;
use crate::game::election;
use crate::game::error::GameError;
use crate::game::events::{ExecutiveResult, GameEventData};
use crate::game::state::{GameState, Phase, PlayerId};
use crate::game::win;
use crate::PRESIDENT_HAND_SIZE;

/// A presidential power.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum ExecutivePower {
    /// Learn one player's party
    InvestigateLoyalty = 0,
    /// Choose the next president
    SpecialElection = 1,
    /// See the top three tiles
    PolicyPeek = 2,
    /// Kill a player
    Execution = 3,
}

impl ExecutivePower {
    /// Whether the power is aimed at another player.
    pub fn needs_target(self) -> bool {
        !matches!(self, ExecutivePower::PolicyPeek)
    }
}

/// Power granted by the `fascist_enacted`-th fascist policy.
///
/// | players | 1st   | 2nd   | 3rd     | 4th  | 5th  |
/// |---------|-------|-------|---------|------|------|
/// | 5-6     | -     | -     | peek    | kill | kill |
/// | 7-8     | -     | inv.  | special | kill | kill |
/// | 9-10    | inv.  | inv.  | special | kill | kill |
pub fn power_for(player_count: usize, fascist_enacted: u8) -> Option<ExecutivePower> {
    use ExecutivePower::*;

    match (player_count, fascist_enacted) {
        (_, 4) | (_, 5) => Some(Execution),
        (5..=6, 3) => Some(PolicyPeek),
        (7..=10, 3) => Some(SpecialElection),
        (7..=10, 2) => Some(InvestigateLoyalty),
        (9..=10, 1) => Some(InvestigateLoyalty),
        _ => None,
    }
}

/// Enter `Phase::ExecutiveAction` with `power` pending.
pub(crate) fn grant<R: RandomSource + Clone>(state: &mut GameState<R>, power: ExecutivePower) {
    let Some(president) = state.president_id else {
        return;
    };
    state.phase = Phase::ExecutiveAction;
    state.pending_executive_action = Some(power);
    state.announce(GameEventData::ExecutiveActionPending {
        kind: power,
        president_id: president,
    });
}

/// President resolves the pending power.
pub fn resolve<R: RandomSource + Clone>(
    state: &mut GameState<R>,
    actor: PlayerId,
    target: Option<PlayerId>,
) -> Result<(), GameError> {
    if state.phase != Phase::ExecutiveAction {
        return Err(GameError::WrongPhase);
    }
    let power = state.pending_executive_action.ok_or(GameError::WrongPhase)?;
    let president = state.president_id.ok_or(GameError::WrongPhase)?;
    if actor != president {
        return Err(GameError::IllegalExecutiveAction);
    }

    let target = validate_target(state, power, president, target)?;
    state.pending_executive_action = None;

    match (power, target) {
        (ExecutivePower::InvestigateLoyalty, Some(target)) => {
            let party = state
                .get_player(&target)
                .and_then(|p| p.role.party())
                .ok_or(GameError::IllegalExecutiveAction)?;
            state.investigated.insert(target);
            info!(president = %president, target = %target, "Loyalty investigated");
            announce_resolved(state, power, ExecutiveResult::Investigated { target_id: target });
            state.tell(president, GameEventData::InvestigationResult {
                target_id: target,
                party,
            });
        }
        (ExecutivePower::SpecialElection, Some(target)) => {
            info!(president = %president, target = %target, "Special election called");
            announce_resolved(state, power, ExecutiveResult::SpecialElection { target_id: target });
            // Normal rotation resumes from the caller afterwards
            state.rotation_anchor = Some(president);
            election::install_president(state, target);
            return Ok(());
        }
        (ExecutivePower::PolicyPeek, None) => {
            let peek = state.deck.peek(PRESIDENT_HAND_SIZE, &mut state.rng)?;
            if peek.reshuffled {
                state.announce(GameEventData::DeckReshuffled {
                    draw_pile: state.deck.draw_pile_len() as u8,
                });
            }
            announce_resolved(
                state,
                power,
                ExecutiveResult::PolicyPeek { tiles_seen: peek.tiles.len() as u8 },
            );
            state.tell(president, GameEventData::PolicyPeekResult { policies: peek.tiles });
        }
        (ExecutivePower::Execution, Some(target)) => {
            if let Some(player) = state.get_player_mut(&target) {
                player.alive = false;
                player.vote = None;
            }
            info!(president = %president, target = %target, "Player executed");
            announce_resolved(state, power, ExecutiveResult::Executed { target_id: target });
            if win::check_and_finish(state) {
                return Ok(());
            }
        }
        _ => return Err(GameError::IllegalExecutiveAction),
    }

    election::start_next_round(state);
    Ok(())
}

fn validate_target<R: RandomSource + Clone>(
    state: &GameState<R>,
    power: ExecutivePower,
    president: PlayerId,
    target: Option<PlayerId>,
) -> Result<Option<PlayerId>, GameError> {
    match (power.needs_target(), target) {
        (false, None) => Ok(None),
        (true, Some(target)) => {
            if target == president || !state.is_alive(&target) {
                return Err(GameError::IllegalExecutiveAction);
            }
            if power == ExecutivePower::InvestigateLoyalty && state.investigated.contains(&target) {
                return Err(GameError::IllegalExecutiveAction);
            }
            Ok(Some(target))
        }
        _ => Err(GameError::IllegalExecutiveAction),
    }
}

fn announce_resolved<R: RandomSource + Clone>(
    state: &mut GameState<R>,
    kind: ExecutivePower,
    result: ExecutiveResult,
) {
    state.announce(GameEventData::ExecutiveActionResolved { kind, result });
}
