//! Election Cycle
//!
//! Nomination, voting, tally, term limits, the election tracker and
//! presidential rotation.
//!
//! ## Flow
//!
//! 1. The president nominates an eligible chancellor (`Phase::Voting`)
//! 2. Alive players vote; disconnected players count as Nein once everyone
//!    else has voted
//! 3. Strict Ja majority elects the government, anything else fails it
//! 4. Three failed governments in a row enact the top tile (chaos)

use tracing::{debug, info};

use crate::core::rng::RandomSource;
use crate::game::error::GameError;
use crate::game::events::{ElectionOutcome, GameEventData, VoteRecord};
use crate::game::legislative;
use crate::game::state::{GameState, Phase, PlayerId, Role, Vote};
use crate::game::win;
use crate::{
    ELECTION_TRACKER_LIMIT, HITLER_ZONE_FASCIST_POLICIES, HITLER_ZONE_MIN_TERMS,
    TERM_LIMIT_PRESIDENT_MIN_ALIVE,
};

// =============================================================================
// ELIGIBILITY
// =============================================================================

/// Whether `candidate` may be nominated chancellor by the sitting president.
///
/// The candidate must be alive and not the president. The last elected
/// chancellor is always term-limited; the last elected president only while
/// seven or more players are alive.
pub fn is_eligible_chancellor<R: RandomSource + Clone>(
    state: &GameState<R>,
    candidate: &PlayerId,
) -> bool {
    if !state.is_alive(candidate) || state.president_id.as_ref() == Some(candidate) {
        return false;
    }
    if state.last_chancellor_id.as_ref() == Some(candidate) {
        return false;
    }
    if state.last_president_id.as_ref() == Some(candidate)
        && state.alive_count() >= TERM_LIMIT_PRESIDENT_MIN_ALIVE
    {
        return false;
    }
    true
}

/// Eligible chancellor candidates in seating order.
pub fn eligible_chancellors<R: RandomSource + Clone>(state: &GameState<R>) -> Vec<PlayerId> {
    state
        .roster
        .iter()
        .filter(|id| is_eligible_chancellor(state, id))
        .copied()
        .collect()
}

// =============================================================================
// NOMINATION & VOTING
// =============================================================================

/// President proposes a chancellor.
pub fn nominate<R: RandomSource + Clone>(
    state: &mut GameState<R>,
    actor: PlayerId,
    candidate: PlayerId,
) -> Result<(), GameError> {
    if state.phase != Phase::Nomination {
        return Err(GameError::WrongPhase);
    }
    let president = state.president_id.ok_or(GameError::WrongPhase)?;
    if actor != president || !is_eligible_chancellor(state, &candidate) {
        return Err(GameError::IllegalNomination);
    }

    state.chancellor_id = Some(candidate);
    state.votes_revealed = false;
    for player in state.players.values_mut() {
        player.vote = None;
    }
    state.phase = Phase::Voting;

    debug!(president = %president, chancellor = %candidate, "Chancellor nominated");
    state.announce(GameEventData::VotingStarted {
        president_id: president,
        chancellor_id: candidate,
    });

    // Everyone else may already be disconnected
    try_tally(state)
}

/// Record one ballot, tallying once the electorate is complete.
pub fn cast_vote<R: RandomSource + Clone>(
    state: &mut GameState<R>,
    actor: PlayerId,
    choice: Vote,
) -> Result<(), GameError> {
    if state.phase != Phase::Voting {
        return Err(GameError::WrongPhase);
    }
    let player = state.get_player_mut(&actor).ok_or(GameError::UnknownPlayer)?;
    if !player.alive {
        return Err(GameError::PlayerDead);
    }
    if !player.connected {
        return Err(GameError::PlayerDisconnected);
    }
    if player.has_voted() {
        return Err(GameError::AlreadyVoted);
    }
    player.vote = Some(choice);

    try_tally(state)
}

/// Tally if every alive player has voted or is disconnected.
///
/// No-op outside `Phase::Voting`.
pub(crate) fn try_tally<R: RandomSource + Clone>(state: &mut GameState<R>) -> Result<(), GameError> {
    if state.phase != Phase::Voting {
        return Ok(());
    }
    let complete = state
        .alive_players()
        .all(|p| p.has_voted() || !p.connected);
    if !complete {
        return Ok(());
    }
    tally(state)
}

fn tally<R: RandomSource + Clone>(state: &mut GameState<R>) -> Result<(), GameError> {
    let alive: Vec<PlayerId> = state.alive_players().map(|p| p.id).collect();

    let mut votes = Vec::with_capacity(alive.len());
    for id in alive {
        if let Some(player) = state.get_player_mut(&id) {
            let implicit = player.vote.is_none();
            let vote = *player.vote.get_or_insert(Vote::Nein);
            votes.push(VoteRecord { player_id: id, vote, implicit });
        }
    }

    let ja = votes.iter().filter(|v| v.vote == Vote::Ja).count();
    let nein = votes.len() - ja;
    let outcome = if ja > nein {
        ElectionOutcome::Elected
    } else {
        ElectionOutcome::Rejected
    };

    state.votes_revealed = true;
    info!(ja, nein, outcome = ?outcome, "Votes tallied");
    state.announce(GameEventData::VoteTallyRevealed { votes, outcome });

    match outcome {
        ElectionOutcome::Elected => government_elected(state),
        ElectionOutcome::Rejected => {
            state.chancellor_id = None;
            government_failed(state)
        }
    }
}

fn government_elected<R: RandomSource + Clone>(state: &mut GameState<R>) -> Result<(), GameError> {
    let president = state.president_id.ok_or(GameError::WrongPhase)?;
    let chancellor = state.chancellor_id.ok_or(GameError::WrongPhase)?;

    state.last_president_id = Some(president);
    state.last_chancellor_id = Some(chancellor);
    if state.election_tracker > 0 {
        state.election_tracker = 0;
        state.announce(GameEventData::ElectionTrackerReset);
    }

    let chancellor_is_hitler = state
        .get_player(&chancellor)
        .is_some_and(|p| p.role == Role::Hitler);
    if chancellor_is_hitler
        && state.deck.enacted_fascist() >= HITLER_ZONE_FASCIST_POLICIES
        && state.presidential_terms >= HITLER_ZONE_MIN_TERMS
    {
        state.hitler_elected_chancellor = true;
    }
    if win::check_and_finish(state) {
        return Ok(());
    }

    legislative::begin(state)
}

// =============================================================================
// FAILED GOVERNMENTS
// =============================================================================

/// Advance the tracker after a rejected or vetoed government.
///
/// On the third failure the top tile is enacted without a government.
pub(crate) fn government_failed<R: RandomSource + Clone>(
    state: &mut GameState<R>,
) -> Result<(), GameError> {
    state.election_tracker += 1;
    state.announce(GameEventData::ElectionTrackerAdvanced {
        value: state.election_tracker,
    });

    if state.election_tracker >= ELECTION_TRACKER_LIMIT {
        enact_chaos(state)?;
        if state.is_over() {
            return Ok(());
        }
    }

    start_next_round(state);
    Ok(())
}

/// Enact the top tile of the deck. Grants no power and clears term limits.
fn enact_chaos<R: RandomSource + Clone>(state: &mut GameState<R>) -> Result<(), GameError> {
    let policy = legislative::draw_tiles(state, 1)?[0];

    info!(policy = ?policy, "Election tracker full, enacting top policy");
    state.announce(GameEventData::ChaosPolicyEnacted);
    state.last_president_id = None;
    state.last_chancellor_id = None;

    legislative::enact_tile(state, policy);

    state.election_tracker = 0;
    state.announce(GameEventData::ElectionTrackerReset);
    Ok(())
}

// =============================================================================
// ROTATION
// =============================================================================

/// Pass the presidency on and open the next nomination.
pub(crate) fn start_next_round<R: RandomSource + Clone>(state: &mut GameState<R>) {
    let from = state.rotation_anchor.take().or(state.president_id);
    if let Some(next) = from.and_then(|id| state.next_alive_after(&id)) {
        install_president(state, next);
    }
}

/// Seat `president` and open nomination.
pub(crate) fn install_president<R: RandomSource + Clone>(state: &mut GameState<R>, president: PlayerId) {
    state.president_id = Some(president);
    state.chancellor_id = None;
    state.legislative = None;
    state.pending_executive_action = None;
    state.presidential_terms += 1;
    state.phase = Phase::Nomination;

    debug!(president = %president, term = state.presidential_terms, "Presidency passed");
    state.announce(GameEventData::NominationStarted { president_id: president });
}

// =============================================================================
// TESTS
// =============================================================================
