//! Whole-game scenarios driven through `GameSession::apply`.
//!
//! `IdentityRng` makes every shuffle a no-op, so the deal is predictable:
//! roster[0] is Hitler, the next seats are Fascist, the rest Liberal.

use proptest::prelude::*;

use crate::core::rng::RandomSource;
use crate::game::action::Action;
use crate::game::deck::PolicyDeck;
use crate::game::error::GameError;
use crate::game::events::{GameEvent, GameEventData};
use crate::game::executive::ExecutivePower;
use crate::game::legislative::LegislativeStep;
use crate::game::session::GameSession;
use crate::game::state::{Party, Phase, PlayerId, Policy, Role, Vote};
use crate::{DECK_SIZE, FASCIST_TILES, LIBERAL_TILES};

use Policy::{Fascist as F, Liberal as L};

#[derive(Clone, Debug, Default)]
struct IdentityRng;

impl RandomSource for IdentityRng {
    fn next_u64(&mut self) -> u64 {
        0
    }

    fn next_int(&mut self, max: u32) -> u32 {
        max.saturating_sub(1)
    }
}

fn ids(n: u8) -> Vec<PlayerId> {
    (1..=n).map(|i| PlayerId::new([i; 16])).collect()
}

/// Seat `n` players and ready them all.
fn started(n: u8) -> (GameSession<IdentityRng>, Vec<PlayerId>) {
    let mut session = GameSession::with_rng(0, IdentityRng);
    let ids = ids(n);
    for id in &ids {
        session.apply(*id, Action::Join { username: format!("p{}", id.0[0]) }).unwrap();
    }
    for id in &ids {
        session.apply(*id, Action::SetReady).unwrap();
    }
    assert_eq!(session.phase(), Phase::Nomination);
    (session, ids)
}

/// Full 17-tile deck with `top` first and the remaining tiles after it.
fn stack(session: &mut GameSession<IdentityRng>, top: &[Policy]) {
    let liberals = top.iter().filter(|p| **p == L).count();
    let fascists = top.len() - liberals;
    let mut draw = top.to_vec();
    draw.extend(std::iter::repeat(L).take(LIBERAL_TILES - liberals));
    draw.extend(std::iter::repeat(F).take(FASCIST_TILES - fascists));
    session.state_mut().deck = PolicyDeck::from_piles(draw, Vec::new());
}

/// Like `stack`, with some policies already on the board.
fn stack_enacted(session: &mut GameSession<IdentityRng>, liberal: usize, fascist: usize, top: &[Policy]) {
    let top_liberals = top.iter().filter(|p| **p == L).count();
    let mut draw = top.to_vec();
    draw.extend(std::iter::repeat(L).take(LIBERAL_TILES - liberal - top_liberals));
    draw.extend(std::iter::repeat(F).take(FASCIST_TILES - fascist - (top.len() - top_liberals)));

    let mut deck = PolicyDeck::from_piles(draw, Vec::new());
    (0..liberal).for_each(|_| deck.enact(L));
    (0..fascist).for_each(|_| deck.enact(F));
    session.state_mut().deck = deck;
}

/// Run one failed vote with the tracker already at two.
fn force_chaos(session: &mut GameSession<IdentityRng>, ids: &[PlayerId]) -> Vec<GameEvent> {
    session.state_mut().election_tracker = 2;
    session.apply(ids[0], Action::Nominate { chancellor_id: ids[1] }).unwrap();
    vote_all(session, Vote::Nein)
}

fn alive(session: &GameSession<IdentityRng>) -> Vec<PlayerId> {
    session.state().alive_players().map(|p| p.id).collect()
}

fn vote_all(session: &mut GameSession<IdentityRng>, choice: Vote) -> Vec<GameEvent> {
    let mut events = Vec::new();
    for id in alive(session) {
        events.extend(session.apply(id, Action::CastVote { choice }).unwrap());
    }
    events
}

/// Elect `chancellor` under `president`, discard index 1, enact index 0.
fn govern(
    session: &mut GameSession<IdentityRng>,
    president: PlayerId,
    chancellor: PlayerId,
) -> Vec<GameEvent> {
    assert_eq!(session.state().president_id, Some(president));
    session.apply(president, Action::Nominate { chancellor_id: chancellor }).unwrap();
    assert_eq!(session.phase(), Phase::Voting);

    vote_all(session, Vote::Ja);
    assert_eq!(session.phase(), Phase::Legislative);

    session.apply(president, Action::DiscardPolicy { index: 1 }).unwrap();
    session.apply(chancellor, Action::EnactPolicy { index: 0 }).unwrap()
}

fn has(events: &[GameEvent], pred: impl Fn(&GameEventData) -> bool) -> bool {
    events.iter().any(|e| pred(&e.data))
}

fn tiles_in_hand(session: &GameSession<IdentityRng>) -> usize {
    session.state().legislative.as_ref().map_or(0, |s| s.hand().len())
}

// =============================================================================
// SCENARIOS
// =============================================================================

#[test]
fn test_identity_deal() {
    let (session, ids) = started(7);
    let roles: Vec<Role> = ids
        .iter()
        .map(|id| session.state().get_player(id).unwrap().role)
        .collect();
    assert_eq!(roles[0], Role::Hitler);
    assert_eq!(&roles[1..3], &[Role::Fascist, Role::Fascist]);
    assert!(roles[3..].iter().all(|r| *r == Role::Liberal));
}

#[test]
fn test_three_liberal_policies_no_winner() {
    let (mut session, ids) = started(5);
    stack(&mut session, &[L, F, L, L, F, L, L, F, L]);

    let governments = [(ids[0], ids[1]), (ids[1], ids[2]), (ids[2], ids[3])];
    for (president, chancellor) in governments {
        let events = govern(&mut session, president, chancellor);
        assert!(has(&events, |d| matches!(d, GameEventData::PolicyEnacted { policy: L, .. })));
        assert!(has(&events, |d| matches!(d, GameEventData::NominationStarted { .. })));
        assert_eq!(session.phase(), Phase::Nomination);
        assert_eq!(session.winner(), None);
    }

    assert_eq!(session.state().deck.enacted_liberal(), 3);
    assert_eq!(session.state().deck.accounted(), DECK_SIZE);
}

#[test]
fn test_six_fascist_policies_with_seven_players() {
    let (mut session, ids) = started(7);
    stack(&mut session, &[F, L, L, F, L, L, F, L, L, F, F, F, F, F, F, F, F]);

    // F1: no power
    govern(&mut session, ids[0], ids[1]);
    assert_eq!(session.phase(), Phase::Nomination);

    // F2: investigate
    let events = govern(&mut session, ids[1], ids[2]);
    assert!(has(&events, |d| matches!(
        d,
        GameEventData::ExecutiveActionPending { kind: ExecutivePower::InvestigateLoyalty, .. }
    )));
    let events = session
        .apply(ids[1], Action::ResolveExecutiveAction { target_id: Some(ids[3]) })
        .unwrap();
    let result = events
        .iter()
        .find(|e| matches!(e.data, GameEventData::InvestigationResult { .. }))
        .unwrap();
    assert!(result.visible_to(&ids[1]) && !result.visible_to(&ids[3]));

    // F3: special election
    govern(&mut session, ids[2], ids[3]);
    assert_eq!(session.state().pending_executive_action, Some(ExecutivePower::SpecialElection));
    session
        .apply(ids[2], Action::ResolveExecutiveAction { target_id: Some(ids[5]) })
        .unwrap();

    // F4: execution by the specially elected president
    govern(&mut session, ids[5], ids[4]);
    assert_eq!(session.state().pending_executive_action, Some(ExecutivePower::Execution));
    session
        .apply(ids[5], Action::ResolveExecutiveAction { target_id: Some(ids[6]) })
        .unwrap();

    // Rotation resumes after the caller of the special election
    assert_eq!(session.state().president_id, Some(ids[3]));

    // F5: veto unlocks, second execution
    let events = govern(&mut session, ids[3], ids[1]);
    assert!(has(&events, |d| matches!(d, GameEventData::VetoUnlocked)));
    session
        .apply(ids[3], Action::ResolveExecutiveAction { target_id: Some(ids[5]) })
        .unwrap();
    assert_eq!(session.state().alive_count(), 5);

    // F6 comes partly from a reshuffled discard pile
    session.apply(ids[4], Action::Nominate { chancellor_id: ids[2] }).unwrap();
    let events = vote_all(&mut session, Vote::Ja);
    assert!(has(&events, |d| matches!(d, GameEventData::DeckReshuffled { .. })));
    session.apply(ids[4], Action::DiscardPolicy { index: 1 }).unwrap();
    let events = session.apply(ids[2], Action::EnactPolicy { index: 0 }).unwrap();

    assert!(has(&events, |d| matches!(d, GameEventData::GameEnded { winner: Party::Fascist, .. })));
    assert_eq!(session.phase(), Phase::GameOver);
    assert_eq!(session.state().deck.enacted_fascist(), 6);
    assert_eq!(session.state().deck.accounted(), DECK_SIZE);

    for action in [
        Action::Nominate { chancellor_id: ids[1] },
        Action::SetReady,
        Action::Disconnect,
        Action::CastVote { choice: Vote::Ja },
    ] {
        assert_eq!(session.apply(ids[4], action), Err(GameError::GameAlreadyOver));
    }
}

#[test]
fn test_outgoing_chancellor_term_limited_at_seven() {
    let (mut session, ids) = started(7);
    stack(&mut session, &[L, F, L]);

    govern(&mut session, ids[0], ids[2]);
    assert_eq!(session.state().president_id, Some(ids[1]));

    assert_eq!(
        session.apply(ids[1], Action::Nominate { chancellor_id: ids[2] }),
        Err(GameError::IllegalNomination)
    );
    assert_eq!(
        session.apply(ids[1], Action::Nominate { chancellor_id: ids[0] }),
        Err(GameError::IllegalNomination)
    );
    assert_eq!(session.phase(), Phase::Nomination);

    session.apply(ids[1], Action::Nominate { chancellor_id: ids[3] }).unwrap();
}

#[test]
fn test_liberal_win_on_crossing_action() {
    let (mut session, ids) = started(5);
    stack(&mut session, &[L, L, L, L, F, L, L, F, L, L, F, L]);

    govern(&mut session, ids[0], ids[1]);
    govern(&mut session, ids[1], ids[2]);
    govern(&mut session, ids[2], ids[3]);
    govern(&mut session, ids[3], ids[4]);
    assert_eq!(session.winner(), None);

    let events = govern(&mut session, ids[4], ids[2]);
    assert!(has(&events, |d| matches!(d, GameEventData::GameEnded { winner: Party::Liberal, .. })));
    assert_eq!(session.winner(), Some(Party::Liberal));

    // Roles revealed to everyone at game over
    let snapshot = session.public_snapshot();
    assert_eq!(snapshot.players[0].role, Some(Role::Hitler));
}

#[test]
fn test_chaos_after_three_failures() {
    let (mut session, ids) = started(5);
    stack(&mut session, &[F]);

    for president in &ids[..3] {
        let chancellor = session.public_snapshot().eligible_chancellors[0];
        session.apply(*president, Action::Nominate { chancellor_id: chancellor }).unwrap();
        let events = vote_all(&mut session, Vote::Nein);
        assert!(has(&events, |d| matches!(d, GameEventData::ElectionTrackerAdvanced { .. })));
    }

    let state = session.state();
    assert_eq!(state.deck.enacted_fascist(), 1);
    assert_eq!(state.election_tracker, 0);
    assert_eq!(state.last_president_id, None);
    assert_eq!(state.pending_executive_action, None);
    assert_eq!(state.president_id, Some(ids[3]));
    assert_eq!(session.phase(), Phase::Nomination);
    assert_eq!(state.deck.accounted(), DECK_SIZE);
}

#[test]
fn test_chaos_event_order() {
    let (mut session, ids) = started(5);
    stack(&mut session, &[L]);
    session.state_mut().election_tracker = 2;

    session.apply(ids[0], Action::Nominate { chancellor_id: ids[1] }).unwrap();
    let events = vote_all(&mut session, Vote::Nein);

    let kinds: Vec<&GameEventData> = events
        .iter()
        .map(|e| &e.data)
        .skip_while(|d| !matches!(d, GameEventData::ElectionTrackerAdvanced { .. }))
        .take(4)
        .collect();
    assert!(matches!(kinds[0], GameEventData::ElectionTrackerAdvanced { value: 3 }));
    assert!(matches!(kinds[1], GameEventData::ChaosPolicyEnacted));
    assert!(matches!(kinds[2], GameEventData::PolicyEnacted { policy: L, .. }));
    assert!(matches!(kinds[3], GameEventData::ElectionTrackerReset));
}

#[test]
fn test_hitler_elected_in_zone() {
    let (mut session, ids) = started(5);
    stack_enacted(&mut session, 0, 3, &[]);
    session.state_mut().president_id = Some(ids[2]);
    session.state_mut().presidential_terms = 3;

    session.apply(ids[2], Action::Nominate { chancellor_id: ids[0] }).unwrap();
    let events = vote_all(&mut session, Vote::Ja);

    assert!(has(&events, |d| matches!(d, GameEventData::GameEnded { winner: Party::Fascist, .. })));
    assert!(!has(&events, |d| matches!(d, GameEventData::LegislativeStarted { .. })));
}

#[test]
fn test_hitler_elected_outside_zone_plays_on() {
    let (mut session, ids) = started(5);
    stack(&mut session, &[L, L, L]);
    session.state_mut().president_id = Some(ids[2]);

    session.apply(ids[2], Action::Nominate { chancellor_id: ids[0] }).unwrap();
    vote_all(&mut session, Vote::Ja);
    assert_eq!(session.phase(), Phase::Legislative);
}

#[test]
fn test_hitler_elected_before_third_term_plays_on() {
    let (mut session, ids) = started(5);
    stack_enacted(&mut session, 0, 3, &[]);
    session.state_mut().president_id = Some(ids[2]);
    session.state_mut().presidential_terms = 2;

    session.apply(ids[2], Action::Nominate { chancellor_id: ids[0] }).unwrap();
    let events = vote_all(&mut session, Vote::Ja);

    assert!(has(&events, |d| matches!(d, GameEventData::LegislativeStarted { .. })));
    assert_eq!(session.phase(), Phase::Legislative);
    assert_eq!(session.winner(), None);
}

#[test]
fn test_chaos_grants_no_power_on_threshold() {
    // Third fascist policy would normally grant a peek at five players
    let (mut session, ids) = started(5);
    stack_enacted(&mut session, 0, 2, &[F]);

    let events = force_chaos(&mut session, &ids);

    assert!(has(&events, |d| matches!(d, GameEventData::ChaosPolicyEnacted)));
    assert!(!has(&events, |d| matches!(d, GameEventData::ExecutiveActionPending { .. })));
    assert_eq!(session.state().deck.enacted_fascist(), 3);
    assert_eq!(session.state().pending_executive_action, None);
    assert_eq!(session.phase(), Phase::Nomination);
    assert_eq!(session.state().deck.accounted(), DECK_SIZE);
}

#[test]
fn test_chaos_can_end_the_game() {
    let (mut session, ids) = started(5);
    stack_enacted(&mut session, 0, 5, &[F]);
    let events = force_chaos(&mut session, &ids);
    assert!(has(&events, |d| matches!(d, GameEventData::GameEnded { winner: Party::Fascist, .. })));
    assert_eq!(session.phase(), Phase::GameOver);

    let (mut session, ids) = started(5);
    stack_enacted(&mut session, 4, 0, &[L]);
    let events = force_chaos(&mut session, &ids);
    assert!(has(&events, |d| matches!(d, GameEventData::GameEnded { winner: Party::Liberal, .. })));
    assert_eq!(session.winner(), Some(Party::Liberal));
}

#[test]
fn test_disconnect_completes_vote() {
    let (mut session, ids) = started(5);
    stack(&mut session, &[L, L, F]);

    session.apply(ids[0], Action::Nominate { chancellor_id: ids[1] }).unwrap();
    for id in &ids[..4] {
        session.apply(*id, Action::CastVote { choice: Vote::Ja }).unwrap();
    }
    assert_eq!(session.phase(), Phase::Voting);

    let events = session.apply(ids[4], Action::Disconnect).unwrap();
    assert!(has(&events, |d| matches!(d, GameEventData::PlayerDisconnected { .. })));
    assert!(has(&events, |d| matches!(d, GameEventData::VoteTallyRevealed { .. })));
    assert_eq!(session.phase(), Phase::Legislative);

    // Disconnected players keep their seat
    assert_eq!(session.state().roster.len(), 5);
    session.apply(ids[4], Action::Reconnect).unwrap();
    assert!(session.state().get_player(&ids[4]).unwrap().connected);
}

#[test]
fn test_veto_through_session() {
    let (mut session, ids) = started(5);
    stack(&mut session, &[F, F, L]);
    session.state_mut().veto_unlocked = true;

    session.apply(ids[0], Action::Nominate { chancellor_id: ids[1] }).unwrap();
    vote_all(&mut session, Vote::Ja);
    assert_eq!(
        session.apply(ids[0], Action::ResolveVeto { agree: true }),
        Err(GameError::IllegalVeto)
    );
    session.apply(ids[0], Action::DiscardPolicy { index: 2 }).unwrap();

    session.apply(ids[1], Action::ResolveVeto { agree: true }).unwrap();
    assert!(session.public_snapshot().veto_proposed);
    assert_eq!(tiles_in_hand(&session), 2);

    let events = session.apply(ids[0], Action::ResolveVeto { agree: true }).unwrap();
    assert!(has(&events, |d| matches!(d, GameEventData::VetoResolved { agreed: true })));
    assert!(has(&events, |d| matches!(d, GameEventData::ElectionTrackerAdvanced { value: 1 })));
    assert_eq!(session.phase(), Phase::Nomination);
    assert_eq!(session.state().deck.enacted_fascist(), 0);
    assert_eq!(session.state().deck.accounted(), DECK_SIZE);
}

#[test]
fn test_private_events_stay_private() {
    let (mut session, ids) = started(5);
    stack(&mut session, &[L, F, L]);

    session.apply(ids[0], Action::Nominate { chancellor_id: ids[1] }).unwrap();
    let events = vote_all(&mut session, Vote::Ja);
    for event in events.iter().filter(|e| e.is_private()) {
        assert!(event.visible_to(&ids[0]));
        assert!(!event.visible_to(&ids[2]));
    }

    let view = session.private_snapshot(&ids[0]).unwrap();
    assert_eq!(view.hand, vec![L, F, L]);
    assert!(session.private_snapshot(&ids[1]).unwrap().hand.is_empty());
    assert_eq!(view.role_view.unwrap().role, Role::Hitler);
}

// =============================================================================
// RANDOM PLAYTHROUGHS
// =============================================================================

/// Choose a legal action for whoever must act next.
fn bot_move(session: &GameSession, choice: u8) -> (PlayerId, Action) {
    let state = session.state();
    let president = state.president_id.unwrap_or_default();
    let chancellor = state.chancellor_id.unwrap_or_default();

    match state.phase {
        Phase::Nomination => {
            let options = session.public_snapshot().eligible_chancellors;
            let pick = options[choice as usize % options.len()];
            (president, Action::Nominate { chancellor_id: pick })
        }
        Phase::Voting => {
            let voter = state
                .alive_players()
                .find(|p| !p.has_voted())
                .map(|p| p.id)
                .unwrap_or_default();
            let vote = if choice % 3 == 0 { Vote::Nein } else { Vote::Ja };
            (voter, Action::CastVote { choice: vote })
        }
        Phase::Legislative => match &state.legislative {
            Some(LegislativeStep::PresidentDiscard { .. }) => {
                (president, Action::DiscardPolicy { index: choice as usize % 3 })
            }
            Some(LegislativeStep::ChancellorEnact { veto_rejected, .. }) => {
                if state.veto_unlocked && !veto_rejected && choice % 4 == 0 {
                    (chancellor, Action::ResolveVeto { agree: true })
                } else {
                    (chancellor, Action::EnactPolicy { index: choice as usize % 2 })
                }
            }
            Some(LegislativeStep::VetoProposed { .. }) => {
                (president, Action::ResolveVeto { agree: choice % 2 == 0 })
            }
            None => unreachable!("legislative phase without a step"),
        },
        Phase::ExecutiveAction => {
            let target = match state.pending_executive_action {
                Some(ExecutivePower::PolicyPeek) => None,
                _ => state
                    .alive_players()
                    .map(|p| p.id)
                    .filter(|id| *id != president && !state.investigated.contains(id))
                    .nth(choice as usize % 2),
            };
            (president, Action::ResolveExecutiveAction { target_id: target })
        }
        Phase::Lobby | Phase::GameOver => unreachable!("no move outside the game"),
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_random_games_hold_invariants(
        seed in any::<u64>(),
        players in 5u8..=10,
        choices in prop::collection::vec(any::<u8>(), 64),
    ) {
        let mut session = GameSession::new(seed);
        for id in ids(players) {
            session.apply(id, Action::Join { username: "p".into() }).unwrap();
            session.apply(id, Action::SetReady).unwrap();
        }

        let hitlers = session
            .state()
            .players
            .values()
            .filter(|p| p.role == Role::Hitler)
            .count();
        prop_assert_eq!(hitlers, 1);

        let mut step = 0usize;
        while !session.state().is_over() {
            prop_assert!(step < 3000, "game did not finish");
            let choice = choices[step % choices.len()].wrapping_add((step / choices.len()) as u8);
            let (actor, action) = bot_move(&session, choice);
            let result = session.apply(actor, action.clone());
            prop_assert!(result.is_ok(), "{:?} by {} rejected: {:?}", action, actor, result);

            let state = session.state();
            let held = state.legislative.as_ref().map_or(0, |s| s.hand().len());
            prop_assert_eq!(state.deck.accounted() + held, DECK_SIZE);
            prop_assert!(state.election_tracker < 3);
            if state.deck.enacted_fascist() >= 5 {
                prop_assert!(state.veto_unlocked);
            }
            step += 1;
        }

        let winner = session.winner();
        prop_assert!(winner.is_some());
        prop_assert_eq!(
            session.apply(PlayerId::new([1; 16]), Action::Reconnect),
            Err(GameError::GameAlreadyOver)
        );
        prop_assert_eq!(session.winner(), winner);
    }
}
