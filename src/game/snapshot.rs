//! Snapshots
//!
//! Public and per-player projections of a session. The public projection
//! never contains roles (before game over), hands or the draw pile order.

use serde::{Serialize, Deserialize};

use crate::core::rng::RandomSource;
use crate::game::election;
use crate::game::executive::ExecutivePower;
use crate::game::legislative::LegislativeStep;
use crate::game::roles::{role_view, RoleView};
use crate::game::state::{GameState, Party, Phase, PlayerId, Policy, Role, Vote};

/// One seat as seen by everyone.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerSnapshot {
    /// Seat owner
    pub player_id: PlayerId,
    /// Display name
    pub username: String,
    /// Not yet executed
    pub alive: bool,
    /// Client currently attached
    pub connected: bool,
    /// Readied up in the lobby
    pub ready: bool,
    /// Ballot, once the tally is revealed
    pub vote: Option<Vote>,
    /// Role, once the game is over
    pub role: Option<Role>,
}

/// Everything any player may know about the session.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicSnapshot {
    /// Current phase
    pub phase: Phase,
    /// Seating order
    pub players: Vec<PlayerSnapshot>,
    /// Sitting president
    pub president_id: Option<PlayerId>,
    /// Nominee or elected chancellor
    pub chancellor_id: Option<PlayerId>,
    /// Last elected president (term limits)
    pub last_president_id: Option<PlayerId>,
    /// Last elected chancellor (term limits)
    pub last_chancellor_id: Option<PlayerId>,
    /// Valid nominees while in `Phase::Nomination`
    pub eligible_chancellors: Vec<PlayerId>,
    /// Consecutive failed governments
    pub election_tracker: u8,
    /// Liberal policies on the board
    pub enacted_liberal: u8,
    /// Fascist policies on the board
    pub enacted_fascist: u8,
    /// Veto power available
    pub veto_unlocked: bool,
    /// A veto proposal is waiting on the president
    pub veto_proposed: bool,
    /// Tiles left to draw
    pub draw_pile: u8,
    /// Tiles in the discard pile
    pub discard_pile: u8,
    /// Power the president must resolve
    pub pending_executive_action: Option<ExecutivePower>,
    /// Players already investigated
    pub investigated: Vec<PlayerId>,
    /// Winning party, once the game is over
    pub winner: Option<Party>,
    /// Accepted actions so far
    pub sequence: u64,
}

/// What one player alone may know.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrivateSnapshot {
    /// Viewer
    pub player_id: PlayerId,
    /// Own role and known teammates, once dealt
    pub role_view: Option<RoleView>,
    /// Tiles held right now, if any
    pub hand: Vec<Policy>,
}

/// Build the public projection.
pub fn public_snapshot<R: RandomSource + Clone>(state: &GameState<R>) -> PublicSnapshot {
    let over = state.is_over();

    let players = state
        .roster
        .iter()
        .filter_map(|id| state.players.get(id))
        .map(|p| PlayerSnapshot {
            player_id: p.id,
            username: p.username.clone(),
            alive: p.alive,
            connected: p.connected,
            ready: p.ready,
            vote: if state.votes_revealed || over { p.vote } else { None },
            role: if over { Some(p.role) } else { None },
        })
        .collect();

    let eligible_chancellors = if state.phase == Phase::Nomination {
        election::eligible_chancellors(state)
    } else {
        Vec::new()
    };

    PublicSnapshot {
        phase: state.phase,
        players,
        president_id: state.president_id,
        chancellor_id: state.chancellor_id,
        last_president_id: state.last_president_id,
        last_chancellor_id: state.last_chancellor_id,
        eligible_chancellors,
        election_tracker: state.election_tracker,
        enacted_liberal: state.deck.enacted_liberal(),
        enacted_fascist: state.deck.enacted_fascist(),
        veto_unlocked: state.veto_unlocked,
        veto_proposed: matches!(state.legislative, Some(LegislativeStep::VetoProposed { .. })),
        draw_pile: state.deck.draw_pile_len() as u8,
        discard_pile: state.deck.discard_pile_len() as u8,
        pending_executive_action: state.pending_executive_action,
        investigated: state.investigated.iter().copied().collect(),
        winner: state.winner,
        sequence: state.sequence,
    }
}

/// Build the private projection for `player`.
///
/// Returns `None` for players not seated in the session.
pub fn private_snapshot<R: RandomSource + Clone>(
    state: &GameState<R>,
    player: &PlayerId,
) -> Option<PrivateSnapshot> {
    let seat = state.get_player(player)?;

    let role_view = if seat.role == Role::Unassigned {
        None
    } else {
        let seats: Vec<(PlayerId, Role)> = state
            .roster
            .iter()
            .filter_map(|id| state.players.get(id))
            .map(|p| (p.id, p.role))
            .collect();
        role_view(&seats, player)
    };

    let holder = match &state.legislative {
        Some(LegislativeStep::PresidentDiscard { .. }) => state.president_id,
        Some(_) => state.chancellor_id,
        None => None,
    };
    let hand = match (&state.legislative, holder) {
        (Some(step), Some(holder)) if holder == *player => step.hand().to_vec(),
        _ => Vec::new(),
    };

    Some(PrivateSnapshot {
        player_id: *player,
        role_view,
        hand,
    })
}
