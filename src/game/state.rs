//! Game State Definitions
//!
//! All state types for a session. Uses BTreeMap for deterministic
//! iteration order; the roster `Vec` carries seating order.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use serde::{Serialize, Deserialize};

use crate::core::hash::{StateHash, compute_state_hash};
use crate::core::rng::{DeterministicRng, RandomSource};
use crate::game::deck::PolicyDeck;
use crate::game::events::{GameEvent, GameEventData};
use crate::game::executive::ExecutivePower;
use crate::game::legislative::LegislativeStep;

// =============================================================================
// PLAYER ID
// =============================================================================

/// Unique player identifier (UUID as bytes).
///
/// Implements Ord for deterministic BTreeMap ordering.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[derive(Default)]
pub struct PlayerId(pub [u8; 16]);

impl PlayerId {
    /// Create from raw bytes.
    pub const fn new(bytes: [u8; 16]) -> Self {
        Self(bytes)
    }

    /// Create a fresh random id.
    pub fn random() -> Self {
        Self(*uuid::Uuid::new_v4().as_bytes())
    }

    /// Get raw bytes.
    pub fn as_bytes(&self) -> &[u8; 16] {
        &self.0
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(&self.0[..4]))
    }
}

// =============================================================================
// ROLES, PARTIES, POLICIES, VOTES
// =============================================================================

/// Team membership. Also used as the winner of a finished game.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Party {
    /// Liberal team
    Liberal,
    /// Fascist team, Hitler included
    Fascist,
}

/// Secret role of a player.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(u8)]
#[derive(Default)]
pub enum Role {
    /// Before the game starts.
    #[default]
    Unassigned = 0,
    /// Liberal party member
    Liberal = 1,
    /// Fascist who knows Hitler
    Fascist = 2,
    /// Fascist leader
    Hitler = 3,
}

impl Role {
    /// Party membership as revealed by a loyalty investigation.
    ///
    /// Hitler belongs to the fascist party.
    pub fn party(self) -> Option<Party> {
        match self {
            Role::Unassigned => None,
            Role::Liberal => Some(Party::Liberal),
            Role::Fascist | Role::Hitler => Some(Party::Fascist),
        }
    }

    /// Fascist or Hitler.
    #[inline]
    pub fn is_fascist_team(self) -> bool {
        matches!(self, Role::Fascist | Role::Hitler)
    }
}

/// A policy tile.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Policy {
    /// Liberal tile
    Liberal = 0,
    /// Fascist tile
    Fascist = 1,
}

/// A ballot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Vote {
    /// Yes
    Ja,
    /// No
    Nein,
}

// =============================================================================
// PHASE
// =============================================================================

/// Current phase of the session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[derive(Default)]
pub enum Phase {
    /// Waiting for players to join and ready up
    #[default]
    Lobby,
    /// President chooses a chancellor candidate
    Nomination,
    /// Everyone votes on the proposed government
    Voting,
    /// President and chancellor pass policy tiles
    Legislative,
    /// President resolves an unlocked power
    ExecutiveAction,
    /// Terminal
    GameOver,
}

// =============================================================================
// PLAYER STATE
// =============================================================================

/// State of a single player in the session.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerState {
    /// Unique player ID
    pub id: PlayerId,

    /// Display name chosen at join
    pub username: String,

    /// Secret role
    pub role: Role,

    /// Executed players are dead
    pub alive: bool,

    /// Transport connection status
    pub connected: bool,

    /// Lobby ready flag
    pub ready: bool,

    /// Ballot cast in the current election, if any
    pub vote: Option<Vote>,
}

impl PlayerState {
    /// Create a new player as they join the lobby.
    pub fn new(id: PlayerId, username: impl Into<String>) -> Self {
        Self {
            id,
            username: username.into(),
            role: Role::Unassigned,
            alive: true,
            connected: true,
            ready: false,
            vote: None,
        }
    }

    /// Whether a ballot has been cast this election.
    #[inline]
    pub fn has_voted(&self) -> bool {
        self.vote.is_some()
    }
}

// =============================================================================
// GAME STATE
// =============================================================================

/// Complete state of one session.
///
/// Mutated only by [`crate::game::session::GameSession`].
#[derive(Clone, Debug)]
pub struct GameState<R = DeterministicRng> {
    /// Current phase
    pub phase: Phase,

    /// Seating order (join order, fixed once the game starts)
    pub roster: Vec<PlayerId>,

    /// All players (BTreeMap for deterministic iteration)
    pub players: BTreeMap<PlayerId, PlayerState>,

    /// Sitting president (or presidential candidate)
    pub president_id: Option<PlayerId>,

    /// Chancellor candidate / sitting chancellor
    pub chancellor_id: Option<PlayerId>,

    /// Term-limit memory: last elected president
    pub last_president_id: Option<PlayerId>,

    /// Term-limit memory: last elected chancellor
    pub last_chancellor_id: Option<PlayerId>,

    /// Consecutive failed governments (0..=3)
    pub election_tracker: u8,

    /// Draw/discard piles and enacted counters
    pub deck: PolicyDeck,

    /// Veto power, permanent once five fascist policies are enacted
    pub veto_unlocked: bool,

    /// Legislative sub-step while `phase == Legislative`
    pub legislative: Option<LegislativeStep>,

    /// Power awaiting resolution while `phase == ExecutiveAction`
    pub pending_executive_action: Option<ExecutivePower>,

    /// Set exactly once when the game ends
    pub winner: Option<Party>,

    /// Presidents installed so far (rotation count)
    pub presidential_terms: u32,

    /// President who called a special election; rotation resumes after them
    pub rotation_anchor: Option<PlayerId>,

    /// Players already investigated
    pub investigated: BTreeSet<PlayerId>,

    /// Votes stay public from a tally until the next nomination
    pub votes_revealed: bool,

    /// Hitler was elected chancellor in the hitler zone
    pub hitler_elected_chancellor: bool,

    /// Accepted actions so far
    pub sequence: u64,

    /// RNG seed (for verification)
    pub rng_seed: u64,

    /// Session RNG
    pub rng: R,

    /// Events generated by the action being applied
    pub pending_events: Vec<GameEvent>,
}

impl GameState<DeterministicRng> {
    /// Create an empty lobby seeded with the deterministic RNG.
    pub fn new(rng_seed: u64) -> Self {
        Self::with_rng(rng_seed, DeterministicRng::new(rng_seed))
    }
}

impl<R: RandomSource + Clone> GameState<R> {
    /// Create an empty lobby with an injected RNG.
    pub fn with_rng(rng_seed: u64, rng: R) -> Self {
        Self {
            phase: Phase::Lobby,
            roster: Vec::new(),
            players: BTreeMap::new(),
            president_id: None,
            chancellor_id: None,
            last_president_id: None,
            last_chancellor_id: None,
            election_tracker: 0,
            deck: PolicyDeck::empty(),
            veto_unlocked: false,
            legislative: None,
            pending_executive_action: None,
            winner: None,
            presidential_terms: 0,
            rotation_anchor: None,
            investigated: BTreeSet::new(),
            votes_revealed: false,
            hitler_elected_chancellor: false,
            sequence: 0,
            rng_seed,
            rng,
            pending_events: Vec::new(),
        }
    }

    /// Get a player by ID.
    pub fn get_player(&self, id: &PlayerId) -> Option<&PlayerState> {
        self.players.get(id)
    }

    /// Get a player mutably by ID.
    pub fn get_player_mut(&mut self, id: &PlayerId) -> Option<&mut PlayerState> {
        self.players.get_mut(id)
    }

    /// Whether the player exists and is alive.
    pub fn is_alive(&self, id: &PlayerId) -> bool {
        self.players.get(id).is_some_and(|p| p.alive)
    }

    /// Alive players in roster order.
    pub fn alive_players(&self) -> impl Iterator<Item = &PlayerState> + '_ {
        self.roster
            .iter()
            .filter_map(|id| self.players.get(id))
            .filter(|p| p.alive)
    }

    /// Get count of alive players.
    pub fn alive_count(&self) -> usize {
        self.alive_players().count()
    }

    /// Number of seated players.
    pub fn player_count(&self) -> usize {
        self.roster.len()
    }

    /// The player holding the Hitler role, once assigned.
    pub fn hitler_id(&self) -> Option<PlayerId> {
        self.players
            .values()
            .find(|p| p.role == Role::Hitler)
            .map(|p| p.id)
    }

    /// Next alive player after `from` in seating order, wrapping around.
    pub fn next_alive_after(&self, from: &PlayerId) -> Option<PlayerId> {
        let len = self.roster.len();
        let start = self.roster.iter().position(|id| id == from)?;
        (1..=len)
            .map(|offset| self.roster[(start + offset) % len])
            .find(|id| self.is_alive(id))
    }

    /// Whether the game has ended.
    pub fn is_over(&self) -> bool {
        matches!(self.phase, Phase::GameOver)
    }

    /// Take pending events (consumes them).
    pub fn take_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.pending_events)
    }

    /// Push an event visible to everyone.
    pub fn announce(&mut self, data: GameEventData) {
        self.pending_events.push(GameEvent::public(self.sequence, data));
    }

    /// Push an event visible only to `player`.
    pub fn tell(&mut self, player: PlayerId, data: GameEventData) {
        self.pending_events.push(GameEvent::private(self.sequence, player, data));
    }

    /// Compute hash of current state for verification.
    pub fn compute_hash(&self) -> StateHash {
        compute_state_hash(self.sequence, self.rng_seed, |hasher| {
            hasher.update_u8(self.phase as u8);

            // Roster order, then per-player fields
            hasher.update_u32(self.roster.len() as u32);
            for id in &self.roster {
                hasher.update_uuid(id.as_bytes());
                if let Some(p) = self.players.get(id) {
                    hasher.update_str(&p.username);
                    hasher.update_u8(p.role as u8);
                    hasher.update_bool(p.alive);
                    hasher.update_bool(p.connected);
                    hasher.update_bool(p.ready);
                    hasher.update_u8(match p.vote {
                        None => 0,
                        Some(Vote::Ja) => 1,
                        Some(Vote::Nein) => 2,
                    });
                }
            }

            hasher.update_opt_uuid(self.president_id.as_ref().map(|id| id.as_bytes()));
            hasher.update_opt_uuid(self.chancellor_id.as_ref().map(|id| id.as_bytes()));
            hasher.update_opt_uuid(self.last_president_id.as_ref().map(|id| id.as_bytes()));
            hasher.update_opt_uuid(self.last_chancellor_id.as_ref().map(|id| id.as_bytes()));
            hasher.update_u8(self.election_tracker);

            self.deck.hash_into(hasher);
            hasher.update_bool(self.veto_unlocked);

            match &self.legislative {
                None => hasher.update_u8(0),
                Some(step) => step.hash_into(hasher),
            }
            hasher.update_u8(self.pending_executive_action.map_or(0, |p| p as u8 + 1));
            hasher.update_u8(match self.winner {
                None => 0,
                Some(Party::Liberal) => 1,
                Some(Party::Fascist) => 2,
            });

            hasher.update_u32(self.presidential_terms);
            hasher.update_opt_uuid(self.rotation_anchor.as_ref().map(|id| id.as_bytes()));
            for id in &self.investigated {
                hasher.update_uuid(id.as_bytes());
            }
            hasher.update_bool(self.votes_revealed);
            hasher.update_bool(self.hitler_elected_chancellor);
        })
    }
}

// =============================================================================
// TESTS
// =============================================================================
