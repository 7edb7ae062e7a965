//! Game Events
//!
//! Outbound events produced by the engine, in generation order. Each event
//! names its audience; the broadcaster must never deliver a private event
//! to anyone but its target.

use serde::{Serialize, Deserialize};

use crate::game::executive::ExecutivePower;
use crate::game::roles::RoleView;
use crate::game::state::{Party, PlayerId, Policy, Role, Vote};

/// Who may see an event.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "player_id", rename_all = "snake_case")]
pub enum Audience {
    /// Every player in the session
    Everyone,
    /// Only this player
    Player(PlayerId),
}

impl Audience {
    /// Whether `player` may receive an event with this audience.
    pub fn includes(&self, player: &PlayerId) -> bool {
        match self {
            Audience::Everyone => true,
            Audience::Player(target) => target == player,
        }
    }
}

/// Public per-player fields announced at game start.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicPlayer {
    /// Seat owner
    pub player_id: PlayerId,
    /// Display name
    pub username: String,
    /// Not yet executed
    pub alive: bool,
    /// Client currently attached
    pub connected: bool,
}

/// One revealed ballot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteRecord {
    /// Voter
    pub player_id: PlayerId,
    /// Ballot as counted
    pub vote: Vote,
    /// Counted as Nein because the player was disconnected
    pub implicit: bool,
}

/// Result of an election.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElectionOutcome {
    /// Strict Ja majority
    Elected,
    /// Tie or Nein majority
    Rejected,
}

/// Public outcome of a resolved executive power.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum ExecutiveResult {
    /// Target's party was shown to the president
    Investigated {
        /// Investigated player
        target_id: PlayerId,
    },
    /// Target will be the next president
    SpecialElection {
        /// President for the special term
        target_id: PlayerId,
    },
    /// President saw the top tiles
    PolicyPeek {
        /// Number of tiles shown
        tiles_seen: u8,
    },
    /// Target was executed
    Executed {
        /// Executed player
        target_id: PlayerId,
    },
}

/// Game event data.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum GameEventData {
    /// Player took a lobby seat
    PlayerJoined {
        /// Player concerned
        player_id: PlayerId,
        /// Display name
        username: String,
    },

    /// Player left the lobby
    PlayerLeft {
        /// Player concerned
        player_id: PlayerId,
    },

    /// Player is ready to start
    PlayerReady {
        /// Player concerned
        player_id: PlayerId,
    },

    /// Player's client dropped; the seat is kept
    PlayerDisconnected {
        /// Player concerned
        player_id: PlayerId,
    },

    /// Player's client is back
    PlayerReconnected {
        /// Player concerned
        player_id: PlayerId,
    },

    /// Game started with this seating order
    GameStarted {
        /// Seats in roster order
        roster: Vec<PublicPlayer>,
    },

    /// Private: the target's role knowledge
    RoleAssigned {
        /// Recipient
        target_id: PlayerId,
        /// Own role and known allies
        view: RoleView,
    },

    /// A president is seated and must nominate
    NominationStarted {
        /// Sitting president
        president_id: PlayerId,
    },

    /// Government proposed, ballots open
    VotingStarted {
        /// Sitting president
        president_id: PlayerId,
        /// Chancellor (nominee or elected)
        chancellor_id: PlayerId,
    },

    /// Every ballot, once the electorate is complete
    VoteTallyRevealed {
        /// Ballots in roster order
        votes: Vec<VoteRecord>,
        /// Whether the government was elected
        outcome: ElectionOutcome,
    },

    /// Elected government begins legislating
    LegislativeStarted {
        /// Sitting president
        president_id: PlayerId,
        /// Chancellor (nominee or elected)
        chancellor_id: PlayerId,
    },

    /// Private: tiles now held by the target
    PolicyHandDealt {
        /// Recipient
        target_id: PlayerId,
        /// Tiles in draw order
        policies: Vec<Policy>,
    },

    /// President passed two tiles on; the discarded tile stays secret
    PresidentDiscarded,

    /// Chancellor asked to discard both tiles
    VetoProposed {
        /// Chancellor (nominee or elected)
        chancellor_id: PlayerId,
    },

    /// President answered the veto request
    VetoResolved {
        /// President agreed to discard both tiles
        agreed: bool,
    },

    /// Discard pile shuffled back under the draw pile
    DeckReshuffled {
        /// Draw pile size after the reshuffle
        draw_pile: u8,
    },

    /// Three failed governments: the top tile is enacted next
    ChaosPolicyEnacted,

    /// A policy reached the board
    PolicyEnacted {
        /// Enacted policy
        policy: Policy,
        /// Liberal policies on the board
        enacted_liberal: u8,
        /// Fascist policies on the board
        enacted_fascist: u8,
    },

    /// Veto power is available from now on
    VetoUnlocked,

    /// Another government failed
    ElectionTrackerAdvanced {
        /// Tracker value after the failure
        value: u8,
    },

    /// Tracker back to zero
    ElectionTrackerReset,

    /// President must resolve a power before play continues
    ExecutiveActionPending {
        /// Power being used
        kind: ExecutivePower,
        /// Sitting president
        president_id: PlayerId,
    },

    /// A power was used
    ExecutiveActionResolved {
        /// Power being used
        kind: ExecutivePower,
        /// Public outcome
        result: ExecutiveResult,
    },

    /// Private: loyalty of the investigated player
    InvestigationResult {
        /// Investigated player
        target_id: PlayerId,
        /// Party membership (Hitler reports Fascist)
        party: Party,
    },

    /// Private: top tiles of the draw pile
    PolicyPeekResult {
        /// Tiles in draw order
        policies: Vec<Policy>,
    },

    /// Game over; all roles are revealed
    GameEnded {
        /// Winning party
        winner: Party,
        /// Every role in roster order
        roles: Vec<(PlayerId, Role)>,
    },
}

/// An event with its audience and the action sequence that produced it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameEvent {
    /// Sequence number of the action that produced this event
    pub sequence: u64,

    /// Recipients
    pub audience: Audience,

    /// Event data
    pub data: GameEventData,
}

impl GameEvent {
    /// Create an event visible to everyone.
    pub fn public(sequence: u64, data: GameEventData) -> Self {
        Self {
            sequence,
            audience: Audience::Everyone,
            data,
        }
    }

    /// Create an event visible only to `player`.
    pub fn private(sequence: u64, player: PlayerId, data: GameEventData) -> Self {
        Self {
            sequence,
            audience: Audience::Player(player),
            data,
        }
    }

    /// Whether this event is restricted to one player.
    pub fn is_private(&self) -> bool {
        matches!(self.audience, Audience::Player(_))
    }

    /// Whether `player` may see this event.
    pub fn visible_to(&self, player: &PlayerId) -> bool {
        self.audience.includes(player)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_audience_filtering() {
        let alice = PlayerId::new([1; 16]);
        let bob = PlayerId::new([2; 16]);

        let public = GameEvent::public(1, GameEventData::PresidentDiscarded);
        let private = GameEvent::private(
            1,
            alice,
            GameEventData::PolicyHandDealt { target_id: alice, policies: vec![Policy::Liberal] },
        );

        assert!(public.visible_to(&alice) && public.visible_to(&bob));
        assert!(private.visible_to(&alice));
        assert!(!private.visible_to(&bob));
        assert!(private.is_private());
    }

    #[test]
    fn test_event_json_shape() {
        let event = GameEventData::ElectionTrackerAdvanced { value: 2 };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"event\":\"election_tracker_advanced\""));
        assert!(json.contains("\"value\":2"));
    }
}
