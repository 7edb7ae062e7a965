//! Protocol Messages
//!
//! JSON wire format between clients and a session. The transport that
//! carries these strings lives outside this crate.

use serde::{Serialize, Deserialize};

use crate::game::action::Action;
use crate::game::error::GameError;
use crate::game::events::GameEventData;
use crate::game::state::{PlayerId, Vote};
use crate::network::session::{EventEnvelope, RegistryError, SessionView};

// =============================================================================
// CLIENT -> SERVER MESSAGES
// =============================================================================

/// Messages sent from client to server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Take a seat in the lobby.
    Join {
        /// Display name
        username: String,
    },

    /// Ready to start.
    Ready,

    /// President proposes a chancellor.
    Nominate {
        /// Proposed chancellor
        chancellor_id: PlayerId,
    },

    /// Ballot on the proposed government.
    Vote {
        /// Ballot
        choice: Vote,
    },

    /// President discards one tile.
    Discard {
        /// Position in the hand
        index: usize,
    },

    /// Chancellor enacts one tile.
    Enact {
        /// Position in the hand
        index: usize,
    },

    /// Propose or answer a veto.
    Veto {
        /// Propose, or accept the proposal
        agree: bool,
    },

    /// Resolve the pending executive power.
    Executive {
        /// Target player; omitted for a policy peek
        #[serde(default)]
        target_id: Option<PlayerId>,
    },

    /// Request current state (for reconnection).
    SyncRequest,

    /// Player is leaving.
    Leave,
}

impl ClientMessage {
    /// Engine action for this message. `SyncRequest` is answered by the
    /// session handle directly and has none.
    pub fn into_action(self) -> Option<Action> {
        let action = match self {
            ClientMessage::Join { username } => Action::Join { username },
            ClientMessage::Ready => Action::SetReady,
            ClientMessage::Nominate { chancellor_id } => Action::Nominate { chancellor_id },
            ClientMessage::Vote { choice } => Action::CastVote { choice },
            ClientMessage::Discard { index } => Action::DiscardPolicy { index },
            ClientMessage::Enact { index } => Action::EnactPolicy { index },
            ClientMessage::Veto { agree } => Action::ResolveVeto { agree },
            ClientMessage::Executive { target_id } => Action::ResolveExecutiveAction { target_id },
            ClientMessage::Leave => Action::Leave,
            ClientMessage::SyncRequest => return None,
        };
        Some(action)
    }

    /// Serialize to JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserialize from JSON string.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}

// =============================================================================
// SERVER -> CLIENT MESSAGES
// =============================================================================

/// Stable error codes relayed to the acting client only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// Fewer than five or more than ten players
    InvalidPlayerCount,
    /// Nominee ineligible or nominator not president
    IllegalNomination,
    /// Second ballot in one election
    AlreadyVoted,
    /// Wrong holder or tile index
    IllegalDiscard,
    /// Veto not allowed now
    IllegalVeto,
    /// Wrong actor or target for a power
    IllegalExecutiveAction,
    /// Session already ended
    GameAlreadyOver,
    /// Too few tiles to draw
    DeckExhausted,
    /// Sender is not seated
    UnknownPlayer,
    /// Action not valid in this phase
    WrongPhase,
    /// Lobby is full
    SessionFull,
    /// Sender was executed
    PlayerDead,
    /// Sender must reconnect first
    PlayerDisconnected,
    /// Sender is already seated
    AlreadyJoined,
    /// No such session
    SessionNotFound,
    /// Session actor has stopped
    SessionClosed,
    /// Message could not be parsed
    InvalidMessage,
}

impl From<GameError> for ErrorCode {
    fn from(err: GameError) -> Self {
        match err {
            GameError::InvalidPlayerCount => ErrorCode::InvalidPlayerCount,
            GameError::IllegalNomination => ErrorCode::IllegalNomination,
            GameError::AlreadyVoted => ErrorCode::AlreadyVoted,
            GameError::IllegalDiscard => ErrorCode::IllegalDiscard,
            GameError::IllegalVeto => ErrorCode::IllegalVeto,
            GameError::IllegalExecutiveAction => ErrorCode::IllegalExecutiveAction,
            GameError::GameAlreadyOver => ErrorCode::GameAlreadyOver,
            GameError::DeckExhausted => ErrorCode::DeckExhausted,
            GameError::UnknownPlayer => ErrorCode::UnknownPlayer,
            GameError::WrongPhase => ErrorCode::WrongPhase,
            GameError::SessionFull => ErrorCode::SessionFull,
            GameError::PlayerDead => ErrorCode::PlayerDead,
            GameError::PlayerDisconnected => ErrorCode::PlayerDisconnected,
            GameError::AlreadyJoined => ErrorCode::AlreadyJoined,
        }
    }
}

impl From<&RegistryError> for ErrorCode {
    fn from(err: &RegistryError) -> Self {
        match err {
            RegistryError::SessionNotFound => ErrorCode::SessionNotFound,
            RegistryError::SessionClosed => ErrorCode::SessionClosed,
            RegistryError::Rejected(game) => ErrorCode::from(*game),
        }
    }
}

/// Messages sent from server to client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// One game event the recipient may see.
    Event {
        /// Per-session delivery sequence
        seq: u64,
        /// Sequence of the action that produced it
        action_seq: u64,
        /// Event payload
        event: GameEventData,
    },

    /// Full state for (re)synchronization.
    Snapshot(SessionView),

    /// The recipient's last message was refused.
    Rejected {
        /// Stable machine-readable reason
        code: ErrorCode,
        /// Human-readable reason
        message: String,
    },
}

impl ServerMessage {
    /// Wrap `envelope` for `player`, or `None` if they may not see it.
    pub fn route(envelope: &EventEnvelope, player: &PlayerId) -> Option<Self> {
        if !envelope.event.visible_to(player) {
            return None;
        }
        Some(ServerMessage::Event {
            seq: envelope.seq,
            action_seq: envelope.event.sequence,
            event: envelope.event.data.clone(),
        })
    }

    /// Rejection for a failed submit.
    pub fn rejected(err: &RegistryError) -> Self {
        ServerMessage::Rejected {
            code: ErrorCode::from(err),
            message: err.to_string(),
        }
    }

    /// Rejection for an unparseable client message.
    pub fn invalid_message(err: &serde_json::Error) -> Self {
        ServerMessage::Rejected {
            code: ErrorCode::InvalidMessage,
            message: err.to_string(),
        }
    }

    /// Serialize to JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserialize from JSON string.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::events::GameEvent;
    use crate::game::state::Policy;

    #[test]
    fn test_client_message_json() {
        let msg = ClientMessage::Vote { choice: Vote::Ja };
        let json = msg.to_json().unwrap();
        assert!(json.contains("\"type\":\"vote\""));
        assert_eq!(ClientMessage::from_json(&json).unwrap(), msg);
    }

    #[test]
    fn test_executive_target_optional() {
        let msg = ClientMessage::from_json(r#"{"type":"executive"}"#).unwrap();
        assert_eq!(msg.into_action(), Some(Action::ResolveExecutiveAction { target_id: None }));
    }

    #[test]
    fn test_into_action() {
        assert_eq!(ClientMessage::Ready.into_action(), Some(Action::SetReady));
        assert_eq!(
            ClientMessage::Enact { index: 1 }.into_action(),
            Some(Action::EnactPolicy { index: 1 })
        );
        assert_eq!(ClientMessage::SyncRequest.into_action(), None);
    }

    #[test]
    fn test_route_filters_private() {
        let alice = PlayerId::new([1; 16]);
        let bob = PlayerId::new([2; 16]);
        let envelope = EventEnvelope {
            session_id: [0; 16],
            seq: 7,
            event: GameEvent::private(
                3,
                alice,
                GameEventData::PolicyHandDealt { target_id: alice, policies: vec![Policy::Fascist] },
            ),
        };

        assert!(ServerMessage::route(&envelope, &bob).is_none());
        let Some(ServerMessage::Event { seq, action_seq, .. }) = ServerMessage::route(&envelope, &alice) else {
            panic!("expected event for alice");
        };
        assert_eq!((seq, action_seq), (7, 3));
    }

    #[test]
    fn test_rejection_code() {
        let msg = ServerMessage::rejected(&RegistryError::Rejected(GameError::AlreadyVoted));
        let json = msg.to_json().unwrap();
        assert!(json.contains("\"code\":\"already_voted\""));
        assert_eq!(ServerMessage::from_json(&json).unwrap(), msg);
    }
}
