//! Inbound Actions
//!
//! One variant per thing a player (or the transport, on their behalf) can
//! ask the engine to do. The acting player travels alongside the action.

use serde::{Serialize, Deserialize};

use crate::game::state::{PlayerId, Vote};

/// A player action with its typed payload.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Action {
    /// Take a seat in the lobby.
    Join {
        /// Display name
        username: String,
    },

    /// Leave the lobby, or drop out of a running game.
    Leave,

    /// Mark ready; the game starts once everyone is.
    SetReady,

    /// President proposes a chancellor.
    Nominate {
        /// Proposed chancellor
        chancellor_id: PlayerId,
    },

    /// Ballot on the proposed government.
    CastVote {
        /// Ballot
        choice: Vote,
    },

    /// President discards one of three tiles.
    DiscardPolicy {
        /// Position in the hand
        index: usize,
    },

    /// Chancellor enacts one of two tiles.
    EnactPolicy {
        /// Position in the hand
        index: usize,
    },

    /// Chancellor proposes (agree) or president answers a veto.
    ResolveVeto {
        /// Propose, or accept the proposal
        agree: bool,
    },

    /// President uses the pending executive power.
    ResolveExecutiveAction {
        /// Target player; none for a policy peek
        target_id: Option<PlayerId>,
    },

    /// Transport lost the player's connection.
    Disconnect,

    /// Transport restored the player's connection.
    Reconnect,
}

impl Action {
    /// Short name for logging.
    pub fn name(&self) -> &'static str {
        match self {
            Action::Join { .. } => "join",
            Action::Leave => "leave",
            Action::SetReady => "set_ready",
            Action::Nominate { .. } => "nominate",
            Action::CastVote { .. } => "cast_vote",
            Action::DiscardPolicy { .. } => "discard_policy",
            Action::EnactPolicy { .. } => "enact_policy",
            Action::ResolveVeto { .. } => "resolve_veto",
            Action::ResolveExecutiveAction { .. } => "resolve_executive_action",
            Action::Disconnect => "disconnect",
            Action::Reconnect => "reconnect",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_bincode() {
        let action = Action::ResolveExecutiveAction { target_id: Some(PlayerId::new([3; 16])) };
        let bytes = bincode::serialize(&action).unwrap();
        let parsed: Action = bincode::deserialize(&bytes).unwrap();
        assert_eq!(parsed, action);
    }

    #[test]
    fn test_action_names() {
        assert_eq!(Action::Disconnect.name(), "disconnect");
        assert_eq!(Action::CastVote { choice: Vote::Ja }.name(), "cast_vote");
    }
}
