//! Engine errors.
//!
//! Every rejection is local: the action is dropped, state is untouched,
//! and only the acting client learns the kind.

use serde::{Serialize, Deserialize};

/// Reasons an inbound action is rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
pub enum GameError {
    /// Roster size outside 5..=10 at game start.
    #[error("Invalid player count")]
    InvalidPlayerCount,

    /// Nominee is ineligible, or the nominator is not the president.
    #[error("Illegal nomination")]
    IllegalNomination,

    /// Ballot already cast this election.
    #[error("Already voted")]
    AlreadyVoted,

    /// Wrong actor or out-of-range tile index in a legislative session.
    #[error("Illegal discard")]
    IllegalDiscard,

    /// Veto requested while locked, by the wrong player, or twice.
    #[error("Illegal veto")]
    IllegalVeto,

    /// Wrong actor or invalid target for an executive power.
    #[error("Illegal executive action")]
    IllegalExecutiveAction,

    /// Session has ended.
    #[error("Game already over")]
    GameAlreadyOver,

    /// Not enough tiles left to draw.
    #[error("Deck exhausted")]
    DeckExhausted,

    /// Actor is not seated in this session.
    #[error("Unknown player")]
    UnknownPlayer,

    /// Action not permitted in the current phase.
    #[error("Wrong phase")]
    WrongPhase,

    /// Lobby already holds the maximum number of players.
    #[error("Session is full")]
    SessionFull,

    /// Executed players take no further part.
    #[error("Player is dead")]
    PlayerDead,

    /// Disconnected players must reconnect before voting.
    #[error("Player is disconnected")]
    PlayerDisconnected,

    /// Player id already joined.
    #[error("Already joined")]
    AlreadyJoined,
}
