//! Session Transcript
//!
//! Every accepted action in order, with the state hash after it. The RNG
//! seed plus the entries are enough to rebuild the session exactly.

use serde::{Serialize, Deserialize};

use crate::core::hash::StateHash;
use crate::game::action::Action;
use crate::game::state::{Party, PlayerId};

/// Current transcript version.
pub const TRANSCRIPT_VERSION: u8 = 1;

/// One accepted action.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptEntry {
    /// Sequence number assigned on acceptance (starts at 1)
    pub sequence: u64,

    /// Acting player
    pub player_id: PlayerId,

    /// The action as submitted
    pub action: Action,

    /// Events the action produced
    pub event_count: u32,

    /// State hash after the action
    pub state_hash: StateHash,
}

/// Append-only log of a session.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionTranscript {
    /// Version for forward compatibility.
    pub version: u8,

    /// Owning session
    pub session_id: [u8; 16],

    /// Seed the session RNG was created with
    pub rng_seed: u64,

    /// Accepted actions in order
    pub entries: Vec<TranscriptEntry>,

    /// Set once the game ends
    pub winner: Option<Party>,
}

impl SessionTranscript {
    /// Create an empty transcript.
    pub fn new(session_id: [u8; 16], rng_seed: u64) -> Self {
        Self {
            version: TRANSCRIPT_VERSION,
            session_id,
            rng_seed,
            entries: Vec::new(),
            winner: None,
        }
    }

    /// Append an accepted action.
    pub fn record(&mut self, entry: TranscriptEntry) {
        self.entries.push(entry);
    }

    /// Number of recorded actions.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// No actions recorded yet.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Hash after the last recorded action.
    pub fn final_hash(&self) -> Option<StateHash> {
        self.entries.last().map(|e| e.state_hash)
    }

    /// Whether the recorded game has ended.
    pub fn is_complete(&self) -> bool {
        self.winner.is_some()
    }

    /// Serialize to bytes (bincode).
    pub fn to_bytes(&self) -> Result<Vec<u8>, TranscriptError> {
        bincode::serialize(self).map_err(|e| TranscriptError::SerializationFailed(e.to_string()))
    }

    /// Deserialize from bytes.
    pub fn from_bytes(data: &[u8]) -> Result<Self, TranscriptError> {
        let transcript: Self = bincode::deserialize(data)
            .map_err(|e| TranscriptError::DeserializationFailed(e.to_string()))?;
        if transcript.version != TRANSCRIPT_VERSION {
            return Err(TranscriptError::VersionMismatch {
                expected: TRANSCRIPT_VERSION,
                got: transcript.version,
            });
        }
        Ok(transcript)
    }
}

/// Errors reading or writing transcripts.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TranscriptError {
    /// Encoding failed.
    #[error("Serialization failed: {0}")]
    SerializationFailed(String),

    /// Bytes are not a transcript.
    #[error("Deserialization failed: {0}")]
    DeserializationFailed(String),

    /// Written by an incompatible version.
    #[error("Version mismatch: expected {expected}, got {got}")]
    VersionMismatch {
        /// Supported version.
        expected: u8,
        /// Version found.
        got: u8,
    },
}
