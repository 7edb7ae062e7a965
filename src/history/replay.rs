//! Replay Verification
//!
//! Rebuilds a session from its transcript and checks every recorded hash.

use tracing::{debug, warn};

use crate::core::hash::StateHash;
use crate::game::error::GameError;
use crate::game::session::GameSession;
use crate::history::transcript::SessionTranscript;

/// Why a replay diverged from its transcript.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReplayError {
    /// A recorded action was rejected on replay.
    #[error("Action {sequence} rejected on replay: {error}")]
    ActionRejected {
        /// Sequence of the offending entry.
        sequence: u64,
        /// Rejection reason.
        error: GameError,
    },

    /// Entries are out of order or have gaps.
    #[error("Expected sequence {expected}, found {found}")]
    SequenceGap {
        /// Sequence the replay reached.
        expected: u64,
        /// Sequence recorded.
        found: u64,
    },

    /// State after an action differs from the recorded hash.
    #[error("State hash mismatch at sequence {sequence}")]
    HashMismatch {
        /// Sequence of the offending entry.
        sequence: u64,
        /// Recorded hash.
        expected: StateHash,
        /// Replayed hash.
        computed: StateHash,
    },
}

/// Re-run `transcript` from its seed.
///
/// Returns the rebuilt session (still recording) when every entry matches.
pub fn replay(transcript: &SessionTranscript) -> Result<GameSession, ReplayError> {
    let mut session = GameSession::new(transcript.rng_seed);
    session.record_transcript(transcript.session_id);

    for entry in &transcript.entries {
        let expected = session.sequence() + 1;
        if entry.sequence != expected {
            return Err(ReplayError::SequenceGap { expected, found: entry.sequence });
        }

        session
            .apply(entry.player_id, entry.action.clone())
            .map_err(|error| ReplayError::ActionRejected { sequence: entry.sequence, error })?;

        let computed = session.state_hash();
        if computed != entry.state_hash {
            warn!(sequence = entry.sequence, "Replay diverged from transcript");
            return Err(ReplayError::HashMismatch {
                sequence: entry.sequence,
                expected: entry.state_hash,
                computed,
            });
        }
    }

    debug!(actions = transcript.len(), "Transcript replayed");
    Ok(session)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::action::Action;
    use crate::game::state::{PlayerId, Vote};

    fn recorded_session() -> GameSession {
        let mut session = GameSession::new(2024);
        session.record_transcript([5; 16]);
        let ids: Vec<PlayerId> = (1..=6).map(|i| PlayerId::new([i; 16])).collect();
        for id in &ids {
            session.apply(*id, Action::Join { username: format!("p{}", id.0[0]) }).unwrap();
            session.apply(*id, Action::SetReady).unwrap();
        }
        let chancellor = session.public_snapshot().eligible_chancellors[0];
        session.apply(ids[0], Action::Nominate { chancellor_id: chancellor }).unwrap();
        for id in &ids {
            session.apply(*id, Action::CastVote { choice: Vote::Nein }).unwrap();
        }
        session
    }

    #[test]
    fn test_replay_reproduces_state() {
        let session = recorded_session();
        let transcript = session.transcript().unwrap().clone();

        let replayed = replay(&transcript).unwrap();
        assert_eq!(replayed.state_hash(), session.state_hash());
        assert_eq!(replayed.public_snapshot(), session.public_snapshot());
    }

    #[test]
    fn test_tampered_hash_detected() {
        let session = recorded_session();
        let mut transcript = session.transcript().unwrap().clone();
        transcript.entries[3].state_hash = [0; 32];

        assert!(matches!(
            replay(&transcript),
            Err(ReplayError::HashMismatch { sequence: 4, .. })
        ));
    }

    #[test]
    fn test_wrong_seed_detected() {
        let session = recorded_session();
        let mut transcript = session.transcript().unwrap().clone();
        transcript.rng_seed += 1;

        assert!(matches!(
            replay(&transcript),
            Err(ReplayError::HashMismatch { sequence: 1, .. })
        ));
    }

    #[test]
    fn test_gap_detected() {
        let session = recorded_session();
        let mut transcript = session.transcript().unwrap().clone();
        transcript.entries.remove(2);

        assert!(matches!(
            replay(&transcript),
            Err(ReplayError::SequenceGap { expected: 3, found: 4 })
        ));
    }
}
