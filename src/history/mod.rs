//! Session History
//!
//! Append-only log of accepted actions and verification by replay.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │  transcript.rs - Accepted actions with post-state hashes │
//! │  replay.rs     - Re-run a transcript from its seed       │
//! └──────────────────────────────────────────────────────────┘
//! ```

pub mod transcript;
pub mod replay;

pub use transcript::{SessionTranscript, TranscriptEntry, TranscriptError, TRANSCRIPT_VERSION};
pub use replay::{replay, ReplayError};
