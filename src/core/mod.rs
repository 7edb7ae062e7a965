//! Core deterministic primitives.
//!
//! Everything the engine needs to replay a match bit-for-bit from its seed.

pub mod rng;
pub mod hash;

// Re-export core types
pub use rng::{DeterministicRng, RandomSource};
pub use hash::{compute_state_hash, StateHash, StateHasher};
