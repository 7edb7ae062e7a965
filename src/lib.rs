//! # Secret Hitler Session Server
//!
//! Authoritative engine for the Secret Hitler hidden-role game, one
//! sequential actor per match.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                  SECRET HITLER SERVER                        │
//! ├─────────────────────────────────────────────────────────────┤
//! │  core/           - Deterministic primitives                  │
//! │  ├── rng.rs      - Injectable RNG, Xorshift128+ default      │
//! │  └── hash.rs     - State hashing for verification            │
//! │                                                              │
//! │  game/           - Rules engine (deterministic)              │
//! │  ├── state.rs    - Session and player state                  │
//! │  ├── roles.rs    - Role dealing and visibility               │
//! │  ├── deck.rs     - Policy draw/discard piles                 │
//! │  ├── election.rs - Nomination, voting, tracker               │
//! │  ├── legislative.rs - Discard/enact, veto                    │
//! │  ├── executive.rs   - Presidential powers                    │
//! │  ├── win.rs      - Win conditions                            │
//! │  └── session.rs  - Atomic action application                │
//! │                                                              │
//! │  history/        - Transcript and replay verification        │
//! │                                                              │
//! │  network/        - Actors and wire format (non-deterministic)│
//! │  ├── protocol.rs - Message types                             │
//! │  └── session.rs  - Session actors and registry               │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Determinism Guarantee
//!
//! The `core/` and `game/` modules are **100% deterministic**:
//! - No HashMap (uses BTreeMap for sorted iteration)
//! - No system time dependencies
//! - All randomness from the injected `RandomSource`
//!
//! Given the same seed and the same accepted actions, a session reaches
//! the same state hash on any platform.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod core;
pub mod game;
pub mod history;
pub mod network;

// Re-export commonly used types
pub use core::rng::{DeterministicRng, RandomSource};
pub use game::{Action, GameError, GameEvent, GameSession, Phase, PlayerId};
pub use network::{SessionConfig, SessionHandle, SessionRegistry};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Fewest players that can start a game
pub const MIN_PLAYERS: usize = 5;

/// Most players a lobby accepts
pub const MAX_PLAYERS: usize = 10;

/// Liberal policy tiles in the deck
pub const LIBERAL_TILES: usize = 6;

/// Fascist policy tiles in the deck
pub const FASCIST_TILES: usize = 11;

/// Total policy tiles
pub const DECK_SIZE: usize = LIBERAL_TILES + FASCIST_TILES;

/// Tiles drawn by the president each session
pub const PRESIDENT_HAND_SIZE: usize = 3;

/// Liberal policies needed to win
pub const LIBERAL_POLICIES_TO_WIN: u8 = 5;

/// Fascist policies needed to win
pub const FASCIST_POLICIES_TO_WIN: u8 = 6;

/// Failed governments that force the top policy
pub const ELECTION_TRACKER_LIMIT: u8 = 3;

/// Fascist policies that permanently unlock veto
pub const VETO_UNLOCK_FASCIST_POLICIES: u8 = 5;

/// Fascist policies after which electing Hitler chancellor wins
pub const HITLER_ZONE_FASCIST_POLICIES: u8 = 3;

/// Presidents installed before the Hitler-chancellor rule applies
pub const HITLER_ZONE_MIN_TERMS: u32 = 3;

/// Largest game in which Hitler knows the fascists
pub const HITLER_KNOWS_FASCISTS_MAX_PLAYERS: usize = 6;

/// Alive players at which the last president is also term-limited
pub const TERM_LIMIT_PRESIDENT_MIN_ALIVE: usize = 7;
