//! Game Logic Module
//!
//! The rules engine. 100% deterministic given the RNG.
//!
//! ## Module Structure
//!
//! - `state`: Session state, players, roles, phases
//! - `action`: Inbound player actions
//! - `events`: Outbound events with their audience
//! - `roles`: Role dealing and who-knows-whom
//! - `deck`: Policy draw/discard piles
//! - `election`: Nomination, voting, tracker, rotation
//! - `legislative`: Discard/enact and veto
//! - `executive`: Presidential powers
//! - `win`: Win conditions
//! - `snapshot`: Public and private projections
//! - `session`: Atomic action application

pub mod state;
pub mod action;
pub mod error;
pub mod events;
pub mod roles;
pub mod deck;
pub mod election;
pub mod legislative;
pub mod executive;
pub mod win;
pub mod snapshot;
pub mod session;

#[cfg(test)]
mod tests;

// Re-export key types
pub use action::Action;
pub use error::GameError;
pub use events::{Audience, GameEvent, GameEventData};
pub use executive::ExecutivePower;
pub use session::GameSession;
pub use snapshot::{PrivateSnapshot, PublicSnapshot};
pub use state::{GameState, Party, Phase, PlayerId, Policy, Role, Vote};
