//! Network Layer
//!
//! Session actors, the registry and the JSON wire messages. The transport
//! itself (sockets, auth) plugs in from outside; all rules run in `game/`.

pub mod protocol;
pub mod session;

pub use protocol::{ClientMessage, ErrorCode, ServerMessage};
pub use session::{
    EventEnvelope, RegistryError, SessionConfig, SessionHandle, SessionId, SessionRegistry,
    SessionView,
};
