//! Session Actors and Registry
//!
//! Each session runs as its own task. Actions are queued and applied one at
//! a time in arrival order; nothing else touches the session state.
//!
//! ```text
//!  submit() ──► mpsc ──► actor ──► GameSession::apply
//!     ▲                    │
//!     └──── oneshot ◄──────┤
//!                          ├──► broadcast<EventEnvelope>  (subscribe)
//!                          └──► watch<Phase>              (phase)
//! ```

use std::collections::BTreeMap;

use serde::{Serialize, Deserialize};
use tokio::sync::{broadcast, mpsc, oneshot, watch, RwLock};
use tracing::{debug, info, warn};

use crate::core::rng::derive_session_seed;
use crate::game::action::Action;
use crate::game::error::GameError;
use crate::game::events::GameEvent;
use crate::game::session::GameSession;
use crate::game::snapshot::{PrivateSnapshot, PublicSnapshot};
use crate::game::state::{Phase, PlayerId};
use crate::history::transcript::SessionTranscript;

/// Unique session identifier.
pub type SessionId = [u8; 16];

// =============================================================================
// CONFIGURATION
// =============================================================================

/// Configuration for one session actor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Fixed RNG seed; derived from the session id and fresh entropy if unset.
    pub rng_seed: Option<u64>,
    /// Pending actions before `submit` waits.
    pub queue_capacity: usize,
    /// Events buffered per subscriber before it lags.
    pub event_capacity: usize,
    /// Keep a replayable transcript.
    pub record_transcript: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            rng_seed: None,
            queue_capacity: 64,
            event_capacity: 256,
            record_transcript: true,
        }
    }
}

impl SessionConfig {
    /// Load from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            rng_seed: std::env::var("SH_RNG_SEED").ok().and_then(|v| v.parse().ok()),
            queue_capacity: env_parse("SH_QUEUE_CAPACITY").unwrap_or(defaults.queue_capacity),
            event_capacity: env_parse("SH_EVENT_CAPACITY").unwrap_or(defaults.event_capacity),
            record_transcript: std::env::var("SH_RECORD_TRANSCRIPT")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(defaults.record_transcript),
        }
    }
}

fn env_parse(key: &str) -> Option<usize> {
    std::env::var(key).ok().and_then(|v| v.parse().ok()).filter(|n| *n > 0)
}

// =============================================================================
// ERRORS & MESSAGES
// =============================================================================

/// Errors from the registry or a session handle.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    /// No session with this id.
    #[error("Session not found")]
    SessionNotFound,

    /// The session actor has stopped.
    #[error("Session closed")]
    SessionClosed,

    /// The engine refused the action.
    #[error(transparent)]
    Rejected(#[from] GameError),
}

/// An event as delivered to subscribers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventEnvelope {
    /// Owning session.
    pub session_id: SessionId,
    /// Delivery order within the session, starting at 1.
    pub seq: u64,
    /// The event, with its audience.
    pub event: GameEvent,
}

/// Snapshot answer: the public projection plus, for a seated player, their
/// private one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionView {
    /// What everyone sees
    pub public: PublicSnapshot,
    /// What the requesting player alone sees
    pub private: Option<PrivateSnapshot>,
}

enum SessionCommand {
    Submit {
        player: PlayerId,
        action: Action,
        reply: oneshot::Sender<Result<Vec<GameEvent>, GameError>>,
    },
    Snapshot {
        player: Option<PlayerId>,
        reply: oneshot::Sender<SessionView>,
    },
    Transcript {
        reply: oneshot::Sender<Option<SessionTranscript>>,
    },
    Shutdown,
}

// =============================================================================
// SESSION HANDLE
// =============================================================================

/// Cloneable handle to a running session actor.
#[derive(Clone)]
pub struct SessionHandle {
    id: SessionId,
    commands: mpsc::Sender<SessionCommand>,
    events: broadcast::Sender<EventEnvelope>,
    phase: watch::Receiver<Phase>,
}

impl SessionHandle {
    /// Spawn the actor on the current tokio runtime.
    pub fn spawn(id: SessionId, config: &SessionConfig) -> Self {
        let seed = config.rng_seed.unwrap_or_else(|| {
            derive_session_seed(&id, uuid::Uuid::new_v4().as_bytes())
        });

        let mut session = GameSession::new(seed);
        if config.record_transcript {
            session.record_transcript(id);
        }

        let (commands, rx) = mpsc::channel(config.queue_capacity.max(1));
        let (events, _) = broadcast::channel(config.event_capacity.max(1));
        let (phase_tx, phase) = watch::channel(session.phase());

        tokio::spawn(run_session(id, session, rx, events.clone(), phase_tx));

        Self { id, commands, events, phase }
    }

    /// Session identifier.
    pub fn id(&self) -> SessionId {
        self.id
    }

    /// Queue an action and wait for its result.
    pub async fn submit(&self, player: PlayerId, action: Action) -> Result<Vec<GameEvent>, RegistryError> {
        let (reply, rx) = oneshot::channel();
        self.commands
            .send(SessionCommand::Submit { player, action, reply })
            .await
            .map_err(|_| RegistryError::SessionClosed)?;
        let result = rx.await.map_err(|_| RegistryError::SessionClosed)?;
        Ok(result?)
    }

    /// Public projection, plus `player`'s private one if given.
    pub async fn snapshot(&self, player: Option<PlayerId>) -> Result<SessionView, RegistryError> {
        let (reply, rx) = oneshot::channel();
        self.commands
            .send(SessionCommand::Snapshot { player, reply })
            .await
            .map_err(|_| RegistryError::SessionClosed)?;
        rx.await.map_err(|_| RegistryError::SessionClosed)
    }

    /// Copy of the transcript, if recording.
    pub async fn transcript(&self) -> Result<Option<SessionTranscript>, RegistryError> {
        let (reply, rx) = oneshot::channel();
        self.commands
            .send(SessionCommand::Transcript { reply })
            .await
            .map_err(|_| RegistryError::SessionClosed)?;
        rx.await.map_err(|_| RegistryError::SessionClosed)
    }

    /// Receive every event from now on, in generation order.
    pub fn subscribe(&self) -> broadcast::Receiver<EventEnvelope> {
        self.events.subscribe()
    }

    /// Phase after the last applied action.
    pub fn phase(&self) -> Phase {
        *self.phase.borrow()
    }

    /// Whether the actor has stopped.
    pub fn is_closed(&self) -> bool {
        self.commands.is_closed()
    }

    /// Ask the actor to stop. Queued commands ahead of this one still run.
    pub async fn shutdown(&self) {
        let _ = self.commands.send(SessionCommand::Shutdown).await;
    }

    /// Wait until the actor has stopped.
    pub async fn closed(&self) {
        self.commands.closed().await
    }
}

async fn run_session(
    id: SessionId,
    mut session: GameSession,
    mut rx: mpsc::Receiver<SessionCommand>,
    events: broadcast::Sender<EventEnvelope>,
    phase: watch::Sender<Phase>,
) {
    let tag = hex::encode(&id[..4]);
    info!(session = %tag, "Session actor started");
    let mut delivered = 0u64;

    while let Some(command) = rx.recv().await {
        match command {
            SessionCommand::Submit { player, action, reply } => {
                let result = session.apply(player, action);
                if let Ok(produced) = &result {
                    for event in produced {
                        delivered += 1;
                        // No subscribers is fine
                        let _ = events.send(EventEnvelope {
                            session_id: id,
                            seq: delivered,
                            event: event.clone(),
                        });
                    }
                    phase.send_if_modified(|current| {
                        let changed = *current != session.phase();
                        *current = session.phase();
                        changed
                    });
                }
                if reply.send(result).is_err() {
                    debug!(session = %tag, "Submitter went away before the reply");
                }
            }
            SessionCommand::Snapshot { player, reply } => {
                let view = SessionView {
                    public: session.public_snapshot(),
                    private: player.and_then(|p| session.private_snapshot(&p)),
                };
                let _ = reply.send(view);
            }
            SessionCommand::Transcript { reply } => {
                let _ = reply.send(session.transcript().cloned());
            }
            SessionCommand::Shutdown => break,
        }
    }

    info!(session = %tag, actions = session.sequence(), "Session actor stopped");
}

// =============================================================================
// SESSION REGISTRY
// =============================================================================

/// Owns every live session, addressed by id.
pub struct SessionRegistry {
    sessions: RwLock<BTreeMap<SessionId, SessionHandle>>,
}

impl SessionRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            sessions: RwLock::new(BTreeMap::new()),
        }
    }

    /// Create and start a new session.
    pub async fn create_session(&self, config: &SessionConfig) -> SessionHandle {
        let id = uuid::Uuid::new_v4().into_bytes();
        let handle = SessionHandle::spawn(id, config);

        let mut sessions = self.sessions.write().await;
        sessions.insert(id, handle.clone());
        info!(session = %hex::encode(&id[..4]), total = sessions.len(), "Session created");

        handle
    }

    /// Get a session by ID.
    pub async fn get_session(&self, id: &SessionId) -> Result<SessionHandle, RegistryError> {
        let sessions = self.sessions.read().await;
        sessions.get(id).cloned().ok_or(RegistryError::SessionNotFound)
    }

    /// Remove a session and stop its actor.
    pub async fn remove_session(&self, id: &SessionId) -> Result<(), RegistryError> {
        let handle = {
            let mut sessions = self.sessions.write().await;
            sessions.remove(id).ok_or(RegistryError::SessionNotFound)?
        };
        handle.shutdown().await;
        Ok(())
    }

    /// Get active session count.
    pub async fn session_count(&self) -> usize {
        let sessions = self.sessions.read().await;
        sessions.len()
    }

    /// Drop finished or stopped sessions. Returns how many were removed.
    pub async fn cleanup(&self) -> usize {
        let finished: Vec<SessionHandle> = {
            let mut sessions = self.sessions.write().await;
            let ids: Vec<SessionId> = sessions
                .iter()
                .filter(|(_, h)| h.is_closed() || h.phase() == Phase::GameOver)
                .map(|(id, _)| *id)
                .collect();
            ids.iter().filter_map(|id| sessions.remove(id)).collect()
        };

        for handle in &finished {
            handle.shutdown().await;
        }
        if !finished.is_empty() {
            warn!(removed = finished.len(), "Cleaned up sessions");
        }
        finished.len()
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// TESTS
// =============================================================================
