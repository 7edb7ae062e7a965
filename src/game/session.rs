//! Game Session
//!
//! Root of one match. Owns the state and applies actions one at a time.
//!
//! ## Atomicity
//!
//! Every action runs against a clone of the state; the clone replaces the
//! live state only if the action succeeds. A rejected action leaves no
//! trace: no events, no RNG draws, no sequence bump.

use tracing::{debug, info, warn};

use crate::core::hash::StateHash;
use crate::core::rng::{DeterministicRng, RandomSource};
use crate::game::action::Action;
use crate::game::deck::PolicyDeck;
use crate::game::election;
use crate::game::error::GameError;
use crate::game::events::{GameEvent, GameEventData, PublicPlayer};
use crate::game::executive;
use crate::game::legislative;
use crate::game::roles::{assign_roles, role_view};
use crate::game::snapshot::{private_snapshot, public_snapshot, PrivateSnapshot, PublicSnapshot};
use crate::game::state::{GameState, Party, Phase, PlayerId, PlayerState};
use crate::history::transcript::{SessionTranscript, TranscriptEntry};
use crate::{MAX_PLAYERS, MIN_PLAYERS};

/// One Secret Hitler match.
#[derive(Debug)]
pub struct GameSession<R = DeterministicRng> {
    state: GameState<R>,
    transcript: Option<SessionTranscript>,
}

impl GameSession<DeterministicRng> {
    /// Create an empty lobby seeded with the deterministic RNG.
    pub fn new(rng_seed: u64) -> Self {
        Self::with_rng(rng_seed, DeterministicRng::new(rng_seed))
    }
}

impl<R: RandomSource + Clone> GameSession<R> {
    /// Create an empty lobby with an injected RNG.
    pub fn with_rng(rng_seed: u64, rng: R) -> Self {
        Self {
            state: GameState::with_rng(rng_seed, rng),
            transcript: None,
        }
    }

    /// Start recording accepted actions for replay.
    pub fn record_transcript(&mut self, session_id: [u8; 16]) {
        self.transcript = Some(SessionTranscript::new(session_id, self.state.rng_seed));
    }

    /// Recorded transcript, if recording is enabled.
    pub fn transcript(&self) -> Option<&SessionTranscript> {
        self.transcript.as_ref()
    }

    /// Apply one action from `player`.
    ///
    /// Returns the events produced, in order, or the single reason the
    /// action was rejected.
    pub fn apply(&mut self, player: PlayerId, action: Action) -> Result<Vec<GameEvent>, GameError> {
        let mut next = self.state.clone();
        next.sequence += 1;

        if let Err(err) = dispatch(&mut next, player, &action) {
            debug!(player = %player, action = action.name(), error = %err, "Action rejected");
            return Err(err);
        }

        let events = next.take_events();
        self.state = next;

        #[cfg(feature = "debug-tracing")]
        tracing::trace!(
            sequence = self.state.sequence,
            hash = %hex::encode(self.state.compute_hash()),
            "State committed"
        );

        if let Some(transcript) = self.transcript.as_mut() {
            transcript.record(TranscriptEntry {
                sequence: self.state.sequence,
                player_id: player,
                action,
                event_count: events.len() as u32,
                state_hash: self.state.compute_hash(),
            });
            if let Some(winner) = self.state.winner {
                transcript.winner = Some(winner);
            }
        }

        Ok(events)
    }

    /// Current state (read-only).
    pub fn state(&self) -> &GameState<R> {
        &self.state
    }

    /// Current phase.
    pub fn phase(&self) -> Phase {
        self.state.phase
    }

    /// Winning party, once the game is over.
    pub fn winner(&self) -> Option<Party> {
        self.state.winner
    }

    /// Accepted actions so far.
    pub fn sequence(&self) -> u64 {
        self.state.sequence
    }

    /// Hash of the full state, secrets included. Never send to clients.
    pub fn state_hash(&self) -> StateHash {
        self.state.compute_hash()
    }

    /// Projection visible to everyone.
    pub fn public_snapshot(&self) -> PublicSnapshot {
        public_snapshot(&self.state)
    }

    /// Projection visible to `player` alone.
    pub fn private_snapshot(&self, player: &PlayerId) -> Option<PrivateSnapshot> {
        private_snapshot(&self.state, player)
    }

    #[cfg(test)]
    pub(crate) fn state_mut(&mut self) -> &mut GameState<R> {
        &mut self.state
    }
}

// =============================================================================
// DISPATCH
// =============================================================================

fn dispatch<R: RandomSource + Clone>(
    state: &mut GameState<R>,
    player: PlayerId,
    action: &Action,
) -> Result<(), GameError> {
    if state.is_over() {
        return Err(GameError::GameAlreadyOver);
    }
    if !matches!(action, Action::Join { .. }) && !state.players.contains_key(&player) {
        return Err(GameError::UnknownPlayer);
    }

    match action {
        Action::Join { username } => join(state, player, username),
        Action::Leave => leave(state, player),
        Action::SetReady => set_ready(state, player),
        Action::Nominate { chancellor_id } => election::nominate(state, player, *chancellor_id),
        Action::CastVote { choice } => election::cast_vote(state, player, *choice),
        Action::DiscardPolicy { index } => legislative::discard_policy(state, player, *index),
        Action::EnactPolicy { index } => legislative::enact_policy(state, player, *index),
        Action::ResolveVeto { agree } => legislative::resolve_veto(state, player, *agree),
        Action::ResolveExecutiveAction { target_id } => executive::resolve(state, player, *target_id),
        Action::Disconnect => disconnect(state, player),
        Action::Reconnect => reconnect(state, player),
    }
}

// =============================================================================
// LOBBY
// =============================================================================

fn join<R: RandomSource + Clone>(
    state: &mut GameState<R>,
    player: PlayerId,
    username: &str,
) -> Result<(), GameError> {
    if state.phase != Phase::Lobby {
        return Err(GameError::WrongPhase);
    }
    if state.players.contains_key(&player) {
        return Err(GameError::AlreadyJoined);
    }
    if state.roster.len() >= MAX_PLAYERS {
        return Err(GameError::SessionFull);
    }

    state.players.insert(player, PlayerState::new(player, username));
    state.roster.push(player);

    info!(player = %player, username, seats = state.roster.len(), "Player joined");
    state.announce(GameEventData::PlayerJoined {
        player_id: player,
        username: username.to_string(),
    });
    Ok(())
}

fn leave<R: RandomSource + Clone>(state: &mut GameState<R>, player: PlayerId) -> Result<(), GameError> {
    if state.phase != Phase::Lobby {
        // Seats are fixed once dealt
        return disconnect(state, player);
    }

    state.players.remove(&player);
    state.roster.retain(|id| *id != player);
    info!(player = %player, "Player left lobby");
    state.announce(GameEventData::PlayerLeft { player_id: player });

    // The one holdout may have just left
    start_if_ready(state)
}

fn set_ready<R: RandomSource + Clone>(state: &mut GameState<R>, player: PlayerId) -> Result<(), GameError> {
    if state.phase != Phase::Lobby {
        return Err(GameError::WrongPhase);
    }
    let seat = state.get_player_mut(&player).ok_or(GameError::UnknownPlayer)?;
    if !seat.ready {
        seat.ready = true;
        state.announce(GameEventData::PlayerReady { player_id: player });
    }
    start_if_ready(state)
}

fn start_if_ready<R: RandomSource + Clone>(state: &mut GameState<R>) -> Result<(), GameError> {
    let everyone_ready = state.players.values().all(|p| p.ready);
    if everyone_ready && state.roster.len() >= MIN_PLAYERS {
        start_game(state)?;
    }
    Ok(())
}

/// Deal roles, shuffle the deck and seat the first president.
fn start_game<R: RandomSource + Clone>(state: &mut GameState<R>) -> Result<(), GameError> {
    let seats = assign_roles(&state.roster, &mut state.rng)?;
    for (id, role) in &seats {
        if let Some(p) = state.get_player_mut(id) {
            p.role = *role;
        }
    }
    state.deck = PolicyDeck::shuffled(&mut state.rng);

    let roster = state
        .roster
        .iter()
        .filter_map(|id| state.players.get(id))
        .map(|p| PublicPlayer {
            player_id: p.id,
            username: p.username.clone(),
            alive: p.alive,
            connected: p.connected,
        })
        .collect();
    info!(players = seats.len(), "Game started");
    state.announce(GameEventData::GameStarted { roster });

    for (id, _) in &seats {
        if let Some(view) = role_view(&seats, id) {
            state.tell(*id, GameEventData::RoleAssigned { target_id: *id, view });
        }
    }

    let first = state.roster[0];
    election::install_president(state, first);
    Ok(())
}

// =============================================================================
// CONNECTION STATUS
// =============================================================================

fn disconnect<R: RandomSource + Clone>(state: &mut GameState<R>, player: PlayerId) -> Result<(), GameError> {
    if state.phase == Phase::Lobby {
        return leave(state, player);
    }
    let seat = state.get_player_mut(&player).ok_or(GameError::UnknownPlayer)?;
    if !seat.connected {
        return Ok(());
    }
    seat.connected = false;

    warn!(player = %player, phase = ?state.phase, "Player disconnected");
    state.announce(GameEventData::PlayerDisconnected { player_id: player });

    // An outstanding ballot may have been the last one missing
    election::try_tally(state)
}

fn reconnect<R: RandomSource + Clone>(state: &mut GameState<R>, player: PlayerId) -> Result<(), GameError> {
    let seat = state.get_player_mut(&player).ok_or(GameError::UnknownPlayer)?;
    if seat.connected {
        return Ok(());
    }
    seat.connected = true;

    info!(player = %player, "Player reconnected");
    state.announce(GameEventData::PlayerReconnected { player_id: player });
    Ok(())
}
