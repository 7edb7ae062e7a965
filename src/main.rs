//! Secret Hitler Session Server
//!
//! Runs a scripted bot match through the session registry, then verifies
//! determinism by replaying the recorded transcript.

use anyhow::{bail, Context};
use tracing::{debug, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use secret_hitler::{
    game::{
        events::GameEventData,
        executive::ExecutivePower,
        state::{Phase, Policy, Vote},
    },
    history::{replay, SessionTranscript},
    network::{SessionConfig, SessionHandle, SessionRegistry},
    Action, PlayerId, VERSION,
};

/// Give up on a demo match after this many submitted actions.
const MAX_DEMO_ACTIONS: usize = 2000;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")?;

    info!("Secret Hitler Server v{}", VERSION);

    let mut config = SessionConfig::from_env();
    config.record_transcript = true;
    let players: usize = std::env::var("SH_DEMO_PLAYERS")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(7);

    let registry = SessionRegistry::new();
    let handle = registry.create_session(&config).await;
    info!(session = %hex::encode(handle.id()), players, "=== Starting Demo Match ===");

    let mut events = handle.subscribe();
    let logger = tokio::spawn(async move {
        while let Ok(envelope) = events.recv().await {
            match &envelope.event.data {
                GameEventData::PolicyEnacted { policy, enacted_liberal, enacted_fascist } => {
                    info!("{:?} policy enacted ({} L / {} F)", policy, enacted_liberal, enacted_fascist);
                }
                GameEventData::ExecutiveActionResolved { kind, result } => {
                    info!("{:?} resolved: {:?}", kind, result);
                }
                GameEventData::GameEnded { winner, .. } => {
                    info!("Game ended! Winner: {:?}", winner);
                }
                other if !envelope.event.is_private() => debug!(seq = envelope.seq, "{:?}", other),
                _ => {}
            }
        }
    });

    let ids: Vec<PlayerId> = (0..players).map(|_| PlayerId::random()).collect();
    for (i, id) in ids.iter().enumerate() {
        handle.submit(*id, Action::Join { username: format!("bot-{}", i) }).await?;
    }
    for id in &ids {
        handle.submit(*id, Action::SetReady).await?;
    }

    play(&handle).await?;

    // Print final results
    info!("=== Match Results ===");
    let view = handle.snapshot(None).await?;
    for seat in &view.public.players {
        info!(
            "{} ({}) - {:?}{}",
            seat.username,
            seat.player_id,
            seat.role.unwrap_or_default(),
            if seat.alive { "" } else { ", executed" }
        );
    }

    let transcript = handle
        .transcript()
        .await?
        .context("transcript recording is disabled")?;
    verify(&transcript)?;

    registry.cleanup().await;
    drop(handle);
    let _ = logger.await;
    Ok(())
}

/// Drive the match with simple bots until it ends.
async fn play(handle: &SessionHandle) -> anyhow::Result<()> {
    let mut submitted = 0usize;

    while handle.phase() != Phase::GameOver {
        if submitted > MAX_DEMO_ACTIONS {
            bail!("demo match did not finish after {} actions", submitted);
        }
        let view = handle.snapshot(None).await?.public;
        let president = view.president_id.context("no president seated")?;

        let (actor, action) = match view.phase {
            Phase::Nomination => {
                let options = &view.eligible_chancellors;
                if options.is_empty() {
                    bail!("no eligible chancellor");
                }
                let pick = options[(view.sequence as usize) % options.len()];
                (president, Action::Nominate { chancellor_id: pick })
            }
            Phase::Voting => {
                // Votes are hidden until the tally, so just walk the table
                for (i, seat) in view.players.iter().filter(|p| p.alive).enumerate() {
                    let choice = if (i + view.sequence as usize) % 4 == 0 { Vote::Nein } else { Vote::Ja };
                    submitted += 1;
                    match handle.submit(seat.player_id, Action::CastVote { choice }).await {
                        Ok(_) if handle.phase() != Phase::Voting => break,
                        Ok(_) => {}
                        Err(err) => debug!(player = %seat.player_id, "Vote refused: {}", err),
                    }
                }
                continue;
            }
            Phase::Legislative => legislate(handle, &view, president).await?,
            Phase::ExecutiveAction => {
                let target = match view.pending_executive_action {
                    Some(ExecutivePower::PolicyPeek) => None,
                    _ => view
                        .players
                        .iter()
                        .find(|p| p.alive && p.player_id != president && !view.investigated.contains(&p.player_id))
                        .map(|p| p.player_id),
                };
                (president, Action::ResolveExecutiveAction { target_id: target })
            }
            Phase::Lobby | Phase::GameOver => bail!("unexpected phase {:?}", view.phase),
        };

        submitted += 1;
        if let Err(err) = handle.submit(actor, action.clone()).await {
            warn!(player = %actor, action = action.name(), "Bot move refused: {}", err);
            bail!("bot submitted an illegal move");
        }
    }
    Ok(())
}

/// Pick the legislative move for whoever holds the tiles.
async fn legislate(
    handle: &SessionHandle,
    view: &secret_hitler::game::PublicSnapshot,
    president: PlayerId,
) -> anyhow::Result<(PlayerId, Action)> {
    if view.veto_proposed {
        return Ok((president, Action::ResolveVeto { agree: true }));
    }

    let chancellor = view.chancellor_id.context("no chancellor seated")?;
    for holder in [president, chancellor] {
        let private = handle
            .snapshot(Some(holder))
            .await?
            .private
            .context("holder has no private view")?;
        if private.hand.is_empty() {
            continue;
        }

        let fascist = private
            .role_view
            .map(|v| v.role.is_fascist_team())
            .unwrap_or(false);
        let unwanted = if fascist { Policy::Liberal } else { Policy::Fascist };
        let wanted = if fascist { Policy::Fascist } else { Policy::Liberal };

        let action = if private.hand.len() == 3 {
            let index = private.hand.iter().position(|p| *p == unwanted).unwrap_or(0);
            Action::DiscardPolicy { index }
        } else if view.veto_unlocked && !private.hand.contains(&wanted) && !fascist {
            Action::ResolveVeto { agree: true }
        } else {
            let index = private.hand.iter().position(|p| *p == wanted).unwrap_or(0);
            Action::EnactPolicy { index }
        };
        return Ok((holder, action));
    }
    bail!("legislative phase with no hand dealt")
}

/// Replay the transcript from its seed and compare hashes.
fn verify(transcript: &SessionTranscript) -> anyhow::Result<()> {
    info!("=== Verifying Determinism ===");

    let bytes = transcript.to_bytes()?;
    let decoded = SessionTranscript::from_bytes(&bytes)?;
    if !decoded.is_complete() {
        bail!("transcript ends before the game does");
    }
    info!("Transcript: {} actions, {} bytes", decoded.len(), bytes.len());

    let replayed = replay(&decoded)?;
    let expected = decoded.final_hash().context("empty transcript")?;

    info!("Final State Hash: {}", hex::encode(expected));
    info!("Replay State Hash: {}", hex::encode(replayed.state_hash()));

    if replayed.state_hash() != expected || replayed.winner() != decoded.winner {
        bail!("DETERMINISM FAILURE: replay diverged");
    }
    info!("DETERMINISM VERIFIED: Hashes match!");
    Ok(())
}
