//! Role Assignment
//!
//! Deals the secret roles for a roster and answers who-knows-whom.

use serde::{Serialize, Deserialize};

use crate::core::rng::RandomSource;
use crate::game::error::GameError;
use crate::game::state::{PlayerId, Role};
use crate::{MAX_PLAYERS, MIN_PLAYERS, HITLER_KNOWS_FASCISTS_MAX_PLAYERS};

/// Fascist team size (Hitler included) for a player count.
pub fn fascist_count(player_count: usize) -> Result<usize, GameError> {
    match player_count {
        5 | 6 => Ok(2),
        7 | 8 => Ok(3),
        9 | 10 => Ok(4),
        _ => Err(GameError::InvalidPlayerCount),
    }
}

/// Deal roles to `players` (seating order).
///
/// Builds the pool 1 Hitler + (fascists - 1) Fascist + remainder Liberal,
/// shuffles it with `rng` and zips it with the roster.
pub fn assign_roles<R: RandomSource>(
    players: &[PlayerId],
    rng: &mut R,
) -> Result<Vec<(PlayerId, Role)>, GameError> {
    let n = players.len();
    if !(MIN_PLAYERS..=MAX_PLAYERS).contains(&n) {
        return Err(GameError::InvalidPlayerCount);
    }
    let fascists = fascist_count(n)?;

    let mut pool = Vec::with_capacity(n);
    pool.push(Role::Hitler);
    pool.extend(std::iter::repeat(Role::Fascist).take(fascists - 1));
    pool.extend(std::iter::repeat(Role::Liberal).take(n - fascists));
    rng.shuffle(&mut pool);

    Ok(players.iter().copied().zip(pool).collect())
}

/// What one player privately knows about roles.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleView {
    /// The viewer's own role
    pub role: Role,
    /// Other players whose roles the viewer knows, in seating order
    pub known: Vec<(PlayerId, Role)>,
}

/// Private role knowledge for `viewer`.
///
/// Fascists see every other fascist and Hitler. Hitler sees the fascists
/// only in games of six or fewer. Liberals see nothing.
pub fn role_view(seats: &[(PlayerId, Role)], viewer: &PlayerId) -> Option<RoleView> {
    let role = seats.iter().find(|(id, _)| id == viewer)?.1;

    let sees_team = match role {
        Role::Fascist => true,
        Role::Hitler => seats.len() <= HITLER_KNOWS_FASCISTS_MAX_PLAYERS,
        Role::Liberal | Role::Unassigned => false,
    };

    let known = if sees_team {
        seats
            .iter()
            .filter(|(id, r)| id != viewer && r.is_fascist_team())
            .copied()
            .collect()
    } else {
        Vec::new()
    };

    Some(RoleView { role, known })
}
