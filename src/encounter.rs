use crate::ghost::Pursuer;
use crate::motion::{MotionController, Placement};
use crate::power::PowerModeTimer;
use crate::session::{Score, Session};
use crate::types::GhostMode;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Encounter {
    GhostEaten {
        index: usize,
        ghost_id: usize,
        points: u32,
        placement: Placement,
    },
    LifeLost {
        lives_left: u32,
        placement: Placement,
    },
}

impl Encounter {
    /// Where the moved agent landed, for callers that log fallbacks.
    pub fn placement(&self) -> Placement {
        match self {
            Encounter::GhostEaten { placement, .. } | Encounter::LifeLost { placement, .. } => {
                *placement
            }
        }
    }
}

/// Checks the player against every pursuer in list order and applies the
/// first collision found. At most one encounter per call; nothing happens
/// outside PLAYING.
pub fn resolve_encounter(
    session: &mut Session,
    player: &mut MotionController,
    pursuers: &mut [Pursuer],
    timer: &mut PowerModeTimer,
    score: &mut Score,
    immobilize_secs: f64,
) -> Option<Encounter> {
    if !session.is_playing() {
        return None;
    }
    let player_tile = player.tile();
    let index = pursuers.iter().position(|p| p.tile() == player_tile)?;

    if pursuers[index].mode() == GhostMode::Frightened {
        let points = timer.next_eat_score();
        score.add(points);
        timer.on_ghost_eaten();
        let spawn = session.ghost_spawn();
        let pursuer = &mut pursuers[index];
        let placement = pursuer.respawn(session.grid(), spawn, immobilize_secs);
        return Some(Encounter::GhostEaten {
            index,
            ghost_id: pursuer.id(),
            points,
            placement,
        });
    }

    session.lose_life();
    let placement = player.place_at_nearest_walkable(session.grid(), session.player_spawn());
    timer.cancel(pursuers);
    Some(Encounter::LifeLost {
        lives_left: session.lives(),
        placement,
    })
}
