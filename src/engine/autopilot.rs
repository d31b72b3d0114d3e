use std::collections::HashSet;

use crate::ghost::Pursuer;
use crate::rng::RandomSource;
use crate::types::{Direction, GhostMode, Vec2};

use super::utils::{first_step_toward, manhattan, random_direction};
use super::GameEngine;

const DANGER_DISTANCE: i32 = 2;
const HUNT_DISTANCE: i32 = 8;

impl<R: RandomSource> GameEngine<R> {
    /// Direction a computer-controlled player would request this tick:
    /// flee a close dangerous pursuer, hunt a nearby frightened one, else
    /// walk to the nearest pickup.
    pub fn autopilot_direction(&mut self) -> Direction {
        let from = self.player.tile();
        let threats: Vec<Vec2> = self
            .pursuers
            .iter()
            .filter(|p| p.mode() != GhostMode::Frightened)
            .map(Pursuer::tile)
            .collect();

        if threats
            .iter()
            .any(|threat| manhattan(from, *threat) <= DANGER_DISTANCE)
        {
            return self.choose_escape_direction(from, &threats);
        }

        let blocked: HashSet<Vec2> = threats.into_iter().collect();
        let grid = self.session.grid();

        let prey: Vec<Vec2> = self
            .pursuers
            .iter()
            .filter(|p| p.mode() == GhostMode::Frightened)
            .map(Pursuer::tile)
            .filter(|tile| manhattan(from, *tile) <= HUNT_DISTANCE)
            .collect();
        if !prey.is_empty() {
            if let Some(dir) = first_step_toward(grid, from, &blocked, |cell| prey.contains(&cell)) {
                return dir;
            }
        }

        first_step_toward(grid, from, &blocked, |cell| {
            grid.tile(cell.x, cell.y).is_some_and(|tile| tile.is_pickup())
        })
        .unwrap_or(Direction::None)
    }

    pub(super) fn choose_escape_direction(&mut self, from: Vec2, threats: &[Vec2]) -> Direction {
        let grid = self.session.grid();
        let mut best = Direction::None;
        let mut best_dist = i32::MIN;
        for dir in Direction::CARDINALS {
            if !grid.can_step(from.x, from.y, dir) {
                continue;
            }
            let (nx, ny) = grid.neighbor(from.x, from.y, dir);
            let next = Vec2::new(nx, ny);
            let dist = threats
                .iter()
                .map(|threat| manhattan(next, *threat))
                .min()
                .unwrap_or(99);
            if dist > best_dist {
                best_dist = dist;
                best = dir;
            }
        }
        if best == Direction::None {
            random_direction(&mut self.rng)
        } else {
            best
        }
    }
}
