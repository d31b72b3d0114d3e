use std::collections::{HashSet, VecDeque};

use crate::grid::TileGrid;
use crate::rng::RandomSource;
use crate::types::{Direction, Vec2};

pub(super) fn manhattan(a: Vec2, b: Vec2) -> i32 {
    (a.x - b.x).abs() + (a.y - b.y).abs()
}

pub(super) fn random_direction<R: RandomSource + ?Sized>(rng: &mut R) -> Direction {
    Direction::CARDINALS[rng.pick_index(Direction::CARDINALS.len())]
}

/// First move of a shortest walk from `from` to any tile matching `is_goal`,
/// never entering `blocked` tiles. `None` when no goal is reachable or
/// `from` already is one.
pub(super) fn first_step_toward(
    grid: &TileGrid,
    from: Vec2,
    blocked: &HashSet<Vec2>,
    is_goal: impl Fn(Vec2) -> bool,
) -> Option<Direction> {
    let mut seen = HashSet::new();
    let mut queue = VecDeque::new();
    seen.insert(from);
    for dir in Direction::CARDINALS {
        if !grid.can_step(from.x, from.y, dir) {
            continue;
        }
        let (nx, ny) = grid.neighbor(from.x, from.y, dir);
        let next = Vec2::new(nx, ny);
        if blocked.contains(&next) || !seen.insert(next) {
            continue;
        }
        queue.push_back((next, dir));
    }

    while let Some((cell, first)) = queue.pop_front() {
        if is_goal(cell) {
            return Some(first);
        }
        for dir in Direction::CARDINALS {
            if !grid.can_step(cell.x, cell.y, dir) {
                continue;
            }
            let (nx, ny) = grid.neighbor(cell.x, cell.y, dir);
            let next = Vec2::new(nx, ny);
            if blocked.contains(&next) || !seen.insert(next) {
                continue;
            }
            queue.push_back((next, first));
        }
    }
    None
}
