use std::collections::{HashSet, VecDeque};

use crate::grid::TileGrid;
use crate::types::{Direction, Vec2};

/// Continuous movement of one agent over the tile grid.
///
/// Position is an integer tile plus a sub-tile offset along the axis of
/// travel. Turns are queued and only committed when the agent sits exactly on
/// a tile center and the tile in the queued direction is walkable.
#[derive(Clone, Debug)]
pub struct MotionController {
    tile_x: i32,
    tile_y: i32,
    off_x: f64,
    off_y: f64,
    dir: Direction,
    queued: Direction,
    speed: f64,
}

/// Outcome of [`MotionController::place_at_nearest_walkable`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Placement {
    Exact,
    Nearest(Vec2),
    /// No walkable tile exists; the agent sits on the requested tile anyway.
    Fallback,
}

impl MotionController {
    pub fn new(speed: f64) -> Self {
        Self {
            tile_x: 0,
            tile_y: 0,
            off_x: 0.0,
            off_y: 0.0,
            dir: Direction::None,
            queued: Direction::None,
            speed: sanitize_speed(speed),
        }
    }

    pub fn tile_x(&self) -> i32 {
        self.tile_x
    }

    pub fn tile_y(&self) -> i32 {
        self.tile_y
    }

    pub fn tile(&self) -> Vec2 {
        Vec2::new(self.tile_x, self.tile_y)
    }

    pub fn offsets(&self) -> (f64, f64) {
        (self.off_x, self.off_y)
    }

    pub fn direction(&self) -> Direction {
        self.dir
    }

    pub fn queued(&self) -> Direction {
        self.queued
    }

    pub fn speed(&self) -> f64 {
        self.speed
    }

    pub fn set_speed(&mut self, speed: f64) {
        self.speed = sanitize_speed(speed);
    }

    pub fn is_center_aligned(&self) -> bool {
        self.off_x == 0.0 && self.off_y == 0.0
    }

    pub fn request(&mut self, dir: Direction) {
        self.queued = dir;
    }

    /// Snaps to a tile center and clears both current and queued direction.
    pub fn place_at(&mut self, tile_x: i32, tile_y: i32) {
        self.tile_x = tile_x;
        self.tile_y = tile_y;
        self.off_x = 0.0;
        self.off_y = 0.0;
        self.dir = Direction::None;
        self.queued = Direction::None;
    }

    pub fn place_at_nearest_walkable(&mut self, grid: &TileGrid, target: Vec2) -> Placement {
        if grid.is_walkable(target.x, target.y) {
            self.place_at(target.x, target.y);
            return Placement::Exact;
        }
        match find_nearest_walkable(grid, target) {
            Some(found) => {
                self.place_at(found.x, found.y);
                Placement::Nearest(found)
            }
            None => {
                self.place_at(target.x, target.y);
                Placement::Fallback
            }
        }
    }

    /// Travel is capped at `width + height` tiles per tick so an open
    /// wrapping row always terminates.
    pub fn tick(&mut self, grid: &TileGrid, dt_secs: f64) {
        self.try_commit_queued(grid);
        if !dt_secs.is_finite() || dt_secs <= 0.0 {
            return;
        }
        let max_travel = f64::from(grid.width() + grid.height());
        let mut budget = (self.speed * dt_secs).min(max_travel);

        while budget > 0.0 && self.dir != Direction::None {
            if !grid.can_step(self.tile_x, self.tile_y, self.dir) {
                self.off_x = 0.0;
                self.off_y = 0.0;
                self.dir = Direction::None;
                break;
            }

            let travelled = self.off_x.abs() + self.off_y.abs();
            let to_center = 1.0 - travelled;
            if budget < to_center {
                let (dx, dy) = self.dir.delta();
                self.off_x += dx as f64 * budget;
                self.off_y += dy as f64 * budget;
                break;
            }

            budget -= to_center;
            let (nx, ny) = grid.neighbor(self.tile_x, self.tile_y, self.dir);
            self.tile_x = nx;
            self.tile_y = ny;
            self.off_x = 0.0;
            self.off_y = 0.0;
            self.try_commit_queued(grid);
        }
    }

    fn try_commit_queued(&mut self, grid: &TileGrid) {
        if self.queued == Direction::None || !self.is_center_aligned() {
            return;
        }
        if grid.can_step(self.tile_x, self.tile_y, self.queued) {
            self.dir = self.queued;
        }
    }
}

fn sanitize_speed(speed: f64) -> f64 {
    if speed.is_finite() {
        speed.max(0.0)
    } else {
        0.0
    }
}

/// Breadth-first ring search around `target`, visiting neighbors in
/// up, down, left, right order so each ring is a Manhattan distance band.
/// Walls do not stop the search; only grid bounds do.
pub fn find_nearest_walkable(grid: &TileGrid, target: Vec2) -> Option<Vec2> {
    let start = Vec2::new(
        target.x.clamp(0, grid.width() - 1),
        target.y.clamp(0, grid.height() - 1),
    );
    let mut seen = HashSet::new();
    let mut queue = VecDeque::new();
    seen.insert(start);
    queue.push_back(start);

    while let Some(cell) = queue.pop_front() {
        if grid.is_walkable(cell.x, cell.y) {
            return Some(cell);
        }
        for dir in Direction::CARDINALS {
            let (dx, dy) = dir.delta();
            let next = Vec2::new(cell.x + dx, cell.y + dy);
            if next.x < 0 || next.y < 0 || next.x >= grid.width() || next.y >= grid.height() {
                continue;
            }
            if seen.insert(next) {
                queue.push_back(next);
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_grid(cols: usize, rows: usize) -> TileGrid {
        let text = vec![".".repeat(cols); rows].join("\n");
        TileGrid::parse_text(&text).expect("valid level")
    }

    /// Open field with a wall at (3, 2).
    fn grid_with_wall(cols: usize, rows: usize) -> TileGrid {
        let mut grid = open_grid(cols, rows);
        grid.set_tile(3, 2, crate::types::TileKind::Wall);
        grid
    }

    fn assert_offsets_bounded(motion: &MotionController) {
        let (ox, oy) = motion.offsets();
        assert!(ox.abs() < 1.0, "offX out of bounds: {ox}");
        assert!(oy.abs() < 1.0, "offY out of bounds: {oy}");
        assert!(ox == 0.0 || oy == 0.0, "diagonal offset: ({ox}, {oy})");
    }

    #[test]
    fn blocked_request_keeps_position_then_reverse_turn_moves() {
        let grid = grid_with_wall(6, 5);
        let mut motion = MotionController::new(1.0);
        motion.place_at(2, 2);
        motion.request(Direction::Right);
        motion.tick(&grid, 1.0);
        assert_eq!(motion.tile(), Vec2::new(2, 2));
        assert_eq!(motion.direction(), Direction::None);

        motion.request(Direction::Left);
        motion.tick(&grid, 1.0);
        assert_eq!(motion.tile(), Vec2::new(1, 2));
    }

    #[test]
    fn turn_commits_only_at_center() {
        let grid = open_grid(10, 5);
        let mut motion = MotionController::new(2.0);
        motion.place_at(2, 2);
        motion.request(Direction::Right);
        motion.tick(&grid, 0.25);
        assert_eq!(motion.direction(), Direction::Right);
        assert_eq!(motion.tile(), Vec2::new(2, 2));

        motion.request(Direction::Up);
        motion.tick(&grid, 0.125);
        assert_eq!(motion.direction(), Direction::Right);
        assert_eq!(motion.queued(), Direction::Up);
        assert_offsets_bounded(&motion);

        motion.tick(&grid, 0.125);
        assert_eq!(motion.tile(), Vec2::new(3, 2));
        assert!(motion.is_center_aligned());
        assert_eq!(motion.direction(), Direction::Up);
    }

    #[test]
    fn queued_turn_waits_until_side_tile_opens() {
        let mut grid = open_grid(6, 3);
        for col in 0..6 {
            grid.set_tile(col, 0, crate::types::TileKind::Wall);
        }
        grid.set_tile(3, 0, crate::types::TileKind::Empty);
        let mut motion = MotionController::new(1.0);
        motion.place_at(1, 1);
        motion.request(Direction::Up);
        motion.tick(&grid, 1.0);
        assert_eq!(motion.tile(), Vec2::new(1, 1));
        assert_eq!(motion.direction(), Direction::None);

        motion.request(Direction::Right);
        motion.tick(&grid, 0.0);
        assert_eq!(motion.direction(), Direction::Right);
        motion.request(Direction::Up);
        motion.tick(&grid, 1.0);
        assert_eq!(motion.tile(), Vec2::new(2, 1));
        assert_eq!(motion.direction(), Direction::Right);
        motion.tick(&grid, 1.0);
        assert_eq!(motion.tile(), Vec2::new(3, 1));
        assert_eq!(motion.direction(), Direction::Up);
        motion.tick(&grid, 1.0);
        assert_eq!(motion.tile(), Vec2::new(3, 0));
    }

    #[test]
    fn half_tile_steps_complete_a_crossing() {
        let grid = grid_with_wall(10, 5);
        let mut motion = MotionController::new(2.0);
        motion.place_at(2, 2);
        motion.request(Direction::Up);
        motion.tick(&grid, 0.25);
        assert_eq!(motion.tile(), Vec2::new(2, 2));
        assert!((motion.offsets().1 + 0.5).abs() < 1e-9);
        motion.tick(&grid, 0.25);
        assert_eq!(motion.tile(), Vec2::new(2, 1));
        assert!(motion.is_center_aligned());
    }

    #[test]
    fn one_second_ticks_advance_one_tile_each() {
        let grid = grid_with_wall(20, 3);
        let mut motion = MotionController::new(1.0);
        motion.place_at(1, 1);
        motion.request(Direction::Right);
        for step in 1..=5 {
            motion.tick(&grid, 1.0);
            assert_eq!(motion.tile(), Vec2::new(1 + step, 1));
            assert!(motion.is_center_aligned());
        }
    }

    #[test]
    fn frame_sized_ticks_accumulate_exactly() {
        let grid = open_grid(40, 3);
        let mut motion = MotionController::new(8.0);
        motion.place_at(0, 1);
        motion.request(Direction::Right);
        for _ in 0..60 {
            motion.tick(&grid, 1.0 / 60.0);
            assert_offsets_bounded(&motion);
        }
        assert!(motion.tile_x() == 8 || motion.tile_x() == 7);
        assert_eq!(motion.tile_y(), 1);
    }

    #[test]
    fn large_budget_crosses_many_tiles_and_stops_at_wall() {
        let grid = grid_with_wall(10, 5);
        let mut motion = MotionController::new(100.0);
        motion.place_at(0, 2);
        motion.request(Direction::Right);
        motion.tick(&grid, 1.0);
        assert_eq!(motion.tile(), Vec2::new(2, 2));
        assert_eq!(motion.direction(), Direction::None);
        assert!(motion.is_center_aligned());
    }

    #[test]
    fn huge_time_step_on_open_wrapping_row_terminates() {
        let grid = open_grid(5, 3);
        let mut motion = MotionController::new(1.0);
        motion.place_at(2, 1);
        motion.request(Direction::Right);
        motion.tick(&grid, 1e17);
        // Capped at 5 + 3 tiles: 2 + 8 wraps to column 0.
        assert_eq!(motion.tile(), Vec2::new(0, 1));
        assert_eq!(motion.direction(), Direction::Right);
        assert!(motion.is_center_aligned());

        motion.tick(&grid, f64::INFINITY);
        motion.tick(&grid, f64::NAN);
        assert_eq!(motion.tile(), Vec2::new(0, 1));
        assert_offsets_bounded(&motion);
    }

    #[test]
    fn wall_ahead_never_moves_agent() {
        let grid = grid_with_wall(6, 5);
        for dt in [0.001, 0.5, 1.0, 3.0, 100.0] {
            let mut motion = MotionController::new(4.0);
            motion.place_at(3, 1);
            motion.request(Direction::Down);
            motion.tick(&grid, dt);
            assert_eq!(motion.tile(), Vec2::new(3, 1));
            assert_offsets_bounded(&motion);
        }
    }

    #[test]
    fn horizontal_wrap_crosses_tunnel_but_vertical_edges_block() {
        let grid = open_grid(5, 3);
        let mut motion = MotionController::new(1.0);
        motion.place_at(4, 1);
        motion.request(Direction::Right);
        motion.tick(&grid, 1.0);
        assert_eq!(motion.tile(), Vec2::new(0, 1));
        motion.request(Direction::Left);
        motion.tick(&grid, 2.0);
        assert_eq!(motion.tile(), Vec2::new(3, 1));

        motion.request(Direction::Up);
        motion.tick(&grid, 5.0);
        assert_eq!(motion.tile(), Vec2::new(3, 0));
        assert_eq!(motion.direction(), Direction::None);
    }

    #[test]
    fn zero_or_negative_time_does_not_move() {
        let grid = open_grid(5, 5);
        let mut motion = MotionController::new(3.0);
        motion.place_at(2, 2);
        motion.request(Direction::Left);
        motion.tick(&grid, 0.0);
        motion.tick(&grid, -1.0);
        assert_eq!(motion.tile(), Vec2::new(2, 2));
        assert!(motion.is_center_aligned());
    }

    #[test]
    fn nearest_walkable_prefers_target_then_rings() {
        let grid = TileGrid::parse_text("#####\n#...#\n#####\n").expect("valid level");
        let mut motion = MotionController::new(1.0);
        assert_eq!(
            motion.place_at_nearest_walkable(&grid, Vec2::new(2, 1)),
            Placement::Exact
        );
        assert_eq!(
            motion.place_at_nearest_walkable(&grid, Vec2::new(2, 0)),
            Placement::Nearest(Vec2::new(2, 1))
        );
        assert_eq!(motion.tile(), Vec2::new(2, 1));
        assert_eq!(
            motion.place_at_nearest_walkable(&grid, Vec2::new(0, 0)),
            Placement::Nearest(Vec2::new(1, 1))
        );
    }

    #[test]
    fn nearest_walkable_scans_up_before_down() {
        let grid = TileGrid::parse_text(".\n#\n.\n").expect("valid level");
        assert_eq!(
            find_nearest_walkable(&grid, Vec2::new(0, 1)),
            Some(Vec2::new(0, 0))
        );
    }

    #[test]
    fn nearest_walkable_falls_back_to_requested_tile() {
        let grid = TileGrid::parse_text("###\n###\n").expect("valid level");
        let mut motion = MotionController::new(1.0);
        assert_eq!(
            motion.place_at_nearest_walkable(&grid, Vec2::new(1, 1)),
            Placement::Fallback
        );
        assert_eq!(motion.tile(), Vec2::new(1, 1));
    }

    #[test]
    fn out_of_bounds_target_searches_from_nearest_edge() {
        let grid = TileGrid::parse_text("#.#\n###\n").expect("valid level");
        assert_eq!(
            find_nearest_walkable(&grid, Vec2::new(-5, -5)),
            Some(Vec2::new(1, 0))
        );
    }
}
