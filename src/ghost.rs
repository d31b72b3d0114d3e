use crate::constants::RANDOM_DIRECTION_ATTEMPTS;
use crate::grid::TileGrid;
use crate::motion::{MotionController, Placement};
use crate::rng::RandomSource;
use crate::types::{Direction, GhostMode, GhostView, Vec2};

/// One pursuer: a mode-driven decision layer on top of a [`MotionController`].
#[derive(Clone, Debug)]
pub struct Pursuer {
    id: usize,
    motion: MotionController,
    mode: GhostMode,
    initial_mode: GhostMode,
    target: Vec2,
    immobilized_secs: f64,
}

impl Pursuer {
    pub fn new(id: usize, speed: f64, initial_mode: GhostMode) -> Self {
        Self {
            id,
            motion: MotionController::new(speed),
            mode: initial_mode,
            initial_mode,
            target: Vec2::new(0, 0),
            immobilized_secs: 0.0,
        }
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn motion(&self) -> &MotionController {
        &self.motion
    }

    pub fn motion_mut(&mut self) -> &mut MotionController {
        &mut self.motion
    }

    pub fn tile(&self) -> Vec2 {
        self.motion.tile()
    }

    pub fn mode(&self) -> GhostMode {
        self.mode
    }

    pub fn initial_mode(&self) -> GhostMode {
        self.initial_mode
    }

    pub fn set_mode(&mut self, mode: GhostMode) {
        self.mode = mode;
    }

    pub fn target(&self) -> Vec2 {
        self.target
    }

    pub fn set_target(&mut self, target: Vec2) {
        self.target = target;
    }

    pub fn immobilized_secs(&self) -> f64 {
        self.immobilized_secs
    }

    pub fn is_immobilized(&self) -> bool {
        self.immobilized_secs > 0.0
    }

    pub fn immobilize(&mut self, secs: f64) {
        self.immobilized_secs = if secs.is_finite() { secs.max(0.0) } else { 0.0 };
    }

    /// Sends the pursuer home after being eaten: SCATTER, frozen for
    /// `immobilize_secs`.
    pub fn respawn(&mut self, grid: &TileGrid, spawn: Vec2, immobilize_secs: f64) -> Placement {
        let placement = self.motion.place_at_nearest_walkable(grid, spawn);
        self.mode = GhostMode::Scatter;
        self.immobilize(immobilize_secs);
        placement
    }

    /// Back to the spawn slot with the configured starting mode.
    pub fn reset(&mut self, grid: &TileGrid, slot: Vec2) -> Placement {
        let placement = self.motion.place_at_nearest_walkable(grid, slot);
        self.mode = self.initial_mode;
        self.immobilized_secs = 0.0;
        placement
    }

    pub fn tick<R: RandomSource + ?Sized>(&mut self, grid: &TileGrid, dt_secs: f64, rng: &mut R) {
        if self.is_immobilized() {
            self.immobilized_secs = (self.immobilized_secs - dt_secs.max(0.0)).max(0.0);
            return;
        }

        match self.mode {
            GhostMode::Chase => {
                let dir = choose_direction_toward(grid, self.motion.tile(), self.target);
                if dir != Direction::None {
                    self.motion.request(dir);
                }
            }
            GhostMode::Scatter => {
                if self.motion.direction() == Direction::None {
                    let dir = random_walkable_direction(grid, self.motion.tile(), rng);
                    if dir != Direction::None {
                        self.motion.request(dir);
                    }
                }
            }
            GhostMode::Frightened => {
                let dir = random_walkable_direction(grid, self.motion.tile(), rng);
                if dir != Direction::None {
                    self.motion.request(dir);
                }
            }
        }

        self.motion.tick(grid, dt_secs);
    }

    pub fn view(&self) -> GhostView {
        let (off_x, off_y) = self.motion.offsets();
        GhostView {
            id: self.id,
            x: self.motion.tile_x(),
            y: self.motion.tile_y(),
            off_x,
            off_y,
            dir: self.motion.direction(),
            mode: self.mode,
            immobilized_secs: self.immobilized_secs,
        }
    }
}

/// Walkable direction whose neighbor tile is closest (Euclidean) to
/// `target`. Ties keep the earlier direction in up, down, left, right order.
pub fn choose_direction_toward(grid: &TileGrid, from: Vec2, target: Vec2) -> Direction {
    let mut best = Direction::None;
    let mut best_dist = f64::INFINITY;
    for dir in Direction::CARDINALS {
        if !grid.can_step(from.x, from.y, dir) {
            continue;
        }
        let (nx, ny) = grid.neighbor(from.x, from.y, dir);
        let dist = f64::from(nx - target.x).hypot(f64::from(ny - target.y));
        if dist < best_dist {
            best_dist = dist;
            best = dir;
        }
    }
    best
}

pub fn random_walkable_direction<R: RandomSource + ?Sized>(
    grid: &TileGrid,
    from: Vec2,
    rng: &mut R,
) -> Direction {
    for _ in 0..RANDOM_DIRECTION_ATTEMPTS {
        let dir = Direction::CARDINALS[rng.pick_index(Direction::CARDINALS.len())];
        if grid.can_step(from.x, from.y, dir) {
            return dir;
        }
    }
    Direction::None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::Rng;

    /// Always returns the same fraction, pinning `pick_index`.
    struct FixedRandom(f32);

    impl RandomSource for FixedRandom {
        fn next_f32(&mut self) -> f32 {
            self.0
        }
    }

    fn open_grid(cols: usize, rows: usize) -> TileGrid {
        let text = vec![".".repeat(cols); rows].join("\n");
        TileGrid::parse_text(&text).expect("valid level")
    }

    #[test]
    fn chase_moves_toward_target() {
        let grid = open_grid(7, 7);
        assert_eq!(
            choose_direction_toward(&grid, Vec2::new(3, 3), Vec2::new(3, 0)),
            Direction::Up
        );
        assert_eq!(
            choose_direction_toward(&grid, Vec2::new(3, 3), Vec2::new(6, 3)),
            Direction::Right
        );
        assert_eq!(
            choose_direction_toward(&grid, Vec2::new(3, 3), Vec2::new(3, 6)),
            Direction::Down
        );
    }

    #[test]
    fn chase_ties_follow_evaluation_order() {
        let grid = open_grid(7, 7);
        // Up and Left are equally close to a diagonal target.
        assert_eq!(
            choose_direction_toward(&grid, Vec2::new(3, 3), Vec2::new(0, 0)),
            Direction::Up
        );
        // On the target: every neighbor is distance 1, Up wins.
        assert_eq!(
            choose_direction_toward(&grid, Vec2::new(3, 3), Vec2::new(3, 3)),
            Direction::Up
        );
    }

    #[test]
    fn chase_skips_walls_and_reports_none_when_boxed_in() {
        let grid = TileGrid::parse_text("#####\n#.#.#\n#####\n").expect("valid level");
        assert_eq!(
            choose_direction_toward(&grid, Vec2::new(1, 1), Vec2::new(3, 1)),
            Direction::None
        );

        let grid = TileGrid::parse_text("#####\n#...#\n#####\n").expect("valid level");
        assert_eq!(
            choose_direction_toward(&grid, Vec2::new(1, 1), Vec2::new(1, 0)),
            Direction::Right
        );
    }

    #[test]
    fn random_direction_respects_walls() {
        let grid = TileGrid::parse_text("#####\n#...#\n#####\n").expect("valid level");
        let mut rng = Rng::new(5);
        for _ in 0..100 {
            let dir = random_walkable_direction(&grid, Vec2::new(2, 1), &mut rng);
            assert!(matches!(dir, Direction::Left | Direction::Right));
        }
    }

    #[test]
    fn random_direction_gives_up_after_fixed_attempts() {
        let grid = TileGrid::parse_text("#####\n#.#.#\n#####\n").expect("valid level");
        let mut rng = Rng::new(1);
        assert_eq!(
            random_walkable_direction(&grid, Vec2::new(1, 1), &mut rng),
            Direction::None
        );
        // Fraction 0.0 always samples Up; with Up walled every attempt fails.
        let grid = TileGrid::parse_text("###\n...\n...\n").expect("valid level");
        assert_eq!(
            random_walkable_direction(&grid, Vec2::new(1, 1), &mut FixedRandom(0.0)),
            Direction::None
        );
    }

    #[test]
    fn scatter_only_picks_when_stopped() {
        let grid = open_grid(9, 9);
        let mut pursuer = Pursuer::new(0, 1.0, GhostMode::Scatter);
        pursuer.motion_mut().place_at(4, 4);
        // 0.9 samples Right.
        pursuer.tick(&grid, 0.25, &mut FixedRandom(0.9));
        assert_eq!(pursuer.motion().direction(), Direction::Right);

        // Already moving: the new sample (Up) is not requested.
        pursuer.tick(&grid, 0.25, &mut FixedRandom(0.0));
        assert_eq!(pursuer.motion().queued(), Direction::Right);
        assert_eq!(pursuer.motion().direction(), Direction::Right);
    }

    #[test]
    fn frightened_resamples_every_tick() {
        let grid = open_grid(9, 9);
        let mut pursuer = Pursuer::new(0, 1.0, GhostMode::Frightened);
        pursuer.motion_mut().place_at(4, 4);
        pursuer.tick(&grid, 0.25, &mut FixedRandom(0.9));
        assert_eq!(pursuer.motion().direction(), Direction::Right);

        pursuer.tick(&grid, 0.25, &mut FixedRandom(0.0));
        assert_eq!(pursuer.motion().queued(), Direction::Up);
    }

    #[test]
    fn chase_pursuer_closes_distance() {
        let grid = open_grid(9, 9);
        let mut pursuer = Pursuer::new(0, 1.0, GhostMode::Chase);
        pursuer.motion_mut().place_at(1, 4);
        pursuer.set_target(Vec2::new(4, 4));
        let mut rng = Rng::new(3);
        for _ in 0..3 {
            pursuer.tick(&grid, 1.0, &mut rng);
        }
        assert_eq!(pursuer.tile(), Vec2::new(4, 4));
    }

    #[test]
    fn immobilized_pursuer_counts_down_without_moving() {
        let grid = open_grid(5, 5);
        let mut pursuer = Pursuer::new(2, 4.0, GhostMode::Frightened);
        pursuer.motion_mut().place_at(2, 2);
        assert_eq!(
            pursuer.respawn(&grid, Vec2::new(0, 0), 5.0),
            Placement::Exact
        );
        assert_eq!(pursuer.mode(), GhostMode::Scatter);
        assert_eq!(pursuer.tile(), Vec2::new(0, 0));

        let mut rng = Rng::new(8);
        for _ in 0..4 {
            pursuer.tick(&grid, 1.0, &mut rng);
            assert_eq!(pursuer.tile(), Vec2::new(0, 0));
            assert_eq!(pursuer.motion().direction(), Direction::None);
        }
        assert!(pursuer.is_immobilized());
        pursuer.tick(&grid, 1.5, &mut rng);
        assert!(!pursuer.is_immobilized());
        assert_eq!(pursuer.immobilized_secs(), 0.0);

        pursuer.tick(&grid, 1.0, &mut FixedRandom(0.9));
        assert_eq!(pursuer.tile(), Vec2::new(4, 0));
    }

    #[test]
    fn oversized_time_step_returns_on_open_row() {
        let grid = open_grid(5, 3);
        let mut pursuer = Pursuer::new(0, 6.0, GhostMode::Frightened);
        pursuer.motion_mut().place_at(2, 1);
        pursuer.tick(&grid, 1e17, &mut FixedRandom(0.9));
        assert_eq!(pursuer.tile(), Vec2::new(0, 1));

        pursuer.tick(&grid, f64::INFINITY, &mut FixedRandom(0.9));
        assert_eq!(pursuer.tile(), Vec2::new(0, 1));
        assert!(pursuer.motion().is_center_aligned());
    }

    #[test]
    fn reset_restores_initial_mode() {
        let grid = open_grid(5, 5);
        let mut pursuer = Pursuer::new(0, 1.0, GhostMode::Chase);
        pursuer.set_mode(GhostMode::Frightened);
        pursuer.immobilize(3.0);
        pursuer.reset(&grid, Vec2::new(1, 1));
        assert_eq!(pursuer.mode(), GhostMode::Chase);
        assert!(!pursuer.is_immobilized());
        assert_eq!(pursuer.tile(), Vec2::new(1, 1));
    }
}
