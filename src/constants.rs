pub const TICK_RATE: u32 = 60;
pub const TICK_MS: u64 = 1000 / TICK_RATE as u64;
pub const TICK_SECS: f64 = 1.0 / TICK_RATE as f64;

pub const START_LIVES: u32 = 3;

pub const PLAYER_BASE_SPEED: f64 = 8.0;
pub const GHOST_BASE_SPEED: f64 = 6.0;
pub const DEFAULT_GHOST_COUNT: usize = 4;
pub const DEFAULT_CHASE_GHOSTS: usize = 1;

pub const POWER_DURATION_SECS: f64 = 8.0;
pub const RESPAWN_IMMOBILIZE_SECS: f64 = 5.0;

pub const PELLET_POINTS: u32 = 10;
pub const POWER_PELLET_POINTS: u32 = 50;

pub const RANDOM_DIRECTION_ATTEMPTS: usize = 10;

/// Classic arcade coordinates for the built-in maze.
pub const CLASSIC_PLAYER_SPAWN: (i32, i32) = (13, 23);
pub const CLASSIC_GHOST_SPAWN: (i32, i32) = (13, 14);

pub const FALLBACK_MAZE_COLS: i32 = 28;
pub const FALLBACK_MAZE_ROWS: i32 = 31;

pub fn get_eat_score(chain: u32) -> u32 {
    match chain {
        0 => 200,
        1 => 400,
        2 => 800,
        _ => 1600,
    }
}

/// Horizontal offsets used to spread pursuers around the shared spawn tile.
pub fn get_ghost_slot_offset(index: usize) -> i32 {
    let step = (index as i32 + 1) / 2;
    if index % 2 == 1 {
        -step
    } else {
        step
    }
}
