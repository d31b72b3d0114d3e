use std::collections::{HashSet, VecDeque};
use std::path::Path;

use log::warn;

use crate::constants::{
    CLASSIC_GHOST_SPAWN, CLASSIC_PLAYER_SPAWN, FALLBACK_MAZE_COLS, FALLBACK_MAZE_ROWS,
};
use crate::error::InvalidLevelError;
use crate::grid::TileGrid;
use crate::types::{Direction, TileKind, Vec2, WorldInit};

const CLASSIC_MAZE: &str = include_str!("../levels/classic.txt");
const MIN_FALLBACK_SIDE: i32 = 5;

/// A loaded level: the tile grid plus the two spawn tiles.
#[derive(Clone, Debug)]
pub struct Level {
    pub grid: TileGrid,
    pub player_spawn: Vec2,
    pub ghost_spawn: Vec2,
}

impl Level {
    pub fn classic() -> Result<Self, InvalidLevelError> {
        Ok(Self::with_classic_spawns(TileGrid::parse_text(CLASSIC_MAZE)?))
    }

    /// Text level with the classic spawn tiles; the engine snaps them onto
    /// the nearest walkable tile when the layout differs.
    pub fn from_text_file(path: &Path) -> Result<Self, InvalidLevelError> {
        Ok(Self::with_classic_spawns(TileGrid::load_text_file(path)?))
    }

    pub fn fallback(cols: i32, rows: i32) -> Self {
        let grid = generate_fallback_maze(cols, rows);
        let max_col = grid.width() - 2;
        let max_row = grid.height() - 2;
        let clamp = |(x, y): (i32, i32)| Vec2::new(x.clamp(1, max_col), y.clamp(1, max_row));
        Self {
            player_spawn: clamp(CLASSIC_PLAYER_SPAWN),
            ghost_spawn: clamp(CLASSIC_GHOST_SPAWN),
            grid,
        }
    }

    fn with_classic_spawns(grid: TileGrid) -> Self {
        Self {
            grid,
            player_spawn: Vec2::new(CLASSIC_PLAYER_SPAWN.0, CLASSIC_PLAYER_SPAWN.1),
            ghost_spawn: Vec2::new(CLASSIC_GHOST_SPAWN.0, CLASSIC_GHOST_SPAWN.1),
        }
    }
}

/// Loads `path`, or the built-in classic maze when no path is given. Any
/// load failure is logged and replaced by the procedural fallback.
pub fn load_level(path: Option<&Path>) -> Level {
    let loaded = match path {
        Some(path) => Level::from_text_file(path),
        None => Level::classic(),
    };
    match loaded {
        Ok(level) => level,
        Err(err) => {
            warn!("level load failed, using procedural maze: {err}");
            Level::fallback(FALLBACK_MAZE_COLS, FALLBACK_MAZE_ROWS)
        }
    }
}

/// Border walls, pellets everywhere inside, a three-tile gate across the
/// middle row and a power pellet in each inner corner.
pub fn generate_fallback_maze(cols: i32, rows: i32) -> TileGrid {
    let cols = cols.max(MIN_FALLBACK_SIDE);
    let rows = rows.max(MIN_FALLBACK_SIDE);
    let mut grid = TileGrid::filled(cols, rows, TileKind::Pellet);

    for col in 0..cols {
        grid.set_tile(col, 0, TileKind::Wall);
        grid.set_tile(col, rows - 1, TileKind::Wall);
    }
    for row in 0..rows {
        grid.set_tile(0, row, TileKind::Wall);
        grid.set_tile(cols - 1, row, TileKind::Wall);
    }

    let mid_col = cols / 2;
    let mid_row = rows / 2;
    for col in (mid_col - 1)..=(mid_col + 1) {
        grid.set_tile(col, mid_row, TileKind::Gate);
    }

    for (col, row) in [(1, 1), (cols - 2, 1), (1, rows - 2), (cols - 2, rows - 2)] {
        grid.set_tile(col, row, TileKind::PowerPellet);
    }
    grid
}

pub fn to_world_init(grid: &TileGrid, player_spawn: Vec2, ghost_spawn: Vec2) -> WorldInit {
    WorldInit {
        width: grid.width(),
        height: grid.height(),
        tiles: grid.to_rows(),
        player_spawn,
        ghost_spawn,
    }
}

/// Every tile reachable from `start` by single steps, tunnels included.
pub fn reachable_tiles(grid: &TileGrid, start: Vec2) -> HashSet<Vec2> {
    let mut seen = HashSet::new();
    if !grid.is_walkable(start.x, start.y) {
        return seen;
    }
    let mut queue = VecDeque::new();
    seen.insert(start);
    queue.push_back(start);
    while let Some(cell) = queue.pop_front() {
        for dir in Direction::CARDINALS {
            if !grid.can_step(cell.x, cell.y, dir) {
                continue;
            }
            let (nx, ny) = grid.neighbor(cell.x, cell.y, dir);
            let next = Vec2::new(nx, ny);
            if seen.insert(next) {
                queue.push_back(next);
            }
        }
    }
    seen
}
