use crate::constants::{PELLET_POINTS, POWER_PELLET_POINTS};
use crate::grid::TileGrid;
use crate::types::TileKind;

/// Consumes whatever pickup sits on the tile and returns its points.
/// Repeated calls on the same tile return 0.
pub fn eat_at(grid: &mut TileGrid, tile_x: i32, tile_y: i32) -> u32 {
    let points = match grid.tile(tile_x, tile_y) {
        Some(TileKind::Pellet) => PELLET_POINTS,
        Some(TileKind::PowerPellet) => POWER_PELLET_POINTS,
        _ => return 0,
    };
    grid.set_tile(tile_x, tile_y, TileKind::Empty);
    points
}
