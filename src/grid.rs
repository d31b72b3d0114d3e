use std::path::Path;

use crate::error::InvalidLevelError;
use crate::types::{Direction, TileKind};

const RGBA_WALL: [u8; 4] = [0, 0, 255, 255];
const RGBA_PELLET: [u8; 4] = [255, 255, 0, 255];
const RGBA_POWER_PELLET: [u8; 4] = [255, 165, 0, 255];
const RGBA_GATE: [u8; 4] = [255, 0, 255, 255];

/// Walkability oracle plus the mutable pickup layer of one level.
///
/// Dimensions are fixed at construction; only pickup consumption and
/// [`TileGrid::restore_pickups`] change tiles afterwards.
#[derive(Clone, Debug, PartialEq)]
pub struct TileGrid {
    width: i32,
    height: i32,
    tiles: Vec<TileKind>,
}

/// Deep copy of every tile, taken when a level is loaded.
#[derive(Clone, Debug, PartialEq)]
pub struct PickupLayout {
    width: i32,
    height: i32,
    tiles: Vec<TileKind>,
}

impl TileGrid {
    pub fn from_rows(rows: Vec<Vec<TileKind>>) -> Result<Self, InvalidLevelError> {
        let expected = rows.first().map(Vec::len).unwrap_or(0);
        if expected == 0 {
            return Err(InvalidLevelError::Empty);
        }
        if let Some((row, found)) = rows
            .iter()
            .map(Vec::len)
            .enumerate()
            .find(|(_, len)| *len != expected)
        {
            return Err(InvalidLevelError::Jagged {
                row,
                expected,
                found,
            });
        }
        let height = rows.len() as i32;
        let tiles = rows.into_iter().flatten().collect();
        Ok(Self {
            width: expected as i32,
            height,
            tiles,
        })
    }

    /// Grid of one tile kind. Dimensions below 1 are raised to 1.
    pub fn filled(width: i32, height: i32, kind: TileKind) -> Self {
        let width = width.max(1);
        let height = height.max(1);
        Self {
            width,
            height,
            tiles: vec![kind; (width * height) as usize],
        }
    }

    /// Parses the text legend. Blank lines are skipped, the first line fixes
    /// the width, short lines are padded with EMPTY and extra columns dropped.
    pub fn parse_text(text: &str) -> Result<Self, InvalidLevelError> {
        let lines: Vec<&str> = text
            .lines()
            .map(|line| line.trim_end_matches('\r'))
            .filter(|line| !line.trim().is_empty())
            .collect();
        let width = lines.first().map(|line| line.chars().count()).unwrap_or(0);
        let rows: Vec<Vec<TileKind>> = lines
            .iter()
            .map(|line| {
                let mut row: Vec<TileKind> =
                    line.chars().take(width).map(TileKind::from_char).collect();
                row.resize(width, TileKind::Empty);
                row
            })
            .collect();
        Self::from_rows(rows)
    }

    pub fn load_text_file(path: &Path) -> Result<Self, InvalidLevelError> {
        let text = std::fs::read_to_string(path).map_err(|source| InvalidLevelError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse_text(&text)
    }

    /// Builds a grid from row-major RGBA pixels using the exact-match color
    /// legend; any other color is EMPTY.
    pub fn from_rgba(width: usize, height: usize, pixels: &[u8]) -> Result<Self, InvalidLevelError> {
        if width == 0 || height == 0 {
            return Err(InvalidLevelError::Empty);
        }
        let expected = width * height * 4;
        if pixels.len() != expected {
            return Err(InvalidLevelError::PixelBuffer {
                width,
                height,
                expected,
                found: pixels.len(),
            });
        }
        let rows: Vec<Vec<TileKind>> = pixels
            .chunks_exact(width * 4)
            .map(|row| row.chunks_exact(4).map(tile_from_rgba).collect())
            .collect();
        Self::from_rows(rows)
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    fn index(&self, col: i32, row: i32) -> Option<usize> {
        if col < 0 || row < 0 || col >= self.width || row >= self.height {
            return None;
        }
        Some((row * self.width + col) as usize)
    }

    pub fn tile(&self, col: i32, row: i32) -> Option<TileKind> {
        self.index(col, row).and_then(|idx| self.tiles.get(idx).copied())
    }

    pub fn set_tile(&mut self, col: i32, row: i32, kind: TileKind) -> bool {
        let Some(slot) = self.index(col, row).and_then(|idx| self.tiles.get_mut(idx)) else {
            return false;
        };
        *slot = kind;
        true
    }

    pub fn is_walkable(&self, col: i32, row: i32) -> bool {
        self.tile(col, row).map(TileKind::is_walkable).unwrap_or(false)
    }

    pub fn wrap_col(&self, col: i32) -> i32 {
        col.rem_euclid(self.width)
    }

    /// Tile reached by one step in `dir`. Columns wrap around the grid
    /// edges, rows do not.
    pub fn neighbor(&self, col: i32, row: i32, dir: Direction) -> (i32, i32) {
        let (dx, dy) = dir.delta();
        (self.wrap_col(col + dx), row + dy)
    }

    pub fn can_step(&self, col: i32, row: i32, dir: Direction) -> bool {
        if dir == Direction::None {
            return false;
        }
        let (nx, ny) = self.neighbor(col, row, dir);
        self.is_walkable(nx, ny)
    }

    pub fn pickups_remaining(&self) -> usize {
        self.tiles.iter().filter(|tile| tile.is_pickup()).count()
    }

    pub fn pickup_positions(&self) -> impl Iterator<Item = (i32, i32)> + '_ {
        self.tiles
            .iter()
            .enumerate()
            .filter(|(_, tile)| tile.is_pickup())
            .map(|(idx, _)| {
                let idx = idx as i32;
                (idx % self.width, idx / self.width)
            })
    }

    pub fn pickup_layout(&self) -> PickupLayout {
        PickupLayout {
            width: self.width,
            height: self.height,
            tiles: self.tiles.clone(),
        }
    }

    /// Copies the snapshot back. Snapshots from a grid of other dimensions
    /// are ignored.
    pub fn restore_pickups(&mut self, layout: &PickupLayout) -> bool {
        if layout.width != self.width || layout.height != self.height {
            return false;
        }
        self.tiles.clone_from(&layout.tiles);
        true
    }

    pub fn to_rows(&self) -> Vec<String> {
        self.tiles
            .chunks(self.width as usize)
            .map(|row| row.iter().map(|tile| tile.to_char()).collect())
            .collect()
    }
}

impl PickupLayout {
    pub fn pickup_count(&self) -> usize {
        self.tiles.iter().filter(|tile| tile.is_pickup()).count()
    }
}

fn tile_from_rgba(pixel: &[u8]) -> TileKind {
    if pixel == &RGBA_WALL[..] {
        TileKind::Wall
    } else if pixel == &RGBA_PELLET[..] {
        TileKind::Pellet
    } else if pixel == &RGBA_POWER_PELLET[..] {
        TileKind::PowerPellet
    } else if pixel == &RGBA_GATE[..] {
        TileKind::Gate
    } else {
        TileKind::Empty
    }
}
