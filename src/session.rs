use crate::constants::START_LIVES;
use crate::grid::{PickupLayout, TileGrid};
use crate::types::{SessionState, Vec2};

/// Lifecycle, lives and the level grid with its restore snapshot.
///
/// Transitions requested from the wrong state are ignored and reported as
/// `false`.
#[derive(Clone, Debug)]
pub struct Session {
    grid: TileGrid,
    layout: PickupLayout,
    state: SessionState,
    lives: u32,
    player_spawn: Vec2,
    ghost_spawn: Vec2,
}

impl Session {
    pub fn new(grid: TileGrid, player_spawn: Vec2, ghost_spawn: Vec2) -> Self {
        let layout = grid.pickup_layout();
        Self {
            grid,
            layout,
            state: SessionState::Menu,
            lives: START_LIVES,
            player_spawn,
            ghost_spawn,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_playing(&self) -> bool {
        self.state == SessionState::Playing
    }

    pub fn lives(&self) -> u32 {
        self.lives
    }

    pub fn player_spawn(&self) -> Vec2 {
        self.player_spawn
    }

    pub fn ghost_spawn(&self) -> Vec2 {
        self.ghost_spawn
    }

    pub fn grid(&self) -> &TileGrid {
        &self.grid
    }

    pub fn grid_mut(&mut self) -> &mut TileGrid {
        &mut self.grid
    }

    pub fn start(&mut self) -> bool {
        if self.state != SessionState::Menu {
            return false;
        }
        self.begin();
        true
    }

    /// Returns false unless PLAYING. On the last life the session ends with
    /// the grid as it was; otherwise pickups are restored.
    pub fn lose_life(&mut self) -> bool {
        if self.state != SessionState::Playing {
            return false;
        }
        self.lives = self.lives.saturating_sub(1);
        if self.lives == 0 {
            self.state = SessionState::GameOver;
        } else {
            self.grid.restore_pickups(&self.layout);
        }
        true
    }

    pub fn restart(&mut self) -> bool {
        if self.state != SessionState::GameOver {
            return false;
        }
        self.begin();
        true
    }

    pub fn win(&mut self) -> bool {
        if self.state != SessionState::Playing {
            return false;
        }
        self.state = SessionState::Win;
        true
    }

    fn begin(&mut self) {
        self.lives = START_LIVES;
        self.grid.restore_pickups(&self.layout);
        self.state = SessionState::Playing;
    }
}

/// Points accumulated over the whole run; never decreases.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Score(u32);

impl Score {
    pub fn add(&mut self, points: u32) {
        self.0 = self.0.saturating_add(points);
    }

    pub fn value(&self) -> u32 {
        self.0
    }
}
