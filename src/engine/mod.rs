use log::{debug, info, warn};

use crate::config::EngineConfig;
use crate::constants::get_ghost_slot_offset;
use crate::encounter::{resolve_encounter, Encounter};
use crate::ghost::Pursuer;
use crate::grid::TileGrid;
use crate::motion::{MotionController, Placement};
use crate::pickup::eat_at;
use crate::power::PowerModeTimer;
use crate::rng::{RandomSource, Rng};
use crate::session::{Score, Session};
use crate::types::{
    Direction, GhostMode, PlayerView, PowerView, RuntimeEvent, SessionState, Snapshot, TileKind,
    Vec2, WorldInit,
};
use crate::world::{to_world_init, Level};

mod autopilot;
mod utils;

/// One level of play: session, player, pursuers and the power timer, ticked
/// in a fixed order by [`GameEngine::step`].
#[derive(Clone, Debug)]
pub struct GameEngine<R = Rng> {
    pub config: EngineConfig,

    session: Session,
    player: MotionController,
    pursuers: Vec<Pursuer>,
    slots: Vec<Vec2>,
    timer: PowerModeTimer,
    score: Score,
    rng: R,
    events: Vec<RuntimeEvent>,

    tick_counter: u64,
    elapsed_secs: f64,
}

impl GameEngine<Rng> {
    pub fn new(level: Level, config: EngineConfig, seed: u32) -> Self {
        Self::with_rng(level, config, Rng::new(seed))
    }
}

impl<R: RandomSource> GameEngine<R> {
    pub fn with_rng(level: Level, config: EngineConfig, rng: R) -> Self {
        let config = config.normalized();
        let Level {
            grid,
            player_spawn,
            ghost_spawn,
        } = level;

        let slots: Vec<Vec2> = (0..config.ghost_count)
            .map(|idx| Vec2::new(ghost_spawn.x + get_ghost_slot_offset(idx), ghost_spawn.y))
            .collect();
        let pursuers = (0..config.ghost_count)
            .map(|idx| {
                let mode = if idx < config.chase_ghosts {
                    GhostMode::Chase
                } else {
                    GhostMode::Scatter
                };
                Pursuer::new(idx, config.ghost_speed, mode)
            })
            .collect();

        let mut engine = Self {
            player: MotionController::new(config.player_speed),
            session: Session::new(grid, player_spawn, ghost_spawn),
            pursuers,
            slots,
            timer: PowerModeTimer::new(),
            score: Score::default(),
            rng,
            events: Vec::new(),
            tick_counter: 0,
            elapsed_secs: 0.0,
            config,
        };
        engine.reset_positions();
        engine
    }

    pub fn state(&self) -> SessionState {
        self.session.state()
    }

    pub fn is_finished(&self) -> bool {
        matches!(self.state(), SessionState::GameOver | SessionState::Win)
    }

    pub fn lives(&self) -> u32 {
        self.session.lives()
    }

    pub fn score(&self) -> u32 {
        self.score.value()
    }

    pub fn grid(&self) -> &TileGrid {
        self.session.grid()
    }

    pub fn player(&self) -> &MotionController {
        &self.player
    }

    pub fn pursuers(&self) -> &[Pursuer] {
        &self.pursuers
    }

    pub fn timer(&self) -> &PowerModeTimer {
        &self.timer
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_counter
    }

    pub fn get_world_init(&self) -> WorldInit {
        to_world_init(
            self.session.grid(),
            self.session.player_spawn(),
            self.session.ghost_spawn(),
        )
    }

    pub fn request_direction(&mut self, dir: Direction) {
        self.player.request(dir);
    }

    /// MENU → PLAYING. Returns false from any other state.
    pub fn start(&mut self) -> bool {
        if !self.session.start() {
            return false;
        }
        self.begin_round();
        true
    }

    /// GAME_OVER → PLAYING with full lives. The score carries over.
    pub fn restart(&mut self) -> bool {
        if !self.session.restart() {
            return false;
        }
        self.begin_round();
        true
    }

    pub fn step(&mut self, dt_secs: f64) {
        if !self.session.is_playing() {
            return;
        }
        let dt_secs = if dt_secs.is_finite() { dt_secs.max(0.0) } else { 0.0 };
        self.tick_counter += 1;
        self.elapsed_secs += dt_secs;

        self.player.tick(self.session.grid(), dt_secs);
        self.update_pickups();

        if self.timer.tick(dt_secs, &mut self.pursuers) {
            debug!("power mode expired");
            self.events.push(RuntimeEvent::PowerEnded);
        }

        let target = self.player.tile();
        for pursuer in &mut self.pursuers {
            pursuer.set_target(target);
            pursuer.tick(self.session.grid(), dt_secs, &mut self.rng);
        }

        self.resolve_encounters();

        if self.session.is_playing() && self.session.grid().pickups_remaining() == 0 {
            self.session.win();
            info!(
                "level cleared: score={} lives={}",
                self.score.value(),
                self.session.lives()
            );
            self.events.push(RuntimeEvent::LevelCleared);
        }
    }

    pub fn build_snapshot(&mut self, include_events: bool) -> Snapshot {
        let (off_x, off_y) = self.player.offsets();
        Snapshot {
            tick: self.tick_counter,
            elapsed_ms: (self.elapsed_secs * 1000.0).round() as u64,
            state: self.session.state(),
            lives: self.session.lives(),
            score: self.score.value(),
            pickups_remaining: self.session.grid().pickups_remaining(),
            power: PowerView {
                active: self.timer.active(),
                seconds_left: self.timer.seconds_left(),
                next_eat_score: self.timer.next_eat_score(),
            },
            player: PlayerView {
                x: self.player.tile_x(),
                y: self.player.tile_y(),
                off_x,
                off_y,
                dir: self.player.direction(),
                queued: self.player.queued(),
            },
            ghosts: self.pursuers.iter().map(Pursuer::view).collect(),
            events: if include_events {
                std::mem::take(&mut self.events)
            } else {
                Vec::new()
            },
        }
    }

    fn begin_round(&mut self) {
        self.timer.cancel(&mut self.pursuers);
        self.reset_positions();
        info!(
            "session started: lives={} pickups={}",
            self.session.lives(),
            self.session.grid().pickups_remaining()
        );
        self.events.push(RuntimeEvent::SessionStarted);
    }

    fn update_pickups(&mut self) {
        let Vec2 { x, y } = self.player.tile();
        let was_power = self.session.grid().tile(x, y) == Some(TileKind::PowerPellet);
        let points = eat_at(self.session.grid_mut(), x, y);
        if points == 0 {
            return;
        }
        self.score.add(points);
        self.events.push(RuntimeEvent::PelletEaten { x, y, points });

        if was_power && self.timer.start(self.config.power_duration_secs, &mut self.pursuers) {
            debug!("power mode started at ({x}, {y})");
            self.events.push(RuntimeEvent::PowerStarted {
                duration_secs: self.config.power_duration_secs,
            });
        }
    }

    fn resolve_encounters(&mut self) {
        let power_was_active = self.timer.active();
        let Some(encounter) = resolve_encounter(
            &mut self.session,
            &mut self.player,
            &mut self.pursuers,
            &mut self.timer,
            &mut self.score,
            self.config.immobilize_secs,
        ) else {
            return;
        };

        if encounter.placement() == Placement::Fallback {
            warn!("no walkable tile for respawn, agent left at requested tile");
        }

        match encounter {
            Encounter::GhostEaten {
                ghost_id, points, ..
            } => {
                debug!("ghost {ghost_id} eaten for {points}");
                self.events.push(RuntimeEvent::GhostEaten { ghost_id, points });
            }
            Encounter::LifeLost { lives_left, .. } => {
                debug!("player caught, lives left {lives_left}");
                self.events.push(RuntimeEvent::LifeLost { lives_left });
                if power_was_active {
                    self.events.push(RuntimeEvent::PowerEnded);
                }
                if lives_left == 0 {
                    info!("game over: score={}", self.score.value());
                    self.events.push(RuntimeEvent::GameOver);
                } else {
                    self.reset_positions();
                }
            }
        }
    }

    fn reset_positions(&mut self) {
        let grid = self.session.grid();
        if self
            .player
            .place_at_nearest_walkable(grid, self.session.player_spawn())
            == Placement::Fallback
        {
            warn!(
                "player spawn {:?} has no walkable tile nearby",
                self.session.player_spawn()
            );
        }
        for (pursuer, slot) in self.pursuers.iter_mut().zip(&self.slots) {
            if pursuer.reset(grid, *slot) == Placement::Fallback {
                warn!("ghost {} slot {slot:?} has no walkable tile nearby", pursuer.id());
            }
        }
    }
}
