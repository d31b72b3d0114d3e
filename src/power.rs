use crate::constants::get_eat_score;
use crate::ghost::Pursuer;
use crate::types::GhostMode;

/// Power-pellet countdown plus the chain of pursuers eaten during it.
#[derive(Clone, Debug, Default)]
pub struct PowerModeTimer {
    remaining_secs: f64,
    chain: u32,
}

impl PowerModeTimer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns false when `duration_secs` is not positive and nothing changed.
    pub fn start(&mut self, duration_secs: f64, pursuers: &mut [Pursuer]) -> bool {
        if duration_secs.is_nan() || duration_secs <= 0.0 {
            return false;
        }
        self.remaining_secs = duration_secs;
        self.chain = 0;
        set_all(pursuers, GhostMode::Frightened);
        true
    }

    /// Returns true on the tick the power mode expires.
    pub fn tick(&mut self, dt_secs: f64, pursuers: &mut [Pursuer]) -> bool {
        if self.remaining_secs <= 0.0 {
            return false;
        }
        self.remaining_secs -= dt_secs.max(0.0);
        if self.remaining_secs > 0.0 {
            return false;
        }
        self.remaining_secs = 0.0;
        self.chain = 0;
        set_all(pursuers, GhostMode::Scatter);
        true
    }

    pub fn cancel(&mut self, pursuers: &mut [Pursuer]) {
        self.remaining_secs = 0.0;
        self.chain = 0;
        set_all(pursuers, GhostMode::Scatter);
    }

    pub fn active(&self) -> bool {
        self.remaining_secs > 0.0
    }

    pub fn seconds_left(&self) -> f64 {
        self.remaining_secs.max(0.0)
    }

    pub fn chain(&self) -> u32 {
        self.chain
    }

    pub fn next_eat_score(&self) -> u32 {
        get_eat_score(self.chain)
    }

    pub fn on_ghost_eaten(&mut self) {
        if self.active() {
            self.chain = self.chain.saturating_add(1);
        }
    }
}

fn set_all(pursuers: &mut [Pursuer], mode: GhostMode) {
    for pursuer in pursuers.iter_mut() {
        pursuer.set_mode(mode);
    }
}
