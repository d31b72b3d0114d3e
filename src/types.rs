use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
    None,
}

impl Direction {
    /// Evaluation order shared by pursuer AI and placement searches.
    pub const CARDINALS: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ];

    pub fn parse_move(value: &str) -> Option<Self> {
        match value {
            "up" => Some(Self::Up),
            "down" => Some(Self::Down),
            "left" => Some(Self::Left),
            "right" => Some(Self::Right),
            "none" => Some(Self::None),
            _ => None,
        }
    }

    pub fn delta(self) -> (i32, i32) {
        match self {
            Direction::Up => (0, -1),
            Direction::Down => (0, 1),
            Direction::Left => (-1, 0),
            Direction::Right => (1, 0),
            Direction::None => (0, 0),
        }
    }

    pub fn is_horizontal(self) -> bool {
        matches!(self, Direction::Left | Direction::Right)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TileKind {
    Wall,
    Empty,
    Pellet,
    PowerPellet,
    Gate,
}

impl TileKind {
    pub fn from_char(ch: char) -> Self {
        match ch {
            '#' => TileKind::Wall,
            '.' => TileKind::Pellet,
            'o' => TileKind::PowerPellet,
            'G' | 'g' => TileKind::Gate,
            _ => TileKind::Empty,
        }
    }

    pub fn to_char(self) -> char {
        match self {
            TileKind::Wall => '#',
            TileKind::Empty => ' ',
            TileKind::Pellet => '.',
            TileKind::PowerPellet => 'o',
            TileKind::Gate => 'G',
        }
    }

    pub fn is_walkable(self) -> bool {
        self != TileKind::Wall
    }

    pub fn is_pickup(self) -> bool {
        matches!(self, TileKind::Pellet | TileKind::PowerPellet)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GhostMode {
    Chase,
    Scatter,
    Frightened,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Menu,
    Playing,
    GameOver,
    Win,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: i32,
    pub y: i32,
}

impl Vec2 {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct WorldInit {
    pub width: i32,
    pub height: i32,
    pub tiles: Vec<String>,
    #[serde(rename = "playerSpawn")]
    pub player_spawn: Vec2,
    #[serde(rename = "ghostSpawn")]
    pub ghost_spawn: Vec2,
}

#[derive(Clone, Debug, Serialize)]
pub struct PlayerView {
    pub x: i32,
    pub y: i32,
    #[serde(rename = "offX")]
    pub off_x: f64,
    #[serde(rename = "offY")]
    pub off_y: f64,
    pub dir: Direction,
    pub queued: Direction,
}

#[derive(Clone, Debug, Serialize)]
pub struct GhostView {
    pub id: usize,
    pub x: i32,
    pub y: i32,
    #[serde(rename = "offX")]
    pub off_x: f64,
    #[serde(rename = "offY")]
    pub off_y: f64,
    pub dir: Direction,
    pub mode: GhostMode,
    #[serde(rename = "immobilizedSecs")]
    pub immobilized_secs: f64,
}

#[derive(Clone, Debug, Serialize)]
pub struct PowerView {
    pub active: bool,
    #[serde(rename = "secondsLeft")]
    pub seconds_left: f64,
    #[serde(rename = "nextEatScore")]
    pub next_eat_score: u32,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RuntimeEvent {
    SessionStarted,
    PelletEaten {
        x: i32,
        y: i32,
        points: u32,
    },
    PowerStarted {
        #[serde(rename = "durationSecs")]
        duration_secs: f64,
    },
    PowerEnded,
    GhostEaten {
        #[serde(rename = "ghostId")]
        ghost_id: usize,
        points: u32,
    },
    LifeLost {
        #[serde(rename = "livesLeft")]
        lives_left: u32,
    },
    GameOver,
    LevelCleared,
}

#[derive(Clone, Debug, Serialize)]
pub struct Snapshot {
    pub tick: u64,
    #[serde(rename = "elapsedMs")]
    pub elapsed_ms: u64,
    pub state: SessionState,
    pub lives: u32,
    pub score: u32,
    #[serde(rename = "pickupsRemaining")]
    pub pickups_remaining: usize,
    pub power: PowerView,
    pub player: PlayerView,
    pub ghosts: Vec<GhostView>,
    pub events: Vec<RuntimeEvent>,
}
