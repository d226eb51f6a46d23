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
    /// Clockwise order starting from `Up`; the rotation helpers cycle over it.
    pub const CARDINALS: [Direction; 4] = [
        Direction::Up,
        Direction::Right,
        Direction::Down,
        Direction::Left,
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

    /// 90° counter-clockwise turn.
    pub fn left_of(self) -> Self {
        match self {
            Self::Up => Self::Left,
            Self::Left => Self::Down,
            Self::Down => Self::Right,
            Self::Right => Self::Up,
            Self::None => panic!("cannot rotate Direction::None to the left"),
        }
    }

    /// 90° clockwise turn.
    pub fn right_of(self) -> Self {
        match self {
            Self::Up => Self::Right,
            Self::Right => Self::Down,
            Self::Down => Self::Left,
            Self::Left => Self::Up,
            Self::None => panic!("cannot rotate Direction::None to the right"),
        }
    }

    pub fn opposite_of(self) -> Self {
        match self {
            Self::Up => Self::Down,
            Self::Down => Self::Up,
            Self::Left => Self::Right,
            Self::Right => Self::Left,
            Self::None => panic!("Direction::None has no opposite"),
        }
    }

    /// Unit step in cell space; `y` grows downward.
    pub fn delta(self) -> (i32, i32) {
        match self {
            Self::Up => (0, -1),
            Self::Down => (0, 1),
            Self::Left => (-1, 0),
            Self::Right => (1, 0),
            Self::None => (0, 0),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct Cell {
    pub x: i32,
    pub y: i32,
}

impl Cell {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn offset(self, dir: Direction) -> Self {
        let (dx, dy) = dir.delta();
        Self::new(self.x + dx, self.y + dy)
    }

    pub fn offset_by(self, dir: Direction, cells: i32) -> Self {
        let (dx, dy) = dir.delta();
        Self::new(self.x + dx * cells, self.y + dy * cells)
    }

    /// Straight-line distance between cell coordinates.
    pub fn distance(self, other: Cell) -> f32 {
        let dx = (self.x - other.x) as f32;
        let dy = (self.y - other.y) as f32;
        (dx * dx + dy * dy).sqrt()
    }

    pub fn center(self) -> Position {
        Position::new(self.x as f32 + 0.5, self.y as f32 + 0.5)
    }
}

/// World position measured in cells.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

impl Position {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn cell(self) -> Cell {
        Cell::new(self.x.floor() as i32, self.y.floor() as i32)
    }

    pub fn distance(self, other: Position) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }

    pub fn translate(self, dir: Direction, amount: f32) -> Self {
        let (dx, dy) = dir.delta();
        Self::new(self.x + dx as f32 * amount, self.y + dy as f32 * amount)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    Scatter,
    Chase,
    Frightened,
    Eaten,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GhostId {
    Blinky,
    Pinky,
    Inky,
    Clyde,
}

impl GhostId {
    pub const ALL: [GhostId; 4] = [
        GhostId::Blinky,
        GhostId::Pinky,
        GhostId::Inky,
        GhostId::Clyde,
    ];

    pub fn index(self) -> usize {
        match self {
            Self::Blinky => 0,
            Self::Pinky => 1,
            Self::Inky => 2,
            Self::Clyde => 3,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Blinky => "blinky",
            Self::Pinky => "pinky",
            Self::Inky => "inky",
            Self::Clyde => "clyde",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PickupKind {
    Dot,
    PowerPellet,
}

impl PickupKind {
    pub fn points(self) -> i32 {
        match self {
            Self::Dot => crate::constants::DOT_POINTS,
            Self::PowerPellet => crate::constants::POWER_PELLET_POINTS,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TileKind {
    Wall,
    Empty,
    Pickup(PickupKind),
    LeftWarp,
    RightWarp,
}

impl TileKind {
    pub fn symbol(self) -> char {
        match self {
            Self::Wall => '#',
            Self::Empty => ' ',
            Self::Pickup(PickupKind::Dot) => '.',
            Self::Pickup(PickupKind::PowerPellet) => 'o',
            Self::LeftWarp => '<',
            Self::RightWarp => '>',
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FruitKind {
    Cherry,
    Strawberry,
    Orange,
    Apple,
    Melon,
    Galaxian,
    Bell,
    Key,
}

impl FruitKind {
    pub fn for_level(level: u32) -> Self {
        match level {
            0 => Self::Cherry,
            1 => Self::Strawberry,
            2 | 3 => Self::Orange,
            4 | 5 => Self::Apple,
            6 | 7 => Self::Melon,
            8 | 9 => Self::Galaxian,
            10 | 11 => Self::Bell,
            _ => Self::Key,
        }
    }

    pub fn points(self) -> i32 {
        match self {
            Self::Cherry => 100,
            Self::Strawberry => 300,
            Self::Orange => 500,
            Self::Apple => 700,
            Self::Melon => 1_000,
            Self::Galaxian => 2_000,
            Self::Bell => 3_000,
            Self::Key => 5_000,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AudioCue {
    ChompA,
    ChompB,
    FruitEaten,
    GhostEaten,
    ExtraLife,
    PowerLoopStart,
    PowerLoopStop,
    PlayerCaptured,
    GameStart,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GhostStage {
    Spawning,
    Exiting,
    Roaming,
    Entering,
}

#[derive(Clone, Debug, Serialize)]
pub struct BoardInit {
    pub width: i32,
    pub height: i32,
    pub tiles: Vec<String>,
}

#[derive(Clone, Debug, Serialize)]
pub struct PlayerView {
    pub x: f32,
    pub y: f32,
    pub dir: Direction,
    pub moving: bool,
}

#[derive(Clone, Debug, Serialize)]
pub struct GhostView {
    pub id: GhostId,
    pub x: f32,
    pub y: f32,
    pub dir: Direction,
    pub strategy: Strategy,
    pub stage: GhostStage,
}

#[derive(Clone, Debug, Serialize)]
pub struct FruitView {
    pub kind: FruitKind,
    pub x: f32,
    pub y: f32,
    #[serde(rename = "remainingMs")]
    pub remaining_ms: u64,
}

#[derive(Clone, Debug, Serialize)]
pub struct PowerView {
    pub active: bool,
    #[serde(rename = "remainingMs")]
    pub remaining_ms: u64,
    #[serde(rename = "ghostsEaten")]
    pub ghosts_eaten: u32,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RuntimeEvent {
    TileChanged {
        x: i32,
        y: i32,
        kind: TileKind,
    },
    PickupConsumed {
        x: i32,
        y: i32,
        kind: PickupKind,
        points: i32,
    },
    PowerPhaseStarted {
        #[serde(rename = "durationMs")]
        duration_ms: u64,
    },
    PowerPhaseEnded,
    StrategyChanged {
        strategy: Strategy,
        phase: u32,
    },
    GhostEaten {
        ghost: GhostId,
        points: i32,
    },
    PlayerCaptured {
        ghost: GhostId,
        #[serde(rename = "livesLeft")]
        lives_left: i32,
    },
    FruitSpawned {
        fruit: FruitKind,
    },
    FruitEaten {
        fruit: FruitKind,
        points: i32,
    },
    FruitExpired,
    BonusPoints {
        value: i32,
        x: f32,
        y: f32,
        #[serde(rename = "durationMs")]
        duration_ms: u64,
    },
    ExtraLife {
        lives: i32,
    },
    LevelStarted {
        level: u32,
    },
    LevelCleared {
        level: u32,
    },
    GameOver {
        score: i32,
    },
    Sound {
        cue: AudioCue,
    },
}

#[derive(Clone, Debug, Serialize)]
pub struct Snapshot {
    pub tick: u64,
    #[serde(rename = "elapsedMs")]
    pub elapsed_ms: u64,
    pub level: u32,
    pub score: i32,
    #[serde(rename = "highScore")]
    pub high_score: i32,
    pub lives: i32,
    pub ready: bool,
    pub paused: bool,
    #[serde(rename = "gameOver")]
    pub game_over: bool,
    #[serde(rename = "levelStrategy")]
    pub level_strategy: Strategy,
    pub power: PowerView,
    #[serde(rename = "pickupsRemaining")]
    pub pickups_remaining: i32,
    pub player: PlayerView,
    pub ghosts: Vec<GhostView>,
    pub fruit: Option<FruitView>,
    pub events: Vec<RuntimeEvent>,
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct GameSummary {
    pub score: i32,
    #[serde(rename = "highScore")]
    pub high_score: i32,
    pub level: u32,
    #[serde(rename = "elapsedMs")]
    pub elapsed_ms: u64,
    #[serde(rename = "pickupsEaten")]
    pub pickups_eaten: i32,
    #[serde(rename = "ghostsEaten")]
    pub ghosts_eaten: i32,
    #[serde(rename = "fruitsEaten")]
    pub fruits_eaten: i32,
    #[serde(rename = "livesLost")]
    pub lives_lost: i32,
    #[serde(rename = "gameOver")]
    pub game_over: bool,
}

#[derive(Clone, Debug, Serialize)]
pub struct HighScoreView {
    pub score: i32,
    #[serde(rename = "updatedAt")]
    pub updated_at: Option<String>,
    #[serde(rename = "generatedAt")]
    pub generated_at: String,
}
