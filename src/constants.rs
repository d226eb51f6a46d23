pub const TICK_RATE: u32 = 60;
pub const TICK_MS: u64 = 1000 / TICK_RATE as u64;

pub const BOARD_WIDTH: i32 = 28;
pub const BOARD_HEIGHT: i32 = 31;

pub const START_LIVES: i32 = 3;
pub const EXTRA_LIFE_SCORE: i32 = 10_000;

pub const DOT_POINTS: i32 = 10;
pub const POWER_PELLET_POINTS: i32 = 50;
pub const GHOST_BASE_POINTS: i32 = 200;
pub const GHOST_MAX_POINTS: i32 = 1_600;

pub const PLAYER_SPEED: f32 = 7.5;
pub const GHOST_BASE_SPEED: f32 = 7.0;
pub const GHOST_TUNNEL_SPEED: f32 = 3.5;
pub const GHOST_FRIGHTENED_SPEED: f32 = 4.5;
pub const GHOST_EATEN_SPEED: f32 = 14.0;
pub const GHOST_HOUSE_SPEED: f32 = 3.0;

/// Distance from a cell centre at which an actor counts as standing on a junction.
pub const CELL_CENTER_THRESHOLD: f32 = 0.05;
/// Player and pursuer hit-circles overlap below this centre distance.
pub const COLLISION_DISTANCE: f32 = 0.5;

pub const READY_DURATION_MS: u64 = 4_200;
pub const ROUND_READY_MS: u64 = 2_000;
pub const CAPTURE_PAUSE_MS: u64 = 1_500;
pub const GHOST_EATEN_PAUSE_MS: u64 = 1_000;
pub const LEVEL_CLEAR_PAUSE_MS: u64 = 2_000;
pub const BONUS_DISPLAY_MS: u64 = 2_000;

pub const FRUIT_DURATION_MS: u64 = 9_000;
pub const FRUIT_DURATION_PAD_MS: u64 = 1_000;
pub const FRUIT_SPAWN_THRESHOLDS: [i32; 2] = [70, 170];

pub const HIGH_SCORE_KEY: &str = "HighScore";
