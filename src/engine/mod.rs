use tracing::{debug, info};

use crate::constants::{
    BONUS_DISPLAY_MS, CAPTURE_PAUSE_MS, COLLISION_DISTANCE, EXTRA_LIFE_SCORE,
    GHOST_EATEN_PAUSE_MS, LEVEL_CLEAR_PAUSE_MS, READY_DURATION_MS, ROUND_READY_MS, START_LIVES,
    TICK_MS,
};
use crate::ghost::Ghost;
use crate::grid::{LayoutError, TileGrid};
use crate::rng::Rng;
use crate::schedule::{
    cruise_threshold, fright_duration_ms, PhaseScheduler, PowerActivation, PowerPhase,
};
use crate::types::{
    AudioCue, BoardInit, Direction, GameSummary, GhostId, Position, PowerView, RuntimeEvent,
    Snapshot, Strategy,
};

mod autopilot;
mod ghost_system;
mod player_system;
mod utils;

use self::player_system::{Fruit, Player};

/// What happens when a pause window runs out.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PauseCompletion {
    Resume,
    /// End of a "ready" countdown.
    BeginRound,
    LoseLife,
    AdvanceLevel,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PauseWindow {
    pub remaining_ms: u64,
    pub completion: PauseCompletion,
}

#[derive(Clone, Debug)]
pub struct GameEngineOptions {
    pub seed: u32,
    pub start_level: u32,
    pub lives: i32,
    /// Persisted best score handed in by the caller.
    pub high_score: i32,
    /// Length of the opening jingle; the first round waits this long.
    pub ready_ms: u64,
    /// ASCII rows replacing the classic maze.
    pub layout: Option<Vec<String>>,
    pub player_start: Position,
}

impl Default for GameEngineOptions {
    fn default() -> Self {
        Self {
            seed: 1,
            start_level: 0,
            lives: START_LIVES,
            high_score: 0,
            ready_ms: READY_DURATION_MS,
            layout: None,
            player_start: Position::new(14.0, 23.5),
        }
    }
}

#[derive(Clone, Debug, Default)]
struct RunStats {
    pickups: i32,
    ghosts: i32,
    fruits: i32,
    lives_lost: i32,
}

#[derive(Clone, Debug)]
pub struct GameEngine {
    pub options: GameEngineOptions,

    grid: TileGrid,
    player: Player,
    ghosts: Vec<Ghost>,
    scheduler: PhaseScheduler,
    power: PowerPhase,
    fruit: Option<Fruit>,
    pause: Option<PauseWindow>,
    rng: Rng,
    events: Vec<RuntimeEvent>,
    stats: RunStats,

    level: u32,
    score: i32,
    high_score: i32,
    lives: i32,
    extra_life_awarded: bool,
    level_pickups_eaten: i32,
    chomp_toggle: bool,
    game_over: bool,
    elapsed_ms: u64,
    tick_counter: u64,
}

impl GameEngine {
    pub fn new(options: GameEngineOptions) -> Result<Self, LayoutError> {
        let grid = match &options.layout {
            Some(rows) => TileGrid::parse(rows.as_slice())?,
            None => TileGrid::classic(),
        };
        let start = options.player_start;
        let cell = start.cell();
        if !start.x.is_finite()
            || !start.y.is_finite()
            || !grid.contains(cell)
            || grid.tile_at(cell).is_wall()
        {
            return Err(LayoutError::BlockedStart {
                x: cell.x,
                y: cell.y,
            });
        }
        Ok(Self::with_grid(grid, options))
    }

    fn with_grid(grid: TileGrid, options: GameEngineOptions) -> Self {
        let level = options.start_level;
        let scheduler = PhaseScheduler::new(level);
        let ghosts = GhostId::ALL
            .iter()
            .map(|id| Ghost::new(*id, &grid, options.seed))
            .collect();

        let mut engine = Self {
            grid,
            player: Player::new(options.player_start),
            ghosts,
            scheduler,
            power: PowerPhase::default(),
            fruit: None,
            pause: None,
            rng: Rng::new(options.seed),
            events: Vec::new(),
            stats: RunStats::default(),
            level,
            score: 0,
            high_score: options.high_score.max(0),
            lives: options.lives,
            extra_life_awarded: false,
            level_pickups_eaten: 0,
            chomp_toggle: false,
            game_over: false,
            elapsed_ms: 0,
            tick_counter: 0,
            options,
        };
        engine.reset_actors();
        engine.events.push(RuntimeEvent::LevelStarted { level });
        engine.events.push(RuntimeEvent::Sound {
            cue: AudioCue::GameStart,
        });
        engine.begin_round(engine.options.ready_ms);
        info!(level, seed = engine.options.seed, "game started");
        engine
    }

    /// Starts over from the configured level with fresh score and lives.
    pub fn reset_game(&mut self) {
        let mut options = self.options.clone();
        options.high_score = self.high_score;
        let mut grid = self.grid.clone();
        grid.reset();
        *self = Self::with_grid(grid, options);
    }

    pub fn is_ended(&self) -> bool {
        self.game_over
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn score(&self) -> i32 {
        self.score
    }

    pub fn high_score(&self) -> i32 {
        self.high_score
    }

    pub fn lives(&self) -> i32 {
        self.lives
    }

    pub fn grid(&self) -> &TileGrid {
        &self.grid
    }

    pub fn ghost(&self, id: GhostId) -> &Ghost {
        &self.ghosts[id.index()]
    }

    pub fn pause(&self) -> Option<PauseWindow> {
        self.pause
    }

    pub fn is_ready(&self) -> bool {
        matches!(
            self.pause,
            Some(PauseWindow {
                completion: PauseCompletion::BeginRound,
                ..
            })
        )
    }

    pub fn level_strategy(&self) -> Strategy {
        self.scheduler.strategy()
    }

    pub fn get_board_init(&self) -> BoardInit {
        self.grid.to_board_init()
    }

    /// Polled player intent; `Direction::None` keeps the current heading.
    pub fn set_input(&mut self, dir: Direction) {
        self.player.desired = dir;
    }

    /// Lets a ghost out of the house before its timer runs out.
    pub fn release_ghost(&mut self, id: GhostId) -> bool {
        self.ghosts[id.index()].release()
    }

    pub fn step(&mut self, dt_ms: u64) {
        let mut remaining = dt_ms;
        while remaining > 0 && !self.game_over {
            let slice = remaining.min(TICK_MS);
            remaining -= slice;
            self.tick(slice);
        }
    }

    fn tick(&mut self, dt_ms: u64) {
        self.tick_counter += 1;
        self.elapsed_ms = self.elapsed_ms.saturating_add(dt_ms);

        if self.advance_pause(dt_ms) {
            return;
        }
        self.update_power(dt_ms);
        self.update_schedule(dt_ms);
        self.apply_ghost_strategies();
        if self.update_player(dt_ms) {
            return;
        }
        self.update_ghosts(dt_ms);
        self.update_fruit(dt_ms);
        self.resolve_collisions();
    }

    /// Returns true while gameplay is suspended, including the slice that ends the pause.
    fn advance_pause(&mut self, dt_ms: u64) -> bool {
        let Some(pause) = self.pause.as_mut() else {
            return false;
        };
        pause.remaining_ms = pause.remaining_ms.saturating_sub(dt_ms);
        if pause.remaining_ms > 0 {
            return true;
        }
        let completion = pause.completion;
        self.pause = None;
        self.complete_pause(completion);
        true
    }

    fn set_pause(&mut self, remaining_ms: u64, completion: PauseCompletion) {
        self.pause = Some(PauseWindow {
            remaining_ms,
            completion,
        });
    }

    fn begin_round(&mut self, ready_ms: u64) {
        if ready_ms > 0 {
            self.set_pause(ready_ms, PauseCompletion::BeginRound);
        }
    }

    fn complete_pause(&mut self, completion: PauseCompletion) {
        match completion {
            PauseCompletion::Resume | PauseCompletion::BeginRound => {}
            PauseCompletion::LoseLife => {
                if self.lives <= 0 {
                    self.game_over = true;
                    self.events.push(RuntimeEvent::GameOver { score: self.score });
                    info!(score = self.score, level = self.level, "game over");
                    return;
                }
                self.reset_actors();
                self.begin_round(ROUND_READY_MS);
            }
            PauseCompletion::AdvanceLevel => {
                self.level += 1;
                self.level_pickups_eaten = 0;
                self.grid.reset();
                self.scheduler.reset(self.level);
                self.power.clear();
                self.reset_actors();
                self.events.push(RuntimeEvent::LevelStarted { level: self.level });
                info!(level = self.level, "level started");
                self.begin_round(ROUND_READY_MS);
            }
        }
    }

    fn reset_actors(&mut self) {
        self.player.reset(self.options.player_start);
        self.fruit = None;
        let strategies: Vec<Strategy> = self
            .ghosts
            .iter()
            .map(|ghost| self.level_strategy_for(ghost.id))
            .collect();
        for (ghost, strategy) in self.ghosts.iter_mut().zip(strategies) {
            ghost.reset(&self.grid, strategy);
        }
    }

    /// Global strategy as seen by one ghost. Blinky keeps chasing through
    /// scatter windows once few pickups remain.
    fn level_strategy_for(&self, id: GhostId) -> Strategy {
        let global = self.scheduler.strategy();
        if id == GhostId::Blinky
            && global == Strategy::Scatter
            && self.grid.pickups_remaining() <= cruise_threshold(self.level)
        {
            return Strategy::Chase;
        }
        global
    }

    fn update_power(&mut self, dt_ms: u64) {
        if self.power.advance(dt_ms) {
            self.end_power_phase();
        }
    }

    fn end_power_phase(&mut self) {
        self.events.push(RuntimeEvent::PowerPhaseEnded);
        self.events.push(RuntimeEvent::Sound {
            cue: AudioCue::PowerLoopStop,
        });
        for idx in 0..self.ghosts.len() {
            if self.ghosts[idx].is_frightened() {
                let strategy = self.level_strategy_for(self.ghosts[idx].id);
                self.ghosts[idx].set_strategy(strategy);
            }
        }
        debug!("power phase ended");
    }

    /// Drops an active power phase without restoring ghosts; used when the round ends.
    fn cancel_power(&mut self) {
        if !self.power.is_active() {
            return;
        }
        self.power.clear();
        self.events.push(RuntimeEvent::PowerPhaseEnded);
        self.events.push(RuntimeEvent::Sound {
            cue: AudioCue::PowerLoopStop,
        });
    }

    fn activate_power(&mut self) {
        let duration_ms = fright_duration_ms(self.level);
        match self.power.activate(duration_ms) {
            PowerActivation::Disabled => return,
            PowerActivation::Started => {
                self.events.push(RuntimeEvent::PowerPhaseStarted { duration_ms });
                self.events.push(RuntimeEvent::Sound {
                    cue: AudioCue::PowerLoopStart,
                });
            }
            PowerActivation::Extended => {
                self.events.push(RuntimeEvent::PowerPhaseStarted { duration_ms });
            }
        }
        for ghost in &mut self.ghosts {
            ghost.frighten();
        }
        debug!(duration_ms, level = self.level, "power phase");
    }

    fn update_schedule(&mut self, dt_ms: u64) {
        if let Some(strategy) = self.scheduler.advance(dt_ms, self.power.is_active()) {
            let phase = self.scheduler.phase();
            self.events
                .push(RuntimeEvent::StrategyChanged { strategy, phase });
            debug!(?strategy, phase, "level strategy changed");
        }
    }

    fn apply_ghost_strategies(&mut self) {
        for idx in 0..self.ghosts.len() {
            let ghost = &self.ghosts[idx];
            if ghost.is_frightened() || ghost.is_eaten() {
                continue;
            }
            let strategy = self.level_strategy_for(ghost.id);
            self.ghosts[idx].set_strategy(strategy);
        }
    }

    fn add_score(&mut self, points: i32) {
        self.score += points;
        self.high_score = self.high_score.max(self.score);
        if !self.extra_life_awarded && self.score >= EXTRA_LIFE_SCORE {
            self.extra_life_awarded = true;
            self.lives += 1;
            self.events.push(RuntimeEvent::ExtraLife { lives: self.lives });
            self.events.push(RuntimeEvent::Sound {
                cue: AudioCue::ExtraLife,
            });
            info!(lives = self.lives, "extra life");
        }
    }

    fn clear_level(&mut self) {
        self.events.push(RuntimeEvent::LevelCleared { level: self.level });
        info!(level = self.level, score = self.score, "level cleared");
        self.cancel_power();
        self.fruit = None;
        self.set_pause(LEVEL_CLEAR_PAUSE_MS, PauseCompletion::AdvanceLevel);
    }

    /// Eats every frightened ghost touching the player, then lets any other
    /// touching ghost capture the player.
    fn resolve_collisions(&mut self) {
        let player = self.player.position;
        let mut eaten = Vec::new();
        let mut captor = None;
        for (idx, ghost) in self.ghosts.iter().enumerate() {
            if ghost.is_eaten() || ghost.position.distance(player) > COLLISION_DISTANCE {
                continue;
            }
            if ghost.is_frightened() {
                eaten.push(idx);
            } else if captor.is_none() {
                captor = Some(ghost.id);
            }
        }

        for idx in eaten {
            self.eat_ghost(idx);
        }
        if let Some(id) = captor {
            self.capture_player(id);
        }
    }

    fn eat_ghost(&mut self, idx: usize) {
        let points = self.power.award_capture();
        let ghost = &mut self.ghosts[idx];
        ghost.mark_eaten();
        let (id, position) = (ghost.id, ghost.position);
        self.stats.ghosts += 1;
        self.add_score(points);
        self.events.push(RuntimeEvent::GhostEaten { ghost: id, points });
        self.events.push(RuntimeEvent::BonusPoints {
            value: points,
            x: position.x,
            y: position.y,
            duration_ms: BONUS_DISPLAY_MS,
        });
        self.events.push(RuntimeEvent::Sound {
            cue: AudioCue::GhostEaten,
        });
        self.set_pause(GHOST_EATEN_PAUSE_MS, PauseCompletion::Resume);
        debug!(ghost = id.name(), points, "ghost eaten");
    }

    fn capture_player(&mut self, id: GhostId) {
        self.lives -= 1;
        self.stats.lives_lost += 1;
        self.events.push(RuntimeEvent::PlayerCaptured {
            ghost: id,
            lives_left: self.lives,
        });
        self.events.push(RuntimeEvent::Sound {
            cue: AudioCue::PlayerCaptured,
        });
        self.cancel_power();
        self.fruit = None;
        self.set_pause(CAPTURE_PAUSE_MS, PauseCompletion::LoseLife);
        info!(ghost = id.name(), lives = self.lives, "player captured");
    }

    pub fn build_snapshot(&mut self, include_events: bool) -> Snapshot {
        let snapshot = Snapshot {
            tick: self.tick_counter,
            elapsed_ms: self.elapsed_ms,
            level: self.level,
            score: self.score,
            high_score: self.high_score,
            lives: self.lives,
            ready: self.is_ready(),
            paused: self.pause.is_some(),
            game_over: self.game_over,
            level_strategy: self.scheduler.strategy(),
            power: PowerView {
                active: self.power.is_active(),
                remaining_ms: self.power.remaining_ms(),
                ghosts_eaten: self.power.ghosts_eaten(),
            },
            pickups_remaining: self.grid.pickups_remaining(),
            player: self.player.view(),
            ghosts: self.ghosts.iter().map(Ghost::view).collect(),
            fruit: self.fruit.as_ref().map(Fruit::view),
            events: if include_events {
                self.events.clone()
            } else {
                Vec::new()
            },
        };
        if include_events {
            self.events.clear();
        }
        snapshot
    }

    pub fn build_summary(&self) -> GameSummary {
        GameSummary {
            score: self.score,
            high_score: self.high_score,
            level: self.level,
            elapsed_ms: self.elapsed_ms,
            pickups_eaten: self.stats.pickups,
            ghosts_eaten: self.stats.ghosts,
            fruits_eaten: self.stats.fruits,
            lives_lost: self.stats.lives_lost,
            game_over: self.game_over,
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::constants::{GHOST_EATEN_PAUSE_MS, TICK_MS};
    use crate::engine::{GameEngine, GameEngineOptions, PauseCompletion};
    use crate::ghost::Lifecycle;
    use crate::grid::LayoutError;
    use crate::types::{
        AudioCue, Cell, Direction, GhostId, PickupKind, Position, RuntimeEvent, Strategy,
    };

    fn engine_with(seed: u32, level: u32) -> GameEngine {
        GameEngine::new(GameEngineOptions {
            seed,
            start_level: level,
            ready_ms: 0,
            ..GameEngineOptions::default()
        })
        .expect("classic layout")
    }

    fn drain(engine: &mut GameEngine) -> Vec<RuntimeEvent> {
        engine.build_snapshot(true).events
    }

    /// Holds every ghost inside the house so only timers move.
    fn park_ghosts(engine: &mut GameEngine) {
        for ghost in &mut engine.ghosts {
            ghost.position = Position::new(14.0, 14.5);
            ghost.set_lifecycle(Lifecycle::Spawning {
                release_in_ms: u64::MAX,
            });
        }
    }

    #[test]
    fn player_start_must_be_an_open_cell() {
        let rows: Vec<String> = [
            "##########",
            "#........#",
            "<........>",
            "####-#####",
            "####H#####",
            "##########",
        ]
        .iter()
        .map(|row| row.to_string())
        .collect();
        let options = |player_start: Position| GameEngineOptions {
            ready_ms: 0,
            layout: Some(rows.clone()),
            player_start,
            ..GameEngineOptions::default()
        };

        // the classic start lies outside this board
        assert_eq!(
            GameEngine::new(options(Position::new(14.0, 23.5))).unwrap_err(),
            LayoutError::BlockedStart { x: 14, y: 23 }
        );
        assert_eq!(
            GameEngine::new(options(Position::new(0.5, 0.5))).unwrap_err(),
            LayoutError::BlockedStart { x: 0, y: 0 }
        );

        let mut engine =
            GameEngine::new(options(Position::new(2.5, 1.5))).expect("open start cell");
        engine.step(3_000);
        assert_eq!(engine.grid().width(), 10);
    }

    #[test]
    fn same_seed_produces_same_progression() {
        let run = |seed: u32| {
            let mut engine = engine_with(seed, 0);
            let mut trace = Vec::new();
            for _ in 0..900 {
                let dir = engine.autopilot_direction();
                engine.set_input(dir);
                engine.step(TICK_MS);
                let snapshot = engine.build_snapshot(false);
                trace.push((
                    snapshot.score,
                    snapshot.player.x.to_bits(),
                    snapshot
                        .ghosts
                        .iter()
                        .map(|g| (g.x.to_bits(), g.y.to_bits()))
                        .collect::<Vec<_>>(),
                ));
            }
            trace
        };
        assert_eq!(run(11), run(11));
    }

    #[test]
    fn opening_ready_pause_freezes_actors() {
        let mut engine = GameEngine::new(GameEngineOptions::default()).expect("classic layout");
        assert!(engine.is_ready());
        let before = engine.build_snapshot(false);
        engine.step(4_000);
        let during = engine.build_snapshot(false);
        assert_eq!(before.player.x, during.player.x);
        assert_eq!(
            engine.ghost(GhostId::Pinky).lifecycle(),
            Lifecycle::Spawning {
                release_in_ms: 1_000
            }
        );
        engine.step(200);
        assert!(!engine.is_ready());
        engine.step(TICK_MS);
        assert_ne!(engine.build_snapshot(false).player.x, before.player.x);
    }

    #[test]
    fn power_pellet_frightens_everyone_until_timer_expires() {
        let mut engine = engine_with(3, 0);
        drain(&mut engine);
        assert!(!engine.consume_pickup(Cell::new(1, 3)));

        assert!(engine.power.is_active());
        assert_eq!(engine.power.remaining_ms(), 6_000);
        for id in GhostId::ALL {
            assert_eq!(engine.ghost(id).strategy(), Strategy::Frightened);
        }
        let events = drain(&mut engine);
        assert!(events.contains(&RuntimeEvent::PowerPhaseStarted { duration_ms: 6_000 }));
        assert!(events.contains(&RuntimeEvent::Sound {
            cue: AudioCue::PowerLoopStart
        }));

        for _ in 0..(6_000 / TICK_MS) {
            engine.update_power(TICK_MS);
        }
        assert!(!engine.power.is_active());
        for id in GhostId::ALL {
            assert_eq!(engine.ghost(id).strategy(), engine.level_strategy());
        }
        assert!(drain(&mut engine).contains(&RuntimeEvent::PowerPhaseEnded));
    }

    #[test]
    fn stepped_power_phase_expires_before_the_schedule_resumes() {
        let mut engine = engine_with(3, 0);
        park_ghosts(&mut engine);
        engine.consume_pickup(Cell::new(1, 3));
        let schedule_before = engine.scheduler.remaining_ms();

        engine.step(6_000 - TICK_MS);
        assert!(engine.power.is_active());
        assert_eq!(engine.power.remaining_ms(), TICK_MS);
        assert_eq!(engine.scheduler.remaining_ms(), schedule_before);
        for id in GhostId::ALL {
            assert_eq!(engine.ghost(id).strategy(), Strategy::Frightened);
        }

        // the expiring tick already counts towards scatter/chase
        engine.step(TICK_MS);
        assert!(!engine.power.is_active());
        assert_eq!(engine.scheduler.remaining_ms(), schedule_before - TICK_MS);
        for id in GhostId::ALL {
            assert_eq!(engine.ghost(id).strategy(), Strategy::Scatter);
        }
    }

    #[test]
    fn ghost_eaten_pause_freezes_power_countdown() {
        let mut engine = engine_with(5, 0);
        park_ghosts(&mut engine);
        engine.consume_pickup(Cell::new(1, 3));
        engine.ghosts[GhostId::Blinky.index()].position = engine.player.position;
        engine.resolve_collisions();
        assert_eq!(
            engine.pause().map(|pause| pause.completion),
            Some(PauseCompletion::Resume)
        );

        engine.step(GHOST_EATEN_PAUSE_MS);
        assert!(engine.pause().is_none());
        assert_eq!(engine.power.remaining_ms(), 6_000);

        engine.step(TICK_MS);
        assert_eq!(engine.power.remaining_ms(), 6_000 - TICK_MS);
    }

    #[test]
    fn power_phase_holds_scatter_chase_countdown() {
        let mut engine = engine_with(3, 0);
        engine.consume_pickup(Cell::new(1, 3));
        let before = engine.scheduler.remaining_ms();
        engine.update_schedule(3_000);
        assert_eq!(engine.scheduler.remaining_ms(), before);
    }

    #[test]
    fn consecutive_ghost_captures_double_points() {
        let mut engine = engine_with(5, 0);
        engine.consume_pickup(Cell::new(1, 3));
        let score_before = engine.score();
        let player = engine.player.position;

        let mut awarded = Vec::new();
        for id in [GhostId::Blinky, GhostId::Pinky, GhostId::Inky] {
            engine.ghosts[id.index()].position = player;
            engine.resolve_collisions();
            assert!(engine.ghost(id).is_eaten());
            engine.pause = None;
        }
        for event in drain(&mut engine) {
            if let RuntimeEvent::GhostEaten { points, .. } = event {
                awarded.push(points);
            }
        }
        assert_eq!(awarded, vec![200, 400, 800]);
        assert_eq!(engine.score(), score_before + 1_400);

        // a fresh power phase starts again from 200
        engine.power.clear();
        engine.consume_pickup(Cell::new(26, 3));
        engine.ghosts[GhostId::Clyde.index()].position = player;
        engine.resolve_collisions();
        let points: Vec<i32> = drain(&mut engine)
            .into_iter()
            .filter_map(|event| match event {
                RuntimeEvent::GhostEaten { points, .. } => Some(points),
                _ => None,
            })
            .collect();
        assert_eq!(points, vec![200]);
    }

    #[test]
    fn second_pellet_extends_phase_without_resetting_multiplier() {
        let mut engine = engine_with(5, 0);
        engine.consume_pickup(Cell::new(1, 3));
        engine.ghosts[0].position = engine.player.position;
        engine.resolve_collisions();
        engine.update_power(4_000);
        engine.consume_pickup(Cell::new(26, 3));
        assert_eq!(engine.power.remaining_ms(), 6_000);
        assert_eq!(engine.power.ghosts_eaten(), 1);
        // eaten ghosts stay eaten
        assert!(engine.ghost(GhostId::Blinky).is_eaten());
    }

    #[test]
    fn touching_an_active_ghost_costs_a_life() {
        let mut engine = engine_with(9, 0);
        engine.ghosts[GhostId::Blinky.index()].position = engine.player.position;
        engine.resolve_collisions();
        assert_eq!(engine.lives(), 2);
        assert_eq!(
            engine.pause().map(|pause| pause.completion),
            Some(PauseCompletion::LoseLife)
        );

        engine.step(1_500);
        assert!(engine.is_ready());
        assert_eq!(engine.player.position, Position::new(14.0, 23.5));
        assert_eq!(
            engine.ghost(GhostId::Blinky).position,
            Position::new(14.0, 11.5)
        );
        assert!(!engine.is_ended());
    }

    #[test]
    fn last_life_ends_the_game() {
        let mut engine = GameEngine::new(GameEngineOptions {
            lives: 1,
            ready_ms: 0,
            ..GameEngineOptions::default()
        })
        .expect("classic layout");
        engine.ghosts[GhostId::Pinky.index()].position = engine.player.position;
        engine.resolve_collisions();
        engine.step(2_000);
        assert!(engine.is_ended());
        assert!(drain(&mut engine).contains(&RuntimeEvent::GameOver { score: 0 }));
        let summary = engine.build_summary();
        assert!(summary.game_over);
        assert_eq!(summary.lives_lost, 1);
    }

    #[test]
    fn eaten_ghosts_ignore_the_player() {
        let mut engine = engine_with(9, 0);
        engine.ghosts[0].frighten();
        engine.ghosts[0].mark_eaten();
        engine.ghosts[0].position = engine.player.position;
        engine.resolve_collisions();
        assert_eq!(engine.lives(), 3);
        assert!(engine.pause().is_none());
    }

    #[test]
    fn clearing_the_board_advances_the_level() {
        let mut engine = engine_with(4, 0);
        let cells: Vec<Cell> = engine
            .grid
            .open_cells()
            .filter(|cell| {
                matches!(
                    engine.grid.kind_at(*cell),
                    crate::types::TileKind::Pickup(_)
                )
            })
            .collect();
        let last = cells.len() - 1;
        for (idx, cell) in cells.into_iter().enumerate() {
            let cleared = engine.consume_pickup(cell);
            assert_eq!(cleared, idx == last);
        }
        assert_eq!(
            engine.pause().map(|pause| pause.completion),
            Some(PauseCompletion::AdvanceLevel)
        );
        assert!(!engine.power.is_active());

        engine.step(2_000);
        assert_eq!(engine.level(), 1);
        assert_eq!(engine.grid.pickups_remaining(), 244);
        assert!(engine.is_ready());
        assert!(drain(&mut engine).contains(&RuntimeEvent::LevelStarted { level: 1 }));
    }

    #[test]
    fn extra_life_is_awarded_once() {
        let mut engine = engine_with(1, 0);
        engine.add_score(9_990);
        assert_eq!(engine.lives(), 3);
        engine.add_score(10);
        assert_eq!(engine.lives(), 4);
        engine.add_score(20_000);
        assert_eq!(engine.lives(), 4);
        assert_eq!(engine.high_score(), 30_000);
    }

    #[test]
    fn pickups_alternate_chomp_cues() {
        let mut engine = engine_with(1, 0);
        drain(&mut engine);
        engine.consume_pickup(Cell::new(1, 1));
        engine.consume_pickup(Cell::new(2, 1));
        let cues: Vec<AudioCue> = drain(&mut engine)
            .into_iter()
            .filter_map(|event| match event {
                RuntimeEvent::Sound { cue } => Some(cue),
                _ => None,
            })
            .collect();
        assert_eq!(cues, vec![AudioCue::ChompA, AudioCue::ChompB]);
        assert_eq!(engine.score(), 20);
    }

    #[test]
    fn blinky_cruises_when_few_pickups_remain() {
        let mut engine = engine_with(1, 0);
        let cells: Vec<Cell> = engine
            .grid
            .open_cells()
            .filter(|cell| {
                engine.grid.kind_at(*cell) == crate::types::TileKind::Pickup(PickupKind::Dot)
            })
            .collect();
        let keep = 20;
        for cell in cells.iter().skip(keep) {
            engine.grid.consume(*cell);
        }
        // four pellets plus the kept dots
        assert!(engine.grid.pickups_remaining() > 20);
        engine.apply_ghost_strategies();
        assert_eq!(engine.ghost(GhostId::Blinky).strategy(), Strategy::Scatter);

        for cell in cells.iter().take(4) {
            engine.grid.consume(*cell);
        }
        assert_eq!(engine.grid.pickups_remaining(), 20);
        engine.apply_ghost_strategies();
        assert_eq!(engine.ghost(GhostId::Blinky).strategy(), Strategy::Chase);
        assert_eq!(engine.ghost(GhostId::Pinky).strategy(), Strategy::Scatter);
    }

    #[test]
    fn reset_game_restores_board_and_keeps_high_score() {
        let mut engine = engine_with(2, 0);
        engine.consume_pickup(Cell::new(1, 1));
        engine.lives = 1;
        engine.reset_game();
        assert_eq!(engine.score(), 0);
        assert_eq!(engine.high_score(), 10);
        assert_eq!(engine.lives(), 3);
        assert_eq!(engine.grid.pickups_remaining(), 244);
    }

    #[test]
    fn scatter_to_chase_turns_roaming_ghosts_around() {
        let mut engine = engine_with(2, 0);
        drain(&mut engine);
        engine.ghosts[GhostId::Blinky.index()].dir = Direction::Up;

        engine.update_schedule(7_000);
        engine.apply_ghost_strategies();

        let flips: Vec<RuntimeEvent> = drain(&mut engine)
            .into_iter()
            .filter(|event| matches!(event, RuntimeEvent::StrategyChanged { .. }))
            .collect();
        assert_eq!(
            flips,
            vec![RuntimeEvent::StrategyChanged {
                strategy: Strategy::Chase,
                phase: 0
            }]
        );
        let blinky = engine.ghost(GhostId::Blinky);
        assert_eq!(blinky.strategy(), Strategy::Chase);
        assert_eq!(blinky.dir, Direction::Down);
        // still in the house, so no about-face
        assert_eq!(engine.ghost(GhostId::Pinky).dir, Direction::Up);
    }

    #[test]
    fn player_stops_at_walls_and_turns_at_junctions() {
        let mut engine = engine_with(2, 0);
        // keep ghosts in the house and Blinky out of the way
        for ghost in &mut engine.ghosts {
            ghost.position = Position::new(14.0, 14.5);
            ghost.set_lifecycle(Lifecycle::Spawning {
                release_in_ms: u64::MAX,
            });
        }
        engine.player.position = Cell::new(6, 23).center();
        engine.player.dir = Direction::Left;
        engine.update_player(200);
        // (5,23) is a wall
        assert_eq!(engine.player.position, Cell::new(6, 23).center());
        assert!(!engine.player.moving);

        engine.set_input(Direction::Up);
        engine.update_player(100);
        assert_eq!(engine.player.dir, Direction::Up);
        assert!(engine.player.position.y < 23.5);
    }

    #[test]
    fn released_ghost_leaves_the_house() {
        let mut engine = engine_with(2, 0);
        let ctx = engine.target_context();
        assert!(engine.release_ghost(GhostId::Inky));
        // two cells across and three up at house speed, then a few roaming ticks
        for _ in 0..110 {
            engine.update_ghost(GhostId::Inky.index(), TICK_MS, &ctx);
        }
        let inky = engine.ghost(GhostId::Inky);
        assert_eq!(inky.lifecycle(), Lifecycle::Roaming);
        assert_eq!(inky.position.y, 11.5);
        assert!(inky.position.x < 14.0);
    }
}
