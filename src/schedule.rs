//! Level timetable: scatter/chase alternation and power-phase timing.
//!
//! All durations are integer milliseconds so the table values are exact.

use crate::constants::{GHOST_BASE_POINTS, GHOST_MAX_POINTS};
use crate::types::Strategy;

/// Power-phase length per level index; levels past the end reuse the last entry.
pub const FRIGHT_TIME_MS: [u64; 19] = [
    6_000, 5_000, 4_000, 3_000, 2_000, 5_000, 2_000, 2_000, 1_000, 5_000, 2_000, 1_000, 1_000,
    3_000, 1_000, 1_000, 0, 1_000, 0,
];

/// Index of the scatter/chase pair after which the level stays in chase.
pub const FINAL_PHASE: u32 = 3;

pub fn fright_duration_ms(level: u32) -> u64 {
    let idx = (level as usize).min(FRIGHT_TIME_MS.len() - 1);
    FRIGHT_TIME_MS[idx]
}

/// Length of one scatter or chase window.
///
/// Phase 0 and 1: chase 20 s, scatter 7 s below level 5 and 5 s from there on.
/// Phase 2: scatter 5 s, chase 20 s on level 0 and 17 s afterwards.
/// Phase 3: chase never ends, scatter 5 s on level 0 and 10 ms afterwards.
pub fn phase_duration_ms(level: u32, phase: u32, strategy: Strategy) -> u64 {
    match (phase, strategy) {
        (0 | 1, Strategy::Chase) => 20_000,
        (0 | 1, Strategy::Scatter) if level < 5 => 7_000,
        (0 | 1, Strategy::Scatter) => 5_000,
        (2, Strategy::Scatter) => 5_000,
        (2, Strategy::Chase) if level == 0 => 20_000,
        (2, Strategy::Chase) => 17_000,
        (_, Strategy::Chase) => 0,
        (_, Strategy::Scatter) if level == 0 => 5_000,
        (_, Strategy::Scatter) => 10,
        (_, other) => panic!("{other:?} is not a level strategy"),
    }
}

/// Remaining pickups at or below which Blinky keeps chasing through scatter windows.
pub fn cruise_threshold(level: u32) -> i32 {
    match level {
        0 => 20,
        1 => 30,
        2..=4 => 40,
        5..=7 => 50,
        8..=10 => 60,
        11..=13 => 80,
        14..=17 => 100,
        _ => 120,
    }
}

#[derive(Clone, Debug)]
pub struct PhaseScheduler {
    level: u32,
    phase: u32,
    remaining_ms: u64,
    strategy: Strategy,
}

impl PhaseScheduler {
    pub fn new(level: u32) -> Self {
        Self {
            level,
            phase: 0,
            remaining_ms: phase_duration_ms(level, 0, Strategy::Scatter),
            strategy: Strategy::Scatter,
        }
    }

    pub fn reset(&mut self, level: u32) {
        *self = Self::new(level);
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn phase(&self) -> u32 {
        self.phase
    }

    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    pub fn remaining_ms(&self) -> u64 {
        self.remaining_ms
    }

    pub fn is_frozen(&self) -> bool {
        self.phase >= FINAL_PHASE && self.strategy == Strategy::Chase
    }

    /// Counts down the current window; returns the new strategy when it flips.
    ///
    /// The countdown is suspended while a power phase runs and once the level
    /// has settled into its final chase.
    pub fn advance(&mut self, dt_ms: u64, power_active: bool) -> Option<Strategy> {
        if power_active || self.is_frozen() {
            return None;
        }
        self.remaining_ms = self.remaining_ms.saturating_sub(dt_ms);
        if self.remaining_ms > 0 {
            return None;
        }

        self.strategy = match self.strategy {
            Strategy::Scatter => Strategy::Chase,
            _ => Strategy::Scatter,
        };
        if self.strategy == Strategy::Scatter {
            self.phase += 1;
        }
        self.remaining_ms = phase_duration_ms(self.level, self.phase, self.strategy);
        Some(self.strategy)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PowerActivation {
    Started,
    Extended,
    /// The level's fright time is zero; pellets only score.
    Disabled,
}

#[derive(Clone, Debug, Default)]
pub struct PowerPhase {
    active: bool,
    remaining_ms: u64,
    ghosts_eaten: u32,
}

impl PowerPhase {
    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn remaining_ms(&self) -> u64 {
        self.remaining_ms
    }

    pub fn ghosts_eaten(&self) -> u32 {
        self.ghosts_eaten
    }

    pub fn activate(&mut self, duration_ms: u64) -> PowerActivation {
        if duration_ms == 0 {
            return PowerActivation::Disabled;
        }
        self.remaining_ms = duration_ms;
        if self.active {
            return PowerActivation::Extended;
        }
        self.active = true;
        self.ghosts_eaten = 0;
        PowerActivation::Started
    }

    /// Returns true on the tick the phase runs out.
    pub fn advance(&mut self, dt_ms: u64) -> bool {
        if !self.active {
            return false;
        }
        self.remaining_ms = self.remaining_ms.saturating_sub(dt_ms);
        if self.remaining_ms > 0 {
            return false;
        }
        self.active = false;
        true
    }

    /// Points for the next capture in this phase: 200, 400, 800, 1600, 1600...
    pub fn award_capture(&mut self) -> i32 {
        let shift = self.ghosts_eaten.min(3);
        self.ghosts_eaten += 1;
        (GHOST_BASE_POINTS << shift).min(GHOST_MAX_POINTS)
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}
