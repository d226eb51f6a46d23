use std::collections::{HashSet, VecDeque};

use super::*;
use crate::types::{Cell, TileKind};

/// Non-frightened ghosts closer than this make the autopilot flee.
const DANGER_DISTANCE: f32 = 4.0;
/// Frightened ghosts are worth chasing only while this much power time is left.
const HUNT_MIN_POWER_MS: u64 = 1_500;

impl GameEngine {
    /// Heuristic player intent for headless runs.
    pub fn autopilot_direction(&mut self) -> Direction {
        let cell = self.player.position.cell();
        let open: Vec<Direction> = Direction::CARDINALS
            .into_iter()
            .filter(|dir| !self.grid.is_blocked(cell, *dir))
            .collect();
        if open.is_empty() {
            return Direction::None;
        }

        let toward_pickup = self.first_step_to_pickup(cell);
        let hunting = self.power.is_active() && self.power.remaining_ms() >= HUNT_MIN_POWER_MS;
        let prey = if hunting { self.nearest_ghost(cell, true) } else { None };

        let mut best = Direction::None;
        let mut best_score = f32::NEG_INFINITY;
        for dir in open {
            let next = self.grid.neighbor(cell, dir);
            let mut score = 0.0;
            if Some(dir) == toward_pickup {
                score += 10.0;
            }
            if let Some(threat) = self.nearest_ghost(next, false) {
                let dist = threat.distance(next);
                score += dist.min(8.0) * 0.6;
                if dist <= DANGER_DISTANCE {
                    score -= (DANGER_DISTANCE + 1.0 - dist) * 6.0;
                }
            }
            if let Some(prey) = prey {
                score -= prey.distance(next) * 1.2;
            }
            if dir == reverse_of(self.player.dir) {
                score -= 1.5;
            }
            score += self.rng.next_f32() * 0.25;

            if score > best_score {
                best_score = score;
                best = dir;
            }
        }
        best
    }

    /// Cell of the nearest roaming ghost that is (or is not) frightened.
    fn nearest_ghost(&self, from: Cell, frightened: bool) -> Option<Cell> {
        self.ghosts
            .iter()
            .filter(|ghost| ghost.is_roaming() && !ghost.is_eaten())
            .filter(|ghost| ghost.is_frightened() == frightened)
            .map(|ghost| ghost.cell())
            .min_by(|a, b| a.distance(from).total_cmp(&b.distance(from)))
    }

    /// First move of a breadth-first walk to the closest pickup.
    fn first_step_to_pickup(&self, start: Cell) -> Option<Direction> {
        let mut visited = HashSet::from([start]);
        let mut queue = VecDeque::new();
        for dir in Direction::CARDINALS {
            if self.grid.is_blocked(start, dir) {
                continue;
            }
            let next = self.grid.neighbor(start, dir);
            if visited.insert(next) {
                queue.push_back((next, dir));
            }
        }

        while let Some((cell, first)) = queue.pop_front() {
            if matches!(self.grid.kind_at(cell), TileKind::Pickup(_)) {
                return Some(first);
            }
            for dir in Direction::CARDINALS {
                if self.grid.is_blocked(cell, dir) {
                    continue;
                }
                let next = self.grid.neighbor(cell, dir);
                if visited.insert(next) {
                    queue.push_back((next, first));
                }
            }
        }
        None
    }
}

fn reverse_of(dir: Direction) -> Direction {
    if dir == Direction::None {
        Direction::None
    } else {
        dir.opposite_of()
    }
}
