use super::utils::{distance_to_next_center, is_centered};
use super::*;
use crate::constants::{
    FRUIT_DURATION_MS, FRUIT_DURATION_PAD_MS, FRUIT_SPAWN_THRESHOLDS, PLAYER_SPEED,
};
use crate::types::{Cell, FruitKind, FruitView, PickupKind, PlayerView, TileKind};

#[derive(Clone, Debug)]
pub(super) struct Player {
    pub(super) position: Position,
    pub(super) dir: Direction,
    pub(super) desired: Direction,
    pub(super) moving: bool,
}

impl Player {
    pub(super) fn new(start: Position) -> Self {
        Self {
            position: start,
            dir: Direction::Left,
            desired: Direction::None,
            moving: false,
        }
    }

    pub(super) fn reset(&mut self, start: Position) {
        *self = Self::new(start);
    }

    pub(super) fn view(&self) -> PlayerView {
        PlayerView {
            x: self.position.x,
            y: self.position.y,
            dir: self.dir,
            moving: self.moving,
        }
    }
}

#[derive(Clone, Debug)]
pub(super) struct Fruit {
    kind: FruitKind,
    position: Position,
    remaining_ms: u64,
}

impl Fruit {
    pub(super) fn view(&self) -> FruitView {
        FruitView {
            kind: self.kind,
            x: self.position.x,
            y: self.position.y,
            remaining_ms: self.remaining_ms,
        }
    }
}

impl GameEngine {
    /// Moves the player along its lane. Returns true when the last pickup of
    /// the level was eaten this tick.
    pub(super) fn update_player(&mut self, dt_ms: u64) -> bool {
        let mut remaining = PLAYER_SPEED * dt_ms as f32 / 1000.0;
        let desired = self.player.desired;
        self.player.moving = false;

        if desired != Direction::None
            && self.player.dir != Direction::None
            && desired == self.player.dir.opposite_of()
        {
            self.player.dir = desired;
        }

        while remaining > 0.0 {
            if is_centered(self.player.position) {
                let cell = self.player.position.cell();
                self.player.position = cell.center();
                if desired != Direction::None
                    && desired != self.player.dir
                    && !self.grid.is_blocked(cell, desired)
                {
                    self.player.dir = desired;
                }
                if self.player.dir == Direction::None || self.grid.is_blocked(cell, self.player.dir)
                {
                    break;
                }
            }

            let dir = self.player.dir;
            if dir == Direction::None {
                break;
            }
            let step = distance_to_next_center(self.player.position, dir).min(remaining);
            self.player.position = self
                .grid
                .wrap_position(self.player.position.translate(dir, step));
            self.player.moving = true;
            remaining -= step;

            let cell = self.player.position.cell();
            if self.consume_pickup(cell) {
                return true;
            }
        }
        false
    }

    /// Eats whatever pickup sits on `cell`. Returns true when it was the last one.
    pub(super) fn consume_pickup(&mut self, cell: Cell) -> bool {
        let Some(kind) = self.grid.consume(cell) else {
            return false;
        };
        let points = kind.points();
        self.level_pickups_eaten += 1;
        self.stats.pickups += 1;
        self.events.push(RuntimeEvent::TileChanged {
            x: cell.x,
            y: cell.y,
            kind: TileKind::Empty,
        });
        self.events.push(RuntimeEvent::PickupConsumed {
            x: cell.x,
            y: cell.y,
            kind,
            points,
        });
        let cue = if self.chomp_toggle {
            AudioCue::ChompB
        } else {
            AudioCue::ChompA
        };
        self.chomp_toggle = !self.chomp_toggle;
        self.events.push(RuntimeEvent::Sound { cue });
        self.add_score(points);

        if kind == PickupKind::PowerPellet {
            self.activate_power();
        }
        if FRUIT_SPAWN_THRESHOLDS.contains(&self.level_pickups_eaten) {
            self.spawn_fruit();
        }
        if self.grid.pickups_remaining() == 0 {
            self.clear_level();
            return true;
        }
        false
    }

    fn spawn_fruit(&mut self) {
        let center = self.grid.house_center();
        let kind = FruitKind::for_level(self.level);
        let pad = self.rng.up_to(FRUIT_DURATION_PAD_MS);
        self.fruit = Some(Fruit {
            kind,
            position: Position::new(center.x, center.y + 3.0),
            remaining_ms: FRUIT_DURATION_MS + pad,
        });
        self.events.push(RuntimeEvent::FruitSpawned { fruit: kind });
        debug!(fruit = ?kind, "fruit spawned");
    }

    pub(super) fn update_fruit(&mut self, dt_ms: u64) {
        let Some(fruit) = self.fruit.as_mut() else {
            return;
        };
        fruit.remaining_ms = fruit.remaining_ms.saturating_sub(dt_ms);
        let (kind, position, expired) = (fruit.kind, fruit.position, fruit.remaining_ms == 0);

        if position.distance(self.player.position) <= COLLISION_DISTANCE {
            self.fruit = None;
            let points = kind.points();
            self.stats.fruits += 1;
            self.add_score(points);
            self.events.push(RuntimeEvent::FruitEaten {
                fruit: kind,
                points,
            });
            self.events.push(RuntimeEvent::BonusPoints {
                value: points,
                x: position.x,
                y: position.y,
                duration_ms: BONUS_DISPLAY_MS,
            });
            self.events.push(RuntimeEvent::Sound {
                cue: AudioCue::FruitEaten,
            });
        } else if expired {
            self.fruit = None;
            self.events.push(RuntimeEvent::FruitExpired);
        }
    }
}
