use super::utils::{distance_to_next_center, facing_towards, is_centered, step_towards};
use super::*;
use crate::constants::{
    GHOST_BASE_SPEED, GHOST_EATEN_SPEED, GHOST_FRIGHTENED_SPEED, GHOST_HOUSE_SPEED,
    GHOST_TUNNEL_SPEED,
};
use crate::ghost::{target_for, HouseLeg, Lifecycle, TargetContext};

impl GameEngine {
    /// Snapshot of the board facts chase targets read, taken before anyone moves
    /// so the order ghosts are updated in does not matter.
    pub(super) fn target_context(&self) -> TargetContext {
        TargetContext {
            player_cell: self.player.position.cell(),
            player_dir: self.player.dir,
            blinky_cell: self.ghosts[GhostId::Blinky.index()].cell(),
        }
    }

    pub(super) fn update_ghosts(&mut self, dt_ms: u64) {
        let ctx = self.target_context();
        for idx in 0..self.ghosts.len() {
            self.update_ghost(idx, dt_ms, &ctx);
        }
    }

    pub(super) fn update_ghost(&mut self, idx: usize, dt_ms: u64, ctx: &TargetContext) {
        let dt_sec = dt_ms as f32 / 1000.0;
        match self.ghosts[idx].lifecycle() {
            Lifecycle::Spawning { .. } => {
                if self.ghosts[idx].tick_release(dt_ms) {
                    debug!(ghost = self.ghosts[idx].id.name(), "ghost released");
                }
            }
            Lifecycle::Exiting(_) => self.move_through_house(idx, GHOST_HOUSE_SPEED * dt_sec),
            Lifecycle::Entering(_) => self.move_through_house(idx, GHOST_EATEN_SPEED * dt_sec),
            Lifecycle::Roaming => self.roam(idx, dt_sec, ctx),
        }
    }

    fn ghost_speed(&self, idx: usize) -> f32 {
        let ghost = &self.ghosts[idx];
        if ghost.is_eaten() {
            GHOST_EATEN_SPEED
        } else if self.grid.is_tunnel(ghost.cell()) {
            GHOST_TUNNEL_SPEED
        } else if ghost.is_frightened() {
            GHOST_FRIGHTENED_SPEED
        } else {
            GHOST_BASE_SPEED
        }
    }

    /// Scripted legs between the house centre and the spot above the door.
    fn move_through_house(&mut self, idx: usize, mut distance: f32) {
        let center = self.grid.house_center();
        let door = self.grid.entrance_position();

        while distance > 0.0 {
            let lifecycle = self.ghosts[idx].lifecycle();
            let waypoint = match lifecycle {
                Lifecycle::Exiting(HouseLeg::ToCenter) | Lifecycle::Entering(HouseLeg::ToCenter) => {
                    center
                }
                Lifecycle::Exiting(HouseLeg::ToDoor) | Lifecycle::Entering(HouseLeg::ToDoor) => door,
                Lifecycle::Spawning { .. } | Lifecycle::Roaming => return,
            };

            let ghost = &mut self.ghosts[idx];
            let facing = facing_towards(ghost.position, waypoint);
            if facing != Direction::None {
                ghost.dir = facing;
            }
            let gap = ghost.position.distance(waypoint);
            let (position, reached) = step_towards(ghost.position, waypoint, distance);
            ghost.position = position;
            if !reached {
                return;
            }
            distance -= gap;

            match lifecycle {
                Lifecycle::Exiting(HouseLeg::ToCenter) => {
                    ghost.set_lifecycle(Lifecycle::Exiting(HouseLeg::ToDoor));
                }
                Lifecycle::Exiting(HouseLeg::ToDoor) => {
                    ghost.dir = Direction::Left;
                    ghost.set_lifecycle(Lifecycle::Roaming);
                    return;
                }
                Lifecycle::Entering(HouseLeg::ToDoor) => {
                    ghost.set_lifecycle(Lifecycle::Entering(HouseLeg::ToCenter));
                }
                Lifecycle::Entering(HouseLeg::ToCenter) => {
                    let id = ghost.id;
                    let strategy = self.level_strategy_for(id);
                    let ghost = &mut self.ghosts[idx];
                    ghost.set_strategy(strategy);
                    ghost.dir = Direction::Up;
                    ghost.set_lifecycle(Lifecycle::Spawning { release_in_ms: 0 });
                    debug!(ghost = id.name(), "ghost back home");
                    return;
                }
                Lifecycle::Spawning { .. } | Lifecycle::Roaming => return,
            }
        }
    }

    /// Free movement: run to the next cell centre, decide there once, carry on.
    fn roam(&mut self, idx: usize, dt_sec: f32, ctx: &TargetContext) {
        let mut remaining = self.ghost_speed(idx) * dt_sec;
        let entrance = self.grid.house_entrance();

        while remaining > 0.0 {
            let position = self.ghosts[idx].position;
            if is_centered(position) {
                let cell = position.cell();
                let ghost = &mut self.ghosts[idx];
                ghost.position = cell.center();

                if ghost.is_eaten() && cell == entrance {
                    ghost.set_lifecycle(Lifecycle::Entering(HouseLeg::ToDoor));
                    return;
                }
                let target = target_for(ghost.id, ghost.strategy(), cell, ctx, entrance);
                ghost.decide_at(&self.grid, target);
            }

            let ghost = &mut self.ghosts[idx];
            if ghost.dir == Direction::None {
                return;
            }
            let step = distance_to_next_center(ghost.position, ghost.dir).min(remaining);
            ghost.position = self
                .grid
                .wrap_position(ghost.position.translate(ghost.dir, step));
            remaining -= step;
        }
    }
}
