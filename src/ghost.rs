//! Pursuer state machine: per-identity targeting, one-step path selection and
//! the spawning / exiting / roaming / entering lifecycle.

use crate::grid::TileGrid;
use crate::rng::Rng;
use crate::types::{Cell, Direction, GhostId, GhostStage, GhostView, Position, Strategy};

/// Clyde only gives chase inside this radius; further out it heads for its corner.
pub const CLYDE_CHASE_RADIUS: f32 = 8.0;
pub const PINKY_LOOKAHEAD: i32 = 4;
pub const INKY_LOOKAHEAD: i32 = 2;

impl GhostId {
    /// Fixed scatter corner, deliberately outside the walls so it is never reached.
    pub fn scatter_corner(self) -> Cell {
        match self {
            Self::Blinky => Cell::new(25, -3),
            Self::Pinky => Cell::new(2, -3),
            Self::Inky => Cell::new(27, 31),
            Self::Clyde => Cell::new(0, 31),
        }
    }

    pub fn release_delay_ms(self) -> u64 {
        match self {
            Self::Blinky => 0,
            Self::Pinky => 1_000,
            Self::Inky => 4_000,
            Self::Clyde => 8_000,
        }
    }

    /// Start position derived from the house geometry.
    pub fn home_position(self, grid: &TileGrid) -> Position {
        let center = grid.house_center();
        match self {
            Self::Blinky => grid.entrance_position(),
            Self::Pinky => center,
            Self::Inky => Position::new(center.x - 2.0, center.y),
            Self::Clyde => Position::new(center.x + 2.0, center.y),
        }
    }
}

/// Board facts a chase target depends on.
#[derive(Clone, Copy, Debug)]
pub struct TargetContext {
    pub player_cell: Cell,
    pub player_dir: Direction,
    pub blinky_cell: Cell,
}

/// Cell `cells` ahead of the player, shifted left by the same amount when the
/// player faces up (the arcade's overflow quirk).
fn ahead_of_player(ctx: &TargetContext, cells: i32) -> Cell {
    let ahead = ctx.player_cell.offset_by(ctx.player_dir, cells);
    if ctx.player_dir == Direction::Up {
        ahead.offset_by(Direction::Left, cells)
    } else {
        ahead
    }
}

pub fn chase_target(id: GhostId, own_cell: Cell, ctx: &TargetContext) -> Cell {
    match id {
        GhostId::Blinky => ctx.player_cell,
        GhostId::Pinky => ahead_of_player(ctx, PINKY_LOOKAHEAD),
        GhostId::Inky => {
            let pivot = ahead_of_player(ctx, INKY_LOOKAHEAD);
            Cell::new(
                ctx.blinky_cell.x + 2 * (pivot.x - ctx.blinky_cell.x),
                ctx.blinky_cell.y + 2 * (pivot.y - ctx.blinky_cell.y),
            )
        }
        GhostId::Clyde => {
            if own_cell.distance(ctx.player_cell) <= CLYDE_CHASE_RADIUS {
                ctx.player_cell
            } else {
                id.scatter_corner()
            }
        }
    }
}

/// Target for a strategy; `None` means the choice is random (frightened).
pub fn target_for(
    id: GhostId,
    strategy: Strategy,
    own_cell: Cell,
    ctx: &TargetContext,
    house_entrance: Cell,
) -> Option<Cell> {
    match strategy {
        Strategy::Chase => Some(chase_target(id, own_cell, ctx)),
        Strategy::Scatter => Some(id.scatter_corner()),
        Strategy::Eaten => Some(house_entrance),
        Strategy::Frightened => None,
    }
}

fn is_viable(grid: &TileGrid, cell: Cell, dir: Direction) -> bool {
    if dir == Direction::Up && grid.is_facelock(cell) {
        return false;
    }
    !grid.is_blocked(cell, dir)
}

/// One-step lookahead. Scans forward, left, right; the reverse is only taken at
/// a dead end. Ties go to the earlier direction in scan order.
pub fn select_path(
    grid: &TileGrid,
    cell: Cell,
    facing: Direction,
    target: Option<Cell>,
    rng: &mut Rng,
) -> Direction {
    let candidates = [facing, facing.left_of(), facing.right_of()];
    let viable: Vec<Direction> = candidates
        .into_iter()
        .filter(|dir| is_viable(grid, cell, *dir))
        .collect();

    let Some(target) = target else {
        return rng.pick(&viable).unwrap_or_else(|| facing.opposite_of());
    };

    let mut best: Option<(Direction, f32)> = None;
    for dir in viable {
        let distance = grid.neighbor(cell, dir).distance(target);
        match best {
            Some((_, best_distance)) if distance >= best_distance => {}
            _ => best = Some((dir, distance)),
        }
    }
    best.map(|(dir, _)| dir)
        .unwrap_or_else(|| facing.opposite_of())
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HouseLeg {
    ToCenter,
    ToDoor,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Lifecycle {
    Spawning { release_in_ms: u64 },
    Exiting(HouseLeg),
    Roaming,
    Entering(HouseLeg),
}

#[derive(Clone, Debug)]
pub struct Ghost {
    pub id: GhostId,
    pub position: Position,
    pub dir: Direction,
    strategy: Strategy,
    lifecycle: Lifecycle,
    decided_cell: Option<Cell>,
    rng: Rng,
}

impl Ghost {
    pub fn new(id: GhostId, grid: &TileGrid, seed: u32) -> Self {
        let mut ghost = Self {
            id,
            position: id.home_position(grid),
            dir: Direction::Left,
            strategy: Strategy::Scatter,
            lifecycle: Lifecycle::Roaming,
            decided_cell: None,
            rng: Rng::fork(seed, id.index() as u32 + 1),
        };
        ghost.reset(grid, Strategy::Scatter);
        ghost
    }

    /// Back to the start of a round. The RNG stream carries on.
    pub fn reset(&mut self, grid: &TileGrid, strategy: Strategy) {
        self.position = self.id.home_position(grid);
        self.strategy = strategy;
        self.decided_cell = None;
        if self.id == GhostId::Blinky {
            self.dir = Direction::Left;
            self.lifecycle = Lifecycle::Roaming;
        } else {
            self.dir = Direction::Up;
            self.lifecycle = Lifecycle::Spawning {
                release_in_ms: self.id.release_delay_ms(),
            };
        }
    }

    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    pub fn set_lifecycle(&mut self, lifecycle: Lifecycle) {
        self.lifecycle = lifecycle;
        self.decided_cell = None;
    }

    pub fn stage(&self) -> GhostStage {
        match self.lifecycle {
            Lifecycle::Spawning { .. } => GhostStage::Spawning,
            Lifecycle::Exiting(_) => GhostStage::Exiting,
            Lifecycle::Roaming => GhostStage::Roaming,
            Lifecycle::Entering(_) => GhostStage::Entering,
        }
    }

    pub fn is_roaming(&self) -> bool {
        self.lifecycle == Lifecycle::Roaming
    }

    pub fn is_frightened(&self) -> bool {
        self.strategy == Strategy::Frightened
    }

    pub fn is_eaten(&self) -> bool {
        self.strategy == Strategy::Eaten
    }

    pub fn cell(&self) -> Cell {
        self.position.cell()
    }

    /// Switches strategy. A roaming ghost turns around on every change except
    /// into `Eaten`. Returns whether anything changed.
    pub fn set_strategy(&mut self, next: Strategy) -> bool {
        if self.strategy == next {
            return false;
        }
        self.strategy = next;
        if self.is_roaming() && next != Strategy::Eaten && self.dir != Direction::None {
            self.dir = self.dir.opposite_of();
            self.decided_cell = None;
        }
        true
    }

    /// No-op for ghosts already frightened or eaten.
    pub fn frighten(&mut self) -> bool {
        if matches!(self.strategy, Strategy::Frightened | Strategy::Eaten) {
            return false;
        }
        self.set_strategy(Strategy::Frightened)
    }

    pub fn mark_eaten(&mut self) {
        self.set_strategy(Strategy::Eaten);
    }

    /// Counts down the release timer; returns true when the ghost starts its exit.
    pub fn tick_release(&mut self, dt_ms: u64) -> bool {
        let Lifecycle::Spawning { release_in_ms } = self.lifecycle else {
            return false;
        };
        let left = release_in_ms.saturating_sub(dt_ms);
        if left > 0 {
            self.lifecycle = Lifecycle::Spawning {
                release_in_ms: left,
            };
            return false;
        }
        self.lifecycle = Lifecycle::Exiting(HouseLeg::ToCenter);
        true
    }

    /// Releases a spawning ghost immediately.
    pub fn release(&mut self) -> bool {
        if !matches!(self.lifecycle, Lifecycle::Spawning { .. }) {
            return false;
        }
        self.lifecycle = Lifecycle::Exiting(HouseLeg::ToCenter);
        true
    }

    /// Picks a new facing if this cell has not been decided yet.
    pub fn decide_at(&mut self, grid: &TileGrid, target: Option<Cell>) -> bool {
        let cell = self.cell();
        if self.decided_cell == Some(cell) {
            return false;
        }
        self.dir = select_path(grid, cell, self.dir, target, &mut self.rng);
        self.decided_cell = Some(cell);
        true
    }

    pub fn view(&self) -> GhostView {
        GhostView {
            id: self.id,
            x: self.position.x,
            y: self.position.y,
            dir: self.dir,
            strategy: self.strategy,
            stage: self.stage(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const JUNCTION_LAYOUT: [&str; 8] = [
        "############",
        "############",
        "############",
        "############",
        "#####.######",
        "<....  ....>",
        "#####-######",
        "#####H######",
    ];

    fn junction_grid() -> TileGrid {
        TileGrid::parse(&JUNCTION_LAYOUT).expect("test layout parses")
    }

    fn ctx(player: Cell, dir: Direction, blinky: Cell) -> TargetContext {
        TargetContext {
            player_cell: player,
            player_dir: dir,
            blinky_cell: blinky,
        }
    }

    #[test]
    fn nearest_viable_neighbour_wins() {
        let grid = junction_grid();
        let mut rng = Rng::new(1);
        let chosen = select_path(
            &grid,
            Cell::new(5, 5),
            Direction::Right,
            Some(Cell::new(10, 5)),
            &mut rng,
        );
        assert_eq!(chosen, Direction::Right);

        let up = select_path(
            &grid,
            Cell::new(5, 5),
            Direction::Right,
            Some(Cell::new(5, -10)),
            &mut rng,
        );
        assert_eq!(up, Direction::Up);
    }

    #[test]
    fn reversal_only_at_dead_end() {
        let grid = junction_grid();
        let mut rng = Rng::new(1);
        // (5,4) is a stub: only the way back down is open
        let chosen = select_path(
            &grid,
            Cell::new(5, 4),
            Direction::Up,
            Some(Cell::new(5, -10)),
            &mut rng,
        );
        assert_eq!(chosen, Direction::Down);

        // target behind the ghost still does not make it turn around
        let forward = select_path(
            &grid,
            Cell::new(3, 5),
            Direction::Right,
            Some(Cell::new(0, 5)),
            &mut rng,
        );
        assert_eq!(forward, Direction::Right);
    }

    #[test]
    fn equal_distances_keep_scan_order() {
        let grid = TileGrid::classic();
        let mut rng = Rng::new(1);
        // (6,5) facing down: left (Right) and right (Left) are open, down too
        let target = Cell::new(6, 5).offset_by(Direction::Down, 10);
        let chosen = select_path(&grid, Cell::new(6, 5), Direction::Down, Some(target), &mut rng);
        assert_eq!(chosen, Direction::Down);
        let sideways = select_path(
            &grid,
            Cell::new(6, 5),
            Direction::Down,
            Some(Cell::new(6, 4)),
            &mut rng,
        );
        // (7,5) and (5,5) are equally far from (6,4); left of Down is Right
        assert_eq!(sideways, Direction::Right);
    }

    #[test]
    fn facelock_cells_forbid_up() {
        let grid = TileGrid::classic();
        let mut rng = Rng::new(1);
        let cell = Cell::new(12, 23);
        assert!(!grid.is_blocked(cell, Direction::Up));
        let chosen = select_path(&grid, cell, Direction::Left, Some(Cell::new(12, 0)), &mut rng);
        assert_ne!(chosen, Direction::Up);
    }

    #[test]
    fn frightened_choice_stays_viable_and_repeats_per_seed() {
        let grid = TileGrid::classic();
        let pick = |seed: u32| {
            let mut rng = Rng::new(seed);
            (0..32)
                .map(|_| select_path(&grid, Cell::new(6, 5), Direction::Down, None, &mut rng))
                .collect::<Vec<_>>()
        };
        let first = pick(3);
        assert_eq!(first, pick(3));
        assert!(first.iter().all(|dir| *dir != Direction::Up));
        assert!(first.contains(&Direction::Down));
    }

    #[test]
    fn chase_targets_follow_identity_rules() {
        let player = Cell::new(10, 20);
        let blinky = Cell::new(6, 18);
        let right = ctx(player, Direction::Right, blinky);
        assert_eq!(chase_target(GhostId::Blinky, blinky, &right), player);
        assert_eq!(
            chase_target(GhostId::Pinky, Cell::new(0, 0), &right),
            Cell::new(14, 20)
        );
        // pivot (12,20); doubled from (6,18) lands on (18,22)
        assert_eq!(
            chase_target(GhostId::Inky, Cell::new(0, 0), &right),
            Cell::new(18, 22)
        );

        let up = ctx(player, Direction::Up, blinky);
        assert_eq!(
            chase_target(GhostId::Pinky, Cell::new(0, 0), &up),
            Cell::new(6, 16)
        );
        // pivot (8,18)
        assert_eq!(
            chase_target(GhostId::Inky, Cell::new(0, 0), &up),
            Cell::new(10, 18)
        );
    }

    #[test]
    fn clyde_chases_only_inside_its_radius() {
        let player = Cell::new(10, 20);
        let context = ctx(player, Direction::Left, Cell::new(0, 0));
        // exactly on the radius still counts as close
        assert_eq!(
            chase_target(GhostId::Clyde, Cell::new(10, 12), &context),
            player
        );
        assert_eq!(
            chase_target(GhostId::Clyde, Cell::new(13, 17), &context),
            player
        );
        assert_eq!(
            chase_target(GhostId::Clyde, Cell::new(10, 11), &context),
            GhostId::Clyde.scatter_corner()
        );
    }

    #[test]
    fn target_depends_on_strategy() {
        let context = ctx(Cell::new(1, 1), Direction::Left, Cell::new(2, 2));
        let entrance = Cell::new(13, 11);
        let own = Cell::new(5, 5);
        assert_eq!(
            target_for(GhostId::Pinky, Strategy::Scatter, own, &context, entrance),
            Some(Cell::new(2, -3))
        );
        assert_eq!(
            target_for(GhostId::Pinky, Strategy::Eaten, own, &context, entrance),
            Some(entrance)
        );
        assert_eq!(
            target_for(GhostId::Pinky, Strategy::Frightened, own, &context, entrance),
            None
        );
    }

    #[test]
    fn strategy_flip_reverses_roaming_ghost() {
        let grid = TileGrid::classic();
        let mut ghost = Ghost::new(GhostId::Blinky, &grid, 7);
        ghost.dir = Direction::Up;
        assert!(ghost.set_strategy(Strategy::Chase));
        assert_eq!(ghost.dir, Direction::Down);
        assert!(!ghost.set_strategy(Strategy::Chase));
        assert_eq!(ghost.dir, Direction::Down);
    }

    #[test]
    fn becoming_eaten_keeps_heading() {
        let grid = TileGrid::classic();
        let mut ghost = Ghost::new(GhostId::Blinky, &grid, 7);
        ghost.frighten();
        assert_eq!(ghost.dir, Direction::Right);
        ghost.mark_eaten();
        assert_eq!(ghost.dir, Direction::Right);
        assert!(ghost.is_eaten());
    }

    #[test]
    fn frighten_is_idempotent() {
        let grid = TileGrid::classic();
        let mut ghost = Ghost::new(GhostId::Blinky, &grid, 7);
        assert!(ghost.frighten());
        let dir = ghost.dir;
        assert!(!ghost.frighten());
        assert_eq!(ghost.dir, dir);
        assert_eq!(ghost.strategy(), Strategy::Frightened);

        ghost.mark_eaten();
        assert!(!ghost.frighten());
        assert!(ghost.is_eaten());
    }

    #[test]
    fn house_ghosts_wait_for_release() {
        let grid = TileGrid::classic();
        let mut inky = Ghost::new(GhostId::Inky, &grid, 7);
        assert_eq!(inky.position, Position::new(12.0, 14.5));
        assert_eq!(inky.stage(), GhostStage::Spawning);
        assert!(!inky.tick_release(3_999));
        assert!(inky.tick_release(1));
        assert_eq!(inky.lifecycle(), Lifecycle::Exiting(HouseLeg::ToCenter));
        assert!(!inky.release());

        // no reversal while inside the house
        let mut clyde = Ghost::new(GhostId::Clyde, &grid, 7);
        clyde.set_strategy(Strategy::Chase);
        assert_eq!(clyde.dir, Direction::Up);
        assert!(clyde.release());
    }

    #[test]
    fn junction_is_decided_once_per_cell() {
        let grid = junction_grid();
        let mut ghost = Ghost::new(GhostId::Blinky, &grid, 7);
        ghost.position = Cell::new(5, 5).center();
        ghost.dir = Direction::Right;
        assert!(ghost.decide_at(&grid, Some(Cell::new(10, 5))));
        assert!(!ghost.decide_at(&grid, Some(Cell::new(5, -10))));
        assert_eq!(ghost.dir, Direction::Right);

        // a reversal clears the decision
        ghost.set_strategy(Strategy::Chase);
        assert!(ghost.decide_at(&grid, Some(Cell::new(0, 5))));
        assert_eq!(ghost.dir, Direction::Left);
    }
}
