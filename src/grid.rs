use std::collections::HashSet;

use thiserror::Error;

use crate::types::{BoardInit, Cell, Direction, PickupKind, Position, TileKind};

/// The arcade maze, 28×31. See [`TileGrid::parse`] for the symbol table.
pub const CLASSIC_LAYOUT: [&str; 31] = [
    "############################",
    "#............##............#",
    "#.####.#####.##.#####.####.#",
    "#o####.#####.##.#####.####o#",
    "#.####.#####.##.#####.####.#",
    "#..........................#",
    "#.####.##.########.##.####.#",
    "#.####.##.########.##.####.#",
    "#......##....##....##......#",
    "######.##### ## #####.######",
    "######.##### ## #####.######",
    "######.##   ^  ^   ##.######",
    "######.## ###--### ##.######",
    "######.## #HHHHHH# ##.######",
    "<ttttt.   #HHHHHH#   .ttttt>",
    "######.## #HHHHHH# ##.######",
    "######.## ######## ##.######",
    "######.##          ##.######",
    "######.## ######## ##.######",
    "######.## ######## ##.######",
    "#............##............#",
    "#.####.#####.##.#####.####.#",
    "#.####.#####.##.#####.####.#",
    "#o..##......:  :......##..o#",
    "###.##.##.########.##.##.###",
    "###.##.##.########.##.##.###",
    "#......##....##....##......#",
    "#.##########.##.##########.#",
    "#.##########.##.##########.#",
    "#..........................#",
    "############################",
];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LayoutError {
    #[error("layout has no rows")]
    Empty,
    #[error("row {row} is {found} cells wide, expected {expected}")]
    RaggedRow {
        row: usize,
        found: usize,
        expected: usize,
    },
    #[error("unknown tile symbol {symbol:?} at ({x}, {y})")]
    UnknownSymbol { symbol: char, x: i32, y: i32 },
    #[error("layout needs exactly one left warp and one right warp on the same row")]
    Warps,
    #[error("layout has no ghost-house door")]
    MissingDoor,
    #[error("layout has no ghost-house interior")]
    MissingHouse,
    #[error("warps must sit on the left and right edges of an inner row")]
    WarpNotOnEdge,
    #[error("open cell ({x}, {y}) on the board edge")]
    OpenBorder { x: i32, y: i32 },
    #[error("house entrance ({x}, {y}) is not an open cell")]
    BlockedEntrance { x: i32, y: i32 },
    #[error("player start ({x}, {y}) is not an open cell")]
    BlockedStart { x: i32, y: i32 },
}

#[derive(Clone, Debug)]
pub struct Tile {
    pub cell: Cell,
    kind: TileKind,
    original: TileKind,
}

impl Tile {
    pub fn kind(&self) -> TileKind {
        self.kind
    }

    pub fn original_kind(&self) -> TileKind {
        self.original
    }

    pub fn is_wall(&self) -> bool {
        self.kind == TileKind::Wall
    }
}

#[derive(Clone, Debug)]
pub struct TileGrid {
    width: i32,
    height: i32,
    tiles: Vec<Tile>,
    left_warp: Cell,
    right_warp: Cell,
    tunnel: HashSet<Cell>,
    facelock: HashSet<Cell>,
    door: Vec<Cell>,
    house: Vec<Cell>,
    pickups_remaining: i32,
}

impl TileGrid {
    pub fn classic() -> Self {
        Self::parse(&CLASSIC_LAYOUT)
            .unwrap_or_else(|error| panic!("built-in maze layout is invalid: {error}"))
    }

    /// Builds a grid from ASCII rows.
    ///
    /// `#` wall, ` ` empty, `.` dot, `o` power pellet, `<`/`>` warps, `t` tunnel,
    /// `^` facelock, `:` dot on a facelock cell, `-` house door, `H` house interior.
    /// Door and interior cells are walls for pathing.
    pub fn parse<S: AsRef<str>>(rows: &[S]) -> Result<Self, LayoutError> {
        let Some(first) = rows.first() else {
            return Err(LayoutError::Empty);
        };
        let width = first.as_ref().chars().count();
        if width == 0 {
            return Err(LayoutError::Empty);
        }

        let mut tiles = Vec::with_capacity(width * rows.len());
        let mut left_warps = Vec::new();
        let mut right_warps = Vec::new();
        let mut tunnel = HashSet::new();
        let mut facelock = HashSet::new();
        let mut door = Vec::new();
        let mut house = Vec::new();

        for (row_idx, row) in rows.iter().enumerate() {
            let found = row.as_ref().chars().count();
            if found != width {
                return Err(LayoutError::RaggedRow {
                    row: row_idx,
                    found,
                    expected: width,
                });
            }
            let y = row_idx as i32;
            for (col_idx, symbol) in row.as_ref().chars().enumerate() {
                let x = col_idx as i32;
                let cell = Cell::new(x, y);
                let kind = match symbol {
                    '#' => TileKind::Wall,
                    ' ' => TileKind::Empty,
                    '.' => TileKind::Pickup(PickupKind::Dot),
                    'o' => TileKind::Pickup(PickupKind::PowerPellet),
                    '<' => {
                        left_warps.push(cell);
                        tunnel.insert(cell);
                        TileKind::LeftWarp
                    }
                    '>' => {
                        right_warps.push(cell);
                        tunnel.insert(cell);
                        TileKind::RightWarp
                    }
                    't' => {
                        tunnel.insert(cell);
                        TileKind::Empty
                    }
                    '^' => {
                        facelock.insert(cell);
                        TileKind::Empty
                    }
                    ':' => {
                        facelock.insert(cell);
                        TileKind::Pickup(PickupKind::Dot)
                    }
                    '-' => {
                        door.push(cell);
                        TileKind::Wall
                    }
                    'H' => {
                        house.push(cell);
                        TileKind::Wall
                    }
                    _ => return Err(LayoutError::UnknownSymbol { symbol, x, y }),
                };
                tiles.push(Tile {
                    cell,
                    kind,
                    original: kind,
                });
            }
        }

        let (left_warp, right_warp) = match (left_warps.as_slice(), right_warps.as_slice()) {
            ([left], [right]) if left.y == right.y => (*left, *right),
            _ => return Err(LayoutError::Warps),
        };
        if door.is_empty() {
            return Err(LayoutError::MissingDoor);
        }
        if house.is_empty() {
            return Err(LayoutError::MissingHouse);
        }
        let (width, height) = (width as i32, rows.len() as i32);
        if left_warp.x != 0
            || right_warp.x != width - 1
            || left_warp.y == 0
            || left_warp.y == height - 1
        {
            return Err(LayoutError::WarpNotOnEdge);
        }
        // only the warps may open onto the edge, so every neighbour lookup stays on the board
        if let Some(tile) = tiles.iter().find(|tile| {
            let Cell { x, y } = tile.cell;
            let edge = x == 0 || y == 0 || x == width - 1 || y == height - 1;
            edge && tile.kind != TileKind::Wall && tile.cell != left_warp && tile.cell != right_warp
        }) {
            return Err(LayoutError::OpenBorder {
                x: tile.cell.x,
                y: tile.cell.y,
            });
        }

        let mut grid = Self {
            width,
            height,
            tiles,
            left_warp,
            right_warp,
            tunnel,
            facelock,
            door,
            house,
            pickups_remaining: 0,
        };
        grid.pickups_remaining = grid.count_pickups();
        for cell in [grid.house_entrance(), grid.entrance_position().cell()] {
            if !grid.contains(cell) || grid.tile_at(cell).is_wall() {
                return Err(LayoutError::BlockedEntrance {
                    x: cell.x,
                    y: cell.y,
                });
            }
        }
        Ok(grid)
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn contains(&self, cell: Cell) -> bool {
        cell.x >= 0 && cell.y >= 0 && cell.x < self.width && cell.y < self.height
    }

    fn index_of(&self, cell: Cell) -> usize {
        assert!(
            self.contains(cell),
            "cell ({}, {}) is outside the {}x{} board",
            cell.x,
            cell.y,
            self.width,
            self.height
        );
        (cell.y * self.width + cell.x) as usize
    }

    pub fn tile_at(&self, cell: Cell) -> &Tile {
        &self.tiles[self.index_of(cell)]
    }

    pub fn kind_at(&self, cell: Cell) -> TileKind {
        self.tile_at(cell).kind
    }

    /// Adjacent cell in `dir`; the two warp cells neighbour each other through their open edge.
    pub fn neighbor(&self, cell: Cell, dir: Direction) -> Cell {
        assert!(
            dir != Direction::None,
            "no neighbour of ({}, {}) in Direction::None",
            cell.x,
            cell.y
        );
        if cell == self.left_warp && dir == Direction::Left {
            return self.right_warp;
        }
        if cell == self.right_warp && dir == Direction::Right {
            return self.left_warp;
        }
        let next = cell.offset(dir);
        assert!(
            self.contains(next),
            "neighbour of ({}, {}) towards {:?} leaves the board",
            cell.x,
            cell.y,
            dir
        );
        next
    }

    pub fn is_blocked(&self, cell: Cell, dir: Direction) -> bool {
        self.tile_at(self.neighbor(cell, dir)).is_wall()
    }

    /// Empties a pickup tile and returns what was on it.
    pub fn consume(&mut self, cell: Cell) -> Option<PickupKind> {
        let idx = self.index_of(cell);
        let TileKind::Pickup(kind) = self.tiles[idx].kind else {
            return None;
        };
        self.tiles[idx].kind = TileKind::Empty;
        self.pickups_remaining -= 1;
        Some(kind)
    }

    /// Restores every tile to its original kind.
    pub fn reset(&mut self) {
        for tile in &mut self.tiles {
            tile.kind = tile.original;
        }
        self.pickups_remaining = self.count_pickups();
    }

    pub fn pickups_remaining(&self) -> i32 {
        self.pickups_remaining
    }

    pub fn total_pickups(&self) -> i32 {
        self.tiles
            .iter()
            .filter(|tile| matches!(tile.original, TileKind::Pickup(_)))
            .count() as i32
    }

    fn count_pickups(&self) -> i32 {
        self.tiles
            .iter()
            .filter(|tile| matches!(tile.kind, TileKind::Pickup(_)))
            .count() as i32
    }

    pub fn is_tunnel(&self, cell: Cell) -> bool {
        self.tunnel.contains(&cell)
    }

    pub fn is_facelock(&self, cell: Cell) -> bool {
        self.facelock.contains(&cell)
    }

    pub fn left_warp(&self) -> Cell {
        self.left_warp
    }

    pub fn right_warp(&self) -> Cell {
        self.right_warp
    }

    pub fn door_cells(&self) -> &[Cell] {
        &self.door
    }

    pub fn house_cells(&self) -> &[Cell] {
        &self.house
    }

    /// Centre of the house interior's bounding box.
    pub fn house_center(&self) -> Position {
        let (min_x, max_x, min_y, max_y) = bounds(&self.house);
        Position::new(
            (min_x + max_x + 1) as f32 / 2.0,
            (min_y + max_y + 1) as f32 / 2.0,
        )
    }

    /// Cell above the left half of the door; eaten pursuers path towards it.
    pub fn house_entrance(&self) -> Cell {
        let (min_x, _, min_y, _) = bounds(&self.door);
        Cell::new(min_x, min_y - 1)
    }

    /// Point straddling the door's width, one row above it.
    pub fn entrance_position(&self) -> Position {
        let (min_x, max_x, min_y, _) = bounds(&self.door);
        Position::new((min_x + max_x + 1) as f32 / 2.0, min_y as f32 - 0.5)
    }

    /// Folds a position that crossed a warp edge back onto the board.
    pub fn wrap_position(&self, position: Position) -> Position {
        let width = self.width as f32;
        let mut x = position.x;
        if x < 0.0 {
            x += width;
        } else if x >= width {
            x -= width;
        }
        Position::new(x, position.y)
    }

    pub fn open_cells(&self) -> impl Iterator<Item = Cell> + '_ {
        self.tiles
            .iter()
            .filter(|tile| !tile.is_wall())
            .map(|tile| tile.cell)
    }

    pub fn rows(&self) -> Vec<String> {
        (0..self.height)
            .map(|y| {
                (0..self.width)
                    .map(|x| self.symbol_at(Cell::new(x, y)))
                    .collect::<String>()
            })
            .collect()
    }

    fn symbol_at(&self, cell: Cell) -> char {
        if self.door.contains(&cell) {
            return '-';
        }
        if self.house.contains(&cell) {
            return 'H';
        }
        self.kind_at(cell).symbol()
    }

    pub fn to_board_init(&self) -> BoardInit {
        BoardInit {
            width: self.width,
            height: self.height,
            tiles: self.rows(),
        }
    }
}

fn bounds(cells: &[Cell]) -> (i32, i32, i32, i32) {
    let min_x = cells.iter().map(|cell| cell.x).min().unwrap_or(0);
    let max_x = cells.iter().map(|cell| cell.x).max().unwrap_or(0);
    let min_y = cells.iter().map(|cell| cell.y).min().unwrap_or(0);
    let max_y = cells.iter().map(|cell| cell.y).max().unwrap_or(0);
    (min_x, max_x, min_y, max_y)
}
