use crate::constants::CELL_CENTER_THRESHOLD;
use crate::types::{Direction, Position};

/// Signed distance from `position` to the centre of its own cell, measured along `dir`.
pub(super) fn along_to_center(position: Position, dir: Direction) -> f32 {
    let center = position.cell().center();
    let (dx, dy) = dir.delta();
    (center.x - position.x) * dx as f32 + (center.y - position.y) * dy as f32
}

/// How far an actor heading `dir` travels before it sits on a cell centre again.
pub(super) fn distance_to_next_center(position: Position, dir: Direction) -> f32 {
    let ahead = along_to_center(position, dir);
    if ahead > CELL_CENTER_THRESHOLD {
        ahead
    } else {
        ahead + 1.0
    }
}

pub(super) fn is_centered(position: Position) -> bool {
    position.distance(position.cell().center()) <= CELL_CENTER_THRESHOLD
}

/// Moves in a straight line towards `waypoint`; returns the new position and
/// whether the waypoint was reached.
pub(super) fn step_towards(position: Position, waypoint: Position, distance: f32) -> (Position, bool) {
    let gap = position.distance(waypoint);
    if gap <= distance || gap <= f32::EPSILON {
        return (waypoint, true);
    }
    let ratio = distance / gap;
    (
        Position::new(
            position.x + (waypoint.x - position.x) * ratio,
            position.y + (waypoint.y - position.y) * ratio,
        ),
        false,
    )
}

/// Dominant axis of travel, used as the facing for scripted house moves.
pub(super) fn facing_towards(from: Position, to: Position) -> Direction {
    let dx = to.x - from.x;
    let dy = to.y - from.y;
    if dx.abs() <= f32::EPSILON && dy.abs() <= f32::EPSILON {
        return Direction::None;
    }
    if dx.abs() >= dy.abs() {
        if dx > 0.0 {
            Direction::Right
        } else {
            Direction::Left
        }
    } else if dy > 0.0 {
        Direction::Down
    } else {
        Direction::Up
    }
}
