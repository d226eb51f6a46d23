use crate::types::Direction;

pub const DEFAULT_PORT: u16 = 8080;

pub fn parse_port(raw: Option<&str>) -> u16 {
    raw.and_then(|value| value.trim().parse::<u16>().ok())
        .filter(|port| *port != 0)
        .unwrap_or(DEFAULT_PORT)
}

/// Accepts decimal or `0x` hex seeds.
pub fn parse_seed(raw: Option<&str>) -> Option<u32> {
    let value = raw?.trim();
    if let Some(hex) = value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))
    {
        return u32::from_str_radix(hex, 16).ok();
    }
    value.parse::<u32>().ok()
}

/// Client direction words are case-insensitive; anything unknown is ignored.
pub fn parse_direction(raw: &str) -> Option<Direction> {
    Direction::parse_move(&raw.trim().to_ascii_lowercase())
}

pub fn normalize_max_minutes(value: Option<u64>) -> u64 {
    value.unwrap_or(30).clamp(1, 240) * 60_000
}
