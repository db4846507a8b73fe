use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};

pub mod protocol;

pub use protocol::{
    decode_server_message, encode_client_message, ClientMessage, ProtocolError, ServerMessage,
};

pub const DEFAULT_MAP_ID: &str = "map1";
pub const FALLBACK_WORLD_WIDTH: f32 = 2000.0;
pub const FALLBACK_WORLD_HEIGHT: f32 = 2000.0;
pub const DEFAULT_TILE_SIZE: u32 = 50;
pub const DEFAULT_PLAYER_COLOR: &str = "hsl(180, 70%, 50%)";
pub const DEFAULT_ATTACK_DAMAGE: i64 = 10;
pub const DEFAULT_ATTACK_RANGE: f32 = 100.0;
pub const MAX_NAME_LEN: usize = 20;
pub const MAX_CHAT_LEN: usize = 100;

fn default_map_id() -> String {
    DEFAULT_MAP_ID.to_string()
}

fn default_tile_size() -> u32 {
    DEFAULT_TILE_SIZE
}

/// Integer field that also accepts a JSON float, truncated toward zero.
pub(crate) fn lenient_int<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f as i64))
            .ok_or_else(|| D::Error::custom(format!("integer out of range: {}", n))),
        other => Err(D::Error::custom(format!("expected a number, got {}", other))),
    }
}

fn tile_id(cell: &Value) -> u32 {
    match cell {
        Value::Number(n) => n.as_u64().and_then(|id| u32::try_from(id).ok()).unwrap_or(0),
        Value::String(s) => s.trim().parse().unwrap_or(0),
        _ => 0,
    }
}

/// Tile grid where nulls, non-numeric ids and malformed rows read as tile 0
/// instead of failing the enclosing message.
fn lenient_tiles<'de, D>(deserializer: D) -> Result<Vec<Vec<u32>>, D::Error>
where
    D: Deserializer<'de>,
{
    let Value::Array(rows) = Value::deserialize(deserializer)? else {
        return Ok(Vec::new());
    };
    Ok(rows
        .iter()
        .map(|row| match row {
            Value::Array(cells) => cells.iter().map(tile_id).collect(),
            _ => Vec::new(),
        })
        .collect())
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Default)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

impl Position {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance_to(&self, other: Position) -> f32 {
        distance(self.x, self.y, other.x, other.y)
    }
}

pub fn distance(x1: f32, y1: f32, x2: f32, y2: f32) -> f32 {
    let dx = x2 - x1;
    let dy = y2 - y1;
    (dx * dx + dy * dy).sqrt()
}

/// Combat and progression stats pushed by the server in `stats_update`.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct Stats {
    #[serde(default, deserialize_with = "lenient_int")]
    pub hp: i64,
    #[serde(default, deserialize_with = "lenient_int")]
    pub max_hp: i64,
    #[serde(default, deserialize_with = "lenient_int")]
    pub damage: i64,
    #[serde(default)]
    pub range: f32,
    #[serde(default)]
    pub attack_speed: f32,
    #[serde(default, deserialize_with = "lenient_int")]
    pub exp: i64,
    #[serde(default, deserialize_with = "lenient_int")]
    pub expnext: i64,
}

impl Stats {
    /// Damage to put on an outgoing attack request.
    pub fn attack_damage(&self) -> i64 {
        if self.damage > 0 {
            self.damage
        } else {
            DEFAULT_ATTACK_DAMAGE
        }
    }

    /// Targeting radius; a zero or missing range falls back to the default.
    pub fn attack_range(&self) -> f32 {
        if self.range > 0.0 && self.range.is_finite() {
            self.range
        } else {
            DEFAULT_ATTACK_RANGE
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Player {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub x: f32,
    #[serde(default)]
    pub y: f32,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub color: String,
    #[serde(default = "default_map_id")]
    pub current_map: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stats: Option<Stats>,
}

impl Player {
    pub fn new(id: &str, x: f32, y: f32, current_map: &str) -> Self {
        Self {
            id: id.to_string(),
            x,
            y,
            name: String::new(),
            color: String::new(),
            current_map: current_map.to_string(),
            stats: None,
        }
    }

    pub fn position(&self) -> Position {
        Position::new(self.x, self.y)
    }

    /// Registry maps are keyed by id and the server often omits `id` inside
    /// the record itself. The key wins over whatever the record carries.
    pub fn with_id(mut self, id: &str) -> Self {
        self.id = id.to_string();
        self
    }

    pub fn display_name(&self) -> &str {
        if self.name.is_empty() {
            &self.id
        } else {
            &self.name
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Monster {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub x: f32,
    #[serde(default)]
    pub y: f32,
    #[serde(default, deserialize_with = "lenient_int")]
    pub current_hp: i64,
    #[serde(default, deserialize_with = "lenient_int")]
    pub max_hp: i64,
    #[serde(default)]
    pub is_alive: bool,
    #[serde(default)]
    pub type_id: String,
    #[serde(default)]
    pub image: String,
}

impl Monster {
    pub fn new(id: &str, x: f32, y: f32, hp: i64) -> Self {
        Self {
            id: id.to_string(),
            x,
            y,
            current_hp: hp,
            max_hp: hp,
            is_alive: true,
            type_id: String::new(),
            image: String::new(),
        }
    }

    pub fn position(&self) -> Position {
        Position::new(self.x, self.y)
    }

    pub fn with_id(mut self, id: &str) -> Self {
        self.id = id.to_string();
        self
    }

    /// Subtracts `damage` and keeps hp inside `[0, max_hp]`.
    pub fn apply_damage(&mut self, damage: i64) {
        let ceiling = self.max_hp.max(0);
        self.current_hp = self.current_hp.saturating_sub(damage).clamp(0, ceiling);
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct TileType {
    #[serde(default)]
    pub image: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct MapData {
    #[serde(default, alias = "map_id")]
    pub id: String,
    #[serde(default)]
    pub width: u32,
    #[serde(default)]
    pub height: u32,
    #[serde(default = "default_tile_size")]
    pub tile_size: u32,
    #[serde(default)]
    pub pixel_width: u32,
    #[serde(default)]
    pub pixel_height: u32,
    #[serde(default, deserialize_with = "lenient_tiles")]
    pub tiles: Vec<Vec<u32>>,
    #[serde(default)]
    pub tile_types: HashMap<String, TileType>,
    #[serde(default)]
    pub portals: BTreeMap<String, Position>,
}

impl MapData {
    pub fn new(id: &str, pixel_width: u32, pixel_height: u32) -> Self {
        Self {
            id: id.to_string(),
            width: pixel_width / DEFAULT_TILE_SIZE,
            height: pixel_height / DEFAULT_TILE_SIZE,
            tile_size: DEFAULT_TILE_SIZE,
            pixel_width,
            pixel_height,
            tiles: Vec::new(),
            tile_types: HashMap::new(),
            portals: BTreeMap::new(),
        }
    }

    /// Movement bounds in pixels. Each axis falls back independently when
    /// the server left it unset.
    pub fn bounds(&self) -> (f32, f32) {
        let width = if self.pixel_width > 0 {
            self.pixel_width as f32
        } else {
            FALLBACK_WORLD_WIDTH
        };
        let height = if self.pixel_height > 0 {
            self.pixel_height as f32
        } else {
            FALLBACK_WORLD_HEIGHT
        };
        (width, height)
    }

    /// Tile type id at a grid cell; holes in the grid read as tile 0.
    pub fn tile_at(&self, col: usize, row: usize) -> u32 {
        self.tiles
            .get(row)
            .and_then(|r| r.get(col))
            .copied()
            .unwrap_or(0)
    }
}

/// Bounds for an optional map, used before the first map arrives.
pub fn world_bounds(map: Option<&MapData>) -> (f32, f32) {
    match map {
        Some(map) => map.bounds(),
        None => (FALLBACK_WORLD_WIDTH, FALLBACK_WORLD_HEIGHT),
    }
}

/// Monster payload attached to `map_change`.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct MobData {
    #[serde(default)]
    pub mobs: BTreeMap<String, Monster>,
    #[serde(default)]
    pub mob_types: HashMap<String, serde_json::Value>,
}
