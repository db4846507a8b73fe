//! JSON wire protocol spoken with the zone server.
//!
//! Every frame is a flat JSON object with a string `type` discriminant. Field
//! names are the server's contract and must not be renamed.

use crate::{MapData, MobData, Monster, Player, Position, Stats};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("malformed message: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Server → client events.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    Init {
        player_id: String,
        #[serde(default)]
        players: HashMap<String, Player>,
        #[serde(default)]
        map: Option<MapData>,
        #[serde(default)]
        mob_types: HashMap<String, serde_json::Value>,
        #[serde(default)]
        mobs: BTreeMap<String, Monster>,
    },
    PlayerJoined {
        player_id: String,
        player_data: Player,
    },
    PlayerChangedMap {
        player_id: String,
        old_map: String,
        new_map: String,
        #[serde(default)]
        player_data: Option<Player>,
    },
    MapPlayersList {
        #[serde(default)]
        players: HashMap<String, Player>,
    },
    PlayerRenamed {
        player_id: String,
        #[serde(default)]
        player_name: Option<String>,
        #[serde(default)]
        name: Option<String>,
    },
    PlayerMoved {
        player_id: String,
        x: f32,
        y: f32,
    },
    PlayerLeft {
        player_id: String,
    },
    MapChange {
        map: MapData,
        new_position: Position,
        #[serde(default)]
        mob_data: Option<MobData>,
    },
    MobUpdate {
        #[serde(default)]
        mobs: BTreeMap<String, Monster>,
    },
    AttackResult {
        target_id: String,
        #[serde(deserialize_with = "crate::lenient_int")]
        damage: i64,
    },
    MobKilled {
        killer_id: String,
        target_id: String,
        #[serde(default, deserialize_with = "crate::lenient_int")]
        exp_gained: i64,
        #[serde(default)]
        level_up: Option<bool>,
        #[serde(default)]
        new_level: Option<i64>,
    },
    MobAttack {
        mob_id: String,
        target_player_id: String,
        #[serde(deserialize_with = "crate::lenient_int")]
        damage: i64,
    },
    PlayerDamaged {
        player_id: String,
        #[serde(deserialize_with = "crate::lenient_int")]
        current_hp: i64,
        #[serde(deserialize_with = "crate::lenient_int")]
        damage: i64,
    },
    StatsUpdate {
        stats: Stats,
    },
    Chat {
        #[serde(default)]
        player_id: Option<String>,
        #[serde(default)]
        player_name: Option<String>,
        text: String,
    },
    Pong {},
    /// Any discriminant this client does not know about.
    #[serde(other)]
    Unknown,
}

impl ServerMessage {
    pub fn kind(&self) -> &'static str {
        match self {
            ServerMessage::Init { .. } => "init",
            ServerMessage::PlayerJoined { .. } => "player_joined",
            ServerMessage::PlayerChangedMap { .. } => "player_changed_map",
            ServerMessage::MapPlayersList { .. } => "map_players_list",
            ServerMessage::PlayerRenamed { .. } => "player_renamed",
            ServerMessage::PlayerMoved { .. } => "player_moved",
            ServerMessage::PlayerLeft { .. } => "player_left",
            ServerMessage::MapChange { .. } => "map_change",
            ServerMessage::MobUpdate { .. } => "mob_update",
            ServerMessage::AttackResult { .. } => "attack_result",
            ServerMessage::MobKilled { .. } => "mob_killed",
            ServerMessage::MobAttack { .. } => "mob_attack",
            ServerMessage::PlayerDamaged { .. } => "player_damaged",
            ServerMessage::StatsUpdate { .. } => "stats_update",
            ServerMessage::Chat { .. } => "chat",
            ServerMessage::Pong {} => "pong",
            ServerMessage::Unknown => "unknown",
        }
    }
}

/// Client → server requests.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    Move {
        x: f32,
        y: f32,
    },
    Attack {
        target_id: String,
        damage: i64,
        range: f32,
    },
    UsePortal {
        portal_id: String,
    },
    SetName {
        name: String,
    },
    TakeDamage {
        damage: i64,
    },
    RequestMapPlayers {},
    Chat {
        text: String,
    },
    Ping {},
    AuthLogin {
        token: String,
    },
}

pub fn decode_server_message(text: &str) -> Result<ServerMessage, ProtocolError> {
    Ok(serde_json::from_str(text)?)
}

pub fn encode_client_message(message: &ClientMessage) -> Result<String, ProtocolError> {
    Ok(serde_json::to_string(message)?)
}
