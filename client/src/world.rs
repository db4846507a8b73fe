//! Local mirror of the shared world.
//!
//! There is exactly one record per player, held in the global registry. The
//! current-map subset is an id set into that registry, so a player can never
//! be in the zone without a registry entry, and every position or name update
//! is visible through both views at once.

use log::debug;
use shared::{
    world_bounds, MapData, Monster, Player, Position, Stats, DEFAULT_MAP_ID, DEFAULT_PLAYER_COLOR,
};
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Where the local player stands before the server says otherwise.
pub const DEFAULT_SPAWN: Position = Position {
    x: 1000.0,
    y: 1000.0,
};

#[derive(Debug, Clone)]
pub struct WorldState {
    local_id: Option<String>,
    players: HashMap<String, Player>,
    zone: BTreeSet<String>,
    mobs: BTreeMap<String, Monster>,
    mob_types: HashMap<String, serde_json::Value>,
    map: Option<MapData>,
    current_map_id: String,
    predicted: Position,
    stats: Option<Stats>,
    stale: bool,
}

/// Owned per-frame view handed to presentation.
#[derive(Debug, Clone, PartialEq)]
pub struct WorldSnapshot {
    pub local_id: Option<String>,
    pub current_map_id: String,
    pub predicted: Position,
    pub players_in_current_map: Vec<Player>,
    pub total_players: usize,
    pub mobs: Vec<Monster>,
    pub map: Option<MapData>,
    pub stats: Option<Stats>,
    pub stale: bool,
}

impl WorldState {
    pub fn new() -> Self {
        Self {
            local_id: None,
            players: HashMap::new(),
            zone: BTreeSet::new(),
            mobs: BTreeMap::new(),
            mob_types: HashMap::new(),
            map: None,
            current_map_id: DEFAULT_MAP_ID.to_string(),
            predicted: DEFAULT_SPAWN,
            stats: None,
            stale: false,
        }
    }

    pub fn local_id(&self) -> Option<&str> {
        self.local_id.as_deref()
    }

    pub fn is_local(&self, player_id: &str) -> bool {
        self.local_id.as_deref() == Some(player_id)
    }

    pub fn local_player(&self) -> Option<&Player> {
        self.local_id.as_ref().and_then(|id| self.players.get(id))
    }

    pub fn current_map_id(&self) -> &str {
        &self.current_map_id
    }

    pub fn predicted_position(&self) -> Position {
        self.predicted
    }

    pub fn players(&self) -> &HashMap<String, Player> {
        &self.players
    }

    pub fn player(&self, player_id: &str) -> Option<&Player> {
        self.players.get(player_id)
    }

    /// Players rendered as co-located with us, in id order.
    pub fn players_in_current_map(&self) -> impl Iterator<Item = &Player> + '_ {
        self.zone.iter().filter_map(move |id| self.players.get(id))
    }

    pub fn zone_ids(&self) -> &BTreeSet<String> {
        &self.zone
    }

    pub fn is_in_current_map(&self, player_id: &str) -> bool {
        self.zone.contains(player_id)
    }

    pub fn mobs(&self) -> &BTreeMap<String, Monster> {
        &self.mobs
    }

    pub fn mob(&self, mob_id: &str) -> Option<&Monster> {
        self.mobs.get(mob_id)
    }

    pub fn mob_types(&self) -> &HashMap<String, serde_json::Value> {
        &self.mob_types
    }

    pub fn map(&self) -> Option<&MapData> {
        self.map.as_ref()
    }

    pub fn bounds(&self) -> (f32, f32) {
        world_bounds(self.map.as_ref())
    }

    pub fn stats(&self) -> Option<&Stats> {
        self.stats.as_ref()
    }

    /// True between a connection loss and the next `init`.
    pub fn is_stale(&self) -> bool {
        self.stale
    }

    pub fn snapshot(&self) -> WorldSnapshot {
        WorldSnapshot {
            local_id: self.local_id.clone(),
            current_map_id: self.current_map_id.clone(),
            predicted: self.predicted,
            players_in_current_map: self.players_in_current_map().cloned().collect(),
            total_players: self.players.len(),
            mobs: self.mobs.values().cloned().collect(),
            map: self.map.clone(),
            stats: self.stats.clone(),
            stale: self.stale,
        }
    }

    pub(crate) fn reset(&mut self) {
        *self = Self::new();
    }

    pub(crate) fn mark_stale(&mut self) {
        self.stale = true;
    }

    pub(crate) fn set_local_id(&mut self, player_id: &str) {
        self.local_id = Some(player_id.to_string());
    }

    pub(crate) fn set_current_map(&mut self, map_id: &str) {
        self.current_map_id = map_id.to_string();
    }

    pub(crate) fn replace_players(&mut self, players: HashMap<String, Player>) {
        self.players = players
            .into_iter()
            .map(|(id, player)| {
                let player = player.with_id(&id);
                (id, player)
            })
            .collect();
    }

    /// Inserts or overwrites a record and re-derives its zone membership.
    /// The local record keeps its predicted position.
    pub(crate) fn upsert_player(&mut self, player_id: &str, player: Player) {
        let mut player = player.with_id(player_id);
        if self.is_local(player_id) {
            player.x = self.predicted.x;
            player.y = self.predicted.y;
        }
        self.players.insert(player_id.to_string(), player);
        self.refresh_membership(player_id);
    }

    /// Overwrites the local record verbatim, position included.
    pub(crate) fn replace_local_player(&mut self, player: Player) {
        let player_id = player.id.clone();
        self.players.insert(player_id.clone(), player);
        self.zone.insert(player_id);
    }

    pub(crate) fn player_mut(&mut self, player_id: &str) -> Option<&mut Player> {
        self.players.get_mut(player_id)
    }

    pub(crate) fn remove_player(&mut self, player_id: &str) -> Option<Player> {
        self.zone.remove(player_id);
        self.players.remove(player_id)
    }

    pub(crate) fn refresh_membership(&mut self, player_id: &str) {
        let here = self
            .players
            .get(player_id)
            .map_or(false, |p| p.current_map == self.current_map_id);
        if here {
            self.zone.insert(player_id.to_string());
        } else {
            self.zone.remove(player_id);
        }
    }

    pub(crate) fn remove_from_zone(&mut self, player_id: &str) {
        self.zone.remove(player_id);
    }

    pub(crate) fn clear_zone(&mut self) {
        self.zone.clear();
    }

    pub(crate) fn replace_zone<I>(&mut self, player_ids: I)
    where
        I: IntoIterator<Item = String>,
    {
        self.zone = player_ids.into_iter().collect();
    }

    /// Rebuilds the zone purely from registry `current_map` fields.
    pub(crate) fn rebuild_zone(&mut self) {
        let current = &self.current_map_id;
        self.zone = self
            .players
            .iter()
            .filter(|(_, p)| &p.current_map == current)
            .map(|(id, _)| id.clone())
            .collect();
    }

    /// Moves the predicted position and mirrors it into the local record.
    pub(crate) fn set_predicted(&mut self, position: Position) {
        self.predicted = position;
        if let Some(local_id) = self.local_id.as_ref() {
            if let Some(player) = self.players.get_mut(local_id) {
                player.x = position.x;
                player.y = position.y;
            }
        }
    }

    pub(crate) fn replace_mobs(&mut self, mobs: BTreeMap<String, Monster>) {
        self.mobs = mobs
            .into_iter()
            .map(|(id, mob)| {
                let mob = mob.with_id(&id);
                (id, mob)
            })
            .collect();
    }

    pub(crate) fn damage_mob(&mut self, mob_id: &str, damage: i64) -> Option<&Monster> {
        let mob = self.mobs.get_mut(mob_id)?;
        mob.apply_damage(damage);
        Some(mob)
    }

    pub(crate) fn set_mob_types(&mut self, mob_types: HashMap<String, serde_json::Value>) {
        self.mob_types = mob_types;
    }

    pub(crate) fn set_map(&mut self, map: Option<MapData>) {
        self.map = map;
    }

    pub(crate) fn set_stats(&mut self, stats: Option<Stats>) {
        if let Some(local_id) = self.local_id.as_ref() {
            if let Some(player) = self.players.get_mut(local_id) {
                player.stats = stats.clone();
            }
        }
        self.stats = stats;
    }

    /// Returns false when there are no stats to update yet.
    pub(crate) fn set_local_hp(&mut self, hp: i64) -> bool {
        match self.stats.as_mut() {
            Some(stats) => {
                stats.hp = hp;
                let stats = stats.clone();
                if let Some(player) = self.local_id.as_ref().and_then(|id| self.players.get_mut(id)) {
                    player.stats = Some(stats);
                }
                true
            }
            None => false,
        }
    }

    /// Re-establishes the zone invariants after any handler that can touch
    /// membership:
    /// - the local player exists in the registry once known
    /// - zone ids all resolve to registry records on the current map
    /// - the local player is always in the zone
    pub(crate) fn restore_invariants(&mut self) {
        if let Some(local_id) = self.local_id.clone() {
            if !self.players.contains_key(&local_id) {
                debug!("Local player {} missing from registry, re-adding", local_id);
                let mut me = Player::new(
                    &local_id,
                    self.predicted.x,
                    self.predicted.y,
                    &self.current_map_id,
                );
                me.color = DEFAULT_PLAYER_COLOR.to_string();
                me.stats = self.stats.clone();
                self.players.insert(local_id, me);
            }
        }

        let players = &self.players;
        let current = &self.current_map_id;
        let local = self.local_id.as_deref();
        self.zone.retain(|id| {
            Some(id.as_str()) == local || players.get(id).map_or(false, |p| &p.current_map == current)
        });
        if let Some(local) = local {
            self.zone.insert(local.to_string());
        }
    }
}

impl Default for WorldState {
    fn default() -> Self {
        Self::new()
    }
}
