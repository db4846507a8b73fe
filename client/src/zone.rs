//! Portal proximity detection and atomic map transitions.

use crate::scheduler::{Deferred, Scheduler, TimerId};
use crate::world::WorldState;
use log::{info, warn};
use shared::{MapData, MobData, Player, Position, DEFAULT_PLAYER_COLOR};
use std::time::{Duration, Instant};

#[derive(Debug)]
pub struct ZoneTransitionController {
    cooldown: Duration,
    poll_interval: Duration,
    radius: f32,
    roster_delay: Duration,
    last_use: Option<Instant>,
    last_poll: Option<Instant>,
    roster_timer: Option<TimerId>,
}

impl ZoneTransitionController {
    pub fn new(
        cooldown: Duration,
        poll_interval: Duration,
        radius: f32,
        roster_delay: Duration,
    ) -> Self {
        Self {
            cooldown,
            poll_interval,
            radius,
            roster_delay,
            last_use: None,
            last_poll: None,
            roster_timer: None,
        }
    }

    pub fn is_on_cooldown(&self, now: Instant) -> bool {
        !self.cooldown_remaining(now).is_zero()
    }

    pub fn cooldown_remaining(&self, now: Instant) -> Duration {
        match self.last_use {
            Some(last) => self
                .cooldown
                .saturating_sub(now.saturating_duration_since(last)),
            None => Duration::ZERO,
        }
    }

    /// Pending roster request from the last map change, if it has not fired.
    pub fn roster_timer(&self) -> Option<TimerId> {
        self.roster_timer
    }

    /// Proximity check, rate-limited to the poll interval. Returns the portal
    /// to use and starts the cooldown.
    pub fn poll(&mut self, world: &WorldState, now: Instant) -> Option<String> {
        if let Some(last) = self.last_poll {
            if now.saturating_duration_since(last) < self.poll_interval {
                return None;
            }
        }
        self.last_poll = Some(now);

        if self.is_on_cooldown(now) {
            return None;
        }

        let origin = world.local_player()?.position();
        let map = world.map()?;
        let portal_id = map
            .portals
            .iter()
            .find(|(_, portal)| origin.distance_to(**portal) < self.radius)
            .map(|(id, _)| id.clone())?;

        self.last_use = Some(now);
        info!("Entering portal {}", portal_id);
        Some(portal_id)
    }

    /// Applies a server-driven map change in one step. Returns false if the
    /// message was rejected.
    #[allow(clippy::too_many_arguments)]
    pub fn apply_map_change(
        &mut self,
        world: &mut WorldState,
        scheduler: &mut Scheduler,
        now: Instant,
        map: MapData,
        new_position: Position,
        mob_data: Option<MobData>,
        fallback_name: Option<&str>,
    ) -> bool {
        if map.id.is_empty() {
            warn!("Ignoring map_change without a map id");
            return false;
        }

        let previous = world.local_player().cloned();
        let stats = previous
            .as_ref()
            .and_then(|p| p.stats.clone())
            .or_else(|| world.stats().cloned());

        world.set_current_map(&map.id);
        world.clear_zone();
        world.set_predicted(new_position);

        if let Some(local_id) = world.local_id().map(str::to_string) {
            let mut me = Player::new(&local_id, new_position.x, new_position.y, &map.id);
            me.name = previous
                .as_ref()
                .map(|p| p.name.clone())
                .filter(|name| !name.is_empty())
                .or_else(|| fallback_name.map(str::to_string))
                .unwrap_or_default();
            me.color = previous
                .as_ref()
                .map(|p| p.color.clone())
                .filter(|color| !color.is_empty())
                .unwrap_or_else(|| DEFAULT_PLAYER_COLOR.to_string());
            me.stats = stats;
            world.replace_local_player(me);
        }

        info!(
            "Map change to {} at ({:.1}, {:.1})",
            map.id, new_position.x, new_position.y
        );
        world.set_map(Some(map));
        if let Some(mob_data) = mob_data {
            world.replace_mobs(mob_data.mobs);
            world.set_mob_types(mob_data.mob_types);
        }
        world.restore_invariants();

        if let Some(previous_timer) = self.roster_timer.take() {
            scheduler.cancel(previous_timer);
        }
        self.roster_timer =
            Some(scheduler.schedule(now, self.roster_delay, Deferred::RequestMapPlayers));
        self.last_poll = Some(now);
        true
    }

    /// Called once the roster request has gone out.
    pub fn roster_sent(&mut self) {
        self.roster_timer = None;
    }

    pub fn reset(&mut self) {
        self.last_poll = None;
        self.roster_timer = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::{Monster, Stats};
    use std::collections::{BTreeMap, HashMap};

    fn controller() -> ZoneTransitionController {
        ZoneTransitionController::new(
            Duration::from_millis(3000),
            Duration::from_millis(300),
            50.0,
            Duration::from_millis(100),
        )
    }

    fn world_with_portals(x: f32, y: f32, portals: &[(&str, f32, f32)]) -> WorldState {
        let mut world = WorldState::new();
        world.set_local_id("p1");
        let mut me = Player::new("p1", x, y, "map1");
        me.name = "alice".to_string();
        me.color = "red".to_string();
        let mut players = HashMap::new();
        players.insert("p1".to_string(), me);
        players.insert("p2".to_string(), Player::new("p2", 0.0, 0.0, "map1"));
        world.replace_players(players);
        world.rebuild_zone();
        world.set_predicted(Position::new(x, y));

        let mut map = MapData::new("map1", 2000, 2000);
        for (id, px, py) in portals {
            map.portals.insert(id.to_string(), Position::new(*px, *py));
        }
        world.set_map(Some(map));
        world
    }

    #[test]
    fn test_portal_radius_is_strict() {
        let start = Instant::now();
        let world = world_with_portals(100.0, 100.0, &[("gate", 150.0, 100.0)]);
        let mut zone = controller();
        assert!(zone.poll(&world, start).is_none());

        let world = world_with_portals(100.1, 100.0, &[("gate", 150.0, 100.0)]);
        let mut zone = controller();
        assert_eq!(zone.poll(&world, start).as_deref(), Some("gate"));
    }

    #[test]
    fn test_first_portal_in_id_order_wins() {
        let world = world_with_portals(100.0, 100.0, &[("b", 110.0, 100.0), ("a", 130.0, 100.0)]);
        let mut zone = controller();
        assert_eq!(zone.poll(&world, Instant::now()).as_deref(), Some("a"));
    }

    #[test]
    fn test_cooldown_suppresses_reuse() {
        let start = Instant::now();
        let world = world_with_portals(100.0, 100.0, &[("gate", 100.0, 100.0)]);
        let mut zone = controller();

        assert!(zone.poll(&world, start).is_some());
        assert!(zone.is_on_cooldown(start + Duration::from_millis(500)));

        for ms in [300, 600, 1500, 2700] {
            assert!(zone.poll(&world, start + Duration::from_millis(ms)).is_none());
        }
        assert!(zone
            .poll(&world, start + Duration::from_millis(3000))
            .is_some());
    }

    #[test]
    fn test_poll_is_rate_limited() {
        let start = Instant::now();
        let world = world_with_portals(100.0, 100.0, &[]);
        let mut zone = controller();
        assert!(zone.poll(&world, start).is_none());

        let world = world_with_portals(100.0, 100.0, &[("gate", 100.0, 100.0)]);
        assert!(zone
            .poll(&world, start + Duration::from_millis(299))
            .is_none());
        assert!(zone
            .poll(&world, start + Duration::from_millis(300))
            .is_some());
    }

    #[test]
    fn test_no_portal_without_map() {
        let mut world = world_with_portals(0.0, 0.0, &[]);
        world.set_map(None);
        assert!(controller().poll(&world, Instant::now()).is_none());
    }

    #[test]
    fn test_map_change_rebuilds_zone_atomically() {
        let start = Instant::now();
        let mut world = world_with_portals(100.0, 100.0, &[]);
        world.set_stats(Some(Stats {
            hp: 40,
            max_hp: 50,
            ..Stats::default()
        }));
        let mut scheduler = Scheduler::new();
        let mut zone = controller();

        let mut mobs = BTreeMap::new();
        mobs.insert("m1".to_string(), Monster::new("m1", 5.0, 5.0, 20));
        let applied = zone.apply_map_change(
            &mut world,
            &mut scheduler,
            start,
            MapData::new("map2", 1000, 1000),
            Position::new(200.0, 300.0),
            Some(MobData {
                mobs,
                mob_types: HashMap::new(),
            }),
            None,
        );

        assert!(applied);
        assert_eq!(world.current_map_id(), "map2");
        let ids: Vec<&str> = world.zone_ids().iter().map(String::as_str).collect();
        assert_eq!(ids, vec!["p1"]);

        let me = world.local_player().unwrap();
        assert_eq!(me.position(), Position::new(200.0, 300.0));
        assert_eq!(me.current_map, "map2");
        assert_eq!(me.name, "alice");
        assert_eq!(me.color, "red");
        assert_eq!(me.stats.as_ref().unwrap().hp, 40);
        assert_eq!(world.predicted_position(), Position::new(200.0, 300.0));
        assert_eq!(world.map().unwrap().id, "map2");
        assert!(world.mob("m1").is_some());
        assert!(world.player("p2").is_some());

        assert_eq!(
            scheduler.take_due(start + Duration::from_millis(100)),
            vec![Deferred::RequestMapPlayers]
        );
    }

    #[test]
    fn test_map_change_defaults_color_and_keeps_mobs_without_payload() {
        let start = Instant::now();
        let mut world = world_with_portals(100.0, 100.0, &[]);
        if let Some(me) = world.player_mut("p1") {
            me.color.clear();
            me.name.clear();
        }
        let mut mobs = BTreeMap::new();
        mobs.insert("old".to_string(), Monster::new("old", 1.0, 1.0, 5));
        world.replace_mobs(mobs);

        let mut scheduler = Scheduler::new();
        let mut zone = controller();
        zone.apply_map_change(
            &mut world,
            &mut scheduler,
            start,
            MapData::new("map2", 1000, 1000),
            Position::new(1.0, 2.0),
            None,
            Some("bob"),
        );

        let me = world.local_player().unwrap();
        assert_eq!(me.color, DEFAULT_PLAYER_COLOR);
        assert_eq!(me.name, "bob");
        assert!(world.mob("old").is_some());
    }

    #[test]
    fn test_second_map_change_replaces_roster_request() {
        let start = Instant::now();
        let mut world = world_with_portals(0.0, 0.0, &[]);
        let mut scheduler = Scheduler::new();
        let mut zone = controller();

        zone.apply_map_change(
            &mut world,
            &mut scheduler,
            start,
            MapData::new("map2", 1000, 1000),
            Position::new(1.0, 1.0),
            None,
            None,
        );
        let first = zone.roster_timer().unwrap();
        zone.apply_map_change(
            &mut world,
            &mut scheduler,
            start + Duration::from_millis(50),
            MapData::new("map3", 1000, 1000),
            Position::new(2.0, 2.0),
            None,
            None,
        );

        assert!(!scheduler.is_pending(first));
        assert_eq!(scheduler.len(), 1);
        assert_eq!(world.current_map_id(), "map3");
    }

    #[test]
    fn test_map_change_without_id_is_rejected() {
        let mut world = world_with_portals(0.0, 0.0, &[]);
        let mut scheduler = Scheduler::new();
        let mut zone = controller();

        let applied = zone.apply_map_change(
            &mut world,
            &mut scheduler,
            Instant::now(),
            MapData::new("", 1000, 1000),
            Position::new(9.0, 9.0),
            None,
            None,
        );
        assert!(!applied);
        assert_eq!(world.current_map_id(), "map1");
        assert!(scheduler.is_empty());
    }
}
