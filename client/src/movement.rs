//! Local movement prediction with a throttled upstream report.
//!
//! The predicted position moves the instant input arrives. The server is told
//! about it at most once per send interval; anything in between collapses into
//! the newest position, so there is never a backlog to drain.

use crate::world::WorldState;
use log::warn;
use shared::{ClientMessage, Position};
use std::time::{Duration, Instant};

#[derive(Debug)]
pub struct MovementPredictor {
    send_interval: Duration,
    pending: Option<Position>,
    last_sent: Option<Instant>,
}

impl MovementPredictor {
    pub fn new(send_interval: Duration) -> Self {
        Self {
            send_interval,
            pending: None,
            last_sent: None,
        }
    }

    /// Advances the local player by `(dx, dy)`, clamped to the map.
    pub fn apply_local_move(&mut self, world: &mut WorldState, dx: f32, dy: f32) -> Position {
        if !dx.is_finite() || !dy.is_finite() {
            warn!("Ignoring non-finite move delta ({}, {})", dx, dy);
            return world.predicted_position();
        }

        let (max_x, max_y) = world.bounds();
        let current = world.predicted_position();
        let next = Position::new(
            (current.x + dx).clamp(0.0, max_x),
            (current.y + dy).clamp(0.0, max_y),
        );

        world.set_predicted(next);
        self.pending = Some(next);
        next
    }

    pub fn pending(&self) -> Option<Position> {
        self.pending
    }

    /// Hands out the coalesced report once the interval has elapsed.
    pub fn take_due_report(&mut self, now: Instant) -> Option<ClientMessage> {
        let position = self.pending?;
        if let Some(last) = self.last_sent {
            if now.saturating_duration_since(last) < self.send_interval {
                return None;
            }
        }

        self.pending = None;
        self.last_sent = Some(now);
        Some(ClientMessage::Move {
            x: position.x,
            y: position.y,
        })
    }

    pub fn discard_pending(&mut self) {
        self.pending = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;
    use shared::{MapData, Player, FALLBACK_WORLD_WIDTH};
    use std::collections::HashMap;

    fn world_at(x: f32, y: f32, map: Option<MapData>) -> WorldState {
        let mut world = WorldState::new();
        world.set_local_id("p1");
        let mut players = HashMap::new();
        players.insert("p1".to_string(), Player::new("p1", x, y, "map1"));
        world.replace_players(players);
        world.rebuild_zone();
        world.set_map(map);
        world.set_predicted(Position::new(x, y));
        world
    }

    #[test]
    fn test_move_applies_immediately() {
        let mut world = world_at(100.0, 100.0, None);
        let mut movement = MovementPredictor::new(Duration::from_millis(50));

        let pos = movement.apply_local_move(&mut world, 2.5, -1.5);
        assert_approx_eq!(pos.x, 102.5, 0.001);
        assert_approx_eq!(pos.y, 98.5, 0.001);
        assert_eq!(world.player("p1").unwrap().position(), pos);
        assert_eq!(movement.pending(), Some(pos));
    }

    #[test]
    fn test_move_clamps_to_map() {
        let mut world = world_at(790.0, 5.0, Some(MapData::new("map1", 800, 600)));
        let mut movement = MovementPredictor::new(Duration::from_millis(50));

        let pos = movement.apply_local_move(&mut world, 50.0, -50.0);
        assert_eq!(pos, Position::new(800.0, 0.0));
    }

    #[test]
    fn test_move_clamps_to_fallback_without_map() {
        let mut world = world_at(1990.0, 1990.0, None);
        let mut movement = MovementPredictor::new(Duration::from_millis(50));

        let pos = movement.apply_local_move(&mut world, 100.0, 100.0);
        assert_eq!(pos.x, FALLBACK_WORLD_WIDTH);
    }

    #[test]
    fn test_non_finite_delta_is_ignored() {
        let mut world = world_at(10.0, 10.0, None);
        let mut movement = MovementPredictor::new(Duration::from_millis(50));

        let pos = movement.apply_local_move(&mut world, f32::NAN, 1.0);
        assert_eq!(pos, Position::new(10.0, 10.0));
        assert!(movement.pending().is_none());
    }

    #[test]
    fn test_burst_coalesces_into_one_report() {
        let start = Instant::now();
        let mut world = world_at(0.0, 0.0, None);
        let mut movement = MovementPredictor::new(Duration::from_millis(50));

        for _ in 0..5 {
            movement.apply_local_move(&mut world, 1.0, 2.0);
        }

        let report = movement.take_due_report(start + Duration::from_millis(10));
        assert_eq!(report, Some(ClientMessage::Move { x: 5.0, y: 10.0 }));
        assert!(movement
            .take_due_report(start + Duration::from_millis(20))
            .is_none());
    }

    #[test]
    fn test_throttle_holds_latest_until_window_ends() {
        let start = Instant::now();
        let mut world = world_at(0.0, 0.0, None);
        let mut movement = MovementPredictor::new(Duration::from_millis(50));

        movement.apply_local_move(&mut world, 1.0, 0.0);
        assert!(movement.take_due_report(start).is_some());

        movement.apply_local_move(&mut world, 1.0, 0.0);
        movement.apply_local_move(&mut world, 1.0, 0.0);
        assert!(movement
            .take_due_report(start + Duration::from_millis(30))
            .is_none());

        let report = movement.take_due_report(start + Duration::from_millis(50));
        assert_eq!(report, Some(ClientMessage::Move { x: 3.0, y: 0.0 }));
    }

    #[test]
    fn test_no_report_without_movement() {
        let mut movement = MovementPredictor::new(Duration::from_millis(50));
        assert!(movement.take_due_report(Instant::now()).is_none());
    }

    #[test]
    fn test_discard_pending() {
        let mut world = world_at(0.0, 0.0, None);
        let mut movement = MovementPredictor::new(Duration::from_millis(50));
        movement.apply_local_move(&mut world, 1.0, 0.0);
        movement.discard_pending();
        assert!(movement.take_due_report(Instant::now()).is_none());
    }
}
