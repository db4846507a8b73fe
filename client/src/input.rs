//! Input mapping from a virtual joystick to movement deltas, plus the
//! headless input sources used by the CLI client.

use crate::config::ClientConfig;
use crate::session::Session;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::f32::consts::TAU;
use std::time::{Duration, Instant};

/// Virtual joystick: offset from the stick centre to a per-frame move delta.
#[derive(Debug, Clone, Copy)]
pub struct JoystickInput {
    deadzone: f32,
    max_distance: f32,
    move_speed: f32,
}

impl JoystickInput {
    pub fn new(deadzone: f32, max_distance: f32, move_speed: f32) -> Self {
        Self {
            deadzone,
            max_distance,
            move_speed,
        }
    }

    pub fn from_config(config: &ClientConfig) -> Self {
        Self::new(
            config.joystick_deadzone,
            config.joystick_max_distance,
            config.move_speed,
        )
    }

    /// Offset clamped to the stick radius, or `None` inside the deadzone.
    pub fn normalize(&self, dx: f32, dy: f32) -> Option<(f32, f32)> {
        let distance = (dx * dx + dy * dy).sqrt();
        if !distance.is_finite() || distance < self.deadzone {
            return None;
        }
        if distance > self.max_distance {
            let scale = self.max_distance / distance;
            Some((dx * scale, dy * scale))
        } else {
            Some((dx, dy))
        }
    }

    pub fn to_move_delta(&self, dx: f32, dy: f32) -> Option<(f32, f32)> {
        self.normalize(dx, dy)
            .map(|(x, y)| (x * self.move_speed, y * self.move_speed))
    }

    pub fn max_distance(&self) -> f32 {
        self.max_distance
    }
}

/// Random-walk stick for headless runs.
#[derive(Debug)]
pub struct WanderBot {
    rng: StdRng,
    heading: Option<f32>,
    retarget_every: Duration,
    last_retarget: Option<Instant>,
}

impl WanderBot {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            heading: None,
            retarget_every: Duration::from_secs(2),
            last_retarget: None,
        }
    }

    pub fn from_entropy() -> Self {
        Self::new(rand::thread_rng().gen())
    }

    /// Current stick offset at full deflection, or `None` while idling.
    pub fn offset(&mut self, now: Instant, radius: f32) -> Option<(f32, f32)> {
        let due = self
            .last_retarget
            .map_or(true, |last| now.saturating_duration_since(last) >= self.retarget_every);
        if due {
            self.last_retarget = Some(now);
            // Stand still about one turn in five.
            self.heading = if self.rng.gen_bool(0.2) {
                None
            } else {
                Some(self.rng.gen_range(0.0..TAU))
            };
        }
        self.heading
            .map(|angle| (angle.cos() * radius, angle.sin() * radius))
    }
}

/// Feeds synthetic input into a session once per frame.
#[derive(Debug)]
pub struct InputManager {
    joystick: JoystickInput,
    wander: Option<WanderBot>,
    auto_attack: bool,
}

impl InputManager {
    pub fn new(joystick: JoystickInput, wander: Option<WanderBot>, auto_attack: bool) -> Self {
        Self {
            joystick,
            wander,
            auto_attack,
        }
    }

    pub fn update(&mut self, session: &mut Session, now: Instant) {
        if !session.is_connected() {
            return;
        }

        let radius = self.joystick.max_distance();
        if let Some((dx, dy)) = self
            .wander
            .as_mut()
            .and_then(|bot| bot.offset(now, radius))
            .and_then(|(x, y)| self.joystick.to_move_delta(x, y))
        {
            session.apply_local_move(dx, dy);
        }

        if self.auto_attack {
            session.press_attack(now);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    fn stick() -> JoystickInput {
        JoystickInput::new(3.0, 45.0, 0.05)
    }

    #[test]
    fn test_deadzone() {
        assert!(stick().normalize(1.0, 2.0).is_none());
        assert!(stick().normalize(3.0, 0.0).is_some());
    }

    #[test]
    fn test_offset_clamped_to_radius() {
        let (x, y) = stick().normalize(90.0, 0.0).unwrap();
        assert_approx_eq!(x, 45.0, 0.001);
        assert_approx_eq!(y, 0.0, 0.001);

        let (x, y) = stick().normalize(30.0, 40.0).unwrap();
        assert_approx_eq!(x, 27.0, 0.001);
        assert_approx_eq!(y, 36.0, 0.001);
    }

    #[test]
    fn test_move_delta_scaled() {
        let (dx, dy) = stick().to_move_delta(0.0, -100.0).unwrap();
        assert_approx_eq!(dx, 0.0, 0.0001);
        assert_approx_eq!(dy, -2.25, 0.0001);
        assert!(stick().to_move_delta(f32::NAN, 0.0).is_none());
    }

    #[test]
    fn test_wander_holds_heading_between_retargets() {
        let start = Instant::now();
        let mut bot = WanderBot::new(7);
        let first = bot.offset(start, 45.0);
        assert_eq!(bot.offset(start + Duration::from_millis(500), 45.0), first);
        assert_eq!(bot.offset(start + Duration::from_millis(1999), 45.0), first);

        if let Some((x, y)) = first {
            assert_approx_eq!((x * x + y * y).sqrt(), 45.0, 0.01);
        }
    }

    #[test]
    fn test_wander_is_deterministic_per_seed() {
        let start = Instant::now();
        let mut a = WanderBot::new(42);
        let mut b = WanderBot::new(42);
        for step in 0..10u64 {
            let now = start + Duration::from_secs(2 * step);
            assert_eq!(a.offset(now, 45.0), b.offset(now, 45.0));
        }
    }

    #[test]
    fn test_manager_ignores_input_while_disconnected() {
        let start = Instant::now();
        let mut session = Session::new(ClientConfig::default());
        let mut manager = InputManager::new(stick(), Some(WanderBot::new(1)), true);
        manager.update(&mut session, start);
        assert!(session.drain_outbound().is_empty());
        assert_eq!(
            session.world().predicted_position(),
            crate::world::DEFAULT_SPAWN
        );
    }
}
