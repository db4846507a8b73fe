//! Cooldown-gated melee targeting.

use crate::world::WorldState;
use shared::{ClientMessage, Monster, Position, Stats};
use std::time::{Duration, Instant};

/// Result of a successful attack attempt.
#[derive(Debug, Clone, PartialEq)]
pub struct AttackOutcome {
    pub target_id: String,
    pub from: Position,
    pub to: Position,
    pub request: ClientMessage,
}

/// `1000 / attack_speed` milliseconds. Zero, negative, non-finite or
/// absurdly small speeds use `fallback`.
pub fn attack_cooldown(attack_speed: Option<f32>, fallback: Duration) -> Duration {
    match attack_speed {
        Some(speed) if speed > 0.0 && speed.is_finite() => {
            Duration::try_from_secs_f64(1.0 / f64::from(speed)).unwrap_or(fallback)
        }
        _ => fallback,
    }
}

/// Nearest living monster strictly closer than `range`. On equal distance
/// the first one yielded wins.
pub fn nearest_monster<'a, I>(mobs: I, origin: Position, range: f32) -> Option<&'a Monster>
where
    I: IntoIterator<Item = &'a Monster>,
{
    let mut best = None;
    let mut best_distance = range;

    for mob in mobs {
        if !mob.is_alive {
            continue;
        }
        let distance = origin.distance_to(mob.position());
        if distance < best_distance {
            best = Some(mob);
            best_distance = distance;
        }
    }

    best
}

#[derive(Debug)]
pub struct CombatController {
    cooldown: Duration,
    default_cooldown: Duration,
    last_attack: Option<Instant>,
    held: bool,
}

impl CombatController {
    pub fn new(default_cooldown: Duration) -> Self {
        Self {
            cooldown: default_cooldown,
            default_cooldown,
            last_attack: None,
            held: false,
        }
    }

    pub fn cooldown(&self) -> Duration {
        self.cooldown
    }

    pub fn update_stats(&mut self, stats: Option<&Stats>) {
        self.cooldown = attack_cooldown(stats.map(|s| s.attack_speed), self.default_cooldown);
    }

    pub fn can_attack(&self, now: Instant) -> bool {
        self.cooldown_remaining(now).is_zero()
    }

    pub fn cooldown_remaining(&self, now: Instant) -> Duration {
        match self.last_attack {
            Some(last) => self
                .cooldown
                .saturating_sub(now.saturating_duration_since(last)),
            None => Duration::ZERO,
        }
    }

    /// Attacks the nearest target if the cooldown allows. Does nothing until
    /// the server has sent stats. Finding nothing in range leaves the
    /// cooldown untouched.
    pub fn attack(&mut self, world: &WorldState, now: Instant) -> Option<AttackOutcome> {
        if !self.can_attack(now) {
            return None;
        }

        let me = world.local_player()?;
        let stats = world.stats()?;
        let range = stats.attack_range();
        let damage = stats.attack_damage();
        let origin = me.position();

        let target = nearest_monster(world.mobs().values(), origin, range)?;
        self.last_attack = Some(now);

        Some(AttackOutcome {
            target_id: target.id.clone(),
            from: origin,
            to: target.position(),
            request: ClientMessage::Attack {
                target_id: target.id.clone(),
                damage,
                range,
            },
        })
    }

    /// Starts hold-to-attack. A second press while held does nothing, so one
    /// physical press can never stack repeats.
    pub fn press(&mut self, world: &WorldState, now: Instant) -> Option<AttackOutcome> {
        if self.held {
            return None;
        }
        self.held = true;
        self.attack(world, now)
    }

    pub fn release(&mut self) {
        self.held = false;
    }

    pub fn is_held(&self) -> bool {
        self.held
    }

    /// Repeat step while the attack input is held.
    pub fn tick(&mut self, world: &WorldState, now: Instant) -> Option<AttackOutcome> {
        if !self.held {
            return None;
        }
        self.attack(world, now)
    }
}
