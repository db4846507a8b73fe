//! The owned client aggregate.
//!
//! A `Session` is driven from one logical thread: the network driver feeds it
//! inbound frames through [`Session::handle_frame`] and calls
//! [`Session::tick`] once per frame. Everything it wants to say to the server
//! collects in an outbox that the driver drains after each step, and every
//! presentation effect collects in a notification queue.

use crate::chat::{prepare_outgoing, ChatLog};
use crate::combat::{AttackOutcome, CombatController};
use crate::config::ClientConfig;
use crate::movement::MovementPredictor;
use crate::notify::Notification;
use crate::ping::PingTracker;
use crate::scheduler::{Deferred, Scheduler};
use crate::world::{WorldSnapshot, WorldState};
use crate::zone::ZoneTransitionController;
use log::{debug, info, warn};
use shared::{ClientMessage, Position, MAX_NAME_LEN};
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Connecting,
    Connected,
    Error,
}

#[derive(Debug)]
pub struct Session {
    pub(crate) config: ClientConfig,
    pub(crate) world: WorldState,
    pub(crate) movement: MovementPredictor,
    pub(crate) combat: CombatController,
    pub(crate) zone: ZoneTransitionController,
    pub(crate) scheduler: Scheduler,
    pub(crate) chat: ChatLog,
    pub(crate) ping: PingTracker,
    pub(crate) connection: ConnectionState,
    pub(crate) outbox: Vec<ClientMessage>,
    pub(crate) notifications: Vec<Notification>,
}

impl Session {
    pub fn new(config: ClientConfig) -> Self {
        Self {
            world: WorldState::new(),
            movement: MovementPredictor::new(config.move_send_interval),
            combat: CombatController::new(config.default_attack_cooldown),
            zone: ZoneTransitionController::new(
                config.portal_cooldown,
                config.portal_poll_interval,
                config.portal_radius,
                config.roster_request_delay,
            ),
            scheduler: Scheduler::new(),
            chat: ChatLog::new(config.chat_history, config.chat_lifetime),
            ping: PingTracker::new(),
            connection: ConnectionState::Connecting,
            outbox: Vec::new(),
            notifications: Vec::new(),
            config,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn world(&self) -> &WorldState {
        &self.world
    }

    pub fn snapshot(&self) -> WorldSnapshot {
        self.world.snapshot()
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.connection
    }

    pub fn is_connected(&self) -> bool {
        self.connection == ConnectionState::Connected
    }

    pub fn chat(&self) -> &ChatLog {
        &self.chat
    }

    pub fn ping(&self) -> &PingTracker {
        &self.ping
    }

    pub fn attack_ready(&self, now: Instant) -> bool {
        self.combat.can_attack(now)
    }

    pub fn attack_cooldown(&self) -> Duration {
        self.combat.cooldown()
    }

    pub fn portal_cooldown_remaining(&self, now: Instant) -> Duration {
        self.zone.cooldown_remaining(now)
    }

    pub fn pending_timers(&self) -> usize {
        self.scheduler.len()
    }

    pub fn on_connecting(&mut self) {
        self.connection = ConnectionState::Connecting;
    }

    /// Transport is up: introduce ourselves and queue the auth handshake.
    pub fn on_connected(&mut self, now: Instant) {
        info!("Connected");
        self.connection = ConnectionState::Connected;

        if let Some(name) = self.config.player_name.as_deref().and_then(clean_name) {
            self.send(ClientMessage::SetName { name });
        }
        self.scheduler.schedule(
            now,
            self.config.auth_delay_after_connect,
            Deferred::Authenticate,
        );
    }

    /// Transport is gone. The world stays readable but is stale until the
    /// next `init` replaces it.
    pub fn on_disconnected(&mut self) {
        if self.connection != ConnectionState::Error {
            warn!("Connection lost");
        }
        self.connection = ConnectionState::Error;
        self.world.mark_stale();
        self.scheduler.cancel_all();
        self.zone.reset();
        self.combat.release();
        self.movement.discard_pending();
        self.ping.reset();
        self.outbox.clear();
    }

    /// Queues a message. Dropped while the connection is not open.
    pub fn send(&mut self, message: ClientMessage) -> bool {
        if !self.is_connected() {
            debug!("Not connected, dropping {:?}", message);
            return false;
        }
        self.outbox.push(message);
        true
    }

    pub fn apply_local_move(&mut self, dx: f32, dy: f32) -> Position {
        self.movement.apply_local_move(&mut self.world, dx, dy)
    }

    /// One-shot attack. Returns true if a request was sent.
    pub fn attack(&mut self, now: Instant) -> bool {
        if !self.is_connected() {
            return false;
        }
        let outcome = self.combat.attack(&self.world, now);
        self.record_attack(outcome)
    }

    pub fn press_attack(&mut self, now: Instant) -> bool {
        if !self.is_connected() {
            return false;
        }
        let outcome = self.combat.press(&self.world, now);
        self.record_attack(outcome)
    }

    pub fn release_attack(&mut self) {
        self.combat.release();
    }

    pub fn send_chat(&mut self, text: &str) -> bool {
        if !self.is_connected() {
            return false;
        }
        match prepare_outgoing(text) {
            Some(text) => self.send(ClientMessage::Chat { text }),
            None => false,
        }
    }

    pub fn send_ping(&mut self, now: Instant) {
        if self.send(ClientMessage::Ping {}) {
            self.ping.mark_sent(now);
        }
    }

    /// Per-frame step: due continuations, move flush, portal poll and attack
    /// repeat.
    pub fn tick(&mut self, now: Instant) {
        for action in self.scheduler.take_due(now) {
            self.run_deferred(action);
        }

        if self.is_connected() {
            if let Some(report) = self.movement.take_due_report(now) {
                self.send(report);
            }

            if let Some(portal_id) = self.zone.poll(&self.world, now) {
                self.send(ClientMessage::UsePortal {
                    portal_id: portal_id.clone(),
                });
                self.scheduler.schedule(
                    now,
                    self.config.portal_banner_lifetime,
                    Deferred::DismissBanner {
                        portal_id: portal_id.clone(),
                    },
                );
                self.notifications
                    .push(Notification::PortalUsed { portal_id });
            }

            let outcome = self.combat.tick(&self.world, now);
            self.record_attack(outcome);
        }

        self.chat.prune(now);
    }

    pub fn drain_outbound(&mut self) -> Vec<ClientMessage> {
        std::mem::take(&mut self.outbox)
    }

    pub fn drain_notifications(&mut self) -> Vec<Notification> {
        std::mem::take(&mut self.notifications)
    }

    fn run_deferred(&mut self, action: Deferred) {
        match action {
            Deferred::RequestMapPlayers => {
                self.zone.roster_sent();
                self.send(ClientMessage::RequestMapPlayers {});
            }
            Deferred::Authenticate => {
                if let Some(token) = self.config.auth_token.clone() {
                    if self.send(ClientMessage::AuthLogin { token }) {
                        debug!("Sent auth_login");
                    }
                }
            }
            Deferred::DismissBanner { portal_id } => {
                self.notifications
                    .push(Notification::BannerDismissed { portal_id });
            }
        }
    }

    fn record_attack(&mut self, outcome: Option<AttackOutcome>) -> bool {
        let Some(outcome) = outcome else {
            return false;
        };
        debug!("Attacking {}", outcome.target_id);
        self.notifications.push(Notification::AttackSwing {
            target_id: outcome.target_id,
            from: outcome.from,
            to: outcome.to,
        });
        self.send(outcome.request)
    }
}

fn clean_name(name: &str) -> Option<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.chars().take(MAX_NAME_LEN).collect())
    }
}
