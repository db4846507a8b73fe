//! Inbound message handling.
//!
//! Each server message maps to exactly one handler. Handlers never block and
//! quietly skip anything that refers to an entity we do not know about. Every
//! handler that can touch zone membership ends with
//! `WorldState::restore_invariants`.

use crate::chat::sender_name;
use crate::notify::Notification;
use crate::scheduler::Deferred;
use crate::session::Session;
use log::{debug, info, warn};
use shared::{decode_server_message, Player, ServerMessage, DEFAULT_MAP_ID};
use std::time::Instant;

impl Session {
    /// Decodes and applies one text frame. Malformed frames are logged and
    /// dropped.
    pub fn handle_frame(&mut self, text: &str, now: Instant) {
        match decode_server_message(text) {
            Ok(message) => self.dispatch(message, now),
            Err(e) => warn!("Dropping frame: {}", e),
        }
    }

    pub fn dispatch(&mut self, message: ServerMessage, now: Instant) {
        debug!("<- {}", message.kind());

        match message {
            ServerMessage::Init {
                player_id,
                players,
                map,
                mob_types,
                mobs,
            } => {
                info!(
                    "Joined as {} with {} players online",
                    player_id,
                    players.len()
                );
                self.world.reset();
                self.world.set_local_id(&player_id);
                self.world.replace_players(players);

                let current_map = self
                    .world
                    .player(&player_id)
                    .map(|p| p.current_map.clone())
                    .or_else(|| {
                        map.as_ref()
                            .map(|m| m.id.clone())
                            .filter(|id| !id.is_empty())
                    })
                    .unwrap_or_else(|| DEFAULT_MAP_ID.to_string());
                self.world.set_current_map(&current_map);

                if let Some(position) = self.world.player(&player_id).map(Player::position) {
                    self.world.set_predicted(position);
                }
                let stats = self
                    .world
                    .player(&player_id)
                    .and_then(|p| p.stats.clone());
                self.world.set_stats(stats);

                self.world.rebuild_zone();
                self.world.replace_mobs(mobs);
                self.world.set_mob_types(mob_types);
                self.world.set_map(map);
                self.world.restore_invariants();

                self.combat.update_stats(self.world.stats());
                self.movement.discard_pending();
                self.scheduler.schedule(
                    now,
                    self.config.auth_delay_after_init,
                    Deferred::Authenticate,
                );
            }

            ServerMessage::PlayerJoined {
                player_id,
                player_data,
            } => {
                debug!("Player {} joined", player_id);
                self.world.upsert_player(&player_id, player_data);
                self.world.restore_invariants();
            }

            ServerMessage::PlayerChangedMap {
                player_id,
                old_map,
                new_map,
                player_data,
            } => {
                debug!("Player {} moved from {} to {}", player_id, old_map, new_map);
                match player_data {
                    Some(mut data) => {
                        data.current_map = new_map;
                        self.world.upsert_player(&player_id, data);
                    }
                    None => {
                        if let Some(player) = self.world.player_mut(&player_id) {
                            player.current_map = new_map;
                        }
                        self.world.refresh_membership(&player_id);
                    }
                }
                self.world.restore_invariants();
            }

            ServerMessage::MapPlayersList { players } => {
                let current = self.world.current_map_id().to_string();
                let mut roster = Vec::with_capacity(players.len());
                for (id, mut player) in players {
                    if !self.world.is_local(&id) {
                        player.current_map = current.clone();
                        self.world.upsert_player(&id, player);
                    }
                    roster.push(id);
                }
                debug!("Roster for {}: {} players", current, roster.len());
                self.world.replace_zone(roster);
                self.world.restore_invariants();
            }

            ServerMessage::PlayerRenamed {
                player_id,
                player_name,
                name,
            } => {
                if let (Some(player), Some(new_name)) =
                    (self.world.player_mut(&player_id), player_name.or(name))
                {
                    player.name = new_name;
                }
            }

            ServerMessage::PlayerMoved { player_id, x, y } => {
                if self.world.is_local(&player_id) {
                    return;
                }
                if let Some(player) = self.world.player_mut(&player_id) {
                    player.x = x;
                    player.y = y;
                }
            }

            ServerMessage::PlayerLeft { player_id } => {
                debug!("Player {} left", player_id);
                self.world.remove_player(&player_id);
                self.world.restore_invariants();
            }

            ServerMessage::MapChange {
                map,
                new_position,
                mob_data,
            } => {
                let map_id = map.id.clone();
                let applied = self.zone.apply_map_change(
                    &mut self.world,
                    &mut self.scheduler,
                    now,
                    map,
                    new_position,
                    mob_data,
                    self.config.player_name.as_deref(),
                );
                if applied {
                    self.movement.discard_pending();
                    self.notifications.push(Notification::MapChanged { map_id });
                }
            }

            ServerMessage::MobUpdate { mobs } => {
                self.world.replace_mobs(mobs);
            }

            ServerMessage::AttackResult { target_id, damage } => {
                if let Some(mob) = self.world.damage_mob(&target_id, damage) {
                    debug!(
                        "Hit {} for {} ({}/{})",
                        target_id, damage, mob.current_hp, mob.max_hp
                    );
                    let position = mob.position();
                    self.notifications.push(Notification::MonsterDamaged {
                        monster_id: target_id,
                        position,
                        damage,
                    });
                }
            }

            ServerMessage::MobKilled {
                killer_id,
                target_id,
                exp_gained,
                level_up,
                new_level,
            } => {
                info!("{} killed {} (+{} exp)", killer_id, target_id, exp_gained);
                if self.world.is_local(&killer_id) {
                    let position = self
                        .world
                        .mob(&target_id)
                        .map(|m| m.position())
                        .unwrap_or_else(|| self.world.predicted_position());
                    self.notifications.push(Notification::ExpGained {
                        amount: exp_gained,
                        position,
                    });
                    if level_up == Some(true) {
                        info!("Level up: {:?}", new_level);
                        self.notifications
                            .push(Notification::LevelUp { level: new_level });
                    }
                }
            }

            ServerMessage::MobAttack {
                mob_id,
                target_player_id,
                damage,
            } => {
                let from = self.world.mob(&mob_id).map(|m| m.position());
                let to = self.world.player(&target_player_id).map(Player::position);
                if let (Some(from), Some(to)) = (from, to) {
                    self.notifications.push(Notification::MobAttack {
                        mob_id,
                        target_player_id: target_player_id.clone(),
                        from,
                        to,
                    });
                }
                if self.world.is_local(&target_player_id) {
                    self.send(shared::ClientMessage::TakeDamage { damage });
                }
            }

            ServerMessage::PlayerDamaged {
                player_id,
                current_hp,
                damage,
            } => {
                if self.world.is_local(&player_id) && self.world.set_local_hp(current_hp) {
                    self.notifications.push(Notification::StatsChanged);
                }
                let position = self.world.player(&player_id).map(Player::position);
                self.notifications.push(Notification::PlayerDamaged {
                    player_id,
                    position,
                    damage,
                });
            }

            ServerMessage::StatsUpdate { stats } => {
                self.world.set_stats(Some(stats));
                self.combat.update_stats(self.world.stats());
                self.notifications.push(Notification::StatsChanged);
            }

            ServerMessage::Chat {
                player_id,
                player_name,
                text,
            } => {
                let sender = sender_name(player_name.as_deref(), player_id.as_deref());
                self.chat.push(sender.clone(), text.clone(), now);
                self.notifications
                    .push(Notification::ChatReceived { sender, text });
            }

            ServerMessage::Pong {} => {
                if let Some(rtt) = self.ping.on_pong(now) {
                    debug!("RTT {}ms", rtt.as_millis());
                }
            }

            ServerMessage::Unknown => {
                debug!("Ignoring unknown message type");
            }
        }
    }
}
