//! # Zone Client Library
//!
//! This library provides the client-side state-synchronization core for the
//! multiplayer 2D zone world. It keeps a local mirror of the shared world
//! (players, monsters, the current map and combat outcomes) consistent with an
//! authoritative server, while applying local prediction so that movement and
//! combat feel immediate.
//!
//! ## Architecture Overview
//!
//! Everything the client knows lives in a single owned [`session::Session`].
//! The network driver feeds it inbound frames and calls its tick once per
//! frame; nothing else holds a reference to world state, so there are no locks
//! and no shared mutable globals.
//!
//! ### Local Prediction
//! Movement input is applied to the local player immediately. The server hears
//! about it at most twenty times per second, with any burst of input collapsed
//! into the newest position. Server echoes of our own position are ignored, so
//! prediction is never rolled back.
//!
//! ### Cooldown Gating
//! Attacks and portal use are gated on the client. An attack only goes out
//! when the cooldown derived from the player's attack speed has elapsed and a
//! living monster is in range. Portals are checked a few times per second and
//! each use starts a three second cooldown.
//!
//! ### Zone Reconciliation
//! The server tells us about every player, on every map. The client renders
//! only the players sharing its map. That subset is kept as a set of ids into
//! the global registry and is re-validated after every handler that can touch
//! it, so it can never drift from the registry or lose the local player.
//!
//! ## Module Organization
//!
//! ### World Module (`world`)
//! The player and monster registries, the current-map subset, the map
//! descriptor, combat stats and the predicted local position.
//!
//! ### Dispatch Module (`dispatch`)
//! One handler per inbound message type.
//!
//! ### Movement, Combat and Zone Modules (`movement`, `combat`, `zone`)
//! The three client-side controllers: throttled movement reports, nearest
//! target selection with cooldowns, and portal detection plus atomic map
//! transitions.
//!
//! ### Session and Scheduler Modules (`session`, `scheduler`)
//! The aggregate that wires the controllers together, and the delayed
//! continuations (roster requests, the auth handshake, banner dismissal) it
//! runs from its tick.
//!
//! ### Network Module (`network`)
//! WebSocket transport with reconnect, ping timing and the frame loop.
//!
//! ## Usage Example
//!
//! ```no_run
//! use client::config::ClientConfig;
//! use client::session::Session;
//! use std::time::Instant;
//!
//! let mut session = Session::new(ClientConfig::default());
//! session.on_connected(Instant::now());
//!
//! // Inbound frame from the server
//! session.handle_frame(r#"{"type": "init", "player_id": "p1"}"#, Instant::now());
//!
//! // Input for this frame, then the per-frame step
//! session.apply_local_move(1.5, 0.0);
//! session.tick(Instant::now());
//!
//! // Whatever needs to go out
//! for message in session.drain_outbound() {
//!     println!("{:?}", message);
//! }
//! ```

pub mod chat;
pub mod combat;
pub mod config;
pub mod dispatch;
pub mod input;
pub mod movement;
pub mod network;
pub mod notify;
pub mod ping;
pub mod scheduler;
pub mod session;
pub mod world;
pub mod zone;
