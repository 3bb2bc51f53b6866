//! # Game Server Library
//!
//! Authoritative server for the multiplayer grid game. It owns the one true
//! copy of the world, applies client commands to it, runs the autonomous
//! entities that share the map with the players, and answers every request
//! with a full snapshot so clients can reconcile their local prediction.
//!
//! ## Core Responsibilities
//!
//! ### Authoritative World
//! The grid, the player registry, the status line and the game-over flag live
//! in a single [`world::WorldState`] behind one async mutex. Every reader and
//! writer takes that lock for one short critical section and never holds it
//! across a sleep or a signal wait.
//!
//! ### Idempotent Command Handling
//! Clients retry failed calls without knowing whether the request or the
//! response was lost. Each command therefore carries a per-client sequence
//! number, and [`commands::CommandProcessor`] ignores anything that is not
//! newer than the last sequence applied for that client. Retransmissions get
//! the current snapshot back and change nothing.
//!
//! ### Autonomous Entities
//! A guard, a portal and a trap each run as their own task. They are driven by
//! timers and by best-effort signals raised from the command path: a player
//! stepping on the portal, on the trap, or close to the guard. Signals travel
//! through single-slot mailboxes; a full mailbox drops the new signal.
//!
//! ## Module Organization
//!
//! ### World Module (`world`)
//! Shared state, snapshots and the placement rules entities follow.
//!
//! ### Commands Module (`commands`)
//! Sequence deduplication, action dispatch and signal routing.
//!
//! ### Entities Module (`entities`)
//! Guard, portal and trap behaviours plus the helpers that spawn them.
//!
//! ### Signal Module (`signal`)
//! Single-slot mailboxes and the shutdown token raced against every wait.
//!
//! ### Game Module (`game`)
//! Builds a world from a map, starts the entities and stops them again.
//!
//! ### Network Module (`network`)
//! TCP listener answering length-prefixed request frames.
//!
//! ### Config Module (`config`)
//! Server address, map path and entity timing.

pub mod commands;
pub mod config;
pub mod entities;
pub mod game;
pub mod network;
pub mod signal;
pub mod world;

pub use commands::CommandProcessor;
pub use config::{EntityTuning, PortalMode, ServerConfig, TrapMode};
pub use game::Game;
pub use network::Server;
pub use world::{SharedWorld, WorldState};
