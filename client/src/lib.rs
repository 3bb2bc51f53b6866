//! # Game Client Library
//!
//! Client side of the multiplayer grid game: it predicts the local player's
//! moves immediately, sends them to the authoritative server as numbered
//! commands, and keeps polling the server so the local view converges on the
//! real world.
//!
//! ## Architecture Overview
//!
//! ### Client-Side Prediction
//! Key presses are applied to a local copy of the world before the server has
//! seen them. Walls, the guard and other players block the move locally; the
//! portal teleports; the trap costs a life. Only the resulting position (and
//! life count, when it changed) is sent.
//!
//! ### Idempotent Commands
//! Every command carries the next sequence number of this client. Failed
//! calls are retried with the same number, so the server can tell a
//! retransmission from a new command and apply each one at most once.
//!
//! ### Reconciliation
//! A background task fetches a full snapshot on a fixed interval. The local
//! player's position and lives are overwritten by the server's values, the
//! server's hazard layer replaces the local one, and other players are drawn
//! as markers that are wiped again before the next snapshot is applied.
//!
//! ## Module Organization
//!
//! ### Game Module (`game`)
//! The local view: grid, background copy, prediction rules and the snapshot merge.
//!
//! ### Session Module (`session`)
//! Sequence numbering and the command round trip for key presses.
//!
//! ### Reconciler Module (`reconciler`)
//! The polling loop.
//!
//! ### Network Module (`network`)
//! Framed request/response calls with reconnect, timeout and bounded retry.
//!
//! ### Input and Rendering Modules (`input`, `rendering`)
//! Keyboard mapping and the window renderer, both on macroquad.
//!
//! ## Usage Example
//!
//! ```no_run
//! use client::config::ClientConfig;
//! use client::game::LocalGame;
//! use client::network::RpcClient;
//! use client::session::{generate_client_id, Session};
//! use shared::Grid;
//! use std::sync::Arc;
//! use tokio::sync::Mutex;
//!
//! # async fn demo() -> Result<(), client::network::RpcError> {
//! let config = ClientConfig::default();
//! let game = Arc::new(Mutex::new(LocalGame::new(Grid::new(30, 20))));
//! let id = generate_client_id(&mut rand::thread_rng());
//!
//! let mut session = Session::new(id, RpcClient::new(&config), game.clone());
//! session.register().await?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod game;
pub mod input;
pub mod network;
pub mod reconciler;
pub mod rendering;
pub mod session;
