//! Autonomous entities that share the world with the players.
//!
//! Each entity runs as its own task. Between turns it sleeps or waits on its
//! signal mailboxes, and every wait is raced against the shutdown token so the
//! whole set can be stopped promptly. World access always goes through the one
//! world lock, taken only for the duration of a single step.

pub mod guard;
pub mod portal;
pub mod trap;

pub use guard::{Guard, GuardSignals, GuardStep};
pub use portal::{Portal, PortalSignals};
pub use trap::{Trap, TrapSignals};

use crate::config::{self, EntityTuning, PortalMode};
use crate::signal::Shutdown;
use crate::world::SharedWorld;
use log::info;
use rand::rngs::StdRng;
use rand::SeedableRng;
use shared::{MapLayout, Position};
use std::time::Duration;
use tokio::task::JoinHandle;

/// Senders for every entity mailbox, handed to the command path.
#[derive(Debug, Clone)]
pub struct EntitySignals {
    pub guard: GuardSignals,
    pub portal: PortalSignals,
    pub trap: TrapSignals,
}

impl EntitySignals {
    /// Signals with no entity behind them; every offer is silently dropped.
    pub fn detached() -> Self {
        Self {
            guard: GuardSignals::detached(),
            portal: PortalSignals::detached(),
            trap: TrapSignals::detached(),
        }
    }

    /// Asks the entities to wind down ahead of the shutdown token.
    pub fn stop_all(&self) {
        self.guard.stop_pursuit.offer();
        self.trap.stop.offer();
    }
}

/// Starting cells for the entities.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntityHomes {
    pub guard: Position,
    pub portal: Position,
    pub trap: Position,
}

impl EntityHomes {
    /// Map markers win over the built-in defaults.
    pub fn from_layout(layout: &MapLayout, tuning: &EntityTuning) -> Self {
        let portal_default = match tuning.portal_mode {
            PortalMode::Cycle => config::PORTAL_CYCLE_HOME,
            PortalMode::Relocate => config::PORTAL_RELOCATE_HOME,
        };
        Self {
            guard: layout.guard.unwrap_or(config::GUARD_HOME),
            portal: layout.portal.unwrap_or(portal_default),
            trap: layout.trap.unwrap_or(config::TRAP_HOME),
        }
    }
}

/// Spawns the guard, portal and trap tasks, each with its own random source.
pub fn spawn_entities(
    world: SharedWorld,
    shutdown: Shutdown,
    tuning: EntityTuning,
    homes: EntityHomes,
) -> (EntitySignals, Vec<JoinHandle<()>>) {
    let (trap, trap_signals) = Trap::new(
        world.clone(),
        shutdown.clone(),
        tuning.clone(),
        StdRng::from_entropy(),
    );
    let (guard, guard_signals) = Guard::new(
        world.clone(),
        shutdown.clone(),
        tuning.clone(),
        StdRng::from_entropy(),
        Some(trap_signals.other_proximity.clone()),
    );
    let (portal, portal_signals) = Portal::new(world, shutdown, tuning, StdRng::from_entropy());

    info!(
        "Spawning entities: guard at {:?}, portal at {:?}, trap at {:?}",
        homes.guard, homes.portal, homes.trap
    );
    let tasks = vec![
        tokio::spawn(trap.run(homes.trap)),
        tokio::spawn(portal.run(homes.portal)),
        tokio::spawn(guard.run(homes.guard)),
    ];

    let signals = EntitySignals {
        guard: guard_signals,
        portal: portal_signals,
        trap: trap_signals,
    };
    (signals, tasks)
}

/// Checks the game-over flag under a short lock and the shutdown token.
pub(crate) async fn keep_running(world: &SharedWorld, shutdown: &Shutdown) -> bool {
    if shutdown.is_triggered() {
        return false;
    }
    !world.lock().await.game_over
}

/// Sleeps for `duration` unless shutdown comes first. Returns false on shutdown.
pub(crate) async fn pause(shutdown: &mut Shutdown, duration: Duration) -> bool {
    tokio::select! {
        _ = tokio::time::sleep(duration) => true,
        _ = shutdown.cancelled() => false,
    }
}
