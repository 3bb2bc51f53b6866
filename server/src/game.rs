//! Wires a loaded map into a running world: shared state, entity tasks and
//! the command processor that fronts them.

use crate::commands::CommandProcessor;
use crate::config::ServerConfig;
use crate::entities::{spawn_entities, EntityHomes, EntitySignals};
use crate::signal::{shutdown_channel, Shutdown, ShutdownTrigger};
use crate::world::{SharedWorld, WorldState};
use log::{info, warn};
use shared::MapLayout;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::timeout;

const TASK_JOIN_TIMEOUT: Duration = Duration::from_secs(2);

pub struct Game {
    world: SharedWorld,
    signals: EntitySignals,
    trigger: ShutdownTrigger,
    tasks: Vec<JoinHandle<()>>,
    pursuit_radius: i32,
}

impl Game {
    /// Builds the world from `layout` and, if enabled, starts the entities.
    pub fn start(layout: MapLayout, config: &ServerConfig) -> Self {
        let homes = EntityHomes::from_layout(&layout, &config.tuning);
        let world = WorldState::new(layout.grid).into_shared();
        let (trigger, shutdown) = shutdown_channel();

        let (signals, tasks) = if config.entities {
            spawn_entities(world.clone(), shutdown, config.tuning.clone(), homes)
        } else {
            info!("Entities disabled");
            (EntitySignals::detached(), Vec::new())
        };

        Self {
            world,
            signals,
            trigger,
            tasks,
            pursuit_radius: config.tuning.pursuit_radius,
        }
    }

    pub fn world(&self) -> &SharedWorld {
        &self.world
    }

    pub fn processor(&self) -> Arc<CommandProcessor> {
        Arc::new(CommandProcessor::new(
            self.world.clone(),
            self.signals.clone(),
            self.pursuit_radius,
        ))
    }

    pub fn shutdown_token(&self) -> Shutdown {
        self.trigger.subscribe()
    }

    /// Ends the game: flags game over, asks the entities to stop, fires the
    /// shutdown token and waits for every task.
    pub async fn shutdown(self) {
        self.world.lock().await.game_over = true;
        self.signals.stop_all();
        self.trigger.trigger();

        for task in self.tasks {
            match timeout(TASK_JOIN_TIMEOUT, task).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => warn!("Entity task failed: {}", e),
                Err(_) => warn!("Entity task did not stop in time"),
            }
        }
        info!("Game stopped");
    }
}
