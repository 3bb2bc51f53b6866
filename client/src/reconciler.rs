//! Periodic state polling that keeps the local view in line with the server.

use crate::network::RpcClient;
use crate::session::SharedGame;
use log::{debug, info};
use shared::ClientId;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::{interval, MissedTickBehavior};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    Applied,
    /// Game over locally; nothing is fetched until a restart.
    Paused,
    /// Transport error; try again next interval.
    Skipped,
}

pub struct Reconciler {
    client_id: ClientId,
    rpc: RpcClient,
    game: SharedGame,
    poll_interval: Duration,
}

impl Reconciler {
    pub fn new(
        client_id: ClientId,
        rpc: RpcClient,
        game: SharedGame,
        poll_interval: Duration,
    ) -> Self {
        Self {
            client_id,
            rpc,
            game,
            poll_interval,
        }
    }

    pub async fn tick(&mut self) -> Tick {
        if self.game.lock().await.game_over {
            return Tick::Paused;
        }
        match self.rpc.fetch_state(&self.client_id).await {
            Ok(response) => {
                self.game
                    .lock()
                    .await
                    .reconcile(&response.snapshot, &self.client_id);
                Tick::Applied
            }
            Err(e) => {
                debug!("Skipping poll: {}", e);
                Tick::Skipped
            }
        }
    }

    /// Polls until `quit` flips to true or its sender goes away.
    pub async fn run(mut self, mut quit: watch::Receiver<bool>) {
        let mut ticker = interval(self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                changed = quit.changed() => {
                    if changed.is_err() || *quit.borrow() {
                        break;
                    }
                    continue;
                }
            }
            self.tick().await;
        }
        info!("Reconciler stopped");
    }
}
