//! The local player's command stream: sequence numbering, prediction and
//! the round trip to the server.

use crate::game::LocalGame;
use crate::input::KeyEvent;
use crate::network::{RpcClient, RpcError};
use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::Rng;
use rand::SeedableRng;
use shared::{Action, ClientId, Command, Outcome};
use std::sync::Arc;
use tokio::sync::Mutex;

pub type SharedGame = Arc<Mutex<LocalGame>>;

/// Random player name in the `Jogador-NNNN` form.
pub fn generate_client_id<R: Rng + ?Sized>(rng: &mut R) -> ClientId {
    format!("Jogador-{:04}", rng.gen_range(0..10_000))
}

pub struct Session {
    client_id: ClientId,
    next_sequence: u32,
    rpc: RpcClient,
    game: SharedGame,
    rng: StdRng,
}

impl Session {
    pub fn new(client_id: ClientId, rpc: RpcClient, game: SharedGame) -> Self {
        Self {
            client_id,
            next_sequence: 1,
            rpc,
            game,
            rng: StdRng::from_entropy(),
        }
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    pub fn next_sequence(&self) -> u32 {
        self.next_sequence
    }

    fn take_sequence(&mut self) -> u32 {
        let sequence = self.next_sequence;
        self.next_sequence += 1;
        sequence
    }

    /// Registers with the server and adopts the spawn it hands out.
    pub async fn register(&mut self) -> Result<Outcome, RpcError> {
        let sequence = self.take_sequence();
        let command = Command::new(self.client_id.as_str(), sequence, Action::Register);
        let response = self.rpc.execute(command).await?;
        info!("Registered as {}: {}", self.client_id, response.message);
        self.game
            .lock()
            .await
            .reconcile(&response.snapshot, &self.client_id);
        Ok(response.outcome)
    }

    /// Predicts the key's effect locally and sends the resulting commands.
    /// Returns false once the player asked to quit.
    pub async fn handle_key(&mut self, key: KeyEvent) -> bool {
        let actions: Vec<Action> = {
            let mut game = self.game.lock().await;
            match key {
                KeyEvent::Move(direction) => {
                    let (dx, dy) = direction.delta();
                    game.predict_move(dx, dy, &mut self.rng)
                        .into_iter()
                        .map(Action::UpdatePosition)
                        .collect()
                }
                KeyEvent::Interact if !game.game_over => {
                    game.set_status("You interacted.");
                    vec![Action::Interact]
                }
                KeyEvent::Interact => Vec::new(),
                KeyEvent::Restart => game
                    .restart()
                    .map(Action::UpdatePosition)
                    .into_iter()
                    .collect(),
                KeyEvent::Quit => return false,
            }
        };

        for action in actions {
            self.send(action).await;
        }
        true
    }

    async fn send(&mut self, action: Action) {
        let sequence = self.take_sequence();
        let name = action.name().to_string();
        let command = Command::new(self.client_id.as_str(), sequence, action);

        match self.rpc.execute(command).await {
            Ok(response) => {
                debug!("{} #{} -> {}: {}", name, sequence, response.outcome, response.message);
                if !response.success {
                    warn!("Server refused {} #{}: {}", name, sequence, response.message);
                }
                self.game
                    .lock()
                    .await
                    .reconcile(&response.snapshot, &self.client_id);
            }
            Err(e) => warn!("Dropped {} #{}: {}", name, sequence, e),
        }
    }
}
