use log::{debug, info};
use rand::Rng;
use shared::cell::{self, Cell};
use shared::grid::SAMPLE_ATTEMPTS;
use shared::{Grid, Position, PositionUpdate, WorldSnapshot, SPAWN_POSITION, STARTING_LIVES};

pub const GAME_OVER: &str = "Game over! Press R to restart.";

/// The client's predicted view of the world.
///
/// `grid` is what gets drawn: terrain, hazards and remote-player markers.
/// `static_grid` is the terrain alone, as loaded from the map or taken from
/// the server, so markers and departed hazards can be wiped without eroding
/// what lies under them.
#[derive(Debug, Clone)]
pub struct LocalGame {
    pub grid: Grid,
    pub static_grid: Grid,
    pub position: Position,
    pub lives: u32,
    pub game_over: bool,
    pub status: String,
    last_server_status: String,
}

impl LocalGame {
    pub fn new(grid: Grid) -> Self {
        Self {
            static_grid: grid.clone(),
            grid,
            position: SPAWN_POSITION,
            lives: STARTING_LIVES,
            game_over: false,
            status: String::new(),
            last_server_status: String::new(),
        }
    }

    pub fn set_status(&mut self, message: impl Into<String>) {
        self.status = message.into();
    }

    /// Predicts a one-cell step and returns the updates to send, in order.
    ///
    /// Stepping onto the portal reports the portal cell first, then the
    /// destination, so the server sees the entry.
    pub fn predict_move<R: Rng + ?Sized>(
        &mut self,
        dx: i32,
        dy: i32,
        rng: &mut R,
    ) -> Vec<PositionUpdate> {
        if self.game_over {
            return Vec::new();
        }

        let target = self.position.offset(dx, dy);
        if !self.grid.is_walkable(target) {
            let message = match self.grid.get(target) {
                Some(cell) => blocked_message(cell),
                None => "You can't leave the map.".to_string(),
            };
            self.set_status(message);
            return Vec::new();
        }
        let cell = self.grid.get(target).copied().unwrap_or(cell::EMPTY);

        if cell.is(&cell::PORTAL) {
            let destination = self.grid.sample(rng, SAMPLE_ATTEMPTS, |pos, c| {
                !c.solid && c.is_empty() && pos != target
            });
            let Some(destination) = destination else {
                self.position = target;
                self.set_status("The portal leads nowhere.");
                return vec![PositionUpdate::new(target, None)];
            };
            self.position = destination;
            self.set_status(format!(
                "Teleported to ({}, {})!",
                destination.x, destination.y
            ));
            return vec![
                PositionUpdate::new(target, None),
                PositionUpdate::new(destination, None),
            ];
        }

        self.position = target;
        if cell.is(&cell::TRAP) {
            self.lives = self.lives.saturating_sub(1);
            if self.lives == 0 {
                self.game_over = true;
                self.set_status(GAME_OVER);
                info!("Out of lives");
            } else {
                self.set_status(format!("You lost a life! Lives: {}", self.lives));
            }
            return vec![PositionUpdate::new(target, Some(self.lives))];
        }

        vec![PositionUpdate::new(target, None)]
    }

    /// Resets a finished game. Returns the state to push to the server.
    pub fn restart(&mut self) -> Option<PositionUpdate> {
        if !self.game_over {
            return None;
        }
        self.game_over = false;
        self.lives = STARTING_LIVES;
        self.position = SPAWN_POSITION;
        self.set_status("Game restarted.");
        Some(PositionUpdate::new(self.position, Some(self.lives)))
    }

    /// Merges an authoritative snapshot into the local view.
    ///
    /// Markers from the previous snapshot are wiped back to terrain, the
    /// server's hazards are laid over the terrain, and every other player
    /// in bounds gets a fresh marker.
    pub fn reconcile(&mut self, snapshot: &WorldSnapshot, client_id: &str) {
        self.clear_markers();

        if !snapshot.grid.same_shape(&self.static_grid) {
            debug!(
                "Adopting {}x{} map from server",
                snapshot.grid.width(),
                snapshot.grid.height()
            );
            self.static_grid = Grid::new(snapshot.grid.width(), snapshot.grid.height());
            self.grid = self.static_grid.clone();
        }
        self.adopt_layers(&snapshot.grid);

        for (id, player) in &snapshot.players {
            if id == client_id {
                self.position = player.position();
                self.lives = player.lives;
                let out_of_lives = player.lives == 0;
                if out_of_lives && !self.game_over {
                    self.set_status(GAME_OVER);
                }
                self.game_over = out_of_lives;
            } else if self.grid.in_bounds(player.position()) {
                self.grid.set(player.position(), cell::REMOTE_PLAYER);
            }
        }

        // Only news from the server replaces the local status line.
        if snapshot.status != self.last_server_status {
            self.last_server_status = snapshot.status.clone();
            if !snapshot.status.is_empty() {
                self.status = snapshot.status.clone();
            }
        }
    }

    /// Puts the terrain back wherever a remote player was drawn.
    fn clear_markers(&mut self) {
        for pos in self.grid.collect_cells(|_, c| c.is(&cell::REMOTE_PLAYER)) {
            let restored = self.static_grid.get(pos).copied().unwrap_or(cell::EMPTY);
            self.grid.set(pos, restored);
        }
    }

    /// Takes the server's terrain into the background copy and its hazards
    /// into the drawn grid. Hazards that moved away leave terrain behind.
    fn adopt_layers(&mut self, server: &Grid) {
        for pos in server.positions() {
            let Some(&incoming) = server.get(pos) else {
                continue;
            };
            if is_hazard(&incoming) {
                self.grid.set(pos, incoming);
                continue;
            }
            let known = self.static_grid.get(pos).map_or(false, |c| c.is(&incoming));
            if !known {
                self.static_grid.set(pos, incoming);
                self.grid.set(pos, incoming);
            } else if self.grid.get(pos).map_or(false, is_hazard) {
                self.grid.set(pos, incoming);
            }
        }
    }

    pub fn remote_players(&self) -> usize {
        self.grid.collect_cells(|_, c| c.is(&cell::REMOTE_PLAYER)).len()
    }
}

fn is_hazard(cell: &Cell) -> bool {
    cell.is(&cell::GUARD) || cell.is(&cell::PORTAL) || cell.is(&cell::TRAP)
}

fn blocked_message(cell: &Cell) -> String {
    if cell.is(&cell::GUARD) {
        "The guard blocks your way!".to_string()
    } else if cell.is(&cell::ENEMY) {
        "An enemy blocks your way!".to_string()
    } else if cell.is(&cell::REMOTE_PLAYER) {
        "Another player is standing there.".to_string()
    } else {
        "Blocked!".to_string()
    }
}
