//! Applies client commands to the world.
//!
//! Every command is handled inside one critical section: look the player up,
//! drop anything whose sequence number is not newer than the last one applied,
//! then dispatch on the action. Application-level problems (bad payloads,
//! unknown actions) are reported through the outcome and message while the
//! call itself still succeeds.

use crate::entities::EntitySignals;
use crate::world::{SharedWorld, WorldState};
use log::{debug, info, warn};
use shared::cell;
use shared::{
    Action, Command, DetailError, Envelope, Outcome, PlayerState, Position, PositionUpdate,
    Request, Response, PROTOCOL_VERSION,
};

pub const STATE_SENT: &str = "state sent";
pub const DUPLICATE: &str = "Command already processed (retransmission detected).";

pub struct CommandProcessor {
    world: SharedWorld,
    signals: EntitySignals,
    pursuit_radius: i32,
}

impl CommandProcessor {
    pub fn new(world: SharedWorld, signals: EntitySignals, pursuit_radius: i32) -> Self {
        Self {
            world,
            signals,
            pursuit_radius,
        }
    }

    pub fn world(&self) -> &SharedWorld {
        &self.world
    }

    /// Entry point for one decoded request frame.
    pub async fn handle(&self, envelope: Envelope) -> Response {
        if envelope.version != PROTOCOL_VERSION {
            warn!(
                "Rejecting request with protocol version {} (expected {})",
                envelope.version, PROTOCOL_VERSION
            );
            let snapshot = self.world.lock().await.snapshot();
            return Response {
                success: false,
                message: format!(
                    "protocol version {} not supported, expected {}",
                    envelope.version, PROTOCOL_VERSION
                ),
                outcome: Outcome::VersionMismatch,
                snapshot,
            };
        }

        match envelope.request {
            Request::FetchState { client_id } => self.fetch_state(&client_id).await,
            Request::ExecuteCommand(command) => self.apply(command).await,
        }
    }

    pub async fn fetch_state(&self, client_id: &str) -> Response {
        let snapshot = self.world.lock().await.snapshot();
        debug!("Sending state to {}", client_id);
        Response {
            success: true,
            message: STATE_SENT.to_string(),
            outcome: Outcome::StateSent,
            snapshot,
        }
    }

    pub async fn apply(&self, command: Command) -> Response {
        let mut world = self.world.lock().await;
        let (outcome, message) = self.execute(&mut world, &command);
        Response {
            success: true,
            message,
            outcome,
            snapshot: world.snapshot(),
        }
    }

    fn execute(&self, world: &mut WorldState, command: &Command) -> (Outcome, String) {
        let id = command.client_id.as_str();
        let existing = world.players.get(id).copied();

        if let Some(player) = existing {
            if command.sequence <= player.last_applied_sequence {
                debug!(
                    "Duplicate command {} from {} (last applied {})",
                    command.sequence, id, player.last_applied_sequence
                );
                return (Outcome::Duplicate, DUPLICATE.to_string());
            }
        }

        let action = match command.action.resolve() {
            Ok(action) => action,
            Err(DetailError::Malformed(detail)) => {
                warn!("Malformed position detail {:?} from {}", detail, id);
                return (
                    Outcome::MalformedDetail,
                    format!("Invalid position format: {:?}", detail),
                );
            }
            Err(DetailError::UnknownAction(name)) => {
                warn!("Unknown action {:?} from {}", name, id);
                return (Outcome::UnknownAction, format!("Unknown action: {}", name));
            }
        };

        let Some(player) = existing else {
            if action == Action::Register {
                world
                    .players
                    .insert(id.to_string(), PlayerState::spawn(command.sequence));
                info!("Registered player {}", id);
                return (Outcome::Registered, format!("Player {} registered", id));
            }
            return (
                Outcome::UnknownClient,
                format!("Client {} is not registered", id),
            );
        };

        match action {
            Action::Register => (
                Outcome::AlreadyRegistered,
                format!("Player {} is already registered", id),
            ),
            Action::UpdatePosition(update) => {
                self.move_player(world, id, player, command.sequence, update)
            }
            Action::Interact => {
                if let Some(p) = world.players.get_mut(id) {
                    p.last_applied_sequence = command.sequence;
                }
                (Outcome::Interacted, "Interaction recorded".to_string())
            }
            Action::Legacy { action, .. } => {
                (Outcome::UnknownAction, format!("Unknown action: {}", action))
            }
        }
    }

    fn move_player(
        &self,
        world: &mut WorldState,
        id: &str,
        before: PlayerState,
        sequence: u32,
        update: PositionUpdate,
    ) -> (Outcome, String) {
        let to = update.position();
        let Some(target) = world.grid.get(to).copied() else {
            mark_applied(world, id, sequence, update.lives);
            return (Outcome::Blocked, format!("({}, {}) is outside the map", to.x, to.y));
        };
        if target.solid {
            mark_applied(world, id, sequence, update.lives);
            return (Outcome::Blocked, format!("({}, {}) is blocked", to.x, to.y));
        }

        if let Some(p) = world.players.get_mut(id) {
            p.x = to.x;
            p.y = to.y;
            if let Some(lives) = update.lives {
                p.lives = lives;
            }
            p.last_applied_sequence = sequence;
        }
        world.last_player_move = Some(to);
        debug!("{} moved to ({}, {})", id, to.x, to.y);

        if target.is(&cell::PORTAL) {
            self.signals.portal.enter.offer();
        } else if target.is(&cell::TRAP) {
            self.signals.trap.player_proximity.offer();
        }
        self.route_pursuit(world, before.position(), to);

        (Outcome::Moved, format!("Position updated to ({}, {})", to.x, to.y))
    }

    /// Draws the guard toward players that come close and releases it when
    /// they leave its range.
    fn route_pursuit(&self, world: &WorldState, from: Position, to: Position) {
        let Some(guard) = world.marks.guard else {
            return;
        };
        let was_close = guard.distance(from) <= self.pursuit_radius;
        let is_close = guard.distance(to) <= self.pursuit_radius;
        if is_close {
            self.signals.guard.pursue.offer();
        } else if was_close {
            self.signals.guard.stop_pursuit.offer();
        }
    }
}

/// Consumes the sequence of a rejected move. A reported life count is
/// still taken, since the client cannot resend it under a new number.
fn mark_applied(world: &mut WorldState, id: &str, sequence: u32, lives: Option<u32>) {
    if let Some(p) = world.players.get_mut(id) {
        if let Some(lives) = lives {
            p.lives = lives;
        }
        p.last_applied_sequence = sequence;
    }
}
