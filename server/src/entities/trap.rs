use super::keep_running;
use crate::config::{EntityTuning, TrapMode};
use crate::signal::{mailbox, Shutdown, SignalReceiver, SignalSender};
use crate::world::{EntityKind, SharedWorld};
use log::{debug, info, warn};
use rand::Rng;
use shared::Position;
use std::sync::Arc;
use tokio::time::{sleep_until, Instant};

pub const PLAYER_CAUGHT: &str = "You fell into a trap!";
pub const OTHER_CAUGHT: &str = "Another entity triggered the trap!";
pub const DISARMED: &str = "The trap was disarmed.";

#[derive(Debug, Clone)]
pub struct TrapSignals {
    pub player_proximity: SignalSender,
    pub other_proximity: SignalSender,
    pub stop: SignalSender,
}

impl TrapSignals {
    pub fn detached() -> Self {
        Self {
            player_proximity: mailbox().0,
            other_proximity: mailbox().0,
            stop: mailbox().0,
        }
    }
}

/// A hidden hazard, either fixed in place or periodically moved.
pub struct Trap<R> {
    position: Option<Position>,
    player_proximity: SignalReceiver,
    other_proximity: SignalReceiver,
    stop: SignalReceiver,
    world: SharedWorld,
    shutdown: Shutdown,
    tuning: EntityTuning,
    rng: R,
}

impl<R: Rng + Send + 'static> Trap<R> {
    pub fn new(
        world: SharedWorld,
        shutdown: Shutdown,
        tuning: EntityTuning,
        rng: R,
    ) -> (Self, TrapSignals) {
        let (player_tx, player_proximity) = mailbox();
        let (other_tx, other_proximity) = mailbox();
        let (stop_tx, stop) = mailbox();
        let trap = Self {
            position: None,
            player_proximity,
            other_proximity,
            stop,
            world,
            shutdown,
            tuning,
            rng,
        };
        let signals = TrapSignals {
            player_proximity: player_tx,
            other_proximity: other_tx,
            stop: stop_tx,
        };
        (trap, signals)
    }

    pub fn position(&self) -> Option<Position> {
        self.position
    }

    pub async fn arm(&mut self, preferred: Position) -> Option<Position> {
        let pos = self.world.lock().await.post_entity(EntityKind::Trap, preferred)?;
        self.position = Some(pos);
        Some(pos)
    }

    async fn announce(&self, message: &str) {
        self.world.lock().await.set_status(message);
    }

    async fn disarm(&mut self) {
        let mut world = self.world.lock().await;
        world.withdraw_entity(EntityKind::Trap, self.position);
        world.set_status(DISARMED);
        drop(world);
        self.position = None;
    }

    async fn relocate(&mut self) -> Option<Position> {
        let shared = Arc::clone(&self.world);
        let mut world = shared.lock().await;
        let to = world.relocate_entity(EntityKind::Trap, self.position, &mut self.rng)?;
        world.set_status(format!("The trap moved to ({}, {})!", to.x, to.y));
        self.position = Some(to);
        Some(to)
    }

    pub async fn run(mut self, home: Position) {
        match self.arm(home).await {
            Some(pos) => info!("Trap ({:?}) armed at ({}, {})", self.tuning.trap_mode, pos.x, pos.y),
            None => {
                warn!("No free cell for the trap");
                return;
            }
        }

        let relocating = self.tuning.trap_mode == TrapMode::Relocate;
        let period = if relocating {
            self.tuning.trap_relocate_interval
        } else {
            self.tuning.trap_idle_poll
        };
        let mut deadline = Instant::now() + period;

        loop {
            if !keep_running(&self.world, &self.shutdown).await {
                break;
            }
            tokio::select! {
                Some(()) = self.player_proximity.recv() => self.announce(PLAYER_CAUGHT).await,
                Some(()) = self.other_proximity.recv() => self.announce(OTHER_CAUGHT).await,
                Some(()) = self.stop.recv() => {
                    self.disarm().await;
                    break;
                }
                _ = sleep_until(deadline) => {
                    if relocating && self.relocate().await.is_none() {
                        debug!("Trap found no free cell to move to");
                    }
                    deadline = Instant::now() + period;
                }
                _ = self.shutdown.cancelled() => break,
            }
        }
        debug!("Trap stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signal::shutdown_channel;
    use crate::world::WorldState;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use shared::{cell, MapLayout};
    use std::time::Duration;
    use tokio::time::sleep;

    const HOME: Position = Position::new(2, 1);

    fn world() -> SharedWorld {
        WorldState::new(MapLayout::parse("     \n     \n     ").unwrap().grid).into_shared()
    }

    async fn trap_at(world: &SharedWorld) -> Option<Position> {
        let w = world.lock().await;
        let on_grid = w.grid.find_first(|_, c| c.is(&cell::TRAP));
        assert_eq!(on_grid, w.marks.trap);
        on_grid
    }

    #[tokio::test(start_paused = true)]
    async fn test_fixed_trap_reports_and_disarms() {
        let world = world();
        let (trigger, shutdown) = shutdown_channel();
        let (trap, signals) =
            Trap::new(world.clone(), shutdown, EntityTuning::default(), StdRng::seed_from_u64(4));
        let task = tokio::spawn(trap.run(HOME));
        sleep(Duration::from_millis(10)).await;
        assert_eq!(trap_at(&world).await, Some(HOME));

        signals.player_proximity.offer();
        sleep(Duration::from_millis(1)).await;
        assert_eq!(world.lock().await.status, PLAYER_CAUGHT);

        signals.other_proximity.offer();
        sleep(Duration::from_millis(1)).await;
        assert_eq!(world.lock().await.status, OTHER_CAUGHT);

        sleep(Duration::from_secs(30)).await;
        assert_eq!(trap_at(&world).await, Some(HOME));

        signals.stop.offer();
        task.await.unwrap();
        assert_eq!(trap_at(&world).await, None);
        assert_eq!(world.lock().await.status, DISARMED);
        drop(trigger);
    }

    #[tokio::test(start_paused = true)]
    async fn test_relocating_trap_moves_on_interval() {
        let world = world();
        let (trigger, shutdown) = shutdown_channel();
        let tuning = EntityTuning {
            trap_mode: TrapMode::Relocate,
            ..EntityTuning::default()
        };
        let (trap, _signals) = Trap::new(world.clone(), shutdown, tuning, StdRng::seed_from_u64(4));
        let task = tokio::spawn(trap.run(HOME));

        sleep(Duration::from_millis(10)).await;
        assert_eq!(trap_at(&world).await, Some(HOME));

        sleep(Duration::from_secs(10)).await;
        let moved = trap_at(&world).await;
        assert!(moved.is_some());
        assert_ne!(moved, Some(HOME));
        assert!(world.lock().await.status.starts_with("The trap moved to"));

        trigger.trigger();
        task.await.unwrap();
    }

    #[tokio::test]
    async fn test_arm_skips_occupied_home() {
        let world = world();
        world.lock().await.grid.set(HOME, cell::WALL);
        let (_trigger, shutdown) = shutdown_channel();
        let (mut trap, _signals) =
            Trap::new(world.clone(), shutdown, EntityTuning::default(), StdRng::seed_from_u64(4));
        assert_eq!(trap.arm(HOME).await, Some(Position::new(0, 0)));
        assert_eq!(trap.position(), Some(Position::new(0, 0)));
    }
}
