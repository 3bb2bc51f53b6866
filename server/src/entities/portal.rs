use super::{keep_running, pause};
use crate::config::{EntityTuning, PortalMode};
use crate::signal::{mailbox, Shutdown, SignalReceiver, SignalSender};
use crate::world::{EntityKind, SharedWorld};
use log::{debug, info, warn};
use rand::Rng;
use shared::Position;
use std::sync::Arc;
use tokio::time::{sleep, sleep_until, Instant};

pub const OPENED: &str = "A portal appeared.";
pub const ENTERED: &str = "You entered the portal!";
pub const FORCE_CLOSED: &str = "The portal closed!";
pub const EXPIRED: &str = "The portal vanished from inactivity.";
pub const DEACTIVATED: &str = "Portal deactivated.";

#[derive(Debug, Clone)]
pub struct PortalSignals {
    pub enter: SignalSender,
    pub force_close: SignalSender,
}

impl PortalSignals {
    pub fn detached() -> Self {
        Self {
            enter: mailbox().0,
            force_close: mailbox().0,
        }
    }
}

/// A portal that either cycles open and shut on one cell or keeps jumping
/// between random free cells.
pub struct Portal<R> {
    position: Option<Position>,
    active: bool,
    enter: SignalReceiver,
    force_close: SignalReceiver,
    world: SharedWorld,
    shutdown: Shutdown,
    tuning: EntityTuning,
    rng: R,
}

impl<R: Rng + Send + 'static> Portal<R> {
    pub fn new(
        world: SharedWorld,
        shutdown: Shutdown,
        tuning: EntityTuning,
        rng: R,
    ) -> (Self, PortalSignals) {
        let (enter_tx, enter) = mailbox();
        let (close_tx, force_close) = mailbox();
        let portal = Self {
            position: None,
            active: false,
            enter,
            force_close,
            world,
            shutdown,
            tuning,
            rng,
        };
        let signals = PortalSignals {
            enter: enter_tx,
            force_close: close_tx,
        };
        (portal, signals)
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn position(&self) -> Option<Position> {
        self.position
    }

    /// Opens on the previous cell if still free, else on `home` or the first free cell.
    async fn open(&mut self, home: Position) -> bool {
        let shared = Arc::clone(&self.world);
        let mut world = shared.lock().await;
        let preferred = self
            .position
            .filter(|p| world.is_free_for_entity(*p))
            .unwrap_or(home);
        let Some(pos) = world.post_entity(EntityKind::Portal, preferred) else {
            return false;
        };
        world.set_status(OPENED);
        drop(world);

        // Signals that arrived while closed refer to the old opening.
        self.enter.take();
        self.force_close.take();
        self.position = Some(pos);
        self.active = true;
        debug!("Portal open at ({}, {})", pos.x, pos.y);
        true
    }

    async fn close(&mut self, message: &str) {
        let mut world = self.world.lock().await;
        world.withdraw_entity(EntityKind::Portal, self.position);
        world.set_status(message);
        self.active = false;
    }

    async fn note_entry(&self) {
        self.world.lock().await.set_status(ENTERED);
    }

    /// Waits out the cooldown and reopens. False when the loop should end.
    async fn reopen_after_cooldown(&mut self, home: Position) -> bool {
        loop {
            if !pause(&mut self.shutdown, self.tuning.portal_cooldown).await {
                return false;
            }
            if !keep_running(&self.world, &self.shutdown).await {
                return false;
            }
            if self.open(home).await {
                return true;
            }
        }
    }

    async fn relocate(&mut self) -> Option<Position> {
        let shared = Arc::clone(&self.world);
        let mut world = shared.lock().await;
        let to = world.relocate_entity(EntityKind::Portal, self.position, &mut self.rng)?;
        world.set_status(format!("The portal moved to ({}, {})!", to.x, to.y));
        self.position = Some(to);
        Some(to)
    }

    pub async fn run(mut self, home: Position) {
        if !self.open(home).await {
            warn!("No free cell for the portal");
            return;
        }
        info!(
            "Portal ({:?} mode) opened at {:?}",
            self.tuning.portal_mode, self.position
        );

        match self.tuning.portal_mode {
            PortalMode::Cycle => self.run_cycle(home).await,
            PortalMode::Relocate => self.run_relocating().await,
        }
        debug!("Portal stopped");
    }

    async fn run_cycle(&mut self, home: Position) {
        loop {
            if !keep_running(&self.world, &self.shutdown).await {
                break;
            }
            // A fresh timer each turn, so every entry keeps the portal open longer.
            tokio::select! {
                Some(()) = self.enter.recv() => self.note_entry().await,
                Some(()) = self.force_close.recv() => {
                    self.close(FORCE_CLOSED).await;
                    if !self.reopen_after_cooldown(home).await {
                        break;
                    }
                }
                _ = sleep(self.tuning.portal_inactivity) => {
                    self.close(EXPIRED).await;
                    if !self.reopen_after_cooldown(home).await {
                        break;
                    }
                }
                _ = self.shutdown.cancelled() => break,
            }
        }
    }

    async fn run_relocating(&mut self) {
        let mut deadline = Instant::now() + self.tuning.portal_relocate_interval;
        loop {
            if !keep_running(&self.world, &self.shutdown).await {
                break;
            }
            tokio::select! {
                Some(()) = self.force_close.recv() => {
                    self.close(DEACTIVATED).await;
                    break;
                }
                Some(()) = self.enter.recv() => self.note_entry().await,
                _ = sleep_until(deadline) => {
                    if self.relocate().await.is_none() {
                        debug!("Portal found no free cell to move to");
                    }
                    deadline = Instant::now() + self.tuning.portal_relocate_interval;
                }
                _ = self.shutdown.cancelled() => break,
            }
        }
    }
}
