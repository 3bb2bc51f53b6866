use super::{keep_running, pause};
use crate::config::EntityTuning;
use crate::signal::{mailbox, Shutdown, SignalReceiver, SignalSender};
use crate::world::{EntityKind, SharedWorld, WorldState};
use log::{debug, info, warn};
use rand::Rng;
use shared::cell::{self, Cell};
use shared::Position;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct GuardSignals {
    pub pursue: SignalSender,
    pub stop_pursuit: SignalSender,
}

impl GuardSignals {
    pub fn detached() -> Self {
        Self {
            pursue: mailbox().0,
            stop_pursuit: mailbox().0,
        }
    }
}

/// What a single guard turn did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardStep {
    Moved(Position),
    Stayed,
    /// A stop-pursuit signal was consumed; the guard holds still this turn.
    Holding,
}

/// Wanders the map at random and chases the last player move when told to.
pub struct Guard<R> {
    cell: Cell,
    position: Option<Position>,
    pursue: SignalReceiver,
    stop_pursuit: SignalReceiver,
    trap_alarm: Option<SignalSender>,
    world: SharedWorld,
    shutdown: Shutdown,
    tuning: EntityTuning,
    rng: R,
}

impl<R: Rng + Send + 'static> Guard<R> {
    pub fn new(
        world: SharedWorld,
        shutdown: Shutdown,
        tuning: EntityTuning,
        rng: R,
        trap_alarm: Option<SignalSender>,
    ) -> (Self, GuardSignals) {
        let (pursue_tx, pursue) = mailbox();
        let (stop_tx, stop_pursuit) = mailbox();
        let guard = Self {
            cell: cell::GUARD,
            position: None,
            pursue,
            stop_pursuit,
            trap_alarm,
            world,
            shutdown,
            tuning,
            rng,
        };
        let signals = GuardSignals {
            pursue: pursue_tx,
            stop_pursuit: stop_tx,
        };
        (guard, signals)
    }

    pub fn position(&self) -> Option<Position> {
        self.position
    }

    /// Puts the guard on `preferred`, or the first free cell if that is taken.
    pub async fn post(&mut self, preferred: Position) -> Option<Position> {
        let pos = self.world.lock().await.post_entity(EntityKind::Guard, preferred)?;
        self.position = Some(pos);
        Some(pos)
    }

    /// One turn: pursuit first, then a pending stop, otherwise a random step.
    pub async fn step(&mut self) -> GuardStep {
        let Some(from) = self.position else {
            return GuardStep::Stayed;
        };

        if self.pursue.take() {
            let shared = Arc::clone(&self.world);
            let mut world = shared.lock().await;
            let Some(target) = world.last_player_move else {
                return GuardStep::Stayed;
            };
            for (dx, dy) in pursuit_steps(from, target) {
                let to = from.offset(dx, dy);
                if self.try_move(&mut world, to) {
                    debug!("Guard closes in on ({}, {})", target.x, target.y);
                    return GuardStep::Moved(to);
                }
            }
            return GuardStep::Stayed;
        }

        if self.stop_pursuit.take() {
            return GuardStep::Holding;
        }

        let dx = self.rng.gen_range(-1..=1);
        let dy = self.rng.gen_range(-1..=1);
        if dx == 0 && dy == 0 {
            return GuardStep::Stayed;
        }
        let to = from.offset(dx, dy);
        let shared = Arc::clone(&self.world);
        let mut world = shared.lock().await;
        if self.try_move(&mut world, to) {
            GuardStep::Moved(to)
        } else {
            GuardStep::Stayed
        }
    }

    /// Moves onto `to` when it is walkable, empty and not a player. Bumping
    /// into the trap sets it off instead of stepping on it.
    fn try_move(&mut self, world: &mut WorldState, to: Position) -> bool {
        let Some(from) = self.position else {
            return false;
        };
        let Some(target) = world.grid.get(to).copied() else {
            return false;
        };
        if target.is(&cell::TRAP) {
            if let Some(alarm) = &self.trap_alarm {
                alarm.offer();
            }
            return false;
        }
        if target.solid || !target.is_empty() || world.player_at(to) {
            return false;
        }
        if !world.grid.get(from).map_or(false, |c| c.is(&self.cell)) {
            return false;
        }

        world.grid.swap(from, to);
        world.marks.set(EntityKind::Guard, Some(to));
        self.position = Some(to);
        true
    }

    pub async fn run(mut self, home: Position) {
        match self.post(home).await {
            Some(pos) => info!("Guard posted at ({}, {})", pos.x, pos.y),
            None => {
                warn!("No free cell for the guard");
                return;
            }
        }

        loop {
            if !keep_running(&self.world, &self.shutdown).await {
                break;
            }
            let wait = match self.step().await {
                GuardStep::Moved(_) => self.tuning.guard_move_pause,
                GuardStep::Stayed | GuardStep::Holding => self.tuning.guard_idle_pause,
            };
            if !pause(&mut self.shutdown, wait).await {
                break;
            }
        }
        debug!("Guard stopped");
    }
}

/// Unit steps toward `target`, the axis with the larger gap first.
fn pursuit_steps(from: Position, target: Position) -> Vec<(i32, i32)> {
    let dx = target.x - from.x;
    let dy = target.y - from.y;
    let horizontal = (dx.signum(), 0);
    let vertical = (0, dy.signum());

    let ordered = if dx.abs() >= dy.abs() {
        [horizontal, vertical]
    } else {
        [vertical, horizontal]
    };
    ordered.into_iter().filter(|&step| step != (0, 0)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signal::{shutdown_channel, ShutdownTrigger};
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use shared::{MapLayout, PlayerState};
    use std::time::Duration;
    use tokio::time::sleep;

    fn guard_on(map: &str) -> (Guard<StdRng>, GuardSignals, SharedWorld) {
        let world = WorldState::new(MapLayout::parse(map).unwrap().grid).into_shared();
        let (_trigger, shutdown) = shutdown_channel();
        let (guard, signals) = Guard::new(
            world.clone(),
            shutdown,
            EntityTuning::default(),
            StdRng::seed_from_u64(5),
            None,
        );
        (guard, signals, world)
    }

    #[test]
    fn test_pursuit_prefers_larger_gap() {
        let from = Position::new(2, 2);
        assert_eq!(pursuit_steps(from, Position::new(6, 3)), vec![(1, 0), (0, 1)]);
        assert_eq!(pursuit_steps(from, Position::new(1, 7)), vec![(0, 1), (-1, 0)]);
        assert_eq!(pursuit_steps(from, Position::new(2, 0)), vec![(0, -1)]);
        assert!(pursuit_steps(from, from).is_empty());
    }

    #[tokio::test]
    async fn test_pursuit_moves_toward_last_player_move() {
        let (mut guard, signals, world) = guard_on("     \n     \n     ");
        assert_eq!(guard.post(Position::new(0, 1)).await, Some(Position::new(0, 1)));
        world.lock().await.last_player_move = Some(Position::new(4, 1));

        assert!(signals.pursue.offer());
        assert_eq!(guard.step().await, GuardStep::Moved(Position::new(1, 1)));

        let w = world.lock().await;
        assert!(w.grid.get(Position::new(1, 1)).unwrap().is(&cell::GUARD));
        assert!(w.grid.get(Position::new(0, 1)).unwrap().is_empty());
        assert_eq!(w.marks.guard, Some(Position::new(1, 1)));
    }

    #[tokio::test]
    async fn test_pursuit_falls_back_to_other_axis() {
        let (mut guard, signals, world) = guard_on("  ▤  \n     \n     ");
        guard.post(Position::new(1, 0)).await;
        world.lock().await.last_player_move = Some(Position::new(4, 1));

        signals.pursue.offer();
        assert_eq!(guard.step().await, GuardStep::Moved(Position::new(1, 1)));
    }

    #[tokio::test]
    async fn test_pursuit_never_steps_on_a_player() {
        let (mut guard, signals, world) = guard_on("   ");
        guard.post(Position::new(0, 0)).await;
        {
            let mut w = world.lock().await;
            let mut player = PlayerState::spawn(1);
            player.x = 1;
            player.y = 0;
            w.players.insert("p".into(), player);
            w.last_player_move = Some(Position::new(1, 0));
        }

        signals.pursue.offer();
        assert_eq!(guard.step().await, GuardStep::Stayed);
        assert_eq!(guard.position(), Some(Position::new(0, 0)));
    }

    #[tokio::test]
    async fn test_stop_signal_holds_the_guard() {
        let (mut guard, signals, _world) = guard_on("   ");
        guard.post(Position::new(1, 0)).await;
        signals.stop_pursuit.offer();
        assert_eq!(guard.step().await, GuardStep::Holding);
        assert_eq!(guard.position(), Some(Position::new(1, 0)));
    }

    #[tokio::test]
    async fn test_bumping_into_trap_raises_alarm() {
        let world = WorldState::new(MapLayout::parse("  ").unwrap().grid).into_shared();
        let (_trigger, shutdown) = shutdown_channel();
        let (alarm_tx, mut alarm_rx) = mailbox();
        let (mut guard, signals) = Guard::new(
            world.clone(),
            shutdown,
            EntityTuning::default(),
            StdRng::seed_from_u64(1),
            Some(alarm_tx),
        );
        guard.post(Position::new(0, 0)).await;
        {
            let mut w = world.lock().await;
            w.grid.set(Position::new(1, 0), cell::TRAP);
            w.last_player_move = Some(Position::new(1, 0));
        }

        signals.pursue.offer();
        assert_eq!(guard.step().await, GuardStep::Stayed);
        assert!(alarm_rx.take());
        assert!(world.lock().await.grid.get(Position::new(1, 0)).unwrap().is(&cell::TRAP));
    }

    #[tokio::test]
    async fn test_wandering_stays_on_walkable_cells() {
        let (mut guard, _signals, world) = guard_on("▤▤▤▤▤\n▤ ♣ ▤\n▤ P ▤\n▤   ▤\n▤▤▤▤▤");
        world.lock().await.grid.set(Position::new(2, 2), cell::PORTAL);
        guard.post(Position::new(1, 1)).await;

        for _ in 0..200 {
            guard.step().await;
            let pos = guard.position().unwrap();
            let w = world.lock().await;
            let here = w.grid.get(pos).unwrap();
            assert!(here.is(&cell::GUARD));
            assert_ne!(pos, Position::new(2, 2));
            assert_ne!(pos, Position::new(2, 1));
        }
    }

    fn running_guard(
        map: &str,
    ) -> (SharedWorld, GuardSignals, ShutdownTrigger, tokio::task::JoinHandle<()>) {
        let world = WorldState::new(MapLayout::parse(map).unwrap().grid).into_shared();
        let (trigger, shutdown) = shutdown_channel();
        let (guard, signals) = Guard::new(
            world.clone(),
            shutdown,
            EntityTuning::default(),
            StdRng::seed_from_u64(5),
            None,
        );
        let task = tokio::spawn(guard.run(Position::new(0, 0)));
        (world, signals, trigger, task)
    }

    async fn guard_at(world: &SharedWorld) -> Option<Position> {
        world.lock().await.marks.guard
    }

    #[tokio::test(start_paused = true)]
    async fn test_guard_rests_longer_after_moving() {
        let (world, signals, trigger, task) = running_guard("          ");
        world.lock().await.last_player_move = Some(Position::new(9, 0));
        signals.pursue.offer();

        // Posted at t=0 and stepped straight away.
        sleep(Duration::from_millis(10)).await;
        assert_eq!(guard_at(&world).await, Some(Position::new(1, 0)));
        assert!(signals.pursue.offer());

        sleep(Duration::from_millis(280)).await;
        assert_eq!(guard_at(&world).await, Some(Position::new(1, 0)));
        assert!(!signals.pursue.offer());

        sleep(Duration::from_millis(20)).await;
        assert_eq!(guard_at(&world).await, Some(Position::new(2, 0)));

        trigger.trigger();
        task.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_guard_rests_briefly_when_stuck() {
        let (world, signals, trigger, task) = running_guard(" ");

        sleep(Duration::from_millis(10)).await;
        assert_eq!(guard_at(&world).await, Some(Position::new(0, 0)));
        assert!(signals.pursue.offer());

        sleep(Duration::from_millis(100)).await;
        assert!(!signals.pursue.offer());

        // The next turn at 120 ms takes the signal.
        sleep(Duration::from_millis(20)).await;
        assert!(signals.pursue.offer());

        trigger.trigger();
        task.await.unwrap();
    }
}
