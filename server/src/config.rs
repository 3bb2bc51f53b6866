use clap::ValueEnum;
use shared::Position;
use std::path::PathBuf;
use std::time::Duration;

// Default entity homes, used when the map carries no marker for them.
pub const GUARD_HOME: Position = Position::new(2, 2);
pub const PORTAL_CYCLE_HOME: Position = Position::new(4, 4);
pub const PORTAL_RELOCATE_HOME: Position = Position::new(5, 5);
pub const TRAP_HOME: Position = Position::new(6, 6);

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PortalMode {
    /// Stays on one cell, closing on inactivity and reopening after a cooldown.
    Cycle,
    /// Jumps to a random free cell on a fixed interval.
    Relocate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TrapMode {
    Fixed,
    Relocate,
}

/// Timing and behaviour knobs for the autonomous entities.
#[derive(Debug, Clone)]
pub struct EntityTuning {
    /// Pause after the guard actually moved.
    pub guard_move_pause: Duration,
    /// Pause after a tick without movement; shorter so new signals are seen quickly.
    pub guard_idle_pause: Duration,
    /// Players closer than this (king moves) attract the guard.
    pub pursuit_radius: i32,

    pub portal_mode: PortalMode,
    pub portal_inactivity: Duration,
    pub portal_cooldown: Duration,
    pub portal_relocate_interval: Duration,

    pub trap_mode: TrapMode,
    pub trap_relocate_interval: Duration,
    pub trap_idle_poll: Duration,
}

impl Default for EntityTuning {
    fn default() -> Self {
        Self {
            guard_move_pause: Duration::from_millis(300),
            guard_idle_pause: Duration::from_millis(120),
            pursuit_radius: 4,
            portal_mode: PortalMode::Cycle,
            portal_inactivity: Duration::from_secs(5),
            portal_cooldown: Duration::from_secs(8),
            portal_relocate_interval: Duration::from_secs(15),
            trap_mode: TrapMode::Fixed,
            trap_relocate_interval: Duration::from_secs(10),
            trap_idle_poll: Duration::from_secs(1),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub addr: String,
    pub map_path: PathBuf,
    /// Run the guard, portal and trap tasks.
    pub entities: bool,
    pub tuning: EntityTuning,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: shared::DEFAULT_SERVER_ADDR.to_string(),
            map_path: PathBuf::from(shared::DEFAULT_MAP_PATH),
            entities: true,
            tuning: EntityTuning::default(),
        }
    }
}
