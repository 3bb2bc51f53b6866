//! The authoritative world and the lock that guards it.
//!
//! All state shared between the command path and the entity tasks lives in
//! [`WorldState`] behind one `tokio::sync::Mutex`. Critical sections are kept
//! short and never span a sleep or a signal wait.

use log::debug;
use rand::Rng;
use shared::cell::{self, Cell};
use shared::grid::SAMPLE_ATTEMPTS;
use shared::{ClientId, Grid, PlayerState, Position, WorldSnapshot};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tokio::sync::Mutex;

pub type SharedWorld = Arc<Mutex<WorldState>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Guard,
    Portal,
    Trap,
}

impl EntityKind {
    pub fn template(self) -> Cell {
        match self {
            EntityKind::Guard => cell::GUARD,
            EntityKind::Portal => cell::PORTAL,
            EntityKind::Trap => cell::TRAP,
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EntityKind::Guard => "guard",
            EntityKind::Portal => "portal",
            EntityKind::Trap => "trap",
        };
        f.write_str(name)
    }
}

/// Last known positions of the autonomous entities.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EntityMarks {
    pub guard: Option<Position>,
    pub portal: Option<Position>,
    pub trap: Option<Position>,
}

impl EntityMarks {
    pub fn get(&self, kind: EntityKind) -> Option<Position> {
        match kind {
            EntityKind::Guard => self.guard,
            EntityKind::Portal => self.portal,
            EntityKind::Trap => self.trap,
        }
    }

    pub fn set(&mut self, kind: EntityKind, pos: Option<Position>) {
        match kind {
            EntityKind::Guard => self.guard = pos,
            EntityKind::Portal => self.portal = pos,
            EntityKind::Trap => self.trap = pos,
        }
    }
}

#[derive(Debug, Clone)]
pub struct WorldState {
    pub grid: Grid,
    pub players: HashMap<ClientId, PlayerState>,
    pub status: String,
    pub game_over: bool,
    pub marks: EntityMarks,
    /// Where a player last moved to; the guard chases this cell.
    pub last_player_move: Option<Position>,
}

impl WorldState {
    pub fn new(grid: Grid) -> Self {
        Self {
            grid,
            players: HashMap::new(),
            status: String::new(),
            game_over: false,
            marks: EntityMarks::default(),
            last_player_move: None,
        }
    }

    pub fn into_shared(self) -> SharedWorld {
        Arc::new(Mutex::new(self))
    }

    pub fn snapshot(&self) -> WorldSnapshot {
        WorldSnapshot {
            grid: self.grid.clone(),
            players: self.players.clone(),
            status: self.status.clone(),
            game_over: self.game_over,
        }
    }

    pub fn set_status(&mut self, message: impl Into<String>) {
        self.status = message.into();
        debug!("status: {}", self.status);
    }

    pub fn player_at(&self, pos: Position) -> bool {
        self.players.values().any(|p| p.position() == pos)
    }

    /// An entity may occupy `pos`: in bounds, empty terrain, no player on it.
    pub fn is_free_for_entity(&self, pos: Position) -> bool {
        self.grid
            .get(pos)
            .map_or(false, |c| !c.solid && c.is_empty())
            && !self.player_at(pos)
    }

    /// `preferred` if free, otherwise the first free cell in row-major order.
    pub fn spawn_position(&self, preferred: Position) -> Option<Position> {
        if self.is_free_for_entity(preferred) {
            return Some(preferred);
        }
        self.grid
            .find_first(|pos, c| !c.solid && c.is_empty() && !self.player_at(pos))
    }

    /// Random free cell by bounded rejection sampling.
    pub fn sample_free_cell<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<Position> {
        self.grid.sample(rng, SAMPLE_ATTEMPTS, |pos, c| {
            !c.solid && c.is_empty() && !self.player_at(pos)
        })
    }

    /// Puts `template` on `to`, clearing it from `from`.
    ///
    /// Fails without touching the grid when `to` is not free, so two entities
    /// racing for one cell resolve to whichever takes the lock first.
    pub fn place(&mut self, template: Cell, from: Option<Position>, to: Position) -> bool {
        if !self.is_free_for_entity(to) {
            return false;
        }
        if let Some(from) = from {
            self.remove(template, from);
        }
        self.grid.set(to, template)
    }

    /// Clears `pos` if it currently shows `template`.
    pub fn remove(&mut self, template: Cell, pos: Position) {
        if self.grid.get(pos).map_or(false, |c| c.is(&template)) {
            self.grid.set(pos, cell::EMPTY);
        }
    }

    /// Places an entity at `preferred` or the first free cell and records it.
    pub fn post_entity(&mut self, kind: EntityKind, preferred: Position) -> Option<Position> {
        let pos = self.spawn_position(preferred)?;
        self.grid.set(pos, kind.template());
        self.marks.set(kind, Some(pos));
        Some(pos)
    }

    /// Moves an entity from `from` to a randomly sampled free cell.
    pub fn relocate_entity<R: Rng + ?Sized>(
        &mut self,
        kind: EntityKind,
        from: Option<Position>,
        rng: &mut R,
    ) -> Option<Position> {
        let to = self.sample_free_cell(rng)?;
        if !self.place(kind.template(), from, to) {
            return None;
        }
        self.marks.set(kind, Some(to));
        Some(to)
    }

    /// Takes an entity off the grid.
    pub fn withdraw_entity(&mut self, kind: EntityKind, at: Option<Position>) {
        if let Some(pos) = at {
            self.remove(kind.template(), pos);
        }
        self.marks.set(kind, None);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use shared::MapLayout;

    fn world(map: &str) -> WorldState {
        WorldState::new(MapLayout::parse(map).unwrap().grid)
    }

    #[test]
    fn test_snapshot_is_a_full_copy() {
        let mut w = world("   \n   ");
        w.players.insert("a".into(), PlayerState::spawn(1));
        w.set_status("hello");
        let snap = w.snapshot();
        assert_eq!(snap.grid, w.grid);
        assert_eq!(snap.players.len(), 1);
        assert_eq!(snap.status, "hello");
        assert!(!snap.game_over);

        w.players.clear();
        assert_eq!(snap.players.len(), 1);
    }

    #[test]
    fn test_free_cells_exclude_players_terrain_and_entities() {
        let mut w = world("▤ ♣ ");
        w.players.insert(
            "a".into(),
            PlayerState {
                x: 3,
                y: 0,
                lives: 3,
                last_applied_sequence: 1,
            },
        );
        assert!(!w.is_free_for_entity(Position::new(0, 0)));
        assert!(w.is_free_for_entity(Position::new(1, 0)));
        assert!(!w.is_free_for_entity(Position::new(2, 0)));
        assert!(!w.is_free_for_entity(Position::new(3, 0)));
        assert!(!w.is_free_for_entity(Position::new(9, 0)));

        w.grid.set(Position::new(1, 0), cell::TRAP);
        assert!(!w.is_free_for_entity(Position::new(1, 0)));
    }

    #[test]
    fn test_spawn_position_falls_back_to_linear_scan() {
        let w = world("▤▤▤\n▤▤ \n   ");
        assert_eq!(w.spawn_position(Position::new(0, 0)), Some(Position::new(2, 1)));
        assert_eq!(w.spawn_position(Position::new(1, 2)), Some(Position::new(1, 2)));
        assert_eq!(w.spawn_position(Position::new(-4, 40)), Some(Position::new(2, 1)));
    }

    #[test]
    fn test_spawn_position_on_full_grid() {
        let w = world("▤▤\n▤▤");
        assert_eq!(w.spawn_position(Position::new(0, 0)), None);
    }

    #[test]
    fn test_place_moves_template_and_rejects_occupied() {
        let mut w = world("    ");
        assert!(w.place(cell::PORTAL, None, Position::new(0, 0)));
        assert!(w.place(cell::PORTAL, Some(Position::new(0, 0)), Position::new(2, 0)));
        assert!(w.grid.get(Position::new(0, 0)).unwrap().is_empty());
        assert!(w.grid.get(Position::new(2, 0)).unwrap().is(&cell::PORTAL));

        assert!(!w.place(cell::TRAP, None, Position::new(2, 0)));
        assert!(w.grid.get(Position::new(2, 0)).unwrap().is(&cell::PORTAL));
    }

    #[test]
    fn test_remove_only_clears_matching_template() {
        let mut w = world("  ");
        w.grid.set(Position::new(0, 0), cell::TRAP);
        w.remove(cell::PORTAL, Position::new(0, 0));
        assert!(w.grid.get(Position::new(0, 0)).unwrap().is(&cell::TRAP));
        w.remove(cell::TRAP, Position::new(0, 0));
        assert!(w.grid.get(Position::new(0, 0)).unwrap().is_empty());
    }

    #[test]
    fn test_entity_lifecycle_updates_marks() {
        let mut w = world("▤   \n    ");
        let posted = w.post_entity(EntityKind::Trap, Position::new(0, 0));
        assert_eq!(posted, Some(Position::new(1, 0)));
        assert_eq!(w.marks.get(EntityKind::Trap), posted);
        assert!(w.grid.get(Position::new(1, 0)).unwrap().is(&cell::TRAP));

        let mut rng = StdRng::seed_from_u64(3);
        let moved = w.relocate_entity(EntityKind::Trap, posted, &mut rng);
        assert!(moved.is_some());
        assert_ne!(moved, posted);
        assert_eq!(w.marks.trap, moved);
        assert!(w.grid.get(Position::new(1, 0)).unwrap().is_empty());

        w.withdraw_entity(EntityKind::Trap, moved);
        assert_eq!(w.marks.trap, None);
        assert!(w.grid.positions().all(|p| !w.grid.get(p).unwrap().is(&cell::TRAP)));
    }

    #[test]
    fn test_sampled_cells_are_always_free() {
        let w = world("▤ ▤ ▤\n ♣ ▤ \n▤▤   ");
        let mut rng = StdRng::seed_from_u64(99);
        for _ in 0..200 {
            if let Some(pos) = w.sample_free_cell(&mut rng) {
                assert!(w.is_free_for_entity(pos));
            }
        }
    }
}
