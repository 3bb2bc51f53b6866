use serde::{Deserialize, Serialize};

/// Display colours understood by the rendering sink.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum Color {
    Default,
    DarkGray,
    Red,
    Green,
    Yellow,
    Cyan,
    Blue,
    Wall,
    WallBackground,
}

/// One grid position: a glyph, its colours and whether it blocks entry.
///
/// Cells are value templates; the grid stores copies of the constants below.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct Cell {
    pub glyph: char,
    pub fg: Color,
    pub bg: Color,
    pub solid: bool,
}

impl Cell {
    pub const fn new(glyph: char, fg: Color, bg: Color, solid: bool) -> Self {
        Self {
            glyph,
            fg,
            bg,
            solid,
        }
    }

    /// True when `other` shares this template's glyph.
    pub fn is(&self, other: &Cell) -> bool {
        self.glyph == other.glyph
    }

    pub fn is_empty(&self) -> bool {
        self.is(&EMPTY)
    }
}

impl Default for Cell {
    fn default() -> Self {
        EMPTY
    }
}

pub const PLAYER: Cell = Cell::new('☺', Color::DarkGray, Color::Default, true);
pub const REMOTE_PLAYER: Cell = Cell::new('☻', Color::Blue, Color::Default, true);
pub const ENEMY: Cell = Cell::new('☠', Color::Red, Color::Default, true);
pub const WALL: Cell = Cell::new('▤', Color::Wall, Color::WallBackground, true);
pub const VEGETATION: Cell = Cell::new('♣', Color::Green, Color::Default, false);
pub const EMPTY: Cell = Cell::new(' ', Color::Default, Color::Default, false);

pub const GUARD: Cell = Cell::new('G', Color::Yellow, Color::Default, true);
pub const PORTAL: Cell = Cell::new('P', Color::Cyan, Color::Default, false);
pub const TRAP: Cell = Cell::new('A', Color::Red, Color::Default, false);

/// Map-file glyph that marks the local player's spawn point.
pub const SPAWN_GLYPH: char = '☺';

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_templates_compare_by_glyph() {
        let mut portal = PORTAL;
        portal.fg = Color::Green;
        assert!(portal.is(&PORTAL));
        assert!(!portal.is(&TRAP));
    }

    #[test]
    fn test_solidity_of_templates() {
        assert!(WALL.solid);
        assert!(GUARD.solid);
        assert!(REMOTE_PLAYER.solid);
        assert!(!EMPTY.solid);
        assert!(!VEGETATION.solid);
        assert!(!PORTAL.solid);
        assert!(!TRAP.solid);
    }

    #[test]
    fn test_remote_marker_is_distinct_from_terrain() {
        for terrain in [WALL, VEGETATION, EMPTY, ENEMY, GUARD, PORTAL, TRAP] {
            assert!(!terrain.is(&REMOTE_PLAYER));
        }
        assert_eq!(Cell::default(), EMPTY);
    }
}
