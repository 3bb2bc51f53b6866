//! Fixed-size cell grid and the text map format it is loaded from.
//!
//! Every accessor is bounds-checked: reads outside the grid return `None`
//! and writes outside it are ignored, so callers never have to guard
//! coordinates themselves.

use crate::cell::{self, Cell, SPAWN_GLYPH};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Attempt cap for random free-cell sampling.
pub const SAMPLE_ATTEMPTS: usize = 100;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn offset(self, dx: i32, dy: i32) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }

    /// Chebyshev distance, the number of king moves between two cells.
    pub fn distance(self, other: Position) -> i32 {
        (self.x - other.x).abs().max((self.y - other.y).abs())
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Grid {
    width: usize,
    height: usize,
    cells: Vec<Cell>,
}

impl Grid {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            cells: vec![cell::EMPTY; width * height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn same_shape(&self, other: &Grid) -> bool {
        self.width == other.width && self.height == other.height
    }

    fn index(&self, pos: Position) -> Option<usize> {
        if pos.x < 0 || pos.y < 0 {
            return None;
        }
        let (x, y) = (pos.x as usize, pos.y as usize);
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(y * self.width + x)
    }

    pub fn in_bounds(&self, pos: Position) -> bool {
        self.index(pos).is_some()
    }

    pub fn get(&self, pos: Position) -> Option<&Cell> {
        self.index(pos).map(|i| &self.cells[i])
    }

    /// Writes `cell` at `pos`. Returns false (and changes nothing) when out of bounds.
    pub fn set(&mut self, pos: Position, cell: Cell) -> bool {
        match self.index(pos) {
            Some(i) => {
                self.cells[i] = cell;
                true
            }
            None => false,
        }
    }

    /// Exchanges the contents of two cells; a no-op if either is out of bounds.
    pub fn swap(&mut self, a: Position, b: Position) -> bool {
        match (self.index(a), self.index(b)) {
            (Some(i), Some(j)) => {
                self.cells.swap(i, j);
                true
            }
            _ => false,
        }
    }

    /// In bounds and not solid.
    pub fn is_walkable(&self, pos: Position) -> bool {
        self.get(pos).map_or(false, |c| !c.solid)
    }

    /// Row-major iteration over every coordinate of the grid.
    pub fn positions(&self) -> impl Iterator<Item = Position> + '_ {
        (0..self.height)
            .flat_map(move |y| (0..self.width).map(move |x| Position::new(x as i32, y as i32)))
    }

    /// Linear scan for the first cell satisfying `pred`.
    pub fn find_first<F>(&self, mut pred: F) -> Option<Position>
    where
        F: FnMut(Position, &Cell) -> bool,
    {
        self.positions()
            .find(|&pos| self.get(pos).map_or(false, |c| pred(pos, c)))
    }

    /// All cells satisfying `pred`, row-major.
    pub fn collect_cells<F>(&self, mut pred: F) -> Vec<Position>
    where
        F: FnMut(Position, &Cell) -> bool,
    {
        self.positions()
            .filter(|&pos| self.get(pos).map_or(false, |c| pred(pos, c)))
            .collect()
    }

    /// Bounded rejection sampling: draws up to `attempts` random coordinates
    /// and returns the first one satisfying `pred`.
    pub fn sample<R, F>(&self, rng: &mut R, attempts: usize, mut pred: F) -> Option<Position>
    where
        R: Rng + ?Sized,
        F: FnMut(Position, &Cell) -> bool,
    {
        if self.width == 0 || self.height == 0 {
            return None;
        }
        for _ in 0..attempts {
            let pos = Position::new(
                rng.gen_range(0..self.width) as i32,
                rng.gen_range(0..self.height) as i32,
            );
            if let Some(cell) = self.get(pos) {
                if pred(pos, cell) {
                    return Some(pos);
                }
            }
        }
        None
    }

    /// Rows as strings of glyphs, mainly for logging and tests.
    pub fn rows(&self) -> Vec<String> {
        self.cells
            .chunks(self.width.max(1))
            .map(|row| row.iter().map(|c| c.glyph).collect())
            .collect()
    }
}

#[derive(Debug, Error)]
pub enum MapError {
    #[error("failed to read map file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("map is empty")]
    Empty,
}

/// A parsed map: the terrain grid plus the positions marked in the file.
#[derive(Debug, Clone)]
pub struct MapLayout {
    pub grid: Grid,
    pub spawn: Option<Position>,
    pub guard: Option<Position>,
    pub portal: Option<Position>,
    pub trap: Option<Position>,
}

impl MapLayout {
    /// Parses the text map format, one row per line.
    ///
    /// Walls, vegetation and enemies become terrain. The spawn, guard,
    /// portal and trap markers are recorded as hints and leave an empty
    /// cell behind; the entities place themselves when they start.
    /// Short rows are padded with empty cells.
    pub fn parse(text: &str) -> Result<Self, MapError> {
        let lines: Vec<&str> = text.lines().collect();
        let width = lines.iter().map(|l| l.chars().count()).max().unwrap_or(0);
        if lines.is_empty() || width == 0 {
            return Err(MapError::Empty);
        }

        let mut layout = MapLayout {
            grid: Grid::new(width, lines.len()),
            spawn: None,
            guard: None,
            portal: None,
            trap: None,
        };

        for (y, line) in lines.iter().enumerate() {
            for (x, ch) in line.chars().enumerate() {
                let pos = Position::new(x as i32, y as i32);
                let cell = match ch {
                    c if c == cell::WALL.glyph => cell::WALL,
                    c if c == cell::VEGETATION.glyph => cell::VEGETATION,
                    c if c == cell::ENEMY.glyph => cell::ENEMY,
                    c if c == SPAWN_GLYPH => {
                        layout.spawn = Some(pos);
                        cell::EMPTY
                    }
                    c if c == cell::GUARD.glyph => {
                        layout.guard = Some(pos);
                        cell::EMPTY
                    }
                    c if c == cell::PORTAL.glyph => {
                        layout.portal = Some(pos);
                        cell::EMPTY
                    }
                    c if c == cell::TRAP.glyph => {
                        layout.trap = Some(pos);
                        cell::EMPTY
                    }
                    _ => cell::EMPTY,
                };
                layout.grid.set(pos, cell);
            }
        }

        Ok(layout)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, MapError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| MapError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::parse(&text)
    }
}
