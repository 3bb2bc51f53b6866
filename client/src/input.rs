//! Keyboard input mapped into game key events

use macroquad::prelude::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub fn delta(self) -> (i32, i32) {
        match self {
            Direction::Up => (0, -1),
            Direction::Down => (0, 1),
            Direction::Left => (-1, 0),
            Direction::Right => (1, 0),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyEvent {
    Move(Direction),
    Interact,
    Restart,
    Quit,
}

// Support both WASD and arrow keys
const BINDINGS: [(KeyCode, KeyEvent); 11] = [
    (KeyCode::W, KeyEvent::Move(Direction::Up)),
    (KeyCode::Up, KeyEvent::Move(Direction::Up)),
    (KeyCode::S, KeyEvent::Move(Direction::Down)),
    (KeyCode::Down, KeyEvent::Move(Direction::Down)),
    (KeyCode::A, KeyEvent::Move(Direction::Left)),
    (KeyCode::Left, KeyEvent::Move(Direction::Left)),
    (KeyCode::D, KeyEvent::Move(Direction::Right)),
    (KeyCode::Right, KeyEvent::Move(Direction::Right)),
    (KeyCode::E, KeyEvent::Interact),
    (KeyCode::R, KeyEvent::Restart),
    (KeyCode::Escape, KeyEvent::Quit),
];

pub fn map_key(key: KeyCode) -> Option<KeyEvent> {
    BINDINGS
        .iter()
        .find(|(code, _)| *code == key)
        .map(|(_, event)| *event)
}

/// Key events pressed since the last frame, one per key press.
pub fn poll_keys() -> Vec<KeyEvent> {
    BINDINGS
        .iter()
        .filter(|(code, _)| is_key_pressed(*code))
        .map(|(_, event)| *event)
        .collect()
}
