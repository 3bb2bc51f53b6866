use crate::game::LocalGame;
use macroquad::prelude::*;
use shared::cell;
use shared::Color as CellColor;

const STATUS_BAR_HEIGHT: f32 = 48.0;

pub struct Renderer {
    cell_size: f32,
}

impl Renderer {
    pub fn new(cell_size: f32) -> Self {
        Renderer { cell_size }
    }

    pub fn render(&mut self, game: &LocalGame) {
        clear_background(Color::from_rgba(26, 26, 26, 255));

        let grid = &game.grid;
        for pos in grid.positions() {
            let Some(cell) = grid.get(pos) else {
                continue;
            };
            let (x, y) = self.origin(pos.x, pos.y);

            if cell.bg != CellColor::Default {
                draw_rectangle(x, y, self.cell_size, self.cell_size, palette(cell.bg));
            }
            if cell.is(&cell::WALL) {
                let size = self.cell_size;
                draw_rectangle_lines(x, y, size, size, 1.0, palette(cell.fg));
            } else if !cell.is_empty() {
                self.draw_glyph(cell.glyph, x, y, palette(cell.fg));
            }
        }

        let (x, y) = self.origin(game.position.x, game.position.y);
        let player = if game.game_over { RED } else { GREEN };
        let inner = self.cell_size - 4.0;
        draw_rectangle(x + 2.0, y + 2.0, inner, inner, player);

        self.draw_status(game, grid.height() as f32 * self.cell_size);
    }

    fn origin(&self, x: i32, y: i32) -> (f32, f32) {
        (x as f32 * self.cell_size, y as f32 * self.cell_size)
    }

    fn draw_glyph(&self, glyph: char, x: f32, y: f32, color: Color) {
        let mut buf = [0u8; 4];
        let text = glyph.encode_utf8(&mut buf);
        let size = self.cell_size;
        draw_text(text, x + size * 0.2, y + size * 0.8, size, color);
    }

    fn draw_status(&self, game: &LocalGame, top: f32) {
        let background = Color::from_rgba(40, 40, 40, 255);
        draw_rectangle(0.0, top, screen_width(), STATUS_BAR_HEIGHT, background);

        for i in 0..game.lives {
            draw_rectangle(10.0 + i as f32 * 16.0, top + 8.0, 12.0, 12.0, RED);
        }
        let remote = format!("{} other players", game.remote_players());
        draw_text(&remote, 80.0, top + 19.0, 16.0, WHITE);
        draw_text(&game.status, 10.0, top + 40.0, 18.0, YELLOW);
    }
}

pub fn palette(color: CellColor) -> Color {
    match color {
        CellColor::Default => WHITE,
        CellColor::DarkGray => Color::from_rgba(85, 85, 85, 255),
        CellColor::Red => Color::from_rgba(255, 68, 68, 255),
        CellColor::Green => GREEN,
        CellColor::Yellow => YELLOW,
        CellColor::Cyan => Color::from_rgba(0, 255, 255, 255),
        CellColor::Blue => Color::from_rgba(0, 170, 255, 255),
        CellColor::Wall => Color::from_rgba(136, 136, 136, 255),
        CellColor::WallBackground => Color::from_rgba(68, 68, 68, 255),
    }
}

/// Window size that fits the grid plus the status bar.
pub fn window_size(width: usize, height: usize, cell_size: f32) -> (i32, i32) {
    (
        (width as f32 * cell_size) as i32,
        (height as f32 * cell_size + STATUS_BAR_HEIGHT) as i32,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_fits_grid_and_status_bar() {
        assert_eq!(window_size(30, 20, 24.0), (720, 528));
    }

    #[test]
    fn test_palette_distinguishes_hazards() {
        assert_ne!(palette(CellColor::Red), palette(CellColor::Cyan));
        assert_eq!(palette(CellColor::Default), WHITE);
    }
}
