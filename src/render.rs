//! Drawing boundary: the handful of primitives the board needs, a terminal
//! implementation that scales the logical canvas onto character cells, and the
//! board painter itself.

use crate::board::Board;
use crate::theme::Theme;
use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};

/// Rectangle on the logical canvas, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelRect {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

impl PixelRect {
    pub const fn new(x: i32, y: i32, w: i32, h: i32) -> Self {
        Self { x, y, w, h }
    }

    #[inline]
    pub fn center(&self) -> (i32, i32) {
        (self.x + self.w / 2, self.y + self.h / 2)
    }
}

/// What the board painter draws onto. Presenting the frame is left to whoever
/// owns the surface.
pub trait Canvas {
    fn fill(&mut self, color: Color);
    fn fill_rect(&mut self, color: Color, rect: PixelRect);
    fn stroke_rect(&mut self, color: Color, rect: PixelRect, thickness: u16);
    fn line(&mut self, color: Color, from: (i32, i32), to: (i32, i32), thickness: u16);
    /// Render `text` and blit it centred on `center`.
    fn text(&mut self, text: &str, color: Color, center: (i32, i32));
}

/// Thickness of grid lines and the border, in logical pixels.
pub const OUTLINE_THICKNESS: u16 = 10;

/// Paint background, tiles, then the grid on top.
pub fn draw_board<C: Canvas + ?Sized>(canvas: &mut C, board: &Board, theme: &Theme) {
    let config = board.config();
    let (width, height) = config.canvas();
    let (cw, ch) = (config.cell_width(), config.cell_height());

    canvas.fill(theme.bg);

    for tile in board.tiles() {
        let rect = PixelRect::new(tile.x, tile.y, cw, ch);
        canvas.fill_rect(theme.rank_color(tile.rank()), rect);
        canvas.text(&tile.value.to_string(), theme.text, rect.center());
    }

    for row in 1..config.rows() {
        let y = row as i32 * ch;
        canvas.line(theme.outline, (0, y), (width, y), OUTLINE_THICKNESS);
    }
    for col in 1..config.cols() {
        let x = col as i32 * cw;
        canvas.line(theme.outline, (x, 0), (x, height), OUTLINE_THICKNESS);
    }
    canvas.stroke_rect(
        theme.outline,
        PixelRect::new(0, 0, width, height),
        OUTLINE_THICKNESS,
    );
}

/// Canvas over a ratatui buffer. The logical canvas maps onto `area`, whose last
/// column and row hold the right and bottom edges.
pub struct TerminalCanvas<'a> {
    buf: &'a mut Buffer,
    area: Rect,
    canvas: (i32, i32),
}

impl<'a> TerminalCanvas<'a> {
    pub fn new(buf: &'a mut Buffer, area: Rect, canvas: (i32, i32)) -> Self {
        Self { buf, area, canvas }
    }

    /// Pixel → buffer column. The far edge of the canvas lands on the last column.
    fn col(&self, x: i32) -> u16 {
        let span = i64::from(self.area.width.saturating_sub(1));
        let x = i64::from(x.clamp(0, self.canvas.0));
        self.area.x + (x * span / i64::from(self.canvas.0.max(1))) as u16
    }

    fn row(&self, y: i32) -> u16 {
        let span = i64::from(self.area.height.saturating_sub(1));
        let y = i64::from(y.clamp(0, self.canvas.1));
        self.area.y + (y * span / i64::from(self.canvas.1.max(1))) as u16
    }

    fn put(&mut self, x: u16, y: u16, symbol: &str, style: Style) {
        if let Some(cell) = self.buf.cell_mut((x, y)) {
            cell.set_symbol(symbol).set_style(style);
        }
    }

    fn symbol_at(&self, x: u16, y: u16) -> Option<&str> {
        self.buf.cell((x, y)).map(|c| c.symbol())
    }
}

impl Canvas for TerminalCanvas<'_> {
    fn fill(&mut self, color: Color) {
        for y in self.area.top()..self.area.bottom() {
            for x in self.area.left()..self.area.right() {
                self.put(x, y, " ", Style::default().bg(color));
            }
        }
    }

    fn fill_rect(&mut self, color: Color, rect: PixelRect) {
        let (x0, x1) = (self.col(rect.x), self.col(rect.x + rect.w));
        let (y0, y1) = (self.row(rect.y), self.row(rect.y + rect.h));
        let style = Style::default().bg(color);
        for y in y0..y1.max(y0 + 1) {
            for x in x0..x1.max(x0 + 1) {
                self.put(x, y, " ", style);
            }
        }
    }

    fn stroke_rect(&mut self, color: Color, rect: PixelRect, thickness: u16) {
        let (l, t) = (rect.x, rect.y);
        let (r, b) = (rect.x + rect.w, rect.y + rect.h);
        self.line(color, (l, t), (r, t), thickness);
        self.line(color, (l, b), (r, b), thickness);
        self.line(color, (l, t), (l, b), thickness);
        self.line(color, (r, t), (r, b), thickness);
        let style = Style::default().fg(color);
        for (x, y, corner) in [(l, t, "┌"), (r, t, "┐"), (l, b, "└"), (r, b, "┘")] {
            let (cx, cy) = (self.col(x), self.row(y));
            self.put(cx, cy, corner, style);
        }
    }

    /// Axis-aligned only; one character cell thick whatever `thickness` says.
    fn line(&mut self, color: Color, from: (i32, i32), to: (i32, i32), _thickness: u16) {
        let style = Style::default().fg(color);
        if from.1 == to.1 {
            let y = self.row(from.1);
            let (a, b) = (self.col(from.0.min(to.0)), self.col(from.0.max(to.0)));
            for x in a..=b {
                let symbol = match self.symbol_at(x, y) {
                    Some("│" | "┼") => "┼",
                    _ => "─",
                };
                self.put(x, y, symbol, style);
            }
        } else if from.0 == to.0 {
            let x = self.col(from.0);
            let (a, b) = (self.row(from.1.min(to.1)), self.row(from.1.max(to.1)));
            for y in a..=b {
                let symbol = match self.symbol_at(x, y) {
                    Some("─" | "┼") => "┼",
                    _ => "│",
                };
                self.put(x, y, symbol, style);
            }
        } else {
            log::warn!("skipping diagonal line {from:?} -> {to:?}");
        }
    }

    fn text(&mut self, text: &str, color: Color, center: (i32, i32)) {
        let len = text.chars().count() as u16;
        let x = self.col(center.0).saturating_sub(len / 2).max(self.area.x);
        let y = self.row(center.1);
        let max_width = self.area.right().saturating_sub(x) as usize;
        // Only the foreground changes; the tile fill underneath stays.
        let style = Style::default().fg(color).add_modifier(Modifier::BOLD);
        self.buf.set_stringn(x, y, text, max_width, style);
    }
}
