//! Layout and drawing: framed board, status bar, game-over overlay, fade effects.

use crate::app::Screen;
use crate::board::{Board, BoardConfig, Cell};
use crate::render::{TerminalCanvas, draw_board};
use crate::theme::Theme;
use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Widget};
use std::time::Instant;
use tachyonfx::{Duration as TfxDuration, Effect, EffectRenderer, Interpolation, fx};

/// Largest tile in character cells; terminal cells are about twice as tall as wide.
const MAX_TILE_COLS: u16 = 8;
const MAX_TILE_ROWS: u16 = 4;
const MIN_TILE_COLS: u16 = 3;
const STATUS_HEIGHT: u16 = 1;

const SPAWN_FADE_MS: u32 = 180;
const GAME_OVER_FADE_MS: u32 = 400;

/// Character cells per grid cell that fit in `area` (inside the frame and
/// above the status bar).
pub fn tile_span(area: Rect, config: &BoardConfig) -> (u16, u16) {
    let cols = config.cols() as u16;
    let rows = config.rows() as u16;
    // Frame on both sides plus the closing grid edge.
    let avail_w = area.width.saturating_sub(3);
    let avail_h = area.height.saturating_sub(3 + STATUS_HEIGHT);
    let th = (avail_h / rows.max(1)).clamp(1, MAX_TILE_ROWS);
    let tw = (avail_w / cols.max(1)).min(th * 2).max(MIN_TILE_COLS);
    (tw.min(MAX_TILE_COLS), th)
}

/// Terminal rect of the board grid, centred in `area`.
fn board_rect(area: Rect, config: &BoardConfig) -> Rect {
    let (tw, th) = tile_span(area, config);
    let w = tw * config.cols() as u16 + 1;
    let h = th * config.rows() as u16 + 1;

    let horiz = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Fill(1),
            Constraint::Length(w + 2),
            Constraint::Fill(1),
        ])
        .split(area);
    let vert = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Fill(1),
            Constraint::Length(h + 2 + STATUS_HEIGHT),
            Constraint::Fill(1),
        ])
        .split(horiz[1]);
    let outer = vert[1];
    Rect {
        x: outer.x + 1,
        y: outer.y + 1,
        width: w.min(outer.width.saturating_sub(2)),
        height: h.min(outer.height.saturating_sub(2 + STATUS_HEIGHT)),
    }
}

/// Interior of one grid cell (between the grid lines).
fn cell_rect(board: Rect, config: &BoardConfig, cell: Cell) -> Rect {
    let tw = board.width.saturating_sub(1) / config.cols() as u16;
    let th = board.height.saturating_sub(1) / config.rows() as u16;
    Rect {
        x: board.x + cell.col as u16 * tw + 1,
        y: board.y + cell.row as u16 * th + 1,
        width: tw.saturating_sub(1).max(1),
        height: th.saturating_sub(1).max(1),
    }
}

/// TachyonFX state carried between frames.
#[derive(Default)]
pub struct Effects {
    /// Cell of the last spawned tile; its fade is created on the next draw.
    spawned: Option<Cell>,
    spawn: Option<Effect>,
    game_over: Option<Effect>,
    /// Last time effects were processed (for delta).
    process_time: Option<Instant>,
}

impl Effects {
    pub fn spawned(&mut self, cell: Cell) {
        self.spawned = Some(cell);
        self.spawn = None;
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    fn delta(&mut self, now: Instant) -> TfxDuration {
        let delta = self
            .process_time
            .map(|t| now.saturating_duration_since(t))
            .unwrap_or(std::time::Duration::ZERO);
        self.process_time = Some(now);
        TfxDuration::from_millis(delta.as_millis().min(u32::MAX as u128) as u32)
    }
}

/// Draw the current screen. Effects only run when `animate` is set.
pub fn draw(
    frame: &mut Frame,
    board: &Board,
    theme: &Theme,
    screen: Screen,
    effects: &mut Effects,
    animate: bool,
    now: Instant,
) {
    let area = frame.area();
    let config = board.config();
    let grid = board_rect(area, config);
    let outer = Rect {
        x: grid.x.saturating_sub(1),
        y: grid.y.saturating_sub(1),
        width: grid.width + 2,
        height: grid.height + 2,
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.outline))
        .title(Span::styled(" 2048 ", Style::default().fg(theme.title)));
    block.render(outer, frame.buffer_mut());

    draw_board(
        &mut TerminalCanvas::new(frame.buffer_mut(), grid, config.canvas()),
        board,
        theme,
    );

    let status = Rect {
        x: outer.x,
        y: outer.y + outer.height,
        width: outer.width,
        height: STATUS_HEIGHT,
    }
    .intersection(area);
    draw_status(frame, theme, screen, status);

    let popup = (screen == Screen::Lost).then(|| draw_game_over(frame, board, theme, outer));

    if !animate {
        return;
    }
    let delta = effects.delta(now);
    if let Some(cell) = effects.spawned.filter(|_| effects.spawn.is_none()) {
        let rect = cell_rect(grid, config, cell);
        effects.spawn = Some(
            fx::fade_from(theme.bg, theme.bg, (SPAWN_FADE_MS, Interpolation::Linear))
                .with_area(rect),
        );
    }
    if let (Some(cell), Some(effect)) = (effects.spawned, effects.spawn.as_mut()) {
        frame.render_effect(effect, cell_rect(grid, config, cell), delta);
    }
    match popup {
        Some(popup) => {
            let effect = effects.game_over.get_or_insert_with(|| {
                fx::fade_from(theme.bg, theme.bg, (GAME_OVER_FADE_MS, Interpolation::Linear))
                    .with_area(popup)
            });
            frame.render_effect(effect, popup, delta);
        }
        None => effects.game_over = None,
    }
}

fn draw_status(frame: &mut Frame, theme: &Theme, screen: Screen, area: Rect) {
    let hint = match screen {
        Screen::Playing => " ←↑→↓ / hjkl move   r restart   q quit ",
        Screen::Lost => " game over   r restart   q quit ",
    };
    Paragraph::new(Line::from(Span::styled(
        hint,
        Style::default().fg(theme.status_fg),
    )))
    .alignment(Alignment::Center)
    .render(area, frame.buffer_mut());
}

/// Game-over box over the board. Returns where it was drawn.
fn draw_game_over(frame: &mut Frame, board: &Board, theme: &Theme, area: Rect) -> Rect {
    let popup_w = 26u16;
    let popup_h = 7u16;
    let popup = Rect {
        x: area.x + area.width.saturating_sub(popup_w) / 2,
        y: area.y + area.height.saturating_sub(popup_h) / 2,
        width: popup_w.min(area.width),
        height: popup_h.min(area.height),
    };
    let largest = board.tiles().map(|t| t.value).max().unwrap_or(0);
    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            " Game Over ",
            Style::default()
                .fg(Color::White)
                .bg(Color::Red)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(
            format!(" Largest tile: {largest} "),
            match largest {
                0 => Style::default().fg(theme.text),
                v => Style::default().fg(theme.text).bg(theme.tile_color(v)),
            },
        )),
        Line::from(""),
        Line::from(Span::styled(
            " R restart    Q quit ",
            Style::default().fg(theme.text),
        )),
    ];
    Clear.render(popup, frame.buffer_mut());
    Paragraph::new(lines)
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(theme.outline))
                .style(Style::default().bg(theme.tiles[0])),
        )
        .render(popup, frame.buffer_mut());
    popup
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    #[test]
    fn tile_span_fits_default_board() {
        let config = BoardConfig::default();
        assert_eq!(tile_span(Rect::new(0, 0, 120, 40), &config), (8, 4));
        assert_eq!(tile_span(Rect::new(0, 0, 30, 12), &config), (4, 2));
        // Never collapses below something drawable.
        assert_eq!(tile_span(Rect::new(0, 0, 4, 4), &config), (3, 1));
    }

    #[test]
    fn cell_rect_sits_inside_the_grid_lines() {
        let config = BoardConfig::default();
        let grid = Rect::new(10, 5, 33, 17);
        assert_eq!(cell_rect(grid, &config, Cell::new(0, 0)), Rect::new(11, 6, 7, 3));
        assert_eq!(cell_rect(grid, &config, Cell::new(3, 3)), Rect::new(35, 18, 7, 3));
    }

    #[test]
    fn draws_board_and_game_over() {
        let mut terminal = Terminal::new(TestBackend::new(80, 30)).unwrap();
        let board = Board::from_rows(
            BoardConfig::default(),
            &[&[2, 4, 2, 4], &[4, 2, 4, 2], &[2, 4, 2, 4], &[4, 2, 4, 128]],
        );
        let theme = Theme::classic();
        let mut effects = Effects::default();
        terminal
            .draw(|f| {
                draw(
                    f,
                    &board,
                    &theme,
                    Screen::Lost,
                    &mut effects,
                    false,
                    Instant::now(),
                );
            })
            .unwrap();
        let text: String = terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect();
        assert!(text.contains("2048"));
        assert!(text.contains("Game Over"));
        assert!(text.contains("Largest tile: 128"));
    }

    #[test]
    fn spawn_effect_is_created_lazily() {
        let mut terminal = Terminal::new(TestBackend::new(80, 30)).unwrap();
        let board = Board::from_rows(BoardConfig::default(), &[&[2, 2]]);
        let theme = Theme::classic();
        let mut effects = Effects::default();
        effects.spawned(Cell::new(0, 1));
        assert!(effects.spawn.is_none());
        terminal
            .draw(|f| {
                draw(
                    f,
                    &board,
                    &theme,
                    Screen::Playing,
                    &mut effects,
                    true,
                    Instant::now(),
                );
            })
            .unwrap();
        assert!(effects.spawn.is_some());
        assert!(effects.game_over.is_none());
        effects.clear();
        assert!(effects.spawned.is_none());
    }
}
