//! App: terminal init, main loop, key dispatch and the modal slide loop.

use crate::GameConfig;
use crate::board::{Board, Status};
use crate::clock::FrameClock;
use crate::engine::{self, Direction, MoveReport, Slide};
use crate::input::{Action, key_to_action};
use crate::theme::Theme;
use crate::ui::{self, Effects};
use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyEventKind};
use rand::SeedableRng;
use rand::rngs::StdRng;
use ratatui::DefaultTerminal;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Playing,
    /// Board filled up; moves are ignored until restart.
    Lost,
}

pub struct App {
    config: GameConfig,
    theme: Theme,
    board: Board,
    rng: StdRng,
    screen: Screen,
    clock: FrameClock,
    effects: Effects,
    moves: u32,
}

impl App {
    pub fn new(config: GameConfig, theme: Theme) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let mut app = Self {
            board: Board::new(config.board),
            clock: FrameClock::new(config.fps),
            config,
            theme,
            rng,
            screen: Screen::Playing,
            effects: Effects::default(),
            moves: 0,
        };
        app.reset_game();
        app
    }

    fn reset_game(&mut self) {
        self.board = Board::new(self.config.board);
        self.board.seed(&mut self.rng);
        self.screen = Screen::Playing;
        self.effects.clear();
        self.moves = 0;
        log::info!(
            "new {}x{} game, {} tiles",
            self.config.board.rows(),
            self.config.board.cols(),
            self.board.len()
        );
    }

    /// Apply one key action. Returns false when the app should exit.
    fn apply_action(&mut self, terminal: &mut DefaultTerminal, action: Action) -> Result<bool> {
        match action {
            Action::Quit => return Ok(false),
            Action::Restart => self.reset_game(),
            Action::Move(direction) if self.screen == Screen::Playing => {
                let report = self.play_move(terminal, direction)?;
                self.record(&report);
            }
            Action::Move(_) | Action::None => {}
        }
        Ok(true)
    }

    /// Run a move to completion, drawing every tick unless animation is off.
    /// Input waits until it settles.
    fn play_move(&mut self, terminal: &mut DefaultTerminal, direction: Direction) -> Result<MoveReport> {
        if self.config.no_animation {
            return Ok(engine::slide(
                &mut self.board,
                direction,
                &mut self.rng,
                self.config.noop_policy,
            ));
        }
        let mut slide = Slide::new(&mut self.board, direction);
        while slide.step() {
            terminal.draw(|f| {
                ui::draw(
                    f,
                    slide.board(),
                    &self.theme,
                    self.screen,
                    &mut self.effects,
                    true,
                    Instant::now(),
                );
            })?;
            self.clock.tick();
        }
        debug_assert!(slide.is_settled());
        Ok(slide.finish(&mut self.rng, self.config.noop_policy))
    }

    fn record(&mut self, report: &MoveReport) {
        self.moves += 1;
        log::debug!(
            "move {} {}: ticks={} merges={} spawned={:?} value={:?} status={:?}",
            self.moves,
            report.direction,
            report.ticks,
            report.merges,
            report.spawned,
            report
                .spawned
                .and_then(|cell| self.board.tile_at(cell))
                .map(|t| t.value),
            report.status
        );
        if let Some(cell) = report.spawned {
            self.effects.spawned(cell);
        }
        if report.status == Status::Lost {
            self.screen = Screen::Lost;
            log::info!(
                "board full after {} moves, largest tile {}",
                self.moves,
                self.board.tiles().map(|t| t.value).max().unwrap_or(0)
            );
        }
    }

    pub fn run(&mut self) -> Result<()> {
        use crossterm::{execute, terminal::{EnterAlternateScreen, enable_raw_mode}};

        enable_raw_mode().context("enabling raw mode")?;
        with_restore(
            || {
                let mut stdout = std::io::stdout();
                execute!(stdout, EnterAlternateScreen).context("entering alternate screen")?;
                let mut terminal =
                    ratatui::DefaultTerminal::new(ratatui::backend::CrosstermBackend::new(stdout))
                        .context("creating terminal")?;
                self.run_loop(&mut terminal)
            },
            restore_terminal,
        )
    }

    fn run_loop(&mut self, terminal: &mut DefaultTerminal) -> Result<()> {
        let animate = !self.config.no_animation;
        loop {
            self.clock.tick();

            while event::poll(Duration::ZERO)? {
                if let Event::Key(key) = event::read()? {
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }
                    if !self.apply_action(terminal, key_to_action(key))? {
                        log::info!("quit after {} moves", self.moves);
                        return Ok(());
                    }
                }
            }

            terminal.draw(|f| {
                ui::draw(
                    f,
                    &self.board,
                    &self.theme,
                    self.screen,
                    &mut self.effects,
                    animate,
                    Instant::now(),
                );
            })?;
        }
    }
}

/// Run `body`, then `restore` whatever `body` returned. An error from `body`
/// takes precedence over one from `restore`.
fn with_restore<T>(
    body: impl FnOnce() -> Result<T>,
    restore: impl FnOnce() -> Result<()>,
) -> Result<T> {
    let result = body();
    let restored = restore();
    result.and_then(|value| restored.map(|()| value))
}

fn restore_terminal() -> Result<()> {
    use crossterm::{execute, terminal::{LeaveAlternateScreen, disable_raw_mode}};

    // Both steps run even if the first fails.
    let screen = execute!(std::io::stdout(), LeaveAlternateScreen);
    let raw = disable_raw_mode();
    screen.context("leaving alternate screen")?;
    raw.context("disabling raw mode")
}
