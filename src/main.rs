//! tui2048 — the 2048 sliding-tile game in the terminal, with tiles that glide and merge.

mod app;
mod board;
mod clock;
mod engine;
mod input;
mod render;
mod theme;
mod tile;
mod ui;

use anyhow::{Context, Result};
use app::App;
use board::{BoardConfig, ConfigError};
use clap::Parser;
use engine::NoopPolicy;
use std::path::{Path, PathBuf};

/// Options derived from CLI that affect game behaviour (geometry, pacing, spawning).
#[derive(Debug, Clone)]
pub struct GameConfig {
    pub board: BoardConfig,
    pub fps: f64,
    pub seed: Option<u64>,
    pub no_animation: bool,
    pub noop_policy: NoopPolicy,
}

impl GameConfig {
    pub fn from_args(args: &Args) -> Result<Self, ConfigError> {
        let board = BoardConfig::new(
            args.rows,
            args.cols,
            args.canvas,
            args.canvas,
            args.velocity,
        )?;
        Ok(Self {
            board,
            fps: args.fps,
            seed: args.seed,
            no_animation: args.no_animation,
            noop_policy: if args.spawn_on_noop {
                NoopPolicy::Spawn
            } else {
                NoopPolicy::Skip
            },
        })
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    if let Some(path) = &args.log_file {
        init_logging(path)?;
    }
    let config = GameConfig::from_args(&args).context("invalid board options")?;
    let theme = theme::Theme::load(args.theme.as_deref()).unwrap_or_else(|e| {
        log::warn!("theme not loaded ({e}), using the classic palette");
        theme::Theme::default()
    });
    log::info!("starting with {config:?}");
    App::new(config, theme).run()
}

/// The TUI owns stdout and stderr, so log records only go to a file.
fn init_logging(path: &Path) -> Result<()> {
    let file = std::fs::File::create(path)
        .with_context(|| format!("opening log file {}", path.display()))?;
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Pipe(Box::new(file)))
        .try_init()
        .context("installing logger")
}

/// 2048 in the terminal.
#[derive(Debug, Parser)]
#[command(
    name = "tui2048",
    version,
    about = "The 2048 sliding-tile game in the terminal. Slide the board, merge equal tiles, keep a cell free.",
    long_about = "tui2048 plays 2048 on a grid drawn in the terminal.\n\n\
        Every move slides all tiles as far as they go in one direction. Two equal tiles \
        that meet merge into one of twice the value, at most once per move. A new 2 or 4 \
        appears after each move that changed something. The game ends when the board is full.\n\n\
        CONTROLS:\n  Arrows / h j k l  Slide    r  Restart    q / Esc  Quit\n\n\
        Use --theme to load a btop-style theme file (theme[tile_2]=\"#eee4da\" ...)."
)]
pub struct Args {
    /// Grid rows.
    #[arg(long, default_value = "4", value_name = "N")]
    pub rows: usize,

    /// Grid columns.
    #[arg(long, default_value = "4", value_name = "N")]
    pub cols: usize,

    /// Side of the square logical canvas, in pixels. Tiles are sized from it.
    #[arg(long, default_value = "800", value_name = "PX")]
    pub canvas: i32,

    /// Pixels a tile travels per animation tick. Must divide the cell size.
    #[arg(long, default_value = "20", value_name = "PX")]
    pub velocity: i32,

    /// Target frames per second (also the animation tick rate).
    #[arg(long, default_value = "60.0", value_name = "RATE")]
    pub fps: f64,

    /// Seed for tile placement, for reproducible games.
    #[arg(long, value_name = "N")]
    pub seed: Option<u64>,

    /// Path to theme file (btop-style theme[key]=\"value\"). Uses the classic palette if not set.
    #[arg(short, long, value_name = "FILE")]
    pub theme: Option<PathBuf>,

    /// Settle moves instantly instead of animating them.
    #[arg(long)]
    pub no_animation: bool,

    /// Spawn a tile even after a move that changed nothing.
    #[arg(long)]
    pub spawn_on_noop: bool,

    /// Write logs here (filter with RUST_LOG, default info).
    #[arg(long, value_name = "FILE")]
    pub log_file: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_is_well_formed() {
        Args::command().debug_assert();
    }

    #[test]
    fn defaults_give_the_classic_board() {
        let args = Args::parse_from(["tui2048"]);
        let config = GameConfig::from_args(&args).unwrap();
        assert_eq!(config.board, BoardConfig::default());
        assert_eq!(config.noop_policy, NoopPolicy::Skip);
        assert!(config.seed.is_none());
    }

    #[test]
    fn flags_reach_the_config() {
        let args = Args::parse_from([
            "tui2048",
            "--rows",
            "5",
            "--cols",
            "5",
            "--canvas",
            "500",
            "--velocity",
            "25",
            "--seed",
            "7",
            "--spawn-on-noop",
            "--no-animation",
        ]);
        let config = GameConfig::from_args(&args).unwrap();
        assert_eq!(config.board.rows(), 5);
        assert_eq!(config.board.cell_width(), 100);
        assert_eq!(config.seed, Some(7));
        assert_eq!(config.noop_policy, NoopPolicy::Spawn);
        assert!(config.no_animation);
    }

    #[test]
    fn misaligned_velocity_is_rejected() {
        let args = Args::parse_from(["tui2048", "--velocity", "30"]);
        assert!(matches!(
            GameConfig::from_args(&args),
            Err(ConfigError::Misaligned { .. })
        ));
    }
}
