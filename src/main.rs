//! Mergefall: numbered blocks launch from the floor, settle on a grid and merge in the terminal.

mod app;
mod input;
mod theme;
mod ui;

use anyhow::{Context, Result};
use app::App;
use clap::Parser;
use std::path::{Path, PathBuf};

/// Options derived from CLI that affect the game itself.
#[derive(Debug, Clone)]
pub struct GameConfig {
    pub seed: u64,
    pub spawn_count: u32,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.log_file.as_deref())?;

    let theme = theme::Theme::load(args.theme.as_deref()).unwrap_or_else(|e| {
        log::warn!("theme not loaded: {e}");
        theme::Theme::default()
    });
    let config = GameConfig {
        seed: args.seed.unwrap_or_else(rand::random),
        spawn_count: args.spawn_count.max(1),
    };
    log::info!(
        "starting: seed={} spawn_count={} frame_rate={}",
        config.seed,
        config.spawn_count,
        args.frame_rate
    );

    let mut app = App::new(args, config, theme);
    app.run()?;
    log::info!("bye");
    Ok(())
}

/// Logs go to `--log-file` when given; otherwise they stay off unless RUST_LOG asks for them.
fn init_logging(log_file: Option<&Path>) -> Result<()> {
    match log_file {
        Some(path) => {
            let file = std::fs::File::create(path)
                .with_context(|| format!("cannot create log file {}", path.display()))?;
            env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
                .target(env_logger::Target::Pipe(Box::new(file)))
                .init();
        }
        None => {
            env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("off"))
                .init();
        }
    }
    Ok(())
}

/// Falling numbered-block merge game in the terminal.
#[derive(Debug, Parser)]
#[command(
    name = "mergefall",
    version,
    about = "Numbered blocks launch from the floor, settle onto a grid and merge when equal ones touch.",
    long_about = "Mergefall is a terminal arcade toy.\n\n\
        Each click launches a batch of 2s and 4s from the bottom of the field. Blocks slide, \
        snap onto the grid and merge with overlapping blocks of the same value into one of \
        double value. Every merge adds the new value to your score.\n\n\
        CONTROLS:\n  Left click / Space  Spawn blocks    P  Pause\n  R                   Restart         Q / Esc  Quit menu\n\n\
        Use --theme to load a btop-style theme file with tile colours."
)]
pub struct Args {
    /// RNG seed for reproducible games. Random when omitted.
    #[arg(long, value_name = "N")]
    pub seed: Option<u64>,

    /// Blocks launched per click.
    #[arg(long, default_value = "10", value_name = "N")]
    pub spawn_count: u32,

    /// Target frames per second (physics runs once per frame with measured elapsed time).
    #[arg(long, default_value = "60.0", value_name = "RATE")]
    pub frame_rate: f64,

    /// Path to theme file (btop-style theme[key]=\"value\"). Uses the classic palette if not set.
    #[arg(short, long, value_name = "FILE")]
    pub theme: Option<PathBuf>,

    /// Don't draw merge animations and restart without the fade.
    #[arg(long)]
    pub no_animation: bool,

    /// Write logs to this file (RUST_LOG filters, default info).
    #[arg(long, value_name = "FILE")]
    pub log_file: Option<PathBuf>,
}
