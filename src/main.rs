//! Wastesort: arcade waste-sorting game in the terminal.

mod app;
mod bins;
mod config;
mod game;
mod geometry;
mod input;
mod sound;
mod spawner;
mod theme;
mod ui;

use anyhow::{Context, Result};
use app::App;
use clap::{Parser, ValueEnum};
use config::GameConfig;
use std::path::{Path, PathBuf};

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.log_file.as_deref())?;
    let config = build_config(&args)?;
    let theme = theme::Theme::load(args.theme.as_deref(), args.palette).unwrap_or_else(|e| {
        log::warn!("theme not loaded, using defaults: {e}");
        let mut theme = theme::Theme::default();
        theme.apply_palette(args.palette);
        theme
    });
    let mut app = App::new(args, config, theme)?;
    app.run()?;
    Ok(())
}

/// Arcade waste sorting in the terminal.
#[derive(Debug, Parser)]
#[command(
    name = "wastesort",
    version,
    about = "Waste falls from the top; click the bin that matches the lowest item before it lands.",
    long_about = "Wastesort is a small arcade sorting game for the terminal.\n\n\
        Items fall towards a row of labelled bins. Click the bin matching the lowest item to \
        sort it. A wrong click only costs you a buzz, but if an item touches a bin of another \
        category the game is over. Items spawn faster as you go.\n\n\
        CONTROLS:\n  Left click  Sort into bin   P  Pause   Q / Esc  Quit menu   R  Restart (game over)\n\n\
        Use --config to load a TOML file with screen size, categories and spawn cadence."
)]
pub struct Args {
    /// TOML game configuration. Missing keys keep their defaults.
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Simulation ticks per second.
    #[arg(long, value_name = "RATE")]
    pub fps: Option<u32>,

    /// Ticks between spawns at the start of a session.
    #[arg(long, value_name = "TICKS")]
    pub initial_interval: Option<u32>,

    /// Lowest spawn interval the speed-up can reach.
    #[arg(long, value_name = "TICKS")]
    pub min_interval: Option<u32>,

    /// Seed for the category generator (random if not set).
    #[arg(long, value_name = "N")]
    pub seed: Option<u64>,

    /// Path to theme file (btop-style theme[key]=\"value\"). Uses One Dark if not set.
    #[arg(short, long, value_name = "FILE")]
    pub theme: Option<PathBuf>,

    /// Colour palette: normal (theme), high-contrast, or colorblind.
    #[arg(long, default_value = "normal")]
    pub palette: Palette,

    /// Never ring the terminal bell.
    #[arg(long)]
    pub mute: bool,

    /// Ring the bell for mistakes only, not for correct sorts.
    #[arg(long)]
    pub quiet_success: bool,

    /// Quit the program when the game ends instead of showing the game-over screen.
    #[arg(long)]
    pub exit_on_fatal: bool,

    /// Write logs to this file (filter with RUST_LOG, default info).
    #[arg(long, value_name = "FILE")]
    pub log_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Palette {
    #[default]
    Normal,

    #[value(alias = "highcontrast", alias = "contrast")]
    HighContrast,

    #[value(alias = "colourblind")]
    Colorblind,
}

/// The terminal belongs to the UI, so logs only go to a file and only when asked for.
fn init_logging(path: Option<&Path>) -> Result<()> {
    let Some(path) = path else {
        return Ok(());
    };
    let file = std::fs::File::create(path)
        .with_context(|| format!("cannot create log file {}", path.display()))?;
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Pipe(Box::new(file)))
        .init();
    Ok(())
}

/// Defaults, then the config file, then CLI overrides; validated once at the end.
fn build_config(args: &Args) -> Result<GameConfig> {
    let mut config = match &args.config {
        Some(path) => GameConfig::load(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => GameConfig::default(),
    };
    if let Some(fps) = args.fps {
        config.fps = fps;
    }
    if let Some(initial) = args.initial_interval {
        config.initial_interval = initial;
    }
    if let Some(min) = args.min_interval {
        config.min_interval = min;
    }
    config.validate().context("invalid game configuration")?;
    Ok(config)
}
