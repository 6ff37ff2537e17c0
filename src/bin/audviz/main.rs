//! audviz - terminal audio player with real-time visualizations
//!
//! Run with: cargo run -- path/to/song.wav

mod app;
mod stages;
mod ui;

use std::{fs::File, path::PathBuf, sync::Mutex};

use clap::Parser;
use color_eyre::eyre::{Result as EyreResult, WrapErr};
use tracing_subscriber::EnvFilter;

use app::Player;
use audviz::{buffer::ReadOrder, config::PlayerConfig, graph::VisualizationMode};

#[derive(Parser)]
#[command(name = "audviz")]
#[command(about = "Audio player with spectrum, Lissajous, scope and envelope views", long_about = None)]
struct Cli {
    /// Audio file, file:// URL, or "mic" for the default input device
    source: Option<String>,

    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Visualization to start with (none, spectrum, lissajous, oscilloscope, envelope)
    #[arg(short, long)]
    mode: Option<VisualizationMode>,

    /// Restart from the beginning when the source ends
    #[arg(short = 'l', long = "loop")]
    loop_playback: bool,

    /// Wait for space before starting playback
    #[arg(long)]
    gesture_gated: bool,

    /// Number of sample pool slots (at least 2)
    #[arg(long)]
    pool_size: Option<usize>,

    /// Render order for pooled blocks (oldest, latest)
    #[arg(long, value_parser = parse_read_order)]
    read_order: Option<ReadOrder>,

    /// Where tracing output goes; the terminal belongs to the UI
    #[arg(long, default_value = "audviz.log")]
    log_file: PathBuf,
}

fn parse_read_order(s: &str) -> Result<ReadOrder, String> {
    match s.to_ascii_lowercase().as_str() {
        "oldest" => Ok(ReadOrder::Oldest),
        "latest" => Ok(ReadOrder::Latest),
        other => Err(format!("unknown read order '{other}'")),
    }
}

impl Cli {
    /// Config file (or defaults) with command-line overrides applied.
    fn player_config(&self) -> EyreResult<PlayerConfig> {
        let mut config = match &self.config {
            Some(path) => PlayerConfig::load(path)?,
            None => PlayerConfig::default(),
        };
        if let Some(source) = &self.source {
            config.source = Some(source.clone());
        }
        if let Some(mode) = self.mode {
            config.mode = mode;
        }
        if let Some(pool_size) = self.pool_size {
            config.pool_size = pool_size;
        }
        if let Some(order) = self.read_order {
            config.read_order = order;
        }
        config.loop_playback |= self.loop_playback;
        config.gesture_gated |= self.gesture_gated;
        config.validate()?;
        Ok(config)
    }
}

fn init_logging(path: &PathBuf) -> EyreResult<()> {
    let file = File::create(path)
        .wrap_err_with(|| format!("failed to create log file {}", path.display()))?;
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("audviz=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

fn main() -> EyreResult<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    init_logging(&cli.log_file)?;
    let config = cli.player_config()?;

    let player = Player::new(config)?;
    let terminal = ratatui::init();
    let res = player.run(terminal);
    ratatui::restore();
    res
}
