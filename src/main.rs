//! Headless replay of a comment file.
//!
//! Opens a JSON comment source, plays it for a while against a logging
//! surface, and reports what was on stage. Useful for checking a source and a
//! config without a video player.

use std::path::PathBuf;
use std::thread;
use std::time::Duration;

use anyhow::Context as _;
use clap::Parser;
use danmaku::render::{Drawable, Snapshot, SurfaceError, SurfaceSink};
use danmaku::{core::time, EngineConfig, OverlayEngine};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "danmaku-replay", version)]
struct Cli {
    /// Input comment JSON.
    input: PathBuf,

    /// Engine config TOML.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Stage width in pixels.
    #[arg(long, default_value_t = 640)]
    width: u32,

    /// Stage height in pixels.
    #[arg(long, default_value_t = 360)]
    height: u32,

    /// Start position in seconds.
    #[arg(long, default_value_t = 0.0)]
    start: f64,

    /// How long to play, in seconds.
    #[arg(long, default_value_t = 10.0)]
    duration: f64,
}

/// Logs every presented frame that has something on it.
struct LogSink {
    width: u32,
    height: u32,
    frames: u64,
}

impl SurfaceSink for LogSink {
    fn begin_present(&mut self) -> Result<Drawable, SurfaceError> {
        Ok(Drawable {
            width: self.width,
            height: self.height,
            token: self.frames,
        })
    }

    fn end_present(&mut self, _drawable: Drawable, snapshot: &Snapshot) {
        self.frames += 1;
        if snapshot.is_empty() {
            return;
        }
        let texts: Vec<&str> = snapshot.items.iter().map(|p| p.comment.text()).collect();
        tracing::info!(
            "[{}] {} on stage: {}",
            time::format_time(snapshot.time),
            texts.len(),
            texts.join(" | ")
        );
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => EngineConfig::load(path)
            .with_context(|| format!("load config '{}'", path.display()))?,
        None => EngineConfig::default(),
    };
    let source = std::fs::read_to_string(&cli.input)
        .with_context(|| format!("read comments '{}'", cli.input.display()))?;

    let engine = OverlayEngine::with_config(config);
    engine.set_stage_size(cli.width, cli.height);
    engine.attach_surface(
        LogSink {
            width: cli.width,
            height: cli.height,
            frames: 0,
        },
        cli.width,
        cli.height,
    );

    engine.open(&source);
    if !engine.is_running() {
        anyhow::bail!("no comments in '{}'", cli.input.display());
    }

    if cli.start > 0.0 {
        engine.seek(time::from_seconds(cli.start));
    }
    engine.play();
    thread::sleep(Duration::from_secs_f64(cli.duration.max(0.0).min(86_400.0)));

    let position = engine.position();
    engine.close();
    tracing::info!("Stopped at {}", time::format_time(position));
    Ok(())
}
