#![forbid(unsafe_code)]

mod app;
mod scene;
mod watch;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use crate::app::{App, AppOptions};

#[derive(Parser, Debug)]
#[command(name = "terrane", about = "Headless chunked terrain streamer")]
struct Args {
    /// Terrain config (TOML). Built-in defaults when omitted.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Ticks to simulate before exiting.
    #[arg(long, default_value_t = 600)]
    ticks: u64,
    /// Worker threads; 0 = one per core.
    #[arg(long, default_value_t = 0)]
    workers: usize,
    /// Viewer speed in world units per tick.
    #[arg(long, default_value_t = 4.0)]
    speed: f32,
    /// Viewer heading in degrees, 0 = +X.
    #[arg(long, default_value_t = 30.0)]
    heading: f32,
    /// Milliseconds to sleep between ticks.
    #[arg(long, default_value_t = 16)]
    tick_ms: u64,
    /// Log a stats line every N ticks.
    #[arg(long, default_value_t = 60)]
    stats_every: u64,
    /// Reload the config file when it changes and regenerate the terrain.
    #[arg(long, default_value_t = false)]
    watch: bool,
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let settings = match &args.config {
        Some(path) => match terrane_world::load_settings_from_path(path) {
            Ok(s) => s,
            Err(e) => {
                log::error!("{}: {}", path.display(), e);
                return ExitCode::FAILURE;
            }
        },
        None => terrane_world::TerrainSettings::default(),
    };
    if args.watch && args.config.is_none() {
        log::warn!("--watch needs --config; ignoring");
    }

    let options = AppOptions {
        ticks: args.ticks,
        workers: args.workers,
        speed: args.speed,
        heading_deg: args.heading,
        tick_ms: args.tick_ms,
        stats_every: args.stats_every.max(1),
        watch: if args.watch { args.config.clone() } else { None },
    };
    let mut app = match App::new(settings, options) {
        Ok(app) => app,
        Err(e) => {
            log::error!("{}", e);
            return ExitCode::FAILURE;
        }
    };
    app.run();
    ExitCode::SUCCESS
}
