use clap::Parser;
use log::{LevelFilter, error, info, warn};
use macroquad::prelude::*;
use tinywheels::config::{WINDOW_HEIGHT, WINDOW_WIDTH};
use tinywheels::game::{Game, UiPreview};
use tinywheels::logging::{self, TOPICS};
use tinywheels::render::Renderer;

// --- Command Line Arguments ---
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Show this UI markup file instead of racing. Press R to reload it.
    #[arg(long, value_name = "FILE")]
    ui: Option<String>,

    /// Track generation seed. Defaults to the current time.
    #[arg(long)]
    seed: Option<u64>,

    /// Define a markup variable, usable as ${NAME} and by <Ifdef>
    #[arg(long = "define", value_name = "NAME=VALUE", value_parser = parse_definition)]
    defines: Vec<(String, String)>,

    /// Debug filter to specify log topics (e.g., "ui,world")
    /// Available topics: ui, world, physics, stats
    #[arg(long)]
    debug_filter: Option<String>,

    /// Log level (off, error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn parse_definition(text: &str) -> Result<(String, String), String> {
    match text.split_once('=') {
        Some((name, value)) if !name.is_empty() => Ok((name.to_string(), value.to_string())),
        _ => Err(format!("expected NAME=VALUE, got '{}'", text)),
    }
}

fn window_conf() -> Conf {
    Conf {
        window_title: "Tiny Wheels".to_owned(),
        window_width: WINDOW_WIDTH,
        window_height: WINDOW_HEIGHT,
        window_resizable: false,
        ..Default::default()
    }
}

#[macroquad::main(window_conf)]
async fn main() {
    let args = Args::parse();

    let log_level = match args.log_level.to_lowercase().as_str() {
        "off" => LevelFilter::Off,
        "error" => LevelFilter::Error,
        "warn" => LevelFilter::Warn,
        "info" => LevelFilter::Info,
        "debug" => LevelFilter::Debug,
        "trace" => LevelFilter::Trace,
        _ => LevelFilter::Info,
    };
    if let Err(e) = logging::init_logger(log_level, args.debug_filter.clone()) {
        eprintln!("Warning: Failed to initialize logger: {}", e);
    }
    if let Some(filter) = &args.debug_filter {
        for topic in filter.split(',').map(str::trim).filter(|t| !t.is_empty()) {
            if !TOPICS.contains(&topic) {
                warn!("Unknown debug topic '{}', expected one of {}", topic, TOPICS.join(", "));
            }
        }
    }

    let mut renderer = Renderer::new();

    if let Some(path) = args.ui {
        info!("Previewing {}", path);
        UiPreview::new(path, args.defines).run(&mut renderer).await;
        return;
    }

    let seed = args
        .seed
        .unwrap_or_else(|| chrono::Local::now().timestamp().unsigned_abs());
    info!("Initializing Tiny Wheels...");
    let mut game = match Game::new(seed, &args.defines) {
        Ok(game) => game,
        Err(e) => {
            error!("Failed to create game: {}", e);
            std::process::exit(1);
        }
    };
    if let Err(e) = game.run(&mut renderer).await {
        error!("Game loop failed: {}", e);
        std::process::exit(1);
    }
}
