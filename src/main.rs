use anyhow::Result;
use clap::Parser;
use tokio::sync::mpsc;
use tracing::{info, warn};

mod color;
mod config;
mod controls;
mod display;
mod ipc;
mod visualizer;

use color::ColorMode;
use config::Config;
use display::DrawMode;

#[derive(Parser, Debug)]
#[command(name = "timestable")]
#[command(author, version, about = "Times tables drawn as chords on a circle")]
struct Args {
    /// Config file path
    #[arg(short, long)]
    config: Option<std::path::PathBuf>,

    /// Number of points around the circle
    #[arg(short, long)]
    points: Option<usize>,

    /// Starting times table (fractions allowed)
    #[arg(short, long)]
    multiplier: Option<f64>,

    /// Added to the multiplier after each revolution (0.05-5)
    #[arg(short, long)]
    increment: Option<f64>,

    /// Minimum milliseconds between redraws (0-1000)
    #[arg(long)]
    interval: Option<u64>,

    /// Colour change per revolution
    #[arg(long)]
    color_mode: Option<ColorMode>,

    /// Draw a full revolution or a single chord per tick
    #[arg(long)]
    draw_mode: Option<DrawMode>,

    /// Seed for reproducible random colours
    #[arg(long)]
    seed: Option<u64>,

    /// Colour of the first revolution, e.g. "#FFFFFF"
    #[arg(long)]
    line_color: Option<String>,

    /// Start drawing immediately instead of paused
    #[arg(short, long)]
    run: bool,

    /// Do not listen on the control socket
    #[arg(long)]
    no_ipc: bool,

    /// Write a default config file and exit
    #[arg(long)]
    init_config: bool,

    /// Send a command to a running instance and print the reply
    #[arg(long, value_name = "CMD")]
    send: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr; keep them quiet by default while the TUI owns the screen
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("timestable=warn".parse()?),
        )
        .init();

    let args = Args::parse();

    if let Some(ref line) = args.send {
        let reply = ipc::send_command(line).await?;
        println!("{}", reply);
        return Ok(());
    }

    if args.init_config {
        let path = Config::init_default_config()?;
        println!("Wrote {}", path.display());
        return Ok(());
    }

    // Load or create config
    let mut config = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::load_from_default_path().unwrap_or_default(),
    };
    config.merge_args(&args);
    config.validate()?;

    info!(
        "Starting with {} points, multiplier {}",
        config.sweep.num_points, config.sweep.multiplier
    );

    let ipc_enabled = config.display.ipc;
    let ipc_rx = if ipc_enabled {
        let (cmd_tx, cmd_rx) = mpsc::channel(16);
        tokio::spawn(async move {
            if let Err(e) = ipc::start_server(cmd_tx).await {
                warn!("IPC server stopped: {:#}", e);
            }
        });
        Some(cmd_rx)
    } else {
        None
    };

    display::terminal::run(config, args.config.clone(), ipc_rx).await?;

    if ipc_enabled {
        let _ = std::fs::remove_file(ipc::socket_path());
    }

    Ok(())
}
