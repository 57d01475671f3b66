//! koi_pond: installation entry point.

use std::path::PathBuf;
use std::process;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use koi_pond::app::{run, AppConfig, AppError};
use pond_core::{load_config_from_env, PondConfig};

#[derive(Parser, Debug)]
#[command(name = "koi_pond", about = "Interactive koi pond installation")]
struct Cli {
    /// Pond config JSON.  Defaults to $KOI_POND_CONFIG, then the built-in tuning.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Seed for variants, placement and ambient spawns.
    #[arg(long)]
    seed: Option<u64>,

    /// Shorten the intro, pond and credits tracks tenfold.
    #[arg(long)]
    quick: bool,

    /// MIDI volume, 0.0–1.0.
    #[arg(long, default_value_t = 1.0)]
    volume: f32,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .compact()
        .init();

    let cli = Cli::parse();

    println!();
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║           Koi Pond — Interactive Pond Installation           ║");
    println!("╚══════════════════════════════════════════════════════════════╝");
    println!();

    #[cfg(feature = "leap")]
    println!("  Mode: LeapMotion hardware + keyboard");
    #[cfg(not(feature = "leap"))]
    println!("  Mode: Keyboard simulation  (use --features leap for hardware)");
    if cli.quick {
        println!("  Quick reel: every track shortened");
    }
    println!();

    if let Err(e) = start(cli) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn start(cli: Cli) -> Result<(), AppError> {
    // An explicit path must load; the environment fallback may not.
    let pond = match &cli.config {
        Some(path) => PondConfig::from_file(path)?,
        None       => load_config_from_env(),
    };
    run(AppConfig { pond, seed: cli.seed, quick: cli.quick, volume: cli.volume })
}
