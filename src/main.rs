use std::error::Error;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use simplelog::{ColorChoice, Config as LogConfig, LevelFilter, TermLogger, TerminalMode};

mod preview;

#[derive(Parser, Debug)]
#[command(name = "cavern")]
#[command(about = "Preview cave zone maps and pillar scatter features")]
struct Cli {
    /// Log level when RUST_LOG is unset (error, warn, info, debug, trace)
    #[arg(long, global = true, default_value = "info")]
    log_level: LevelFilter,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Sample the zone map around a point and print a histogram and a slice
    Zones {
        /// Zone registry file
        #[arg(long, default_value = "configs/zones.toml")]
        zones: PathBuf,

        /// Zone map layout; defaults apply when missing
        #[arg(long, default_value = "configs/zone_source.toml")]
        source: PathBuf,

        #[arg(long, default_value_t = 0)]
        seed: u64,

        /// World height in blocks
        #[arg(long, default_value_t = 256)]
        height: i32,

        /// Block height of the sampled slice
        #[arg(long, default_value_t = 64)]
        y: i32,

        /// Center of the slice in blocks
        #[arg(long, default_value_t = 0)]
        x: i32,
        #[arg(long, default_value_t = 0)]
        z: i32,

        /// Slice extent in quarts (4 blocks) on each side of the center
        #[arg(long, default_value_t = 48)]
        radius: i32,

        /// Skip the ASCII slice, print the histogram only
        #[arg(long)]
        no_map: bool,
    },
    /// Run a feature over a synthetic cave and report what it placed
    Scatter {
        #[arg(long, default_value = "configs/blocks.toml")]
        blocks: PathBuf,

        /// Feature file
        #[arg(long, default_value = "configs/features/basalt_pillars.toml")]
        feature: PathBuf,

        #[arg(long, default_value_t = 0)]
        seed: u64,

        /// Terrain block filling the floor and the ceiling
        #[arg(long, default_value = "netherrack")]
        rock: String,

        /// Top of the floor
        #[arg(long, default_value_t = 40)]
        floor: i32,

        /// Bottom of the ceiling
        #[arg(long, default_value_t = 56)]
        ceiling: i32,

        /// Chunks on each side of chunk (0, 0)
        #[arg(long, default_value_t = 1)]
        chunks: i32,

        /// Print a vertical slice through this block z
        #[arg(long)]
        slice_z: Option<i32>,
    },
}

fn init_logging(level: LevelFilter) {
    if std::env::var_os("RUST_LOG").is_some() {
        env_logger::Builder::from_default_env().init();
        return;
    }
    if TermLogger::init(
        level,
        LogConfig::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )
    .is_err()
    {
        env_logger::Builder::new().filter_level(level).init();
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    init_logging(cli.log_level);

    match cli.command {
        Command::Zones {
            zones,
            source,
            seed,
            height,
            y,
            x,
            z,
            radius,
            no_map,
        } => preview::run_zones(&preview::ZonePreview {
            zones,
            source,
            seed,
            height,
            center: (x, y, z),
            radius,
            draw_map: !no_map,
        }),
        Command::Scatter {
            blocks,
            feature,
            seed,
            rock,
            floor,
            ceiling,
            chunks,
            slice_z,
        } => preview::run_scatter(&preview::ScatterPreview {
            blocks,
            feature,
            seed,
            rock,
            floor,
            ceiling,
            chunks,
            slice_z,
        }),
    }
}
