use crate::domain::model::CycleMode;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Clone, Parser)]
#[command(name = "damage-lab")]
#[command(about = "Simulate, restore and assess damage in building photographs")]
pub struct Cli {
    /// Path to a TOML configuration file (defaults to ./damage-lab.toml when present)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Root directory of the image store (overrides store.root)
    #[arg(long, global = true)]
    pub store: Option<PathBuf>,

    #[arg(short, long, global = true, help = "Enable verbose output")]
    pub verbose: bool,

    /// Print the flow result as JSON instead of text
    #[arg(long, global = true)]
    pub json: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub json_logs: bool,

    /// Log process CPU and memory after every step
    #[arg(long, global = true)]
    pub monitor: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Restore a damaged building photo and assess the damage against the restoration
    Assess {
        /// Photo to upload (jpg, jpeg or png)
        image: PathBuf,
    },

    /// Apply simulated damage to a building photo
    Damage {
        image: PathBuf,

        /// 1 = minor wear, 5 = catastrophic destruction
        #[arg(short, long, default_value_t = 1, value_parser = clap::value_parser!(u8).range(1..=5))]
        level: u8,
    },

    /// Run a full damage/restore cycle to test restoration quality
    Cycle {
        image: PathBuf,

        /// Whether the uploaded photo shows an intact or an already damaged building
        #[arg(short, long, value_enum, default_value_t = CycleMode::PreDamage)]
        mode: CycleMode,

        #[arg(short, long, default_value_t = 3, value_parser = clap::value_parser!(u8).range(1..=5))]
        level: u8,
    },

    /// Fetch a street view image for a location and restore it
    StreetView {
        /// e.g. "Times Square, NYC"
        location: String,
    },

    /// List stored artifacts
    History {
        /// Only show artifacts related to this id
        #[arg(long)]
        id: Option<String>,
    },
}
