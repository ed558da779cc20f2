// CLI definitions using clap

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use split_bongo::ConfigOverrides;

#[derive(Parser)]
#[command(name = "split_bongo")]
#[command(author, version, about = "Bongo cat typing animation for split keyboards")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Config file path (default: ~/.config/split-bongo/config.toml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true, default_value = "warn")]
    pub log_level: String,

    #[command(flatten)]
    pub overrides: OverrideArgs,

    #[command(subcommand)]
    pub command: Commands,
}

/// Settings that take precedence over the config file
#[derive(Args, Debug, Clone, Copy)]
pub struct OverrideArgs {
    /// Number of key positions on the left half
    #[arg(long, global = true, value_name = "N")]
    pub left_keys: Option<u32>,

    /// Idle time after the last release before returning to rest (ms)
    #[arg(long, global = true, value_name = "MS")]
    pub cooldown_ms: Option<u64>,

    /// Idle decay check interval (ms)
    #[arg(long, global = true, value_name = "MS")]
    pub tick_ms: Option<u64>,
}

impl From<OverrideArgs> for ConfigOverrides {
    fn from(args: OverrideArgs) -> Self {
        ConfigOverrides {
            left_key_count: args.left_keys,
            cooldown_ms: args.cooldown_ms,
            tick_ms: args.tick_ms,
        }
    }
}

/// Display options shared by run and replay
#[derive(Args, Debug, Clone, Copy)]
pub struct DisplayArgs {
    /// Number of displays showing the animation
    #[arg(long, default_value_t = 1)]
    pub displays: usize,

    /// Also show the key-info labels
    #[arg(long)]
    pub key_info: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Animate from key events on stdin (`down 12`, `up 12`, ...)
    #[command(visible_alias = "r")]
    Run {
        #[command(flatten)]
        display: DisplayArgs,
    },

    /// Play a timed event script
    #[command(visible_alias = "play")]
    Replay {
        /// Script file (same syntax as stdin, plus `wait 100ms`)
        script: PathBuf,

        #[command(flatten)]
        display: DisplayArgs,

        /// Keep running until the idle pose has been reached
        #[arg(long)]
        settle: bool,

        /// Print the frame timeline when done
        #[arg(long)]
        summary: bool,
    },

    /// Show which frame each display phase uses
    Frames,

    /// Manage the config file
    Config {
        #[command(subcommand)]
        action: ConfigCommands,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Write a starter config file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Print the effective configuration
    Show,
    /// Print the config file path
    Path,
}
