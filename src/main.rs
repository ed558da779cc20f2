//! Split keyboard bongo cat CLI
//!
//! Drives the bongo cat animation engine from a line-based event source.

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing::info;

use bongo_engine::{DisplayPhase, FrameTable};
use split_bongo::daemon;
use split_bongo::{AppConfig, ReplayOptions, SessionOptions};

mod cli;
use cli::{Cli, Commands, ConfigCommands, DisplayArgs};

impl From<DisplayArgs> for SessionOptions {
    fn from(args: DisplayArgs) -> Self {
        SessionOptions {
            displays: args.displays,
            key_info: args.key_info,
        }
    }
}

fn print_frames(frames: &FrameTable) {
    println!("{:<10} {:<12} FRAME", "PHASE", "STATE");
    for phase in DisplayPhase::ALL {
        if phase == DisplayPhase::Resting {
            println!("{:<10} {:<12} {}", phase, "never used", frames.select(phase, false));
            println!("{:<10} {:<12} {}", phase, "idle", frames.select(phase, true));
        } else {
            println!("{:<10} {:<12} {}", phase, "", frames.select(phase, true));
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging (stderr, stdout carries frames)
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cli.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config_path = cli.config.unwrap_or_else(AppConfig::default_path);
    let mut config = AppConfig::load(&config_path)?;
    config.apply_overrides(cli.overrides.into());

    match cli.command {
        Commands::Run { display } => {
            info!("Loaded config from {}", config_path.display());
            daemon::run(&config, display.into()).await?;
        }
        Commands::Replay {
            script,
            display,
            settle,
            summary,
        } => {
            daemon::replay(
                &config,
                &script,
                display.into(),
                ReplayOptions { settle, summary },
            )
            .await?;
        }
        Commands::Frames => print_frames(&config.frames),
        Commands::Config { action } => match action {
            ConfigCommands::Init { force } => {
                if config_path.exists() && !force {
                    bail!(
                        "{} already exists (use --force to overwrite)",
                        config_path.display()
                    );
                }
                AppConfig::template()
                    .save(&config_path)
                    .context("failed to write config")?;
                println!("Wrote {}", config_path.display());
            }
            ConfigCommands::Show => {
                config.engine_config().context("invalid configuration")?;
                config.key_layout().context("invalid configuration")?;
                print!("{}", config.to_toml()?);
            }
            ConfigCommands::Path => println!("{}", config_path.display()),
        },
    }

    Ok(())
}
