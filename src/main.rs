use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use serde::Serialize;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn, Level};
use tracing_subscriber::prelude::*;

use tetris_dqn::config::AppConfig;
use tetris_dqn::training::{ControlMessage, ControlReply, TrainingController, TrainingUpdate};

/// Train a DQN agent to play Tetris.
///
/// Control messages are read from stdin, one JSON object per line. Game and
/// training snapshots are written to stdout as JSON lines; logs go to stderr.
#[derive(Parser)]
#[command(name = "tetris-dqn", about = "Train a DQN agent to play Tetris")]
struct Cli {
    /// Path to TOML configuration file
    #[arg(long, default_value = "config.toml")]
    config: PathBuf,

    /// Override learning rate
    #[arg(long)]
    lr: Option<f64>,

    /// Override replay batch size
    #[arg(long)]
    batch_size: Option<usize>,

    /// Override the epoch ceiling
    #[arg(long)]
    max_epochs: Option<usize>,

    /// Start training immediately instead of waiting for start_training
    #[arg(long)]
    autostart: bool,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,

    /// Print the default configuration as TOML and exit
    #[arg(long)]
    print_default_config: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.print_default_config {
        print!("{}", AppConfig::default_toml()?);
        return Ok(());
    }

    init_tracing(cli.verbose);

    let mut config = AppConfig::load_or_default(&cli.config)
        .with_context(|| format!("loading config from {}", cli.config.display()))?;

    // Apply CLI overrides
    if let Some(lr) = cli.lr {
        config.dqn.learning_rate = lr;
    }
    if let Some(batch_size) = cli.batch_size {
        config.dqn.batch_size = batch_size;
    }
    if let Some(max_epochs) = cli.max_epochs {
        config.dqn.max_epochs = max_epochs;
    }
    config
        .validate()
        .context("invalid configuration after CLI overrides")?;

    info!(
        width = config.game.width,
        height = config.game.height,
        learning_rate = config.dqn.learning_rate,
        batch_size = config.dqn.batch_size,
        max_epochs = config.dqn.max_epochs,
        "configuration loaded"
    );

    let controller = TrainingController::with_game(
        config.game.width,
        config.game.height,
        config.game.seed,
        config.dqn.clone(),
        config.training.clone(),
    );
    let mut updates = controller.subscribe();

    if cli.autostart {
        controller.start().context("starting training")?;
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;

    loop {
        tokio::select! {
            line = lines.next_line(), if stdin_open => {
                match line.context("reading control messages from stdin")? {
                    Some(line) if line.trim().is_empty() => {}
                    Some(line) => {
                        let reply = tokio::task::block_in_place(|| dispatch(&controller, &line));
                        emit(&reply)?;
                    }
                    None => {
                        info!("stdin closed");
                        stdin_open = false;
                        if !controller.is_running() {
                            break;
                        }
                    }
                }
            }
            update = updates.recv() => {
                match update {
                    Ok(update) => {
                        let ended = matches!(
                            update,
                            TrainingUpdate::Finished { .. } | TrainingUpdate::Stopped { .. }
                        );
                        emit(&update)?;
                        if ended && !stdin_open {
                            break;
                        }
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped, "stdout fell behind, dropped updates");
                    }
                    Err(RecvError::Closed) => break,
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("interrupted");
                break;
            }
        }
    }

    tokio::task::block_in_place(|| controller.shutdown());
    info!("shut down");
    Ok(())
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .with(tracing_subscriber::filter::LevelFilter::from_level(level))
        .init();
}

/// Parse and apply one control line. Failures become an `error` reply.
fn dispatch(controller: &TrainingController, line: &str) -> ControlReply {
    let result = ControlMessage::parse(line).and_then(|message| controller.handle(message));
    match result {
        Ok(reply) => reply,
        Err(e) => {
            warn!(error = %e, "rejected control message");
            ControlReply::new("error", &e.to_string())
        }
    }
}

fn emit<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string(value).context("serializing output")?;
    println!("{json}");
    Ok(())
}
