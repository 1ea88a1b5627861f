//! Timeroom - headless client for shared timing rooms
//!
//! `replay` renders a recorded room event log; `connect` joins a live room
//! and drives it from stdin, optionally with a Stackmat timer attached.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use timeroom_core::{RoomConfig, SystemClock, UserId};
use timeroom_net::{RoomLink, RoomSession};

mod cli;
mod console;
mod replay;
mod report;

use cli::{Cli, Command};

fn main() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Failed to load config: {}", e);
            std::process::exit(1);
        }
    };

    let result = match cli.command {
        Command::Replay { log, user } => run_replay(&log, UserId(user), &config),
        Command::Connect {
            addr,
            user,
            stackmat,
        } => {
            let runtime = match tokio::runtime::Runtime::new() {
                Ok(runtime) => runtime,
                Err(e) => {
                    tracing::error!("Failed to create tokio runtime: {}", e);
                    std::process::exit(1);
                }
            };
            runtime.block_on(async {
                let room = RoomSession::new(UserId(user), SystemClock::new(), &config);
                let link = RoomLink::connect(addr, room).await?;
                console::run(link, &config, stackmat.as_deref()).await
            })
        }
    };

    if let Err(e) = result {
        tracing::error!("{}", e);
        std::process::exit(1);
    }
}

fn load_config(path: Option<&Path>) -> timeroom_core::Result<RoomConfig> {
    match path {
        Some(path) => RoomConfig::load(path),
        None => RoomConfig::load_default(),
    }
}

fn run_replay(log: &Path, user: UserId, config: &RoomConfig) -> timeroom_net::Result<()> {
    tracing::info!(log = %log.display(), user_id = %user, "Replaying room log");

    let file = File::open(log)?;
    let mut room = RoomSession::new(user, SystemClock::new(), config);
    let summary = replay::replay(BufReader::new(file), &mut room)?;

    tracing::info!(
        applied = summary.applied,
        rejected = summary.rejected,
        malformed = summary.malformed,
        "Replay finished"
    );
    print!("{}", report::render(&room, &config.stats_windows));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_replay_from_file() {
        let dir = TempDir::new().unwrap();
        let log = dir.path().join("room.jsonl");
        std::fs::write(
            &log,
            r#"{"event":"snapshot","payload":{"id":1,"name":"r","cube_type":{"id":1,"name":"3x3"},"rounds":[]}}"#,
        )
        .unwrap();

        assert!(run_replay(&log, UserId(2), &RoomConfig::default()).is_ok());
        let missing = dir.path().join("missing.jsonl");
        assert!(run_replay(&missing, UserId(2), &RoomConfig::default()).is_err());
    }

    #[test]
    fn test_explicit_config_path() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("timeroom.toml");
        std::fs::write(&path, "stats_windows = [5, 12, 100]\n").unwrap();
        let config = load_config(Some(&path)).unwrap();
        assert_eq!(config.stats_windows, vec![5, 12, 100]);
    }
}
