//! Command line arguments

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// headless client for shared timing rooms
#[derive(Parser, Debug)]
#[clap(version, about)]
pub struct Cli {
    /// settings file (defaults to the platform config directory)
    #[clap(short = 'c', long, global = true)]
    pub config: Option<PathBuf>,

    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// apply a recorded room event log (one JSON envelope per line) and print the room
    Replay {
        /// event log to read
        log: PathBuf,

        /// id of the local user, for stats
        #[clap(short = 'u', long)]
        user: i64,
    },

    /// join a live room and drive it from stdin
    Connect {
        /// room server address
        addr: SocketAddr,

        /// id of the local user
        #[clap(short = 'u', long)]
        user: i64,

        /// read Stackmat packets from this device
        #[clap(long)]
        stackmat: Option<PathBuf>,
    },
}
