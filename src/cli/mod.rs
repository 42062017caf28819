//! CLI interface for segmentd

pub mod commands;
mod output;

pub use output::*;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "segmentd")]
#[command(version)]
#[command(about = "Authenticated HTTP gateway for brain tumor segmentation", long_about = None)]
pub struct Cli {
    /// Configuration file (defaults to the nearest segmentd.toml)
    #[arg(short, long, global = true, env = "SEGMENTD_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write a default segmentd.toml in the current directory
    Init,

    /// Start the HTTP API server
    Serve {
        /// Host to bind to (overrides server.host)
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on (overrides server.port)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Print a bcrypt hash for an auth.users entry
    HashPassword {
        /// Password to hash
        password: String,

        /// bcrypt cost factor
        #[arg(long, default_value_t = bcrypt::DEFAULT_COST)]
        cost: u32,
    },

    /// List configured accounts
    Users,

    /// Issue a bearer token for a configured account without a password
    Token {
        /// Account to issue the token for
        #[arg(short, long)]
        username: String,
    },
}
