//! CLI definitions.

use crate::config::CliOverrides;
use clap::Parser;
use std::path::PathBuf;

/// Project-scoped issue tracker HTTP service
#[derive(Parser, Debug, Default)]
#[command(name = "issue-tracker", author, version, about, long_about = None)]
pub struct Cli {
    /// YAML config file (defaults to ./issue-tracker.yaml when present)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Database path, or `:memory:` for a throwaway in-memory store
    #[arg(long)]
    pub db: Option<PathBuf>,

    /// Address to bind
    #[arg(long)]
    pub host: Option<String>,

    /// Port to listen on
    #[arg(long)]
    pub port: Option<u16>,

    /// `SQLite` busy timeout in ms
    #[arg(long)]
    pub lock_timeout: Option<u64>,

    /// Increase logging verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (warnings and errors only)
    #[arg(short, long)]
    pub quiet: bool,

    /// Emit logs as JSON lines
    #[arg(long)]
    pub log_json: bool,
}

impl Cli {
    /// Settings given on the command line, for the top config layer.
    #[must_use]
    pub fn overrides(&self) -> CliOverrides {
        CliOverrides {
            db: self.db.clone(),
            host: self.host.clone(),
            port: self.port,
            lock_timeout: self.lock_timeout,
            log_json: self.log_json.then_some(true),
        }
    }
}
