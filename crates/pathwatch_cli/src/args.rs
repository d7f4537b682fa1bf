//! Command-line arguments.

use std::path::PathBuf;

use clap::{ArgAction, Parser};
use pathwatch::{BackendKind, WatchConfig};

/// Print every path below a directory, then every path that changes.
#[derive(Debug, Parser)]
#[command(name = "pathwatch", version, about)]
pub struct Args {
    /// Only report paths matching this glob (relative patterns start at the root)
    pub pattern: Option<String>,

    /// Directory to watch [default: working directory]
    #[arg(short, long, value_name = "DIR")]
    pub root: Option<PathBuf>,

    /// TOML file with watch settings
    #[arg(short, long, value_name = "FILE", env = "PATHWATCH_CONFIG")]
    pub config: Option<PathBuf>,

    /// Follow native notifications instead of re-listing
    #[arg(long, conflicts_with = "interval_ms")]
    pub native: bool,

    /// Pause between re-listings, in milliseconds
    #[arg(short, long, value_name = "N")]
    pub interval_ms: Option<u64>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

impl Args {
    /// Apply the flags on top of a loaded config.
    pub fn apply(&self, mut config: WatchConfig) -> WatchConfig {
        if let Some(pattern) = &self.pattern {
            config.glob.clone_from(pattern);
        }
        if let Some(root) = &self.root {
            config.root = Some(root.clone());
        }
        if self.native {
            config.backend = BackendKind::Native;
        }
        if let Some(ms) = self.interval_ms {
            config.backend = BackendKind::Poll;
            config.poll_interval_ms = ms;
        }
        config
    }

    /// Default log filter for the chosen verbosity.
    pub const fn log_level(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }
}
