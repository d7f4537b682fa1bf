//! `pathwatch`: print file paths as they change.
//!
//! Lists every path below the root once, then prints each path whose
//! modification time changes, one per line, until interrupted.

mod args;
mod logging;

use std::io::{self, Write};

use clap::Parser;
use miette::{IntoDiagnostic, Result};
use pathwatch::{Context, WatchConfig, WatchError};

use crate::args::Args;

fn main() -> Result<()> {
    let args = Args::parse();
    logging::init(args.log_level());

    let config = args.apply(WatchConfig::load(args.config.as_deref())?);
    let cwd = std::env::current_dir().map_err(WatchError::current_dir)?;
    let watch = config.to_watch(&cwd);
    tracing::info!(root = %watch.root().display(), glob = %config.glob, "watching");

    let mut stream = watch.build();
    let ctx = Context::background();
    let stdout = io::stdout();

    while let Some(path) = stream.next_path(&ctx)? {
        let mut out = stdout.lock();
        if let Err(e) = writeln!(out, "{}", path.display()).and_then(|()| out.flush()) {
            if e.kind() == io::ErrorKind::BrokenPipe {
                break;
            }
            return Err(e).into_diagnostic();
        }
    }

    stream.close()?;
    Ok(())
}
