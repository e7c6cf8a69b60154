mod config;
mod repl;

use std::io;
use std::process::ExitCode;

use clap::Parser;
use tracing::debug;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::Config;

fn main() -> anyhow::Result<ExitCode> {
    let config = Config::parse();
    init_tracing(config.verbose);
    debug!(?config, "starting");

    match &config.file {
        Some(path) => {
            let clean = repl::run_file(path, io::stdout().lock())?;
            Ok(if clean {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
        None => {
            repl::start(io::stdin().lock(), io::stdout().lock(), &config.prompt)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

// Logs go to stderr so they never interleave with the prompt protocol on stdout. `--verbose`
// overrides RUST_LOG.
fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(io::stderr)
                .with_target(true)
                .with_level(true),
        )
        .with(filter)
        .init();
}
