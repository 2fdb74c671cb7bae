//! msirgb - RGB header control for MSI boards
//!
//! Programs the RGB LED header driven by the Nuvoton NCT6795D / NCT6797D
//! Super I/O. The register protocol lives in `msirgb-core`; this binary
//! only parses options, picks a port backend and reports the outcome.
//!
//! # Backends
//!
//! - **portfile** (default) - writes to `/tmp/msirgb.portfile` as if it were
//!   the port space, so nothing touches hardware
//! - **devport** - real I/O ports through `/dev/port`, gated behind
//!   `--allow-hardware`
//! - **dummy** - in-memory emulator of the chip

mod backends;
mod cli;
mod commands;

use clap::Parser;
use cli::{Cli, Commands};

/// Log level requested by `-v` flags; `None` keeps the environment default
fn verbosity_level(verbose: u8) -> Option<log::LevelFilter> {
    match verbose {
        0 => None,
        1 => Some(log::LevelFilter::Debug),
        _ => Some(log::LevelFilter::Trace),
    }
}

fn init_logger(verbose: u8) -> env_logger::Builder {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if let Some(level) = verbosity_level(verbose) {
        builder.filter_level(level);
    }
    builder
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logger(cli.verbose).init();

    match cli.command {
        Commands::Apply(args) => commands::run_apply(&args),
        Commands::Dump { target } => commands::run_dump(&target),
        Commands::ListBackends => {
            commands::list_backends();
            Ok(())
        }
    }
}
