//! CLI command implementations
//!
//! Every command resolves its `--port` backend and base port the same way,
//! then drives a `Controller` over the opened backend.

mod apply;
mod dump;
mod list;

pub use apply::run_apply;
pub use dump::run_dump;
pub use list::list_backends;

use crate::backends::Backend;
use crate::cli::TargetArgs;
use msirgb_core::{ApplyError, Error, RgbConfig};

/// Resolve the backend and fill the addressing part of `config`
fn open_target(
    target: &TargetArgs,
    config: RgbConfig,
) -> Result<(Backend, RgbConfig), Box<dyn std::error::Error>> {
    let backend = Backend::from_arg(&target.port, target.allow_hardware, target.base_port)?;
    let mut config = config
        .with_base_port(target.base_port)
        .with_skip_identity_check(target.ignore_check)
        .with_legacy_probe(target.legacy_probe);

    if backend.is_simulated_file() && !config.skip_identity_check {
        log::info!(
            "Dry run on {}: no chip to identify, skipping the ID check",
            backend.describe()
        );
        config.skip_identity_check = true;
    }
    if backend.is_hardware() {
        log::warn!("Writing to real I/O ports through {}", backend.describe());
    }
    Ok((backend, config))
}

/// Print hints for failures the user can act on
fn report_failure(err: &ApplyError, target: &TargetArgs) {
    match err.cause {
        Error::IdentityMismatch { id } => {
            eprintln!(
                "No supported Super I/O at {:#x} (read ID {:#06x}).",
                target.base_port, id
            );
            eprintln!("Try another --base-port (known: 4e, 2e) or --ignore-check.");
        }
        Error::Open if target.port.starts_with("devport") => {
            eprintln!("Could not open /dev/port. Try running with sudo?");
        }
        _ => {}
    }
    if err.left_in_advanced_mode() {
        eprintln!("Warning: the Super I/O may still be unlocked.");
    }
}
