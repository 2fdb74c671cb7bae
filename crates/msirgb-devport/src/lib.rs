//! msirgb-devport - `/dev/port` support
//!
//! This crate provides byte-wide I/O port access through a file whose offset
//! is the port number. On Linux the kernel exposes the real port space as
//! `/dev/port`; any regular file with the same layout can stand in for it as
//! a dry run.
//!
//! # Example
//!
//! ```no_run
//! use msirgb_devport::{DevPortConfig, DevPortOpener};
//! use msirgb_core::{Controller, RgbConfig};
//!
//! // Dry run against /tmp/msirgb.portfile
//! let mut controller = Controller::new(DevPortOpener::new(DevPortConfig::default()));
//! controller.apply(&RgbConfig::new().with_skip_identity_check(true))?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # Usage with msirgb CLI
//!
//! ```bash
//! # Write to the dry-run file (default)
//! msirgb apply -p portfile -r ffffffff
//!
//! # Write to the real hardware
//! sudo msirgb apply -p devport --allow-hardware -r ffffffff
//! ```
//!
//! # System Requirements
//!
//! - Linux kernel with `/dev/port` (`CONFIG_DEVPORT`)
//! - Root, or `CAP_SYS_RAWIO`, to open `/dev/port`

pub mod device;
pub mod error;

// Re-exports
pub use device::{
    parse_options, DevPort, DevPortConfig, DevPortOpener, DEFAULT_PORT_FILE, DEV_PORT_PATH,
    PORT_SPACE_SIZE,
};
pub use error::{DevPortError, Result};
