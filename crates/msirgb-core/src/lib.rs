//! msirgb-core - Super I/O RGB header protocol engine
//!
//! This crate implements the register protocol for the RGB header driven by
//! the Nuvoton NCT6795D / NCT6797D Super I/O found on many MSI boards. It is
//! designed to be `no_std` compatible; port access is abstracted behind the
//! [`PortIo`] trait so the same sequence runs against `/dev/port`, a plain
//! file or an in-memory emulator.
//!
//! # Features
//!
//! - `std` - Implement `std::error::Error` for the error types
//!
//! # Example
//!
//! ```ignore
//! use msirgb_core::{Channels, Controller, EffectMode, RgbConfig};
//!
//! let config = RgbConfig::new()
//!     .with_colors(0xFFFF_FFFF, 0x0000_0000, 0x8888_8888)
//!     .with_invert(Channels::BLUE)
//!     .with_effect(EffectMode::Pulse);
//!
//! let mut controller = Controller::new(|| open_my_port());
//! controller.apply(&config)?;
//! ```

#![no_std]
#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

#[cfg(any(test, feature = "std"))]
extern crate std;

pub mod bank;
pub mod config;
pub mod controller;
pub mod error;
pub mod port;
pub mod program;
pub mod regs;
pub mod session;

#[cfg(test)]
mod testing;

pub use bank::RegisterBank;
pub use config::{Channels, ColorChannel, EffectMode, ParseChannelsError, RgbConfig};
pub use controller::{ApplyState, Controller};
pub use error::{ApplyError, Error, ModeTransition, Result};
pub use port::{OpenPort, OpenedPort, PortAddress, PortIo};
pub use program::ColorProgram;
pub use session::{AdvancedModeSession, ChipIdentity};
