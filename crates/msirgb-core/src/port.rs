//! Port I/O abstraction
//!
//! The Super I/O is reached through two adjacent byte-wide I/O ports: the
//! index port at `base` selects a register, the data port at `base + 1`
//! reads or writes it. Backends only need to move single bytes; all protocol
//! ordering lives in the session and bank modules.

use crate::error::{Error, Result};
use crate::regs::KNOWN_BASE_PORTS;

/// Index/data port pair of a Super I/O
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PortAddress {
    base: u16,
}

impl PortAddress {
    /// Port pair starting at `base`
    pub const fn new(base: u16) -> Self {
        Self { base }
    }

    /// Index port (register select)
    pub const fn index(&self) -> u16 {
        self.base
    }

    /// Data port (register value)
    pub const fn data(&self) -> u16 {
        self.base.wrapping_add(1)
    }

    /// Returns true for a base where boards are known to place the chip
    pub fn is_known(&self) -> bool {
        KNOWN_BASE_PORTS.contains(&self.base)
    }
}

impl Default for PortAddress {
    fn default() -> Self {
        Self::new(0x4E)
    }
}

/// Byte-addressable I/O port access
///
/// Each call performs exactly one byte of I/O at an absolute port address.
/// Implementations report `Error::Read` / `Error::Write` when the transfer
/// did not complete for exactly one byte.
pub trait PortIo {
    /// Read one byte from `port`
    fn read_byte(&mut self, port: u16) -> Result<u8>;

    /// Write one byte to `port`
    fn write_byte(&mut self, port: u16, value: u8) -> Result<()>;
}

impl<T: PortIo + ?Sized> PortIo for &mut T {
    fn read_byte(&mut self, port: u16) -> Result<u8> {
        (**self).read_byte(port)
    }

    fn write_byte(&mut self, port: u16, value: u8) -> Result<()> {
        (**self).write_byte(port, value)
    }
}

/// Source of fresh port handles
///
/// The controller opens one handle per run and drops it at the end, so the
/// handle is never shared between runs. Failing to open maps to
/// `Error::Open`.
pub trait OpenPort {
    /// The handle type produced
    type Port: PortIo;

    /// Open the port resource for reading and writing
    fn open(&mut self) -> Result<Self::Port>;
}

impl<F, P> OpenPort for F
where
    F: FnMut() -> Result<P>,
    P: PortIo,
{
    type Port = P;

    fn open(&mut self) -> Result<P> {
        self()
    }
}

/// Opener handing out one already opened handle
///
/// Useful when the caller opened the device itself. A second `open` fails
/// with `Error::Open`, since the handle has moved into the first run.
pub struct OpenedPort<P>(Option<P>);

impl<P> OpenedPort<P> {
    /// Wrap an open handle
    pub fn new(io: P) -> Self {
        Self(Some(io))
    }
}

impl<P: PortIo> OpenPort for OpenedPort<P> {
    type Port = P;

    fn open(&mut self) -> Result<P> {
        self.0.take().ok_or(Error::Open)
    }
}
