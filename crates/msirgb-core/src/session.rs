//! Advanced mode session
//!
//! The extended configuration space of the Super I/O is unlocked by writing
//! `87 87` to the index port and locked again with `AA`. Leaving the chip
//! unlocked is a latent fault state for the board firmware, so the session
//! guarantees the lock byte is written exactly once: explicitly through
//! [`AdvancedModeSession::finish`], or from `Drop` if the session is
//! abandoned on an error or panic path.

use crate::bank::RegisterBank;
use crate::error::{Error, ModeTransition, Result};
use crate::port::{PortAddress, PortIo};
use crate::regs::{
    find_chip, SupportedChip, ENTER_ADVANCED_MODE, EXIT_ADVANCED_MODE, LEGACY_PROBE_BANK,
    LEGACY_PROBE_CELL_HI, LEGACY_PROBE_CELL_LO, REG_BANK_SELECT, REG_DEVID_LSB, REG_DEVID_MSB,
};

/// Identity of a verified Super I/O
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChipIdentity {
    /// Raw ID from registers 0x20 (MSB) and 0x21 (LSB)
    pub id: u16,
    /// Matching entry of the supported chip table
    pub chip: &'static SupportedChip,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SessionState {
    Idle,
    Entered,
    Exited,
}

/// Scoped advanced-mode access to a Super I/O
pub struct AdvancedModeSession<P: PortIo> {
    io: P,
    addr: PortAddress,
    state: SessionState,
}

impl<P: PortIo> AdvancedModeSession<P> {
    /// Wrap a port handle without touching the hardware
    pub fn new(io: P, addr: PortAddress) -> Self {
        Self {
            io,
            addr,
            state: SessionState::Idle,
        }
    }

    /// Port pair this session talks to
    pub fn address(&self) -> PortAddress {
        self.addr
    }

    /// Returns true once `enter` has been attempted and `finish` has not run
    pub fn is_active(&self) -> bool {
        self.state == SessionState::Entered
    }

    /// Unlock the extended configuration space
    ///
    /// The unlock key goes out as two separate single-byte writes. The
    /// session counts as entered from the first attempt on, so a failure
    /// halfway through still gets the lock byte on cleanup.
    pub fn enter(&mut self) -> Result<()> {
        self.state = SessionState::Entered;
        for _ in 0..2 {
            self.write_index(ENTER_ADVANCED_MODE)
                .map_err(|_| Error::Mode(ModeTransition::Enter))?;
        }
        log::debug!("Advanced mode enabled at {:#06x}", self.addr.index());
        Ok(())
    }

    /// Replay the initialization reads of the vendor tool
    ///
    /// Selects bank 0x0B and reads cells 0x60/0x61. The values have no known
    /// meaning; they are logged and discarded.
    pub fn legacy_probe(&mut self) -> Result<()> {
        let mut bank = self.select_bank(LEGACY_PROBE_BANK)?;
        let hi = bank.read_cell(LEGACY_PROBE_CELL_HI)?;
        let lo = bank.read_cell(LEGACY_PROBE_CELL_LO)?;
        log::trace!("Legacy probe: {:02x} {:02x}", hi, lo);
        Ok(())
    }

    /// Read the chip ID and check it against the supported chips
    pub fn verify_identity(&mut self) -> Result<ChipIdentity> {
        let id = self.read_chip_id()?;
        match find_chip(id) {
            Some(chip) => {
                log::info!("Found {} (chip ID {:#06x})", chip.name, id);
                Ok(ChipIdentity { id, chip })
            }
            None => {
                log::error!("Chip identifier is {:#06x}", id);
                Err(Error::IdentityMismatch { id })
            }
        }
    }

    /// Read the raw 16-bit chip ID
    pub fn read_chip_id(&mut self) -> Result<u16> {
        self.write_index(REG_DEVID_MSB)?;
        let msb = self.read_data()?;
        self.write_index(REG_DEVID_LSB)?;
        let lsb = self.read_data()?;
        Ok(u16::from(msb) << 8 | u16::from(lsb))
    }

    /// Select a bank (logical device) for the following cell accesses
    ///
    /// The returned handle borrows the session, so cells of a different bank
    /// can only be reached after selecting that bank again.
    pub fn select_bank(&mut self, bank: u8) -> Result<RegisterBank<'_, P>> {
        self.write_index(REG_BANK_SELECT)?;
        self.write_data(bank)?;
        log::trace!("Selected bank {:02x}", bank);
        Ok(RegisterBank::new(self, bank))
    }

    /// Lock the configuration space again
    ///
    /// Does nothing if `enter` was never attempted. Consumes the session so
    /// the lock byte cannot be written twice.
    pub fn finish(mut self) -> Result<()> {
        self.exit()
    }

    fn exit(&mut self) -> Result<()> {
        if self.state != SessionState::Entered {
            return Ok(());
        }
        self.state = SessionState::Exited;
        self.write_index(EXIT_ADVANCED_MODE)
            .map_err(|_| Error::Mode(ModeTransition::Exit))?;
        log::debug!("Advanced mode disabled");
        Ok(())
    }

    pub(crate) fn write_index(&mut self, value: u8) -> Result<()> {
        log::trace!("w(+0,{:02x})", value);
        self.io.write_byte(self.addr.index(), value)
    }

    pub(crate) fn write_data(&mut self, value: u8) -> Result<()> {
        log::trace!("w(+1,{:02x})", value);
        self.io.write_byte(self.addr.data(), value)
    }

    pub(crate) fn read_data(&mut self) -> Result<u8> {
        let value = self.io.read_byte(self.addr.data())?;
        log::trace!("r(+1,{:02x})", value);
        Ok(value)
    }
}

impl<P: PortIo> Drop for AdvancedModeSession<P> {
    fn drop(&mut self) {
        if self.state == SessionState::Entered {
            log::warn!("Session abandoned, leaving advanced mode");
            if let Err(e) = self.exit() {
                log::error!("{}", e);
            }
        }
    }
}
