//! Controller - the full apply sequence
//!
//! One `apply` call owns a freshly opened port handle for its whole run:
//!
//! 1. Open the device
//! 2. Enter advanced mode (plus the optional legacy probe)
//! 3. Verify the chip ID, unless skipped
//! 4. Pulse prerequisite in bank 0x09
//! 5. Select the RGB bank 0x12
//! 6. Fix up the channel capability bits in 0xE0
//! 7. Write 0xE4, 0xFE, 0xFF and the red, green and blue cells
//! 8. Leave advanced mode, whatever happened before

use crate::bank::{dump_bank, enable_pulsing, ensure_rgb_enabled};
use crate::config::RgbConfig;
use crate::error::{ApplyError, Result};
use crate::port::{OpenPort, PortIo};
use crate::program::ColorProgram;
use crate::regs::RGB_BANK;
use crate::session::AdvancedModeSession;

/// Progress of an apply run
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ApplyState {
    /// Nothing done yet
    Created,
    /// Port handle open
    Opened,
    /// Unlock sequence written
    AdvancedModeEntered,
    /// Chip ID checked (skipped when the check is disabled)
    IdentityVerified,
    /// Pulse enable bit set in bank 0x09
    PulsePrereqApplied,
    /// RGB bank selected
    BankSelected,
    /// Capability bits in 0xE0 fixed up
    RgbEnabledVerified,
    /// Mode, timing and colour cells written
    ProgramWritten,
    /// Lock byte written after a complete run
    AdvancedModeExited,
}

/// Drives the port protocol for lighting programs
pub struct Controller<O: OpenPort> {
    opener: O,
    state: ApplyState,
}

impl<O: OpenPort> Controller<O> {
    /// Create a controller that opens its port through `opener`
    pub fn new(opener: O) -> Self {
        Self {
            opener,
            state: ApplyState::Created,
        }
    }

    /// Last state reached by the most recent run
    ///
    /// After a failed run this is the last step that completed.
    pub fn state(&self) -> ApplyState {
        self.state
    }

    /// Encode `config` and write it to the chip
    pub fn apply(&mut self, config: &RgbConfig) -> core::result::Result<(), ApplyError> {
        let program = ColorProgram::encode(config);
        if config.step_duration != program.step_duration() {
            log::warn!(
                "Step duration {} clamped to {}",
                config.step_duration,
                program.step_duration()
            );
        }
        log::debug!("Program: {:02x?}", program);

        self.run(config, |ctl, session| ctl.write_program(session, &program))
    }

    /// Read the given `(bank, first, last)` cell ranges, passing every
    /// `(bank, cell, value)` to `visit`
    pub fn dump<F>(
        &mut self,
        config: &RgbConfig,
        ranges: &[(u8, u8, u8)],
        mut visit: F,
    ) -> core::result::Result<(), ApplyError>
    where
        F: FnMut(u8, u8, u8),
    {
        self.run(config, |_, session| {
            for &(bank, first, last) in ranges {
                dump_bank(session, bank, first, last, &mut visit)?;
            }
            Ok(())
        })
    }

    fn run<F>(&mut self, config: &RgbConfig, body: F) -> core::result::Result<(), ApplyError>
    where
        F: FnOnce(&mut Self, &mut AdvancedModeSession<O::Port>) -> Result<()>,
    {
        self.state = ApplyState::Created;

        let addr = config.port_address();
        if !addr.is_known() {
            log::warn!(
                "Base port {:#06x} is not one of the known Super I/O ports",
                addr.index()
            );
        }

        let io = self.opener.open()?;
        self.advance(ApplyState::Opened);

        let mut session = AdvancedModeSession::new(io, addr);
        let result = self
            .prepare(&mut session, config)
            .and_then(|()| body(self, &mut session));
        let exit = session.finish();

        match (result, exit) {
            (Ok(()), Ok(())) => {
                self.advance(ApplyState::AdvancedModeExited);
                Ok(())
            }
            (Ok(()), Err(exit)) => Err(ApplyError::new(exit)),
            (Err(cause), exit) => {
                log::debug!("Run aborted after {:?}: {}", self.state, cause);
                Err(ApplyError {
                    cause,
                    exit_failure: exit.err(),
                })
            }
        }
    }

    fn prepare<P: PortIo>(
        &mut self,
        session: &mut AdvancedModeSession<P>,
        config: &RgbConfig,
    ) -> Result<()> {
        session.enter()?;
        if config.legacy_probe {
            session.legacy_probe()?;
        }
        self.advance(ApplyState::AdvancedModeEntered);

        if config.skip_identity_check {
            log::warn!("Skipping the Super I/O identity check");
        } else {
            session.verify_identity()?;
            self.advance(ApplyState::IdentityVerified);
        }
        Ok(())
    }

    fn write_program<P: PortIo>(
        &mut self,
        session: &mut AdvancedModeSession<P>,
        program: &ColorProgram,
    ) -> Result<()> {
        enable_pulsing(session)?;
        self.advance(ApplyState::PulsePrereqApplied);

        let mut bank = session.select_bank(RGB_BANK)?;
        self.advance(ApplyState::BankSelected);

        ensure_rgb_enabled(&mut bank)?;
        self.advance(ApplyState::RgbEnabledVerified);

        for (cell, value) in program.writes() {
            bank.write_cell(cell, value)?;
        }
        self.advance(ApplyState::ProgramWritten);
        Ok(())
    }

    fn advance(&mut self, state: ApplyState) {
        log::debug!("{:?} -> {:?}", self.state, state);
        self.state = state;
    }
}
