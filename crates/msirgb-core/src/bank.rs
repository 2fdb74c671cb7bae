//! Bank-relative register access
//!
//! Cells above 0x30 only have meaning relative to the currently selected
//! bank (logical device). A [`RegisterBank`] can only be obtained from
//! [`AdvancedModeSession::select_bank`], which writes the select sequence
//! first, so no cell is ever touched before its bank is selected.

use crate::error::Result;
use crate::port::PortIo;
use crate::regs::{ChannelCaps, CELL_CAPS, PULSE_BANK, PULSE_ENABLE_BIT, PULSE_ENABLE_CELL};
use crate::session::AdvancedModeSession;

/// Access to the cells of one selected bank
pub struct RegisterBank<'a, P: PortIo> {
    session: &'a mut AdvancedModeSession<P>,
    bank: u8,
}

impl<'a, P: PortIo> RegisterBank<'a, P> {
    pub(crate) fn new(session: &'a mut AdvancedModeSession<P>, bank: u8) -> Self {
        Self { session, bank }
    }

    /// The selected bank
    pub fn id(&self) -> u8 {
        self.bank
    }

    /// Read one cell: address to the index port, value from the data port
    pub fn read_cell(&mut self, cell: u8) -> Result<u8> {
        self.session.write_index(cell)?;
        self.session.read_data()
    }

    /// Write one cell: address to the index port, value to the data port
    pub fn write_cell(&mut self, cell: u8, value: u8) -> Result<()> {
        self.session.write_index(cell)?;
        self.session.write_data(value)
    }

    /// Write consecutive cells starting at `first`
    pub fn write_cells(&mut self, first: u8, values: &[u8]) -> Result<()> {
        for (cell, &value) in (first..=u8::MAX).zip(values) {
            self.write_cell(cell, value)?;
        }
        Ok(())
    }

    /// Set `bits` in a cell if any of them are clear, keeping the other bits
    ///
    /// The cell address is written again before the corrected value, so the
    /// write does not depend on the index register still holding it.
    /// Returns the value found before any change.
    pub fn set_bits(&mut self, cell: u8, bits: u8) -> Result<u8> {
        let value = self.read_cell(cell)?;
        if value & bits != bits {
            log::debug!(
                "Bank {:02x} cell {:02x}: {:02x} -> {:02x}",
                self.bank,
                cell,
                value,
                value | bits
            );
            self.write_cell(cell, value | bits)?;
        }
        Ok(value)
    }
}

/// Make sure the pulse effect works
///
/// Selects bank 0x09 and sets bit 0x10 of cell 0x2C. Without it pulsing
/// silently does nothing. The caller has to select the RGB bank again
/// afterwards.
pub fn enable_pulsing<P: PortIo>(session: &mut AdvancedModeSession<P>) -> Result<()> {
    let mut bank = session.select_bank(PULSE_BANK)?;
    bank.set_bits(PULSE_ENABLE_CELL, PULSE_ENABLE_BIT)?;
    Ok(())
}

/// Make sure all three channels honour their frame values
///
/// Must be called with the RGB bank selected. Sets the top three bits of
/// cell 0xE0 and preserves the unknown low bits.
pub fn ensure_rgb_enabled<P: PortIo>(bank: &mut RegisterBank<'_, P>) -> Result<ChannelCaps> {
    let before = bank.set_bits(CELL_CAPS, ChannelCaps::ALL.bits())?;
    let caps = ChannelCaps::from_bits_truncate(before);
    if caps != ChannelCaps::ALL {
        log::info!("Enabled 16-level control for all channels (was {:?})", caps);
    }
    Ok(caps)
}

/// Read the cells `first..=last` of `bank`, passing each to `visit`
pub fn dump_bank<P, F>(
    session: &mut AdvancedModeSession<P>,
    bank: u8,
    first: u8,
    last: u8,
    mut visit: F,
) -> Result<()>
where
    P: PortIo,
    F: FnMut(u8, u8, u8),
{
    let mut regs = session.select_bank(bank)?;
    for cell in first..=last {
        let value = regs.read_cell(cell)?;
        visit(bank, cell, value);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::port::PortAddress;
    use crate::regs::RGB_BANK;
    use crate::testing::{Op, TracePort};

    #[test]
    fn test_pulse_prerequisite_sets_bit() {
        let mut port = TracePort::new().with_reads(&[0x21]);
        let mut session = AdvancedModeSession::new(&mut port, PortAddress::new(0x4E));
        enable_pulsing(&mut session).unwrap();
        drop(session);
        assert_eq!(
            port.ops,
            [
                Op::W(0x4E, 0x07),
                Op::W(0x4F, 0x09),
                Op::W(0x4E, 0x2C),
                Op::R(0x4F, 0x21),
                Op::W(0x4E, 0x2C),
                Op::W(0x4F, 0x31),
            ]
        );
    }

    #[test]
    fn test_pulse_prerequisite_already_set() {
        let mut port = TracePort::new().with_reads(&[0x10]);
        let mut session = AdvancedModeSession::new(&mut port, PortAddress::new(0x4E));
        enable_pulsing(&mut session).unwrap();
        drop(session);
        assert_eq!(port.ops.len(), 4);
    }

    #[test]
    fn test_rgb_enable_preserves_low_bits() {
        let mut port = TracePort::new().with_reads(&[0x45]);
        let mut session = AdvancedModeSession::new(&mut port, PortAddress::new(0x4E));
        let mut bank = session.select_bank(RGB_BANK).unwrap();
        let caps = ensure_rgb_enabled(&mut bank).unwrap();
        assert_eq!(caps, ChannelCaps::GREEN_16_LEVELS);
        drop(session);
        assert_eq!(
            &port.ops[2..],
            [
                Op::W(0x4E, 0xE0),
                Op::R(0x4F, 0x45),
                Op::W(0x4E, 0xE0),
                Op::W(0x4F, 0xE5),
            ]
        );
    }

    #[test]
    fn test_write_cells_consecutive() {
        let mut port = TracePort::new();
        let mut session = AdvancedModeSession::new(&mut port, PortAddress::new(0x4E));
        let mut bank = session.select_bank(RGB_BANK).unwrap();
        bank.write_cells(0xF4, &[1, 2, 3, 4]).unwrap();
        drop(session);
        assert_eq!(
            &port.ops[2..],
            [
                Op::W(0x4E, 0xF4),
                Op::W(0x4F, 1),
                Op::W(0x4E, 0xF5),
                Op::W(0x4F, 2),
                Op::W(0x4E, 0xF6),
                Op::W(0x4F, 3),
                Op::W(0x4E, 0xF7),
                Op::W(0x4F, 4),
            ]
        );
    }

    #[test]
    fn test_dump_bank() {
        let mut port = TracePort::new().with_reads(&[0xA0, 0xA1, 0xA2]);
        let mut session = AdvancedModeSession::new(&mut port, PortAddress::new(0x4E));
        let mut seen = std::vec::Vec::new();
        dump_bank(&mut session, 0x0B, 0x60, 0x62, |bank, cell, value| {
            seen.push((bank, cell, value))
        })
        .unwrap();
        assert_eq!(seen, [(0x0B, 0x60, 0xA0), (0x0B, 0x61, 0xA1), (0x0B, 0x62, 0xA2)]);
    }
}
