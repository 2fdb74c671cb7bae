//! NCT6795D / NCT6797D register definitions
//!
//! The RGB header is driven from logical device (bank) 0x12 of the Super I/O.
//! After the bank is selected its upper cells look like this:
//!
//! ```text
//! E0 | EE XX XX XX  MX XX XX XX  XX XX XX XX  XX XX XX XX
//! F0 | RR RR RR RR  GG GG GG GG  BB BB BB BB  XX XX TT TT
//!     ---------------------------------------------------
//!      00 01 02 03  04 05 06 07  08 09 0A 0B  0C 0D 0E 0F
//! ```
//!
//! `EE` holds the per-channel capability bits ([`ChannelCaps`]), `M` the
//! effect mode ([`ModeBits`]), `RR`/`GG`/`BB` the frame intensities and
//! `TTTT` the step duration plus [`TimingFlags`]. Cells marked `XX` have no
//! known purpose; they are never written.

use bitflags::bitflags;

// Port-level commands (written to the index port)

/// Written twice to the index port to unlock the extended configuration space
pub const ENTER_ADVANCED_MODE: u8 = 0x87;
/// Written to the index port to lock the configuration space again
pub const EXIT_ADVANCED_MODE: u8 = 0xAA;

// Global configuration registers

/// Logical device (bank) select register
pub const REG_BANK_SELECT: u8 = 0x07;
/// Chip ID, most significant byte
pub const REG_DEVID_MSB: u8 = 0x20;
/// Chip ID, least significant byte
pub const REG_DEVID_LSB: u8 = 0x21;

// Banks

/// Bank holding the RGB header controller
pub const RGB_BANK: u8 = 0x12;
/// Bank holding the pulse enable prerequisite
pub const PULSE_BANK: u8 = 0x09;
/// Bank touched by the vendor tool during initialization
pub const LEGACY_PROBE_BANK: u8 = 0x0B;

// Cells in PULSE_BANK

/// Cell carrying the pulse enable bit
pub const PULSE_ENABLE_CELL: u8 = 0x2C;
/// Without this bit set pulsing silently does nothing
pub const PULSE_ENABLE_BIT: u8 = 0x10;

// Cells in LEGACY_PROBE_BANK (read by the vendor tool, meaning unknown)

/// First cell read by the legacy probe
pub const LEGACY_PROBE_CELL_HI: u8 = 0x60;
/// Second cell read by the legacy probe
pub const LEGACY_PROBE_CELL_LO: u8 = 0x61;

// Cells in RGB_BANK

/// Channel capability / enable cell
pub const CELL_CAPS: u8 = 0xE0;
/// Effect mode cell
pub const CELL_MODE: u8 = 0xE4;
/// First of four red frame cells
pub const CELL_RED: u8 = 0xF0;
/// First of four green frame cells
pub const CELL_GREEN: u8 = 0xF4;
/// First of four blue frame cells
pub const CELL_BLUE: u8 = 0xF8;
/// Step duration, bits 0-7
pub const CELL_STEP_DURATION: u8 = 0xFE;
/// Step duration bit 8 plus timing flags
pub const CELL_TIMING: u8 = 0xFF;

/// Largest step duration the 9-bit field can hold
pub const MAX_STEP_DURATION: u16 = 511;

bitflags! {
    /// Bits of cell 0xE0
    ///
    /// A channel whose bit is clear always receives full brightness,
    /// regardless of the frame values. The low five bits are unknown and
    /// are preserved when the capability bits are fixed up.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ChannelCaps: u8 {
        /// Blue channel handles 16 levels
        const BLUE_16_LEVELS  = 1 << 5;
        /// Green channel handles 16 levels
        const GREEN_16_LEVELS = 1 << 6;
        /// Red channel handles 16 levels
        const RED_16_LEVELS   = 1 << 7;

        /// All three channels
        const ALL = Self::RED_16_LEVELS.bits()
            | Self::GREEN_16_LEVELS.bits()
            | Self::BLUE_16_LEVELS.bits();
    }
}

bitflags! {
    /// Bits of cell 0xE4, layout `xxxx pbbb`
    ///
    /// `bbb` is the blink interval: `000` always on, `001` everything off
    /// (including the on-board lights), larger values blink slower.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ModeBits: u8 {
        /// Blink interval field
        const BLINK_MASK   = 0b0111;
        /// Lighting disabled (blink field = 001)
        const DISABLED     = 0b0001;
        /// Smooth pulsing
        const SMOOTH_PULSE = 0b1000;
    }
}

bitflags! {
    /// Bits of cell 0xFF, layout `fff bgr d t`
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct TimingFlags: u8 {
        /// Bit 8 of the step duration
        const DURATION_BIT8      = 1 << 0;
        /// Turns the RGB header on, independent of the on-board lights
        const HEADER_ENABLE      = 1 << 1;
        /// Invert red intensity (F is 0%, 0 is 100%)
        const INVERT_RED         = 1 << 2;
        /// Invert green intensity
        const INVERT_GREEN       = 1 << 3;
        /// Invert blue intensity
        const INVERT_BLUE        = 1 << 4;
        /// No fade-in for red
        const FADE_IN_OFF_RED    = 1 << 5;
        /// No fade-in for green
        const FADE_IN_OFF_GREEN  = 1 << 6;
        /// No fade-in for blue
        const FADE_IN_OFF_BLUE   = 1 << 7;

        /// With all three set the 8 frames play as a literal sequence
        const FADE_IN_OFF_ALL = Self::FADE_IN_OFF_RED.bits()
            | Self::FADE_IN_OFF_GREEN.bits()
            | Self::FADE_IN_OFF_BLUE.bits();
    }
}

/// A Super I/O model the RGB protocol is known to work with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SupportedChip {
    /// Marketing name
    pub name: &'static str,
    /// Chip ID with the revision nibble masked off
    pub id_mask: u16,
}

/// Revision nibble is ignored when matching chip IDs
pub const CHIP_ID_MASK: u16 = 0xFFF0;

/// Chips accepted by the identity check
pub const SUPPORTED_CHIPS: &[SupportedChip] = &[
    SupportedChip {
        name: "NCT6795D",
        id_mask: 0xD350,
    },
    SupportedChip {
        name: "NCT6797D",
        id_mask: 0xD450,
    },
];

/// Look up the chip matching a raw ID read from 0x20/0x21
pub fn find_chip(id: u16) -> Option<&'static SupportedChip> {
    SUPPORTED_CHIPS
        .iter()
        .find(|chip| id & CHIP_ID_MASK == chip.id_mask)
}

/// Base ports at which the Super I/O is known to decode its index port
pub const KNOWN_BASE_PORTS: &[u16] = &[0x4E, 0x2E];

/// Cell ranges printed by the register dump: `(bank, first, last)`
pub const DUMP_RANGES: &[(u8, u8, u8)] = &[
    (RGB_BANK, 0xD0, 0xFF),
    (PULSE_BANK, 0x20, 0x3F),
    (LEGACY_PROBE_BANK, 0x60, 0x6F),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_chip_ignores_revision() {
        assert_eq!(find_chip(0xD350).map(|c| c.name), Some("NCT6795D"));
        assert_eq!(find_chip(0xD352).map(|c| c.name), Some("NCT6795D"));
        assert_eq!(find_chip(0xD45F).map(|c| c.name), Some("NCT6797D"));
        assert!(find_chip(0x1234).is_none());
        assert!(find_chip(0xD360).is_none());
    }

    #[test]
    fn test_timing_layout() {
        assert_eq!(TimingFlags::HEADER_ENABLE.bits(), 0b0000_0010);
        assert_eq!(TimingFlags::FADE_IN_OFF_ALL.bits(), 0b1110_0000);
        assert_eq!(ChannelCaps::ALL.bits(), 0xE0);
    }
}
