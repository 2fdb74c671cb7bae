//! Encoding of a lighting configuration into RGB bank register values
//!
//! Everything here is pure: the controller writes the resulting bytes in
//! the order given by [`ColorProgram::writes`].

use crate::config::{Channels, EffectMode, RgbConfig};
use crate::regs::{
    ModeBits, TimingFlags, CELL_BLUE, CELL_GREEN, CELL_MODE, CELL_RED, CELL_STEP_DURATION,
    CELL_TIMING, MAX_STEP_DURATION,
};

/// Register values for one configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColorProgram {
    /// Cell 0xE4
    pub mode: u8,
    /// Cell 0xFE
    pub step_low: u8,
    /// Cell 0xFF
    pub timing: u8,
    /// Cells 0xF0..=0xF3
    pub red: [u8; 4],
    /// Cells 0xF4..=0xF7
    pub green: [u8; 4],
    /// Cells 0xF8..=0xFB
    pub blue: [u8; 4],
}

/// Number of cell writes in a program
pub const PROGRAM_WRITES: usize = 15;

/// Limit a step duration to the 9-bit register field
pub fn clamp_step_duration(step_duration: u16) -> u16 {
    step_duration.min(MAX_STEP_DURATION)
}

/// Value of cell 0xE4 for an effect
pub fn encode_mode(effect: EffectMode) -> u8 {
    match effect {
        EffectMode::Normal => 0,
        EffectMode::Disabled => ModeBits::DISABLED.bits(),
        EffectMode::Pulse => ModeBits::SMOOTH_PULSE.bits(),
        EffectMode::Blink(level) => level.wrapping_add(1) & ModeBits::BLINK_MASK.bits(),
    }
}

/// Flags of cell 0xFF
///
/// The header enable bit is always set. `step_duration` is clamped first.
pub fn encode_timing(step_duration: u16, invert: Channels, fade_in_disable: Channels) -> TimingFlags {
    let mut flags = TimingFlags::HEADER_ENABLE;
    flags.set(
        TimingFlags::DURATION_BIT8,
        clamp_step_duration(step_duration) & 0x100 != 0,
    );
    flags.set(TimingFlags::INVERT_RED, invert.contains(Channels::RED));
    flags.set(TimingFlags::INVERT_GREEN, invert.contains(Channels::GREEN));
    flags.set(TimingFlags::INVERT_BLUE, invert.contains(Channels::BLUE));
    flags.set(
        TimingFlags::FADE_IN_OFF_RED,
        fade_in_disable.contains(Channels::RED),
    );
    flags.set(
        TimingFlags::FADE_IN_OFF_GREEN,
        fade_in_disable.contains(Channels::GREEN),
    );
    flags.set(
        TimingFlags::FADE_IN_OFF_BLUE,
        fade_in_disable.contains(Channels::BLUE),
    );
    flags
}

impl ColorProgram {
    /// Encode a configuration
    pub fn encode(config: &RgbConfig) -> Self {
        let step_duration = clamp_step_duration(config.step_duration);
        Self {
            mode: encode_mode(config.effect),
            step_low: (step_duration & 0xFF) as u8,
            timing: encode_timing(step_duration, config.invert, config.fade_in_disable).bits(),
            red: config.red.to_bytes(),
            green: config.green.to_bytes(),
            blue: config.blue.to_bytes(),
        }
    }

    /// Step duration as stored in cells 0xFE/0xFF
    pub fn step_duration(&self) -> u16 {
        u16::from(self.step_low) | u16::from(self.timing & TimingFlags::DURATION_BIT8.bits()) << 8
    }

    /// Returns true if the frames play as a literal 8-frame sequence
    pub fn is_literal_sequence(&self) -> bool {
        TimingFlags::from_bits_truncate(self.timing).contains(TimingFlags::FADE_IN_OFF_ALL)
    }

    /// `(cell, value)` pairs in write order: mode, timing, red, green, blue
    pub fn writes(&self) -> [(u8, u8); PROGRAM_WRITES] {
        let mut writes = [(0u8, 0u8); PROGRAM_WRITES];
        writes[0] = (CELL_MODE, self.mode);
        writes[1] = (CELL_STEP_DURATION, self.step_low);
        writes[2] = (CELL_TIMING, self.timing);
        let channels = [(CELL_RED, self.red), (CELL_GREEN, self.green), (CELL_BLUE, self.blue)];
        for (ch, (first, bytes)) in channels.iter().enumerate() {
            for (i, &byte) in bytes.iter().enumerate() {
                writes[3 + ch * 4 + i] = (first + i as u8, byte);
            }
        }
        writes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ColorChannel;

    #[test]
    fn test_step_duration_roundtrip() {
        for d in 0..=511u16 {
            let program = ColorProgram::encode(&RgbConfig::new().with_step_duration(d));
            assert_eq!(program.step_duration(), d);
        }
    }

    #[test]
    fn test_step_duration_clamps() {
        let max = ColorProgram::encode(&RgbConfig::new().with_step_duration(511));
        for d in [512u16, 600, 1023, u16::MAX] {
            let program = ColorProgram::encode(&RgbConfig::new().with_step_duration(d));
            assert_eq!(program, max);
            assert_eq!(program.step_duration(), 511);
        }
    }

    #[test]
    fn test_channel_byte_order() {
        for v in [0u32, 0x1234_5678, 0xFFFF_FFFF, 0x8000_0001, 0x00FF_00FF] {
            let config = RgbConfig::new().with_colors(v, v.rotate_left(8), !v);
            let program = ColorProgram::encode(&config);
            let expected = |v: u32| [(v >> 24) as u8, (v >> 16) as u8, (v >> 8) as u8, v as u8];
            assert_eq!(program.red, expected(v));
            assert_eq!(program.green, expected(v.rotate_left(8)));
            assert_eq!(program.blue, expected(!v));
        }
    }

    #[test]
    fn test_effect_modes() {
        assert_eq!(encode_mode(EffectMode::Normal), 0);
        assert_eq!(encode_mode(EffectMode::Disabled), 1);
        assert_eq!(encode_mode(EffectMode::Pulse), 0b1000);
        assert_eq!(encode_mode(EffectMode::Blink(2)), 3);
        assert_eq!(encode_mode(EffectMode::Blink(6)), 7);
        assert_eq!(encode_mode(EffectMode::Blink(7)), 0);
        assert_eq!(encode_mode(EffectMode::Blink(255)), 0);
    }

    #[test]
    fn test_disabled_ignores_other_flags() {
        let config = RgbConfig::new()
            .with_effect(EffectMode::Disabled)
            .with_invert(Channels::all())
            .with_fade_in_disable(Channels::all())
            .with_step_duration(400);
        assert_eq!(ColorProgram::encode(&config).mode, 1);
    }

    #[test]
    fn test_timing_register() {
        let plain = ColorProgram::encode(&RgbConfig::new().with_step_duration(128));
        assert_eq!(plain.timing, 0b0000_0010);
        assert_eq!(plain.step_low, 128);

        let long = ColorProgram::encode(&RgbConfig::new().with_step_duration(300));
        assert_eq!(long.timing, 0b0000_0011);
        assert_eq!(long.step_low, 44);

        let config = RgbConfig::new()
            .with_invert(Channels::RED | Channels::BLUE)
            .with_fade_in_disable(Channels::GREEN);
        assert_eq!(ColorProgram::encode(&config).timing, 0b0101_0110);

        let literal = ColorProgram::encode(&RgbConfig::new().with_fade_in_disable(Channels::all()));
        assert_eq!(literal.timing, 0b1110_0010);
        assert!(literal.is_literal_sequence());
        assert!(!plain.is_literal_sequence());
    }

    #[test]
    fn test_write_order() {
        let config = RgbConfig::new().with_colors(
            ColorChannel(0x0102_0304),
            ColorChannel(0x0506_0708),
            ColorChannel(0x090A_0B0C),
        );
        let writes = ColorProgram::encode(&config).writes();
        let cells: std::vec::Vec<u8> = writes.iter().map(|&(cell, _)| cell).collect();
        assert_eq!(
            cells,
            [0xE4, 0xFE, 0xFF, 0xF0, 0xF1, 0xF2, 0xF3, 0xF4, 0xF5, 0xF6, 0xF7, 0xF8, 0xF9, 0xFA, 0xFB]
        );
        let colours: std::vec::Vec<u8> = writes[3..].iter().map(|&(_, value)| value).collect();
        assert_eq!(colours, [1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12]);
    }
}
