//! Lighting configuration consumed by the controller

use core::fmt;
use core::str::FromStr;

use bitflags::bitflags;

use crate::port::PortAddress;

bitflags! {
    /// A set of colour channels
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Channels: u8 {
        /// Red channel
        const RED   = 1 << 0;
        /// Green channel
        const GREEN = 1 << 1;
        /// Blue channel
        const BLUE  = 1 << 2;
    }
}

/// Error parsing a channel set
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseChannelsError(pub char);

impl fmt::Display for ParseChannelsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid channel '{}' (expected any of r, g, b)", self.0)
    }
}

#[cfg(feature = "std")]
impl std::error::Error for ParseChannelsError {}

impl FromStr for Channels {
    type Err = ParseChannelsError;

    /// Parse strings like `"rb"`; the empty string is the empty set
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.chars().try_fold(Channels::empty(), |set, c| match c {
            'r' | 'R' => Ok(set | Channels::RED),
            'g' | 'G' => Ok(set | Channels::GREEN),
            'b' | 'B' => Ok(set | Channels::BLUE),
            other => Err(ParseChannelsError(other)),
        })
    }
}

/// Lighting effect; exactly one is active per program
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EffectMode {
    /// Frames cycle with the configured step duration
    #[default]
    Normal,
    /// All lighting off, including the on-board lights
    Disabled,
    /// Smooth pulsing
    Pulse,
    /// Blinking; higher levels blink slower
    Blink(u8),
}

impl EffectMode {
    /// Blink effect for a user level where 0 means "no blinking"
    pub fn from_blink_level(level: u8) -> Self {
        if level == 0 {
            Self::Normal
        } else {
            Self::Blink(level)
        }
    }
}

/// Eight 4-bit frame intensities packed into the four bytes of a channel
///
/// The bytes are written most significant first. Within each byte the odd
/// frame sits in the high nibble, so the frame order over the four cells is
/// `1 0 3 2 5 4 7 6`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ColorChannel(pub u32);

impl ColorChannel {
    /// Pack eight frame intensities (only the low nibble of each is used)
    pub fn from_frames(frames: [u8; 8]) -> Self {
        let mut bytes = [0u8; 4];
        for (i, byte) in bytes.iter_mut().enumerate() {
            *byte = (frames[2 * i + 1] & 0xF) << 4 | (frames[2 * i] & 0xF);
        }
        Self(u32::from_be_bytes(bytes))
    }

    /// Same intensity in all frames
    pub fn solid(level: u8) -> Self {
        Self::from_frames([level; 8])
    }

    /// Intensity of frame `n`, or `None` past the eighth frame
    pub fn frame(&self, n: usize) -> Option<u8> {
        let byte = *self.to_bytes().get(n / 2)?;
        Some(if n % 2 == 0 { byte & 0xF } else { byte >> 4 })
    }

    /// Register bytes in write order
    pub fn to_bytes(&self) -> [u8; 4] {
        self.0.to_be_bytes()
    }
}

impl From<u32> for ColorChannel {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

impl fmt::Display for ColorChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:08x}", self.0)
    }
}

/// Everything needed for one `apply` run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RgbConfig {
    /// Red frames
    pub red: ColorChannel,
    /// Green frames
    pub green: ColorChannel,
    /// Blue frames
    pub blue: ColorChannel,
    /// Time between frames, 0 (fastest) to 511 (slowest); larger values clamp
    pub step_duration: u16,
    /// Channels with inverted intensity
    pub invert: Channels,
    /// Channels without fade-in
    pub fade_in_disable: Channels,
    /// Active effect
    pub effect: EffectMode,
    /// Index port of the Super I/O
    pub base_port: u16,
    /// Skip the chip ID check entirely
    pub skip_identity_check: bool,
    /// Replay the vendor tool's initialization reads after unlocking
    pub legacy_probe: bool,
}

impl Default for RgbConfig {
    fn default() -> Self {
        Self {
            red: ColorChannel::default(),
            green: ColorChannel::default(),
            blue: ColorChannel::default(),
            step_duration: 128,
            invert: Channels::empty(),
            fade_in_disable: Channels::empty(),
            effect: EffectMode::Normal,
            base_port: PortAddress::default().index(),
            skip_identity_check: false,
            legacy_probe: false,
        }
    }
}

impl RgbConfig {
    /// Create a configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the three colour channels
    pub fn with_colors(
        mut self,
        red: impl Into<ColorChannel>,
        green: impl Into<ColorChannel>,
        blue: impl Into<ColorChannel>,
    ) -> Self {
        self.red = red.into();
        self.green = green.into();
        self.blue = blue.into();
        self
    }

    /// Set the step duration
    pub fn with_step_duration(mut self, step_duration: u16) -> Self {
        self.step_duration = step_duration;
        self
    }

    /// Set the inverted channels
    pub fn with_invert(mut self, invert: Channels) -> Self {
        self.invert = invert;
        self
    }

    /// Set the channels without fade-in
    pub fn with_fade_in_disable(mut self, channels: Channels) -> Self {
        self.fade_in_disable = channels;
        self
    }

    /// Set the effect
    pub fn with_effect(mut self, effect: EffectMode) -> Self {
        self.effect = effect;
        self
    }

    /// Set the base port
    pub fn with_base_port(mut self, base_port: u16) -> Self {
        self.base_port = base_port;
        self
    }

    /// Skip (or require) the chip ID check
    pub fn with_skip_identity_check(mut self, skip: bool) -> Self {
        self.skip_identity_check = skip;
        self
    }

    /// Enable the legacy initialization reads
    pub fn with_legacy_probe(mut self, enabled: bool) -> Self {
        self.legacy_probe = enabled;
        self
    }

    /// Port pair derived from `base_port`
    pub fn port_address(&self) -> PortAddress {
        PortAddress::new(self.base_port)
    }
}
