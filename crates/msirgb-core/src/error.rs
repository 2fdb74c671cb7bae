//! Error types for msirgb-core
//!
//! This module provides a no_std compatible error type that can be used
//! throughout the crate, plus the composite error returned by the
//! controller when the advanced-mode exit fails on top of another fault.

use core::fmt;

/// Direction of an advanced-mode transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeTransition {
    /// Writing the `87 87` unlock sequence
    Enter,
    /// Writing the `AA` lock byte
    Exit,
}

/// Core error type - no_std compatible, Copy for efficiency
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The port resource could not be opened (usually missing privileges)
    Open,
    /// Entering or leaving advanced mode failed
    Mode(ModeTransition),
    /// The chip identifier does not match a supported Super I/O
    IdentityMismatch {
        /// Identifier read from registers 0x20/0x21
        id: u16,
    },
    /// A single-byte write did not complete
    Write {
        /// Absolute port address
        port: u16,
    },
    /// A single-byte read did not complete
    Read {
        /// Absolute port address
        port: u16,
    },
}

impl fmt::Display for ModeTransition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Enter => write!(f, "enable"),
            Self::Exit => write!(f, "disable"),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Open => write!(f, "could not open the port device; try sudo?"),
            Self::Mode(transition) => write!(f, "could not {} advanced mode", transition),
            Self::IdentityMismatch { id } => write!(
                f,
                "the Super I/O chip identifies as {:#06x}, which is not a NCT6795D/NCT6797D",
                id
            ),
            Self::Write { port } => write!(f, "write to port {:#06x} failed", port),
            Self::Read { port } => write!(f, "read from port {:#06x} failed", port),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}

/// Result type alias using the core Error type
pub type Result<T> = core::result::Result<T, Error>;

/// Failure of a complete controller run
///
/// `cause` is the first fault that aborted the run. If leaving advanced mode
/// failed afterwards, that fault is kept separately in `exit_failure` so it
/// never masks the first one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ApplyError {
    /// The earliest failure
    pub cause: Error,
    /// Failure of the cleanup exit, if it also failed
    pub exit_failure: Option<Error>,
}

impl ApplyError {
    /// Error with no secondary exit fault
    pub fn new(cause: Error) -> Self {
        Self {
            cause,
            exit_failure: None,
        }
    }

    /// Returns true if the chip may still be in advanced mode
    pub fn left_in_advanced_mode(&self) -> bool {
        matches!(self.cause, Error::Mode(ModeTransition::Exit))
            || self.exit_failure.is_some()
    }
}

impl From<Error> for ApplyError {
    fn from(cause: Error) -> Self {
        Self::new(cause)
    }
}

impl fmt::Display for ApplyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.cause)?;
        if let Some(exit) = &self.exit_failure {
            write!(f, " (additionally failed to leave advanced mode: {})", exit)?;
        }
        Ok(())
    }
}

#[cfg(feature = "std")]
impl std::error::Error for ApplyError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.cause)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::string::ToString;

    #[test]
    fn test_exit_failure_is_reported_separately() {
        let err = ApplyError {
            cause: Error::Write { port: 0x4f },
            exit_failure: Some(Error::Mode(ModeTransition::Exit)),
        };
        assert_eq!(
            err.to_string(),
            "write to port 0x004f failed (additionally failed to leave advanced mode: \
             could not disable advanced mode)"
        );
        assert!(err.left_in_advanced_mode());
    }

    #[test]
    fn test_plain_cause() {
        let err = ApplyError::from(Error::IdentityMismatch { id: 0x1234 });
        assert!(!err.left_in_advanced_mode());
        assert!(err.to_string().contains("0x1234"));
    }
}
