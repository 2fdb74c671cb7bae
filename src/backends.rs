//! Port backend registration and dispatch
//!
//! This module provides a registry of the port backends compiled into the
//! binary and turns a `--port` string into something the controller can
//! open.

use msirgb_core::error::Result as CoreResult;
use msirgb_core::{OpenPort, PortIo};
use msirgb_devport::{DevPort, DevPortConfig, DevPortOpener};
#[cfg(feature = "dummy")]
use msirgb_dummy::{DummyConfig, DummySuperIo};
use thiserror::Error;

/// Information about a port backend
pub struct BackendInfo {
    /// Primary name (used for matching)
    pub name: &'static str,
    /// Alternative names
    pub aliases: &'static [&'static str],
    /// Short description
    pub description: &'static str,
    /// Whether this backend touches the real port space
    pub hardware: bool,
}

/// Get information about all available backends (enabled at compile time)
#[allow(unused_mut, clippy::vec_init_then_push)]
pub fn available_backends() -> Vec<BackendInfo> {
    let mut backends = Vec::new();

    backends.push(BackendInfo {
        name: "portfile",
        aliases: &["testing"],
        description: "Dry run against a port file (path=<file>, default /tmp/msirgb.portfile)",
        hardware: false,
    });

    backends.push(BackendInfo {
        name: "devport",
        aliases: &["dev_port"],
        description: "Real I/O ports through /dev/port - requires root and --allow-hardware",
        hardware: true,
    });

    #[cfg(feature = "dummy")]
    backends.push(BackendInfo {
        name: "dummy",
        aliases: &["emulator"],
        description: "In-memory Super I/O emulator (id=<hex chip id>, default d352)",
        hardware: false,
    });

    backends
}

/// Resolve a backend name or alias to its registry entry
pub fn find_backend(name: &str) -> Option<BackendInfo> {
    available_backends()
        .into_iter()
        .find(|b| b.name == name || b.aliases.contains(&name))
}

/// Errors selecting a backend
#[derive(Debug, Error)]
pub enum BackendError {
    /// No backend of that name is compiled in
    #[error("Unknown port backend '{0}' (see list-backends)")]
    Unknown(String),

    /// Option string is malformed
    #[error("Invalid parameter format: '{0}' (expected key=value)")]
    BadParameter(String),

    /// A backend rejected its options
    #[error("Invalid {backend} options: {message}")]
    InvalidOptions {
        backend: &'static str,
        message: String,
    },

    /// Real hardware was requested without the safety flag
    #[error("Refusing to access {0} without --allow-hardware")]
    HardwareNotAllowed(String),
}

/// Parsed backend parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendParams {
    /// Backend name as given
    pub name: String,
    /// Key-value parameters, in order
    pub params: Vec<(String, String)>,
}

impl BackendParams {
    /// Parameters as borrowed pairs for the backend crates' option parsers
    pub fn options(&self) -> Vec<(&str, &str)> {
        self.params
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect()
    }
}

/// Parse a backend string into name and parameters
///
/// Format: "name" or "name:key1=value1,key2=value2"
pub fn parse_backend_params(s: &str) -> Result<BackendParams, BackendError> {
    let (name, opts_str) = s.split_once(':').unwrap_or((s, ""));

    let mut params = Vec::new();
    if !opts_str.is_empty() {
        for opt in opts_str.split(',') {
            match opt.split_once('=') {
                Some((key, value)) => params.push((key.to_string(), value.to_string())),
                None => return Err(BackendError::BadParameter(opt.to_string())),
            }
        }
    }

    Ok(BackendParams {
        name: name.to_string(),
        params,
    })
}

#[cfg(feature = "dummy")]
fn parse_dummy_options(options: &[(&str, &str)]) -> Result<DummyConfig, String> {
    let mut config = DummyConfig::default();

    for (key, value) in options {
        match *key {
            "id" => {
                let hex = value.trim_start_matches("0x");
                config.chip_id = u16::from_str_radix(hex, 16)
                    .map_err(|_| format!("Invalid chip id: {}", value))?;
            }
            _ => {
                log::warn!("dummy: Unknown option: {}={}", key, value);
            }
        }
    }

    Ok(config)
}

/// An opened backend, ready to hand to a controller
pub enum Backend {
    /// Port file or `/dev/port`
    DevPort(DevPortOpener),
    /// In-memory emulator
    #[cfg(feature = "dummy")]
    Dummy(DummySuperIo),
}

impl Backend {
    /// Open the backend named by a `--port` argument
    ///
    /// `base_port` is where the emulator places its chip so that it answers
    /// at the same address the controller will use.
    pub fn from_arg(
        arg: &str,
        allow_hardware: bool,
        base_port: u16,
    ) -> Result<Self, BackendError> {
        let params = parse_backend_params(arg)?;
        let info = find_backend(&params.name)
            .ok_or_else(|| BackendError::Unknown(params.name.clone()))?;
        let options = params.options();
        log::debug!("Using port backend {} {:?}", info.name, options);

        let backend = match info.name {
            "devport" => Backend::DevPort(DevPortOpener::new(DevPortConfig::hardware())),
            #[cfg(feature = "dummy")]
            "dummy" => {
                let mut config = parse_dummy_options(&options).map_err(|message| {
                    BackendError::InvalidOptions {
                        backend: "dummy",
                        message,
                    }
                })?;
                config.base_port = base_port;
                Backend::Dummy(DummySuperIo::new(config))
            }
            _ => {
                let config = msirgb_devport::parse_options(&options).map_err(|message| {
                    BackendError::InvalidOptions {
                        backend: "portfile",
                        message,
                    }
                })?;
                Backend::DevPort(DevPortOpener::new(config))
            }
        };

        if backend.is_hardware() && !allow_hardware {
            return Err(BackendError::HardwareNotAllowed(backend.describe()));
        }
        #[cfg(not(feature = "dummy"))]
        let _ = base_port;
        Ok(backend)
    }

    /// Returns true if this backend writes to real I/O ports
    pub fn is_hardware(&self) -> bool {
        match self {
            Backend::DevPort(opener) => opener.config().is_hardware(),
            #[cfg(feature = "dummy")]
            Backend::Dummy(_) => false,
        }
    }

    /// Returns true if there is no chip behind the backend to identify
    pub fn is_simulated_file(&self) -> bool {
        match self {
            Backend::DevPort(opener) => !opener.config().is_hardware(),
            #[cfg(feature = "dummy")]
            Backend::Dummy(_) => false,
        }
    }

    /// Human readable target
    pub fn describe(&self) -> String {
        match self {
            Backend::DevPort(opener) => opener.config().path.clone(),
            #[cfg(feature = "dummy")]
            Backend::Dummy(_) => "in-memory Super I/O".to_string(),
        }
    }
}

/// Port handle produced by a [`Backend`]
pub enum BackendPort {
    /// File-backed ports
    DevPort(DevPort),
    /// Emulated chip
    #[cfg(feature = "dummy")]
    Dummy(DummySuperIo),
}

impl PortIo for BackendPort {
    fn read_byte(&mut self, port: u16) -> CoreResult<u8> {
        match self {
            BackendPort::DevPort(p) => p.read_byte(port),
            #[cfg(feature = "dummy")]
            BackendPort::Dummy(p) => p.read_byte(port),
        }
    }

    fn write_byte(&mut self, port: u16, value: u8) -> CoreResult<()> {
        match self {
            BackendPort::DevPort(p) => p.write_byte(port, value),
            #[cfg(feature = "dummy")]
            BackendPort::Dummy(p) => p.write_byte(port, value),
        }
    }
}

impl OpenPort for Backend {
    type Port = BackendPort;

    fn open(&mut self) -> CoreResult<BackendPort> {
        match self {
            Backend::DevPort(opener) => opener.open().map(BackendPort::DevPort),
            #[cfg(feature = "dummy")]
            Backend::Dummy(chip) => chip.open().map(BackendPort::Dummy),
        }
    }
}
