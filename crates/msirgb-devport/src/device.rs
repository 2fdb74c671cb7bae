//! Port file device implementation
//!
//! This module provides the `DevPort` struct that implements the `PortIo`
//! trait on top of a seekable file where the file offset is the port number.
//! On Linux `/dev/port` has exactly this layout; a regular file with the
//! same layout serves as a dry-run target.

use crate::error::{DevPortError, Result};

use msirgb_core::error::{Error as CoreError, Result as CoreResult};
use msirgb_core::port::{OpenPort, PortIo};

use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Component, Path, PathBuf};

/// Kernel interface to the I/O port space
pub const DEV_PORT_PATH: &str = "/dev/port";

/// Default dry-run port file
pub const DEFAULT_PORT_FILE: &str = "/tmp/msirgb.portfile";

/// Size of the port space (and of a dry-run port file)
pub const PORT_SPACE_SIZE: u64 = 0x1_0000;

/// Configuration for opening a port file
#[derive(Debug, Clone)]
pub struct DevPortConfig {
    /// Path of the port file
    pub path: String,
    /// Create a zero-filled port file first if it does not exist
    pub create: bool,
}

impl Default for DevPortConfig {
    fn default() -> Self {
        Self {
            path: DEFAULT_PORT_FILE.to_string(),
            create: true,
        }
    }
}

impl DevPortConfig {
    /// Create a configuration for the given path
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Default::default()
        }
    }

    /// Configuration for the real `/dev/port`
    pub fn hardware() -> Self {
        Self {
            path: DEV_PORT_PATH.to_string(),
            create: false,
        }
    }

    /// Create the file when missing
    pub fn with_create(mut self, create: bool) -> Self {
        self.create = create;
        self
    }

    /// Returns true if this may reach real hardware
    ///
    /// Any spelling of `/dev/port` counts, including `..` detours and
    /// symlinks, and so does every character device.
    pub fn is_hardware(&self) -> bool {
        let path = Path::new(&self.path);
        let dev_port = Path::new(DEV_PORT_PATH);
        if lexical_normalize(path) == dev_port {
            return true;
        }
        if std::fs::canonicalize(path).is_ok_and(|real| real == dev_port) {
            return true;
        }
        is_char_device(path)
    }
}

/// Resolve `.` and `..` without touching the filesystem
fn lexical_normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other),
        }
    }
    out
}

#[cfg(unix)]
fn is_char_device(path: &Path) -> bool {
    use std::os::unix::fs::FileTypeExt;

    std::fs::metadata(path).is_ok_and(|m| m.file_type().is_char_device())
}

#[cfg(not(unix))]
fn is_char_device(_path: &Path) -> bool {
    false
}

/// Byte-wide port access through a port file
pub struct DevPort {
    file: File,
    path: String,
}

impl DevPort {
    /// Open a port file with the given configuration
    pub fn open(config: &DevPortConfig) -> Result<Self> {
        if config.path.is_empty() {
            return Err(DevPortError::InvalidParameter(
                "empty port file path".to_string(),
            ));
        }
        if config.create && !config.is_hardware() {
            Self::create_port_file(&config.path)?;
        }

        log::debug!("devport: Opening {}", config.path);
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(&config.path)
            .map_err(|e| DevPortError::OpenFailed {
                path: config.path.clone(),
                source: e,
            })?;

        Ok(Self {
            file,
            path: config.path.clone(),
        })
    }

    /// Open a path with default settings
    pub fn open_path(path: &str) -> Result<Self> {
        Self::open(&DevPortConfig::new(path))
    }

    /// Create a zero-filled file covering the whole port space
    ///
    /// An existing file is left alone.
    pub fn create_port_file(path: &str) -> Result<()> {
        if Path::new(path).exists() {
            return Ok(());
        }
        let create_failed = |e| DevPortError::CreateFailed {
            path: path.to_string(),
            source: e,
        };
        let file = File::create(path).map_err(create_failed)?;
        file.set_len(PORT_SPACE_SIZE).map_err(create_failed)?;
        log::info!("devport: Created port file {}", path);
        Ok(())
    }

    /// Path this device was opened from
    pub fn path(&self) -> &str {
        &self.path
    }

    fn seek(&mut self, port: u16) -> Result<()> {
        self.file
            .seek(SeekFrom::Start(u64::from(port)))
            .map_err(|e| DevPortError::SeekFailed { port, source: e })?;
        Ok(())
    }

    /// Write exactly one byte at `port`
    pub fn write_at(&mut self, port: u16, value: u8) -> Result<()> {
        self.seek(port)?;
        let count = self
            .file
            .write(&[value])
            .map_err(|e| DevPortError::TransferFailed { port, source: e })?;
        if count != 1 {
            return Err(DevPortError::ShortTransfer { port, count });
        }
        Ok(())
    }

    /// Read exactly one byte from `port`
    pub fn read_at(&mut self, port: u16) -> Result<u8> {
        self.seek(port)?;
        let mut buf = [0u8; 1];
        let count = self
            .file
            .read(&mut buf)
            .map_err(|e| DevPortError::TransferFailed { port, source: e })?;
        if count != 1 {
            return Err(DevPortError::ShortTransfer { port, count });
        }
        Ok(buf[0])
    }
}

impl PortIo for DevPort {
    fn read_byte(&mut self, port: u16) -> CoreResult<u8> {
        self.read_at(port).map_err(|e| {
            log::error!("devport: {}", e);
            CoreError::Read { port }
        })
    }

    fn write_byte(&mut self, port: u16, value: u8) -> CoreResult<()> {
        self.write_at(port, value).map_err(|e| {
            log::error!("devport: {}", e);
            CoreError::Write { port }
        })
    }
}

/// Opens a fresh `DevPort` for every controller run
#[derive(Debug, Clone)]
pub struct DevPortOpener {
    config: DevPortConfig,
}

impl DevPortOpener {
    /// Create an opener for the given configuration
    pub fn new(config: DevPortConfig) -> Self {
        Self { config }
    }

    /// Configuration used for each open
    pub fn config(&self) -> &DevPortConfig {
        &self.config
    }
}

impl OpenPort for DevPortOpener {
    type Port = DevPort;

    fn open(&mut self) -> CoreResult<DevPort> {
        DevPort::open(&self.config).map_err(|e| {
            log::error!("devport: {}", e);
            if e.is_permission_denied() {
                log::error!("devport: Try running with sudo?");
            }
            CoreError::Open
        })
    }
}

/// Parse port file options from `(key, value)` pairs
///
/// Supported options:
/// - `path=<file>` - port file (default: `/tmp/msirgb.portfile`)
/// - `create=yes|no` - create a missing file (default: yes)
pub fn parse_options(options: &[(&str, &str)]) -> std::result::Result<DevPortConfig, String> {
    let mut config = DevPortConfig::default();

    for (key, value) in options {
        match *key {
            "path" => {
                config.path = value.to_string();
            }
            "create" => {
                config.create = match *value {
                    "yes" | "true" | "1" => true,
                    "no" | "false" | "0" => false,
                    _ => return Err(format!("Invalid create value: {}", value)),
                };
            }
            _ => {
                log::warn!("devport: Unknown option: {}={}", key, value);
            }
        }
    }

    if config.path.is_empty() {
        return Err("No port file specified. Use path=<file>".to_string());
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use msirgb_core::{Controller, EffectMode, RgbConfig};

    fn temp_path(name: &str) -> String {
        let path = std::env::temp_dir().join(format!(
            "msirgb-devport-{}-{}.portfile",
            std::process::id(),
            name
        ));
        let _ = std::fs::remove_file(&path);
        path.to_string_lossy().into_owned()
    }

    #[test]
    fn test_create_port_file() {
        let path = temp_path("create");
        DevPort::create_port_file(&path).unwrap();
        assert_eq!(std::fs::metadata(&path).unwrap().len(), PORT_SPACE_SIZE);

        // Existing content survives a second call
        std::fs::write(&path, [1u8, 2, 3]).unwrap();
        DevPort::create_port_file(&path).unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), [1, 2, 3]);
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_byte_at_port_offset() {
        let path = temp_path("offset");
        let mut port = DevPort::open_path(&path).unwrap();
        port.write_byte(0x4E, 0x87).unwrap();
        port.write_byte(0x4F, 0x12).unwrap();
        assert_eq!(port.read_byte(0x4E).unwrap(), 0x87);
        assert_eq!(port.read_byte(0x2E).unwrap(), 0x00);
        drop(port);

        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(bytes[0x4E], 0x87);
        assert_eq!(bytes[0x4F], 0x12);
        assert_eq!(bytes.iter().filter(|&&b| b != 0).count(), 2);
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_read_past_end_is_short() {
        let path = temp_path("short");
        std::fs::write(&path, [0u8; 16]).unwrap();
        let mut port = DevPort::open(&DevPortConfig::new(path.as_str())).unwrap();
        assert!(matches!(
            port.read_at(0x4F),
            Err(DevPortError::ShortTransfer { port: 0x4F, count: 0 })
        ));
        assert_eq!(port.read_byte(0x4F), Err(CoreError::Read { port: 0x4F }));
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_open_missing_file() {
        let path = temp_path("missing");
        let config = DevPortConfig::new(path.as_str()).with_create(false);
        assert!(matches!(
            DevPort::open(&config),
            Err(DevPortError::OpenFailed { .. })
        ));
        assert_eq!(
            DevPortOpener::new(config).open().err(),
            Some(CoreError::Open)
        );
    }

    #[test]
    fn test_apply_to_port_file() {
        let path = temp_path("apply");
        let mut ctl = Controller::new(DevPortOpener::new(DevPortConfig::new(path.as_str())));
        let config = RgbConfig::new()
            .with_colors(0, 0, 0x0000_00AB)
            .with_effect(EffectMode::Pulse)
            .with_skip_identity_check(true);
        ctl.apply(&config).unwrap();

        // Last index write is the lock key, last data write the final blue byte
        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(bytes[0x4E], 0xAA);
        assert_eq!(bytes[0x4F], 0xAB);

        // A second run opens the file again
        ctl.apply(&config).unwrap();
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_other_spellings_of_dev_port_are_hardware() {
        for path in [
            "/dev/port",
            "/dev/../dev/port",
            "/dev/./port",
            "//dev/port",
            "/tmp/../dev/port",
        ] {
            assert!(DevPortConfig::new(path).is_hardware(), "{}", path);
        }
        assert!(!DevPortConfig::new("/dev/portfile").is_hardware());
        assert!(!DevPortConfig::default().is_hardware());
    }

    #[cfg(unix)]
    #[test]
    fn test_char_devices_and_links_are_hardware() {
        assert!(DevPortConfig::new("/dev/null").is_hardware());

        let link = temp_path("link");
        std::os::unix::fs::symlink("/dev/null", &link).unwrap();
        assert!(DevPortConfig::new(link.as_str()).is_hardware());
        std::fs::remove_file(&link).unwrap();

        let file = temp_path("regular");
        DevPort::create_port_file(&file).unwrap();
        assert!(!DevPortConfig::new(file.as_str()).is_hardware());
        std::fs::remove_file(&file).unwrap();
    }

    #[test]
    fn test_parse_options() {
        let config = parse_options(&[]).unwrap();
        assert_eq!(config.path, DEFAULT_PORT_FILE);
        assert!(config.create);
        assert!(!config.is_hardware());

        let config = parse_options(&[("path", "/dev/port"), ("create", "no")]).unwrap();
        assert!(config.is_hardware());
        assert!(!config.create);

        assert!(parse_options(&[("create", "maybe")]).is_err());
        assert!(parse_options(&[("path", "")]).is_err());
    }
}
