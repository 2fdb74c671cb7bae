//! msirgb-dummy - In-memory Super I/O emulator for testing
//!
//! This crate provides a dummy port backend that emulates the configuration
//! interface of a NCT6795D-style Super I/O in memory. It's useful for testing
//! and development without real hardware.
//!
//! Besides emulating the chip it keeps a trace of every port operation,
//! can be told to fail a chosen write, and records protocol violations such
//! as touching a bank cell before any bank was selected.

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

use alloc::rc::Rc;
use alloc::vec;
use alloc::vec::Vec;
use core::cell::RefCell;

use msirgb_core::error::{Error, Result};
use msirgb_core::port::{OpenPort, PortIo};
use msirgb_core::regs::{
    ENTER_ADVANCED_MODE, EXIT_ADVANCED_MODE, REG_BANK_SELECT, REG_DEVID_LSB, REG_DEVID_MSB,
};

/// Registers below this address are global, the rest belong to a bank
const FIRST_BANK_CELL: u8 = 0x30;

/// Configuration for the dummy Super I/O
#[derive(Debug, Clone)]
pub struct DummyConfig {
    /// Index port; the data port is one above
    pub base_port: u16,
    /// Value of registers 0x20/0x21
    pub chip_id: u16,
}

impl Default for DummyConfig {
    fn default() -> Self {
        Self {
            base_port: 0x4E,
            chip_id: 0xD352, // NCT6795D
        }
    }
}

/// One port operation seen by the emulator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortOp {
    /// Byte written to a port (recorded even when the write was made to fail)
    Write {
        /// Absolute port
        port: u16,
        /// Value
        value: u8,
    },
    /// Byte read from a port
    Read {
        /// Absolute port
        port: u16,
        /// Value returned
        value: u8,
    },
}

/// Protocol misuse detected by the emulator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Violation {
    /// A bank cell was accessed before any bank select in this session
    CellBeforeBankSelect {
        /// Cell address
        cell: u8,
    },
    /// The data port was used while the chip was locked
    DataWhileLocked {
        /// Index register at the time
        index: u8,
    },
    /// Advanced mode was entered again without leaving it
    ReenteredAdvancedMode,
}

#[derive(Debug)]
struct State {
    config: DummyConfig,
    /// Consecutive 0x87 writes seen while locked
    unlock_keys: u8,
    unlocked: bool,
    index: u8,
    /// Bank selected in the current session
    bank: Option<u8>,
    globals: [u8; FIRST_BANK_CELL as usize],
    banks: Vec<[u8; 256]>,
    trace: Vec<PortOp>,
    violations: Vec<Violation>,
    writes: usize,
    fail_write: Option<usize>,
    sessions: usize,
}

impl State {
    fn new(config: DummyConfig) -> Self {
        let mut globals = [0u8; FIRST_BANK_CELL as usize];
        globals[REG_DEVID_MSB as usize] = (config.chip_id >> 8) as u8;
        globals[REG_DEVID_LSB as usize] = config.chip_id as u8;
        Self {
            config,
            unlock_keys: 0,
            unlocked: false,
            index: 0,
            bank: None,
            globals,
            banks: vec![[0u8; 256]; 256],
            trace: Vec::new(),
            violations: Vec::new(),
            writes: 0,
            fail_write: None,
            sessions: 0,
        }
    }

    fn index_port(&self) -> u16 {
        self.config.base_port
    }

    fn data_port(&self) -> u16 {
        self.config.base_port.wrapping_add(1)
    }

    fn write_index(&mut self, value: u8) {
        if !self.unlocked {
            if value == ENTER_ADVANCED_MODE {
                self.unlock_keys += 1;
                if self.unlock_keys == 2 {
                    self.unlocked = true;
                    self.unlock_keys = 0;
                    self.bank = None;
                    self.sessions += 1;
                    log::trace!("dummy: unlocked");
                }
            } else {
                self.unlock_keys = 0;
            }
            return;
        }

        match value {
            EXIT_ADVANCED_MODE => {
                self.unlocked = false;
                self.bank = None;
                log::trace!("dummy: locked");
            }
            ENTER_ADVANCED_MODE => {
                self.violations.push(Violation::ReenteredAdvancedMode);
            }
            _ => {}
        }
        self.index = value;
    }

    /// Storage behind the current index register, if any
    fn cell(&mut self) -> Option<&mut u8> {
        if !self.unlocked {
            self.violations
                .push(Violation::DataWhileLocked { index: self.index });
            return None;
        }
        if self.index < FIRST_BANK_CELL {
            return Some(&mut self.globals[self.index as usize]);
        }
        match self.bank {
            Some(bank) => Some(&mut self.banks[bank as usize][self.index as usize]),
            None => {
                self.violations
                    .push(Violation::CellBeforeBankSelect { cell: self.index });
                None
            }
        }
    }

    fn write_data(&mut self, value: u8) {
        if self.unlocked && self.index == REG_BANK_SELECT {
            self.bank = Some(value);
        }
        if let Some(cell) = self.cell() {
            *cell = value;
        }
    }

    fn read_data(&mut self) -> u8 {
        // Floating bus reads as all ones
        self.cell().map(|cell| *cell).unwrap_or(0xFF)
    }
}

/// Dummy Super I/O
///
/// Clones share the same emulated chip, so a test can hand one clone to the
/// controller and inspect the trace through another.
#[derive(Debug, Clone)]
pub struct DummySuperIo {
    state: Rc<RefCell<State>>,
}

impl DummySuperIo {
    /// Create a new dummy chip with the given configuration
    pub fn new(config: DummyConfig) -> Self {
        Self {
            state: Rc::new(RefCell::new(State::new(config))),
        }
    }

    /// Create a new dummy chip with default configuration (NCT6795D at 0x4E)
    pub fn new_default() -> Self {
        Self::new(DummyConfig::default())
    }

    /// Set a bank cell directly, bypassing the port protocol
    pub fn set_cell(&self, bank: u8, cell: u8, value: u8) {
        let mut state = self.state.borrow_mut();
        if cell < FIRST_BANK_CELL {
            state.globals[cell as usize] = value;
        } else {
            state.banks[bank as usize][cell as usize] = value;
        }
    }

    /// Read a bank cell directly, bypassing the port protocol
    pub fn cell(&self, bank: u8, cell: u8) -> u8 {
        let state = self.state.borrow();
        if cell < FIRST_BANK_CELL {
            state.globals[cell as usize]
        } else {
            state.banks[bank as usize][cell as usize]
        }
    }

    /// Make the write with this zero-based index fail
    pub fn fail_write_at(&self, n: usize) {
        self.state.borrow_mut().fail_write = Some(n);
    }

    /// All port operations so far
    pub fn trace(&self) -> Vec<PortOp> {
        self.state.borrow().trace.clone()
    }

    /// Only the writes, as `(port, value)` pairs
    pub fn writes(&self) -> Vec<(u16, u8)> {
        self.state
            .borrow()
            .trace
            .iter()
            .filter_map(|op| match *op {
                PortOp::Write { port, value } => Some((port, value)),
                PortOp::Read { .. } => None,
            })
            .collect()
    }

    /// Number of write attempts so far
    pub fn write_count(&self) -> usize {
        self.state.borrow().writes
    }

    /// Protocol violations so far
    pub fn violations(&self) -> Vec<Violation> {
        self.state.borrow().violations.clone()
    }

    /// Returns true while the configuration space is unlocked
    pub fn is_unlocked(&self) -> bool {
        self.state.borrow().unlocked
    }

    /// Number of times advanced mode was entered
    pub fn sessions(&self) -> usize {
        self.state.borrow().sessions
    }

    /// Forget the trace, violations and write counter (cells are kept)
    pub fn clear_trace(&self) {
        let mut state = self.state.borrow_mut();
        state.trace.clear();
        state.violations.clear();
        state.writes = 0;
    }
}

impl PortIo for DummySuperIo {
    fn read_byte(&mut self, port: u16) -> Result<u8> {
        let mut state = self.state.borrow_mut();
        let value = if port == state.data_port() {
            state.read_data()
        } else if port == state.index_port() {
            state.index
        } else {
            0xFF
        };
        state.trace.push(PortOp::Read { port, value });
        Ok(value)
    }

    fn write_byte(&mut self, port: u16, value: u8) -> Result<()> {
        let mut state = self.state.borrow_mut();
        state.trace.push(PortOp::Write { port, value });
        let n = state.writes;
        state.writes += 1;
        if state.fail_write == Some(n) {
            return Err(Error::Write { port });
        }

        if port == state.index_port() {
            state.write_index(value);
        } else if port == state.data_port() {
            state.write_data(value);
        }
        Ok(())
    }
}

/// Opening a dummy chip hands out another handle to the same emulation
impl OpenPort for DummySuperIo {
    type Port = DummySuperIo;

    fn open(&mut self) -> Result<DummySuperIo> {
        Ok(self.clone())
    }
}
