//! Recording port double for unit tests

use std::collections::VecDeque;
use std::vec::Vec;

use crate::error::{Error, Result};
use crate::port::PortIo;

/// One recorded port operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    /// Write `(port, value)`, recorded even if it was made to fail
    W(u16, u8),
    /// Read `(port, value)`
    R(u16, u8),
}

/// Records every operation; reads return queued values, then zero
///
/// A read made to fail is not recorded and consumes no queued value.
#[derive(Debug, Default)]
pub struct TracePort {
    pub ops: Vec<Op>,
    queued: VecDeque<u8>,
    reads: usize,
    writes: usize,
    fail_read: Option<usize>,
    fail_write: Option<usize>,
}

impl TracePort {
    pub fn new() -> Self {
        Self::default()
    }

    /// Values returned by the next reads, in order
    pub fn with_reads(mut self, values: &[u8]) -> Self {
        self.queued.extend(values.iter().copied());
        self
    }

    /// Make the write with this zero-based index fail
    pub fn fail_write(mut self, n: usize) -> Self {
        self.fail_write = Some(n);
        self
    }

    /// Make the read with this zero-based index fail
    pub fn fail_read(mut self, n: usize) -> Self {
        self.fail_read = Some(n);
        self
    }

    pub fn count(&self, op: Op) -> usize {
        self.ops.iter().filter(|&&o| o == op).count()
    }

    pub fn reads(&self) -> usize {
        self.reads
    }

    pub fn writes(&self) -> usize {
        self.writes
    }
}

impl PortIo for TracePort {
    fn read_byte(&mut self, port: u16) -> Result<u8> {
        let n = self.reads;
        self.reads += 1;
        if self.fail_read == Some(n) {
            return Err(Error::Read { port });
        }
        let value = self.queued.pop_front().unwrap_or(0);
        self.ops.push(Op::R(port, value));
        Ok(value)
    }

    fn write_byte(&mut self, port: u16, value: u8) -> Result<()> {
        self.ops.push(Op::W(port, value));
        let n = self.writes;
        self.writes += 1;
        if self.fail_write == Some(n) {
            return Err(Error::Write { port });
        }
        Ok(())
    }
}
