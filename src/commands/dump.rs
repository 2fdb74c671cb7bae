//! Register dump command implementation

use super::{open_target, report_failure};
use crate::cli::TargetArgs;
use msirgb_core::regs::DUMP_RANGES;
use msirgb_core::{Controller, RgbConfig};
use std::fmt::Write;

/// Read and print the RGB related registers
pub fn run_dump(target: &TargetArgs) -> Result<(), Box<dyn std::error::Error>> {
    let (backend, config) = open_target(target, RgbConfig::new())?;

    let mut cells = Vec::new();
    let mut controller = Controller::new(backend);
    if let Err(e) = controller.dump(&config, DUMP_RANGES, |bank, cell, value| {
        cells.push((bank, cell, value))
    }) {
        report_failure(&e, target);
        return Err(Box::new(e));
    }

    print!("{}", format_dump(&cells));
    Ok(())
}

/// Format `(bank, cell, value)` triples as one hex table per bank
///
/// Rows hold 16 cells starting at a multiple of 16; missing cells are blank.
pub fn format_dump(cells: &[(u8, u8, u8)]) -> String {
    let mut out = String::new();
    let mut current: Option<(u8, u8)> = None;

    for &(bank, cell, value) in cells {
        let row = cell & 0xF0;
        if current.map(|(b, _)| b) != Some(bank) {
            if current.is_some() {
                out.push_str("\n\n");
            }
            let _ = writeln!(out, "Bank {:#04x}:", bank);
            let _ = write!(out, "     ");
            for col in 0..16 {
                let _ = write!(out, " {:2x}", col);
            }
            current = None;
        }
        if current != Some((bank, row)) {
            let _ = write!(out, "\n  {:02x}:", row);
            for _ in row..cell {
                out.push_str("   ");
            }
        }
        let _ = write!(out, " {:02x}", value);
        current = Some((bank, row));
    }
    if current.is_some() {
        out.push('\n');
    }
    out
}
