//! List commands implementation

use crate::backends::available_backends;
use msirgb_core::regs::{KNOWN_BASE_PORTS, SUPPORTED_CHIPS};

/// List all available port backends and supported chips
pub fn list_backends() {
    println!("Available port backends:");
    println!();
    for b in available_backends() {
        let aliases = if b.aliases.is_empty() {
            String::new()
        } else {
            format!(" (alias: {})", b.aliases.join(", "))
        };
        let hardware = if b.hardware { " [hardware]" } else { "" };
        println!("  {:<10} - {}{}{}", b.name, b.description, aliases, hardware);
    }

    println!();
    println!("Supported Super I/O chips:");
    for chip in SUPPORTED_CHIPS {
        println!("  {:<10} - ID {:#06x}", chip.name, chip.id_mask);
    }
    let ports: Vec<String> = KNOWN_BASE_PORTS.iter().map(|p| format!("{:x}", p)).collect();
    println!();
    println!("Known base ports: {}", ports.join(", "));
}
