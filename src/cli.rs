//! CLI argument parsing

use clap::{Args, Parser, Subcommand};
use msirgb_core::Channels;

/// Parse a hex string (optional `0x` prefix) as a u32
fn parse_hex_u32(s: &str) -> Result<u32, String> {
    let hex = s
        .strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s);
    u32::from_str_radix(hex, 16).map_err(|e| format!("Invalid hex value: {}", e))
}

/// Parse a hex string (optional `0x` prefix) as a port number
fn parse_hex_u16(s: &str) -> Result<u16, String> {
    let value = parse_hex_u32(s)?;
    u16::try_from(value).map_err(|_| format!("Port {:#x} out of range", value))
}

/// Parse a channel set such as `rb`
fn parse_channels(s: &str) -> Result<Channels, String> {
    s.parse::<Channels>().map_err(|e| e.to_string())
}

const PORT_HELP: &str = "Port backend: portfile[:path=<file>], devport, dummy[:id=<hex>]";

#[derive(Parser)]
#[command(name = "msirgb")]
#[command(author, version, about = "RGB header control for MSI boards", long_about = None)]
pub struct Cli {
    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

/// Options selecting and addressing the Super I/O, shared across commands
#[derive(Args, Debug, Clone)]
pub struct TargetArgs {
    #[arg(short, long, default_value = "portfile", help = PORT_HELP)]
    pub port: String,

    /// Allow access to the real I/O port space
    #[arg(long)]
    pub allow_hardware: bool,

    /// Super I/O base port in hex (known: 4e, 2e)
    #[arg(long, default_value = "4e", value_parser = parse_hex_u16)]
    pub base_port: u16,

    /// Do not check the Super I/O chip ID
    #[arg(long)]
    pub ignore_check: bool,

    /// Replay the vendor tool's extra initialization reads
    #[arg(long)]
    pub legacy_probe: bool,
}

/// Lighting options of the apply command
#[derive(Args, Debug, Clone)]
pub struct ApplyArgs {
    /// Red frames, 8 hex nibbles (frame order 1 0 3 2 5 4 7 6)
    #[arg(short, long, default_value = "00000000", value_parser = parse_hex_u32)]
    pub red: u32,

    /// Green frames, 8 hex nibbles
    #[arg(short, long, default_value = "00000000", value_parser = parse_hex_u32)]
    pub green: u32,

    /// Blue frames, 8 hex nibbles
    #[arg(short, long, default_value = "00000000", value_parser = parse_hex_u32)]
    pub blue: u32,

    /// Time between frames, 0 (fastest) to 511 (slowest)
    #[arg(short = 'd', long, default_value_t = 128)]
    pub step_duration: u16,

    /// Channels to invert, e.g. "rb"
    #[arg(short, long, default_value = "", value_parser = parse_channels)]
    pub invert: Channels,

    /// Channels with fade-in, e.g. "g"
    #[arg(short, long, default_value = "", value_parser = parse_channels)]
    pub fade_in: Channels,

    /// Smooth pulsing
    #[arg(long, conflicts_with_all = ["blink", "disable"])]
    pub pulse: bool,

    /// Blink level, 1 (fast) to 6 (slow); 0 turns blinking off
    #[arg(long, value_parser = clap::value_parser!(u8).range(0..=6), conflicts_with = "disable")]
    pub blink: Option<u8>,

    /// Turn all lighting off
    #[arg(long)]
    pub disable: bool,

    #[command(flatten)]
    pub target: TargetArgs,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Program the RGB header
    Apply(ApplyArgs),

    /// Print the RGB related Super I/O registers
    Dump {
        #[command(flatten)]
        target: TargetArgs,
    },

    /// List available port backends
    ListBackends,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
        Cli::try_parse_from(std::iter::once("msirgb").chain(args.iter().copied()))
    }

    fn apply_args(args: &[&str]) -> ApplyArgs {
        let mut full = vec!["apply"];
        full.extend_from_slice(args);
        match parse(&full).unwrap().command {
            Commands::Apply(args) => args,
            _ => panic!("expected apply"),
        }
    }

    #[test]
    fn test_parse_hex() {
        assert_eq!(parse_hex_u32("ffffffff"), Ok(0xFFFF_FFFF));
        assert_eq!(parse_hex_u32("0x1234"), Ok(0x1234));
        assert!(parse_hex_u32("100000000").is_err());
        assert!(parse_hex_u32("xyz").is_err());
        assert_eq!(parse_hex_u16("2e"), Ok(0x2E));
        assert!(parse_hex_u16("10000").is_err());
    }

    #[test]
    fn test_apply_defaults() {
        let args = apply_args(&[]);
        assert_eq!(args.red, 0);
        assert_eq!(args.step_duration, 128);
        assert_eq!(args.invert, Channels::empty());
        assert_eq!(args.fade_in, Channels::empty());
        assert_eq!(args.target.port, "portfile");
        assert_eq!(args.target.base_port, 0x4E);
        assert!(!args.target.allow_hardware);
    }

    #[test]
    fn test_apply_options() {
        let args = apply_args(&[
            "-r", "0xff00ff00", "-b", "12345678", "-d", "300", "-i", "rg", "-f", "B", "--blink",
            "3", "--base-port", "2e",
        ]);
        assert_eq!(args.red, 0xFF00_FF00);
        assert_eq!(args.blue, 0x1234_5678);
        assert_eq!(args.step_duration, 300);
        assert_eq!(args.invert, Channels::RED | Channels::GREEN);
        assert_eq!(args.fade_in, Channels::BLUE);
        assert_eq!(args.blink, Some(3));
        assert_eq!(args.target.base_port, 0x2E);
    }

    #[test]
    fn test_effects_are_exclusive() {
        assert!(parse(&["apply", "--pulse", "--disable"]).is_err());
        assert!(parse(&["apply", "--pulse", "--blink", "2"]).is_err());
        assert!(parse(&["apply", "--disable", "--blink", "2"]).is_err());
        assert!(parse(&["apply", "--blink", "7"]).is_err());
        assert!(parse(&["apply", "-i", "rx"]).is_err());
    }
}
