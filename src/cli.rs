//! CLI argument parsing

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Parse a string as a hex or decimal u32
fn parse_hex_u32(s: &str) -> Result<u32, String> {
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        u32::from_str_radix(hex, 16).map_err(|e| format!("Invalid hex value: {}", e))
    } else {
        s.parse::<u32>().map_err(|e| format!("Invalid number: {}", e))
    }
}

/// Bytes given on the command line as hex
///
/// Accepts "9f000000", "9F 00 00 00", "0x9f,0x00" and similar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HexBytes(pub Vec<u8>);

fn parse_hex_bytes(s: &str) -> Result<HexBytes, String> {
    let digits: String = s
        .split(|c: char| c.is_whitespace() || c == ',' || c == ':')
        .map(|tok| tok.trim_start_matches("0x").trim_start_matches("0X"))
        .collect();
    hex::decode(&digits)
        .map(HexBytes)
        .map_err(|e| format!("Invalid hex data: {}", e))
}

#[derive(Parser)]
#[command(name = "spidevctl")]
#[command(author, version, about = "Linux spidev transfer tool", long_about = None)]
pub struct Cli {
    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

/// Device selection and bus settings shared across commands
#[derive(clap::Args, Debug, Clone)]
pub struct DeviceArgs {
    /// spidev device node (e.g., /dev/spidev0.0)
    #[arg(short, long)]
    pub device: String,

    /// Clock speed in Hz (hex or decimal)
    #[arg(short, long, default_value = "2000000", value_parser = parse_hex_u32)]
    pub speed: u32,

    /// SPI mode
    #[arg(short, long, default_value_t = 0, value_parser = clap::value_parser!(u8).range(0..=3))]
    pub mode: u8,

    /// Bits per word
    #[arg(short, long, default_value_t = 8)]
    pub bits: u8,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Full-duplex transfer, prints the bytes clocked in
    Transfer {
        #[command(flatten)]
        device: DeviceArgs,

        /// Bytes to send (hex)
        #[arg(short, long, value_parser = parse_hex_bytes)]
        tx: HexBytes,

        /// Total bytes to clock (default: length of --tx, padded with zeros)
        #[arg(short = 'n', long)]
        len: Option<usize>,

        /// Deassert chip select after the transfer
        #[arg(long)]
        cs_change: bool,

        /// Delay after the transfer in microseconds
        #[arg(long, default_value_t = 0)]
        delay: u16,
    },

    /// Half-duplex read
    Read {
        #[command(flatten)]
        device: DeviceArgs,

        /// Number of bytes to read
        #[arg(short = 'n', long)]
        count: usize,

        /// Output file (prints hex to stdout if not specified)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Half-duplex write
    Write {
        #[command(flatten)]
        device: DeviceArgs,

        /// Bytes to write (hex)
        #[arg(long, value_parser = parse_hex_bytes, conflicts_with = "input", required_unless_present = "input")]
        data: Option<HexBytes>,

        /// Input file to write
        #[arg(short, long)]
        input: Option<PathBuf>,
    },

    /// Show the current device settings
    Info {
        /// spidev device node (e.g., /dev/spidev0.0)
        #[arg(short, long)]
        device: String,
    },

    /// Print spidev ioctl request numbers for this target
    Codes,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex_u32() {
        assert_eq!(parse_hex_u32("0x1E8480"), Ok(2_000_000));
        assert_eq!(parse_hex_u32("500000"), Ok(500_000));
        assert!(parse_hex_u32("fast").is_err());
    }

    #[test]
    fn test_parse_hex_bytes() {
        assert_eq!(parse_hex_bytes("9f000000"), Ok(HexBytes(vec![0x9f, 0, 0, 0])));
        assert_eq!(parse_hex_bytes("9F 01 02"), Ok(HexBytes(vec![0x9f, 1, 2])));
        assert_eq!(parse_hex_bytes("0x05,0x06"), Ok(HexBytes(vec![5, 6])));
        assert!(parse_hex_bytes("9").is_err());
        assert!(parse_hex_bytes("zz").is_err());
    }

    #[test]
    fn test_transfer_args() {
        let cli = Cli::try_parse_from([
            "spidevctl", "transfer", "-d", "/dev/spidev0.0", "--tx", "9f", "-n", "4", "--mode", "3",
        ])
        .unwrap();
        match cli.command {
            Commands::Transfer { device, tx, len, .. } => {
                assert_eq!(device.device, "/dev/spidev0.0");
                assert_eq!(device.mode, 3);
                assert_eq!(device.speed, 2_000_000);
                assert_eq!(tx, HexBytes(vec![0x9f]));
                assert_eq!(len, Some(4));
            }
            _ => panic!("expected transfer"),
        }
    }

    #[test]
    fn test_mode_out_of_range() {
        assert!(Cli::try_parse_from([
            "spidevctl", "transfer", "-d", "/dev/spidev0.0", "--tx", "9f", "--mode", "4",
        ])
        .is_err());
    }

    #[test]
    fn test_write_needs_data_or_input() {
        assert!(Cli::try_parse_from(["spidevctl", "write", "-d", "/dev/spidev0.0"]).is_err());
    }
}
