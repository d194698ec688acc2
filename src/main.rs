//! spidevctl - Linux spidev transfer tool
//!
//! Drives SPI peripherals through the kernel's spidev character devices:
//! full-duplex messages, raw half-duplex reads and writes, and inspection of
//! the device's current mode, word size and clock.

mod cli;
mod commands;

use clap::Parser;
use cli::{Cli, Commands, DeviceArgs};
use spidevctl_core::SpiModeFlags;
use spidevctl_linux::{Spidev, SpidevConfig};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    // Set log level based on verbosity
    match cli.verbose {
        0 => {} // default (info)
        1 => log::set_max_level(log::LevelFilter::Debug),
        _ => log::set_max_level(log::LevelFilter::Trace),
    }

    match cli.command {
        Commands::Transfer {
            device,
            tx,
            len,
            cs_change,
            delay,
        } => {
            let mut spi = open_device(&device)?;
            commands::transfer::run_transfer(&mut spi, &tx.0, len, cs_change, delay)
        }
        Commands::Read {
            device,
            count,
            output,
        } => {
            let mut spi = open_device(&device)?;
            commands::transfer::run_read(&mut spi, count, output.as_deref())
        }
        Commands::Write {
            device,
            data,
            input,
        } => {
            let payload = match (data, input) {
                (Some(data), _) => data.0,
                (None, Some(path)) => std::fs::read(&path)?,
                (None, None) => return Err("Either --data or --input is required".into()),
            };
            let mut spi = open_device(&device)?;
            commands::transfer::run_write(&mut spi, &payload)
        }
        Commands::Info { device } => commands::info::run_info(&device),
        Commands::Codes => {
            commands::info::print_codes();
            Ok(())
        }
    }
}

/// Open and configure the device named on the command line
fn open_device(args: &DeviceArgs) -> Result<Spidev, Box<dyn std::error::Error>> {
    let mode = SpiModeFlags::from_mode_number(args.mode)
        .ok_or_else(|| format!("Invalid SPI mode: {} (must be 0-3)", args.mode))?;
    let config = SpidevConfig::new(args.device.as_str())
        .with_speed(args.speed)
        .with_mode(mode)
        .with_bits_per_word(args.bits);
    Ok(Spidev::open(&config)?)
}
