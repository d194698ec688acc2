//! Transfer, read and write command implementations

use indicatif::{ProgressBar, ProgressStyle};
use spidevctl_core::TransferDescriptor;
use spidevctl_linux::{max_transfer_size, Spidev};
use std::fs::File;
use std::io::Write;
use std::path::Path;

use super::format_hex;

/// Run one full-duplex transfer and print what came back
pub fn run_transfer(
    spi: &mut Spidev,
    tx: &[u8],
    len: Option<usize>,
    cs_change: bool,
    delay_usecs: u16,
) -> Result<(), Box<dyn std::error::Error>> {
    let len = len.unwrap_or(tx.len()).max(tx.len());
    if len == 0 {
        return Err("Nothing to transfer".into());
    }

    let limit = max_transfer_size();
    if len > limit {
        return Err(format!("Transfer of {} bytes exceeds spidev buffer ({} bytes)", len, limit).into());
    }

    // Clock zeros once tx runs out
    let mut out = tx.to_vec();
    out.resize(len, 0);
    let mut rx = vec![0u8; len];

    {
        let desc = TransferDescriptor::full_duplex(&out, &mut rx)?
            .with_cs_change(cs_change)
            .with_delay_usecs(delay_usecs);
        spi.transfer(&[desc])?;
    }

    println!("TX: {}", format_hex(&out));
    println!("RX: {}", format_hex(&rx));
    Ok(())
}

/// Read `count` bytes, in chunks the driver can buffer
pub fn run_read(
    spi: &mut Spidev,
    count: usize,
    output: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let chunk_size = max_transfer_size();
    let mut data = vec![0u8; count];

    let pb = ProgressBar::new(count as u64);
    if output.is_some() {
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({bytes_per_sec}, {eta})")?
                .progress_chars("#>-"),
        );
    } else {
        pb.set_draw_target(indicatif::ProgressDrawTarget::hidden());
    }

    let mut offset = 0usize;
    while offset < count {
        let end = std::cmp::min(offset + chunk_size, count);
        let n = spi.read(&mut data[offset..end])?;
        if n == 0 {
            pb.abandon();
            return Err(format!("Device returned no data at offset {}", offset).into());
        }
        offset += n;
        pb.set_position(offset as u64);
    }
    pb.finish_with_message("Read complete");

    match output {
        Some(path) => {
            let mut file = File::create(path)?;
            file.write_all(&data)?;
            println!("Wrote {} bytes to {:?}", data.len(), path);
        }
        None => println!("{}", format_hex(&data)),
    }
    Ok(())
}

/// Write `data`, in chunks the driver can buffer
pub fn run_write(spi: &mut Spidev, data: &[u8]) -> Result<(), Box<dyn std::error::Error>> {
    let chunk_size = max_transfer_size();
    let mut offset = 0usize;
    while offset < data.len() {
        let end = std::cmp::min(offset + chunk_size, data.len());
        let n = spi.write(&data[offset..end])?;
        if n == 0 {
            return Err(format!("Device accepted no data at offset {}", offset).into());
        }
        offset += n;
    }
    println!("Wrote {} bytes to {}", data.len(), spi.path());
    Ok(())
}
