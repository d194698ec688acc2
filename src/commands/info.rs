//! Info and codes command implementations

use spidevctl_core::ioc;
use spidevctl_core::{OpenFlags, SpiModeFlags};
use spidevctl_linux::{max_transfer_size, open_flags_to_libc, LibcSyscalls, Spidev};

/// Show the device's current settings
pub fn run_info(device: &str) -> Result<(), Box<dyn std::error::Error>> {
    let spi = Spidev::attach(device, LibcSyscalls::new())?;

    let mode = spi.mode()?;
    println!("Device:        {}", spi.path());
    println!("Mode:          {} (flags {:#x})", mode.mode_number(), mode.bits());
    for (name, _) in mode.iter_names().filter(|(_, f)| !f.intersects(SpiModeFlags::MODE_3)) {
        println!("               {}", name);
    }
    println!("Bits per word: {}", spi.bits_per_word()?);
    println!("Max speed:     {} Hz", spi.max_speed_hz()?);
    println!("LSB first:     {}", spi.lsb_first()?);
    println!("Buffer size:   {} bytes", max_transfer_size());

    spi.close()?;
    Ok(())
}

/// Open flags and spidev request numbers for this target, in print order
pub fn code_rows() -> Vec<(String, u32)> {
    let mut rows: Vec<(String, u32)> = [("O_RDONLY", OpenFlags::RDONLY), ("O_RDWR", OpenFlags::RDWR)]
        .into_iter()
        .map(|(name, flags)| (name.to_string(), open_flags_to_libc(flags) as u32))
        .collect();

    let requests = [
        ("SPI_IOC_RD_MODE", ioc::SPI_IOC_RD_MODE),
        ("SPI_IOC_WR_MODE", ioc::SPI_IOC_WR_MODE),
        ("SPI_IOC_RD_MODE32", ioc::SPI_IOC_RD_MODE32),
        ("SPI_IOC_WR_MODE32", ioc::SPI_IOC_WR_MODE32),
        ("SPI_IOC_RD_LSB_FIRST", ioc::SPI_IOC_RD_LSB_FIRST),
        ("SPI_IOC_WR_LSB_FIRST", ioc::SPI_IOC_WR_LSB_FIRST),
        ("SPI_IOC_RD_BITS_PER_WORD", ioc::SPI_IOC_RD_BITS_PER_WORD),
        ("SPI_IOC_WR_BITS_PER_WORD", ioc::SPI_IOC_WR_BITS_PER_WORD),
        ("SPI_IOC_RD_MAX_SPEED_HZ", ioc::SPI_IOC_RD_MAX_SPEED_HZ),
        ("SPI_IOC_WR_MAX_SPEED_HZ", ioc::SPI_IOC_WR_MAX_SPEED_HZ),
    ];
    rows.extend(requests.into_iter().map(|(name, value)| (name.to_string(), value)));

    for n in 1..=3 {
        if let Some(value) = ioc::spi_ioc_message(n) {
            rows.push((format!("SPI_IOC_MESSAGE({})", n), value));
        }
    }
    rows
}

/// Print the open flags and spidev request numbers for this target
pub fn print_codes() {
    for (name, value) in code_rows() {
        println!("{:<26} = {:#010x} ({})", name, value, value);
    }
    println!(
        "{:<26} = {}",
        "max transfers per message",
        ioc::SPI_IOC_MESSAGE_MAX
    );
}
