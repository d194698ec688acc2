//! spidevctl-linux - Linux spidev device access
//!
//! This crate drives SPI controllers exposed by the kernel's spidev driver
//! as `/dev/spidevX.Y` character devices, where X is the bus number and Y
//! the chip select.
//!
//! # Layers
//!
//! - [`syscall`] - [`Syscalls`] gateway over `open`, `close`, `read`,
//!   `write` and `ioctl`, with errno captured right after each call
//! - [`executor`] - [`TransferExecutor`], the open/transfer/close lifecycle
//!   over raw [`DeviceHandle`]s
//! - [`device`] - [`Spidev`], an owned device with mode, word size and clock
//!   configuration applied at open
//!
//! # Example
//!
//! ```no_run
//! use spidevctl_linux::{Spidev, SpidevConfig};
//! use spidevctl_core::{SpiModeFlags, TransferDescriptor};
//!
//! let config = SpidevConfig::new("/dev/spidev0.0")
//!     .with_speed(4_000_000)
//!     .with_mode(SpiModeFlags::MODE_0);
//! let mut spi = Spidev::open(&config)?;
//!
//! // Read JEDEC ID: opcode out, three bytes back, CS held across both
//! let cmd = [0x9Fu8];
//! let mut id = [0u8; 3];
//! spi.transfer(&[
//!     TransferDescriptor::write(&cmd)?,
//!     TransferDescriptor::read(&mut id)?,
//! ])?;
//! println!("JEDEC ID: {:02X} {:02X} {:02X}", id[0], id[1], id[2]);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # Thread safety
//!
//! Every call blocks until the kernel finishes. A handle must not be used
//! from several threads at once without external locking: the driver
//! serializes bus access, but batches from overlapping calls may interleave.
//!
//! # System Requirements
//!
//! - Linux kernel with spidev support enabled (`CONFIG_SPI_SPIDEV`)
//! - Read/write access to `/dev/spidevX.Y`, usually via the `spi` group or
//!   a udev rule

pub mod device;
pub mod error;
pub mod executor;
pub mod syscall;

#[cfg(test)]
mod testing;

// Re-exports
pub use device::{max_transfer_size, parse_options, Spidev, SpidevConfig};
pub use error::{Result, SpidevError};
pub use executor::TransferExecutor;
pub use syscall::{open_flags_to_libc, DeviceHandle, IoctlRequest, LibcSyscalls, Syscalls};
