//! spidevctl-core - Kernel ABI types for Linux spidev transfers
//!
//! This crate defines the pieces of the spidev user-space interface that are
//! fixed by the kernel headers rather than by us: the binary layout of
//! `struct spi_ioc_transfer`, the `SPI_IOC_*` request numbers, the `open(2)`
//! flag values and the errno codes a device driver hands back. It performs
//! no I/O and is `no_std` compatible.
//!
//! # Features
//!
//! - `std` - Implement `std::error::Error` for [`ErrnoCode`] (includes `alloc`)
//! - `alloc` - Enable [`transfer::serialize_batch`]
//!
//! # Example
//!
//! ```
//! use spidevctl_core::transfer::TransferDescriptor;
//! use spidevctl_core::ioc;
//!
//! let cmd = [0x9Fu8, 0, 0, 0];
//! let mut id = [0u8; 4];
//! let xfer = TransferDescriptor::full_duplex(&cmd, &mut id)?
//!     .with_speed_hz(1_000_000)
//!     .with_bits_per_word(8);
//!
//! assert_eq!(xfer.byte_layout().len(), TransferDescriptor::SIZE);
//! assert!(ioc::spi_ioc_message(1).is_some());
//! # Ok::<(), spidevctl_core::ErrnoCode>(())
//! ```

#![no_std]
#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

#[cfg(feature = "alloc")]
extern crate alloc;

#[cfg(feature = "std")]
extern crate std;

pub mod errno;
pub mod flags;
pub mod ioc;
pub mod transfer;

pub use errno::{ErrnoCode, Result};
pub use flags::{OpenFlags, SpiModeFlags};
pub use transfer::TransferDescriptor;
