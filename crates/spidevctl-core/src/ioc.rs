//! ioctl request numbers for spidev
//!
//! Request numbers pack a direction, a type ("magic") byte, a command number
//! and the argument size, following the `_IOC` macro in
//! `asm-generic/ioctl.h`. A handful of architectures use a narrower size
//! field and different direction bits.

use crate::transfer::SPI_IOC_TRANSFER_SIZE;

#[cfg(any(
    target_arch = "mips",
    target_arch = "mips64",
    target_arch = "sparc",
    target_arch = "sparc64",
    target_arch = "powerpc",
    target_arch = "powerpc64",
))]
mod arch {
    pub const IOC_SIZEBITS: u32 = 13;
    /// Direction bits for a read request
    pub const IOC_READ: u32 = 2;
    /// Direction bits for a write request
    pub const IOC_WRITE: u32 = 4;
}

#[cfg(not(any(
    target_arch = "mips",
    target_arch = "mips64",
    target_arch = "sparc",
    target_arch = "sparc64",
    target_arch = "powerpc",
    target_arch = "powerpc64",
)))]
mod arch {
    pub const IOC_SIZEBITS: u32 = 14;
    /// Direction bits for a read request
    pub const IOC_READ: u32 = 2;
    /// Direction bits for a write request
    pub const IOC_WRITE: u32 = 1;
}

pub use arch::{IOC_READ, IOC_WRITE};

const IOC_NRBITS: u32 = 8;
const IOC_TYPEBITS: u32 = 8;

const IOC_NRSHIFT: u32 = 0;
const IOC_TYPESHIFT: u32 = IOC_NRSHIFT + IOC_NRBITS;
const IOC_SIZESHIFT: u32 = IOC_TYPESHIFT + IOC_TYPEBITS;
const IOC_DIRSHIFT: u32 = IOC_SIZESHIFT + arch::IOC_SIZEBITS;

/// Largest argument size the size field can encode on this architecture
pub const IOC_SIZE_MAX: usize = (1 << arch::IOC_SIZEBITS) - 1;

/// spidev ioctl type byte
pub const SPI_IOC_MAGIC: u8 = b'k';

const SPI_IOC_NR_MESSAGE: u8 = 0;
const SPI_IOC_NR_MODE: u8 = 1;
const SPI_IOC_NR_LSB_FIRST: u8 = 2;
const SPI_IOC_NR_BITS_PER_WORD: u8 = 3;
const SPI_IOC_NR_MAX_SPEED_HZ: u8 = 4;
const SPI_IOC_NR_MODE32: u8 = 5;

/// Encode a request number, as `_IOC(dir, type, nr, size)`
pub const fn ioc(dir: u32, ty: u8, nr: u8, size: usize) -> u32 {
    (dir << IOC_DIRSHIFT)
        | ((ty as u32) << IOC_TYPESHIFT)
        | ((nr as u32) << IOC_NRSHIFT)
        | ((size as u32) << IOC_SIZESHIFT)
}

const fn ior(nr: u8, size: usize) -> u32 {
    ioc(IOC_READ, SPI_IOC_MAGIC, nr, size)
}

const fn iow(nr: u8, size: usize) -> u32 {
    ioc(IOC_WRITE, SPI_IOC_MAGIC, nr, size)
}

/// Read SPI mode (8-bit)
pub const SPI_IOC_RD_MODE: u32 = ior(SPI_IOC_NR_MODE, 1);
/// Write SPI mode (8-bit)
pub const SPI_IOC_WR_MODE: u32 = iow(SPI_IOC_NR_MODE, 1);
/// Read bit order
pub const SPI_IOC_RD_LSB_FIRST: u32 = ior(SPI_IOC_NR_LSB_FIRST, 1);
/// Write bit order
pub const SPI_IOC_WR_LSB_FIRST: u32 = iow(SPI_IOC_NR_LSB_FIRST, 1);
/// Read word size
pub const SPI_IOC_RD_BITS_PER_WORD: u32 = ior(SPI_IOC_NR_BITS_PER_WORD, 1);
/// Write word size
pub const SPI_IOC_WR_BITS_PER_WORD: u32 = iow(SPI_IOC_NR_BITS_PER_WORD, 1);
/// Read default max clock speed
pub const SPI_IOC_RD_MAX_SPEED_HZ: u32 = ior(SPI_IOC_NR_MAX_SPEED_HZ, 4);
/// Write default max clock speed
pub const SPI_IOC_WR_MAX_SPEED_HZ: u32 = iow(SPI_IOC_NR_MAX_SPEED_HZ, 4);
/// Read SPI mode (32-bit)
pub const SPI_IOC_RD_MODE32: u32 = ior(SPI_IOC_NR_MODE32, 4);
/// Write SPI mode (32-bit)
pub const SPI_IOC_WR_MODE32: u32 = iow(SPI_IOC_NR_MODE32, 4);

/// Largest number of transfers one `SPI_IOC_MESSAGE` can carry here
pub const SPI_IOC_MESSAGE_MAX: usize = IOC_SIZE_MAX / SPI_IOC_TRANSFER_SIZE;

/// Request number for `SPI_IOC_MESSAGE(n)`
///
/// The argument size is `n * sizeof(struct spi_ioc_transfer)`, so the request
/// number changes with the batch length. Returns `None` when the batch does
/// not fit the size field.
pub const fn spi_ioc_message(n: usize) -> Option<u32> {
    if n > SPI_IOC_MESSAGE_MAX {
        return None;
    }
    Some(iow(SPI_IOC_NR_MESSAGE, n * SPI_IOC_TRANSFER_SIZE))
}
