//! Flag sets whose bit values are dictated by the Linux ABI

use bitflags::bitflags;

bitflags! {
    /// Flags for `open(2)`
    ///
    /// Values are the `asm-generic/fcntl.h` constants used by x86, arm,
    /// aarch64 and riscv. A few architectures (mips, sparc, powerpc, alpha)
    /// number the non-access-mode flags differently, so the syscall layer
    /// maps each flag to its libc value rather than passing `bits()` through.
    /// The access mode occupies the low two bits, so `RDONLY` is the empty
    /// set and exactly one of `RDONLY`, `WRONLY` or `RDWR` should be chosen.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct OpenFlags: u32 {
        /// Open for reading only
        const RDONLY = 0x0;
        /// Open for writing only
        const WRONLY = 0x1;
        /// Open for reading and writing
        const RDWR = 0x2;
        /// Non-blocking mode
        const NONBLOCK = 0x800;
        /// Append on each write (`0o2000`; `0x2000` would be `O_ASYNC`)
        const APPEND = 0x400;
        /// Close on exec
        const CLOEXEC = 0x80000;
    }
}

impl OpenFlags {
    /// Mask of the access-mode bits
    pub const ACCMODE: u32 = 0x3;

    /// Returns true if the access mode permits reading
    pub const fn readable(&self) -> bool {
        matches!(self.bits() & Self::ACCMODE, 0x0 | 0x2)
    }

    /// Returns true if the access mode permits writing
    pub const fn writable(&self) -> bool {
        matches!(self.bits() & Self::ACCMODE, 0x1 | 0x2)
    }
}

impl Default for OpenFlags {
    fn default() -> Self {
        Self::RDWR
    }
}

bitflags! {
    /// SPI mode bits from `linux/spi/spi.h`
    ///
    /// The low byte is what `SPI_IOC_WR_MODE` accepts; anything above needs
    /// `SPI_IOC_WR_MODE32`.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct SpiModeFlags: u32 {
        /// Clock phase
        const CPHA = 0x01;
        /// Clock polarity
        const CPOL = 0x02;
        /// Chip select active high
        const CS_HIGH = 0x04;
        /// Least significant bit first
        const LSB_FIRST = 0x08;
        /// SI/SO signals shared
        const THREE_WIRE = 0x10;
        /// Loopback mode
        const LOOP = 0x20;
        /// No chip select
        const NO_CS = 0x40;
        /// Slave pulls low to pause
        const READY = 0x80;
        /// Transmit with 2 wires
        const TX_DUAL = 0x100;
        /// Transmit with 4 wires
        const TX_QUAD = 0x200;
        /// Receive with 2 wires
        const RX_DUAL = 0x400;
        /// Receive with 4 wires
        const RX_QUAD = 0x800;
        /// Toggle chip select after each word
        const CS_WORD = 0x1000;
        /// Transmit with 8 wires
        const TX_OCTAL = 0x2000;
        /// Receive with 8 wires
        const RX_OCTAL = 0x4000;
        /// High impedance turnaround
        const THREE_WIRE_HIZ = 0x8000;
    }
}

impl Default for SpiModeFlags {
    fn default() -> Self {
        Self::MODE_0
    }
}

impl SpiModeFlags {
    /// SPI mode 0: CPOL=0, CPHA=0
    pub const MODE_0: Self = Self::empty();
    /// SPI mode 1: CPOL=0, CPHA=1
    pub const MODE_1: Self = Self::CPHA;
    /// SPI mode 2: CPOL=1, CPHA=0
    pub const MODE_2: Self = Self::CPOL;
    /// SPI mode 3: CPOL=1, CPHA=1
    pub const MODE_3: Self = Self::CPOL.union(Self::CPHA);

    /// Build the clock mode (0-3) with no other bits set
    pub const fn from_mode_number(mode: u8) -> Option<Self> {
        match mode {
            0 => Some(Self::MODE_0),
            1 => Some(Self::MODE_1),
            2 => Some(Self::MODE_2),
            3 => Some(Self::MODE_3),
            _ => None,
        }
    }

    /// Clock mode number (0-3) encoded by CPOL and CPHA
    pub const fn mode_number(&self) -> u8 {
        (self.bits() & 0x3) as u8
    }

    /// Returns true if the flags fit the 8-bit mode request
    pub const fn fits_u8(&self) -> bool {
        self.bits() <= 0xff
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_flag_values() {
        assert_eq!(OpenFlags::RDONLY.bits(), 0x0);
        assert_eq!(OpenFlags::WRONLY.bits(), 0x1);
        assert_eq!(OpenFlags::RDWR.bits(), 0x2);
        assert_eq!(OpenFlags::APPEND.bits(), 0o2000);
        assert_eq!(OpenFlags::NONBLOCK.bits(), 0o4000);
        assert_eq!(OpenFlags::CLOEXEC.bits(), 0o2000000);
    }

    #[test]
    fn test_access_mode() {
        assert!(OpenFlags::RDONLY.readable());
        assert!(!OpenFlags::RDONLY.writable());
        assert!(!OpenFlags::WRONLY.readable());
        assert!(OpenFlags::WRONLY.writable());
        assert!((OpenFlags::RDWR | OpenFlags::APPEND).readable());
        assert!((OpenFlags::RDWR | OpenFlags::APPEND).writable());
    }

    #[test]
    fn test_mode_numbers() {
        for n in 0..4u8 {
            let mode = SpiModeFlags::from_mode_number(n).unwrap();
            assert_eq!(mode.mode_number(), n);
        }
        assert_eq!(SpiModeFlags::from_mode_number(4), None);
        assert_eq!(SpiModeFlags::MODE_3.bits(), 0x3);
    }

    #[test]
    fn test_mode_width() {
        assert!((SpiModeFlags::MODE_3 | SpiModeFlags::READY).fits_u8());
        assert!(!(SpiModeFlags::MODE_0 | SpiModeFlags::TX_QUAD).fits_u8());
    }
}
