//! SPI transfer descriptor
//!
//! [`TransferDescriptor`] mirrors the kernel's `struct spi_ioc_transfer`
//! (`linux/spi/spidev.h`). The kernel reads an array of these records when
//! handling `SPI_IOC_MESSAGE(n)`, so field order, widths and padding must
//! match the header exactly. A mismatch is not reported: it shows up as a
//! wrong clock, garbage buffer addresses or truncated transfers.
//!
//! Descriptors never own the buffers they point at. The lifetime parameter
//! keeps the borrowed transmit and receive buffers alive and unmoved for as
//! long as the descriptor exists.

use core::marker::PhantomData;

use zerocopy::{Immutable, IntoBytes};

use crate::errno::{ErrnoCode, Result};

/// In-memory record handed to the kernel
///
/// Buffer addresses are `__u64` in the current header regardless of pointer
/// width. `IntoBytes` refuses to derive if the compiler would insert any
/// padding, so the layout below is exactly what gets serialized.
#[repr(C)]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, IntoBytes, Immutable)]
struct SpiIocTransfer {
    tx_buf: u64,       // __u64 tx_buf
    rx_buf: u64,       // __u64 rx_buf
    len: u32,          // __u32 len
    speed_hz: u32,     // __u32 speed_hz
    delay_usecs: u16,  // __u16 delay_usecs
    bits_per_word: u8, // __u8 bits_per_word
    cs_change: u8,     // __u8 cs_change
    tx_nbits: u8,      // __u8 tx_nbits
    rx_nbits: u8,      // __u8 rx_nbits
    pad: u16,          // reserved, always zero
}

/// Size of one serialized `struct spi_ioc_transfer` in bytes
pub const SPI_IOC_TRANSFER_SIZE: usize = core::mem::size_of::<SpiIocTransfer>();

const _: () = assert!(SPI_IOC_TRANSFER_SIZE == 32);
const _: () = assert!(core::mem::align_of::<SpiIocTransfer>() == 8);

/// One segment of an SPI message
///
/// Segments of one batch run in order with chip select held asserted,
/// unless [`with_cs_change`](Self::with_cs_change) asks for it to be
/// released after a segment.
///
/// Not `Clone`: a copy would let two segments of one batch write the same
/// receive buffer.
///
/// ```compile_fail
/// use spidevctl_core::TransferDescriptor;
///
/// let mut rx = [0u8; 4];
/// let desc = TransferDescriptor::read(&mut rx).unwrap();
/// let _twice = [desc.clone(), desc];
/// ```
#[derive(Debug)]
pub struct TransferDescriptor<'a> {
    raw: SpiIocTransfer,
    _buffers: PhantomData<&'a mut [u8]>,
}

impl<'a> TransferDescriptor<'a> {
    /// Size of one serialized descriptor in bytes
    pub const SIZE: usize = SPI_IOC_TRANSFER_SIZE;

    /// Describe a transfer over optional transmit and receive buffers
    ///
    /// When both are given they must have the same length, since the bus
    /// clocks both directions together. A transfer with neither buffer
    /// clocks zero bytes.
    ///
    /// # Errors
    ///
    /// Returns [`ErrnoCode::InvalidArgument`] if the buffer lengths differ
    /// or the length does not fit in 32 bits.
    pub fn new(tx: Option<&'a [u8]>, rx: Option<&'a mut [u8]>) -> Result<Self> {
        let len = match (&tx, &rx) {
            (Some(tx), Some(rx)) if tx.len() != rx.len() => {
                return Err(ErrnoCode::InvalidArgument)
            }
            (Some(tx), _) => tx.len(),
            (None, Some(rx)) => rx.len(),
            (None, None) => 0,
        };
        let len = u32::try_from(len).map_err(|_| ErrnoCode::InvalidArgument)?;

        // Zero-length transfers carry no addresses
        let (tx_buf, rx_buf) = if len == 0 {
            (0, 0)
        } else {
            (
                tx.map_or(0, |b| b.as_ptr() as u64),
                rx.map_or(0, |b| b.as_mut_ptr() as u64),
            )
        };

        Ok(Self {
            raw: SpiIocTransfer {
                tx_buf,
                rx_buf,
                len,
                ..Default::default()
            },
            _buffers: PhantomData,
        })
    }

    /// Transmit-only transfer
    pub fn write(tx: &'a [u8]) -> Result<Self> {
        Self::new(Some(tx), None)
    }

    /// Receive-only transfer
    pub fn read(rx: &'a mut [u8]) -> Result<Self> {
        Self::new(None, Some(rx))
    }

    /// Full-duplex transfer: `tx` is shifted out while `rx` is filled
    pub fn full_duplex(tx: &'a [u8], rx: &'a mut [u8]) -> Result<Self> {
        Self::new(Some(tx), Some(rx))
    }

    /// Build a descriptor from raw addresses
    ///
    /// # Safety
    ///
    /// A nonzero `tx_buf` must point to `len` readable bytes and a nonzero
    /// `rx_buf` to `len` writable bytes, both valid and not otherwise
    /// accessed for as long as the descriptor (lifetime `'a`) is in use.
    pub unsafe fn from_raw_parts(tx_buf: u64, rx_buf: u64, len: u32) -> Self {
        Self {
            raw: SpiIocTransfer {
                tx_buf,
                rx_buf,
                len,
                ..Default::default()
            },
            _buffers: PhantomData,
        }
    }

    /// Override the clock speed for this transfer (0 = device default)
    pub fn with_speed_hz(mut self, speed_hz: u32) -> Self {
        self.raw.speed_hz = speed_hz;
        self
    }

    /// Delay after this transfer before the next one or CS change
    pub fn with_delay_usecs(mut self, delay_usecs: u16) -> Self {
        self.raw.delay_usecs = delay_usecs;
        self
    }

    /// Override the word size for this transfer (0 = device default)
    pub fn with_bits_per_word(mut self, bits_per_word: u8) -> Self {
        self.raw.bits_per_word = bits_per_word;
        self
    }

    /// Deassert chip select after this transfer
    pub fn with_cs_change(mut self, cs_change: bool) -> Self {
        self.raw.cs_change = cs_change as u8;
        self
    }

    /// Number of data lines used to transmit (0 or 1 = single)
    pub fn with_tx_nbits(mut self, nbits: u8) -> Self {
        self.raw.tx_nbits = nbits;
        self
    }

    /// Number of data lines used to receive (0 or 1 = single)
    pub fn with_rx_nbits(mut self, nbits: u8) -> Self {
        self.raw.rx_nbits = nbits;
        self
    }

    /// Transmit buffer address, 0 if nothing is sent
    pub fn tx_buf(&self) -> u64 {
        self.raw.tx_buf
    }

    /// Receive buffer address, 0 if nothing is received
    pub fn rx_buf(&self) -> u64 {
        self.raw.rx_buf
    }

    /// Transfer length in bytes
    pub fn len(&self) -> u32 {
        self.raw.len
    }

    /// Returns true if the transfer clocks no bytes
    pub fn is_empty(&self) -> bool {
        self.raw.len == 0
    }

    /// Clock speed override in Hz
    pub fn speed_hz(&self) -> u32 {
        self.raw.speed_hz
    }

    /// Post-transfer delay in microseconds
    pub fn delay_usecs(&self) -> u16 {
        self.raw.delay_usecs
    }

    /// Word size override
    pub fn bits_per_word(&self) -> u8 {
        self.raw.bits_per_word
    }

    /// Whether chip select is released after this transfer
    pub fn cs_change(&self) -> bool {
        self.raw.cs_change != 0
    }

    /// Transmit bus width
    pub fn tx_nbits(&self) -> u8 {
        self.raw.tx_nbits
    }

    /// Receive bus width
    pub fn rx_nbits(&self) -> u8 {
        self.raw.rx_nbits
    }

    /// Serialize into the kernel's native-endian layout
    pub fn byte_layout(&self) -> [u8; SPI_IOC_TRANSFER_SIZE] {
        let mut out = [0u8; SPI_IOC_TRANSFER_SIZE];
        out.copy_from_slice(self.raw.as_bytes());
        out
    }
}

/// Serialize a batch into the contiguous array `SPI_IOC_MESSAGE(n)` reads
#[cfg(feature = "alloc")]
pub fn serialize_batch(descriptors: &[TransferDescriptor<'_>]) -> alloc::vec::Vec<u8> {
    let mut buf = alloc::vec::Vec::with_capacity(descriptors.len() * SPI_IOC_TRANSFER_SIZE);
    for desc in descriptors {
        buf.extend_from_slice(desc.raw.as_bytes());
    }
    buf
}
