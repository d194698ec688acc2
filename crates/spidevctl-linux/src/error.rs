//! Error types for spidev device operations

use spidevctl_core::ErrnoCode;
use thiserror::Error;

/// Errors from opening, configuring and driving a [`Spidev`](crate::Spidev)
#[derive(Debug, Error)]
pub enum SpidevError {
    /// Failed to open device
    #[error("Failed to open {path}: {source}")]
    OpenFailed {
        path: String,
        #[source]
        source: ErrnoCode,
    },

    /// Failed to set SPI mode
    #[error("Failed to set SPI mode to {mode:#x}: {source}")]
    SetModeFailed {
        mode: u32,
        #[source]
        source: ErrnoCode,
    },

    /// Failed to set bit order
    #[error("Failed to set LSB-first to {lsb_first}: {source}")]
    SetLsbFirstFailed {
        lsb_first: bool,
        #[source]
        source: ErrnoCode,
    },

    /// Failed to set bits per word
    #[error("Failed to set bits per word to {bits}: {source}")]
    SetBitsPerWordFailed {
        bits: u8,
        #[source]
        source: ErrnoCode,
    },

    /// Failed to set clock speed
    #[error("Failed to set clock speed to {speed} Hz: {source}")]
    SetSpeedFailed {
        speed: u32,
        #[source]
        source: ErrnoCode,
    },

    /// Failed to read back a device setting
    #[error("Failed to read {setting}: {source}")]
    QueryFailed {
        setting: &'static str,
        #[source]
        source: ErrnoCode,
    },

    /// SPI transfer failed
    #[error("SPI transfer failed: {0}")]
    TransferFailed(#[source] ErrnoCode),

    /// Half-duplex read failed
    #[error("Read of {len} bytes failed: {source}")]
    ReadFailed {
        len: usize,
        #[source]
        source: ErrnoCode,
    },

    /// Half-duplex write failed
    #[error("Write of {len} bytes failed: {source}")]
    WriteFailed {
        len: usize,
        #[source]
        source: ErrnoCode,
    },

    /// Failed to close device
    #[error("Failed to close device: {0}")]
    CloseFailed(#[source] ErrnoCode),

    /// Invalid parameter
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Device not specified
    #[error("No device specified. Use dev=/dev/spidevX.Y")]
    NoDevice,
}

impl SpidevError {
    /// The errno behind this error, if it came from the kernel
    pub fn errno(&self) -> Option<ErrnoCode> {
        match self {
            Self::OpenFailed { source, .. }
            | Self::SetModeFailed { source, .. }
            | Self::SetLsbFirstFailed { source, .. }
            | Self::SetBitsPerWordFailed { source, .. }
            | Self::SetSpeedFailed { source, .. }
            | Self::QueryFailed { source, .. }
            | Self::ReadFailed { source, .. }
            | Self::WriteFailed { source, .. } => Some(*source),
            Self::TransferFailed(source) | Self::CloseFailed(source) => Some(*source),
            Self::InvalidParameter(_) | Self::NoDevice => None,
        }
    }
}

/// Result type for spidev device operations
pub type Result<T> = std::result::Result<T, SpidevError>;
