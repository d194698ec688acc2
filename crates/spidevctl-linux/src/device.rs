//! Configured spidev device
//!
//! [`Spidev`] owns an open spidev handle, applies mode, word size and clock
//! speed when it opens, and closes the handle when dropped.

use std::ffi::c_void;

use log::{debug, info, warn};
use spidevctl_core::ioc;
use spidevctl_core::{ErrnoCode, SpiModeFlags, TransferDescriptor};

use crate::error::{Result, SpidevError};
use crate::executor::TransferExecutor;
use crate::syscall::{DeviceHandle, IoctlRequest, LibcSyscalls, Syscalls};

/// Path to kernel spidev buffer size parameter
const BUF_SIZE_SYSFS: &str = "/sys/module/spidev/parameters/bufsiz";

/// Default SPI clock speed in Hz (2 MHz)
const DEFAULT_SPEED_HZ: u32 = 2_000_000;

/// Default word size
const DEFAULT_BITS_PER_WORD: u8 = 8;

/// Configuration for opening a spidev device
#[derive(Debug, Clone)]
pub struct SpidevConfig {
    /// Device path (e.g., "/dev/spidev0.0")
    pub device: String,
    /// SPI clock speed in Hz (default: 2 MHz)
    pub speed_hz: u32,
    /// SPI mode bits (default: mode 0)
    pub mode: SpiModeFlags,
    /// Bits per word (default: 8)
    pub bits_per_word: u8,
}

impl Default for SpidevConfig {
    fn default() -> Self {
        Self {
            device: String::new(),
            speed_hz: DEFAULT_SPEED_HZ,
            mode: SpiModeFlags::MODE_0,
            bits_per_word: DEFAULT_BITS_PER_WORD,
        }
    }
}

impl SpidevConfig {
    /// Create a new configuration with the given device path
    pub fn new(device: impl Into<String>) -> Self {
        Self {
            device: device.into(),
            ..Default::default()
        }
    }

    /// Set the SPI clock speed in Hz
    pub fn with_speed(mut self, speed_hz: u32) -> Self {
        self.speed_hz = speed_hz;
        self
    }

    /// Set the SPI mode bits
    pub fn with_mode(mut self, mode: SpiModeFlags) -> Self {
        self.mode = mode;
        self
    }

    /// Set the word size
    pub fn with_bits_per_word(mut self, bits: u8) -> Self {
        self.bits_per_word = bits;
        self
    }
}

/// An open, configured spidev device
///
/// Bus operations take `&mut self`, so one `Spidev` cannot run overlapping
/// messages. Share it across threads behind a lock.
pub struct Spidev<S: Syscalls = LibcSyscalls> {
    executor: TransferExecutor<S>,
    handle: Option<DeviceHandle>,
    path: String,
}

impl Spidev<LibcSyscalls> {
    /// Open a spidev device with the given configuration
    pub fn open(config: &SpidevConfig) -> Result<Self> {
        Self::open_with(config, LibcSyscalls::new())
    }

    /// Open a device with default settings
    pub fn open_device(device: &str) -> Result<Self> {
        Self::open(&SpidevConfig::new(device))
    }
}

impl<S: Syscalls> Spidev<S> {
    /// Open a device without touching its current settings
    pub fn attach(device: &str, syscalls: S) -> Result<Self> {
        if device.is_empty() {
            return Err(SpidevError::NoDevice);
        }

        let executor = TransferExecutor::with_syscalls(syscalls);
        let handle = executor
            .open(device)
            .map_err(|source| SpidevError::OpenFailed {
                path: device.to_string(),
                source,
            })?;

        Ok(Self {
            executor,
            handle: Some(handle),
            path: device.to_string(),
        })
    }

    /// Open through an explicit syscall gateway
    pub fn open_with(config: &SpidevConfig, syscalls: S) -> Result<Self> {
        if config.device.is_empty() {
            return Err(SpidevError::NoDevice);
        }

        debug!("spidev: Opening device {}", config.device);

        // From here on Drop closes the handle if configuration fails
        let mut spi = Self::attach(&config.device, syscalls)?;

        spi.set_mode(config.mode)?;
        spi.set_bits_per_word(config.bits_per_word)?;
        spi.set_speed(config.speed_hz)?;

        info!(
            "spidev: Opened {} (mode={}, bits={}, speed={} kHz)",
            config.device,
            config.mode.mode_number(),
            config.bits_per_word,
            config.speed_hz / 1000
        );

        Ok(spi)
    }

    /// Device path this handle was opened from
    pub fn path(&self) -> &str {
        &self.path
    }

    /// The raw handle, [`DeviceHandle::INVALID`] once closed
    pub fn handle(&self) -> DeviceHandle {
        self.handle.unwrap_or(DeviceHandle::INVALID)
    }

    /// Run a batch of transfers as one SPI message
    pub fn transfer(&mut self, descriptors: &[TransferDescriptor<'_>]) -> Result<()> {
        self.executor
            .transfer(self.handle(), descriptors)
            .map_err(SpidevError::TransferFailed)
    }

    /// Shift out `tx` while capturing the same number of bytes into `rx`
    pub fn transfer_full_duplex(&mut self, tx: &[u8], rx: &mut [u8]) -> Result<()> {
        let (tx_len, rx_len) = (tx.len(), rx.len());
        if tx_len != rx_len {
            return Err(SpidevError::InvalidParameter(format!(
                "tx and rx lengths differ ({} vs {})",
                tx_len, rx_len
            )));
        }
        let desc = TransferDescriptor::full_duplex(tx, rx).map_err(|source| {
            SpidevError::InvalidParameter(format!(
                "cannot describe a {} byte transfer: {}",
                tx_len, source
            ))
        })?;
        self.transfer(&[desc])
    }

    /// Half-duplex read, returns the number of bytes read
    pub fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        let len = buf.len();
        self.executor
            .read(self.handle(), buf)
            .map_err(|source| SpidevError::ReadFailed { len, source })
    }

    /// Half-duplex write, returns the number of bytes written
    pub fn write(&mut self, buf: &[u8]) -> Result<usize> {
        self.executor
            .write(self.handle(), buf)
            .map_err(|source| SpidevError::WriteFailed {
                len: buf.len(),
                source,
            })
    }

    /// Current SPI mode bits
    ///
    /// Uses the 32-bit request and falls back to the 8-bit one on kernels
    /// that do not know it.
    pub fn mode(&self) -> Result<SpiModeFlags> {
        let raw = match self.ioctl_read::<u32>(ioc::SPI_IOC_RD_MODE32) {
            Ok(mode) => mode,
            Err(ErrnoCode::InappropriateIoctl) | Err(ErrnoCode::InvalidArgument) => {
                u32::from(self.ioctl_read::<u8>(ioc::SPI_IOC_RD_MODE).map_err(|source| {
                    SpidevError::QueryFailed {
                        setting: "SPI mode",
                        source,
                    }
                })?)
            }
            Err(source) => {
                return Err(SpidevError::QueryFailed {
                    setting: "SPI mode",
                    source,
                })
            }
        };
        Ok(SpiModeFlags::from_bits_retain(raw))
    }

    /// Set the SPI mode bits
    pub fn set_mode(&mut self, mode: SpiModeFlags) -> Result<()> {
        let ret = if mode.fits_u8() {
            self.ioctl_write(ioc::SPI_IOC_WR_MODE, mode.bits() as u8)
        } else {
            self.ioctl_write(ioc::SPI_IOC_WR_MODE32, mode.bits())
        };
        ret.map_err(|source| SpidevError::SetModeFailed {
            mode: mode.bits(),
            source,
        })?;
        debug!("spidev: Set mode to {:#x}", mode.bits());
        Ok(())
    }

    /// Current default word size
    pub fn bits_per_word(&self) -> Result<u8> {
        self.ioctl_read::<u8>(ioc::SPI_IOC_RD_BITS_PER_WORD)
            .map_err(|source| SpidevError::QueryFailed {
                setting: "bits per word",
                source,
            })
    }

    /// Set the default word size
    pub fn set_bits_per_word(&mut self, bits: u8) -> Result<()> {
        self.ioctl_write(ioc::SPI_IOC_WR_BITS_PER_WORD, bits)
            .map_err(|source| SpidevError::SetBitsPerWordFailed { bits, source })?;
        debug!("spidev: Set bits per word to {}", bits);
        Ok(())
    }

    /// Current default maximum clock speed in Hz
    pub fn max_speed_hz(&self) -> Result<u32> {
        self.ioctl_read::<u32>(ioc::SPI_IOC_RD_MAX_SPEED_HZ)
            .map_err(|source| SpidevError::QueryFailed {
                setting: "max speed",
                source,
            })
    }

    /// Set a new default clock speed
    pub fn set_speed(&mut self, speed_hz: u32) -> Result<()> {
        self.ioctl_write(ioc::SPI_IOC_WR_MAX_SPEED_HZ, speed_hz)
            .map_err(|source| SpidevError::SetSpeedFailed {
                speed: speed_hz,
                source,
            })?;
        debug!("spidev: Set speed to {} Hz", speed_hz);
        Ok(())
    }

    /// Whether words are shifted least significant bit first
    pub fn lsb_first(&self) -> Result<bool> {
        self.ioctl_read::<u8>(ioc::SPI_IOC_RD_LSB_FIRST)
            .map(|v| v != 0)
            .map_err(|source| SpidevError::QueryFailed {
                setting: "bit order",
                source,
            })
    }

    /// Select least or most significant bit first
    pub fn set_lsb_first(&mut self, lsb_first: bool) -> Result<()> {
        self.ioctl_write(ioc::SPI_IOC_WR_LSB_FIRST, lsb_first as u8)
            .map_err(|source| SpidevError::SetLsbFirstFailed { lsb_first, source })
    }

    /// Close the device, reporting a failed close
    pub fn close(mut self) -> Result<()> {
        match self.handle.take() {
            Some(handle) => self
                .executor
                .close(handle)
                .map_err(SpidevError::CloseFailed),
            None => Ok(()),
        }
    }

    fn ioctl_read<T: Copy + Default>(&self, request: u32) -> spidevctl_core::Result<T> {
        let mut value = T::default();
        unsafe {
            self.executor.syscalls().ioctl(
                self.handle(),
                request as IoctlRequest,
                (&mut value as *mut T).cast::<c_void>(),
            )
        }?;
        Ok(value)
    }

    fn ioctl_write<T: Copy>(&self, request: u32, value: T) -> spidevctl_core::Result<()> {
        let mut value = value;
        unsafe {
            self.executor.syscalls().ioctl(
                self.handle(),
                request as IoctlRequest,
                (&mut value as *mut T).cast::<c_void>(),
            )
        }?;
        Ok(())
    }
}

impl<S: Syscalls> Drop for Spidev<S> {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            if let Err(e) = self.executor.close(handle) {
                warn!("spidev: Failed to close {}: {}", self.path, e);
            }
        }
    }
}

/// Largest message the spidev driver buffers, in bytes
///
/// Read from the module parameter, or the page size when it is unavailable.
pub fn max_transfer_size() -> usize {
    if let Ok(content) = std::fs::read_to_string(BUF_SIZE_SYSFS) {
        if let Ok(size) = content.trim().parse::<usize>() {
            if size > 0 {
                debug!("spidev: Using buffer size {} from sysfs", size);
                return size;
            }
        }
        warn!("spidev: Invalid buffer size in {}", BUF_SIZE_SYSFS);
    } else {
        debug!("spidev: Cannot read {}, using page size", BUF_SIZE_SYSFS);
    }

    let page_size = unsafe { libc::sysconf(libc::_SC_PAGESIZE) };
    if page_size > 0 {
        page_size as usize
    } else {
        4096
    }
}

/// Parse device options from a list of key-value pairs
///
/// - `dev=/dev/spidev0.0` - Required: device path
/// - `spispeed=4000` - Optional: speed in kHz (default: 2000)
/// - `mode=0` - Optional: SPI mode 0-3 (default: 0)
/// - `bits=8` - Optional: bits per word (default: 8)
pub fn parse_options(options: &[(&str, &str)]) -> Result<SpidevConfig> {
    let mut config = SpidevConfig::default();

    for (key, value) in options {
        match *key {
            "dev" => {
                config.device = value.to_string();
            }
            "spispeed" => {
                // Parse speed in kHz
                let speed_khz: u32 = value.parse().map_err(|_| {
                    SpidevError::InvalidParameter(format!("Invalid spispeed value: {}", value))
                })?;
                config.speed_hz = speed_khz.checked_mul(1000).ok_or_else(|| {
                    SpidevError::InvalidParameter(format!("spispeed too large: {}", value))
                })?;
            }
            "mode" => {
                let mode = value
                    .parse::<u8>()
                    .ok()
                    .and_then(SpiModeFlags::from_mode_number)
                    .ok_or_else(|| {
                        SpidevError::InvalidParameter(format!(
                            "Invalid SPI mode: {} (must be 0-3)",
                            value
                        ))
                    })?;
                config.mode = mode;
            }
            "bits" => {
                config.bits_per_word = value.parse().map_err(|_| {
                    SpidevError::InvalidParameter(format!("Invalid bits value: {}", value))
                })?;
            }
            _ => {
                warn!("spidev: Unknown option: {}={}", key, value);
            }
        }
    }

    if config.device.is_empty() {
        return Err(SpidevError::NoDevice);
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeSpidev;

    fn config() -> SpidevConfig {
        SpidevConfig::new("/dev/spidev0.0")
            .with_speed(1_000_000)
            .with_mode(SpiModeFlags::MODE_3)
    }

    #[test]
    fn test_open_applies_settings() {
        let fake = FakeSpidev::new();
        let spi = Spidev::open_with(&config(), &fake).unwrap();
        assert_eq!(fake.mode.get(), 3);
        assert_eq!(fake.bits_per_word.get(), 8);
        assert_eq!(fake.max_speed_hz.get(), 1_000_000);
        assert_eq!(spi.mode().unwrap(), SpiModeFlags::MODE_3);
        assert_eq!(spi.bits_per_word().unwrap(), 8);
        assert_eq!(spi.max_speed_hz().unwrap(), 1_000_000);
    }

    #[test]
    fn test_wide_mode_uses_mode32() {
        let fake = FakeSpidev::new();
        let mode = SpiModeFlags::MODE_0 | SpiModeFlags::TX_QUAD | SpiModeFlags::RX_QUAD;
        let spi = Spidev::open_with(&config().with_mode(mode), &fake).unwrap();
        assert_eq!(fake.mode.get(), 0xa00);
        assert_eq!(spi.mode().unwrap(), mode);
    }

    #[test]
    fn test_mode_falls_back_without_mode32() {
        let fake = FakeSpidev::new();
        fake.without_mode32();
        let spi = Spidev::open_with(&config(), &fake).unwrap();
        assert_eq!(spi.mode().unwrap(), SpiModeFlags::MODE_3);
    }

    #[test]
    fn test_drop_closes_handle() {
        let fake = FakeSpidev::new();
        {
            let _spi = Spidev::open_with(&config(), &fake).unwrap();
            assert_eq!(fake.open_count(), 1);
        }
        assert_eq!(fake.open_count(), 0);
    }

    #[test]
    fn test_explicit_close() {
        let fake = FakeSpidev::new();
        let spi = Spidev::open_with(&config(), &fake).unwrap();
        spi.close().unwrap();
        assert_eq!(fake.open_count(), 0);
    }

    #[test]
    fn test_open_failure_reports_path() {
        let fake = FakeSpidev::new();
        fake.fail_open_with(ErrnoCode::NoSuchEntry);
        let err = Spidev::open_with(&config(), &fake).err().unwrap();
        assert!(matches!(
            &err,
            SpidevError::OpenFailed { path, source: ErrnoCode::NoSuchEntry } if path == "/dev/spidev0.0"
        ));
        assert_eq!(err.errno(), Some(ErrnoCode::NoSuchEntry));
    }

    #[test]
    fn test_full_duplex_transfer() {
        let fake = FakeSpidev::new();
        let mut spi = Spidev::open_with(&config(), &fake).unwrap();
        let tx = [0x9Fu8, 0, 0, 0];
        let mut rx = [0u8; 4];
        spi.transfer_full_duplex(&tx, &mut rx).unwrap();
        let messages = fake.messages();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].1.len(), TransferDescriptor::SIZE);

        let mut short = [0u8; 2];
        match spi.transfer_full_duplex(&tx, &mut short) {
            Err(SpidevError::InvalidParameter(msg)) => assert!(msg.contains("4 vs 2"), "{}", msg),
            other => panic!("expected length mismatch, got {:?}", other),
        }
        assert_eq!(fake.messages().len(), 1);
        assert_eq!(short, [0u8; 2]);
    }

    #[test]
    fn test_transfer_error_is_wrapped() {
        let fake = FakeSpidev::new();
        let mut spi = Spidev::open_with(&config(), &fake).unwrap();
        fake.fail_messages_with(ErrnoCode::Other(libc::EIO));
        let tx = [0u8; 1];
        let err = spi.transfer(&[TransferDescriptor::write(&tx).unwrap()]).unwrap_err();
        assert!(matches!(err, SpidevError::TransferFailed(ErrnoCode::Other(code)) if code == libc::EIO));
    }

    #[test]
    fn test_lsb_first_round_trip() {
        let fake = FakeSpidev::new();
        let mut spi = Spidev::open_with(&config(), &fake).unwrap();
        assert!(!spi.lsb_first().unwrap());
        spi.set_lsb_first(true).unwrap();
        assert!(spi.lsb_first().unwrap());
    }

    #[test]
    fn test_half_duplex() {
        let fake = FakeSpidev::new();
        let mut spi = Spidev::open_with(&config(), &fake).unwrap();
        assert_eq!(spi.write(&[0x05]).unwrap(), 1);
        let mut buf = [0u8; 2];
        assert_eq!(spi.read(&mut buf).unwrap(), 2);
        assert_eq!(fake.written(), vec![0x05]);
    }

    #[test]
    fn test_empty_device_rejected() {
        let fake = FakeSpidev::new();
        assert!(matches!(
            Spidev::open_with(&SpidevConfig::default(), &fake),
            Err(SpidevError::NoDevice)
        ));
    }

    #[test]
    fn test_attach_leaves_settings_alone() {
        let fake = FakeSpidev::new();
        fake.max_speed_hz.set(123_456);
        let spi = Spidev::attach("/dev/spidev0.0", &fake).unwrap();
        assert_eq!(spi.max_speed_hz().unwrap(), 123_456);
        assert_eq!(spi.path(), "/dev/spidev0.0");
    }

    #[test]
    fn test_max_transfer_size_nonzero() {
        assert!(max_transfer_size() > 0);
    }

    #[test]
    fn test_parse_options() {
        let config = parse_options(&[
            ("dev", "/dev/spidev1.2"),
            ("spispeed", "4000"),
            ("mode", "3"),
            ("bits", "16"),
        ])
        .unwrap();
        assert_eq!(config.device, "/dev/spidev1.2");
        assert_eq!(config.speed_hz, 4_000_000);
        assert_eq!(config.mode, SpiModeFlags::MODE_3);
        assert_eq!(config.bits_per_word, 16);
    }

    #[test]
    fn test_parse_options_defaults() {
        let config = parse_options(&[("dev", "/dev/spidev0.0")]).unwrap();
        assert_eq!(config.speed_hz, 2_000_000);
        assert_eq!(config.mode, SpiModeFlags::MODE_0);
        assert_eq!(config.bits_per_word, 8);
    }

    #[test]
    fn test_parse_options_errors() {
        assert!(matches!(parse_options(&[]), Err(SpidevError::NoDevice)));
        assert!(matches!(
            parse_options(&[("dev", "/dev/spidev0.0"), ("mode", "4")]),
            Err(SpidevError::InvalidParameter(_))
        ));
        assert!(matches!(
            parse_options(&[("dev", "/dev/spidev0.0"), ("spispeed", "fast")]),
            Err(SpidevError::InvalidParameter(_))
        ));
    }
}
