//! Transfer executor
//!
//! The open → transfer* → close lifecycle over raw [`DeviceHandle`]s. Nothing
//! here retries or hides a failure: every syscall error comes back to the
//! caller as an [`ErrnoCode`], and a failed batch never reports partial
//! success.

use std::ffi::CString;

use log::{debug, trace};
use spidevctl_core::ioc;
use spidevctl_core::transfer::serialize_batch;
use spidevctl_core::{ErrnoCode, OpenFlags, Result, TransferDescriptor};

use crate::syscall::{DeviceHandle, IoctlRequest, LibcSyscalls, Syscalls};

/// Runs SPI messages against spidev handles
#[derive(Debug, Default, Clone)]
pub struct TransferExecutor<S = LibcSyscalls> {
    syscalls: S,
}

impl TransferExecutor<LibcSyscalls> {
    /// Executor backed by the running kernel
    pub const fn new() -> Self {
        Self {
            syscalls: LibcSyscalls::new(),
        }
    }
}

impl<S: Syscalls> TransferExecutor<S> {
    /// Executor backed by the given gateway
    pub fn with_syscalls(syscalls: S) -> Self {
        Self { syscalls }
    }

    /// The gateway this executor issues calls through
    pub fn syscalls(&self) -> &S {
        &self.syscalls
    }

    /// Open a device read-write
    ///
    /// Fails with [`ErrnoCode::NoSuchEntry`] if the path does not exist and
    /// [`ErrnoCode::PermissionDenied`] if access is refused.
    pub fn open(&self, path: &str) -> Result<DeviceHandle> {
        self.open_with(path, OpenFlags::RDWR)
    }

    /// Open a device with explicit flags
    pub fn open_with(&self, path: &str, flags: OpenFlags) -> Result<DeviceHandle> {
        // Interior NUL cannot cross the C boundary
        let c_path = CString::new(path).map_err(|_| ErrnoCode::InvalidArgument)?;
        let handle = self.syscalls.open(&c_path, flags)?;
        debug!("spidev: Opened {} as fd {}", path, handle.as_raw());
        Ok(handle)
    }

    /// Submit a batch of transfers as one `SPI_IOC_MESSAGE(n)`
    ///
    /// The descriptors run in order within a single bus message. Buffers
    /// they borrow stay locked until the call returns.
    ///
    /// # Errors
    ///
    /// - [`ErrnoCode::InvalidArgument`] if the batch is too long to encode,
    ///   without touching the device
    /// - [`ErrnoCode::BadFileDescriptor`] if `handle` is not open
    /// - whatever the driver reports for the transfer itself
    pub fn transfer(
        &self,
        handle: DeviceHandle,
        descriptors: &[TransferDescriptor<'_>],
    ) -> Result<()> {
        let request = ioc::spi_ioc_message(descriptors.len()).ok_or(ErrnoCode::InvalidArgument)?;
        let mut message = serialize_batch(descriptors);

        trace!(
            "spidev: fd {} SPI_IOC_MESSAGE({}) request={:#010x}",
            handle.as_raw(),
            descriptors.len(),
            request
        );

        let ret = unsafe {
            self.syscalls
                .ioctl(handle, request as IoctlRequest, message.as_mut_ptr().cast())
        }?;

        trace!("spidev: fd {} transferred {} bytes", handle.as_raw(), ret);
        Ok(())
    }

    /// Half-duplex read straight from the device
    pub fn read(&self, handle: DeviceHandle, buf: &mut [u8]) -> Result<usize> {
        self.syscalls.read(handle, buf)
    }

    /// Half-duplex write straight to the device
    pub fn write(&self, handle: DeviceHandle, buf: &[u8]) -> Result<usize> {
        self.syscalls.write(handle, buf)
    }

    /// Close a handle
    ///
    /// Not idempotent: a second close of the same handle fails with
    /// [`ErrnoCode::BadFileDescriptor`].
    pub fn close(&self, handle: DeviceHandle) -> Result<()> {
        self.syscalls.close(handle)?;
        debug!("spidev: Closed fd {}", handle.as_raw());
        Ok(())
    }
}
