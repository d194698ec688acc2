//! System call gateway
//!
//! Each method issues exactly one system call. On failure the thread's errno
//! is read on the very next statement, before anything else (logging
//! included) can overwrite it, and translated into an [`ErrnoCode`].
//! Successful return values are passed through untouched; there is no retry
//! on `EINTR` and no looping over short reads or writes.

use std::ffi::{c_int, c_void, CStr};
use std::io;
use std::os::unix::io::{AsRawFd, RawFd};

use spidevctl_core::{ErrnoCode, OpenFlags, Result};

/// Request number type `ioctl(2)` takes on this target
pub type IoctlRequest = nix::sys::ioctl::ioctl_num_type;

/// An open device, identified by its file descriptor
///
/// The handle is a plain number and does not close anything on drop; it is
/// valid from a successful `open` until the matching `close`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeviceHandle(RawFd);

impl DeviceHandle {
    /// A handle no successful `open` ever returns
    pub const INVALID: Self = Self(-1);

    /// Wrap a raw file descriptor
    pub const fn from_raw(fd: RawFd) -> Self {
        Self(fd)
    }

    /// The underlying file descriptor
    pub const fn as_raw(&self) -> RawFd {
        self.0
    }

    /// Returns true unless the descriptor is negative
    pub const fn is_valid(&self) -> bool {
        self.0 >= 0
    }

    fn checked(self) -> Result<RawFd> {
        if self.is_valid() {
            Ok(self.0)
        } else {
            Err(ErrnoCode::BadFileDescriptor)
        }
    }
}

impl AsRawFd for DeviceHandle {
    fn as_raw_fd(&self) -> RawFd {
        self.0
    }
}

/// The system calls a device needs
///
/// Implemented for the real kernel by [`LibcSyscalls`]. Taking the gateway
/// as a value rather than calling libc directly lets tests substitute it.
pub trait Syscalls {
    /// `open(2)` a path
    fn open(&self, path: &CStr, flags: OpenFlags) -> Result<DeviceHandle>;

    /// `close(2)` a handle
    fn close(&self, handle: DeviceHandle) -> Result<()>;

    /// `read(2)` up to `buf.len()` bytes
    fn read(&self, handle: DeviceHandle, buf: &mut [u8]) -> Result<usize>;

    /// `write(2)` up to `buf.len()` bytes
    fn write(&self, handle: DeviceHandle, buf: &[u8]) -> Result<usize>;

    /// `ioctl(2)` with a pointer argument
    ///
    /// # Safety
    ///
    /// `arg` must point to memory laid out as `request` expects, and every
    /// address reachable through it must stay valid for the whole call.
    unsafe fn ioctl(
        &self,
        handle: DeviceHandle,
        request: IoctlRequest,
        arg: *mut c_void,
    ) -> Result<c_int>;
}

impl<S: Syscalls + ?Sized> Syscalls for &S {
    fn open(&self, path: &CStr, flags: OpenFlags) -> Result<DeviceHandle> {
        (**self).open(path, flags)
    }

    fn close(&self, handle: DeviceHandle) -> Result<()> {
        (**self).close(handle)
    }

    fn read(&self, handle: DeviceHandle, buf: &mut [u8]) -> Result<usize> {
        (**self).read(handle, buf)
    }

    fn write(&self, handle: DeviceHandle, buf: &[u8]) -> Result<usize> {
        (**self).write(handle, buf)
    }

    unsafe fn ioctl(
        &self,
        handle: DeviceHandle,
        request: IoctlRequest,
        arg: *mut c_void,
    ) -> Result<c_int> {
        (**self).ioctl(handle, request, arg)
    }
}

/// The host kernel, reached through libc
#[derive(Debug, Default, Clone, Copy)]
pub struct LibcSyscalls;

impl LibcSyscalls {
    /// The gateway to the running kernel
    pub const fn new() -> Self {
        Self
    }
}

/// Map [`OpenFlags`] onto this target's `libc::O_*` values
pub fn open_flags_to_libc(flags: OpenFlags) -> c_int {
    let access = match flags.bits() & OpenFlags::ACCMODE {
        0x1 => libc::O_WRONLY,
        0x2 => libc::O_RDWR,
        _ => libc::O_RDONLY,
    };
    [
        (OpenFlags::NONBLOCK, libc::O_NONBLOCK),
        (OpenFlags::APPEND, libc::O_APPEND),
        (OpenFlags::CLOEXEC, libc::O_CLOEXEC),
    ]
    .into_iter()
    .filter(|(flag, _)| flags.contains(*flag))
    .fold(access, |acc, (_, raw)| acc | raw)
}

/// Translate the calling thread's current errno
fn last_errno() -> ErrnoCode {
    ErrnoCode::translate(io::Error::last_os_error().raw_os_error().unwrap_or_default())
}

impl Syscalls for LibcSyscalls {
    fn open(&self, path: &CStr, flags: OpenFlags) -> Result<DeviceHandle> {
        let fd = unsafe { libc::open(path.as_ptr(), open_flags_to_libc(flags)) };
        if fd == -1 {
            return Err(last_errno());
        }
        Ok(DeviceHandle(fd))
    }

    fn close(&self, handle: DeviceHandle) -> Result<()> {
        let fd = handle.checked()?;
        let ret = unsafe { libc::close(fd) };
        if ret < 0 {
            return Err(last_errno());
        }
        Ok(())
    }

    fn read(&self, handle: DeviceHandle, buf: &mut [u8]) -> Result<usize> {
        let fd = handle.checked()?;
        let ret = unsafe { libc::read(fd, buf.as_mut_ptr().cast(), buf.len()) };
        if ret < 0 {
            return Err(last_errno());
        }
        Ok(ret as usize)
    }

    fn write(&self, handle: DeviceHandle, buf: &[u8]) -> Result<usize> {
        let fd = handle.checked()?;
        let ret = unsafe { libc::write(fd, buf.as_ptr().cast(), buf.len()) };
        if ret < 0 {
            return Err(last_errno());
        }
        Ok(ret as usize)
    }

    unsafe fn ioctl(
        &self,
        handle: DeviceHandle,
        request: IoctlRequest,
        arg: *mut c_void,
    ) -> Result<c_int> {
        let fd = handle.checked()?;
        let ret = libc::ioctl(fd, request, arg);
        if ret < 0 {
            return Err(last_errno());
        }
        Ok(ret)
    }
}
