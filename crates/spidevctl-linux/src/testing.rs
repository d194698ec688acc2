//! In-memory spidev stand-in for unit tests

use std::cell::{Cell, RefCell};
use std::collections::BTreeSet;
use std::ffi::{c_int, c_void, CStr};

use spidevctl_core::ioc;
use spidevctl_core::{ErrnoCode, OpenFlags, Result};

use crate::syscall::{DeviceHandle, IoctlRequest, Syscalls};

/// Models one spidev node: tracks open fds, keeps the device settings and
/// records every message it is sent
#[derive(Debug)]
pub struct FakeSpidev {
    next_fd: Cell<i32>,
    open_fds: RefCell<BTreeSet<i32>>,
    open_error: Cell<Option<ErrnoCode>>,
    message_error: Cell<Option<ErrnoCode>>,
    mode32: Cell<bool>,
    messages: RefCell<Vec<(IoctlRequest, Vec<u8>)>>,
    written: RefCell<Vec<u8>>,
    pub mode: Cell<u32>,
    pub bits_per_word: Cell<u8>,
    pub max_speed_hz: Cell<u32>,
    pub lsb_first: Cell<u8>,
}

impl FakeSpidev {
    pub fn new() -> Self {
        Self {
            next_fd: Cell::new(3),
            open_fds: RefCell::new(BTreeSet::new()),
            open_error: Cell::new(None),
            message_error: Cell::new(None),
            mode32: Cell::new(true),
            messages: RefCell::new(Vec::new()),
            written: RefCell::new(Vec::new()),
            mode: Cell::new(0),
            bits_per_word: Cell::new(8),
            max_speed_hz: Cell::new(500_000),
            lsb_first: Cell::new(0),
        }
    }

    pub fn fail_open_with(&self, err: ErrnoCode) {
        self.open_error.set(Some(err));
    }

    pub fn fail_messages_with(&self, err: ErrnoCode) {
        self.message_error.set(Some(err));
    }

    /// Behave like a kernel predating `SPI_IOC_*_MODE32`
    pub fn without_mode32(&self) {
        self.mode32.set(false);
    }

    pub fn messages(&self) -> Vec<(IoctlRequest, Vec<u8>)> {
        self.messages.borrow().clone()
    }

    pub fn written(&self) -> Vec<u8> {
        self.written.borrow().clone()
    }

    pub fn open_count(&self) -> usize {
        self.open_fds.borrow().len()
    }

    fn check(&self, handle: DeviceHandle) -> Result<()> {
        if self.open_fds.borrow().contains(&handle.as_raw()) {
            Ok(())
        } else {
            Err(ErrnoCode::BadFileDescriptor)
        }
    }
}

fn req(code: u32) -> IoctlRequest {
    code as IoctlRequest
}

impl Syscalls for FakeSpidev {
    fn open(&self, _path: &CStr, _flags: OpenFlags) -> Result<DeviceHandle> {
        if let Some(err) = self.open_error.get() {
            return Err(err);
        }
        let fd = self.next_fd.get();
        self.next_fd.set(fd + 1);
        self.open_fds.borrow_mut().insert(fd);
        Ok(DeviceHandle::from_raw(fd))
    }

    fn close(&self, handle: DeviceHandle) -> Result<()> {
        if self.open_fds.borrow_mut().remove(&handle.as_raw()) {
            Ok(())
        } else {
            Err(ErrnoCode::BadFileDescriptor)
        }
    }

    fn read(&self, handle: DeviceHandle, buf: &mut [u8]) -> Result<usize> {
        self.check(handle)?;
        buf.fill(0xFF);
        Ok(buf.len())
    }

    fn write(&self, handle: DeviceHandle, buf: &[u8]) -> Result<usize> {
        self.check(handle)?;
        self.written.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    unsafe fn ioctl(
        &self,
        handle: DeviceHandle,
        request: IoctlRequest,
        arg: *mut c_void,
    ) -> Result<c_int> {
        self.check(handle)?;

        let mode32 = self.mode32.get();
        if request == req(ioc::SPI_IOC_RD_MODE) {
            *arg.cast::<u8>() = self.mode.get() as u8;
        } else if request == req(ioc::SPI_IOC_WR_MODE) {
            self.mode.set(u32::from(*arg.cast::<u8>()));
        } else if mode32 && request == req(ioc::SPI_IOC_RD_MODE32) {
            *arg.cast::<u32>() = self.mode.get();
        } else if mode32 && request == req(ioc::SPI_IOC_WR_MODE32) {
            self.mode.set(*arg.cast::<u32>());
        } else if request == req(ioc::SPI_IOC_RD_BITS_PER_WORD) {
            *arg.cast::<u8>() = self.bits_per_word.get();
        } else if request == req(ioc::SPI_IOC_WR_BITS_PER_WORD) {
            self.bits_per_word.set(*arg.cast::<u8>());
        } else if request == req(ioc::SPI_IOC_RD_MAX_SPEED_HZ) {
            *arg.cast::<u32>() = self.max_speed_hz.get();
        } else if request == req(ioc::SPI_IOC_WR_MAX_SPEED_HZ) {
            self.max_speed_hz.set(*arg.cast::<u32>());
        } else if request == req(ioc::SPI_IOC_RD_LSB_FIRST) {
            *arg.cast::<u8>() = self.lsb_first.get();
        } else if request == req(ioc::SPI_IOC_WR_LSB_FIRST) {
            self.lsb_first.set(*arg.cast::<u8>());
        } else {
            let n = (0..=ioc::SPI_IOC_MESSAGE_MAX)
                .find(|&n| ioc::spi_ioc_message(n).map(req) == Some(request))
                .ok_or(ErrnoCode::InappropriateIoctl)?;
            if let Some(err) = self.message_error.get() {
                return Err(err);
            }
            let size = n * spidevctl_core::transfer::SPI_IOC_TRANSFER_SIZE;
            let payload = std::slice::from_raw_parts(arg.cast::<u8>(), size).to_vec();
            self.messages.borrow_mut().push((request, payload));
        }
        Ok(0)
    }
}
