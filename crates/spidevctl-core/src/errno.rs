//! Errno translation
//!
//! A failing system call leaves a raw code in the thread's errno slot. This
//! module maps that code onto the small set of failures callers of a
//! character device actually branch on, keeping the raw value for anything
//! else so diagnostics never lose information.

use core::fmt;

/// No such file or directory
pub const ENOENT: i32 = 2;
/// Bad file descriptor
pub const EBADF: i32 = 9;
/// Permission denied
pub const EACCES: i32 = 13;
/// Invalid argument
pub const EINVAL: i32 = 22;
/// Inappropriate ioctl for device
pub const ENOTTY: i32 = 25;

/// Semantic kind of a failed device operation
///
/// Every variant maps back to exactly one raw code through [`ErrnoCode::raw`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrnoCode {
    /// The device path does not exist (`ENOENT`)
    NoSuchEntry,
    /// The handle is closed or was never opened (`EBADF`)
    BadFileDescriptor,
    /// Access rights are insufficient (`EACCES`)
    PermissionDenied,
    /// The driver rejected an argument (`EINVAL`)
    InvalidArgument,
    /// The request is not understood by this device (`ENOTTY`)
    InappropriateIoctl,
    /// Any other platform error, raw code preserved
    Other(i32),
}

impl ErrnoCode {
    /// Translate a raw platform error code
    ///
    /// Total over `i32`: unknown values become [`ErrnoCode::Other`].
    pub const fn translate(raw: i32) -> Self {
        match raw {
            ENOENT => Self::NoSuchEntry,
            EBADF => Self::BadFileDescriptor,
            EACCES => Self::PermissionDenied,
            EINVAL => Self::InvalidArgument,
            ENOTTY => Self::InappropriateIoctl,
            other => Self::Other(other),
        }
    }

    /// The raw platform code this kind stands for
    pub const fn raw(&self) -> i32 {
        match self {
            Self::NoSuchEntry => ENOENT,
            Self::BadFileDescriptor => EBADF,
            Self::PermissionDenied => EACCES,
            Self::InvalidArgument => EINVAL,
            Self::InappropriateIoctl => ENOTTY,
            Self::Other(code) => *code,
        }
    }
}

impl From<i32> for ErrnoCode {
    fn from(raw: i32) -> Self {
        Self::translate(raw)
    }
}

impl fmt::Display for ErrnoCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoSuchEntry => write!(f, "no such file or directory"),
            Self::BadFileDescriptor => write!(f, "bad file descriptor"),
            Self::PermissionDenied => write!(f, "permission denied"),
            Self::InvalidArgument => write!(f, "invalid argument"),
            Self::InappropriateIoctl => write!(f, "inappropriate ioctl for device"),
            Self::Other(code) => write!(f, "os error {}", code),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for ErrnoCode {}

/// Result type alias using [`ErrnoCode`]
pub type Result<T> = core::result::Result<T, ErrnoCode>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_translate_known_codes() {
        assert_eq!(ErrnoCode::translate(2), ErrnoCode::NoSuchEntry);
        assert_eq!(ErrnoCode::translate(9), ErrnoCode::BadFileDescriptor);
        assert_eq!(ErrnoCode::translate(13), ErrnoCode::PermissionDenied);
        assert_eq!(ErrnoCode::translate(22), ErrnoCode::InvalidArgument);
        assert_eq!(ErrnoCode::translate(25), ErrnoCode::InappropriateIoctl);
    }

    #[test]
    fn test_translate_preserves_unknown() {
        assert_eq!(ErrnoCode::translate(9999), ErrnoCode::Other(9999));
        assert_eq!(ErrnoCode::translate(0), ErrnoCode::Other(0));
        assert_eq!(ErrnoCode::translate(-1), ErrnoCode::Other(-1));
    }

    #[test]
    fn test_raw_inverts_translate() {
        for raw in [0, 1, 2, 9, 13, 16, 22, 25, 110, 9999, i32::MAX] {
            assert_eq!(ErrnoCode::translate(raw).raw(), raw);
        }
    }
}
