//! CLI command implementations
//!
//! ## Transfer commands
//!
//! `transfer`, `read` and `write` open and configure the device from the
//! shared device arguments, then run one operation against it.
//!
//! ## Inspection commands
//!
//! `info` attaches to a device without changing its settings; `codes` needs
//! no device at all.

pub mod info;
pub mod transfer;

/// Format bytes as space-separated uppercase hex
pub fn format_hex(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{:02X}", b))
        .collect::<Vec<_>>()
        .join(" ")
}
