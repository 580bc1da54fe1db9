//! Core error types for xshim.
//!
//! Guest addresses are untrusted input, so every memory access can fail.
//! These errors never cross into the guest directly: the shim layer folds
//! them into a result code.

use std::fmt;

use thiserror::Error;

/// Why a guest address was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressFault {
    /// The access runs past the end of the guest address space.
    OutOfRange {
        /// Size of the guest address space in bytes.
        limit: u64,
    },
    /// The address does not satisfy the record's alignment.
    Misaligned {
        /// Required alignment in bytes.
        align: u32,
    },
    /// The range is mapped but may not be written.
    ReadOnly,
}

impl fmt::Display for AddressFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AddressFault::OutOfRange { limit } => write!(f, "out of range (limit {limit:#X})"),
            AddressFault::Misaligned { align } => write!(f, "not aligned to {align} bytes"),
            AddressFault::ReadOnly => write!(f, "read-only"),
        }
    }
}

/// Errors from the guest memory view.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MemoryError {
    /// The address range cannot be accessed.
    #[error("Invalid guest address {address:#010X} (len {len}): {fault}")]
    InvalidAddress {
        /// First guest address of the access.
        address: u32,
        /// Length of the access in bytes.
        len: usize,
        /// What was wrong with it.
        fault: AddressFault,
    },
}

impl MemoryError {
    /// The guest address that was rejected.
    pub fn address(&self) -> u32 {
        match self {
            MemoryError::InvalidAddress { address, .. } => *address,
        }
    }
}

/// Errors while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The configuration text is not valid TOML for this schema.
    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    /// The configuration parsed but is not usable.
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Result type alias for guest memory operations.
pub type MemoryResult<T> = std::result::Result<T, MemoryError>;

/// Result type alias for configuration operations.
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;
