//! Error types for the input subsystem.

use thiserror::Error;
use xshim_core::XResult;

/// Errors while bringing up the input subsystem.
#[derive(Debug, Error)]
pub enum InputError {
    /// A driver refused to start.
    #[error("Input driver '{driver}' failed to set up: {result}")]
    DriverSetupFailed {
        /// The driver name.
        driver: String,
        /// The status the driver reported.
        result: XResult,
    },

    /// Two drivers claim the same user slot.
    #[error("User slot {0} is claimed by more than one driver")]
    SlotConflict(u8),
}

/// Result type for input subsystem operations.
pub type InputResult<T> = std::result::Result<T, InputError>;
