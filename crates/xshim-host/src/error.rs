//! Error types for export registration and resolution.

use thiserror::Error;

/// Misuse of the export table.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExportError {
    /// The `(module, name)` key is already registered.
    #[error("Export already registered: {module}::{name}")]
    DuplicateExport {
        /// The module name.
        module: String,
        /// The export name.
        name: String,
    },

    /// No export is registered under `(module, name)`.
    #[error("Unknown export: {module}::{name}")]
    UnknownExport {
        /// The module name.
        module: String,
        /// The export name.
        name: String,
    },
}

/// Result type for export table operations.
pub type ExportResult<T> = std::result::Result<T, ExportError>;
