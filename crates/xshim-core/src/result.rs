//! Result codes returned to the guest.
//!
//! Every guest-facing call reports its outcome through a single signed 32-bit
//! status value. Zero is success; everything else is a failure reason drawn
//! from an open catalog that mirrors the guest platform's Win32-style codes.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Status value returned from a guest-facing call.
///
/// Success is decided by [`XResult::succeeded`] and nothing else. Codes that
/// are not in the named catalog are still valid and are passed through
/// unchanged.
///
/// # Example
///
/// ```
/// use xshim_core::XResult;
///
/// assert!(XResult::SUCCESS.succeeded());
/// assert!(XResult::BAD_ARGUMENTS.failed());
/// assert_eq!(XResult::from_raw(0x48F), XResult::DEVICE_NOT_CONNECTED);
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct XResult(i32);

impl XResult {
    /// The call completed.
    pub const SUCCESS: XResult = XResult(0);
    /// A required argument was missing or unusable.
    pub const BAD_ARGUMENTS: XResult = XResult(0xA0);
    /// The device or subsystem is busy.
    pub const BUSY: XResult = XResult(0xAA);
    /// No device is attached for the requested user.
    pub const DEVICE_NOT_CONNECTED: XResult = XResult(0x48F);
    /// The device was removed while in use.
    pub const DEVICE_REMOVED: XResult = XResult(0x651);
    /// Nothing is queued (e.g. no pending keystroke).
    pub const EMPTY: XResult = XResult(0x10D2);

    /// Wrap a raw status value.
    pub const fn from_raw(raw: i32) -> Self {
        Self(raw)
    }

    /// Reinterpret a guest register value as a status.
    pub const fn from_u32(raw: u32) -> Self {
        Self(raw as i32)
    }

    /// The raw signed status value.
    pub const fn raw(self) -> i32 {
        self.0
    }

    /// The status as the guest sees it in its return register.
    pub const fn as_u32(self) -> u32 {
        self.0 as u32
    }

    /// Whether this status denotes success.
    pub const fn succeeded(self) -> bool {
        self.0 == 0
    }

    /// Whether this status denotes failure.
    pub const fn failed(self) -> bool {
        !self.succeeded()
    }

    /// Catalog name for known codes.
    pub fn name(self) -> Option<&'static str> {
        match self {
            Self::SUCCESS => Some("SUCCESS"),
            Self::BAD_ARGUMENTS => Some("BAD_ARGUMENTS"),
            Self::BUSY => Some("BUSY"),
            Self::DEVICE_NOT_CONNECTED => Some("DEVICE_NOT_CONNECTED"),
            Self::DEVICE_REMOVED => Some("DEVICE_REMOVED"),
            Self::EMPTY => Some("EMPTY"),
            _ => None,
        }
    }
}

impl Default for XResult {
    fn default() -> Self {
        Self::SUCCESS
    }
}

impl fmt::Debug for XResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => write!(f, "XResult({name})"),
            None => write!(f, "XResult({:#X})", self.as_u32()),
        }
    }
}

impl fmt::Display for XResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => write!(f, "{} ({:#X})", name, self.as_u32()),
            None => write!(f, "{:#X}", self.as_u32()),
        }
    }
}

impl From<i32> for XResult {
    fn from(raw: i32) -> Self {
        Self(raw)
    }
}

impl From<XResult> for i32 {
    fn from(result: XResult) -> Self {
        result.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_predicate() {
        assert!(XResult::SUCCESS.succeeded());
        assert!(!XResult::SUCCESS.failed());

        for code in [
            XResult::BAD_ARGUMENTS,
            XResult::DEVICE_NOT_CONNECTED,
            XResult::EMPTY,
            XResult::from_raw(-1),
            XResult::from_raw(1),
        ] {
            assert!(code.failed(), "{code:?} should be a failure");
        }
    }

    #[test]
    fn test_register_round_trip() {
        let code = XResult::from_raw(-5);
        assert_eq!(code.as_u32(), 0xFFFF_FFFB);
        assert_eq!(XResult::from_u32(code.as_u32()), code);
    }

    #[test]
    fn test_names() {
        assert_eq!(XResult::BAD_ARGUMENTS.name(), Some("BAD_ARGUMENTS"));
        assert_eq!(XResult::from_raw(0x1234).name(), None);
        assert_eq!(XResult::EMPTY.to_string(), "EMPTY (0x10D2)");
        assert_eq!(format!("{:?}", XResult::from_raw(0x1234)), "XResult(0x1234)");
    }
}
