//! The capability backend contract consumed by the input shims.

use std::fmt;
use std::sync::Arc;

use xshim_codec::{InputCapabilities, InputKeystroke, InputState, InputVibration};
use xshim_core::XResult;

/// Host-native input operations behind the guest's input exports.
///
/// Each operation returns a status; output records are filled through the
/// `out` parameter and are only meaningful when the status succeeded.
/// Implementations must be safe to call from several guest threads at once.
pub trait InputBackend: Send + Sync {
    /// Describe the controller attached to `user_index`.
    fn get_capabilities(
        &self,
        user_index: u32,
        flags: u32,
        out: &mut InputCapabilities,
    ) -> XResult;

    /// Snapshot the controller attached to `user_index`.
    fn get_state(&self, user_index: u32, out: &mut InputState) -> XResult;

    /// Drive the motors of the controller attached to `user_index`.
    fn set_state(&self, user_index: u32, vibration: &InputVibration) -> XResult;

    /// Pop the next pending keystroke for `user_index`.
    ///
    /// On success `out.user_index` holds the slot the keystroke came from,
    /// which matters when `user_index` was `XUSER_INDEX_ANY`.
    fn get_keystroke(&self, user_index: u32, flags: u32, out: &mut InputKeystroke) -> XResult;
}

/// A pluggable source of controller input.
///
/// Drivers are combined by an [`InputSystem`](crate::InputSystem), which
/// itself is the [`InputBackend`] the shims talk to.
pub trait InputDriver: InputBackend + fmt::Debug {
    /// Human-readable driver name.
    fn name(&self) -> &str;

    /// User slot this driver is bound to, if it is bound to one.
    fn user_slot(&self) -> Option<u8> {
        None
    }

    /// Called when the driver is attached to an input system.
    fn setup(&self) -> XResult {
        XResult::SUCCESS
    }
}

/// A shared backend reference.
pub type SharedBackend = Arc<dyn InputBackend>;

/// A shared driver reference.
pub type SharedDriver = Arc<dyn InputDriver>;
