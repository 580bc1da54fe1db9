//! Driver with nothing plugged in.

use xshim_codec::{InputCapabilities, InputKeystroke, InputState, InputVibration};
use xshim_core::XResult;

use crate::backend::{InputBackend, InputDriver};

/// Reports every user as disconnected.
#[derive(Debug, Clone, Copy, Default)]
pub struct NopDriver;

impl NopDriver {
    /// Create a new nop driver.
    pub fn new() -> Self {
        Self
    }
}

impl InputBackend for NopDriver {
    fn get_capabilities(
        &self,
        _user_index: u32,
        _flags: u32,
        _out: &mut InputCapabilities,
    ) -> XResult {
        XResult::DEVICE_NOT_CONNECTED
    }

    fn get_state(&self, _user_index: u32, _out: &mut InputState) -> XResult {
        XResult::DEVICE_NOT_CONNECTED
    }

    fn set_state(&self, _user_index: u32, _vibration: &InputVibration) -> XResult {
        XResult::DEVICE_NOT_CONNECTED
    }

    fn get_keystroke(&self, _user_index: u32, _flags: u32, _out: &mut InputKeystroke) -> XResult {
        XResult::DEVICE_NOT_CONNECTED
    }
}

impl InputDriver for NopDriver {
    fn name(&self) -> &str {
        "nop"
    }
}
