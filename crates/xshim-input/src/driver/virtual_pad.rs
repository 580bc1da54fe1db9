//! Software controller driven from host code or configuration.

use std::collections::VecDeque;

use parking_lot::{Mutex, RwLock};
use tracing::{debug, trace};
use xshim_codec::{
    InputCapabilities, InputGamepad, InputKeystroke, InputState, InputVibration,
    XINPUT_DEVSUBTYPE_GAMEPAD, XINPUT_DEVTYPE_GAMEPAD, XINPUT_FLAG_ANY_USER, XUSER_INDEX_ANY,
};
use xshim_core::{PadConfig, XResult};

use crate::backend::{InputBackend, InputDriver};

#[derive(Debug, Clone, Copy)]
struct PadState {
    connected: bool,
    state: InputState,
}

/// A virtual controller bound to one user slot.
///
/// The pad holds a state snapshot, a keystroke queue and the last vibration
/// command it received. Every change to the controller state bumps the
/// packet number, the way real hardware reports it.
///
/// # Example
///
/// ```
/// use xshim_codec::{InputGamepad, InputState, buttons};
/// use xshim_core::XResult;
/// use xshim_input::{InputBackend, VirtualPadDriver};
///
/// let pad = VirtualPadDriver::new(0);
/// pad.set_gamepad(InputGamepad { buttons: buttons::A, ..Default::default() });
///
/// let mut state = InputState::default();
/// assert_eq!(pad.get_state(0, &mut state), XResult::SUCCESS);
/// assert_eq!(state.gamepad.buttons, buttons::A);
/// assert_eq!(state.packet_number, 1);
/// ```
#[derive(Debug)]
pub struct VirtualPadDriver {
    user_index: u8,
    pad: RwLock<PadState>,
    keystrokes: Mutex<VecDeque<InputKeystroke>>,
    vibration: Mutex<Option<InputVibration>>,
}

impl VirtualPadDriver {
    /// Create a connected pad at rest for `user_index`.
    pub fn new(user_index: u8) -> Self {
        Self {
            user_index,
            pad: RwLock::new(PadState {
                connected: true,
                state: InputState::default(),
            }),
            keystrokes: Mutex::new(VecDeque::new()),
            vibration: Mutex::new(None),
        }
    }

    /// Create a pad from configuration.
    pub fn from_config(config: &PadConfig) -> Self {
        let pad = Self::new(config.user_index);
        {
            let mut inner = pad.pad.write();
            inner.connected = config.connected;
            inner.state.gamepad = InputGamepad {
                buttons: config.buttons,
                left_trigger: config.left_trigger,
                right_trigger: config.right_trigger,
                thumb_lx: config.thumbs[0],
                thumb_ly: config.thumbs[1],
                thumb_rx: config.thumbs[2],
                thumb_ry: config.thumbs[3],
            };
        }
        for keystroke in &config.keystrokes {
            pad.push_keystroke(InputKeystroke {
                virtual_key: keystroke.virtual_key,
                unicode: keystroke.unicode,
                flags: keystroke.flags,
                user_index: config.user_index,
                hid_code: keystroke.hid_code,
            });
        }
        pad
    }

    /// The user slot this pad answers for.
    pub fn user_index(&self) -> u8 {
        self.user_index
    }

    /// Plug the pad in or pull it out.
    pub fn set_connected(&self, connected: bool) {
        self.pad.write().connected = connected;
        debug!(user_index = self.user_index, connected, "Virtual pad connection changed");
    }

    /// Check if the pad is plugged in.
    pub fn is_connected(&self) -> bool {
        self.pad.read().connected
    }

    /// Replace the controller state and bump the packet number.
    pub fn set_gamepad(&self, gamepad: InputGamepad) {
        let mut pad = self.pad.write();
        pad.state.gamepad = gamepad;
        pad.state.packet_number = pad.state.packet_number.wrapping_add(1);
    }

    /// Current controller state.
    pub fn state(&self) -> InputState {
        self.pad.read().state
    }

    /// Queue a keystroke. Its user index is forced to this pad's slot.
    pub fn push_keystroke(&self, keystroke: InputKeystroke) {
        self.keystrokes.lock().push_back(InputKeystroke {
            user_index: self.user_index,
            ..keystroke
        });
    }

    /// Number of keystrokes waiting.
    pub fn pending_keystrokes(&self) -> usize {
        self.keystrokes.lock().len()
    }

    /// The last vibration command received, if any.
    pub fn last_vibration(&self) -> Option<InputVibration> {
        *self.vibration.lock()
    }

    fn owns(&self, user_index: u32) -> bool {
        user_index == u32::from(self.user_index)
    }

    fn answers_keystroke(&self, user_index: u32, flags: u32) -> bool {
        self.owns(user_index) || user_index == XUSER_INDEX_ANY || flags & XINPUT_FLAG_ANY_USER != 0
    }
}

impl InputBackend for VirtualPadDriver {
    fn get_capabilities(
        &self,
        user_index: u32,
        _flags: u32,
        out: &mut InputCapabilities,
    ) -> XResult {
        if !self.owns(user_index) || !self.is_connected() {
            return XResult::DEVICE_NOT_CONNECTED;
        }

        *out = InputCapabilities {
            kind: XINPUT_DEVTYPE_GAMEPAD,
            sub_kind: XINPUT_DEVSUBTYPE_GAMEPAD,
            flags: 0,
            gamepad: InputGamepad {
                buttons: 0xF7FF,
                left_trigger: 0xFF,
                right_trigger: 0xFF,
                thumb_lx: -64,
                thumb_ly: -64,
                thumb_rx: -64,
                thumb_ry: -64,
            },
            vibration: InputVibration {
                left_motor_speed: 0xFFFF,
                right_motor_speed: 0xFFFF,
            },
        };
        XResult::SUCCESS
    }

    fn get_state(&self, user_index: u32, out: &mut InputState) -> XResult {
        if !self.owns(user_index) {
            return XResult::DEVICE_NOT_CONNECTED;
        }

        let pad = self.pad.read();
        if !pad.connected {
            return XResult::DEVICE_NOT_CONNECTED;
        }
        *out = pad.state;
        XResult::SUCCESS
    }

    fn set_state(&self, user_index: u32, vibration: &InputVibration) -> XResult {
        if !self.owns(user_index) || !self.is_connected() {
            return XResult::DEVICE_NOT_CONNECTED;
        }

        trace!(
            user_index,
            left = vibration.left_motor_speed,
            right = vibration.right_motor_speed,
            "Virtual pad vibration"
        );
        *self.vibration.lock() = Some(*vibration);
        XResult::SUCCESS
    }

    fn get_keystroke(&self, user_index: u32, flags: u32, out: &mut InputKeystroke) -> XResult {
        if !self.answers_keystroke(user_index, flags) || !self.is_connected() {
            return XResult::DEVICE_NOT_CONNECTED;
        }

        match self.keystrokes.lock().pop_front() {
            Some(keystroke) => {
                *out = keystroke;
                XResult::SUCCESS
            }
            None => XResult::EMPTY,
        }
    }
}

impl InputDriver for VirtualPadDriver {
    fn name(&self) -> &str {
        "virtual-pad"
    }

    fn user_slot(&self) -> Option<u8> {
        Some(self.user_index)
    }
}
