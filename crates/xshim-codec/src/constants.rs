//! Input subsystem constants shared with the guest platform.

/// User index meaning "whichever user has input".
pub const XUSER_INDEX_ANY: u32 = 0xFF;

/// Restrict a query to gamepad devices.
pub const XINPUT_FLAG_GAMEPAD: u32 = 0x0000_0001;
/// Accept input from any user.
pub const XINPUT_FLAG_ANY_USER: u32 = 1 << 30;

/// Device type: gamepad.
pub const XINPUT_DEVTYPE_GAMEPAD: u8 = 0x01;
/// Device subtype: standard gamepad.
pub const XINPUT_DEVSUBTYPE_GAMEPAD: u8 = 0x01;

/// Keystroke flag: key pressed.
pub const XINPUT_KEYSTROKE_KEYDOWN: u16 = 0x0001;
/// Keystroke flag: key released.
pub const XINPUT_KEYSTROKE_KEYUP: u16 = 0x0002;
/// Keystroke flag: auto-repeat.
pub const XINPUT_KEYSTROKE_REPEAT: u16 = 0x0004;

/// Gamepad button bits.
pub mod buttons {
    pub const DPAD_UP: u16 = 0x0001;
    pub const DPAD_DOWN: u16 = 0x0002;
    pub const DPAD_LEFT: u16 = 0x0004;
    pub const DPAD_RIGHT: u16 = 0x0008;
    pub const START: u16 = 0x0010;
    pub const BACK: u16 = 0x0020;
    pub const LEFT_THUMB: u16 = 0x0040;
    pub const RIGHT_THUMB: u16 = 0x0080;
    pub const LEFT_SHOULDER: u16 = 0x0100;
    pub const RIGHT_SHOULDER: u16 = 0x0200;
    pub const GUIDE: u16 = 0x0400;
    pub const A: u16 = 0x1000;
    pub const B: u16 = 0x2000;
    pub const X: u16 = 0x4000;
    pub const Y: u16 = 0x8000;
}

/// Virtual key codes reported in keystrokes.
pub mod vk {
    pub const PAD_A: u16 = 0x5800;
    pub const PAD_B: u16 = 0x5801;
    pub const PAD_X: u16 = 0x5802;
    pub const PAD_Y: u16 = 0x5803;
    pub const PAD_RSHOULDER: u16 = 0x5804;
    pub const PAD_LSHOULDER: u16 = 0x5805;
    pub const PAD_LTRIGGER: u16 = 0x5806;
    pub const PAD_RTRIGGER: u16 = 0x5807;
    pub const PAD_DPAD_UP: u16 = 0x5810;
    pub const PAD_DPAD_DOWN: u16 = 0x5811;
    pub const PAD_DPAD_LEFT: u16 = 0x5812;
    pub const PAD_DPAD_RIGHT: u16 = 0x5813;
    pub const PAD_START: u16 = 0x5814;
    pub const PAD_BACK: u16 = 0x5815;
    pub const PAD_LTHUMB_PRESS: u16 = 0x5816;
    pub const PAD_RTHUMB_PRESS: u16 = 0x5817;
}
