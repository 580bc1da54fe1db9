//! Input subsystem records.
//!
//! Layouts follow the guest platform's XINPUT structure definitions. All
//! multi-byte fields are big-endian and there is no implicit padding.

use byteorder::{BigEndian, ByteOrder};
use serde::{Deserialize, Serialize};

use crate::record::GuestRecord;

/// Controller state: buttons, triggers and sticks.
///
/// Embedded in [`InputState`] at offset 4 and in [`InputCapabilities`] at
/// offset 4.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InputGamepad {
    /// Digital button bitmask (`XINPUT_GAMEPAD_*`).
    pub buttons: u16,
    /// Left trigger, 0..=255.
    pub left_trigger: u8,
    /// Right trigger, 0..=255.
    pub right_trigger: u8,
    /// Left stick x.
    pub thumb_lx: i16,
    /// Left stick y.
    pub thumb_ly: i16,
    /// Right stick x.
    pub thumb_rx: i16,
    /// Right stick y.
    pub thumb_ry: i16,
}

impl InputGamepad {
    const LEN: usize = 12;

    fn read_fields(buf: &[u8]) -> Self {
        Self {
            buttons: BigEndian::read_u16(&buf[0..2]),
            left_trigger: buf[2],
            right_trigger: buf[3],
            thumb_lx: BigEndian::read_i16(&buf[4..6]),
            thumb_ly: BigEndian::read_i16(&buf[6..8]),
            thumb_rx: BigEndian::read_i16(&buf[8..10]),
            thumb_ry: BigEndian::read_i16(&buf[10..12]),
        }
    }

    fn write_fields(&self, buf: &mut [u8]) {
        BigEndian::write_u16(&mut buf[0..2], self.buttons);
        buf[2] = self.left_trigger;
        buf[3] = self.right_trigger;
        BigEndian::write_i16(&mut buf[4..6], self.thumb_lx);
        BigEndian::write_i16(&mut buf[6..8], self.thumb_ly);
        BigEndian::write_i16(&mut buf[8..10], self.thumb_rx);
        BigEndian::write_i16(&mut buf[10..12], self.thumb_ry);
    }
}

impl GuestRecord for InputGamepad {
    const NAME: &'static str = "X_INPUT_GAMEPAD";
    const SIZE: usize = Self::LEN;
    const ALIGN: u32 = 2;
    type Raw = [u8; 12];

    fn decode(raw: &Self::Raw) -> Self {
        Self::read_fields(raw)
    }

    fn encode(&self, raw: &mut Self::Raw) {
        self.write_fields(raw);
    }
}

/// Vibration command sent by the guest.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InputVibration {
    /// Low-frequency motor speed.
    pub left_motor_speed: u16,
    /// High-frequency motor speed.
    pub right_motor_speed: u16,
}

impl InputVibration {
    const LEN: usize = 4;

    fn read_fields(buf: &[u8]) -> Self {
        Self {
            left_motor_speed: BigEndian::read_u16(&buf[0..2]),
            right_motor_speed: BigEndian::read_u16(&buf[2..4]),
        }
    }

    fn write_fields(&self, buf: &mut [u8]) {
        BigEndian::write_u16(&mut buf[0..2], self.left_motor_speed);
        BigEndian::write_u16(&mut buf[2..4], self.right_motor_speed);
    }
}

impl GuestRecord for InputVibration {
    const NAME: &'static str = "X_INPUT_VIBRATION";
    const SIZE: usize = Self::LEN;
    const ALIGN: u32 = 2;
    type Raw = [u8; 4];

    fn decode(raw: &Self::Raw) -> Self {
        Self::read_fields(raw)
    }

    fn encode(&self, raw: &mut Self::Raw) {
        self.write_fields(raw);
    }
}

/// Snapshot of a controller, tagged with a packet number that changes
/// whenever the state does.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InputState {
    /// Monotonic state counter.
    pub packet_number: u32,
    /// Controller state.
    pub gamepad: InputGamepad,
}

impl GuestRecord for InputState {
    const NAME: &'static str = "X_INPUT_STATE";
    const SIZE: usize = 4 + InputGamepad::LEN;
    const ALIGN: u32 = 4;
    type Raw = [u8; 16];

    fn decode(raw: &Self::Raw) -> Self {
        Self {
            packet_number: BigEndian::read_u32(&raw[0..4]),
            gamepad: InputGamepad::read_fields(&raw[4..16]),
        }
    }

    fn encode(&self, raw: &mut Self::Raw) {
        BigEndian::write_u32(&mut raw[0..4], self.packet_number);
        self.gamepad.write_fields(&mut raw[4..16]);
    }
}

/// Description of what a connected controller supports.
///
/// `gamepad` and `vibration` carry the resolution of each control rather
/// than a live value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InputCapabilities {
    /// Device type (`XINPUT_DEVTYPE_*`).
    pub kind: u8,
    /// Device subtype (`XINPUT_DEVSUBTYPE_*`).
    pub sub_kind: u8,
    /// Capability flags.
    pub flags: u16,
    /// Supported controls.
    pub gamepad: InputGamepad,
    /// Supported motors.
    pub vibration: InputVibration,
}

impl GuestRecord for InputCapabilities {
    const NAME: &'static str = "X_INPUT_CAPABILITIES";
    const SIZE: usize = 4 + InputGamepad::LEN + InputVibration::LEN;
    const ALIGN: u32 = 2;
    type Raw = [u8; 20];

    fn decode(raw: &Self::Raw) -> Self {
        Self {
            kind: raw[0],
            sub_kind: raw[1],
            flags: BigEndian::read_u16(&raw[2..4]),
            gamepad: InputGamepad::read_fields(&raw[4..16]),
            vibration: InputVibration::read_fields(&raw[16..20]),
        }
    }

    fn encode(&self, raw: &mut Self::Raw) {
        raw[0] = self.kind;
        raw[1] = self.sub_kind;
        BigEndian::write_u16(&mut raw[2..4], self.flags);
        self.gamepad.write_fields(&mut raw[4..16]);
        self.vibration.write_fields(&mut raw[16..20]);
    }
}

/// A single key event from a controller or chatpad.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InputKeystroke {
    /// Virtual key code (`VK_PAD_*`).
    pub virtual_key: u16,
    /// Unicode character, or zero.
    pub unicode: u16,
    /// `XINPUT_KEYSTROKE_*` flags.
    pub flags: u16,
    /// User slot the event came from.
    pub user_index: u8,
    /// HID usage code.
    pub hid_code: u8,
}

impl GuestRecord for InputKeystroke {
    const NAME: &'static str = "X_INPUT_KEYSTROKE";
    const SIZE: usize = 8;
    const ALIGN: u32 = 2;
    type Raw = [u8; 8];

    fn decode(raw: &Self::Raw) -> Self {
        Self {
            virtual_key: BigEndian::read_u16(&raw[0..2]),
            unicode: BigEndian::read_u16(&raw[2..4]),
            flags: BigEndian::read_u16(&raw[4..6]),
            user_index: raw[6],
            hid_code: raw[7],
        }
    }

    fn encode(&self, raw: &mut Self::Raw) {
        BigEndian::write_u16(&mut raw[0..2], self.virtual_key);
        BigEndian::write_u16(&mut raw[2..4], self.unicode);
        BigEndian::write_u16(&mut raw[4..6], self.flags);
        raw[6] = self.user_index;
        raw[7] = self.hid_code;
    }
}
