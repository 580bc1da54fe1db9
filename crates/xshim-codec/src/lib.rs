//! xshim Codec - guest record layouts
//!
//! Records exchanged with the guest have fixed sizes, fixed offsets and
//! big-endian fields. This crate defines them and the [`GuestRecord`] trait
//! that moves them across the boundary:
//!
//! - [`InputCapabilities`]: what a controller supports
//! - [`InputState`]: a controller snapshot
//! - [`InputVibration`]: a motor command from the guest
//! - [`InputKeystroke`]: a key event
//!
//! # Example
//!
//! ```
//! use xshim_codec::{GuestRecord, InputVibration};
//! use xshim_core::FlatMemory;
//!
//! let mut memory = FlatMemory::new(0x100);
//! let vibration = InputVibration {
//!     left_motor_speed: 0x8000,
//!     right_motor_speed: 0x0100,
//! };
//!
//! vibration.write_to(&mut memory, 0x20).unwrap();
//! assert_eq!(&memory.as_slice()[0x20..0x24], &[0x80, 0x00, 0x01, 0x00]);
//! assert_eq!(InputVibration::read_from(&memory, 0x20).unwrap(), vibration);
//! ```

pub mod constants;
pub mod input;
pub mod record;

pub use constants::*;
pub use input::{InputCapabilities, InputGamepad, InputKeystroke, InputState, InputVibration};
pub use record::{GuestRecord, RecordLayout};

/// Layouts of every record this crate defines.
pub fn layouts() -> Vec<RecordLayout> {
    vec![
        RecordLayout::of::<InputCapabilities>(),
        RecordLayout::of::<InputState>(),
        RecordLayout::of::<InputGamepad>(),
        RecordLayout::of::<InputVibration>(),
        RecordLayout::of::<InputKeystroke>(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layouts() {
        let layouts = layouts();
        let sizes: Vec<_> = layouts.iter().map(|l| (l.name, l.size)).collect();

        assert_eq!(
            sizes,
            vec![
                ("X_INPUT_CAPABILITIES", 20),
                ("X_INPUT_STATE", 16),
                ("X_INPUT_GAMEPAD", 12),
                ("X_INPUT_VIBRATION", 4),
                ("X_INPUT_KEYSTROKE", 8),
            ]
        );
    }
}
