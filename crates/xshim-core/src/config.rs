//! Configuration types for the xshim kernel.
//!
//! Configuration is plain data: it can be built in code with the `with_*`
//! setters or loaded from TOML.
//!
//! ```toml
//! trace_calls = true
//!
//! [memory]
//! size = 1048576
//!
//! [[input.pads]]
//! user_index = 0
//! buttons = 0x1000
//!
//! [[input.pads.keystrokes]]
//! virtual_key = 0x5800
//! flags = 1
//! ```

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};

/// Number of user slots the guest platform supports.
pub const XUSER_MAX_COUNT: u8 = 4;

/// Top-level kernel configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KernelConfig {
    /// Guest address space settings.
    pub memory: MemoryConfig,

    /// Whether shim calls are forwarded to the tracing subscriber.
    pub trace_calls: bool,

    /// Input subsystem settings.
    pub input: InputConfig,
}

impl KernelConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a configuration from TOML text and validate it.
    pub fn from_toml_str(text: &str) -> ConfigResult<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration from a TOML file and validate it.
    pub fn from_file(path: &Path) -> ConfigResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Set the memory configuration.
    pub fn with_memory(mut self, memory: MemoryConfig) -> Self {
        self.memory = memory;
        self
    }

    /// Enable or disable call tracing.
    pub fn with_trace_calls(mut self, enabled: bool) -> Self {
        self.trace_calls = enabled;
        self
    }

    /// Add a virtual pad.
    pub fn with_pad(mut self, pad: PadConfig) -> Self {
        self.input.pads.push(pad);
        self
    }

    /// Check the configuration for values the kernel cannot honor.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.memory.size == 0 {
            return Err(ConfigError::Invalid(
                "memory.size must be greater than zero".to_string(),
            ));
        }
        if self.memory.size > MemoryConfig::MAX_SIZE {
            return Err(ConfigError::Invalid(format!(
                "memory.size {} exceeds the 32-bit guest address space",
                self.memory.size
            )));
        }

        let mut seen = HashSet::new();
        for pad in &self.input.pads {
            if pad.user_index >= XUSER_MAX_COUNT {
                return Err(ConfigError::Invalid(format!(
                    "pad user_index {} is out of range (max {})",
                    pad.user_index,
                    XUSER_MAX_COUNT - 1
                )));
            }
            if !seen.insert(pad.user_index) {
                return Err(ConfigError::Invalid(format!(
                    "user_index {} is assigned to more than one pad",
                    pad.user_index
                )));
            }
        }

        Ok(())
    }
}

/// Guest address space settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MemoryConfig {
    /// Size of the scratch guest address space in bytes.
    ///
    /// Defaults to 1MB.
    pub size: u64,
}

impl MemoryConfig {
    /// Largest address space a 32-bit guest pointer can cover.
    pub const MAX_SIZE: u64 = 1 << 32;

    /// Create a memory configuration of `size` bytes.
    pub fn with_size(size: u64) -> Self {
        Self { size }
    }
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            size: 1024 * 1024, // 1MB
        }
    }
}

/// Input subsystem settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    /// Virtual pads to attach. No pads means every user reports
    /// "not connected".
    pub pads: Vec<PadConfig>,
}

/// A software controller bound to one user slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PadConfig {
    /// User slot the pad answers for.
    pub user_index: u8,
    /// Whether the pad starts plugged in.
    pub connected: bool,
    /// Initial button bitmask.
    pub buttons: u16,
    /// Initial left trigger value.
    pub left_trigger: u8,
    /// Initial right trigger value.
    pub right_trigger: u8,
    /// Initial stick positions: left x, left y, right x, right y.
    pub thumbs: [i16; 4],
    /// Keystrokes queued at startup, delivered in order.
    pub keystrokes: Vec<KeystrokeConfig>,
}

impl PadConfig {
    /// A connected pad at rest for `user_index`.
    pub fn new(user_index: u8) -> Self {
        Self {
            user_index,
            ..Self::default()
        }
    }

    /// Set the initial button bitmask.
    pub fn with_buttons(mut self, buttons: u16) -> Self {
        self.buttons = buttons;
        self
    }

    /// Set whether the pad starts connected.
    pub fn with_connected(mut self, connected: bool) -> Self {
        self.connected = connected;
        self
    }

    /// Queue a keystroke.
    pub fn with_keystroke(mut self, keystroke: KeystrokeConfig) -> Self {
        self.keystrokes.push(keystroke);
        self
    }
}

impl Default for PadConfig {
    fn default() -> Self {
        Self {
            user_index: 0,
            connected: true,
            buttons: 0,
            left_trigger: 0,
            right_trigger: 0,
            thumbs: [0; 4],
            keystrokes: Vec::new(),
        }
    }
}

/// A keystroke to queue on a virtual pad.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeystrokeConfig {
    /// Virtual key code (`VK_PAD_*`).
    pub virtual_key: u16,
    /// Unicode character, if any.
    pub unicode: u16,
    /// Key-down / key-up / repeat flags.
    pub flags: u16,
    /// HID usage code.
    pub hid_code: u8,
}
