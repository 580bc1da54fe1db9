//! Driver fan-out.
//!
//! This module provides the `InputSystem` type, which holds the attached
//! drivers and answers each request with the first driver that can serve it.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, info, warn};
use xshim_codec::{InputCapabilities, InputKeystroke, InputState, InputVibration};
use xshim_core::{InputConfig, XResult};

use crate::backend::{InputBackend, InputDriver, SharedDriver};
use crate::driver::{NopDriver, VirtualPadDriver};
use crate::error::{InputError, InputResult};

/// The input subsystem the shims talk to.
///
/// Drivers are consulted in attach order. The first success wins; if no
/// driver succeeds the request reports "not connected", except for
/// keystrokes, where a connected driver with an empty queue turns the answer
/// into [`XResult::EMPTY`].
#[derive(Default)]
pub struct InputSystem {
    drivers: Vec<SharedDriver>,
}

impl InputSystem {
    /// Create a builder.
    pub fn builder() -> InputSystemBuilder {
        InputSystemBuilder::new()
    }

    /// Build an input system from configuration.
    ///
    /// Every configured pad becomes a [`VirtualPadDriver`]; with no pads a
    /// single [`NopDriver`] is attached.
    pub fn from_config(config: &InputConfig) -> InputResult<Self> {
        let mut builder = InputSystemBuilder::new();
        for pad in &config.pads {
            builder = builder.with(VirtualPadDriver::from_config(pad));
        }
        if config.pads.is_empty() {
            builder = builder.with(NopDriver::new());
        }
        builder.build()
    }

    /// Number of attached drivers.
    pub fn len(&self) -> usize {
        self.drivers.len()
    }

    /// Check if no drivers are attached.
    pub fn is_empty(&self) -> bool {
        self.drivers.is_empty()
    }

    /// Names of the attached drivers, in attach order.
    pub fn driver_names(&self) -> Vec<String> {
        self.drivers.iter().map(|d| d.name().to_string()).collect()
    }

    /// Iterate over the attached drivers.
    pub fn drivers(&self) -> impl Iterator<Item = &SharedDriver> + '_ {
        self.drivers.iter()
    }
}

impl InputBackend for InputSystem {
    fn get_capabilities(
        &self,
        user_index: u32,
        flags: u32,
        out: &mut InputCapabilities,
    ) -> XResult {
        for driver in &self.drivers {
            if driver.get_capabilities(user_index, flags, out).succeeded() {
                return XResult::SUCCESS;
            }
        }
        XResult::DEVICE_NOT_CONNECTED
    }

    fn get_state(&self, user_index: u32, out: &mut InputState) -> XResult {
        for driver in &self.drivers {
            if driver.get_state(user_index, out).succeeded() {
                return XResult::SUCCESS;
            }
        }
        XResult::DEVICE_NOT_CONNECTED
    }

    fn set_state(&self, user_index: u32, vibration: &InputVibration) -> XResult {
        for driver in &self.drivers {
            if driver.set_state(user_index, vibration).succeeded() {
                return XResult::SUCCESS;
            }
        }
        XResult::DEVICE_NOT_CONNECTED
    }

    fn get_keystroke(&self, user_index: u32, flags: u32, out: &mut InputKeystroke) -> XResult {
        let mut any_connected = false;
        for driver in &self.drivers {
            let result = driver.get_keystroke(user_index, flags, out);
            if result != XResult::DEVICE_NOT_CONNECTED {
                any_connected = true;
            }
            if result.succeeded() {
                return XResult::SUCCESS;
            }
        }

        if any_connected {
            XResult::EMPTY
        } else {
            XResult::DEVICE_NOT_CONNECTED
        }
    }
}

impl std::fmt::Debug for InputSystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InputSystem")
            .field("drivers", &self.driver_names())
            .finish()
    }
}

/// Builder for constructing an input system.
#[derive(Default)]
pub struct InputSystemBuilder {
    drivers: Vec<SharedDriver>,
}

impl InputSystemBuilder {
    /// Create a new builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a driver.
    pub fn with<D: InputDriver + 'static>(mut self, driver: D) -> Self {
        self.drivers.push(Arc::new(driver));
        self
    }

    /// Attach a shared driver, keeping a handle to it outside the system.
    pub fn with_shared(mut self, driver: SharedDriver) -> Self {
        self.drivers.push(driver);
        self
    }

    /// Set up every driver and build the system.
    ///
    /// # Errors
    ///
    /// Fails if a driver's setup reports failure or two drivers claim the
    /// same user slot.
    pub fn build(self) -> InputResult<InputSystem> {
        let mut slots = HashSet::new();

        for driver in &self.drivers {
            if let Some(slot) = driver.user_slot() {
                if !slots.insert(slot) {
                    return Err(InputError::SlotConflict(slot));
                }
            }

            let result = driver.setup();
            if result.failed() {
                warn!(driver = driver.name(), %result, "Input driver setup failed");
                return Err(InputError::DriverSetupFailed {
                    driver: driver.name().to_string(),
                    result,
                });
            }
            debug!(driver = driver.name(), "Input driver attached");
        }

        info!(drivers = self.drivers.len(), "Input system ready");
        Ok(InputSystem {
            drivers: self.drivers,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use xshim_codec::XUSER_INDEX_ANY;
    use xshim_core::PadConfig;

    #[derive(Debug)]
    struct BrokenDriver;

    impl InputBackend for BrokenDriver {
        fn get_capabilities(&self, _: u32, _: u32, _: &mut InputCapabilities) -> XResult {
            XResult::DEVICE_NOT_CONNECTED
        }

        fn get_state(&self, _: u32, _: &mut InputState) -> XResult {
            XResult::DEVICE_NOT_CONNECTED
        }

        fn set_state(&self, _: u32, _: &InputVibration) -> XResult {
            XResult::DEVICE_NOT_CONNECTED
        }

        fn get_keystroke(&self, _: u32, _: u32, _: &mut InputKeystroke) -> XResult {
            XResult::DEVICE_NOT_CONNECTED
        }
    }

    impl InputDriver for BrokenDriver {
        fn name(&self) -> &str {
            "broken"
        }

        fn setup(&self) -> XResult {
            XResult::BUSY
        }
    }

    #[test]
    fn test_empty_system_reports_not_connected() {
        let system = InputSystem::builder().build().unwrap();
        let mut state = InputState::default();
        let mut keystroke = InputKeystroke::default();

        assert!(system.is_empty());
        assert_eq!(system.get_state(0, &mut state), XResult::DEVICE_NOT_CONNECTED);
        assert_eq!(
            system.get_keystroke(0, 0, &mut keystroke),
            XResult::DEVICE_NOT_CONNECTED
        );
    }

    #[test]
    fn test_first_success_wins() {
        let system = InputSystem::builder()
            .with(NopDriver::new())
            .with(VirtualPadDriver::new(1))
            .build()
            .unwrap();
        let mut state = InputState::default();

        assert_eq!(system.get_state(1, &mut state), XResult::SUCCESS);
        assert_eq!(system.get_state(0, &mut state), XResult::DEVICE_NOT_CONNECTED);
        assert_eq!(system.driver_names(), vec!["nop", "virtual-pad"]);
    }

    #[test]
    fn test_keystroke_empty_vs_not_connected() {
        let pad = Arc::new(VirtualPadDriver::new(0));
        let system = InputSystem::builder()
            .with(NopDriver::new())
            .with_shared(Arc::clone(&pad) as SharedDriver)
            .build()
            .unwrap();
        let mut out = InputKeystroke::default();

        assert_eq!(system.get_keystroke(0, 0, &mut out), XResult::EMPTY);
        assert_eq!(system.get_keystroke(3, 0, &mut out), XResult::DEVICE_NOT_CONNECTED);

        pad.push_keystroke(InputKeystroke {
            virtual_key: 0x5800,
            ..Default::default()
        });
        assert_eq!(
            system.get_keystroke(XUSER_INDEX_ANY, 0, &mut out),
            XResult::SUCCESS
        );
        assert_eq!(out.user_index, 0);
    }

    #[test]
    fn test_setup_failure() {
        let result = InputSystem::builder().with(BrokenDriver).build();
        assert!(matches!(
            result,
            Err(InputError::DriverSetupFailed { result: XResult::BUSY, .. })
        ));
    }

    #[test]
    fn test_slot_conflict() {
        let result = InputSystem::builder()
            .with(VirtualPadDriver::new(0))
            .with(VirtualPadDriver::new(0))
            .build();
        assert!(matches!(result, Err(InputError::SlotConflict(0))));
    }

    #[test]
    fn test_from_config() {
        let system = InputSystem::from_config(&InputConfig::default()).unwrap();
        assert_eq!(system.driver_names(), vec!["nop"]);

        let config = InputConfig {
            pads: vec![PadConfig::new(0), PadConfig::new(1).with_connected(false)],
        };
        let system = InputSystem::from_config(&config).unwrap();
        let mut state = InputState::default();

        assert_eq!(system.len(), 2);
        assert_eq!(system.get_state(0, &mut state), XResult::SUCCESS);
        assert_eq!(system.get_state(1, &mut state), XResult::DEVICE_NOT_CONNECTED);
    }
}
