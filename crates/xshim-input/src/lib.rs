//! xshim Input - the input capability backend
//!
//! The input shims never talk to devices themselves. They call an
//! [`InputBackend`], which in a running kernel is an [`InputSystem`] that fans
//! requests out to a list of [`InputDriver`]s.
//!
//! # Built-in Drivers
//!
//! - [`NopDriver`]: every user reports "not connected"
//! - [`VirtualPadDriver`]: a software controller for one user slot
//!
//! # Usage
//!
//! ```
//! use xshim_codec::InputState;
//! use xshim_core::XResult;
//! use xshim_input::{InputBackend, InputSystem, VirtualPadDriver};
//!
//! let system = InputSystem::builder()
//!     .with(VirtualPadDriver::new(0))
//!     .build()?;
//!
//! let mut state = InputState::default();
//! assert_eq!(system.get_state(0, &mut state), XResult::SUCCESS);
//! assert_eq!(system.get_state(1, &mut state), XResult::DEVICE_NOT_CONNECTED);
//! # Ok::<(), xshim_input::InputError>(())
//! ```

pub mod backend;
pub mod driver;
pub mod error;
pub mod system;

pub use backend::{InputBackend, InputDriver, SharedBackend, SharedDriver};
pub use driver::{NopDriver, VirtualPadDriver};
pub use error::{InputError, InputResult};
pub use system::{InputSystem, InputSystemBuilder};
