//! Built-in input drivers.
//!
//! - [`NopDriver`]: no controllers attached
//! - [`VirtualPadDriver`]: a software controller bound to one user slot

mod nop;
mod virtual_pad;

pub use nop::NopDriver;
pub use virtual_pad::VirtualPadDriver;
