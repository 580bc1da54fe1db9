//! xshim Core - guest-facing primitives
//!
//! This crate provides the pieces every shim needs to cross the guest/host
//! boundary:
//!
//! - [`GuestMemory`]: bounds-checked, big-endian view over guest memory
//! - [`CallContext`]: positional arguments and the return slot of a guest call
//! - [`XResult`]: the status value every guest-facing call returns
//! - Configuration types for the kernel
//!
//! # Quick Start
//!
//! ```
//! use xshim_core::prelude::*;
//!
//! let mut memory = FlatMemory::new(0x2000);
//! let mut ctx = PpcContext::with_args(&[0, 0x1000]);
//!
//! let state_ptr = ctx.arg32(1, &memory);
//! memory.write_u32(state_ptr, 42).unwrap();
//! ctx.set_return32(XResult::SUCCESS.as_u32());
//!
//! assert_eq!(memory.read_u32(0x1000).unwrap(), 42);
//! assert_eq!(ctx.return32(), 0);
//! ```

pub mod config;
pub mod context;
pub mod error;
pub mod memory;
pub mod result;

// Re-export main types at crate root
pub use config::{
    InputConfig, KernelConfig, KeystrokeConfig, MemoryConfig, PadConfig, XUSER_MAX_COUNT,
};
pub use context::{CallContext, PpcContext, REGISTER_ARGS};
pub use error::{AddressFault, ConfigError, ConfigResult, MemoryError, MemoryResult};
pub use memory::{FlatMemory, GuestMemory, NULL_GUEST_PTR, check_aligned};
pub use result::XResult;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::config::{KernelConfig, MemoryConfig, PadConfig};
    pub use crate::context::{CallContext, PpcContext};
    pub use crate::error::{MemoryError, MemoryResult};
    pub use crate::memory::{FlatMemory, GuestMemory};
    pub use crate::result::XResult;
}
