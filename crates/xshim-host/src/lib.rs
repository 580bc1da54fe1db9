//! xshim Host - export resolution and shim dispatch
//!
//! This crate provides the boundary between translated guest code and host
//! implementations:
//!
//! - [`ExportResolverBuilder`] / [`ExportResolver`]: the `(module, name)`
//!   export table, registration phase and frozen phase
//! - [`BoundExport`]: an export resolved once at bind time
//! - [`ShimCall`]: the call frame and memory view a handler works with
//! - [`Handler`]: the one interface every shim implements
//!
//! # Example
//!
//! ```
//! use xshim_core::{FlatMemory, PpcContext, XResult, CallContext};
//! use xshim_host::{ExportResolverBuilder, ShimCall, handler_fn};
//!
//! let mut builder = ExportResolverBuilder::new();
//! builder.register(
//!     "xam.xex",
//!     "XamEcho",
//!     &["value"],
//!     handler_fn(|call| {
//!         let value = call.arg32(0);
//!         call.set_return(XResult::from_u32(value));
//!     }),
//! )?;
//! let resolver = builder.build();
//!
//! // Resolve once at bind time, call directly afterwards.
//! let echo = resolver.resolve("xam.xex", "XamEcho")?;
//!
//! let mut ctx = PpcContext::with_args(&[7]);
//! let mut memory = FlatMemory::new(0);
//! echo.invoke(&mut ShimCall::new(&mut ctx, &mut memory));
//! assert_eq!(ctx.return32(), 7);
//! # Ok::<(), xshim_host::ExportError>(())
//! ```

pub mod call;
pub mod error;
pub mod resolver;

// Re-export main types
pub use call::{FnHandler, Handler, ShimCall, handler_fn};
pub use error::{ExportError, ExportResult};
pub use resolver::{BoundExport, ExportRecord, ExportResolver, ExportResolverBuilder};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::call::{Handler, ShimCall, handler_fn};
    pub use crate::error::{ExportError, ExportResult};
    pub use crate::resolver::{BoundExport, ExportResolver, ExportResolverBuilder};
}
