//! The view a shim handler gets of a single guest call.
//!
//! This module provides [`ShimCall`], which pairs the emulated call frame
//! with the guest memory view, and the [`Handler`] trait every shim
//! implements.

use xshim_core::{CallContext, GuestMemory, XResult};

/// A guest call in flight.
///
/// Lives for exactly one handler invocation.
pub struct ShimCall<'a> {
    ctx: &'a mut dyn CallContext,
    memory: &'a mut dyn GuestMemory,
}

impl<'a> ShimCall<'a> {
    /// Create a call over a frame and a memory view.
    pub fn new(ctx: &'a mut dyn CallContext, memory: &'a mut dyn GuestMemory) -> Self {
        Self { ctx, memory }
    }

    /// Positional 32-bit argument `index`.
    pub fn arg32(&self, index: usize) -> u32 {
        self.ctx.arg32(index, &*self.memory)
    }

    /// First `count` arguments, in order.
    pub fn args32(&self, count: usize) -> Vec<u32> {
        (0..count).map(|i| self.arg32(i)).collect()
    }

    /// Store the call's result code.
    pub fn set_return(&mut self, result: XResult) {
        self.ctx.set_return32(result.as_u32());
    }

    /// The result code currently stored.
    pub fn result(&self) -> XResult {
        XResult::from_u32(self.ctx.return32())
    }

    /// Guest memory.
    pub fn memory(&self) -> &dyn GuestMemory {
        &*self.memory
    }

    /// Guest memory, mutably.
    pub fn memory_mut(&mut self) -> &mut dyn GuestMemory {
        &mut *self.memory
    }
}

impl std::fmt::Debug for ShimCall<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShimCall")
            .field("result", &self.result())
            .field("memory_size", &self.memory.size())
            .finish()
    }
}

/// A host implementation behind a guest export.
///
/// A handler reports every outcome through [`ShimCall::set_return`]; it
/// never panics on bad guest input.
pub trait Handler: Send + Sync {
    /// Run the call to completion.
    fn invoke(&self, call: &mut ShimCall<'_>);
}

/// A [`Handler`] built from a closure.
pub struct FnHandler<F>(F);

impl<F> Handler for FnHandler<F>
where
    F: Fn(&mut ShimCall<'_>) + Send + Sync,
{
    fn invoke(&self, call: &mut ShimCall<'_>) {
        (self.0)(call)
    }
}

/// Wrap a closure as a [`Handler`].
pub fn handler_fn<F>(f: F) -> FnHandler<F>
where
    F: Fn(&mut ShimCall<'_>) + Send + Sync,
{
    FnHandler(f)
}

#[cfg(test)]
mod tests {
    use super::*;
    use xshim_core::{FlatMemory, PpcContext};

    #[test]
    fn test_shim_call_args_and_result() {
        let mut ctx = PpcContext::with_args(&[1, 2, 3]);
        let mut memory = FlatMemory::new(0x10);
        let mut call = ShimCall::new(&mut ctx, &mut memory);

        assert_eq!(call.args32(3), vec![1, 2, 3]);

        call.set_return(XResult::EMPTY);
        assert_eq!(call.result(), XResult::EMPTY);
        assert_eq!(ctx.r[3], 0x10D2);
    }

    #[test]
    fn test_handler_fn() {
        let handler = handler_fn(|call| {
            let value = call.arg32(0);
            call.memory_mut().write_u32(0, value).unwrap();
            call.set_return(XResult::SUCCESS);
        });

        let mut ctx = PpcContext::with_args(&[0xCAFE]);
        let mut memory = FlatMemory::new(0x10);
        handler.invoke(&mut ShimCall::new(&mut ctx, &mut memory));

        assert_eq!(memory.read_u32(0).unwrap(), 0xCAFE);
        assert_eq!(ctx.return32(), 0);
    }
}
