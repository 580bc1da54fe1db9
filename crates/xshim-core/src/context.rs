//! Emulated call frame.
//!
//! The guest ABI passes the first eight integer arguments in r3..r10 and the
//! rest in the caller's parameter save area on the stack. Handlers only ever
//! ask for "argument N"; where that argument physically lives is decided
//! here.

use tracing::warn;

use crate::memory::GuestMemory;

/// Number of integer arguments passed in registers.
pub const REGISTER_ARGS: usize = 8;

/// First argument register (r3).
pub const FIRST_ARG_GPR: usize = 3;

/// Stack pointer register (r1).
pub const STACK_POINTER_GPR: usize = 1;

/// Offset from the stack pointer to the first stack-passed argument.
pub const STACK_ARGS_OFFSET: u32 = 0x54;

/// Size of one stack argument slot.
pub const STACK_SLOT_SIZE: u32 = 8;

/// Abstraction over the emulated call frame of a single guest call.
pub trait CallContext: Send {
    /// Positional 32-bit argument `index` (zero-based).
    ///
    /// Stack-passed arguments are read through `memory`. A slot that cannot
    /// be read yields `0`, the null sentinel.
    fn arg32(&self, index: usize, memory: &dyn GuestMemory) -> u32;

    /// Store the call's 32-bit return value.
    fn set_return32(&mut self, value: u32);

    /// The 32-bit return value currently stored.
    fn return32(&self) -> u32;
}

/// Register file of the emulated PowerPC thread making the call.
#[derive(Clone, PartialEq, Eq)]
pub struct PpcContext {
    /// General purpose registers r0..r31.
    pub r: [u64; 32],
}

impl PpcContext {
    /// Create a context with all registers cleared.
    pub fn new() -> Self {
        Self { r: [0; 32] }
    }

    /// Create a context with the given register arguments loaded into r3...
    ///
    /// At most [`REGISTER_ARGS`] values are used.
    pub fn with_args(args: &[u32]) -> Self {
        let mut ctx = Self::new();
        for (i, value) in args.iter().take(REGISTER_ARGS).enumerate() {
            ctx.r[FIRST_ARG_GPR + i] = u64::from(*value);
        }
        ctx
    }

    /// Set the stack pointer.
    pub fn with_stack_pointer(mut self, sp: u32) -> Self {
        self.r[STACK_POINTER_GPR] = u64::from(sp);
        self
    }

    /// Guest address of the stack slot holding argument `index`.
    ///
    /// Returns `None` for arguments passed in registers.
    pub fn stack_arg_address(&self, index: usize) -> Option<u32> {
        let slot = index.checked_sub(REGISTER_ARGS)? as u32;
        let sp = self.r[STACK_POINTER_GPR] as u32;
        Some(
            sp.wrapping_add(STACK_ARGS_OFFSET)
                .wrapping_add(slot.wrapping_mul(STACK_SLOT_SIZE)),
        )
    }
}

impl Default for PpcContext {
    fn default() -> Self {
        Self::new()
    }
}

impl CallContext for PpcContext {
    fn arg32(&self, index: usize, memory: &dyn GuestMemory) -> u32 {
        let Some(address) = self.stack_arg_address(index) else {
            return self.r[FIRST_ARG_GPR + index] as u32;
        };

        match memory.read_u32(address) {
            Ok(value) => value,
            Err(err) => {
                warn!(index, address, error = %err, "Unreadable stack argument");
                0
            }
        }
    }

    fn set_return32(&mut self, value: u32) {
        self.r[FIRST_ARG_GPR] = u64::from(value);
    }

    fn return32(&self) -> u32 {
        self.r[FIRST_ARG_GPR] as u32
    }
}

impl std::fmt::Debug for PpcContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PpcContext")
            .field("r1", &format_args!("{:#010X}", self.r[STACK_POINTER_GPR]))
            .field("r3", &format_args!("{:#010X}", self.r[FIRST_ARG_GPR]))
            .field("r4", &format_args!("{:#010X}", self.r[FIRST_ARG_GPR + 1]))
            .field("r5", &format_args!("{:#010X}", self.r[FIRST_ARG_GPR + 2]))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::FlatMemory;

    #[test]
    fn test_register_args() {
        let memory = FlatMemory::new(0);
        let ctx = PpcContext::with_args(&[7, 0xDEAD_BEEF, 0x1000]);

        assert_eq!(ctx.arg32(0, &memory), 7);
        assert_eq!(ctx.arg32(1, &memory), 0xDEAD_BEEF);
        assert_eq!(ctx.arg32(2, &memory), 0x1000);
        assert_eq!(ctx.arg32(3, &memory), 0);
    }

    #[test]
    fn test_register_args_truncate_to_low_word() {
        let memory = FlatMemory::new(0);
        let mut ctx = PpcContext::new();
        ctx.r[3] = 0xFFFF_FFFF_0000_0010;

        assert_eq!(ctx.arg32(0, &memory), 0x10);
    }

    #[test]
    fn test_stack_args() {
        let mut memory = FlatMemory::new(0x2000);
        let ctx = PpcContext::with_args(&[0; 8]).with_stack_pointer(0x1000);

        memory.write_u32(0x1000 + 0x54, 0xAAAA_0001).unwrap();
        memory.write_u32(0x1000 + 0x54 + 8, 0xAAAA_0002).unwrap();

        assert_eq!(ctx.stack_arg_address(0), None);
        assert_eq!(ctx.stack_arg_address(7), None);
        assert_eq!(ctx.stack_arg_address(8), Some(0x1054));
        assert_eq!(ctx.arg32(8, &memory), 0xAAAA_0001);
        assert_eq!(ctx.arg32(9, &memory), 0xAAAA_0002);
    }

    #[test]
    fn test_unreadable_stack_arg_is_null() {
        let memory = FlatMemory::new(0x100);
        let ctx = PpcContext::new().with_stack_pointer(0xFFFF_0000);

        assert_eq!(ctx.arg32(8, &memory), 0);
    }

    #[test]
    fn test_return_value() {
        let mut ctx = PpcContext::with_args(&[0x1234]);
        ctx.set_return32(0xA0);

        assert_eq!(ctx.return32(), 0xA0);
        assert_eq!(ctx.r[3], 0xA0);
    }
}
