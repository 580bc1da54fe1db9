//! Bounds-checked view over the guest's linear address space.
//!
//! Guest pointers are 32-bit offsets. Every access is checked against the end
//! of the address space before a single byte moves, so a rejected write never
//! leaves a partial record behind. Multi-byte scalars are stored big-endian,
//! the guest's byte order.

use byteorder::{BigEndian, ByteOrder};

use crate::error::{AddressFault, MemoryError, MemoryResult};

/// The reserved guest pointer value meaning "no argument supplied".
pub const NULL_GUEST_PTR: u32 = 0;

/// Accessor over guest memory.
///
/// Implementations only need to provide raw byte copies; the scalar helpers
/// are built on top and always use guest byte order.
pub trait GuestMemory: Send {
    /// Size of the guest address space in bytes.
    fn size(&self) -> u64;

    /// Copy `buf.len()` bytes starting at `address` into `buf`.
    fn read_bytes(&self, address: u32, buf: &mut [u8]) -> MemoryResult<()>;

    /// Copy `data` into guest memory starting at `address`.
    ///
    /// Implementations must reject the whole write if any part of the range
    /// is invalid.
    fn write_bytes(&mut self, address: u32, data: &[u8]) -> MemoryResult<()>;

    /// Check that `address..address + len` lies inside the address space.
    fn check_range(&self, address: u32, len: usize) -> MemoryResult<()> {
        let end = u64::from(address) + len as u64;
        if end > self.size() {
            return Err(MemoryError::InvalidAddress {
                address,
                len,
                fault: AddressFault::OutOfRange { limit: self.size() },
            });
        }
        Ok(())
    }

    /// Check that `address..address + len` may be written.
    ///
    /// Views with read-only regions override this; the default only checks
    /// the range.
    fn check_writable(&self, address: u32, len: usize) -> MemoryResult<()> {
        self.check_range(address, len)
    }

    /// Read a byte.
    fn read_u8(&self, address: u32) -> MemoryResult<u8> {
        let mut buf = [0u8; 1];
        self.read_bytes(address, &mut buf)?;
        Ok(buf[0])
    }

    /// Read a big-endian 16-bit value.
    fn read_u16(&self, address: u32) -> MemoryResult<u16> {
        let mut buf = [0u8; 2];
        self.read_bytes(address, &mut buf)?;
        Ok(BigEndian::read_u16(&buf))
    }

    /// Read a big-endian 32-bit value.
    fn read_u32(&self, address: u32) -> MemoryResult<u32> {
        let mut buf = [0u8; 4];
        self.read_bytes(address, &mut buf)?;
        Ok(BigEndian::read_u32(&buf))
    }

    /// Write a byte.
    fn write_u8(&mut self, address: u32, value: u8) -> MemoryResult<()> {
        self.write_bytes(address, &[value])
    }

    /// Write a big-endian 16-bit value.
    fn write_u16(&mut self, address: u32, value: u16) -> MemoryResult<()> {
        let mut buf = [0u8; 2];
        BigEndian::write_u16(&mut buf, value);
        self.write_bytes(address, &buf)
    }

    /// Write a big-endian 32-bit value.
    fn write_u32(&mut self, address: u32, value: u32) -> MemoryResult<()> {
        let mut buf = [0u8; 4];
        BigEndian::write_u32(&mut buf, value);
        self.write_bytes(address, &buf)
    }
}

/// Check that `address` is a multiple of `align`.
pub fn check_aligned(address: u32, len: usize, align: u32) -> MemoryResult<()> {
    if align > 1 && address % align != 0 {
        return Err(MemoryError::InvalidAddress {
            address,
            len,
            fault: AddressFault::Misaligned { align },
        });
    }
    Ok(())
}

/// A contiguous guest address space backed by a host buffer.
///
/// Guest address `n` maps to byte `n` of the buffer.
#[derive(Clone, PartialEq, Eq)]
pub struct FlatMemory {
    bytes: Vec<u8>,
}

impl FlatMemory {
    /// Create a zero-filled address space of `size` bytes.
    pub fn new(size: usize) -> Self {
        Self {
            bytes: vec![0; size],
        }
    }

    /// The whole address space.
    pub fn as_slice(&self) -> &[u8] {
        &self.bytes
    }

    /// Borrow `len` bytes starting at `address`.
    pub fn slice(&self, address: u32, len: usize) -> MemoryResult<&[u8]> {
        self.check_range(address, len)?;
        let start = address as usize;
        Ok(&self.bytes[start..start + len])
    }

    /// Fill a range with a single byte value.
    pub fn fill(&mut self, address: u32, len: usize, value: u8) -> MemoryResult<()> {
        self.check_range(address, len)?;
        let start = address as usize;
        self.bytes[start..start + len].fill(value);
        Ok(())
    }
}

impl GuestMemory for FlatMemory {
    fn size(&self) -> u64 {
        self.bytes.len() as u64
    }

    fn read_bytes(&self, address: u32, buf: &mut [u8]) -> MemoryResult<()> {
        let src = self.slice(address, buf.len())?;
        buf.copy_from_slice(src);
        Ok(())
    }

    fn write_bytes(&mut self, address: u32, data: &[u8]) -> MemoryResult<()> {
        self.check_range(address, data.len())?;
        let start = address as usize;
        self.bytes[start..start + data.len()].copy_from_slice(data);
        Ok(())
    }
}

impl std::fmt::Debug for FlatMemory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FlatMemory")
            .field("size", &self.bytes.len())
            .finish()
    }
}
