//! The fixed-layout record abstraction.

use xshim_core::{GuestMemory, MemoryResult, check_aligned};

/// A fixed-size, fixed-offset record exchanged with the guest.
///
/// `decode` and `encode` are pure transformations over a stack buffer of
/// exactly [`GuestRecord::SIZE`] bytes. Moving a record in or out of guest
/// memory goes through [`GuestRecord::read_from`] and
/// [`GuestRecord::write_to`], which validate the whole address range before
/// any byte is copied.
pub trait GuestRecord: Sized {
    /// Name of the record as the guest platform documents it.
    const NAME: &'static str;

    /// Size of the record in guest memory.
    const SIZE: usize;

    /// Required alignment of the record in guest memory.
    const ALIGN: u32;

    /// Raw byte image of the record, `[u8; SIZE]`.
    type Raw: AsRef<[u8]> + AsMut<[u8]> + Default;

    /// Decode a record from its guest byte image.
    fn decode(raw: &Self::Raw) -> Self;

    /// Encode this record into its guest byte image.
    fn encode(&self, raw: &mut Self::Raw);

    /// Encode into a fresh byte image.
    fn to_raw(&self) -> Self::Raw {
        let mut raw = Self::Raw::default();
        self.encode(&mut raw);
        raw
    }

    /// Check that a record could be read from `address`.
    fn check_address(memory: &dyn GuestMemory, address: u32) -> MemoryResult<()> {
        check_aligned(address, Self::SIZE, Self::ALIGN)?;
        memory.check_range(address, Self::SIZE)
    }

    /// Check that a record could be stored at `address`.
    fn check_writable(memory: &dyn GuestMemory, address: u32) -> MemoryResult<()> {
        check_aligned(address, Self::SIZE, Self::ALIGN)?;
        memory.check_writable(address, Self::SIZE)
    }

    /// Read and decode a record from guest memory.
    fn read_from(memory: &dyn GuestMemory, address: u32) -> MemoryResult<Self> {
        Self::check_address(memory, address)?;
        let mut raw = Self::Raw::default();
        memory.read_bytes(address, raw.as_mut())?;
        Ok(Self::decode(&raw))
    }

    /// Encode and write this record into guest memory.
    fn write_to(&self, memory: &mut dyn GuestMemory, address: u32) -> MemoryResult<()> {
        Self::check_writable(memory, address)?;
        memory.write_bytes(address, self.to_raw().as_ref())
    }
}

/// Summary of a record layout, for tooling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct RecordLayout {
    /// Record name.
    pub name: &'static str,
    /// Size in bytes.
    pub size: usize,
    /// Alignment in bytes.
    pub align: u32,
}

impl RecordLayout {
    /// Layout of record type `R`.
    pub fn of<R: GuestRecord>() -> Self {
        Self {
            name: R::NAME,
            size: R::SIZE,
            align: R::ALIGN,
        }
    }
}
