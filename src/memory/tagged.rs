//! Tagged Memory
//!
//! The memory window a compartment can see, plus one validity tag per aligned
//! capability-sized granule.
//!
//! # Layout
//! ```text
//! origin                                           origin + size
//!   │ granule 0 │ granule 1 │ granule 2 │ ... │ granule n-1 │
//!   │  16 bytes │  16 bytes │           │     │             │
//!   tags:  [t0,     t1,        t2,        ...,    tn-1]
//! ```
//!
//! # Security Properties
//! - A tag is set only by storing a tagged capability to an aligned granule
//! - Any data write overlapping a granule clears its tag
//! - Accesses outside the window fail, whatever the capability says

use alloc::vec;
use alloc::vec::Vec;

use super::address::{is_granule_aligned, GRANULE_SIZE};
use crate::cap::{Capability, CapabilityBits, Permissions, Value, CAPABILITY_WIDTH};
use crate::trap::Trap;

/// Memory owned by one compartment.
#[derive(Debug, Clone)]
pub struct TaggedMemory {
    origin: u32,
    bytes: Vec<u8>,
    tags: Vec<bool>,
}

impl TaggedMemory {
    /// Create a zeroed, untagged window of `size` bytes at `origin`.
    ///
    /// Returns None if the window is not granule-aligned or wraps the
    /// 32-bit address space.
    pub fn new(origin: u32, size: u32) -> Option<Self> {
        if !is_granule_aligned(origin) || !is_granule_aligned(size) {
            return None;
        }
        if u64::from(origin) + u64::from(size) > u64::from(u32::MAX) + 1 {
            return None;
        }
        Some(Self {
            origin,
            bytes: vec![0; size as usize],
            tags: vec![false; (size / GRANULE_SIZE) as usize],
        })
    }

    /// First address of the window.
    #[inline]
    pub fn origin(&self) -> u32 {
        self.origin
    }

    /// Size of the window in bytes.
    #[inline]
    pub fn size(&self) -> u32 {
        self.bytes.len() as u32
    }

    /// The capability covering the whole window with every permission.
    ///
    /// Host-only: every capability the sandbox ever holds is derived from this.
    pub fn root(&self) -> Capability {
        Capability::from_trusted(CapabilityBits {
            address: self.origin,
            base: self.origin,
            length: self.size(),
            permissions: Permissions::all().bits(),
        })
    }

    /// Translate `[addr, addr + len)` into a byte range of the window.
    fn range(&self, addr: u32, len: u32) -> Result<core::ops::Range<usize>, Trap> {
        let start = u64::from(addr)
            .checked_sub(u64::from(self.origin))
            .ok_or(Trap::OutOfBounds)?;
        let end = start + u64::from(len);
        if end > self.bytes.len() as u64 {
            return Err(Trap::OutOfBounds);
        }
        Ok(start as usize..end as usize)
    }

    /// Granule indices overlapped by a byte range.
    fn granules(range: &core::ops::Range<usize>) -> core::ops::Range<usize> {
        let g = GRANULE_SIZE as usize;
        if range.is_empty() {
            return 0..0;
        }
        range.start / g..(range.end - 1) / g + 1
    }

    /// Read raw bytes.
    pub fn read_bytes(&self, addr: u32, len: u32) -> Result<&[u8], Trap> {
        let range = self.range(addr, len)?;
        Ok(&self.bytes[range])
    }

    /// Write raw bytes, clearing the tag of every granule touched.
    pub fn write_bytes(&mut self, addr: u32, data: &[u8]) -> Result<(), Trap> {
        let len = u32::try_from(data.len()).map_err(|_| Trap::OutOfBounds)?;
        let range = self.range(addr, len)?;
        for tag in &mut self.tags[Self::granules(&range)] {
            *tag = false;
        }
        self.bytes[range].copy_from_slice(data);
        Ok(())
    }

    /// Read a little-endian 32-bit integer. Never yields a tag.
    pub fn read_u32(&self, addr: u32) -> Result<u32, Trap> {
        let b = self.read_bytes(addr, 4)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    /// Check whether a granule-aligned address holds a tagged capability.
    pub fn is_tagged(&self, addr: u32) -> bool {
        if !is_granule_aligned(addr) {
            return false;
        }
        match self.range(addr, CAPABILITY_WIDTH) {
            Ok(range) => self.tags[range.start / GRANULE_SIZE as usize],
            Err(_) => false,
        }
    }

    /// Read a capability-sized value with its tag.
    ///
    /// Unaligned reads always produce data.
    pub fn load_value(&self, addr: u32) -> Result<Value, Trap> {
        let bytes = self.read_bytes(addr, CAPABILITY_WIDTH)?;
        let mut word = [0u8; CAPABILITY_WIDTH as usize];
        word.copy_from_slice(bytes);
        let bits = CapabilityBits::from_bytes(&word);

        if self.is_tagged(addr) {
            Ok(Value::Capability(Capability::from_trusted(bits)))
        } else {
            Ok(Value::Data(bits))
        }
    }

    /// Store a capability-sized value.
    ///
    /// Tagged values need an aligned address; data may go anywhere.
    pub fn store_value(&mut self, addr: u32, value: &Value) -> Result<(), Trap> {
        match value {
            Value::Capability(cap) => self.write_capability(addr, cap),
            Value::Data(bits) => self.write_bytes(addr, &bits.to_bytes()),
        }
    }

    /// Store a tagged capability. Also used by hosts to plant fixtures.
    pub fn write_capability(&mut self, addr: u32, cap: &Capability) -> Result<(), Trap> {
        if !is_granule_aligned(addr) {
            return Err(Trap::Misaligned);
        }
        let range = self.range(addr, CAPABILITY_WIDTH)?;
        let granule = range.start / GRANULE_SIZE as usize;
        self.bytes[range].copy_from_slice(&cap.bits().to_bytes());
        self.tags[granule] = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn memory() -> TaggedMemory {
        TaggedMemory::new(0x1000, 0x100).unwrap()
    }

    #[test]
    fn test_new_rejects_bad_windows() {
        assert!(TaggedMemory::new(0x1001, 0x100).is_none());
        assert!(TaggedMemory::new(0x1000, 0x101).is_none());
        assert!(TaggedMemory::new(0xFFFF_FF00, 0x200).is_none());
        assert!(TaggedMemory::new(0xFFFF_FF00, 0x100).is_some());
    }

    #[test]
    fn test_capability_store_sets_tag() {
        let mut mem = memory();
        let cap = mem.root().restrict(0x1040, 0x20, Permissions::LOAD).unwrap();
        mem.write_capability(0x1010, &cap).unwrap();

        assert!(mem.is_tagged(0x1010));
        assert_eq!(mem.load_value(0x1010).unwrap(), Value::Capability(cap));
    }

    #[test]
    fn test_data_write_clears_overlapping_tag() {
        let mut mem = memory();
        let cap = mem.root();
        mem.write_capability(0x1020, &cap).unwrap();
        mem.write_bytes(0x102F, &[0xAA]).unwrap();

        assert!(!mem.is_tagged(0x1020));
        let value = mem.load_value(0x1020).unwrap();
        assert!(!value.is_tagged());
        assert_eq!(value.bits().base, 0x1000);
    }

    #[test]
    fn test_unaligned_load_is_data() {
        let mut mem = memory();
        let cap = mem.root();
        mem.write_capability(0x1020, &cap).unwrap();
        assert!(!mem.load_value(0x1024).unwrap().is_tagged());
    }

    #[test]
    fn test_unaligned_capability_store_traps() {
        let mut mem = memory();
        let cap = mem.root();
        assert_eq!(mem.write_capability(0x1008, &cap), Err(Trap::Misaligned));
        assert_eq!(mem.read_u32(0x1008), Ok(0));
    }

    #[test]
    fn test_window_bounds() {
        let mem = memory();
        assert_eq!(mem.read_u32(0x0FFC), Err(Trap::OutOfBounds));
        assert_eq!(mem.read_u32(0x10FD), Err(Trap::OutOfBounds));
        assert!(mem.read_u32(0x10FC).is_ok());
    }
}
