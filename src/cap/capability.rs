//! Capability Values and Permissions
//!
//! Defines the atomic unit of the register machine: a bounded, permissioned
//! pointer that either carries a validity tag or is plain data.
//!
//! # Capability Structure
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                        Value                             │
//! ├─────────────────────────────┬────────────────────────────┤
//! │  Capability (tagged)        │  Data (untagged)           │
//! │    bits: CapabilityBits     │    bits: CapabilityBits    │
//! └─────────────────────────────┴────────────────────────────┘
//!  CapabilityBits = { address, base, length, permissions }
//! ```
//!
//! # Security Properties
//! - A `Capability` cannot be built from raw bits outside this crate
//! - Derivation only narrows bounds and drops permissions
//! - Moving the address cursor never touches bounds, permissions or tag

use bitflags::bitflags;

/// Width in bytes of a capability stored in memory.
pub const CAPABILITY_WIDTH: u32 = 16;

/// Width in bytes of an integer read through `load_int`.
pub const INT_WIDTH: u32 = 4;

bitflags! {
    /// Permissions granted by a capability.
    ///
    /// Derivation can only clear bits, never set them.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Permissions: u32 {
        /// Global: may be stored anywhere.
        const GLOBAL = 1 << 0;
        /// Data loads.
        const LOAD = 1 << 1;
        /// Data stores.
        const STORE = 1 << 2;
        /// Storing tagged capabilities. Strictly stronger than `STORE`.
        const STORE_CAPABILITY = 1 << 3;
        /// Instruction fetch.
        const EXECUTE = 1 << 4;
        /// Access to system registers.
        const SYSTEM = 1 << 5;
    }
}

impl Permissions {
    /// Permissions of a read/write data region.
    pub const DATA_RW: Self = Self::LOAD.union(Self::STORE);

    /// Permissions of a region that may also hold capabilities.
    pub const CAP_RW: Self = Self::DATA_RW.union(Self::STORE_CAPABILITY);
}

/// The raw bit pattern of a capability, with or without provenance.
///
/// Inspection of any field is always allowed. Only dereference is gated.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct CapabilityBits {
    /// Cursor.
    pub address: u32,
    /// Lowest address covered.
    pub base: u32,
    /// Number of bytes covered from `base`.
    pub length: u32,
    /// Permission bitmap (unknown bits are preserved verbatim).
    pub permissions: u32,
}

impl CapabilityBits {
    /// The all-zero pattern held by fresh registers.
    pub const NULL: Self = Self {
        address: 0,
        base: 0,
        length: 0,
        permissions: 0,
    };

    /// One past the highest covered address, without wrapping.
    #[inline]
    pub const fn top(&self) -> u64 {
        self.base as u64 + self.length as u64
    }

    /// Encode into the in-memory layout (four little-endian words).
    pub fn to_bytes(&self) -> [u8; CAPABILITY_WIDTH as usize] {
        let mut out = [0u8; CAPABILITY_WIDTH as usize];
        out[0..4].copy_from_slice(&self.address.to_le_bytes());
        out[4..8].copy_from_slice(&self.base.to_le_bytes());
        out[8..12].copy_from_slice(&self.length.to_le_bytes());
        out[12..16].copy_from_slice(&self.permissions.to_le_bytes());
        out
    }

    /// Decode from the in-memory layout.
    pub fn from_bytes(bytes: &[u8; CAPABILITY_WIDTH as usize]) -> Self {
        let word = |i: usize| u32::from_le_bytes([bytes[i], bytes[i + 1], bytes[i + 2], bytes[i + 3]]);
        Self {
            address: word(0),
            base: word(4),
            length: word(8),
            permissions: word(12),
        }
    }
}

/// A tagged capability: bits with valid provenance.
///
/// # Security Properties
/// - Only the crate can mint one (from a memory root or a tagged load)
/// - `restrict()` is the only public way to derive, and it is monotonic
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Capability {
    bits: CapabilityBits,
}

impl Capability {
    /// Wrap bits that are known to have valid provenance.
    #[inline]
    pub(crate) const fn from_trusted(bits: CapabilityBits) -> Self {
        Self { bits }
    }

    /// The raw bit pattern.
    #[inline]
    pub const fn bits(&self) -> CapabilityBits {
        self.bits
    }

    #[inline]
    pub const fn base(&self) -> u32 {
        self.bits.base
    }

    #[inline]
    pub const fn length(&self) -> u32 {
        self.bits.length
    }

    #[inline]
    pub const fn address(&self) -> u32 {
        self.bits.address
    }

    /// Known permission bits.
    #[inline]
    pub const fn permissions(&self) -> Permissions {
        Permissions::from_bits_truncate(self.bits.permissions)
    }

    /// Check if this capability has all of the `required` permissions.
    #[inline]
    pub const fn has_permissions(&self, required: Permissions) -> bool {
        self.permissions().contains(required)
    }

    /// Check whether `other` grants no more than this capability.
    ///
    /// Unknown permission bits in `other` are never covered.
    pub fn covers(&self, other: &CapabilityBits) -> bool {
        other.base >= self.bits.base
            && other.top() <= self.bits.top()
            && other.permissions & !self.permissions().bits() == 0
    }

    /// Derive a capability with narrower bounds and fewer permissions.
    ///
    /// The cursor of the result is placed at `base`.
    ///
    /// # Returns
    /// `None` if the requested bounds or permissions exceed this capability.
    pub fn restrict(&self, base: u32, length: u32, permissions: Permissions) -> Option<Self> {
        let bits = CapabilityBits {
            address: base,
            base,
            length,
            permissions: permissions.bits(),
        };
        if !self.covers(&bits) {
            return None;
        }
        Some(Self { bits })
    }

    /// Strip the tag, keeping the bits.
    #[inline]
    pub const fn into_data(self) -> Value {
        Value::Data(self.bits)
    }
}

/// The content of one register or one memory granule.
///
/// Tagged and untagged values are distinct variants, so raw data can never be
/// used where a capability is required without going through `as_capability`.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Value {
    /// A valid, tagged capability.
    Capability(Capability),
    /// An untagged bit pattern.
    Data(CapabilityBits),
}

impl Value {
    /// The null value held by cleared registers.
    pub const NULL: Self = Self::Data(CapabilityBits::NULL);

    /// The raw bits, whatever the tag.
    #[inline]
    pub const fn bits(&self) -> CapabilityBits {
        match self {
            Self::Capability(cap) => cap.bits,
            Self::Data(bits) => *bits,
        }
    }

    /// Check the validity tag.
    #[inline]
    pub const fn is_tagged(&self) -> bool {
        matches!(self, Self::Capability(_))
    }

    /// Borrow as a capability, if tagged.
    #[inline]
    pub const fn as_capability(&self) -> Option<&Capability> {
        match self {
            Self::Capability(cap) => Some(cap),
            Self::Data(_) => None,
        }
    }

    /// Move the address cursor. Bounds, permissions and tag are untouched.
    pub fn with_address(self, address: u32) -> Self {
        match self {
            Self::Capability(mut cap) => {
                cap.bits.address = address;
                Self::Capability(cap)
            }
            Self::Data(mut bits) => {
                bits.address = address;
                Self::Data(bits)
            }
        }
    }
}

impl Default for Value {
    fn default() -> Self {
        Self::NULL
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn region() -> Capability {
        Capability::from_trusted(CapabilityBits {
            address: 0x1000,
            base: 0x1000,
            length: 0x100,
            permissions: Permissions::CAP_RW.bits(),
        })
    }

    #[test]
    fn test_restrict_is_monotonic() {
        let cap = region();
        let sub = cap.restrict(0x1010, 0x20, Permissions::LOAD).unwrap();
        assert_eq!(sub.base(), 0x1010);
        assert_eq!(sub.length(), 0x20);
        assert_eq!(sub.permissions(), Permissions::LOAD);

        assert!(cap.restrict(0x0FFF, 0x10, Permissions::LOAD).is_none());
        assert!(cap.restrict(0x10F0, 0x20, Permissions::LOAD).is_none());
        assert!(cap.restrict(0x1000, 0x10, Permissions::EXECUTE).is_none());
    }

    #[test]
    fn test_covers_rejects_unknown_permission_bits() {
        let cap = region();
        let mut bits = cap.bits();
        assert!(cap.covers(&bits));
        bits.permissions |= 1 << 31;
        assert!(!cap.covers(&bits));
    }

    #[test]
    fn test_with_address_keeps_tag_and_bounds() {
        let moved = Value::Capability(region()).with_address(0xFFFF_0000);
        assert!(moved.is_tagged());
        assert_eq!(moved.bits().base, 0x1000);
        assert_eq!(moved.bits().length, 0x100);
        assert_eq!(moved.bits().address, 0xFFFF_0000);

        let data = Value::NULL.with_address(0x42);
        assert!(!data.is_tagged());
    }

    #[test]
    fn test_byte_layout() {
        let bits = region().bits();
        let bytes = bits.to_bytes();
        assert_eq!(&bytes[0..4], &0x1000u32.to_le_bytes());
        assert_eq!(&bytes[8..12], &0x100u32.to_le_bytes());
        assert_eq!(CapabilityBits::from_bytes(&bytes), bits);
    }
}
