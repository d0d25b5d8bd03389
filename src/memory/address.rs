//! Effective Address Arithmetic
//!
//! Computes the address an access will touch and checks it against the bounds
//! of the capability it goes through.
//!
//! # Security Properties
//! - Arithmetic is done in 64 bits, so no offset can wrap into bounds
//! - Negative offsets are legal and are checked like any other
//! - The cursor of the capability itself may be anywhere; only the access is gated

use crate::cap::Capability;
use crate::trap::Trap;

/// Size of a tag granule in bytes. Equal to the capability width.
pub const GRANULE_SIZE: u32 = crate::cap::CAPABILITY_WIDTH;
/// Granule mask
pub const GRANULE_MASK: u32 = GRANULE_SIZE - 1;

/// Check if the address is aligned to a tag granule.
#[inline]
pub const fn is_granule_aligned(addr: u32) -> bool {
    addr & GRANULE_MASK == 0
}

/// Compute `address(cap) + offset` and check a `width`-byte access there.
///
/// Both the first byte `eff` and the end address `eff + width` must lie within
/// `[base, base + length)`.
///
/// # Returns
/// * `Ok(eff)` - the effective address
/// * `Err(Trap::OutOfBounds)` - any part of the check failed
pub fn effective_address(cap: &Capability, offset: i32, width: u32) -> Result<u32, Trap> {
    let eff = i64::from(cap.address()) + i64::from(offset);
    let end = eff + i64::from(width);
    let base = i64::from(cap.base());
    let top = cap.bits().top() as i64;

    // `end` itself must be inside the region, so the last `width` bytes of
    // every region are unreachable at that width.
    if eff < base || end >= top {
        return Err(Trap::OutOfBounds);
    }

    // base <= eff < top <= 2^32
    Ok(eff as u32)
}
