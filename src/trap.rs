//! Traps
//!
//! Every contract violation inside the machine becomes a typed trap. Traps are
//! raised at dispatch and surfaced to the host as a `Fault` for that call.
//!
//! # Trap Kinds
//! - Operand shape: `InvalidRegister`, `ReadOnlyDestination`, `ArgumentCount`
//! - Dereference: `OutOfBounds`, `PermissionDenied`, `UntaggedDereference`, `Misaligned`
//! - Table lookup: `UnsupportedOpcode`
//!
//! # Host Policy
//! Whether a trap kills the script or is handed back as a sentinel is decided by
//! the host. `Trap::code()` gives the sentinel form.

use core::fmt;

/// A trap raised by the machine.
///
/// The discriminants are the sentinel codes a host may return to the script.
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trap {
    /// Register index outside `0..=10`.
    InvalidRegister = -1,
    /// Write attempted to a privileged alias.
    ReadOnlyDestination = -2,
    /// Effective address plus width outside the capability's bounds.
    OutOfBounds = -3,
    /// Required permission bit absent.
    PermissionDenied = -4,
    /// No handler for the opcode.
    UnsupportedOpcode = -5,
    /// Data-only value used where a capability is required.
    UntaggedDereference = -6,
    /// Fewer arguments than the opcode's signature.
    ArgumentCount = -7,
    /// Tagged capability store not aligned to the capability width.
    Misaligned = -8,
}

impl Trap {
    /// Sentinel code for hosts that report traps back to the script.
    #[inline]
    pub const fn code(self) -> i32 {
        self as i32
    }
}

impl fmt::Display for Trap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidRegister => write!(f, "invalid register index"),
            Self::ReadOnlyDestination => write!(f, "destination register is read-only"),
            Self::OutOfBounds => write!(f, "access outside capability bounds"),
            Self::PermissionDenied => write!(f, "capability lacks required permission"),
            Self::UnsupportedOpcode => write!(f, "unsupported opcode"),
            Self::UntaggedDereference => write!(f, "dereference of untagged value"),
            Self::ArgumentCount => write!(f, "too few arguments"),
            Self::Misaligned => write!(f, "misaligned capability store"),
        }
    }
}

impl core::error::Error for Trap {}

/// A trapped call, as reported to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fault {
    /// Wire opcode of the call that trapped.
    pub opcode: u16,
    /// Why it trapped.
    pub trap: Trap,
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "call {} trapped: {}", self.opcode, self.trap)
    }
}

impl core::error::Error for Fault {
    fn source(&self) -> Option<&(dyn core::error::Error + 'static)> {
        Some(&self.trap)
    }
}
