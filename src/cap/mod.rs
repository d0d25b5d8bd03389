//! Capability Register Machine
//!
//! Models CHERI-style capabilities for a sandboxed script.
//!
//! # Design
//! - Each compartment has a RegisterFile of 8 general slots plus 3 aliases
//! - Capabilities are bounded, permissioned, tagged pointers
//! - Tagged and untagged values are separate variants of `Value`
//!
//! # Security Properties
//! - Capabilities cannot be forged from data
//! - Bounds and permissions only shrink along a derivation chain
//! - Privileged aliases can be read but never written

pub mod capability;
pub mod regfile;

pub use capability::{
    Capability, CapabilityBits, Permissions, Value, CAPABILITY_WIDTH, INT_WIDTH,
};
pub use regfile::{Dst, Reg, RegisterFile, Seeds, GENERAL_REGISTERS, REGISTER_COUNT};
