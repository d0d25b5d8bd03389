//! capvm - Capability Register Machine for Sandboxed Scripts
//!
//! Mediates an untrusted script's access to host-held capabilities.
//!
//! # Components
//! - Capability values: bounded, permissioned, tagged pointers
//! - Register file: 8 general slots plus read-only CSP, CGP and PCC
//! - Dispatch: numbered calls, validated and routed, traps on violation
//! - Secret oracle: a guess/reset fixture for testing leaks
//!
//! # Security Features
//! - Tagged and untagged values are distinct types
//! - Derivation is monotonic: bounds and permissions only shrink
//! - Storing a capability needs more authority than storing data
//! - Every operation checks before it acts
//!
//! # Environment
//! - `no_std` with `alloc`
//! - The script engine, its transport and the board drivers belong to the host

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_op_in_unsafe_fn)]

extern crate alloc;

pub mod cap;
pub mod compartment;
pub mod dispatch;
pub mod drivers;
pub mod memory;
pub mod security;
pub mod trap;

pub use cap::{Capability, CapabilityBits, Dst, Permissions, Reg, RegisterFile, Value};
pub use compartment::{Compartment, CompartmentConfig, ConfigError, Region};
pub use dispatch::{Argument, Opcode, OpcodeTable, Reply};
pub use drivers::{NullPeripherals, Peripherals};
pub use memory::TaggedMemory;
pub use security::{SecretOracle, SharedOracle};
pub use trap::{Fault, Trap};
