//! Script Call Interface
//!
//! The only part of the machine reachable by untrusted script code.
//!
//! # Security Model
//! - Whitelist approach: only ids in the compartment's table are allowed
//! - All operands are validated before use
//! - Invalid inputs trap, never panic
//!
//! # Register Calls (both tables)
//! - 1: print(...)
//! - 2: register_move(dst, src)
//! - 3: load_capability(dst, src, offset)
//! - 4: load_int(src, offset)
//! - 5: store(src, dst, offset)
//! - 6..=10: get_address, set_address, get_base, get_length, get_permissions

mod args;
mod handler;
mod opcode;
mod validate;

pub use args::{Argument, Reply};
pub use handler::dispatch;
pub use opcode::{Opcode, OpcodeTable};
pub use validate::{decode, Call};
