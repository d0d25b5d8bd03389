//! Secret-Leak Oracle
//!
//! Provides the fixture used to test whether the capability model can be
//! subverted to exfiltrate data:
//! - A secret that is zeroed when retired
//! - An oracle with a guess/reset protocol
//!
//! # Security Properties
//! - The secret is never reachable through a capability
//! - Every check replaces the secret, whatever the guess

pub mod oracle;
pub mod secret;

pub use oracle::{SecretOracle, SharedOracle};
pub use secret::{Secret, Zeroize};
