//! Compartment memory
//!
//! Provides:
//! - A tagged memory window per compartment
//! - Effective address computation and bounds gating
//!
//! # Security Principles
//! - Every dereference is bounds-checked against the capability used
//! - Tags live beside the data and cannot be written as data
//! - Addresses are computed without wraparound

mod address;
mod tagged;

pub use address::{effective_address, is_granule_aligned, GRANULE_SIZE};
pub use tagged::TaggedMemory;
