//! Compartments
//!
//! One isolated execution context: a register file, the memory it can see, a
//! handle on the process-wide oracle and the host's peripherals.
//!
//! # Lifecycle
//! ```text
//! new ──► call* ──► reset ──► call* ...
//!  │                  │
//!  └ mint seeds,      └ clear registers 0..=7,
//!    clear registers    keep memory and seeds
//! ```
//!
//! Execution is single-threaded. The host never re-enters a compartment while
//! a call is running, so nothing in here locks except the shared oracle.

use core::fmt;

use log::info;

use crate::cap::{Permissions, RegisterFile, Seeds};
use crate::dispatch::{self, Argument, OpcodeTable, Reply};
use crate::drivers::Peripherals;
use crate::memory::TaggedMemory;
use crate::security::SharedOracle;
use crate::trap::Fault;

/// A `[base, base + length)` region inside the memory window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    pub base: u32,
    pub length: u32,
}

/// Build-time description of a compartment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompartmentConfig {
    /// First address of the memory window.
    pub origin: u32,
    /// Size of the memory window in bytes.
    pub size: u32,
    /// Region behind CGP.
    pub globals: Region,
    /// Region behind CSP.
    pub stack: Region,
    /// Region behind PCC.
    pub code: Region,
    /// Wire ids of this build.
    pub opcodes: OpcodeTable,
}

impl Default for CompartmentConfig {
    fn default() -> Self {
        Self {
            origin: 0x1000,
            size: 0x3000,
            globals: Region {
                base: 0x1000,
                length: 0x1000,
            },
            stack: Region {
                base: 0x2000,
                length: 0x1000,
            },
            code: Region {
                base: 0x3000,
                length: 0x1000,
            },
            opcodes: OpcodeTable::SANDBOX,
        }
    }
}

/// Error type for compartment construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// The memory window is misaligned or wraps the address space.
    InvalidWindow,
    /// A seed region does not fit inside the window.
    RegionOutsideWindow(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidWindow => write!(f, "memory window misaligned or out of range"),
            Self::RegionOutsideWindow(name) => write!(f, "{} region outside memory window", name),
        }
    }
}

impl core::error::Error for ConfigError {}

/// One sandbox instance.
pub struct Compartment<P: Peripherals> {
    pub(crate) registers: RegisterFile,
    pub(crate) memory: TaggedMemory,
    pub(crate) oracle: SharedOracle,
    pub(crate) peripherals: P,
    opcodes: OpcodeTable,
}

impl<P: Peripherals> Compartment<P> {
    /// Build a compartment: allocate its memory and mint its three seeds.
    pub fn new(
        config: CompartmentConfig,
        oracle: SharedOracle,
        peripherals: P,
    ) -> Result<Self, ConfigError> {
        let memory =
            TaggedMemory::new(config.origin, config.size).ok_or(ConfigError::InvalidWindow)?;
        let root = memory.root();

        let seed = |region: Region, permissions: Permissions, name: &'static str| {
            root.restrict(region.base, region.length, permissions)
                .ok_or(ConfigError::RegionOutsideWindow(name))
        };
        let seeds = Seeds {
            globals: seed(
                config.globals,
                Permissions::CAP_RW | Permissions::GLOBAL,
                "globals",
            )?,
            stack: seed(config.stack, Permissions::CAP_RW, "stack")?,
            code: seed(
                config.code,
                Permissions::LOAD | Permissions::EXECUTE,
                "code",
            )?,
        };

        info!(
            "[{}] compartment initialised: window {:#010x}+{:#x}",
            config.opcodes.name(),
            config.origin,
            config.size
        );

        Ok(Self {
            registers: RegisterFile::new(seeds),
            memory,
            oracle,
            peripherals,
            opcodes: config.opcodes,
        })
    }

    /// Clear the general registers. Memory and seeds survive.
    pub fn reset(&mut self) {
        self.registers.reset();
        info!("[{}] compartment registers reset", self.opcodes.name());
    }

    /// Run one call from the script.
    pub fn call(&mut self, id: u16, args: &[Argument]) -> Result<Reply, Fault> {
        dispatch::dispatch(self, id, args)
    }

    /// The opcode table of this build.
    #[inline]
    pub fn opcodes(&self) -> OpcodeTable {
        self.opcodes
    }

    /// Host view of the register file.
    #[inline]
    pub fn registers(&self) -> &RegisterFile {
        &self.registers
    }

    #[inline]
    pub fn memory(&self) -> &TaggedMemory {
        &self.memory
    }

    /// Host access to memory, for loading data and planting fixtures.
    #[inline]
    pub fn memory_mut(&mut self) -> &mut TaggedMemory {
        &mut self.memory
    }

    #[inline]
    pub fn oracle(&self) -> &SharedOracle {
        &self.oracle
    }

    #[inline]
    pub fn peripherals(&self) -> &P {
        &self.peripherals
    }

    #[inline]
    pub fn peripherals_mut(&mut self) -> &mut P {
        &mut self.peripherals
    }
}
