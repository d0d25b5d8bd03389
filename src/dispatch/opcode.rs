//! Opcode Tables
//!
//! Scripts name host operations by small integers. The mapping is ABI: every
//! compiled script bakes it in, so a table is fixed per compartment build.
//!
//! Two builds exist. They agree on ids 1..=10 and diverge afterwards, because
//! one of them inserts `check_secret` at 11 and shifts the peripherals up by one.

/// Host operations a script can call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Opcode {
    Print,
    Move,
    LoadCapability,
    LoadInt,
    Store,
    GetAddress,
    SetAddress,
    GetBase,
    GetLength,
    GetPermissions,
    CheckSecret,
    LedOn,
    LedOff,
    ReadButton,
    ReadSwitch,
    ReadButtons,
    ReadSwitches,
    LedSet,
    UartWrite,
}

impl Opcode {
    /// Minimum number of arguments. Variadic opcodes need none.
    pub const fn arity(self) -> usize {
        match self {
            Self::Print | Self::UartWrite | Self::ReadButtons | Self::ReadSwitches => 0,
            Self::GetAddress
            | Self::GetBase
            | Self::GetLength
            | Self::GetPermissions
            | Self::CheckSecret
            | Self::LedOn
            | Self::LedOff
            | Self::ReadButton
            | Self::ReadSwitch => 1,
            Self::Move | Self::LoadInt | Self::SetAddress | Self::LedSet => 2,
            Self::LoadCapability | Self::Store => 3,
        }
    }
}

/// A fixed id → opcode mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpcodeTable {
    name: &'static str,
    entries: &'static [(u16, Opcode)],
}

impl OpcodeTable {
    /// The exploit sandbox: register machine, secret oracle, board I/O.
    pub const SANDBOX: Self = Self {
        name: "sandbox",
        entries: &[
            (1, Opcode::Print),
            (2, Opcode::Move),
            (3, Opcode::LoadCapability),
            (4, Opcode::LoadInt),
            (5, Opcode::Store),
            (6, Opcode::GetAddress),
            (7, Opcode::SetAddress),
            (8, Opcode::GetBase),
            (9, Opcode::GetLength),
            (10, Opcode::GetPermissions),
            (11, Opcode::CheckSecret),
            (12, Opcode::LedOn),
            (13, Opcode::LedOff),
            (14, Opcode::ReadButton),
            (15, Opcode::ReadSwitch),
            (16, Opcode::ReadButtons),
            (17, Opcode::ReadSwitches),
            (18, Opcode::LedSet),
        ],
    };

    /// The smart-meter policy runtime: no oracle, an auxiliary UART.
    ///
    /// Id 18 belongs to a snapshot reader that is not part of this machine.
    pub const SMARTMETER: Self = Self {
        name: "smartmeter",
        entries: &[
            (1, Opcode::Print),
            (2, Opcode::Move),
            (3, Opcode::LoadCapability),
            (4, Opcode::LoadInt),
            (5, Opcode::Store),
            (6, Opcode::GetAddress),
            (7, Opcode::SetAddress),
            (8, Opcode::GetBase),
            (9, Opcode::GetLength),
            (10, Opcode::GetPermissions),
            (11, Opcode::LedOn),
            (12, Opcode::LedOff),
            (13, Opcode::ReadButton),
            (14, Opcode::ReadSwitch),
            (15, Opcode::ReadButtons),
            (16, Opcode::ReadSwitches),
            (17, Opcode::LedSet),
            (19, Opcode::UartWrite),
        ],
    };

    #[inline]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Look up a wire id.
    pub fn decode(&self, id: u16) -> Option<Opcode> {
        self.entries
            .iter()
            .find(|(entry, _)| *entry == id)
            .map(|&(_, op)| op)
    }

    /// Wire id of an opcode in this table, if it has one.
    pub fn id_of(&self, op: Opcode) -> Option<u16> {
        self.entries
            .iter()
            .find(|(_, entry)| *entry == op)
            .map(|&(id, _)| id)
    }
}

impl Default for OpcodeTable {
    fn default() -> Self {
        Self::SANDBOX
    }
}
