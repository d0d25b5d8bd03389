//! Capability Register File
//!
//! The register state one compartment exposes to its script.
//!
//! # Design
//! - 8 general-purpose slots, addressed by `Reg` indices 0..=7
//! - 3 privileged read-only aliases: CSP (8), CGP (9), PCC (10)
//! - Aliases are views over host-owned seeds, never destinations
//! - Every operation checks everything before it mutates anything

use log::debug;

use super::capability::{Capability, Permissions, Value, CAPABILITY_WIDTH, INT_WIDTH};
use crate::memory::{effective_address, TaggedMemory};
use crate::trap::Trap;

/// Number of general-purpose registers.
pub const GENERAL_REGISTERS: usize = 8;

/// Total number of addressable registers, aliases included.
pub const REGISTER_COUNT: usize = GENERAL_REGISTERS + 3;

/// Any register index usable as a source: 0..=10.
///
/// This is a newtype to prevent using arbitrary integers as register indices.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[repr(transparent)]
pub struct Reg(u8);

impl Reg {
    /// Stack capability alias.
    pub const CSP: Self = Self(8);

    /// Globals capability alias.
    pub const CGP: Self = Self(9);

    /// Program-counter capability alias.
    pub const PCC: Self = Self(10);

    /// Create a source register index.
    ///
    /// Fails with `InvalidRegister` outside 0..=10.
    #[inline]
    pub const fn new(index: i32) -> Result<Self, Trap> {
        if index >= 0 && (index as usize) < REGISTER_COUNT {
            Ok(Self(index as u8))
        } else {
            Err(Trap::InvalidRegister)
        }
    }

    /// Get the index value.
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// Check if this names one of the read-only aliases.
    #[inline]
    pub const fn is_privileged(self) -> bool {
        self.index() >= GENERAL_REGISTERS
    }
}

/// A register index usable as a destination: 0..=7.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[repr(transparent)]
pub struct Dst(u8);

impl Dst {
    /// Create a destination register index.
    ///
    /// Fails with `InvalidRegister` outside 0..=10 and with
    /// `ReadOnlyDestination` for the aliases 8..=10.
    #[inline]
    pub const fn new(index: i32) -> Result<Self, Trap> {
        match Reg::new(index) {
            Ok(reg) if reg.is_privileged() => Err(Trap::ReadOnlyDestination),
            Ok(reg) => Ok(Self(reg.0)),
            Err(e) => Err(e),
        }
    }

    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// The same register as a source.
    #[inline]
    pub const fn as_reg(self) -> Reg {
        Reg(self.0)
    }
}

/// The capabilities the host installs behind the privileged aliases.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Seeds {
    /// Behind CSP.
    pub stack: Capability,
    /// Behind CGP.
    pub globals: Capability,
    /// Behind PCC.
    pub code: Capability,
}

/// Register file for one compartment.
#[derive(Debug, Clone)]
pub struct RegisterFile {
    /// General-purpose slots.
    general: [Value; GENERAL_REGISTERS],
    /// Host-owned seeds behind the aliases.
    seeds: Seeds,
}

impl RegisterFile {
    /// Create a register file with every general slot cleared.
    pub const fn new(seeds: Seeds) -> Self {
        Self {
            general: [Value::NULL; GENERAL_REGISTERS],
            seeds,
        }
    }

    /// Clear every general slot. Seeds are untouched.
    pub fn reset(&mut self) {
        self.general = [Value::NULL; GENERAL_REGISTERS];
    }

    /// Read any register.
    #[inline]
    pub fn read(&self, src: Reg) -> Value {
        match src {
            Reg::CSP => Value::Capability(self.seeds.stack),
            Reg::CGP => Value::Capability(self.seeds.globals),
            Reg::PCC => Value::Capability(self.seeds.code),
            _ => self.general[src.index()],
        }
    }

    #[inline]
    fn write(&mut self, dst: Dst, value: Value) {
        self.general[dst.index()] = value;
    }

    /// Read a register that is about to be dereferenced.
    fn authority(&self, src: Reg) -> Result<Capability, Trap> {
        match self.read(src) {
            Value::Capability(cap) => Ok(cap),
            Value::Data(_) => Err(Trap::UntaggedDereference),
        }
    }

    /// Copy a full value, tag included. Never dereferences.
    pub fn register_move(&mut self, dst: Dst, src: Reg) {
        let value = self.read(src);
        self.write(dst, value);
    }

    /// Load a capability-sized value from `address(src) + offset` into `dst`.
    ///
    /// The result keeps its tag only if memory held a tagged capability that
    /// `src` fully covers. Anything else arrives as data with identical bits.
    pub fn load_capability(
        &mut self,
        memory: &TaggedMemory,
        dst: Dst,
        src: Reg,
        offset: i32,
    ) -> Result<(), Trap> {
        let authority = self.authority(src)?;
        let eff = effective_address(&authority, offset, CAPABILITY_WIDTH)?;
        if !authority.has_permissions(Permissions::LOAD) {
            return Err(Trap::PermissionDenied);
        }

        let loaded = match memory.load_value(eff)? {
            Value::Capability(cap) if authority.covers(&cap.bits()) => Value::Capability(cap),
            Value::Capability(cap) => {
                debug!("load at {:#010x} exceeds source authority, tag cleared", eff);
                cap.into_data()
            }
            data => data,
        };

        self.write(dst, loaded);
        Ok(())
    }

    /// Load a 32-bit integer from `address(src) + offset`. Never produces a tag.
    pub fn load_int(&self, memory: &TaggedMemory, src: Reg, offset: i32) -> Result<i32, Trap> {
        let authority = self.authority(src)?;
        let eff = effective_address(&authority, offset, INT_WIDTH)?;
        if !authority.has_permissions(Permissions::LOAD) {
            return Err(Trap::PermissionDenied);
        }
        Ok(memory.read_u32(eff)? as i32)
    }

    /// Store the value in `src` at `address(dst) + offset`.
    ///
    /// `dst` is only dereferenced, not written, so any register may name it.
    /// Storing a tagged value also needs `STORE_CAPABILITY`.
    pub fn store(
        &self,
        memory: &mut TaggedMemory,
        src: Reg,
        dst: Reg,
        offset: i32,
    ) -> Result<(), Trap> {
        let authority = self.authority(dst)?;
        let value = self.read(src);
        let eff = effective_address(&authority, offset, CAPABILITY_WIDTH)?;

        let required = if value.is_tagged() {
            Permissions::STORE | Permissions::STORE_CAPABILITY
        } else {
            Permissions::STORE
        };
        if !authority.has_permissions(required) {
            return Err(Trap::PermissionDenied);
        }

        memory.store_value(eff, &value)
    }

    /// Cursor of any register.
    #[inline]
    pub fn get_address(&self, src: Reg) -> u32 {
        self.read(src).bits().address
    }

    /// Move the cursor of a general register. Going out of bounds is legal.
    pub fn set_address(&mut self, dst: Dst, address: u32) {
        let value = self.read(dst.as_reg()).with_address(address);
        self.write(dst, value);
    }

    #[inline]
    pub fn get_base(&self, src: Reg) -> u32 {
        self.read(src).bits().base
    }

    #[inline]
    pub fn get_length(&self, src: Reg) -> u32 {
        self.read(src).bits().length
    }

    /// Raw permission bits, untagged values included.
    #[inline]
    pub fn get_permissions(&self, src: Reg) -> u32 {
        self.read(src).bits().permissions
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixture {
        memory: TaggedMemory,
        regs: RegisterFile,
    }

    /// Globals at 0x1000..0x1100, stack at 0x1100..0x1200, code at 0x1200..0x1300.
    fn fixture() -> Fixture {
        let memory = TaggedMemory::new(0x1000, 0x300).unwrap();
        let root = memory.root();
        let seeds = Seeds {
            globals: root.restrict(0x1000, 0x100, Permissions::CAP_RW).unwrap(),
            stack: root.restrict(0x1100, 0x100, Permissions::CAP_RW).unwrap(),
            code: root
                .restrict(0x1200, 0x100, Permissions::LOAD | Permissions::EXECUTE)
                .unwrap(),
        };
        Fixture {
            memory,
            regs: RegisterFile::new(seeds),
        }
    }

    fn dst(i: i32) -> Dst {
        Dst::new(i).unwrap()
    }

    fn reg(i: i32) -> Reg {
        Reg::new(i).unwrap()
    }

    #[test]
    fn test_register_indices() {
        assert_eq!(Reg::new(-1), Err(Trap::InvalidRegister));
        assert_eq!(Reg::new(11), Err(Trap::InvalidRegister));
        assert_eq!(Reg::new(10), Ok(Reg::PCC));
        assert_eq!(Dst::new(8), Err(Trap::ReadOnlyDestination));
        assert_eq!(Dst::new(10), Err(Trap::ReadOnlyDestination));
        assert_eq!(Dst::new(11), Err(Trap::InvalidRegister));
        assert_eq!(Dst::new(7).map(Dst::index), Ok(7));
    }

    #[test]
    fn test_fresh_registers_are_null_data() {
        let f = fixture();
        for i in 0..8 {
            assert_eq!(f.regs.read(reg(i)), Value::NULL);
        }
        assert!(f.regs.read(Reg::CSP).is_tagged());
    }

    #[test]
    fn test_move_copies_tag_and_bits() {
        let mut f = fixture();
        f.regs.register_move(dst(3), Reg::CGP);
        assert_eq!(f.regs.read(reg(3)), f.regs.read(Reg::CGP));

        f.regs.register_move(dst(3), reg(0));
        assert_eq!(f.regs.read(reg(3)), Value::NULL);
    }

    #[test]
    fn test_untagged_dereference_traps() {
        let mut f = fixture();
        assert_eq!(
            f.regs.load_int(&f.memory, reg(0), 0),
            Err(Trap::UntaggedDereference)
        );
        assert_eq!(
            f.regs.load_capability(&f.memory, dst(1), reg(0), 0),
            Err(Trap::UntaggedDereference)
        );
        assert_eq!(
            f.regs.store(&mut f.memory, reg(1), reg(0), 0),
            Err(Trap::UntaggedDereference)
        );
    }

    #[test]
    fn test_store_then_load_capability_keeps_tag() {
        let mut f = fixture();
        f.regs.register_move(dst(0), Reg::CSP);
        f.regs.store(&mut f.memory, reg(0), Reg::CSP, 0x20).unwrap();
        assert!(f.memory.is_tagged(0x1120));

        f.regs.load_capability(&f.memory, dst(2), Reg::CSP, 0x20).unwrap();
        assert!(f.regs.read(reg(2)).is_tagged());
        assert_eq!(f.regs.read(reg(2)), f.regs.read(Reg::CSP));
    }

    #[test]
    fn test_load_demotes_capability_wider_than_source() {
        let mut f = fixture();
        // The stack seed lives in globals, but globals does not cover the stack.
        let stack = f.regs.read(Reg::CSP);
        f.memory.store_value(0x1010, &stack).unwrap();

        f.regs.load_capability(&f.memory, dst(1), Reg::CGP, 0x10).unwrap();
        let loaded = f.regs.read(reg(1));
        assert!(!loaded.is_tagged());
        assert_eq!(loaded.bits(), stack.bits());
    }

    #[test]
    fn test_load_int_never_tags() {
        let mut f = fixture();
        let cap = f.regs.read(Reg::CGP);
        f.memory.store_value(0x1040, &cap).unwrap();

        let word = f.regs.load_int(&f.memory, Reg::CGP, 0x40).unwrap();
        assert_eq!(word as u32, 0x1000);
        for i in 0..8 {
            assert!(!f.regs.read(reg(i)).is_tagged());
        }
    }

    #[test]
    fn test_load_requires_load_permission() {
        let mut f = fixture();
        let write_only = f
            .memory
            .root()
            .restrict(0x1000, 0x100, Permissions::STORE)
            .unwrap();
        f.memory.write_capability(0x1000, &write_only).unwrap();
        f.regs.load_capability(&f.memory, dst(0), Reg::CGP, 0).unwrap();
        assert!(f.regs.read(reg(0)).is_tagged());

        assert_eq!(
            f.regs.load_int(&f.memory, reg(0), 0x10),
            Err(Trap::PermissionDenied)
        );
    }

    #[test]
    fn test_store_capability_needs_extra_permission() {
        let mut f = fixture();
        let data_only = f
            .memory
            .root()
            .restrict(0x1000, 0x100, Permissions::DATA_RW)
            .unwrap();
        f.memory.write_capability(0x1000, &data_only).unwrap();
        f.regs.load_capability(&f.memory, dst(0), Reg::CGP, 0).unwrap();

        // A tagged value cannot go through a data-only capability.
        f.regs.register_move(dst(1), Reg::CSP);
        assert_eq!(
            f.regs.store(&mut f.memory, reg(1), reg(0), 0x20),
            Err(Trap::PermissionDenied)
        );
        assert!(!f.memory.is_tagged(0x1020));

        // The same value without a tag is fine.
        assert!(f.regs.store(&mut f.memory, reg(2), reg(0), 0x20).is_ok());
    }

    #[test]
    fn test_store_through_code_alias_denied() {
        let mut f = fixture();
        assert_eq!(
            f.regs.store(&mut f.memory, reg(0), Reg::PCC, 0),
            Err(Trap::PermissionDenied)
        );
    }

    #[test]
    fn test_set_address_only_moves_cursor() {
        let mut f = fixture();
        f.regs.register_move(dst(4), Reg::CGP);
        f.regs.set_address(dst(4), 0xDEAD_0000);

        let value = f.regs.read(reg(4));
        assert!(value.is_tagged());
        assert_eq!(f.regs.get_address(reg(4)), 0xDEAD_0000);
        assert_eq!(f.regs.get_base(reg(4)), 0x1000);
        assert_eq!(f.regs.get_length(reg(4)), 0x100);
        assert_eq!(f.regs.get_permissions(reg(4)), Permissions::CAP_RW.bits());

        // Dereference is what fails, not the move.
        assert_eq!(
            f.regs.load_int(&f.memory, reg(4), 0),
            Err(Trap::OutOfBounds)
        );
        // Bringing the cursor back makes it usable again.
        f.regs.set_address(dst(4), 0x1000);
        assert!(f.regs.load_int(&f.memory, reg(4), 0).is_ok());
    }

    #[test]
    fn test_failed_load_leaves_destination_untouched() {
        let mut f = fixture();
        f.regs.register_move(dst(1), Reg::CSP);
        let before = f.regs.read(reg(1));
        assert_eq!(
            f.regs.load_capability(&f.memory, dst(1), Reg::CGP, 0xF0),
            Err(Trap::OutOfBounds)
        );
        assert_eq!(f.regs.read(reg(1)), before);
    }

    #[test]
    fn test_reset_clears_general_registers() {
        let mut f = fixture();
        f.regs.register_move(dst(0), Reg::CGP);
        f.regs.reset();
        assert_eq!(f.regs.read(reg(0)), Value::NULL);
        assert!(f.regs.read(Reg::CGP).is_tagged());
    }
}
