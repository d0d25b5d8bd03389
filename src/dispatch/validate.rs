//! Operand Validation
//!
//! Turns an opcode and its raw arguments into a fully typed `Call`.
//!
//! # Security Principles
//! - Validate ALL operands before anything runs
//! - Fail-secure: deny by default
//! - Destinations can only be built as `Dst`, so an alias can never be written
//!
//! # Checks, in order
//! 1. Argument count against the opcode's arity
//! 2. Every register operand in 0..=10
//! 3. Every destination operand in 0..=7

use super::args::Argument;
use super::opcode::Opcode;
use crate::cap::{Dst, Reg};
use crate::trap::Trap;

/// A call whose operands have all been checked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call<'a> {
    Print(&'a [Argument]),
    Move { dst: Dst, src: Reg },
    LoadCapability { dst: Dst, src: Reg, offset: i32 },
    LoadInt { src: Reg, offset: i32 },
    /// `dst` is dereferenced, not written, so it may be an alias.
    Store { src: Reg, dst: Reg, offset: i32 },
    GetAddress(Reg),
    SetAddress { dst: Dst, address: u32 },
    GetBase(Reg),
    GetLength(Reg),
    GetPermissions(Reg),
    CheckSecret { guess: i32 },
    LedOn(i32),
    LedOff(i32),
    ReadButton(i32),
    ReadSwitch(i32),
    ReadButtons,
    ReadSwitches,
    LedSet { index: i32, on: bool },
    UartWrite(&'a [Argument]),
}

/// Validate the operands of `op`.
///
/// # Returns
/// * `Ok(Call)` - every operand is well-formed
/// * `Err(Trap)` - `ArgumentCount`, `InvalidRegister` or `ReadOnlyDestination`
pub fn decode(op: Opcode, args: &[Argument]) -> Result<Call<'_>, Trap> {
    if args.len() < op.arity() {
        return Err(Trap::ArgumentCount);
    }

    let int = |i: usize| args[i].to_i32();
    let src = |i: usize| Reg::new(int(i));
    let dst = |i: usize| Dst::new(int(i));

    let call = match op {
        Opcode::Print => Call::Print(args),
        // Every index is range-checked before any destination is narrowed,
        // so a bad source wins over an alias destination.
        Opcode::Move => {
            let src = src(1)?;
            Call::Move { dst: dst(0)?, src }
        }
        Opcode::LoadCapability => {
            let src = src(1)?;
            Call::LoadCapability {
                dst: dst(0)?,
                src,
                offset: int(2),
            }
        }
        Opcode::LoadInt => Call::LoadInt {
            src: src(0)?,
            offset: int(1),
        },
        Opcode::Store => Call::Store {
            src: src(0)?,
            dst: src(1)?,
            offset: int(2),
        },
        Opcode::GetAddress => Call::GetAddress(src(0)?),
        Opcode::SetAddress => Call::SetAddress {
            dst: dst(0)?,
            address: int(1) as u32,
        },
        Opcode::GetBase => Call::GetBase(src(0)?),
        Opcode::GetLength => Call::GetLength(src(0)?),
        Opcode::GetPermissions => Call::GetPermissions(src(0)?),
        Opcode::CheckSecret => Call::CheckSecret { guess: int(0) },
        Opcode::LedOn => Call::LedOn(int(0)),
        Opcode::LedOff => Call::LedOff(int(0)),
        Opcode::ReadButton => Call::ReadButton(int(0)),
        Opcode::ReadSwitch => Call::ReadSwitch(int(0)),
        Opcode::ReadButtons => Call::ReadButtons,
        Opcode::ReadSwitches => Call::ReadSwitches,
        Opcode::LedSet => Call::LedSet {
            index: int(0),
            on: args[1].to_bool(),
        },
        Opcode::UartWrite => Call::UartWrite(args),
    };

    Ok(call)
}
