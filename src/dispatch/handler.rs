//! Call Handler
//!
//! Dispatches script calls and runs the individual operations.
//!
//! # Security Considerations
//! - All ids are looked up in the compartment's fixed table
//! - Unknown ids trap with `UnsupportedOpcode`
//! - Operands are fully validated before any operation runs
//! - Operations are check-then-act, so a trap leaves no partial state

use log::{trace, warn};

use super::args::{Argument, Reply};
use super::validate::{self, Call};
use crate::compartment::Compartment;
use crate::drivers::{uart, Peripherals};
use crate::trap::{Fault, Trap};

/// Dispatch one call from the script.
///
/// # Arguments
/// * `compartment` - The compartment the script runs in
/// * `id` - Wire opcode
/// * `args` - Raw arguments from the script engine
///
/// # Returns
/// The reply for the script, or the fault to surface to the host.
pub fn dispatch<P: Peripherals>(
    compartment: &mut Compartment<P>,
    id: u16,
    args: &[Argument],
) -> Result<Reply, Fault> {
    let table = compartment.opcodes();

    let result = match table.decode(id) {
        Some(op) => {
            trace!("[{}] call {} {:?} ({} args)", table.name(), id, op, args.len());
            validate::decode(op, args).and_then(|call| execute(compartment, call))
        }
        None => Err(Trap::UnsupportedOpcode),
    };

    result.map_err(|trap| {
        warn!("[{}] call {} trapped: {}", table.name(), id, trap);
        Fault { opcode: id, trap }
    })
}

/// Run a validated call.
fn execute<P: Peripherals>(c: &mut Compartment<P>, call: Call<'_>) -> Result<Reply, Trap> {
    let reply = match call {
        Call::Print(args) => {
            uart::print_line(&mut c.peripherals, args);
            Reply::Unit
        }
        Call::Move { dst, src } => {
            c.registers.register_move(dst, src);
            Reply::Unit
        }
        Call::LoadCapability { dst, src, offset } => {
            c.registers.load_capability(&c.memory, dst, src, offset)?;
            Reply::Unit
        }
        Call::LoadInt { src, offset } => Reply::Int(c.registers.load_int(&c.memory, src, offset)?),
        Call::Store { src, dst, offset } => {
            c.registers.store(&mut c.memory, src, dst, offset)?;
            Reply::Unit
        }
        Call::GetAddress(src) => Reply::Int(c.registers.get_address(src) as i32),
        Call::SetAddress { dst, address } => {
            c.registers.set_address(dst, address);
            Reply::Unit
        }
        Call::GetBase(src) => Reply::Int(c.registers.get_base(src) as i32),
        Call::GetLength(src) => Reply::Int(c.registers.get_length(src) as i32),
        Call::GetPermissions(src) => Reply::Int(c.registers.get_permissions(src) as i32),
        Call::CheckSecret { guess } => Reply::Bool(c.oracle.lock().check(guess)),
        Call::LedOn(index) => {
            c.peripherals.led_on(index);
            Reply::Unit
        }
        Call::LedOff(index) => {
            c.peripherals.led_off(index);
            Reply::Unit
        }
        Call::ReadButton(index) => Reply::Int(c.peripherals.read_button(index)),
        Call::ReadSwitch(index) => Reply::Int(c.peripherals.read_switch(index)),
        Call::ReadButtons => Reply::Int(c.peripherals.read_buttons()),
        Call::ReadSwitches => Reply::Int(c.peripherals.read_switches()),
        Call::LedSet { index, on } => {
            if on {
                c.peripherals.led_on(index);
            } else {
                c.peripherals.led_off(index);
            }
            Reply::Unit
        }
        Call::UartWrite(args) => {
            uart::write_raw(&mut c.peripherals, args);
            Reply::Unit
        }
    };

    Ok(reply)
}
