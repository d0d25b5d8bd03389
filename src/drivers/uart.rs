//! UART text output for scripts
//!
//! Formats script arguments and forwards them to one of the host's UARTs.
//!
//! # Output Format
//! - Console (`print`): arguments concatenated, highlighted, one line per call
//! - Auxiliary (`uart_write`): arguments concatenated, nothing added

use core::fmt::{self, Write};

use super::Peripherals;

/// Console highlight: bold green.
const HIGHLIGHT_ON: &str = "\x1b[32;1m";
/// Reset attributes.
const HIGHLIGHT_OFF: &str = "\x1b[0m";

/// Which UART a writer targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Port {
    Console,
    Auxiliary,
}

/// `fmt::Write` adapter over a peripheral UART.
pub struct UartWriter<'a, P: Peripherals + ?Sized> {
    device: &'a mut P,
    port: Port,
}

impl<'a, P: Peripherals + ?Sized> UartWriter<'a, P> {
    pub fn new(device: &'a mut P, port: Port) -> Self {
        Self { device, port }
    }
}

impl<P: Peripherals + ?Sized> Write for UartWriter<'_, P> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        match self.port {
            Port::Console => self.device.console_write(s),
            Port::Auxiliary => self.device.uart_write(s),
        }
        Ok(())
    }
}

/// Print every argument on one highlighted console line.
pub fn print_line<P, T>(device: &mut P, args: &[T])
where
    P: Peripherals + ?Sized,
    T: fmt::Display,
{
    let mut uart = UartWriter::new(device, Port::Console);
    let _ = uart.write_str(HIGHLIGHT_ON);
    for arg in args {
        let _ = write!(uart, "{}", arg);
    }
    let _ = uart.write_str(HIGHLIGHT_OFF);
    let _ = uart.write_str("\n");
}

/// Write every argument to the auxiliary UART, verbatim.
pub fn write_raw<P, T>(device: &mut P, args: &[T])
where
    P: Peripherals + ?Sized,
    T: fmt::Display,
{
    let mut uart = UartWriter::new(device, Port::Auxiliary);
    for arg in args {
        let _ = write!(uart, "{}", arg);
    }
}
