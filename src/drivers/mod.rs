//! Peripheral seam
//!
//! LEDs, buttons, switches and the two UARTs are owned by the host. The machine
//! only reaches them through the `Peripherals` trait.
//!
//! All peripheral calls follow these rules:
//! - Synchronous and blocking; a call that has started completes
//! - No retry, backoff or cancellation
//! - Index validation is the device's business, not the machine's

pub mod uart;

/// Host-provided peripheral accessors.
pub trait Peripherals {
    /// Write text to the console UART.
    fn console_write(&mut self, text: &str);

    /// Write text to the auxiliary UART.
    fn uart_write(&mut self, text: &str);

    fn led_on(&mut self, index: i32);

    fn led_off(&mut self, index: i32);

    /// Read one button.
    fn read_button(&mut self, index: i32) -> i32;

    /// Read one switch.
    fn read_switch(&mut self, index: i32) -> i32;

    /// All buttons as a bitmap.
    fn read_buttons(&mut self) -> i32;

    /// All switches as a bitmap.
    fn read_switches(&mut self) -> i32;
}

/// Peripherals for a board without any: reads return 0, writes are dropped.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullPeripherals;

impl Peripherals for NullPeripherals {
    fn console_write(&mut self, _text: &str) {}

    fn uart_write(&mut self, _text: &str) {}

    fn led_on(&mut self, _index: i32) {}

    fn led_off(&mut self, _index: i32) {}

    fn read_button(&mut self, _index: i32) -> i32 {
        0
    }

    fn read_switch(&mut self, _index: i32) -> i32 {
        0
    }

    fn read_buttons(&mut self) -> i32 {
        0
    }

    fn read_switches(&mut self) -> i32 {
        0
    }
}
