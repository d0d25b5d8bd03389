//! Secret Storage
//!
//! Holds the oracle's secret so that retired values do not linger in memory.
//!
//! # Design
//! - `Zeroize` trait for values that can be securely cleared
//! - `Secret<T>` owns the value, zeroes it on replacement and on drop
//! - Volatile writes prevent the compiler from eliding the clearing

use core::fmt;
use core::ptr;
use core::sync::atomic::{compiler_fence, Ordering};

/// Trait for values that can be securely zeroed.
pub trait Zeroize {
    /// Overwrite this value with zeros.
    ///
    /// This operation is guaranteed to not be optimized away.
    fn zeroize(&mut self);
}

impl Zeroize for i32 {
    fn zeroize(&mut self) {
        // SAFETY: `self` is a valid, aligned, exclusive reference.
        unsafe {
            ptr::write_volatile(self, 0);
        }
        compiler_fence(Ordering::SeqCst);
    }
}

/// A value that is zeroed whenever it is retired.
///
/// `Debug` never prints the value.
pub struct Secret<T: Zeroize + Copy> {
    value: T,
}

impl<T: Zeroize + Copy> Secret<T> {
    #[inline]
    pub fn new(value: T) -> Self {
        Self { value }
    }

    /// Read the current value.
    #[inline]
    pub fn expose(&self) -> T {
        self.value
    }

    /// Install a new value, returning the old one.
    ///
    /// The storage of the old value is zeroed before the new one is written.
    pub fn replace(&mut self, value: T) -> T {
        let old = self.value;
        self.value.zeroize();
        self.value = value;
        old
    }
}

impl<T: Zeroize + Copy> Drop for Secret<T> {
    fn drop(&mut self) {
        self.value.zeroize();
    }
}

impl<T: Zeroize + Copy> fmt::Debug for Secret<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Secret(..)")
    }
}
