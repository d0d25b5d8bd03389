//! Script values crossing the host boundary
//!
//! The script engine hands over loosely typed values. Each operand is coerced
//! to the type its opcode expects, the way the engine's own conversions do.

use alloc::string::String;
use core::fmt;

/// One argument as received from the script engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Argument {
    Int(i32),
    Bool(bool),
    Text(String),
}

impl Argument {
    /// Coerce to a 32-bit integer.
    ///
    /// Booleans become 0/1; text is parsed as decimal, and unparsable text is 0.
    pub fn to_i32(&self) -> i32 {
        match self {
            Self::Int(v) => *v,
            Self::Bool(b) => i32::from(*b),
            Self::Text(s) => s.trim().parse().unwrap_or(0),
        }
    }

    /// Coerce to a boolean. Zero and empty text are false.
    pub fn to_bool(&self) -> bool {
        match self {
            Self::Int(v) => *v != 0,
            Self::Bool(b) => *b,
            Self::Text(s) => !s.is_empty(),
        }
    }
}

impl fmt::Display for Argument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(v) => write!(f, "{}", v),
            Self::Bool(b) => write!(f, "{}", b),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<i32> for Argument {
    fn from(v: i32) -> Self {
        Self::Int(v)
    }
}

impl From<bool> for Argument {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<&str> for Argument {
    fn from(s: &str) -> Self {
        Self::Text(String::from(s))
    }
}

/// What a successful call hands back to the script.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reply {
    Unit,
    Int(i32),
    Bool(bool),
}
