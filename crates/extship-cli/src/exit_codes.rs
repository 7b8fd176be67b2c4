//! Process exit codes
//!
//! Every fatal error maps to [`ERROR`]; callers only need to tell success
//! from failure.

/// Success - every step completed
pub const SUCCESS: u8 = 0;

/// Any fatal error in build, validate or publish
pub const ERROR: u8 = 1;
