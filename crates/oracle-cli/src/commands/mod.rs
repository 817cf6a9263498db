//! Command implementations
//!
//! Each command returns `Ok(true)` when the pass succeeded and `Ok(false)`
//! when it ran to completion but the process should exit non-zero.

pub mod generate;
pub mod verify;
