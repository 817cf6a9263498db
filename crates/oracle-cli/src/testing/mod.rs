//! Console presentation for generation and verification passes

pub mod progress;
pub mod reporter;

pub use progress::CaseProgress;
pub use reporter::{GenerateReporter, VerifyReporter};
