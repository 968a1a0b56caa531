mod diagnostic;
pub mod logging;

pub use diagnostic::{Diagnostic, DiagnosticLevel, Diagnostics};
pub use logging::{init_logging, LogLevel};
