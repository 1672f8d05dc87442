//! Build diagnostics: warnings and fatal errors reported to the invoker.
//!
//! Non-fatal conditions (dangling modules, duplicate assets) are recorded as
//! [`Diagnostic`]s in a thread-safe [`DiagnosticSink`] while the pipeline
//! keeps running, and are reported after a successful build. Fatal stage
//! errors are converted into error diagnostics so both render the same way
//! through a [`DiagnosticRenderer`].

#![warn(missing_docs)]

pub mod code;
pub mod diagnostic;
pub mod renderer;
pub mod severity;
pub mod sink;

pub use code::{Category, DiagnosticCode};
pub use diagnostic::Diagnostic;
pub use renderer::{DiagnosticRenderer, JsonRenderer, TerminalRenderer};
pub use severity::Severity;
pub use sink::DiagnosticSink;
