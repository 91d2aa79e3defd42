//! Diagnostic creation, severity management, and rendering for the fabric compiler.
//!
//! Every stage reports problems as structured [`Diagnostic`]s carrying a
//! [`Locus`] (file, line, tile, frame) instead of a source span. The
//! thread-safe [`DiagnosticSink`] collects them while tiles compile in
//! parallel, and a [`DiagnosticRenderer`] formats them for a terminal or as JSON.

#![warn(missing_docs)]

pub mod code;
pub mod diagnostic;
pub mod locus;
pub mod renderer;
pub mod severity;
pub mod sink;

pub use code::{Category, DiagnosticCode};
pub use diagnostic::Diagnostic;
pub use locus::Locus;
pub use renderer::{DiagnosticRenderer, JsonRenderer, TerminalRenderer};
pub use severity::Severity;
pub use sink::DiagnosticSink;
