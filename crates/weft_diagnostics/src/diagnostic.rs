//! Structured diagnostic messages with severity, codes, and fabric context.

use crate::code::DiagnosticCode;
use crate::locus::Locus;
use crate::severity::Severity;
use serde::{Deserialize, Serialize};

/// A structured diagnostic message.
///
/// Each diagnostic includes:
/// - A severity level and a stage-specific code
/// - A primary message and the [`Locus`] it applies to
/// - Optional notes and help text
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// The severity level of this diagnostic.
    pub severity: Severity,
    /// The code identifying the kind of diagnostic.
    pub code: DiagnosticCode,
    /// The main diagnostic message.
    pub message: String,
    /// Where the problem is.
    pub locus: Locus,
    /// Explanatory footnotes (e.g., "note: ...").
    pub notes: Vec<String>,
    /// Actionable suggestions (e.g., "help: ...").
    pub help: Vec<String>,
}

impl Diagnostic {
    /// Creates a diagnostic with an explicit severity.
    pub fn new(
        severity: Severity,
        code: DiagnosticCode,
        message: impl Into<String>,
        locus: Locus,
    ) -> Self {
        Self {
            severity,
            code,
            message: message.into(),
            locus,
            notes: Vec::new(),
            help: Vec::new(),
        }
    }

    /// Creates a new error diagnostic.
    pub fn error(code: DiagnosticCode, message: impl Into<String>, locus: Locus) -> Self {
        Self::new(Severity::Error, code, message, locus)
    }

    /// Creates a new warning diagnostic.
    pub fn warning(code: DiagnosticCode, message: impl Into<String>, locus: Locus) -> Self {
        Self::new(Severity::Warning, code, message, locus)
    }

    /// Creates a new note diagnostic.
    pub fn note(code: DiagnosticCode, message: impl Into<String>, locus: Locus) -> Self {
        Self::new(Severity::Note, code, message, locus)
    }

    /// Adds a note to this diagnostic.
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    /// Adds a help message to this diagnostic.
    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help.push(help.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::code::Category;

    #[test]
    fn create_error() {
        let code = DiagnosticCode::new(Category::Adjacency, 101);
        let diag = Diagnostic::error(code, "row has 5 cells, header has 7", Locus::tile("LUT4AB"));
        assert_eq!(diag.severity, Severity::Error);
        assert_eq!(diag.code.to_string(), "A101");
        assert_eq!(diag.locus.tile.as_deref(), Some("LUT4AB"));
    }

    #[test]
    fn builder_methods() {
        let code = DiagnosticCode::new(Category::Allocation, 301);
        let diag = Diagnostic::warning(code, "multiplexer JS2END3 is unused", Locus::none())
            .with_note("no source drives this destination")
            .with_help("remove the column or add a source");
        assert_eq!(diag.severity, Severity::Warning);
        assert_eq!(diag.notes.len(), 1);
        assert_eq!(diag.help.len(), 1);
    }
}
