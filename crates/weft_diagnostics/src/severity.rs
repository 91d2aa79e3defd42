//! How serious a fabric-compilation diagnostic is.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Severity of a diagnostic raised while loading, checking or compiling a
/// fabric.
///
/// `Help < Note < Warning < Error`.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Attached to another diagnostic as a suggested fix.
    Help,
    /// A fact worth knowing, e.g. a tile with no switch matrix file.
    Note,
    /// A fallback was taken, such as the default frame policy replacing a
    /// missing ConfigMem table.
    Warning,
    /// The fabric cannot be compiled; no bitstream spec is written.
    Error,
}

impl Severity {
    /// Returns `true` if this severity is [`Error`](Severity::Error).
    pub fn is_error(self) -> bool {
        self == Severity::Error
    }

    /// Whether a diagnostic of this severity is still printed under
    /// `--quiet`.
    pub fn shown_when(self, quiet: bool) -> bool {
        !quiet || self.is_error()
    }

    /// The lowercase label used in rendered reports.
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Help => "help",
            Severity::Note => "note",
            Severity::Warning => "warning",
            Severity::Error => "error",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn errors_outrank_fallbacks() {
        assert!(Severity::Help < Severity::Note);
        assert!(Severity::Note < Severity::Warning);
        assert!(Severity::Warning < Severity::Error);
        assert_eq!(
            [Severity::Warning, Severity::Error, Severity::Note].iter().max(),
            Some(&Severity::Error)
        );
    }

    #[test]
    fn quiet_keeps_only_errors() {
        assert!(Severity::Error.shown_when(true));
        assert!(!Severity::Warning.shown_when(true));
        assert!(!Severity::Note.shown_when(true));
        assert!(Severity::Note.shown_when(false));
    }

    #[test]
    fn serialized_label_matches_display() {
        let json = serde_json::to_string(&Severity::Warning).unwrap();
        assert_eq!(json, "\"warning\"");
        assert_eq!(Severity::Warning.to_string(), "warning");
    }
}
