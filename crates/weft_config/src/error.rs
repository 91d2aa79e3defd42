//! Error types for fabric description loading and validation.

use std::path::PathBuf;
use weft_arch::ArchError;
use weft_diagnostics::{Category, Diagnostic, DiagnosticCode, Locus};

/// Errors that can occur when loading or validating a fabric description.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// An I/O error occurred while reading the description.
    #[error("failed to read configuration: {0}")]
    IoError(#[from] std::io::Error),

    /// A file referenced by the description could not be read.
    #[error("failed to read '{}': {source}", path.display())]
    ReadFile {
        /// The file that failed.
        path: PathBuf,
        /// The underlying error.
        source: std::io::Error,
    },

    /// The TOML content could not be parsed.
    #[error("failed to parse configuration: {0}")]
    ParseError(String),

    /// A required field is missing or empty.
    #[error("missing required field: {0}")]
    MissingField(String),

    /// A configuration value failed validation.
    #[error("validation error: {0}")]
    ValidationError(String),

    /// A tile, port or bel is structurally invalid.
    #[error(transparent)]
    Arch(#[from] ArchError),
}

impl ConfigError {
    /// Returns the diagnostic code for this error.
    pub fn code(&self) -> DiagnosticCode {
        let number = match self {
            ConfigError::IoError(_) => 101,
            ConfigError::ReadFile { .. } => 102,
            ConfigError::ParseError(_) => 103,
            ConfigError::MissingField(_) => 104,
            ConfigError::ValidationError(_) => 105,
            ConfigError::Arch(e) => return e.code(),
        };
        DiagnosticCode::new(Category::Config, number)
    }

    /// Converts this error into an error diagnostic.
    pub fn to_diagnostic(&self) -> Diagnostic {
        match self {
            ConfigError::Arch(e) => e.to_diagnostic(),
            ConfigError::ReadFile { path, .. } => {
                Diagnostic::error(self.code(), self.to_string(), Locus::file(path.clone()))
            }
            _ => Diagnostic::error(self.code(), self.to_string(), Locus::none()),
        }
    }
}
