//! Error types for the CSV adapter

use thiserror::Error;

/// Errors that can occur when writing CSV
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CsvError {
    /// CSV write error with line context
    #[error("CSV write error at line {line}: {message}")]
    Write { line: usize, message: String },

    /// I/O error
    #[error("IO error: {0}")]
    Io(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl CsvError {
    /// Create a write error at a specific output line
    pub fn write_at(line: usize, message: impl Into<String>) -> Self {
        Self::Write {
            line,
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Get the line number if available
    #[must_use]
    pub fn line_number(&self) -> Option<usize> {
        match self {
            Self::Write { line, .. } if *line > 0 => Some(*line),
            _ => None,
        }
    }
}

impl From<std::io::Error> for CsvError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e.to_string())
    }
}

impl From<CsvError> for export_ir::Error {
    fn from(e: CsvError) -> Self {
        export_ir::Error::serialization(e.to_string())
    }
}

/// Result type for CSV operations
pub type CsvResult<T> = std::result::Result<T, CsvError>;
