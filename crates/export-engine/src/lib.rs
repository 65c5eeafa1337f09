#![deny(rust_2018_idioms)]
#![deny(unsafe_op_in_unsafe_fn)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

//! # export-engine
//!
//! Streaming export of records as delimited text.
//!
//! [`ExportEngine`] pulls records from a [`RecordSource`](export_ir::RecordSource)
//! one at a time, builds a row for each with the mapping's
//! [`RowAssembler`](export_mapping::RowAssembler), and hands `(record, row)`
//! pairs to the caller, or renders them as lines.

pub mod engine;
pub mod source;

pub use engine::{ExportEngine, ExportLines, ExportStream, ExportSummary};
pub use source::{JsonRecordSource, MemorySource, json_to_value};

use thiserror::Error;

/// Errors that can occur during an export
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error(transparent)]
    Mapping(#[from] export_mapping::Error),

    #[error(transparent)]
    Record(#[from] export_ir::Error),

    #[error(transparent)]
    Csv(#[from] export_adapter_csv::CsvError),

    #[error("Export aborted at record {position}: {source}")]
    AtRecord {
        position: usize,
        source: export_mapping::Error,
    },

    #[error("IO error during {operation} for '{path}': {message}")]
    Io {
        operation: String,
        path: String,
        message: String,
    },
}

impl Error {
    /// Create a structured I/O error with operation/path context.
    pub fn io(
        operation: impl Into<String>,
        path: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::Io {
            operation: operation.into(),
            path: path.into(),
            message: message.into(),
        }
    }

    /// Whether the error was raised while building the export, before any
    /// record was read
    #[must_use]
    pub fn is_configuration(&self) -> bool {
        matches!(self, Error::Mapping(export_mapping::Error::Configuration(_)))
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::io("io", "<unknown>", e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
