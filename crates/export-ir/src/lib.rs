#![deny(rust_2018_idioms)]
#![deny(unsafe_op_in_unsafe_fn)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

//! # export-ir
//!
//! Value, record, and row model shared by the record export engine.
//!
//! Records are opaque to the engine: it only needs a record's kind and the
//! ability to ask it for a field by name without failing. This crate defines
//! those capabilities as traits, plus the fixed-width [`Row`] the engine
//! produces for every record and the seams to the record source and the line
//! serializer.

/// Record kinds and affinity name resolution.
pub mod kind;
/// Record capabilities, the map-backed record, and the record source seam.
pub mod record;
/// Fixed-width rows and the line serializer seam.
pub mod row;
/// Cell values, including temporal values.
pub mod value;

/// Record kind resolution.
pub use kind::{RecordKind, TypeName, demodulize};
/// Record capabilities and sources.
pub use record::{FieldRecord, LOOKUP_SUFFIX, Record, RecordIter, RecordSource};
/// Rows and their rendering.
pub use row::{LineSerializer, Row};
/// Cell values.
pub use value::Value;

use thiserror::Error;

/// Errors raised by records, record sources, and rows
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("Unknown relation: {0}")]
    UnknownRelation(String),

    #[error("Record source error in relation '{relation}': {message}")]
    Source { relation: String, message: String },

    #[error("Row index {index} out of range for row of width {width}")]
    IndexOutOfRange { index: usize, width: usize },

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl Error {
    /// Build an unknown-relation error.
    pub fn unknown_relation(relation: impl Into<String>) -> Self {
        Self::UnknownRelation(relation.into())
    }

    /// Build a record source error with relation context.
    pub fn source(relation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Source {
            relation: relation.into(),
            message: message.into(),
        }
    }

    /// Build a line serialization error.
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization(message.into())
    }
}

/// Crate-local result type for record and row operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_error_keeps_relation_context() {
        let error = Error::source("patients", "connection reset");
        assert_eq!(
            error.to_string(),
            "Record source error in relation 'patients': connection reset"
        );
    }

    #[test]
    fn test_unknown_relation_message() {
        let error = Error::unknown_relation("ghosts");
        assert_eq!(error, Error::UnknownRelation("ghosts".to_string()));
        assert_eq!(error.to_string(), "Unknown relation: ghosts");
    }
}
