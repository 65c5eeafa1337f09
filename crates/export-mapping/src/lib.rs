//! # export-mapping
//!
//! Declarative column mappings and the row assembly engine.
//!
//! A [`MappingSpec`] is an ordered list of columns. For every record the
//! [`RowAssembler`] asks the [`ColumnSelector`] which columns apply, pulls
//! each value with the [`ValueExtractor`], normalizes dates with the
//! [`ValueFormatter`], and places the result at the column's position.

pub mod accessors;
pub mod assembler;
pub mod catalog;
pub mod config;
pub mod extractor;
pub mod formatter;
pub mod selector;
pub mod spec;

pub use accessors::{AccessorRegistry, ComputedFn};
pub use assembler::RowAssembler;
pub use catalog::{MappingBundle, MappingCatalog};
pub use config::{AccessorConfig, ColumnConfig, ColumnEntry, ExportOptions, TypeNames};
pub use extractor::ValueExtractor;
pub use formatter::{DatePattern, ValueFormatter};
pub use selector::ColumnSelector;
pub use spec::{Accessor, ColumnDefinition, FieldRef, MappingSpec};

use thiserror::Error;

/// Errors that can occur while building or running a mapping
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// Rejected options or column definitions; raised before any record is read
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A column's accessor failed for a record
    #[error("Extraction fault in column '{column}': {message}")]
    Extraction { column: String, message: String },

    /// Failure reported by a computed accessor
    #[error("Computed accessor failed: {0}")]
    Computed(String),

    #[error(transparent)]
    Record(#[from] export_ir::Error),
}

impl Error {
    /// Create a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    /// Create an extraction fault for a column
    pub fn extraction(column: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Extraction {
            column: column.into(),
            message: message.into(),
        }
    }

    /// Create the error a computed accessor returns
    pub fn computed(message: impl Into<String>) -> Self {
        Self::Computed(message.into())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
