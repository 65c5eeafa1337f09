//! # export-adapter-csv
//!
//! CSV rendering for exported rows.
//!
//! Provides a [`CsvLineSerializer`] that renders one line at a time and a
//! streaming [`CsvWriter`] for whole exports. Quoting and escaping are left to
//! the `csv` crate.
//!
//! ## Example Usage
//!
//! ```rust
//! use export_adapter_csv::{CsvConfig, CsvLineSerializer, NullRepresentation};
//! use export_ir::LineSerializer;
//!
//! let serializer = CsvLineSerializer::new(
//!     CsvConfig::new()
//!         .delimiter(';')
//!         .null_representation(NullRepresentation::NullString),
//! );
//! let line = serializer.render(&["id".to_string(), "name".to_string()]).unwrap();
//! assert_eq!(line, "id;name\n");
//! ```

pub mod config;
pub mod errors;
pub mod writer;

pub use config::{CsvConfig, NullRepresentation, RecordTerminator};
pub use errors::{CsvError, CsvResult};
pub use writer::{CsvLineSerializer, CsvWriter};
