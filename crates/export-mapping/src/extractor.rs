//! Value extraction
//!
//! Reads a column's raw value from a record through its first accessor:
//! computed accessors are invoked, named fields prefer their lookup variant
//! when lookup mode is on, and a field the record does not have reads as
//! absent.

use export_ir::{Record, Value};
use tracing::trace;

use crate::spec::{ColumnDefinition, FieldRef};
use crate::{Error, Result};

/// Pulls raw column values from records
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ValueExtractor {
    use_lookup_values: bool,
}

impl ValueExtractor {
    /// Extractor reading raw field values
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Prefer `<field>_lookup_value` over `<field>` when the record has it
    #[must_use]
    pub fn with_lookup_values(mut self, enabled: bool) -> Self {
        self.use_lookup_values = enabled;
        self
    }

    /// Whether lookup values are preferred
    #[must_use]
    pub fn uses_lookup_values(&self) -> bool {
        self.use_lookup_values
    }

    /// Raw value of `column` for `record`; `None` when absent or null
    ///
    /// # Errors
    ///
    /// Returns an extraction fault when a computed accessor fails.
    pub fn extract<R: Record>(
        &self,
        record: &R,
        column: &ColumnDefinition<R>,
    ) -> Result<Option<Value>> {
        let Some(accessor) = column.primary_accessor() else {
            return Ok(None);
        };

        let value = match accessor.field_ref() {
            FieldRef::Computed { label, func } => {
                trace!(column = column.name(), accessor = %label, "Invoking computed accessor");
                Some(func(record).map_err(|e| fault(column.name(), e))?)
            }
            FieldRef::Name(field) => self
                .lookup_value(record, field)
                .or_else(|| record.try_get(field)),
        };

        Ok(value.filter(|v| !v.is_null()))
    }

    fn lookup_value<R: Record>(&self, record: &R, field: &str) -> Option<Value> {
        if self.use_lookup_values {
            record.try_get_lookup(field)
        } else {
            None
        }
    }
}

fn fault(column: &str, error: Error) -> Error {
    match error {
        Error::Computed(message) => Error::extraction(column, message),
        Error::Extraction { message, .. } => Error::extraction(column, message),
        other => Error::extraction(column, other.to_string()),
    }
}
