//! Row assembly
//!
//! Builds one fixed-width row per record: every declared column has a cell,
//! and columns that do not apply to the record stay absent.

use export_ir::{Record, Row};
use std::sync::Arc;
use tracing::trace;

use crate::extractor::ValueExtractor;
use crate::formatter::ValueFormatter;
use crate::selector::ColumnSelector;
use crate::spec::MappingSpec;
use crate::{Error, Result};

/// Turns records into rows for one mapping
pub struct RowAssembler<R: Record> {
    spec: Arc<MappingSpec<R>>,
    extractor: ValueExtractor,
    formatter: ValueFormatter,
}

impl<R: Record> RowAssembler<R> {
    /// Assembler with raw field values and column-level date patterns
    pub fn new(spec: Arc<MappingSpec<R>>) -> Self {
        Self {
            spec,
            extractor: ValueExtractor::new(),
            formatter: ValueFormatter::new(),
        }
    }

    /// Replace the extractor
    #[must_use]
    pub fn with_extractor(mut self, extractor: ValueExtractor) -> Self {
        self.extractor = extractor;
        self
    }

    /// Replace the formatter
    #[must_use]
    pub fn with_formatter(mut self, formatter: ValueFormatter) -> Self {
        self.formatter = formatter;
        self
    }

    /// The mapping rows are built for
    pub fn spec(&self) -> &MappingSpec<R> {
        &self.spec
    }

    /// The extractor in use
    pub fn extractor(&self) -> &ValueExtractor {
        &self.extractor
    }

    /// The formatter in use
    pub fn formatter(&self) -> &ValueFormatter {
        &self.formatter
    }

    /// Build the row for `record`
    ///
    /// # Errors
    ///
    /// Returns an extraction fault when a computed accessor fails; no partial
    /// row is returned.
    pub fn build_row(&self, record: &R) -> Result<Row> {
        let mut row = Row::blank(self.spec.len());

        for column in ColumnSelector::new(&self.spec).select(record) {
            let index = self.spec.index_of(column).ok_or_else(|| {
                Error::configuration(format!(
                    "Column '{}' is not part of the mapping",
                    column.name()
                ))
            })?;
            let value = self
                .extractor
                .extract(record, column)?
                .map(|value| self.formatter.format(value, column));
            trace!(column = column.name(), index, ?value, "Mapped column");
            row.set(index, value)?;
        }

        Ok(row)
    }

    /// Build the row for `record`, filling its absent cells from `parent`
    ///
    /// # Errors
    ///
    /// Returns an extraction fault when a computed accessor fails.
    pub fn build_row_with_parent(&self, record: &R, parent: &Row) -> Result<Row> {
        let row = self.build_row(record)?;
        Ok(Self::merge_row(&row, parent))
    }

    /// Keep `primary`'s cells, taking `fallback`'s where `primary` is absent
    #[must_use]
    pub fn merge_row(primary: &Row, fallback: &Row) -> Row {
        primary.merge(fallback)
    }
}
