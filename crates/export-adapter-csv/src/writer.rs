//! CSV writer

use crate::config::CsvConfig;
use crate::errors::{CsvError, CsvResult};
use export_ir::{LineSerializer, Row};
use std::io::Write;
use tracing::{debug, trace};

/// Renders single lines as CSV
#[derive(Debug, Clone, Default)]
pub struct CsvLineSerializer {
    config: CsvConfig,
}

impl CsvLineSerializer {
    /// Create a serializer with the given configuration
    #[must_use]
    pub fn new(config: CsvConfig) -> Self {
        Self { config }
    }

    /// The configuration in use
    #[must_use]
    pub fn config(&self) -> &CsvConfig {
        &self.config
    }
}

impl LineSerializer for CsvLineSerializer {
    fn render(&self, cells: &[String]) -> export_ir::Result<String> {
        self.config.validate().map_err(CsvError::Config)?;

        let mut writer = self.config.builder().from_writer(Vec::new());
        writer
            .write_record(cells)
            .map_err(|e| CsvError::write_at(1, e.to_string()))?;
        let bytes = writer
            .into_inner()
            .map_err(|e| CsvError::write_at(1, e.to_string()))?;

        String::from_utf8(bytes).map_err(|e| export_ir::Error::serialization(e.to_string()))
    }
    fn render_row(&self, row: &Row) -> export_ir::Result<String> {
        self.render(&null_filled(row, &self.config))
    }
}

fn null_filled(row: &Row, config: &CsvConfig) -> Vec<String> {
    row.cells()
        .iter()
        .map(|cell| match cell {
            Some(value) => value.to_string(),
            None => config.null_representation.as_str().to_string(),
        })
        .collect()
}

/// Streaming CSV writer for exported rows
pub struct CsvWriter<W: Write> {
    inner: csv::Writer<W>,
    config: CsvConfig,
    lines_written: usize,
}

impl<W: Write> CsvWriter<W> {
    /// Wrap `writer`
    ///
    /// # Errors
    ///
    /// Returns a configuration error for an invalid [`CsvConfig`].
    pub fn new(writer: W, config: CsvConfig) -> CsvResult<Self> {
        config.validate().map_err(CsvError::Config)?;
        Ok(Self {
            inner: config.builder().from_writer(writer),
            config,
            lines_written: 0,
        })
    }

    /// Write the header line, unless headers are disabled
    ///
    /// # Errors
    ///
    /// Returns an error if the line cannot be written.
    pub fn write_header<S: AsRef<str>>(&mut self, names: &[S]) -> CsvResult<()> {
        if !self.config.has_header {
            trace!("Header disabled, skipping");
            return Ok(());
        }
        self.write_line(names.iter().map(|name| name.as_ref().as_bytes()))
    }

    /// Write one row, absent cells as the configured null text
    ///
    /// # Errors
    ///
    /// Returns an error if the line cannot be written.
    pub fn write_row(&mut self, row: &Row) -> CsvResult<()> {
        let cells = null_filled(row, &self.config);
        trace!(?cells, "Writing CSV row");
        self.write_line(cells.iter().map(String::as_bytes))
    }

    /// Number of lines written so far
    #[must_use]
    pub fn lines_written(&self) -> usize {
        self.lines_written
    }

    /// Flush buffered output
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying writer fails to flush.
    pub fn flush(&mut self) -> CsvResult<()> {
        self.inner.flush()?;
        debug!(lines = self.lines_written, "Flushed CSV output");
        Ok(())
    }

    /// Flush and return the underlying writer
    ///
    /// # Errors
    ///
    /// Returns an error if the final flush fails.
    pub fn into_inner(self) -> CsvResult<W> {
        self.inner
            .into_inner()
            .map_err(|e| CsvError::Io(e.error().to_string()))
    }

    fn write_line<'a>(&mut self, fields: impl IntoIterator<Item = &'a [u8]>) -> CsvResult<()> {
        let line = self.lines_written + 1;
        self.inner
            .write_record(fields)
            .map_err(|e| CsvError::write_at(line, e.to_string()))?;
        self.lines_written = line;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{NullRepresentation, RecordTerminator};
    use export_ir::Value;

    fn strings(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn test_render_simple_line() {
        let serializer = CsvLineSerializer::default();
        let line = serializer.render(&strings(&["John", "30"])).unwrap();
        assert_eq!(line, "John,30\n");
    }

    #[test]
    fn test_render_escapes_special_characters() {
        let serializer = CsvLineSerializer::default();
        let line = serializer
            .render(&strings(&["Smith, John", "say \"hi\"", "multi\nline"]))
            .unwrap();
        assert_eq!(line, "\"Smith, John\",\"say \"\"hi\"\"\",\"multi\nline\"\n");
    }

    #[test]
    fn test_render_with_crlf_and_semicolon() {
        let serializer = CsvLineSerializer::new(
            CsvConfig::new()
                .delimiter(';')
                .record_terminator(RecordTerminator::CRLF),
        );
        assert_eq!(serializer.render(&strings(&["a", "b"])).unwrap(), "a;b\r\n");
    }

    #[test]
    fn test_render_row_uses_null_representation() {
        let row = Row::from_cells(vec![Some(Value::Integer(1)), None]);
        let serializer =
            CsvLineSerializer::new(CsvConfig::new().null_representation(NullRepresentation::NullString));
        assert_eq!(serializer.render_row(&row).unwrap(), "1,NULL\n");
        assert_eq!(CsvLineSerializer::default().render_row(&row).unwrap(), "1,\n");
    }

    #[test]
    fn test_render_rejects_invalid_config() {
        let serializer = CsvLineSerializer::new(CsvConfig::new().delimiter('"'));
        assert!(serializer.render(&strings(&["a"])).is_err());
    }

    #[test]
    fn test_write_header_and_rows() {
        let mut writer = CsvWriter::new(Vec::new(), CsvConfig::default()).unwrap();
        writer.write_header(&["id", "label"]).unwrap();
        writer
            .write_row(&Row::from_cells(vec![Some(Value::Integer(1)), None]))
            .unwrap();
        writer
            .write_row(&Row::from_cells(vec![
                Some(Value::Integer(2)),
                Some(Value::from("Rex")),
            ]))
            .unwrap();
        assert_eq!(writer.lines_written(), 3);

        let output = String::from_utf8(writer.into_inner().unwrap()).unwrap();
        assert_eq!(output, "id,label\n1,\n2,Rex\n");
    }

    #[test]
    fn test_header_can_be_disabled() {
        let mut writer = CsvWriter::new(Vec::new(), CsvConfig::new().has_header(false)).unwrap();
        writer.write_header(&["id"]).unwrap();
        writer
            .write_row(&Row::from_cells(vec![Some(Value::Integer(1))]))
            .unwrap();
        assert_eq!(writer.lines_written(), 1);

        let output = String::from_utf8(writer.into_inner().unwrap()).unwrap();
        assert_eq!(output, "1\n");
    }

    #[test]
    fn test_absent_cells_use_null_representation() {
        let config = CsvConfig::new().null_representation(NullRepresentation::BackslashN);
        let mut writer = CsvWriter::new(Vec::new(), config).unwrap();
        writer
            .write_row(&Row::from_cells(vec![None, Some(Value::from(""))]))
            .unwrap();

        let output = String::from_utf8(writer.into_inner().unwrap()).unwrap();
        assert_eq!(output, "\\N,\n");
    }

    #[test]
    fn test_invalid_config_rejected() {
        let err = CsvWriter::new(Vec::new(), CsvConfig::new().quote_char(','))
            .err()
            .unwrap();
        assert!(matches!(err, CsvError::Config(_)));
    }
}
