//! Export engine
//!
//! Ties a record source to a mapping. Records are pulled lazily from the
//! source, one row is built per record, and the first fault ends the export.

use export_adapter_csv::{CsvConfig, CsvWriter};
use export_ir::{LineSerializer, Record, RecordIter, RecordSource, Row};
use export_mapping::{
    AccessorRegistry, DatePattern, ExportOptions, MappingCatalog, MappingSpec, RowAssembler,
    ValueExtractor, ValueFormatter,
};
use std::io::Write;
use std::iter::FusedIterator;
use std::sync::Arc;
use tracing::{debug, trace, warn};

use crate::{Error, Result};

/// Totals for a finished export
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExportSummary {
    /// Data rows written
    pub rows: usize,
    /// Lines written, header included
    pub lines: usize,
}

/// Exports one relation of a record source through a mapping
pub struct ExportEngine<S: RecordSource> {
    source: S,
    assembler: RowAssembler<S::Record>,
    header_lines: bool,
    footer_lines: bool,
    format: Option<String>,
    filename: Option<String>,
}

impl<S: RecordSource> ExportEngine<S> {
    /// Create an engine over `source` with raw field values and no date
    /// override
    pub fn new(source: S, spec: impl Into<Arc<MappingSpec<S::Record>>>) -> Self {
        Self {
            source,
            assembler: RowAssembler::new(spec.into()),
            header_lines: true,
            footer_lines: true,
            format: None,
            filename: None,
        }
    }

    /// Create an engine from export options
    ///
    /// # Errors
    ///
    /// Returns a configuration error when the options do not describe a valid
    /// mapping.
    pub fn from_options(
        source: S,
        options: &ExportOptions,
        registry: &AccessorRegistry<S::Record>,
        catalog: &MappingCatalog,
    ) -> Result<Self> {
        let spec = MappingSpec::from_options(options, registry, catalog)?;
        debug!(
            relation = spec.relation(),
            columns = spec.len(),
            "Compiled export options"
        );

        let mut engine = Self::new(source, spec).with_header_lines(options.header_lines());
        engine.footer_lines = options.footer_lines();
        engine.format.clone_from(&options.format);
        engine.filename.clone_from(&options.filename);
        Ok(engine)
    }

    /// Prefer lookup values over raw field values
    #[must_use]
    pub fn with_lookup_values(mut self, enabled: bool) -> Self {
        self.assembler = self
            .assembler
            .with_extractor(ValueExtractor::new().with_lookup_values(enabled));
        self
    }

    /// Format every temporal value with `pattern`, overriding column formats
    ///
    /// # Errors
    ///
    /// Returns a configuration error for an empty or invalid pattern.
    pub fn with_date_pattern(mut self, pattern: &str) -> Result<Self> {
        let pattern = DatePattern::parse(pattern)?;
        self.assembler = self
            .assembler
            .with_formatter(ValueFormatter::with_override(pattern));
        Ok(self)
    }

    /// Emit the header line before the rows
    #[must_use]
    pub fn with_header_lines(mut self, enabled: bool) -> Self {
        self.header_lines = enabled;
        self
    }

    /// The mapping in use
    pub fn spec(&self) -> &MappingSpec<S::Record> {
        self.assembler.spec()
    }

    /// The underlying record source
    pub fn source(&self) -> &S {
        &self.source
    }

    /// Column names in output order
    pub fn header_line(&self) -> Vec<String> {
        self.spec()
            .column_names()
            .into_iter()
            .map(str::to_string)
            .collect()
    }

    /// Whether a header line is emitted
    pub fn header_lines(&self) -> bool {
        self.header_lines
    }

    /// Whether footer lines were requested. No footer content is produced.
    pub fn footer_lines(&self) -> bool {
        self.footer_lines
    }

    /// Output format named in the options, if any
    pub fn format(&self) -> Option<&str> {
        self.format.as_deref()
    }

    /// Output file name named in the options, if any
    pub fn filename(&self) -> Option<&str> {
        self.filename.as_deref()
    }

    /// Stream `(record, row)` pairs in source order
    ///
    /// # Errors
    ///
    /// Returns an error when the source does not know the relation.
    pub fn stream(&self) -> Result<ExportStream<'_, S::Record>> {
        let relation = self.spec().relation();
        let records = self.source.find_each(relation)?;
        debug!(
            relation,
            columns = self.spec().len(),
            lookup_values = self.assembler.extractor().uses_lookup_values(),
            "Starting export stream"
        );
        Ok(ExportStream {
            records,
            assembler: &self.assembler,
            position: 0,
            finished: false,
        })
    }

    /// Stream rendered lines: the header first when enabled, then one line per
    /// row
    ///
    /// # Errors
    ///
    /// Returns an error when the source does not know the relation.
    pub fn lines<'a, L: LineSerializer>(
        &'a self,
        serializer: &'a L,
    ) -> Result<ExportLines<'a, S::Record, L>> {
        Ok(ExportLines {
            header: self.header_lines.then(|| self.header_line()),
            rows: self.stream()?,
            serializer,
            finished: false,
        })
    }

    /// Write the whole export as CSV
    ///
    /// The header is written only when both the engine and `config` ask for
    /// it.
    ///
    /// # Errors
    ///
    /// Returns the first source, extraction or write error; output written
    /// before it is left in `writer`.
    pub fn write_csv<W: Write>(&self, writer: W, config: CsvConfig) -> Result<ExportSummary> {
        let has_header = config.has_header && self.header_lines;
        let mut csv = CsvWriter::new(writer, config.has_header(has_header))?;
        let header = self.header_line();
        csv.write_header(header.as_slice())?;

        let mut rows = 0;
        for item in self.stream()? {
            let (_, row) = item?;
            csv.write_row(&row)?;
            rows += 1;
        }
        csv.flush()?;

        let summary = ExportSummary {
            rows,
            lines: csv.lines_written(),
        };
        debug!(rows = summary.rows, lines = summary.lines, "Finished CSV export");
        Ok(summary)
    }

    /// Render the whole export as a CSV string with default settings
    ///
    /// # Errors
    ///
    /// Returns the first source or extraction error.
    pub fn to_csv(&self) -> Result<String> {
        let mut buffer = Vec::new();
        self.write_csv(&mut buffer, CsvConfig::default())?;
        String::from_utf8(buffer)
            .map_err(|e| Error::from(export_ir::Error::serialization(e.to_string())))
    }
}

/// Lazy stream of `(record, row)` pairs.
///
/// Ends after the first error.
pub struct ExportStream<'a, R: Record> {
    records: RecordIter<'a, R>,
    assembler: &'a RowAssembler<R>,
    position: usize,
    finished: bool,
}

impl<R: Record> ExportStream<'_, R> {
    /// Records pulled from the source so far
    pub fn position(&self) -> usize {
        self.position
    }
}

impl<R: Record> Iterator for ExportStream<'_, R> {
    type Item = Result<(R, Row)>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        let record = match self.records.next() {
            None => {
                self.finished = true;
                debug!(records = self.position, "Export stream exhausted");
                return None;
            }
            Some(Err(e)) => {
                self.finished = true;
                warn!(after = self.position, error = %e, "Record source failed");
                return Some(Err(e.into()));
            }
            Some(Ok(record)) => record,
        };
        self.position += 1;

        match self.assembler.build_row(&record) {
            Ok(row) => {
                trace!(position = self.position, width = row.width(), "Built row");
                Some(Ok((record, row)))
            }
            Err(source) => {
                self.finished = true;
                warn!(position = self.position, error = %source, "Export aborted");
                Some(Err(Error::AtRecord {
                    position: self.position,
                    source,
                }))
            }
        }
    }
}

impl<R: Record> FusedIterator for ExportStream<'_, R> {}

/// Lazy stream of rendered lines
pub struct ExportLines<'a, R: Record, L> {
    header: Option<Vec<String>>,
    rows: ExportStream<'a, R>,
    serializer: &'a L,
    finished: bool,
}

impl<R: Record, L: LineSerializer> Iterator for ExportLines<'_, R, L> {
    type Item = Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        let rendered = if let Some(header) = self.header.take() {
            self.serializer.render(&header).map_err(Error::from)
        } else {
            match self.rows.next()? {
                Ok((_, row)) => self.serializer.render_row(&row).map_err(Error::from),
                Err(e) => Err(e),
            }
        };

        if rendered.is_err() {
            self.finished = true;
        }
        Some(rendered)
    }
}

impl<R: Record, L: LineSerializer> FusedIterator for ExportLines<'_, R, L> {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::MemorySource;
    use export_adapter_csv::{CsvLineSerializer, NullRepresentation};
    use export_ir::{FieldRecord, TypeName, Value};
    use export_mapping::{Accessor, ColumnDefinition};

    fn animal_spec() -> MappingSpec<FieldRecord> {
        MappingSpec::new(
            "animals",
            vec![
                ColumnDefinition::named("id"),
                ColumnDefinition::new("label")
                    .for_kinds([TypeName::new("Dog")])
                    .with_accessor(Accessor::field("name")),
            ],
        )
        .unwrap()
    }

    fn animals() -> MemorySource<FieldRecord> {
        MemorySource::new().with_relation(
            "animals",
            vec![
                FieldRecord::new("Cat").with_field("id", 1).with_field("name", "Tom"),
                FieldRecord::new("Dog").with_field("id", 2).with_field("name", "Rex"),
            ],
        )
    }

    fn failing_spec() -> MappingSpec<FieldRecord> {
        MappingSpec::new(
            "animals",
            vec![
                ColumnDefinition::named("id"),
                ColumnDefinition::new("ratio").with_accessor(Accessor::computed(
                    |record: &FieldRecord| match record.try_get("id") {
                        Some(Value::Integer(1)) => Err(export_mapping::Error::computed("divide by zero")),
                        _ => Ok(Value::Integer(1)),
                    },
                )),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_stream_yields_records_with_rows() {
        let engine = ExportEngine::new(animals(), animal_spec());
        let pairs: Vec<_> = engine.stream().unwrap().collect::<Result<_>>().unwrap();

        assert_eq!(pairs.len(), 2);
        assert_eq!(pairs[0].0.try_get("name"), Some(Value::from("Tom")));
        assert_eq!(pairs[0].1.to_strings(), vec!["1", ""]);
        assert_eq!(pairs[1].1.to_strings(), vec!["2", "Rex"]);
    }

    #[test]
    fn test_empty_relation_renders_header_only() {
        let source = MemorySource::new().with_relation("animals", Vec::new());
        let engine = ExportEngine::new(source, animal_spec());
        let serializer = CsvLineSerializer::default();

        let lines: Vec<String> = engine.lines(&serializer).unwrap().collect::<Result<_>>().unwrap();
        assert_eq!(lines, vec!["id,label\n"]);
        assert_eq!(engine.stream().unwrap().count(), 0);
    }

    #[test]
    fn test_header_can_be_disabled() {
        let engine = ExportEngine::new(animals(), animal_spec()).with_header_lines(false);
        let serializer = CsvLineSerializer::default();

        let lines: Vec<String> = engine.lines(&serializer).unwrap().collect::<Result<_>>().unwrap();
        assert_eq!(lines, vec!["1,\n", "2,Rex\n"]);
        assert_eq!(engine.to_csv().unwrap(), "1,\n2,Rex\n");
    }

    #[test]
    fn test_lines_and_write_csv_agree_on_absent_cells() {
        let engine = ExportEngine::new(animals(), animal_spec());
        let config = CsvConfig::new().null_representation(NullRepresentation::NullString);
        let serializer = CsvLineSerializer::new(config.clone());

        let lines: String = engine.lines(&serializer).unwrap().collect::<Result<_>>().unwrap();
        let mut buffer = Vec::new();
        engine.write_csv(&mut buffer, config).unwrap();

        assert_eq!(lines, "id,label\n1,NULL\n2,Rex\n");
        assert_eq!(String::from_utf8(buffer).unwrap(), lines);
    }

    #[test]
    fn test_unknown_relation() {
        let engine = ExportEngine::new(MemorySource::new(), animal_spec());
        assert_eq!(
            engine.stream().err(),
            Some(Error::Record(export_ir::Error::UnknownRelation(
                "animals".to_string()
            )))
        );
    }

    #[test]
    fn test_computed_fault_aborts_stream_at_record() {
        let source = MemorySource::new().with_relation(
            "animals",
            vec![
                FieldRecord::new("Dog").with_field("id", 2),
                FieldRecord::new("Dog").with_field("id", 1),
                FieldRecord::new("Dog").with_field("id", 3),
            ],
        );
        let engine = ExportEngine::new(source, failing_spec());
        let mut stream = engine.stream().unwrap();

        assert!(stream.next().unwrap().is_ok());
        let err = stream.next().unwrap().unwrap_err();
        assert_eq!(
            err,
            Error::AtRecord {
                position: 2,
                source: export_mapping::Error::extraction("ratio", "divide by zero"),
            }
        );
        assert!(stream.next().is_none());
        assert!(stream.next().is_none());
        assert_eq!(stream.position(), 2);
    }

    #[test]
    fn test_lines_stop_after_fault() {
        let source = MemorySource::new().with_relation(
            "animals",
            vec![
                FieldRecord::new("Dog").with_field("id", 1),
                FieldRecord::new("Dog").with_field("id", 2),
            ],
        );
        let engine = ExportEngine::new(source, failing_spec());
        let serializer = CsvLineSerializer::default();

        let lines: Vec<Result<String>> = engine.lines(&serializer).unwrap().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], Ok("id,ratio\n".to_string()));
        assert!(matches!(lines[1], Err(Error::AtRecord { position: 1, .. })));
        assert!(engine.to_csv().is_err());
    }

    #[test]
    fn test_invalid_date_pattern_is_configuration_error() {
        let err = ExportEngine::new(animals(), animal_spec())
            .with_date_pattern("")
            .err()
            .unwrap();
        assert!(err.is_configuration());

        let err = ExportEngine::new(animals(), animal_spec())
            .with_date_pattern("%#z")
            .err()
            .unwrap();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_write_csv_summary() {
        let engine = ExportEngine::new(animals(), animal_spec());
        let mut buffer = Vec::new();
        let summary = engine.write_csv(&mut buffer, CsvConfig::default()).unwrap();

        assert_eq!(summary, ExportSummary { rows: 2, lines: 3 });
        assert_eq!(String::from_utf8(buffer).unwrap(), "id,label\n1,\n2,Rex\n");
    }

    #[test]
    fn test_options_metadata_passes_through() {
        let options = ExportOptions::from_yaml(
            r"
relation: animals
headerLines: false
footerLines: false
format: csv
filename: animals.csv
columns:
  - id
",
        )
        .unwrap();
        let engine = ExportEngine::from_options(
            animals(),
            &options,
            &AccessorRegistry::new(),
            &MappingCatalog::new(),
        )
        .unwrap();

        assert!(!engine.header_lines());
        assert!(!engine.footer_lines());
        assert_eq!(engine.format(), Some("csv"));
        assert_eq!(engine.filename(), Some("animals.csv"));
        assert_eq!(engine.header_line(), vec!["id"]);
        assert_eq!(engine.to_csv().unwrap(), "1\n2\n");
    }
}
