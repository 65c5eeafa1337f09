//! CSV configuration options

/// Configuration for CSV output
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvConfig {
    /// Field delimiter character (default: comma)
    pub delimiter: char,
    /// Quote character for fields containing special characters (default: double quote)
    pub quote_char: char,
    /// Whether the header line is written (default: true)
    pub has_header: bool,
    /// How absent cells are written (default: empty string)
    pub null_representation: NullRepresentation,
    /// Record terminator (default: LF)
    pub record_terminator: RecordTerminator,
}

/// How to represent absent cells in CSV output
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NullRepresentation {
    /// Empty string (default)
    EmptyString,
    /// The string "NULL"
    NullString,
    /// The string "\\N"
    BackslashN,
    /// Custom string representation
    Custom(String),
}

impl NullRepresentation {
    /// Text written for an absent cell
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            NullRepresentation::EmptyString => "",
            NullRepresentation::NullString => "NULL",
            NullRepresentation::BackslashN => "\\N",
            NullRepresentation::Custom(s) => s,
        }
    }
}

/// Record terminator for writing CSV
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordTerminator {
    /// CRLF (Windows-style, RFC 4180)
    CRLF,
    /// LF (Unix-style)
    LF,
}

impl RecordTerminator {
    pub(crate) fn to_csv(self) -> csv::Terminator {
        match self {
            RecordTerminator::CRLF => csv::Terminator::CRLF,
            RecordTerminator::LF => csv::Terminator::Any(b'\n'),
        }
    }
}

impl Default for CsvConfig {
    fn default() -> Self {
        Self {
            delimiter: ',',
            quote_char: '"',
            has_header: true,
            null_representation: NullRepresentation::EmptyString,
            record_terminator: RecordTerminator::LF,
        }
    }
}

impl CsvConfig {
    /// Create a new configuration with defaults
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the delimiter character
    #[must_use]
    pub fn delimiter(mut self, delimiter: char) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Set the quote character
    #[must_use]
    pub fn quote_char(mut self, quote_char: char) -> Self {
        self.quote_char = quote_char;
        self
    }

    /// Set whether the header line is written
    #[must_use]
    pub fn has_header(mut self, has_header: bool) -> Self {
        self.has_header = has_header;
        self
    }

    /// Set how absent cells are written
    #[must_use]
    pub fn null_representation(mut self, null_repr: NullRepresentation) -> Self {
        self.null_representation = null_repr;
        self
    }

    /// Set the record terminator
    #[must_use]
    pub fn record_terminator(mut self, terminator: RecordTerminator) -> Self {
        self.record_terminator = terminator;
        self
    }

    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the delimiter or quote character is not a single
    /// ASCII byte, or if they are the same character.
    pub fn validate(&self) -> Result<(), String> {
        if !self.delimiter.is_ascii() {
            return Err(format!("Delimiter must be ASCII, got '{}'", self.delimiter));
        }
        if !self.quote_char.is_ascii() {
            return Err(format!(
                "Quote character must be ASCII, got '{}'",
                self.quote_char
            ));
        }
        if self.delimiter == self.quote_char {
            return Err("Delimiter and quote character cannot be the same".to_string());
        }
        Ok(())
    }

    pub(crate) fn builder(&self) -> csv::WriterBuilder {
        let mut builder = csv::WriterBuilder::new();
        builder
            .delimiter(self.delimiter as u8)
            .quote(self.quote_char as u8)
            .terminator(self.record_terminator.to_csv());
        builder
    }
}
