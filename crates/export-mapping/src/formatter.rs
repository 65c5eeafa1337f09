//! Date/time formatting
//!
//! Only temporal values are touched. The engine-wide pattern wins over the
//! column's own pattern; with neither, the value is left as is and rendered by
//! the serializer's default.

use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, FixedOffset};
use export_ir::{Record, Value};
use std::fmt::{self, Write as _};
use tracing::warn;

use crate::spec::ColumnDefinition;
use crate::{Error, Result};

/// A validated strftime pattern
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatePattern(String);

impl DatePattern {
    /// Validate a strftime pattern such as `%d/%m/%Y`
    ///
    /// # Errors
    ///
    /// Returns a configuration error for an empty pattern, one containing an
    /// unknown specifier, or one that parses but cannot be rendered (`%#z`).
    pub fn parse(pattern: &str) -> Result<Self> {
        if pattern.is_empty() {
            return Err(Error::configuration("Date pattern must not be empty"));
        }
        let invalid = || Error::configuration(format!("Invalid date pattern: {pattern}"));
        if StrftimeItems::new(pattern).any(|item| matches!(item, Item::Error)) {
            return Err(invalid());
        }

        let candidate = Self(pattern.to_string());
        let reference = DateTime::<FixedOffset>::default();
        candidate.render(&reference).map_err(|_| invalid())?;
        Ok(candidate)
    }

    /// The pattern text
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Render a timestamp with this pattern
    ///
    /// # Errors
    ///
    /// Returns a configuration error if chrono cannot render the pattern.
    pub fn apply(&self, timestamp: &DateTime<FixedOffset>) -> Result<String> {
        self.render(timestamp)
            .map_err(|_| Error::configuration(format!("Invalid date pattern: {}", self.0)))
    }

    fn render(&self, timestamp: &DateTime<FixedOffset>) -> std::result::Result<String, fmt::Error> {
        let mut out = String::new();
        write!(out, "{}", timestamp.format_with_items(StrftimeItems::new(&self.0)))?;
        Ok(out)
    }
}

impl fmt::Display for DatePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Normalizes extracted values before they are stored in a row
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValueFormatter {
    override_pattern: Option<DatePattern>,
}

impl ValueFormatter {
    /// Formatter that only applies column-level patterns
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Formatter whose pattern overrides every column-level pattern
    #[must_use]
    pub fn with_override(pattern: DatePattern) -> Self {
        Self {
            override_pattern: Some(pattern),
        }
    }

    /// The engine-wide pattern, if any
    #[must_use]
    pub fn override_pattern(&self) -> Option<&DatePattern> {
        self.override_pattern.as_ref()
    }

    /// Format `value` for `column`. Never fails: a value the pattern cannot
    /// render is left as is.
    pub fn format<R: Record>(&self, value: Value, column: &ColumnDefinition<R>) -> Value {
        let Some(timestamp) = value.as_timestamp() else {
            return value;
        };
        let Some(pattern) = self.override_pattern.as_ref().or_else(|| column.format()) else {
            return value;
        };
        match pattern.apply(&timestamp) {
            Ok(text) => Value::String(text),
            Err(e) => {
                warn!(column = column.name(), error = %e, "Leaving date unformatted");
                value
            }
        }
    }
}
