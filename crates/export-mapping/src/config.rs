//! Export options
//!
//! The options object accepted by an export. The key set is closed: unknown
//! keys are rejected, and exactly one of `relation` or `mapping` must be
//! given.

use serde::de::{self, MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::path::Path;

use crate::{Error, Result};

/// Options for one export
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ExportOptions {
    /// Relation to iterate; requires `columns`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relation: Option<String>,

    /// Named mapping bundle providing relation and columns
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mapping: Option<String>,

    /// Emit the header line (default: true)
    #[serde(default, alias = "headerLines", skip_serializing_if = "Option::is_none")]
    pub header_lines: Option<bool>,

    /// Accepted for compatibility; no footer content is produced (default: true)
    #[serde(default, alias = "footerLines", skip_serializing_if = "Option::is_none")]
    pub footer_lines: Option<bool>,

    /// Output format label, passed through untouched
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,

    /// Output file name, passed through untouched
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,

    /// Column names and/or full column definitions
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub columns: Option<Vec<ColumnEntry>>,
}

/// One entry of a `columns` list.
///
/// A string is a bare name; a map is a full definition whose unknown keys are
/// reported by name.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(untagged)]
pub enum ColumnEntry {
    /// Bare name: a column reading the field of the same name
    Name(String),

    /// Full column definition
    Definition(ColumnConfig),
}

/// Full column definition as written in configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ColumnConfig {
    /// Column name, unique within the mapping
    #[serde(alias = "column")]
    pub name: String,

    /// Record types the column is restricted to
    #[serde(default, alias = "klass", skip_serializing_if = "Option::is_none")]
    pub type_affinity: Option<TypeNames>,

    /// How to read the value; the first accessor is authoritative
    #[serde(default, alias = "mappings")]
    pub accessors: Vec<AccessorConfig>,
}

/// One or more record type names
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum TypeNames {
    One(String),
    Many(Vec<String>),
}

impl TypeNames {
    /// The names as a slice-like list
    #[must_use]
    pub fn to_vec(&self) -> Vec<String> {
        match self {
            TypeNames::One(name) => vec![name.clone()],
            TypeNames::Many(names) => names.clone(),
        }
    }
}

/// Accessor as written in configuration: exactly one of `field` or `computed`
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct AccessorConfig {
    /// Field name read from the record
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,

    /// Name of a registered computed accessor
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub computed: Option<String>,

    /// strftime pattern for date/time values
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
}

impl ExportOptions {
    /// Options exporting `columns` of `relation`
    pub fn for_relation(relation: impl Into<String>, columns: Vec<ColumnEntry>) -> Self {
        Self {
            relation: Some(relation.into()),
            columns: Some(columns),
            ..Self::default()
        }
    }

    /// Options exporting a named mapping bundle
    pub fn for_mapping(mapping: impl Into<String>) -> Self {
        Self {
            mapping: Some(mapping.into()),
            ..Self::default()
        }
    }

    /// Parse options from YAML
    ///
    /// # Errors
    ///
    /// Returns a configuration error for malformed YAML, unknown keys, or an
    /// invalid `relation`/`mapping` combination.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let options: Self = serde_yaml::from_str(yaml)
            .map_err(|e| Error::configuration(format!("Failed to parse options: {e}")))?;
        options.validate()?;
        Ok(options)
    }

    /// Parse options from JSON
    ///
    /// # Errors
    ///
    /// Returns a configuration error for malformed JSON, unknown keys, or an
    /// invalid `relation`/`mapping` combination.
    pub fn from_json(json: &str) -> Result<Self> {
        let options: Self = serde_json::from_str(json)
            .map_err(|e| Error::configuration(format!("Failed to parse options: {e}")))?;
        options.validate()?;
        Ok(options)
    }

    /// Load options from a `.json`, `.yaml`, or `.yml` file
    ///
    /// # Errors
    ///
    /// Returns a configuration error when the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::configuration(format!("Failed to read {}: {e}", path.display()))
        })?;
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Self::from_json(&content),
            _ => Self::from_yaml(&content),
        }
    }

    /// Check the `relation`/`mapping` shape.
    ///
    /// # Errors
    ///
    /// Returns a configuration error unless exactly one of `relation` or
    /// `mapping` is set, `relation` comes with `columns`, and `mapping` comes
    /// without them.
    pub fn validate(&self) -> Result<()> {
        match (&self.relation, &self.mapping) {
            (Some(_), Some(_)) | (None, None) => {
                Err(Error::configuration("Must supply mapping OR relation"))
            }
            (Some(relation), None) if self.columns.is_none() => Err(Error::configuration(
                format!("Relation '{relation}' requires columns"),
            )),
            (None, Some(mapping)) if self.columns.is_some() => Err(Error::configuration(
                format!("Mapping '{mapping}' defines its own columns; remove 'columns'"),
            )),
            _ => Ok(()),
        }
    }

    /// Whether the header line is emitted
    #[must_use]
    pub fn header_lines(&self) -> bool {
        self.header_lines.unwrap_or(true)
    }

    /// Whether footer lines were requested
    #[must_use]
    pub fn footer_lines(&self) -> bool {
        self.footer_lines.unwrap_or(true)
    }
}

impl<'de> Deserialize<'de> for ColumnEntry {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct EntryVisitor;

        impl<'de> Visitor<'de> for EntryVisitor {
            type Value = ColumnEntry;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a column name or a column definition")
            }

            fn visit_str<E: de::Error>(self, name: &str) -> std::result::Result<ColumnEntry, E> {
                Ok(ColumnEntry::Name(name.to_string()))
            }

            fn visit_string<E: de::Error>(self, name: String) -> std::result::Result<ColumnEntry, E> {
                Ok(ColumnEntry::Name(name))
            }

            fn visit_map<A: MapAccess<'de>>(self, map: A) -> std::result::Result<ColumnEntry, A::Error> {
                ColumnConfig::deserialize(de::value::MapAccessDeserializer::new(map))
                    .map(ColumnEntry::Definition)
            }
        }

        deserializer.deserialize_any(EntryVisitor)
    }
}

impl From<&str> for ColumnEntry {
    fn from(name: &str) -> Self {
        ColumnEntry::Name(name.to_string())
    }
}

impl ColumnEntry {
    /// Name of the column this entry declares
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            ColumnEntry::Name(name) => name,
            ColumnEntry::Definition(config) => &config.name,
        }
    }
}
