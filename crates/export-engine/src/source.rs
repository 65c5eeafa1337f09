//! Record sources
//!
//! Two ready-made sources: an in-memory one for records already loaded by the
//! caller, and a JSON document of relations for command-line exports.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use export_ir::{FieldRecord, Record, RecordIter, RecordSource, Value};
use serde_json::Map;
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, info};

use crate::{Error, Result};

/// Key holding a JSON record's type name
pub const DEFAULT_TYPE_KEY: &str = "type";

/// Relations held in memory.
///
/// Every call to `find_each` iterates a fresh clone, so the same source can
/// back several exports.
#[derive(Debug, Clone)]
pub struct MemorySource<R> {
    relations: HashMap<String, Vec<R>>,
}

impl<R> MemorySource<R> {
    /// Create an empty source
    #[must_use]
    pub fn new() -> Self {
        Self {
            relations: HashMap::new(),
        }
    }

    /// Add a relation, builder style
    #[must_use]
    pub fn with_relation(mut self, name: impl Into<String>, records: Vec<R>) -> Self {
        self.insert(name, records);
        self
    }

    /// Add or replace a relation
    pub fn insert(&mut self, name: impl Into<String>, records: Vec<R>) -> &mut Self {
        self.relations.insert(name.into(), records);
        self
    }
}

impl<R> Default for MemorySource<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Record + Clone> RecordSource for MemorySource<R> {
    type Record = R;

    fn find_each(&self, relation: &str) -> export_ir::Result<RecordIter<'_, R>> {
        let records = self
            .relations
            .get(relation)
            .ok_or_else(|| export_ir::Error::unknown_relation(relation))?;
        Ok(Box::new(records.iter().cloned().map(Ok)))
    }
}

/// Relations read from a JSON document.
///
/// The document is an object mapping relation names to arrays of record
/// objects. Each record names its type under the type key (`type` by default);
/// every other key becomes a field.
#[derive(Debug, Clone)]
pub struct JsonRecordSource {
    relations: HashMap<String, Vec<serde_json::Value>>,
    type_key: String,
}

impl JsonRecordSource {
    /// Parse a JSON document of relations
    ///
    /// # Errors
    ///
    /// Returns an error when the text is not JSON or not an object of arrays.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let document: serde_json::Value = serde_json::from_str(json)
            .map_err(|e| export_ir::Error::source("<document>", e.to_string()))?;
        let serde_json::Value::Object(object) = document else {
            return Err(export_ir::Error::source(
                "<document>",
                "expected an object of relation name to records",
            )
            .into());
        };

        let mut relations = HashMap::with_capacity(object.len());
        for (name, records) in object {
            let serde_json::Value::Array(records) = records else {
                return Err(export_ir::Error::source(name, "expected an array of records").into());
            };
            debug!(relation = %name, records = records.len(), "Loaded JSON relation");
            relations.insert(name, records);
        }

        Ok(Self {
            relations,
            type_key: DEFAULT_TYPE_KEY.to_string(),
        })
    }

    /// Load a JSON document of relations from a file
    ///
    /// # Errors
    ///
    /// Returns an error when the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::io("read", path.display().to_string(), e.to_string()))?;
        let source = Self::from_json_str(&content)?;
        info!(path = %path.display(), relations = source.relations.len(), "Loaded record source");
        Ok(source)
    }

    /// Read record types from `key` instead of `type`
    #[must_use]
    pub fn with_type_key(mut self, key: impl Into<String>) -> Self {
        self.type_key = key.into();
        self
    }

    /// Relation names, sorted
    #[must_use]
    pub fn relation_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.relations.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    fn to_record(&self, relation: &str, position: usize, value: &serde_json::Value) -> export_ir::Result<FieldRecord> {
        let serde_json::Value::Object(object) = value else {
            return Err(export_ir::Error::source(
                relation,
                format!("record {position} is not an object"),
            ));
        };
        let Some(type_name) = object.get(&self.type_key).and_then(serde_json::Value::as_str) else {
            return Err(export_ir::Error::source(
                relation,
                format!("record {position} has no string '{}' key", self.type_key),
            ));
        };
        Ok(fields_to_record(type_name, object, &self.type_key))
    }
}

impl RecordSource for JsonRecordSource {
    type Record = FieldRecord;

    fn find_each(&self, relation: &str) -> export_ir::Result<RecordIter<'_, FieldRecord>> {
        let records = self
            .relations
            .get(relation)
            .ok_or_else(|| export_ir::Error::unknown_relation(relation))?;
        let relation = relation.to_string();
        Ok(Box::new(
            records
                .iter()
                .enumerate()
                .map(move |(index, value)| self.to_record(&relation, index + 1, value)),
        ))
    }
}

fn fields_to_record(
    type_name: &str,
    object: &Map<String, serde_json::Value>,
    type_key: &str,
) -> FieldRecord {
    object
        .iter()
        .filter(|(key, _)| key.as_str() != type_key)
        .fold(FieldRecord::new(type_name), |record, (key, value)| {
            record.with_field(key.clone(), json_to_value(value))
        })
}

/// Convert a JSON value to a cell value.
///
/// Strings holding an ISO date (`2024-01-15`), an ISO date-time without
/// offset, or an RFC 3339 timestamp become temporal values. Arrays and objects
/// are kept as their JSON text.
#[must_use]
pub fn json_to_value(value: &serde_json::Value) -> Value {
    match value {
        serde_json::Value::Null => Value::Null,
        serde_json::Value::Bool(b) => Value::Boolean(*b),
        serde_json::Value::Number(n) => n
            .as_i64()
            .map(Value::Integer)
            .or_else(|| n.as_f64().map(Value::Decimal))
            .unwrap_or_else(|| Value::String(n.to_string())),
        serde_json::Value::String(s) => parse_temporal(s).unwrap_or_else(|| Value::String(s.clone())),
        other => Value::String(other.to_string()),
    }
}

fn parse_temporal(text: &str) -> Option<Value> {
    if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        return Some(Value::Date(date));
    }
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(text) {
        return Some(Value::Timestamp(timestamp));
    }
    ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
        .map(Value::DateTime)
}
