//! Records and record sources

use crate::kind::{RecordKind, TypeName};
use crate::value::Value;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Suffix naming the display-oriented variant of a coded field
pub const LOOKUP_SUFFIX: &str = "_lookup_value";

/// A source record as seen by the export engine.
///
/// Field access is tolerant: asking for a field the record does not have is
/// not an error. `None` means the record does not respond to the field at all,
/// `Some(Value::Null)` means it responds with nothing.
pub trait Record {
    /// Kinds this record type can report
    type Kind: RecordKind;

    /// Runtime kind of this record
    fn kind(&self) -> Self::Kind;

    /// Read a field by name
    fn try_get(&self, field: &str) -> Option<Value>;

    /// Read the lookup variant of a field (`<field>_lookup_value`)
    fn try_get_lookup(&self, field: &str) -> Option<Value> {
        self.try_get(&format!("{field}{LOOKUP_SUFFIX}"))
    }
}

/// Boxed single-pass cursor over the records of one relation
pub type RecordIter<'a, R> = Box<dyn Iterator<Item = crate::Result<R>> + 'a>;

/// Something that can iterate all records of a named relation
pub trait RecordSource {
    /// Record type produced by this source
    type Record: Record;

    /// Iterate every record of `relation`, one at a time.
    ///
    /// # Errors
    ///
    /// Returns an error when the relation is unknown to the source.
    fn find_each(&self, relation: &str) -> crate::Result<RecordIter<'_, Self::Record>>;
}

/// Map-backed record whose kind is only known at runtime
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldRecord {
    kind: TypeName,
    fields: BTreeMap<String, Value>,
}

impl FieldRecord {
    /// Create an empty record of the given (possibly namespaced) type
    pub fn new(type_name: impl AsRef<str>) -> Self {
        Self {
            kind: TypeName::new(type_name),
            fields: BTreeMap::new(),
        }
    }

    /// Add a field, builder style
    #[must_use]
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set_field(name, value);
        self
    }

    /// Set a field
    pub fn set_field(&mut self, name: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    /// All fields in name order
    pub fn fields(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(name, value)| (name.as_str(), value))
    }
}

impl Record for FieldRecord {
    type Kind = TypeName;

    fn kind(&self) -> TypeName {
        self.kind.clone()
    }

    fn try_get(&self, field: &str) -> Option<Value> {
        self.fields.get(field).cloned()
    }
}
