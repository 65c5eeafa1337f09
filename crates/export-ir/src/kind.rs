//! Record kinds
//!
//! A column may be restricted to records of particular kinds. Kinds are
//! resolved from their short type names once, when a mapping is built, and
//! compared by value for every record afterwards.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::Hash;

/// The set of kinds a record type can report
pub trait RecordKind: Clone + Eq + Hash + fmt::Debug {
    /// Resolve an unqualified type name, e.g. `Dog`
    fn from_type_name(name: &str) -> Option<Self>;

    /// Unqualified type name of this kind
    fn type_name(&self) -> &str;

    /// Resolve a possibly namespaced type name, e.g. `Zoo::Dog`
    fn resolve(name: &str) -> Option<Self> {
        Self::from_type_name(demodulize(name.trim()))
    }
}

/// Strip any namespace from a type name (`Zoo::Animals::Dog` -> `Dog`)
#[must_use]
pub fn demodulize(name: &str) -> &str {
    name.rsplit("::").next().unwrap_or(name)
}

/// Open kind identified only by its short type name.
///
/// Used by map-backed records whose type is only known at runtime.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TypeName(String);

impl TypeName {
    /// Create a kind from a possibly namespaced type name
    pub fn new(name: impl AsRef<str>) -> Self {
        Self(demodulize(name.as_ref().trim()).to_string())
    }
}

impl RecordKind for TypeName {
    fn from_type_name(name: &str) -> Option<Self> {
        if name.is_empty() {
            None
        } else {
            Some(Self::new(name))
        }
    }

    fn type_name(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
