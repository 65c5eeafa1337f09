//! Computed accessors
//!
//! Columns declared in configuration files refer to computed accessors by
//! name. The registry maps those names to functions of the record.

use export_ir::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// A function computing a column value from a record
pub type ComputedFn<R> = Arc<dyn Fn(&R) -> crate::Result<Value> + Send + Sync>;

/// Named computed accessors for one record type
pub struct AccessorRegistry<R> {
    accessors: HashMap<String, ComputedFn<R>>,
}

impl<R> AccessorRegistry<R> {
    /// Create an empty registry
    #[must_use]
    pub fn new() -> Self {
        Self {
            accessors: HashMap::new(),
        }
    }

    /// Register a computed accessor, replacing any previous one of that name
    pub fn register(
        &mut self,
        name: impl Into<String>,
        func: impl Fn(&R) -> crate::Result<Value> + Send + Sync + 'static,
    ) -> &mut Self {
        self.accessors.insert(name.into(), Arc::new(func));
        self
    }

    /// Get an accessor by name
    #[must_use]
    pub fn get(&self, name: &str) -> Option<ComputedFn<R>> {
        self.accessors.get(name).cloned()
    }

    /// Check if an accessor exists
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.accessors.contains_key(name)
    }

    /// Registered accessor names, sorted
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.accessors.keys().cloned().collect();
        names.sort();
        names
    }

    /// Number of registered accessors
    #[must_use]
    pub fn len(&self) -> usize {
        self.accessors.len()
    }

    /// Whether the registry is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.accessors.is_empty()
    }
}

impl<R> Default for AccessorRegistry<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R> Clone for AccessorRegistry<R> {
    fn clone(&self) -> Self {
        Self {
            accessors: self.accessors.clone(),
        }
    }
}

impl<R> fmt::Debug for AccessorRegistry<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessorRegistry")
            .field("accessors", &self.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use export_ir::{FieldRecord, Record};

    #[test]
    fn test_register_and_call() {
        let mut registry = AccessorRegistry::<FieldRecord>::new();
        registry.register("double_id", |record: &FieldRecord| {
            match record.try_get("id") {
                Some(Value::Integer(id)) => Ok(Value::Integer(id * 2)),
                _ => Err(crate::Error::computed("id is not an integer")),
            }
        });

        assert!(registry.contains("double_id"));
        assert!(!registry.contains("triple_id"));

        let func = registry.get("double_id").unwrap();
        let record = FieldRecord::new("Patient").with_field("id", 21);
        assert_eq!(func(&record).unwrap(), Value::Integer(42));

        let bad = FieldRecord::new("Patient").with_field("id", "x");
        assert!(func(&bad).is_err());
    }

    #[test]
    fn test_names_are_sorted() {
        let mut registry = AccessorRegistry::<FieldRecord>::new();
        registry
            .register("zeta", |_: &FieldRecord| Ok(Value::Null))
            .register("alpha", |_: &FieldRecord| Ok(Value::Null));

        assert_eq!(registry.names(), vec!["alpha", "zeta"]);
        assert_eq!(registry.len(), 2);
        assert!(format!("{registry:?}").contains("alpha"));
    }

    #[test]
    fn test_register_replaces_existing() {
        let mut registry = AccessorRegistry::<FieldRecord>::new();
        registry.register("answer", |_: &FieldRecord| Ok(Value::Integer(1)));
        registry.register("answer", |_: &FieldRecord| Ok(Value::Integer(2)));

        let record = FieldRecord::new("Patient");
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get("answer").unwrap()(&record).unwrap(), Value::Integer(2));
    }
}
