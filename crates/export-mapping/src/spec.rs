//! Mapping specification
//!
//! The compiled, immutable form of a column mapping. Column positions follow
//! declaration order, so reordering columns changes the output layout.

use export_ir::{Record, RecordKind, Value};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

use crate::accessors::{AccessorRegistry, ComputedFn};
use crate::catalog::MappingCatalog;
use crate::config::{AccessorConfig, ColumnConfig, ColumnEntry, ExportOptions};
use crate::formatter::DatePattern;
use crate::{Error, Result};

/// Where an accessor reads its value from
pub enum FieldRef<R> {
    /// A field read from the record by name
    Name(String),

    /// A function of the record
    Computed { label: String, func: ComputedFn<R> },
}

impl<R> Clone for FieldRef<R> {
    fn clone(&self) -> Self {
        match self {
            FieldRef::Name(name) => FieldRef::Name(name.clone()),
            FieldRef::Computed { label, func } => FieldRef::Computed {
                label: label.clone(),
                func: Arc::clone(func),
            },
        }
    }
}

impl<R> fmt::Debug for FieldRef<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldRef::Name(name) => f.debug_tuple("Name").field(name).finish(),
            FieldRef::Computed { label, .. } => f
                .debug_struct("Computed")
                .field("label", label)
                .finish_non_exhaustive(),
        }
    }
}

/// How to pull one value from a record
pub struct Accessor<R> {
    field: FieldRef<R>,
    format: Option<DatePattern>,
}

impl<R> Accessor<R> {
    /// Read the named field
    pub fn field(name: impl Into<String>) -> Self {
        Self {
            field: FieldRef::Name(name.into()),
            format: None,
        }
    }

    /// Compute the value from the record
    pub fn computed(func: impl Fn(&R) -> Result<Value> + Send + Sync + 'static) -> Self {
        Self::from_registry("<computed>", Arc::new(func))
    }

    /// Use a computed accessor taken from a registry
    pub fn from_registry(label: impl Into<String>, func: ComputedFn<R>) -> Self {
        Self {
            field: FieldRef::Computed {
                label: label.into(),
                func,
            },
            format: None,
        }
    }

    /// Set the date pattern for temporal values
    #[must_use]
    pub fn with_format(mut self, pattern: DatePattern) -> Self {
        self.format = Some(pattern);
        self
    }

    /// Source of the value
    pub fn field_ref(&self) -> &FieldRef<R> {
        &self.field
    }

    /// Field name, for name-based accessors
    pub fn field_name(&self) -> Option<&str> {
        match &self.field {
            FieldRef::Name(name) => Some(name),
            FieldRef::Computed { .. } => None,
        }
    }

    /// Whether the value is computed
    pub fn is_computed(&self) -> bool {
        matches!(self.field, FieldRef::Computed { .. })
    }

    /// Date pattern, if any
    pub fn format(&self) -> Option<&DatePattern> {
        self.format.as_ref()
    }
}

impl<R> Clone for Accessor<R> {
    fn clone(&self) -> Self {
        Self {
            field: self.field.clone(),
            format: self.format.clone(),
        }
    }
}

impl<R> fmt::Debug for Accessor<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Accessor")
            .field("field", &self.field)
            .field("format", &self.format)
            .finish()
    }
}

/// One exported column
pub struct ColumnDefinition<R: Record> {
    name: String,
    type_affinity: Option<Vec<R::Kind>>,
    accessors: Vec<Accessor<R>>,
}

impl<R: Record> ColumnDefinition<R> {
    /// Column without accessors yet
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_affinity: None,
            accessors: Vec::new(),
        }
    }

    /// Column reading the field of the same name
    pub fn named(name: impl Into<String>) -> Self {
        let name = name.into();
        let accessor = Accessor::field(name.clone());
        Self::new(name).with_accessor(accessor)
    }

    /// Append an accessor
    #[must_use]
    pub fn with_accessor(mut self, accessor: Accessor<R>) -> Self {
        self.accessors.push(accessor);
        self
    }

    /// Restrict the column to records of the given kinds
    #[must_use]
    pub fn for_kinds(mut self, kinds: impl IntoIterator<Item = R::Kind>) -> Self {
        self.type_affinity = Some(kinds.into_iter().collect());
        self
    }

    /// Column name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Kinds the column is restricted to, if restricted
    pub fn type_affinity(&self) -> Option<&[R::Kind]> {
        self.type_affinity.as_deref()
    }

    /// All accessors in declaration order
    pub fn accessors(&self) -> &[Accessor<R>] {
        &self.accessors
    }

    /// The authoritative accessor
    pub fn primary_accessor(&self) -> Option<&Accessor<R>> {
        self.accessors.first()
    }

    /// Date pattern of the authoritative accessor
    pub fn format(&self) -> Option<&DatePattern> {
        self.primary_accessor().and_then(Accessor::format)
    }
}

impl<R: Record> Clone for ColumnDefinition<R> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            type_affinity: self.type_affinity.clone(),
            accessors: self.accessors.clone(),
        }
    }
}

impl<R: Record> fmt::Debug for ColumnDefinition<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ColumnDefinition")
            .field("name", &self.name)
            .field("type_affinity", &self.type_affinity)
            .field("accessors", &self.accessors)
            .finish()
    }
}

/// Ordered, validated list of columns for one relation
pub struct MappingSpec<R: Record> {
    relation: String,
    columns: Vec<ColumnDefinition<R>>,
    positions: HashMap<String, usize>,
}

impl<R: Record> MappingSpec<R> {
    /// Build a spec from column definitions
    ///
    /// # Errors
    ///
    /// Returns a configuration error for an empty or duplicate column name, a
    /// column without accessors, an empty field name, or an empty affinity.
    pub fn new(relation: impl Into<String>, columns: Vec<ColumnDefinition<R>>) -> Result<Self> {
        let relation = relation.into();
        if relation.trim().is_empty() {
            return Err(Error::configuration("Relation name must not be empty"));
        }

        let mut positions = HashMap::with_capacity(columns.len());
        for (index, column) in columns.iter().enumerate() {
            validate_column(column)?;
            if positions.insert(column.name.clone(), index).is_some() {
                return Err(Error::configuration(format!(
                    "Duplicate column '{}'",
                    column.name
                )));
            }
        }

        debug!(relation = %relation, columns = columns.len(), "Built mapping spec");
        Ok(Self {
            relation,
            columns,
            positions,
        })
    }

    /// Compile configuration entries, resolving affinities and computed accessors
    ///
    /// # Errors
    ///
    /// Returns a configuration error for any malformed entry.
    pub fn compile(
        relation: impl Into<String>,
        entries: &[ColumnEntry],
        registry: &AccessorRegistry<R>,
    ) -> Result<Self> {
        let columns = entries
            .iter()
            .map(|entry| compile_entry(entry, registry))
            .collect::<Result<Vec<_>>>()?;
        Self::new(relation, columns)
    }

    /// Build the spec described by export options
    ///
    /// # Errors
    ///
    /// Returns a configuration error for invalid options, an unknown mapping
    /// bundle, or malformed columns.
    pub fn from_options(
        options: &ExportOptions,
        registry: &AccessorRegistry<R>,
        catalog: &MappingCatalog,
    ) -> Result<Self> {
        options.validate()?;
        match (&options.relation, &options.mapping, &options.columns) {
            (Some(relation), None, Some(columns)) => Self::compile(relation, columns, registry),
            (None, Some(mapping), None) => {
                let bundle = catalog.get(mapping).ok_or_else(|| {
                    Error::configuration(format!("Unknown mapping '{mapping}'"))
                })?;
                Self::compile(&bundle.relation, &bundle.columns, registry)
            }
            _ => Err(Error::configuration("Must supply mapping OR relation")),
        }
    }

    /// Relation the spec exports
    pub fn relation(&self) -> &str {
        &self.relation
    }

    /// Columns in output order
    pub fn columns(&self) -> &[ColumnDefinition<R>] {
        &self.columns
    }

    /// Column names in output order
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(ColumnDefinition::name).collect()
    }

    /// Find a column by name
    pub fn find_column(&self, name: &str) -> Option<&ColumnDefinition<R>> {
        self.position(name).map(|index| &self.columns[index])
    }

    /// Output position of a column
    pub fn index_of(&self, column: &ColumnDefinition<R>) -> Option<usize> {
        self.position(&column.name)
    }

    /// Output position of a column name
    pub fn position(&self, name: &str) -> Option<usize> {
        self.positions.get(name).copied()
    }

    /// Number of columns
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Whether the spec has no columns
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

impl<R: Record> fmt::Debug for MappingSpec<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MappingSpec")
            .field("relation", &self.relation)
            .field("columns", &self.columns)
            .finish()
    }
}

fn validate_column<R: Record>(column: &ColumnDefinition<R>) -> Result<()> {
    if column.name.trim().is_empty() {
        return Err(Error::configuration("Column name must not be empty"));
    }
    if column.accessors.is_empty() {
        return Err(Error::configuration(format!(
            "Column '{}' has no accessors",
            column.name
        )));
    }
    if column
        .accessors
        .iter()
        .any(|accessor| accessor.field_name().is_some_and(str::is_empty))
    {
        return Err(Error::configuration(format!(
            "Column '{}' has an empty field name",
            column.name
        )));
    }
    if column.type_affinity.as_ref().is_some_and(Vec::is_empty) {
        return Err(Error::configuration(format!(
            "Column '{}' must name at least one record type",
            column.name
        )));
    }
    Ok(())
}

fn compile_entry<R: Record>(
    entry: &ColumnEntry,
    registry: &AccessorRegistry<R>,
) -> Result<ColumnDefinition<R>> {
    match entry {
        ColumnEntry::Name(name) => Ok(ColumnDefinition::named(name.clone())),
        ColumnEntry::Definition(config) => compile_column(config, registry),
    }
}

fn compile_column<R: Record>(
    config: &ColumnConfig,
    registry: &AccessorRegistry<R>,
) -> Result<ColumnDefinition<R>> {
    let mut column = ColumnDefinition::new(config.name.clone());

    if let Some(names) = &config.type_affinity {
        let mut seen = HashSet::new();
        let mut kinds = Vec::new();
        for name in names.to_vec() {
            let kind = R::Kind::resolve(&name).ok_or_else(|| {
                Error::configuration(format!(
                    "Column '{}' names unknown record type '{name}'",
                    config.name
                ))
            })?;
            if seen.insert(kind.clone()) {
                kinds.push(kind);
            }
        }
        column = column.for_kinds(kinds);
    }

    for accessor in &config.accessors {
        column = column.with_accessor(compile_accessor(&config.name, accessor, registry)?);
    }
    Ok(column)
}

fn compile_accessor<R: Record>(
    column: &str,
    config: &AccessorConfig,
    registry: &AccessorRegistry<R>,
) -> Result<Accessor<R>> {
    let accessor = match (&config.field, &config.computed) {
        (Some(field), None) => Accessor::field(field.clone()),
        (None, Some(name)) => {
            let func = registry.get(name).ok_or_else(|| {
                Error::configuration(format!(
                    "Column '{column}' uses unknown computed accessor '{name}'"
                ))
            })?;
            Accessor::from_registry(name.clone(), func)
        }
        _ => {
            return Err(Error::configuration(format!(
                "Column '{column}' accessor needs exactly one of 'field' or 'computed'"
            )));
        }
    };

    match &config.format {
        Some(pattern) => Ok(accessor.with_format(DatePattern::parse(pattern)?)),
        None => Ok(accessor),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ColumnConfig, TypeNames};
    use export_ir::FieldRecord;

    fn definition(name: &str, field: &str) -> ColumnEntry {
        ColumnEntry::Definition(ColumnConfig {
            name: name.to_string(),
            type_affinity: None,
            accessors: vec![AccessorConfig {
                field: Some(field.to_string()),
                ..AccessorConfig::default()
            }],
        })
    }

    fn compile(entries: &[ColumnEntry]) -> Result<MappingSpec<FieldRecord>> {
        MappingSpec::compile("patients", entries, &AccessorRegistry::new())
    }

    #[test]
    fn test_bare_names_expand_to_field_accessors() {
        let spec = compile(&["id".into(), "surname".into()]).unwrap();
        assert_eq!(spec.column_names(), vec!["id", "surname"]);

        let column = spec.find_column("surname").unwrap();
        assert_eq!(column.accessors().len(), 1);
        assert_eq!(column.accessors()[0].field_name(), Some("surname"));
        assert!(column.type_affinity().is_none());
    }

    #[test]
    fn test_positions_follow_declaration_order() {
        let spec = compile(&["c".into(), definition("a", "a_field"), "b".into()]).unwrap();
        assert_eq!(spec.len(), 3);
        assert_eq!(spec.position("c"), Some(0));
        assert_eq!(spec.position("a"), Some(1));
        assert_eq!(spec.index_of(spec.find_column("b").unwrap()), Some(2));
        assert!(spec.find_column("missing").is_none());
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let err = compile(&["id".into(), definition("id", "other")]).unwrap_err();
        assert_eq!(err, Error::Configuration("Duplicate column 'id'".to_string()));
    }

    #[test]
    fn test_column_without_accessors_rejected() {
        let entry = ColumnEntry::Definition(ColumnConfig {
            name: "empty".to_string(),
            type_affinity: None,
            accessors: Vec::new(),
        });
        let err = compile(&[entry]).unwrap_err();
        assert!(err.to_string().contains("has no accessors"));
    }

    #[test]
    fn test_accessor_needs_exactly_one_source() {
        let entry = ColumnEntry::Definition(ColumnConfig {
            name: "both".to_string(),
            type_affinity: None,
            accessors: vec![AccessorConfig {
                field: Some("id".to_string()),
                computed: Some("double_id".to_string()),
                format: None,
            }],
        });
        let err = compile(&[entry]).unwrap_err();
        assert!(err.to_string().contains("exactly one of"));
    }

    #[test]
    fn test_unknown_computed_accessor_rejected() {
        let entry = ColumnEntry::Definition(ColumnConfig {
            name: "doubled".to_string(),
            type_affinity: None,
            accessors: vec![AccessorConfig {
                computed: Some("double_id".to_string()),
                ..AccessorConfig::default()
            }],
        });
        let err = compile(&[entry]).unwrap_err();
        assert!(err.to_string().contains("unknown computed accessor 'double_id'"));
    }

    #[test]
    fn test_registered_computed_accessor_resolves() {
        let mut registry = AccessorRegistry::<FieldRecord>::new();
        registry.register("double_id", |_: &FieldRecord| Ok(Value::Integer(0)));
        let entry = ColumnEntry::Definition(ColumnConfig {
            name: "doubled".to_string(),
            type_affinity: None,
            accessors: vec![AccessorConfig {
                computed: Some("double_id".to_string()),
                ..AccessorConfig::default()
            }],
        });

        let spec = MappingSpec::compile("patients", &[entry], &registry).unwrap();
        let accessor = &spec.columns()[0].accessors()[0];
        assert!(accessor.is_computed());
        assert!(format!("{accessor:?}").contains("double_id"));
    }

    #[test]
    fn test_invalid_format_rejected_at_compile_time() {
        let entry = ColumnEntry::Definition(ColumnConfig {
            name: "dob".to_string(),
            type_affinity: None,
            accessors: vec![AccessorConfig {
                field: Some("date_of_birth".to_string()),
                format: Some("%d/%Q".to_string()),
                ..AccessorConfig::default()
            }],
        });
        let err = compile(&[entry]).unwrap_err();
        assert_eq!(err, Error::Configuration("Invalid date pattern: %d/%Q".to_string()));
    }

    #[test]
    fn test_affinity_resolves_namespaced_names() {
        let entry = ColumnEntry::Definition(ColumnConfig {
            name: "label".to_string(),
            type_affinity: Some(TypeNames::Many(vec![
                "Zoo::Dog".to_string(),
                "Dog".to_string(),
                "Cat".to_string(),
            ])),
            accessors: vec![AccessorConfig {
                field: Some("name".to_string()),
                ..AccessorConfig::default()
            }],
        });
        let spec = compile(&[entry]).unwrap();
        let kinds: Vec<&str> = spec.columns()[0]
            .type_affinity()
            .unwrap()
            .iter()
            .map(RecordKind::type_name)
            .collect();
        assert_eq!(kinds, vec!["Dog", "Cat"]);
    }

    #[test]
    fn test_empty_affinity_rejected() {
        let entry = ColumnEntry::Definition(ColumnConfig {
            name: "label".to_string(),
            type_affinity: Some(TypeNames::Many(Vec::new())),
            accessors: vec![AccessorConfig {
                field: Some("name".to_string()),
                ..AccessorConfig::default()
            }],
        });
        assert!(compile(&[entry]).is_err());
    }

    #[test]
    fn test_empty_relation_rejected() {
        let err = MappingSpec::<FieldRecord>::new(" ", vec![ColumnDefinition::named("id")])
            .unwrap_err();
        assert!(err.to_string().contains("Relation name"));
    }

    #[test]
    fn test_from_options_with_relation() {
        let options = ExportOptions::for_relation("patients", vec!["id".into()]);
        let spec = MappingSpec::<FieldRecord>::from_options(
            &options,
            &AccessorRegistry::new(),
            &MappingCatalog::new(),
        )
        .unwrap();
        assert_eq!(spec.relation(), "patients");
        assert_eq!(spec.column_names(), vec!["id"]);
    }

    #[test]
    fn test_from_options_unknown_mapping() {
        let options = ExportOptions::for_mapping("nope");
        let err = MappingSpec::<FieldRecord>::from_options(
            &options,
            &AccessorRegistry::new(),
            &MappingCatalog::new(),
        )
        .unwrap_err();
        assert_eq!(err, Error::Configuration("Unknown mapping 'nope'".to_string()));
    }
}
