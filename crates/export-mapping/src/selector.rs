//! Column selection
//!
//! Decides which declared columns apply to a record. A column restricted to
//! record kinds applies only to those kinds. Otherwise it applies when one of
//! its accessors can produce something: computed accessors always can, named
//! fields must hold a non-null value.

use export_ir::Record;

use crate::spec::{ColumnDefinition, FieldRef, MappingSpec};

/// Selects the columns of a spec that apply to a record
#[derive(Debug)]
pub struct ColumnSelector<'a, R: Record> {
    spec: &'a MappingSpec<R>,
}

impl<'a, R: Record> ColumnSelector<'a, R> {
    /// Selector over `spec`
    pub fn new(spec: &'a MappingSpec<R>) -> Self {
        Self { spec }
    }

    /// Columns applicable to `record`, in declaration order
    pub fn select(&self, record: &R) -> Vec<&'a ColumnDefinition<R>> {
        let kind = record.kind();
        self.spec
            .columns()
            .iter()
            .filter(|column| applies_to_kind(column, record, &kind))
            .collect()
    }
}

/// Whether `column` applies to `record`
pub fn applies_to<R: Record>(column: &ColumnDefinition<R>, record: &R) -> bool {
    applies_to_kind(column, record, &record.kind())
}

fn applies_to_kind<R: Record>(column: &ColumnDefinition<R>, record: &R, kind: &R::Kind) -> bool {
    if let Some(kinds) = column.type_affinity() {
        return kinds.contains(kind);
    }
    column
        .accessors()
        .iter()
        .any(|accessor| match accessor.field_ref() {
            FieldRef::Computed { .. } => true,
            FieldRef::Name(field) => record.try_get(field).is_some_and(|value| !value.is_null()),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::Accessor;
    use export_ir::{FieldRecord, TypeName, Value};

    fn spec() -> MappingSpec<FieldRecord> {
        MappingSpec::new(
            "animals",
            vec![
                ColumnDefinition::named("id"),
                ColumnDefinition::new("label")
                    .for_kinds([TypeName::new("Dog")])
                    .with_accessor(Accessor::field("name")),
                ColumnDefinition::new("doubled")
                    .with_accessor(Accessor::computed(|_: &FieldRecord| Ok(Value::Integer(0)))),
                ColumnDefinition::new("either")
                    .with_accessor(Accessor::field("nickname"))
                    .with_accessor(Accessor::field("name")),
            ],
        )
        .unwrap()
    }

    fn names<'a>(columns: &[&'a ColumnDefinition<FieldRecord>]) -> Vec<&'a str> {
        columns.iter().map(|column| column.name()).collect()
    }

    #[test]
    fn test_affinity_matches_kind() {
        let spec = spec();
        let selector = ColumnSelector::new(&spec);

        let dog = FieldRecord::new("Zoo::Dog").with_field("id", 2).with_field("name", "Rex");
        assert_eq!(names(&selector.select(&dog)), vec!["id", "label", "doubled", "either"]);

        let cat = FieldRecord::new("Cat").with_field("id", 1).with_field("name", "Tom");
        assert_eq!(names(&selector.select(&cat)), vec!["id", "doubled", "either"]);
    }

    #[test]
    fn test_affinity_ignores_field_presence() {
        let spec = spec();
        let dog_without_name = FieldRecord::new("Dog");
        assert!(applies_to(spec.find_column("label").unwrap(), &dog_without_name));
    }

    #[test]
    fn test_null_and_missing_fields_not_selected() {
        let spec = spec();
        let selector = ColumnSelector::new(&spec);
        let record = FieldRecord::new("Cat").with_field("id", Value::Null);
        assert_eq!(names(&selector.select(&record)), vec!["doubled"]);
    }

    #[test]
    fn test_any_accessor_can_make_column_applicable() {
        let spec = spec();
        let record = FieldRecord::new("Cat").with_field("name", "Tom");
        assert!(applies_to(spec.find_column("either").unwrap(), &record));
    }

    #[test]
    fn test_falsy_values_still_selected() {
        let spec = spec();
        let record = FieldRecord::new("Cat")
            .with_field("id", 0)
            .with_field("name", false);
        assert_eq!(
            names(&ColumnSelector::new(&spec).select(&record)),
            vec!["id", "doubled", "either"]
        );
    }
}
