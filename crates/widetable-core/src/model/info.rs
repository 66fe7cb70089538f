use crate::{
    model::{column::ColumnType, keys::Keys},
    value::Value,
};
use std::collections::{BTreeMap, HashSet};

///
/// TableInfo
///
/// Immutable snapshot of an entity shape, taken once per table.
///
/// `fields` is lower-cased and sorted; `field_types` runs parallel to it and
/// is only consulted when a create statement is generated. A `None` type
/// means the example value carried no type information.
///

#[derive(Clone, Debug)]
pub struct TableInfo {
    keyspace: String,
    name: String,
    fields: Vec<String>,
    field_types: Vec<Option<ColumnType>>,
    field_names: HashSet<String>,
    keys: Keys,
}

impl TableInfo {
    #[must_use]
    pub fn new(
        keyspace: impl Into<String>,
        name: impl Into<String>,
        keys: Keys,
        columns: BTreeMap<String, Option<ColumnType>>,
    ) -> Self {
        // re-key by lower case so ordering stays lexicographic on the final names
        let columns: BTreeMap<String, Option<ColumnType>> = columns
            .into_iter()
            .map(|(field, ty)| (field.to_ascii_lowercase(), ty))
            .collect();

        let (fields, field_types): (Vec<_>, Vec<_>) = columns.into_iter().unzip();
        let field_names = fields.iter().cloned().collect();

        Self {
            keyspace: keyspace.into(),
            name: name.into(),
            fields,
            field_types,
            field_names,
            keys: keys.normalized(),
        }
    }

    #[must_use]
    pub fn keyspace(&self) -> &str {
        &self.keyspace
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    #[must_use]
    pub fn field_types(&self) -> &[Option<ColumnType>] {
        &self.field_types
    }

    #[must_use]
    pub const fn keys(&self) -> &Keys {
        &self.keys
    }

    #[must_use]
    pub fn has_field(&self, field: &str) -> bool {
        self.field_names.contains(&field.to_ascii_lowercase())
    }

    /// Prepare a value for binding against `field`.
    ///
    /// Empty text/blob values in clustering columns are swapped for the
    /// clustering sentinel; every other value passes through untouched.
    #[must_use]
    pub fn bind(&self, field: &str, value: Value) -> Value {
        if self.keys.is_clustering(field) {
            value.with_sentinel()
        } else {
            value
        }
    }
}
