use crate::{
    db::{
        relation::Relation,
        statement::{qualified, relation_values, where_clause},
    },
    value::{FieldMap, Value},
};

///
/// Assignment
///
/// Right-hand side of one `SET` entry.
///

#[derive(Clone, Debug, PartialEq)]
pub enum Assignment {
    /// `c = c + ?`
    Increment(i64),
    /// `c = ?`
    Set(Value),
}

impl Assignment {
    /// Counter values become increments; everything else is overwritten.
    #[must_use]
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Counter(delta) => Self::Increment(delta),
            other => Self::Set(other),
        }
    }

    fn cql(&self, field: &str) -> String {
        match self {
            Self::Increment(_) => format!("{field} = {field} + ?"),
            Self::Set(_) => format!("{field} = ?"),
        }
    }

    fn value(&self) -> Value {
        match self {
            Self::Increment(delta) => Value::Counter(*delta),
            Self::Set(value) => value.clone(),
        }
    }
}

fn using_ttl(ttl: Option<u32>) -> String {
    ttl.map(|seconds| format!(" USING TTL {seconds}"))
        .unwrap_or_default()
}

///
/// InsertStatement
///
/// Full-row write with overwrite semantics.
///

#[derive(Clone, Debug, PartialEq)]
pub struct InsertStatement {
    pub(crate) keyspace: String,
    pub(crate) table: String,
    fields: FieldMap,
    ttl: Option<u32>,
}

impl InsertStatement {
    #[must_use]
    pub fn new(keyspace: &str, table: &str, fields: FieldMap, ttl: Option<u32>) -> Self {
        Self {
            keyspace: keyspace.to_string(),
            table: table.to_string(),
            fields,
            ttl,
        }
    }

    #[must_use]
    pub const fn fields(&self) -> &FieldMap {
        &self.fields
    }

    #[must_use]
    pub const fn ttl(&self) -> Option<u32> {
        self.ttl
    }

    #[must_use]
    pub fn query(&self) -> String {
        let names: Vec<&str> = self.fields.keys().map(String::as_str).collect();
        let markers = vec!["?"; names.len()].join(", ");

        format!(
            "INSERT INTO {} ({}) VALUES ({markers}){}",
            qualified(&self.keyspace, &self.table),
            names.join(", "),
            using_ttl(self.ttl),
        )
    }

    #[must_use]
    pub fn values(&self) -> Vec<Value> {
        self.fields.values().cloned().collect()
    }
}

///
/// UpdateStatement
///
/// Targeted column update; the store treats it as an upsert.
///

#[derive(Clone, Debug, PartialEq)]
pub struct UpdateStatement {
    pub(crate) keyspace: String,
    pub(crate) table: String,
    assignments: Vec<(String, Assignment)>,
    relations: Vec<Relation>,
    ttl: Option<u32>,
}

impl UpdateStatement {
    #[must_use]
    pub fn new(
        keyspace: &str,
        table: &str,
        assignments: Vec<(String, Assignment)>,
        relations: Vec<Relation>,
        ttl: Option<u32>,
    ) -> Self {
        Self {
            keyspace: keyspace.to_string(),
            table: table.to_string(),
            assignments,
            relations,
            ttl,
        }
    }

    #[must_use]
    pub fn assignments(&self) -> &[(String, Assignment)] {
        &self.assignments
    }

    #[must_use]
    pub fn relations(&self) -> &[Relation] {
        &self.relations
    }

    #[must_use]
    pub fn query(&self) -> String {
        let sets: Vec<String> = self
            .assignments
            .iter()
            .map(|(field, assignment)| assignment.cql(field))
            .collect();

        format!(
            "UPDATE {}{} SET {}{}",
            qualified(&self.keyspace, &self.table),
            using_ttl(self.ttl),
            sets.join(", "),
            where_clause(&self.relations),
        )
    }

    #[must_use]
    pub fn values(&self) -> Vec<Value> {
        self.assignments
            .iter()
            .map(|(_, assignment)| assignment.value())
            .chain(relation_values(&self.relations))
            .collect()
    }
}

///
/// DeleteStatement
///

#[derive(Clone, Debug, PartialEq)]
pub struct DeleteStatement {
    pub(crate) keyspace: String,
    pub(crate) table: String,
    relations: Vec<Relation>,
}

impl DeleteStatement {
    #[must_use]
    pub fn new(keyspace: &str, table: &str, relations: Vec<Relation>) -> Self {
        Self {
            keyspace: keyspace.to_string(),
            table: table.to_string(),
            relations,
        }
    }

    #[must_use]
    pub fn relations(&self) -> &[Relation] {
        &self.relations
    }

    #[must_use]
    pub fn query(&self) -> String {
        format!(
            "DELETE FROM {}{}",
            qualified(&self.keyspace, &self.table),
            where_clause(&self.relations),
        )
    }

    #[must_use]
    pub fn values(&self) -> Vec<Value> {
        relation_values(&self.relations).collect()
    }
}
