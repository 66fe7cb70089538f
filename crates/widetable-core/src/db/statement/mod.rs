//! Statement descriptors.
//!
//! A statement is a value: building one never performs I/O. Each kind
//! renders its own CQL text and bind values; the execution engine decides
//! what to do with them.

mod create;
mod select;
mod write;


use crate::{db::relation::Relation, value::Value};
use std::fmt::{self, Display};
use thiserror::Error as ThisError;

// re-exports
pub use create::{CreateTableStatement, DropTableStatement};
pub use select::SelectStatement;
pub use write::{Assignment, DeleteStatement, InsertStatement, UpdateStatement};

///
/// StatementError
///
/// Statement generation failed; nothing may be executed.
///

#[derive(Debug, Eq, PartialEq, ThisError)]
pub enum StatementError {
    #[error("clustering order column '{column}' is not a clustering column of {table}")]
    InvalidClusteringOrder { table: String, column: String },

    #[error("table {table} declares no partition keys")]
    NoPartitionKeys { table: String },

    #[error("cannot determine a column type for field '{field}' of {table}")]
    UnknownColumnType { table: String, field: String },

    #[error("key '{key}' is not a field of {table}")]
    UnknownKey { table: String, key: String },
}

///
/// Statement
///

#[derive(Clone, Debug, PartialEq)]
pub enum Statement {
    CreateTable(CreateTableStatement),
    Delete(DeleteStatement),
    DropTable(DropTableStatement),
    Insert(InsertStatement),
    Select(SelectStatement),
    Update(UpdateStatement),
}

impl Statement {
    #[must_use]
    pub fn query(&self) -> String {
        match self {
            Self::CreateTable(s) => s.query(),
            Self::Delete(s) => s.query(),
            Self::DropTable(s) => s.query(),
            Self::Insert(s) => s.query(),
            Self::Select(s) => s.query(),
            Self::Update(s) => s.query(),
        }
    }

    #[must_use]
    pub fn values(&self) -> Vec<Value> {
        match self {
            Self::CreateTable(_) | Self::DropTable(_) => Vec::new(),
            Self::Delete(s) => s.values(),
            Self::Insert(s) => s.values(),
            Self::Select(s) => s.values(),
            Self::Update(s) => s.values(),
        }
    }

    #[must_use]
    pub fn keyspace(&self) -> &str {
        match self {
            Self::CreateTable(s) => &s.keyspace,
            Self::Delete(s) => &s.keyspace,
            Self::DropTable(s) => &s.keyspace,
            Self::Insert(s) => &s.keyspace,
            Self::Select(s) => &s.keyspace,
            Self::Update(s) => &s.keyspace,
        }
    }

    #[must_use]
    pub fn table(&self) -> &str {
        match self {
            Self::CreateTable(s) => &s.table,
            Self::Delete(s) => &s.table,
            Self::DropTable(s) => &s.table,
            Self::Insert(s) => &s.table,
            Self::Select(s) => &s.table,
            Self::Update(s) => &s.table,
        }
    }

    /// True for statements that return rows.
    #[must_use]
    pub const fn is_read(&self) -> bool {
        matches!(self, Self::Select(_))
    }
}

impl Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.query())
    }
}

impl From<SelectStatement> for Statement {
    fn from(stmt: SelectStatement) -> Self {
        Self::Select(stmt)
    }
}

// shared rendering helpers

fn qualified(keyspace: &str, table: &str) -> String {
    format!("{keyspace}.{table}")
}

fn where_clause(relations: &[Relation]) -> String {
    if relations.is_empty() {
        return String::new();
    }

    let parts: Vec<String> = relations.iter().map(Relation::cql).collect();
    format!(" WHERE {}", parts.join(" AND "))
}

fn relation_values(relations: &[Relation]) -> impl Iterator<Item = Value> + '_ {
    relations.iter().flat_map(|r| r.terms().iter().cloned())
}
