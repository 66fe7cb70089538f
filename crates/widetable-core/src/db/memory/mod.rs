//! In-process execution engine.
//!
//! Holds every table as a vector of rows behind one mutex and interprets
//! statement descriptors directly. Empty collections are stored as `Null`,
//! the same way the wide-column store persists them, so reads exercise the
//! scanner's empty-container handling.


use crate::{
    db::{
        SYSTEM_SCHEMA,
        executor::{QueryExecutor, RowIter, Rows},
        options::{ClusteringOrderColumn, ColumnDirection},
        relation::{Comparator, Relation},
        statement::{
            Assignment, CreateTableStatement, DeleteStatement, InsertStatement, SelectStatement,
            Statement, UpdateStatement,
        },
    },
    error::EngineError,
    model::keys::Keys,
    value::{FieldMap, Value, canonical_cmp},
};
use std::{
    cmp::Ordering,
    collections::BTreeMap,
    sync::{Mutex, MutexGuard},
};
use thiserror::Error as ThisError;

///
/// MemoryError
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum MemoryError {
    #[error("injected failure: {0}")]
    Injected(String),

    #[error("key '{key}' of {table} is not restricted by '=' or IN")]
    MissingKey { table: String, key: String },

    #[error("memory engine state poisoned")]
    Poisoned,

    #[error("table {keyspace}.{table} already exists")]
    TableExists { keyspace: String, table: String },

    #[error("table {keyspace}.{table} does not exist")]
    TableNotFound { keyspace: String, table: String },
}

///
/// MemoryTable
///

#[derive(Clone, Debug)]
struct MemoryTable {
    keys: Keys,
    columns: Vec<String>,
    order: Vec<ClusteringOrderColumn>,
    rows: Vec<FieldMap>,
}

impl MemoryTable {
    fn from_create(stmt: &CreateTableStatement) -> Self {
        Self {
            keys: stmt.keys().clone(),
            columns: stmt.columns().iter().map(|(name, _)| name.clone()).collect(),
            order: stmt.clustering_order().to_vec(),
            rows: Vec::new(),
        }
    }

    fn key_of(&self, row: &FieldMap) -> Vec<Value> {
        self.keys
            .all()
            .map(|key| row.get(key).cloned().unwrap_or(Value::Null))
            .collect()
    }

    fn position(&self, key: &[Value]) -> Option<usize> {
        self.rows
            .iter()
            .position(|row| same_values(&self.key_of(row), key))
    }

    fn empty_row(&self) -> FieldMap {
        self.columns
            .iter()
            .map(|column| (column.clone(), Value::Null))
            .collect()
    }

    fn direction(&self, column: &str, order_by: &[ClusteringOrderColumn]) -> ColumnDirection {
        order_by
            .iter()
            .chain(&self.order)
            .find(|col| col.column == column)
            .map_or(ColumnDirection::Asc, |col| col.direction)
    }

    // Rows sort by every key column in declaration order; clustering columns
    // follow the statement's ORDER BY, then the table's clustering order.
    fn sort(&self, rows: &mut [FieldMap], order_by: &[ClusteringOrderColumn]) {
        let directions: Vec<(&str, ColumnDirection)> = self
            .keys
            .all()
            .map(|key| (key, self.direction(key, order_by)))
            .collect();

        rows.sort_by(|a, b| {
            directions
                .iter()
                .map(|(key, direction)| {
                    let ord = canonical_cmp(field(a, key), field(b, key));
                    match direction {
                        ColumnDirection::Asc => ord,
                        ColumnDirection::Desc => ord.reverse(),
                    }
                })
                .find(|ord| *ord != Ordering::Equal)
                .unwrap_or(Ordering::Equal)
        });
    }
}

///
/// State
///

#[derive(Clone, Debug, Default)]
struct State {
    tables: BTreeMap<(String, String), MemoryTable>,
}

impl State {
    fn table_mut(&mut self, keyspace: &str, table: &str) -> Result<&mut MemoryTable, MemoryError> {
        self.tables
            .get_mut(&table_id(keyspace, table))
            .ok_or_else(|| MemoryError::TableNotFound {
                keyspace: keyspace.to_string(),
                table: table.to_string(),
            })
    }

    fn apply(&mut self, stmt: &Statement) -> Result<(), MemoryError> {
        match stmt {
            Statement::CreateTable(s) => self.create(s),
            Statement::Delete(s) => self.delete(s),
            Statement::DropTable(_) => {
                self.tables
                    .remove(&table_id(stmt.keyspace(), stmt.table()));
                Ok(())
            }
            Statement::Insert(s) => self.insert(s),
            Statement::Select(s) => self.rows(s).map(|_| ()),
            Statement::Update(s) => self.update(s),
        }
    }

    fn create(&mut self, stmt: &CreateTableStatement) -> Result<(), MemoryError> {
        let id = table_id(&stmt.keyspace, &stmt.table);

        if self.tables.contains_key(&id) {
            if stmt.if_not_exists() {
                return Ok(());
            }
            return Err(MemoryError::TableExists {
                keyspace: stmt.keyspace.clone(),
                table: stmt.table.clone(),
            });
        }

        self.tables.insert(id, MemoryTable::from_create(stmt));
        Ok(())
    }

    fn insert(&mut self, stmt: &InsertStatement) -> Result<(), MemoryError> {
        let table = self.table_mut(&stmt.keyspace, &stmt.table)?;

        let mut row = table.empty_row();
        for (name, value) in stmt.fields() {
            row.insert(name.clone(), stored(value.clone()));
        }

        let key = table.key_of(&row);
        match table.position(&key) {
            Some(pos) => table.rows[pos] = row,
            None => table.rows.push(row),
        }

        Ok(())
    }

    fn update(&mut self, stmt: &UpdateStatement) -> Result<(), MemoryError> {
        let name = stmt.table.clone();
        let table = self.table_mut(&stmt.keyspace, &stmt.table)?;

        for key in key_tuples(&table.keys, stmt.relations(), &name)? {
            let pos = if let Some(pos) = table.position(&key) {
                pos
            } else {
                let mut row = table.empty_row();
                for (column, value) in table.keys.all().zip(&key) {
                    row.insert(column.to_string(), value.clone());
                }
                table.rows.push(row);
                table.rows.len() - 1
            };

            let row = &mut table.rows[pos];
            for (column, assignment) in stmt.assignments() {
                let value = match assignment {
                    Assignment::Set(value) => stored(value.clone()),
                    Assignment::Increment(delta) => {
                        let current = match row.get(column) {
                            Some(Value::Counter(n) | Value::Int(n)) => *n,
                            _ => 0,
                        };
                        Value::Counter(current.saturating_add(*delta))
                    }
                };
                row.insert(column.clone(), value);
            }
        }

        Ok(())
    }

    fn delete(&mut self, stmt: &DeleteStatement) -> Result<(), MemoryError> {
        let table = self.table_mut(&stmt.keyspace, &stmt.table)?;
        table.rows.retain(|row| !accepted(row, stmt.relations()));

        Ok(())
    }

    fn rows(&self, stmt: &SelectStatement) -> Result<Vec<FieldMap>, MemoryError> {
        let mut rows = if stmt.keyspace().eq_ignore_ascii_case(SYSTEM_SCHEMA)
            && stmt.table().eq_ignore_ascii_case("tables")
        {
            self.system_tables()
                .into_iter()
                .filter(|row| accepted(row, stmt.relations()))
                .collect()
        } else {
            let table = self
                .tables
                .get(&table_id(stmt.keyspace(), stmt.table()))
                .ok_or_else(|| MemoryError::TableNotFound {
                    keyspace: stmt.keyspace().to_string(),
                    table: stmt.table().to_string(),
                })?;

            let mut rows: Vec<FieldMap> = table
                .rows
                .iter()
                .filter(|row| accepted(row, stmt.relations()))
                .cloned()
                .collect();
            table.sort(&mut rows, stmt.order_by());
            rows
        };

        if let Some(limit) = stmt.limit() {
            rows.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
        }

        if stmt.fields().is_empty() {
            return Ok(rows);
        }

        Ok(rows
            .into_iter()
            .map(|row| {
                stmt.fields()
                    .iter()
                    .map(|name| (name.clone(), field(&row, name).clone()))
                    .collect()
            })
            .collect())
    }

    fn system_tables(&self) -> Vec<FieldMap> {
        self.tables
            .keys()
            .map(|(keyspace, table)| {
                FieldMap::from([
                    ("keyspace_name".to_string(), Value::Text(keyspace.clone())),
                    ("table_name".to_string(), Value::Text(table.clone())),
                ])
            })
            .collect()
    }
}

///
/// MemoryExecutor
///
/// `QueryExecutor` over in-process tables. Every statement it receives is
/// recorded, in order, for inspection.
///

#[derive(Debug, Default)]
pub struct MemoryExecutor {
    state: Mutex<State>,
    log: Mutex<Vec<Statement>>,
    failure: Mutex<Option<String>>,
}

impl MemoryExecutor {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Every statement received so far, oldest first.
    #[must_use]
    pub fn statements(&self) -> Vec<Statement> {
        self.log.lock().map(|log| log.clone()).unwrap_or_default()
    }

    pub fn clear_statements(&self) {
        if let Ok(mut log) = self.log.lock() {
            log.clear();
        }
    }

    /// Make the next call fail with `MemoryError::Injected(message)`.
    pub fn fail_next(&self, message: impl Into<String>) {
        if let Ok(mut failure) = self.failure.lock() {
            *failure = Some(message.into());
        }
    }

    /// Current rows of one table, in storage order.
    pub fn rows(&self, keyspace: &str, table: &str) -> Result<Vec<FieldMap>, MemoryError> {
        let state = self.state()?;

        state
            .tables
            .get(&table_id(keyspace, table))
            .map(|t| t.rows.clone())
            .ok_or_else(|| MemoryError::TableNotFound {
                keyspace: keyspace.to_string(),
                table: table.to_string(),
            })
    }

    fn state(&self) -> Result<MutexGuard<'_, State>, MemoryError> {
        self.state.lock().map_err(|_| MemoryError::Poisoned)
    }

    fn begin(&self, stmts: &[Statement]) -> Result<(), MemoryError> {
        let mut log = self.log.lock().map_err(|_| MemoryError::Poisoned)?;
        log.extend(stmts.iter().cloned());

        let mut failure = self.failure.lock().map_err(|_| MemoryError::Poisoned)?;
        match failure.take() {
            Some(message) => Err(MemoryError::Injected(message)),
            None => Ok(()),
        }
    }
}

impl QueryExecutor for MemoryExecutor {
    fn execute(&self, stmt: &Statement) -> Result<(), EngineError> {
        self.begin(std::slice::from_ref(stmt))?;
        self.state()?.apply(stmt)?;

        Ok(())
    }

    fn execute_atomically(&self, stmts: &[Statement]) -> Result<(), EngineError> {
        self.begin(stmts)?;

        let mut state = self.state()?;
        let mut staged = state.clone();
        for stmt in stmts {
            staged.apply(stmt)?;
        }
        *state = staged;

        Ok(())
    }

    fn query(&self, stmt: &SelectStatement) -> Result<Box<dyn RowIter + '_>, EngineError> {
        self.begin(&[Statement::Select(stmt.clone())])?;
        let rows = self.state()?.rows(stmt)?;

        Ok(Box::new(Rows::new(rows)))
    }
}

fn table_id(keyspace: &str, table: &str) -> (String, String) {
    (keyspace.to_ascii_lowercase(), table.to_ascii_lowercase())
}

fn field<'r>(row: &'r FieldMap, name: &str) -> &'r Value {
    static NULL: Value = Value::Null;

    row.get(name).unwrap_or(&NULL)
}

fn accepted(row: &FieldMap, relations: &[Relation]) -> bool {
    relations
        .iter()
        .all(|relation| relation.accepts(field(row, relation.field())))
}

fn same_values(a: &[Value], b: &[Value]) -> bool {
    a.len() == b.len()
        && a.iter()
            .zip(b)
            .all(|(x, y)| canonical_cmp(x, y) == Ordering::Equal)
}

// Empty collections are not stored.
fn stored(value: Value) -> Value {
    match &value {
        Value::List(v) | Value::Set(v) if v.is_empty() => Value::Null,
        Value::Map(v) if v.is_empty() => Value::Null,
        _ => value,
    }
}

// Every primary key an update addresses: the cartesian product of the
// `=`/IN terms restricting each key column.
fn key_tuples(
    keys: &Keys,
    relations: &[Relation],
    table: &str,
) -> Result<Vec<Vec<Value>>, MemoryError> {
    let mut tuples: Vec<Vec<Value>> = vec![Vec::new()];

    for key in keys.all() {
        let terms = relations
            .iter()
            .find(|r| {
                r.field() == key && matches!(r.comparator(), Comparator::Eq | Comparator::In)
            })
            .map(Relation::terms)
            .ok_or_else(|| MemoryError::MissingKey {
                table: table.to_string(),
                key: key.to_string(),
            })?;

        tuples = tuples
            .into_iter()
            .flat_map(|prefix| {
                terms.iter().map(move |term| {
                    let mut next = prefix.clone();
                    next.push(term.clone());
                    next
                })
            })
            .collect();
    }

    Ok(tuples)
}
