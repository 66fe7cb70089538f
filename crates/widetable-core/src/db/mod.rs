pub mod derived;
pub mod executor;
pub mod memory;
pub mod op;
pub mod options;
pub mod relation;
pub mod scanner;
pub mod statement;
pub mod table;

#[cfg(test)]
mod tests;

use crate::{
    config::KeySpaceConfig,
    db::{
        derived::{MapTable, MultimapMkTable, MultimapTable},
        executor::{QueryExecutor, RowIter},
        options::Options,
        relation::eq,
        scanner::Scanner,
        statement::{DropTableStatement, SelectStatement, Statement},
        table::Table,
    },
    error::Error,
    model::{info::TableInfo, keys::Keys},
    obs::sink::{MetricsSink, with_metrics_sink},
    traits::{FieldTable, Record, ToFields},
};
use std::sync::OnceLock;

// re-exports
pub use op::Op;

/// Keyspace holding the store's own table catalogue.
pub const SYSTEM_SCHEMA: &str = "system_schema";

///
/// KeySpace
///
/// Session-scoped handle on one keyspace: the borrowed execution engine
/// plus policy (debug logging, metrics sink, default table options).
/// Cheap to clone; every table built from it carries a copy.
///

#[derive(Clone)]
pub struct KeySpace<'a> {
    name: String,
    executor: &'a dyn QueryExecutor,
    debug: bool,
    metrics: Option<&'static dyn MetricsSink>,
    defaults: Options,
}

impl<'a> KeySpace<'a> {
    #[must_use]
    pub fn new(name: impl Into<String>, executor: &'a dyn QueryExecutor) -> Self {
        Self {
            name: name.into(),
            executor,
            debug: false,
            metrics: None,
            defaults: Options::default(),
        }
    }

    #[must_use]
    pub fn from_config(executor: &'a dyn QueryExecutor, config: &KeySpaceConfig) -> Self {
        Self {
            name: config.keyspace.clone(),
            executor,
            debug: config.debug,
            metrics: None,
            defaults: config.defaults.clone(),
        }
    }

    /// Log every executed statement and scan at debug level.
    #[must_use]
    pub const fn debug(mut self) -> Self {
        self.debug = true;
        self
    }

    #[must_use]
    pub const fn metrics_sink(mut self, sink: &'static dyn MetricsSink) -> Self {
        self.metrics = Some(sink);
        self
    }

    /// Base options for every table built from this keyspace.
    #[must_use]
    pub fn with_defaults(mut self, defaults: Options) -> Self {
        self.defaults = defaults;
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub const fn is_debug(&self) -> bool {
        self.debug
    }

    #[must_use]
    pub fn executor(&self) -> &'a dyn QueryExecutor {
        self.executor
    }

    // ---------------------------------------------------------------------
    // Table constructors
    // ---------------------------------------------------------------------

    /// Table over an example entity's field set.
    ///
    /// # Panics
    ///
    /// Panics when `example` cannot be viewed as a field map; that is a
    /// caller bug, not a runtime condition.
    #[must_use]
    pub fn table<E>(&self, name: &str, example: &E, keys: Keys) -> Table<'a>
    where
        E: ToFields + ?Sized,
    {
        let columns = example
            .column_types()
            .unwrap_or_else(|err| panic!("table {name}: {err}"));
        let info = TableInfo::new(&self.name, name, keys, columns);

        Table::new(self.clone(), info)
    }

    /// `<name>_map_<id>`, keyed by `id_field` alone.
    #[must_use]
    pub fn map_table<E>(&self, name: &str, id_field: &str, example: &E) -> MapTable<'a>
    where
        E: ToFields + ?Sized,
    {
        let table = self.table(
            &format!("{name}_map_{id_field}"),
            example,
            Keys::new([id_field]),
        );

        MapTable::new(table, id_field)
    }

    /// `<name>_multimap_<index>_<id>`, partitioned by `index_field` and
    /// clustered by `id_field`.
    #[must_use]
    pub fn multimap_table<E>(
        &self,
        name: &str,
        index_field: &str,
        id_field: &str,
        example: &E,
    ) -> MultimapTable<'a>
    where
        E: ToFields + ?Sized,
    {
        let table = self.table(
            &format!("{name}_multimap_{index_field}_{id_field}"),
            example,
            Keys::new([index_field]).clustering([id_field]),
        );

        MultimapTable::new(table, index_field, id_field)
    }

    /// `<name>_multimapMk_<index fields>_<id fields>`, partitioned by the
    /// index fields and clustered by the id fields.
    #[must_use]
    pub fn multimap_multikey_table<E>(
        &self,
        name: &str,
        index_fields: &[&str],
        id_fields: &[&str],
        example: &E,
    ) -> MultimapMkTable<'a>
    where
        E: ToFields + ?Sized,
    {
        let table = self.table(
            &format!(
                "{name}_multimapMk_{}_{}",
                index_fields.join("_"),
                id_fields.join("_")
            ),
            example,
            Keys::new(index_fields).clustering(id_fields),
        );

        MultimapMkTable::new(table, index_fields, id_fields)
    }

    // ---------------------------------------------------------------------
    // Catalogue
    // ---------------------------------------------------------------------

    /// Names of every table in this keyspace.
    pub fn tables(&self) -> Result<Vec<String>, Error> {
        let stmt = SelectStatement::new(SYSTEM_SCHEMA, "tables", ["table_name"])
            .with_relations(vec![eq("keyspace_name", self.name.as_str())]);

        let mut rows: Vec<TableName> = Vec::new();
        self.scan(&stmt, &mut |iter: &mut dyn RowIter| {
            Scanner::new(&stmt, &mut rows).scan_iter(iter)
        })?;

        Ok(rows.into_iter().map(|row| row.table_name).collect())
    }

    /// Case-insensitive table existence check.
    pub fn exists(&self, name: &str) -> Result<bool, Error> {
        Ok(self
            .tables()?
            .iter()
            .any(|table| table.eq_ignore_ascii_case(name)))
    }

    pub fn drop_table(&self, name: &str) -> Result<(), Error> {
        let stmt = Statement::DropTable(DropTableStatement::new(&self.name, name));

        self.execute(&stmt)
    }

    // ---------------------------------------------------------------------
    // Execution plumbing
    // ---------------------------------------------------------------------

    pub(crate) fn with_metrics<T>(&self, f: impl FnOnce() -> T) -> T {
        if let Some(sink) = self.metrics {
            with_metrics_sink(sink, f)
        } else {
            f()
        }
    }

    pub(crate) fn debug_log(&self, stmt: &Statement) {
        if self.debug {
            tracing::debug!(
                target: "widetable",
                keyspace = %self.name,
                table = stmt.table(),
                values = stmt.values().len(),
                "{}",
                stmt.query()
            );
        }
    }

    pub(crate) fn execute(&self, stmt: &Statement) -> Result<(), Error> {
        self.debug_log(stmt);

        self.executor.execute(stmt).map_err(|err| {
            tracing::warn!(target: "widetable", table = stmt.table(), error = %err, "execute failed");
            Error::Engine(err)
        })
    }

    pub(crate) fn execute_atomically(&self, stmts: &[Statement]) -> Result<(), Error> {
        for stmt in stmts {
            self.debug_log(stmt);
        }

        self.executor.execute_atomically(stmts).map_err(|err| {
            tracing::warn!(target: "widetable", statements = stmts.len(), error = %err, "batch failed");
            Error::Engine(err)
        })
    }

    /// Run a read and hand its iterator to `decode`. The iterator is always
    /// closed afterwards; a decode error takes precedence over a close error.
    pub(crate) fn scan(
        &self,
        stmt: &SelectStatement,
        decode: &mut dyn FnMut(&mut dyn RowIter) -> Result<usize, Error>,
    ) -> Result<usize, Error> {
        let logged = Statement::Select(stmt.clone());
        self.debug_log(&logged);

        let mut iter = self.executor.query(stmt).map_err(|err| {
            tracing::warn!(target: "widetable", table = stmt.table(), error = %err, "query failed");
            Error::Engine(err)
        })?;

        let decoded = decode(iter.as_mut());
        let closed = iter.close().map_err(Error::Engine);
        let rows = decoded?;
        closed?;

        if self.debug {
            tracing::debug!(target: "widetable", table = stmt.table(), rows, "scan finished");
        }

        Ok(rows)
    }
}

///
/// TableName
///
/// One `system_schema.tables` row.
///

#[derive(Clone, Debug, Default)]
struct TableName {
    table_name: String,
}

impl Record for TableName {
    fn field_table() -> &'static FieldTable<Self> {
        static TABLE: OnceLock<FieldTable<TableName>> = OnceLock::new();

        TABLE.get_or_init(|| {
            FieldTable::<Self>::builder()
                .field::<String>("table_name", |r| &r.table_name, |r| &mut r.table_name)
                .build()
        })
    }
}

crate::__impl_record_shapes!(TableName);
