//! Pending operations.
//!
//! An `Op` is a batch of single operations, each bound to the table that
//! produced it. Nothing touches the engine until `run` or `run_atomically`.

use crate::{
    db::{
        executor::RowIter,
        options::Options,
        relation::Relation,
        scanner::ScanSink,
        statement::{
            Assignment, DeleteStatement, InsertStatement, SelectStatement, Statement,
            UpdateStatement,
        },
        table::Table,
    },
    error::Error,
    obs::sink::{self, ExecKind, MetricsEvent, Span},
    value::FieldMap,
};
use thiserror::Error as ThisError;

///
/// OpError
///

#[derive(Debug, Eq, PartialEq, ThisError)]
pub enum OpError {
    #[error("reads cannot run in an atomic batch")]
    AtomicRead,

    #[error("field '{field}' is not a column of {table}")]
    UnknownField { table: String, field: String },
}

///
/// Action
///

pub(crate) enum Action<'a> {
    Insert(FieldMap),
    Update(FieldMap),
    Delete,
    Read {
        sink: &'a mut dyn ScanSink,
        one: bool,
    },
}

///
/// Pending
///
/// One operation against one table, with its own option overrides.
///

struct Pending<'a> {
    table: Table<'a>,
    relations: Vec<Relation>,
    options: Options,
    action: Action<'a>,
}

impl Pending<'_> {
    const fn is_read(&self) -> bool {
        matches!(self.action, Action::Read { .. })
    }

    const fn kind(&self) -> ExecKind {
        if self.is_read() {
            ExecKind::Read
        } else {
            ExecKind::Write
        }
    }

    fn options(&self) -> Options {
        self.table.options().merge(&self.options)
    }

    fn table_name(&self, options: &Options) -> String {
        options
            .table_name
            .clone()
            .unwrap_or_else(|| self.table.info().name().to_string())
    }

    fn bound_relations(&self) -> Vec<Relation> {
        let info = self.table.info();

        self.relations
            .iter()
            .cloned()
            .map(|relation| relation.bound(info))
            .collect()
    }

    fn select(&self, one: bool) -> SelectStatement {
        let options = self.options();
        let info = self.table.info();
        let fields = if options.select.is_empty() {
            info.fields()
        } else {
            options.select.as_slice()
        };

        SelectStatement::new(info.keyspace(), &self.table_name(&options), fields)
            .with_relations(self.bound_relations())
            .with_order_by(options.clustering_order.clone())
            .with_limit(if one { Some(1) } else { options.limit })
            .with_allow_filtering(options.allow_filtering)
    }

    fn statement(&self) -> Statement {
        let options = self.options();
        let info = self.table.info();
        let keyspace = info.keyspace();
        let table = self.table_name(&options);

        match &self.action {
            Action::Insert(fields) => {
                let fields = fields
                    .iter()
                    .map(|(name, value)| (name.clone(), info.bind(name, value.clone())))
                    .collect();

                Statement::Insert(InsertStatement::new(keyspace, &table, fields, options.ttl))
            }

            Action::Update(fields) => {
                let assignments = fields
                    .iter()
                    .map(|(name, value)| (name.clone(), Assignment::from_value(value.clone())))
                    .collect();

                Statement::Update(UpdateStatement::new(
                    keyspace,
                    &table,
                    assignments,
                    self.bound_relations(),
                    options.ttl,
                ))
            }

            Action::Delete => Statement::Delete(DeleteStatement::new(
                keyspace,
                &table,
                self.bound_relations(),
            )),

            Action::Read { one, .. } => Statement::Select(self.select(*one)),
        }
    }

    fn preflight(&self) -> Result<(), OpError> {
        let info = self.table.info();
        let written = match &self.action {
            Action::Insert(fields) | Action::Update(fields) => Some(fields.keys()),
            Action::Delete | Action::Read { .. } => None,
        };

        let relation_fields = self.relations.iter().map(Relation::field);
        let select_fields = self.options.select.iter().map(String::as_str);

        relation_fields
            .chain(select_fields)
            .chain(written.into_iter().flatten().map(String::as_str))
            .find(|field| !info.has_field(field))
            .map_or(Ok(()), |field| {
                Err(OpError::UnknownField {
                    table: info.name().to_string(),
                    field: field.to_string(),
                })
            })
    }

    fn run(self) -> Result<(), Error> {
        let keyspace = self.table.keyspace().clone();

        keyspace.with_metrics(|| {
            let options = self.options();
            let table = self.table_name(&options);
            let mut span = Span::new(self.kind(), &table);
            span.add_statements(1);

            let stmt = self.statement();
            let result = match (self.action, stmt) {
                (Action::Read { sink: dest, .. }, Statement::Select(select)) => keyspace
                    .scan(&select, &mut |iter: &mut dyn RowIter| dest.scan(&select, iter))
                    .map(|rows| {
                        let rows = u64::try_from(rows).unwrap_or(u64::MAX);
                        span.add_rows(rows);
                        sink::record(MetricsEvent::RowsScanned {
                            table: &table,
                            rows,
                        });
                    }),
                (_, stmt) => keyspace.execute(&stmt),
            };

            if result.is_err() {
                span.set_failed();
            }

            result
        })
    }
}

///
/// Op
///
/// Single-shot batch of pending operations.
///

#[must_use = "an op does nothing until it is run"]
pub struct Op<'a> {
    items: Vec<Pending<'a>>,
}

impl<'a> Op<'a> {
    pub(crate) fn single(table: Table<'a>, relations: Vec<Relation>, action: Action<'a>) -> Self {
        Self {
            items: vec![Pending {
                table,
                relations,
                options: Options::default(),
                action,
            }],
        }
    }

    /// An op that does nothing when run.
    pub const fn noop() -> Self {
        Self { items: Vec::new() }
    }

    /// Append `other`'s operations after this op's.
    pub fn add(mut self, other: Self) -> Self {
        self.items.extend(other.items);
        self
    }

    /// Layer `options` over every operation's table options.
    pub fn with_options(mut self, options: &Options) -> Self {
        for item in &mut self.items {
            item.options = item.options.merge(options);
        }
        self
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Statements this op would execute, in order.
    #[must_use]
    pub fn statements(&self) -> Vec<Statement> {
        self.items.iter().map(Pending::statement).collect()
    }

    /// Check that every referenced field is a column of its table.
    pub fn preflight(&self) -> Result<(), Error> {
        for item in &self.items {
            item.preflight()?;
        }

        Ok(())
    }

    /// Run each operation in order, stopping at the first failure.
    pub fn run(self) -> Result<(), Error> {
        for item in self.items {
            item.run()?;
        }

        Ok(())
    }

    /// Run every operation as one atomic batch. Reads are rejected before
    /// anything executes.
    pub fn run_atomically(self) -> Result<(), Error> {
        if self.items.iter().any(Pending::is_read) {
            return Err(OpError::AtomicRead.into());
        }
        let Some(first) = self.items.first() else {
            return Ok(());
        };

        let keyspace = first.table.keyspace().clone();
        let table = first.table_name(&first.options());
        let stmts = self.statements();

        keyspace.with_metrics(|| {
            let mut span = Span::new(ExecKind::Write, &table);
            span.add_statements(u64::try_from(stmts.len()).unwrap_or(u64::MAX));

            let result = keyspace.execute_atomically(&stmts);
            if result.is_err() {
                span.set_failed();
            }

            result
        })
    }
}
