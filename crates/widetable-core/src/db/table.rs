use crate::{
    db::{
        KeySpace,
        op::{Action, Op},
        options::Options,
        relation::{Relation, relations, remove_fields},
        statement::{CreateTableStatement, Statement, StatementError},
    },
    error::Error,
    model::info::TableInfo,
    traits::{Destination, ToFields},
    value::{FieldMap, Value, normalize_fields},
};
use std::sync::Arc;

///
/// Table
///
/// Typed façade over one store table. Values are immutable: every
/// `with_options` returns a new table and leaves the receiver alone.
///

#[derive(Clone)]
pub struct Table<'a> {
    keyspace: KeySpace<'a>,
    info: Arc<TableInfo>,
    options: Options,
}

impl<'a> Table<'a> {
    pub(crate) fn new(keyspace: KeySpace<'a>, info: TableInfo) -> Self {
        let options = keyspace.defaults.clone();

        Self {
            keyspace,
            info: Arc::new(info),
            options,
        }
    }

    /// The `table_name` option when set, otherwise the declared name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.options
            .table_name
            .as_deref()
            .unwrap_or_else(|| self.info.name())
    }

    #[must_use]
    pub fn info(&self) -> &TableInfo {
        &self.info
    }

    #[must_use]
    pub const fn options(&self) -> &Options {
        &self.options
    }

    #[must_use]
    pub const fn keyspace(&self) -> &KeySpace<'a> {
        &self.keyspace
    }

    #[must_use]
    pub fn with_options(&self, options: &Options) -> Self {
        Self {
            keyspace: self.keyspace.clone(),
            info: Arc::clone(&self.info),
            options: self.options.merge(options),
        }
    }

    /// Narrow subsequent reads, updates and deletes. Never executes.
    #[must_use]
    pub fn filter(&self, relations: Vec<Relation>) -> Filter<'a> {
        Filter {
            table: self.clone(),
            relations,
        }
    }

    /// Write an entity.
    ///
    /// With the key fields removed, a payload that is empty or holds only
    /// empty containers is written as a full-row insert; anything else
    /// becomes an update keyed on the entity's key values, with counters
    /// turned into increments.
    ///
    /// # Panics
    ///
    /// Panics when `entity` cannot be viewed as a field map.
    #[must_use]
    pub fn set<E>(&self, entity: &E) -> Op<'a>
    where
        E: ToFields + ?Sized,
    {
        let Ok(fields) = entity.to_fields() else {
            panic!("set: incompatible type");
        };

        let keys: Vec<&str> = self.info.keys().all().collect();
        let payload = remove_fields(&fields, &keys);

        if payload.is_empty() || payload.values().all(Value::is_nullable) {
            return Op::single(self.clone(), Vec::new(), Action::Insert(fields));
        }

        let relations = relations(self.info.keys(), &fields);
        Op::single(self.clone(), relations, Action::Update(payload))
    }

    pub fn create(&self) -> Result<(), Error> {
        self.keyspace.execute(&self.create_statement()?)
    }

    pub fn create_if_not_exist(&self) -> Result<(), Error> {
        self.keyspace
            .execute(&self.create_if_not_exist_statement()?)
    }

    /// Drop the table when it exists, then create it.
    pub fn recreate(&self) -> Result<(), Error> {
        if self.keyspace.exists(self.name())? {
            self.keyspace.drop_table(self.name())?;
        }

        self.create()
    }

    pub fn create_statement(&self) -> Result<Statement, StatementError> {
        CreateTableStatement::new(&self.info, self.name(), &self.options, false)
            .map(Statement::CreateTable)
    }

    pub fn create_if_not_exist_statement(&self) -> Result<Statement, StatementError> {
        CreateTableStatement::new(&self.info, self.name(), &self.options, true)
            .map(Statement::CreateTable)
    }
}

///
/// Filter
///
/// A table narrowed by relations. Reusable: each call builds a fresh op.
///

#[derive(Clone)]
pub struct Filter<'a> {
    table: Table<'a>,
    relations: Vec<Relation>,
}

impl<'a> Filter<'a> {
    #[must_use]
    pub const fn table(&self) -> &Table<'a> {
        &self.table
    }

    #[must_use]
    pub fn relations(&self) -> &[Relation] {
        &self.relations
    }

    /// Read every matching row into `dest`, replacing its contents.
    #[must_use]
    pub fn read<'d, D>(&self, dest: &'d mut D) -> Op<'d>
    where
        'a: 'd,
        D: Destination + 'd,
    {
        Op::single(
            self.table.clone(),
            self.relations.clone(),
            Action::Read {
                sink: dest,
                one: false,
            },
        )
    }

    /// Read the first matching row into `dest`; zero rows is not-found.
    #[must_use]
    pub fn read_one<'d, D>(&self, dest: &'d mut D) -> Op<'d>
    where
        'a: 'd,
        D: Destination + 'd,
    {
        Op::single(
            self.table.clone(),
            self.relations.clone(),
            Action::Read {
                sink: dest,
                one: true,
            },
        )
    }

    #[must_use]
    pub fn update(&self, fields: FieldMap) -> Op<'a> {
        Op::single(
            self.table.clone(),
            self.relations.clone(),
            Action::Update(normalize_fields(fields)),
        )
    }

    #[must_use]
    pub fn delete(&self) -> Op<'a> {
        Op::single(self.table.clone(), self.relations.clone(), Action::Delete)
    }
}
