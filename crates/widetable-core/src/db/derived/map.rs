use crate::{
    db::{
        op::Op,
        options::Options,
        relation::{eq, in_list},
        statement::{Statement, StatementError},
        table::Table,
    },
    error::Error,
    traits::{Destination, FieldValue, ToFields},
    value::FieldMap,
};
use std::sync::Arc;

///
/// MapTable
///
/// Key-value view: one identity field is the whole primary key.
///

#[derive(Clone)]
pub struct MapTable<'a> {
    table: Table<'a>,
    id_field: Arc<str>,
}

impl<'a> MapTable<'a> {
    pub(crate) fn new(table: Table<'a>, id_field: &str) -> Self {
        Self {
            table,
            id_field: id_field.to_ascii_lowercase().into(),
        }
    }

    #[must_use]
    pub const fn table(&self) -> &Table<'a> {
        &self.table
    }

    #[must_use]
    pub fn name(&self) -> &str {
        self.table.name()
    }

    #[must_use]
    pub fn with_options(&self, options: &Options) -> Self {
        Self {
            table: self.table.with_options(options),
            id_field: Arc::clone(&self.id_field),
        }
    }

    pub fn create(&self) -> Result<(), Error> {
        self.table.create()
    }

    pub fn create_if_not_exist(&self) -> Result<(), Error> {
        self.table.create_if_not_exist()
    }

    pub fn recreate(&self) -> Result<(), Error> {
        self.table.recreate()
    }

    pub fn create_statement(&self) -> Result<Statement, StatementError> {
        self.table.create_statement()
    }

    #[must_use]
    pub fn set<E>(&self, entity: &E) -> Op<'a>
    where
        E: ToFields + ?Sized,
    {
        self.table.set(entity)
    }

    #[must_use]
    pub fn read<'d, D>(&self, id: impl FieldValue, dest: &'d mut D) -> Op<'d>
    where
        'a: 'd,
        D: Destination + 'd,
    {
        self.table
            .filter(vec![eq(&self.id_field, id)])
            .read_one(dest)
    }

    #[must_use]
    pub fn multi_read<'d, T, D>(&self, ids: impl IntoIterator<Item = T>, dest: &'d mut D) -> Op<'d>
    where
        'a: 'd,
        T: FieldValue,
        D: Destination + 'd,
    {
        self.table
            .filter(vec![in_list(&self.id_field, ids)])
            .read(dest)
    }

    #[must_use]
    pub fn update(&self, id: impl FieldValue, fields: FieldMap) -> Op<'a> {
        self.table
            .filter(vec![eq(&self.id_field, id)])
            .update(fields)
    }

    #[must_use]
    pub fn delete(&self, id: impl FieldValue) -> Op<'a> {
        self.table.filter(vec![eq(&self.id_field, id)]).delete()
    }
}
