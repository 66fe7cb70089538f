use crate::{
    db::{
        derived::MultimapMkTable,
        op::Op,
        options::Options,
        relation::in_list,
        statement::{Statement, StatementError},
        table::Table,
    },
    error::Error,
    traits::{Destination, FieldValue, ToFields},
    value::{FieldMap, Value},
};

///
/// MultimapTable
///
/// Single index field, single identity field. Arguments are plain values
/// and follow the same relation rule as `MultimapMkTable`.
///

#[derive(Clone)]
pub struct MultimapTable<'a> {
    inner: MultimapMkTable<'a>,
}

impl<'a> MultimapTable<'a> {
    pub(crate) fn new(table: Table<'a>, index_field: &str, id_field: &str) -> Self {
        Self {
            inner: MultimapMkTable::new(table, &[index_field], &[id_field]),
        }
    }

    #[must_use]
    pub const fn table(&self) -> &Table<'a> {
        self.inner.table()
    }

    #[must_use]
    pub fn name(&self) -> &str {
        self.inner.name()
    }

    #[must_use]
    pub fn with_options(&self, options: &Options) -> Self {
        Self {
            inner: self.inner.with_options(options),
        }
    }

    pub fn create(&self) -> Result<(), Error> {
        self.inner.create()
    }

    pub fn create_if_not_exist(&self) -> Result<(), Error> {
        self.inner.create_if_not_exist()
    }

    pub fn recreate(&self) -> Result<(), Error> {
        self.inner.recreate()
    }

    pub fn create_statement(&self) -> Result<Statement, StatementError> {
        self.inner.create_statement()
    }

    #[must_use]
    pub fn set<E>(&self, entity: &E) -> Op<'a>
    where
        E: ToFields + ?Sized,
    {
        self.inner.set(entity)
    }

    #[must_use]
    pub fn read<'d, D>(&self, index: impl FieldValue, id: impl FieldValue, dest: &'d mut D) -> Op<'d>
    where
        'a: 'd,
        D: Destination + 'd,
    {
        self.inner
            .read(&self.index_map(&index), &self.id_map(&id), dest)
    }

    /// Records under `index` whose identity is one of `ids`.
    #[must_use]
    pub fn multi_read<'d, T, D>(
        &self,
        index: impl FieldValue,
        ids: impl IntoIterator<Item = T>,
        dest: &'d mut D,
    ) -> Op<'d>
    where
        'a: 'd,
        T: FieldValue,
        D: Destination + 'd,
    {
        let mut relations = self
            .inner
            .list_of_equal_relations(&self.index_map(&index), None);
        relations.push(in_list(self.id_field(), ids));

        self.inner.table().filter(relations).read(dest)
    }

    #[must_use]
    pub fn update(&self, index: impl FieldValue, id: impl FieldValue, fields: FieldMap) -> Op<'a> {
        self.inner
            .update(&self.index_map(&index), &self.id_map(&id), fields)
    }

    #[must_use]
    pub fn delete(&self, index: impl FieldValue, id: impl FieldValue) -> Op<'a> {
        self.inner.delete(&self.index_map(&index), &self.id_map(&id))
    }

    #[must_use]
    pub fn delete_all(&self, index: impl FieldValue) -> Op<'a> {
        self.inner.delete_all(&self.index_map(&index))
    }

    /// Page through `index` starting at identity `cursor` (inclusive).
    #[must_use]
    pub fn list<'d, D>(
        &self,
        index: impl FieldValue,
        cursor: Option<Value>,
        limit: u32,
        dest: &'d mut D,
    ) -> Op<'d>
    where
        'a: 'd,
        D: Destination + 'd,
    {
        let cursor = cursor.map(|value| self.id_map(&value));

        self.inner
            .list(&self.index_map(&index), cursor.as_ref(), limit, dest)
    }

    fn index_field(&self) -> &str {
        &self.inner.index_fields()[0]
    }

    fn id_field(&self) -> &str {
        &self.inner.id_fields()[0]
    }

    fn index_map(&self, value: &impl FieldValue) -> FieldMap {
        FieldMap::from([(self.index_field().to_string(), value.to_value())])
    }

    fn id_map(&self, value: &impl FieldValue) -> FieldMap {
        FieldMap::from([(self.id_field().to_string(), value.to_value())])
    }
}
