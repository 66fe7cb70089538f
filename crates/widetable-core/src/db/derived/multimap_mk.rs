use crate::{
    db::{
        op::Op,
        options::Options,
        relation::{Relation, eq, gte},
        statement::{Statement, StatementError},
        table::Table,
    },
    error::Error,
    traits::{Destination, ToFields},
    value::{FieldMap, Value, lookup},
};
use std::sync::Arc;

///
/// MultimapMkTable
///
/// Records partitioned by a set of index fields and clustered by a set of
/// identity fields. Lookup arguments are field maps; a field that is
/// missing, `Null` or empty text is left out of the relations, so partial
/// keys widen the read instead of matching empty values.
///

#[derive(Clone)]
pub struct MultimapMkTable<'a> {
    table: Table<'a>,
    index_fields: Arc<[String]>,
    id_fields: Arc<[String]>,
}

impl<'a> MultimapMkTable<'a> {
    pub(crate) fn new(table: Table<'a>, index_fields: &[&str], id_fields: &[&str]) -> Self {
        let lower = |fields: &[&str]| -> Arc<[String]> {
            fields.iter().map(|f| f.to_ascii_lowercase()).collect()
        };

        Self {
            table,
            index_fields: lower(index_fields),
            id_fields: lower(id_fields),
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
    pub fn index_fields(&self) -> &[String] {
        &self.index_fields
    }

    #[must_use]
    pub fn id_fields(&self) -> &[String] {
        &self.id_fields
    }

    /// New view over the base table's `with_options`; field lists are shared.
    #[must_use]
    pub fn with_options(&self, options: &Options) -> Self {
        Self {
            table: self.table.with_options(options),
            index_fields: Arc::clone(&self.index_fields),
            id_fields: Arc::clone(&self.id_fields),
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

    pub fn create_if_not_exist_statement(&self) -> Result<Statement, StatementError> {
        self.table.create_if_not_exist_statement()
    }

    #[must_use]
    pub fn set<E>(&self, entity: &E) -> Op<'a>
    where
        E: ToFields + ?Sized,
    {
        self.table.set(entity)
    }

    /// Single record by index and identity.
    #[must_use]
    pub fn read<'d, D>(&self, index: &FieldMap, id: &FieldMap, dest: &'d mut D) -> Op<'d>
    where
        'a: 'd,
        D: Destination + 'd,
    {
        self.table
            .filter(self.list_of_equal_relations(index, Some(id)))
            .read_one(dest)
    }

    /// Every record matching the supplied index and identity fields.
    #[must_use]
    pub fn multi_read<'d, D>(&self, index: &FieldMap, id: &FieldMap, dest: &'d mut D) -> Op<'d>
    where
        'a: 'd,
        D: Destination + 'd,
    {
        self.table
            .filter(self.list_of_equal_relations(index, Some(id)))
            .read(dest)
    }

    #[must_use]
    pub fn update(&self, index: &FieldMap, id: &FieldMap, fields: FieldMap) -> Op<'a> {
        self.table
            .filter(self.list_of_equal_relations(index, Some(id)))
            .update(fields)
    }

    #[must_use]
    pub fn delete(&self, index: &FieldMap, id: &FieldMap) -> Op<'a> {
        self.table
            .filter(self.list_of_equal_relations(index, Some(id)))
            .delete()
    }

    /// Every record under the index, whatever its identity.
    #[must_use]
    pub fn delete_all(&self, index: &FieldMap) -> Op<'a> {
        self.table
            .filter(self.list_of_equal_relations(index, None))
            .delete()
    }

    /// Page through the index in identity order.
    ///
    /// Each identity field supplied in `cursor` adds `field >= value`, so
    /// passing the last row of a page (or the first row of the next)
    /// resumes from there. A `limit` of zero reads without a cap.
    #[must_use]
    pub fn list<'d, D>(
        &self,
        index: &FieldMap,
        cursor: Option<&FieldMap>,
        limit: u32,
        dest: &'d mut D,
    ) -> Op<'d>
    where
        'a: 'd,
        D: Destination + 'd,
    {
        let mut relations = self.list_of_equal_relations(index, None);

        if let Some(cursor) = cursor {
            relations.extend(
                self.id_fields
                    .iter()
                    .filter_map(|field| present(cursor, field).map(|v| gte(field, v.clone()))),
            );
        }

        self.with_options(&Options::new().with_limit(limit))
            .table
            .filter(relations)
            .read(dest)
    }

    /// Equality on every supplied index field, then on every supplied
    /// identity field, in declaration order.
    #[must_use]
    pub fn list_of_equal_relations(&self, index: &FieldMap, id: Option<&FieldMap>) -> Vec<Relation> {
        let index_rel = self
            .index_fields
            .iter()
            .filter_map(|field| present(index, field).map(|v| eq(field, v.clone())));

        let id_rel = id.into_iter().flat_map(|id| {
            self.id_fields
                .iter()
                .filter_map(move |field| present(id, field).map(|v| eq(field, v.clone())))
        });

        index_rel.chain(id_rel).collect()
    }
}

fn present<'m>(map: &'m FieldMap, field: &str) -> Option<&'m Value> {
    lookup(map, field).filter(|value| !value.is_absent())
}
