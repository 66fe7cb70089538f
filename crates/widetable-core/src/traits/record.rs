use crate::{
    model::column::ColumnType,
    traits::FieldValue,
    value::{FieldMap, Value, normalize_fields},
};
use std::collections::{BTreeMap, HashMap};
use thiserror::Error as ThisError;

///
/// EntityError
///
/// A value handed in as an entity cannot be viewed as a field map.
///

#[derive(Debug, Eq, PartialEq, ThisError)]
pub enum EntityError {
    #[error("incompatible type: expected a record or a text-keyed map, found {found}")]
    IncompatibleType { found: &'static str },
}

///
/// FieldMismatch
///
/// A store value could not be converted into a record slot's Rust type.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FieldMismatch {
    pub expected: ColumnType,
    pub found: &'static str,
}

type ReadFn<R> = Box<dyn Fn(&R) -> Value + Send + Sync>;
type AssignFn<R> = Box<dyn Fn(&mut R, &Value) -> Result<(), FieldMismatch> + Send + Sync>;

///
/// FieldSlot
///
/// Accessor pair for one column of a record type.
/// Promoted slots come from a flattened (embedded) record.
///

pub struct FieldSlot<R> {
    name: String,
    column_type: ColumnType,
    promoted: bool,
    read: ReadFn<R>,
    assign: AssignFn<R>,
}

impl<R> FieldSlot<R> {
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub const fn column_type(&self) -> &ColumnType {
        &self.column_type
    }

    #[must_use]
    pub const fn is_promoted(&self) -> bool {
        self.promoted
    }

    pub fn read(&self, record: &R) -> Value {
        (self.read)(record)
    }

    pub fn assign(&self, record: &mut R, value: &Value) -> Result<(), FieldMismatch> {
        (self.assign)(record, value)
    }
}

///
/// FieldTable
///
/// Name → accessor table for a record type, built once per type.
/// Lookups are case-insensitive; embedded records are flattened into the
/// same table so decoding is a flat lookup per column.
///

pub struct FieldTable<R> {
    slots: Vec<FieldSlot<R>>,
    index: HashMap<String, usize>,
}

impl<R: 'static> FieldTable<R> {
    #[must_use]
    pub const fn builder() -> FieldTableBuilder<R> {
        FieldTableBuilder { slots: Vec::new() }
    }

    #[must_use]
    pub fn slots(&self) -> &[FieldSlot<R>] {
        &self.slots
    }

    #[must_use]
    pub fn slot(&self, name: &str) -> Option<&FieldSlot<R>> {
        self.index
            .get(&name.to_ascii_lowercase())
            .map(|&i| &self.slots[i])
    }

    /// Read every slot into a field map.
    pub fn read_all(&self, record: &R) -> FieldMap {
        self.slots
            .iter()
            .map(|slot| (slot.name.clone(), slot.read(record)))
            .collect()
    }

    #[must_use]
    pub fn column_types(&self) -> BTreeMap<String, Option<ColumnType>> {
        self.slots
            .iter()
            .map(|slot| (slot.name.clone(), Some(slot.column_type.clone())))
            .collect()
    }
}

///
/// FieldTableBuilder
///

pub struct FieldTableBuilder<R> {
    slots: Vec<FieldSlot<R>>,
}

impl<R: 'static> FieldTableBuilder<R> {
    /// Add a direct field. Names are lower-cased.
    #[must_use]
    pub fn field<T>(mut self, name: &str, get: fn(&R) -> &T, get_mut: fn(&mut R) -> &mut T) -> Self
    where
        T: FieldValue + 'static,
    {
        self.insert(FieldSlot {
            name: name.to_ascii_lowercase(),
            column_type: T::column_type(),
            promoted: false,
            read: Box::new(move |record| get(record).to_value()),
            assign: Box::new(move |record, value| {
                let decoded = T::from_value(value).ok_or_else(|| FieldMismatch {
                    expected: T::column_type(),
                    found: value.kind(),
                })?;
                *get_mut(record) = decoded;

                Ok(())
            }),
        });

        self
    }

    /// Promote every slot of an embedded record into this table.
    ///
    /// Reading through an unallocated embed yields `Null`; assigning through
    /// one allocates it first.
    #[must_use]
    pub fn flatten<E>(mut self, get: fn(&R) -> &E, get_mut: fn(&mut R) -> &mut E) -> Self
    where
        E: Embed + 'static,
    {
        let inner = <E::Record as Record>::field_table();

        for slot in inner.slots() {
            self.insert(FieldSlot {
                name: slot.name.clone(),
                column_type: slot.column_type.clone(),
                promoted: true,
                read: Box::new(move |record| {
                    get(record)
                        .embedded()
                        .map_or(Value::Null, |inner| slot.read(inner))
                }),
                assign: Box::new(move |record, value| {
                    slot.assign(get_mut(record).embedded_mut(), value)
                }),
            });
        }

        self
    }

    #[must_use]
    pub fn build(self) -> FieldTable<R> {
        let index = self
            .slots
            .iter()
            .enumerate()
            .map(|(i, slot)| (slot.name.clone(), i))
            .collect();

        FieldTable {
            slots: self.slots,
            index,
        }
    }

    // direct fields shadow promoted ones regardless of declaration order
    fn insert(&mut self, slot: FieldSlot<R>) {
        match self.slots.iter().position(|s| s.name == slot.name) {
            Some(i) if self.slots[i].promoted && !slot.promoted => self.slots[i] = slot,
            Some(_) => {}
            None => self.slots.push(slot),
        }
    }
}

///
/// Record
///
/// A struct-shaped type with a cached field table.
/// Usually derived with `#[derive(Record)]`.
///

pub trait Record: Default + Sized + 'static {
    fn field_table() -> &'static FieldTable<Self>;
}

///
/// Embed
///
/// Field types that can be flattened into a parent record: the record
/// itself, `Box<_>` of it, or `Option<_>` of either.
///

pub trait Embed {
    type Record: Record;

    fn embedded(&self) -> Option<&Self::Record>;

    fn embedded_mut(&mut self) -> &mut Self::Record;
}

impl<E: Embed> Embed for Box<E> {
    type Record = E::Record;

    fn embedded(&self) -> Option<&Self::Record> {
        (**self).embedded()
    }

    fn embedded_mut(&mut self) -> &mut Self::Record {
        (**self).embedded_mut()
    }
}

impl<E: Embed + Default> Embed for Option<E> {
    type Record = E::Record;

    fn embedded(&self) -> Option<&Self::Record> {
        self.as_ref().and_then(Embed::embedded)
    }

    fn embedded_mut(&mut self) -> &mut Self::Record {
        self.get_or_insert_with(E::default).embedded_mut()
    }
}

///
/// ToFields
///
/// Capability to present an entity as a field-name → value map.
/// Keys come back lower-cased.
///

pub trait ToFields {
    fn to_fields(&self) -> Result<FieldMap, EntityError>;

    /// Column types for table creation, inferred from values by default.
    fn column_types(&self) -> Result<BTreeMap<String, Option<ColumnType>>, EntityError> {
        Ok(self
            .to_fields()?
            .iter()
            .map(|(name, value)| (name.clone(), ColumnType::infer(value)))
            .collect())
    }
}

impl<R: Record> ToFields for R {
    fn to_fields(&self) -> Result<FieldMap, EntityError> {
        Ok(R::field_table().read_all(self))
    }

    fn column_types(&self) -> Result<BTreeMap<String, Option<ColumnType>>, EntityError> {
        Ok(R::field_table().column_types())
    }
}

impl ToFields for FieldMap {
    fn to_fields(&self) -> Result<FieldMap, EntityError> {
        Ok(normalize_fields(self.clone()))
    }
}

impl ToFields for HashMap<String, Value> {
    fn to_fields(&self) -> Result<FieldMap, EntityError> {
        Ok(self
            .iter()
            .map(|(name, value)| (name.to_ascii_lowercase(), value.clone()))
            .collect())
    }
}

impl ToFields for Value {
    fn to_fields(&self) -> Result<FieldMap, EntityError> {
        let Self::Map(entries) = self else {
            return Err(EntityError::IncompatibleType { found: self.kind() });
        };

        entries
            .iter()
            .map(|(key, value)| match key {
                Self::Text(name) => Ok((name.to_ascii_lowercase(), value.clone())),
                other => Err(EntityError::IncompatibleType {
                    found: other.kind(),
                }),
            })
            .collect()
    }
}
