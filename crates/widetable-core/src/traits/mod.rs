mod destination;
mod record;

pub use destination::*;
pub use record::*;

use crate::{model::column::ColumnType, value::Value};
use std::{
    collections::{BTreeMap, BTreeSet, HashMap, HashSet},
    hash::Hash,
};

///
/// FieldValue
///
/// Conversion boundary between Rust field types and store values.
///
/// `from_value` returns `None` on a type mismatch. `Value::Null` decodes to
/// the type's empty/zero value (the store's representation of an unset or
/// empty column), except for `Option<T>` which decodes it to `None`.
///

pub trait FieldValue {
    fn column_type() -> ColumnType
    where
        Self: Sized;

    fn to_value(&self) -> Value;

    #[must_use]
    fn from_value(value: &Value) -> Option<Self>
    where
        Self: Sized;
}

impl FieldValue for &str {
    fn column_type() -> ColumnType {
        ColumnType::Text
    }

    fn to_value(&self) -> Value {
        Value::Text((*self).to_string())
    }

    fn from_value(_value: &Value) -> Option<Self> {
        None
    }
}

impl FieldValue for String {
    fn column_type() -> ColumnType {
        ColumnType::Text
    }

    fn to_value(&self) -> Value {
        Value::Text(self.clone())
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Text(v) => Some(v.clone()),
            Value::Null => Some(Self::new()),
            _ => None,
        }
    }
}

impl FieldValue for bool {
    fn column_type() -> ColumnType {
        ColumnType::Boolean
    }

    fn to_value(&self) -> Value {
        Value::Bool(*self)
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Bool(v) => Some(*v),
            Value::Null => Some(false),
            _ => None,
        }
    }
}

/// Dynamic values pass straight through; as a record field they are
/// declared as `text` since no static type is known.
impl FieldValue for Value {
    fn column_type() -> ColumnType {
        ColumnType::Text
    }

    fn to_value(&self) -> Value {
        self.clone()
    }

    fn from_value(value: &Value) -> Option<Self> {
        Some(value.clone())
    }
}

// impl_field_value_int
macro_rules! impl_field_value_int {
    ( $( $type:ty => $column:ident ),* $(,)? ) => {
        $(
            impl FieldValue for $type {
                fn column_type() -> ColumnType {
                    ColumnType::$column
                }

                fn to_value(&self) -> Value {
                    Value::Int((*self).into())
                }

                fn from_value(value: &Value) -> Option<Self> {
                    match value {
                        Value::Int(v) | Value::Counter(v) => (*v).try_into().ok(),
                        Value::Null => Some(0),
                        _ => None,
                    }
                }
            }
        )*
    };
}

impl_field_value_int!(
    i8 => TinyInt,
    i16 => SmallInt,
    i32 => Int,
    i64 => BigInt,
    u16 => Int,
    u32 => BigInt,
);

impl FieldValue for f64 {
    fn column_type() -> ColumnType {
        ColumnType::Double
    }

    fn to_value(&self) -> Value {
        Value::Double(*self)
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Double(v) => Some(*v),
            Value::Null => Some(0.0),
            _ => None,
        }
    }
}

impl FieldValue for f32 {
    fn column_type() -> ColumnType {
        ColumnType::Float
    }

    fn to_value(&self) -> Value {
        Value::Double((*self).into())
    }

    #[allow(clippy::cast_possible_truncation)]
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Double(v) => Some(*v as Self),
            Value::Null => Some(0.0),
            _ => None,
        }
    }
}

/// Byte strings map to `blob`; `u8` deliberately has no scalar impl so this
/// does not overlap the generic list impl below.
impl FieldValue for Vec<u8> {
    fn column_type() -> ColumnType {
        ColumnType::Blob
    }

    fn to_value(&self) -> Value {
        Value::Blob(self.clone())
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Blob(v) => Some(v.clone()),
            Value::Null => Some(Self::new()),
            _ => None,
        }
    }
}

impl<T: FieldValue> FieldValue for Vec<T> {
    fn column_type() -> ColumnType {
        ColumnType::list(T::column_type())
    }

    fn to_value(&self) -> Value {
        Value::List(self.iter().map(FieldValue::to_value).collect())
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::List(items) | Value::Set(items) => items.iter().map(T::from_value).collect(),
            Value::Null => Some(Self::new()),
            _ => None,
        }
    }
}

impl<T: FieldValue + Ord> FieldValue for BTreeSet<T> {
    fn column_type() -> ColumnType {
        ColumnType::set(T::column_type())
    }

    fn to_value(&self) -> Value {
        Value::set_from(self.iter().map(FieldValue::to_value))
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::List(items) | Value::Set(items) => items.iter().map(T::from_value).collect(),
            Value::Null => Some(Self::new()),
            _ => None,
        }
    }
}

impl<T: FieldValue + Eq + Hash> FieldValue for HashSet<T> {
    fn column_type() -> ColumnType {
        ColumnType::set(T::column_type())
    }

    fn to_value(&self) -> Value {
        Value::set_from(self.iter().map(FieldValue::to_value))
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::List(items) | Value::Set(items) => items.iter().map(T::from_value).collect(),
            Value::Null => Some(Self::new()),
            _ => None,
        }
    }
}

impl<K: FieldValue + Ord, V: FieldValue> FieldValue for BTreeMap<K, V> {
    fn column_type() -> ColumnType {
        ColumnType::map(K::column_type(), V::column_type())
    }

    fn to_value(&self) -> Value {
        Value::map_from(self.iter().map(|(k, v)| (k.to_value(), v.to_value())))
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Map(entries) => entries
                .iter()
                .map(|(k, v)| Some((K::from_value(k)?, V::from_value(v)?)))
                .collect(),
            Value::Null => Some(Self::new()),
            _ => None,
        }
    }
}

impl<K: FieldValue + Eq + Hash, V: FieldValue> FieldValue for HashMap<K, V> {
    fn column_type() -> ColumnType {
        ColumnType::map(K::column_type(), V::column_type())
    }

    fn to_value(&self) -> Value {
        Value::map_from(self.iter().map(|(k, v)| (k.to_value(), v.to_value())))
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Map(entries) => entries
                .iter()
                .map(|(k, v)| Some((K::from_value(k)?, V::from_value(v)?)))
                .collect(),
            Value::Null => Some(Self::new()),
            _ => None,
        }
    }
}

impl<T: FieldValue> FieldValue for Option<T> {
    fn column_type() -> ColumnType {
        T::column_type()
    }

    fn to_value(&self) -> Value {
        match self {
            Some(v) => v.to_value(),
            None => Value::Null,
        }
    }

    fn from_value(value: &Value) -> Option<Self> {
        if value.is_null() {
            return Some(None);
        }

        T::from_value(value).map(Some)
    }
}

impl<T: FieldValue> FieldValue for Box<T> {
    fn column_type() -> ColumnType {
        T::column_type()
    }

    fn to_value(&self) -> Value {
        (**self).to_value()
    }

    fn from_value(value: &Value) -> Option<Self> {
        T::from_value(value).map(Self::new)
    }
}
