use crate::value::Value;
use std::fmt::{self, Display};

///
/// ColumnType
///
/// Store-level column type used when generating `CREATE TABLE`.
///

#[remain::sorted]
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub enum ColumnType {
    BigInt,
    Blob,
    Boolean,
    Counter,
    Double,
    Float,
    Int,
    List(Box<Self>),
    Map(Box<Self>, Box<Self>),
    Set(Box<Self>),
    SmallInt,
    Text,
    Timestamp,
    TinyInt,
}

impl ColumnType {
    #[must_use]
    pub fn list(item: Self) -> Self {
        Self::List(Box::new(item))
    }

    #[must_use]
    pub fn set(item: Self) -> Self {
        Self::Set(Box::new(item))
    }

    #[must_use]
    pub fn map(key: Self, value: Self) -> Self {
        Self::Map(Box::new(key), Box::new(value))
    }

    /// Infer a column type from a sample value.
    ///
    /// Returns `None` for `Null`, which carries no type information.
    /// Empty containers fall back to `text` element types.
    #[must_use]
    pub fn infer(value: &Value) -> Option<Self> {
        let ty = match value {
            Value::Null => return None,
            Value::Blob(_) => Self::Blob,
            Value::Bool(_) => Self::Boolean,
            Value::Counter(_) => Self::Counter,
            Value::Double(_) => Self::Double,
            Value::Int(_) => Self::BigInt,
            Value::Text(_) => Self::Text,
            Value::Timestamp(_) => Self::Timestamp,
            Value::List(items) => Self::list(Self::infer_first(items.iter())),
            Value::Set(items) => Self::set(Self::infer_first(items.iter())),
            Value::Map(entries) => Self::map(
                Self::infer_first(entries.iter().map(|(k, _)| k)),
                Self::infer_first(entries.iter().map(|(_, v)| v)),
            ),
        };

        Some(ty)
    }

    fn infer_first<'a>(mut items: impl Iterator<Item = &'a Value>) -> Self {
        items.find_map(Self::infer).unwrap_or(Self::Text)
    }

    #[must_use]
    pub const fn is_counter(&self) -> bool {
        matches!(self, Self::Counter)
    }
}

impl Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BigInt => f.write_str("bigint"),
            Self::Blob => f.write_str("blob"),
            Self::Boolean => f.write_str("boolean"),
            Self::Counter => f.write_str("counter"),
            Self::Double => f.write_str("double"),
            Self::Float => f.write_str("float"),
            Self::Int => f.write_str("int"),
            Self::List(item) => write!(f, "list<{item}>"),
            Self::Map(key, value) => write!(f, "map<{key}, {value}>"),
            Self::Set(item) => write!(f, "set<{item}>"),
            Self::SmallInt => f.write_str("smallint"),
            Self::Text => f.write_str("text"),
            Self::Timestamp => f.write_str("timestamp"),
            Self::TinyInt => f.write_str("tinyint"),
        }
    }
}
