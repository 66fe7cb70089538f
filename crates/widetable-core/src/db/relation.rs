use crate::{
    model::{info::TableInfo, keys::Keys},
    traits::FieldValue,
    value::{FieldMap, Value, canonical_cmp, lookup},
};
use std::{
    cmp::Ordering,
    collections::HashSet,
    fmt::{self, Display},
};

///
/// Comparator
///

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Comparator {
    Eq,
    Gt,
    Gte,
    In,
    Lt,
    Lte,
}

impl Display for Comparator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let op = match self {
            Self::Eq => "=",
            Self::Gt => ">",
            Self::Gte => ">=",
            Self::In => "IN",
            Self::Lt => "<",
            Self::Lte => "<=",
        };
        f.write_str(op)
    }
}

///
/// Relation
///
/// Predicate over one column. Purely descriptive: building one never
/// touches the engine.
///

#[derive(Clone, Debug, PartialEq)]
pub struct Relation {
    field: String,
    comparator: Comparator,
    terms: Vec<Value>,
}

impl Relation {
    #[must_use]
    pub fn new(field: &str, comparator: Comparator, terms: Vec<Value>) -> Self {
        Self {
            field: field.to_ascii_lowercase(),
            comparator,
            terms,
        }
    }

    #[must_use]
    pub fn field(&self) -> &str {
        &self.field
    }

    #[must_use]
    pub const fn comparator(&self) -> Comparator {
        self.comparator
    }

    #[must_use]
    pub fn terms(&self) -> &[Value] {
        &self.terms
    }

    /// CQL fragment with one bind marker per term.
    #[must_use]
    pub fn cql(&self) -> String {
        match self.comparator {
            Comparator::In => {
                let markers = vec!["?"; self.terms.len()].join(", ");
                format!("{} IN ({markers})", self.field)
            }
            op => format!("{} {op} ?", self.field),
        }
    }

    /// Evaluate the predicate against a stored column value.
    #[must_use]
    pub fn accepts(&self, value: &Value) -> bool {
        let cmp = |term: &Value| canonical_cmp(value, term);

        match (self.comparator, self.terms.first()) {
            (Comparator::In, _) => self.terms.iter().any(|t| cmp(t) == Ordering::Equal),
            (_, None) => false,
            (Comparator::Eq, Some(t)) => cmp(t) == Ordering::Equal,
            (Comparator::Gt, Some(t)) => cmp(t) == Ordering::Greater,
            (Comparator::Gte, Some(t)) => cmp(t) != Ordering::Less,
            (Comparator::Lt, Some(t)) => cmp(t) == Ordering::Less,
            (Comparator::Lte, Some(t)) => cmp(t) != Ordering::Greater,
        }
    }

    /// Apply the table's binding rules (clustering sentinel) to every term.
    #[must_use]
    pub(crate) fn bound(self, info: &TableInfo) -> Self {
        let terms = self
            .terms
            .into_iter()
            .map(|term| info.bind(&self.field, term))
            .collect();

        Self { terms, ..self }
    }
}

impl Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.cql())
    }
}

fn single(field: &str, comparator: Comparator, term: &impl FieldValue) -> Relation {
    Relation::new(field, comparator, vec![term.to_value()])
}

#[must_use]
pub fn eq(field: &str, term: impl FieldValue) -> Relation {
    single(field, Comparator::Eq, &term)
}

#[must_use]
pub fn gt(field: &str, term: impl FieldValue) -> Relation {
    single(field, Comparator::Gt, &term)
}

#[must_use]
pub fn gte(field: &str, term: impl FieldValue) -> Relation {
    single(field, Comparator::Gte, &term)
}

#[must_use]
pub fn lt(field: &str, term: impl FieldValue) -> Relation {
    single(field, Comparator::Lt, &term)
}

#[must_use]
pub fn lte(field: &str, term: impl FieldValue) -> Relation {
    single(field, Comparator::Lte, &term)
}

#[must_use]
pub fn in_list<T: FieldValue>(field: &str, terms: impl IntoIterator<Item = T>) -> Relation {
    Relation::new(
        field,
        Comparator::In,
        terms.into_iter().map(|t| t.to_value()).collect(),
    )
}

///
/// relations
///
/// One equality per key field (partition keys, then clustering columns)
/// using the matching value from `values`; a missing value binds `Null`.
///

#[must_use]
pub fn relations(keys: &Keys, values: &FieldMap) -> Vec<Relation> {
    keys.all()
        .map(|key| {
            let term = lookup(values, key).cloned().unwrap_or(Value::Null);
            Relation::new(key, Comparator::Eq, vec![term])
        })
        .collect()
}

///
/// remove_fields
///
/// Copy of `map` without the excluded fields (case-insensitive), with
/// lower-cased names.
///

#[must_use]
pub fn remove_fields<S: AsRef<str>>(map: &FieldMap, excluded: &[S]) -> FieldMap {
    let excluded: HashSet<String> = excluded
        .iter()
        .map(|name| name.as_ref().to_ascii_lowercase())
        .collect();

    map.iter()
        .map(|(name, value)| (name.to_ascii_lowercase(), value))
        .filter(|(name, _)| !excluded.contains(name))
        .map(|(name, value)| (name, value.clone()))
        .collect()
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relations_follow_declared_key_order() {
        let keys = Keys::new(["Tag"]).clustering(["Id"]);
        let values = crate::field_map! { "id" => "33", "tag" => "A", "name" => "Joe" };

        let rels = relations(&keys, &values);

        assert_eq!(rels, vec![eq("tag", "A"), eq("id", "33")]);
    }

    #[test]
    fn relations_bind_null_for_missing_keys() {
        let keys = Keys::new(["id"]);

        let rels = relations(&keys, &FieldMap::new());

        assert_eq!(rels[0].terms(), &[Value::Null]);
    }

    #[test]
    fn remove_fields_is_case_insensitive() {
        let values = crate::field_map! { "Id" => "1", "NAME" => "Joe", "tag" => "A" };

        let rest = remove_fields(&values, &["id", "Tag"]);

        assert_eq!(rest, crate::field_map! { "name" => "Joe" });
    }

    #[test]
    fn cql_renders_each_comparator() {
        assert_eq!(eq("a", 1).cql(), "a = ?");
        assert_eq!(gte("a", 1).cql(), "a >= ?");
        assert_eq!(lt("a", 1).cql(), "a < ?");
        assert_eq!(in_list("A", [1, 2, 3]).cql(), "a IN (?, ?, ?)");
    }

    #[test]
    fn accepts_compares_canonically() {
        assert!(gte("id", "33").accepts(&Value::from("34")));
        assert!(gte("id", "33").accepts(&Value::from("33")));
        assert!(!gt("id", "33").accepts(&Value::from("33")));
        assert!(lte("n", 5).accepts(&Value::Int(5)));
        assert!(in_list("n", [1, 2]).accepts(&Value::Int(2)));
        assert!(!in_list::<i32>("n", []).accepts(&Value::Int(2)));
        assert!(eq("n", 2).accepts(&Value::Counter(2)));
    }
}
