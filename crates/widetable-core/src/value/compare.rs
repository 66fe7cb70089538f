use crate::value::Value;
use std::cmp::Ordering;

/// Total canonical comparator used for range relations, clustering order
/// and set/map normalization.
///
/// Ordering rules:
/// 1. Canonical variant rank (`Null` sorts first)
/// 2. Variant-specific comparison for same-ranked values
///
/// Numeric variants share a rank so `Int` and `Counter` compare by value.
#[must_use]
pub fn canonical_cmp(left: &Value, right: &Value) -> Ordering {
    let rank = rank(left).cmp(&rank(right));
    if rank != Ordering::Equal {
        return rank;
    }

    #[allow(clippy::match_same_arms, clippy::cast_precision_loss)]
    match (left, right) {
        (Value::Blob(a), Value::Blob(b)) => a.cmp(b),
        (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
        (Value::Double(a), Value::Double(b)) => a.total_cmp(b),
        (Value::List(a), Value::List(b)) | (Value::Set(a), Value::Set(b)) => cmp_list(a, b),
        (Value::Map(a), Value::Map(b)) => cmp_map(a, b),
        (Value::Text(a), Value::Text(b)) => a.cmp(b),
        (Value::Timestamp(a), Value::Timestamp(b)) => a.cmp(b),
        (Value::Int(a) | Value::Counter(a), Value::Int(b) | Value::Counter(b)) => a.cmp(b),
        (Value::Int(a) | Value::Counter(a), Value::Double(b)) => (*a as f64).total_cmp(b),
        (Value::Double(a), Value::Int(b) | Value::Counter(b)) => a.total_cmp(&(*b as f64)),
        _ => Ordering::Equal,
    }
}

const fn rank(value: &Value) -> u8 {
    match value {
        Value::Null => 0,
        Value::Bool(_) => 1,
        Value::Counter(_) | Value::Double(_) | Value::Int(_) => 2,
        Value::Timestamp(_) => 3,
        Value::Text(_) => 4,
        Value::Blob(_) => 5,
        Value::List(_) => 6,
        Value::Set(_) => 7,
        Value::Map(_) => 8,
    }
}

fn cmp_list(left: &[Value], right: &[Value]) -> Ordering {
    for (a, b) in left.iter().zip(right) {
        let ord = canonical_cmp(a, b);
        if ord != Ordering::Equal {
            return ord;
        }
    }

    left.len().cmp(&right.len())
}

fn cmp_map(left: &[(Value, Value)], right: &[(Value, Value)]) -> Ordering {
    for ((ak, av), (bk, bv)) in left.iter().zip(right) {
        let ord = canonical_cmp(ak, bk).then_with(|| canonical_cmp(av, bv));
        if ord != Ordering::Equal {
            return ord;
        }
    }

    left.len().cmp(&right.len())
}
