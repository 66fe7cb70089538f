use crate::{
    model::{column::ColumnType, info::TableInfo, keys::Keys},
    value::Value,
    CLUSTERING_SENTINEL,
};
use std::collections::BTreeMap;

fn columns(names: &[&str]) -> BTreeMap<String, Option<ColumnType>> {
    names
        .iter()
        .map(|name| ((*name).to_string(), Some(ColumnType::Text)))
        .collect()
}

#[test]
fn keys_are_lowercased_and_ordered() {
    let keys = Keys::new(["Tag", "Region"]).clustering(["Id"]);

    assert_eq!(keys.all().collect::<Vec<_>>(), ["tag", "region", "id"]);
    assert!(keys.is_key("ID"));
    assert!(keys.is_clustering("id"));
    assert!(!keys.is_clustering("tag"));
}

#[test]
fn keys_assigned_directly_are_normalized_by_table_info() {
    let keys = Keys {
        partition_keys: vec!["UserId".into()],
        clustering_columns: vec!["When".into()],
        compound: false,
    };

    let info = TableInfo::new("ks", "events", keys, columns(&["userid", "when"]));
    assert_eq!(info.keys().partition_keys, ["userid"]);
    assert_eq!(info.keys().clustering_columns, ["when"]);
}

#[test]
fn table_info_sorts_and_lowercases_fields() {
    let info = TableInfo::new("ks", "users", Keys::new(["id"]), columns(&["Name", "id", "Age"]));

    assert_eq!(info.fields(), ["age", "id", "name"]);
    assert_eq!(info.field_types().len(), 3);
    assert!(info.has_field("NAME"));
    assert!(!info.has_field("email"));
    assert_eq!(info.keyspace(), "ks");
    assert_eq!(info.name(), "users");
}

#[test]
fn bind_uses_sentinel_only_for_clustering_columns() {
    let keys = Keys::new(["tag"]).clustering(["id"]);
    let info = TableInfo::new("ks", "t", keys, columns(&["tag", "id", "name"]));

    assert_eq!(
        info.bind("id", Value::Text(String::new())),
        Value::Text(CLUSTERING_SENTINEL.to_string())
    );
    assert_eq!(
        info.bind("tag", Value::Text(String::new())),
        Value::Text(String::new())
    );
    assert_eq!(
        info.bind("name", Value::Text(String::new())),
        Value::Text(String::new())
    );
}

#[test]
fn column_type_inference() {
    assert_eq!(ColumnType::infer(&Value::Null), None);
    assert_eq!(ColumnType::infer(&Value::Int(1)), Some(ColumnType::BigInt));
    assert_eq!(
        ColumnType::infer(&Value::List(Vec::new())),
        Some(ColumnType::list(ColumnType::Text))
    );
    assert_eq!(
        ColumnType::infer(&Value::Map(vec![(Value::Text("k".into()), Value::Bool(true))])),
        Some(ColumnType::map(ColumnType::Text, ColumnType::Boolean))
    );
}

#[test]
fn column_type_renders_cql_names() {
    let ty = ColumnType::map(ColumnType::Text, ColumnType::list(ColumnType::BigInt));

    assert_eq!(ty.to_string(), "map<text, list<bigint>>");
    assert_eq!(ColumnType::set(ColumnType::Blob).to_string(), "set<blob>");
    assert!(ColumnType::Counter.is_counter());
}
