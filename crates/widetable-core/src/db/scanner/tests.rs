use super::*;
use crate::{CLUSTERING_SENTINEL, db::executor::Rows, error::ErrorClass};
use proptest::prelude::*;
use std::collections::BTreeMap;
use widetable_derive::Record;

#[derive(Clone, Debug, Default, PartialEq, Record)]
struct Account {
    id: String,
    name: String,
}

#[derive(Clone, Debug, Default, PartialEq, Record)]
struct Tangent {
    foo: String,
    bar: String,
}

#[derive(Clone, Debug, Default, PartialEq, Record)]
struct Empty;

#[derive(Clone, Debug, Default, PartialEq, Record)]
struct BadTypes {
    id: i64,
    name: i32,
}

fn account(id: &str, name: &str) -> Account {
    Account {
        id: id.into(),
        name: name.into(),
    }
}

fn expected() -> Vec<Account> {
    vec![account("acc_abcd1", "John"), account("acc_abcd2", "Jane")]
}

fn results() -> Vec<FieldMap> {
    vec![
        field_map! { "id" => "acc_abcd1", "name" => "John", "created" => "2018-05-01 19:00:00+0000" },
        field_map! { "id" => "acc_abcd2", "name" => "Jane", "created" => "2018-05-02 20:00:00+0000" },
    ]
}

fn stmt() -> SelectStatement {
    SelectStatement::new("test", "bench", ["id", "name", "created"])
}

fn scan<D: Destination>(dest: &mut D) -> Result<usize, Error> {
    let stmt = stmt();
    let mut iter = Rows::new(results());

    Scanner::new(&stmt, dest).scan_iter(&mut iter)
}

fn is_engine_error(err: &Error, message: &str) -> bool {
    err.engine_error().is_some_and(|e| e.to_string() == message)
}

//
// Sequence destinations
//

#[test]
fn scan_into_vec() {
    let mut rows: Vec<Account> = Vec::new();

    assert_eq!(scan(&mut rows).unwrap(), 2);
    assert_eq!(rows, expected());
}

#[test]
fn scan_into_boxed_vec() {
    let mut rows: Box<Vec<Account>> = Box::default();

    assert_eq!(scan(&mut rows).unwrap(), 2);
    assert_eq!(*rows, expected());
}

#[test]
fn scan_replaces_prepopulated_vec() {
    let mut rows = vec![account("acc_abcd3", "Joe")];

    assert_eq!(scan(&mut rows).unwrap(), 2);
    assert_eq!(rows, expected());
}

#[test]
fn scan_allocates_unset_reference_chain_to_vec() {
    let mut rows: Option<Option<Box<Vec<Account>>>> = None;

    assert_eq!(scan(&mut rows).unwrap(), 2);

    let inner = rows.flatten().expect("chain allocated");
    assert_eq!(*inner, expected());
}

#[test]
fn scan_into_vec_of_boxes() {
    let mut rows: Vec<Box<Account>> = Vec::new();

    assert_eq!(scan(&mut rows).unwrap(), 2);
    assert_eq!(*rows[0], expected()[0]);
    assert_eq!(*rows[1], expected()[1]);
}

#[test]
fn scan_into_tangent_struct_leaves_defaults() {
    let mut rows: Vec<Tangent> = Vec::new();

    assert_eq!(scan(&mut rows).unwrap(), 2);
    assert_eq!(rows, vec![Tangent::default(), Tangent::default()]);
}

#[test]
fn scan_into_struct_without_fields() {
    let mut rows: Vec<Empty> = Vec::new();

    assert_eq!(scan(&mut rows).unwrap(), 2);
    assert_eq!(rows, vec![Empty, Empty]);
}

#[test]
fn scan_reports_type_mismatch_as_decode_error() {
    let mut rows: Vec<BadTypes> = Vec::new();

    let err = scan(&mut rows).unwrap_err();
    assert_eq!(err.class(), ErrorClass::Decode);
    assert!(matches!(
        err,
        Error::Scan(ScanError::Decode { ref field, found: "text", .. }) if field == "id"
    ));
}

#[test]
fn decode_error_keeps_rows_decoded_before_it() {
    let stmt = SelectStatement::new("test", "bench", ["id", "name"]);
    let mut iter = Rows::new(vec![
        field_map! { "id" => "a", "name" => "John" },
        field_map! { "id" => "b", "name" => 5_i64 },
    ]);
    let mut rows: Vec<Account> = Vec::new();

    let mut scanner = Scanner::new(&stmt, &mut rows);
    assert!(scanner.scan_iter(&mut iter).is_err());
    assert_eq!(scanner.rows_read(), 1);
    assert_eq!(rows, vec![account("a", "John")]);
}

#[test]
fn sequence_scan_returns_iterator_error_verbatim() {
    let stmt = stmt();
    let mut iter = Rows::failing(Vec::new(), "Something went baaaad");
    let mut rows: Vec<Tangent> = Vec::new();

    let mut scanner = Scanner::new(&stmt, &mut rows);
    let err = scanner.scan_iter(&mut iter).unwrap_err();

    assert!(is_engine_error(&err, "Something went baaaad"));
    assert_eq!(scanner.rows_read(), 0);
}

#[test]
fn sequence_scan_over_zero_rows_is_empty_not_error() {
    let stmt = stmt();
    let mut iter = Rows::new(Vec::new());
    let mut rows = vec![account("x", "y")];

    assert_eq!(Scanner::new(&stmt, &mut rows).scan_iter(&mut iter).unwrap(), 0);
    assert!(rows.is_empty());
}

//
// Single destinations
//

#[test]
fn scan_into_struct_takes_first_row() {
    let mut row = Account::default();

    assert_eq!(scan(&mut row).unwrap(), 1);
    assert_eq!(row, expected()[0]);
}

#[test]
fn scan_into_boxed_struct() {
    let mut row = Box::new(Account::default());

    assert_eq!(scan(&mut row).unwrap(), 1);
    assert_eq!(*row, expected()[0]);
}

#[test]
fn scan_allocates_unset_reference() {
    let mut row: Option<Box<Account>> = None;

    assert_eq!(scan(&mut row).unwrap(), 1);
    assert_eq!(row.as_deref(), Some(&expected()[0]));
}

#[test]
fn scan_allocates_deep_reference_chain() {
    let mut row: Option<Box<Option<Box<Account>>>> = None;

    assert_eq!(scan(&mut row).unwrap(), 1);

    let inner = row.and_then(|b| *b).expect("chain allocated");
    assert_eq!(*inner, expected()[0]);
}

#[test]
fn sequential_single_scans_share_one_iterator() {
    let stmt = stmt();
    let mut iter = Rows::new(results());

    let mut first: Option<Box<Account>> = None;
    let mut second: Option<Option<Option<Box<Account>>>> = None;

    assert_eq!(Scanner::new(&stmt, &mut first).scan_iter(&mut iter).unwrap(), 1);
    assert_eq!(Scanner::new(&stmt, &mut second).scan_iter(&mut iter).unwrap(), 1);

    assert_eq!(first.as_deref(), Some(&expected()[0]));
    assert_eq!(
        second.flatten().flatten().as_deref(),
        Some(&expected()[1])
    );
}

#[test]
fn single_scan_over_zero_rows_is_not_found() {
    let stmt = stmt();
    let mut iter = Rows::new(Vec::new());
    let mut row: Option<Box<Account>> = None;

    let err = Scanner::new(&stmt, &mut row)
        .scan_iter(&mut iter)
        .unwrap_err();

    assert!(err.is_not_found());
    assert_eq!(err.class(), ErrorClass::NotFound);
    assert_eq!(err.to_string(), "no rows returned from bench");
}

#[test]
fn single_scan_returns_iterator_error_verbatim() {
    let stmt = stmt();
    let mut iter = Rows::failing(Vec::new(), "Something went baaaad");
    let mut row: Option<Box<Account>> = None;

    let mut scanner = Scanner::new(&stmt, &mut row);
    let err = scanner.scan_iter(&mut iter).unwrap_err();

    assert!(!err.is_not_found());
    assert!(is_engine_error(&err, "Something went baaaad"));
    assert_eq!(scanner.rows_read(), 0);
}

#[test]
fn single_scan_keeps_fields_absent_from_row() {
    let stmt = SelectStatement::new("test", "bench", ["id"]);
    let mut iter = Rows::new(vec![field_map! { "id" => "acc_abcd9" }]);
    let mut row = account("old", "Kept");

    Scanner::new(&stmt, &mut row).scan_iter(&mut iter).unwrap();
    assert_eq!(row, account("acc_abcd9", "Kept"));
}

#[test]
fn column_names_match_case_insensitively() {
    let stmt = SelectStatement::new("test", "bench", Vec::<String>::new());
    let mut iter = Rows::new(vec![field_map! { "ID" => "a" }]);
    let mut row = Account::default();

    Scanner::new(&stmt, &mut row).scan_iter(&mut iter).unwrap();
    assert_eq!(row.id, "a");
}

//
// Containers, embedding, sentinels
//

#[derive(Clone, Debug, Default, PartialEq, Record)]
struct CompositeAccount {
    id: String,
    name: String,
    metadata: BTreeMap<String, String>,
    tags: Vec<String>,
}

#[test]
fn null_containers_decode_as_allocated_empty() {
    let stmt = SelectStatement::new("test", "bench", ["id", "name", "metadata", "tags"]);
    let mut iter = Rows::new(vec![
        field_map! { "id" => "acc_abcd1", "name" => "John", "metadata" => Value::Null, "tags" => Value::Null },
        field_map! { "id" => "acc_abcd2", "name" => "Jane" },
    ]);
    let mut rows: Vec<CompositeAccount> = Vec::new();

    assert_eq!(Scanner::new(&stmt, &mut rows).scan_iter(&mut iter).unwrap(), 2);
    assert_eq!(rows[0].id, "acc_abcd1");
    assert!(rows[0].metadata.is_empty());
    assert!(rows[0].tags.is_empty());
    assert_eq!(rows[1].id, "acc_abcd2");
    assert!(rows[1].metadata.is_empty());
    assert!(rows[1].tags.is_empty());
}

#[derive(Clone, Debug, Default, PartialEq, Record)]
struct Embedded {
    #[record(flatten)]
    account: Option<Box<Account>>,
    created: String,
}

#[test]
fn embedded_fields_are_promoted() {
    let mut row = Embedded::default();

    assert_eq!(scan(&mut row).unwrap(), 1);
    assert_eq!(row.account.as_deref(), Some(&expected()[0]));
    assert_eq!(row.created, "2018-05-01 19:00:00+0000");
}

#[derive(Clone, Debug, Default, PartialEq, Record)]
struct SentinelAccount {
    id: String,
    name: String,
    metadata: Vec<u8>,
}

fn sentinel_rows() -> Vec<FieldMap> {
    vec![
        field_map! {
            "id" => "acc_abcd1",
            "name" => CLUSTERING_SENTINEL,
            "metadata" => Vec::<u8>::new(),
        },
        field_map! {
            "id" => "acc_abcd2",
            "name" => "Jane",
            "metadata" => CLUSTERING_SENTINEL.as_bytes().to_vec(),
        },
    ]
}

#[test]
fn sentinels_are_stripped_in_sequences() {
    let stmt = SelectStatement::new("test", "bench", ["id", "name", "metadata"]);
    let mut iter = Rows::new(sentinel_rows());
    let mut rows: Vec<Box<SentinelAccount>> = Vec::new();

    assert_eq!(Scanner::new(&stmt, &mut rows).scan_iter(&mut iter).unwrap(), 2);
    assert_eq!(rows[0].id, "acc_abcd1");
    assert_eq!(rows[0].name, "");
    assert!(rows[0].metadata.is_empty());
    assert_eq!(rows[1].id, "acc_abcd2");
    assert_eq!(rows[1].name, "Jane");
    assert!(rows[1].metadata.is_empty());
}

#[test]
fn sentinels_are_stripped_in_single_records() {
    let stmt = SelectStatement::new("test", "bench", ["id", "name", "metadata"]);
    let mut iter = Rows::new(sentinel_rows());
    let mut row = SentinelAccount::default();

    assert_eq!(Scanner::new(&stmt, &mut row).scan_iter(&mut iter).unwrap(), 1);
    assert_eq!(row.id, "acc_abcd1");
    assert_eq!(row.name, "");
    assert!(row.metadata.is_empty());
}

proptest! {
    #[test]
    fn sequence_length_always_matches_row_count(
        existing in 0usize..8,
        ids in prop::collection::vec("[a-z0-9]{1,8}", 0..12),
    ) {
        let stmt = SelectStatement::new("test", "bench", ["id", "name"]);
        let rows = ids.iter().map(|id| field_map! { "id" => id.as_str(), "name" => "n" }).collect();
        let mut iter = Rows::new(rows);
        let mut dest = vec![account("stale", "stale"); existing];

        let read = Scanner::new(&stmt, &mut dest).scan_iter(&mut iter).unwrap();

        prop_assert_eq!(read, ids.len());
        prop_assert_eq!(dest.len(), ids.len());
        for (row, id) in dest.iter().zip(&ids) {
            prop_assert_eq!(&row.id, id);
        }
    }

    #[test]
    fn stored_sentinel_and_stored_empty_decode_alike(name in ".{0,16}") {
        let stmt = SelectStatement::new("test", "bench", ["id", "name"]);
        let stored = Value::Text(name.clone()).with_sentinel();
        let mut iter = Rows::new(vec![field_map! { "id" => "a", "name" => stored }]);
        let mut row = Account::default();

        Scanner::new(&stmt, &mut row).scan_iter(&mut iter).unwrap();

        prop_assert_eq!(row.name, name);
    }
}
