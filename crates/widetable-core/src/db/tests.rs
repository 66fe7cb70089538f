use crate::{
    config::KeySpaceConfig,
    db::{
        KeySpace,
        memory::{MemoryError, MemoryExecutor},
        op::OpError,
        options::{ClusteringOrderColumn, ColumnDirection, Options},
        relation::{eq, in_list},
        statement::{Statement, StatementError},
    },
    error::{Error, ErrorClass},
    model::keys::Keys,
    obs::{MetricsEvent, MetricsSink, metrics_report, metrics_reset_all},
    types::Counter,
    value::Value,
};
use proptest::prelude::*;
use std::{
    collections::BTreeMap,
    io,
    sync::{Arc, Mutex},
};
use widetable_derive::Record;

#[derive(Clone, Debug, Default, PartialEq, Record)]
struct User {
    id: String,
    name: String,
    age: i32,
    emails: Vec<String>,
    attrs: BTreeMap<String, String>,
}

#[derive(Clone, Debug, Default, PartialEq, Record)]
struct Tagged {
    id: String,
    tags: Vec<String>,
    meta: BTreeMap<String, String>,
}

#[derive(Debug, Default, Record)]
struct Named {
    name: String,
    note: String,
}

#[derive(Clone, Debug, Default, PartialEq, Record)]
struct PageViews {
    page: String,
    views: Counter,
}

fn user(id: &str, name: &str) -> User {
    User {
        id: id.into(),
        name: name.into(),
        age: 30,
        emails: vec![format!("{name}@example.com")],
        attrs: BTreeMap::from([("plan".to_string(), "pro".to_string())]),
    }
}

fn users<'a>(ks: &KeySpace<'a>) -> crate::db::table::Table<'a> {
    ks.table("users", &User::default(), Keys::new(["id"]))
}

//
// Set: insert vs update
//

#[test]
fn set_with_payload_is_an_update_keyed_on_the_entity() {
    let engine = MemoryExecutor::new();
    let ks = KeySpace::new("ks", &engine);

    let stmts = users(&ks).set(&user("1", "ann")).statements();

    assert_eq!(stmts.len(), 1);
    assert_eq!(
        stmts[0].query(),
        "UPDATE ks.users SET age = ?, attrs = ?, emails = ?, name = ? WHERE id = ?"
    );
    assert_eq!(stmts[0].values().last(), Some(&Value::Text("1".into())));
}

#[test]
fn set_with_only_empty_containers_is_an_insert() {
    let engine = MemoryExecutor::new();
    let ks = KeySpace::new("ks", &engine);
    let table = ks.table("tagged", &Tagged::default(), Keys::new(["id"]));

    let stmts = table
        .set(&Tagged {
            id: "1".into(),
            ..Tagged::default()
        })
        .statements();

    assert!(matches!(stmts[0], Statement::Insert(_)));
    assert_eq!(
        stmts[0].query(),
        "INSERT INTO ks.tagged (id, meta, tags) VALUES (?, ?, ?)"
    );
}

#[test]
fn set_with_only_key_fields_is_an_insert() {
    let engine = MemoryExecutor::new();
    let ks = KeySpace::new("ks", &engine);
    let table = ks.table(
        "keys_only",
        &field_map! { "a" => "", "b" => "" },
        Keys::new(["a"]).clustering(["b"]),
    );

    let stmts = table.set(&field_map! { "A" => "x", "B" => "" }).statements();

    let Statement::Insert(insert) = &stmts[0] else {
        panic!("expected insert, got {}", stmts[0]);
    };
    assert_eq!(
        insert.fields().get("b"),
        Some(&Value::Text(crate::CLUSTERING_SENTINEL.to_string()))
    );
}

#[test]
#[should_panic(expected = "set: incompatible type")]
fn set_panics_on_incompatible_entity() {
    let engine = MemoryExecutor::new();
    let ks = KeySpace::new("ks", &engine);

    let _ = users(&ks).set(&Value::Int(3));
}

proptest! {
    #[test]
    fn empty_container_payloads_never_update(
        id in "[a-z]{1,6}",
        with_tags in any::<bool>(),
    ) {
        let engine = MemoryExecutor::new();
        let ks = KeySpace::new("ks", &engine);
        let table = ks.table("tagged", &Tagged::default(), Keys::new(["id"]));

        let entity = Tagged { id, ..Tagged::default() };
        let stmts = if with_tags {
            table.set(&entity).statements()
        } else {
            table.set(&field_map! { "id" => entity.id.as_str() }).statements()
        };

        prop_assert!(matches!(stmts[0], Statement::Insert(_)));
    }

    #[test]
    fn set_then_read_one_round_trips(
        name in "[a-zA-Z ]{0,12}",
        age in any::<i32>(),
        emails in prop::collection::vec("[a-z]{1,8}", 0..4),
        attrs in prop::collection::btree_map("[a-z]{1,4}", "[a-z]{0,4}", 0..3),
    ) {
        let engine = MemoryExecutor::new();
        let ks = KeySpace::new("ks", &engine);
        let table = users(&ks);
        table.create().unwrap();

        let entity = User { id: "u1".into(), name, age, emails, attrs };
        table.set(&entity).run().unwrap();

        let mut back = User::default();
        table.filter(vec![eq("id", "u1")]).read_one(&mut back).run().unwrap();

        prop_assert_eq!(back, entity);
    }
}

//
// Reads
//

#[test]
fn multi_row_read_of_nothing_is_empty_not_error() {
    let engine = MemoryExecutor::new();
    let ks = KeySpace::new("ks", &engine);
    let table = users(&ks);
    table.create().unwrap();

    let mut rows = vec![user("stale", "x")];
    table
        .filter(vec![eq("id", "nobody")])
        .read(&mut rows)
        .run()
        .unwrap();
    assert!(rows.is_empty());

    let mut one = User::default();
    let err = table
        .filter(vec![eq("id", "nobody")])
        .read_one(&mut one)
        .run()
        .unwrap_err();
    assert!(err.is_not_found());
}

#[test]
fn empty_clustering_value_round_trips_through_sentinel() {
    let engine = MemoryExecutor::new();
    let ks = KeySpace::new("ks", &engine);
    let keyed = ks.table(
        "names",
        &field_map! { "org" => "", "name" => "", "note" => "" },
        Keys::new(["org"]).clustering(["name"]),
    );
    keyed.create().unwrap();

    keyed
        .set(&field_map! { "org" => "o", "name" => "", "note" => "blank" })
        .run()
        .unwrap();

    let mut row = Named::default();
    keyed
        .filter(vec![eq("org", "o"), eq("name", "")])
        .read_one(&mut row)
        .run()
        .unwrap();

    assert_eq!(row.name, "");
    assert_eq!(row.note, "blank");
}

#[test]
fn read_options_project_order_and_limit() {
    let engine = MemoryExecutor::new();
    let ks = KeySpace::new("ks", &engine);
    let table = ks
        .table("events", &User::default(), Keys::new(["name"]).clustering(["id"]))
        .with_options(&Options::new().with_clustering_order([ClusteringOrderColumn::new(
            ColumnDirection::Desc,
            "id",
        )]));
    table.create().unwrap();

    for id in ["1", "2", "3"] {
        table.set(&user(id, "ann")).run().unwrap();
    }

    let mut rows: Vec<User> = Vec::new();
    table
        .filter(vec![eq("name", "ann")])
        .read(&mut rows)
        .with_options(&Options::new().with_limit(2).with_select(["id"]))
        .run()
        .unwrap();

    assert_eq!(rows.iter().map(|u| u.id.as_str()).collect::<Vec<_>>(), ["3", "2"]);
    assert!(rows.iter().all(|u| u.name.is_empty() && u.age == 0));

    let Some(Statement::Select(select)) = engine.statements().pop() else {
        panic!("last statement was not a select");
    };
    assert_eq!(
        select.query(),
        "SELECT id FROM ks.events WHERE name = ? ORDER BY id DESC LIMIT 2"
    );
}

#[test]
fn engine_errors_are_returned_verbatim() {
    let engine = MemoryExecutor::new();
    let ks = KeySpace::new("ks", &engine);
    let table = users(&ks);
    table.create().unwrap();

    engine.fail_next("node down");
    let mut rows: Vec<User> = Vec::new();
    let err = table.filter(Vec::new()).read(&mut rows).run().unwrap_err();

    assert_eq!(err.class(), ErrorClass::Engine);
    let inner = err.engine_error().and_then(|e| e.downcast_ref::<MemoryError>());
    assert_eq!(inner, Some(&MemoryError::Injected("node down".into())));
}

//
// Updates, counters, deletes
//

#[test]
fn filter_update_and_delete() {
    let engine = MemoryExecutor::new();
    let ks = KeySpace::new("ks", &engine);
    let table = users(&ks);
    table.create().unwrap();
    table.set(&user("1", "ann")).run().unwrap();
    table.set(&user("2", "bob")).run().unwrap();

    table
        .filter(vec![eq("id", "1")])
        .update(field_map! { "Name" => "anna", "age" => 31_i64 })
        .run()
        .unwrap();

    let mut one = User::default();
    table.filter(vec![eq("id", "1")]).read_one(&mut one).run().unwrap();
    assert_eq!((one.name.as_str(), one.age), ("anna", 31));

    table
        .filter(vec![in_list("id", ["1", "2"])])
        .delete()
        .run()
        .unwrap();

    let mut rows: Vec<User> = Vec::new();
    table.filter(Vec::new()).read(&mut rows).run().unwrap();
    assert!(rows.is_empty());
}

#[test]
fn counters_increment_instead_of_overwrite() {
    let engine = MemoryExecutor::new();
    let ks = KeySpace::new("ks", &engine);
    let table = ks.table("views", &PageViews::default(), Keys::new(["page"]));
    table.create().unwrap();

    let hit = PageViews {
        page: "/".into(),
        views: Counter(3),
    };
    assert_eq!(
        table.set(&hit).statements()[0].query(),
        "UPDATE ks.views SET views = views + ? WHERE page = ?"
    );

    table.set(&hit).run().unwrap();
    table.set(&hit).run().unwrap();
    table
        .filter(vec![eq("page", "/")])
        .update(field_map! { "views" => Counter(-1) })
        .run()
        .unwrap();

    let mut row = PageViews::default();
    table.filter(vec![eq("page", "/")]).read_one(&mut row).run().unwrap();
    assert_eq!(row.views, Counter(5));
}

//
// Ops
//

#[test]
fn ops_batch_and_run_atomically() {
    let engine = MemoryExecutor::new();
    let ks = KeySpace::new("ks", &engine);
    let table = users(&ks);
    table.create().unwrap();

    let op = table.set(&user("1", "ann")).add(table.set(&user("2", "bob")));
    assert_eq!(op.len(), 2);
    op.run_atomically().unwrap();
    assert_eq!(engine.rows("ks", "users").unwrap().len(), 2);

    let before = engine.statements().len();
    let mut rows: Vec<User> = Vec::new();
    let err = table
        .set(&user("3", "cy"))
        .add(table.filter(Vec::new()).read(&mut rows))
        .run_atomically()
        .unwrap_err();

    assert!(matches!(err, Error::Op(OpError::AtomicRead)));
    assert_eq!(engine.statements().len(), before);
}

#[test]
fn preflight_rejects_unknown_fields() {
    let engine = MemoryExecutor::new();
    let ks = KeySpace::new("ks", &engine);
    let table = users(&ks);

    let op = table
        .filter(vec![eq("nickname", "x")])
        .update(field_map! { "name" => "y" });
    let err = op.preflight().unwrap_err();
    assert!(matches!(
        err,
        Error::Op(OpError::UnknownField { ref field, .. }) if field == "nickname"
    ));
    assert_eq!(err.class(), ErrorClass::InvalidInput);

    assert!(table.set(&user("1", "ann")).preflight().is_ok());
    assert!(engine.statements().is_empty());
}

#[test]
fn op_options_apply_ttl() {
    let engine = MemoryExecutor::new();
    let ks = KeySpace::new("ks", &engine);

    let stmts = users(&ks)
        .set(&user("1", "ann"))
        .with_options(&Options::new().with_ttl(60))
        .statements();

    assert!(stmts[0].query().starts_with("UPDATE ks.users USING TTL 60 SET"));
}

//
// Table lifecycle
//

#[test]
fn with_options_returns_new_table() {
    let engine = MemoryExecutor::new();
    let ks = KeySpace::new("ks", &engine);
    let table = users(&ks);

    let renamed = table.with_options(&Options::new().with_table_name("people"));

    assert_eq!(renamed.name(), "people");
    assert_eq!(table.name(), "users");
    assert_eq!(
        renamed.set(&user("1", "a")).statements()[0].table(),
        "people"
    );
}

#[test]
fn catalogue_create_exists_recreate() {
    let engine = MemoryExecutor::new();
    let ks = KeySpace::new("ks", &engine);
    let table = users(&ks);

    assert!(!ks.exists("users").unwrap());
    table.create_if_not_exist().unwrap();
    table.create_if_not_exist().unwrap();
    assert!(ks.exists("USERS").unwrap());
    assert_eq!(ks.tables().unwrap(), ["users"]);

    table.set(&user("1", "ann")).run().unwrap();
    table.recreate().unwrap();
    assert!(engine.rows("ks", "users").unwrap().is_empty());

    assert!(table.create().is_err());
}

#[test]
fn recreate_stops_when_existence_check_fails() {
    let engine = MemoryExecutor::new();
    let ks = KeySpace::new("ks", &engine);
    let table = users(&ks);

    engine.fail_next("catalogue unavailable");
    assert_eq!(table.recreate().unwrap_err().class(), ErrorClass::Engine);
    assert!(!ks.exists("users").unwrap());
}

#[test]
fn create_rejects_keys_outside_the_field_set() {
    let engine = MemoryExecutor::new();
    let ks = KeySpace::new("ks", &engine);
    let table = ks.table("users", &User::default(), Keys::new(["email"]));

    let err = table.create().unwrap_err();
    assert!(matches!(
        err,
        Error::Statement(StatementError::UnknownKey { ref key, .. }) if key == "email"
    ));
    assert!(engine.statements().is_empty());
}

#[test]
fn config_defaults_flow_into_tables() {
    let engine = MemoryExecutor::new();
    let config = KeySpaceConfig::from_toml_str(
        r#"
        keyspace = "app"

        [defaults]
        compact_storage = true
        "#,
    )
    .unwrap();
    let ks = KeySpace::from_config(&engine, &config);

    let stmt = users(&ks).create_statement().unwrap();
    assert!(stmt.query().ends_with("WITH COMPACT STORAGE"));
    assert_eq!(stmt.keyspace(), "app");
}

//
// Observability
//

struct Capture(Arc<Mutex<Vec<u8>>>);

impl io::Write for Capture {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn captured_logs(f: impl FnOnce()) -> String {
    let buf = Arc::new(Mutex::new(Vec::new()));
    let writer = Arc::clone(&buf);
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_ansi(false)
        .with_writer(move || Capture(Arc::clone(&writer)))
        .finish();

    tracing::subscriber::with_default(subscriber, f);

    let bytes = buf.lock().unwrap().clone();
    String::from_utf8(bytes).unwrap()
}

#[test]
fn debug_keyspace_logs_statements() {
    let engine = MemoryExecutor::new();

    let quiet = captured_logs(|| {
        let ks = KeySpace::new("ks", &engine);
        users(&ks).create().unwrap();
    });
    assert!(!quiet.contains("CREATE TABLE"));

    let engine = MemoryExecutor::new();
    let loud = captured_logs(|| {
        let ks = KeySpace::new("ks", &engine).debug();
        users(&ks).create().unwrap();
        let mut rows: Vec<User> = Vec::new();
        users(&ks).filter(Vec::new()).read(&mut rows).run().unwrap();
    });
    assert!(loud.contains("CREATE TABLE ks.users"));
    assert!(loud.contains("SELECT age, attrs, emails, id, name FROM ks.users"));
    assert!(loud.contains("scan finished"));
}

struct RecordingSink {
    events: Mutex<Vec<String>>,
}

impl MetricsSink for RecordingSink {
    fn record(&self, event: MetricsEvent<'_>) {
        let label = match event {
            MetricsEvent::ExecStart { table, .. } => format!("start:{table}"),
            MetricsEvent::ExecFinish { table, rows, failed, .. } => {
                format!("finish:{table}:{rows}:{failed}")
            }
            MetricsEvent::RowsScanned { table, rows } => format!("scanned:{table}:{rows}"),
        };
        self.events.lock().unwrap().push(label);
    }
}

static RECORDING: RecordingSink = RecordingSink {
    events: Mutex::new(Vec::new()),
};

#[test]
fn keyspace_metrics_sink_receives_op_events() {
    let engine = MemoryExecutor::new();
    let ks = KeySpace::new("ks", &engine).metrics_sink(&RECORDING);
    let table = users(&ks);
    table.create().unwrap();
    table.set(&user("1", "ann")).run().unwrap();

    let mut rows: Vec<User> = Vec::new();
    table.filter(Vec::new()).read(&mut rows).run().unwrap();

    let events = RECORDING.events.lock().unwrap().clone();
    assert_eq!(
        events,
        [
            "start:users",
            "finish:users:0:false",
            "start:users",
            "scanned:users:1",
            "finish:users:1:false",
        ]
    );
}

#[test]
fn default_metrics_count_per_table() {
    metrics_reset_all();

    let engine = MemoryExecutor::new();
    let ks = KeySpace::new("ks", &engine);
    let table = users(&ks);
    table.create().unwrap();
    table.set(&user("1", "ann")).run().unwrap();

    let mut rows: Vec<User> = Vec::new();
    table.filter(Vec::new()).read(&mut rows).run().unwrap();
    engine.fail_next("x");
    let _ = table.filter(Vec::new()).read(&mut rows).run();

    let counters = metrics_report(None).counters.expect("window open");
    let users = &counters.tables["users"];
    assert_eq!(users.write_calls, 1);
    assert_eq!(users.read_calls, 2);
    assert_eq!(users.failed_calls, 1);
    assert_eq!(users.rows_read, 1);
    assert_eq!(counters.ops.statements, 3);
}
