use super::*;
use crate::monitor::StatsSink;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

// ── Recording executor ──

#[derive(Default)]
struct MockExecutor {
    calls: Mutex<Vec<Statement>>,
    results: Mutex<VecDeque<Vec<Row>>>,
    fail_at: Option<usize>,
    delay: Option<Duration>,
}

impl MockExecutor {
    fn new() -> Self {
        Self::default()
    }

    fn failing_at(call: usize) -> Self {
        Self {
            fail_at: Some(call),
            ..Self::default()
        }
    }

    fn push_rows(&self, rows: Vec<Row>) -> &Self {
        self.results.lock().unwrap().push_back(rows);
        self
    }

    fn calls(&self) -> Vec<Statement> {
        self.calls.lock().unwrap().clone()
    }

    fn sql(&self, idx: usize) -> String {
        self.calls()[idx].sql().to_string()
    }

    fn record_call(&self, sql: &str, args: &[Value]) -> RunnerResult<()> {
        let mut calls = self.calls.lock().unwrap();
        calls.push(Statement::new(sql, args.to_vec()));
        if self.fail_at == Some(calls.len()) {
            return Err(RunnerError::execution("injected failure"));
        }
        Ok(())
    }
}

impl Executor for MockExecutor {
    async fn query(&self, sql: &str, args: &[Value]) -> RunnerResult<Vec<Row>> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.record_call(sql, args)?;
        Ok(self.results.lock().unwrap().pop_front().unwrap_or_default())
    }

    async fn exec(&self, sql: &str, args: &[Value]) -> RunnerResult<ExecResult> {
        self.record_call(sql, args)?;
        let rows = if sql.starts_with("INSERT") {
            sql.matches("(?").count() as u64
        } else {
            1
        };
        Ok(ExecResult::new(rows))
    }
}

// ── Records ──

#[derive(Debug, Default, PartialEq, crate::Record)]
#[orm(table = "users")]
struct User {
    #[orm(db = "id", json = "id")]
    id: i64,
    #[orm(db = "user_name", json = "userName")]
    name: String,
    #[orm(db = "-", json = "secret")]
    secret: String,
}

#[derive(Debug, Default, PartialEq, crate::Record)]
struct Keys {
    #[orm(json = "key1")]
    key1: String,
    #[orm(json = "key2")]
    key2: String,
}

#[derive(Debug, Default, PartialEq, crate::Record)]
struct Audit {
    #[orm(db = "created_by")]
    created_by: String,
    #[orm(db = "note")]
    note: Option<String>,
}

#[derive(Debug, Default, PartialEq, crate::Record)]
#[orm(table = "posts")]
struct Post {
    #[orm(db = "id")]
    id: i64,
    #[orm(flatten)]
    audit: Option<Audit>,
    #[orm(db = "title")]
    title: String,
    cached: u32,
}

fn user_row(id: i64, name: &str) -> Row {
    Row::from_pairs([("id", Value::Int(id)), ("user_name", Value::from(name))])
}

fn users(n: i64) -> Vec<User> {
    (1..=n)
        .map(|id| User {
            id,
            name: format!("u{id}"),
            secret: String::new(),
        })
        .collect()
}

// ── Reads ──

#[tokio::test]
async fn get_selects_mapped_columns_with_single_row_paging() {
    let db = MockExecutor::new();
    db.push_rows(vec![user_row(7, "ann")]);

    let mut runner = Runner::new(&db);
    runner.table_of::<User>().and_eq("id", 7).limit(50).offset(10);
    let user: User = runner.get().await.unwrap();

    assert_eq!(
        user,
        User {
            id: 7,
            name: "ann".into(),
            secret: String::new(),
        }
    );
    assert_eq!(
        db.sql(0),
        "SELECT id, user_name FROM users WHERE id = ? LIMIT 1 OFFSET 0"
    );
    assert_eq!(db.calls()[0].args(), &[Value::Int(7)]);
}

#[tokio::test]
async fn get_without_rows_is_not_found() {
    let db = MockExecutor::new();
    let mut runner = Runner::new(&db);
    runner.table("users");
    let err = runner.get::<User>().await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn subset_selection_leaves_other_fields_untouched() {
    let db = MockExecutor::new();
    db.push_rows(vec![Row::from_pairs([("key1", "value1")])]);

    let config = RunnerConfig::new().with_tag_family(TagFamily::Json);
    let mut runner = Runner::with_config(&db, config);
    runner.table("kv").select(["key1"]);
    let keys: Keys = runner.get().await.unwrap();

    assert_eq!(
        keys,
        Keys {
            key1: "value1".into(),
            key2: String::new(),
        }
    );
    assert_eq!(db.sql(0), "SELECT key1 FROM kv LIMIT 1 OFFSET 0");
}

#[tokio::test]
async fn get_into_scans_in_select_order() {
    let db = MockExecutor::new();
    db.push_rows(vec![Row::from_pairs([
        ("user_name", Value::from("bob")),
        ("id", Value::Int(3)),
    ])]);

    let mut runner = Runner::new(&db);
    runner.table("users").select(["user_name", "id"]);
    let mut user = User {
        secret: "kept".into(),
        ..User::default()
    };
    runner.get_into(&mut user).await.unwrap();

    assert_eq!(user.id, 3);
    assert_eq!(user.name, "bob");
    assert_eq!(user.secret, "kept");
}

#[tokio::test]
async fn json_family_resolves_json_names() {
    let db = MockExecutor::new();
    let mut runner = Runner::new(&db);
    runner.tag(TagFamily::Json).table("users");
    let _ = runner.get::<User>().await;
    assert_eq!(
        db.sql(0),
        "SELECT id, userName, secret FROM users LIMIT 1 OFFSET 0"
    );
}

#[tokio::test]
async fn all_appends_one_record_per_row() {
    let db = MockExecutor::new();
    db.push_rows(vec![user_row(1, "a"), user_row(2, "b")]);

    let mut runner = Runner::new(&db);
    runner.table_of::<User>().from_record::<User>().order_by("id");
    let mut out = vec![User::default()];
    runner.all_into(&mut out).await.unwrap();

    assert_eq!(db.sql(0), "SELECT id, user_name FROM users ORDER BY id");
    assert_eq!(out.len(), 3);
    assert_eq!(out[1].name, "a");
    assert_eq!(out[2].id, 2);
}

#[tokio::test]
async fn all_falls_back_to_element_columns() {
    let db = MockExecutor::new();
    let mut runner = Runner::new(&db);
    runner.table("users").and_like("user_name", "a%");
    let rows: Vec<User> = runner.all().await.unwrap();
    assert!(rows.is_empty());
    assert_eq!(
        db.sql(0),
        "SELECT id, user_name FROM users WHERE user_name LIKE ?"
    );
}

#[tokio::test]
async fn selecting_an_unmapped_column_is_a_usage_error() {
    let db = MockExecutor::new();
    db.push_rows(vec![Row::from_pairs([("email", "x@y")])]);
    let mut runner = Runner::new(&db);
    runner.table("users").select(["email"]);
    let err = runner.all::<User>().await.unwrap_err();
    assert!(err.is_usage());
}

#[tokio::test]
async fn read_without_any_columns_is_a_usage_error() {
    #[derive(Debug, Default, crate::Record)]
    struct Nothing {
        _unmapped: i32,
    }

    let db = MockExecutor::new();
    let mut runner = Runner::new(&db);
    runner.table("t");
    let err = runner.get::<Nothing>().await.unwrap_err();
    assert!(err.is_usage());
    assert!(db.calls().is_empty());
}

#[tokio::test]
async fn pluck_reads_a_single_column() {
    let db = MockExecutor::new();
    db.push_rows(vec![
        Row::from_pairs([("user_name", "a")]),
        Row::from_pairs([("user_name", "b")]),
    ]);

    let mut runner = Runner::new(&db);
    runner.table("users").select(["id", "user_name"]).and_in("id", [1, 2]);
    let names: Vec<String> = runner.pluck("user_name").await.unwrap();

    assert_eq!(names, ["a", "b"]);
    assert_eq!(db.sql(0), "SELECT user_name FROM users WHERE id IN (?, ?)");

    // the explicit selection survives
    let _ = runner.all::<User>().await;
    assert_eq!(db.sql(1), "SELECT id, user_name FROM users WHERE id IN (?, ?)");
}

#[tokio::test]
async fn pluck_decode_error_names_the_column() {
    let db = MockExecutor::new();
    db.push_rows(vec![Row::from_pairs([("id", "not a number")])]);
    let mut runner = Runner::new(&db);
    runner.table("users");
    match runner.pluck::<i64>("id").await.unwrap_err() {
        RunnerError::Decode { column, .. } => assert_eq!(column, "id"),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn count_with_no_rows_is_zero() {
    let db = MockExecutor::new();
    let mut runner = Runner::new(&db);
    runner.table("users").and_eq("active", true);
    assert_eq!(runner.count().await.unwrap(), 0);
    assert_eq!(db.sql(0), "SELECT count(*) FROM users WHERE active = ?");
}

#[tokio::test]
async fn count_reads_the_first_value() {
    let db = MockExecutor::new();
    db.push_rows(vec![Row::from_pairs([("count(*)", 42)])]);
    let mut runner = Runner::new(&db);
    runner.table("users").select(["id"]);
    assert_eq!(runner.count().await.unwrap(), 42);

    // the selection swap is temporary
    let _ = runner.pluck::<i64>("id").await;
    let _: Vec<User> = runner.all().await.unwrap();
    assert_eq!(db.sql(2), "SELECT id FROM users");
}

#[tokio::test]
async fn exists_with_no_rows_is_false() {
    let db = MockExecutor::new();
    let mut runner = Runner::new(&db);
    runner.table("users").and_eq("id", 1).limit(20);
    assert!(!runner.exists().await.unwrap());
    assert_eq!(db.sql(0), "SELECT 1 FROM users WHERE id = ? LIMIT 1");
}

#[tokio::test]
async fn exists_is_true_for_a_one() {
    let db = MockExecutor::new();
    db.push_rows(vec![Row::from_pairs([("1", 1)])]);
    let mut runner = Runner::new(&db);
    runner.table("users");
    assert!(runner.exists().await.unwrap());
}

#[tokio::test]
async fn raw_override_is_consumed_by_the_next_read() {
    let db = MockExecutor::new();
    db.push_rows(vec![Row::from_pairs([("n", 5)])]);

    let mut runner = Runner::new(&db);
    runner
        .table("users")
        .raw("SELECT count(*) AS n FROM users WHERE age > ?", vec![Value::Int(30)]);
    assert_eq!(runner.count().await.unwrap(), 5);
    assert_eq!(runner.count().await.unwrap(), 0);

    let calls = db.calls();
    assert_eq!(calls[0].sql(), "SELECT count(*) AS n FROM users WHERE age > ?");
    assert_eq!(calls[0].args(), &[Value::Int(30)]);
    assert_eq!(calls[1].sql(), "SELECT count(*) FROM users");
}

#[tokio::test]
async fn raw_override_aligns_by_result_columns() {
    let db = MockExecutor::new();
    db.push_rows(vec![user_row(9, "zed")]);
    let mut runner = Runner::new(&db);
    runner.raw(
        "SELECT u.id, u.user_name FROM users u JOIN teams t ON t.id = u.team_id",
        Vec::new(),
    );
    let user: User = runner.get().await.unwrap();
    assert_eq!(user.id, 9);
    assert_eq!(user.name, "zed");
}

#[tokio::test]
async fn raw_override_does_not_apply_to_writes() {
    let db = MockExecutor::new();
    let mut runner = Runner::new(&db);
    runner.table("users").and_eq("id", 1).raw("SELECT 1", Vec::new());
    runner.delete().await.unwrap();
    let _ = runner.exists().await.unwrap();

    assert_eq!(db.sql(0), "DELETE FROM users WHERE id = ?");
    assert_eq!(db.sql(1), "SELECT 1");
}

// ── Writes ──

#[tokio::test]
async fn update_and_delete_share_the_predicate() {
    let db = MockExecutor::new();
    let mut runner = Runner::new(&db);
    runner.table("users").and_eq("id", 7);

    runner.update_values([("user_name", "bob")]).await.unwrap();
    runner.delete().await.unwrap();

    let calls = db.calls();
    assert_eq!(calls[0].sql(), "UPDATE users SET user_name = ? WHERE id = ?");
    assert_eq!(calls[0].args(), &[Value::from("bob"), Value::Int(7)]);
    assert_eq!(calls[1].sql(), "DELETE FROM users WHERE id = ?");
    assert_eq!(calls[1].args(), &[Value::Int(7)]);
}

#[tokio::test]
async fn update_record_and_selected_fields() {
    let db = MockExecutor::new();
    let user = User {
        id: 1,
        name: "ann".into(),
        secret: "s".into(),
    };
    let mut runner = Runner::new(&db);
    runner.table("users").and_eq("id", 1);
    runner.update(&user).await.unwrap();
    runner.update_fields(&user, &["user_name"]).await.unwrap();

    assert_eq!(db.sql(0), "UPDATE users SET id = ?, user_name = ? WHERE id = ?");
    assert_eq!(db.sql(1), "UPDATE users SET user_name = ? WHERE id = ?");
}

#[tokio::test]
async fn update_fields_rejects_unmapped_field() {
    let db = MockExecutor::new();
    let mut runner = Runner::new(&db);
    runner.table("users");
    let err = runner
        .update_fields(&User::default(), &["secret"])
        .await
        .unwrap_err();
    assert!(err.is_usage());
    assert!(db.calls().is_empty());
}

#[tokio::test]
async fn insert_flattens_embedded_records() {
    let db = MockExecutor::new();
    let mut runner = Runner::new(&db);
    runner.table_of::<Post>();

    let post = Post {
        id: 1,
        audit: Some(Audit {
            created_by: "ann".into(),
            note: None,
        }),
        title: "hello".into(),
        cached: 9,
    };
    runner.insert(&post).await.unwrap();

    let calls = db.calls();
    assert_eq!(
        calls[0].sql(),
        "INSERT INTO posts (id, created_by, note, title) VALUES (?, ?, ?, ?)"
    );
    assert_eq!(
        calls[0].args(),
        &[
            Value::Int(1),
            Value::from("ann"),
            Value::Null,
            Value::from("hello")
        ]
    );
}

#[tokio::test]
async fn writing_an_absent_embed_is_a_build_error() {
    let db = MockExecutor::new();
    let mut runner = Runner::new(&db);
    runner.table_of::<Post>();

    let post = Post {
        id: 1,
        audit: None,
        title: "hello".into(),
        cached: 0,
    };
    let err = runner.insert(&post).await.unwrap_err();
    assert!(err.is_build());
    assert!(err.to_string().contains("created_by, note"));

    runner.and_eq("id", 1);
    assert!(runner.update(&post).await.unwrap_err().is_build());
    assert!(
        runner
            .update_fields(&post, &["title"])
            .await
            .unwrap_err()
            .is_build()
    );
    assert!(db.calls().is_empty());
}

#[tokio::test]
async fn insert_values_uses_explicit_pairs() {
    let db = MockExecutor::new();
    let mut runner = Runner::new(&db);
    runner.table("events");
    let res = runner
        .insert_values([("kind", Value::from("login")), ("user_id", Value::Int(4))])
        .await
        .unwrap();
    assert_eq!(res.rows_affected, 1);
    assert_eq!(db.sql(0), "INSERT INTO events (kind, user_id) VALUES (?, ?)");
}

#[tokio::test]
async fn insert_batch_chunks_in_order() {
    let db = MockExecutor::new();
    let mut runner = Runner::new(&db);
    runner.table("users");
    let res = runner.insert_batch(&users(3), 2).await.unwrap();

    let calls = db.calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(
        calls[0].sql(),
        "INSERT INTO users (id, user_name) VALUES (?, ?), (?, ?)"
    );
    assert_eq!(calls[1].sql(), "INSERT INTO users (id, user_name) VALUES (?, ?)");
    assert_eq!(calls[1].args(), &[Value::Int(3), Value::from("u3")]);
    assert_eq!(res.rows_affected, 3);
}

#[tokio::test]
async fn insert_batch_stops_at_first_failure() {
    let db = MockExecutor::failing_at(2);
    let mut runner = Runner::new(&db);
    runner.table("users");
    let err = runner.insert_batch(&users(5), 2).await.unwrap_err();

    assert!(matches!(err, RunnerError::Execution(_)));
    assert_eq!(db.calls().len(), 2);
}

#[tokio::test]
async fn insert_batch_rejects_zero_size() {
    let db = MockExecutor::new();
    let mut runner = Runner::new(&db);
    runner.table("users");
    assert!(runner.insert_batch(&users(2), 0).await.unwrap_err().is_usage());
    assert!(runner.insert_batch::<User>(&[], 10).await.is_ok());
    assert!(db.calls().is_empty());
}

#[tokio::test]
async fn write_without_table_is_a_build_error() {
    let db = MockExecutor::new();
    let mut runner = Runner::new(&db);
    assert!(runner.delete().await.unwrap_err().is_build());
}

// ── Diagnostics ──

#[tokio::test]
async fn last_statement_tracks_the_final_sql() {
    let db = MockExecutor::new();
    let mut runner = Runner::new(&db);
    assert!(runner.last_statement().is_none());
    runner.table("users").and_eq("id", 2);
    runner.count().await.unwrap();

    let last = runner.last_statement().unwrap();
    assert_eq!(last.sql(), "SELECT count(*) FROM users WHERE id = ?");
    assert_eq!(last.args(), &[Value::Int(2)]);
}

#[tokio::test]
async fn sink_receives_events_only_when_tracing() {
    let db = MockExecutor::new();
    let stats = Arc::new(StatsSink::new());

    let quiet = RunnerConfig::new().with_sink(stats.clone());
    let mut runner = Runner::with_config(&db, quiet);
    runner.table("users");
    runner.count().await.unwrap();
    assert_eq!(stats.stats().total_queries, 0);

    let traced = RunnerConfig::new().with_sink(stats.clone()).enable_tracing();
    let mut runner = Runner::with_config(&db, traced);
    runner.table("users").and_eq("id", 1);
    runner.count().await.unwrap();
    runner.delete().await.unwrap();

    let snapshot = stats.stats();
    assert_eq!(snapshot.total_queries, 2);
    assert_eq!(snapshot.select_count, 1);
    assert_eq!(snapshot.delete_count, 1);
    assert_eq!(snapshot.failed_queries, 0);
}

#[tokio::test]
async fn executor_errors_pass_through() {
    let db = MockExecutor::failing_at(1);
    let stats = Arc::new(StatsSink::new());
    let config = RunnerConfig::new().with_sink(stats.clone()).with_trace(true);
    let mut runner = Runner::with_config(&db, config);
    runner.table("users");

    let err = runner.all::<User>().await.unwrap_err();
    assert_eq!(err.to_string(), "Execution error: injected failure");
    assert_eq!(stats.stats().failed_queries, 1);
}

#[tokio::test]
async fn query_timeout_bounds_executor_calls() {
    let db = MockExecutor {
        delay: Some(Duration::from_millis(500)),
        ..MockExecutor::default()
    };
    let config = RunnerConfig::new().with_query_timeout(Duration::from_millis(10));
    let mut runner = Runner::with_config(&db, config);
    runner.table("users");

    let err = runner.count().await.unwrap_err();
    assert!(err.is_timeout());
    assert!(db.calls().is_empty());
}

#[test]
fn record_columns_follow_declaration_order() {
    assert_eq!(mapper::mapped_columns::<Post>(TagFamily::Db), [
        "id",
        "created_by",
        "note",
        "title"
    ]);
    assert!(mapper::mapped_columns::<Post>(TagFamily::Json).is_empty());
    assert_eq!(<Post as TableName>::table_name(), "posts");
}
