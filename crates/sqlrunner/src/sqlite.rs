//! SQLite executor backed by `rusqlite`.
//!
//! ```rust,ignore
//! let db = SqliteExecutor::open_in_memory()?;
//! db.execute_batch("CREATE TABLE users (id INTEGER PRIMARY KEY, user_name TEXT)")?;
//!
//! db.begin()?;
//! let mut runner = Runner::new(&db);
//! match runner.table("users").insert_batch(&users, 100).await {
//!     Ok(_) => db.commit()?,
//!     Err(e) => {
//!         db.rollback()?;
//!         return Err(e);
//!     }
//! }
//! ```

use crate::client::{ExecResult, Executor};
use crate::error::{RunnerError, RunnerResult};
use crate::monitor::QueryType;
use crate::row::Row;
use crate::value::Value;
use rusqlite::types::{ToSql, ToSqlOutput, ValueRef};
use rusqlite::{Connection, InterruptHandle, params_from_iter};
use std::fmt;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

impl ToSql for Value {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            Value::Null => ToSqlOutput::Borrowed(ValueRef::Null),
            Value::Bool(b) => ToSqlOutput::Owned(rusqlite::types::Value::Integer(i64::from(*b))),
            Value::Int(i) => ToSqlOutput::Borrowed(ValueRef::Integer(*i)),
            Value::Float(f) => ToSqlOutput::Borrowed(ValueRef::Real(*f)),
            Value::Text(s) => ToSqlOutput::Borrowed(ValueRef::Text(s.as_bytes())),
            Value::Bytes(b) => ToSqlOutput::Borrowed(ValueRef::Blob(b.as_slice())),
        })
    }
}

fn read_value(column: &str, value: ValueRef<'_>) -> RunnerResult<Value> {
    Ok(match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::Int(i),
        ValueRef::Real(f) => Value::Float(f),
        ValueRef::Text(bytes) => Value::Text(
            std::str::from_utf8(bytes)
                .map_err(|e| RunnerError::decode(column, e.to_string()))?
                .to_string(),
        ),
        ValueRef::Blob(bytes) => Value::Bytes(bytes.to_vec()),
    })
}

/// Per-call bookkeeping shared between a pending call and its blocking task.
#[derive(Default)]
struct CallState {
    running: bool,
    cancelled: bool,
}

fn lock_state(state: &Mutex<CallState>) -> MutexGuard<'_, CallState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Cancels the blocking task when the awaiting future is dropped before it
/// completes (e.g. by a query timeout).
///
/// A call that has not started yet is skipped; a running statement is
/// interrupted. The interrupt is issued while `running` is held, so it can
/// only reach this call's statement.
struct CancelOnDrop {
    state: Arc<Mutex<CallState>>,
    interrupt: Arc<InterruptHandle>,
    armed: bool,
}

impl Drop for CancelOnDrop {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let mut state = lock_state(&self.state);
        state.cancelled = true;
        if state.running {
            self.interrupt.interrupt();
        }
    }
}

fn lock_conn(conn: &Mutex<Connection>) -> RunnerResult<MutexGuard<'_, Connection>> {
    conn.lock()
        .map_err(|_| RunnerError::Connection("sqlite connection lock poisoned".to_string()))
}

fn query_rows(conn: &Connection, sql: &str, args: &[Value]) -> RunnerResult<Vec<Row>> {
    let mut stmt = conn.prepare(sql)?;
    let columns: Arc<[String]> = stmt
        .column_names()
        .into_iter()
        .map(str::to_string)
        .collect();

    let mut rows = stmt.query(params_from_iter(args.iter()))?;
    let mut out = Vec::new();
    while let Some(row) = rows.next()? {
        let mut values = Vec::with_capacity(columns.len());
        for (idx, column) in columns.iter().enumerate() {
            values.push(read_value(column, row.get_ref(idx)?)?);
        }
        out.push(Row::new(columns.clone(), values));
    }
    Ok(out)
}

fn exec_statement(conn: &Connection, sql: &str, args: &[Value]) -> RunnerResult<ExecResult> {
    let rows_affected = conn.execute(sql, params_from_iter(args.iter()))?;
    // last_insert_rowid() is per connection and goes stale after other statements
    let last_insert_id = match QueryType::from_sql(sql) {
        QueryType::Insert => Some(conn.last_insert_rowid()).filter(|id| *id != 0),
        _ => None,
    };
    Ok(ExecResult {
        rows_affected: rows_affected as u64,
        last_insert_id,
    })
}

/// A single SQLite connection behind a mutex.
///
/// Statements run on tokio's blocking pool, one at a time; the connection is
/// locked for the duration of one statement. Dropping a pending call (for
/// example through `RunnerConfig::with_query_timeout`) interrupts the
/// statement it is running.
pub struct SqliteExecutor {
    conn: Arc<Mutex<Connection>>,
    interrupt: Arc<InterruptHandle>,
}

impl fmt::Debug for SqliteExecutor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SqliteExecutor").finish_non_exhaustive()
    }
}

impl SqliteExecutor {
    pub fn new(conn: Connection) -> Self {
        let interrupt = Arc::new(conn.get_interrupt_handle());
        Self {
            conn: Arc::new(Mutex::new(conn)),
            interrupt,
        }
    }

    /// Open a private in-memory database.
    pub fn open_in_memory() -> RunnerResult<Self> {
        Ok(Self::new(Connection::open_in_memory()?))
    }

    /// Open (or create) a database file.
    pub fn open(path: impl AsRef<Path>) -> RunnerResult<Self> {
        let path = path.as_ref();
        let conn = Connection::open(path)?;
        tracing::debug!(path = %path.display(), "opened sqlite database");
        Ok(Self::new(conn))
    }

    /// Run one or more `;`-separated statements without arguments.
    ///
    /// Runs on the calling thread.
    pub fn execute_batch(&self, sql: &str) -> RunnerResult<()> {
        lock_conn(&self.conn)?.execute_batch(sql)?;
        Ok(())
    }

    /// Start a transaction on the connection.
    pub fn begin(&self) -> RunnerResult<()> {
        self.execute_batch("BEGIN")
    }

    pub fn commit(&self) -> RunnerResult<()> {
        self.execute_batch("COMMIT")
    }

    pub fn rollback(&self) -> RunnerResult<()> {
        self.execute_batch("ROLLBACK")
    }

    /// Run `call` against the connection on the blocking pool.
    async fn run_blocking<T, F>(&self, call: F) -> RunnerResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> RunnerResult<T> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        let state = Arc::new(Mutex::new(CallState::default()));
        let mut cancel = CancelOnDrop {
            state: Arc::clone(&state),
            interrupt: Arc::clone(&self.interrupt),
            armed: true,
        };

        let task = tokio::task::spawn_blocking(move || {
            let conn = lock_conn(&conn)?;
            {
                let mut state = lock_state(&state);
                if state.cancelled {
                    return Err(RunnerError::execution("statement cancelled before it started"));
                }
                state.running = true;
            }
            let result = call(&*conn);
            lock_state(&state).running = false;
            result
        });

        let result = task
            .await
            .map_err(|e| RunnerError::execution(format!("sqlite task failed: {e}")));
        cancel.armed = false;
        result?
    }
}

impl Executor for SqliteExecutor {
    async fn query(&self, sql: &str, args: &[Value]) -> RunnerResult<Vec<Row>> {
        let (sql, args) = (sql.to_string(), args.to_vec());
        self.run_blocking(move |conn| query_rows(conn, &sql, &args))
            .await
    }

    async fn exec(&self, sql: &str, args: &[Value]) -> RunnerResult<ExecResult> {
        let (sql, args) = (sql.to_string(), args.to_vec());
        self.run_blocking(move |conn| exec_statement(conn, &sql, &args))
            .await
    }
}
