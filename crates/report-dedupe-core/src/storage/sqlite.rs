use crate::error::Error;
use rusqlite::{Connection, Result};
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info};

const SCHEMA_VERSION: i64 = 2;

/// SQLite-backed report store.
///
/// The connection sits behind a `Mutex` so the store can be shared with the
/// delete worker pool.
pub struct SqliteReportStore {
    conn: Mutex<Connection>,
}

impl SqliteReportStore {
    pub fn open(path: &str) -> Result<Self> {
        let conn = Connection::open(path)?;
        Self::from_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::from_connection(conn)
    }

    fn from_connection(mut conn: Connection) -> Result<Self> {
        configure_pragmas(&conn)?;
        migrate_schema(&mut conn)?;
        Ok(SqliteReportStore {
            conn: Mutex::new(conn),
        })
    }

    pub(crate) fn connection(&self) -> std::result::Result<MutexGuard<'_, Connection>, Error> {
        self.conn
            .lock()
            .map_err(|e| Error::Other(format!("Failed to lock report store: {}", e)))
    }
}

fn configure_pragmas(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "PRAGMA journal_mode = WAL;
         PRAGMA synchronous = NORMAL;
         PRAGMA busy_timeout = 5000;",
    )?;
    debug!("SQLite pragmas configured (WAL mode)");
    Ok(())
}

/// Version 0: empty database, create the schema.
/// Version 1: rows keyed on `id` only; rebuild keyed on `(owner_id, id)`, keeping every row.
fn migrate_schema(conn: &mut Connection) -> Result<()> {
    let version: i64 = conn.query_row("PRAGMA user_version", [], |row| row.get(0))?;

    if version == 1 {
        let tx = conn.transaction()?;
        tx.execute_batch(include_str!("migrate_v1.sql"))?;
        tx.execute_batch(include_str!("schema.sql"))?;
        let copied = tx.execute(
            "INSERT OR IGNORE INTO report \
             (owner_id, id, title, process_description, file_content, answers, report_data, created_at) \
             SELECT owner_id, id, title, process_description, file_content, answers, report_data, created_at \
             FROM report_v1",
            [],
        )?;
        tx.execute_batch("DROP TABLE report_v1;")?;
        tx.commit()?;
        info!("Migrated report schema from version 1: {} rows kept", copied);
    } else {
        conn.execute_batch(include_str!("schema.sql"))?;
    }

    debug!("SQLite schema initialized (version {})", SCHEMA_VERSION);
    Ok(())
}
