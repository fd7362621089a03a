mod tests_model;

use rusqlite::Connection;

use crate::store::schema::ensure_schema;

/// In-memory database with the monitor schema applied
#[allow(clippy::expect_used)]
fn memory_db() -> Connection {
    let conn = Connection::open_in_memory().expect("Failed to open in-memory database");
    ensure_schema(&conn).expect("Failed to create schema");
    conn
}
