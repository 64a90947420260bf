use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch("CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL);")?;

    let version: i64 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |r| r.get(0),
    )?;

    if version < 1 {
        info!("Running migration v1 (users, messages)");
        conn.execute_batch(
            "
            BEGIN;

            CREATE TABLE users (
                id              TEXT PRIMARY KEY,
                full_name       TEXT NOT NULL,
                email           TEXT NOT NULL,
                api_key_hash    TEXT NOT NULL UNIQUE,
                last_access_at  TEXT NOT NULL,
                created_at      TEXT NOT NULL
            );

            -- Timestamps are fixed-width RFC-3339 UTC text with nanoseconds,
            -- so equality in WHERE clauses is exact.
            CREATE TABLE messages (
                owner_id         TEXT NOT NULL,
                created_at       TEXT NOT NULL,
                text             TEXT NOT NULL,
                is_palindrome    INTEGER NOT NULL,
                last_updated_at  TEXT NOT NULL,
                last_updated_by  TEXT NOT NULL,
                deleted          INTEGER NOT NULL DEFAULT 0,
                PRIMARY KEY (owner_id, created_at)
            );

            CREATE INDEX idx_messages_live
                ON messages(deleted, created_at);

            INSERT INTO schema_version (version) VALUES (1);

            COMMIT;
            ",
        )?;
    }

    info!("Database migrations complete");
    Ok(())
}
