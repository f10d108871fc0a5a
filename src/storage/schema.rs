//! SQL schema for the Mensable store.

use log::debug;
use rusqlite::Connection;

use crate::core::error::Result;

/// Create every table that does not exist yet
pub fn initialize_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch("PRAGMA foreign_keys=ON;")?;

    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL UNIQUE,
            password_hash TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS languages (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL UNIQUE
        );

        CREATE TABLE IF NOT EXISTS word_tables (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL UNIQUE,
            created TEXT NOT NULL,
            creator_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            language_id INTEGER NOT NULL REFERENCES languages(id) ON DELETE CASCADE
        );

        CREATE TABLE IF NOT EXISTS word_pairs (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            foreign_word TEXT NOT NULL,
            translation TEXT NOT NULL,
            language_id INTEGER NOT NULL REFERENCES languages(id) ON DELETE CASCADE
        );

        CREATE INDEX IF NOT EXISTS idx_word_pairs_language_word
            ON word_pairs(language_id, foreign_word);

        CREATE TABLE IF NOT EXISTS table_word_pairs (
            table_id INTEGER NOT NULL REFERENCES word_tables(id) ON DELETE CASCADE,
            word_pair_id INTEGER NOT NULL REFERENCES word_pairs(id) ON DELETE CASCADE,
            PRIMARY KEY (table_id, word_pair_id)
        );

        CREATE TABLE IF NOT EXISTS subscriptions (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            learner_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            table_id INTEGER NOT NULL REFERENCES word_tables(id) ON DELETE CASCADE,
            leitner_boxes TEXT NOT NULL,
            last_quiz_results TEXT NOT NULL,
            quiz_attempts INTEGER NOT NULL DEFAULT 0,
            total_questions INTEGER NOT NULL DEFAULT 0,
            total_right INTEGER NOT NULL DEFAULT 0,
            average_percentage_score INTEGER,
            last_quiz_date TEXT,
            subscription_date TEXT NOT NULL,
            UNIQUE (learner_id, table_id)
        );
        "#,
    )?;

    debug!("Database schema ready");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    // Running the schema twice must be harmless
    #[test]
    fn test_initialize_schema_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        initialize_schema(&conn).unwrap();
        initialize_schema(&conn).unwrap();

        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name IN \
                 ('users','languages','word_tables','word_pairs','table_word_pairs','subscriptions')",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(count, 6);
    }
}
