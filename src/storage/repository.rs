//! Repository layer for database operations.
//!
//! Every query the handlers need lives here, so the web layer never sees SQL.

use chrono::NaiveDate;
use log::debug;
use rusqlite::{params, Connection, OptionalExtension, Row};

use super::database::Database;
use crate::core::error::{MensableError, Result};
use crate::core::leitner::{LeitnerBoxes, QuizResults};
use crate::core::models::{
    AddWordOutcome, ImportSummary, Language, LanguageSummary, Subscription,
    SubscriptionSummary, Table, TableSummary, User, WordPair,
};

const TABLE_SUMMARY_SELECT: &str = r#"
    SELECT t.name, l.name, u.name, t.created,
           (SELECT COUNT(*) FROM table_word_pairs tw WHERE tw.table_id = t.id)
    FROM word_tables t
    JOIN languages l ON l.id = t.language_id
    JOIN users u ON u.id = t.creator_id
"#;

/// Repository for database operations
#[derive(Clone)]
pub struct Repository {
    db: Database,
}

impl Repository {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Create a repository with an in-memory database (for testing)
    #[cfg(test)]
    pub fn new_in_memory() -> Result<Self> {
        Ok(Self::new(Database::open_in_memory()?))
    }

    // =========================================================================
    // Users
    // =========================================================================

    pub fn create_user(&self, name: &str, password_hash: &str) -> Result<i64> {
        self.db.execute(|conn| {
            conn.execute(
                "INSERT INTO users (name, password_hash) VALUES (?1, ?2)",
                params![name, password_hash],
            )
            .map_err(|e| name_taken(e, "Username taken.".to_string()))?;
            Ok(conn.last_insert_rowid())
        })
    }

    pub fn find_user(&self, id: i64) -> Result<Option<User>> {
        self.db.execute(|conn| {
            Ok(conn
                .query_row(
                    "SELECT id, name, password_hash FROM users WHERE id = ?1",
                    [id],
                    user_from_row,
                )
                .optional()?)
        })
    }

    pub fn find_user_by_name(&self, name: &str) -> Result<Option<User>> {
        self.db.execute(|conn| {
            Ok(conn
                .query_row(
                    "SELECT id, name, password_hash FROM users WHERE name = ?1",
                    [name],
                    user_from_row,
                )
                .optional()?)
        })
    }

    // =========================================================================
    // Languages
    // =========================================================================

    pub fn create_language(&self, name: &str) -> Result<i64> {
        self.db.execute(|conn| {
            conn.execute("INSERT INTO languages (name) VALUES (?1)", [name])
                .map_err(|e| name_taken(e, format!("Language {} already exists.", name)))?;
            Ok(conn.last_insert_rowid())
        })
    }

    pub fn find_language_by_name(&self, name: &str) -> Result<Option<Language>> {
        self.db.execute(|conn| {
            Ok(conn
                .query_row(
                    "SELECT id, name FROM languages WHERE name = ?1",
                    [name],
                    |row| Ok(Language { id: row.get(0)?, name: row.get(1)? }),
                )
                .optional()?)
        })
    }

    pub fn list_languages(&self) -> Result<Vec<LanguageSummary>> {
        self.db.execute(|conn| {
            let mut stmt = conn.prepare(
                r#"
                SELECT l.name, (SELECT COUNT(*) FROM word_tables t WHERE t.language_id = l.id)
                FROM languages l
                ORDER BY l.name
                "#,
            )?;
            let languages = stmt
                .query_map([], |row| {
                    Ok(LanguageSummary {
                        name: row.get(0)?,
                        table_count: row.get(1)?,
                    })
                })?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(languages)
        })
    }

    // =========================================================================
    // Tables
    // =========================================================================

    pub fn create_table(
        &self,
        name: &str,
        creator_id: i64,
        language_id: i64,
        created: NaiveDate,
    ) -> Result<i64> {
        self.db.execute(|conn| {
            conn.execute(
                "INSERT INTO word_tables (name, created, creator_id, language_id) VALUES (?1, ?2, ?3, ?4)",
                params![name, created, creator_id, language_id],
            )
            .map_err(|e| name_taken(e, format!("Table {} already exists.", name)))?;
            Ok(conn.last_insert_rowid())
        })
    }

    pub fn find_table_by_name(&self, name: &str) -> Result<Option<Table>> {
        self.db.execute(|conn| {
            Ok(conn
                .query_row(
                    "SELECT id, name, created, creator_id, language_id FROM word_tables WHERE name = ?1",
                    [name],
                    |row| {
                        Ok(Table {
                            id: row.get(0)?,
                            name: row.get(1)?,
                            created: row.get(2)?,
                            creator_id: row.get(3)?,
                            language_id: row.get(4)?,
                        })
                    },
                )
                .optional()?)
        })
    }

    /// All tables, or only those of one language
    pub fn list_tables(&self, language_id: Option<i64>) -> Result<Vec<TableSummary>> {
        self.db.execute(|conn| match language_id {
            Some(language_id) => {
                let sql = format!("{TABLE_SUMMARY_SELECT} WHERE t.language_id = ?1 ORDER BY t.name");
                query_table_summaries(conn, &sql, [language_id])
            }
            None => {
                let sql = format!("{TABLE_SUMMARY_SELECT} ORDER BY l.name, t.name");
                query_table_summaries(conn, &sql, [])
            }
        })
    }

    pub fn tables_created_by(&self, user_id: i64) -> Result<Vec<TableSummary>> {
        self.db.execute(|conn| {
            let sql = format!("{TABLE_SUMMARY_SELECT} WHERE t.creator_id = ?1 ORDER BY l.name, t.name");
            query_table_summaries(conn, &sql, [user_id])
        })
    }

    // =========================================================================
    // Word pairs
    // =========================================================================

    pub fn table_word_pairs(&self, table_id: i64) -> Result<Vec<WordPair>> {
        self.db.execute(|conn| {
            let mut stmt = conn.prepare(
                r#"
                SELECT w.id, w.foreign_word, w.translation, w.language_id
                FROM word_pairs w
                JOIN table_word_pairs tw ON tw.word_pair_id = w.id
                WHERE tw.table_id = ?1
                ORDER BY w.id
                "#,
            )?;
            let words = stmt
                .query_map([table_id], word_pair_from_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(words)
        })
    }

    pub fn table_word_ids(&self, table_id: i64) -> Result<Vec<i64>> {
        self.db.execute(|conn| {
            let mut stmt = conn
                .prepare("SELECT word_pair_id FROM table_word_pairs WHERE table_id = ?1 ORDER BY word_pair_id")?;
            let ids = stmt
                .query_map([table_id], |row| row.get(0))?
                .collect::<rusqlite::Result<Vec<i64>>>()?;
            Ok(ids)
        })
    }

    /// A word pair, but only while it is still part of the given table
    pub fn find_table_word_pair(&self, table_id: i64, word_pair_id: i64) -> Result<Option<WordPair>> {
        self.db.execute(|conn| {
            Ok(conn
                .query_row(
                    r#"
                    SELECT w.id, w.foreign_word, w.translation, w.language_id
                    FROM word_pairs w
                    JOIN table_word_pairs tw ON tw.word_pair_id = w.id
                    WHERE tw.table_id = ?1 AND w.id = ?2
                    "#,
                    [table_id, word_pair_id],
                    word_pair_from_row,
                )
                .optional()?)
        })
    }

    /// Add a word pair to a table, reusing a pair with the same foreign word
    /// from the same language when there is one
    pub fn add_word_pair(
        &self,
        table_id: i64,
        language_id: i64,
        foreign_word: &str,
        translation: &str,
    ) -> Result<AddWordOutcome> {
        self.db
            .execute(|conn| add_word_pair_with(conn, table_id, language_id, foreign_word, translation))
    }

    /// Add many word pairs in one transaction
    pub fn import_word_pairs(
        &self,
        table_id: i64,
        language_id: i64,
        rows: &[(String, String)],
    ) -> Result<ImportSummary> {
        self.db.execute(|conn| {
            let tx = conn.transaction()?;
            let mut summary = ImportSummary::default();
            for (foreign_word, translation) in rows {
                let outcome = add_word_pair_with(&tx, table_id, language_id, foreign_word, translation)?;
                summary.count(outcome);
            }
            tx.commit()?;
            Ok(summary)
        })
    }

    /// Take a word pair out of a table; the pair itself goes once no table holds it
    pub fn remove_word_from_table(&self, table_id: i64, word_pair_id: i64) -> Result<bool> {
        self.db.execute(|conn| {
            let tx = conn.transaction()?;
            let removed = tx.execute(
                "DELETE FROM table_word_pairs WHERE table_id = ?1 AND word_pair_id = ?2",
                [table_id, word_pair_id],
            )? > 0;

            if removed {
                let remaining: i64 = tx.query_row(
                    "SELECT COUNT(*) FROM table_word_pairs WHERE word_pair_id = ?1",
                    [word_pair_id],
                    |row| row.get(0),
                )?;
                if remaining == 0 {
                    tx.execute("DELETE FROM word_pairs WHERE id = ?1", [word_pair_id])?;
                    debug!("Deleted orphaned word pair {}", word_pair_id);
                }
            }

            tx.commit()?;
            Ok(removed)
        })
    }

    // =========================================================================
    // Subscriptions
    // =========================================================================

    pub fn find_subscription(&self, learner_id: i64, table_id: i64) -> Result<Option<Subscription>> {
        self.db.execute(|conn| find_subscription_with(conn, learner_id, table_id))
    }

    /// Load the learner's subscription to a table, creating an empty one first if needed
    pub fn find_or_create_subscription(
        &self,
        learner_id: i64,
        table_id: i64,
        today: NaiveDate,
    ) -> Result<Subscription> {
        self.db.execute(|conn| {
            if let Some(subscription) = find_subscription_with(conn, learner_id, table_id)? {
                return Ok(subscription);
            }

            let mut subscription = Subscription::new(learner_id, table_id, today);
            conn.execute(
                r#"
                INSERT INTO subscriptions (
                    learner_id, table_id, leitner_boxes, last_quiz_results,
                    quiz_attempts, total_questions, total_right, subscription_date
                ) VALUES (?1, ?2, ?3, ?4, 0, 0, 0, ?5)
                "#,
                params![
                    learner_id,
                    table_id,
                    serde_json::to_string(&subscription.leitner_boxes)?,
                    serde_json::to_string(&subscription.last_quiz_results)?,
                    today,
                ],
            )?;
            subscription.id = conn.last_insert_rowid();
            debug!("Created subscription {} for user {} on table {}", subscription.id, learner_id, table_id);
            Ok(subscription)
        })
    }

    pub fn save_subscription(&self, subscription: &Subscription) -> Result<()> {
        let boxes = serde_json::to_string(&subscription.leitner_boxes)?;
        let results = serde_json::to_string(&subscription.last_quiz_results)?;

        self.db.execute(|conn| {
            conn.execute(
                r#"
                UPDATE subscriptions SET
                    leitner_boxes = ?1, last_quiz_results = ?2, quiz_attempts = ?3,
                    total_questions = ?4, total_right = ?5, average_percentage_score = ?6,
                    last_quiz_date = ?7
                WHERE id = ?8
                "#,
                params![
                    boxes,
                    results,
                    subscription.quiz_attempts,
                    subscription.total_questions,
                    subscription.total_right,
                    subscription.average_percentage_score,
                    subscription.last_quiz_date,
                    subscription.id,
                ],
            )?;
            Ok(())
        })
    }

    pub fn delete_subscription(&self, learner_id: i64, table_id: i64) -> Result<bool> {
        self.db.execute(|conn| {
            let deleted = conn.execute(
                "DELETE FROM subscriptions WHERE learner_id = ?1 AND table_id = ?2",
                [learner_id, table_id],
            )?;
            Ok(deleted > 0)
        })
    }

    pub fn subscriptions_for_user(&self, learner_id: i64) -> Result<Vec<SubscriptionSummary>> {
        self.db.execute(|conn| {
            let mut stmt = conn.prepare(
                r#"
                SELECT t.name, l.name, s.quiz_attempts, s.total_questions, s.total_right,
                       s.average_percentage_score, s.last_quiz_date
                FROM subscriptions s
                JOIN word_tables t ON t.id = s.table_id
                JOIN languages l ON l.id = t.language_id
                WHERE s.learner_id = ?1
                ORDER BY l.name, t.name
                "#,
            )?;
            let subscriptions = stmt
                .query_map([learner_id], |row| {
                    Ok(SubscriptionSummary {
                        table_name: row.get(0)?,
                        language_name: row.get(1)?,
                        quiz_attempts: row.get(2)?,
                        total_questions: row.get(3)?,
                        total_right: row.get(4)?,
                        average_percentage_score: row.get(5)?,
                        last_quiz_date: row.get(6)?,
                    })
                })?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(subscriptions)
        })
    }
}

/// A UNIQUE clash on insert means another request took the name first
fn name_taken(err: rusqlite::Error, message: String) -> MensableError {
    match &err {
        rusqlite::Error::SqliteFailure(failure, _)
            if failure.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE =>
        {
            MensableError::Validation(message)
        }
        _ => MensableError::Database(err),
    }
}

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        name: row.get(1)?,
        password_hash: row.get(2)?,
    })
}

fn word_pair_from_row(row: &Row<'_>) -> rusqlite::Result<WordPair> {
    Ok(WordPair {
        id: row.get(0)?,
        foreign_word: row.get(1)?,
        translation: row.get(2)?,
        language_id: row.get(3)?,
    })
}

fn query_table_summaries<P: rusqlite::Params>(
    conn: &Connection,
    sql: &str,
    params: P,
) -> Result<Vec<TableSummary>> {
    let mut stmt = conn.prepare(sql)?;
    let tables = stmt
        .query_map(params, |row| {
            Ok(TableSummary {
                name: row.get(0)?,
                language_name: row.get(1)?,
                creator_name: row.get(2)?,
                created: row.get(3)?,
                word_count: row.get(4)?,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(tables)
}

fn add_word_pair_with(
    conn: &Connection,
    table_id: i64,
    language_id: i64,
    foreign_word: &str,
    translation: &str,
) -> Result<AddWordOutcome> {
    let existing: Option<i64> = conn
        .query_row(
            "SELECT id FROM word_pairs WHERE language_id = ?1 AND foreign_word = ?2 ORDER BY id LIMIT 1",
            params![language_id, foreign_word],
            |row| row.get(0),
        )
        .optional()?;

    let outcome = match existing {
        Some(id) => {
            let linked = conn.execute(
                "INSERT OR IGNORE INTO table_word_pairs (table_id, word_pair_id) VALUES (?1, ?2)",
                [table_id, id],
            )?;
            if linked > 0 {
                AddWordOutcome::Linked(id)
            } else {
                AddWordOutcome::AlreadyInTable(id)
            }
        }
        None => {
            conn.execute(
                "INSERT INTO word_pairs (foreign_word, translation, language_id) VALUES (?1, ?2, ?3)",
                params![foreign_word, translation, language_id],
            )?;
            let id = conn.last_insert_rowid();
            conn.execute(
                "INSERT INTO table_word_pairs (table_id, word_pair_id) VALUES (?1, ?2)",
                [table_id, id],
            )?;
            AddWordOutcome::Created(id)
        }
    };

    Ok(outcome)
}

/// Subscription columns as stored, before the JSON maps are decoded
struct SubscriptionRow {
    id: i64,
    learner_id: i64,
    table_id: i64,
    leitner_boxes: String,
    last_quiz_results: String,
    quiz_attempts: i64,
    total_questions: i64,
    total_right: i64,
    average_percentage_score: Option<i64>,
    last_quiz_date: Option<NaiveDate>,
    subscription_date: NaiveDate,
}

impl SubscriptionRow {
    fn decode(self) -> Result<Subscription> {
        let leitner_boxes: LeitnerBoxes = serde_json::from_str(&self.leitner_boxes)?;
        let last_quiz_results: QuizResults = serde_json::from_str(&self.last_quiz_results)?;
        Ok(Subscription {
            id: self.id,
            learner_id: self.learner_id,
            table_id: self.table_id,
            leitner_boxes,
            last_quiz_results,
            quiz_attempts: self.quiz_attempts,
            total_questions: self.total_questions,
            total_right: self.total_right,
            average_percentage_score: self.average_percentage_score,
            last_quiz_date: self.last_quiz_date,
            subscription_date: self.subscription_date,
        })
    }
}

fn find_subscription_with(conn: &Connection, learner_id: i64, table_id: i64) -> Result<Option<Subscription>> {
    let row = conn
        .query_row(
            r#"
            SELECT id, learner_id, table_id, leitner_boxes, last_quiz_results, quiz_attempts,
                   total_questions, total_right, average_percentage_score, last_quiz_date,
                   subscription_date
            FROM subscriptions WHERE learner_id = ?1 AND table_id = ?2
            "#,
            [learner_id, table_id],
            |row| {
                Ok(SubscriptionRow {
                    id: row.get(0)?,
                    learner_id: row.get(1)?,
                    table_id: row.get(2)?,
                    leitner_boxes: row.get(3)?,
                    last_quiz_results: row.get(4)?,
                    quiz_attempts: row.get(5)?,
                    total_questions: row.get(6)?,
                    total_right: row.get(7)?,
                    average_percentage_score: row.get(8)?,
                    last_quiz_date: row.get(9)?,
                    subscription_date: row.get(10)?,
                })
            },
        )
        .optional()?;

    row.map(SubscriptionRow::decode).transpose()
}
