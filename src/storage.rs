//! SQLite storage layer for Wellnest.
//!
//! Three tables:
//!
//! - `tasks`: to-do items, one row per task
//! - `mood_entries`: mood logs with optional journal text
//! - `daily_picks`: key-value rows backing [`PickStore`]
//!
//! Timestamps are stored as Unix milliseconds (UTC). Priority and category are
//! stored as their plain strings so that unknown values survive a round trip.

use std::collections::HashSet;
use std::time::Duration;

use anyhow::{Context, anyhow};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::Row;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions, SqliteRow};

use crate::daily_pick::PickStore;
use crate::model::{Category, Mood, MoodEntry, PositionUpdate, Priority, Task};

const TASK_COLUMNS: &str = "id, user_id, text, completed, category, priority, due_date, \
                            position, notes, created_at, updated_at";

/// Database connection pool wrapper.
#[derive(Clone)]
pub struct Storage {
    pool: SqlitePool,
}

impl Storage {
    /// Create a new storage instance and initialize the schema.
    ///
    /// # Arguments
    ///
    /// * `database_url` - SQLite connection string (e.g., "sqlite:wellnest.db" or "sqlite::memory:")
    pub async fn new(database_url: &str) -> anyhow::Result<Self> {
        // Every connection to an in-memory database is a separate database,
        // so those get exactly one long-lived connection.
        let options = if database_url.contains(":memory:") {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None::<Duration>)
                .max_lifetime(None::<Duration>)
        } else {
            SqlitePoolOptions::new().max_connections(5)
        };

        let pool = options
            .connect(database_url)
            .await
            .with_context(|| format!("failed to open database {database_url}"))?;

        let storage = Self { pool };
        storage.initialize_schema().await?;

        Ok(storage)
    }

    /// Create the database schema if it doesn't exist.
    async fn initialize_schema(&self) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS tasks (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id TEXT NOT NULL,
                text TEXT NOT NULL,
                completed INTEGER NOT NULL DEFAULT 0,
                category TEXT NOT NULL,
                priority TEXT NOT NULL,
                due_date INTEGER,
                position INTEGER NOT NULL DEFAULT 0,
                notes TEXT NOT NULL DEFAULT '',
                created_at INTEGER NOT NULL,
                updated_at INTEGER NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_tasks_user_position
            ON tasks(user_id, position)
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS mood_entries (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id TEXT NOT NULL,
                mood TEXT NOT NULL,
                journal TEXT NOT NULL DEFAULT '',
                predicted_mood TEXT,
                created_at INTEGER NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_mood_entries_user_created
            ON mood_entries(user_id, created_at)
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS daily_picks (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    // ------------------------------------------------------------------
    // Tasks
    // ------------------------------------------------------------------

    /// Insert a task and return it with its assigned id. `task.id` is ignored.
    pub async fn insert_task(&self, task: &Task) -> anyhow::Result<Task> {
        let result = sqlx::query(
            r#"
            INSERT INTO tasks
                (user_id, text, completed, category, priority, due_date,
                 position, notes, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&task.user_id)
        .bind(&task.text)
        .bind(task.completed)
        .bind(task.category.as_str())
        .bind(task.priority.as_str())
        .bind(task.due_date.map(|d| d.timestamp_millis()))
        .bind(task.position)
        .bind(&task.notes)
        .bind(task.created_at.timestamp_millis())
        .bind(task.updated_at.timestamp_millis())
        .execute(&self.pool)
        .await?;

        Ok(Task {
            id: result.last_insert_rowid(),
            ..task.clone()
        })
    }

    /// Position for a new task: one past the user's highest, or 0.
    pub async fn next_position(&self, user_id: &str) -> anyhow::Result<i64> {
        let row = sqlx::query("SELECT MAX(position) AS max_position FROM tasks WHERE user_id = ?")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await?;

        let max: Option<i64> = row.try_get("max_position")?;
        Ok(max.map_or(0, |p| p + 1))
    }

    /// All tasks of a user, by position then newest first.
    pub async fn list_tasks(&self, user_id: &str) -> anyhow::Result<Vec<Task>> {
        let rows = sqlx::query(&format!(
            "SELECT {TASK_COLUMNS} FROM tasks WHERE user_id = ? \
             ORDER BY position ASC, created_at DESC"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(task_from_row).collect()
    }

    /// Tasks of a user in one category. `"all"` returns every task.
    pub async fn list_tasks_by_category(
        &self,
        user_id: &str,
        category: &str,
    ) -> anyhow::Result<Vec<Task>> {
        if category == "all" {
            return self.list_tasks(user_id).await;
        }

        let rows = sqlx::query(&format!(
            "SELECT {TASK_COLUMNS} FROM tasks WHERE user_id = ? AND category = ? \
             ORDER BY position ASC, created_at DESC"
        ))
        .bind(user_id)
        .bind(category)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(task_from_row).collect()
    }

    pub async fn get_task(&self, id: i64) -> anyhow::Result<Option<Task>> {
        let row = sqlx::query(&format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(task_from_row).transpose()
    }

    /// Overwrite every mutable column of an existing task.
    pub async fn update_task(&self, task: &Task) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            UPDATE tasks
            SET text = ?, completed = ?, category = ?, priority = ?, due_date = ?,
                position = ?, notes = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&task.text)
        .bind(task.completed)
        .bind(task.category.as_str())
        .bind(task.priority.as_str())
        .bind(task.due_date.map(|d| d.timestamp_millis()))
        .bind(task.position)
        .bind(&task.notes)
        .bind(task.updated_at.timestamp_millis())
        .bind(task.id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Returns whether a row was deleted.
    pub async fn delete_task(&self, id: i64) -> anyhow::Result<bool> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Apply a batch of position changes atomically.
    ///
    /// Returns `false`, and changes nothing, if any id is missing, repeated or
    /// belongs to another user.
    pub async fn update_positions(
        &self,
        user_id: &str,
        updates: &[PositionUpdate],
    ) -> anyhow::Result<bool> {
        let mut seen = HashSet::with_capacity(updates.len());
        if !updates.iter().all(|update| seen.insert(update.id)) {
            return Ok(false);
        }

        let mut tx = self.pool.begin().await?;

        for update in updates {
            let result = sqlx::query("UPDATE tasks SET position = ? WHERE id = ? AND user_id = ?")
                .bind(update.position)
                .bind(update.id)
                .bind(user_id)
                .execute(&mut *tx)
                .await?;

            if result.rows_affected() == 0 {
                tx.rollback().await?;
                return Ok(false);
            }
        }

        tx.commit().await?;
        Ok(true)
    }

    /// Delete the user's completed tasks and return how many were removed.
    pub async fn clear_completed(&self, user_id: &str) -> anyhow::Result<u64> {
        let result = sqlx::query("DELETE FROM tasks WHERE user_id = ? AND completed = 1")
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    // ------------------------------------------------------------------
    // Mood entries
    // ------------------------------------------------------------------

    /// Insert a mood entry and return it with its assigned id.
    pub async fn insert_mood_entry(&self, entry: &MoodEntry) -> anyhow::Result<MoodEntry> {
        let result = sqlx::query(
            r#"
            INSERT INTO mood_entries (user_id, mood, journal, predicted_mood, created_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&entry.user_id)
        .bind(entry.mood.as_str())
        .bind(&entry.journal)
        .bind(entry.predicted_mood.map(Mood::as_str))
        .bind(entry.created_at.timestamp_millis())
        .execute(&self.pool)
        .await?;

        Ok(MoodEntry {
            id: result.last_insert_rowid(),
            ..entry.clone()
        })
    }

    /// All mood entries of a user, newest first.
    pub async fn list_mood_entries(&self, user_id: &str) -> anyhow::Result<Vec<MoodEntry>> {
        let rows = sqlx::query(
            r#"
            SELECT id, user_id, mood, journal, predicted_mood, created_at
            FROM mood_entries
            WHERE user_id = ?
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(mood_entry_from_row).collect()
    }

    pub async fn get_mood_entry(&self, id: i64) -> anyhow::Result<Option<MoodEntry>> {
        let row = sqlx::query(
            r#"
            SELECT id, user_id, mood, journal, predicted_mood, created_at
            FROM mood_entries
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(mood_entry_from_row).transpose()
    }
}

#[async_trait]
impl PickStore for Storage {
    async fn get(&self, key: &str) -> anyhow::Result<Option<String>> {
        let row = sqlx::query("SELECT value FROM daily_picks WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|r| r.try_get("value")).transpose()?)
    }

    async fn put(&self, key: &str, value: &str) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO daily_picks (key, value) VALUES (?, ?)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value
            "#,
        )
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

fn from_millis(ms: i64) -> anyhow::Result<DateTime<Utc>> {
    DateTime::from_timestamp_millis(ms).ok_or_else(|| anyhow!("timestamp out of range: {ms}"))
}

fn parse_mood(raw: &str) -> anyhow::Result<Mood> {
    Mood::parse(raw).ok_or_else(|| anyhow!("unknown mood '{raw}' in storage"))
}

fn task_from_row(row: &SqliteRow) -> anyhow::Result<Task> {
    let due_date: Option<i64> = row.try_get("due_date")?;
    let category: String = row.try_get("category")?;
    let priority: String = row.try_get("priority")?;

    Ok(Task {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        text: row.try_get("text")?,
        completed: row.try_get("completed")?,
        category: Category::from(category),
        priority: Priority::from(priority),
        due_date: due_date.map(from_millis).transpose()?,
        position: row.try_get("position")?,
        notes: row.try_get("notes")?,
        created_at: from_millis(row.try_get("created_at")?)?,
        updated_at: from_millis(row.try_get("updated_at")?)?,
    })
}

fn mood_entry_from_row(row: &SqliteRow) -> anyhow::Result<MoodEntry> {
    let mood: String = row.try_get("mood")?;
    let predicted: Option<String> = row.try_get("predicted_mood")?;

    Ok(MoodEntry {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        mood: parse_mood(&mood)?,
        journal: row.try_get("journal")?,
        predicted_mood: predicted.as_deref().map(parse_mood).transpose()?,
        created_at: from_millis(row.try_get("created_at")?)?,
    })
}
