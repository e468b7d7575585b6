use async_trait::async_trait;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{Row, SqlitePool};

use crate::error::IngestionResult;
use crate::types::{EmployeeRecord, IngestionBatch, StoredRecord};

use super::TimesheetStore;

const CREATE_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS time_summary (
        id          INTEGER PRIMARY KEY AUTOINCREMENT,
        first_name  TEXT,
        last_name   TEXT,
        due_date    TEXT NOT NULL,
        work_status TEXT,
        attendance  TEXT
    )
"#;

/// SQLite-backed [`TimesheetStore`].
#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Connect to `database_url` and make sure the schema exists.
    ///
    /// In-memory databases are limited to a single pooled connection so every query sees the
    /// same database.
    pub async fn connect(database_url: &str) -> IngestionResult<Self> {
        let mut options = SqlitePoolOptions::new().max_connections(5);
        if database_url.contains(":memory:") {
            // dropping the last connection drops the database
            options = options
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None);
        }
        let pool = options.connect(database_url).await?;
        Self::from_pool(pool).await
    }

    /// Wrap an existing pool, creating the schema if needed.
    pub async fn from_pool(pool: SqlitePool) -> IngestionResult<Self> {
        sqlx::query(CREATE_TABLE).execute(&pool).await?;
        Ok(Self { pool })
    }
}

#[async_trait]
impl TimesheetStore for SqliteStore {
    async fn persist(&self, batch: &IngestionBatch) -> IngestionResult<u64> {
        let mut tx = self.pool.begin().await?;
        for r in batch.records() {
            sqlx::query(
                r#"
                INSERT INTO time_summary (first_name, last_name, due_date, work_status, attendance)
                VALUES (?, ?, ?, ?, ?)
                "#,
            )
            .bind(r.first_name.as_deref())
            .bind(r.last_name.as_deref())
            .bind(r.due_date.as_str())
            .bind(r.work_status.as_deref())
            .bind(r.attendance.as_deref())
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(batch.len() as u64)
    }

    async fn fetch_all(&self) -> IngestionResult<Vec<StoredRecord>> {
        let rows = sqlx::query(
            r#"
            SELECT id, first_name, last_name, due_date, work_status, attendance
            FROM time_summary
            ORDER BY due_date DESC, id ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            out.push(StoredRecord {
                id: row.try_get("id")?,
                record: EmployeeRecord {
                    first_name: row.try_get("first_name")?,
                    last_name: row.try_get("last_name")?,
                    due_date: row.try_get("due_date")?,
                    work_status: row.try_get("work_status")?,
                    attendance: row.try_get("attendance")?,
                },
            });
        }
        Ok(out)
    }

    async fn delete_all(&self) -> IngestionResult<u64> {
        let result = sqlx::query("DELETE FROM time_summary")
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(first: &str, due: &str) -> EmployeeRecord {
        EmployeeRecord {
            first_name: Some(first.to_string()),
            last_name: None,
            due_date: due.to_string(),
            work_status: Some("WorkFromOffice".to_string()),
            attendance: Some("Present".to_string()),
        }
    }

    #[tokio::test]
    async fn persist_then_fetch_orders_by_due_date_desc() {
        let store = SqliteStore::connect("sqlite::memory:").await.unwrap();
        let batch = IngestionBatch::new(vec![
            record("a", "2024-01-01"),
            record("b", "2024-03-01"),
            record("c", "2024-02-01"),
        ]);
        assert_eq!(store.persist(&batch).await.unwrap(), 3);

        let all = store.fetch_all().await.unwrap();
        let names: Vec<_> = all
            .iter()
            .map(|r| r.record.first_name.as_deref().unwrap())
            .collect();
        assert_eq!(names, vec!["b", "c", "a"]);
        assert_eq!(all[0].record.last_name, None);
    }

    #[tokio::test]
    async fn delete_all_is_idempotent() {
        let store = SqliteStore::connect("sqlite::memory:").await.unwrap();
        store
            .persist(&IngestionBatch::new(vec![record("a", "2024-01-01")]))
            .await
            .unwrap();

        assert_eq!(store.delete_all().await.unwrap(), 1);
        assert_eq!(store.delete_all().await.unwrap(), 0);
        assert!(store.fetch_all().await.unwrap().is_empty());
    }
}
