//! Test doubles for the SQL and object-storage seams

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use sqlx::SqlitePool;
use sqlx::sqlite::SqlitePoolOptions;
use std::path::Path;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::db::executor::{QueryResult, ResultRow, SqlExecutor, statement_text};
use crate::io::{Bucket, LocalBucket};

/// Records every statement; optionally fails statements containing a pattern
#[derive(Debug, Default)]
pub struct RecordingExecutor {
    statements: Mutex<Vec<String>>,
    fail_on: Option<String>,
    rows: Option<Vec<ResultRow>>,
}

impl RecordingExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_on(mut self, pattern: &str) -> Self {
        self.fail_on = Some(pattern.to_string());
        self
    }

    /// Rows returned for every statement
    pub fn with_rows(mut self, rows: Vec<ResultRow>) -> Self {
        self.rows = Some(rows);
        self
    }

    pub fn statements(&self) -> Vec<String> {
        self.statements.lock().unwrap().clone()
    }

    pub fn count_matching(&self, prefix: &str) -> usize {
        self.statements()
            .iter()
            .filter(|s| s.starts_with(prefix))
            .count()
    }
}

#[async_trait]
impl SqlExecutor for RecordingExecutor {
    async fn execute(&self, sql: &str) -> Result<QueryResult> {
        self.statements.lock().unwrap().push(sql.to_string());
        if let Some(pattern) = &self.fail_on
            && sql.contains(pattern.as_str())
        {
            return Err(anyhow!("simulated failure: {sql}"));
        }
        Ok(QueryResult {
            columns: Vec::new(),
            rows: self.rows.clone(),
        })
    }
}

/// Executes statements against an in-memory SQLite database
pub struct SqliteExecutor {
    pool: SqlitePool,
}

impl SqliteExecutor {
    pub async fn in_memory() -> Result<Self> {
        // one connection, so every statement sees the same in-memory database
        let pool = SqlitePoolOptions::new()
            .min_connections(1)
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl SqlExecutor for SqliteExecutor {
    async fn execute(&self, sql: &str) -> Result<QueryResult> {
        sqlx::query(&statement_text(sql))
            .execute(&self.pool)
            .await?;
        Ok(QueryResult::empty())
    }
}

/// Local bucket that counts prefix deletions
#[derive(Debug)]
pub struct CountingBucket {
    inner: LocalBucket,
    prefix_deletes: AtomicUsize,
}

impl CountingBucket {
    pub fn new(root: &Path) -> Self {
        Self {
            inner: LocalBucket::new("test-bucket", root),
            prefix_deletes: AtomicUsize::new(0),
        }
    }

    pub fn prefix_deletes(&self) -> usize {
        self.prefix_deletes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Bucket for CountingBucket {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn upload_file(&self, path: &Path, key: &str) -> Result<()> {
        self.inner.upload_file(path, key).await
    }

    async fn list_keys(&self, prefix: &str) -> Result<Vec<String>> {
        self.inner.list_keys(prefix).await
    }

    async fn delete_keys(&self, keys: &[String]) -> Result<()> {
        self.inner.delete_keys(keys).await
    }

    async fn delete_prefix(&self, prefix: &str) -> Result<usize> {
        self.prefix_deletes.fetch_add(1, Ordering::SeqCst);
        self.inner.delete_prefix(prefix).await
    }
}
