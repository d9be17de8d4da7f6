//! SQL execution seam
//!
//! Everything that issues statements goes through [`SqlExecutor`], so the
//! orchestration code can run against Trino in production and against an
//! in-memory recorder or SQLite in tests.

use anyhow::Result;
use async_trait::async_trait;
use tracing::{debug, info};

/// One result row as returned by the engine
pub type ResultRow = Vec<serde_json::Value>;

/// Result of executing a single statement
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryResult {
    pub columns: Vec<String>,
    /// `None` for statements that produce no result set
    pub rows: Option<Vec<ResultRow>>,
}

impl QueryResult {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn returns_rows(&self) -> bool {
        self.rows.is_some()
    }
}

#[async_trait]
pub trait SqlExecutor: Send + Sync {
    /// Execute one statement and wait for it to finish
    async fn execute(&self, sql: &str) -> Result<QueryResult>;
}

/// Statement text as sent to the engine
///
/// The literal encoder writes `:` inside string literals as `\:` so that
/// bind-parameter parsers leave it alone. Executors that do not parse bind
/// parameters send the plain colon.
pub fn statement_text(sql: &str) -> String {
    sql.replace("\\:", ":")
}

/// Execute `sql` and return its rows, or `None` if it returns no rows
pub async fn do_sql(
    sql: &str,
    conn: &dyn SqlExecutor,
    verbose: bool,
) -> Result<Option<Vec<ResultRow>>> {
    if verbose {
        info!("{sql}");
    } else {
        debug!("{sql}");
    }

    let result = conn.execute(sql).await?;

    if verbose {
        match &result.rows {
            Some(rows) => info!(rows = rows.len(), "statement returned rows"),
            None => info!("statement returned no rows"),
        }
    }
    Ok(result.rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::RecordingExecutor;

    #[test]
    fn test_statement_text() {
        assert_eq!(
            statement_text("insert into t values\n('\\:f', 'a''b')"),
            "insert into t values\n(':f', 'a''b')"
        );
        assert_eq!(statement_text("select 1"), "select 1");
    }

    #[tokio::test]
    async fn test_do_sql_returns_rows() {
        let conn = RecordingExecutor::new().with_rows(vec![vec![serde_json::json!(1)]]);

        let rows = do_sql("select 1", &conn, true).await.unwrap();
        assert_eq!(rows, Some(vec![vec![serde_json::json!(1)]]));

        assert_eq!(conn.statements(), vec!["select 1"]);
    }

    #[tokio::test]
    async fn test_do_sql_propagates_errors() {
        let conn = RecordingExecutor::new().fail_on("drop table");

        let err = do_sql("drop table if exists x", &conn, false)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("drop table if exists x"));
    }
}
