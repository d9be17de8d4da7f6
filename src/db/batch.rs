//! Batched `INSERT ... VALUES` loading
//!
//! Rows are encoded as SQL literal tuples and sent in multi-row
//! `insert into <table> values` statements of at most `batch_size` rows.
//! Trino has no usable bulk-bind path, so every value is rendered inline by
//! the literal encoder.

use anyhow::Result;
use arrow::record_batch::RecordBatch;
use async_trait::async_trait;
use derive_builder::Builder;
use tracing::{debug, info};

use super::executor::{SqlExecutor, do_sql};
use super::literal::{Row, row_literal};
use super::table::TableRef;
use crate::config::{BATCH_PREVIEW_ROWS, DEFAULT_BATCH_SIZE};
use crate::error::IngestError;
use crate::frame::column_names;
use crate::frame::conversion::record_batch_to_rows;

/// A strategy for writing rows into a table
#[async_trait]
pub trait InsertMethod: Send + Sync {
    async fn insert_batch(
        &self,
        table: &TableRef,
        conn: &dyn SqlExecutor,
        columns: &[String],
        rows: Vec<Row>,
    ) -> Result<()>;
}

/// Multi-row literal inserts, optionally followed by a table optimize
#[derive(Debug, Clone, Builder)]
#[builder(build_fn(validate = "Self::validate"))]
pub struct BatchInsert {
    /// Catalog prepended to the table name
    #[builder(setter(into, strip_option), default)]
    pub catalog: Option<String>,

    /// Schema used instead of the table's own schema
    #[builder(setter(into, strip_option), default)]
    pub schema: Option<String>,

    #[builder(default = "DEFAULT_BATCH_SIZE")]
    pub batch_size: usize,

    /// Run `alter table ... execute optimize` after the last batch
    #[builder(default)]
    pub optimize: bool,

    #[builder(default)]
    pub verbose: bool,
}

impl BatchInsertBuilder {
    fn validate(&self) -> Result<(), String> {
        if self.batch_size == Some(0) {
            return Err(IngestError::InvalidBatchSize.to_string());
        }
        Ok(())
    }
}

impl Default for BatchInsert {
    fn default() -> Self {
        Self {
            catalog: None,
            schema: None,
            batch_size: DEFAULT_BATCH_SIZE,
            optimize: false,
            verbose: false,
        }
    }
}

impl BatchInsert {
    /// `[catalog.]schema.table`, preferring this inserter's schema over the table's
    pub fn full_table_name(&self, table: &TableRef) -> Result<String, IngestError> {
        let schema = self
            .schema
            .as_ref()
            .or(table.schema.as_ref())
            .ok_or_else(|| IngestError::MissingSchema(table.name.clone()))?;

        Ok(match &self.catalog {
            Some(catalog) => format!("{catalog}.{schema}.{}", table.name),
            None => format!("{schema}.{}", table.name),
        })
    }

    async fn flush(&self, conn: &dyn SqlExecutor, fq_name: &str, batch: &[String]) -> Result<()> {
        if self.verbose {
            info!("inserting {} records", batch.len());
            for line in preview_batch(batch) {
                info!("  {line}");
            }
        }

        let sql = format!("insert into {fq_name} values\n{}", batch.join(",\n"));
        let rows = do_sql(&sql, conn, false).await?;

        if self.verbose {
            info!("batch insert result: {:?}", rows);
        }
        Ok(())
    }
}

#[async_trait]
impl InsertMethod for BatchInsert {
    async fn insert_batch(
        &self,
        table: &TableRef,
        conn: &dyn SqlExecutor,
        columns: &[String],
        rows: Vec<Row>,
    ) -> Result<()> {
        let fq_name = self.full_table_name(table)?;
        debug!(table = %fq_name, ?columns, rows = rows.len(), "batch insert");

        let mut batch: Vec<String> = Vec::with_capacity(self.batch_size.min(rows.len()));
        for row in &rows {
            batch.push(row_literal(row));
            if batch.len() >= self.batch_size {
                self.flush(conn, &fq_name, &batch).await?;
                batch.clear();
            }
        }
        if !batch.is_empty() {
            self.flush(conn, &fq_name, &batch).await?;
        }

        if self.optimize {
            if self.verbose {
                info!("optimizing table files");
            }
            let result = do_sql(
                &format!("alter table {fq_name} execute optimize"),
                conn,
                false,
            )
            .await?;
            if self.verbose {
                info!("execute optimize: {:?}", result);
            }
        }

        Ok(())
    }
}

/// Lines shown when logging a batch: everything for short batches, otherwise
/// the first three rows, an ellipsis and the last row
pub fn preview_batch(batch: &[String]) -> Vec<&str> {
    if batch.len() <= BATCH_PREVIEW_ROWS {
        return batch.iter().map(String::as_str).collect();
    }
    let mut lines: Vec<&str> = batch[..3].iter().map(String::as_str).collect();
    lines.push("...");
    if let Some(last) = batch.last() {
        lines.push(last);
    }
    lines
}

/// Insert every row of an Arrow batch into `table` using `method`
pub async fn insert_record_batch(
    method: &dyn InsertMethod,
    table: &TableRef,
    conn: &dyn SqlExecutor,
    batch: &RecordBatch,
) -> Result<()> {
    let columns = column_names(&batch.schema());
    let rows = record_batch_to_rows(batch)?;
    method.insert_batch(table, conn, &columns, rows).await
}
