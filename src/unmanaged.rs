//! Unmanaged Hive tables over Parquet files staged in object storage
//!
//! An unmanaged table is declared with an explicit `external_location`; the
//! catalog only records metadata, so dropping the table leaves the files in
//! place and they have to be deleted separately.

use anyhow::{Context, Result};
use arrow::datatypes::Schema;
use arrow::record_batch::RecordBatch;
use derive_builder::Builder;
use std::path::PathBuf;
use tracing::{debug, info};

use crate::config::{DEFAULT_INDENT, DEFAULT_PREFIX_TEMPLATE};
use crate::db::executor::{ResultRow, SqlExecutor, do_sql};
use crate::db::literal::string_array_literal;
use crate::db::schema::{TypeMap, create_table_schema_pairs};
use crate::db::table::TableLocation;
use crate::frame::parquet::{parquet_file_name, write_parquet, write_partitioned_parquet};
use crate::io::{Bucket, external_location, prefix_dir, staged_prefix, upload_directory};

/// How a batch is staged as Parquet under a table prefix
#[derive(Debug, Clone, Builder)]
pub struct StagingOptions {
    /// Write a Hive-partitioned tree keyed by these columns
    #[builder(setter(into), default)]
    pub partition_columns: Vec<String>,

    /// When false, objects already under the prefix are deleted first
    #[builder(default = "true")]
    pub append: bool,

    /// Local directory for the temporary Parquet files
    #[builder(setter(into), default = "std::env::temp_dir()")]
    pub work_dir: PathBuf,

    /// Prefix template, see [`staged_prefix`]
    #[builder(setter(into), default = "DEFAULT_PREFIX_TEMPLATE.to_string()")]
    pub prefix: String,

    #[builder(default)]
    pub verbose: bool,
}

impl Default for StagingOptions {
    fn default() -> Self {
        Self {
            partition_columns: Vec::new(),
            append: true,
            work_dir: std::env::temp_dir(),
            prefix: DEFAULT_PREFIX_TEMPLATE.to_string(),
            verbose: false,
        }
    }
}

/// Drop the table `location` and delete its staged objects
///
/// Both steps are attempted even if the first fails; the first error is
/// returned.
pub async fn drop_unmanaged_table(
    location: &TableLocation,
    conn: &dyn SqlExecutor,
    bucket: &dyn Bucket,
    prefix_template: &str,
    verbose: bool,
) -> Result<Option<Vec<ResultRow>>> {
    let dropped = do_sql(
        &format!("drop table if exists {}", location.fq_name()),
        conn,
        verbose,
    )
    .await;
    let deleted =
        drop_unmanaged_data(&location.schema, &location.table, bucket, prefix_template, verbose)
            .await;

    let rows = dropped?;
    deleted?;
    Ok(rows)
}

/// Delete every object staged for `schema.table`, returning how many there were
pub async fn drop_unmanaged_data(
    schema: &str,
    table: &str,
    bucket: &dyn Bucket,
    prefix_template: &str,
    verbose: bool,
) -> Result<usize> {
    let prefix = prefix_dir(&staged_prefix(prefix_template, schema, table));
    let deleted = bucket
        .delete_prefix(&prefix)
        .await
        .with_context(|| format!("Failed to delete s3://{}/{prefix}", bucket.name()))?;

    if verbose {
        info!("deleted {deleted} objects under {prefix}");
    } else {
        debug!(deleted, %prefix, "deleted staged objects");
    }
    Ok(deleted)
}

/// Stage `batch` as Parquet under the prefix for `schema.table`
///
/// Without partition columns a single `<uuid>.parquet` object is written;
/// otherwise the partitioned tree is uploaded with its relative layout. The
/// local copy is removed before returning. Returns the uploaded keys.
pub async fn ingest_unmanaged_parquet(
    batch: &RecordBatch,
    schema: &str,
    table: &str,
    bucket: &dyn Bucket,
    opts: &StagingOptions,
) -> Result<Vec<String>> {
    let prefix = staged_prefix(&opts.prefix, schema, table);

    if !opts.append {
        drop_unmanaged_data(schema, table, bucket, &opts.prefix, opts.verbose).await?;
    }

    let work = tempfile::Builder::new()
        .prefix(&format!("{table}-"))
        .tempdir_in(&opts.work_dir)
        .with_context(|| format!("Failed to create work dir in {}", opts.work_dir.display()))?;

    let keys = if opts.partition_columns.is_empty() {
        let name = parquet_file_name();
        let local = work.path().join(&name);
        write_parquet(batch, &local)?;

        let key = format!("{prefix}/{name}");
        if opts.verbose {
            info!("{}  -->  {key}", local.display());
        }
        bucket.upload_file(&local, &key).await?;
        vec![key]
    } else {
        let files = write_partitioned_parquet(batch, work.path(), &opts.partition_columns)?;
        debug!(files = files.len(), "wrote partitioned parquet tree");
        upload_directory(bucket, work.path(), &prefix).await?
    };

    work.close().context("Failed to remove local staging files")?;

    if opts.verbose {
        info!(
            "staged {} rows as {} objects in {}",
            batch.num_rows(),
            keys.len(),
            external_location(bucket.name(), &prefix)
        );
    }
    Ok(keys)
}

/// DDL declaring an external Parquet table over a staged prefix
pub fn external_tabledef(
    location: &TableLocation,
    columnschema: &str,
    bucket_name: &str,
    partition_columns: &[String],
    prefix_template: &str,
) -> String {
    let prefix = staged_prefix(prefix_template, &location.schema, &location.table);

    let mut tabledef = format!(
        "create table if not exists {} (\n{columnschema}\n) with (\n    format = 'parquet',\n",
        location.fq_name()
    );
    if !partition_columns.is_empty() {
        tabledef.push_str(&format!(
            "    partitioned_by = {},\n",
            string_array_literal(partition_columns)
        ));
    }
    tabledef.push_str(&format!(
        "    external_location = '{}'\n)",
        external_location(bucket_name, &prefix)
    ));
    tabledef
}

/// DDL for an unmanaged table holding data shaped like `schema`
///
/// Partition columns must already be the last columns of `schema`.
pub fn unmanaged_parquet_tabledef(
    schema: &Schema,
    location: &TableLocation,
    bucket_name: &str,
    partition_columns: &[String],
    typemap: &TypeMap,
    colmap: &TypeMap,
    prefix_template: &str,
) -> Result<String> {
    let columnschema = create_table_schema_pairs(schema, typemap, colmap, DEFAULT_INDENT)?;
    let tabledef = external_tabledef(
        location,
        &columnschema,
        bucket_name,
        partition_columns,
        prefix_template,
    );
    debug!("{tabledef}");
    Ok(tabledef)
}
