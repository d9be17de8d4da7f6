//! High-level bulk load through a temporary unmanaged Hive table.
//!
//! Row-by-row inserts are too slow for large volumes. Instead the data is
//! staged as Parquet in object storage, declared as a temporary external
//! table, and copied into the destination with one `insert ... select`.
//!
//! This is the primary API for the CLI `load` command.

use anyhow::Result;
use arrow::record_batch::RecordBatch;
use derive_builder::Builder;
use std::path::PathBuf;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::{DEFAULT_INDENT, DEFAULT_PREFIX_TEMPLATE, TEMP_TABLE_PREFIX};
use crate::db::executor::{SqlExecutor, do_sql};
use crate::db::literal::string_array_literal;
use crate::db::schema::{TypeMap, create_table_schema_pairs};
use crate::db::table::TableLocation;
use crate::frame::enforce_partition_column_order;
use crate::io::Bucket;
use crate::unmanaged::{
    StagingOptionsBuilder, drop_unmanaged_table, external_tabledef, ingest_unmanaged_parquet,
};

/// Arguments for a bulk load via a temporary Hive table
#[derive(Debug, Clone, Builder)]
pub struct IngestArgs {
    /// Destination catalog; omitted from the table name when `None`
    #[builder(setter(into, strip_option), default)]
    pub catalog: Option<String>,
    #[builder(setter(into))]
    pub schema: String,
    #[builder(setter(into))]
    pub table: String,

    /// Catalog and schema in which the temporary table is declared
    #[builder(setter(into))]
    pub hive_catalog: String,
    #[builder(setter(into))]
    pub hive_schema: String,

    #[builder(setter(into), default)]
    pub partition_columns: Vec<String>,

    /// Delete existing destination rows before the copy
    ///
    /// The delete and the copy are separate statements, so concurrent readers
    /// can see an empty table in between.
    #[builder(default)]
    pub overwrite: bool,

    #[builder(default)]
    pub typemap: TypeMap,
    #[builder(default)]
    pub colmap: TypeMap,

    #[builder(setter(into), default = "DEFAULT_PREFIX_TEMPLATE.to_string()")]
    pub prefix: String,
    #[builder(setter(into), default = "std::env::temp_dir()")]
    pub work_dir: PathBuf,

    #[builder(default)]
    pub verbose: bool,
}

impl IngestArgs {
    /// `[catalog.]schema.table` of the destination
    pub fn destination(&self) -> String {
        match &self.catalog {
            Some(catalog) => format!("{catalog}.{}.{}", self.schema, self.table),
            None => format!("{}.{}", self.schema, self.table),
        }
    }
}

/// Summary of a completed bulk load
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestReport {
    pub destination: String,
    /// Fully qualified name of the (already dropped) temporary table
    pub temp_table: String,
    pub rows: usize,
    pub staged_objects: usize,
}

/// Name for a temporary table, `ingest_temp_<8 hex chars>`
pub fn temp_table_name() -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!("{TEMP_TABLE_PREFIX}{}", &suffix[..8])
}

/// DDL for the managed destination table
pub fn managed_tabledef(
    destination: &str,
    columnschema: &str,
    partition_columns: &[String],
) -> String {
    let mut tabledef = format!(
        "create table if not exists {destination} (\n{columnschema}\n) with (\n    format = 'parquet'"
    );
    if !partition_columns.is_empty() {
        tabledef.push_str(&format!(
            ",\n    partitioning = {}",
            string_array_literal(partition_columns)
        ));
    }
    tabledef.push_str("\n)");
    tabledef
}

/// Load `batch` into the destination table through a temporary Hive table
///
/// The temporary table and its staged objects are removed whatever happens
/// once staging has started. If a load step fails, that error is returned
/// unchanged after cleanup; a cleanup failure is only reported when the load
/// itself succeeded.
///
/// # Example
///
/// ```no_run
/// use trino_ingest::credentials::{S3Config, TrinoConfig};
/// use trino_ingest::db::trino::attach_trino_engine;
/// use trino_ingest::frame::parquet::read_parquet;
/// use trino_ingest::io::attach_s3_bucket;
/// use trino_ingest::runner::{IngestArgsBuilder, fast_ingest_via_hive};
///
/// # async fn example() -> anyhow::Result<()> {
/// let conn = attach_trino_engine(&TrinoConfig::from_env("TRINO")?, None, None, false).await?;
/// let bucket = attach_s3_bucket(&S3Config::from_env("S3_HIVE")?).await?;
/// let batch = read_parquet("emissions.parquet".as_ref())?;
///
/// let args = IngestArgsBuilder::default()
///     .catalog("osc_datacommons_dev")
///     .schema("demo")
///     .table("emissions")
///     .hive_catalog("osc_datacommons_hive_ingest")
///     .hive_schema("ingest")
///     .partition_columns(vec!["year".to_string()])
///     .build()?;
///
/// let report = fast_ingest_via_hive(&batch, &conn, &bucket, &args).await?;
/// println!("loaded {} rows into {}", report.rows, report.destination);
/// # Ok(())
/// # }
/// ```
pub async fn fast_ingest_via_hive(
    batch: &RecordBatch,
    conn: &dyn SqlExecutor,
    bucket: &dyn Bucket,
    args: &IngestArgs,
) -> Result<IngestReport> {
    if args.verbose && !args.partition_columns.is_empty() {
        info!("enforcing partition column order");
    }
    let batch = enforce_partition_column_order(batch, &args.partition_columns)?;

    // shared by the destination and the temporary table, so both declare the
    // same column order
    let columnschema = create_table_schema_pairs(
        &batch.schema(),
        &args.typemap,
        &args.colmap,
        DEFAULT_INDENT,
    )?;

    let temp = TableLocation::new(&args.hive_catalog, &args.hive_schema, temp_table_name());

    let outcome = stage_and_copy(&batch, conn, bucket, args, &columnschema, &temp).await;

    if args.verbose {
        info!("deleting table and data for intermediate table {temp}");
    }
    let cleanup = drop_unmanaged_table(&temp, conn, bucket, &args.prefix, args.verbose).await;

    match (outcome, cleanup) {
        (Ok(report), Ok(_)) => Ok(report),
        (Ok(_), Err(cleanup_err)) => Err(cleanup_err),
        (Err(err), Ok(_)) => Err(err),
        (Err(err), Err(cleanup_err)) => {
            warn!(error = %cleanup_err, "failed to clean up intermediate table {temp}");
            Err(err)
        }
    }
}

async fn stage_and_copy(
    batch: &RecordBatch,
    conn: &dyn SqlExecutor,
    bucket: &dyn Bucket,
    args: &IngestArgs,
    columnschema: &str,
    temp: &TableLocation,
) -> Result<IngestReport> {
    let destination = args.destination();

    if args.verbose {
        info!("staging parquet to bucket {}", bucket.name());
    }
    let staging = StagingOptionsBuilder::default()
        .partition_columns(args.partition_columns.clone())
        .work_dir(args.work_dir.clone())
        .prefix(args.prefix.clone())
        .verbose(args.verbose)
        .build()?;
    let keys = ingest_unmanaged_parquet(batch, &temp.schema, &temp.table, bucket, &staging).await?;

    if args.verbose {
        info!("verifying existence of table {destination}");
    }
    let tabledef = managed_tabledef(&destination, columnschema, &args.partition_columns);
    do_sql(&tabledef, conn, args.verbose).await?;

    if args.verbose {
        info!("declaring intermediate hive table {temp}");
    }
    let tabledef = external_tabledef(
        temp,
        columnschema,
        bucket.name(),
        &args.partition_columns,
        &args.prefix,
    );
    do_sql(&tabledef, conn, args.verbose).await?;

    if !args.partition_columns.is_empty() {
        if args.verbose {
            info!("syncing partition metadata on intermediate hive table");
        }
        let sql = format!(
            "call {}.system.sync_partition_metadata('{}', '{}', 'FULL')",
            temp.catalog, temp.schema, temp.table
        );
        do_sql(&sql, conn, args.verbose).await?;
    }

    if args.overwrite {
        if args.verbose {
            info!("overwriting data in {destination}");
        }
        do_sql(&format!("delete from {destination}"), conn, args.verbose).await?;
    }

    if args.verbose {
        info!("transferring data: {temp} -> {destination}");
    }
    let sql = format!("insert into {destination}\nselect * from {}", temp.fq_name());
    do_sql(&sql, conn, args.verbose).await?;

    Ok(IngestReport {
        destination,
        temp_table: temp.fq_name(),
        rows: batch.num_rows(),
        staged_objects: keys.len(),
    })
}
