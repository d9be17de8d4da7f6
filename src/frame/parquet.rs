//! Parquet serialization of record batches, flat or Hive-partitioned

use anyhow::{Context, Result};
use arrow::array::UInt32Array;
use arrow::compute::{concat_batches, take_record_batch};
use arrow::record_batch::RecordBatch;
use arrow::util::display::{ArrayFormatter, FormatOptions};
use parquet::arrow::ArrowWriter;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use std::collections::BTreeMap;
use std::fs::File;
use std::path::{Path, PathBuf};
use uuid::Uuid;

use super::{column_names, reorder_columns};
use crate::config::{HIVE_DEFAULT_PARTITION, HIVE_TIMESTAMP_FORMAT};
use crate::error::IngestError;

/// Random `<32 hex>.parquet` file name
pub fn parquet_file_name() -> String {
    format!("{}.parquet", Uuid::new_v4().simple())
}

/// Write `batch` to a single Parquet file at `path`
pub fn write_parquet(batch: &RecordBatch, path: &Path) -> Result<()> {
    let file =
        File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
    let mut writer = ArrowWriter::try_new(file, batch.schema(), None)
        .context("Failed to create Parquet writer")?;
    writer.write(batch).context("Failed to write Parquet data")?;
    writer.close().context("Failed to finalize Parquet file")?;
    Ok(())
}

/// Read every row group of a Parquet file into one batch
pub fn read_parquet(path: &Path) -> Result<RecordBatch> {
    let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)
        .context("Failed to read Parquet metadata")?;
    let schema = builder.schema().clone();
    let batches = builder
        .build()
        .context("Failed to build Parquet reader")?
        .collect::<Result<Vec<_>, _>>()
        .context("Failed to read Parquet data")?;
    Ok(concat_batches(&schema, &batches)?)
}

/// Escape a partition column name or value the way Hive escapes path names
pub fn escape_path_name(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        let needs_escape = matches!(
            c,
            '\u{01}'..='\u{1F}'
                | '"'
                | '#'
                | '%'
                | '\''
                | '*'
                | '/'
                | ':'
                | '='
                | '?'
                | '\\'
                | '\u{7F}'
                | '{'
                | '['
                | ']'
                | '^'
        );
        if needs_escape {
            escaped.push_str(&format!("%{:02X}", c as u32));
        } else {
            escaped.push(c);
        }
    }
    escaped
}

/// Write `batch` as a Hive-style partitioned tree under `root`
///
/// Rows are grouped by the values of `partition_columns`; each group is
/// written without the partition columns to
/// `root/<col>=<value>/.../<uuid>.parquet`. Null partition values go to the
/// Hive default partition. Returns the written files.
pub fn write_partitioned_parquet(
    batch: &RecordBatch,
    root: &Path,
    partition_columns: &[String],
) -> Result<Vec<PathBuf>> {
    let schema = batch.schema();
    let data_columns: Vec<String> = column_names(&schema)
        .into_iter()
        .filter(|c| !partition_columns.contains(c))
        .collect();
    let data = reorder_columns(batch, &data_columns)?;

    let options = FormatOptions::default()
        .with_timestamp_format(Some(HIVE_TIMESTAMP_FORMAT))
        .with_timestamp_tz_format(Some(HIVE_TIMESTAMP_FORMAT));
    let mut key_columns = Vec::with_capacity(partition_columns.len());
    for pcol in partition_columns {
        let idx = schema
            .index_of(pcol)
            .map_err(|_| IngestError::UnknownColumn(pcol.clone()))?;
        let array = batch.column(idx);
        let formatter = ArrayFormatter::try_new(array.as_ref(), &options)?;
        key_columns.push((array.as_ref(), formatter));
    }

    let mut groups: BTreeMap<Vec<String>, Vec<u32>> = BTreeMap::new();
    for row in 0..batch.num_rows() {
        let key = key_columns
            .iter()
            .map(|(array, formatter)| {
                if array.is_null(row) {
                    HIVE_DEFAULT_PARTITION.to_string()
                } else {
                    escape_path_name(&formatter.value(row).to_string())
                }
            })
            .collect();
        groups.entry(key).or_default().push(u32::try_from(row)?);
    }

    let mut written = Vec::with_capacity(groups.len());
    for (values, rows) in groups {
        let dir = partition_columns
            .iter()
            .zip(&values)
            .fold(root.to_path_buf(), |dir, (col, value)| {
                dir.join(format!("{}={value}", escape_path_name(col)))
            });
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create {}", dir.display()))?;

        let part = take_record_batch(&data, &UInt32Array::from(rows))?;
        let path = dir.join(parquet_file_name());
        write_parquet(&part, &path)?;
        written.push(path);
    }

    Ok(written)
}
