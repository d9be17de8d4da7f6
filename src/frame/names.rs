//! SQL-compliant table and column names

use anyhow::Result;
use arrow::datatypes::{Field, Schema};
use arrow::record_batch::RecordBatch;
use icu_casemap::CaseMapper;
use regex::Regex;
use std::collections::HashSet;
use std::sync::{Arc, LazyLock};

use super::{column_names, reorder_columns};
use crate::error::IngestError;

static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("valid whitespace regex"));
static UNDERSCORES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"__+").expect("valid underscore regex"));
static PUNCTUATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[,.()&$/+-]+").expect("valid punctuation regex"));

const ABBREVIATIONS: &[(&str, &str)] = &[
    ("average", "avg"),
    ("maximum", "max"),
    ("minimum", "min"),
    ("absolute", "abs"),
    ("source", "src"),
    ("distribution", "dist"),
];

/// Convert a display label into a SQL-compliant table or column name,
/// abbreviating some common words and truncating to `maxlen` characters.
///
/// Letters are full Unicode case folded, so `Straße` becomes `strasse`.
///
/// ```
/// use trino_ingest::frame::sql_compliant_name;
///
/// assert_eq!(sql_compliant_name("Maximum Temp (C)", 63), "max_temp_c");
/// ```
pub fn sql_compliant_name(name: &str, maxlen: usize) -> String {
    let w = CaseMapper::new().fold_string(name);
    let w = w.trim().replace('-', "_");
    let w = PUNCTUATION.replace_all(&w, "");
    let w = WHITESPACE.replace_all(&w, "_");
    let mut w = UNDERSCORES.replace_all(&w, "_").into_owned();
    for (word, abbrev) in ABBREVIATIONS {
        w = w.replace(word, abbrev);
    }
    w.chars().take(maxlen).collect()
}

pub fn sql_compliant_names<S: AsRef<str>>(names: &[S], maxlen: usize) -> Vec<String> {
    names
        .iter()
        .map(|n| sql_compliant_name(n.as_ref(), maxlen))
        .collect()
}

/// Rename every column of `batch` to its SQL-compliant form
///
/// Fails with [`IngestError::DuplicateColumnNames`] if two columns normalize
/// to the same name.
pub fn enforce_sql_column_names(batch: &RecordBatch, maxlen: usize) -> Result<RecordBatch> {
    let schema = batch.schema();
    let renamed = sql_compliant_names(&column_names(&schema), maxlen);

    let unique: HashSet<&String> = renamed.iter().collect();
    if unique.len() < renamed.len() {
        return Err(IngestError::DuplicateColumnNames(renamed).into());
    }

    let fields: Vec<Field> = schema
        .fields()
        .iter()
        .zip(&renamed)
        .map(|(field, name)| field.as_ref().clone().with_name(name))
        .collect();
    let schema = Schema::new_with_metadata(fields, schema.metadata().clone());

    Ok(RecordBatch::try_new(
        Arc::new(schema),
        batch.columns().to_vec(),
    )?)
}

/// Column order with each partition column moved to the end, in the order given
pub fn partition_column_order(
    columns: &[String],
    partition_columns: &[String],
) -> Result<Vec<String>, IngestError> {
    let mut order = columns.to_vec();
    for pcol in partition_columns {
        let pos = order
            .iter()
            .position(|c| c == pcol)
            .ok_or_else(|| IngestError::UnknownColumn(pcol.clone()))?;
        let col = order.remove(pos);
        order.push(col);
    }
    Ok(order)
}

/// Reorder the columns of `batch` so the partition columns come last
///
/// Hive expects partition columns at the end of the table definition, and the
/// staged files must line up with the declared column order.
pub fn enforce_partition_column_order(
    batch: &RecordBatch,
    partition_columns: &[String],
) -> Result<RecordBatch> {
    let order = partition_column_order(&column_names(&batch.schema()), partition_columns)?;
    reorder_columns(batch, &order)
}
