//! Tabular data helpers over Arrow record batches
//!
//! A `RecordBatch` plays the role of the dataframe: it provides column names,
//! per-column type descriptors, column reordering and Parquet serialization.

pub mod conversion;
pub mod names;
pub mod parquet;

use anyhow::Result;
use arrow::datatypes::{DataType, Schema, TimeUnit};
use arrow::record_batch::RecordBatch;

use crate::error::IngestError;

pub use names::{
    enforce_partition_column_order, enforce_sql_column_names, partition_column_order,
    sql_compliant_name, sql_compliant_names,
};

/// Stable string descriptor for an Arrow data type
///
/// Descriptors are the keys of the built-in SQL type table and of caller
/// supplied type maps, so their spelling must not depend on Arrow's `Debug`
/// output for the common types.
pub fn type_descriptor(data_type: &DataType) -> String {
    match data_type {
        DataType::Null => "null".to_string(),
        DataType::Boolean => "boolean".to_string(),
        DataType::Int8 => "int8".to_string(),
        DataType::Int16 => "int16".to_string(),
        DataType::Int32 => "int32".to_string(),
        DataType::Int64 => "int64".to_string(),
        DataType::UInt8 => "uint8".to_string(),
        DataType::UInt16 => "uint16".to_string(),
        DataType::UInt32 => "uint32".to_string(),
        DataType::UInt64 => "uint64".to_string(),
        DataType::Float16 => "float16".to_string(),
        DataType::Float32 => "float32".to_string(),
        DataType::Float64 => "float64".to_string(),
        DataType::Utf8 => "utf8".to_string(),
        DataType::LargeUtf8 => "large_utf8".to_string(),
        DataType::Utf8View => "utf8_view".to_string(),
        DataType::Binary => "binary".to_string(),
        DataType::LargeBinary => "large_binary".to_string(),
        DataType::Date32 => "date32".to_string(),
        DataType::Date64 => "date64".to_string(),
        DataType::Timestamp(unit, None) => format!("timestamp[{}]", time_unit_abbrev(unit)),
        DataType::Timestamp(unit, Some(tz)) => {
            format!("timestamp[{}, {}]", time_unit_abbrev(unit), tz)
        }
        DataType::Decimal128(precision, scale) => format!("decimal128({precision}, {scale})"),
        DataType::Dictionary(_, value) => format!("dictionary<{}>", type_descriptor(value)),
        other => format!("{other:?}").to_lowercase(),
    }
}

fn time_unit_abbrev(unit: &TimeUnit) -> &'static str {
    match unit {
        TimeUnit::Second => "s",
        TimeUnit::Millisecond => "ms",
        TimeUnit::Microsecond => "us",
        TimeUnit::Nanosecond => "ns",
    }
}

pub fn column_names(schema: &Schema) -> Vec<String> {
    schema.fields().iter().map(|f| f.name().clone()).collect()
}

/// `(column name, type descriptor)` for every column, in order
pub fn column_descriptors(schema: &Schema) -> Vec<(String, String)> {
    schema
        .fields()
        .iter()
        .map(|f| (f.name().clone(), type_descriptor(f.data_type())))
        .collect()
}

/// Return a batch with its columns in the given order
pub fn reorder_columns(batch: &RecordBatch, order: &[String]) -> Result<RecordBatch> {
    let schema = batch.schema();
    let indices = order
        .iter()
        .map(|name| {
            schema
                .index_of(name)
                .map_err(|_| IngestError::UnknownColumn(name.clone()))
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(batch.project(&indices)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::{Int64Array, StringArray};
    use arrow::datatypes::Field;
    use std::sync::Arc;

    #[test]
    fn test_type_descriptors() {
        let cases = [
            (DataType::Utf8, "utf8"),
            (DataType::Float64, "float64"),
            (DataType::Int32, "int32"),
            (DataType::Boolean, "boolean"),
            (
                DataType::Timestamp(TimeUnit::Nanosecond, Some("UTC".into())),
                "timestamp[ns, UTC]",
            ),
            (
                DataType::Timestamp(TimeUnit::Microsecond, None),
                "timestamp[us]",
            ),
            (
                DataType::Dictionary(Box::new(DataType::Int32), Box::new(DataType::Utf8)),
                "dictionary<utf8>",
            ),
            (DataType::Decimal128(18, 2), "decimal128(18, 2)"),
        ];

        for (data_type, expected) in cases {
            assert_eq!(type_descriptor(&data_type), expected, "{data_type:?}");
        }
    }

    #[test]
    fn test_reorder_columns() {
        let schema = Schema::new(vec![
            Field::new("a", DataType::Int64, false),
            Field::new("b", DataType::Utf8, false),
        ]);
        let batch = RecordBatch::try_new(
            Arc::new(schema),
            vec![
                Arc::new(Int64Array::from(vec![1])),
                Arc::new(StringArray::from(vec!["x"])),
            ],
        )
        .unwrap();

        let reordered = reorder_columns(&batch, &["b".to_string(), "a".to_string()]).unwrap();
        assert_eq!(column_names(&reordered.schema()), vec!["b", "a"]);

        let err = reorder_columns(&batch, &["zz".to_string()]).unwrap_err();
        assert_eq!(
            err.downcast_ref::<IngestError>(),
            Some(&IngestError::UnknownColumn("zz".to_string()))
        );
    }
}
