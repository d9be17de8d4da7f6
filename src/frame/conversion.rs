//! Conversion from Arrow RecordBatch to rows of SQL values.
//!
//! This module converts Arrow's columnar format to the row-based [`Row`]
//! format consumed by the batch inserter. Nulls become [`SqlValue::Null`];
//! every other cell keeps enough type information for the literal encoder.

use anyhow::{Context, Result};
use arrow::array::*;
use arrow::compute::cast;
use arrow::datatypes::{
    ArrowPrimitiveType, ArrowTimestampType, DataType, Date32Type, Date64Type, Decimal128Type,
    Float32Type, Float64Type, Int8Type, Int16Type, Int32Type, Int64Type, TimeUnit,
    TimestampMicrosecondType, TimestampMillisecondType, TimestampNanosecondType,
    TimestampSecondType, UInt8Type, UInt16Type, UInt32Type, UInt64Type,
};
use arrow::record_batch::RecordBatch;
use chrono::NaiveDateTime;

use crate::db::literal::{Row, SqlValue};

/// Convert an Arrow RecordBatch to a vector of rows
pub fn record_batch_to_rows(batch: &RecordBatch) -> Result<Vec<Row>> {
    let num_rows = batch.num_rows();
    let num_columns = batch.num_columns();

    if num_rows == 0 {
        return Ok(Vec::new());
    }

    let mut column_values: Vec<Vec<SqlValue>> = Vec::with_capacity(num_columns);
    for (col_idx, field) in batch.schema().fields().iter().enumerate() {
        let array = batch.column(col_idx);
        let values = array_to_values(array).with_context(|| {
            format!(
                "Failed to convert column '{}' ({:?}) to SQL values",
                field.name(),
                array.data_type()
            )
        })?;
        column_values.push(values);
    }

    // Transpose to rows
    let mut rows = Vec::with_capacity(num_rows);
    for row_idx in 0..num_rows {
        rows.push(
            column_values
                .iter()
                .map(|col| col[row_idx].clone())
                .collect(),
        );
    }

    Ok(rows)
}

/// Convert an Arrow array to a vector of SQL values
fn array_to_values(array: &dyn Array) -> Result<Vec<SqlValue>> {
    let mut values = Vec::with_capacity(array.len());

    match array.data_type() {
        DataType::Null => values.resize(array.len(), SqlValue::Null),
        DataType::Boolean => {
            let arr = as_boolean_array(array);
            for i in 0..arr.len() {
                values.push(if arr.is_null(i) {
                    SqlValue::Null
                } else {
                    SqlValue::Bool(arr.value(i))
                });
            }
        }
        DataType::Int8 => convert_int::<Int8Type>(array, &mut values),
        DataType::Int16 => convert_int::<Int16Type>(array, &mut values),
        DataType::Int32 => convert_int::<Int32Type>(array, &mut values),
        DataType::Int64 => convert_int::<Int64Type>(array, &mut values),
        DataType::UInt8 => convert_int::<UInt8Type>(array, &mut values),
        DataType::UInt16 => convert_int::<UInt16Type>(array, &mut values),
        DataType::UInt32 => convert_int::<UInt32Type>(array, &mut values),
        DataType::UInt64 => {
            let arr = as_primitive_array::<UInt64Type>(array);
            for i in 0..arr.len() {
                values.push(if arr.is_null(i) {
                    SqlValue::Null
                } else {
                    let v = arr.value(i);
                    i64::try_from(v)
                        .map(SqlValue::Int)
                        .unwrap_or_else(|_| SqlValue::Decimal(v.to_string()))
                });
            }
        }
        DataType::Float32 => convert_float::<Float32Type>(array, &mut values),
        DataType::Float64 => convert_float::<Float64Type>(array, &mut values),
        DataType::Utf8 => {
            let arr = as_string_array(array);
            for i in 0..arr.len() {
                values.push(if arr.is_null(i) {
                    SqlValue::Null
                } else {
                    SqlValue::Str(arr.value(i).to_string())
                });
            }
        }
        DataType::LargeUtf8 => {
            let arr = as_largestring_array(array);
            for i in 0..arr.len() {
                values.push(if arr.is_null(i) {
                    SqlValue::Null
                } else {
                    SqlValue::Str(arr.value(i).to_string())
                });
            }
        }
        DataType::Utf8View | DataType::Dictionary(_, _) => {
            let utf8 = cast(array, &DataType::Utf8).with_context(|| {
                format!("Failed to cast {:?} to Utf8", array.data_type())
            })?;
            return array_to_values(utf8.as_ref());
        }
        DataType::Binary => {
            let arr = as_generic_binary_array::<i32>(array);
            for i in 0..arr.len() {
                values.push(if arr.is_null(i) {
                    SqlValue::Null
                } else {
                    SqlValue::Bytes(arr.value(i).to_vec())
                });
            }
        }
        DataType::LargeBinary => {
            let arr = as_generic_binary_array::<i64>(array);
            for i in 0..arr.len() {
                values.push(if arr.is_null(i) {
                    SqlValue::Null
                } else {
                    SqlValue::Bytes(arr.value(i).to_vec())
                });
            }
        }
        DataType::Date32 => {
            let arr = as_primitive_array::<Date32Type>(array);
            for i in 0..arr.len() {
                values.push(if arr.is_null(i) {
                    SqlValue::Null
                } else {
                    SqlValue::Date(arr.value_as_date(i).context("Invalid date")?)
                });
            }
        }
        DataType::Date64 => {
            let arr = as_primitive_array::<Date64Type>(array);
            for i in 0..arr.len() {
                values.push(if arr.is_null(i) {
                    SqlValue::Null
                } else {
                    SqlValue::Date(arr.value_as_date(i).context("Invalid date")?)
                });
            }
        }
        DataType::Timestamp(unit, tz) => {
            let datetimes = match unit {
                TimeUnit::Second => timestamps::<TimestampSecondType>(array)?,
                TimeUnit::Millisecond => timestamps::<TimestampMillisecondType>(array)?,
                TimeUnit::Microsecond => timestamps::<TimestampMicrosecondType>(array)?,
                TimeUnit::Nanosecond => timestamps::<TimestampNanosecondType>(array)?,
            };
            // Arrow stores zoned timestamps as UTC instants
            values.extend(datetimes.into_iter().map(|dt| match (dt, tz) {
                (None, _) => SqlValue::Null,
                (Some(dt), None) => SqlValue::Timestamp(dt),
                (Some(dt), Some(_)) => SqlValue::TimestampTz(dt.and_utc()),
            }));
        }
        DataType::Decimal128(_, scale) => {
            let arr = as_primitive_array::<Decimal128Type>(array);
            let scale = u32::try_from(*scale).context("Negative decimal scale")?;
            for i in 0..arr.len() {
                values.push(if arr.is_null(i) {
                    SqlValue::Null
                } else {
                    SqlValue::Decimal(format_decimal128(arr.value(i), scale))
                });
            }
        }
        _ => {
            return Err(anyhow::anyhow!(
                "Unsupported array type for conversion: {:?}",
                array.data_type()
            ));
        }
    }

    Ok(values)
}

/// Helper to convert integer arrays that fit in i64
fn convert_int<T: ArrowPrimitiveType>(array: &dyn Array, values: &mut Vec<SqlValue>)
where
    T::Native: Into<i64>,
{
    let arr = as_primitive_array::<T>(array);
    for i in 0..arr.len() {
        values.push(if arr.is_null(i) {
            SqlValue::Null
        } else {
            SqlValue::Int(arr.value(i).into())
        });
    }
}

fn convert_float<T: ArrowPrimitiveType>(array: &dyn Array, values: &mut Vec<SqlValue>)
where
    T::Native: Into<f64>,
{
    let arr = as_primitive_array::<T>(array);
    for i in 0..arr.len() {
        values.push(if arr.is_null(i) {
            SqlValue::Null
        } else {
            SqlValue::Float(arr.value(i).into())
        });
    }
}

fn timestamps<T: ArrowTimestampType>(array: &dyn Array) -> Result<Vec<Option<NaiveDateTime>>> {
    let arr = as_primitive_array::<T>(array);
    let mut out = Vec::with_capacity(arr.len());
    for i in 0..arr.len() {
        out.push(if arr.is_null(i) {
            None
        } else {
            Some(arr.value_as_datetime(i).context("Invalid timestamp")?)
        });
    }
    Ok(out)
}

/// Format a Decimal128 value with the given scale
fn format_decimal128(value: i128, scale: u32) -> String {
    if scale == 0 {
        return value.to_string();
    }

    let divisor = 10_i128.pow(scale);
    let sign = if value < 0 { "-" } else { "" };
    let int_part = (value / divisor).abs();
    let frac_part = (value % divisor).abs();

    format!(
        "{}{}.{:0width$}",
        sign,
        int_part,
        frac_part,
        width = scale as usize
    )
}
