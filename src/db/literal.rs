//! Scalar values and their SQL literal encoding for VALUES clauses

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

/// One scalar cell of a row to be inserted
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    /// Exact numeric already rendered as text (decimals, out-of-range unsigned)
    Decimal(String),
    Str(String),
    Bytes(Vec<u8>),
    Date(NaiveDate),
    Timestamp(NaiveDateTime),
    TimestampTz(DateTime<Utc>),
}

/// A row of values, positionally aligned with the destination columns
pub type Row = Vec<SqlValue>;

/// Encode a value as SQL literal text
///
/// NaN and the infinities are checked before the default rendering because
/// `NaN` and `inf` are not valid SQL. Colons inside strings are escaped as
/// `\:` so they are not taken for bind-parameter markers by the statement
/// layer (see [`crate::db::executor::statement_text`]).
pub fn sql_literal(value: &SqlValue) -> String {
    match value {
        SqlValue::Null => "NULL".to_string(),
        SqlValue::Str(s) => quote_string(s),
        SqlValue::Timestamp(ts) => format!("TIMESTAMP '{ts}'"),
        SqlValue::TimestampTz(ts) => format!("TIMESTAMP '{} UTC'", ts.naive_utc()),
        SqlValue::Date(d) => format!("DATE '{d}'"),
        SqlValue::Float(f) => float_literal(*f),
        SqlValue::Bytes(b) => format!("X'{}'", hex::encode(b)),
        SqlValue::Int(i) => i.to_string(),
        SqlValue::Bool(b) => b.to_string(),
        SqlValue::Decimal(d) => d.clone(),
    }
}

fn quote_string(s: &str) -> String {
    let escaped = s.replace('\'', "''").replace(':', "\\:");
    format!("'{escaped}'")
}

fn float_literal(f: f64) -> String {
    if f.is_nan() {
        return "nan()".to_string();
    }
    if f.is_infinite() {
        return if f < 0.0 { "-infinity()" } else { "infinity()" }.to_string();
    }
    // Debug keeps the decimal point (1.0, not 1) so the literal stays a double.
    format!("{f:?}")
}

/// Render a row as `(v1, v2, ...)`
pub fn row_literal(row: &[SqlValue]) -> String {
    let values: Vec<String> = row.iter().map(sql_literal).collect();
    format!("({})", values.join(", "))
}

/// Render `array['a', 'b']` for DDL properties such as `partitioned_by`
pub fn string_array_literal<S: AsRef<str>>(items: &[S]) -> String {
    let quoted: Vec<String> = items.iter().map(|s| quote_string(s.as_ref())).collect();
    format!("array[{}]", quoted.join(", "))
}

impl From<&str> for SqlValue {
    fn from(value: &str) -> Self {
        SqlValue::Str(value.to_string())
    }
}

impl From<String> for SqlValue {
    fn from(value: String) -> Self {
        SqlValue::Str(value)
    }
}

impl From<i64> for SqlValue {
    fn from(value: i64) -> Self {
        SqlValue::Int(value)
    }
}

impl From<i32> for SqlValue {
    fn from(value: i32) -> Self {
        SqlValue::Int(value.into())
    }
}

impl From<f64> for SqlValue {
    fn from(value: f64) -> Self {
        SqlValue::Float(value)
    }
}

impl From<bool> for SqlValue {
    fn from(value: bool) -> Self {
        SqlValue::Bool(value)
    }
}

impl From<NaiveDate> for SqlValue {
    fn from(value: NaiveDate) -> Self {
        SqlValue::Date(value)
    }
}

impl From<NaiveDateTime> for SqlValue {
    fn from(value: NaiveDateTime) -> Self {
        SqlValue::Timestamp(value)
    }
}

impl From<DateTime<Utc>> for SqlValue {
    fn from(value: DateTime<Utc>) -> Self {
        SqlValue::TimestampTz(value)
    }
}

impl<T: Into<SqlValue>> From<Option<T>> for SqlValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(SqlValue::Null, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_special_literals() {
        assert_eq!(sql_literal(&SqlValue::Null), "NULL");
        assert_eq!(sql_literal(&SqlValue::Float(f64::NAN)), "nan()");
        assert_eq!(sql_literal(&SqlValue::Float(f64::INFINITY)), "infinity()");
        assert_eq!(
            sql_literal(&SqlValue::Float(f64::NEG_INFINITY)),
            "-infinity()"
        );
    }

    #[test]
    fn test_string_literals() {
        assert_eq!(sql_literal(&"a".into()), "'a'");
        assert_eq!(sql_literal(&"b'c".into()), "'b''c'");
        assert_eq!(sql_literal(&":f".into()), "'\\:f'");
        assert_eq!(sql_literal(&"".into()), "''");
        assert_eq!(sql_literal(&"it's 10:30".into()), "'it''s 10\\:30'");
    }

    #[test]
    fn test_temporal_literals() {
        assert_eq!(
            sql_literal(&ts(2022, 1, 1).into()),
            "TIMESTAMP '2022-01-01 00:00:00'"
        );
        assert_eq!(
            sql_literal(&ts(2022, 1, 1).and_utc().into()),
            "TIMESTAMP '2022-01-01 00:00:00 UTC'"
        );
        assert_eq!(
            sql_literal(&NaiveDate::from_ymd_opt(2024, 2, 29).unwrap().into()),
            "DATE '2024-02-29'"
        );
    }

    #[test]
    fn test_default_renderings() {
        assert_eq!(sql_literal(&4.5.into()), "4.5");
        assert_eq!(sql_literal(&1.0.into()), "1.0");
        assert_eq!(sql_literal(&(-42i64).into()), "-42");
        assert_eq!(sql_literal(&true.into()), "true");
        assert_eq!(sql_literal(&SqlValue::Decimal("123.45".into())), "123.45");
        assert_eq!(sql_literal(&SqlValue::Bytes(vec![0xde, 0xad])), "X'dead'");
        assert_eq!(sql_literal(&Option::<i64>::None.into()), "NULL");
    }

    #[test]
    fn test_row_literal() {
        let row: Row = vec!["e".into(), ts(2022, 1, 1).into()];
        assert_eq!(row_literal(&row), "('e', TIMESTAMP '2022-01-01 00:00:00')");
    }

    #[test]
    fn test_string_array_literal() {
        assert_eq!(string_array_literal(&["a", "b"]), "array['a', 'b']");
        assert_eq!(string_array_literal::<&str>(&[]), "array[]");
    }
}
