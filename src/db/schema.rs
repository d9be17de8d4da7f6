//! Trino type mapping and `CREATE TABLE` column rendering

use anyhow::{Context, Result};
use arrow::datatypes::Schema;
use std::collections::HashMap;

use crate::error::IngestError;
use crate::frame::column_descriptors;

/// Column type descriptor (or column name, for column maps) to SQL type
pub type TypeMap = HashMap<String, String>;

/// Built-in mapping from column type descriptor to Trino SQL type
pub const BUILTIN_TYPES: &[(&str, &str)] = &[
    ("utf8", "varchar"),
    ("large_utf8", "varchar"),
    ("utf8_view", "varchar"),
    ("dictionary<utf8>", "varchar"),
    ("float32", "real"),
    ("float64", "double"),
    ("int8", "tinyint"),
    ("int16", "smallint"),
    ("int32", "integer"),
    ("int64", "bigint"),
    ("boolean", "boolean"),
    ("date32", "date"),
    ("timestamp[s]", "timestamp"),
    ("timestamp[ms]", "timestamp"),
    ("timestamp[us]", "timestamp"),
    ("timestamp[ns]", "timestamp"),
    ("timestamp[s, UTC]", "timestamp"),
    ("timestamp[ms, UTC]", "timestamp"),
    ("timestamp[us, UTC]", "timestamp"),
    ("timestamp[ns, UTC]", "timestamp"),
];

/// SQL type for a column type descriptor
///
/// Entries in `typemap` take precedence over [`BUILTIN_TYPES`].
pub fn sql_type_for(descriptor: &str, typemap: &TypeMap) -> Result<String, IngestError> {
    if let Some(sql_type) = typemap.get(descriptor) {
        return Ok(sql_type.clone());
    }
    BUILTIN_TYPES
        .iter()
        .find(|(d, _)| *d == descriptor)
        .map(|(_, sql_type)| sql_type.to_string())
        .ok_or_else(|| IngestError::UnmappedType(descriptor.to_string()))
}

/// Render the column list of a `CREATE TABLE` statement
///
/// One `<indent><name> <type>` line per column, joined with `",\n"`, in
/// column order. A column present in `colmap` uses that type verbatim;
/// every other column goes through [`sql_type_for`].
pub fn create_table_schema_pairs(
    schema: &Schema,
    typemap: &TypeMap,
    colmap: &TypeMap,
    indent: usize,
) -> Result<String> {
    let descriptors = column_descriptors(schema);
    let pad = " ".repeat(indent);

    let mut lines = Vec::with_capacity(descriptors.len());
    for (name, descriptor) in &descriptors {
        let sql_type = match colmap.get(name) {
            Some(sql_type) => sql_type.clone(),
            None => sql_type_for(descriptor, typemap)
                .with_context(|| format!("Unable to map column types {descriptors:?}"))?,
        };
        lines.push(format!("{pad}{name} {sql_type}"));
    }

    Ok(lines.join(",\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_INDENT;
    use arrow::datatypes::{DataType, Field, TimeUnit};

    fn map(pairs: &[(&str, &str)]) -> TypeMap {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_builtin_types() {
        let empty = TypeMap::new();
        let cases = [
            ("utf8", "varchar"),
            ("float32", "real"),
            ("float64", "double"),
            ("int8", "tinyint"),
            ("int16", "smallint"),
            ("int32", "integer"),
            ("int64", "bigint"),
            ("boolean", "boolean"),
            ("timestamp[ns]", "timestamp"),
            ("timestamp[ns, UTC]", "timestamp"),
            ("dictionary<utf8>", "varchar"),
        ];

        for (descriptor, expected) in cases {
            assert_eq!(sql_type_for(descriptor, &empty).unwrap(), expected);
        }
    }

    #[test]
    fn test_typemap_overrides_builtin() {
        let typemap = map(&[("float64", "decimal(10, 2)"), ("uint64", "decimal(20, 0)")]);
        assert_eq!(sql_type_for("float64", &typemap).unwrap(), "decimal(10, 2)");
        assert_eq!(sql_type_for("uint64", &typemap).unwrap(), "decimal(20, 0)");
        assert_eq!(sql_type_for("int64", &typemap).unwrap(), "bigint");
    }

    #[test]
    fn test_unmapped_type() {
        let err = sql_type_for("uint64", &TypeMap::new()).unwrap_err();
        assert_eq!(err, IngestError::UnmappedType("uint64".to_string()));
    }

    #[test]
    fn test_create_table_schema_pairs() {
        let schema = Schema::new(vec![
            Field::new("a", DataType::Utf8, true),
            Field::new("b", DataType::Int64, true),
        ]);

        let pairs =
            create_table_schema_pairs(&schema, &TypeMap::new(), &TypeMap::new(), DEFAULT_INDENT)
                .unwrap();
        assert_eq!(pairs, "    a varchar,\n    b bigint");

        let pairs = create_table_schema_pairs(&schema, &TypeMap::new(), &TypeMap::new(), 0)
            .unwrap();
        assert_eq!(pairs, "a varchar,\nb bigint");
    }

    #[test]
    fn test_colmap_bypasses_type_mapping() {
        let schema = Schema::new(vec![
            Field::new("id", DataType::UInt64, false),
            Field::new("at", DataType::Timestamp(TimeUnit::Microsecond, None), true),
        ]);
        let colmap = map(&[("id", "decimal(20, 0)"), ("at", "timestamp(6)")]);

        let pairs = create_table_schema_pairs(&schema, &TypeMap::new(), &colmap, 2).unwrap();
        assert_eq!(pairs, "  id decimal(20, 0),\n  at timestamp(6)");
    }

    #[test]
    fn test_unmapped_column_reports_descriptors() {
        let schema = Schema::new(vec![
            Field::new("a", DataType::Utf8, true),
            Field::new("b", DataType::UInt64, true),
        ]);

        let err = create_table_schema_pairs(&schema, &TypeMap::new(), &TypeMap::new(), 4)
            .unwrap_err();
        assert_eq!(
            err.downcast_ref::<IngestError>(),
            Some(&IngestError::UnmappedType("uint64".to_string()))
        );
        assert!(format!("{err:#}").contains("uint64"));
        assert!(err.to_string().contains("utf8"));
    }
}
