//! Table identifiers

use std::fmt;

/// Table as seen by the batch inserter: a name and an optional schema
///
/// When the schema is absent the inserter's own schema is used.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRef {
    pub name: String,
    pub schema: Option<String>,
}

impl TableRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            schema: None,
        }
    }

    pub fn with_schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = Some(schema.into());
        self
    }
}

/// Fully located table, `catalog.schema.table`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableLocation {
    pub catalog: String,
    pub schema: String,
    pub table: String,
}

impl TableLocation {
    pub fn new(
        catalog: impl Into<String>,
        schema: impl Into<String>,
        table: impl Into<String>,
    ) -> Self {
        Self {
            catalog: catalog.into(),
            schema: schema.into(),
            table: table.into(),
        }
    }

    pub fn fq_name(&self) -> String {
        format!("{}.{}.{}", self.catalog, self.schema, self.table)
    }
}

impl fmt::Display for TableLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.fq_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fq_name() {
        let loc = TableLocation::new("iceberg", "demo", "emissions");
        assert_eq!(loc.fq_name(), "iceberg.demo.emissions");
        assert_eq!(loc.to_string(), "iceberg.demo.emissions");
    }

    #[test]
    fn test_table_ref() {
        let table = TableRef::new("t").with_schema("s");
        assert_eq!(table.name, "t");
        assert_eq!(table.schema.as_deref(), Some("s"));
        assert_eq!(TableRef::new("t").schema, None);
    }
}
