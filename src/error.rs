//! Typed errors for configuration and lookup failures
//!
//! Execution failures from the SQL engine or the object store are carried as
//! `anyhow::Error` and are never converted into these variants.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IngestError {
    #[error("remapped column names were not unique: {0:?}")]
    DuplicateColumnNames(Vec<String>),

    #[error("column '{0}' not found in frame")]
    UnknownColumn(String),

    #[error("unexpected column type '{0}'")]
    UnmappedType(String),

    #[error("connection schema specified without a catalog")]
    SchemaWithoutCatalog,

    #[error("no schema available for table '{0}'")]
    MissingSchema(String),

    #[error("batch size must be at least 1")]
    InvalidBatchSize,

    #[error("environment variable {0} is not set")]
    MissingEnv(String),

    #[error("environment variable {name} has invalid value '{value}'")]
    InvalidEnv { name: String, value: String },
}
