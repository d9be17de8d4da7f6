//! Configuration constants for the ingestion helpers
//!
//! This module centralizes the tunable defaults used throughout the crate.
//! Connection credentials are not constants; see [`crate::credentials`].

use std::time::Duration;

// ============================================================================
// Naming
// ============================================================================

/// Maximum length of a normalized table or column name
///
/// 63 is the identifier limit of several common SQL engines and a safe
/// common denominator for Hive and Iceberg catalogs.
pub const DEFAULT_MAX_NAME_LEN: usize = 63;

// ============================================================================
// Schema Rendering
// ============================================================================

pub const DEFAULT_INDENT: usize = 4;

// ============================================================================
// Batch Insertion
// ============================================================================

pub const DEFAULT_BATCH_SIZE: usize = 1000;

/// Batches longer than this are logged as head, ellipsis and tail
pub const BATCH_PREVIEW_ROWS: usize = 5;

// ============================================================================
// Unmanaged Table Staging
// ============================================================================

/// Object key template for staged files; `{schema}` and `{table}` are substituted
pub const DEFAULT_PREFIX_TEMPLATE: &str = "trino/{schema}/{table}";

pub const TEMP_TABLE_PREFIX: &str = "ingest_temp_";

/// Directory value Hive uses for a null partition key
pub const HIVE_DEFAULT_PARTITION: &str = "__HIVE_DEFAULT_PARTITION__";

/// Rendering of timestamp partition keys, Hive's `yyyy-MM-dd HH:mm:ss[.f]`
pub const HIVE_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

/// S3 DeleteObjects accepts at most this many keys per request
pub const DELETE_BATCH_SIZE: usize = 1000;

// ============================================================================
// Credentials
// ============================================================================

pub const CREDENTIALS_FILE: &str = "credentials.env";

pub const CREDENTIAL_DOTENV_DIR_VAR: &str = "CREDENTIAL_DOTENV_DIR";

pub const DEFAULT_CREDENTIAL_DIR: &str = "/opt/app-root/src";

pub const DEFAULT_S3_REGION: &str = "us-east-1";

// ============================================================================
// Trino Client
// ============================================================================

/// Timeout for a single HTTP round trip to the coordinator
///
/// Set to 3 minutes because a statement page for a large INSERT or an
/// `execute optimize` can take a while to come back.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(180);

pub const CLIENT_SOURCE: &str = "trino-ingest";
