use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use trino_ingest::config::{DEFAULT_BATCH_SIZE, DEFAULT_MAX_NAME_LEN, DEFAULT_PREFIX_TEMPLATE};
use trino_ingest::credentials::{S3Config, TrinoConfig, load_credentials_dotenv};
use trino_ingest::db::batch::{BatchInsertBuilder, insert_record_batch};
use trino_ingest::db::{TableRef, attach_trino_engine};
use trino_ingest::frame::parquet::read_parquet;
use trino_ingest::frame::{enforce_sql_column_names, sql_compliant_names};
use trino_ingest::io::attach_s3_bucket;
use trino_ingest::runner::{IngestArgsBuilder, fast_ingest_via_hive};

#[derive(Parser, Clone)]
#[command(version, about)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Quiet mode - only warnings and errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Log every statement and its result
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Clone, Subcommand)]
enum Command {
    /// Print the SQL-compliant form of each name
    Normalize {
        names: Vec<String>,

        /// Maximum length of a normalized name
        #[arg(long, default_value_t = DEFAULT_MAX_NAME_LEN)]
        maxlen: usize,
    },

    /// Bulk load a Parquet file through a temporary Hive table
    Load {
        /// Local Parquet file to load
        #[arg(short, long)]
        file: PathBuf,

        /// Destination catalog
        #[arg(long)]
        catalog: Option<String>,

        /// Destination schema
        #[arg(short, long)]
        schema: String,

        /// Destination table
        #[arg(short, long)]
        table: String,

        /// Catalog in which the temporary table is declared
        #[arg(long)]
        hive_catalog: String,

        /// Schema in which the temporary table is declared
        #[arg(long)]
        hive_schema: String,

        /// Partition columns (format: a,b)
        #[arg(long, value_delimiter = ',')]
        partition_by: Vec<String>,

        /// Delete existing destination rows before loading
        #[arg(long)]
        overwrite: bool,

        /// Type descriptor override (format: descriptor=sql_type), repeatable
        #[arg(long, value_parser = cli::parse_mapping)]
        typemap: Vec<(String, String)>,

        /// Column type override (format: column=sql_type), repeatable
        #[arg(long, value_parser = cli::parse_mapping)]
        colmap: Vec<(String, String)>,

        /// Object key template for staged files
        #[arg(long, default_value = DEFAULT_PREFIX_TEMPLATE)]
        prefix: String,

        /// Normalize column names before loading
        #[arg(long)]
        normalize_columns: bool,

        /// Environment variable prefix for Trino settings
        #[arg(long, default_value = "TRINO")]
        env_prefix: String,

        /// Environment variable prefix for object storage settings
        #[arg(long, default_value = "S3_HIVE")]
        s3_prefix: String,
    },

    /// Insert a Parquet file with batched INSERT statements
    Insert {
        /// Local Parquet file to insert
        #[arg(short, long)]
        file: PathBuf,

        #[arg(long)]
        catalog: Option<String>,

        #[arg(short, long)]
        schema: String,

        #[arg(short, long)]
        table: String,

        /// Rows per INSERT statement
        #[arg(short, long, default_value_t = DEFAULT_BATCH_SIZE)]
        batch_size: usize,

        /// Run `alter table ... execute optimize` afterwards
        #[arg(long)]
        optimize: bool,

        /// Normalize column names before inserting
        #[arg(long)]
        normalize_columns: bool,

        /// Environment variable prefix for Trino settings
        #[arg(long, default_value = "TRINO")]
        env_prefix: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize tracing based on quiet mode
    use tracing_subscriber::{EnvFilter, FmtSubscriber};
    let filter = if args.quiet {
        EnvFilter::new("trino_ingest=warn")
    } else {
        EnvFilter::new("trino_ingest=info")
    };
    let subscriber = FmtSubscriber::builder().with_env_filter(filter).finish();
    let _ = tracing::subscriber::set_global_default(subscriber);

    let verbose = args.verbose;
    match args.command {
        Command::Normalize { names, maxlen } => {
            for name in sql_compliant_names(&names, maxlen) {
                println!("{name}");
            }
        }
        Command::Load {
            file,
            catalog,
            schema,
            table,
            hive_catalog,
            hive_schema,
            partition_by,
            overwrite,
            typemap,
            colmap,
            prefix,
            normalize_columns,
            env_prefix,
            s3_prefix,
        } => {
            load_credentials_dotenv()?;
            let trino = TrinoConfig::from_env(&env_prefix)?;
            let s3 = S3Config::from_env(&s3_prefix)?;

            let mut batch = read_parquet(&file)?;
            if normalize_columns {
                batch = enforce_sql_column_names(&batch, DEFAULT_MAX_NAME_LEN)?;
            }

            let mut builder = IngestArgsBuilder::default();
            builder
                .schema(schema)
                .table(table)
                .hive_catalog(hive_catalog)
                .hive_schema(hive_schema)
                .partition_columns(partition_by)
                .overwrite(overwrite)
                .typemap(typemap.into_iter().collect())
                .colmap(colmap.into_iter().collect())
                .prefix(prefix)
                .verbose(verbose);
            if let Some(catalog) = catalog {
                builder.catalog(catalog);
            }
            let ingest_args = builder.build()?;

            let conn = attach_trino_engine(&trino, None, None, verbose).await?;
            let bucket = attach_s3_bucket(&s3).await?;

            let report = fast_ingest_via_hive(&batch, &conn, &bucket, &ingest_args).await?;

            if !args.quiet {
                println!();
                println!("Load Summary");
                println!("============");
                println!("Destination: {}", report.destination);
                println!("Rows loaded: {}", report.rows);
                println!("Objects staged: {}", report.staged_objects);
            }
        }
        Command::Insert {
            file,
            catalog,
            schema,
            table,
            batch_size,
            optimize,
            normalize_columns,
            env_prefix,
        } => {
            load_credentials_dotenv()?;
            let trino = TrinoConfig::from_env(&env_prefix)?;

            let mut batch = read_parquet(&file)?;
            if normalize_columns {
                batch = enforce_sql_column_names(&batch, DEFAULT_MAX_NAME_LEN)?;
            }

            let mut builder = BatchInsertBuilder::default();
            builder
                .schema(schema.clone())
                .batch_size(batch_size)
                .optimize(optimize)
                .verbose(verbose);
            if let Some(catalog) = &catalog {
                builder.catalog(catalog.clone());
            }
            let inserter = builder.build().context("Invalid insert options")?;

            let (conn_catalog, conn_schema) = cli::connection_scope(catalog.as_deref(), &schema);
            let conn = attach_trino_engine(&trino, conn_catalog, conn_schema, verbose).await?;
            insert_record_batch(&inserter, &TableRef::new(table), &conn, &batch).await?;

            if !args.quiet {
                println!("Inserted {} rows", batch.num_rows());
            }
        }
    }
    Ok(())
}

/// CLI utility functions for parsing command-line arguments
mod cli {
    /// Parse a `key=value` mapping; the value may itself contain `=` or `,`
    pub fn parse_mapping(s: &str) -> anyhow::Result<(String, String)> {
        let (key, value) = s.split_once('=').ok_or_else(|| {
            anyhow::anyhow!("Invalid mapping '{}'. Expected format: 'key=value'", s)
        })?;

        let key = key.trim();
        let value = value.trim();
        if key.is_empty() || value.is_empty() {
            return Err(anyhow::anyhow!(
                "Key and value cannot be empty in mapping '{}'",
                s
            ));
        }

        Ok((key.to_string(), value.to_string()))
    }

    /// Catalog and schema for the session; a schema without a catalog is not
    /// a valid session, so it is only set when a catalog is given
    pub fn connection_scope<'a>(
        catalog: Option<&'a str>,
        schema: &'a str,
    ) -> (Option<&'a str>, Option<&'a str>) {
        (catalog, catalog.map(|_| schema))
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn test_parse_mapping() {
            assert_eq!(
                parse_mapping("float64=decimal(10, 2)").unwrap(),
                ("float64".to_string(), "decimal(10, 2)".to_string())
            );
            assert_eq!(
                parse_mapping(" id = varchar ").unwrap(),
                ("id".to_string(), "varchar".to_string())
            );
            assert!(parse_mapping("no-separator").is_err());
            assert!(parse_mapping("=varchar").is_err());
        }

        #[test]
        fn test_connection_scope() {
            assert_eq!(
                connection_scope(Some("iceberg"), "demo"),
                (Some("iceberg"), Some("demo"))
            );
            assert_eq!(connection_scope(None, "demo"), (None, None));
        }
    }
}
