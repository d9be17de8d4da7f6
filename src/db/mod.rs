//! Database layer - SQL execution, Trino client, type mapping and batch inserts

pub mod batch;
pub mod executor;
pub mod literal;
pub mod schema;
pub mod table;
pub mod trino;

pub use batch::{BatchInsert, BatchInsertBuilder, InsertMethod};
pub use executor::{QueryResult, SqlExecutor, do_sql};
pub use table::{TableLocation, TableRef};
pub use trino::{TrinoClient, attach_trino_engine};
