// Public API - the runner is the main entry point, the rest are building blocks
pub mod runner;

pub mod config;
pub mod credentials;
pub mod db;
pub mod error;
pub mod frame;
pub mod io;
pub mod unmanaged;

pub use error::IngestError;

#[cfg(test)]
mod test_support;
