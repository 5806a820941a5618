//! # pg-csv-seed
//!
//! Seeds a PostgreSQL (pgvector) database from four CSV exports of a
//! career-consulting system.
//!
//! A run:
//!
//! - **Ensures the schema**: the `vector` extension plus the `clients`,
//!   `consultation`, `training` and `employments` tables
//! - **Upserts clients**: descriptive columns are overwritten on reload,
//!   embeddings are never touched
//! - **Inserts children** with insert-or-skip semantics keyed on id
//! - **Reconciles id sequences** so generated ids never collide with
//!   loaded ones
//!
//! ## Example
//!
//! ```rust,no_run
//! use pg_csv_seed::{Config, Orchestrator};
//!
//! #[tokio::main]
//! async fn main() -> pg_csv_seed::Result<()> {
//!     let config = Config::load("seed.yaml")?.with_env()?;
//!     let orchestrator = Orchestrator::new(config)?;
//!     let result = orchestrator.run().await?;
//!     println!("Wrote {} rows", result.rows_written());
//!     Ok(())
//! }
//! ```

pub mod coerce;
pub mod config;
pub mod error;
pub mod loader;
pub mod orchestrator;
pub mod schema;
pub mod source;
pub mod target;

// Re-exports for convenient access
pub use config::{Config, SeedConfig, SourceConfig, TargetConfig};
pub use error::{Result, SeedError};
pub use loader::{ChildKind, LoadStats};
pub use orchestrator::{Orchestrator, SeedResult};
pub use source::{CsvRow, CsvSource, FileLayout};
pub use target::{PgTarget, RowSink, SequenceReport, SslMode, WriteOutcome};
