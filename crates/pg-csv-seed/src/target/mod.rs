//! PostgreSQL target database operations.

mod sequence;
mod sink;
mod tls;

pub use sequence::{reconcile_sequence, SequenceReport};
pub use sink::PgSink;
pub use tls::SslMode;

use crate::config::TargetConfig;
use crate::error::{Result, SeedError};
use crate::loader::{ChildRecord, ClientRecord};
use async_trait::async_trait;
use deadpool_postgres::{Manager, ManagerConfig, Object, Pool, RecyclingMethod};
use tracing::{info, warn};

/// What a single row write did to the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// No row with this id existed.
    Inserted,
    /// An existing row was overwritten.
    Updated,
    /// An existing row was left as is.
    Skipped,
}

/// Destination for decoded rows.
///
/// The Postgres implementation stages writes in an open transaction; the
/// loaders never commit.
#[async_trait]
pub trait RowSink: Send {
    /// Insert a client, or overwrite its descriptive columns if the id exists.
    async fn upsert_client(&mut self, client: &ClientRecord) -> Result<WriteOutcome>;

    /// Insert a child row unless its id already exists.
    async fn insert_child(&mut self, child: &ChildRecord) -> Result<WriteOutcome>;
}

/// Connection to the target database.
///
/// The pool holds at most one connection: the whole run is sequential and
/// goes through a single session.
pub struct PgTarget {
    pool: Pool,
    schema: String,
}

impl PgTarget {
    /// Connect and verify the connection with a trivial query.
    pub async fn connect(config: &TargetConfig) -> Result<Self> {
        let pg_config = config.pg_config()?;
        let mgr_config = ManagerConfig {
            recycling_method: RecyclingMethod::Fast,
        };

        let manager = match SslMode::parse(&config.ssl_mode)?.connector()? {
            Some(tls) => Manager::from_config(pg_config, tls, mgr_config),
            None => {
                warn!("PostgreSQL TLS is disabled. Credentials will be transmitted in plaintext.");
                Manager::from_config(pg_config, tokio_postgres::NoTls, mgr_config)
            }
        };

        let pool = Pool::builder(manager)
            .max_size(1)
            .build()
            .map_err(|e| SeedError::pool(e, "creating PostgreSQL pool"))?;

        let client = pool
            .get()
            .await
            .map_err(|e| SeedError::pool(e, "testing PostgreSQL connection"))?;
        client.simple_query("SELECT 1").await?;
        drop(client);

        info!("Connected to PostgreSQL: {}", config.describe());

        Ok(Self {
            pool,
            schema: config.schema.clone(),
        })
    }

    /// Check out the session used for the run. It returns to the pool when
    /// dropped.
    pub async fn session(&self) -> Result<Object> {
        self.pool
            .get()
            .await
            .map_err(|e| SeedError::pool(e, "acquiring PostgreSQL session"))
    }

    /// Schema holding the four tables.
    pub fn schema(&self) -> &str {
        &self.schema
    }
}

/// Quote a PostgreSQL identifier.
pub(crate) fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Fully qualify a table name.
pub(crate) fn qualify_table(schema: &str, table: &str) -> String {
    format!("{}.{}", quote_ident(schema), quote_ident(table))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_ident_escapes_quotes() {
        assert_eq!(quote_ident("clients"), "\"clients\"");
        assert_eq!(quote_ident("we\"ird"), "\"we\"\"ird\"");
    }

    #[test]
    fn test_qualify_table() {
        assert_eq!(qualify_table("public", "clients"), "\"public\".\"clients\"");
    }
}
