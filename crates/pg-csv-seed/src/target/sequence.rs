//! Identifier sequence reconciliation.
//!
//! Rows are loaded with explicit ids, which bypasses the `BIGSERIAL`
//! sequence. Afterwards each sequence is moved to the largest stored id,
//! floored at 1 (empty tables and tables holding only ids below 1), so that
//! the next generated id cannot collide.

use super::{qualify_table, quote_ident};
use crate::error::{Result, SeedError};
use serde::{Deserialize, Serialize};
use tokio_postgres::Client;
use tracing::debug;

/// Sequence position after reconciliation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SequenceReport {
    pub table: String,
    /// Last value handed out; the next generated id is `last_value + 1`.
    pub last_value: i64,
}

/// Advance the `id` sequence of `schema.table` to `max(MAX(id), 1)`.
///
/// Safe to call repeatedly and on empty tables.
pub async fn reconcile_sequence(client: &Client, schema: &str, table: &str) -> Result<SequenceReport> {
    let sql = build_setval_sql(schema, table);
    let qualified = qualify_table(schema, table);
    let row = client.query_one(sql.as_str(), &[&qualified]).await?;

    let last_value: Option<i64> = row.get(0);
    let last_value = last_value.ok_or_else(|| {
        SeedError::Config(format!(
            "{} has no sequence behind its id column",
            qualified
        ))
    })?;

    debug!("Reset sequence for {}.{}.id to {}", schema, table, last_value);
    Ok(SequenceReport {
        table: table.to_string(),
        last_value,
    })
}

fn build_setval_sql(schema: &str, table: &str) -> String {
    format!(
        "SELECT setval(pg_get_serial_sequence($1, 'id'), GREATEST(COALESCE((SELECT MAX({}) FROM {}), 1), 1))",
        quote_ident("id"),
        qualify_table(schema, table)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_setval_sql_floors_at_one() {
        assert_eq!(
            build_setval_sql("public", "employments"),
            "SELECT setval(pg_get_serial_sequence($1, 'id'), \
             GREATEST(COALESCE((SELECT MAX(\"id\") FROM \"public\".\"employments\"), 1), 1))"
        );
    }
}
