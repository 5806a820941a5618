//! Target schema creation.
//!
//! All statements are idempotent (`IF NOT EXISTS`) and run in one
//! transaction, so an existing schema is left as it is and a failed attempt
//! leaves nothing half-created.

use crate::error::Result;
use crate::source::layout;
use crate::target::{qualify_table, quote_ident};
use deadpool_postgres::Object;
use tracing::{debug, info};

/// Extension providing the `vector` column type.
pub const VECTOR_EXTENSION: &str = "vector";

/// DDL for the extension, the schema and the four tables, in execution order.
pub fn schema_ddl(schema: &str, embedding_dimensions: u32) -> Vec<String> {
    let clients = qualify_table(schema, layout::CLIENTS.table);

    let mut ddl = vec![
        format!("CREATE EXTENSION IF NOT EXISTS {}", VECTOR_EXTENSION),
        format!("CREATE SCHEMA IF NOT EXISTS {}", quote_ident(schema)),
        format!(
            "CREATE TABLE IF NOT EXISTS {clients} (
    id BIGSERIAL PRIMARY KEY,
    name VARCHAR(255),
    birth_date VARCHAR(50),
    resident_id VARCHAR(20),
    phone VARCHAR(50),
    age INTEGER,
    gender VARCHAR(20),
    education VARCHAR(255),
    business_type VARCHAR(100),
    join_type VARCHAR(100),
    join_stage VARCHAR(100),
    competency VARCHAR(500),
    desired_job TEXT,
    address TEXT,
    university VARCHAR(255),
    major VARCHAR(255),
    embedding vector({embedding_dimensions}),
    created_at TIMESTAMP,
    updated_at TIMESTAMP,
    embedding_source_hash VARCHAR(64)
)"
        ),
    ];

    let children = [
        (layout::CONSULTATION.table, "summary TEXT"),
        (layout::TRAINING.table, "course_name TEXT"),
        (
            layout::EMPLOYMENTS.table,
            "job_title VARCHAR(255),\n    company_name VARCHAR(255),\n    salary INTEGER",
        ),
    ];
    for (table, columns) in children {
        ddl.push(format!(
            "CREATE TABLE IF NOT EXISTS {table} (
    id BIGSERIAL PRIMARY KEY,
    client_id BIGINT NOT NULL REFERENCES {clients}(id) ON DELETE CASCADE,
    {columns},
    created_at TIMESTAMP DEFAULT NOW(),
    updated_at TIMESTAMP DEFAULT NOW()
)",
            table = qualify_table(schema, table),
        ));
    }

    ddl
}

/// Ensure the extension and all four tables exist.
pub async fn ensure_schema(session: &mut Object, schema: &str, embedding_dimensions: u32) -> Result<()> {
    let tx = session.transaction().await?;
    for statement in schema_ddl(schema, embedding_dimensions) {
        debug!("{}", statement.lines().next().unwrap_or_default());
        tx.batch_execute(&statement).await?;
    }
    tx.commit().await?;

    info!("Schema ready in '{}' (embedding dimension {})", schema, embedding_dimensions);
    Ok(())
}
