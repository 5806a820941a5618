//! Transaction-backed [`RowSink`].

use super::{qualify_table, RowSink, WriteOutcome};
use crate::error::Result;
use crate::loader::{ChildFields, ChildKind, ChildRecord, ClientRecord};
use crate::source::layout;
use async_trait::async_trait;
use deadpool_postgres::Transaction;
use tokio_postgres::types::ToSql;
use tracing::debug;

/// Columns written from clients.csv, in bind order.
const CLIENT_COLUMNS: [&str; 18] = [
    "id",
    "name",
    "birth_date",
    "resident_id",
    "phone",
    "age",
    "gender",
    "education",
    "business_type",
    "join_type",
    "join_stage",
    "competency",
    "desired_job",
    "address",
    "university",
    "major",
    "created_at",
    "updated_at",
];

/// Columns left alone when an existing client is overwritten.
///
/// `embedding` and `embedding_source_hash` are not listed because they are
/// never written at all.
const CLIENT_KEEP_ON_CONFLICT: [&str; 2] = ["id", "created_at"];

/// Columns bound as text and cast by the server.
const CLIENT_TIMESTAMP_COLUMNS: [&str; 2] = ["created_at", "updated_at"];

/// Writes rows inside one open transaction.
pub struct PgSink<'a> {
    tx: Transaction<'a>,
    client_sql: String,
    schema: String,
}

impl<'a> PgSink<'a> {
    pub fn new(tx: Transaction<'a>, schema: &str) -> Self {
        Self {
            tx,
            client_sql: build_client_upsert_sql(schema),
            schema: schema.to_string(),
        }
    }

    /// Commit everything staged through this sink.
    pub async fn commit(self) -> Result<()> {
        self.tx.commit().await?;
        Ok(())
    }
}

#[async_trait]
impl<'a> RowSink for PgSink<'a> {
    async fn upsert_client(&mut self, c: &ClientRecord) -> Result<WriteOutcome> {
        let stmt = self.tx.prepare_cached(&self.client_sql).await?;
        let params: [&(dyn ToSql + Sync); 18] = [
            &c.id,
            &c.name,
            &c.birth_date,
            &c.resident_id,
            &c.phone,
            &c.age,
            &c.gender,
            &c.education,
            &c.business_type,
            &c.join_type,
            &c.join_stage,
            &c.competency,
            &c.desired_job,
            &c.address,
            &c.university,
            &c.major,
            &c.created_at,
            &c.updated_at,
        ];

        let row = self.tx.query_one(&stmt, &params).await?;
        let inserted: bool = row.get(0);
        Ok(if inserted {
            WriteOutcome::Inserted
        } else {
            WriteOutcome::Updated
        })
    }

    async fn insert_child(&mut self, child: &ChildRecord) -> Result<WriteOutcome> {
        let sql = build_child_insert_sql(&self.schema, child.kind());
        let stmt = self.tx.prepare_cached(&sql).await?;

        let mut params: Vec<&(dyn ToSql + Sync)> = vec![&child.id, &child.client_id];
        match &child.fields {
            ChildFields::Consultation { summary } => params.push(summary),
            ChildFields::Training { course_name } => params.push(course_name),
            ChildFields::Employment {
                job_title,
                company_name,
                salary,
            } => {
                params.push(job_title);
                params.push(company_name);
                params.push(salary);
            }
        }

        let affected = self.tx.execute(&stmt, &params).await?;
        if affected == 0 {
            debug!("{}: id {} already present, left unchanged", child.kind(), child.id);
            return Ok(WriteOutcome::Skipped);
        }
        Ok(WriteOutcome::Inserted)
    }
}

/// Upsert for one client row, reporting whether the row was new.
fn build_client_upsert_sql(schema: &str) -> String {
    let placeholders: Vec<String> = CLIENT_COLUMNS
        .iter()
        .enumerate()
        .map(|(i, col)| {
            if CLIENT_TIMESTAMP_COLUMNS.contains(col) {
                format!("${}::text::timestamp", i + 1)
            } else {
                format!("${}", i + 1)
            }
        })
        .collect();

    let update_cols: Vec<String> = CLIENT_COLUMNS
        .iter()
        .filter(|c| !CLIENT_KEEP_ON_CONFLICT.contains(*c))
        .map(|c| format!("{} = EXCLUDED.{}", c, c))
        .collect();

    format!(
        "INSERT INTO {} ({}) VALUES ({}) ON CONFLICT (id) DO UPDATE SET {} RETURNING (xmax = 0) AS inserted",
        qualify_table(schema, layout::CLIENTS.table),
        CLIENT_COLUMNS.join(", "),
        placeholders.join(", "),
        update_cols.join(", ")
    )
}

/// Insert-or-skip for one child row.
fn build_child_insert_sql(schema: &str, kind: ChildKind) -> String {
    let mut cols = vec!["id", "client_id"];
    cols.extend_from_slice(kind.value_columns());
    let placeholders: Vec<String> = (1..=cols.len()).map(|i| format!("${}", i)).collect();

    format!(
        "INSERT INTO {} ({}) VALUES ({}) ON CONFLICT (id) DO NOTHING",
        qualify_table(schema, kind.table()),
        cols.join(", "),
        placeholders.join(", ")
    )
}
