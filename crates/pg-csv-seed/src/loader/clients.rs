//! clients.csv: insert-or-update keyed by id.

use super::LoadStats;
use crate::coerce;
use crate::error::{Result, SeedError};
use crate::source::layout::{self, clients as col};
use crate::source::CsvRow;
use crate::target::RowSink;
use tracing::{debug, info, warn};

/// One client row as written to the `clients` table.
///
/// The embedding and its source hash are absent on purpose: they belong to
/// the embedding process and are never written here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientRecord {
    pub id: i64,
    pub name: Option<String>,
    pub birth_date: Option<String>,
    pub resident_id: Option<String>,
    pub phone: Option<String>,
    pub age: Option<i32>,
    pub gender: Option<String>,
    pub education: Option<String>,
    pub business_type: Option<String>,
    pub join_type: Option<String>,
    pub join_stage: Option<String>,
    pub competency: Option<String>,
    pub desired_job: Option<String>,
    pub address: Option<String>,
    pub university: Option<String>,
    pub major: Option<String>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

impl ClientRecord {
    /// Decode a row. Returns `Ok(None)` for rows below the minimum width and
    /// an error when the id is not an integer.
    pub fn from_row(row: &CsvRow) -> Result<Option<Self>> {
        if row.len() < layout::CLIENTS.min_columns {
            return Ok(None);
        }

        let id = coerce::strict_id(row.field(col::ID), "id")
            .map_err(|msg| SeedError::invalid_row(layout::CLIENTS.file_name, row.line(), msg))?;

        Ok(Some(Self {
            id,
            name: coerce::text(row.field(col::NAME)),
            birth_date: coerce::text(row.field(col::BIRTH_DATE)),
            resident_id: coerce::text(row.field(col::RESIDENT_ID)),
            phone: coerce::text(row.field(col::PHONE)),
            age: coerce::lenient_int(row.field(col::AGE)),
            gender: coerce::text(row.field(col::GENDER)),
            education: coerce::text(row.field(col::EDUCATION)),
            business_type: coerce::text(row.field(col::BUSINESS_TYPE)),
            join_type: coerce::text(row.field(col::JOIN_TYPE)),
            join_stage: coerce::text(row.field(col::JOIN_STAGE)),
            competency: coerce::text(row.field(col::COMPETENCY)),
            desired_job: coerce::single_line(row.field(col::DESIRED_JOB)),
            address: coerce::text(row.field(col::ADDRESS)),
            university: coerce::text(row.field(col::UNIVERSITY)),
            major: coerce::text(row.field(col::MAJOR)),
            created_at: row.optional(col::CREATED_AT).and_then(coerce::text),
            updated_at: row.optional(col::UPDATED_AT).and_then(coerce::text),
        }))
    }
}

/// Upsert every row of clients.csv into `sink`.
///
/// Re-running with a changed export converges each stored client to the
/// latest values.
pub async fn load_clients<I, S>(rows: I, sink: &mut S) -> Result<LoadStats>
where
    I: IntoIterator<Item = Result<CsvRow>>,
    S: RowSink + ?Sized,
{
    let mut stats = LoadStats::new(layout::CLIENTS.file_name, layout::CLIENTS.table);

    for row in rows {
        let row = row?;
        stats.rows_read += 1;

        let Some(client) = ClientRecord::from_row(&row)? else {
            debug!(
                "{}: skipping line {} ({} of {} columns)",
                layout::CLIENTS.file_name,
                row.line(),
                row.len(),
                layout::CLIENTS.min_columns
            );
            stats.skipped_short += 1;
            continue;
        };

        let outcome = sink.upsert_client(&client).await?;
        stats.record(outcome);
    }

    info!(
        "clients: {} inserted, {} updated, {} short rows skipped",
        stats.inserted, stats.updated, stats.skipped_short
    );
    if stats.skipped_short > 0 {
        warn!(
            "{}: {} rows had fewer than {} columns and were skipped",
            layout::CLIENTS.file_name,
            stats.skipped_short,
            layout::CLIENTS.min_columns
        );
    }
    Ok(stats)
}
