//! consultation.csv, training.csv and employments.csv: insert-or-skip keyed by id.
//!
//! Child rows are historical facts. Once a row with a given id exists, later
//! runs leave it untouched even when the export now says something else.

use super::LoadStats;
use crate::coerce;
use crate::error::{Result, SeedError};
use crate::source::layout::{self, child as col, FileLayout};
use crate::source::CsvRow;
use crate::target::RowSink;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, info, warn};

/// The three child tables, each referencing `clients`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChildKind {
    Consultation,
    Training,
    Employment,
}

impl ChildKind {
    /// Load order.
    pub const ALL: [ChildKind; 3] = [
        ChildKind::Consultation,
        ChildKind::Training,
        ChildKind::Employment,
    ];

    pub fn layout(self) -> &'static FileLayout {
        match self {
            ChildKind::Consultation => &layout::CONSULTATION,
            ChildKind::Training => &layout::TRAINING,
            ChildKind::Employment => &layout::EMPLOYMENTS,
        }
    }

    /// Entity-specific columns, in the order [`ChildFields`] binds them.
    pub fn value_columns(self) -> &'static [&'static str] {
        match self {
            ChildKind::Consultation => &["summary"],
            ChildKind::Training => &["course_name"],
            ChildKind::Employment => &["job_title", "company_name", "salary"],
        }
    }

    pub fn table(self) -> &'static str {
        self.layout().table
    }
}

impl fmt::Display for ChildKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.table())
    }
}

/// Entity-specific values of a child row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChildFields {
    Consultation {
        summary: Option<String>,
    },
    Training {
        course_name: Option<String>,
    },
    Employment {
        job_title: Option<String>,
        company_name: Option<String>,
        salary: Option<i32>,
    },
}

/// One row of a child table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChildRecord {
    pub id: i64,
    pub client_id: i64,
    pub fields: ChildFields,
}

impl ChildRecord {
    pub fn kind(&self) -> ChildKind {
        match self.fields {
            ChildFields::Consultation { .. } => ChildKind::Consultation,
            ChildFields::Training { .. } => ChildKind::Training,
            ChildFields::Employment { .. } => ChildKind::Employment,
        }
    }

    /// Decode a row of `kind`'s export.
    ///
    /// Returns `Ok(None)` for rows below the minimum width. Both keys must be
    /// integers; anything else fails the row.
    pub fn from_row(kind: ChildKind, row: &CsvRow) -> Result<Option<Self>> {
        let layout = kind.layout();
        if row.len() < layout.min_columns {
            return Ok(None);
        }

        let invalid = |msg: String| SeedError::invalid_row(layout.file_name, row.line(), msg);
        let id = coerce::strict_id(row.field(col::ID), "id").map_err(invalid)?;
        let client_id = coerce::strict_id(row.field(col::CLIENT_ID), "client_id").map_err(invalid)?;

        let fields = match kind {
            ChildKind::Consultation => ChildFields::Consultation {
                summary: coerce::text(row.field(layout::consultation::SUMMARY)),
            },
            ChildKind::Training => ChildFields::Training {
                course_name: coerce::text(row.field(layout::training::COURSE_NAME)),
            },
            ChildKind::Employment => ChildFields::Employment {
                job_title: coerce::text(row.field(layout::employments::JOB_TITLE)),
                company_name: coerce::text(row.field(layout::employments::COMPANY_NAME)),
                salary: coerce::lenient_int(row.field(layout::employments::SALARY)),
            },
        };

        Ok(Some(Self {
            id,
            client_id,
            fields,
        }))
    }
}

/// Insert every new row of `kind`'s export into `sink`.
pub async fn load_children<I, S>(kind: ChildKind, rows: I, sink: &mut S) -> Result<LoadStats>
where
    I: IntoIterator<Item = Result<CsvRow>>,
    S: RowSink + ?Sized,
{
    let layout = kind.layout();
    let mut stats = LoadStats::new(layout.file_name, layout.table);

    for row in rows {
        let row = row?;
        stats.rows_read += 1;

        let Some(child) = ChildRecord::from_row(kind, &row)? else {
            debug!(
                "{}: skipping line {} ({} of {} columns)",
                layout.file_name,
                row.line(),
                row.len(),
                layout.min_columns
            );
            stats.skipped_short += 1;
            continue;
        };

        let outcome = sink.insert_child(&child).await?;
        stats.record(outcome);
    }

    info!(
        "{}: {} inserted, {} already present, {} short rows skipped",
        kind, stats.inserted, stats.skipped_existing, stats.skipped_short
    );
    if stats.skipped_short > 0 {
        warn!(
            "{}: {} rows had fewer than {} columns and were skipped",
            layout.file_name,
            stats.skipped_short,
            layout.min_columns
        );
    }
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::testing::MemorySink;
    use crate::source::CsvSource;
    use std::io::Cursor;

    fn source(kind: ChildKind, header: &str, body: &str) -> CsvSource<Cursor<Vec<u8>>> {
        let data = format!("{header}\n{body}");
        CsvSource::from_reader(kind.layout().file_name, Cursor::new(data.into_bytes()))
    }

    #[tokio::test]
    async fn test_employment_salary_is_tolerant() {
        let mut sink = MemorySink::default();
        let rows = source(
            ChildKind::Employment,
            "id,client_id,job_title,company_name,salary",
            "10,1,Engineer,Acme,\"n/a\"\n11,1,Analyst,Beta, 3200 \n",
        );
        let stats = load_children(ChildKind::Employment, rows, &mut sink).await.unwrap();

        assert_eq!(stats.inserted, 2);
        let stored = sink.children_of(ChildKind::Employment);
        assert_eq!(
            stored[0],
            &ChildRecord {
                id: 10,
                client_id: 1,
                fields: ChildFields::Employment {
                    job_title: Some("Engineer".into()),
                    company_name: Some("Acme".into()),
                    salary: None,
                },
            }
        );
        assert!(matches!(
            stored[1].fields,
            ChildFields::Employment { salary: Some(3200), .. }
        ));
    }

    #[tokio::test]
    async fn test_reload_is_first_write_wins() {
        let mut sink = MemorySink::default();
        let header = "id,client_id,summary";
        load_children(
            ChildKind::Consultation,
            source(ChildKind::Consultation, header, "1,7,first visit\n"),
            &mut sink,
        )
        .await
        .unwrap();

        let stats = load_children(
            ChildKind::Consultation,
            source(ChildKind::Consultation, header, "1,7,rewritten summary\n2,7,follow-up\n"),
            &mut sink,
        )
        .await
        .unwrap();

        assert_eq!(stats.inserted, 1);
        assert_eq!(stats.skipped_existing, 1);
        let stored = sink.children_of(ChildKind::Consultation);
        assert_eq!(stored.len(), 2);
        assert_eq!(
            stored[0].fields,
            ChildFields::Consultation {
                summary: Some("first visit".into())
            }
        );
    }

    #[tokio::test]
    async fn test_same_id_in_different_tables_is_independent() {
        let mut sink = MemorySink::default();
        load_children(
            ChildKind::Consultation,
            source(ChildKind::Consultation, "id,client_id,summary", "1,1,talk\n"),
            &mut sink,
        )
        .await
        .unwrap();
        let stats = load_children(
            ChildKind::Training,
            source(ChildKind::Training, "id,client_id,course_name", "1,1,Rust 101\n"),
            &mut sink,
        )
        .await
        .unwrap();

        assert_eq!(stats.inserted, 1);
        assert_eq!(sink.children.len(), 2);
    }

    #[tokio::test]
    async fn test_short_rows_are_skipped() {
        let mut sink = MemorySink::default();
        let rows = source(
            ChildKind::Consultation,
            "id,client_id,summary",
            "1,1\n2,1,kept\n",
        );
        let stats = load_children(ChildKind::Consultation, rows, &mut sink).await.unwrap();

        assert_eq!(stats.skipped_short, 1);
        assert_eq!(stats.inserted, 1);
        assert!(!sink.children.contains_key(&(ChildKind::Consultation, 1)));
    }

    #[tokio::test]
    async fn test_employment_needs_five_columns() {
        let mut sink = MemorySink::default();
        let rows = source(
            ChildKind::Employment,
            "id,client_id,job_title,company_name,salary",
            "10,1,Engineer,Acme\n",
        );
        let stats = load_children(ChildKind::Employment, rows, &mut sink).await.unwrap();
        assert_eq!(stats.skipped_short, 1);
        assert!(sink.children.is_empty());
    }

    #[tokio::test]
    async fn test_blank_text_is_null() {
        let mut sink = MemorySink::default();
        let rows = source(ChildKind::Training, "id,client_id,course_name", "3,1,   \n");
        load_children(ChildKind::Training, rows, &mut sink).await.unwrap();
        assert_eq!(
            sink.children[&(ChildKind::Training, 3)].fields,
            ChildFields::Training { course_name: None }
        );
    }

    #[tokio::test]
    async fn test_bad_foreign_key_stops_the_file() {
        let mut sink = MemorySink::default();
        let rows = source(
            ChildKind::Training,
            "id,client_id,course_name",
            "1,1,Rust 101\n2,abc,SQL\n3,1,Docker\n",
        );
        let err = load_children(ChildKind::Training, rows, &mut sink)
            .await
            .unwrap_err();

        match err {
            SeedError::InvalidRow { file, line, message } => {
                assert_eq!(file, "training.csv");
                assert_eq!(line, 3);
                assert!(message.contains("client_id 'abc'"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        // The row after the failure is never reached.
        assert!(!sink.children.contains_key(&(ChildKind::Training, 3)));
    }
}
