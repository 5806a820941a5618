//! Per-file loaders.
//!
//! A loader walks the rows of one export, converts each into a typed record
//! and hands it to a [`RowSink`]. The first fatal row stops the loader and the
//! error propagates; the caller owns the transaction and decides to commit
//! only when the loader returns `Ok`.

mod children;
mod clients;

pub use children::{load_children, ChildFields, ChildKind, ChildRecord};
pub use clients::{load_clients, ClientRecord};

use crate::target::WriteOutcome;
use serde::{Deserialize, Serialize};

/// Row counters for one loaded file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadStats {
    /// Source file name.
    pub file: String,

    /// Target table.
    pub table: String,

    /// Data rows read (header excluded).
    pub rows_read: u64,

    /// Rows that did not exist before.
    pub inserted: u64,

    /// Existing rows overwritten (clients only).
    pub updated: u64,

    /// Rows left untouched because the id already existed (children only).
    pub skipped_existing: u64,

    /// Rows below the file's minimum column count.
    pub skipped_short: u64,
}

impl LoadStats {
    pub(crate) fn new(file: &str, table: &str) -> Self {
        Self {
            file: file.to_string(),
            table: table.to_string(),
            ..Self::default()
        }
    }

    pub(crate) fn record(&mut self, outcome: WriteOutcome) {
        match outcome {
            WriteOutcome::Inserted => self.inserted += 1,
            WriteOutcome::Updated => self.updated += 1,
            WriteOutcome::Skipped => self.skipped_existing += 1,
        }
    }

    /// Rows written to the table.
    pub fn written(&self) -> u64 {
        self.inserted + self.updated
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! In-memory sink with the same conflict rules as the SQL statements.

    use super::{ChildKind, ChildRecord, ClientRecord};
    use crate::error::Result;
    use crate::target::{RowSink, WriteOutcome};
    use async_trait::async_trait;
    use std::collections::BTreeMap;

    #[derive(Debug, Clone, PartialEq)]
    pub struct StoredClient {
        pub record: ClientRecord,
        pub embedding: Option<Vec<f32>>,
        pub embedding_source_hash: Option<String>,
    }

    #[derive(Debug, Default)]
    pub struct MemorySink {
        pub clients: BTreeMap<i64, StoredClient>,
        pub children: BTreeMap<(ChildKind, i64), ChildRecord>,
    }

    impl MemorySink {
        pub fn children_of(&self, kind: ChildKind) -> Vec<&ChildRecord> {
            self.children
                .iter()
                .filter(|((k, _), _)| *k == kind)
                .map(|(_, v)| v)
                .collect()
        }
    }

    #[async_trait]
    impl RowSink for MemorySink {
        async fn upsert_client(&mut self, client: &ClientRecord) -> Result<WriteOutcome> {
            match self.clients.get_mut(&client.id) {
                Some(stored) => {
                    // created_at is only written on insert.
                    let created_at = stored.record.created_at.clone();
                    stored.record = client.clone();
                    stored.record.created_at = created_at;
                    Ok(WriteOutcome::Updated)
                }
                None => {
                    self.clients.insert(
                        client.id,
                        StoredClient {
                            record: client.clone(),
                            embedding: None,
                            embedding_source_hash: None,
                        },
                    );
                    Ok(WriteOutcome::Inserted)
                }
            }
        }

        async fn insert_child(&mut self, child: &ChildRecord) -> Result<WriteOutcome> {
            let key = (child.kind(), child.id);
            if self.children.contains_key(&key) {
                return Ok(WriteOutcome::Skipped);
            }
            self.children.insert(key, child.clone());
            Ok(WriteOutcome::Inserted)
        }
    }
}
