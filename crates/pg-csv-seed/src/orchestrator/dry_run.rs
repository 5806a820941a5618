//! Sink used by dry runs: remembers ids instead of writing them.

use crate::error::Result;
use crate::loader::{ChildKind, ChildRecord, ClientRecord};
use crate::target::{RowSink, WriteOutcome};
use async_trait::async_trait;
use std::collections::HashSet;

#[derive(Debug, Default)]
pub(super) struct DryRunSink {
    clients: HashSet<i64>,
    children: HashSet<(ChildKind, i64)>,
}

#[async_trait]
impl RowSink for DryRunSink {
    async fn upsert_client(&mut self, client: &ClientRecord) -> Result<WriteOutcome> {
        if self.clients.insert(client.id) {
            Ok(WriteOutcome::Inserted)
        } else {
            Ok(WriteOutcome::Updated)
        }
    }

    async fn insert_child(&mut self, child: &ChildRecord) -> Result<WriteOutcome> {
        if self.children.insert((child.kind(), child.id)) {
            Ok(WriteOutcome::Inserted)
        } else {
            Ok(WriteOutcome::Skipped)
        }
    }
}
