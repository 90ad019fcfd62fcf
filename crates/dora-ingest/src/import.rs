//! Bulk import of JSONL event files through the same upserts sync uses.

use std::io::BufRead;

use serde::Serialize;
use tracing::{error, info};

use dora_core::jsonl::{EventRecord, read_jsonl};
use dora_storage::Storage;

use crate::error::Result;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ImportReport {
    pub commits: usize,
    pub pull_requests: usize,
    pub deployments: usize,
    /// Records that parsed but could not be saved.
    pub failed: usize,
}

impl ImportReport {
    pub fn total(&self) -> usize {
        self.commits + self.pull_requests + self.deployments
    }
}

/// Reads every record from `reader` and upserts it.
///
/// A malformed line stops the import with its line number; records before
/// it stay saved. A record the store rejects is logged and counted.
pub fn import_events<R: BufRead>(store: &dyn Storage, reader: R) -> Result<ImportReport> {
    let mut report = ImportReport::default();
    for record in read_jsonl(reader) {
        let record = record?;
        let saved = match &record {
            EventRecord::Commit(c) => store.upsert_commit(c),
            EventRecord::PullRequest(pr) => store.upsert_pull_request(pr),
            EventRecord::Deployment(d) => store.upsert_deployment(d),
        };
        match saved {
            Ok(()) => match record {
                EventRecord::Commit(_) => report.commits += 1,
                EventRecord::PullRequest(_) => report.pull_requests += 1,
                EventRecord::Deployment(_) => report.deployments += 1,
            },
            Err(err) => {
                error!(kind = record.kind(), error = %err, "failed to import record");
                report.failed += 1;
            }
        }
    }
    info!(
        imported = report.total(),
        failed = report.failed,
        "import finished"
    );
    Ok(report)
}
