//! JSONL (JSON Lines) event import format.
//!
//! Each line is one tagged event record:
//!
//! ```text
//! {"kind":"commit","sha":"abc","team_id":1,"repo_name":"api","message":"Fix (#7)","committed_at":"2024-03-09T10:00:00Z"}
//! {"kind":"deployment","team_id":1,"repo_name":"api","commit_sha":"abc","status":"success","deployed_at":"2024-03-10T10:00:00Z"}
//! ```

use std::io::{self, BufRead};

use serde::{Deserialize, Serialize};

use crate::event::{Commit, Deployment, PullRequest};
use crate::pr_ref::extract_pr_number;

/// Error type for JSONL operations.
#[derive(Debug, thiserror::Error)]
pub enum JsonlError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error at line {line}: {source}")]
    Json {
        line: usize,
        source: serde_json::Error,
    },
}

/// Result alias for JSONL operations.
pub type Result<T> = std::result::Result<T, JsonlError>;

/// A single imported event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EventRecord {
    Commit(Commit),
    PullRequest(PullRequest),
    Deployment(Deployment),
}

impl EventRecord {
    /// Fills in values the ingestion path would have derived.
    ///
    /// Commits without an explicit PR number get one from their message.
    pub fn normalize(self) -> Self {
        match self {
            Self::Commit(mut c) => {
                if c.pr_number.is_none() {
                    c.pr_number = extract_pr_number(&c.message);
                }
                Self::Commit(c)
            }
            other => other,
        }
    }

    /// Short name of the record kind, for logs and reports.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Commit(_) => "commit",
            Self::PullRequest(_) => "pull_request",
            Self::Deployment(_) => "deployment",
        }
    }
}

/// Returns an iterator that reads event records from a JSONL reader.
///
/// Each line is parsed as a JSON object. Empty lines are skipped.
pub fn read_jsonl<R: BufRead>(reader: R) -> JsonlIter<R> {
    JsonlIter {
        reader,
        line_number: 0,
    }
}

/// Iterator over JSONL-encoded event records.
pub struct JsonlIter<R> {
    reader: R,
    line_number: usize,
}

impl<R: BufRead> Iterator for JsonlIter<R> {
    type Item = Result<EventRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut line = String::new();
        loop {
            line.clear();
            match self.reader.read_line(&mut line) {
                Ok(0) => return None,
                Ok(_) => {
                    self.line_number += 1;
                    let trimmed = line.trim();
                    if trimmed.is_empty() {
                        continue;
                    }
                    return Some(
                        serde_json::from_str::<EventRecord>(trimmed)
                            .map(EventRecord::normalize)
                            .map_err(|e| JsonlError::Json {
                                line: self.line_number,
                                source: e,
                            }),
                    );
                }
                Err(e) => return Some(Err(JsonlError::Io(e))),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enums::DeploymentStatus;
    use std::io::BufReader;

    #[test]
    fn reads_tagged_records() {
        let data = concat!(
            r#"{"kind":"commit","sha":"abc","team_id":1,"repo_name":"api","message":"Fix (#7)","committed_at":"2024-03-09T10:00:00Z"}"#,
            "\n\n",
            r#"{"kind":"deployment","team_id":1,"repo_name":"api","commit_sha":"abc","status":"success","deployed_at":"2024-03-10T10:00:00Z","duration_seconds":600}"#,
            "\n",
        );
        let records: Vec<EventRecord> = read_jsonl(BufReader::new(data.as_bytes()))
            .collect::<Result<Vec<_>>>()
            .unwrap();
        assert_eq!(records.len(), 2);
        match &records[0] {
            EventRecord::Commit(c) => assert_eq!(c.pr_number, Some(7)),
            other => panic!("expected commit, got {other:?}"),
        }
        match &records[1] {
            EventRecord::Deployment(d) => {
                assert_eq!(d.status, DeploymentStatus::Success);
                assert_eq!(d.duration_seconds, Some(600));
            }
            other => panic!("expected deployment, got {other:?}"),
        }
    }

    #[test]
    fn explicit_pr_number_is_kept() {
        let data = r#"{"kind":"commit","sha":"abc","team_id":1,"repo_name":"api","message":"see #1","committed_at":"2024-03-09T10:00:00Z","pr_number":9}"#;
        let rec = read_jsonl(BufReader::new(data.as_bytes())).next().unwrap().unwrap();
        assert_eq!(rec.kind(), "commit");
        match rec {
            EventRecord::Commit(c) => assert_eq!(c.pr_number, Some(9)),
            other => panic!("expected commit, got {other:?}"),
        }
    }

    #[test]
    fn reports_line_number_on_error() {
        let data = b"\n{\"kind\":\"bogus\"}\n";
        let results: Vec<_> = read_jsonl(BufReader::new(data.as_slice())).collect();
        assert_eq!(results.len(), 1);
        match &results[0] {
            Err(JsonlError::Json { line, .. }) => assert_eq!(*line, 2),
            other => panic!("expected JSON error, got {other:?}"),
        }
    }
}
