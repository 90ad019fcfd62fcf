//! Ingestion error types.

use dora_storage::StorageError;

/// Errors that can occur while fetching or importing events.
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    /// The HTTP request failed or returned a non-success status.
    #[error("{provider} request to {url} failed: {source}")]
    Http {
        provider: &'static str,
        url: String,
        #[source]
        source: Box<ureq::Error>,
    },

    /// A provider is not configured with the credential it needs.
    #[error("{provider} is not configured: missing {setting}")]
    MissingCredential {
        provider: &'static str,
        setting: &'static str,
    },

    #[error("team {team_id} not found")]
    TeamNotFound { team_id: i64 },

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("import error: {0}")]
    Import(#[from] dora_core::jsonl::JsonlError),
}

pub type Result<T> = std::result::Result<T, IngestError>;

impl IngestError {
    pub(crate) fn http(provider: &'static str, url: &str, source: ureq::Error) -> Self {
        Self::Http {
            provider,
            url: url.to_string(),
            source: Box::new(source),
        }
    }

    /// Maps a missing-team lookup onto [`IngestError::TeamNotFound`].
    pub(crate) fn from_team_lookup(team_id: i64, err: StorageError) -> Self {
        if err.is_not_found() {
            Self::TeamNotFound { team_id }
        } else {
            Self::Storage(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_credential_message() {
        let err = IngestError::MissingCredential {
            provider: "github",
            setting: "github.token",
        };
        assert_eq!(err.to_string(), "github is not configured: missing github.token");
    }

    #[test]
    fn team_lookup_mapping() {
        let err = IngestError::from_team_lookup(7, StorageError::not_found("team", "7"));
        assert!(matches!(err, IngestError::TeamNotFound { team_id: 7 }));

        let err = IngestError::from_team_lookup(7, StorageError::validation("bad"));
        assert!(matches!(err, IngestError::Storage(_)));
    }
}
