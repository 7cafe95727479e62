//! Report model: what a commit pass, a flush, and a save pass produced.
//!
//! Reports are plain data. The notification layer and the CLI consume them;
//! nothing in the core branches on them after they are built.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::ids::{LocalHandle, RemoteId, RemoteUrl};
use super::record::CommittedAssetRecord;

/// Local handle -> durable URL for every asset committed so far.
pub type HandleMapping = BTreeMap<LocalHandle, RemoteUrl>;

/// One asset whose upload failed in a commit pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedUpload {
    pub handle: LocalHandle,
    pub file_name: String,
    pub reason: String,
}

/// Result of `commit_all`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitReport {
    /// Handles that are committed (this pass or earlier) and their URLs.
    pub uploaded: HandleMapping,

    /// Records created by this pass (excludes assets committed earlier).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub committed: Vec<CommittedAssetRecord>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failed: Vec<FailedUpload>,
}

impl CommitReport {
    /// File names of failed uploads, for the author-facing warning.
    pub fn failed_file_names(&self) -> Vec<String> {
        self.failed.iter().map(|f| f.file_name.clone()).collect()
    }
}

/// Outcome of a single deletion attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeletionOutcome {
    pub remote_id: RemoteId,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DeletionOutcome {
    pub fn deleted(remote_id: RemoteId) -> Self {
        Self {
            remote_id,
            error: None,
        }
    }

    pub fn failed(remote_id: RemoteId, error: impl Into<String>) -> Self {
        Self {
            remote_id,
            error: Some(error.into()),
        }
    }

    pub fn is_deleted(&self) -> bool {
        self.error.is_none()
    }
}

/// Result of `DeletionQueue::flush`. One outcome per id that was queued.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlushReport {
    pub outcomes: Vec<DeletionOutcome>,
}

impl FlushReport {
    pub fn failed(&self) -> Vec<RemoteId> {
        self.outcomes
            .iter()
            .filter(|o| !o.is_deleted())
            .map(|o| o.remote_id.clone())
            .collect()
    }

    pub fn deleted(&self) -> Vec<RemoteId> {
        self.outcomes
            .iter()
            .filter(|o| o.is_deleted())
            .map(|o| o.remote_id.clone())
            .collect()
    }
}

/// Result of `finalize_save`.
///
/// `content` is always present: a save pass never fails as a whole.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveReport {
    pub content: String,

    /// File names the author should be warned about.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failed_uploads: Vec<String>,

    /// Remote ids found unreferenced and handed to the deletion queue.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub orphans: Vec<RemoteId>,

    /// Remote ids whose deletion failed (logged, not retried).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failed_deletions: Vec<RemoteId>,

    /// Number of local assets released at the end of the pass.
    pub released: usize,
}
