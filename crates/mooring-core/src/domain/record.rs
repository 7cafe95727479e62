//! Committed asset bookkeeping.

use serde::{Deserialize, Serialize};

use super::ids::{RemoteId, RemoteUrl};

/// An asset the document currently or previously referenced at the remote store.
///
/// The document store persists a list of these next to the content; the
/// session keeps its own copy while editing.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CommittedAssetRecord {
    pub remote_id: RemoteId,
    pub remote_url: RemoteUrl,
}

impl CommittedAssetRecord {
    pub fn new(remote_id: impl Into<RemoteId>, remote_url: impl Into<RemoteUrl>) -> Self {
        Self {
            remote_id: remote_id.into(),
            remote_url: remote_url.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_json_shape() {
        let record = CommittedAssetRecord::new("r-1", "https://cdn.example/r-1");
        let v = serde_json::to_value(&record).unwrap();
        assert_eq!(v["remote_id"], "r-1");
        assert_eq!(v["remote_url"], "https://cdn.example/r-1");
    }
}
