//! Asset status state machine.

use serde::{Deserialize, Serialize};

/// Lifecycle status of a local asset.
///
/// State transitions:
/// - Idle -> Uploading -> Committed
/// - Idle -> Uploading -> Failed -> Uploading (retry)
///
/// `Committed` is terminal: a committed asset is never uploaded again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetStatus {
    /// Registered, preview only, not yet sent to the remote store.
    Idle,

    /// An upload is in flight.
    Uploading,

    /// Durably stored; `remote` is populated.
    Committed,

    /// Last upload attempt failed; `error` is populated.
    Failed,
}

impl AssetStatus {
    /// Is this a terminal state (no further transitions)?
    pub fn is_terminal(self) -> bool {
        matches!(self, AssetStatus::Committed)
    }

    /// Can a commit pass start an upload for this asset?
    pub fn is_uploadable(self) -> bool {
        matches!(self, AssetStatus::Idle | AssetStatus::Failed)
    }

    pub fn can_transition_to(self, next: AssetStatus) -> bool {
        use AssetStatus::*;
        matches!(
            (self, next),
            (Idle, Uploading) | (Failed, Uploading) | (Uploading, Committed) | (Uploading, Failed)
        )
    }
}

impl std::fmt::Display for AssetStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            AssetStatus::Idle => "idle",
            AssetStatus::Uploading => "uploading",
            AssetStatus::Committed => "committed",
            AssetStatus::Failed => "failed",
        };
        f.write_str(s)
    }
}
