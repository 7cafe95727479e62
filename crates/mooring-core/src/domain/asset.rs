//! Local asset record: file payload + lifecycle status.

use chrono::{DateTime, Utc};

use super::errors::RegistryError;
use super::file::FileData;
use super::ids::LocalHandle;
use super::record::CommittedAssetRecord;
use super::state::AssetStatus;

/// A file inserted by the author but not yet durably stored.
///
/// Design:
/// - The registry owns every `LocalAsset`; the handle is the arena key.
/// - All status transitions go through the methods below, which enforce
///   `AssetStatus::can_transition_to`.
/// - `remote` is populated only while `status == Committed`,
///   `error` only while `status == Failed`.
#[derive(Debug, Clone)]
pub struct LocalAsset {
    pub handle: LocalHandle,
    pub file: FileData,
    pub status: AssetStatus,
    pub remote: Option<CommittedAssetRecord>,
    pub error: Option<String>,

    /// Number of upload attempts started for this asset.
    pub attempts: u32,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl LocalAsset {
    pub fn new(handle: LocalHandle, file: FileData, now: DateTime<Utc>) -> Self {
        Self {
            handle,
            file,
            status: AssetStatus::Idle,
            remote: None,
            error: None,
            attempts: 0,
            created_at: now,
            updated_at: now,
        }
    }

    fn transition(&mut self, next: AssetStatus, now: DateTime<Utc>) -> Result<(), RegistryError> {
        if !self.status.can_transition_to(next) {
            return Err(RegistryError::InvalidTransition {
                handle: self.handle.clone(),
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        self.updated_at = now;
        Ok(())
    }

    /// Idle/Failed -> Uploading (increment attempts).
    pub fn start_upload(&mut self, now: DateTime<Utc>) -> Result<(), RegistryError> {
        self.transition(AssetStatus::Uploading, now)?;
        self.attempts += 1;
        self.error = None;
        Ok(())
    }

    /// Uploading -> Committed.
    pub fn mark_committed(
        &mut self,
        record: CommittedAssetRecord,
        now: DateTime<Utc>,
    ) -> Result<(), RegistryError> {
        self.transition(AssetStatus::Committed, now)?;
        self.remote = Some(record);
        Ok(())
    }

    /// Uploading -> Failed.
    pub fn mark_failed(&mut self, error: String, now: DateTime<Utc>) -> Result<(), RegistryError> {
        self.transition(AssetStatus::Failed, now)?;
        self.error = Some(error);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn asset() -> LocalAsset {
        let t0 = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        LocalAsset::new(
            LocalHandle::from("h1"),
            FileData::new("a.png", vec![0u8; 4]),
            t0,
        )
    }

    #[test]
    fn new_asset_is_idle() {
        let a = asset();
        assert_eq!(a.status, AssetStatus::Idle);
        assert_eq!(a.attempts, 0);
        assert!(a.remote.is_none());
        assert!(a.error.is_none());
    }

    #[test]
    fn successful_upload_populates_remote() {
        let mut a = asset();
        let t1 = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 1).unwrap();
        a.start_upload(t1).unwrap();
        a.mark_committed(CommittedAssetRecord::new("r1", "u1"), t1)
            .unwrap();

        assert_eq!(a.status, AssetStatus::Committed);
        assert_eq!(a.attempts, 1);
        assert_eq!(a.remote.as_ref().unwrap().remote_url.as_str(), "u1");
        assert_eq!(a.updated_at, t1);
    }

    #[test]
    fn failed_upload_can_be_retried_and_clears_error() {
        let mut a = asset();
        let now = Utc::now();
        a.start_upload(now).unwrap();
        a.mark_failed("boom".to_string(), now).unwrap();
        assert_eq!(a.error.as_deref(), Some("boom"));

        a.start_upload(now).unwrap();
        assert_eq!(a.status, AssetStatus::Uploading);
        assert_eq!(a.attempts, 2);
        assert!(a.error.is_none());
    }

    #[test]
    fn committed_asset_rejects_new_upload() {
        let mut a = asset();
        let now = Utc::now();
        a.start_upload(now).unwrap();
        a.mark_committed(CommittedAssetRecord::new("r1", "u1"), now)
            .unwrap();

        let err = a.start_upload(now).unwrap_err();
        assert!(matches!(err, RegistryError::InvalidTransition { .. }));
        assert_eq!(a.status, AssetStatus::Committed);
        assert_eq!(a.attempts, 1);
    }
}
