//! Local Asset Registry: arena of not-yet-durable files keyed by local handle.
//!
//! Pure data + transitions. No I/O happens here; the commit pass drives the
//! transitions and the session decides when to release.

mod counts;

pub use counts::RegistryCounts;

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::domain::{
    AssetStatus, CommittedAssetRecord, FileData, HandleMapping, LocalAsset, LocalHandle,
    RegistryError, RemoteUrl, SessionId,
};
use crate::ports::{Clock, HandleGenerator, PreviewReleaser};

/// Registry of local assets for one editing session.
///
/// Design:
/// - The registry exclusively owns every `LocalAsset` and its file payload.
/// - A failed transition on one handle never touches any other entry.
/// - `closed` + `session` form the liveness check used by upload completions
///   that arrive after the session was torn down.
pub struct LocalAssetRegistry {
    session: SessionId,
    assets: HashMap<LocalHandle, LocalAsset>,
    closed: bool,
    handle_prefix: String,
    id_gen: Arc<dyn HandleGenerator>,
    clock: Arc<dyn Clock>,
}

impl LocalAssetRegistry {
    pub fn new(
        session: SessionId,
        handle_prefix: impl Into<String>,
        id_gen: Arc<dyn HandleGenerator>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            session,
            assets: HashMap::new(),
            closed: false,
            handle_prefix: handle_prefix.into(),
            id_gen,
            clock,
        }
    }

    pub fn session(&self) -> SessionId {
        self.session
    }

    /// Is this registry still the live registry of `session`?
    pub fn is_live(&self, session: SessionId) -> bool {
        !self.closed && self.session == session
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Track a new file and return its fresh handle. Never fails.
    pub fn register(&mut self, file: FileData) -> LocalHandle {
        let mut handle = self.id_gen.generate_handle(&self.handle_prefix);
        while self.assets.contains_key(&handle) {
            handle = self.id_gen.generate_handle(&self.handle_prefix);
        }
        debug!(handle = %handle, file = %file.name, size = file.len(), "registered local asset");
        let asset = LocalAsset::new(handle.clone(), file, self.clock.now());
        self.assets.insert(handle.clone(), asset);
        handle
    }

    pub fn get(&self, handle: &LocalHandle) -> Option<&LocalAsset> {
        self.assets.get(handle)
    }

    fn get_mut(&mut self, handle: &LocalHandle) -> Result<&mut LocalAsset, RegistryError> {
        self.assets
            .get_mut(handle)
            .ok_or_else(|| RegistryError::UnknownHandle(handle.clone()))
    }

    /// Idle/Failed -> Uploading. Returns the payload to hand to the gateway.
    pub fn mark_uploading(&mut self, handle: &LocalHandle) -> Result<FileData, RegistryError> {
        let now = self.clock.now();
        let asset = self.get_mut(handle)?;
        asset.start_upload(now)?;
        debug!(handle = %handle, attempt = asset.attempts, "upload started");
        Ok(asset.file.clone())
    }

    /// Uploading -> Committed.
    ///
    /// Calling this on an already committed handle is a no-op that returns the
    /// URL recorded the first time.
    pub fn mark_committed(
        &mut self,
        handle: &LocalHandle,
        record: CommittedAssetRecord,
    ) -> Result<RemoteUrl, RegistryError> {
        let now = self.clock.now();
        let asset = self.get_mut(handle)?;
        if asset.status == AssetStatus::Committed
            && let Some(existing) = &asset.remote
        {
            return Ok(existing.remote_url.clone());
        }
        let url = record.remote_url.clone();
        asset.mark_committed(record, now)?;
        debug!(handle = %handle, url = %url, "asset committed");
        Ok(url)
    }

    /// Uploading -> Failed.
    pub fn mark_failed(
        &mut self,
        handle: &LocalHandle,
        error: impl Into<String>,
    ) -> Result<(), RegistryError> {
        let now = self.clock.now();
        let asset = self.get_mut(handle)?;
        asset.mark_failed(error.into(), now)?;
        debug!(handle = %handle, "asset marked failed");
        Ok(())
    }

    /// Handles a commit pass may start an upload for (Idle or Failed).
    pub fn uploadable_handles(&self) -> Vec<LocalHandle> {
        let mut handles: Vec<LocalHandle> = self
            .assets
            .values()
            .filter(|a| a.status.is_uploadable())
            .map(|a| a.handle.clone())
            .collect();
        handles.sort();
        handles
    }

    /// Every committed handle with its cached URL.
    pub fn committed_mapping(&self) -> HandleMapping {
        self.assets
            .values()
            .filter_map(|a| match (&a.status, &a.remote) {
                (AssetStatus::Committed, Some(record)) => {
                    Some((a.handle.clone(), record.remote_url.clone()))
                }
                _ => None,
            })
            .collect()
    }

    pub fn counts(&self) -> RegistryCounts {
        let mut counts = RegistryCounts::default();
        for asset in self.assets.values() {
            counts.add(asset.status);
        }
        counts
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }

    /// Every handle currently tracked, sorted.
    pub fn handles(&self) -> Vec<LocalHandle> {
        let mut handles: Vec<LocalHandle> = self.assets.keys().cloned().collect();
        handles.sort();
        handles
    }

    /// Release the previews of `handles` and drop their entries.
    ///
    /// Handles no longer tracked are skipped; entries not listed are left
    /// alone. Release failures are logged and do not stop the sweep; the entry
    /// is dropped either way. Returns the number of entries that were cleared.
    pub fn release(&mut self, handles: &[LocalHandle], releaser: &dyn PreviewReleaser) -> usize {
        let mut released = 0;
        for handle in handles {
            let Some(asset) = self.assets.remove(handle) else {
                continue;
            };
            release_one(releaser, handle, &asset);
            released += 1;
        }
        if released > 0 {
            debug!(session = %self.session, released, "local assets released");
        }
        released
    }

    /// Release every tracked preview and clear the registry.
    ///
    /// Safe to call repeatedly. Returns the number of entries that were cleared.
    pub fn release_all(&mut self, releaser: &dyn PreviewReleaser) -> usize {
        let released = self.assets.len();
        for (handle, asset) in self.assets.drain() {
            release_one(releaser, &handle, &asset);
        }
        if released > 0 {
            debug!(session = %self.session, released, "local assets released");
        }
        released
    }

    /// Mark the registry as torn down. Later completions see `is_live == false`.
    pub fn close(&mut self) {
        self.closed = true;
    }
}

fn release_one(releaser: &dyn PreviewReleaser, handle: &LocalHandle, asset: &LocalAsset) {
    if let Err(e) = releaser.release(handle) {
        warn!(handle = %handle, file = %asset.file.name, error = %e, "preview release failed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ReleaseError;
    use crate::ports::{NoopReleaser, SystemClock, UlidGenerator};
    use std::sync::Mutex;
    use ulid::Ulid;

    fn registry() -> LocalAssetRegistry {
        LocalAssetRegistry::new(
            SessionId::from_ulid(Ulid::new()),
            "blob:test/",
            Arc::new(UlidGenerator::new(SystemClock)),
            Arc::new(SystemClock),
        )
    }

    fn file(name: &str) -> FileData {
        FileData::new(name, name.as_bytes().to_vec())
    }

    struct FailingReleaser {
        calls: Mutex<Vec<LocalHandle>>,
    }

    impl PreviewReleaser for FailingReleaser {
        fn release(&self, handle: &LocalHandle) -> Result<(), ReleaseError> {
            self.calls.lock().unwrap().push(handle.clone());
            Err(ReleaseError {
                handle: handle.clone(),
                reason: "revoked twice".to_string(),
            })
        }
    }

    #[test]
    fn register_creates_idle_entry_with_prefixed_handle() {
        let mut reg = registry();
        let handle = reg.register(file("a.png"));

        assert!(handle.as_str().starts_with("blob:test/"));
        let asset = reg.get(&handle).unwrap();
        assert_eq!(asset.status, AssetStatus::Idle);
        assert_eq!(asset.file.name, "a.png");
        assert_eq!(reg.counts().idle, 1);
    }

    #[test]
    fn mark_committed_twice_returns_first_url() {
        let mut reg = registry();
        let handle = reg.register(file("a.png"));
        reg.mark_uploading(&handle).unwrap();

        let first = reg
            .mark_committed(&handle, CommittedAssetRecord::new("r1", "u1"))
            .unwrap();
        let second = reg
            .mark_committed(&handle, CommittedAssetRecord::new("r2", "u2"))
            .unwrap();

        assert_eq!(first, RemoteUrl::from("u1"));
        assert_eq!(second, RemoteUrl::from("u1"));
        let remote = reg.get(&handle).unwrap().remote.clone().unwrap();
        assert_eq!(remote.remote_id.as_str(), "r1");
    }

    #[test]
    fn unknown_handle_is_rejected_without_touching_others() {
        let mut reg = registry();
        let handle = reg.register(file("a.png"));

        let err = reg.mark_uploading(&LocalHandle::from("nope")).unwrap_err();
        assert_eq!(err, RegistryError::UnknownHandle(LocalHandle::from("nope")));
        assert_eq!(reg.get(&handle).unwrap().status, AssetStatus::Idle);
    }

    #[test]
    fn uploading_handle_is_not_uploadable_again() {
        let mut reg = registry();
        let h1 = reg.register(file("a.png"));
        let h2 = reg.register(file("b.png"));
        reg.mark_uploading(&h1).unwrap();

        assert_eq!(reg.uploadable_handles(), vec![h2]);
        assert!(matches!(
            reg.mark_uploading(&h1),
            Err(RegistryError::InvalidTransition { .. })
        ));
    }

    #[test]
    fn failed_entry_is_uploadable_again() {
        let mut reg = registry();
        let handle = reg.register(file("a.png"));
        reg.mark_uploading(&handle).unwrap();
        reg.mark_failed(&handle, "timeout").unwrap();

        assert_eq!(reg.uploadable_handles(), vec![handle.clone()]);
        assert_eq!(reg.get(&handle).unwrap().error.as_deref(), Some("timeout"));
    }

    #[test]
    fn committed_mapping_contains_only_committed() {
        let mut reg = registry();
        let h1 = reg.register(file("a.png"));
        let h2 = reg.register(file("b.png"));
        reg.mark_uploading(&h1).unwrap();
        reg.mark_committed(&h1, CommittedAssetRecord::new("r1", "u1"))
            .unwrap();
        reg.mark_uploading(&h2).unwrap();

        let mapping = reg.committed_mapping();
        assert_eq!(mapping.len(), 1);
        assert_eq!(mapping.get(&h1), Some(&RemoteUrl::from("u1")));
    }

    #[test]
    fn release_all_is_repeatable() {
        let mut reg = registry();
        reg.register(file("a.png"));
        reg.register(file("b.png"));

        assert_eq!(reg.release_all(&NoopReleaser), 2);
        assert!(reg.is_empty());
        assert_eq!(reg.release_all(&NoopReleaser), 0);
    }

    #[test]
    fn release_leaves_unlisted_entries_alone() {
        let mut reg = registry();
        let h1 = reg.register(file("a.png"));
        let snapshot = reg.handles();
        let h2 = reg.register(file("b.png"));

        assert_eq!(reg.release(&snapshot, &NoopReleaser), 1);
        assert!(reg.get(&h1).is_none());
        assert_eq!(reg.get(&h2).unwrap().status, AssetStatus::Idle);
        assert_eq!(reg.release(&snapshot, &NoopReleaser), 0);
    }

    #[test]
    fn release_failures_do_not_stop_the_sweep() {
        let mut reg = registry();
        reg.register(file("a.png"));
        reg.register(file("b.png"));
        let releaser = FailingReleaser {
            calls: Mutex::new(Vec::new()),
        };

        assert_eq!(reg.release_all(&releaser), 2);
        assert_eq!(releaser.calls.lock().unwrap().len(), 2);
        assert!(reg.is_empty());
    }

    #[test]
    fn closed_registry_is_not_live() {
        let mut reg = registry();
        let session = reg.session();
        assert!(reg.is_live(session));
        assert!(!reg.is_live(SessionId::from_ulid(Ulid::new())));

        reg.close();
        assert!(!reg.is_live(session));
    }
}
