//! EditingSession - 保存時の後始末をまとめる外部向けの窓口
//!
//! `finalize_save` は以下を固定の順序で実行します（巻き戻しはしない）:
//!
//! 1. commit: 未保存の資産をすべてアップロード
//! 2. rewrite: 本文中の handle を永続 URL に置換
//! 3. orphans: 置換後の本文から消えた既知の資産を検出
//! 4. delete: 検出した資産を削除キューに入れて flush
//! 5. release: パス開始時にあった資産を解放（どの経路で抜けても必ず実行）
//!
//! 保存中に登録された資産は解放せず、Idle のまま次のパスに回します。
//!
//! 資産単位の失敗はパス全体の失敗にしません。`finalize_save` は常に本文を返します。

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{Instrument, info, info_span, warn};

use crate::app::commit::CommitOrchestrator;
use crate::app::config::SessionConfig;
use crate::app::deletion::{DeletionQueue, delete_all};
use crate::app::orphans::find_orphans;
use crate::app::rewrite::{contains_exact, rewrite};
use crate::domain::{
    AssetStatus, CommitReport, CommittedAssetRecord, FileData, FlushReport, LocalHandle,
    RegistryError, RemoteId, SaveReport, SessionId,
};
use crate::ports::{AssetGateway, Clock, HandleGenerator, Notifier, PreviewReleaser};
use crate::registry::{LocalAssetRegistry, RegistryCounts};

/// Releases the assets a save pass started with when dropped, unless released
/// explicitly first.
///
/// Covers early returns, panics in a step, and the save future being dropped.
/// Assets registered after the pass began are not touched; they stay Idle for
/// the next pass.
struct ReleaseGuard<'a> {
    registry: &'a Mutex<LocalAssetRegistry>,
    releaser: &'a dyn PreviewReleaser,
    handles: Vec<LocalHandle>,
    armed: bool,
}

impl<'a> ReleaseGuard<'a> {
    fn new(registry: &'a Mutex<LocalAssetRegistry>, releaser: &'a dyn PreviewReleaser) -> Self {
        let handles = registry.lock().handles();
        Self {
            registry,
            releaser,
            handles,
            armed: true,
        }
    }

    fn release(mut self) -> usize {
        self.armed = false;
        self.registry.lock().release(&self.handles, self.releaser)
    }
}

impl Drop for ReleaseGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            let released = self.registry.lock().release(&self.handles, self.releaser);
            warn!(released, "save pass interrupted, local assets released");
        }
    }
}

/// One editing session of one document.
///
/// Owns the local asset registry, the deletion queue, and the list of
/// committed records known to belong to the document. Nothing here is shared
/// across documents.
pub struct EditingSession {
    id: SessionId,
    config: SessionConfig,
    registry: Arc<Mutex<LocalAssetRegistry>>,
    committer: CommitOrchestrator,
    known: Mutex<BTreeMap<RemoteId, CommittedAssetRecord>>,
    deletions: Mutex<DeletionQueue>,
    gateway: Arc<dyn AssetGateway>,
    notifier: Arc<dyn Notifier>,
    releaser: Arc<dyn PreviewReleaser>,
}

impl EditingSession {
    pub(crate) fn new(
        config: SessionConfig,
        gateway: Arc<dyn AssetGateway>,
        known: Vec<CommittedAssetRecord>,
        notifier: Arc<dyn Notifier>,
        releaser: Arc<dyn PreviewReleaser>,
        clock: Arc<dyn Clock>,
        id_gen: Arc<dyn HandleGenerator>,
    ) -> Self {
        let id = id_gen.generate_session_id();
        let registry = Arc::new(Mutex::new(LocalAssetRegistry::new(
            id,
            config.handle_prefix.clone(),
            id_gen,
            clock,
        )));
        let committer = CommitOrchestrator::new(
            registry.clone(),
            gateway.clone(),
            config.max_concurrent_uploads,
        );
        let known = known
            .into_iter()
            .map(|record| (record.remote_id.clone(), record))
            .collect();
        Self {
            id,
            config,
            registry,
            committer,
            known: Mutex::new(known),
            deletions: Mutex::new(DeletionQueue::new()),
            gateway,
            notifier,
            releaser,
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Track an inserted file and return the handle to embed in the content.
    ///
    /// Only fails once the session has been closed.
    pub fn register(&self, file: FileData) -> Result<LocalHandle, RegistryError> {
        let mut registry = self.registry.lock();
        if registry.is_closed() {
            return Err(RegistryError::SessionClosed);
        }
        Ok(registry.register(file))
    }

    pub fn asset_status(&self, handle: &LocalHandle) -> Option<AssetStatus> {
        self.registry.lock().get(handle).map(|a| a.status)
    }

    pub fn counts(&self) -> RegistryCounts {
        self.registry.lock().counts()
    }

    pub fn is_closed(&self) -> bool {
        self.registry.lock().is_closed()
    }

    /// Records the document store should persist next to the saved content.
    pub fn committed_records(&self) -> Vec<CommittedAssetRecord> {
        self.known.lock().values().cloned().collect()
    }

    pub fn pending_deletions(&self) -> Vec<RemoteId> {
        self.deletions.lock().snapshot()
    }

    /// Upload every pending asset and report the outcome.
    ///
    /// Newly committed assets join the known records; failed file names go to
    /// the notifier.
    pub async fn commit_all(&self, owner_id: &str) -> CommitReport {
        let report = self.committer.commit_all(owner_id).await;
        self.after_commit(&report);
        report
    }

    async fn commit_for_save(&self, content: &str, owner_id: &str) -> CommitReport {
        let report = if self.config.upload_unreferenced {
            self.committer.commit_all(owner_id).await
        } else {
            self.committer
                .commit_where(owner_id, |handle| contains_exact(content, handle.as_str()))
                .await
        };
        self.after_commit(&report);
        report
    }

    fn after_commit(&self, report: &CommitReport) {
        {
            let mut known = self.known.lock();
            for record in &report.committed {
                known
                    .entry(record.remote_id.clone())
                    .or_insert_with(|| record.clone());
            }
        }
        if !report.failed.is_empty() {
            self.notifier.upload_failures(&report.failed_file_names());
        }
    }

    /// Schedule a known record for deletion outside orphan detection.
    ///
    /// Returns `false` when the id is not a record of this document.
    pub fn discard_committed(&self, remote_id: &RemoteId) -> bool {
        let Some(record) = self.known.lock().remove(remote_id) else {
            return false;
        };
        self.deletions.lock().enqueue(record.remote_id);
        true
    }

    /// Attempt deletion of everything queued. Failures go to the notifier.
    pub async fn flush_deletions(&self) -> FlushReport {
        let batch = self.deletions.lock().snapshot();
        let report = delete_all(
            batch,
            self.gateway.as_ref(),
            self.config.max_concurrent_deletions,
        )
        .await;
        self.deletions.lock().settle(&report);

        let failed = report.failed();
        if !failed.is_empty() {
            self.notifier.deletion_failures(&failed);
        }
        report
    }

    /// Commit, rewrite, clean up, release. Always returns the content to persist.
    pub async fn finalize_save(&self, content: &str, owner_id: &str) -> SaveReport {
        let span = info_span!("finalize_save", session = %self.id, owner = owner_id);
        self.finalize_save_inner(content, owner_id)
            .instrument(span)
            .await
    }

    async fn finalize_save_inner(&self, content: &str, owner_id: &str) -> SaveReport {
        let guard = ReleaseGuard::new(&self.registry, self.releaser.as_ref());
        info!(bytes = content.len(), "save pass started");

        let commit = self.commit_for_save(content, owner_id).await;
        let rewritten = rewrite(content, &commit.uploaded);

        if self.is_closed() {
            // The document instance is gone; its content will not be persisted,
            // so deleting remote assets would break the last persisted version.
            warn!("session closed during save, skipping orphan cleanup");
            let released = guard.release();
            return SaveReport {
                content: rewritten,
                failed_uploads: commit.failed_file_names(),
                released,
                ..SaveReport::default()
            };
        }

        let orphans = {
            let mut known = self.known.lock();
            let orphans = find_orphans(&rewritten, known.values());
            for remote_id in &orphans {
                known.remove(remote_id);
            }
            orphans
        };
        {
            let mut deletions = self.deletions.lock();
            for remote_id in &orphans {
                deletions.enqueue(remote_id.clone());
            }
        }
        let flush = self.flush_deletions().await;

        let released = guard.release();
        info!(
            committed = commit.uploaded.len(),
            failed_uploads = commit.failed.len(),
            orphans = orphans.len(),
            released,
            "save pass finished"
        );

        SaveReport {
            content: rewritten,
            failed_uploads: commit.failed_file_names(),
            orphans: orphans.into_iter().collect(),
            failed_deletions: flush.failed(),
            released,
        }
    }

    /// Tear the session down: later upload completions become no-ops and
    /// every local asset is released.
    pub fn close(&self) {
        let mut registry = self.registry.lock();
        registry.close();
        let released = registry.release_all(self.releaser.as_ref());
        info!(session = %self.id, released, "editing session closed");
    }
}
