//! CommitOrchestrator - 未保存の資産をまとめてアップロードする
//!
//! # フロー
//! 1. registry をロックし、対象の handle を Uploading にして payload を取り出す
//! 2. ロックを外して upload を並行に発行（Semaphore で同時数を制限）
//! 3. 各 upload の完了ごとに registry をロックし、生存確認してから結果を反映
//! 4. 全件の完了を待って（join）、Committed の handle -> URL 対応を返す
//!
//! # 学習ポイント
//! - ロックを await を跨いで保持しない（lease と同じ考え方）
//! - 1 件の失敗が他の upload を止めない（fan-out / fan-in）
//! - セッション破棄後に届いた完了は何もしない（liveness check）

use std::sync::Arc;

use futures::future::join_all;
use parking_lot::Mutex;
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

use crate::domain::{
    CommitReport, CommittedAssetRecord, FailedUpload, FileData, GatewayError, LocalHandle,
    SessionId,
};
use crate::ports::AssetGateway;
use crate::registry::LocalAssetRegistry;

/// What happened to one upload once it finished.
enum Completion {
    Committed(CommittedAssetRecord),
    Failed(FailedUpload),
    Discarded,
}

/// Drives concurrent upload of pending local assets.
pub struct CommitOrchestrator {
    registry: Arc<Mutex<LocalAssetRegistry>>,
    gateway: Arc<dyn AssetGateway>,
    max_concurrent: usize,
}

impl CommitOrchestrator {
    pub fn new(
        registry: Arc<Mutex<LocalAssetRegistry>>,
        gateway: Arc<dyn AssetGateway>,
        max_concurrent: usize,
    ) -> Self {
        Self {
            registry,
            gateway,
            max_concurrent: max_concurrent.max(1),
        }
    }

    /// Upload every Idle (or previously Failed) asset.
    ///
    /// Already committed assets are returned from the cached URL without
    /// calling the gateway again.
    pub async fn commit_all(&self, owner_id: &str) -> CommitReport {
        self.commit_where(owner_id, |_| true).await
    }

    /// Same as [`commit_all`](Self::commit_all), restricted to handles for
    /// which `include` returns true. Excluded assets keep their status.
    pub async fn commit_where<F>(&self, owner_id: &str, include: F) -> CommitReport
    where
        F: Fn(&LocalHandle) -> bool,
    {
        let (session, batch) = {
            let mut registry = self.registry.lock();
            if registry.is_closed() {
                return CommitReport::default();
            }
            let mut batch: Vec<(LocalHandle, FileData)> = Vec::new();
            for handle in registry.uploadable_handles() {
                if !include(&handle) {
                    continue;
                }
                match registry.mark_uploading(&handle) {
                    Ok(file) => batch.push((handle, file)),
                    Err(e) => warn!(handle = %handle, error = %e, "skipping asset"),
                }
            }
            (registry.session(), batch)
        };

        if !batch.is_empty() {
            info!(session = %session, owner = owner_id, assets = batch.len(), "commit pass started");
        }

        let semaphore = Semaphore::new(self.max_concurrent);
        let completions = join_all(batch.into_iter().map(|(handle, file)| {
            let semaphore = &semaphore;
            async move {
                let result = {
                    let _permit = semaphore.acquire().await.ok();
                    self.gateway.upload(&file, owner_id).await
                };
                self.complete(session, handle, &file, result)
            }
        }))
        .await;

        let mut committed = Vec::new();
        let mut failed = Vec::new();
        for completion in completions {
            match completion {
                Completion::Committed(record) => committed.push(record),
                Completion::Failed(f) => failed.push(f),
                Completion::Discarded => {}
            }
        }

        let uploaded = self.registry.lock().committed_mapping();
        if !committed.is_empty() || !failed.is_empty() {
            info!(
                session = %session,
                committed = committed.len(),
                failed = failed.len(),
                "commit pass finished"
            );
        }
        CommitReport {
            uploaded,
            committed,
            failed,
        }
    }

    /// Apply one finished upload to the registry, if it is still live.
    fn complete(
        &self,
        session: SessionId,
        handle: LocalHandle,
        file: &FileData,
        result: Result<CommittedAssetRecord, GatewayError>,
    ) -> Completion {
        let mut registry = self.registry.lock();
        if !registry.is_live(session) {
            match &result {
                Ok(record) => warn!(
                    handle = %handle,
                    remote_id = %record.remote_id,
                    "upload finished after session teardown, discarding"
                ),
                Err(e) => debug!(handle = %handle, error = %e, "upload failed after session teardown"),
            }
            return Completion::Discarded;
        }

        match result {
            Ok(record) => match registry.mark_committed(&handle, record.clone()) {
                Ok(_) => Completion::Committed(record),
                Err(e) => {
                    warn!(handle = %handle, error = %e, "could not record committed upload");
                    Completion::Discarded
                }
            },
            Err(e) => {
                warn!(handle = %handle, file = %file.name, error = %e, "upload failed");
                let reason = e.to_string();
                if let Err(err) = registry.mark_failed(&handle, reason.clone()) {
                    warn!(handle = %handle, error = %err, "could not record failed upload");
                }
                Completion::Failed(FailedUpload {
                    handle,
                    file_name: file.name.clone(),
                    reason,
                })
            }
        }
    }
}
