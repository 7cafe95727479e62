//! InMemoryAssetGateway - 開発用・テスト用のリモート資産ストア
//!
//! # 機能
//! - upload されたファイルを HashMap に保持し、連番の remote id と URL を払い出す
//! - ファイル名 / remote id 単位で失敗を注入できる
//! - upload / delete の呼び出しを記録する（テストでの検証用）
//! - 任意の遅延を入れて並行実行を再現できる

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;

use crate::domain::{CommittedAssetRecord, FileData, GatewayError, RemoteId, RemoteUrl};
use crate::ports::AssetGateway;

/// An asset held by the in-memory store.
#[derive(Debug, Clone)]
pub struct StoredAsset {
    pub owner_id: String,
    pub file_name: String,
    pub bytes: Bytes,
}

/// In-memory implementation of [`AssetGateway`].
///
/// Deleting an id the store does not hold succeeds, like most object stores.
pub struct InMemoryAssetGateway {
    base_url: String,
    stored: Mutex<HashMap<RemoteId, StoredAsset>>,
    upload_calls: Mutex<Vec<String>>,
    delete_calls: Mutex<Vec<RemoteId>>,
    fail_uploads: HashSet<String>,
    fail_deletes: HashSet<RemoteId>,
    delay: Option<Duration>,
    next_id: AtomicU64,
}

impl InMemoryAssetGateway {
    pub fn new() -> Self {
        Self {
            base_url: "https://assets.example".to_string(),
            stored: Mutex::new(HashMap::new()),
            upload_calls: Mutex::new(Vec::new()),
            delete_calls: Mutex::new(Vec::new()),
            fail_uploads: HashSet::new(),
            fail_deletes: HashSet::new(),
            delay: None,
            next_id: AtomicU64::new(1),
        }
    }

    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Reject every upload of a file with this name.
    #[must_use]
    pub fn fail_upload_of(mut self, file_name: impl Into<String>) -> Self {
        self.fail_uploads.insert(file_name.into());
        self
    }

    /// Reject every deletion of this remote id.
    #[must_use]
    pub fn fail_delete_of(mut self, remote_id: impl Into<RemoteId>) -> Self {
        self.fail_deletes.insert(remote_id.into());
        self
    }

    /// Sleep before answering each call.
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// File names passed to `upload`, in call order.
    pub fn upload_calls(&self) -> Vec<String> {
        self.upload_calls.lock().clone()
    }

    /// Remote ids passed to `delete`, in call order.
    pub fn delete_calls(&self) -> Vec<RemoteId> {
        self.delete_calls.lock().clone()
    }

    pub fn get(&self, remote_id: &RemoteId) -> Option<StoredAsset> {
        self.stored.lock().get(remote_id).cloned()
    }

    pub fn stored_ids(&self) -> Vec<RemoteId> {
        let mut ids: Vec<RemoteId> = self.stored.lock().keys().cloned().collect();
        ids.sort();
        ids
    }

    async fn pause(&self) {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
    }
}

impl Default for InMemoryAssetGateway {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AssetGateway for InMemoryAssetGateway {
    async fn upload(
        &self,
        file: &FileData,
        owner_id: &str,
    ) -> Result<CommittedAssetRecord, GatewayError> {
        self.upload_calls.lock().push(file.name.clone());
        self.pause().await;

        if self.fail_uploads.contains(&file.name) {
            return Err(GatewayError::Rejected(format!(
                "upload of '{}' refused",
                file.name
            )));
        }

        let n = self.next_id.fetch_add(1, Ordering::SeqCst);
        let remote_id = RemoteId::new(format!("asset-{n}"));
        let remote_url = RemoteUrl::new(format!("{}/{owner_id}/{remote_id}", self.base_url));
        self.stored.lock().insert(
            remote_id.clone(),
            StoredAsset {
                owner_id: owner_id.to_string(),
                file_name: file.name.clone(),
                bytes: file.bytes.clone(),
            },
        );
        Ok(CommittedAssetRecord {
            remote_id,
            remote_url,
        })
    }

    async fn delete(&self, remote_id: &RemoteId) -> Result<(), GatewayError> {
        self.delete_calls.lock().push(remote_id.clone());
        self.pause().await;

        if self.fail_deletes.contains(remote_id) {
            return Err(GatewayError::Unavailable(format!(
                "delete of '{remote_id}' timed out"
            )));
        }
        self.stored.lock().remove(remote_id);
        Ok(())
    }
}
