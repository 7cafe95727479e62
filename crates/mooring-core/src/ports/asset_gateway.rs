//! AssetGateway port - リモートの資産ストア（S3 / CDN / 独自 API など）
//!
//! コアが必要とするのは upload と delete の 2 操作だけです。
//! リトライ・認証・レート制限は実装側の関心事です。

use async_trait::async_trait;

use crate::domain::{CommittedAssetRecord, FileData, GatewayError, RemoteId};

/// AssetGateway はファイルを永続化し、不要になったものを削除する
///
/// # 設計原則
/// - `upload` は成功すると `{remote_id, remote_url}` を返す
/// - 失敗は `GatewayError` として返し、panic しない
/// - 同じ Gateway が複数の upload を並行に受け付けられること（`&self`）
#[async_trait]
pub trait AssetGateway: Send + Sync {
    /// `owner_id`（ドキュメントなど）に紐づけてファイルを保存
    async fn upload(
        &self,
        file: &FileData,
        owner_id: &str,
    ) -> Result<CommittedAssetRecord, GatewayError>;

    /// リモートの資産を削除
    async fn delete(&self, remote_id: &RemoteId) -> Result<(), GatewayError>;
}
