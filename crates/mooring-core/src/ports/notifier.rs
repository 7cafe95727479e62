//! Notifier port - 通知レイヤー（UI のトーストやログ集約など）
//!
//! - upload 失敗: 著者に見せる警告（ファイル名）
//! - delete 失敗: 記録用のみ（著者には見せない）

use crate::domain::RemoteId;

/// Notifier は保存パスの結果を外部へ伝える
pub trait Notifier: Send + Sync {
    /// commit pass 完了時に、upload に失敗したファイル名を受け取る
    fn upload_failures(&self, file_names: &[String]);

    /// flush 完了時に、削除に失敗した remote id を受け取る
    fn deletion_failures(&self, remote_ids: &[RemoteId]);
}

/// 何もしない Notifier
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopNotifier;

impl Notifier for NoopNotifier {
    fn upload_failures(&self, _file_names: &[String]) {}

    fn deletion_failures(&self, _remote_ids: &[RemoteId]) {}
}
