//! PreviewReleaser port - ローカルのプレビュー資源の解放
//!
//! 編集画面がプレビュー用に確保した資源（object URL、一時ファイル、
//! テクスチャなど）を handle 単位で解放します。

use crate::domain::{LocalHandle, ReleaseError};

/// PreviewReleaser は handle に紐づくローカル資源を解放する
///
/// 失敗しても registry の後片付けは続行されます（ログに残るだけ）。
pub trait PreviewReleaser: Send + Sync {
    fn release(&self, handle: &LocalHandle) -> Result<(), ReleaseError>;
}

/// 解放すべき外部資源がない環境用
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopReleaser;

impl PreviewReleaser for NoopReleaser {
    fn release(&self, _handle: &LocalHandle) -> Result<(), ReleaseError> {
        Ok(())
    }
}
