//! Errors - エラー型と分類
//!
//! # 分類
//! - **RegistryError**: プログラマのミス（未知の handle、不正な状態遷移、閉じたセッション）
//! - **GatewayError**: リモートストアの失敗（upload / delete ごとに局所的に回復）
//! - **ReleaseError**: ローカルのプレビュー資源の解放失敗（ログのみ）
//!
//! どのエラーも保存パス全体を失敗させません。資産単位の失敗は report に載るだけです。

use super::ids::LocalHandle;
use super::state::AssetStatus;

/// RegistryError は Local Asset Registry の不変条件違反
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("unknown local handle '{0}'")]
    UnknownHandle(LocalHandle),

    #[error("invalid transition for '{handle}': {from} -> {to}")]
    InvalidTransition {
        handle: LocalHandle,
        from: AssetStatus,
        to: AssetStatus,
    },

    #[error("editing session is closed")]
    SessionClosed,
}

/// GatewayError は Remote Asset Gateway が返すエラー
///
/// コアはどの variant も「その資産だけの失敗」として扱います。
/// リトライや認証は Gateway 側の関心事です。
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GatewayError {
    #[error("remote store rejected the request: {0}")]
    Rejected(String),

    #[error("remote store unavailable: {0}")]
    Unavailable(String),
}

/// ReleaseError はプレビュー資源の解放失敗
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("failed to release preview for '{handle}': {reason}")]
pub struct ReleaseError {
    pub handle: LocalHandle,
    pub reason: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_transition_message_names_states() {
        let err = RegistryError::InvalidTransition {
            handle: LocalHandle::from("h1"),
            from: AssetStatus::Committed,
            to: AssetStatus::Uploading,
        };
        assert_eq!(
            err.to_string(),
            "invalid transition for 'h1': committed -> uploading"
        );
    }
}
