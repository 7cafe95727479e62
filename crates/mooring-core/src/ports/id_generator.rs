//! HandleGenerator port - ID / handle 生成の抽象化
//!
//! テスト容易性のために trait として抽象化しています。
//!
//! # 実装
//! - **UlidGenerator**: ULID ベース（本番用）

use crate::domain::ids::{LocalHandle, SessionId};
use crate::ports::Clock;
use ulid::Ulid;

/// HandleGenerator はセッション ID とローカル handle を生成
///
/// # 要件
/// - 生成した handle は登録ごとに一意
/// - handle はドキュメント本文にそのまま埋め込まれる（エスケープ不要な文字のみ）
pub trait HandleGenerator: Send + Sync {
    fn generate_session_id(&self) -> SessionId;

    /// `prefix` の後ろに一意な部分をつけた handle を生成
    fn generate_handle(&self, prefix: &str) -> LocalHandle;
}

/// UlidGenerator は ULID ベースの生成器
///
/// Clock を使って timestamp 部分を作るので、FixedClock を渡せば
/// timestamp 部分が決定的になります（ランダム部分は異なる）。
pub struct UlidGenerator<C> {
    clock: C,
}

impl<C: Clock> UlidGenerator<C> {
    pub fn new(clock: C) -> Self {
        Self { clock }
    }

    fn next_ulid(&self) -> Ulid {
        let timestamp_ms = self.clock.now().timestamp_millis() as u64;
        Ulid::from_parts(timestamp_ms, rand::random())
    }
}

impl<C: Clock> HandleGenerator for UlidGenerator<C> {
    fn generate_session_id(&self) -> SessionId {
        SessionId::from(self.next_ulid())
    }

    fn generate_handle(&self, prefix: &str) -> LocalHandle {
        // ULID は Crockford base32（英数字のみ）なので本文中でも境界が明確
        LocalHandle::new(format!("{prefix}{}", self.next_ulid()))
    }
}
