//! App - アプリケーション層
//!
//! このモジュールは、registry と ports を組み合わせて保存時の後始末を実装します。
//!
//! # 主要コンポーネント
//! - **SessionBuilder**: セッションの構築とワイヤリング
//! - **EditingSession**: 外部向けの窓口（register / finalize_save）
//! - **CommitOrchestrator**: 未保存資産の並行アップロード
//! - **rewrite**: 本文中の handle を URL に置換
//! - **find_orphans**: 本文から消えた既知の資産の検出
//! - **DeletionQueue**: best-effort の削除キュー

pub mod builder;
pub mod commit;
pub mod config;
pub mod deletion;
pub mod orphans;
pub mod rewrite;
pub mod session;

pub use self::builder::SessionBuilder;
pub use self::commit::CommitOrchestrator;
pub use self::config::{ConfigError, SessionConfig};
pub use self::deletion::DeletionQueue;
pub use self::orphans::find_orphans;
pub use self::rewrite::rewrite;
pub use self::session::EditingSession;
