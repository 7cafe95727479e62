//! mooring-core
//!
//! 本文に埋め込まれた「まだ保存していないメディア」を、保存時にリモートの資産ストアと
//! 突き合わせるためのコア。
//!
//! # モジュール構成
//! - **domain**: ドメインモデル（ids, file, state, asset, record, report, errors）
//! - **ports**: 抽象化レイヤー（AssetGateway, Notifier, PreviewReleaser, Clock, HandleGenerator）
//! - **registry**: Local Asset Registry（handle をキーにした arena）
//! - **app**: アプリケーションロジック（builder, session, commit, rewrite, orphans, deletion）
//! - **impls**: 実装（InMemoryAssetGateway など開発用）

pub mod app;
pub mod domain;
pub mod impls;
pub mod ports;
pub mod registry;

pub use app::{EditingSession, SessionBuilder, SessionConfig};
pub use domain::{FileData, LocalHandle, SaveReport};
