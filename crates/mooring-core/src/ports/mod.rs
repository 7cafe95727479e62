//! Ports - 抽象化レイヤー
//!
//! このモジュールは Hexagonal Architecture の「ポート」を定義します。
//! 各 trait は外部の協調者（リモート資産ストア、通知 UI、プレビュー描画環境）への
//! インターフェースを提供し、実装の詳細を隠蔽します。

pub mod asset_gateway;
pub mod clock;
pub mod id_generator;
pub mod notifier;
pub mod preview;

pub use self::asset_gateway::AssetGateway;
pub use self::clock::{Clock, FixedClock, SystemClock};
pub use self::id_generator::{HandleGenerator, UlidGenerator};
pub use self::notifier::{NoopNotifier, Notifier};
pub use self::preview::{NoopReleaser, PreviewReleaser};
