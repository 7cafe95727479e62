//! Impls - 実装（開発用・テスト用）
//!
//! このモジュールには ports の実装を含めます。
//!
//! # 含まれる実装
//! - **InMemoryAssetGateway**: 開発用のリモート資産ストア（失敗注入つき）
//!
//! 本番用の Gateway（S3、CDN の API など）は別クレートに配置します。

pub mod inmem_gateway;

pub use self::inmem_gateway::{InMemoryAssetGateway, StoredAsset};
