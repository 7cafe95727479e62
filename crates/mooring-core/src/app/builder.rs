//! SessionBuilder - 編集セッションの構築とワイヤリング
//!
//! # Fail-fast 設計
//! - build() 時に SessionConfig を検証し、不正なら ConfigError を返す
//! - 省略された port には開発向けの既定実装を使う

use std::sync::Arc;

use crate::app::config::{ConfigError, SessionConfig};
use crate::app::session::EditingSession;
use crate::domain::CommittedAssetRecord;
use crate::ports::{
    AssetGateway, Clock, HandleGenerator, NoopNotifier, NoopReleaser, Notifier, PreviewReleaser,
    SystemClock, UlidGenerator,
};

/// SessionBuilder は EditingSession を構築
///
/// # 使用例
/// ```ignore
/// let session = SessionBuilder::new(gateway)
///     .config(config)
///     .known_records(saved_records)
///     .notifier(toast)
///     .build()?;
/// ```
pub struct SessionBuilder {
    gateway: Arc<dyn AssetGateway>,
    config: SessionConfig,
    known: Vec<CommittedAssetRecord>,
    notifier: Arc<dyn Notifier>,
    releaser: Arc<dyn PreviewReleaser>,
    clock: Arc<dyn Clock>,
    id_gen: Option<Arc<dyn HandleGenerator>>,
}

impl SessionBuilder {
    pub fn new(gateway: Arc<dyn AssetGateway>) -> Self {
        Self {
            gateway,
            config: SessionConfig::default(),
            known: Vec::new(),
            notifier: Arc::new(NoopNotifier),
            releaser: Arc::new(NoopReleaser),
            clock: Arc::new(SystemClock),
            id_gen: None,
        }
    }

    pub fn config(mut self, config: SessionConfig) -> Self {
        self.config = config;
        self
    }

    /// Records persisted with the document when it was last saved.
    pub fn known_records(mut self, records: impl IntoIterator<Item = CommittedAssetRecord>) -> Self {
        self.known.extend(records);
        self
    }

    pub fn notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn releaser(mut self, releaser: Arc<dyn PreviewReleaser>) -> Self {
        self.releaser = releaser;
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn id_generator(mut self, id_gen: Arc<dyn HandleGenerator>) -> Self {
        self.id_gen = Some(id_gen);
        self
    }

    pub fn build(self) -> Result<EditingSession, ConfigError> {
        self.config.validate()?;
        let id_gen = match self.id_gen {
            Some(id_gen) => id_gen,
            None => Arc::new(UlidGenerator::new(SystemClock)),
        };
        Ok(EditingSession::new(
            self.config,
            self.gateway,
            self.known,
            self.notifier,
            self.releaser,
            self.clock,
            id_gen,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::impls::InMemoryAssetGateway;

    #[test]
    fn build_with_defaults() {
        let session = SessionBuilder::new(Arc::new(InMemoryAssetGateway::new())).build();
        assert!(session.is_ok());
    }

    #[test]
    fn build_rejects_invalid_config() {
        let config = SessionConfig {
            max_concurrent_uploads: 0,
            ..SessionConfig::default()
        };
        let session = SessionBuilder::new(Arc::new(InMemoryAssetGateway::new()))
            .config(config)
            .build();
        assert!(matches!(
            session,
            Err(ConfigError::Zero {
                field: "max_concurrent_uploads"
            })
        ));
    }

    #[test]
    fn known_records_are_carried_into_session() {
        let session = SessionBuilder::new(Arc::new(InMemoryAssetGateway::new()))
            .known_records(vec![CommittedAssetRecord::new("r1", "u1")])
            .build()
            .unwrap();
        assert_eq!(
            session.committed_records(),
            vec![CommittedAssetRecord::new("r1", "u1")]
        );
    }
}
