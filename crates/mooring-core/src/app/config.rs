//! SessionConfig - 編集セッションの設定
//!
//! TOML から読み込めます。すべてのフィールドに既定値があるので、
//! 空の TOML でも有効な設定になります。
//!
//! ```toml
//! max_concurrent_uploads = 4
//! max_concurrent_deletions = 4
//! handle_prefix = "blob:mooring/"
//! upload_unreferenced = false
//! ```

use serde::Deserialize;

/// ConfigError は設定の読み込み・検証エラー
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("{field} must be greater than zero")]
    Zero { field: &'static str },

    #[error("handle_prefix must not be empty")]
    EmptyHandlePrefix,
}

/// Tuning for one editing session.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SessionConfig {
    /// Upper bound of `upload` calls in flight during one commit pass.
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent_uploads: usize,

    /// Upper bound of `delete` calls in flight during one flush.
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent_deletions: usize,

    /// Prefix of generated local handles.
    #[serde(default = "default_handle_prefix")]
    pub handle_prefix: String,

    /// When `false`, a save pass does not upload idle assets whose handle is
    /// absent from the content being saved; they are only released.
    #[serde(default = "default_upload_unreferenced")]
    pub upload_unreferenced: bool,
}

fn default_max_concurrent() -> usize {
    8
}

fn default_handle_prefix() -> String {
    "blob:mooring/".to_string()
}

fn default_upload_unreferenced() -> bool {
    true
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_concurrent_uploads: default_max_concurrent(),
            max_concurrent_deletions: default_max_concurrent(),
            handle_prefix: default_handle_prefix(),
            upload_unreferenced: default_upload_unreferenced(),
        }
    }
}

impl SessionConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: SessionConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_concurrent_uploads == 0 {
            return Err(ConfigError::Zero {
                field: "max_concurrent_uploads",
            });
        }
        if self.max_concurrent_deletions == 0 {
            return Err(ConfigError::Zero {
                field: "max_concurrent_deletions",
            });
        }
        if self.handle_prefix.is_empty() {
            return Err(ConfigError::EmptyHandlePrefix);
        }
        Ok(())
    }
}
