//! Domain identifiers (strongly-typed IDs).
//!
//! # 2 種類の ID
//! - **ULID ベース**: `Id<T>`（Phantom type パターン）。このクレートが自分で払い出す ID。
//!   現状は編集セッションの ID（`SessionId`）のみ。
//! - **文字列ベース**: `LocalHandle` / `RemoteId` / `RemoteUrl`。
//!   ドキュメント本文に埋め込まれたり、外部ストアが払い出したりする不透明な文字列。
//!
//! どちらも型で区別しておくことで、`RemoteId` と `RemoteUrl` の取り違えを
//! コンパイル時に防ぎます。

use serde::{Deserialize, Serialize};
use std::fmt;
use std::marker::PhantomData;
use ulid::Ulid;

/// IdMarker は各 ID 型のマーカー trait
///
/// Display で使うプレフィックス（"session-" など）を提供します。
pub trait IdMarker: Send + Sync + 'static {
    fn prefix() -> &'static str;
}

/// ジェネリック ID 型
///
/// `T` は PhantomData で、実行時にはメモリを消費しません。
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Id<T: IdMarker> {
    ulid: Ulid,
    #[serde(skip)]
    _marker: PhantomData<T>,
}

impl<T: IdMarker> Id<T> {
    /// ULID から Id を作成
    pub fn from_ulid(ulid: Ulid) -> Self {
        Self {
            ulid,
            _marker: PhantomData,
        }
    }

    /// 内部の ULID を取得
    pub fn as_ulid(&self) -> Ulid {
        self.ulid
    }
}

impl<T: IdMarker> From<Ulid> for Id<T> {
    fn from(ulid: Ulid) -> Self {
        Self::from_ulid(ulid)
    }
}

impl<T: IdMarker> fmt::Display for Id<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", T::prefix(), self.ulid)
    }
}

/// Session のマーカー型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Session {}

impl IdMarker for Session {
    fn prefix() -> &'static str {
        "session-"
    }
}

/// Identifier of one editing session (the owner of a registry and a deletion queue).
pub type SessionId = Id<Session>;

// ========================================
// 文字列ベースの ID
// ========================================

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }
    };
}

string_id! {
    /// Placeholder reference for a not-yet-durable file, embedded verbatim in document content.
    LocalHandle
}

string_id! {
    /// Identifier of an asset at the remote store (used for deletion).
    RemoteId
}

string_id! {
    /// Durable URL of an asset at the remote store (used in document content).
    RemoteUrl
}
