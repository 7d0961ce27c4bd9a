//! ドメインエラー型
//!
//! 標準ライブラリのみ使用（外部エラーハンドリングクレートなし）

use std::fmt;

/// ドメイン層のエラー型
/// 各バリアントは特定の失敗シナリオを表現
///
/// 「期待される不在」（マーカーファイルなし、キー／値なし）はエラーではなく
/// `Option::None` で表現する。ここに現れるのは真の失敗だけ。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// ストアまたはファイルシステムへのアクセス拒否
    AccessDenied(String),

    /// マーカーファイルの破損（奇数バイト長、ユニット不足など）
    DecodeError { path: String, reason: String },

    /// 列挙は成功したが該当エントリが存在しない
    EntryNotFound { store: String, query: String },

    /// 呼び出し側の引数が不正
    InvalidArgument(String),

    /// プラットフォーム機能が存在しない（セッション内で恒久）
    StoreUnavailable,

    /// 設定ファイルの読み込み失敗
    ConfigLoadFailed(String),

    /// ファイルI/Oエラー
    IoError(String),

    /// タイトル起動失敗
    LaunchFailed(String),

    /// 不明なエラー
    Unknown(String),
}

impl fmt::Display for DomainError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AccessDenied(msg) => {
                write!(f, "Access denied: {}", msg)
            }
            Self::DecodeError { path, reason } => {
                write!(f, "Failed to decode marker {}: {}", path, reason)
            }
            Self::EntryNotFound { store, query } => {
                write!(f, "No entry in store {} matching {}", store, query)
            }
            Self::InvalidArgument(msg) => {
                write!(f, "Invalid argument: {}", msg)
            }
            Self::StoreUnavailable => {
                write!(f, "Store is not installed on this system")
            }
            Self::ConfigLoadFailed(msg) => {
                write!(f, "Configuration load failed: {}", msg)
            }
            Self::IoError(msg) => {
                write!(f, "IO error: {}", msg)
            }
            Self::LaunchFailed(msg) => {
                write!(f, "Launch failed: {}", msg)
            }
            Self::Unknown(msg) => {
                write!(f, "Unknown error: {}", msg)
            }
        }
    }
}

impl std::error::Error for DomainError {}
