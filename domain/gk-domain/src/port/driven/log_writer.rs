//! ログライターポート

use crate::error::DomainError;

/// ログレベル
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Debug,
    Info,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Debug => "DEBUG",
            Self::Info => "INFO",
            Self::Error => "ERROR",
        }
    }
}

/// ディスカバリ診断レコード
#[derive(Debug, Clone)]
pub struct DiscoveryLogRecord {
    /// レベル
    pub level: LogLevel,
    /// 出力元コンポーネント（marker/walker/resolver/enumerator など）
    pub component: String,
    /// メッセージ
    pub message: String,
}

impl DiscoveryLogRecord {
    pub fn new(level: LogLevel, component: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            level,
            component: component.into(),
            message: message.into(),
        }
    }
}

/// ログライターポート。
/// ログ失敗がディスカバリを落とすことはない（呼び出し側は結果を無視してよい）。
pub trait LogWriter {
    fn write_discovery_log(&self, record: &DiscoveryLogRecord) -> Result<(), DomainError>;
}
