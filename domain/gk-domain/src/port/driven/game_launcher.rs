//! タイトル起動ポート
//!
//! 起動コマンド文字列の組み立てまでがコアの仕事で、実際のプロセス生成は
//! この駆動ポートの実装（ホスト側）に委ねる。

use crate::error::DomainError;

/// タイトル起動ポート
pub trait GameLauncher {
    /// アクティベーションID（AUMID）を指定してタイトルを起動する
    fn launch_aumid(&self, aumid: &str) -> Result<(), DomainError>;
}
