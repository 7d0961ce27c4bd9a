//! ディスカバリ用ユースケースポート
//!
//! ホストのプラグインフレームワークが「ゲームストア」プロバイダとして
//! 呼び出す面。ストアが利用不能な場合、全クエリはストアに触れず
//! 空／not-found へ短絡する。

use crate::error::DomainError;
use crate::model::GameEntry;
use std::collections::BTreeMap;

/// ディスカバリ用ユースケース
pub trait DiscoveryUseCase {
    /// ベンダーストアのプラットフォーム機能が利用可能か。
    /// 判定はセッション中1回だけ行われ、不可ならセッション内で恒久。
    fn is_store_installed(&mut self) -> bool;

    /// レジストリ経路で解決した全タイトル。
    /// セッション内でメモ化され、`reload_games` まで再列挙しない。
    fn all_games(&mut self) -> Result<&[GameEntry], DomainError>;

    /// appId（複数指定可、最初の一致を返す）で検索。
    /// 空の指定は `InvalidArgument`、一致なしは `EntryNotFound`。
    fn find_by_app_id(&mut self, app_ids: &[String]) -> Result<GameEntry, DomainError>;

    /// 表示名の正規表現パターンで検索。
    /// 不正なパターンは `InvalidArgument`、一致なしは `EntryNotFound`。
    fn find_by_name(&mut self, pattern: &str) -> Result<GameEntry, DomainError>;

    /// ボリューム経路: タイトル識別名 → インストールパスのマップ。
    fn find_installed_games(&mut self) -> Result<BTreeMap<String, String>, DomainError>;

    /// キャッシュを破棄し、次回クエリで再列挙させる。
    /// 利用可否の判定はやり直さない。
    fn reload_games(&mut self);

    /// タイトルを起動する。識別子なしは `InvalidArgument`。
    fn launch(&mut self, app_id: Option<&str>) -> Result<(), DomainError>;
}
