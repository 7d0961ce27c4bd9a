//! ボリューム／マニフェストアクセスポート

use crate::error::DomainError;
use std::path::{Path, PathBuf};

/// マニフェスト探索の再帰指定。
/// インストールルートは浅いため `No`（直下のみ）で十分だが、
/// 入れ子レイアウトに備えて `Yes` もサポートする。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recurse {
    Yes,
    No,
}

/// ボリューム列挙・マーカー読み取り・マニフェスト探索のポート。
pub trait VolumeSource {
    /// ローカルボリュームのルート一覧（`C:\` 形式）。
    fn list_volume_roots(&self) -> Result<Vec<String>, DomainError>;

    /// ボリュームルート直下のマーカーファイルのバイト列。
    /// ファイルなし・通常ファイル以外・読み取り失敗（準備できていない
    /// ボリュームを含む）はすべて期待される不在として `None`。
    fn read_marker(&self, volume_root: &str) -> Option<Vec<u8>>;

    /// ルート以下で固定マニフェスト名に一致するパスを集める。
    /// 隠しエントリ・シンボリックリンク・到達不能なサブツリーはスキップし、
    /// 到達できたものだけを返す（1サブツリーの失敗で全体を落とさない）。
    fn locate_manifests(&self, root: &str, recurse: Recurse) -> Vec<PathBuf>;

    /// マニフェストからタイトル識別名を取り出す。
    /// 構造不正・フィールド欠落・読み取り失敗は `None`。
    fn manifest_identity(&self, manifest: &Path) -> Option<String>;
}
