//! 階層キーバリューストアアクセスポート
//!
//! このエンジンはストアを実装しない。open／子キー列挙／値列挙／値取得の
//! 4操作だけを能力として要求する。

use crate::error::DomainError;
use crate::model::KeyPath;

/// ストア値の型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HiveValueKind {
    Str,
    ExpandStr,
    MultiStr,
    Dword,
    Qword,
    Binary,
    Other,
}

/// 値の名前と型
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HiveValue {
    pub name: String,
    pub kind: HiveValueKind,
}

/// 階層ストアへの読み取り専用ポート。
///
/// 「キー／値が存在しない」は期待される不在であり `Ok(None)`。
/// `Err` になるのは真のアクセス失敗（権限不足、破損）だけ。
/// 列挙順序はストア定義で、安定とは保証されない。
pub trait HiveStore {
    /// キーが開けるか
    fn key_exists(&self, key: &KeyPath) -> Result<bool, DomainError>;

    /// 子キー名を列挙する。キー不在は `None`。
    fn child_keys(&self, key: &KeyPath) -> Result<Option<Vec<String>>, DomainError>;

    /// 値の名前と型を列挙する。キー不在は `None`。
    fn values(&self, key: &KeyPath) -> Result<Option<Vec<HiveValue>>, DomainError>;

    /// 文字列型の値データを取得する。キー不在・値不在・非文字列型は `None`。
    fn string_value(&self, key: &KeyPath, name: &str) -> Result<Option<String>, DomainError>;
}
