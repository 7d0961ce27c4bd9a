use crate::DomainError;

/// このエンジンが扱うストアの識別子
pub const STORE_ID: &str = "xbox";

/// 解決済みのタイトルエントリ。
///
/// 1回のディスカバリセッションの間だけ保持される。
/// 必須フィールドが解決できなかった候補はエントリにならず破棄される。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameEntry {
    app_id: String,
    publisher_id: String,
    execution_name: String,
    install_path: String,
    display_name: String,
    store_id: String,
}

impl GameEntry {
    /// 作成時に必須フィールドを検証する。
    /// app_id と install_path が空のエントリは存在してはならない。
    pub fn new(
        app_id: impl Into<String>,
        publisher_id: impl Into<String>,
        execution_name: impl Into<String>,
        install_path: impl Into<String>,
        display_name: impl Into<String>,
    ) -> Result<Self, DomainError> {
        let app_id: String = app_id.into();
        if app_id.trim().is_empty() {
            return Err(DomainError::InvalidArgument(
                "app_id must not be empty".into(),
            ));
        }
        let install_path: String = install_path.into();
        if install_path.trim().is_empty() {
            return Err(DomainError::InvalidArgument(
                "install_path must not be empty".into(),
            ));
        }
        Ok(Self {
            app_id,
            publisher_id: publisher_id.into(),
            execution_name: execution_name.into(),
            install_path,
            display_name: display_name.into(),
            store_id: STORE_ID.to_string(),
        })
    }

    pub fn app_id(&self) -> &str {
        &self.app_id
    }

    pub fn publisher_id(&self) -> &str {
        &self.publisher_id
    }

    pub fn execution_name(&self) -> &str {
        &self.execution_name
    }

    pub fn install_path(&self) -> &str {
        &self.install_path
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn store_id(&self) -> &str {
        &self.store_id
    }

    /// アクティベーションID（AUMID）を組み立てる。
    /// `<Identity>_<PublisherId>!<ExecutionName>` 形式。
    pub fn aumid(&self) -> String {
        format!(
            "{}_{}!{}",
            self.app_id, self.publisher_id, self.execution_name
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_rejects_empty_app_id() {
        let entry = GameEntry::new("", "8wekyb3d8bbwe", "App", r"C:\XboxGames\Foo", "Foo");
        assert!(entry.is_err());
    }

    #[test]
    fn new_rejects_empty_install_path() {
        let entry = GameEntry::new("Publisher.Foo", "8wekyb3d8bbwe", "App", " ", "Foo");
        assert!(entry.is_err());
    }

    #[test]
    fn aumid_joins_family_and_execution_name() {
        let entry = GameEntry::new(
            "Publisher.Foo",
            "8wekyb3d8bbwe",
            "Game",
            r"C:\XboxGames\Foo\Content",
            "Foo",
        )
        .unwrap();
        assert_eq!(entry.aumid(), "Publisher.Foo_8wekyb3d8bbwe!Game");
        assert_eq!(entry.store_id(), STORE_ID);
    }
}
