/// 階層ストアのルートハイブ。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HiveRoot {
    ClassesRoot,
    LocalMachine,
}

/// ルートハイブ＋キーパス。
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KeyPath {
    pub root: HiveRoot,
    pub path: String,
}

impl KeyPath {
    pub fn new(root: HiveRoot, path: impl Into<String>) -> Self {
        Self {
            root,
            path: path.into(),
        }
    }

    /// 子キーのパスを組み立てる。
    pub fn child(&self, name: &str) -> KeyPath {
        KeyPath {
            root: self.root,
            path: format!("{}\\{}", self.path, name),
        }
    }
}

/// リソースキャッシュテンプレート内のパッケージIDプレースホルダ
pub const PACKAGE_PLACEHOLDER: &str = "{package}";

/// ストアレイアウト（プラットフォーム側のパス契約）。
///
/// 具体的なパス文字列はこのコアの外側（アダプタ）が決める。
/// エンジンはこの構造体経由でのみストアのキー空間に触れる。
#[derive(Debug, Clone)]
pub struct StoreLayout {
    /// パッケージリポジトリのルート
    pub packages_root: KeyPath,
    /// パッケージ配下の実行名サブキー名
    pub applications_subkey: String,
    /// リソースキャッシュパスのテンプレート（`{package}` を置換）
    pub resource_cache_template: KeyPath,
    /// 可変インストール先マッピングのルート
    pub state_cache_root: KeyPath,
    /// タイトルではないプラットフォームパッケージの接頭辞（小文字）
    pub ignore_prefixes: Vec<String>,
}

impl StoreLayout {
    /// パッケージIDをテンプレートに埋め込んだリソースキャッシュパス。
    pub fn resource_cache_path(&self, package_id: &str) -> KeyPath {
        KeyPath {
            root: self.resource_cache_template.root,
            path: self
                .resource_cache_template
                .path
                .replace(PACKAGE_PLACEHOLDER, package_id),
        }
    }

    /// 無視リスト判定。キー名の小文字形が接頭辞のいずれかで始まるか。
    ///
    /// 「ゲームである」ことを示す正式なフラグはデータソースに存在しないため、
    /// このリストは近似にすぎない。
    pub fn is_ignored(&self, key_name: &str) -> bool {
        let lower = key_name.to_ascii_lowercase();
        self.ignore_prefixes
            .iter()
            .any(|prefix| lower.starts_with(prefix.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout() -> StoreLayout {
        StoreLayout {
            packages_root: KeyPath::new(HiveRoot::ClassesRoot, r"Repo\Packages"),
            applications_subkey: "Applications".into(),
            resource_cache_template: KeyPath::new(
                HiveRoot::ClassesRoot,
                r"MrtCache\{package}\resources",
            ),
            state_cache_root: KeyPath::new(HiveRoot::LocalMachine, r"State\Package"),
            ignore_prefixes: vec!["microsoft.xbox".into(), "windows.".into()],
        }
    }

    #[test]
    fn resource_cache_path_substitutes_package_id() {
        let path = layout().resource_cache_path("Foo_1.0_x64_pub");
        assert_eq!(path.path, r"MrtCache\Foo_1.0_x64_pub\resources");
        assert_eq!(path.root, HiveRoot::ClassesRoot);
    }

    #[test]
    fn is_ignored_matches_case_insensitively() {
        let layout = layout();
        assert!(layout.is_ignored("Microsoft.Xbox_1.0.0.0_x64_8wekyb3d8bbwe"));
        assert!(layout.is_ignored("Windows.PrintDialog_6.2_neutral"));
        assert!(!layout.is_ignored("Publisher.Foo_1.0_x64_pub"));
    }

    #[test]
    fn child_appends_separator() {
        let root = KeyPath::new(HiveRoot::LocalMachine, r"State\Package");
        assert_eq!(root.child("abc").path, r"State\Package\abc");
    }
}
