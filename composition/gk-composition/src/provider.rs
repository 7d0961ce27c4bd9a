//! ストアプロバイダセッション
//!
//! 状態機械:
//! NotProbed → Unavailable | Available(キャッシュ未初期化) → Available(キャッシュ済み)。
//! Unavailable はセッション内で終端（再試行しない）。キャッシュは明示的な
//! リロード要求でのみ破棄され、リロードで利用可否の判定はやり直さない。

use gk_domain::DomainError;
use gk_domain::model::{GameEntry, StoreLayout, STORE_ID};
use gk_domain::port::driven::{
    DiscoveryLogRecord, GameLauncher, HiveStore, LogLevel, LogWriter, VolumeSource,
};
use gk_domain::port::driving::DiscoveryUseCase;
use regex::Regex;
use std::collections::BTreeMap;

/// プロバイダの内部状態
#[derive(Debug, Clone, PartialEq, Eq)]
enum ProviderState {
    NotProbed,
    Unavailable,
    Available { cached: bool },
}

/// 1ディスカバリセッション分のプロバイダ。
///
/// 明示的なセッションオブジェクトであり、プロセス全体のシングルトンは
/// 要求しない（単一インスタンスで使うかどうかはホストが決める）。
/// 並行書き込みは存在せず、キャッシュはリロード時に丸ごと置き換わる。
pub struct StoreProvider<H, V, L, W>
where
    H: HiveStore,
    V: VolumeSource,
    L: GameLauncher,
    W: LogWriter,
{
    hive: H,
    volumes: V,
    launcher: L,
    log: W,
    layout: StoreLayout,
    /// ホスト（設定）が指定したボリュームルート。空なら全ドライブを列挙する。
    volume_roots: Vec<String>,
    state: ProviderState,
    cache: Vec<GameEntry>,
}

impl<H, V, L, W> StoreProvider<H, V, L, W>
where
    H: HiveStore,
    V: VolumeSource,
    L: GameLauncher,
    W: LogWriter,
{
    pub fn new(
        hive: H,
        volumes: V,
        launcher: L,
        log: W,
        layout: StoreLayout,
        volume_roots: Vec<String>,
    ) -> Self {
        Self {
            hive,
            volumes,
            launcher,
            log,
            layout,
            volume_roots,
            state: ProviderState::NotProbed,
            cache: Vec::new(),
        }
    }

    fn log(&self, level: LogLevel, message: String) {
        let _ = self
            .log
            .write_discovery_log(&DiscoveryLogRecord::new(level, "provider", message));
    }

    /// 利用可否をセッション中1回だけ判定する
    fn probe(&mut self) {
        if self.state != ProviderState::NotProbed {
            return;
        }
        let available = matches!(self.hive.key_exists(&self.layout.packages_root), Ok(true));
        if available {
            self.state = ProviderState::Available { cached: false };
        } else {
            self.log(LogLevel::Debug, "store is not installed".to_string());
            self.state = ProviderState::Unavailable;
        }
    }

    /// キャッシュを必要なら埋めて返す。利用不能なら常に空。
    fn ensure_cache(&mut self) -> &[GameEntry] {
        self.probe();
        match self.state {
            ProviderState::NotProbed | ProviderState::Unavailable => &[],
            ProviderState::Available { cached } => {
                if !cached {
                    let entries =
                        match gk_engine::enumerate_packages(&self.hive, &self.layout, &self.log) {
                            Ok(entries) => entries,
                            Err(err) => {
                                // 最悪の結果は空集合。ログを残してセッション内では確定させる。
                                let _ = self.log.write_discovery_log(&DiscoveryLogRecord::new(
                                    LogLevel::Error,
                                    "provider",
                                    format!("package enumeration failed: {}", err),
                                ));
                                Vec::new()
                            }
                        };
                    self.cache = entries;
                    self.state = ProviderState::Available { cached: true };
                }
                &self.cache
            }
        }
    }
}

impl<H, V, L, W> DiscoveryUseCase for StoreProvider<H, V, L, W>
where
    H: HiveStore,
    V: VolumeSource,
    L: GameLauncher,
    W: LogWriter,
{
    fn is_store_installed(&mut self) -> bool {
        self.probe();
        matches!(self.state, ProviderState::Available { .. })
    }

    fn all_games(&mut self) -> Result<&[GameEntry], DomainError> {
        Ok(self.ensure_cache())
    }

    fn find_by_app_id(&mut self, app_ids: &[String]) -> Result<GameEntry, DomainError> {
        if app_ids.is_empty() {
            return Err(DomainError::InvalidArgument(
                "at least one app id is required".into(),
            ));
        }
        let entries = self.ensure_cache();
        let found = entries
            .iter()
            .find(|entry| app_ids.iter().any(|id| id == entry.app_id()))
            .cloned();
        found.ok_or_else(|| DomainError::EntryNotFound {
            store: STORE_ID.to_string(),
            query: app_ids.join(", "),
        })
    }

    fn find_by_name(&mut self, pattern: &str) -> Result<GameEntry, DomainError> {
        let matcher = Regex::new(pattern)
            .map_err(|err| DomainError::InvalidArgument(format!("bad name pattern: {}", err)))?;
        let entries = self.ensure_cache();
        let found = entries
            .iter()
            .find(|entry| matcher.is_match(entry.display_name()))
            .cloned();
        found.ok_or_else(|| DomainError::EntryNotFound {
            store: STORE_ID.to_string(),
            query: pattern.to_string(),
        })
    }

    fn find_installed_games(&mut self) -> Result<BTreeMap<String, String>, DomainError> {
        self.probe();
        if self.state == ProviderState::Unavailable {
            return Ok(BTreeMap::new());
        }
        let roots = if self.volume_roots.is_empty() {
            None
        } else {
            Some(self.volume_roots.as_slice())
        };
        gk_engine::find_installed_games(&self.volumes, roots, &self.log)
    }

    fn reload_games(&mut self) {
        // 利用可否はやり直さず、キャッシュだけを無効化する
        if let ProviderState::Available { cached } = &mut self.state {
            *cached = false;
            self.cache = Vec::new();
        }
    }

    fn launch(&mut self, app_id: Option<&str>) -> Result<(), DomainError> {
        let Some(app_id) = app_id else {
            return Err(DomainError::InvalidArgument(
                "an app id is required to launch a title".into(),
            ));
        };
        let entry = self.find_by_app_id(&[app_id.to_string()])?;
        self.launcher.launch_aumid(&entry.aumid())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gk_domain::model::{HiveRoot, KeyPath};
    use gk_domain::port::driven::{HiveValue, HiveValueKind, Recurse};
    use std::cell::RefCell;
    use std::collections::HashMap;
    use std::path::{Path, PathBuf};

    struct NullLog;

    impl LogWriter for NullLog {
        fn write_discovery_log(&self, _record: &DiscoveryLogRecord) -> Result<(), DomainError> {
            Ok(())
        }
    }

    struct NullLauncher {
        launched: RefCell<Vec<String>>,
    }

    impl NullLauncher {
        fn new() -> Self {
            Self {
                launched: RefCell::new(Vec::new()),
            }
        }
    }

    impl GameLauncher for NullLauncher {
        fn launch_aumid(&self, aumid: &str) -> Result<(), DomainError> {
            self.launched.borrow_mut().push(aumid.to_string());
            Ok(())
        }
    }

    fn key_id(key: &KeyPath) -> String {
        format!("{:?}|{}", key.root, key.path)
    }

    /// クエリ回数を数えるインメモリハイブ
    #[derive(Default)]
    struct CountingHive {
        present: bool,
        children: HashMap<String, Vec<String>>,
        values: HashMap<String, Vec<(String, String)>>,
        queries: RefCell<u32>,
    }

    impl CountingHive {
        fn with_package(key_name: &str, display: &str) -> (Self, StoreLayout) {
            let layout = layout();
            let mut hive = CountingHive {
                present: true,
                ..CountingHive::default()
            };
            hive.children.insert(
                key_id(&layout.packages_root),
                vec![key_name.to_string()],
            );
            hive.values.insert(
                key_id(&layout.packages_root.child(key_name)),
                vec![
                    ("DisplayName".to_string(), display.to_string()),
                    (
                        "PackageRootFolder".to_string(),
                        format!(r"C:\WindowsApps\{}", key_name),
                    ),
                ],
            );
            (hive, layout)
        }
    }

    impl HiveStore for CountingHive {
        fn key_exists(&self, _key: &KeyPath) -> Result<bool, DomainError> {
            *self.queries.borrow_mut() += 1;
            Ok(self.present)
        }

        fn child_keys(&self, key: &KeyPath) -> Result<Option<Vec<String>>, DomainError> {
            *self.queries.borrow_mut() += 1;
            let id = key_id(key);
            if let Some(children) = self.children.get(&id) {
                return Ok(Some(children.clone()));
            }
            if self.values.contains_key(&id) {
                return Ok(Some(Vec::new()));
            }
            Ok(None)
        }

        fn values(&self, key: &KeyPath) -> Result<Option<Vec<HiveValue>>, DomainError> {
            *self.queries.borrow_mut() += 1;
            Ok(self.values.get(&key_id(key)).map(|values| {
                values
                    .iter()
                    .map(|(name, _)| HiveValue {
                        name: name.clone(),
                        kind: HiveValueKind::Str,
                    })
                    .collect()
            }))
        }

        fn string_value(&self, key: &KeyPath, name: &str) -> Result<Option<String>, DomainError> {
            *self.queries.borrow_mut() += 1;
            Ok(self
                .values
                .get(&key_id(key))
                .and_then(|values| values.iter().find(|(n, _)| n == name))
                .map(|(_, data)| data.clone()))
        }
    }

    #[derive(Default)]
    struct MockVolumes {
        roots: Vec<String>,
        markers: HashMap<String, Vec<u8>>,
        manifests: HashMap<String, Vec<PathBuf>>,
        identities: HashMap<PathBuf, String>,
    }

    impl VolumeSource for MockVolumes {
        fn list_volume_roots(&self) -> Result<Vec<String>, DomainError> {
            Ok(self.roots.clone())
        }

        fn read_marker(&self, volume_root: &str) -> Option<Vec<u8>> {
            self.markers.get(volume_root).cloned()
        }

        fn locate_manifests(&self, root: &str, _recurse: Recurse) -> Vec<PathBuf> {
            self.manifests.get(root).cloned().unwrap_or_default()
        }

        fn manifest_identity(&self, manifest: &Path) -> Option<String> {
            self.identities.get(manifest).cloned()
        }
    }

    fn layout() -> StoreLayout {
        StoreLayout {
            packages_root: KeyPath::new(HiveRoot::ClassesRoot, r"Repo\Packages"),
            applications_subkey: "Applications".into(),
            resource_cache_template: KeyPath::new(HiveRoot::ClassesRoot, r"MrtCache\{package}"),
            state_cache_root: KeyPath::new(HiveRoot::LocalMachine, r"State\Package"),
            ignore_prefixes: vec!["microsoft.xbox".into()],
        }
    }

    fn provider_with_package(
        key_name: &str,
        display: &str,
    ) -> StoreProvider<CountingHive, MockVolumes, NullLauncher, NullLog> {
        let (hive, layout) = CountingHive::with_package(key_name, display);
        StoreProvider::new(
            hive,
            MockVolumes::default(),
            NullLauncher::new(),
            NullLog,
            layout,
            Vec::new(),
        )
    }

    #[test]
    fn unavailable_store_short_circuits_every_query() {
        let hive = CountingHive {
            present: false,
            ..CountingHive::default()
        };
        let mut provider = StoreProvider::new(
            hive,
            MockVolumes::default(),
            NullLauncher::new(),
            NullLog,
            layout(),
            Vec::new(),
        );
        assert!(!provider.is_store_installed());
        assert!(provider.all_games().unwrap().is_empty());
        assert!(provider.find_installed_games().unwrap().is_empty());
        assert!(matches!(
            provider.find_by_app_id(&["Foo".to_string()]),
            Err(DomainError::EntryNotFound { .. })
        ));
        // 判定はセッション中1回だけで、以降はストアに触れない
        assert_eq!(*provider.hive.queries.borrow(), 1);
    }

    #[test]
    fn all_games_is_cached_until_reload() {
        let mut provider = provider_with_package("Publisher.Foo_1.0_x64_pub", "Foo");
        let first_len = provider.all_games().unwrap().len();
        assert_eq!(first_len, 1);
        let queries_after_first = *provider.hive.queries.borrow();

        let second_len = provider.all_games().unwrap().len();
        assert_eq!(second_len, 1);
        // 2回目はストアに触れない
        assert_eq!(*provider.hive.queries.borrow(), queries_after_first);

        provider.reload_games();
        let _ = provider.all_games().unwrap();
        assert!(*provider.hive.queries.borrow() > queries_after_first);
    }

    #[test]
    fn find_by_app_id_hits_and_misses() {
        let mut provider = provider_with_package("Foo_1.0_x64_Bar", "My Foo");
        let entry = provider.find_by_app_id(&["Foo".to_string()]).unwrap();
        assert_eq!(entry.app_id(), "Foo");
        assert_eq!(entry.publisher_id(), "Bar");

        let miss = provider.find_by_app_id(&["Baz".to_string()]);
        match miss {
            Err(DomainError::EntryNotFound { store, query }) => {
                assert_eq!(store, STORE_ID);
                assert_eq!(query, "Baz");
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn find_by_app_id_rejects_empty_input() {
        let mut provider = provider_with_package("Foo_1.0_x64_Bar", "Foo");
        assert!(matches!(
            provider.find_by_app_id(&[]),
            Err(DomainError::InvalidArgument(_))
        ));
        // 引数エラーではI/Oを行わない
        assert_eq!(*provider.hive.queries.borrow(), 0);
    }

    #[test]
    fn find_by_name_uses_patterns() {
        let mut provider = provider_with_package("Foo_1.0_x64_Bar", "Halo Infinite");
        let entry = provider.find_by_name("(?i)halo").unwrap();
        assert_eq!(entry.display_name(), "Halo Infinite");

        assert!(matches!(
            provider.find_by_name("Doom"),
            Err(DomainError::EntryNotFound { .. })
        ));
        assert!(matches!(
            provider.find_by_name("("),
            Err(DomainError::InvalidArgument(_))
        ));
    }

    #[test]
    fn launch_requires_an_identity() {
        let mut provider = provider_with_package("Foo_1.0_x64_Bar", "Foo");
        assert!(matches!(
            provider.launch(None),
            Err(DomainError::InvalidArgument(_))
        ));
        assert!(provider.launcher.launched.borrow().is_empty());
    }

    #[test]
    fn launch_dispatches_the_assembled_aumid() {
        let mut provider = provider_with_package("Foo_1.0_x64_Bar", "Foo");
        provider.launch(Some("Foo")).unwrap();
        assert_eq!(
            *provider.launcher.launched.borrow(),
            vec!["Foo_Bar!App".to_string()]
        );
    }

    #[test]
    fn configured_volume_roots_drive_the_volume_scan() {
        let (hive, layout) = CountingHive::with_package("Foo_1.0_x64_Bar", "Foo");
        let mut volumes = MockVolumes::default();
        let mut marker = vec![0x52, 0x47, 0x42, 0x58, 0x01, 0x00, 0x00, 0x00];
        for unit in "Games".encode_utf16() {
            marker.extend_from_slice(&unit.to_le_bytes());
        }
        marker.extend_from_slice(&[0x00, 0x00]);
        volumes.markers.insert("E:/".into(), marker);
        let manifest = PathBuf::from("E:/Games/Foo/appxmanifest.xml");
        volumes
            .manifests
            .insert("E:/Games".into(), vec![manifest.clone()]);
        volumes.identities.insert(manifest, "Publisher.Foo".into());

        let mut provider = StoreProvider::new(
            hive,
            volumes,
            NullLauncher::new(),
            NullLog,
            layout,
            vec!["E:/".to_string()],
        );
        let games = provider.find_installed_games().unwrap();
        assert_eq!(
            games.get("Publisher.Foo").map(String::as_str),
            Some("E:/Games/Foo")
        );
    }
}
