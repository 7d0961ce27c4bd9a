//! ファイルシステムアダプター（ボリューム列挙／マーカー読み取り／
//! マニフェスト探索／設定永続化／診断ログ）
//!
//! ドメインの `VolumeSource` と `LogWriter` の実装。木の走査は汎用の
//! walkdir、マニフェストはquick-xml、設定はJSONファイルで扱う。

use gk_domain::DomainError;
use gk_domain::model::ScanConfig;
use gk_domain::port::driven::{DiscoveryLogRecord, LogWriter, Recurse, VolumeSource};
use gk_domain::service::MARKER_FILE_NAME;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// タイトルごとの固定マニフェストファイル名（大文字小文字は区別しない）
pub const MANIFEST_FILE_NAME: &str = "appxmanifest.xml";

/// 非再帰探索の深さ上限（ルート直下のタイトルディレクトリまで）
const SHALLOW_DEPTH: usize = 2;

#[derive(Debug, Clone)]
pub struct FsAdapter {
    config_path: PathBuf,
    log_paths: Vec<PathBuf>,
}

impl FsAdapter {
    pub fn new(data_dir: &Path) -> Self {
        Self {
            config_path: data_dir.join("config.json"),
            log_paths: vec![
                data_dir.join("logs").join("gk-discovery.log"),
                std::env::temp_dir().join("gk-discovery.log"),
            ],
        }
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// 設定を読み込む。ファイルが無ければ既定値。
    pub fn load_config(&self) -> Result<ScanConfig, DomainError> {
        let text = match fs::read_to_string(&self.config_path) {
            Ok(text) => text,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Ok(ScanConfig::default());
            }
            Err(err) => {
                return Err(DomainError::ConfigLoadFailed(format!(
                    "{}: {}",
                    self.config_path.display(),
                    err
                )));
            }
        };
        let file: ScanConfigFile = serde_json::from_str(&text).map_err(|err| {
            DomainError::ConfigLoadFailed(format!("{}: {}", self.config_path.display(), err))
        })?;
        let mut config = ScanConfig {
            version: file.version,
            extra_volume_roots: file.extra_volume_roots,
            extra_ignore_prefixes: file.extra_ignore_prefixes,
        };
        config.ensure_defaults();
        config.validate()?;
        Ok(config)
    }

    /// 設定を保存する。
    pub fn save_config(&self, config: &ScanConfig) -> Result<(), DomainError> {
        config.validate()?;
        if let Some(dir) = self.config_path.parent() {
            fs::create_dir_all(dir)
                .map_err(|err| DomainError::IoError(format!("{}: {}", dir.display(), err)))?;
        }
        let file = ScanConfigFile {
            version: config.version.clone(),
            extra_volume_roots: config.extra_volume_roots.clone(),
            extra_ignore_prefixes: config.extra_ignore_prefixes.clone(),
        };
        let text = serde_json::to_string_pretty(&file)
            .map_err(|err| DomainError::Unknown(format!("config serialize failed: {}", err)))?;
        fs::write(&self.config_path, text).map_err(|err| {
            DomainError::IoError(format!("{}: {}", self.config_path.display(), err))
        })?;
        Ok(())
    }
}

/// 設定の永続化形式
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ScanConfigFile {
    #[serde(default)]
    version: String,
    #[serde(default)]
    extra_volume_roots: Vec<String>,
    #[serde(default)]
    extra_ignore_prefixes: Vec<String>,
}

impl VolumeSource for FsAdapter {
    fn list_volume_roots(&self) -> Result<Vec<String>, DomainError> {
        list_volume_roots_impl()
    }

    fn read_marker(&self, volume_root: &str) -> Option<Vec<u8>> {
        let marker_path = PathBuf::from(format!("{}{}", volume_root, MARKER_FILE_NAME));
        // 通常ファイル以外（シンボリックリンク含む）は不在として扱う
        let metadata = fs::symlink_metadata(&marker_path).ok()?;
        if !metadata.is_file() {
            return None;
        }
        fs::read(&marker_path).ok()
    }

    fn locate_manifests(&self, root: &str, recurse: Recurse) -> Vec<PathBuf> {
        let max_depth = match recurse {
            Recurse::Yes => usize::MAX,
            Recurse::No => SHALLOW_DEPTH,
        };
        WalkDir::new(root)
            .follow_links(false)
            .max_depth(max_depth)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| entry.depth() == 0 || !is_hidden(entry))
            // 到達不能なエントリはスキップして残りを集める
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().is_file())
            .filter(|entry| {
                entry
                    .file_name()
                    .to_str()
                    .map(|name| name.eq_ignore_ascii_case(MANIFEST_FILE_NAME))
                    .unwrap_or(false)
            })
            .map(|entry| entry.into_path())
            .collect()
    }

    fn manifest_identity(&self, manifest: &Path) -> Option<String> {
        let text = fs::read_to_string(manifest).ok()?;
        parse_manifest_identity(&text)
    }
}

impl LogWriter for FsAdapter {
    fn write_discovery_log(&self, record: &DiscoveryLogRecord) -> Result<(), DomainError> {
        let line = gk_log_utils::diagnostic_line(
            record.level.as_str(),
            &record.component,
            &record.message,
        );
        gk_log_utils::write_line_to_paths(&line, &self.log_paths);
        Ok(())
    }
}

/// 隠しエントリ判定。ドット始まりに加え、Windowsでは隠し属性も見る。
fn is_hidden(entry: &walkdir::DirEntry) -> bool {
    #[cfg(windows)]
    {
        use std::os::windows::fs::MetadataExt;
        const FILE_ATTRIBUTE_HIDDEN: u32 = 0x2;
        if let Ok(metadata) = entry.metadata() {
            if metadata.file_attributes() & FILE_ATTRIBUTE_HIDDEN != 0 {
                return true;
            }
        }
    }
    entry
        .file_name()
        .to_str()
        .map(|name| name.starts_with('.'))
        .unwrap_or(false)
}

/// マニフェスト本文からタイトル識別名を取り出す。
///
/// ルート要素 `Package` 直下（入れ子位置は問わない）の最初の `Identity`
/// 要素の `Name` 属性が識別名。構造が崩れていれば `None`。
pub fn parse_manifest_identity(xml: &str) -> Option<String> {
    use quick_xml::Reader;
    use quick_xml::events::Event;

    let mut reader = Reader::from_str(xml);
    let mut saw_package_root = false;
    loop {
        match reader.read_event() {
            Ok(Event::Start(element)) | Ok(Event::Empty(element)) => {
                if !saw_package_root {
                    if element.local_name().as_ref() != b"Package" {
                        return None;
                    }
                    saw_package_root = true;
                    continue;
                }
                if element.local_name().as_ref() == b"Identity" {
                    for attribute in element.attributes().flatten() {
                        if attribute.key.local_name().as_ref() == b"Name" {
                            return attribute
                                .unescape_value()
                                .ok()
                                .map(|value| value.to_string())
                                .filter(|value| !value.is_empty());
                        }
                    }
                    // Name属性のないIdentityは識別名にならない
                    return None;
                }
            }
            Ok(Event::Eof) => return None,
            Err(_) => return None,
            _ => {}
        }
    }
}

#[cfg(windows)]
fn list_volume_roots_impl() -> Result<Vec<String>, DomainError> {
    use windows::Win32::Storage::FileSystem::GetLogicalDriveStringsW;

    let mut buffer = [0u16; 512];
    let len = unsafe { GetLogicalDriveStringsW(Some(&mut buffer)) };
    if len == 0 || len as usize > buffer.len() {
        return Err(DomainError::Unknown(
            "GetLogicalDriveStringsW failed".into(),
        ));
    }
    // ダブルヌル区切りのワイド文字列リスト
    let roots = buffer[..len as usize]
        .split(|unit| *unit == 0)
        .filter(|chunk| !chunk.is_empty())
        .map(String::from_utf16_lossy)
        .collect();
    Ok(roots)
}

#[cfg(not(windows))]
fn list_volume_roots_impl() -> Result<Vec<String>, DomainError> {
    // このプラットフォームにボリュームレターは存在しない
    Ok(Vec::new())
}

#[cfg(test)]
mod tests {
    use super::*;
    use gk_domain::port::driven::Recurse;
    use std::fs;

    const MANIFEST: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<Package xmlns="http://schemas.microsoft.com/appx/manifest/foundation/windows10">
  <Identity Name="Publisher.Foo" Publisher="CN=Publisher" Version="1.0.0.0" />
  <Properties>
    <DisplayName>Foo</DisplayName>
  </Properties>
</Package>"#;

    #[test]
    fn parses_identity_name_attribute() {
        assert_eq!(
            parse_manifest_identity(MANIFEST).as_deref(),
            Some("Publisher.Foo")
        );
    }

    #[test]
    fn rejects_non_package_root() {
        let xml = r#"<Bundle><Identity Name="Publisher.Foo"/></Bundle>"#;
        assert_eq!(parse_manifest_identity(xml), None);
    }

    #[test]
    fn rejects_identity_without_name() {
        let xml = r#"<Package><Identity Version="1.0.0.0"/></Package>"#;
        assert_eq!(parse_manifest_identity(xml), None);
    }

    #[test]
    fn rejects_malformed_document() {
        assert_eq!(parse_manifest_identity("<Package><Identity"), None);
        assert_eq!(parse_manifest_identity(""), None);
    }

    #[test]
    fn locate_manifests_finds_only_manifest_basenames() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("GameA")).unwrap();
        fs::write(root.join("GameA").join("appxmanifest.xml"), MANIFEST).unwrap();
        fs::create_dir_all(root.join("GameB")).unwrap();
        fs::write(root.join("GameB").join("other.xml"), "<x/>").unwrap();

        let adapter = FsAdapter::new(root);
        let found = adapter.locate_manifests(&root.to_string_lossy(), Recurse::No);
        assert_eq!(found.len(), 1);
        assert!(found[0].ends_with("GameA/appxmanifest.xml") || found[0].ends_with(r"GameA\appxmanifest.xml"));
    }

    #[test]
    fn locate_manifests_skips_hidden_directories() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join(".hidden")).unwrap();
        fs::write(root.join(".hidden").join("appxmanifest.xml"), MANIFEST).unwrap();

        let adapter = FsAdapter::new(root);
        let found = adapter.locate_manifests(&root.to_string_lossy(), Recurse::Yes);
        assert!(found.is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn locate_manifests_skips_symlinked_subtrees() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        let outside = tempfile::tempdir().unwrap();
        fs::create_dir_all(outside.path().join("GameX")).unwrap();
        fs::write(
            outside.path().join("GameX").join("appxmanifest.xml"),
            MANIFEST,
        )
        .unwrap();
        std::os::unix::fs::symlink(outside.path().join("GameX"), root.join("GameX")).unwrap();

        let adapter = FsAdapter::new(root);
        let found = adapter.locate_manifests(&root.to_string_lossy(), Recurse::Yes);
        assert!(found.is_empty());
    }

    #[test]
    fn shallow_walk_does_not_descend_into_nested_layouts() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("GameC").join("nested")).unwrap();
        fs::write(
            root.join("GameC").join("nested").join("appxmanifest.xml"),
            MANIFEST,
        )
        .unwrap();

        let adapter = FsAdapter::new(root);
        let shallow = adapter.locate_manifests(&root.to_string_lossy(), Recurse::No);
        assert!(shallow.is_empty());
        let deep = adapter.locate_manifests(&root.to_string_lossy(), Recurse::Yes);
        assert_eq!(deep.len(), 1);
    }

    #[test]
    fn read_marker_absent_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let adapter = FsAdapter::new(dir.path());
        let volume_root = format!("{}/", dir.path().display());
        assert_eq!(adapter.read_marker(&volume_root), None);
    }

    #[test]
    fn read_marker_returns_raw_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let bytes = [0x52u8, 0x47, 0x42, 0x58, 0x01, 0x00];
        fs::write(dir.path().join(".GamingRoot"), bytes).unwrap();
        let adapter = FsAdapter::new(dir.path());
        let volume_root = format!("{}/", dir.path().display());
        assert_eq!(adapter.read_marker(&volume_root), Some(bytes.to_vec()));
    }

    #[test]
    fn read_marker_rejects_directories() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join(".GamingRoot")).unwrap();
        let adapter = FsAdapter::new(dir.path());
        let volume_root = format!("{}/", dir.path().display());
        assert_eq!(adapter.read_marker(&volume_root), None);
    }

    #[test]
    fn config_round_trips_through_json() {
        let dir = tempfile::tempdir().unwrap();
        let adapter = FsAdapter::new(dir.path());
        let mut config = ScanConfig::default();
        config.extra_volume_roots = vec!["E:\\".into()];
        config.extra_ignore_prefixes = vec!["Contoso.Platform".into()];
        adapter.save_config(&config).unwrap();

        let loaded = adapter.load_config().unwrap();
        assert_eq!(loaded.extra_volume_roots, vec!["E:\\".to_string()]);
        // 接頭辞は読み込み時に小文字へ正規化される
        assert_eq!(
            loaded.extra_ignore_prefixes,
            vec!["contoso.platform".to_string()]
        );
    }

    #[test]
    fn missing_config_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let adapter = FsAdapter::new(dir.path());
        let config = adapter.load_config().unwrap();
        assert_eq!(config, ScanConfig::default());
    }
}
