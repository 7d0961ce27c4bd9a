//! gk-engine: パッケージ列挙／名前・インストール先の間接解決／ボリューム
//! スキャンのワークフローを実装する層。ドメイン（gk-domain）のポートにのみ
//! 依存する。
//!
//! どのステップも「部分的にしか埋まっていないストア」を前提とする。
//! 期待される不在は結果から黙って抜け、真のアクセス失敗はログに残して
//! 候補単位で破棄する。バッチ全体を落とすのはルート列挙の失敗だけ。

use gk_domain::DomainError;
use gk_domain::model::{GameEntry, PackageKey, StoreLayout};
use gk_domain::port::driven::{
    DiscoveryLogRecord, HiveStore, HiveValueKind, LogLevel, LogWriter, Recurse, VolumeSource,
};
use gk_domain::service::decode_volume_marker;
use std::collections::BTreeMap;

/// 表示名の間接参照マーカー
const INDIRECT_MARKER: char = '@';
/// 実行名が解決できないときの既定値
const DEFAULT_EXECUTION_NAME: &str = "App";
/// パッケージキー直下の表示名値
const DISPLAY_NAME_VALUE: &str = "DisplayName";
/// パッケージキー直下の公称インストール先値
const PACKAGE_ROOT_FOLDER_VALUE: &str = "PackageRootFolder";
/// 可変インストール先レコードのリンク値名
const MUTABLE_LINK_VALUE: &str = "MutableLink";
/// 可変インストール先レコードの実体値名
const MUTABLE_LOCATION_VALUE: &str = "MutableLocation";

fn log(writer: &impl LogWriter, level: LogLevel, component: &str, message: String) {
    // ログ失敗でディスカバリを止めない
    let _ = writer.write_discovery_log(&DiscoveryLogRecord::new(level, component, message));
}

// ============================================================================
// 間接解決（表示名／可変インストール先）
// ============================================================================

/// 表示名を解決する。
///
/// `raw` が間接参照マーカーで始まらなければそれ自体が表示名。
/// 間接参照の場合はパッケージIDをキャッシュテンプレートへ埋め込み、
/// 最初の子キー→その配下のハイブ群を列挙順に走査して、参照文字列と
/// 同名の値を探す。最初に取得できた値が答え。
///
/// ハイブ単位の失敗は飲み込み、どのホップでも解決できなければ `None`。
/// 列挙順序はストア定義であり、ソートによる安定化は行わない。
pub fn resolve_display_name(
    hive: &impl HiveStore,
    layout: &StoreLayout,
    package_id: &str,
    raw: &str,
    writer: &impl LogWriter,
) -> Option<String> {
    if !raw.starts_with(INDIRECT_MARKER) {
        return Some(raw.to_string());
    }

    let cache = layout.resource_cache_path(package_id);
    let children = match hive.child_keys(&cache) {
        Ok(Some(children)) => children,
        Ok(None) => return None,
        Err(err) => {
            log(
                writer,
                LogLevel::Error,
                "resolver",
                format!("resource cache open failed for {}: {}", package_id, err),
            );
            return None;
        }
    };
    // 兄弟キーのうち試すのは最初の1つだけ
    let first = children.first()?;
    let hives_key = cache.child(first);
    let hives = match hive.child_keys(&hives_key) {
        Ok(Some(hives)) => hives,
        Ok(None) => return None,
        Err(err) => {
            log(
                writer,
                LogLevel::Error,
                "resolver",
                format!("resource cache hive list failed for {}: {}", package_id, err),
            );
            return None;
        }
    };

    for hive_name in &hives {
        let hive_key = hives_key.child(hive_name);
        let values = match hive.values(&hive_key) {
            Ok(Some(values)) => values,
            Ok(None) => continue,
            Err(err) => {
                log(
                    writer,
                    LogLevel::Debug,
                    "resolver",
                    format!("skipping hive {}: {}", hive_name, err),
                );
                continue;
            }
        };
        if !values.iter().any(|value| value.name == raw) {
            continue;
        }
        match hive.string_value(&hive_key, raw) {
            Ok(Some(name)) => return Some(name),
            Ok(None) => continue,
            Err(err) => {
                log(
                    writer,
                    LogLevel::Debug,
                    "resolver",
                    format!("skipping hive {}: {}", hive_name, err),
                );
                continue;
            }
        }
    }
    None
}

/// 真の（更新安全な）インストール先を解決する。
///
/// ステートキャッシュの子キーのうち、文字列型の `MutableLink` と
/// `MutableLocation` を両方持つものだけがマッピングレコード。
/// `MutableLink` が `package_root` と完全一致した最初のレコードの
/// `MutableLocation` が答え。一致がなければ `None`（呼び出し側は
/// `package_root` 自体へフォールバックする）。
pub fn resolve_mutable_location(
    hive: &impl HiveStore,
    layout: &StoreLayout,
    package_root: &str,
    writer: &impl LogWriter,
) -> Option<String> {
    let children = match hive.child_keys(&layout.state_cache_root) {
        Ok(Some(children)) => children,
        Ok(None) => return None,
        Err(err) => {
            log(
                writer,
                LogLevel::Error,
                "resolver",
                format!("state cache open failed: {}", err),
            );
            return None;
        }
    };

    for child in &children {
        let child_key = layout.state_cache_root.child(child);
        let values = match hive.values(&child_key) {
            Ok(Some(values)) => values,
            Ok(None) => continue,
            Err(err) => {
                log(
                    writer,
                    LogLevel::Debug,
                    "resolver",
                    format!("skipping state record {}: {}", child, err),
                );
                continue;
            }
        };
        let has = |name: &str| {
            values
                .iter()
                .any(|value| value.kind == HiveValueKind::Str && value.name == name)
        };
        if !has(MUTABLE_LINK_VALUE) || !has(MUTABLE_LOCATION_VALUE) {
            continue;
        }
        let link = match hive.string_value(&child_key, MUTABLE_LINK_VALUE) {
            Ok(Some(link)) => link,
            _ => continue,
        };
        if link != package_root {
            continue;
        }
        match hive.string_value(&child_key, MUTABLE_LOCATION_VALUE) {
            Ok(Some(location)) => return Some(location),
            _ => continue,
        }
    }
    None
}

// ============================================================================
// パッケージ列挙
// ============================================================================

/// パッケージリポジトリを列挙し、候補ごとに解決済みエントリを組み立てる。
///
/// 無視リストに当たるキー、分解できないキー、表示名値を持たない候補、
/// インストール先を持たない候補、解決中に予期しないアクセス失敗を起こした
/// 候補は破棄する。バッチ自体はルートが開けない場合のみ失敗する
/// （ルート不在は空の結果）。
pub fn enumerate_packages(
    hive: &impl HiveStore,
    layout: &StoreLayout,
    writer: &impl LogWriter,
) -> Result<Vec<GameEntry>, DomainError> {
    let keys = match hive.child_keys(&layout.packages_root)? {
        Some(keys) => keys,
        None => {
            log(
                writer,
                LogLevel::Debug,
                "enumerator",
                "package repository root is absent".to_string(),
            );
            return Ok(Vec::new());
        }
    };

    let mut entries = Vec::new();
    for key_name in &keys {
        if layout.is_ignored(key_name) {
            log(
                writer,
                LogLevel::Debug,
                "enumerator",
                format!("ignoring platform package {}", key_name),
            );
            continue;
        }
        let Some(package) = PackageKey::parse(key_name) else {
            log(
                writer,
                LogLevel::Debug,
                "enumerator",
                format!("not a package key: {}", key_name),
            );
            continue;
        };
        match build_entry(hive, layout, &package, writer) {
            Ok(Some(entry)) => entries.push(entry),
            Ok(None) => {}
            Err(err) => {
                // 候補単位で破棄し、列挙は続行する
                log(
                    writer,
                    LogLevel::Error,
                    "enumerator",
                    format!("dropping candidate {}: {}", key_name, err),
                );
            }
        }
    }
    Ok(entries)
}

/// 1候補分の解決。`Ok(None)` は必須フィールド欠落による破棄。
fn build_entry(
    hive: &impl HiveStore,
    layout: &StoreLayout,
    package: &PackageKey,
    writer: &impl LogWriter,
) -> Result<Option<GameEntry>, DomainError> {
    let package_key = layout.packages_root.child(package.raw());

    // 実行名: 二次リポジトリの最初の子キーを `!` で割った最後のセグメント
    let applications = package_key.child(&layout.applications_subkey);
    let execution_name = match hive.child_keys(&applications)? {
        Some(children) => children
            .first()
            .and_then(|aumid| aumid.split('!').next_back())
            .unwrap_or(DEFAULT_EXECUTION_NAME)
            .to_string(),
        None => DEFAULT_EXECUTION_NAME.to_string(),
    };

    // 表示名値を持たないレコードはタイトルとして使えない
    let Some(raw_display_name) = hive.string_value(&package_key, DISPLAY_NAME_VALUE)? else {
        log(
            writer,
            LogLevel::Info,
            "enumerator",
            format!("dropping {}: no display name value", package.raw()),
        );
        return Ok(None);
    };
    // 間接参照が解決できなければ生の参照文字列のまま使う
    let display_name = resolve_display_name(hive, layout, package.raw(), &raw_display_name, writer)
        .unwrap_or_else(|| raw_display_name.clone());

    let Some(package_root) = hive.string_value(&package_key, PACKAGE_ROOT_FOLDER_VALUE)? else {
        log(
            writer,
            LogLevel::Info,
            "enumerator",
            format!("dropping {}: no package root folder", package.raw()),
        );
        return Ok(None);
    };
    let install_path = resolve_mutable_location(hive, layout, &package_root, writer)
        .unwrap_or_else(|| package_root.clone());

    let entry = GameEntry::new(
        package.app_id(),
        package.publisher_id(),
        execution_name,
        install_path,
        display_name,
    )?;
    Ok(Some(entry))
}

// ============================================================================
// ボリュームスキャン（マーカー → マニフェスト）
// ============================================================================

/// ボリュームマーカー経路のディスカバリ。
///
/// 各ボリュームについてマーカーを読み（不在はスキップ）、デコードした
/// インストールルート以下のマニフェストからタイトル識別名を取り出し、
/// 識別名 → インストールディレクトリを索引する。マーカーの破損は
/// そのボリュームだけを落とし、残りのスキャンは続行する。
/// 同一識別名は後勝ち（ボリューム列挙順で決定的）。
pub fn find_installed_games(
    volumes: &impl VolumeSource,
    roots: Option<&[String]>,
    writer: &impl LogWriter,
) -> Result<BTreeMap<String, String>, DomainError> {
    let roots: Vec<String> = match roots {
        Some(roots) => roots.to_vec(),
        None => volumes.list_volume_roots()?,
    };

    let mut games = BTreeMap::new();
    for root in &roots {
        let Some(bytes) = volumes.read_marker(root) else {
            log(
                writer,
                LogLevel::Debug,
                "marker",
                format!("no marker on {}", root),
            );
            continue;
        };
        let install_root = match decode_volume_marker(root, &bytes) {
            Ok(install_root) => install_root,
            Err(err) => {
                // ボリューム単位で隔離して続行
                log(writer, LogLevel::Error, "marker", format!("{}", err));
                continue;
            }
        };
        for manifest in volumes.locate_manifests(&install_root, Recurse::No) {
            let Some(identity) = volumes.manifest_identity(&manifest) else {
                log(
                    writer,
                    LogLevel::Debug,
                    "walker",
                    format!("unreadable manifest {}", manifest.display()),
                );
                continue;
            };
            let Some(install_dir) = manifest.parent() else {
                continue;
            };
            games.insert(identity, install_dir.to_string_lossy().to_string());
        }
    }
    Ok(games)
}
