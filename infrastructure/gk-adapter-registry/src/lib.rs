//! Windowsレジストリハイブアダプター
//!
//! ベンダーストアのパッケージリポジトリ／リソースキャッシュ（HKCR）と
//! GamingServicesステートキャッシュ（HKLM）を読み取り専用で公開する。
//! ドメインの `HiveStore` ポートの実装。書き込みAPIは一切使わない。

use gk_domain::DomainError;
use gk_domain::model::{HiveRoot, KeyPath, StoreLayout};
use gk_domain::port::driven::{HiveStore, HiveValue};

// ============================================================================
// ストアパス定数（プラットフォーム契約）
// ============================================================================

/// パッケージリポジトリのルート（HKCR配下）
pub const PACKAGES_ROOT_PATH: &str =
    r"Local Settings\Software\Microsoft\Windows\CurrentVersion\AppModel\Repository\Packages";

/// パッケージキー配下の実行名サブキー名
pub const APPLICATIONS_SUBKEY: &str = "Applications";

/// リソースキャッシュのテンプレートパス（HKCR配下、`{package}` を置換）
pub const RESOURCE_CACHE_TEMPLATE_PATH: &str =
    r"Local Settings\MrtCache\C:%5CProgram Files%5CWindowsApps%5C{package}%5Cresources.pri";

/// 可変インストール先マッピングのルート（HKLM配下）
pub const STATE_CACHE_ROOT_PATH: &str =
    r"SOFTWARE\Microsoft\GamingServices\PackageRepository\Package";

/// タイトルではないプラットフォームパッケージの接頭辞（小文字）。
/// データソースに「ゲームである」ことを示す正式なフラグは存在しないため、
/// このリストは近似にすぎない。
pub const IGNORE_PREFIXES: &[&str] = &[
    "c5e2524a-ea46-4f67-841f-6a9465d9d515",
    "e2a4f912-2574-4a75-9bb0-0d023378592b",
    "microsoft.aad",
    "microsoft.accountscontrol",
    "microsoft.advertising",
    "microsoft.bioenrollment",
    "microsoft.desktopappinstaller",
    "microsoft.directx",
    "microsoft.gamingapp",
    "microsoft.gamingservices",
    "microsoft.net",
    "microsoft.services",
    "microsoft.storepurchaseapp",
    "microsoft.ui",
    "microsoft.vclibs",
    "microsoft.windows",
    "microsoft.winjs",
    "microsoft.xbox",
    "microsoftwindows.",
    "windows.",
];

/// 既定のストアレイアウトを組み立てる
pub fn default_store_layout() -> StoreLayout {
    StoreLayout {
        packages_root: KeyPath::new(HiveRoot::ClassesRoot, PACKAGES_ROOT_PATH),
        applications_subkey: APPLICATIONS_SUBKEY.to_string(),
        resource_cache_template: KeyPath::new(HiveRoot::ClassesRoot, RESOURCE_CACHE_TEMPLATE_PATH),
        state_cache_root: KeyPath::new(HiveRoot::LocalMachine, STATE_CACHE_ROOT_PATH),
        ignore_prefixes: IGNORE_PREFIXES.iter().map(|p| p.to_string()).collect(),
    }
}

/// プラットフォーム中立のアダプター型
#[cfg(windows)]
pub type HiveAdapter = WindowsHiveAdapter;
#[cfg(not(windows))]
pub type HiveAdapter = NonWindowsHiveAdapter;

#[cfg(windows)]
#[derive(Debug, Default, Clone)]
pub struct WindowsHiveAdapter;

#[cfg(windows)]
impl WindowsHiveAdapter {
    pub fn new() -> Self {
        Self
    }

    /// プラットフォーム機能の存在確認。
    /// パッケージリポジトリのルートが開けるかどうかで判定する。
    pub fn probe_store(&self) -> bool {
        matches!(
            self.key_exists(&KeyPath::new(HiveRoot::ClassesRoot, PACKAGES_ROOT_PATH)),
            Ok(true)
        )
    }
}

#[cfg(not(windows))]
#[derive(Debug, Default, Clone)]
pub struct NonWindowsHiveAdapter;

#[cfg(not(windows))]
impl NonWindowsHiveAdapter {
    pub fn new() -> Self {
        Self
    }

    /// このプラットフォームにベンダーストアは存在しない
    pub fn probe_store(&self) -> bool {
        false
    }
}

#[cfg(not(windows))]
impl HiveStore for NonWindowsHiveAdapter {
    fn key_exists(&self, _key: &KeyPath) -> Result<bool, DomainError> {
        Ok(false)
    }

    fn child_keys(&self, _key: &KeyPath) -> Result<Option<Vec<String>>, DomainError> {
        Ok(None)
    }

    fn values(&self, _key: &KeyPath) -> Result<Option<Vec<HiveValue>>, DomainError> {
        Ok(None)
    }

    fn string_value(&self, _key: &KeyPath, _name: &str) -> Result<Option<String>, DomainError> {
        Ok(None)
    }
}

#[cfg(windows)]
impl HiveStore for WindowsHiveAdapter {
    fn key_exists(&self, key: &KeyPath) -> Result<bool, DomainError> {
        match windows_impl::open_key_readonly(key)? {
            Some(guard) => {
                drop(guard);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn child_keys(&self, key: &KeyPath) -> Result<Option<Vec<String>>, DomainError> {
        windows_impl::child_keys(key)
    }

    fn values(&self, key: &KeyPath) -> Result<Option<Vec<HiveValue>>, DomainError> {
        windows_impl::values(key)
    }

    fn string_value(&self, key: &KeyPath, name: &str) -> Result<Option<String>, DomainError> {
        windows_impl::string_value(key, name)
    }
}

#[cfg(windows)]
mod windows_impl {
    use super::*;
    use gk_domain::port::driven::HiveValueKind;
    use windows::Win32::Foundation::{
        ERROR_ACCESS_DENIED, ERROR_FILE_NOT_FOUND, ERROR_PATH_NOT_FOUND, ERROR_SUCCESS,
        WIN32_ERROR,
    };
    use windows::Win32::System::Registry::{
        HKEY, HKEY_CLASSES_ROOT, HKEY_LOCAL_MACHINE, KEY_ENUMERATE_SUB_KEYS, KEY_QUERY_VALUE,
        REG_BINARY, REG_DWORD, REG_EXPAND_SZ, REG_MULTI_SZ, REG_QWORD, REG_SZ, REG_VALUE_TYPE,
        RRF_RT_REG_EXPAND_SZ, RRF_RT_REG_SZ, RegCloseKey, RegEnumKeyExW, RegEnumValueW,
        RegGetValueW, RegOpenKeyExW,
    };
    use windows::core::{PCWSTR, PWSTR};

    /// 型が一致しない値をRegGetValueWが拒否したときのステータス
    const ERROR_UNSUPPORTED_TYPE_CODE: u32 = 1630;

    /// クローズ漏れを防ぐキーガード
    pub(super) struct RegKeyGuard(HKEY);

    impl RegKeyGuard {
        fn hkey(&self) -> HKEY {
            self.0
        }
    }

    impl Drop for RegKeyGuard {
        fn drop(&mut self) {
            unsafe {
                let _ = RegCloseKey(self.0);
            }
        }
    }

    fn to_wide(s: &str) -> Vec<u16> {
        let mut wide: Vec<u16> = s.encode_utf16().collect();
        wide.push(0);
        wide
    }

    fn root_hkey(root: HiveRoot) -> HKEY {
        match root {
            HiveRoot::ClassesRoot => HKEY_CLASSES_ROOT,
            HiveRoot::LocalMachine => HKEY_LOCAL_MACHINE,
        }
    }

    fn map_win32_error(status: WIN32_ERROR, path: &str) -> DomainError {
        if status == ERROR_ACCESS_DENIED {
            return DomainError::AccessDenied(format!("registry key {}", path));
        }
        DomainError::Unknown(format!(
            "registry error for {}: status={}",
            path, status.0
        ))
    }

    /// 読み取り専用でキーを開く。キー不在は `None`。
    pub(super) fn open_key_readonly(key: &KeyPath) -> Result<Option<RegKeyGuard>, DomainError> {
        let wide_path = to_wide(&key.path); // API呼び出し中にVecを生存させる
        let mut hkey: HKEY = HKEY::default();
        let status = unsafe {
            RegOpenKeyExW(
                root_hkey(key.root),
                PCWSTR(wide_path.as_ptr()),
                Some(0),
                KEY_QUERY_VALUE | KEY_ENUMERATE_SUB_KEYS,
                &mut hkey,
            )
        };
        if status != ERROR_SUCCESS {
            return if status == ERROR_FILE_NOT_FOUND || status == ERROR_PATH_NOT_FOUND {
                Ok(None)
            } else {
                Err(map_win32_error(status, &key.path))
            };
        }
        Ok(Some(RegKeyGuard(hkey)))
    }

    pub(super) fn child_keys(key: &KeyPath) -> Result<Option<Vec<String>>, DomainError> {
        let Some(guard) = open_key_readonly(key)? else {
            return Ok(None);
        };

        let mut names = Vec::new();
        let mut index: u32 = 0;
        let mut name_buf: [u16; 260] = [0; 260];

        loop {
            let mut name_len = name_buf.len() as u32;
            let status = unsafe {
                RegEnumKeyExW(
                    guard.hkey(),
                    index,
                    Some(PWSTR(name_buf.as_mut_ptr())),
                    &mut name_len,
                    None,
                    None, // クラス
                    None,
                    None, // 最終書き込み時刻
                )
            };
            if status != ERROR_SUCCESS {
                break; // サブキー終了
            }
            names.push(String::from_utf16_lossy(&name_buf[..name_len as usize]));
            index += 1;
        }

        Ok(Some(names))
    }

    pub(super) fn values(key: &KeyPath) -> Result<Option<Vec<HiveValue>>, DomainError> {
        let Some(guard) = open_key_readonly(key)? else {
            return Ok(None);
        };

        let mut values = Vec::new();
        let mut index: u32 = 0;
        // リソース参照名は長いため値名バッファは最大長で確保する
        let mut name_buf: Vec<u16> = vec![0u16; 16384];

        loop {
            let mut name_len = name_buf.len() as u32;
            let mut value_type = REG_VALUE_TYPE(0);
            let status = unsafe {
                RegEnumValueW(
                    guard.hkey(),
                    index,
                    PWSTR(name_buf.as_mut_ptr()),
                    &mut name_len,
                    None,
                    Some(&mut value_type),
                    None,
                    None,
                )
            };
            if status != ERROR_SUCCESS {
                break; // 値終了
            }
            values.push(HiveValue {
                name: String::from_utf16_lossy(&name_buf[..name_len as usize]),
                kind: map_value_kind(value_type),
            });
            index += 1;
        }

        Ok(Some(values))
    }

    pub(super) fn string_value(
        key: &KeyPath,
        name: &str,
    ) -> Result<Option<String>, DomainError> {
        let Some(guard) = open_key_readonly(key)? else {
            return Ok(None);
        };

        let value_name = to_wide(name); // API呼び出し中にVecを生存させる
        let mut value_type = REG_VALUE_TYPE(0);
        let mut size_bytes: u32 = 0;
        let status = unsafe {
            RegGetValueW(
                guard.hkey(),
                PCWSTR::null(),
                PCWSTR(value_name.as_ptr()),
                RRF_RT_REG_SZ | RRF_RT_REG_EXPAND_SZ,
                Some(&mut value_type),
                None,
                Some(&mut size_bytes),
            )
        };
        if status != ERROR_SUCCESS {
            return match status.0 {
                code if code == ERROR_FILE_NOT_FOUND.0 => Ok(None),
                ERROR_UNSUPPORTED_TYPE_CODE => Ok(None),
                code if code == ERROR_ACCESS_DENIED.0 => {
                    Err(DomainError::AccessDenied(format!(
                        "registry value {} under {}",
                        name, key.path
                    )))
                }
                _ => Err(DomainError::Unknown(format!(
                    "failed to read value {} under {}: status={}",
                    name, key.path, status.0
                ))),
            };
        }

        let mut buffer: Vec<u16> = vec![0u16; (size_bytes as usize / 2).max(1)];
        let status = unsafe {
            RegGetValueW(
                guard.hkey(),
                PCWSTR::null(),
                PCWSTR(value_name.as_ptr()),
                RRF_RT_REG_SZ | RRF_RT_REG_EXPAND_SZ,
                Some(&mut value_type),
                Some(buffer.as_mut_ptr() as *mut _),
                Some(&mut size_bytes),
            )
        };
        if status != ERROR_SUCCESS {
            return match status.0 {
                code if code == ERROR_FILE_NOT_FOUND.0 => Ok(None),
                _ => Err(DomainError::Unknown(format!(
                    "failed to read value {} under {}: status={}",
                    name, key.path, status.0
                ))),
            };
        }

        // size_bytesは終端nullを含むため適切に切り詰める
        let char_len = (size_bytes as usize / 2).saturating_sub(1);
        buffer.truncate(char_len);
        Ok(Some(String::from_utf16_lossy(&buffer)))
    }

    fn map_value_kind(value_type: REG_VALUE_TYPE) -> HiveValueKind {
        match value_type {
            REG_SZ => HiveValueKind::Str,
            REG_EXPAND_SZ => HiveValueKind::ExpandStr,
            REG_MULTI_SZ => HiveValueKind::MultiStr,
            REG_DWORD => HiveValueKind::Dword,
            REG_QWORD => HiveValueKind::Qword,
            REG_BINARY => HiveValueKind::Binary,
            _ => HiveValueKind::Other,
        }
    }
}
