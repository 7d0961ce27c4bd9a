//! GameKompassの既定パス解決

use std::path::PathBuf;

#[cfg(windows)]
fn known_folder_path(id: &windows::core::GUID) -> Option<PathBuf> {
    use windows::Win32::System::Com::CoTaskMemFree;
    use windows::Win32::UI::Shell::{KF_FLAG_DEFAULT, SHGetKnownFolderPath};
    use windows::core::PWSTR;

    unsafe {
        let raw: PWSTR = SHGetKnownFolderPath(id, KF_FLAG_DEFAULT, None).ok()?;
        let s = pwstr_to_string(raw);
        CoTaskMemFree(Some(raw.0 as _));
        if s.is_empty() {
            None
        } else {
            Some(PathBuf::from(s))
        }
    }
}

#[cfg(windows)]
fn pwstr_to_string(pwstr: windows::core::PWSTR) -> String {
    unsafe {
        if pwstr.is_null() {
            return String::new();
        }
        let mut len = 0usize;
        while *pwstr.0.add(len) != 0 {
            len += 1;
        }
        let slice = std::slice::from_raw_parts(pwstr.0, len);
        String::from_utf16_lossy(slice)
    }
}

/// 既定の製品データディレクトリ
///
/// - Windows: `C:\ProgramData\GameKompass`（既知フォルダ）
/// - その他: `./var/GameKompass`（開発/テスト用）
pub fn default_data_dir() -> PathBuf {
    #[cfg(windows)]
    {
        use windows::Win32::UI::Shell::FOLDERID_ProgramData;

        known_folder_path(&FOLDERID_ProgramData)
            .unwrap_or_else(|| PathBuf::from(r"C:\ProgramData"))
            .join("GameKompass")
    }
    #[cfg(not(windows))]
    {
        PathBuf::from("./var").join("GameKompass")
    }
}
