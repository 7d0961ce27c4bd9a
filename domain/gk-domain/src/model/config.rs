use crate::DomainError;

/// 設定スキーマのバージョン
pub const CONFIG_VERSION: &str = "1";

/// ディスカバリのユーザー設定。
///
/// 永続化形式（JSON）への変換はインフラ層のアダプタが担当する。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanConfig {
    pub version: String,
    /// ホストが指定するボリュームルートの追加候補
    pub extra_volume_roots: Vec<String>,
    /// 無視リストへ追加する接頭辞
    pub extra_ignore_prefixes: Vec<String>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION.to_string(),
            extra_volume_roots: Vec::new(),
            extra_ignore_prefixes: Vec::new(),
        }
    }
}

impl ScanConfig {
    pub fn validate(&self) -> Result<(), DomainError> {
        for root in &self.extra_volume_roots {
            if root.contains('\0') {
                return Err(DomainError::InvalidArgument(
                    "volume root must not contain NUL".into(),
                ));
            }
            if root.trim().is_empty() {
                return Err(DomainError::InvalidArgument(
                    "volume root must not be empty".into(),
                ));
            }
        }
        Ok(())
    }

    /// 接頭辞を小文字に正規化し、重複を取り除く。
    pub fn ensure_defaults(&mut self) {
        if self.version.trim().is_empty() {
            self.version = CONFIG_VERSION.to_string();
        }
        let mut prefixes: Vec<String> = self
            .extra_ignore_prefixes
            .iter()
            .map(|p| p.trim().to_ascii_lowercase())
            .filter(|p| !p.is_empty())
            .collect();
        prefixes.sort();
        prefixes.dedup();
        self.extra_ignore_prefixes = prefixes;
    }
}
