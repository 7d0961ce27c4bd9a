//! 実行ファイル用ランタイム配線。
//! CLI ユースケースの構成ルート。

use crate::paths;
use crate::provider::StoreProvider;
use gk_adapter_fs::FsAdapter;
use gk_adapter_launch::LaunchAdapter;
use gk_adapter_registry::HiveAdapter;
use gk_domain::DomainError;
use gk_domain::model::ScanConfig;

/// 実行ファイル用の依存関係
pub struct StoreRuntime {
    fs: FsAdapter,
    provider: StoreProvider<HiveAdapter, FsAdapter, LaunchAdapter, FsAdapter>,
}

impl StoreRuntime {
    /// 既定設定で新規作成
    pub fn new() -> Self {
        let data_dir = paths::default_data_dir();
        let fs = FsAdapter::new(&data_dir);
        let config = fs.load_config().unwrap_or_default();
        Self::with_config(fs, config)
    }

    /// 設定を指定して作成
    pub fn with_config(fs: FsAdapter, config: ScanConfig) -> Self {
        let mut layout = gk_adapter_registry::default_store_layout();
        layout
            .ignore_prefixes
            .extend(config.extra_ignore_prefixes.iter().cloned());
        let provider = StoreProvider::new(
            HiveAdapter::new(),
            fs.clone(),
            LaunchAdapter::new(),
            fs.clone(),
            layout,
            config.extra_volume_roots.clone(),
        );
        Self { fs, provider }
    }

    /// プロバイダ取得
    pub fn provider(
        &mut self,
    ) -> &mut StoreProvider<HiveAdapter, FsAdapter, LaunchAdapter, FsAdapter> {
        &mut self.provider
    }

    /// 設定読込
    pub fn load_config(&self) -> Result<ScanConfig, DomainError> {
        self.fs.load_config()
    }

    /// 設定読込（失敗時はデフォルト）
    pub fn load_config_or_default(&self) -> ScanConfig {
        self.fs.load_config().unwrap_or_default()
    }

    /// 設定保存
    pub fn save_config(&self, config: &ScanConfig) -> Result<(), DomainError> {
        self.fs.save_config(config)
    }
}

impl Default for StoreRuntime {
    fn default() -> Self {
        Self::new()
    }
}
