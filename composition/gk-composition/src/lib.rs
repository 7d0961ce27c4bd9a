//! gk-composition: 各実行ファイル向けのランタイムを組み立てるコンポジションルート。
//! ドメイン／エンジン／各種アダプタをここで配線し、apps/* はこのクレートだけに依存する。

pub mod paths;
pub mod provider;
pub mod runtime;

// apps/* が内側レイヤーの型に触れる必要がある場合は、ここから辿れるようにする。
// （apps が gk-domain等を直接依存しないため）
pub use gk_domain as domain;
pub use gk_engine as engine;

// 利便性のための再エクスポート（appsはアダプタクレートではなくこれらを使用）
pub use gk_domain::DomainError;
pub use gk_domain::model::{GameEntry, ScanConfig, STORE_ID};
pub use gk_domain::port::driving::DiscoveryUseCase;
pub use provider::StoreProvider;
pub use runtime::StoreRuntime;
