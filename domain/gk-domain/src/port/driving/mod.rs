//! 駆動ポート（入力インターフェース）。

mod discovery_use_case;

pub use discovery_use_case::*;
