//! 駆動ポート（出力インターフェース）。
//!
//! ドメインが外部に求める機能を定義する。
//! インフラ層のアダプタが実装する。

mod game_launcher;
mod hive_store;
mod log_writer;
mod volume_source;

pub use game_launcher::*;
pub use hive_store::*;
pub use log_writer::*;
pub use volume_source::*;
