//! ドメインサービス

pub mod marker_service;

pub use marker_service::{decode_volume_marker, MARKER_FILE_NAME};
