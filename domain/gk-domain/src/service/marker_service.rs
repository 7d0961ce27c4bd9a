//! ボリュームマーカーのデコードサービス
//!
//! ボリュームルート直下の固定名バイナリマーカーを読み、同一ボリューム上の
//! インストールルートパスへ変換する。読み取り自体はアダプタの仕事で、
//! ここは純粋なバイト列のデコードのみを行う。

use crate::DomainError;

/// ボリュームルート直下のマーカーファイル名（拡張子区切りなし）
pub const MARKER_FILE_NAME: &str = ".GamingRoot";

/// ヘッダ部のユニット数（8バイト＝16bitユニット4個）
const HEADER_UNITS: usize = 4;

/// 最低限必要なデコード済みユニット数（ヘッダ4＋終端1）
const MIN_UNITS: usize = 5;

/// マーカーのバイト列をインストールルートパスへデコードする。
///
/// - 全長はリトルエンディアン16bitユニットの列。奇数長は破損。
/// - 先頭4ユニットはヘッダ／バージョンで、この層では解釈しない
///   （既知の定数との照合は行わない寛容な互換動作）。
/// - 末尾1ユニットは終端として無検証で捨てる。
/// - 残りをパス文字列とし、ボリュームルートへそのまま連結する。
///
/// 各ユニットは単一のUTF-16コードユニットとして変換する。サロゲートペアの
/// 合成は行わず、孤立サロゲートは U+FFFD になる。
pub fn decode_volume_marker(volume_root: &str, bytes: &[u8]) -> Result<String, DomainError> {
    let marker_path = format!("{}{}", volume_root, MARKER_FILE_NAME);

    if bytes.len() % 2 != 0 {
        return Err(DomainError::DecodeError {
            path: marker_path,
            reason: format!("odd byte length {}", bytes.len()),
        });
    }

    let mut units: Vec<u16> = Vec::with_capacity(bytes.len() / 2);
    let mut i = 0;
    while i + 1 < bytes.len() {
        units.push(u16::from_le_bytes([bytes[i], bytes[i + 1]]));
        i += 2;
    }

    if units.len() < MIN_UNITS {
        return Err(DomainError::DecodeError {
            path: marker_path,
            reason: format!("marker too short ({} units)", units.len()),
        });
    }

    // ヘッダを飛ばし、終端ユニットを落とした範囲がパス本体
    let payload = &units[HEADER_UNITS..units.len() - 1];
    let mut path = String::with_capacity(payload.len());
    for &unit in payload {
        path.push(char::from_u32(unit as u32).unwrap_or('\u{FFFD}'));
    }

    Ok(format!("{}{}", volume_root, path))
}
