use crate::domain::model::HotelId;
use regex::Regex;
use std::sync::LazyLock;

// ID_B2B_<seq>#<code>_<hotel>_...
static STRICT_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^ID_B2B_\d+#[^_]+_(\d+)_").expect("valid hotel id pattern"));

/// 從合約檔名推導飯店識別碼
///
/// 先比對嚴格格式 `ID_B2B_<digits>#<code>_<digits>_…`，取第二段數字。
/// 比對失敗時，以 `_` 切分檔名並收集純數字的片段：
/// 有兩個以上取第二個，只有一個則取該值，否則回傳 `None`。
///
/// 取「第二個」數字片段是依供應商命名慣例 `<序號>_<飯店>_...` 的推測。
pub fn extract_hotel_id(filename: &str) -> Option<HotelId> {
    if let Some(caps) = STRICT_PATTERN.captures(filename) {
        if let Ok(id) = caps[1].parse::<u64>() {
            return Some(HotelId(id));
        }
    }

    let numeric: Vec<&str> = filename
        .split('_')
        .filter(|token| !token.is_empty() && token.bytes().all(|b| b.is_ascii_digit()))
        .collect();

    // 先依位置選片段再轉數值；超出 u64 的片段不能讓位置往後挪
    let chosen = match numeric.as_slice() {
        [_, second, ..] => second,
        [only] => only,
        [] => return None,
    };
    chosen.parse::<u64>().ok().map(HotelId)
}
